//! Supporting types for the filesystem module.

use alloc::string::String;

/// Process-unique identifier for a file or other input/output resource.
/// [Wikipedia](https://en.wikipedia.org/wiki/File_descriptor)
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileDescriptor(usize);
impl FileDescriptor {
    /// The standard input stream.
    pub const STDIN: Self = Self(0);
    /// The standard output stream.
    pub const STDOUT: Self = Self(1);
    /// The standard error stream.
    pub const STDERR: Self = Self(2);

    /// Defines a [`FileDescriptor`] with the given `usize`.
    #[doc(hidden)]
    pub(crate) const fn define(value: usize) -> Self {
        Self(value)
    }

    /// Gets the raw descriptor number.
    #[must_use]
    pub(crate) const fn raw(self) -> usize {
        self.0
    }
}
impl From<usize> for FileDescriptor {
    fn from(value: usize) -> Self {
        Self::define(value)
    }
}
impl From<FileDescriptor> for usize {
    fn from(value: FileDescriptor) -> Self {
        value.0
    }
}
impl core::fmt::Display for FileDescriptor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mask selecting the file-type bits of `st_mode`.
const S_IFMT: u32 = 0o170_000;

/// The type of a file, taken from the file-type bits of its mode.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FileType {
    /// A named pipe.
    Fifo,
    /// A character device.
    CharacterDevice,
    /// A directory.
    Directory,
    /// A block device.
    BlockDevice,
    /// A regular file.
    RegularFile,
    /// A symbolic link.
    Symlink,
    /// A Unix-domain socket.
    Socket,
    /// A type this enum does not know.
    Unknown,
}
impl From<u32> for FileType {
    fn from(mode: u32) -> Self {
        match mode & S_IFMT {
            0o010_000 => Self::Fifo,
            0o020_000 => Self::CharacterDevice,
            0o040_000 => Self::Directory,
            0o060_000 => Self::BlockDevice,
            0o100_000 => Self::RegularFile,
            0o120_000 => Self::Symlink,
            0o140_000 => Self::Socket,
            _ => Self::Unknown,
        }
    }
}

/// The raw file-status structure filled in by the
/// [`stat(2)`](https://www.man7.org/linux/man-pages/man2/stat.2.html) family on x86_64.
#[repr(C)]
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct FileStatRaw {
    pub st_dev: u64,
    pub st_ino: u64,
    pub st_nlink: u64,
    pub st_mode: u32,
    pub st_uid: u32,
    pub st_gid: u32,
    pub __pad0: u32,
    pub st_rdev: u64,
    pub st_size: i64,
    pub st_blksize: i64,
    pub st_blocks: i64,
    pub st_atime: i64,
    pub st_atime_nsec: i64,
    pub st_mtime: i64,
    pub st_mtime_nsec: i64,
    pub st_ctime: i64,
    pub st_ctime_nsec: i64,
    pub __unused: [i64; 3],
}

/// Information about a file, decoded from [`FileStatRaw`].
#[derive(Clone, Debug, PartialEq)]
pub struct FileStat {
    /// The type of the file.
    pub file_type: FileType,
    /// The device this file represents, if it is a device node.
    pub rdev: u64,
    /// The size of the file in bytes.
    pub size: i64,
    /// The full mode word, type bits included.
    pub mode: u32,
}
impl From<FileStatRaw> for FileStat {
    fn from(raw: FileStatRaw) -> Self {
        Self {
            file_type: FileType::from(raw.st_mode),
            rdev: raw.st_rdev,
            size: raw.st_size,
            mode: raw.st_mode,
        }
    }
}

/// The raw filesystem-status structure filled in by
/// [`statfs(2)`](https://www.man7.org/linux/man-pages/man2/statfs.2.html) on x86_64. Only
/// `f_type` is interpreted; the rest is kept for layout.
#[repr(C)]
#[derive(Clone, Debug, Default)]
pub(crate) struct StatfsRaw {
    pub f_type: i64,
    pub f_bsize: i64,
    pub f_blocks: u64,
    pub f_bfree: u64,
    pub f_bavail: u64,
    pub f_files: u64,
    pub f_ffree: u64,
    pub f_fsid: [i32; 2],
    pub f_namelen: i64,
    pub f_frsize: i64,
    pub f_flags: i64,
    pub f_spare: [i64; 4],
}

/// The filesystem type magic reported by
/// [`statfs(2)`](https://www.man7.org/linux/man-pages/man2/statfs.2.html).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FsMagic(i64);
impl FsMagic {
    /// `TMPFS_MAGIC`
    pub const TMPFS: Self = Self(0x0102_1994);
    /// `RAMFS_MAGIC`
    pub const RAMFS: Self = Self(0x8584_58f6_u32 as i64);
    /// `SQUASHFS_MAGIC`
    pub const SQUASHFS: Self = Self(0x7371_7368);
    /// `CRAMFS_MAGIC`
    pub const CRAMFS: Self = Self(0x28cd_3d45);
    /// `CRAMFS_MAGIC` with wrong endianness, as mountable pre-Linux-2.6.
    pub const CRAMFS_WEND: Self = Self(0x453d_cd28);

    /// Whether this filesystem is one of the memory-backed types used for an initial ramdisk.
    #[must_use]
    pub fn is_volatile(self) -> bool {
        matches!(
            self,
            Self::TMPFS | Self::RAMFS | Self::SQUASHFS | Self::CRAMFS | Self::CRAMFS_WEND
        )
    }
}
impl From<i64> for FsMagic {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// The fixed-size header of a raw directory entry returned by
/// [`getdents64(2)`](https://www.man7.org/linux/man-pages/man2/getdents.2.html). The
/// null-terminated name follows it directly.
#[repr(C)]
#[derive(Clone, Debug)]
pub(crate) struct DirEntRawHeader {
    pub d_ino: u64,
    pub d_off: i64,
    pub d_reclen: u16,
    pub d_type: u8,
}

/// The type of a directory entry as reported by the kernel.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DirEntType {
    /// A named pipe.
    Fifo,
    /// A character device.
    CharacterDevice,
    /// A directory.
    Directory,
    /// A block device.
    BlockDevice,
    /// A regular file.
    RegularFile,
    /// A symbolic link.
    Symlink,
    /// A Unix-domain socket.
    Socket,
    /// The filesystem did not report a type.
    Unknown,
}
impl From<u8> for DirEntType {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Fifo,
            2 => Self::CharacterDevice,
            4 => Self::Directory,
            6 => Self::BlockDevice,
            8 => Self::RegularFile,
            10 => Self::Symlink,
            12 => Self::Socket,
            _ => Self::Unknown,
        }
    }
}

/// One entry of a directory.
#[derive(Clone, Debug)]
pub struct DirEnt {
    /// The inode number of the entry.
    pub ino: u64,
    /// The type of the entry.
    pub d_type: DirEntType,
    /// The name of the entry within its directory.
    pub name: String,
}
impl DirEnt {
    pub(crate) fn from_raw(raw: &DirEntRawHeader, name: String) -> Self {
        Self {
            ino: raw.d_ino,
            d_type: DirEntType::from(raw.d_type),
            name,
        }
    }
}
