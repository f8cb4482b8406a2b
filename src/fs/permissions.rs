//! The [`FilePermissions`] bitflags.

bitflags::bitflags! {
    /// The permission bits of a file's mode, as given to
    /// [`open(2)`](https://www.man7.org/linux/man-pages/man2/open.2.html) and
    /// [`mknod(2)`](https://www.man7.org/linux/man-pages/man2/mknod.2.html) when creating.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct FilePermissions: usize {
        /// Owner may read.
        const OWNER_READ = 0o400;
        /// Owner may write.
        const OWNER_WRITE = 0o200;
        /// Owner may execute.
        const OWNER_EXEC = 0o100;
        /// Group may read.
        const GROUP_READ = 0o040;
        /// Group may write.
        const GROUP_WRITE = 0o020;
        /// Group may execute.
        const GROUP_EXEC = 0o010;
        /// Others may read.
        const OTHER_READ = 0o004;
        /// Others may write.
        const OTHER_WRITE = 0o002;
        /// Others may execute.
        const OTHER_EXEC = 0o001;
    }
}
impl FilePermissions {
    /// `0644`: owner read/write, group and others read. The default for created files.
    pub const FILE_DEFAULT: Self = Self::OWNER_READ
        .union(Self::OWNER_WRITE)
        .union(Self::GROUP_READ)
        .union(Self::OTHER_READ);

    /// `0600`: owner read/write only. The mode of the log fifo.
    pub const OWNER_ONLY: Self = Self::OWNER_READ.union(Self::OWNER_WRITE);
}
impl Default for FilePermissions {
    fn default() -> Self {
        Self::FILE_DEFAULT
    }
}
impl From<usize> for FilePermissions {
    fn from(value: usize) -> Self {
        Self::from_bits_truncate(value)
    }
}
