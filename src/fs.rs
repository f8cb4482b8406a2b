//! Filesystem access: open files, device nodes, and path-level queries.

use alloc::string::String;

use crate::{Errno, NixString, SyscallNum, syscall_result};

mod file;
mod open_flags;
mod open_options;
mod permissions;
mod types;

// RE-EXPORTS
pub use file::File;
pub use open_flags::OpenFlags;
pub use open_options::OpenOptions;
pub use permissions::FilePermissions;
pub use types::{DirEnt, DirEntType, FileDescriptor, FileStat, FileType, FsMagic};

use types::FileStatRaw;
use types::StatfsRaw;

/// Mode bit marking a [`mknod(2)`](https://www.man7.org/linux/man-pages/man2/mknod.2.html) node
/// as a FIFO.
const S_IFIFO: usize = 0o010_000;

/// `W_OK`: test for write permission with [`access`].
const ACCESS_WRITE: usize = 2;

/// Gets information about the file at the given path, following symlinks.
///
/// Wrapper around the [`stat(2)`](https://www.man7.org/linux/man-pages/man2/stat.2.html) Linux
/// syscall.
///
/// # Errors
///
/// This function propagates any [`Errno`]s from the underlying `stat` syscall.
pub fn stat<NS: Into<NixString>>(path: NS) -> Result<FileStat, Errno> {
    stat_helper(path, SyscallNum::Stat)
}

/// Gets information about the file at the given path, _without_ following symlinks.
///
/// Wrapper around the [`lstat(2)`](https://www.man7.org/linux/man-pages/man2/lstat.2.html) Linux
/// syscall.
///
/// # Errors
///
/// This function propagates any [`Errno`]s from the underlying `lstat` syscall.
pub fn lstat<NS: Into<NixString>>(path: NS) -> Result<FileStat, Errno> {
    stat_helper(path, SyscallNum::Lstat)
}

fn stat_helper<NS: Into<NixString>>(path: NS, call: SyscallNum) -> Result<FileStat, Errno> {
    let ns_path: NixString = path.into();
    let mut stats = FileStatRaw::default();

    // SAFETY: The path is null-terminated by its NixString type and the raw stat pointer lives
    // only for the duration of the call.
    unsafe {
        syscall_result!(call, ns_path.as_ptr(), &raw mut stats)?;
    }
    Ok(FileStat::from(stats))
}

/// Checks whether the calling process may write to the file at the given path.
///
/// Wrapper around the [`access(2)`](https://www.man7.org/linux/man-pages/man2/access.2.html)
/// Linux syscall with `W_OK`.
///
/// # Errors
///
/// This function propagates any [`Errno`]s from the underlying `access` syscall.
pub fn writable<NS: Into<NixString>>(path: NS) -> Result<(), Errno> {
    let ns_path: NixString = path.into();

    // SAFETY: The path is null-terminated by its NixString type; the mode is statically chosen.
    unsafe {
        syscall_result!(SyscallNum::Access, ns_path.as_ptr(), ACCESS_WRITE)?;
    }
    Ok(())
}

/// Creates a named pipe at the given path with the given permissions.
///
/// Wrapper around the [`mknod(2)`](https://www.man7.org/linux/man-pages/man2/mknod.2.html) Linux
/// syscall with `S_IFIFO`.
///
/// # Errors
///
/// This function propagates any [`Errno`]s from the underlying `mknod` syscall.
pub fn mkfifo<NS: Into<NixString>>(path: NS, mode: FilePermissions) -> Result<(), Errno> {
    let ns_path: NixString = path.into();

    // SAFETY: The path is null-terminated by its NixString type; the device argument is ignored
    // for FIFOs.
    unsafe {
        syscall_result!(
            SyscallNum::Mknod,
            ns_path.as_ptr(),
            S_IFIFO | mode.bits(),
            0
        )?;
    }
    Ok(())
}

/// Renames the file at `old` to `new`, replacing `new` if it exists.
///
/// Wrapper around the [`rename(2)`](https://www.man7.org/linux/man-pages/man2/rename.2.html)
/// Linux syscall.
///
/// # Errors
///
/// This function propagates any [`Errno`]s from the underlying `rename` syscall.
pub fn rename<NS: Into<NixString>, NT: Into<NixString>>(old: NS, new: NT) -> Result<(), Errno> {
    let ns_old: NixString = old.into();
    let ns_new: NixString = new.into();

    // SAFETY: Both paths are null-terminated by their NixString types.
    unsafe {
        syscall_result!(SyscallNum::Rename, ns_old.as_ptr(), ns_new.as_ptr())?;
    }
    Ok(())
}

/// Deletes the file at the given path from the filesystem.
///
/// Wrapper around the [`unlink(2)`](https://www.man7.org/linux/man-pages/man2/unlink.2.html)
/// Linux syscall.
///
/// # Errors
///
/// This function propagates any [`Errno`]s from the underlying `unlink` syscall.
pub fn rm<NS: Into<NixString>>(path: NS) -> Result<(), Errno> {
    let ns_path: NixString = path.into();

    // SAFETY: The path is null-terminated by its NixString type.
    unsafe {
        syscall_result!(SyscallNum::Unlink, ns_path.as_ptr())?;
    }
    Ok(())
}

/// Reads the target of the symbolic link at the given path.
///
/// Wrapper around the [`readlink(2)`](https://www.man7.org/linux/man-pages/man2/readlink.2.html)
/// Linux syscall.
///
/// # Errors
///
/// This function propagates any [`Errno`]s from the underlying `readlink` syscall and returns
/// [`Errno::Eilseq`] if the target is not valid UTF-8.
pub fn readlink<NS: Into<NixString>>(path: NS) -> Result<String, Errno> {
    let ns_path: NixString = path.into();
    let mut buf = [0_u8; crate::PATH_MAX];

    // SAFETY: The path is null-terminated by its NixString type; the buffer length matches the
    // actual buffer.
    let len = unsafe {
        syscall_result!(
            SyscallNum::Readlink,
            ns_path.as_ptr(),
            buf.as_mut_ptr(),
            buf.len()
        )?
    };

    String::from_utf8(buf[..len].to_vec()).map_err(|_| Errno::Eilseq)
}

/// Gets the filesystem type magic of the filesystem containing the given path.
///
/// Wrapper around the [`statfs(2)`](https://www.man7.org/linux/man-pages/man2/statfs.2.html)
/// Linux syscall; only the `f_type` field is surfaced.
///
/// # Errors
///
/// This function propagates any [`Errno`]s from the underlying `statfs` syscall.
pub fn fs_magic<NS: Into<NixString>>(path: NS) -> Result<FsMagic, Errno> {
    let ns_path: NixString = path.into();
    let mut raw = StatfsRaw::default();

    // SAFETY: The path is null-terminated by its NixString type and the raw statfs pointer lives
    // only for the duration of the call.
    unsafe {
        syscall_result!(SyscallNum::Statfs, ns_path.as_ptr(), &raw mut raw)?;
    }
    Ok(FsMagic::from(raw.f_type))
}

/// Duplicates `old` onto the descriptor number `new`, closing `new` first if it was open.
///
/// Wrapper around the [`dup2(2)`](https://www.man7.org/linux/man-pages/man2/dup2.2.html) Linux
/// syscall.
///
/// # Errors
///
/// This function propagates any [`Errno`]s from the underlying `dup2` syscall.
pub fn dup2(old: FileDescriptor, new: FileDescriptor) -> Result<(), Errno> {
    // SAFETY: Descriptor numbers are plain integers; the kernel validates them.
    unsafe {
        syscall_result!(SyscallNum::Dup2, old.raw(), new.raw())?;
    }
    Ok(())
}

/// Closes the given raw descriptor number.
///
/// Only for descriptors that are not owned by a [`File`]; owned descriptors close on drop.
pub(crate) fn close_raw(fd: FileDescriptor) {
    // SAFETY: Statically-chosen arguments. Linux protects against double-closes by gracefully
    // returning EBADF.
    unsafe {
        crate::syscall!(SyscallNum::Close, fd.raw());
    }
}

#[cfg(test)]
mod tests;
