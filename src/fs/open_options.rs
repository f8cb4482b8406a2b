//! Module for the [`OpenOptions`] struct.

use crate::{
    Errno, NixString, SyscallNum,
    fs::{File, FilePermissions, OpenFlags},
    syscall_result,
};

// Macro to create methods that set open_flags to a given value.
macro_rules! open_flag_setter {
    (
        $(
            $(#[$outer:meta])*
            $method:ident => $flag:ident;
        )*
    ) => {
        $(
            $(#[$outer])*
            pub fn $method(&mut self, value: bool) -> &mut Self {
                self.open_flags.set(OpenFlags::$flag, value);
                self
            }
        )*
    }
}

/// Used to open a file with a defined set of options and flags. These options determine the
/// behaviour of the opened file.
///
/// Provides functionality analogous to the
/// [standard library's `OpenOptions`](https://doc.rust-lang.org/std/fs/struct.OpenOptions.html#method.open).
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OpenOptions {
    open_flags: OpenFlags,
    file_permissions: FilePermissions,
}
impl OpenOptions {
    /// Creates a new [`OpenOptions`] in read-only mode with all other options/flags disabled.
    ///
    /// File permissions only apply to newly-created files and are, by default, set to 0644
    /// (owner can read and write, group and others can read).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the [`File`] at the given path with this [`OpenOptions`]' options. Utilizes the
    /// [`open`](https://www.man7.org/linux/man-pages/man2/open.2.html) Linux syscall.
    ///
    /// # Errors
    ///
    /// This function returns an [`Errno`] if the file fails to open for whatever reason. These
    /// errors are propagated up from the underlying `open` syscall.
    pub fn open<NS: Into<NixString>>(&self, path: NS) -> Result<File, Errno> {
        let path_str: NixString = path.into();
        // SAFETY: The path is guaranteed to be null-terminated by its NixString type; flags and
        // mode are plain integers.
        let file_descriptor = unsafe {
            syscall_result!(
                SyscallNum::Open,
                path_str.as_ptr(),
                self.open_flags.bits(),
                self.file_permissions.bits()
            )?
        };
        Ok(File::__new(file_descriptor.into()))
    }

    /// Sets the read-only flag. When [`Self::open`] is called, the file will be opened with
    /// read-only permissions.
    ///
    /// This is the default behaviour.
    pub fn read_only(&mut self) -> &mut Self {
        self.open_flags
            .remove(OpenFlags::O_RDWR | OpenFlags::O_WRONLY);
        self
    }

    /// Sets the write-only flag. When [`Self::open`] is called, the file will be opened with
    /// write-only permissions.
    pub fn write_only(&mut self) -> &mut Self {
        self.open_flags.remove(OpenFlags::O_RDWR);
        self.open_flags.insert(OpenFlags::O_WRONLY);
        self
    }

    /// Sets the read-write flag. When [`Self::open`] is called, the file will be opened with
    /// both read _and_ write permissions.
    pub fn read_write(&mut self) -> &mut Self {
        self.open_flags.remove(OpenFlags::O_WRONLY);
        self.open_flags.insert(OpenFlags::O_RDWR);
        self
    }

    /// Sets the file mode to the given [`FilePermissions`]. Will overwrite any existing file
    /// permissions.
    pub fn set_mode<FP: Into<FilePermissions>>(&mut self, mode: FP) -> &mut Self {
        self.file_permissions = mode.into();
        self
    }

    open_flag_setter!(
        /// Sets whether or not the file should be created if it is missing.
        create => O_CREAT;
        /// Sets whether or not writes always land at the end of the file.
        append => O_APPEND;
        /// Sets whether or not the file is opened in non-blocking mode.
        non_blocking => O_NONBLOCK;
        /// Sets whether or not a terminal device at the path is kept from becoming the process's
        /// controlling terminal.
        no_ctty => O_NOCTTY;
        /// Sets whether or not the descriptor is closed across `execve`.
        close_on_exec => O_CLOEXEC;
        /// Sets whether or not a trailing symlink causes the open to fail.
        no_follow => O_NOFOLLOW;
    );
}
