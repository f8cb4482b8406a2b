//! This module is responsible for the [`File`] type and all associated file operations.

use alloc::{string::String, string::ToString, vec::Vec};
use core::mem::size_of;

use crate::{
    Errno, NULL_BYTE, SyscallNum,
    fs::{
        DirEnt, FileDescriptor, FileStat, OpenFlags,
        types::{DirEntRawHeader, FileStatRaw},
    },
    syscall, syscall_result,
};

/// Buffer for reading directory entries.
const DIR_ENT_BUF_SIZE: usize = 4096;

/// `F_GETFL`: read the file status flags with [`fcntl(2)`](https://man7.org/linux/man-pages/man2/fcntl.2.html).
const F_GETFL: usize = 3;
/// `F_SETFL`: write the file status flags.
const F_SETFL: usize = 4;

/// An object providing access to an open file on the filesystem. The underlying descriptor is
/// closed when the [`File`] is dropped.
#[derive(Debug, PartialEq, Hash)]
pub struct File {
    file_descriptor: FileDescriptor,
}
impl File {
    /// Statically defines a [`File`] with the given [`FileDescriptor`]. Used to create the
    /// standard streams.
    #[doc(hidden)]
    #[must_use]
    pub(crate) const fn define(file_descriptor: FileDescriptor) -> Self {
        Self { file_descriptor }
    }

    /// Creates a [`File`] owning the given [`FileDescriptor`]. Not intended to be used directly.
    #[doc(hidden)]
    #[must_use]
    pub(crate) fn __new(file_descriptor: FileDescriptor) -> Self {
        Self { file_descriptor }
    }

    /// Gets the [`FileDescriptor`] of this [`File`].
    #[must_use]
    pub fn fd(&self) -> FileDescriptor {
        self.file_descriptor
    }

    /// Gets information about this [`File`] in the form of a [`FileStat`].
    ///
    /// Wrapper around the [`fstat`](https://man7.org/linux/man-pages/man2/fstat.2.html) Linux
    /// syscall.
    ///
    /// # Errors
    ///
    /// This function propagates any [`Errno`]s from the underlying `fstat` Linux syscall.
    pub fn stat(&self) -> Result<FileStat, Errno> {
        let mut stats = FileStatRaw::default();

        // SAFETY: Arguments are correct. `stats_ptr` is valid at the time of calling and is
        // dropped right afterwards.
        unsafe {
            syscall_result!(
                SyscallNum::Fstat,
                self.file_descriptor.raw(),
                &raw mut stats
            )?;
        }
        Ok(stats.into())
    }

    /// Reads bytes from the [`File`] into the given buffer. Returns the number of bytes read from
    /// the file on success.
    ///
    /// Wrapper around the [`read`](https://www.man7.org/linux/man-pages/man2/read.2.html) Linux
    /// syscall.
    ///
    /// # Errors
    ///
    /// This function returns an [`Errno`] if the underlying `read` syscall fails.
    pub fn read(&self, buffer: &mut [u8]) -> Result<usize, Errno> {
        let buf_ptr = buffer.as_mut_ptr();

        // SAFETY: The arguments are correct and the length is guaranteed to match the given
        // buffer. The mutable raw pointer to the array is not accessed after mutating the array
        // and goes out of scope right after reading.
        unsafe {
            syscall_result!(
                SyscallNum::Read,
                self.file_descriptor.raw(),
                buf_ptr,
                buffer.len()
            )
        }
    }

    /// Reads a single byte from the file.
    ///
    /// Will return [`None`] if the end of the file has been reached.
    ///
    /// # Errors
    ///
    /// Will propagate any [`Errno`]s returned from the underlying `read` syscall.
    pub fn read_byte(&self) -> Result<Option<u8>, Errno> {
        let mut byte: u8 = u8::default();

        // SAFETY: The file descriptor is tied to the file itself. The mutable raw pointer to
        // `byte` is dropped at the end of the function, so there is no risk of a
        // use-after-free.
        let bytes_read = unsafe {
            syscall_result!(
                SyscallNum::Read,
                self.file_descriptor.raw(),
                &raw mut byte,
                1
            )?
        };

        if bytes_read == 0 {
            return Ok(None);
        }

        Ok(Some(byte))
    }

    /// Writes bytes from the provided buffer to the given file. Returns the number of bytes
    /// written on success. Short writes are continued until the whole buffer is written.
    ///
    /// Relies on the [`write`](https://www.man7.org/linux/man-pages/man2/write.2.html) Linux
    /// syscall internally.
    ///
    /// # Errors
    ///
    /// This function propagates any errors encountered during the `write` syscall, returning an
    /// [`Errno`].
    pub fn write(&self, buffer: &[u8]) -> Result<usize, Errno> {
        let mut total_bytes_written = 0;

        while total_bytes_written < buffer.len() {
            let remaining_bytes = &buffer[total_bytes_written..];
            // SAFETY: The arguments are correct. The raw pointer to the buffer is dropped
            // before the buffer goes out of scope. The buffer length is guaranteed to be correct.
            total_bytes_written += unsafe {
                syscall_result!(
                    SyscallNum::Write,
                    self.file_descriptor.raw(),
                    remaining_bytes.as_ptr(),
                    remaining_bytes.len()
                )?
            };
        }

        Ok(total_bytes_written)
    }

    /// Writes a single byte to the file. Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Will propagate any [`Errno`]s returned from the underlying `write` syscall.
    pub fn write_byte(&self, byte: u8) -> Result<usize, Errno> {
        // SAFETY: The pointer to the byte is valid. The buffer size is statically-chosen and
        // matches the single byte being written.
        unsafe {
            syscall_result!(
                SyscallNum::Write,
                self.file_descriptor.raw(),
                &raw const byte,
                1
            )
        }
    }

    /// Gets the file status flags of this [`File`].
    ///
    /// Wrapper around [`fcntl(2)`](https://man7.org/linux/man-pages/man2/fcntl.2.html) with
    /// `F_GETFL`.
    ///
    /// # Errors
    ///
    /// This function propagates any [`Errno`]s from the underlying `fcntl` syscall.
    pub fn status_flags(&self) -> Result<OpenFlags, Errno> {
        // SAFETY: Statically-chosen command; no pointer arguments.
        let bits = unsafe {
            syscall_result!(SyscallNum::Fcntl, self.file_descriptor.raw(), F_GETFL)?
        };
        Ok(OpenFlags::from_bits_truncate(bits))
    }

    /// Replaces the file status flags of this [`File`].
    ///
    /// Wrapper around [`fcntl(2)`](https://man7.org/linux/man-pages/man2/fcntl.2.html) with
    /// `F_SETFL`. Only the status flags (append, non-blocking and friends) are honored by the
    /// kernel; access mode bits are ignored.
    ///
    /// # Errors
    ///
    /// This function propagates any [`Errno`]s from the underlying `fcntl` syscall.
    pub fn set_status_flags(&self, flags: OpenFlags) -> Result<(), Errno> {
        // SAFETY: Statically-chosen command; the flag bits are a plain integer.
        unsafe {
            syscall_result!(
                SyscallNum::Fcntl,
                self.file_descriptor.raw(),
                F_SETFL,
                flags.bits()
            )?;
        }
        Ok(())
    }

    /// Gets the entries of this directory.
    ///
    /// Naturally, this function is only usable if this [`File`] is a directory. Otherwise,
    /// [`Errno::Enotdir`] will be returned.
    ///
    /// Uses the [`getdents64`](https://www.man7.org/linux/man-pages/man2/getdents.2.html) Linux
    /// syscall internally.
    ///
    /// # Errors
    ///
    /// This function returns [`Errno::Enotdir`] if this [`File`] is not a directory and
    /// propagates any [`Errno`]s returned by the underlying `getdents64` calls.
    pub fn dir_ents(&self) -> Result<Vec<DirEnt>, Errno> {
        /// Offset of the directory entry name from the start of its bytes.
        const NAME_OFFSET: usize = size_of::<DirEntRawHeader>();

        let mut results: Vec<DirEnt> = Vec::new();
        let mut buf = [0_u8; DIR_ENT_BUF_SIZE];

        // Keep reading entries until there's nothing left to read
        loop {
            // SAFETY: The file descriptor is tied to this struct. The length of the buffer is
            // guaranteed to match the actual buffer length.
            let bytes_read = unsafe {
                syscall_result!(
                    SyscallNum::Getdents64,
                    self.file_descriptor.raw(),
                    buf.as_mut_ptr(),
                    buf.len()
                )?
            };

            if bytes_read == 0 {
                break;
            }

            // Keep reading raw dir ent headers (and their name strings) until we reach the end of
            // the returned bytes
            let mut offset = 0;
            while offset < bytes_read {
                // SAFETY: `getdents64` guarantees data won't be written past the end of `buf`.
                // The DirEntRawHeader layout matches the bytes returned by `getdents64`.
                // read_unaligned() handles cases where the bytes could be unaligned.
                let raw_header: DirEntRawHeader = unsafe {
                    buf.as_ptr()
                        .add(offset)
                        .cast::<DirEntRawHeader>()
                        .read_unaligned()
                };

                let entry_slice = &buf[offset..(offset + raw_header.d_reclen as usize)];
                let name_bytes = &entry_slice[NAME_OFFSET..];
                let name_end = name_bytes
                    .iter()
                    .position(|&byte| byte == NULL_BYTE)
                    .unwrap_or(name_bytes.len());
                let name = str::from_utf8(&name_bytes[..name_end])
                    .map_err(|_| Errno::Eilseq)?
                    .to_string();

                offset += raw_header.d_reclen as usize;

                results.push(DirEnt::from_raw(&raw_header, name));
            }
        }

        Ok(results)
    }
}
impl Drop for File {
    fn drop(&mut self) {
        // SAFETY: Statically-chosen arguments. Linux protects against double-closes by gracefully
        // returning EBADF.
        unsafe {
            syscall!(SyscallNum::Close, self.file_descriptor.raw());
        }
    }
}
