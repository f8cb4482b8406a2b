//! Module for the [standard streams](https://en.wikipedia.org/wiki/Standard_streams): standard
//! input, standard output, and standard error.

use core::marker::PhantomData;

use spin::Mutex;

use crate::{
    Errno,
    fs::{File, FileDescriptor},
};

/// Creates the definitions of various static streams.
macro_rules! define_streams {
    (
        $(
            $(#[$doc:meta])*
            $stream_name:ident<$direction:ident> = $fd:expr;
        )*
    ) =>{
       $(
            $(#[$doc])*
            pub static $stream_name: Mutex<Stream<$direction>> = Mutex::new(Stream::define($fd));
       )*
    };
}
define_streams!(
    /// The [standard input stream](
    /// https://en.wikipedia.org/wiki/Standard_streams#Standard_input_(stdin)),
    /// from which programs can read input data.
    STDIN<Input> = FileDescriptor::STDIN;
    /// The [standard output stream](
    /// https://en.wikipedia.org/wiki/Standard_streams#Standard_output_(stdout)),
    /// to which programs can write output data.
    STDOUT<Output> = FileDescriptor::STDOUT;
    /// The [standard error stream](
    /// https://en.wikipedia.org/wiki/Standard_streams#Standard_error_(stderr)),
    /// to which programs can write error messages or diagnostics.
    STDERR<Output> = FileDescriptor::STDERR;
);

/// An input stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Input;
/// An output stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Output;

/// A [`File`] corresponding to a particular
/// [`standard stream`](https://en.wikipedia.org/wiki/Standard_streams).
#[derive(Debug, PartialEq, Hash)]
pub struct Stream<D> {
    file: File,
    direction: PhantomData<D>,
}
impl<D> Stream<D> {
    /// Statically define the [`FileDescriptor`] corresponding to this standard stream, and whether
    /// the stream is an input stream or an output stream.
    const fn define(fd: FileDescriptor) -> Self {
        Self {
            file: File::define(fd),
            direction: PhantomData,
        }
    }
}
impl Stream<Input> {
    /// Reads bytes from the stream into the given buffer. Returns the number of bytes read from
    /// the stream on success.
    ///
    /// # Errors
    ///
    /// This function propagates any [`Errno`]s returned from [`File::read`].
    pub fn read(&self, buffer: &mut [u8]) -> Result<usize, Errno> {
        self.file.read(buffer)
    }
}
impl Stream<Output> {
    /// Writes bytes from the provided buffer into the stream, returning the number of bytes
    /// written.
    ///
    /// # Errors
    ///
    /// This function propagates any [`Errno`]s returned from [`File::write`].
    pub fn write(&self, buffer: &[u8]) -> Result<usize, Errno> {
        self.file.write(buffer)
    }
}
impl core::fmt::Write for Stream<Output> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        self.write(s.as_bytes()).map_err(|_| core::fmt::Error {})?;
        Ok(())
    }
}
