//! Functionality centred around syscall-compatible strings.

use alloc::{
    string::{String, ToString},
    vec::Vec,
};

const NULL_BYTE: u8 = b'\0';

/// An owned, null-terminated string of valid UTF-8 bytes intended for use with Linux syscalls.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NixString(Vec<u8>);
impl NixString {
    /// Creates a new, empty [`NixString`].
    pub fn null() -> Self {
        Self(Vec::from([NULL_BYTE]))
    }

    /// Returns a raw pointer to the [`NixString`]'s buffer.
    #[must_use]
    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.0.as_ptr()
    }

    /// Returns the byte slice of the [`NixString`], trailing null included.
    #[must_use]
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns a [`&str`] referencing the bytes of this [`NixString`].
    pub fn try_as_str(&self) -> Result<&str, core::str::Utf8Error> {
        str::from_utf8(&self.0)
    }
}
impl From<Vec<u8>> for NixString {
    fn from(value: Vec<u8>) -> Self {
        // Filter out all null bytes
        let mut filtered_bytes = value
            .into_iter()
            .filter(|&byte| byte != NULL_BYTE)
            .collect::<Vec<u8>>();
        // Push a null byte to the end
        filtered_bytes.push(NULL_BYTE);

        Self(filtered_bytes)
    }
}
impl From<String> for NixString {
    fn from(value: String) -> Self {
        Self::from(value.into_bytes())
    }
}
impl From<&String> for NixString {
    fn from(value: &String) -> Self {
        Self::from(value.to_string())
    }
}
impl From<&str> for NixString {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}
impl From<&[u8]> for NixString {
    fn from(value: &[u8]) -> Self {
        Self::from(Vec::from(value))
    }
}
impl TryFrom<NixString> for String {
    type Error = alloc::string::FromUtf8Error;

    fn try_from(value: NixString) -> Result<Self, Self::Error> {
        String::from_utf8(value.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_case]
    fn terminates() {
        let ns = NixString::from("/dev/console");
        assert_eq!(ns.bytes(), b"/dev/console\0");
    }

    #[test_case]
    fn strips_interior_nulls() {
        let ns = NixString::from(Vec::from(*b"a\0b\0"));
        assert_eq!(ns.bytes(), b"ab\0");
    }

    #[test_case]
    fn null_is_just_terminator() {
        assert_eq!(NixString::null().bytes(), b"\0");
    }
}
