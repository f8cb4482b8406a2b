//! Module for handling command-line arguments passed to
//! [`execve`](https://man7.org/linux/man-pages/man2/execve.2.html)-compatible binaries.

use alloc::{
    string::{String, ToString},
    vec::Vec,
};
use core::slice;

use crate::{ARG_ENV_LIM, ARG_LEN_LIM, ENV_LEN_LIM, Errno, NULL_BYTE};

/// Character separating the value of an [`EnvVar`] from its key.
const ENV_VAR_SEPARATOR: char = '=';

/// Environment variables parsed from the stack using Linux `execve` conventions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnvVar {
    /// The key of the environment variable.
    pub key: String,
    /// The value of the environment variable.
    pub value: String,
}
impl TryFrom<String> for EnvVar {
    type Error = Errno;

    fn try_from(string: String) -> Result<Self, Self::Error> {
        if let Some(eq_idx) = string.find(ENV_VAR_SEPARATOR) {
            // Can't have an empty key!
            if eq_idx == 0 {
                return Err(Errno::Einval);
            }
            let key = string[..eq_idx].to_string();
            let value = string[eq_idx + 1..].to_string();
            Ok(Self { key, value })
        } else {
            Err(Errno::Einval)
        }
    }
}
impl TryFrom<&str> for EnvVar {
    type Error = Errno;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::try_from(value.to_string())
    }
}
impl core::fmt::Display for EnvVar {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Parses `argv` and `envp` from the stack.
///
/// # Errors
///
/// This function returns an [`Errno`] in the following cases:
///
/// - [`Errno::Eilseq`]: The provided bytes are not valid UTF-8.
/// - [`Errno::E2big`]: The provided argument list is too long.
/// - [`Errno::Einval`]: `argc` does not match the actual number of arguments in `argv`.
///
/// # Safety
///
/// This function reads whatever happens to be at the provided stack pointer and validates input
/// as best as it can. Call it right at the entry point of the binary, with the pointer actually
/// pointing at the top of the initial stack.
#[allow(clippy::similar_names)]
pub unsafe fn parse_argv_envp(
    stack_ptr: *const usize,
) -> Result<(Vec<String>, Vec<EnvVar>), Errno> {
    // Keep track of the total size of `argv` and `envp`
    let mut total_size: usize = 0;

    // Argc is the first `usize`
    let argc: usize = unsafe { *stack_ptr };

    // Go past `argc` to reach the start of `argv` and start reading the raw bytes
    let mut ptr = unsafe { stack_ptr.add(1).cast::<*const u8>() };

    // Start parsing argv[0..argc]
    let mut argv = Vec::with_capacity(argc);
    for _ in 0..argc {
        let arg_ptr = unsafe { *ptr };
        if arg_ptr.is_null() {
            // argc does not match argv!
            return Err(Errno::Einval);
        }

        // Figure out the length of this arg
        // SAFETY: A limit to the argument length is set, returning `Err` if it's too long.
        let len = unsafe {
            slice::from_raw_parts(arg_ptr, ARG_LEN_LIM)
                .iter()
                .position(|&byte| byte == NULL_BYTE)
                .ok_or(Errno::E2big)?
        };
        total_size = inc_total_size(total_size, len)?;

        // SAFETY: The length has been calculated to end at the null byte.
        let arg_string: String = unsafe {
            String::from_utf8(slice::from_raw_parts(arg_ptr, len).to_vec())
                .map_err(|_| Errno::Eilseq)?
        };
        argv.push(arg_string);

        // Advance the pointer to point to the next `argv`.
        ptr = unsafe { ptr.add(1) };
    }

    // Double check to make sure we're pointing to the null terminator of argv.
    if unsafe { !(*ptr).is_null() } {
        // argc does not match argv!
        return Err(Errno::Einval);
    }

    // Advance pointer to envp
    ptr = unsafe { ptr.add(1) };

    // Start parsing envp
    let mut envp = Vec::new();
    loop {
        let env_ptr = unsafe { *ptr };
        if env_ptr.is_null() {
            break;
        }
        let len = unsafe {
            slice::from_raw_parts(env_ptr, ENV_LEN_LIM)
                .iter()
                .position(|&byte| byte == NULL_BYTE)
                .ok_or(Errno::E2big)?
        };
        total_size = inc_total_size(total_size, len)?;

        // SAFETY: The length has been calculated to end at the null byte.
        let env_base_string: String = unsafe {
            String::from_utf8(slice::from_raw_parts(env_ptr, len).to_vec())
                .map_err(|_| Errno::Eilseq)?
        };
        envp.push(EnvVar::try_from(env_base_string)?);

        // Advance the pointer to point to the next `envp`.
        ptr = unsafe { ptr.add(1) };
    }

    Ok((argv, envp))
}

fn inc_total_size(total_size: usize, increase: usize) -> Result<usize, Errno> {
    let result = total_size + increase;
    if result > ARG_ENV_LIM {
        Err(Errno::E2big)
    } else {
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_err;

    #[test_case]
    fn env_var_splits_once() {
        #[allow(clippy::unwrap_used)]
        let ev = EnvVar::try_from("TERM=linux-16color").unwrap();
        assert_eq!(ev.key, "TERM");
        assert_eq!(ev.value, "linux-16color");
    }

    #[test_case]
    fn env_var_needs_key_and_separator() {
        assert_err!(EnvVar::try_from("=value"), Errno::Einval);
        assert_err!(EnvVar::try_from("no separator"), Errno::Einval);
    }

    #[test_case]
    fn size_accounting() {
        assert_eq!(inc_total_size(1, 1), Ok(2));
        assert_err!(inc_total_size(ARG_ENV_LIM, 1), Errno::E2big);
    }
}
