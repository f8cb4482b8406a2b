//! Resolving character device numbers to real `/dev` paths.

use alloc::{
    format,
    string::{String, ToString},
    vec::Vec,
};

use crate::{
    Errno, fs,
    fs::{DirEntType, FileType, OpenOptions},
};

/// How deep below `/dev` the fallback walk descends.
const WALK_DEPTH_LIMIT: u32 = 10;

/// Packs a major/minor pair the way the kernel encodes `st_rdev`.
#[must_use]
pub fn makedev(major: u32, minor: u32) -> u64 {
    (u64::from(major & 0xfff) << 8)
        | u64::from(minor & 0xff)
        | (u64::from(minor & !0xff) << 12)
        | (u64::from(major & !0xfff) << 32)
}

/// The major number of a packed device number.
#[must_use]
pub fn major(dev: u64) -> u32 {
    #[allow(clippy::cast_possible_truncation)]
    {
        (((dev >> 8) & 0xfff) | ((dev >> 32) & !0xfff)) as u32
    }
}

/// The minor number of a packed device number.
#[must_use]
pub fn minor(dev: u64) -> u32 {
    #[allow(clippy::cast_possible_truncation)]
    {
        ((dev & 0xff) | ((dev >> 12) & !0xff)) as u32
    }
}

/// Resolves a character device number to a path under `/dev`.
///
/// The `/dev/char/<major>:<minor>` symlink farm is tried first; when it is absent (static
/// `/dev`, early udev) the tree below `/dev` is walked looking for a matching character device
/// node, symlinks untraversed.
///
/// # Errors
///
/// This function returns [`Errno::Enodev`] when no node with the given number exists.
pub fn resolve(dev: u64) -> Result<String, Errno> {
    let link = format!("/dev/char/{}:{}", major(dev), minor(dev));
    if let Ok(target) = fs::readlink(link.as_str()) {
        let path = if target.starts_with('/') {
            target
        } else {
            // The farm links relative to /dev/char.
            format!("/dev/{}", target.trim_start_matches("../"))
        };
        if let Ok(st) = fs::stat(path.as_str())
            && st.file_type == FileType::CharacterDevice
            && st.rdev == dev
        {
            return Ok(path);
        }
    }

    walk("/dev", dev, WALK_DEPTH_LIMIT)
}

fn walk(dir: &str, dev: u64, depth: u32) -> Result<String, Errno> {
    if depth == 0 {
        return Err(Errno::Enodev);
    }

    let handle = OpenOptions::new().open(dir)?;
    let mut subdirs: Vec<String> = Vec::new();

    for entry in handle.dir_ents()? {
        if entry.name == "." || entry.name == ".." {
            continue;
        }
        let path = dir.to_string() + "/" + &entry.name;

        match entry.d_type {
            DirEntType::CharacterDevice => {
                if let Ok(st) = fs::lstat(path.as_str())
                    && st.file_type == FileType::CharacterDevice
                    && st.rdev == dev
                {
                    return Ok(path);
                }
            }
            DirEntType::Directory => subdirs.push(path),
            // Entry types the filesystem couldn't name get a second look.
            DirEntType::Unknown => {
                if let Ok(st) = fs::lstat(path.as_str()) {
                    match st.file_type {
                        FileType::CharacterDevice if st.rdev == dev => return Ok(path),
                        FileType::Directory => subdirs.push(path),
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    for subdir in subdirs {
        if let Ok(found) = walk(subdir.as_str(), dev, depth - 1) {
            return Ok(found);
        }
    }

    Err(Errno::Enodev)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_case]
    fn dev_number_round_trip() {
        let dev = makedev(4, 64);
        assert_eq!(major(dev), 4);
        assert_eq!(minor(dev), 64);

        // Large minors spill into the high bits.
        let dev = makedev(136, 300);
        assert_eq!(major(dev), 136);
        assert_eq!(minor(dev), 300);
    }

    #[test_case]
    fn resolve_dev_null() {
        // 1:3 is /dev/null everywhere.
        if let Ok(path) = resolve(makedev(1, 3)) {
            #[allow(clippy::unwrap_used)]
            let st = fs::stat(path.as_str()).unwrap();
            assert_eq!(st.file_type, FileType::CharacterDevice);
            assert_eq!(st.rdev, makedev(1, 3));
        }
    }

    #[test_case]
    fn unknown_device_is_enodev() {
        use crate::assert_err;
        assert_err!(resolve(makedev(4093, 4094)), Errno::Enodev);
    }
}
