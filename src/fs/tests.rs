//! Tests for the filesystem module.
#![allow(clippy::unwrap_used)]

use super::*;
use crate::assert_err;

const TEST_DIR: &str = "/tmp/blogd_fs_test";

fn test_path(name: &str) -> alloc::string::String {
    use alloc::string::ToString;
    let _ = unsafe { crate::syscall_result!(SyscallNum::Mkdir, NixString::from(TEST_DIR).as_ptr(), 0o777) };
    TEST_DIR.to_string() + "/" + name
}

#[test_case]
fn create_write_read() {
    let path = test_path("create_write_read");
    let contents = b"boot messages go here\n";

    {
        let file = OpenOptions::new()
            .read_write()
            .create(true)
            .open(path.as_str())
            .unwrap();
        assert_eq!(file.write(contents).unwrap(), contents.len());
    }

    let file = OpenOptions::new().open(path.as_str()).unwrap();
    let mut buf = [0_u8; 64];
    let n = file.read(&mut buf).unwrap();
    assert_eq!(&buf[..n], contents);

    rm(path.as_str()).unwrap();
}

#[test_case]
fn stat_regular_file() {
    let path = test_path("stat_regular_file");
    OpenOptions::new()
        .write_only()
        .create(true)
        .open(path.as_str())
        .unwrap();

    let st = stat(path.as_str()).unwrap();
    assert_eq!(st.file_type, FileType::RegularFile);

    rm(path.as_str()).unwrap();
}

#[test_case]
fn fifo_node() {
    let path = test_path("fifo_node");
    mkfifo(path.as_str(), FilePermissions::OWNER_ONLY).unwrap();

    let st = stat(path.as_str()).unwrap();
    assert_eq!(st.file_type, FileType::Fifo);
    assert_eq!(st.mode & 0o777, 0o600);

    rm(path.as_str()).unwrap();
}

#[test_case]
fn rename_moves() {
    let old = test_path("rename_old");
    let new = test_path("rename_new");
    OpenOptions::new()
        .write_only()
        .create(true)
        .open(old.as_str())
        .unwrap();

    rename(old.as_str(), new.as_str()).unwrap();

    assert_err!(stat(old.as_str()), Errno::Enoent);
    assert_eq!(stat(new.as_str()).unwrap().file_type, FileType::RegularFile);

    rm(new.as_str()).unwrap();
}

#[test_case]
fn status_flag_roundtrip() {
    let path = test_path("status_flag_roundtrip");
    let file = OpenOptions::new()
        .write_only()
        .create(true)
        .non_blocking(true)
        .open(path.as_str())
        .unwrap();

    assert!(file.status_flags().unwrap().contains(OpenFlags::O_NONBLOCK));

    let mut flags = file.status_flags().unwrap();
    flags.remove(OpenFlags::O_NONBLOCK);
    file.set_status_flags(flags).unwrap();
    assert!(!file.status_flags().unwrap().contains(OpenFlags::O_NONBLOCK));

    rm(path.as_str()).unwrap();
}

#[test_case]
fn missing_path() {
    assert_err!(stat("/tmp/blogd_fs_test/no_such_entry"), Errno::Enoent);
    assert_err!(
        OpenOptions::new().open("/tmp/blogd_fs_test/no_such_entry"),
        Errno::Enoent
    );
}

#[test_case]
fn file_type_decode() {
    assert_eq!(FileType::from(0o020_620_u32), FileType::CharacterDevice);
    assert_eq!(FileType::from(0o100_644_u32), FileType::RegularFile);
    assert_eq!(FileType::from(0o010_600_u32), FileType::Fifo);
    assert_eq!(FileType::from(0o120_777_u32), FileType::Symlink);
}

#[test_case]
fn volatile_magic() {
    assert!(FsMagic::TMPFS.is_volatile());
    assert!(FsMagic::RAMFS.is_volatile());
    assert!(FsMagic::CRAMFS_WEND.is_volatile());
    // ext4
    assert!(!FsMagic::from(0xef53).is_volatile());
}
