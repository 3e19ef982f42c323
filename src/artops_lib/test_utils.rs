use std::fs;
use std::path::Path;
use std::path::PathBuf;

use crate::file_system::FileSystemInteractor;

pub const REAL_FS: FileSystemInteractor = FileSystemInteractor { dry_run: false };

pub const DRY_FS: FileSystemInteractor = FileSystemInteractor { dry_run: true };

/// Create a file of `size` zero bytes in `dir`.
pub fn create_sized_file(dir: &Path, name: &str, size: usize) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, vec![0u8; size]).unwrap();
    path
}

/// Create a text file in `dir`.
pub fn create_text_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}
