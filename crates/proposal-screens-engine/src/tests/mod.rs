use std::path::PathBuf;
use tempfile::TempDir;

pub fn create_test_screens_dir() -> TempDir {
    tempfile::tempdir().expect("failed to create temp screens dir")
}

/// Writes `content` at `relative` below `dir`, creating parents.
pub fn create_test_file(dir: &TempDir, relative: &str, content: &str) -> PathBuf {
    let path = dir.path().join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("failed to create parent dirs");
    }
    std::fs::write(&path, content).expect("failed to write test file");
    path
}
