//! Screens on disk.
//!
//! Each screen is a directory under the screens root holding
//! `original.html` and `edited.html`. Saves overwrite whatever is there:
//! two concurrent saves of one screen race and the last write wins.

use crate::models::Screen;
use relative_path::{RelativePath, RelativePathBuf};
use std::fs;
use std::path::{Path, PathBuf};

const ORIGINAL_FILE: &str = "original.html";
const EDITED_FILE: &str = "edited.html";

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid screens directory: {0}")]
    InvalidScreensDir(String),
    #[error("Invalid screen name: {0:?}")]
    InvalidName(String),
}

/// Read a file below the screens root
pub fn read_file(relative_path: &RelativePath, screens_root: &Path) -> Result<String, IoError> {
    let absolute_path = relative_path.to_path(screens_root);
    if !absolute_path.exists() {
        return Err(IoError::NotFound(absolute_path));
    }
    fs::read_to_string(&absolute_path).map_err(IoError::Io)
}

/// Write a file below the screens root, creating directories as needed
pub fn write_file(
    relative_path: &RelativePath,
    screens_root: &Path,
    content: &str,
) -> Result<(), IoError> {
    let absolute_path = relative_path.to_path(screens_root);

    if let Some(parent) = absolute_path.parent() {
        fs::create_dir_all(parent).map_err(IoError::Io)?;
    }

    fs::write(&absolute_path, content).map_err(IoError::Io)
}

fn screen_dir(name: &str) -> Result<RelativePathBuf, IoError> {
    let bad = name.trim().is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\']);
    if bad {
        return Err(IoError::InvalidName(name.to_string()));
    }
    Ok(RelativePathBuf::from(name))
}

/// Import an HTML file as a new screen named after the file
pub fn import_file(path: &Path) -> Result<Screen, IoError> {
    if !path.exists() {
        return Err(IoError::NotFound(path.to_path_buf()));
    }
    let html = fs::read_to_string(path).map_err(IoError::Io)?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    Ok(Screen::import(Screen::name_from_file(file_name), html))
}

/// Store a screen. `original.html` is only written when absent.
pub fn save_screen(screens_root: &Path, screen: &Screen) -> Result<(), IoError> {
    let dir = screen_dir(screen.name())?;
    let original = dir.join(ORIGINAL_FILE);
    if !original.to_path(screens_root).exists() {
        write_file(&original, screens_root, screen.original_html())?;
    }
    write_file(&dir.join(EDITED_FILE), screens_root, screen.edited_html())?;
    log::debug!("saved screen {:?}", screen.name());
    Ok(())
}

/// Load a stored screen. A missing `edited.html` reads as no edits.
pub fn load_screen(screens_root: &Path, name: &str) -> Result<Screen, IoError> {
    let dir = screen_dir(name)?;
    let original = read_file(&dir.join(ORIGINAL_FILE), screens_root)?;
    let edited = match read_file(&dir.join(EDITED_FILE), screens_root) {
        Ok(edited) => edited,
        Err(IoError::NotFound(_)) => String::new(),
        Err(err) => return Err(err),
    };
    Ok(Screen::from_parts(name, original, edited))
}

/// Names of all stored screens, sorted
pub fn scan_screens(screens_root: &Path) -> Result<Vec<String>, IoError> {
    validate_screens_dir(screens_root)?;

    let mut names = Vec::new();
    for entry in fs::read_dir(screens_root).map_err(IoError::Io)? {
        let entry = entry.map_err(IoError::Io)?;
        let path = entry.path();
        if path.is_dir()
            && path.join(ORIGINAL_FILE).is_file()
            && let Some(name) = path.file_name().and_then(|n| n.to_str())
        {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}

pub fn validate_screens_dir(path: &Path) -> Result<(), IoError> {
    if !path.exists() || !path.is_dir() {
        return Err(IoError::InvalidScreensDir(
            "Directory does not exist".to_string(),
        ));
    }

    Ok(())
}
