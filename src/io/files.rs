//! File access for captures and profiles.
//!
//! Captures are raw device output saved for offline replay; profiles are
//! JSON-serialised [`PreferenceForm`]s.

use crate::core::PreferenceForm;
use crate::error::{IoError, Result};
use std::path::Path;

/// Largest capture accepted for replay (16MB).
const MAX_CAPTURE_SIZE: u64 = 16 * 1024 * 1024;

/// Reads a capture file as raw bytes.
///
/// # Errors
///
/// Returns an error if the file is missing, unreadable or too large.
pub fn read_capture<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    let path_ref = path.as_ref();
    let path_str = path_ref.to_string_lossy().to_string();

    if !path_ref.exists() {
        return Err(IoError::FileNotFound { path: path_str }.into());
    }

    let size = std::fs::metadata(path_ref)
        .map_err(|e| IoError::ReadFailed {
            path: path_str.clone(),
            reason: e.to_string(),
        })?
        .len();
    if size > MAX_CAPTURE_SIZE {
        return Err(IoError::ReadFailed {
            path: path_str,
            reason: format!("file too large: {size} bytes (max: {MAX_CAPTURE_SIZE} bytes)"),
        }
        .into());
    }

    std::fs::read(path_ref).map_err(|e| {
        IoError::ReadFailed {
            path: path_str,
            reason: e.to_string(),
        }
        .into()
    })
}

/// Loads a profile.
///
/// Missing fields default to empty.
pub fn read_profile<P: AsRef<Path>>(path: P) -> Result<PreferenceForm> {
    let path_ref = path.as_ref();
    let path_str = path_ref.to_string_lossy().to_string();

    if !path_ref.exists() {
        return Err(IoError::FileNotFound { path: path_str }.into());
    }

    let content = std::fs::read_to_string(path_ref).map_err(|e| IoError::ReadFailed {
        path: path_str.clone(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&content)
        .map_err(|e| IoError::Profile(format!("{path_str}: {e}")).into())
}

/// Saves a profile as pretty-printed JSON.
pub fn write_profile<P: AsRef<Path>>(path: P, form: &PreferenceForm) -> Result<()> {
    let mut json = serde_json::to_string_pretty(form)?;
    json.push('\n');
    write_file(path, &json)
}

/// Writes content to a file, creating parent directories if needed.
///
/// # Errors
///
/// Returns an error if directory creation or file writing fails.
pub fn write_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    let path_ref = path.as_ref();
    let path_str = path_ref.to_string_lossy().to_string();

    if let Some(parent) = path_ref.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|e| IoError::WriteFailed {
            path: parent.to_string_lossy().to_string(),
            reason: e.to_string(),
        })?;
    }

    std::fs::write(path_ref, content).map_err(|e| {
        IoError::WriteFailed {
            path: path_str,
            reason: e.to_string(),
        }
        .into()
    })
}
