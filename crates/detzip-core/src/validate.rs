//! Source path validation.
//!
//! Archive operations trust these checks and do not re-validate afterwards.

use crate::ArchiveError;
use crate::Result;
use std::fs::Metadata;
use std::path::Path;

/// Checks that `path` exists and is not a directory.
///
/// Symlinks are followed, so a link to a regular file is accepted.
pub fn assert_valid_file(path: &Path) -> Result<Metadata> {
    let metadata = stat(path)?;
    if metadata.is_dir() {
        return Err(ArchiveError::InvalidInput {
            path: path.to_path_buf(),
            reason: "expected a file, found a directory".to_string(),
        });
    }
    Ok(metadata)
}

/// Checks that `path` exists and is a directory.
pub fn assert_valid_dir(path: &Path) -> Result<Metadata> {
    let metadata = stat(path)?;
    if !metadata.is_dir() {
        return Err(ArchiveError::InvalidInput {
            path: path.to_path_buf(),
            reason: "expected a directory".to_string(),
        });
    }
    Ok(metadata)
}

fn stat(path: &Path) -> Result<Metadata> {
    std::fs::metadata(path).map_err(|e| ArchiveError::InvalidInput {
        path: path.to_path_buf(),
        reason: if e.kind() == std::io::ErrorKind::NotFound {
            "does not exist".to_string()
        } else {
            format!("cannot read metadata: {e}")
        },
    })
}
