//! Path normalization and exclusion filtering.
//!
//! Archive entry names always use `/` separators. Exclusions arrive in that
//! form and are converted to OS-native paths once, so they compare directly
//! against paths produced by the directory walk.

use crate::ArchiveError;
use crate::Result;
use std::path::MAIN_SEPARATOR;
use std::path::MAIN_SEPARATOR_STR;
use std::path::Path;
use std::path::PathBuf;

/// Converts OS-native separators in `name` to `/`.
///
/// # Examples
///
/// ```
/// use detzip_core::filters::to_slash;
///
/// assert_eq!(to_slash("dir/file.txt"), "dir/file.txt");
/// ```
#[must_use]
pub fn to_slash(name: &str) -> String {
    if MAIN_SEPARATOR == '/' {
        name.to_string()
    } else {
        name.replace(MAIN_SEPARATOR_STR, "/")
    }
}

/// Converts `/` separators in `name` to the OS-native separator.
///
/// # Examples
///
/// ```
/// use detzip_core::filters::from_slash;
/// use std::path::Path;
///
/// assert_eq!(from_slash("a/b/c.txt"), Path::new("a").join("b").join("c.txt"));
/// ```
#[must_use]
pub fn from_slash(name: &str) -> PathBuf {
    if MAIN_SEPARATOR == '/' {
        PathBuf::from(name)
    } else {
        PathBuf::from(name.replace('/', MAIN_SEPARATOR_STR))
    }
}

/// Converts an archive-relative path into a ZIP entry name.
///
/// ZIP names use `/` regardless of platform and must be valid UTF-8. Names
/// are computed while walking, so a failure is reported as a walk error.
pub fn entry_name(path: &Path) -> Result<String> {
    let path_str = path.to_str().ok_or_else(|| ArchiveError::Walk {
        operation: "naming entry",
        path: path.to_path_buf(),
        source: std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "path is not valid UTF-8",
        ),
    })?;

    Ok(to_slash(path_str))
}

/// Returns the entry name for a single archived file: its base name only.
///
/// # Examples
///
/// ```
/// use detzip_core::filters::file_entry_name;
/// use std::path::Path;
///
/// let name = file_entry_name(Path::new("/data/reports/report.csv")).unwrap();
/// assert_eq!(name, "report.csv");
/// ```
pub fn file_entry_name(path: &Path) -> Result<String> {
    let file_name = path.file_name().ok_or_else(|| ArchiveError::InvalidInput {
        path: path.to_path_buf(),
        reason: "cannot determine file name".to_string(),
    })?;
    let name = file_name.to_str().ok_or_else(|| ArchiveError::InvalidInput {
        path: path.to_path_buf(),
        reason: "file name is not valid UTF-8".to_string(),
    })?;

    Ok(name.to_string())
}

/// Converts a `/`-separated exclusion list to OS-native paths.
#[must_use]
pub fn normalize_excludes(excludes: &[String]) -> Vec<PathBuf> {
    excludes.iter().map(|exclude| from_slash(exclude)).collect()
}

/// Checks whether an archive-relative path is excluded.
///
/// Matching is exact equality of the path strings. Empty exclusions are
/// ignored.
///
/// # Examples
///
/// ```
/// use detzip_core::filters::is_excluded;
/// use detzip_core::filters::normalize_excludes;
/// use std::path::Path;
///
/// let excludes = normalize_excludes(&["build".to_string(), String::new()]);
/// assert!(is_excluded(Path::new("build"), &excludes));
/// assert!(!is_excluded(Path::new("build/out.txt"), &excludes));
/// assert!(!is_excluded(Path::new(""), &excludes));
/// ```
#[must_use]
pub fn is_excluded(archive_path: &Path, excludes: &[PathBuf]) -> bool {
    excludes
        .iter()
        .filter(|exclude| !exclude.as_os_str().is_empty())
        .any(|exclude| exclude.as_os_str() == archive_path.as_os_str())
}

/// Computes the archive-relative path of `path` found while walking `root`.
///
/// The path relative to `root` is joined onto `base`, which is empty for the
/// top-level walk and the symlink's archive path inside a followed link.
///
/// # Examples
///
/// ```
/// use detzip_core::filters::compute_archive_path;
/// use std::path::Path;
///
/// let path = compute_archive_path(
///     Path::new("/real/assets/logo.png"),
///     Path::new("/real/assets"),
///     Path::new("static"),
/// )
/// .unwrap();
/// assert_eq!(path, Path::new("static/logo.png"));
/// ```
pub fn compute_archive_path(path: &Path, root: &Path, base: &Path) -> Result<PathBuf> {
    let relative = path.strip_prefix(root).map_err(|_| ArchiveError::Walk {
        operation: "relativizing",
        path: path.to_path_buf(),
        source: std::io::Error::other(format!("not under walk root {}", root.display())),
    })?;

    Ok(base.join(relative))
}
