//! Error types for archive construction operations.

use std::path::PathBuf;
use thiserror::Error;
use zip::result::ZipError;

/// Result type alias using `ArchiveError`.
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Broad classification of an [`ArchiveError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The source path is not a valid file or directory.
    InvalidInput,
    /// A filesystem operation failed, including any failure raised mid-walk.
    Io,
    /// The ZIP encoder rejected a header or entry.
    Format,
    /// The configured output file mode is not an unsigned integer literal.
    ConfigParse,
}

/// Errors that can occur while building an archive.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Source path failed validation.
    #[error("invalid input {path}: {reason}")]
    InvalidInput {
        /// The rejected path.
        path: PathBuf,
        /// Why the path was rejected.
        reason: String,
    },

    /// A filesystem operation failed while walking a source directory.
    #[error("error encountered during file walk: {operation} {path}: {source}")]
    Walk {
        /// What was being done when the failure happened.
        operation: &'static str,
        /// Path of the node being processed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A followed symlink leads back into a directory already being walked.
    #[error("symlink cycle detected at {path} (resolves to {target})")]
    SymlinkCycle {
        /// The symlink path.
        path: PathBuf,
        /// The canonical directory it resolves to.
        target: PathBuf,
    },

    /// The ZIP encoder failed to create or finish an entry.
    #[error("error {operation} inside archive: {name}: {source}")]
    Zip {
        /// The encoder operation that failed.
        operation: &'static str,
        /// Archive entry name, empty when finishing the archive.
        name: String,
        /// Underlying ZIP error.
        #[source]
        source: ZipError,
    },

    /// The output file mode could not be parsed.
    #[error("error parsing output_file_mode value: {value}")]
    InvalidFileMode {
        /// The configured string.
        value: String,
    },
}

impl ArchiveError {
    /// Returns the broad kind of this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use detzip_core::ArchiveError;
    /// use detzip_core::ErrorKind;
    ///
    /// let err = ArchiveError::InvalidFileMode {
    ///     value: "notanumber".to_string(),
    /// };
    /// assert_eq!(err.kind(), ErrorKind::ConfigParse);
    /// ```
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) | Self::Walk { .. } | Self::SymlinkCycle { .. } => ErrorKind::Io,
            Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::Zip { .. } => ErrorKind::Format,
            Self::InvalidFileMode { .. } => ErrorKind::ConfigParse,
        }
    }

    pub(crate) fn walk(
        operation: &'static str,
        path: impl Into<PathBuf>,
    ) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Walk {
            operation,
            path,
            source,
        }
    }

    pub(crate) fn zip(
        operation: &'static str,
        name: impl Into<String>,
    ) -> impl FnOnce(ZipError) -> Self {
        let name = name.into();
        move |source| Self::Zip {
            operation,
            name,
            source,
        }
    }
}
