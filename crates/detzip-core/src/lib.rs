//! Deterministic ZIP archive construction.
//!
//! `detzip-core` packages raw content, single files, directory trees or maps
//! of named buffers into ZIP archives whose bytes depend only on the input:
//! entries are written in a fixed order with a zero modification time, so
//! repeated builds produce identical hashes.
//!
//! # Examples
//!
//! ```no_run
//! use detzip_core::ArchiveDirOptions;
//! use detzip_core::Archiver;
//! use detzip_core::ZipArchiver;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let archiver = ZipArchiver::new("function.zip");
//! let options = ArchiveDirOptions::default().with_excludes(vec![".git".to_string()]);
//! let report = archiver.archive_dir(Path::new("function"), &options)?;
//! println!("Archived {} files", report.entries_written);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod archiver;
pub mod config;
pub mod error;
pub mod filters;
pub mod report;
pub mod validate;
pub mod walker;
pub mod writer;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-export main API types
pub use archiver::Archiver;
pub use archiver::ZipArchiver;
pub use config::ArchiveDirOptions;
pub use error::ArchiveError;
pub use error::ErrorKind;
pub use error::Result;
pub use report::ArchiveReport;
pub use writer::ArchiveWriter;
