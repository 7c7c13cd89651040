//! Deterministic ZIP archive construction.
//!
//! Every operation opens the target, writes its entries and closes the
//! archive again. Entries carry a zero modification time and are written in
//! a fixed order, so identical inputs give byte-identical archives.

use crate::ArchiveDirOptions;
use crate::ArchiveError;
use crate::ArchiveReport;
use crate::Result;
use crate::config::parse_file_mode;
use crate::filters;
use crate::validate;
use crate::walker::DirWalker;
use crate::walker::WalkEntryKind;
use crate::writer::ArchiveWriter;
use crate::writer::entry_options;
use crate::writer::file_options;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

/// Tracing target for archive operations.
pub const TRACING_TARGET: &str = "detzip_core::archiver";

/// Builds an archive from one of four kinds of source.
pub trait Archiver {
    /// Archives `content` as a single entry called `name`.
    fn archive_content(&self, content: &[u8], name: &str) -> Result<ArchiveReport>;

    /// Archives one file under its base name.
    fn archive_file(&self, path: &Path) -> Result<ArchiveReport>;

    /// Archives the files under `path`, relative to `path`.
    fn archive_dir(&self, path: &Path, options: &ArchiveDirOptions) -> Result<ArchiveReport>;

    /// Archives named buffers, written in ascending name order.
    fn archive_multiple(&self, content: &HashMap<String, Vec<u8>>) -> Result<ArchiveReport>;
}

/// [`Archiver`] producing a ZIP file at a fixed target path.
///
/// # Examples
///
/// ```no_run
/// use detzip_core::ArchiveDirOptions;
/// use detzip_core::Archiver;
/// use detzip_core::ZipArchiver;
/// use std::path::Path;
///
/// let archiver = ZipArchiver::new("lambda.zip").with_output_file_mode("0644");
/// let options = ArchiveDirOptions::default().with_excludes(vec!["tests".to_string()]);
///
/// let report = archiver.archive_dir(Path::new("build/lambda"), &options)?;
/// println!("archived {} files", report.entries_written);
/// # Ok::<(), detzip_core::ArchiveError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ZipArchiver {
    target: PathBuf,
    output_file_mode: String,
}

impl ZipArchiver {
    /// Creates an archiver writing to `target`. Nothing is touched until an
    /// archive operation runs.
    #[must_use]
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            output_file_mode: String::new(),
        }
    }

    /// Sets the permission bits applied to file and directory entries.
    ///
    /// An empty string leaves permissions derived from the source files.
    /// The value is parsed each time an entry is written, see
    /// [`parse_file_mode`].
    pub fn set_output_file_mode(&mut self, mode: impl Into<String>) {
        self.output_file_mode = mode.into();
    }

    /// Builder form of [`set_output_file_mode`](Self::set_output_file_mode).
    #[must_use]
    pub fn with_output_file_mode(mut self, mode: impl Into<String>) -> Self {
        self.set_output_file_mode(mode);
        self
    }

    /// Returns the configured output file mode string.
    #[must_use]
    pub fn output_file_mode(&self) -> &str {
        &self.output_file_mode
    }

    /// Returns the archive path.
    #[must_use]
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Creates or truncates the target and returns a writer for it.
    pub fn open(&self) -> Result<ArchiveWriter> {
        ArchiveWriter::create(&self.target)
    }

    fn file_mode(&self) -> Result<Option<u32>> {
        if self.output_file_mode.is_empty() {
            return Ok(None);
        }
        parse_file_mode(&self.output_file_mode).map(Some)
    }

    fn write_dir_entries(
        &self,
        writer: &mut ArchiveWriter,
        path: &Path,
        options: &ArchiveDirOptions,
        report: &mut ArchiveReport,
    ) -> Result<()> {
        let stats = DirWalker::new(options).walk(path, |entry| {
            let name = filters::entry_name(&entry.archive_path)?;

            match entry.kind {
                WalkEntryKind::File { metadata } => {
                    let options = file_options(&metadata, self.file_mode()?);
                    let content = fs::read(&entry.path)
                        .map_err(ArchiveError::walk("reading file for archival", &entry.path))?;
                    writer.write_entry(&name, options, &content)?;
                    report.record_entry(content.len());
                }
                WalkEntryKind::Symlink { target, metadata } => {
                    let options = file_options(&metadata, self.file_mode()?);
                    let link_target = filters::entry_name(&target)?;
                    writer.write_symlink(&name, &link_target, options)?;
                    report.record_entry(link_target.len());
                }
            }

            Ok(())
        })?;

        report.entries_excluded = stats.excluded;
        report.symlinks_followed = stats.symlinks_followed;
        Ok(())
    }
}

impl Archiver for ZipArchiver {
    fn archive_content(&self, content: &[u8], name: &str) -> Result<ArchiveReport> {
        let mut report = ArchiveReport::new();
        let mut writer = self.open()?;

        let name = filters::to_slash(name);
        writer.write_entry(&name, entry_options(), content)?;
        report.record_entry(content.len());

        writer.close()?;

        tracing::debug!(
            target: TRACING_TARGET,
            archive = %self.target.display(),
            entry = %name,
            bytes = report.bytes_written,
            "Archived content"
        );

        Ok(report)
    }

    fn archive_file(&self, path: &Path) -> Result<ArchiveReport> {
        let metadata = validate::assert_valid_file(path)?;
        let content = fs::read(path).map_err(|e| {
            ArchiveError::Io(std::io::Error::new(
                e.kind(),
                format!("cannot read {}: {e}", path.display()),
            ))
        })?;

        let mut report = ArchiveReport::new();
        let mut writer = self.open()?;

        let name = filters::file_entry_name(path)?;
        let options = file_options(&metadata, self.file_mode()?);
        writer.write_entry(&name, options, &content)?;
        report.record_entry(content.len());

        writer.close()?;

        tracing::debug!(
            target: TRACING_TARGET,
            source = %path.display(),
            archive = %self.target.display(),
            entry = %name,
            bytes = report.bytes_written,
            "Archived file"
        );

        Ok(report)
    }

    fn archive_dir(&self, path: &Path, options: &ArchiveDirOptions) -> Result<ArchiveReport> {
        validate::assert_valid_dir(path)?;

        tracing::debug!(
            target: TRACING_TARGET,
            source = %path.display(),
            archive = %self.target.display(),
            excludes = options.excludes.len(),
            follow_symlinks = !options.exclude_symlink_directories,
            "Archiving directory"
        );

        let mut report = ArchiveReport::new();
        let mut writer = self.open()?;

        if let Err(error) = self.write_dir_entries(&mut writer, path, options, &mut report) {
            tracing::debug!(
                target: TRACING_TARGET,
                archive = %self.target.display(),
                entries_written = report.entries_written,
                "Directory archive stopped early, keeping partial archive"
            );
            return Err(error);
        }

        writer.close()?;

        tracing::debug!(
            target: TRACING_TARGET,
            archive = %self.target.display(),
            entries = report.entries_written,
            excluded = report.entries_excluded,
            symlinks_followed = report.symlinks_followed,
            bytes = report.bytes_written,
            "Archived directory"
        );

        Ok(report)
    }

    fn archive_multiple(&self, content: &HashMap<String, Vec<u8>>) -> Result<ArchiveReport> {
        let mut names: Vec<&String> = content.keys().collect();
        names.sort();

        let mut report = ArchiveReport::new();
        let mut writer = self.open()?;

        for name in names {
            let data = &content[name];
            writer.write_entry(&filters::to_slash(name), entry_options(), data)?;
            report.record_entry(data.len());
        }

        writer.close()?;

        tracing::debug!(
            target: TRACING_TARGET,
            archive = %self.target.display(),
            entries = report.entries_written,
            bytes = report.bytes_written,
            "Archived content map"
        );

        Ok(report)
    }
}
