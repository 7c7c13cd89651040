//! Archive writer lifecycle.
//!
//! An [`ArchiveWriter`] owns the output file and the ZIP encoder for the
//! duration of one archive operation. Closing finishes the encoder, flushes
//! the buffered stream and then releases the file handle. Dropping an
//! unclosed writer closes it, so every exit path leaves a finalized archive.

use crate::ArchiveError;
use crate::Result;
use std::fs::File;
use std::fs::Metadata;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use zip::CompressionMethod;
use zip::DateTime;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Tracing target for writer lifecycle events.
pub const TRACING_TARGET: &str = "detzip_core::writer";

/// Entries at or above this size need ZIP64 headers.
const LARGE_FILE_THRESHOLD: usize = 0xFFFF_FFFF;

/// Open ZIP encoder bound to an output file.
///
/// # Examples
///
/// ```no_run
/// use detzip_core::writer::ArchiveWriter;
/// use detzip_core::writer::entry_options;
/// use std::path::Path;
///
/// let mut writer = ArchiveWriter::create(Path::new("out.zip"))?;
/// writer.write_entry("hello.txt", entry_options(), b"hello")?;
/// writer.close()?;
/// # Ok::<(), detzip_core::ArchiveError>(())
/// ```
pub struct ArchiveWriter {
    target: PathBuf,
    zip: Option<ZipWriter<BufWriter<File>>>,
}

impl ArchiveWriter {
    /// Creates or truncates `target` and attaches a fresh ZIP encoder.
    pub fn create(target: &Path) -> Result<Self> {
        let file = File::create(target).map_err(|e| {
            ArchiveError::Io(std::io::Error::new(
                e.kind(),
                format!("cannot create archive {}: {e}", target.display()),
            ))
        })?;

        tracing::debug!(
            target: TRACING_TARGET,
            path = %target.display(),
            "Opened archive"
        );

        Ok(Self {
            target: target.to_path_buf(),
            zip: Some(ZipWriter::new(BufWriter::new(file))),
        })
    }

    /// Returns the path of the archive being written.
    #[must_use]
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Returns `true` until [`close`](Self::close) has run.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.zip.is_some()
    }

    /// Writes one file entry with the given options and content.
    pub fn write_entry(
        &mut self,
        name: &str,
        options: SimpleFileOptions,
        content: &[u8],
    ) -> Result<()> {
        let options = options.large_file(content.len() >= LARGE_FILE_THRESHOLD);
        let zip = self.zip_mut()?;

        zip.start_file(name, options)
            .map_err(ArchiveError::zip("creating file", name))?;
        zip.write_all(content).map_err(|e| {
            ArchiveError::Io(std::io::Error::new(
                e.kind(),
                format!("cannot write entry {name}: {e}"),
            ))
        })?;

        tracing::trace!(
            target: TRACING_TARGET,
            entry = name,
            bytes = content.len(),
            "Wrote entry"
        );

        Ok(())
    }

    /// Writes a symlink entry pointing at `link_target`.
    pub fn write_symlink(
        &mut self,
        name: &str,
        link_target: &str,
        options: SimpleFileOptions,
    ) -> Result<()> {
        self.zip_mut()?
            .add_symlink(name, link_target, options)
            .map_err(ArchiveError::zip("creating symlink", name))?;

        tracing::trace!(
            target: TRACING_TARGET,
            entry = name,
            link_target,
            "Wrote symlink"
        );

        Ok(())
    }

    /// Finishes the archive and releases the output file.
    ///
    /// The ZIP encoder is finished first, then the buffered stream is flushed
    /// and the file handle dropped. Calling `close` on a closed writer does
    /// nothing.
    pub fn close(&mut self) -> Result<()> {
        let Some(zip) = self.zip.take() else {
            return Ok(());
        };

        let stream = zip
            .finish()
            .map_err(ArchiveError::zip("finishing archive", ""))?;
        let file = stream.into_inner().map_err(|e| {
            let e = e.into_error();
            ArchiveError::Io(std::io::Error::new(
                e.kind(),
                format!("cannot flush archive {}: {e}", self.target.display()),
            ))
        })?;
        drop(file);

        tracing::debug!(
            target: TRACING_TARGET,
            path = %self.target.display(),
            "Closed archive"
        );

        Ok(())
    }

    fn zip_mut(&mut self) -> Result<&mut ZipWriter<BufWriter<File>>> {
        self.zip.as_mut().ok_or_else(|| {
            ArchiveError::Io(std::io::Error::other(format!(
                "archive writer for {} is closed",
                self.target.display()
            )))
        })
    }
}

impl Drop for ArchiveWriter {
    fn drop(&mut self) {
        if let Err(error) = self.close() {
            tracing::warn!(
                target: TRACING_TARGET,
                path = %self.target.display(),
                error = %error,
                "Failed to finalize archive on drop"
            );
        }
    }
}

impl std::fmt::Debug for ArchiveWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveWriter")
            .field("target", &self.target)
            .field("open", &self.is_open())
            .finish()
    }
}

/// Default options for every entry: zero modification time.
///
/// The zero value is the DOS epoch, 1980-01-01 00:00:00.
#[must_use]
pub fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default().last_modified_time(DateTime::default())
}

/// Options for entries built from filesystem nodes.
///
/// Forces deflate on top of [`entry_options`]. `mode` overrides the
/// permission bits; without it they are taken from `metadata` where the
/// platform exposes them.
#[must_use]
pub fn file_options(metadata: &Metadata, mode: Option<u32>) -> SimpleFileOptions {
    let options = entry_options().compression_method(CompressionMethod::Deflated);
    match mode.or_else(|| metadata_mode(metadata)) {
        Some(mode) => options.unix_permissions(mode),
        None => options,
    }
}

#[cfg(unix)]
fn metadata_mode(metadata: &Metadata) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    Some(metadata.permissions().mode())
}

#[cfg(not(unix))]
fn metadata_mode(_metadata: &Metadata) -> Option<u32> {
    None
}
