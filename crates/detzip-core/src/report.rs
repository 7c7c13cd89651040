//! Archive operation reporting.

/// Report of one archive operation.
///
/// Holds counters only, so two runs over the same input produce equal
/// reports.
///
/// # Examples
///
/// ```
/// use detzip_core::ArchiveReport;
///
/// let mut report = ArchiveReport::default();
/// report.record_entry(1024);
/// report.record_entry(512);
///
/// assert_eq!(report.entries_written, 2);
/// assert_eq!(report.bytes_written, 1536);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveReport {
    /// Number of entries written to the archive.
    pub entries_written: usize,

    /// Total uncompressed bytes written.
    pub bytes_written: u64,

    /// Number of walked nodes dropped by the exclusion list.
    ///
    /// An excluded directory counts once, regardless of its contents.
    pub entries_excluded: usize,

    /// Number of symlinks resolved and followed.
    pub symlinks_followed: usize,
}

impl ArchiveReport {
    /// Creates a new empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one written entry of `bytes` uncompressed bytes.
    pub fn record_entry(&mut self, bytes: usize) {
        self.entries_written += 1;
        self.bytes_written += bytes as u64;
    }

    /// Returns `true` when no entry was written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries_written == 0
    }
}
