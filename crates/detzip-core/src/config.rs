//! Configuration for archive construction operations.

use crate::ArchiveError;
use crate::Result;

/// Options controlling how a directory tree is archived.
///
/// # Examples
///
/// ```
/// use detzip_core::ArchiveDirOptions;
///
/// let options = ArchiveDirOptions::default()
///     .with_excludes(vec!["target".to_string(), "src/generated.rs".to_string()])
///     .with_exclude_symlink_directories(true);
///
/// assert_eq!(options.excludes.len(), 2);
/// assert!(options.exclude_symlink_directories);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveDirOptions {
    /// Archive-relative paths to leave out of the archive.
    ///
    /// Paths use `/` separators and are matched by exact equality against
    /// each node's archive-relative path. Excluding a directory drops its
    /// whole subtree. Empty strings never match.
    ///
    /// Default: empty.
    pub excludes: Vec<String>,

    /// Store symlinks as links instead of following them.
    ///
    /// When `false`, symlinks to files are archived with the target's content
    /// and symlinks to directories are walked under the link's own path.
    ///
    /// When `true`, each link is stored with its target exactly as written in
    /// the link. An absolute target embeds a host path, so the same tree at
    /// another location produces a different archive. Use relative links when
    /// archives must match across machines.
    ///
    /// Default: `false`.
    pub exclude_symlink_directories: bool,
}

impl ArchiveDirOptions {
    /// Creates options with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the exclusion list.
    #[must_use]
    pub fn with_excludes(mut self, excludes: Vec<String>) -> Self {
        self.excludes = excludes;
        self
    }

    /// Sets whether symlinks are stored as links rather than followed.
    #[must_use]
    pub fn with_exclude_symlink_directories(mut self, exclude: bool) -> Self {
        self.exclude_symlink_directories = exclude;
        self
    }
}

/// Parses an output file mode string into permission bits.
///
/// Accepts the usual integer literal forms: decimal, `0x` hex, `0o` octal,
/// `0b` binary, and a bare leading `0` for octal. Underscores may separate
/// digits. Signs are rejected and the value must fit in 32 bits.
///
/// # Examples
///
/// ```
/// use detzip_core::config::parse_file_mode;
///
/// assert_eq!(parse_file_mode("0755").unwrap(), 0o755);
/// assert_eq!(parse_file_mode("0o644").unwrap(), 0o644);
/// assert_eq!(parse_file_mode("0x1ed").unwrap(), 0o755);
/// assert_eq!(parse_file_mode("493").unwrap(), 0o755);
/// assert!(parse_file_mode("notanumber").is_err());
/// ```
pub fn parse_file_mode(value: &str) -> Result<u32> {
    let invalid = || ArchiveError::InvalidFileMode {
        value: value.to_string(),
    };

    if !underscores_ok(value) {
        return Err(invalid());
    }

    let (radix, digits) = split_radix(value);
    let digits: String = digits.chars().filter(|&c| c != '_').collect();

    // from_str_radix tolerates a leading '+'
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(invalid());
    }

    u32::from_str_radix(&digits, radix).map_err(|_| invalid())
}

/// Splits a literal into its radix and digit part.
fn split_radix(value: &str) -> (u32, &str) {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 && bytes[0] == b'0' {
        return match bytes[1].to_ascii_lowercase() {
            b'x' => (16, &value[2..]),
            b'o' => (8, &value[2..]),
            b'b' => (2, &value[2..]),
            _ => (8, &value[1..]),
        };
    }
    (10, value)
}

/// Checks that every `_` follows a digit or the base prefix and that the
/// literal does not end with one.
fn underscores_ok(value: &str) -> bool {
    #[derive(PartialEq)]
    enum Seen {
        Start,
        Digit,
        Underscore,
        Other,
    }

    let bytes = value.as_bytes();
    let mut seen = Seen::Start;
    let mut i = 0;
    let mut hex = false;

    if bytes.len() >= 2
        && bytes[0] == b'0'
        && matches!(bytes[1].to_ascii_lowercase(), b'b' | b'o' | b'x')
    {
        hex = bytes[1].to_ascii_lowercase() == b'x';
        seen = Seen::Digit;
        i = 2;
    }

    for &b in &bytes[i..] {
        if b.is_ascii_digit() || (hex && b.is_ascii_hexdigit()) {
            seen = Seen::Digit;
        } else if b == b'_' {
            if seen != Seen::Digit {
                return false;
            }
            seen = Seen::Underscore;
        } else {
            if seen == Seen::Underscore {
                return false;
            }
            seen = Seen::Other;
        }
    }

    seen != Seen::Underscore
}
