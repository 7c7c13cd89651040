//! Deterministic directory walking with exclusion and symlink resolution.
//!
//! The walk is pre-order and sorted by file name at every level, so the
//! same tree always yields entries in the same order. Directories never
//! produce entries of their own. Symlinks to directories are walked under
//! the link's archive path when following is enabled.

use crate::ArchiveDirOptions;
use crate::ArchiveError;
use crate::Result;
use crate::filters;
use std::collections::HashSet;
use std::fs;
use std::fs::Metadata;
use std::path::Path;
use std::path::PathBuf;
use walkdir::WalkDir;

/// Tracing target for walk decisions.
pub const TRACING_TARGET: &str = "detzip_core::walker";

/// A filesystem node selected for the archive.
#[derive(Debug)]
pub struct WalkEntry {
    /// Path to read the node from. For followed symlinks this is the
    /// resolved real path.
    pub path: PathBuf,

    /// Path of the entry inside the archive, in OS-native form.
    pub archive_path: PathBuf,

    /// What kind of entry to write.
    pub kind: WalkEntryKind,
}

/// Kind of a selected node.
#[derive(Debug)]
pub enum WalkEntryKind {
    /// Regular file, or a followed symlink to one.
    File {
        /// Metadata of the file (the resolved target for followed links).
        metadata: Metadata,
    },

    /// Symlink stored as a link because following is disabled.
    Symlink {
        /// Target the link points at, as written in the link.
        target: PathBuf,
        /// Metadata of the link itself.
        metadata: Metadata,
    },
}

/// Counters collected while walking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    /// Nodes dropped by the exclusion list.
    pub excluded: usize,
    /// Symlinks resolved and followed.
    pub symlinks_followed: usize,
}

/// Walks directory trees according to [`ArchiveDirOptions`].
///
/// # Examples
///
/// ```no_run
/// use detzip_core::ArchiveDirOptions;
/// use detzip_core::walker::DirWalker;
/// use std::path::Path;
///
/// let options = ArchiveDirOptions::default().with_excludes(vec!["target".to_string()]);
/// let walker = DirWalker::new(&options);
///
/// walker.walk(Path::new("./project"), |entry| {
///     println!("would add {}", entry.archive_path.display());
///     Ok(())
/// })?;
/// # Ok::<(), detzip_core::ArchiveError>(())
/// ```
#[derive(Debug, Clone)]
pub struct DirWalker {
    excludes: Vec<PathBuf>,
    follow_symlinks: bool,
}

impl DirWalker {
    /// Creates a walker, converting exclusions to OS-native paths.
    #[must_use]
    pub fn new(options: &ArchiveDirOptions) -> Self {
        Self {
            excludes: filters::normalize_excludes(&options.excludes),
            follow_symlinks: !options.exclude_symlink_directories,
        }
    }

    /// Walks `root`, calling `visit` for every selected node in walk order.
    ///
    /// Stops at the first error, whether from the filesystem or from
    /// `visit`. Nodes visited before the error stay visited.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A node cannot be stated, resolved or relativized
    /// - A followed symlink leads back into a directory being walked
    /// - `visit` fails
    pub fn walk<F>(&self, root: &Path, mut visit: F) -> Result<WalkStats>
    where
        F: FnMut(WalkEntry) -> Result<()>,
    {
        let canonical_root =
            fs::canonicalize(root).map_err(ArchiveError::walk("resolving", root))?;
        let mut active = HashSet::from([canonical_root]);
        let mut stats = WalkStats::default();

        self.walk_tree(root, Path::new(""), &mut active, &mut stats, &mut visit)?;

        Ok(stats)
    }

    /// Walks one tree. `active` holds the canonical roots of every walk on
    /// the current stack.
    fn walk_tree<F>(
        &self,
        root: &Path,
        base: &Path,
        active: &mut HashSet<PathBuf>,
        stats: &mut WalkStats,
        visit: &mut F,
    ) -> Result<()>
    where
        F: FnMut(WalkEntry) -> Result<()>,
    {
        let mut it = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        while let Some(entry) = it.next() {
            let entry = entry.map_err(|e| walkdir_error(e, root))?;
            if entry.depth() == 0 {
                continue;
            }

            let path = entry.path();
            let archive_path = filters::compute_archive_path(path, root, base)?;
            let excluded = filters::is_excluded(&archive_path, &self.excludes);
            let file_type = entry.file_type();

            if file_type.is_dir() {
                if excluded {
                    tracing::trace!(
                        target: TRACING_TARGET,
                        path = %archive_path.display(),
                        "Skipping excluded directory"
                    );
                    stats.excluded += 1;
                    it.skip_current_dir();
                }
                continue;
            }

            if excluded {
                tracing::trace!(
                    target: TRACING_TARGET,
                    path = %archive_path.display(),
                    "Skipping excluded file"
                );
                stats.excluded += 1;
                continue;
            }

            if file_type.is_symlink() {
                if self.follow_symlinks {
                    self.follow_symlink(path, archive_path, active, stats, visit)?;
                } else {
                    let target =
                        fs::read_link(path).map_err(ArchiveError::walk("reading symlink", path))?;
                    let metadata = entry.metadata().map_err(|e| walkdir_error(e, path))?;
                    visit(WalkEntry {
                        path: path.to_path_buf(),
                        archive_path,
                        kind: WalkEntryKind::Symlink { target, metadata },
                    })?;
                }
                continue;
            }

            let metadata = entry.metadata().map_err(|e| walkdir_error(e, path))?;
            visit(WalkEntry {
                path: path.to_path_buf(),
                archive_path,
                kind: WalkEntryKind::File { metadata },
            })?;
        }

        Ok(())
    }

    fn follow_symlink<F>(
        &self,
        link: &Path,
        archive_path: PathBuf,
        active: &mut HashSet<PathBuf>,
        stats: &mut WalkStats,
        visit: &mut F,
    ) -> Result<()>
    where
        F: FnMut(WalkEntry) -> Result<()>,
    {
        let real = fs::canonicalize(link).map_err(ArchiveError::walk("resolving symlink", link))?;
        let metadata =
            fs::metadata(&real).map_err(ArchiveError::walk("reading metadata", &real))?;
        stats.symlinks_followed += 1;

        if !metadata.is_dir() {
            return visit(WalkEntry {
                path: real,
                archive_path,
                kind: WalkEntryKind::File { metadata },
            });
        }

        if !active.insert(real.clone()) {
            return Err(ArchiveError::SymlinkCycle {
                path: link.to_path_buf(),
                target: real,
            });
        }

        tracing::trace!(
            target: TRACING_TARGET,
            link = %link.display(),
            real = %real.display(),
            base = %archive_path.display(),
            "Following symlinked directory"
        );

        let result = self.walk_tree(&real, &archive_path, active, stats, visit);
        active.remove(&real);
        result
    }
}

fn walkdir_error(err: walkdir::Error, fallback: &Path) -> ArchiveError {
    let path = err
        .path()
        .map_or_else(|| fallback.to_path_buf(), Path::to_path_buf);
    ArchiveError::Walk {
        operation: "walking",
        path,
        source: err.into(),
    }
}
