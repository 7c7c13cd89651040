//! Integration tests for detzip-core.
//!
//! These tests build real archives on disk and read them back with the `zip`
//! crate to check naming, ordering, timestamps and reproducibility.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use detzip_core::ArchiveDirOptions;
use detzip_core::ArchiveError;
use detzip_core::Archiver;
use detzip_core::ErrorKind;
use detzip_core::ZipArchiver;
use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;
use tempfile::TempDir;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn read_entries(path: &Path) -> Vec<(String, Vec<u8>)> {
    let mut archive = zip::ZipArchive::new(fs::File::open(path).unwrap()).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut entry = archive.by_index(i).unwrap();
            let mut content = Vec::new();
            entry.read_to_end(&mut content).unwrap();
            (entry.name().to_string(), content)
        })
        .collect()
}

fn read_names(path: &Path) -> Vec<String> {
    read_entries(path).into_iter().map(|(name, _)| name).collect()
}

/// Creates a small project tree and returns its root.
fn create_project(temp: &TempDir) -> PathBuf {
    let root = temp.path().join("project");
    fs::create_dir_all(root.join("src/bin")).unwrap();
    fs::create_dir_all(root.join("target/debug")).unwrap();
    fs::create_dir_all(root.join("assets")).unwrap();

    fs::write(root.join("Cargo.toml"), "[package]\nname = \"demo\"\n").unwrap();
    fs::write(root.join("README.md"), "# demo\n").unwrap();
    fs::write(root.join("src/lib.rs"), "pub fn demo() {}\n").unwrap();
    fs::write(root.join("src/bin/main.rs"), "fn main() {}\n").unwrap();
    fs::write(root.join("target/debug/demo"), vec![0u8; 2048]).unwrap();
    fs::write(root.join("assets/logo.svg"), "<svg/>").unwrap();
    root
}

#[test]
fn test_archive_dir_is_reproducible() {
    init_tracing();
    let temp = TempDir::new().unwrap();
    let root = create_project(&temp);
    let options = ArchiveDirOptions::default().with_excludes(vec!["target".to_string()]);

    let first = temp.path().join("first.zip");
    let second = temp.path().join("second.zip");
    ZipArchiver::new(&first).archive_dir(&root, &options).unwrap();

    // Touch a file so its mtime differs between runs
    std::thread::sleep(std::time::Duration::from_millis(1100));
    fs::write(root.join("README.md"), "# demo\n").unwrap();

    ZipArchiver::new(&second).archive_dir(&root, &options).unwrap();

    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
}

#[test]
fn test_archive_dir_order_and_exclusions() {
    let temp = TempDir::new().unwrap();
    let root = create_project(&temp);
    let output = temp.path().join("out.zip");

    let options = ArchiveDirOptions::default()
        .with_excludes(vec!["target".to_string(), "src/bin/main.rs".to_string()]);
    let report = ZipArchiver::new(&output)
        .archive_dir(&root, &options)
        .unwrap();

    assert_eq!(
        read_names(&output),
        vec!["Cargo.toml", "README.md", "assets/logo.svg", "src/lib.rs"]
    );
    assert_eq!(report.entries_written, 4);
    assert_eq!(report.entries_excluded, 2);
}

#[test]
fn test_excluded_directory_drops_whole_subtree() {
    let temp = TempDir::new().unwrap();
    let root = create_project(&temp);
    let output = temp.path().join("out.zip");

    let options = ArchiveDirOptions::default().with_excludes(vec!["src".to_string()]);
    ZipArchiver::new(&output)
        .archive_dir(&root, &options)
        .unwrap();

    let names = read_names(&output);
    assert!(names.iter().all(|name| !name.starts_with("src/")));
    assert!(names.contains(&"target/debug/demo".to_string()));
}

#[test]
fn test_every_entry_has_zero_timestamp() {
    let temp = TempDir::new().unwrap();
    let root = create_project(&temp);

    let dir_zip = temp.path().join("dir.zip");
    let file_zip = temp.path().join("file.zip");
    let content_zip = temp.path().join("content.zip");
    let multi_zip = temp.path().join("multi.zip");

    ZipArchiver::new(&dir_zip)
        .archive_dir(&root, &ArchiveDirOptions::default())
        .unwrap();
    ZipArchiver::new(&file_zip)
        .archive_file(&root.join("README.md"))
        .unwrap();
    ZipArchiver::new(&content_zip)
        .archive_content(b"inline", "inline.txt")
        .unwrap();
    ZipArchiver::new(&multi_zip)
        .archive_multiple(&HashMap::from([
            ("x".to_string(), b"x".to_vec()),
            ("y".to_string(), b"y".to_vec()),
        ]))
        .unwrap();

    for output in [&dir_zip, &file_zip, &content_zip, &multi_zip] {
        let mut archive = zip::ZipArchive::new(fs::File::open(output).unwrap()).unwrap();
        assert_ne!(archive.len(), 0);
        for i in 0..archive.len() {
            let entry = archive.by_index(i).unwrap();
            let modified = entry.last_modified().expect("entry has a timestamp");
            assert_eq!(
                (
                    modified.year(),
                    modified.month(),
                    modified.day(),
                    modified.hour(),
                    modified.minute(),
                    modified.second()
                ),
                (1980, 1, 1, 0, 0, 0),
                "entry {} in {}",
                entry.name(),
                output.display()
            );
        }
    }
}

#[test]
fn test_archive_multiple_order_ignores_insertion_order() {
    let temp = TempDir::new().unwrap();
    let output = temp.path().join("multi.zip");

    let mut content = HashMap::new();
    content.insert("b.txt".to_string(), b"B".to_vec());
    content.insert("a.txt".to_string(), b"A".to_vec());

    ZipArchiver::new(&output).archive_multiple(&content).unwrap();

    assert_eq!(
        read_entries(&output),
        vec![
            ("a.txt".to_string(), b"A".to_vec()),
            ("b.txt".to_string(), b"B".to_vec()),
        ]
    );
}

#[test]
fn test_archive_single_file_name() {
    let temp = TempDir::new().unwrap();
    let reports = temp.path().join("data").join("reports");
    fs::create_dir_all(&reports).unwrap();
    fs::write(reports.join("report.csv"), "id,total\n1,10\n").unwrap();
    let output = temp.path().join("report.zip");

    ZipArchiver::new(&output)
        .archive_file(&reports.join("report.csv"))
        .unwrap();

    assert_eq!(read_names(&output), vec!["report.csv"]);
}

#[cfg(unix)]
#[test]
fn test_output_file_mode_applies_to_every_dir_entry() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let root = create_project(&temp);
    fs::set_permissions(root.join("README.md"), fs::Permissions::from_mode(0o600)).unwrap();
    let output = temp.path().join("out.zip");

    ZipArchiver::new(&output)
        .with_output_file_mode("0o755")
        .archive_dir(&root, &ArchiveDirOptions::default())
        .unwrap();

    let mut archive = zip::ZipArchive::new(fs::File::open(&output).unwrap()).unwrap();
    for i in 0..archive.len() {
        let entry = archive.by_index(i).unwrap();
        assert_eq!(entry.unix_mode().unwrap() & 0o777, 0o755, "{}", entry.name());
    }
}

#[test]
fn test_invalid_output_file_mode() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("file.txt");
    fs::write(&source, "content").unwrap();
    let output = temp.path().join("out.zip");

    let err = ZipArchiver::new(&output)
        .with_output_file_mode("notanumber")
        .archive_file(&source)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ConfigParse);
    assert!(matches!(err, ArchiveError::InvalidFileMode { ref value } if value == "notanumber"));
    assert!(read_names(&output).is_empty());
}

#[cfg(unix)]
#[test]
fn test_symlinked_directory_archived_under_link_path() {
    let temp = TempDir::new().unwrap();
    let root = create_project(&temp);
    let shared = temp.path().join("shared-assets");
    fs::create_dir(&shared).unwrap();
    fs::write(shared.join("font.ttf"), "font").unwrap();
    std::os::unix::fs::symlink(&shared, root.join("assets/shared")).unwrap();
    let output = temp.path().join("out.zip");

    let report = ZipArchiver::new(&output)
        .archive_dir(&root, &ArchiveDirOptions::default())
        .unwrap();

    let names = read_names(&output);
    assert!(names.contains(&"assets/shared/font.ttf".to_string()));
    assert!(names.iter().all(|name| !name.contains("shared-assets")));
    assert_eq!(report.symlinks_followed, 1);
}

#[cfg(unix)]
#[test]
fn test_symlink_cycle_leaves_finalized_partial_archive() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("root");
    fs::create_dir_all(root.join("b")).unwrap();
    fs::write(root.join("a.txt"), "a").unwrap();
    std::os::unix::fs::symlink(&root, root.join("b/loop")).unwrap();
    let output = temp.path().join("out.zip");

    let err = ZipArchiver::new(&output)
        .archive_dir(&root, &ArchiveDirOptions::default())
        .unwrap_err();

    assert!(matches!(err, ArchiveError::SymlinkCycle { .. }));
    assert_eq!(err.kind(), ErrorKind::Io);
    // Entries written before the failure remain in a readable archive
    assert_eq!(read_names(&output), vec!["a.txt"]);
}

#[cfg(unix)]
#[test]
#[ignore = "permission bits do not stop reads when running as root"]
fn test_unreadable_file_aborts_with_context() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let root = temp.path().join("root");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("a.txt"), "a").unwrap();
    fs::write(root.join("secret.txt"), "secret").unwrap();
    fs::set_permissions(root.join("secret.txt"), fs::Permissions::from_mode(0o000)).unwrap();

    let output = temp.path().join("out.zip");
    let err = ZipArchiver::new(&output)
        .archive_dir(&root, &ArchiveDirOptions::default())
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(err.to_string().contains("secret.txt"));
    assert_eq!(read_names(&output), vec!["a.txt"]);
}

#[cfg(target_os = "linux")]
#[test]
fn test_read_failure_aborts_with_partial_archive() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("root");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("a.txt"), "a").unwrap();
    // Reading a process's own memory from offset zero fails for any user
    std::os::unix::fs::symlink("/proc/self/mem", root.join("mem")).unwrap();

    let output = temp.path().join("out.zip");
    let err = ZipArchiver::new(&output)
        .archive_dir(&root, &ArchiveDirOptions::default())
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(err.to_string().contains("mem"));
    assert_eq!(read_names(&output), vec!["a.txt"]);
}

#[cfg(target_os = "linux")]
#[test]
fn test_non_utf8_name_aborts_walk() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let temp = TempDir::new().unwrap();
    let root = temp.path().join("root");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("a.txt"), "a").unwrap();
    fs::write(root.join(OsStr::from_bytes(b"b\xff.txt")), "b").unwrap();

    let output = temp.path().join("out.zip");
    let err = ZipArchiver::new(&output)
        .archive_dir(&root, &ArchiveDirOptions::default())
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(matches!(err, ArchiveError::Walk { operation: "naming entry", .. }));
    assert_eq!(read_names(&output), vec!["a.txt"]);
}

#[test]
fn test_archiver_as_trait_object() {
    let temp = TempDir::new().unwrap();
    let output = temp.path().join("dyn.zip");

    let archiver: Box<dyn Archiver> = Box::new(ZipArchiver::new(&output));
    archiver.archive_content(b"dyn", "dyn.txt").unwrap();

    assert_eq!(read_names(&output), vec!["dyn.txt"]);
}
