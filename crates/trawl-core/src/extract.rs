//! Zip extraction with path-traversal protection.
//!
//! Every entry name is resolved lexically against the destination; an entry
//! that would land outside it (`..` escapes, absolute paths) fails the whole
//! extraction before anything is written for that entry. Extraction is not
//! transactional: entries processed before a failure stay on disk.

use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::{io_error, TrawlError, TrawlResult};

/// Counts of what an extraction produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub files: usize,
    pub dirs: usize,
    pub bytes: u64,
}

/// Expand the zip archive at `src` into `dst`, creating `dst` if needed.
pub fn extract_archive(src: &Path, dst: &Path) -> TrawlResult<ExtractSummary> {
    fs::create_dir_all(dst).map_err(io_error(dst))?;

    let file = File::open(src).map_err(io_error(src))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|source| TrawlError::Archive {
        path: src.to_path_buf(),
        source,
    })?;

    let mut summary = ExtractSummary::default();
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(|source| TrawlError::Archive {
            path: src.to_path_buf(),
            source,
        })?;

        let name = entry.name().to_string();
        let target = resolve_entry_path(dst, &name)
            .filter(|target| entry.is_dir() || target.as_path() != dst)
            .ok_or_else(|| TrawlError::PathTraversal {
                entry: name.clone(),
            })?;

        if entry.is_dir() {
            fs::create_dir_all(&target).map_err(io_error(&target))?;
            summary.dirs += 1;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(io_error(parent))?;
        }

        let mut out = File::create(&target).map_err(io_error(&target))?;
        let written = io::copy(&mut entry, &mut out).map_err(io_error(&target))?;
        drop(out);

        apply_mode(&target, entry.unix_mode())?;

        summary.files += 1;
        summary.bytes += written;
    }

    debug!(
        archive = %src.display(),
        files = summary.files,
        dirs = summary.dirs,
        bytes = summary.bytes,
        "extracted archive"
    );
    Ok(summary)
}

/// Restore the permission bits recorded in the archive. File type bits and
/// setuid, setgid and sticky bits are dropped, so symlink entries become plain
/// files holding the link target.
#[cfg(unix)]
fn apply_mode(path: &Path, mode: Option<u32>) -> TrawlResult<()> {
    use std::os::unix::fs::PermissionsExt;

    if let Some(mode) = mode {
        fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o777))
            .map_err(io_error(path))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn apply_mode(_path: &Path, _mode: Option<u32>) -> TrawlResult<()> {
    Ok(())
}

/// Lexically clean `name` and join it onto `root`.
///
/// Returns `None` when the cleaned path is absolute or climbs above `root`.
pub fn resolve_entry_path(root: &Path, name: &str) -> Option<PathBuf> {
    let mut parts: Vec<&std::ffi::OsStr> = Vec::new();

    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => parts.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                parts.pop()?;
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    let mut path = root.to_path_buf();
    path.extend(parts);
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::zip_bytes;

    fn write_archive(dir: &Path, entries: &[(&str, &str)]) -> PathBuf {
        let path = dir.join("artifact.zip");
        fs::write(&path, zip_bytes(entries)).unwrap();
        path
    }

    #[test]
    fn test_resolve_entry_path() {
        let root = Path::new("/work/1/report");
        assert_eq!(
            resolve_entry_path(root, "a/b.xml"),
            Some(root.join("a").join("b.xml"))
        );
        assert_eq!(
            resolve_entry_path(root, "./a/../b.xml"),
            Some(root.join("b.xml"))
        );
        assert_eq!(resolve_entry_path(root, "../../evil"), None);
        assert_eq!(resolve_entry_path(root, "a/../../evil"), None);
        assert_eq!(resolve_entry_path(root, "/etc/passwd"), None);
    }

    #[test]
    fn test_extracts_nested_tree() {
        let work = tempfile::tempdir().unwrap();
        let src = write_archive(
            work.path(),
            &[
                ("reports/", ""),
                ("reports/unit/", ""),
                ("reports/unit/junit_01.xml", "<testsuites/>"),
                ("reports/e2e/junit_02.xml", "<testsuite name=\"e2e\"/>"),
                ("summary.txt", "ok\n"),
            ],
        );
        let dst = work.path().join("report");

        let summary = extract_archive(&src, &dst).unwrap();

        assert_eq!(summary.files, 3);
        assert_eq!(summary.dirs, 2);
        assert_eq!(
            fs::read(dst.join("reports/unit/junit_01.xml")).unwrap(),
            b"<testsuites/>"
        );
        assert_eq!(
            fs::read(dst.join("reports/e2e/junit_02.xml")).unwrap(),
            b"<testsuite name=\"e2e\"/>"
        );
        assert_eq!(fs::read(dst.join("summary.txt")).unwrap(), b"ok\n");
    }

    #[test]
    fn test_traversal_entry_fails_without_escaping() {
        let work = tempfile::tempdir().unwrap();
        let src = write_archive(work.path(), &[("../../evil", "pwned")]);
        let dst = work.path().join("a").join("b").join("report");

        let err = extract_archive(&src, &dst).unwrap_err();

        assert!(matches!(err, TrawlError::PathTraversal { ref entry } if entry == "../../evil"));
        assert!(!work.path().join("a").join("evil").exists());
        assert!(!work.path().join("evil").exists());
    }

    #[test]
    fn test_traversal_after_valid_entries_keeps_partial_output() {
        let work = tempfile::tempdir().unwrap();
        let src = write_archive(
            work.path(),
            &[("ok.xml", "<testsuites/>"), ("nested/../../escape", "x")],
        );
        let dst = work.path().join("report");

        let err = extract_archive(&src, &dst).unwrap_err();

        assert!(matches!(err, TrawlError::PathTraversal { .. }));
        assert!(dst.join("ok.xml").exists());
        assert!(!work.path().join("escape").exists());
    }

    #[test]
    fn test_invalid_archive() {
        let work = tempfile::tempdir().unwrap();
        let src = work.path().join("artifact.zip");
        fs::write(&src, b"definitely not a zip").unwrap();

        let err = extract_archive(&src, &work.path().join("report")).unwrap_err();
        assert!(matches!(err, TrawlError::Archive { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_preserves_file_mode() {
        use std::io::Write;
        use std::os::unix::fs::PermissionsExt;
        use zip::write::SimpleFileOptions;

        let work = tempfile::tempdir().unwrap();
        let src = work.path().join("artifact.zip");
        let mut writer = zip::ZipWriter::new(File::create(&src).unwrap());
        writer
            .start_file("run.sh", SimpleFileOptions::default().unix_permissions(0o750))
            .unwrap();
        writer.write_all(b"#!/bin/sh\n").unwrap();
        writer.finish().unwrap();

        let dst = work.path().join("report");
        extract_archive(&src, &dst).unwrap();

        let mode = fs::metadata(dst.join("run.sh")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o750);
    }

    #[cfg(unix)]
    #[test]
    fn test_strips_special_mode_bits() {
        use std::io::Write;
        use std::os::unix::fs::PermissionsExt;
        use zip::write::SimpleFileOptions;

        let mut writer = zip::ZipWriter::new(io::Cursor::new(Vec::new()));
        writer
            .start_file("run.sh", SimpleFileOptions::default().unix_permissions(0o755))
            .unwrap();
        writer.write_all(b"#!/bin/sh\n").unwrap();
        let mut bytes = writer.finish().unwrap().into_inner();

        // Rewrite the central directory entry as a unix setuid regular file.
        let central = bytes
            .windows(4)
            .position(|w| w == b"PK\x01\x02")
            .unwrap();
        bytes[central + 5] = 3;
        let attrs = (0o100000u32 | 0o4755) << 16;
        bytes[central + 38..central + 42].copy_from_slice(&attrs.to_le_bytes());

        let work = tempfile::tempdir().unwrap();
        let src = work.path().join("artifact.zip");
        fs::write(&src, &bytes).unwrap();

        let dst = work.path().join("report");
        extract_archive(&src, &dst).unwrap();

        let mode = fs::metadata(dst.join("run.sh")).unwrap().permissions().mode();
        assert_eq!(mode & 0o7777, 0o755);
    }
}
