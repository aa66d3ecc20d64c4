//! Filesystem mediator.
//!
//! Serves the `read_text_file`/`write_text_file` RPCs the agent issues
//! through the client endpoint. Every path must be absolute; a relative
//! path is rejected with an explicit `RelativePath` error rather than
//! silently resolved against some workspace root. Line slicing splits on
//! a raw `\n` rather than `.lines()`, so a trailing `\r` stays attached to
//! its line — Windows line endings are preserved, not normalized.

use std::fs;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use crate::error::FsError;

const DIR_MODE: u32 = 0o755;
const FILE_MODE: u32 = 0o644;

/// Read `path`, optionally sliced to a 1-based inclusive line range.
///
/// `line=None|Some(0)` is treated as absent (start at the first line);
/// `limit=None|Some(0)` is treated as "through the end". The split is on
/// raw `\n` only — Windows line endings are not normalized.
pub fn read(path: &Path, line: Option<usize>, limit: Option<usize>) -> Result<String, FsError> {
    require_absolute(path)?;

    let bytes = fs::read(path).map_err(|e| map_io_error(path, e))?;
    let content = String::from_utf8_lossy(&bytes).into_owned();

    if line.is_none() && limit.is_none() {
        return Ok(content);
    }

    let lines: Vec<&str> = content.split('\n').collect();
    let n = lines.len();
    let start = match line {
        Some(0) | None => 0,
        Some(l) => (l - 1).min(n),
    };
    let end = match limit {
        Some(0) | None => n,
        Some(limit) => (start + limit).min(n),
    };

    Ok(lines[start..end].join("\n"))
}

/// Write `content` to `path`, creating every missing ancestor directory at
/// mode `0o755` (not just the immediate parent — `create_dir_all` can
/// create several levels in one call, and each of them gets its own
/// `set_mode` rather than being left to the process umask) and the file
/// itself at mode `0o644`. Replaces atomically via a temp file in the same
/// directory when the platform supports it. On success, emits
/// `"Wrote N bytes to PATH"` to `notice`.
pub fn write(path: &Path, content: &str, notice: &dyn Fn(&str)) -> Result<(), FsError> {
    require_absolute(path)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            let created = missing_ancestors(parent);
            fs::create_dir_all(parent).map_err(|e| map_io_error(parent, e))?;
            for dir in &created {
                set_mode(dir, DIR_MODE).map_err(|e| map_io_error(dir, e))?;
            }
        }
    }

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::Builder::new()
        .prefix(".mitto-fs-")
        .tempfile_in(dir)
        .map_err(|e| map_io_error(dir, e))?;

    use std::io::Write as _;
    tmp.write_all(content.as_bytes())
        .map_err(|e| map_io_error(path, e))?;
    tmp.flush().map_err(|e| map_io_error(path, e))?;

    set_mode(tmp.path(), FILE_MODE).map_err(|e| map_io_error(path, e))?;

    tmp.persist(path)
        .map_err(|e| map_io_error(path, e.error))?;

    notice(&format!("Wrote {} bytes to {}", content.len(), path.display()));
    Ok(())
}

/// Ancestors of `path` (innermost first, including `path` itself) that do
/// not yet exist on disk — i.e. the directories a subsequent
/// `create_dir_all(path)` would actually create.
fn missing_ancestors(path: &Path) -> Vec<PathBuf> {
    let mut missing = Vec::new();
    let mut current = Some(path);
    while let Some(p) = current {
        if p.as_os_str().is_empty() || p.exists() {
            break;
        }
        missing.push(p.to_path_buf());
        current = p.parent();
    }
    missing
}

fn require_absolute(path: &Path) -> Result<(), FsError> {
    if path.is_absolute() {
        Ok(())
    } else {
        Err(FsError::RelativePath(path.to_path_buf()))
    }
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> std::io::Result<()> {
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> std::io::Result<()> {
    Ok(())
}

fn map_io_error(path: &Path, source: std::io::Error) -> FsError {
    match source.kind() {
        std::io::ErrorKind::NotFound => FsError::NotFound(path.to_path_buf()),
        std::io::ErrorKind::PermissionDenied => FsError::PermissionDenied(path.to_path_buf()),
        _ => FsError::Io {
            path: path.to_path_buf(),
            source,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn relative_path_is_rejected_without_touching_disk() {
        for p in ["./x", "x/y", "../x"] {
            let result = read(Path::new(p), None, None);
            assert!(matches!(result, Err(FsError::RelativePath(_))));
        }
    }

    #[test]
    fn write_relative_path_is_rejected() {
        let result = write(Path::new("relative.txt"), "x", &|_| {});
        assert!(matches!(result, Err(FsError::RelativePath(_))));
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope.txt");
        assert!(matches!(read(&path, None, None), Err(FsError::NotFound(_))));
    }

    #[test]
    fn full_read_with_no_range() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("f.txt");
        fs::write(&path, "L1\nL2\nL3\nL4\nL5").unwrap();
        assert_eq!(read(&path, None, None).unwrap(), "L1\nL2\nL3\nL4\nL5");
    }

    #[test]
    fn line_and_limit_slice_inclusive_1_based() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("f.txt");
        fs::write(&path, "L1\nL2\nL3\nL4\nL5").unwrap();
        assert_eq!(read(&path, Some(2), Some(2)).unwrap(), "L2\nL3");
        assert_eq!(read(&path, Some(3), None).unwrap(), "L3\nL4\nL5");
        assert_eq!(read(&path, None, Some(2)).unwrap(), "L1\nL2");
    }

    #[test]
    fn line_zero_is_treated_as_absent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("f.txt");
        fs::write(&path, "L1\nL2\nL3").unwrap();
        assert_eq!(read(&path, Some(0), Some(2)).unwrap(), "L1\nL2");
    }

    #[test]
    fn crlf_is_not_normalized() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("f.txt");
        fs::write(&path, "L1\r\nL2\r\n").unwrap();
        let content = read(&path, None, None).unwrap();
        assert_eq!(content, "L1\r\nL2\r\n");
        assert!(content.split('\n').next().unwrap().ends_with('\r'));
    }

    #[test]
    fn write_creates_missing_parent_dirs_with_expected_modes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a").join("b").join("c.txt");
        let mut notices = Vec::new();
        write(&path, "hello", &|n| notices.push(n.to_string())).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "hello");
        assert_eq!(notices.len(), 1);
        assert!(notices[0].contains("Wrote 5 bytes to"));

        #[cfg(unix)]
        {
            let a_mode = fs::metadata(dir.path().join("a")).unwrap().permissions().mode() & 0o777;
            let b_mode = fs::metadata(dir.path().join("a").join("b"))
                .unwrap()
                .permissions()
                .mode()
                & 0o777;
            let file_mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
            assert_eq!(a_mode, DIR_MODE);
            assert_eq!(b_mode, DIR_MODE);
            assert_eq!(file_mode, FILE_MODE);
        }
    }

    #[test]
    fn write_sets_mode_on_every_created_ancestor_not_just_the_immediate_parent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a").join("b").join("c").join("d.txt");
        write(&path, "nested", &|_| {}).unwrap();

        #[cfg(unix)]
        {
            for ancestor in ["a", "a/b", "a/b/c"] {
                let mode = fs::metadata(dir.path().join(ancestor))
                    .unwrap()
                    .permissions()
                    .mode()
                    & 0o777;
                assert_eq!(mode, DIR_MODE, "expected {ancestor} at {DIR_MODE:o}, got {mode:o}");
            }
        }
    }

    #[test]
    fn write_replaces_existing_file_atomically() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("f.txt");
        fs::write(&path, "old").unwrap();
        write(&path, "new content", &|_| {}).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new content");
    }
}
