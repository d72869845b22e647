//! On-disk file operations used by the pipeline
//!
//! Every monorepo file the engine rewrites goes through [`write_atomic`]: the
//! new content is written to a temporary file in the same directory and then
//! renamed over the target, so a failure never leaves a half-written file.

use crate::error::{Error, Result};
use log::debug;
use std::fs;
use std::io::Write;
use std::path::Path;
use walkdir::WalkDir;

/// Read a UTF-8 file, returning `None` when it does not exist.
pub fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::Filesystem {
            message: format!("Failed to read '{}': {}", path.display(), e),
        }),
    }
}

/// Append a newline unless the content already ends with one.
pub fn ensure_trailing_newline(mut content: String) -> String {
    if !content.ends_with('\n') {
        content.push('\n');
    }
    content
}

/// Replace the contents of `path` atomically.
///
/// Parent directories are created as needed.
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| Error::Filesystem {
        message: format!("Failed to create directory '{}': {}", parent.display(), e),
    })?;

    let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(|e| Error::Filesystem {
        message: format!("Failed to create temp file in '{}': {}", parent.display(), e),
    })?;
    temp.write_all(content.as_bytes())
        .and_then(|_| temp.flush())
        .map_err(|e| Error::Filesystem {
            message: format!("Failed to write '{}': {}", path.display(), e),
        })?;

    // Keep the mode of the file being replaced
    if let Ok(metadata) = fs::metadata(path) {
        let _ = fs::set_permissions(temp.path(), metadata.permissions());
    }

    temp.persist(path).map_err(|e| Error::Filesystem {
        message: format!("Failed to replace '{}': {}", path.display(), e.error),
    })?;
    debug!("Wrote {}", path.display());
    Ok(())
}

/// Remove a file or a directory tree. Missing paths are not an error.
///
/// Returns whether anything was removed.
pub fn remove_path(path: &Path) -> Result<bool> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e.into()),
    };
    let result = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    result.map_err(|e| Error::Filesystem {
        message: format!("Failed to remove '{}': {}", path.display(), e),
    })?;
    Ok(true)
}

/// Whether `path` is a directory with no entries.
pub fn is_empty_dir(path: &Path) -> Result<bool> {
    Ok(fs::read_dir(path)?.next().is_none())
}

/// Copy the tree rooted at `src` into `dst`.
///
/// `dst` is created if needed. File permissions are carried over; symbolic
/// links are recreated on Unix and copied as regular files elsewhere.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<()> {
    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry.map_err(|e| Error::Filesystem {
            message: format!("Failed to walk '{}': {}", src.display(), e),
        })?;
        let relative = entry.path().strip_prefix(src).map_err(|_| Error::Path {
            message: format!("{} escaped {}", entry.path().display(), src.display()),
        })?;
        let target = dst.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target).map_err(|e| Error::Filesystem {
                message: format!(
                    "Failed to copy '{}' to '{}': {}",
                    entry.path().display(),
                    target.display(),
                    e
                ),
            })?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dst: &Path) -> Result<()> {
    let link_target = fs::read_link(src)?;
    std::os::unix::fs::symlink(link_target, dst)?;
    Ok(())
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dst: &Path) -> Result<()> {
    fs::copy(src, dst)?;
    Ok(())
}

/// Move a directory tree from `src` to `dst`.
///
/// Tries a rename first; when that fails (for example across filesystems)
/// the tree is copied and the source removed.
pub fn move_dir(src: &Path, dst: &Path) -> Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            debug!(
                "rename {} -> {} failed ({}), falling back to copy",
                src.display(),
                dst.display(),
                rename_err
            );
            copy_dir_recursive(src, dst)?;
            fs::remove_dir_all(src).map_err(|e| Error::Filesystem {
                message: format!("Failed to remove '{}' after copy: {}", src.display(), e),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_optional_missing() {
        let temp = TempDir::new().unwrap();
        assert_eq!(read_optional(&temp.path().join("nope")).unwrap(), None);
    }

    #[test]
    fn test_ensure_trailing_newline() {
        assert_eq!(ensure_trailing_newline("a".to_string()), "a\n");
        assert_eq!(ensure_trailing_newline("a\n".to_string()), "a\n");
    }

    #[test]
    fn test_write_atomic_creates_and_replaces() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/dir/file.txt");

        write_atomic(&path, "first\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "first\n");

        write_atomic(&path, "second\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second\n");

        // No temp files left behind
        let leftovers = fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_atomic_keeps_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let path = temp.path().join("script.sh");
        fs::write(&path, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();

        write_atomic(&path, "#!/bin/sh\necho hi\n").unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn test_remove_path() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("d");
        fs::create_dir_all(dir.join("inner")).unwrap();
        fs::write(dir.join("inner/f"), "x").unwrap();
        let file = temp.path().join("f.txt");
        fs::write(&file, "x").unwrap();

        assert!(remove_path(&dir).unwrap());
        assert!(remove_path(&file).unwrap());
        assert!(!remove_path(&file).unwrap());
        assert!(!dir.exists());
    }

    #[test]
    fn test_is_empty_dir() {
        let temp = TempDir::new().unwrap();
        assert!(is_empty_dir(temp.path()).unwrap());
        fs::write(temp.path().join("x"), "").unwrap();
        assert!(!is_empty_dir(temp.path()).unwrap());
    }

    #[test]
    fn test_copy_dir_recursive() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(src.join("a/b")).unwrap();
        fs::create_dir_all(src.join("empty")).unwrap();
        fs::write(src.join("top.txt"), "top").unwrap();
        fs::write(src.join("a/b/deep.txt"), "deep").unwrap();

        let dst = temp.path().join("dst");
        copy_dir_recursive(&src, &dst).unwrap();

        assert_eq!(fs::read_to_string(dst.join("top.txt")).unwrap(), "top");
        assert_eq!(fs::read_to_string(dst.join("a/b/deep.txt")).unwrap(), "deep");
        assert!(dst.join("empty").is_dir());
        assert!(src.join("top.txt").exists());
    }

    #[test]
    fn test_move_dir() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("staging/project");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("pyproject.toml"), "[project]\n").unwrap();

        let dst = temp.path().join("packages/project");
        move_dir(&src, &dst).unwrap();

        assert!(!src.exists());
        assert!(dst.join("pyproject.toml").exists());
    }
}
