//! Backend path validation.
//!
//! Backend path entries come from project configuration and are therefore
//! untrusted: each must be a relative path that stays inside the source tree.

use std::path::{Component, Path, PathBuf};

use crate::error::{InvalidPathError, InvalidPathKind};

/// Makes `path` absolute against the current directory and folds `.`/`..`
/// components lexically. Symlinks are not resolved.
pub fn absolutize(path: &Path) -> std::io::Result<PathBuf> {
    Ok(normalize(&std::path::absolute(path)?))
}

/// Folds `.` and `..` components without touching the filesystem.
///
/// `..` at the root stays at the root.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::Prefix(_)) | Some(Component::RootDir) => {}
                _ => out.push(".."),
            },
            Component::Normal(part) => out.push(part),
        }
    }
    out
}

/// Case-folds a path for comparison on case-insensitive filesystems.
#[cfg(windows)]
fn normcase(path: &Path) -> PathBuf {
    PathBuf::from(path.to_string_lossy().replace('/', "\\").to_lowercase())
}

#[cfg(not(windows))]
fn normcase(path: &Path) -> PathBuf {
    path.to_path_buf()
}

/// Validates a backend path entry against the source tree.
///
/// Returns the absolute, normalized location of `requested` under `source_tree`.
/// Fails if `requested` is absolute or resolves outside `source_tree`.
pub fn validate_backend_path(
    source_tree: &Path,
    requested: &Path,
) -> Result<PathBuf, InvalidPathError> {
    // `\foo` on Windows is rooted but not absolute; reject it all the same.
    if requested.is_absolute() || requested.has_root() {
        return Err(InvalidPathError::new(requested, InvalidPathKind::Absolute));
    }

    let abs_source = absolutize(source_tree).map_err(|e| {
        InvalidPathError::new(requested, InvalidPathKind::Unresolvable(e.to_string()))
    })?;
    let abs_requested = normalize(&abs_source.join(requested));

    if !normcase(&abs_requested).starts_with(normcase(&abs_source)) {
        return Err(InvalidPathError::new(
            requested,
            InvalidPathKind::OutsideSourceTree,
        ));
    }

    Ok(abs_requested)
}
