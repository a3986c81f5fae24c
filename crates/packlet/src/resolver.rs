//! Specifier resolution
//!
//! Resolution is purely lexical: a specifier is joined onto the directory of
//! the importing file and `.`/`..` segments are folded away. No extension
//! probing, no package lookup and no symlink canonicalization happen here, so
//! the same specifier always resolves to the same path regardless of what is
//! on disk.

use std::path::{Component, Path, PathBuf};

use log::trace;

/// Lexically normalize a path, folding `.` and `..` segments
///
/// `..` above the root stays at the root, matching how `/..` behaves on Unix.
/// A relative path that climbs above its start keeps the leading `..`.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => normalized.push(prefix.as_os_str()),
            Component::RootDir => normalized.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                let at_root = normalized.has_root() && normalized.parent().is_none();
                let ends_in_parent = matches!(
                    normalized.components().next_back(),
                    Some(Component::ParentDir) | None
                );
                if at_root {
                    continue;
                }
                if ends_in_parent {
                    normalized.push("..");
                } else {
                    normalized.pop();
                }
            }
            Component::Normal(part) => normalized.push(part),
        }
    }
    normalized
}

/// Join `specifier` onto `base` and normalize
///
/// A specifier written with a leading `/` is still treated as relative to
/// `base`; the bundle never escapes the importing file's directory tree
/// except through explicit `..` segments.
pub fn join_specifier(base: &Path, specifier: &str) -> PathBuf {
    let mut joined = base.to_path_buf();
    for component in Path::new(specifier).components() {
        match component {
            Component::Prefix(_) | Component::RootDir => {}
            other => joined.push(other.as_os_str()),
        }
    }
    normalize_path(&joined)
}

/// Resolve `specifier` as written in `importer` to an absolute module path
pub fn resolve_specifier(importer: &Path, specifier: &str) -> PathBuf {
    let dir = importer.parent().unwrap_or(importer);
    let resolved = join_specifier(dir, specifier);
    trace!(
        "Resolved '{}' from {} to {}",
        specifier,
        importer.display(),
        resolved.display()
    );
    resolved
}

/// Path of `path` relative to `base` for display, falling back to `path`
pub fn display_path(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}
