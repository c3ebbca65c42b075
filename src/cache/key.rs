//! Cache key derivation

use std::path::{Component, Path, PathBuf};

/// Package key for `file`: its directory relative to the workspace `root`,
/// `/`-separated, `""` for the root package.
///
/// Returns `None` when the file is outside the workspace or the path is not UTF-8.
pub fn package_key(root: &Path, file: &Path) -> Option<String> {
    let dir = file.parent()?;
    let relative = dir.strip_prefix(root).ok()?;

    let parts = relative
        .components()
        .map(|component| match component {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;

    Some(parts.join("/"))
}

/// Resolve `.` and `..` without touching the file system
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}
