use std::path::{Component, Path, PathBuf};

use crate::error::{ArchiveError, Result};

/// Relative path of `file` under `root`, joined with `/` on every platform.
pub fn normalize_rel_path(root: &Path, file: &Path) -> Result<String> {
    let rel = file.strip_prefix(root).map_err(|_| {
        ArchiveError::invalid(format!("{} is outside {}", file.display(), root.display()))
    })?;

    let mut parts = Vec::new();
    for comp in rel.components() {
        match comp {
            Component::Normal(name) => {
                let name = name.to_str().ok_or_else(|| {
                    ArchiveError::invalid(format!("path is not UTF-8: {}", file.display()))
                })?;
                parts.push(name);
            }
            Component::CurDir => {}
            _ => {
                return Err(ArchiveError::invalid(format!(
                    "unexpected component in {}",
                    file.display()
                )));
            }
        }
    }

    if parts.is_empty() {
        return Err(ArchiveError::invalid("empty relative path"));
    }
    Ok(parts.join("/"))
}

/// Resolve an archive-declared path under `dest`.
///
/// Rejects absolute paths, drive prefixes and `..` segments. Both `/` and
/// `\` count as separators so an archive built elsewhere cannot smuggle a
/// traversal past either platform.
pub fn resolve_entry_path(dest: &Path, entry_path: &str) -> Result<PathBuf> {
    let traversal = || ArchiveError::PathTraversal(entry_path.to_string());

    if entry_path.is_empty() || entry_path.contains('\0') {
        return Err(ArchiveError::invalid(format!(
            "bad entry path {entry_path:?}"
        )));
    }
    if entry_path.starts_with('/') || entry_path.starts_with('\\') {
        return Err(traversal());
    }

    let mut out = dest.to_path_buf();
    let mut depth = 0usize;
    for segment in entry_path.split(['/', '\\']) {
        match segment {
            "" | "." => continue,
            ".." => return Err(traversal()),
            _ => {}
        }
        // Catches drive letters and any other platform prefix.
        let mut comps = Path::new(segment).components();
        match (comps.next(), comps.next()) {
            (Some(Component::Normal(_)), None) => {}
            _ => return Err(traversal()),
        }
        out.push(segment);
        depth += 1;
    }

    if depth == 0 {
        return Err(ArchiveError::invalid(format!(
            "bad entry path {entry_path:?}"
        )));
    }
    Ok(out)
}
