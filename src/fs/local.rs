use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::warn;
use walkdir::WalkDir;

use super::{FileMeta, FileSystem, SourceFile};
use crate::archive::path::normalize_rel_path;
use crate::error::{ArchiveError, Result};

/// Local disk implementation of [`FileSystem`]
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl LocalFs {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for LocalFs {
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn walk(&self, root: &Path, exclude: Option<&Path>) -> Result<Vec<SourceFile>> {
        let exclude = exclude.and_then(canonical_target);

        let mut files = Vec::new();
        for ent in WalkDir::new(root).follow_links(false).sort_by_file_name() {
            let ent = ent.map_err(|e| {
                let msg = e.to_string();
                ArchiveError::Io(e.into_io_error().unwrap_or_else(|| io::Error::other(msg)))
            })?;

            // Symlinks and special files are not archived.
            if !ent.file_type().is_file() {
                continue;
            }

            if let Some(ref skip) = exclude {
                if fs::canonicalize(ent.path()).is_ok_and(|p| &p == skip) {
                    continue;
                }
            }

            files.push(SourceFile {
                rel_path: normalize_rel_path(root, ent.path())?,
                path: ent.into_path(),
            });
        }
        Ok(files)
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        Ok(fs::read(path)?)
    }

    fn metadata(&self, path: &Path) -> FileMeta {
        let Ok(md) = fs::metadata(path) else {
            return FileMeta::default();
        };

        let modified_time = md
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map_or(0, |d| d.as_secs());

        #[cfg(unix)]
        let permission_bits = {
            use std::os::unix::fs::PermissionsExt;
            (md.permissions().mode() & 0o7777) as u16
        };

        #[cfg(not(unix))]
        let permission_bits = if md.permissions().readonly() {
            0o444
        } else {
            super::DEFAULT_PERMISSIONS
        };

        FileMeta {
            modified_time,
            permission_bits,
        }
    }

    fn write_file(&self, path: &Path, contents: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, contents)?;
        Ok(())
    }

    fn restore_metadata(&self, path: &Path, meta: &FileMeta) -> Result<()> {
        // mtime first: the permission bits may drop write access.
        let mtime = SystemTime::UNIX_EPOCH + Duration::from_secs(meta.modified_time);
        match File::options().write(true).open(path) {
            Ok(file) => {
                if let Err(e) = file.set_modified(mtime) {
                    warn!(path = %path.display(), error = %e, "could not restore mtime");
                }
            }
            Err(e) => warn!(path = %path.display(), error = %e, "could not restore mtime"),
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            // setuid, setgid and sticky are never restored.
            let mode = u32::from(meta.permission_bits) & 0o777;
            fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
        }

        #[cfg(not(unix))]
        {
            let mut perms = fs::metadata(path)?.permissions();
            perms.set_readonly(meta.permission_bits & 0o222 == 0);
            fs::set_permissions(path, perms)?;
        }

        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        Ok(())
    }
}

/// Canonical form of a path that may not exist yet (e.g. an archive about
/// to be created).
fn canonical_target(path: &Path) -> Option<PathBuf> {
    if let Ok(p) = fs::canonicalize(path) {
        return Some(p);
    }
    let name = path.file_name()?;
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::canonicalize(parent).ok().map(|p| p.join(name))
}
