//! Writing screenshots and original model bytes to the export directory

use glview_core::{Result, ViewerError};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// First free path for `file_name` in `dir`. An existing `name.ext` yields
/// `name (1).ext`, then `name (2).ext`, and so on.
pub fn unique_path(dir: &Path, file_name: &str) -> PathBuf {
    candidate_paths(dir, file_name)
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| dir.join(sanitize(file_name)))
}

/// `name.ext`, `name (1).ext`, `name (2).ext`, ... inside `dir`
fn candidate_paths<'a>(dir: &'a Path, file_name: &str) -> impl Iterator<Item = PathBuf> + 'a {
    let file_name = sanitize(file_name);
    let as_path = Path::new(&file_name);
    let stem = as_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.clone());
    let extension = as_path.extension().map(|e| e.to_string_lossy().into_owned());

    (0u32..).map(move |n| {
        let name = match (n, &extension) {
            (0, _) => file_name.clone(),
            (n, Some(ext)) => format!("{} ({}).{}", stem, n, ext),
            (n, None) => format!("{} ({})", stem, n),
        };
        dir.join(name)
    })
}

/// Keep only the final path component so a name can never leave `dir`.
fn sanitize(file_name: &str) -> String {
    Path::new(file_name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "model".to_string())
}

/// Write `bytes` under a collision-free name in `dir`, creating `dir` first.
///
/// Each name is claimed with `create_new`, so a file that appears between
/// choosing a name and writing it is never overwritten.
pub fn write_export(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| {
        ViewerError::ExportError(format!("cannot create {}: {}", dir.display(), e))
    })?;

    for path in candidate_paths(dir, file_name) {
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => {
                return Err(ViewerError::ExportError(format!(
                    "cannot create {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        file.write_all(bytes).map_err(|e| {
            ViewerError::ExportError(format!("cannot write {}: {}", path.display(), e))
        })?;

        log::info!("Exported {} ({} bytes)", path.display(), bytes.len());
        return Ok(path);
    }

    Err(ViewerError::ExportError(format!(
        "no free name for {} in {}",
        file_name,
        dir.display()
    )))
}
