//! CLI command implementations

pub mod inspect;
pub mod render;
pub mod view;

use anyhow::{Context, Result};
use glview_session::{validate, UploadCandidate};
use std::path::Path;
use std::sync::Arc;

/// Read a model file after applying the same checks as a window upload.
pub fn read_model(path: &Path) -> Result<(String, Arc<[u8]>)> {
    let candidate = UploadCandidate::from_path(path)?;
    validate(&candidate)?;
    let bytes = candidate
        .read_bytes()
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok((candidate.name, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glview_core::ViewerError;

    fn scratch_file(name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("glview-cli-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_read_model_accepts_glb() {
        let path = scratch_file("ok.glb", b"glTF");
        let (name, bytes) = read_model(&path).unwrap();
        assert_eq!(name, "ok.glb");
        assert_eq!(&*bytes, b"glTF");
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_read_model_rejects_wrong_extension() {
        let path = scratch_file("model.gltf", b"{}");
        let err = read_model(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ViewerError>(),
            Some(ViewerError::WrongFileType { .. })
        ));
        std::fs::remove_file(path).ok();
    }
}
