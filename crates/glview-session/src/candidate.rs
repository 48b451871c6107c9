//! Files offered for upload and files that made it through

use glview_core::{ContentHash, Result, ViewerError, MAX_UPLOAD_BYTES};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where a candidate's bytes come from
#[derive(Debug, Clone)]
pub enum CandidateSource {
    /// On disk; read only after validation passes
    Path(PathBuf),
    Memory(Arc<[u8]>),
}

/// A user-supplied file under validation
#[derive(Debug, Clone)]
pub struct UploadCandidate {
    pub name: String,
    pub size: u64,
    pub source: CandidateSource,
}

impl UploadCandidate {
    /// Describe a file on disk from its metadata alone.
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());

        let metadata = std::fs::metadata(path).map_err(|e| {
            ViewerError::UploadFailed(format!("cannot open {}: {}", path.display(), e))
        })?;
        if !metadata.is_file() {
            return Err(ViewerError::UploadFailed(format!(
                "{} is not a regular file",
                path.display()
            )));
        }

        Ok(Self {
            name,
            size: metadata.len(),
            source: CandidateSource::Path(path.to_path_buf()),
        })
    }

    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let bytes = bytes.into();
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            source: CandidateSource::Memory(bytes),
        }
    }

    /// Load the candidate's bytes.
    ///
    /// Reads at most one byte past the upload limit, so a file that grew
    /// after validation is refused as too large instead of loaded whole.
    pub fn read_bytes(&self) -> Result<Arc<[u8]>> {
        let bytes: Arc<[u8]> = match &self.source {
            CandidateSource::Path(path) => {
                let file = std::fs::File::open(path)?;
                let mut buf = Vec::with_capacity(self.size.min(MAX_UPLOAD_BYTES) as usize);
                file.take(MAX_UPLOAD_BYTES + 1).read_to_end(&mut buf)?;
                buf.into()
            }
            CandidateSource::Memory(bytes) => Arc::clone(bytes),
        };

        if bytes.len() as u64 > MAX_UPLOAD_BYTES {
            return Err(ViewerError::FileTooLarge {
                name: self.name.clone(),
                size: bytes.len() as u64,
                limit: MAX_UPLOAD_BYTES,
            });
        }
        Ok(bytes)
    }

    pub fn source_path(&self) -> Option<&Path> {
        match &self.source {
            CandidateSource::Path(path) => Some(path),
            CandidateSource::Memory(_) => None,
        }
    }
}

/// The original file behind an active model, kept so it can be downloaded again
#[derive(Debug, Clone)]
pub struct ModelFile {
    pub name: String,
    pub bytes: Arc<[u8]>,
    pub path: Option<PathBuf>,
    pub hash: ContentHash,
}

impl ModelFile {
    pub fn new(name: impl Into<String>, bytes: Arc<[u8]>, path: Option<PathBuf>) -> Self {
        let hash = ContentHash::from_bytes(&bytes);
        Self {
            name: name.into(),
            bytes,
            path,
            hash,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::temp_file;

    #[test]
    fn test_from_path_reads_metadata_only() {
        // Sparse file: metadata reports the size without the bytes existing
        let path = temp_file("huge.glb", 60 * 1024 * 1024);
        let candidate = UploadCandidate::from_path(&path).unwrap();
        assert_eq!(candidate.name, "huge.glb");
        assert_eq!(candidate.size, 60 * 1024 * 1024);
        assert_eq!(candidate.source_path(), Some(path.as_path()));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = UploadCandidate::from_path(Path::new("/definitely/not/here.glb")).unwrap_err();
        assert!(matches!(err, ViewerError::UploadFailed(_)));
    }

    #[test]
    fn test_from_path_rejects_directory() {
        let err = UploadCandidate::from_path(&std::env::temp_dir()).unwrap_err();
        assert!(err.to_string().contains("not a regular file"));
    }

    #[test]
    fn test_memory_candidate() {
        let candidate = UploadCandidate::from_bytes("a.glb", vec![1u8, 2, 3]);
        assert_eq!(candidate.size, 3);
        assert_eq!(&*candidate.read_bytes().unwrap(), &[1, 2, 3]);
        assert!(candidate.source_path().is_none());
    }

    #[test]
    fn test_file_grown_after_metadata_is_too_large() {
        let path = temp_file("growing.glb", 16);
        let candidate = UploadCandidate::from_path(&path).unwrap();
        assert_eq!(candidate.size, 16);

        let file = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
        file.set_len(MAX_UPLOAD_BYTES + 1024).unwrap();

        let err = candidate.read_bytes().unwrap_err();
        assert!(matches!(
            err,
            ViewerError::FileTooLarge { size, .. } if size == MAX_UPLOAD_BYTES + 1
        ));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_model_file_hash() {
        let bytes: Arc<[u8]> = Arc::from(&b"abc"[..]);
        let file = ModelFile::new("a.glb", bytes, None);
        assert_eq!(file.size(), 3);
        assert_eq!(file.hash, ContentHash::from_bytes(b"abc"));
    }
}
