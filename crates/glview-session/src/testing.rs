//! Shared helpers for this crate's tests

use crate::blob::{BlobRegistry, ModelRef, RefKey, ReferenceRegistry};
use glview_core::{Result, ViewerError};
use std::path::PathBuf;
use std::sync::Arc;

/// Registry that records every release and can be told to fail acquires
#[derive(Default)]
pub struct RecordingRegistry {
    pub inner: BlobRegistry,
    pub released: Vec<RefKey>,
    pub fail_acquire: bool,
}

impl ReferenceRegistry for RecordingRegistry {
    fn acquire(&mut self, bytes: Arc<[u8]>) -> Result<ModelRef> {
        if self.fail_acquire {
            return Err(ViewerError::UploadFailed("out of memory".into()));
        }
        self.inner.acquire(bytes)
    }

    fn release(&mut self, reference: ModelRef) {
        self.released.push(reference.key());
        self.inner.release(reference);
    }

    fn resolve(&self, key: RefKey) -> Option<Arc<[u8]>> {
        self.inner.resolve(key)
    }

    fn live_count(&self) -> usize {
        self.inner.live_count()
    }
}

/// Create a sparse file of `size` bytes in a fresh temp directory.
pub fn temp_file(name: &str, size: u64) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("glview_session_test_{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    let file = std::fs::File::create(&path).unwrap();
    file.set_len(size).unwrap();
    path
}
