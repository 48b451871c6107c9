//! Resolvable model references
//!
//! A [`ModelRef`] is the desktop stand-in for a browser object URL: a token
//! that resolves to the bytes of an uploaded file for as long as it is live.
//! References are not `Clone` and [`ReferenceRegistry::release`] consumes
//! them, so each one is released at most once.

use glview_core::Result;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Copyable identity of a reference, used for change detection and lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RefKey(Uuid);

impl fmt::Display for RefKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blob:{}", self.0)
    }
}

/// Owning handle to a live reference
#[derive(Debug, PartialEq, Eq)]
pub struct ModelRef {
    key: RefKey,
}

impl ModelRef {
    /// Mint a fresh reference. Only registries should call this.
    pub fn mint() -> Self {
        Self {
            key: RefKey(Uuid::new_v4()),
        }
    }

    pub fn key(&self) -> RefKey {
        self.key
    }
}

impl fmt::Display for ModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.key.fmt(f)
    }
}

/// Acquire/release pairs for model references
pub trait ReferenceRegistry {
    /// Make `bytes` resolvable and return the owning reference.
    fn acquire(&mut self, bytes: Arc<[u8]>) -> Result<ModelRef>;

    /// Free the bytes behind `reference`.
    fn release(&mut self, reference: ModelRef);

    /// Bytes behind a live reference, `None` once released.
    fn resolve(&self, key: RefKey) -> Option<Arc<[u8]>>;

    /// Number of references acquired and not yet released
    fn live_count(&self) -> usize;
}

/// In-memory registry
#[derive(Debug, Default)]
pub struct BlobRegistry {
    blobs: HashMap<RefKey, Arc<[u8]>>,
}

impl BlobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total bytes held by live references
    pub fn live_bytes(&self) -> usize {
        self.blobs.values().map(|b| b.len()).sum()
    }
}

impl ReferenceRegistry for BlobRegistry {
    fn acquire(&mut self, bytes: Arc<[u8]>) -> Result<ModelRef> {
        let reference = ModelRef::mint();
        log::debug!("Acquired {} ({} bytes)", reference, bytes.len());
        self.blobs.insert(reference.key(), bytes);
        Ok(reference)
    }

    fn release(&mut self, reference: ModelRef) {
        if self.blobs.remove(&reference.key()).is_some() {
            log::debug!("Released {}", reference);
        } else {
            log::warn!("Released unknown reference {}", reference);
        }
    }

    fn resolve(&self, key: RefKey) -> Option<Arc<[u8]>> {
        self.blobs.get(&key).cloned()
    }

    fn live_count(&self) -> usize {
        self.blobs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_resolve_release() {
        let mut registry = BlobRegistry::new();
        let reference = registry.acquire(Arc::from(&b"glTF"[..])).unwrap();
        let key = reference.key();

        assert_eq!(registry.live_count(), 1);
        assert_eq!(registry.live_bytes(), 4);
        assert_eq!(&*registry.resolve(key).unwrap(), b"glTF");

        registry.release(reference);
        assert_eq!(registry.live_count(), 0);
        assert!(registry.resolve(key).is_none());
    }

    #[test]
    fn test_keys_are_unique() {
        let mut registry = BlobRegistry::new();
        let a = registry.acquire(Arc::from(&b"a"[..])).unwrap();
        let b = registry.acquire(Arc::from(&b"a"[..])).unwrap();
        assert_ne!(a.key(), b.key());
        assert_eq!(registry.live_count(), 2);
    }

    #[test]
    fn test_display_looks_like_object_url() {
        let reference = ModelRef::mint();
        let text = reference.to_string();
        assert!(text.starts_with("blob:"));
        assert_eq!(text.len(), "blob:".len() + 36);
    }
}
