//! Page shell: sole owner of the active model

use crate::blob::{BlobRegistry, ModelRef, RefKey, ReferenceRegistry};
use crate::candidate::ModelFile;
use crate::intake::{AcceptError, UploadSink};
use glview_core::Result;
use std::sync::Arc;

/// The model currently on display: its live reference and original file
#[derive(Debug)]
pub struct ActiveModel {
    reference: ModelRef,
    file: ModelFile,
}

impl ActiveModel {
    pub fn key(&self) -> RefKey {
        self.reference.key()
    }

    pub fn reference(&self) -> &ModelRef {
        &self.reference
    }

    pub fn file(&self) -> &ModelFile {
        &self.file
    }
}

/// Holds at most one [`ActiveModel`]. Replacing or clearing it releases the
/// outgoing reference, so the registry never holds more than one live
/// reference between operations.
pub struct PageShell<R: ReferenceRegistry = BlobRegistry> {
    registry: R,
    active: Option<ActiveModel>,
}

impl Default for PageShell<BlobRegistry> {
    fn default() -> Self {
        Self::new(BlobRegistry::new())
    }
}

impl<R: ReferenceRegistry> PageShell<R> {
    pub fn new(registry: R) -> Self {
        Self {
            registry,
            active: None,
        }
    }

    /// Make `(reference, file)` the active model, releasing any previous one.
    pub fn on_upload(&mut self, reference: ModelRef, file: ModelFile) {
        if let Some(previous) = self.active.take() {
            log::info!("Replacing {} with {}", previous.file.name, file.name);
            self.registry.release(previous.reference);
        }
        self.active = Some(ActiveModel { reference, file });
    }

    /// Clear the active model. A no-op when nothing is loaded.
    pub fn reset(&mut self) {
        if let Some(previous) = self.active.take() {
            log::info!("Cleared {}", previous.file.name);
            self.registry.release(previous.reference);
        }
    }

    pub fn active(&self) -> Option<&ActiveModel> {
        self.active.as_ref()
    }

    pub fn active_key(&self) -> Option<RefKey> {
        self.active.as_ref().map(ActiveModel::key)
    }

    /// Key and bytes of the active model, resolved through the registry
    pub fn resolve_active(&self) -> Option<(RefKey, Arc<[u8]>)> {
        let key = self.active_key()?;
        self.registry.resolve(key).map(|bytes| (key, bytes))
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }
}

impl<R: ReferenceRegistry> UploadSink for PageShell<R> {
    fn acquire(&mut self, bytes: Arc<[u8]>) -> Result<ModelRef> {
        self.registry.acquire(bytes)
    }

    fn release(&mut self, reference: ModelRef) {
        self.registry.release(reference);
    }

    fn accept(&mut self, reference: ModelRef, file: ModelFile) -> std::result::Result<(), AcceptError> {
        self.on_upload(reference, file);
        Ok(())
    }
}

impl<R: ReferenceRegistry> Drop for PageShell<R> {
    fn drop(&mut self) {
        self.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::{FileIntake, IntakeOutcome};
    use crate::testing::{temp_file, RecordingRegistry};
    use crate::toast::Toasts;
    use crate::UploadCandidate;
    use glview_core::ViewerError;

    fn upload(shell: &mut PageShell<RecordingRegistry>, name: &str, bytes: &[u8]) -> RefKey {
        let reference = shell.acquire(Arc::from(bytes)).unwrap();
        let key = reference.key();
        let file = ModelFile::new(name, Arc::from(bytes), None);
        shell.on_upload(reference, file);
        key
    }

    #[test]
    fn test_starts_empty() {
        let shell: PageShell = PageShell::default();
        assert!(shell.active().is_none());
        assert!(shell.resolve_active().is_none());
    }

    #[test]
    fn test_replace_releases_previous_exactly_once() {
        let mut shell = PageShell::new(RecordingRegistry::default());
        let a = upload(&mut shell, "a.glb", b"aaaa");
        let b = upload(&mut shell, "b.glb", b"bb");

        assert_eq!(shell.active().unwrap().file().name, "b.glb");
        assert_eq!(shell.active_key(), Some(b));
        assert_eq!(shell.registry().released, vec![a]);
        assert_eq!(shell.registry().live_count(), 1);
        assert!(shell.registry().resolve(a).is_none());
    }

    #[test]
    fn test_reset_releases_and_empties() {
        let mut shell = PageShell::new(RecordingRegistry::default());
        let a = upload(&mut shell, "a.glb", b"aaaa");

        shell.reset();
        assert!(shell.active().is_none());
        assert_eq!(shell.registry().released, vec![a]);
        assert_eq!(shell.registry().live_count(), 0);

        // Second reset has nothing to release
        shell.reset();
        assert_eq!(shell.registry().released.len(), 1);
    }

    #[test]
    fn test_live_count_never_exceeds_one() {
        let mut shell = PageShell::new(RecordingRegistry::default());
        for i in 0..10 {
            upload(&mut shell, &format!("m{}.glb", i), &[i as u8]);
            assert_eq!(shell.registry().live_count(), 1);
        }
        assert_eq!(shell.registry().released.len(), 9);
    }

    #[test]
    fn test_resolve_active_returns_bytes() {
        let mut shell = PageShell::new(RecordingRegistry::default());
        let key = upload(&mut shell, "a.glb", b"glTF");
        let (resolved_key, bytes) = shell.resolve_active().unwrap();
        assert_eq!(resolved_key, key);
        assert_eq!(&*bytes, b"glTF");
    }

    #[test]
    fn test_upload_then_replace_through_intake() {
        let a_path = temp_file("a.glb", 128);
        let b_path = temp_file("b.glb", 256);
        let intake = FileIntake::new();
        let mut shell = PageShell::new(RecordingRegistry::default());
        let mut toasts = Toasts::new();

        let IntakeOutcome::Accepted { key: a } = intake.submit_path(&a_path, &mut shell, &mut toasts)
        else {
            panic!("a.glb rejected");
        };
        let IntakeOutcome::Accepted { key: b } = intake.submit_path(&b_path, &mut shell, &mut toasts)
        else {
            panic!("b.glb rejected");
        };

        let active = shell.active().unwrap();
        assert_eq!(active.key(), b);
        assert_eq!(active.file().name, "b.glb");
        assert_eq!(active.file().size(), 256);
        assert_eq!(shell.registry().released, vec![a]);

        std::fs::remove_file(a_path).ok();
        std::fs::remove_file(b_path).ok();
    }

    #[test]
    fn test_rejections_leave_active_model_untouched() {
        let intake = FileIntake::new();
        let mut shell = PageShell::new(RecordingRegistry::default());
        let mut toasts = Toasts::new();
        let key = upload(&mut shell, "keep.glb", b"keep");

        let outcome = intake.submit(
            UploadCandidate::from_bytes("notes.txt", vec![0u8; 4]),
            &mut shell,
            &mut toasts,
        );
        assert!(matches!(outcome.error(), Some(ViewerError::WrongFileType { .. })));

        let huge = temp_file("scene.glb", 60 * 1024 * 1024);
        let outcome = intake.submit_path(&huge, &mut shell, &mut toasts);
        assert!(matches!(outcome.error(), Some(ViewerError::FileTooLarge { .. })));

        assert_eq!(shell.active_key(), Some(key));
        assert!(shell.registry().released.is_empty());
        std::fs::remove_file(huge).ok();
    }

    #[test]
    fn test_drop_releases_active() {
        struct Probe(std::rc::Rc<std::cell::Cell<usize>>);
        impl ReferenceRegistry for Probe {
            fn acquire(&mut self, _bytes: Arc<[u8]>) -> Result<ModelRef> {
                Ok(ModelRef::mint())
            }
            fn release(&mut self, _reference: ModelRef) {
                self.0.set(self.0.get() + 1);
            }
            fn resolve(&self, _key: RefKey) -> Option<Arc<[u8]>> {
                None
            }
            fn live_count(&self) -> usize {
                0
            }
        }

        let releases = std::rc::Rc::new(std::cell::Cell::new(0));
        {
            let mut shell = PageShell::new(Probe(releases.clone()));
            let reference = shell.acquire(Arc::from(&b"x"[..])).unwrap();
            shell.on_upload(reference, ModelFile::new("x.glb", Arc::from(&b"x"[..]), None));
        }
        assert_eq!(releases.get(), 1);
    }
}
