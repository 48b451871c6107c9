//! File intake: validation and the upload-in-progress gate
//!
//! One file per upload action. Validation runs in a fixed order (extension,
//! then size) before any bytes are read. A candidate that passes is read,
//! turned into a [`ModelRef`] and handed to the [`UploadSink`]. The
//! `uploading` flag is cleared on every exit path, including unwinding out of
//! the sink.

use crate::blob::{ModelRef, RefKey};
use crate::candidate::{ModelFile, UploadCandidate};
use crate::toast::{toast_for_error, Toast, Toasts};
use glview_core::{has_accepted_extension, Result, ViewerError, MAX_UPLOAD_BYTES};
use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Returned by [`UploadSink::accept`] to refuse a model. Carries the
/// reference back so the intake can release it.
#[derive(Debug)]
pub struct AcceptError {
    pub reference: ModelRef,
    pub reason: String,
}

/// Receiver of validated uploads (the page shell)
pub trait UploadSink {
    fn acquire(&mut self, bytes: Arc<[u8]>) -> Result<ModelRef>;
    fn release(&mut self, reference: ModelRef);
    fn accept(&mut self, reference: ModelRef, file: ModelFile) -> std::result::Result<(), AcceptError>;
}

#[derive(Debug)]
pub enum IntakeOutcome {
    Accepted { key: RefKey },
    Rejected(ViewerError),
}

impl IntakeOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, IntakeOutcome::Accepted { .. })
    }

    pub fn error(&self) -> Option<&ViewerError> {
        match self {
            IntakeOutcome::Accepted { .. } => None,
            IntakeOutcome::Rejected(err) => Some(err),
        }
    }
}

/// Check a candidate against the upload rules, extension first.
pub fn validate(candidate: &UploadCandidate) -> Result<()> {
    if !has_accepted_extension(&candidate.name) {
        return Err(ViewerError::WrongFileType {
            name: candidate.name.clone(),
        });
    }
    if candidate.size > MAX_UPLOAD_BYTES {
        return Err(ViewerError::FileTooLarge {
            name: candidate.name.clone(),
            size: candidate.size,
            limit: MAX_UPLOAD_BYTES,
        });
    }
    Ok(())
}

/// Drag-over and upload-in-progress flags
#[derive(Debug, Default)]
pub struct FileIntake {
    drag_over: Cell<bool>,
    uploading: Cell<bool>,
}

/// Clears the uploading flag when dropped.
struct UploadingGuard<'a>(&'a Cell<bool>);

impl Drop for UploadingGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl FileIntake {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_drag_over(&self) -> bool {
        self.drag_over.get()
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading.get()
    }

    pub fn drag_enter(&self) {
        self.drag_over.set(true);
    }

    pub fn drag_leave(&self) {
        self.drag_over.set(false);
    }

    /// Files dropped on the window. Only the first is submitted.
    pub fn on_drop(
        &self,
        paths: &[PathBuf],
        sink: &mut dyn UploadSink,
        toasts: &mut Toasts,
    ) -> Option<IntakeOutcome> {
        self.drag_over.set(false);
        let first = paths.first()?;
        if paths.len() > 1 {
            log::info!("{} files dropped, using {}", paths.len(), first.display());
        }
        Some(self.submit_path(first, sink, toasts))
    }

    /// Submit a file on disk (picker result, drop, or command line).
    pub fn submit_path(
        &self,
        path: &Path,
        sink: &mut dyn UploadSink,
        toasts: &mut Toasts,
    ) -> IntakeOutcome {
        match UploadCandidate::from_path(path) {
            Ok(candidate) => self.submit(candidate, sink, toasts),
            Err(err) => {
                log::error!("Upload of {} failed: {}", path.display(), err);
                toasts.push(toast_for_error(&err));
                IntakeOutcome::Rejected(err)
            }
        }
    }

    /// Validate a candidate and, if it passes, hand it to the sink.
    pub fn submit(
        &self,
        candidate: UploadCandidate,
        sink: &mut dyn UploadSink,
        toasts: &mut Toasts,
    ) -> IntakeOutcome {
        if let Err(err) = validate(&candidate) {
            log::warn!("Rejected upload: {}", err);
            toasts.push(toast_for_error(&err));
            return IntakeOutcome::Rejected(err);
        }

        if self.uploading.get() {
            log::warn!("Ignoring {}: another upload is in progress", candidate.name);
            return IntakeOutcome::Rejected(ViewerError::UploadBusy);
        }

        self.uploading.set(true);
        let _guard = UploadingGuard(&self.uploading);

        let name = candidate.name.clone();
        match transfer(candidate, sink) {
            Ok(key) => {
                log::info!("Accepted {} as {}", name, key);
                toasts.push(Toast::success(
                    "Model loaded successfully!",
                    format!("{} is ready to view", name),
                ));
                IntakeOutcome::Accepted { key }
            }
            Err(err) => {
                log::error!("Upload of {} failed: {}", name, err);
                toasts.push(toast_for_error(&err));
                IntakeOutcome::Rejected(err)
            }
        }
    }
}

fn transfer(candidate: UploadCandidate, sink: &mut dyn UploadSink) -> Result<RefKey> {
    let bytes = candidate.read_bytes().map_err(|e| match e {
        ViewerError::FileTooLarge { .. } => e,
        other => ViewerError::UploadFailed(format!("reading {}: {}", candidate.name, other)),
    })?;
    let file = ModelFile::new(
        candidate.name.clone(),
        Arc::clone(&bytes),
        candidate.source_path().map(Path::to_path_buf),
    );

    let reference = sink
        .acquire(bytes)
        .map_err(|e| ViewerError::UploadFailed(format!("creating reference: {}", e)))?;
    let key = reference.key();

    sink.accept(reference, file).map_err(|rejected| {
        sink.release(rejected.reference);
        ViewerError::UploadFailed(rejected.reason)
    })?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::{BlobRegistry, ReferenceRegistry};
    use crate::testing::{temp_file, RecordingRegistry};
    use std::rc::Rc;

    /// Sink that keeps whatever it accepts
    #[derive(Default)]
    struct KeepSink {
        registry: RecordingRegistry,
        accepted: Vec<(ModelRef, ModelFile)>,
        refuse: bool,
        panic: bool,
    }

    impl UploadSink for KeepSink {
        fn acquire(&mut self, bytes: Arc<[u8]>) -> Result<ModelRef> {
            self.registry.acquire(bytes)
        }
        fn release(&mut self, reference: ModelRef) {
            self.registry.release(reference);
        }
        fn accept(
            &mut self,
            reference: ModelRef,
            file: ModelFile,
        ) -> std::result::Result<(), AcceptError> {
            if self.panic {
                panic!("viewer blew up");
            }
            if self.refuse {
                return Err(AcceptError {
                    reference,
                    reason: "viewer unavailable".into(),
                });
            }
            self.accepted.push((reference, file));
            Ok(())
        }
    }

    fn glb(name: &str, size: usize) -> UploadCandidate {
        UploadCandidate::from_bytes(name, vec![0u8; size])
    }

    #[test]
    fn test_wrong_extension_rejected() {
        let intake = FileIntake::new();
        let mut sink = KeepSink::default();
        let mut toasts = Toasts::new();

        for name in ["model.gltf", "model.obj", "model.glb.zip", "glb", "model"] {
            let outcome = intake.submit(glb(name, 10), &mut sink, &mut toasts);
            assert!(matches!(
                outcome.error(),
                Some(ViewerError::WrongFileType { .. })
            ));
        }
        assert!(sink.accepted.is_empty());
        assert_eq!(sink.registry.live_count(), 0);
        assert_eq!(toasts.latest().unwrap().title, "Invalid file type");
    }

    #[test]
    fn test_extension_checked_before_size() {
        let candidate = UploadCandidate {
            name: "huge.fbx".into(),
            size: MAX_UPLOAD_BYTES * 2,
            source: crate::CandidateSource::Memory(Arc::from(&[][..])),
        };
        assert!(matches!(
            validate(&candidate),
            Err(ViewerError::WrongFileType { .. })
        ));
    }

    #[test]
    fn test_size_boundary() {
        let at_limit = UploadCandidate {
            name: "edge.glb".into(),
            size: MAX_UPLOAD_BYTES,
            source: crate::CandidateSource::Memory(Arc::from(&[][..])),
        };
        assert!(validate(&at_limit).is_ok());

        let over = UploadCandidate {
            size: MAX_UPLOAD_BYTES + 1,
            ..at_limit
        };
        assert!(matches!(
            validate(&over),
            Err(ViewerError::FileTooLarge { size, .. }) if size == MAX_UPLOAD_BYTES + 1
        ));
    }

    #[test]
    fn test_uppercase_extension_accepted() {
        let intake = FileIntake::new();
        let mut sink = KeepSink::default();
        let mut toasts = Toasts::new();
        let outcome = intake.submit(glb("UPPER.GLB", 10), &mut sink, &mut toasts);
        assert!(outcome.is_accepted());
    }

    #[test]
    fn test_success_hands_reference_and_file_to_sink() {
        let intake = FileIntake::new();
        let mut sink = KeepSink::default();
        let mut toasts = Toasts::new();

        assert!(!intake.is_uploading());
        let outcome = intake.submit(glb("chair.glb", 1024), &mut sink, &mut toasts);
        assert!(!intake.is_uploading());

        let IntakeOutcome::Accepted { key } = outcome else {
            panic!("expected acceptance");
        };
        let (reference, file) = &sink.accepted[0];
        assert_eq!(reference.key(), key);
        assert_eq!(file.name, "chair.glb");
        assert_eq!(file.size(), 1024);
        assert_eq!(sink.registry.resolve(key).unwrap().len(), 1024);

        let toast = toasts.latest().unwrap();
        assert_eq!(toast.title, "Model loaded successfully!");
        assert_eq!(toast.description, "chair.glb is ready to view");
    }

    #[test]
    fn test_refused_accept_releases_reference_and_clears_flag() {
        let intake = FileIntake::new();
        let mut sink = KeepSink {
            refuse: true,
            ..Default::default()
        };
        let mut toasts = Toasts::new();

        let outcome = intake.submit(glb("a.glb", 8), &mut sink, &mut toasts);
        assert!(matches!(outcome.error(), Some(ViewerError::UploadFailed(_))));
        assert!(!intake.is_uploading());
        assert_eq!(sink.registry.live_count(), 0);
        assert_eq!(sink.registry.released.len(), 1);
        assert_eq!(toasts.latest().unwrap().title, "Upload failed");
    }

    #[test]
    fn test_failed_acquire_is_upload_failed() {
        let intake = FileIntake::new();
        let mut sink = KeepSink::default();
        sink.registry.fail_acquire = true;
        let mut toasts = Toasts::new();

        let outcome = intake.submit(glb("a.glb", 8), &mut sink, &mut toasts);
        assert!(matches!(outcome.error(), Some(ViewerError::UploadFailed(_))));
        assert!(!intake.is_uploading());
    }

    #[test]
    fn test_panicking_sink_clears_flag() {
        let intake = FileIntake::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut sink = KeepSink {
                panic: true,
                ..Default::default()
            };
            let mut toasts = Toasts::new();
            intake.submit(glb("a.glb", 8), &mut sink, &mut toasts);
        }));
        assert!(result.is_err());
        assert!(!intake.is_uploading());
    }

    /// Sink that tries to start a second upload from inside `accept`
    struct ReentrantSink {
        intake: Rc<FileIntake>,
        registry: BlobRegistry,
        nested: Option<IntakeOutcome>,
        kept: Vec<ModelRef>,
    }

    impl UploadSink for ReentrantSink {
        fn acquire(&mut self, bytes: Arc<[u8]>) -> Result<ModelRef> {
            self.registry.acquire(bytes)
        }
        fn release(&mut self, reference: ModelRef) {
            self.registry.release(reference);
        }
        fn accept(
            &mut self,
            reference: ModelRef,
            _file: ModelFile,
        ) -> std::result::Result<(), AcceptError> {
            self.kept.push(reference);
            if self.nested.is_none() {
                let intake = Rc::clone(&self.intake);
                let mut toasts = Toasts::new();
                self.nested = Some(intake.submit(glb("b.glb", 4), self, &mut toasts));
            }
            Ok(())
        }
    }

    #[test]
    fn test_concurrent_upload_is_rejected() {
        let intake = Rc::new(FileIntake::new());
        let mut sink = ReentrantSink {
            intake: Rc::clone(&intake),
            registry: BlobRegistry::new(),
            nested: None,
            kept: Vec::new(),
        };
        let mut toasts = Toasts::new();

        let outcome = intake.submit(glb("a.glb", 4), &mut sink, &mut toasts);
        assert!(outcome.is_accepted());
        assert!(matches!(
            sink.nested.as_ref().and_then(|o| o.error()),
            Some(ViewerError::UploadBusy)
        ));
        assert_eq!(sink.kept.len(), 1);
        assert!(!intake.is_uploading());
    }

    #[test]
    fn test_drag_flags() {
        let intake = FileIntake::new();
        intake.drag_enter();
        assert!(intake.is_drag_over());
        intake.drag_leave();
        assert!(!intake.is_drag_over());

        intake.drag_enter();
        let mut sink = KeepSink::default();
        let mut toasts = Toasts::new();
        assert!(intake.on_drop(&[], &mut sink, &mut toasts).is_none());
        assert!(!intake.is_drag_over());
    }

    #[test]
    fn test_drop_takes_first_file() {
        let first = temp_file("first.glb", 16);
        let second = temp_file("second.glb", 16);
        let intake = FileIntake::new();
        let mut sink = KeepSink::default();
        let mut toasts = Toasts::new();

        let outcome = intake
            .on_drop(&[first.clone(), second.clone()], &mut sink, &mut toasts)
            .unwrap();
        assert!(outcome.is_accepted());
        assert_eq!(sink.accepted.len(), 1);
        assert_eq!(sink.accepted[0].1.name, "first.glb");
        assert_eq!(sink.accepted[0].1.path.as_deref(), Some(first.as_path()));

        std::fs::remove_file(first).ok();
        std::fs::remove_file(second).ok();
    }

    #[test]
    fn test_oversize_path_rejected_without_reading() {
        let path = temp_file("scene.glb", 60 * 1024 * 1024);
        let intake = FileIntake::new();
        let mut sink = KeepSink::default();
        let mut toasts = Toasts::new();

        let outcome = intake.submit_path(&path, &mut sink, &mut toasts);
        assert!(matches!(outcome.error(), Some(ViewerError::FileTooLarge { .. })));
        assert_eq!(sink.registry.live_count(), 0);
        assert_eq!(toasts.latest().unwrap().title, "File too large");

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_file_grown_after_validation_rejected() {
        let path = temp_file("scene.glb", 16);
        let candidate = UploadCandidate::from_path(&path).unwrap();
        let file = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
        file.set_len(MAX_UPLOAD_BYTES * 2).unwrap();

        let intake = FileIntake::new();
        let mut sink = KeepSink::default();
        let mut toasts = Toasts::new();

        let outcome = intake.submit(candidate, &mut sink, &mut toasts);
        assert!(matches!(outcome.error(), Some(ViewerError::FileTooLarge { .. })));
        assert!(sink.accepted.is_empty());
        assert_eq!(sink.registry.live_count(), 0);
        assert!(!intake.is_uploading());
        assert_eq!(toasts.latest().unwrap().title, "File too large");

        std::fs::remove_file(path).ok();
    }
}
