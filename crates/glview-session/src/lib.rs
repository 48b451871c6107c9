//! glview Session - the upload-validate-display-reset lifecycle
//!
//! Pure state with no windowing or GPU dependencies:
//! - `ReferenceRegistry` / `BlobRegistry` - explicit acquire/release of resolvable model references
//! - `FileIntake` - validation, drag state and the upload-in-progress gate
//! - `PageShell` - owner of the single active model
//! - `Toasts` - transient user notifications

mod blob;
mod candidate;
mod intake;
mod shell;
mod toast;

#[cfg(test)]
mod testing;

pub use blob::{BlobRegistry, ModelRef, RefKey, ReferenceRegistry};
pub use candidate::{CandidateSource, ModelFile, UploadCandidate};
pub use intake::{validate, AcceptError, FileIntake, IntakeOutcome, UploadSink};
pub use shell::{ActiveModel, PageShell};
pub use toast::{toast_for_error, Toast, ToastVariant, Toasts};
