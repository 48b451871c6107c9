//! Transient notifications

use glview_core::ViewerError;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastVariant {
    Default,
    Destructive,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub title: String,
    pub description: String,
    pub variant: ToastVariant,
    pub created: Instant,
}

impl Toast {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: ToastVariant::Default,
            created: Instant::now(),
        }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            variant: ToastVariant::Destructive,
            ..Self::success(title, description)
        }
    }

    /// Opacity for a toast that fades over the last second of `ttl`
    pub fn alpha(&self, now: Instant, ttl: Duration) -> f32 {
        let age = now.saturating_duration_since(self.created);
        let remaining = ttl.saturating_sub(age).as_secs_f32();
        remaining.min(1.0)
    }
}

/// Map an error to the notification the user sees.
pub fn toast_for_error(err: &ViewerError) -> Toast {
    match err {
        ViewerError::WrongFileType { .. } => {
            Toast::error("Invalid file type", "Please upload a GLB file (.glb)")
        }
        ViewerError::FileTooLarge { .. } => {
            Toast::error("File too large", "Please upload a file smaller than 50MB")
        }
        ViewerError::UploadFailed(_) => {
            Toast::error("Upload failed", "There was an error loading your model")
        }
        ViewerError::UploadBusy => Toast::error(
            "Upload in progress",
            "Wait for the current upload to finish",
        ),
        ViewerError::DecodeFailed(reason) => Toast::error("Could not display model", reason.clone()),
        ViewerError::ExportError(reason) => Toast::error("Export failed", reason.clone()),
        other => Toast::error("Error", other.to_string()),
    }
}

/// Queue of visible toasts, newest last
#[derive(Debug)]
pub struct Toasts {
    items: VecDeque<Toast>,
    ttl: Duration,
    limit: usize,
}

impl Default for Toasts {
    fn default() -> Self {
        Self::new()
    }
}

impl Toasts {
    pub const DEFAULT_TTL: Duration = Duration::from_secs(4);
    pub const LIMIT: usize = 3;

    pub fn new() -> Self {
        Self::with_ttl(Self::DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            items: VecDeque::new(),
            ttl,
            limit: Self::LIMIT,
        }
    }

    /// Show a toast, evicting the oldest when full.
    pub fn push(&mut self, toast: Toast) {
        log::debug!("Toast: {} - {}", toast.title, toast.description);
        if self.items.len() == self.limit {
            self.items.pop_front();
        }
        self.items.push_back(toast);
    }

    pub fn push_error(&mut self, err: &ViewerError) {
        self.push(toast_for_error(err));
    }

    /// Drop toasts older than the TTL.
    pub fn prune(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.items
            .retain(|t| now.saturating_duration_since(t.created) < ttl);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.items.iter()
    }

    pub fn latest(&self) -> Option<&Toast> {
        self.items.back()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_texts() {
        let t = toast_for_error(&ViewerError::WrongFileType { name: "a.obj".into() });
        assert_eq!(t.title, "Invalid file type");
        assert_eq!(t.description, "Please upload a GLB file (.glb)");
        assert_eq!(t.variant, ToastVariant::Destructive);

        let t = toast_for_error(&ViewerError::FileTooLarge {
            name: "scene.glb".into(),
            size: 1,
            limit: 0,
        });
        assert_eq!(t.title, "File too large");
        assert_eq!(t.description, "Please upload a file smaller than 50MB");

        let t = toast_for_error(&ViewerError::UploadFailed("io".into()));
        assert_eq!(t.title, "Upload failed");
        assert_eq!(t.description, "There was an error loading your model");
    }

    #[test]
    fn test_limit_evicts_oldest() {
        let mut toasts = Toasts::new();
        for i in 0..5 {
            toasts.push(Toast::success(format!("t{}", i), ""));
        }
        assert_eq!(toasts.len(), Toasts::LIMIT);
        assert_eq!(toasts.iter().next().unwrap().title, "t2");
        assert_eq!(toasts.latest().unwrap().title, "t4");
    }

    #[test]
    fn test_prune_expires() {
        let mut toasts = Toasts::with_ttl(Duration::from_millis(100));
        toasts.push(Toast::success("hello", "world"));
        let created = toasts.latest().unwrap().created;

        toasts.prune(created + Duration::from_millis(50));
        assert_eq!(toasts.len(), 1);

        toasts.prune(created + Duration::from_millis(150));
        assert!(toasts.is_empty());
    }

    #[test]
    fn test_alpha_fades_in_last_second() {
        let toast = Toast::success("a", "b");
        let ttl = Duration::from_secs(4);
        assert_eq!(toast.alpha(toast.created, ttl), 1.0);
        let late = toast.created + Duration::from_millis(3500);
        assert!((toast.alpha(late, ttl) - 0.5).abs() < 1e-3);
        assert_eq!(toast.alpha(toast.created + ttl, ttl), 0.0);
    }
}
