//! Model viewport state
//!
//! Tracks which reference is on display, drives its background decode and
//! owns the orbit camera and the auto-rotation subscription. Nothing here
//! touches the GPU: the app applies [`ViewportEvent`]s to the renderer.

use glview_core::ViewerError;
use glview_import::{DecodeEvent, DecodeJob, ImportResult, LoadProgress};
use glview_render::OrbitCamera;
use glview_session::{PageShell, RefKey, ReferenceRegistry};

/// Decoded models are centred and scaled to this bounding-sphere radius.
pub const FIT_RADIUS: f32 = 1.25;

/// Default auto-rotation speed in radians per second
pub const AUTO_ROTATE_SPEED: f32 = 0.2;

#[derive(Debug, Clone, PartialEq)]
pub enum ViewportPhase {
    /// Nothing uploaded; the placeholder is shown
    Empty,
    Loading { key: RefKey, progress: LoadProgress },
    Ready { key: RefKey },
    Failed { key: RefKey, message: String },
}

impl ViewportPhase {
    pub fn key(&self) -> Option<RefKey> {
        match self {
            ViewportPhase::Empty => None,
            ViewportPhase::Loading { key, .. }
            | ViewportPhase::Ready { key }
            | ViewportPhase::Failed { key, .. } => Some(*key),
        }
    }
}

/// User-triggered viewport operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportAction {
    ResetCamera,
    Screenshot,
    DownloadOriginal,
    ClearModel,
    RetryUpload,
}

/// Result of [`Viewport::poll`] for the renderer and notifications
#[derive(Debug)]
pub enum ViewportEvent {
    Decoded(Box<ImportResult>),
    Failed(ViewerError),
}

/// Per-frame idle rotation, subscribed to one model at a time
#[derive(Debug)]
pub struct AutoRotate {
    speed: f32,
    subscription: Option<RefKey>,
}

impl AutoRotate {
    pub fn new(speed: f32) -> Self {
        Self {
            speed,
            subscription: None,
        }
    }

    pub fn attach(&mut self, key: RefKey) {
        log::debug!("Auto-rotate attached to {}", key);
        self.subscription = Some(key);
    }

    pub fn detach(&mut self) {
        if let Some(key) = self.subscription.take() {
            log::debug!("Auto-rotate detached from {}", key);
        }
    }

    pub fn subscription(&self) -> Option<RefKey> {
        self.subscription
    }

    /// Rotation for this frame. Zero unless subscribed to `shown`, and zero
    /// while the pointer hovers the model.
    pub fn tick(&self, shown: Option<RefKey>, dt: f32, hovered: bool) -> f32 {
        match (self.subscription, shown) {
            (Some(subscribed), Some(shown)) if subscribed == shown && !hovered => {
                self.speed * dt.max(0.0)
            }
            _ => 0.0,
        }
    }
}

pub struct Viewport {
    phase: ViewportPhase,
    job: Option<DecodeJob>,
    auto_rotate: AutoRotate,
    model_rotation: f32,
    hovered: bool,
    pub camera: OrbitCamera,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(AUTO_ROTATE_SPEED)
    }
}

impl Viewport {
    pub fn new(auto_rotate_speed: f32) -> Self {
        Self {
            phase: ViewportPhase::Empty,
            job: None,
            auto_rotate: AutoRotate::new(auto_rotate_speed),
            model_rotation: 0.0,
            hovered: false,
            camera: OrbitCamera::new(),
        }
    }

    pub fn phase(&self) -> &ViewportPhase {
        &self.phase
    }

    pub fn shown_key(&self) -> Option<RefKey> {
        self.phase.key()
    }

    pub fn auto_rotate(&self) -> &AutoRotate {
        &self.auto_rotate
    }

    pub fn model_rotation(&self) -> f32 {
        self.model_rotation
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    pub fn set_hovered(&mut self, hovered: bool) {
        self.hovered = hovered;
    }

    /// Follow the shell's active model. Returns true when the shown model
    /// changed, in which case GPU resources for the old one must be dropped.
    pub fn sync<R: ReferenceRegistry>(&mut self, shell: &PageShell<R>) -> bool {
        let active = shell.active_key();
        if active == self.shown_key() {
            return false;
        }

        self.teardown();

        self.phase = match (active, shell.resolve_active()) {
            (None, _) => {
                log::info!("Viewport cleared");
                ViewportPhase::Empty
            }
            (Some(_), Some((key, bytes))) => {
                log::info!("Decoding {} ({} bytes)", key, bytes.len());
                self.job = Some(DecodeJob::spawn(bytes, Some(FIT_RADIUS)));
                ViewportPhase::Loading {
                    key,
                    progress: LoadProgress::Pending,
                }
            }
            (Some(key), None) => {
                log::error!("Reference {} no longer resolves", key);
                ViewportPhase::Failed {
                    key,
                    message: "The model data is no longer available".to_string(),
                }
            }
        };
        true
    }

    /// Apply decode progress. Returns the terminal event once, if one
    /// arrived this frame.
    pub fn poll(&mut self) -> Option<ViewportEvent> {
        let ViewportPhase::Loading { key, .. } = self.phase else {
            return None;
        };
        let events = self.job.as_mut()?.poll();

        for event in events {
            match event {
                DecodeEvent::Progress(progress) => {
                    log::debug!("Decode {}: {:?}", key, progress);
                    self.phase = ViewportPhase::Loading { key, progress };
                }
                DecodeEvent::Done(result) => {
                    log::info!("Decoded {}: {:?}", key, result.stats());
                    self.job = None;
                    self.phase = ViewportPhase::Ready { key };
                    self.auto_rotate.attach(key);
                    return Some(ViewportEvent::Decoded(result));
                }
                DecodeEvent::Failed(err) => {
                    log::error!("Decode of {} failed: {}", key, err);
                    self.job = None;
                    let message = match &err {
                        ViewerError::DecodeFailed(reason) => reason.clone(),
                        other => other.to_string(),
                    };
                    self.phase = ViewportPhase::Failed { key, message };
                    return Some(ViewportEvent::Failed(err));
                }
            }
        }
        None
    }

    /// Advance camera damping and auto-rotation by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        self.camera.update(dt);
        let step = self.auto_rotate.tick(self.shown_key(), dt, self.hovered);
        if step != 0.0 {
            self.model_rotation = (self.model_rotation + step).rem_euclid(std::f32::consts::TAU);
        }
    }

    pub fn reset_camera(&mut self) {
        self.camera.reset();
    }

    /// Cancel any decode and detach auto-rotation. The phase is left alone.
    pub fn teardown(&mut self) {
        if let Some(mut job) = self.job.take() {
            job.cancel();
        }
        self.auto_rotate.detach();
        self.model_rotation = 0.0;
        self.hovered = false;
    }
}

impl Drop for Viewport {
    fn drop(&mut self) {
        self.teardown();
    }
}
