//! Render statistics panel: FPS counter and frame timing

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Tracks rendering performance metrics
pub struct RenderStats {
    frame_times: VecDeque<Instant>,
    fps: f32,
    last_update: Instant,
}

impl Default for RenderStats {
    fn default() -> Self {
        Self {
            frame_times: VecDeque::new(),
            fps: 0.0,
            last_update: Instant::now(),
        }
    }
}

impl RenderStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a frame was rendered
    pub fn record_frame(&mut self) {
        self.record_frame_at(Instant::now());
    }

    fn record_frame_at(&mut self, now: Instant) {
        self.frame_times.push_back(now);

        // Keep only frames from the last second
        if let Some(cutoff) = now.checked_sub(Duration::from_secs(1)) {
            while self.frame_times.front().is_some_and(|&t| t < cutoff) {
                self.frame_times.pop_front();
            }
        }

        // Update FPS every 250ms
        if now.saturating_duration_since(self.last_update).as_millis() > 250 {
            self.fps = self.frame_times.len() as f32;
            self.last_update = now;
        }
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Draw the stats UI
    pub fn ui(&self, ui: &mut egui::Ui) {
        ui.monospace(format!("FPS: {:.0}", self.fps));
        if self.fps > 0.0 {
            ui.monospace(format!("Frame: {:.1}ms", 1000.0 / self.fps));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fps_counts_last_second() {
        let mut stats = RenderStats::new();
        let start = stats.last_update;
        for i in 1..=120 {
            stats.record_frame_at(start + Duration::from_millis(i * 1000 / 60));
        }
        // Two seconds at 60 Hz, so the window holds roughly one second of frames
        assert!((stats.fps() - 60.0).abs() <= 2.0, "fps = {}", stats.fps());
    }

    #[test]
    fn test_fps_zero_before_first_update() {
        let mut stats = RenderStats::new();
        let start = stats.last_update;
        stats.record_frame_at(start + Duration::from_millis(10));
        assert_eq!(stats.fps(), 0.0);
    }
}
