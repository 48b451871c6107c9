//! Environment presets: backdrop gradient and ambient tint

use glview_core::EnvironmentPreset;

/// Linear-space colours an environment contributes to the scene
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvironmentPalette {
    /// Backdrop straight up
    pub zenith: [f32; 3],
    /// Backdrop at eye level
    pub horizon: [f32; 3],
    /// Backdrop straight down
    pub ground: [f32; 3],
    /// Hemisphere ambient from above
    pub ambient_sky: [f32; 3],
    /// Hemisphere ambient from below
    pub ambient_ground: [f32; 3],
    /// Strength of the gradient seen in reflections
    pub reflection: f32,
}

impl EnvironmentPalette {
    pub fn for_preset(preset: EnvironmentPreset) -> Self {
        match preset {
            EnvironmentPreset::City => Self {
                zenith: [0.36, 0.45, 0.60],
                horizon: [0.74, 0.72, 0.68],
                ground: [0.22, 0.21, 0.20],
                ambient_sky: [0.80, 0.84, 0.92],
                ambient_ground: [0.38, 0.35, 0.32],
                reflection: 0.9,
            },
            EnvironmentPreset::Studio => Self {
                zenith: [0.55, 0.55, 0.57],
                horizon: [0.86, 0.86, 0.87],
                ground: [0.38, 0.38, 0.40],
                ambient_sky: [0.95, 0.95, 0.96],
                ambient_ground: [0.50, 0.50, 0.52],
                reflection: 1.0,
            },
            EnvironmentPreset::Sunset => Self {
                zenith: [0.22, 0.20, 0.42],
                horizon: [0.96, 0.52, 0.28],
                ground: [0.18, 0.11, 0.09],
                ambient_sky: [0.95, 0.70, 0.55],
                ambient_ground: [0.30, 0.20, 0.18],
                reflection: 0.8,
            },
            EnvironmentPreset::Night => Self {
                zenith: [0.01, 0.015, 0.04],
                horizon: [0.06, 0.07, 0.12],
                ground: [0.02, 0.02, 0.03],
                ambient_sky: [0.30, 0.34, 0.50],
                ambient_ground: [0.08, 0.08, 0.12],
                reflection: 0.4,
            },
        }
    }
}
