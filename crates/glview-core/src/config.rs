//! Layered configuration system
//!
//! Config is loaded with three layers of precedence (highest wins):
//! 1. Environment variables: `GLVIEW_*`
//! 2. Project-local: `.glview/config.toml`
//! 3. Global: `~/.glview/config.toml`
//!
//! The upload size ceiling is deliberately absent: it is a fixed constant.

use crate::{Result, ViewerError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Backdrop and ambient tint applied behind the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentPreset {
    #[default]
    City,
    Studio,
    Sunset,
    Night,
}

impl EnvironmentPreset {
    pub const ALL: [EnvironmentPreset; 4] = [
        EnvironmentPreset::City,
        EnvironmentPreset::Studio,
        EnvironmentPreset::Sunset,
        EnvironmentPreset::Night,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EnvironmentPreset::City => "city",
            EnvironmentPreset::Studio => "studio",
            EnvironmentPreset::Sunset => "sunset",
            EnvironmentPreset::Night => "night",
        }
    }
}

impl fmt::Display for EnvironmentPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EnvironmentPreset {
    type Err = ViewerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                ViewerError::ConfigError(format!(
                    "unknown environment preset '{}' (expected city, studio, sunset or night)",
                    s
                ))
            })
    }
}

/// `[window]` table as written on disk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WindowSection {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// `[viewport]` table as written on disk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewportSection {
    pub auto_rotate_speed: Option<f32>,
    pub environment: Option<EnvironmentPreset>,
    pub shadows: Option<bool>,
    pub shadow_resolution: Option<u32>,
    pub show_stats: Option<bool>,
}

/// `[export]` table as written on disk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportSection {
    pub dir: Option<PathBuf>,
}

/// Top-level config file structure. Every field is optional so a layer only
/// overrides what it mentions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewerConfigFile {
    #[serde(default)]
    pub window: WindowSection,
    #[serde(default)]
    pub viewport: ViewportSection,
    #[serde(default)]
    pub export: ExportSection,
}

/// Resolved configuration with all layers applied
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub window_width: u32,
    pub window_height: u32,
    /// Radians per second of idle model rotation
    pub auto_rotate_speed: f32,
    pub environment: EnvironmentPreset,
    pub shadows: bool,
    pub shadow_resolution: u32,
    pub show_stats: bool,
    /// Where screenshots and re-downloaded models are written
    pub export_dir: PathBuf,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 800,
            auto_rotate_speed: 0.2,
            environment: EnvironmentPreset::City,
            shadows: true,
            shadow_resolution: 2048,
            show_stats: false,
            export_dir: default_export_dir(),
        }
    }
}

fn default_export_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
}

impl ViewerConfig {
    /// Load config with layered precedence: global < project < env vars
    pub fn load() -> Result<Self> {
        let mut config = ViewerConfig::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                config.merge(Self::load_file(&global_path)?);
                log::debug!("Loaded global config {}", global_path.display());
            }
        }

        let local_path = PathBuf::from(".glview/config.toml");
        if local_path.exists() {
            config.merge(Self::load_file(&local_path)?);
            log::debug!("Loaded project config {}", local_path.display());
        }

        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load config from a specific file path on top of the defaults
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let mut config = ViewerConfig::default();
        config.merge(Self::load_file(path)?);
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".glview").join("config.toml"))
    }

    fn load_file(path: &Path) -> Result<ViewerConfigFile> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            ViewerError::ConfigError(format!("Failed to parse config {}: {}", path.display(), e))
        })
    }

    fn merge(&mut self, overlay: ViewerConfigFile) {
        if let Some(w) = overlay.window.width {
            self.window_width = w.max(320);
        }
        if let Some(h) = overlay.window.height {
            self.window_height = h.max(240);
        }
        if let Some(speed) = overlay.viewport.auto_rotate_speed {
            if is_valid_rotate_speed(speed) {
                self.auto_rotate_speed = speed;
            } else {
                log::warn!("Ignoring auto_rotate_speed = {}: must be a positive number", speed);
            }
        }
        if let Some(env) = overlay.viewport.environment {
            self.environment = env;
        }
        if let Some(shadows) = overlay.viewport.shadows {
            self.shadows = shadows;
        }
        if let Some(res) = overlay.viewport.shadow_resolution {
            self.shadow_resolution = res.clamp(256, 8192);
        }
        if let Some(stats) = overlay.viewport.show_stats {
            self.show_stats = stats;
        }
        if let Some(dir) = overlay.export.dir {
            self.export_dir = dir;
        }
    }

    /// Apply `GLVIEW_*` overrides. Unparseable values are logged and skipped.
    fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("GLVIEW_EXPORT_DIR") {
            self.export_dir = PathBuf::from(dir);
        }
        if let Some(value) = lookup("GLVIEW_ENVIRONMENT") {
            match value.parse() {
                Ok(env) => self.environment = env,
                Err(e) => log::warn!("Ignoring GLVIEW_ENVIRONMENT: {}", e),
            }
        }
        if let Some(value) = lookup("GLVIEW_AUTO_ROTATE_SPEED") {
            match value.trim().parse::<f32>() {
                Ok(speed) if is_valid_rotate_speed(speed) => self.auto_rotate_speed = speed,
                _ => log::warn!("Ignoring GLVIEW_AUTO_ROTATE_SPEED={}", value),
            }
        }
        if let Some(value) = lookup("GLVIEW_SHADOWS") {
            match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "on" => self.shadows = true,
                "0" | "false" | "off" => self.shadows = false,
                _ => log::warn!("Ignoring GLVIEW_SHADOWS={}", value),
            }
        }
    }
}

/// Auto-rotation must keep advancing, so only finite speeds above zero apply.
fn is_valid_rotate_speed(speed: f32) -> bool {
    speed.is_finite() && speed > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn temp_config(content: &str) -> PathBuf {
        let dir =
            std::env::temp_dir().join(format!("glview_config_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    fn cleanup(path: &Path) {
        std::fs::remove_file(path).ok();
        std::fs::remove_dir(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_defaults() {
        let config = ViewerConfig::default();
        assert_eq!(config.auto_rotate_speed, 0.2);
        assert_eq!(config.environment, EnvironmentPreset::City);
        assert!(config.shadows);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let path = temp_config(
            r#"
[viewport]
environment = "sunset"
shadow_resolution = 99999

[export]
dir = "/tmp/glview-out"
"#,
        );
        let mut config = ViewerConfig::default();
        config.merge(ViewerConfig::load_file(&path).unwrap());

        assert_eq!(config.environment, EnvironmentPreset::Sunset);
        assert_eq!(config.shadow_resolution, 8192);
        assert_eq!(config.export_dir, PathBuf::from("/tmp/glview-out"));
        assert_eq!(config.window_width, 1280);
        assert_eq!(config.auto_rotate_speed, 0.2);

        cleanup(&path);
    }

    #[test]
    fn test_later_layer_wins() {
        let global = temp_config("[viewport]\nenvironment = \"night\"\nshadows = false\n");
        let local = temp_config("[viewport]\nenvironment = \"studio\"\n");

        let mut config = ViewerConfig::default();
        config.merge(ViewerConfig::load_file(&global).unwrap());
        config.merge(ViewerConfig::load_file(&local).unwrap());

        assert_eq!(config.environment, EnvironmentPreset::Studio);
        assert!(!config.shadows);

        cleanup(&global);
        cleanup(&local);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("GLVIEW_ENVIRONMENT", "Night"),
            ("GLVIEW_AUTO_ROTATE_SPEED", "0.5"),
            ("GLVIEW_SHADOWS", "off"),
            ("GLVIEW_EXPORT_DIR", "/data/exports"),
        ]
        .into_iter()
        .collect();

        let mut config = ViewerConfig::default();
        config.apply_env_overrides(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.environment, EnvironmentPreset::Night);
        assert_eq!(config.auto_rotate_speed, 0.5);
        assert!(!config.shadows);
        assert_eq!(config.export_dir, PathBuf::from("/data/exports"));
    }

    #[test]
    fn test_bad_env_values_ignored() {
        let mut config = ViewerConfig::default();
        config.apply_env_overrides(|k| match k {
            "GLVIEW_ENVIRONMENT" => Some("forest".into()),
            "GLVIEW_AUTO_ROTATE_SPEED" => Some("fast".into()),
            _ => None,
        });
        assert_eq!(config, ViewerConfig::default());
    }

    #[test]
    fn test_non_positive_rotate_speed_ignored() {
        for value in ["nan", "inf", "-0.5", "0.0"] {
            let path = temp_config(&format!("[viewport]\nauto_rotate_speed = {}\n", value));
            let mut config = ViewerConfig::default();
            config.merge(ViewerConfig::load_file(&path).unwrap());
            assert_eq!(config.auto_rotate_speed, 0.2, "file value {}", value);
            cleanup(&path);

            let mut config = ViewerConfig::default();
            config.apply_env_overrides(|k| {
                (k == "GLVIEW_AUTO_ROTATE_SPEED").then(|| value.to_string())
            });
            assert_eq!(config.auto_rotate_speed, 0.2, "env value {}", value);
        }
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let path = temp_config("[viewport\nenvironment = ");
        let err = ViewerConfig::load_file(&path).unwrap_err();
        assert!(matches!(err, ViewerError::ConfigError(_)));
        cleanup(&path);
    }

    #[test]
    fn test_preset_parse() {
        assert_eq!("CITY".parse::<EnvironmentPreset>().unwrap(), EnvironmentPreset::City);
        assert!("forest".parse::<EnvironmentPreset>().is_err());
        assert_eq!(EnvironmentPreset::Sunset.to_string(), "sunset");
    }
}
