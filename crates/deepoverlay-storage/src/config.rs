//! Overlay configuration.
//!
//! Settings are grouped in sections and stored as JSON or TOML, picked by
//! the file extension. Every section defaults to the built-in constants, so a
//! partial file (or no file) is valid.

use std::path::{Path, PathBuf};

use deepoverlay_core::constants::{
    MIN_BOX_SIZE, MIN_RESIZE, NOTE_EDITOR_OFFSET, URL_POLL_INTERVAL_MS,
};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Pointer gesture thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionSettings {
    /// Smallest width/height a drawn box may have; smaller draws are discarded.
    pub min_box_size: f64,
    /// Smallest width/height a resize may shrink a box to.
    pub min_resize: f64,
}

impl Default for InteractionSettings {
    fn default() -> Self {
        Self {
            min_box_size: MIN_BOX_SIZE,
            min_resize: MIN_RESIZE,
        }
    }
}

/// SPA navigation detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationSettings {
    /// How often the host should call `check_url`.
    pub poll_interval_ms: u64,
}

impl Default for NavigationSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: URL_POLL_INTERVAL_MS,
        }
    }
}

/// Note editor placement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Vertical gap between the selected box and its note editor.
    pub bubble_offset: f64,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            bubble_offset: NOTE_EDITOR_OFFSET,
        }
    }
}

/// Initial session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub start_visible: bool,
    pub start_in_edit_mode: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            start_visible: true,
            start_in_edit_mode: false,
        }
    }
}

/// Where the annotation mapping lives.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Overrides the platform default store file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Complete overlay configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub interaction: InteractionSettings,
    pub navigation: NavigationSettings,
    pub editor: EditorSettings,
    pub session: SessionSettings,
    pub storage: StorageSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Toml,
}

fn format_of(path: &Path) -> ConfigResult<Format> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("toml") => Ok(Format::Toml),
        other => Err(ConfigError::UnsupportedFormat(
            other.unwrap_or("<none>").to_string(),
        )),
    }
}

impl OverlayConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let format = format_of(path)?;
        let content = std::fs::read_to_string(path)?;

        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Like [`load_from_file`](Self::load_from_file), but a missing file
    /// yields the defaults.
    pub fn load_or_default(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> ConfigResult<()> {
        self.validate()?;

        let content = match format_of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        fn positive(key: &str, value: f64) -> ConfigResult<()> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::ValueOutOfRange {
                    key: key.to_string(),
                    value: value.to_string(),
                })
            }
        }

        positive("interaction.min_box_size", self.interaction.min_box_size)?;
        positive("interaction.min_resize", self.interaction.min_resize)?;

        if self.navigation.poll_interval_ms == 0 {
            return Err(ConfigError::ValueOutOfRange {
                key: "navigation.poll_interval_ms".to_string(),
                value: "0".to_string(),
            });
        }

        if !self.editor.bubble_offset.is_finite() || self.editor.bubble_offset < 0.0 {
            return Err(ConfigError::ValueOutOfRange {
                key: "editor.bubble_offset".to_string(),
                value: self.editor.bubble_offset.to_string(),
            });
        }

        Ok(())
    }
}

/// Default config location: `<config dir>/deepoverlay/config.toml`.
pub fn default_config_path() -> ConfigResult<PathBuf> {
    let base = dirs::config_dir().ok_or_else(|| {
        ConfigError::ConfigDirectory("no config directory on this platform".to_string())
    })?;
    Ok(base.join("deepoverlay").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let config = OverlayConfig::default();
        assert_eq!(config.interaction.min_box_size, 20.0);
        assert_eq!(config.interaction.min_resize, 20.0);
        assert_eq!(config.navigation.poll_interval_ms, 1000);
        assert_eq!(config.editor.bubble_offset, 10.0);
        assert!(config.session.start_visible);
        assert!(!config.session.start_in_edit_mode);
        assert!(config.storage.path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: OverlayConfig = toml::from_str(
            r#"
            [interaction]
            min_box_size = 32.0
            "#,
        )
        .unwrap();
        assert_eq!(config.interaction.min_box_size, 32.0);
        assert_eq!(config.interaction.min_resize, 20.0);
        assert_eq!(config.navigation.poll_interval_ms, 1000);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = OverlayConfig::default();
        config.interaction.min_resize = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValueOutOfRange { ref key, .. }) if key == "interaction.min_resize"
        ));

        let mut config = OverlayConfig::default();
        config.navigation.poll_interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = OverlayConfig::default();
        config.editor.bubble_offset = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unsupported_extension() {
        let err = format_of(Path::new("overlay.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(ref ext) if ext == "yaml"));
        assert!(format_of(Path::new("overlay")).is_err());
    }
}
