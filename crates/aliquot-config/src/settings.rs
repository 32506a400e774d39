//! Planner-wide defaults.

use std::path::Path;

use aliquot_core::{
    DEFAULT_BUFFER_NAME, DEFAULT_DROPLET_NL, DEFAULT_MIN_VOLUME_UL, PlateType, Volume,
};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::paths;

/// Defaults applied to every mix built from a protocol, unless the protocol
/// overrides them.
///
/// # TOML Format
///
/// ```toml
/// min_volume = "0.5 uL"
/// droplet_volume = "25 nL"
/// buffer_name = "Buffer"
/// plate_type = 96
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Smallest volume trusted to a hand pipette.
    pub min_volume: String,

    /// Droplet volume of the acoustic dispenser.
    pub droplet_volume: String,

    /// Name of the buffer top-up line.
    pub buffer_name: String,

    /// Plate size used for plate maps (96 or 384).
    pub plate_type: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            min_volume: format!("{DEFAULT_MIN_VOLUME_UL} uL"),
            droplet_volume: format!("{DEFAULT_DROPLET_NL} nL"),
            buffer_name: DEFAULT_BUFFER_NAME.to_string(),
            plate_type: 96,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Load `settings.toml` from the user config directory, or the defaults
    /// when the file does not exist.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        let path = paths::settings_path();
        if path.is_file() {
            tracing::debug!("loading settings from {}", path.display());
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse settings from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Convert the settings to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save the settings to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }
        std::fs::write(path, self.to_toml()?).map_err(|e| ConfigError::write_file(path, e))
    }

    /// Parsed minimum volume.
    pub fn min_volume(&self) -> Result<Volume, ConfigError> {
        parse_volume("settings min_volume", &self.min_volume)
    }

    /// Parsed droplet volume.
    pub fn droplet_volume(&self) -> Result<Volume, ConfigError> {
        parse_volume("settings droplet_volume", &self.droplet_volume)
    }

    /// Plate geometry.
    pub fn plate_type(&self) -> Result<PlateType, ConfigError> {
        PlateType::from_well_count(self.plate_type)
            .ok_or(ConfigError::InvalidPlateType(self.plate_type))
    }
}

/// Parse a volume string, naming `context` in the error.
pub(crate) fn parse_volume(context: &str, value: &str) -> Result<Volume, ConfigError> {
    value
        .parse()
        .map_err(|e| ConfigError::invalid_quantity(context, value, e))
}
