//! Error types for configuration operations.

use std::path::PathBuf;

use aliquot_core::{MixError, QuantityParseError, WellError};
use thiserror::Error;

use crate::validation::ConfigIssue;

/// Errors that can occur while loading, saving or building protocols.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file
    #[error("failed to write file '{path}': {source}")]
    WriteFile {
        /// Path of the file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to create directory
    #[error("failed to create directory '{path}': {source}")]
    CreateDir {
        /// Path of the directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Unknown action type
    #[error("unknown action type: {0}")]
    UnknownAction(String),

    /// A mix refers to a component or mix that is not defined before it
    #[error("mix '{mix}' refers to unknown component '{name}'")]
    UnknownComponent {
        /// Mix being built.
        mix: String,
        /// Name that could not be resolved.
        name: String,
    },

    /// Mix not found in the protocol
    #[error("mix not found: {0}")]
    MixNotFound(String),

    /// A quantity string could not be parsed
    #[error("invalid quantity '{value}' for {context}: {source}")]
    InvalidQuantity {
        /// Where the value appeared, e.g. `component 'a' concentration`.
        context: String,
        /// The raw value.
        value: String,
        /// Parser error.
        #[source]
        source: QuantityParseError,
    },

    /// A well string could not be parsed
    #[error("invalid well '{value}' for {context}: {source}")]
    InvalidWell {
        /// Where the value appeared.
        context: String,
        /// The raw value.
        value: String,
        /// Parser error.
        #[source]
        source: WellError,
    },

    /// Invalid or missing action parameter
    #[error("invalid parameter '{param}' for action '{action}': {reason}")]
    InvalidParameter {
        /// Action type id.
        action: String,
        /// Parameter name.
        param: String,
        /// Description of why the parameter is invalid.
        reason: String,
    },

    /// Plate size other than 96 or 384
    #[error("unsupported plate size {0}; expected 96 or 384")]
    InvalidPlateType(u32),

    /// The core rejected a mix or action
    #[error(transparent)]
    Mix(#[from] MixError),

    /// Structural problems found by protocol validation
    #[error("protocol has {} problem(s): {}", .0.len(), .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    Invalid(Vec<ConfigIssue>),
}

impl ConfigError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Create a write file error.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::WriteFile {
            path: path.into(),
            source,
        }
    }

    /// Create a create directory error.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::CreateDir {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid quantity error.
    pub fn invalid_quantity(
        context: impl Into<String>,
        value: impl Into<String>,
        source: QuantityParseError,
    ) -> Self {
        ConfigError::InvalidQuantity {
            context: context.into(),
            value: value.into(),
            source,
        }
    }

    /// Create an invalid parameter error.
    pub fn invalid_parameter(
        action: impl Into<String>,
        param: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ConfigError::InvalidParameter {
            action: action.into(),
            param: param.into(),
            reason: reason.into(),
        }
    }
}
