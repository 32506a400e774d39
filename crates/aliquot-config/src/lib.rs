//! Protocol files and planner settings for aliquot.
//!
//! A protocol is a TOML file listing stock components, an optional reference
//! table, and the mixes to plan. [`Protocol::build`] turns it into
//! [`aliquot_core::Mix`] values, resolving component names against the stock
//! list and against mixes defined earlier in the file.
//!
//! # Features
//!
//! - **Protocols**: load, save and build TOML protocol files
//! - **Actions**: typed action configuration keyed by [`aliquot_core::ActionKind`] id
//! - **Validation**: structural checks collected into a list before building
//! - **Settings**: planner-wide defaults from `settings.toml`
//! - **Paths**: platform-specific config and protocol directories
//!
//! # Example
//!
//! ```rust
//! use aliquot_config::{Protocol, Settings};
//!
//! let protocol = Protocol::from_toml(r#"
//! [[components]]
//! name = "dye"
//! concentration = "10 uM"
//!
//! [[mixes]]
//! name = "stain"
//! fixed_total_volume = "50 uL"
//!
//! [[mixes.actions]]
//! type = "fixed_concentration"
//! components = ["dye"]
//! fixed_concentration = "1 uM"
//! "#).unwrap();
//!
//! let mixes = protocol.build(&Settings::default()).unwrap();
//! assert_eq!(mixes[0].name(), "stain");
//! ```

mod action_config;
mod error;
mod protocol;
mod settings;

/// Platform-specific paths for protocols and settings.
pub mod paths;

/// Structural protocol validation.
pub mod validation;

pub use action_config::ActionConfig;
pub use error::ConfigError;
pub use paths::{
    ensure_user_config_dir, ensure_user_protocols_dir, find_protocol, list_protocols,
    protocol_name_from_path, settings_path, user_config_dir, user_protocols_dir,
};
pub use protocol::{ComponentConfig, MixConfig, Protocol, ReferenceConfig};
pub use settings::Settings;
pub use validation::{ConfigIssue, validate_protocol};
