//! Platform-specific paths for protocols and settings.
//!
//! # Directory Structure
//!
//! - **User config**: `~/.config/aliquot/` (Linux), `~/Library/Application Support/aliquot/` (macOS), `%APPDATA%\aliquot\` (Windows)
//! - **Settings**: `<user config>/settings.toml`
//! - **User protocols**: `<user config>/protocols/`
//!
//! # Example
//!
//! ```rust,no_run
//! use aliquot_config::paths;
//!
//! if let Some(path) = paths::find_protocol("staples") {
//!     println!("Found protocol at: {:?}", path);
//! }
//! ```

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

const APP_NAME: &str = "aliquot";

const PROTOCOLS_SUBDIR: &str = "protocols";

const SETTINGS_FILE: &str = "settings.toml";

/// Returns the user-specific configuration directory.
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Path of the settings file, whether or not it exists.
pub fn settings_path() -> PathBuf {
    user_config_dir().join(SETTINGS_FILE)
}

/// Returns the user protocols directory.
pub fn user_protocols_dir() -> PathBuf {
    user_config_dir().join(PROTOCOLS_SUBDIR)
}

/// Find a protocol file by path or by name.
///
/// A name that is an existing file is returned as is. Otherwise the name,
/// with `.toml` appended if missing, is looked up in the user protocols
/// directory.
pub fn find_protocol(name: &str) -> Option<PathBuf> {
    let path = PathBuf::from(name);
    if path.is_file() {
        return Some(path);
    }

    let filename = if name.ends_with(".toml") {
        name.to_string()
    } else {
        format!("{name}.toml")
    };
    let user_path = user_protocols_dir().join(filename);
    user_path.is_file().then_some(user_path)
}

/// Ensure the user config directory exists.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_user_config_dir() -> Result<PathBuf, ConfigError> {
    ensure_dir(user_config_dir())
}

/// Ensure the user protocols directory exists.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_user_protocols_dir() -> Result<PathBuf, ConfigError> {
    ensure_dir(user_protocols_dir())
}

fn ensure_dir(dir: PathBuf) -> Result<PathBuf, ConfigError> {
    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| ConfigError::create_dir(&dir, e))?;
    }
    Ok(dir)
}

/// List protocol files in the user protocols directory.
///
/// Returns an empty vector if the directory doesn't exist or can't be read.
pub fn list_protocols() -> Vec<PathBuf> {
    list_toml_in_dir(&user_protocols_dir())
}

fn list_toml_in_dir(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    files.sort();
    files
}

/// Get the protocol name from a file path (the file stem).
///
/// ```rust
/// use aliquot_config::paths::protocol_name_from_path;
/// use std::path::Path;
///
/// let name = protocol_name_from_path(Path::new("/path/to/staples.toml"));
/// assert_eq!(name, Some("staples".to_string()));
/// ```
pub fn protocol_name_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(ToString::to_string)
}
