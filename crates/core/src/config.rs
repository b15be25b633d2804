//! User configuration, loaded once at startup from a TOML file.
//!
//! Keys use the PascalCase names users already know (`DisplayFormat`,
//! `OnlyShowOnChange`, ...). Unknown keys are ignored and missing keys keep
//! their defaults.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "Config.toml";

pub const DEFAULT_DISPLAY_FORMAT: &str = "( NP: {song_artist} - {song_title}{song_position} )";
pub const DEFAULT_PAUSED_FORMAT: &str = "( Playback Paused )";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Config {
    /// Template for the playing message, see [`crate::format::render`]
    pub display_format: String,
    /// Sent once when playback pauses
    pub paused_format: String,
    /// Only send when the track changes instead of every tick
    pub only_show_on_change: bool,
    /// Read the status from `TextFileLocation` instead of the media session
    pub use_text_file: bool,
    pub text_file_location: PathBuf,
    /// Resend unchanged text file content every tick
    pub text_file_update_always: bool,
    #[serde(rename = "VRChatLogDirectory", skip_serializing_if = "Option::is_none")]
    pub vrchat_log_directory: Option<PathBuf>,
    /// World id -> reason shown in the log when output is suppressed there
    pub world_blacklist: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            display_format: DEFAULT_DISPLAY_FORMAT.to_string(),
            paused_format: DEFAULT_PAUSED_FORMAT.to_string(),
            only_show_on_change: false,
            use_text_file: false,
            text_file_location: PathBuf::new(),
            text_file_update_always: false,
            vrchat_log_directory: None,
            world_blacklist: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn from_toml(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Deserialize {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Pick the config file: an explicit path wins, then `Config.toml` beside the
/// executable, then `<config dir>/vrcnp/Config.toml`.
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    if let Some(beside_exe) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(CONFIG_FILE_NAME)))
    {
        if beside_exe.exists() {
            return Ok(beside_exe);
        }
    }

    let config_dir = dirs::config_dir().ok_or(ConfigError::DirectoriesNotFound)?;
    Ok(config_dir.join("vrcnp").join(CONFIG_FILE_NAME))
}

/// Load the config at `path`. A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        tracing::info!("No config at {}, using defaults", path.display());
        return Ok(Config::default());
    }

    tracing::info!("Loading config from {}", path.display());
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Config::from_toml(&contents, path)
}

/// Write the default config to `path` unless a file is already there.
/// Returns `false` when an existing file was left alone.
pub fn write_default_config(path: &Path) -> Result<bool, ConfigError> {
    if path.exists() {
        return Ok(false);
    }

    let io_err = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let contents = toml::to_string_pretty(&Config::default())?;
    fs::write(path, contents).map_err(io_err)?;
    Ok(true)
}
