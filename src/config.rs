//src/config.rs
use comfy_table::Color;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;
use tracing::warn;

const CONFIG_FILE_NAME: &str = "config.toml";
const APP_CONFIG_DIR: &str = "workout-log";
const CONFIG_ENV_VAR: &str = "WORKOUT_LOG_CONFIG_DIR"; // Environment variable name

/// Owner recorded on history rows when no account is configured.
pub const LOCAL_USER_ID: &str = "local";

#[derive(Error, Debug)]
pub enum Error {
    #[error("Could not determine configuration directory.")]
    CannotDetermineConfigDir,
    #[error("I/O error accessing config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file (TOML): {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Failed to serialize config data (TOML): {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Invalid color name: {0}")]
    InvalidColor(String),
    #[error("User ID cannot be empty.")]
    EmptyUserId,
}

/// Which store keeps the workout history.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StorageKind {
    /// SQLite table scoped to the configured user
    #[default]
    Sqlite,
    /// JSON file in the data directory
    Json,
    /// Nothing is kept after the process exits
    Memory,
}

// Define standard colors using strum for easy iteration/parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum StandardColor {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    DarkGrey,
    DarkRed,
    DarkGreen,
    DarkYellow,
    DarkBlue,
    DarkMagenta,
    DarkCyan,
    Grey,
}

// Helper to convert our enum to comfy_table::Color
impl From<StandardColor> for Color {
    fn from(value: StandardColor) -> Self {
        match value {
            StandardColor::Black => Self::Black,
            StandardColor::Red => Self::Red,
            StandardColor::Green => Self::Green,
            StandardColor::Yellow => Self::Yellow,
            StandardColor::Blue => Self::Blue,
            StandardColor::Magenta => Self::Magenta,
            StandardColor::Cyan => Self::Cyan,
            StandardColor::White => Self::White,
            StandardColor::DarkGrey => Self::DarkGrey,
            StandardColor::DarkRed => Self::DarkRed,
            StandardColor::DarkGreen => Self::DarkGreen,
            StandardColor::DarkYellow => Self::DarkYellow,
            StandardColor::DarkBlue => Self::DarkBlue,
            StandardColor::DarkMagenta => Self::DarkMagenta,
            StandardColor::DarkCyan => Self::DarkCyan,
            StandardColor::Grey => Self::Grey,
        }
    }
}

// Helper to parse a string into our StandardColor enum
pub fn parse_color(color_str: &str) -> Result<StandardColor, Error> {
    StandardColor::iter()
        .find(|color| format!("{color:?}").eq_ignore_ascii_case(color_str.trim()))
        .ok_or_else(|| Error::InvalidColor(color_str.to_string()))
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)] // Ensure defaults are used if fields are missing
pub struct Theme {
    pub header_color: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            header_color: "Green".to_string(),
        }
    }
}

impl Theme {
    /// Header color for tables. Falls back to green on an unknown name.
    pub fn header(&self) -> Color {
        parse_color(&self.header_color).map_or_else(
            |e| {
                warn!("{e}, using Green for table headers");
                Color::Green
            },
            Color::from,
        )
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)] // Ensure defaults are used if fields are missing
pub struct Config {
    /// Account that owns history records. `None` means this machine only.
    pub user_id: Option<String>,
    pub storage: StorageKind,
    /// Create the starter Chest Day / Back Day routine when there are no days
    pub seed_default_routine: bool,

    // Theming
    pub theme: Theme,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_id: None,
            storage: StorageKind::default(),
            seed_default_routine: true,
            theme: Theme::default(),
        }
    }
}

impl Config {
    /// The user history rows are written for.
    pub fn effective_user_id(&self) -> &str {
        self.user_id.as_deref().unwrap_or(LOCAL_USER_ID)
    }
}

/// Determines the path to the configuration file.
/// Exposed at crate root as get_config_path_util
pub fn get_config_path() -> Result<PathBuf, Error> {
    let config_dir_override = std::env::var(CONFIG_ENV_VAR).ok();

    let config_dir_path = if let Some(path_str) = config_dir_override {
        let path = PathBuf::from(path_str);
        if !path.is_dir() {
            warn!(
                "Environment variable {} points to '{}', which is not a directory. Trying to create it.",
                CONFIG_ENV_VAR,
                path.display()
            );
            fs::create_dir_all(&path)?;
        }
        path
    } else {
        let base_config_dir = dirs::config_dir().ok_or(Error::CannotDetermineConfigDir)?;
        base_config_dir.join(APP_CONFIG_DIR)
    };

    if !config_dir_path.exists() {
        fs::create_dir_all(&config_dir_path)?;
    }

    Ok(config_dir_path.join(CONFIG_FILE_NAME))
}

/// Loads the configuration from the TOML file at the given path.
/// A missing file is created with defaults.
/// Exposed at crate root as load_config_util
pub fn load(config_path: &Path) -> Result<Config, Error> {
    if config_path.exists() {
        let config_content = fs::read_to_string(config_path)?;
        // serde(default) fills in missing fields
        let config: Config = toml::from_str(&config_content)?;
        Ok(config)
    } else {
        let default_config = Config::default();
        save(config_path, &default_config)?;
        Ok(default_config)
    }
}

/// Saves the configuration to the TOML file.
/// Exposed at crate root as save_config_util
pub fn save(config_path: &Path, config: &Config) -> Result<(), Error> {
    if let Some(parent_dir) = config_path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            fs::create_dir_all(parent_dir)?;
        }
    }
    let config_content = toml::to_string_pretty(config)?;
    fs::write(config_path, config_content)?;
    Ok(())
}
