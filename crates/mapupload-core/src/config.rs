//! Configuration module

use crate::manifest::MatchMode;
use crate::{Error, Result};
use dirs::config_dir;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Default size ceiling for downloaded archives (100 MB)
pub const DEFAULT_MAX_BYTES: u64 = 100_000_000;

/// Default pattern for files that are never compressed or uploaded
pub const DEFAULT_IGNORE_REGEX: &str = r"\.nav";

/// Default bzip2 compression level
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 4;

/// Default pattern selecting the part of a manifest line used for sorting
pub const DEFAULT_SORT_REGEX: &str = r"(\w+)";

/// Main configuration structure
///
/// Built once from the config file and passed by value into every pipeline
/// run. Nothing mutates it afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fast-dl endpoint
    pub remote: RemoteConfig,
    /// Download limits
    pub upload: UploadConfig,
    /// Fast-dl compression settings
    pub compression: CompressionConfig,
    /// Local game server layout
    pub server: ServerConfig,
}

/// Transport used to reach the fast-dl directory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteProtocol {
    /// SSH file transfer
    #[default]
    Sftp,
    /// Directory on this host
    Local,
}

/// Remote (fast-dl) configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub protocol: RemoteProtocol,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Remote maps directory
    pub maps_dir: String,
    /// Socket timeout for the SSH connection
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            protocol: RemoteProtocol::Sftp,
            host: String::new(),
            port: 22,
            username: String::new(),
            password: String::new(),
            maps_dir: String::new(),
            timeout_secs: 30,
        }
    }
}

impl fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("protocol", &self.protocol)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("maps_dir", &self.maps_dir)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Download configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Largest archive accepted, in bytes
    #[serde(deserialize_with = "deserialize_size")]
    pub max_bytes: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }
}

/// Fast-dl compression configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// Map files matching this pattern are not uploaded (empty = none)
    pub ignore_regex: String,
    /// bzip2 level (1-9)
    pub level: u32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            ignore_regex: DEFAULT_IGNORE_REGEX.to_string(),
            level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

/// Local game server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Local maps directory
    pub maps_dir: PathBuf,
    /// Mapcycle file
    pub manifest_file: PathBuf,
    /// What part of a manifest line is used for sorting
    pub manifest_sort_regex: String,
    /// How a map name is matched against manifest lines
    pub manifest_match: MatchMode,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            maps_dir: PathBuf::new(),
            manifest_file: PathBuf::new(),
            manifest_sort_regex: DEFAULT_SORT_REGEX.to_string(),
            manifest_match: MatchMode::default(),
        }
    }
}

/// Size value given either as a byte count or as a string with a unit
#[derive(Deserialize)]
#[serde(untagged)]
enum SizeValue {
    Numeric(u64),
    String(String),
}

fn deserialize_size<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    match SizeValue::deserialize(deserializer)? {
        SizeValue::Numeric(n) => Ok(n),
        SizeValue::String(s) => {
            parse_size(&s).map_err(|e| D::Error::custom(format!("Failed to parse size: {}", e)))
        }
    }
}

/// Parse size string (e.g., "100MB", "95MiB") to bytes
pub fn parse_size(size_str: &str) -> Result<u64> {
    let size_str = size_str.trim();

    let (number_part, unit_part) = size_str
        .find(|c: char| c.is_alphabetic())
        .map(|pos| size_str.split_at(pos))
        .unwrap_or((size_str, ""));

    let number: f64 = number_part
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("Invalid number in size: {}", number_part)))?;

    let multiplier = match unit_part.trim().to_lowercase().as_str() {
        "" | "b" => 1u64,
        "k" | "kb" => 1_000,
        "m" | "mb" => 1_000_000,
        "g" | "gb" => 1_000_000_000,
        "ki" | "kib" => 1_024,
        "mi" | "mib" => 1_048_576,
        "gi" | "gib" => 1_073_741_824,
        _ => {
            return Err(Error::Config(format!(
                "Unknown size unit: {}",
                unit_part
            )))
        }
    };

    Ok((number * multiplier as f64) as u64)
}

impl Config {
    /// Get the default configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = config_dir().ok_or_else(|| {
            Error::Config("Unable to determine config directory".to_string())
        })?;

        Ok(config_dir.join("mapupload").join("config.toml"))
    }

    /// Get default configuration content with comments
    pub fn default_config_content() -> String {
        r#"# mapupload configuration file

[remote]
# Transport used to reach the fast-dl directory: "sftp" or "local"
protocol = "sftp"
host = ""
port = 22
username = ""
password = ""
# Remote maps directory (for "local", a directory on this host)
maps_dir = ""
# SSH socket timeout in seconds
timeout_secs = 30

[upload]
# Largest archive accepted: a byte count or a size such as "100MB"
max_bytes = 100000000

[compression]
# Map files matching this pattern are not uploaded to fast-dl
ignore_regex = '\.nav'
# bzip2 compression level (1-9)
level = 4

[server]
# Local maps directory
maps_dir = ""
# Mapcycle file
manifest_file = ""
# What part of a mapcycle line is used for sorting
manifest_sort_regex = '(\w+)'
# "pattern": map name is matched as a regex anchored at the line start
# "exact": first word of the line must equal the map name
manifest_match = "pattern"
"#
        .to_string()
    }

    /// Load configuration from the given file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::Config(format!(
                "Config file {} does not exist",
                path.display()
            )));
        }

        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Write the commented default configuration if no file exists yet
    pub fn init(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, Self::default_config_content())?;
        Ok(true)
    }

    /// Check the patterns and numeric ranges
    pub fn validate(&self) -> Result<()> {
        self.ignore_pattern()?;
        self.sort_pattern()?;

        if !(1..=9).contains(&self.compression.level) {
            return Err(Error::Config(format!(
                "Compression level must be between 1 and 9, got {}",
                self.compression.level
            )));
        }

        Ok(())
    }

    /// Compiled ignore pattern, `None` when no files are excluded
    pub fn ignore_pattern(&self) -> Result<Option<Regex>> {
        if self.compression.ignore_regex.is_empty() {
            return Ok(None);
        }
        Ok(Some(Regex::new(&self.compression.ignore_regex)?))
    }

    /// Compiled manifest sort pattern
    pub fn sort_pattern(&self) -> Result<Regex> {
        let pattern = if self.server.manifest_sort_regex.is_empty() {
            DEFAULT_SORT_REGEX
        } else {
            self.server.manifest_sort_regex.as_str()
        };
        Ok(Regex::new(pattern)?)
    }

    /// Serialize with the remote password hidden
    pub fn to_redacted_toml(&self) -> Result<String> {
        let mut shown = self.clone();
        if !shown.remote.password.is_empty() {
            shown.remote.password = "<redacted>".to_string();
        }
        toml::to_string_pretty(&shown)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))
    }
}
