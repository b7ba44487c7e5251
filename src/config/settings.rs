//! TOML-based configuration for metasync.
//!
//! Supports a config file (metasync.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [catalogs.source]
//! bridge = "hive-bridge"
//! args = ["--uri", "thrift://${HIVE_HOST}:9083"]
//! db_location_root = "s3://warehouse"
//!
//! [catalogs.target]
//! bridge = "glue-bridge"
//! timeout_secs = 60
//! normalize_db_names = true
//!
//! [sync]
//! dbfs_location = "s3://bucket/"
//! to_branch = "main"
//! continue_on_error = false
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::bridge::DEFAULT_TIMEOUT_SECS;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "METASYNC_CONFIG";

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Catalog not found: {0}")]
    CatalogNotFound(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Named catalogs, each fronted by a bridge process.
    pub catalogs: HashMap<String, CatalogSettings>,

    /// Defaults for sync runs.
    pub sync: SyncSettings,
}

/// Catalog configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogSettings {
    /// Bridge executable (supports ${ENV_VAR} expansion).
    pub bridge: String,

    /// Arguments passed to the bridge (supports ${ENV_VAR} expansion).
    #[serde(default)]
    pub args: Vec<String>,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Root under which new databases are placed.
    #[serde(default)]
    pub db_location_root: String,

    /// Lowercase database names and replace `-` with `_`.
    #[serde(default)]
    pub normalize_db_names: bool,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl CatalogSettings {
    /// Bridge arguments with environment variables expanded.
    pub fn resolved_args(&self) -> Result<Vec<String>, SettingsError> {
        self.args.iter().map(|a| expand_env_vars(a)).collect()
    }

    /// Bridge path with environment variables expanded.
    pub fn resolved_bridge(&self) -> Result<String, SettingsError> {
        expand_env_vars(&self.bridge)
    }
}

/// Sync run defaults. CLI flags take precedence.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Replacement root for `dbfs:/` locations.
    pub dbfs_location: String,

    /// Branch substituted into structured locations.
    pub to_branch: String,

    /// Repository used by `import-all`.
    pub repository: String,

    /// Log and skip failing tables in batch runs.
    pub continue_on_error: bool,

    /// Rename Spark placeholder locations instead of transforming them.
    pub fix_spark_placeholder: bool,
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `METASYNC_CONFIG`
    /// 2. `./metasync.toml`
    /// 3. `~/.config/metasync/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var(CONFIG_ENV_VAR) {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("metasync.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("metasync").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Get a catalog by name.
    pub fn get_catalog(&self, name: &str) -> Result<&CatalogSettings, SettingsError> {
        self.catalogs
            .get(name)
            .ok_or_else(|| SettingsError::CatalogNotFound(name.to_string()))
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let var_name = if chars.peek() == Some(&'{') {
            chars.next(); // consume '{'
            chars.by_ref().take_while(|&ch| ch != '}').collect::<String>()
        } else {
            // $VAR ends at the first non-alphanumeric/underscore
            let mut name = String::new();
            while let Some(&ch) = chars.peek() {
                if !(ch.is_alphanumeric() || ch == '_') {
                    break;
                }
                name.push(ch);
                chars.next();
            }
            if name.is_empty() {
                // Just a lone $, keep it
                result.push('$');
                continue;
            }
            name
        };

        let value = env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name))?;
        result.push_str(&value);
    }

    Ok(result)
}
