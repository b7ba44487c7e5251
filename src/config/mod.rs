//! Configuration module for metasync.
//!
//! Handles catalog bridge configuration, environment variables, and sync defaults.

mod settings;

pub use settings::{
    expand_env_vars, CatalogSettings, Settings, SettingsError, SyncSettings, CONFIG_ENV_VAR,
};
