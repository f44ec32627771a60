//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Config file: `$XDG_CONFIG_HOME/orgchart/orgchart.toml`, or an explicit path
//! 3. Environment variables: `ORGCHART_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::{expand_env_vars, LayoutConfig};

/// Raw layout config for intermediate parsing (fields are Option to detect "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawLayoutConfig {
    pub node_width: Option<f64>,
    pub node_height: Option<f64>,
    pub h_gap: Option<f64>,
    pub v_gap: Option<f64>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub data_file: Option<PathBuf>,
    pub owner: Option<String>,
    pub require_director: Option<bool>,
    pub layout: RawLayoutConfig,
}

/// Unified configuration for orgchart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// TOML file holding employees and reporting lines (default: ~/.orgchart/orgchart.toml)
    pub data_file: PathBuf,
    /// Owner all records are scoped to (default: $USER)
    pub owner: String,
    /// Refuse to remove the last director
    pub require_director: bool,
    /// Box sizes used when routing reporting lines
    pub layout: LayoutConfig,
}

impl Default for Settings {
    fn default() -> Self {
        let owner = std::env::var("USER").unwrap_or_else(|_| "default".into());

        Self {
            data_file: default_data_file(),
            owner,
            require_director: true,
            layout: LayoutConfig::default(),
        }
    }
}

/// Get the default data file (~/.orgchart/orgchart.toml).
fn default_data_file() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".orgchart"))
        .unwrap_or_else(|| PathBuf::from("~/.orgchart"))
        .join("orgchart.toml")
}

/// Get the XDG config directory for orgchart.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "orgchart").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("orgchart.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl LayoutConfig {
    fn merge(&self, overlay: &RawLayoutConfig) -> Self {
        Self {
            node_width: overlay.node_width.unwrap_or(self.node_width),
            node_height: overlay.node_height.unwrap_or(self.node_height),
            h_gap: overlay.h_gap.unwrap_or(self.h_gap),
            v_gap: overlay.v_gap.unwrap_or(self.v_gap),
        }
    }
}

impl Settings {
    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        let expanded = expand_env_vars(self.data_file.to_string_lossy().as_ref());
        self.data_file = PathBuf::from(expanded);
    }

    /// Merge overlay config onto self (base): scalars win if specified.
    pub fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            data_file: overlay
                .data_file
                .clone()
                .unwrap_or_else(|| self.data_file.clone()),
            owner: overlay.owner.clone().unwrap_or_else(|| self.owner.clone()),
            require_director: overlay.require_director.unwrap_or(self.require_director),
            layout: self.layout.merge(&overlay.layout),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `config_file` - Explicit config file; replaces the global lookup
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Config file (explicit, else `$XDG_CONFIG_HOME/orgchart/orgchart.toml` if present)
    /// 3. Environment variables: `ORGCHART_*` prefix, `__` for nesting
    pub fn load(config_file: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        match config_file {
            Some(path) => {
                let raw = load_raw_settings(path)?;
                current = current.merge_with(&raw);
            }
            None => {
                if let Some(global_path) = global_config_path() {
                    if global_path.exists() {
                        let raw = load_raw_settings(&global_path)?;
                        current = current.merge_with(&raw);
                    }
                }
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();

        Ok(current)
    }

    /// Apply ORGCHART_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        // Use config crate just for env var parsing
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("ORGCHART")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("data_file") {
            settings.data_file = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("owner") {
            settings.owner = val;
        }
        if let Ok(val) = config.get_bool("require_director") {
            settings.require_director = val;
        }
        if let Ok(val) = config.get_float("layout.node_width") {
            settings.layout.node_width = val;
        }
        if let Ok(val) = config.get_float("layout.node_height") {
            settings.layout.node_height = val;
        }
        if let Ok(val) = config.get_float("layout.h_gap") {
            settings.layout.h_gap = val;
        }
        if let Ok(val) = config.get_float("layout.v_gap") {
            settings.layout.v_gap = val;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# orgchart configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/orgchart/orgchart.toml
#   Env:    ORGCHART_* environment variables (ORGCHART_LAYOUT__H_GAP=30)

# File holding employees and reporting lines
# data_file = "~/.orgchart/orgchart.toml"

# Owner all records are scoped to
# owner = "acme"

# Refuse to remove the last director
# require_director = true

[layout]
# node_width = 160.0
# node_height = 60.0
# h_gap = 20.0
# v_gap = 40.0
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
