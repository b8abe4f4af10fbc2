//! Configuration for the `graphflow` binary
//!
//! Settings are layered, later layers winning:
//!
//! 1. Built-in defaults
//! 2. The config file (`graphflow.toml` in the working directory, or the
//!    path given with `--config`)
//! 3. Environment variables (`GRAPHFLOW_*`)
//!
//! ```toml
//! log_level = "debug"
//!
//! [recipes]
//! tf_idf_top = 5
//! pmi_top = 10
//! pmi_min_word_length = 5
//! ```

use crate::error::{GraphError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Valid log levels for configuration validation.
pub const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Config file looked up in the working directory when no path is given
pub const CONFIG_FILE_NAME: &str = "graphflow.toml";

pub const ENV_LOG_LEVEL: &str = "GRAPHFLOW_LOG_LEVEL";
pub const ENV_TF_IDF_TOP: &str = "GRAPHFLOW_TF_IDF_TOP";
pub const ENV_PMI_TOP: &str = "GRAPHFLOW_PMI_TOP";
pub const ENV_PMI_MIN_WORD_LENGTH: &str = "GRAPHFLOW_PMI_MIN_WORD_LENGTH";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphflowConfig {
    /// Logging level used when no `-v` flag is given
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub recipes: RecipeSettings,
}

/// Tuning for the bundled recipes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeSettings {
    /// Documents kept per word in the TF-IDF index
    #[serde(default = "default_tf_idf_top")]
    pub tf_idf_top: usize,

    /// Words kept per document by PMI
    #[serde(default = "default_pmi_top")]
    pub pmi_top: usize,

    /// Shortest word PMI considers
    #[serde(default = "default_pmi_min_word_length")]
    pub pmi_min_word_length: usize,
}

impl Default for GraphflowConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            recipes: RecipeSettings::default(),
        }
    }
}

impl Default for RecipeSettings {
    fn default() -> Self {
        Self {
            tf_idf_top: default_tf_idf_top(),
            pmi_top: default_pmi_top(),
            pmi_min_word_length: default_pmi_min_word_length(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_tf_idf_top() -> usize {
    3
}

fn default_pmi_top() -> usize {
    10
}

fn default_pmi_min_word_length() -> usize {
    5
}

impl GraphflowConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| GraphError::Config(format!("invalid TOML: {e}")))
    }

    pub fn validate(&self) -> Result<()> {
        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(GraphError::Config(format!(
                "invalid log_level '{}', expected one of: {}",
                self.log_level,
                VALID_LOG_LEVELS.join(", ")
            )));
        }
        if self.recipes.tf_idf_top == 0 {
            return Err(GraphError::Config("recipes.tf_idf_top must be at least 1".into()));
        }
        if self.recipes.pmi_top == 0 {
            return Err(GraphError::Config("recipes.pmi_top must be at least 1".into()));
        }
        Ok(())
    }

    fn merge_env_vars<F>(&mut self, env: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = env(ENV_LOG_LEVEL) {
            self.log_level = level.trim().to_lowercase();
        }
        if let Some(value) = env(ENV_TF_IDF_TOP) {
            self.recipes.tf_idf_top = parse_env(ENV_TF_IDF_TOP, &value)?;
        }
        if let Some(value) = env(ENV_PMI_TOP) {
            self.recipes.pmi_top = parse_env(ENV_PMI_TOP, &value)?;
        }
        if let Some(value) = env(ENV_PMI_MIN_WORD_LENGTH) {
            self.recipes.pmi_min_word_length = parse_env(ENV_PMI_MIN_WORD_LENGTH, &value)?;
        }
        Ok(())
    }
}

fn parse_env(name: &str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| GraphError::Config(format!("{name} must be a non-negative integer, got '{value}'")))
}

/// Load configuration from the file layer and the process environment
pub fn load_config(path: Option<&Path>) -> Result<GraphflowConfig> {
    load_config_with(path, |name| std::env::var(name).ok())
}

/// Load configuration with an injectable environment lookup
///
/// An explicit `path` must exist. Without one, `graphflow.toml` in the
/// working directory is used when present.
pub fn load_config_with<F>(path: Option<&Path>, env: F) -> Result<GraphflowConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let file = match path {
        Some(path) => Some(path.to_path_buf()),
        None => Some(PathBuf::from(CONFIG_FILE_NAME)).filter(|p| p.is_file()),
    };

    let mut config = match file {
        Some(file) => {
            let content = fs::read_to_string(&file).map_err(|e| GraphError::io(&file, e))?;
            debug!("Loaded configuration from {}", file.display());
            GraphflowConfig::from_toml_str(&content)?
        }
        None => GraphflowConfig::default(),
    };

    config.merge_env_vars(env)?;
    config.validate()?;
    Ok(config)
}
