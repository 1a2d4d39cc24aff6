//! Per-project configuration read from `.scion/config.toml`

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Config file name inside the data directory.
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScionConfig {
    pub index: IndexConfig,
    pub knowledge: KnowledgeConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Directory names skipped in addition to the built-in denylist.
    #[serde(default)]
    pub extra_excludes: Vec<String>,

    /// Files above this size are skipped and reported as parse failures.
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// How many run records the knowledge document keeps.
    #[serde(default = "default_run_history")]
    pub run_history: usize,
}

/// Ranking constants shared by code and knowledge search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_substring_bonus")]
    pub substring_bonus: f32,
    /// Added when a learning was updated less than a week ago.
    #[serde(default = "default_recent_bonus")]
    pub recent_bonus: f32,
    /// Added when a learning was updated less than thirty days ago.
    #[serde(default = "default_month_bonus")]
    pub month_bonus: f32,
    #[serde(default = "default_stale_penalty")]
    pub stale_penalty: f32,
    /// Results scoring below this are dropped.
    #[serde(default = "default_epsilon")]
    pub epsilon: f32,
}

fn default_max_file_bytes() -> u64 {
    1024 * 1024
}

fn default_run_history() -> usize {
    50
}

fn default_substring_bonus() -> f32 {
    0.5
}

fn default_recent_bonus() -> f32 {
    0.1
}

fn default_month_bonus() -> f32 {
    0.05
}

fn default_stale_penalty() -> f32 {
    0.2
}

fn default_epsilon() -> f32 {
    0.01
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            extra_excludes: Vec::new(),
            max_file_bytes: default_max_file_bytes(),
        }
    }
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            run_history: default_run_history(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            substring_bonus: default_substring_bonus(),
            recent_bonus: default_recent_bonus(),
            month_bonus: default_month_bonus(),
            stale_penalty: default_stale_penalty(),
            epsilon: default_epsilon(),
        }
    }
}

impl ScionConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: ScionConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a data directory; a missing file yields the defaults.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE);
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                tracing::debug!("Loading config from {}", path.display());
                Self::from_toml(&text)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.knowledge.run_history == 0 {
            return Err(Error::InvalidConfig(
                "knowledge.run_history must be at least 1".into(),
            ));
        }
        if self.search.epsilon < 0.0 {
            return Err(Error::InvalidConfig("search.epsilon must not be negative".into()));
        }
        Ok(())
    }
}
