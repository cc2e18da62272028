use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project directory holding the store and config.
pub const PROJECT_DIR: &str = ".rapport";
/// Config file name inside [`PROJECT_DIR`].
pub const CONFIG_FILE: &str = "config.toml";
/// Store file name inside [`PROJECT_DIR`].
pub const STORE_FILE: &str = "rapport.db";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

/// Which visited-set implementation neighborhood extraction uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipKind {
    /// Memory-bounded bloom filter; may prune a node on a false positive.
    #[default]
    Bloom,
    /// Exact hash set.
    Exact,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub membership: MembershipKind,
    #[serde(default = "default_filter_capacity")]
    pub filter_capacity: usize,
    #[serde(default = "default_false_positive_rate")]
    pub false_positive_rate: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            membership: MembershipKind::default(),
            filter_capacity: default_filter_capacity(),
            false_positive_rate: default_false_positive_rate(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Program and arguments of the external scoring engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
}

impl ProjectConfig {
    /// Reject values the scoring pipeline cannot work with.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.scoring.filter_capacity == 0 {
            bail!("scoring.filter_capacity must be at least 1");
        }
        let rate = self.scoring.false_positive_rate;
        if !(rate > 0.0 && rate < 1.0) {
            bail!("scoring.false_positive_rate must be within (0, 1), got {rate}");
        }
        if let Some(command) = &self.engine.command
            && command.first().is_none_or(|program| program.trim().is_empty())
        {
            bail!("engine.command must name a program");
        }
        Ok(())
    }
}

/// Path of the project directory under `project_root`.
#[must_use]
pub fn project_dir(project_root: &Path) -> PathBuf {
    project_root.join(PROJECT_DIR)
}

/// Path of the SQLite store under `project_root`.
#[must_use]
pub fn store_path(project_root: &Path) -> PathBuf {
    project_dir(project_root).join(STORE_FILE)
}

/// Load `.rapport/config.toml`, falling back to defaults when absent.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read, parsed, or
/// validated.
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_dir(project_root).join(CONFIG_FILE);
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let config = toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid settings in {}", path.display()))?;
    Ok(config)
}

/// Render the default config file written by `rp init`.
///
/// # Errors
///
/// Returns an error if TOML serialization fails.
pub fn default_config_toml() -> Result<String> {
    toml::to_string_pretty(&ProjectConfig::default()).context("serialize default config")
}

const fn default_filter_capacity() -> usize {
    1000
}

const fn default_false_positive_rate() -> f64 {
    0.01
}
