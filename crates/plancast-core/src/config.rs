use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::model::{DurationUnit, SimulationParameters};
use crate::store::PLANCAST_DIR;

pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub prediction: PredictionConfig,
    /// Default sampler parameters; plan files may override them per request.
    #[serde(default)]
    pub params: SimulationParameters,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    /// Maximum number of raw completion dates kept on a run.
    #[serde(default = "default_sample_cap")]
    pub sample_cap: usize,
    /// How the summed per-item hours become a calendar offset.
    #[serde(default)]
    pub duration_unit: DurationUnit,
    /// Fixed seed for reproducible runs; a fresh seed is drawn when unset.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_true")]
    pub parallel: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            sample_cap: default_sample_cap(),
            duration_unit: DurationUnit::default(),
            seed: None,
            parallel: default_true(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionConfig {
    /// Samples drawn by the simulation fallback when history is missing.
    #[serde(default = "default_fallback_samples")]
    pub fallback_samples: usize,
    /// Most recent matching completion records considered per estimate.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            fallback_samples: default_fallback_samples(),
            history_limit: default_history_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
}

/// Load `.plancast/config.toml`, falling back to defaults when absent.
///
/// # Errors
///
/// Returns an error when the file exists but cannot be read or parsed, or
/// when its `[params]` section is out of range.
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(PLANCAST_DIR).join(CONFIG_FILE);
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let config = toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    config
        .params
        .validate()
        .with_context(|| format!("Invalid [params] in {}", path.display()))?;
    Ok(config)
}

/// Load `~/.config/plancast/config.toml` when present.
///
/// # Errors
///
/// Returns an error when the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("plancast").join(CONFIG_FILE);
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Render the default project config as TOML for `plancast init`.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn default_config_toml() -> Result<String> {
    toml::to_string_pretty(&ProjectConfig::default()).context("Failed to render default config")
}

const fn default_true() -> bool {
    true
}

const fn default_iterations() -> usize {
    10_000
}

const fn default_sample_cap() -> usize {
    100
}

const fn default_fallback_samples() -> usize {
    1_000
}

const fn default_history_limit() -> usize {
    50
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_project_config_uses_defaults() {
        let root = tempfile::tempdir().unwrap();
        let cfg = load_project_config(root.path()).unwrap();
        assert_eq!(cfg.simulation.iterations, 10_000);
        assert_eq!(cfg.simulation.sample_cap, 100);
        assert_eq!(cfg.simulation.duration_unit, DurationUnit::Days);
        assert!(cfg.simulation.parallel);
        assert_eq!(cfg.prediction.fallback_samples, 1_000);
        assert_eq!(cfg.prediction.history_limit, 50);
        assert_eq!(cfg.params, SimulationParameters::default());
    }

    #[test]
    fn partial_sections_fill_defaults() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join(PLANCAST_DIR);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join(CONFIG_FILE),
            "[simulation]\nduration_unit = \"hours\"\nseed = 7\n\n[params]\nrisk_factor = 0.1\n",
        )
        .unwrap();

        let cfg = load_project_config(root.path()).unwrap();
        assert_eq!(cfg.simulation.duration_unit, DurationUnit::Hours);
        assert_eq!(cfg.simulation.seed, Some(7));
        assert_eq!(cfg.simulation.iterations, 10_000);
        assert!((cfg.params.risk_factor - 0.1).abs() < f64::EPSILON);
        assert_eq!(cfg.params.experience_level, 5);
    }

    #[test]
    fn out_of_range_params_fail_to_load() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join(PLANCAST_DIR);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(CONFIG_FILE), "[params]\nresource_availability = 0.0\n").unwrap();

        let err = load_project_config(root.path()).unwrap_err();
        assert!(format!("{err:#}").contains("resource_availability"));
    }

    #[test]
    fn default_config_round_trips() {
        let rendered = default_config_toml().unwrap();
        let parsed: ProjectConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, ProjectConfig::default());
    }
}
