//! Configuration module
//!
//! Handles loading, saving and layering the harness configuration.
//! Precedence: CLI flag > environment > config file > defaults.

pub mod env;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::utils::LogLevel;
pub use env::{EnvBuilder, EnvConfig, EnvGuard};

/// Relative config file locations, in order of precedence
const CONFIG_LOCATIONS: &[&str] = &["./unitrun.yaml", "./unitrun.yml", "./.unitrun.yaml"];

/// Application configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub runner: RunnerConfig,
    pub benchmark: BenchmarkConfig,
    pub log_level: LogLevel,
}

/// Which cases the concurrent dispatcher may hand to the worker pool
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConcurrencyPolicy {
    /// Every enabled case is pooled
    #[default]
    #[serde(alias = "all_units")]
    AllUnits,
    /// Only cases marked concurrent are pooled; the rest run first, inline
    #[serde(alias = "eligible_only")]
    EligibleOnly,
}

impl ConcurrencyPolicy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "all-units" | "all" => Some(ConcurrencyPolicy::AllUnits),
            "eligible-only" | "eligible" => Some(ConcurrencyPolicy::EligibleOnly),
            _ => None,
        }
    }
}

impl fmt::Display for ConcurrencyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConcurrencyPolicy::AllUnits => write!(f, "all-units"),
            ConcurrencyPolicy::EligibleOnly => write!(f, "eligible-only"),
        }
    }
}

/// Engine settings
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Worker pool size; hardware parallelism when unset
    pub workers: Option<usize>,
    pub policy: ConcurrencyPolicy,
}

/// Speedup experiment settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkConfig {
    pub test_counts: Vec<usize>,
    pub complexity_levels: Vec<u64>,
    pub output_dir: PathBuf,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            test_counts: vec![100, 500, 1000, 2000],
            complexity_levels: vec![1000, 2000, 5000, 10000],
            output_dir: PathBuf::from("."),
        }
    }
}

impl AppConfig {
    /// Find a config file in the working directory or the user config directory
    pub fn find() -> Option<PathBuf> {
        CONFIG_LOCATIONS
            .iter()
            .map(PathBuf::from)
            .chain(dirs::config_dir().map(|dir| dir.join("unitrun").join("config.yaml")))
            .find(|path| path.exists())
    }

    /// Load from `path`, or from the first standard location, or defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path.map(Path::to_path_buf).or_else(Self::find) {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = if is_yaml_file(path) {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?
        };

        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = if is_yaml_file(path) {
            serde_yaml::to_string(self).context("Failed to serialize config")?
        } else {
            serde_json::to_string_pretty(self).context("Failed to serialize config")?
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.runner.workers == Some(0) {
            anyhow::bail!("runner.workers must be at least 1");
        }
        if self.benchmark.test_counts.iter().any(|n| *n == 0) {
            anyhow::bail!("benchmark.test_counts entries must be positive");
        }
        if self.benchmark.complexity_levels.iter().any(|n| *n < 2) {
            anyhow::bail!("benchmark.complexity_levels entries must be at least 2");
        }
        Ok(())
    }

    /// Overlay environment overrides
    pub fn apply_env(&mut self, env: &EnvConfig) {
        if let Some(workers) = env.workers {
            self.runner.workers = Some(workers);
        }
        if let Some(policy) = env.policy() {
            self.runner.policy = policy;
        }
        if let Some(level) = env.log_level() {
            self.log_level = level;
        }
    }
}

fn is_yaml_file(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.runner.workers, None);
        assert_eq!(config.runner.policy, ConcurrencyPolicy::AllUnits);
        assert_eq!(config.benchmark.test_counts, vec![100, 500, 1000, 2000]);
        assert_eq!(config.log_level, LogLevel::Warn);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!(
            ConcurrencyPolicy::from_str("eligible-only"),
            Some(ConcurrencyPolicy::EligibleOnly)
        );
        assert_eq!(
            ConcurrencyPolicy::from_str("ALL_UNITS"),
            Some(ConcurrencyPolicy::AllUnits)
        );
        assert_eq!(ConcurrencyPolicy::from_str("some"), None);
        assert_eq!(ConcurrencyPolicy::EligibleOnly.to_string(), "eligible-only");
    }

    #[test]
    fn test_save_load_yaml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let mut config = AppConfig::default();
        config.runner.workers = Some(3);
        config.runner.policy = ConcurrencyPolicy::EligibleOnly;
        config.save(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("eligible-only"));

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_save_load_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = AppConfig::default();
        config.benchmark.complexity_levels = vec![100, 200];
        config.save(&path).unwrap();

        assert_eq!(AppConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "runner:\n  workers: 2\n").unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.runner.workers, Some(2));
        assert_eq!(config.benchmark, BenchmarkConfig::default());
    }

    #[test]
    fn test_policy_accepts_underscore_spelling() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "runner:\n  policy: eligible_only\n").unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.runner.policy, ConcurrencyPolicy::EligibleOnly);

        let json = dir.path().join("config.json");
        std::fs::write(&json, r#"{"runner": {"policy": "all_units"}}"#).unwrap();
        assert_eq!(
            AppConfig::load(&json).unwrap().runner.policy,
            ConcurrencyPolicy::AllUnits
        );
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.runner.workers = Some(0);
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.benchmark.complexity_levels = vec![1];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = AppConfig::load("/nonexistent/unitrun.yaml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_apply_env() {
        let mut config = AppConfig::default();
        let env = EnvConfig {
            workers: Some(6),
            policy: Some("eligible-only".to_string()),
            log: Some("debug".to_string()),
            ..Default::default()
        };
        config.apply_env(&env);

        assert_eq!(config.runner.workers, Some(6));
        assert_eq!(config.runner.policy, ConcurrencyPolicy::EligibleOnly);
        assert_eq!(config.log_level, LogLevel::Debug);
    }
}
