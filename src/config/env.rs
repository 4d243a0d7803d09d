//! Environment variable configuration
//!
//! `UNITRUN_*` variables override the config file.

use std::env;

use super::ConcurrencyPolicy;
use crate::utils::LogLevel;

const ENV_PREFIX: &str = "UNITRUN";

#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// UNITRUN_WORKERS
    pub workers: Option<usize>,
    /// UNITRUN_POLICY
    pub policy: Option<String>,
    /// UNITRUN_LOG
    pub log: Option<String>,
    /// UNITRUN_FORMAT
    pub format: Option<String>,
    /// UNITRUN_CONFIG
    pub config_file: Option<String>,
}

impl EnvConfig {
    pub fn load() -> Self {
        Self {
            workers: get_env_parse("WORKERS"),
            policy: get_env("POLICY"),
            log: get_env("LOG"),
            format: get_env("FORMAT"),
            config_file: get_env("CONFIG"),
        }
    }

    pub fn has_any(&self) -> bool {
        self.workers.is_some()
            || self.policy.is_some()
            || self.log.is_some()
            || self.format.is_some()
            || self.config_file.is_some()
    }

    /// Parsed policy; unknown values are ignored with a warning
    pub fn policy(&self) -> Option<ConcurrencyPolicy> {
        let raw = self.policy.as_deref()?;
        let policy = ConcurrencyPolicy::from_str(raw);
        if policy.is_none() {
            tracing::warn!("ignoring {ENV_PREFIX}_POLICY={raw}");
        }
        policy
    }

    pub fn log_level(&self) -> Option<LogLevel> {
        self.log.as_deref().and_then(LogLevel::from_str)
    }

    pub fn format_or(&self, default: &str) -> String {
        self.format.clone().unwrap_or_else(|| default.to_string())
    }

    pub fn print_summary(&self) {
        println!("Environment Configuration:");
        println!("  {ENV_PREFIX}_WORKERS: {:?}", self.workers);
        println!("  {ENV_PREFIX}_POLICY:  {:?}", self.policy);
        println!("  {ENV_PREFIX}_LOG:     {:?}", self.log);
        println!("  {ENV_PREFIX}_FORMAT:  {:?}", self.format);
        println!("  {ENV_PREFIX}_CONFIG:  {:?}", self.config_file);
    }
}

fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}")).ok()
}

fn get_env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    get_env(name).and_then(|v| v.parse().ok())
}

/// Sets `UNITRUN_*` variables, mainly for tests
#[derive(Default)]
pub struct EnvBuilder {
    vars: Vec<(String, String)>,
}

impl EnvBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn var(mut self, name: &str, value: impl Into<String>) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_{name}"), value.into()));
        self
    }

    pub fn workers(self, workers: usize) -> Self {
        self.var("WORKERS", workers.to_string())
    }

    pub fn policy(self, policy: impl Into<String>) -> Self {
        self.var("POLICY", policy)
    }

    pub fn log(self, level: impl Into<String>) -> Self {
        self.var("LOG", level)
    }

    pub fn format(self, format: impl Into<String>) -> Self {
        self.var("FORMAT", format)
    }

    pub fn config_file(self, path: impl Into<String>) -> Self {
        self.var("CONFIG", path)
    }

    pub fn apply(self) {
        for (key, value) in self.vars {
            env::set_var(key, value);
        }
    }

    /// Apply and return a guard that restores the previous values on drop
    pub fn apply_scoped(self) -> EnvGuard {
        let previous = self
            .vars
            .iter()
            .map(|(k, _)| (k.clone(), env::var(k).ok()))
            .collect();

        self.apply();

        EnvGuard { previous }
    }
}

pub struct EnvGuard {
    previous: Vec<(String, Option<String>)>,
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.previous {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
    }
}

pub fn print_env_help() {
    println!("Environment Variables:");
    println!();
    println!("  {ENV_PREFIX}_WORKERS   Worker pool size for concurrent runs");
    println!("  {ENV_PREFIX}_POLICY    Concurrency policy (all-units, eligible-only)");
    println!("  {ENV_PREFIX}_LOG       Diagnostic log level (trace, debug, info, warn, error)");
    println!("  {ENV_PREFIX}_FORMAT    Summary format (table, json, json-pretty, csv, summary)");
    println!("  {ENV_PREFIX}_CONFIG    Path to configuration file");
    println!();
    println!("Example:");
    println!("  export {ENV_PREFIX}_WORKERS=4");
    println!("  unitrun demo --mode both");
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    // Tests touching process environment must not interleave
    static ENV_LOCK: Mutex<()> = parking_lot::const_mutex(());

    #[test]
    fn test_env_config_default() {
        let config = EnvConfig::default();
        assert!(!config.has_any());
        assert_eq!(config.format_or("table"), "table");
        assert!(config.policy().is_none());
    }

    #[test]
    fn test_env_builder_scoped() {
        let _lock = ENV_LOCK.lock();
        {
            let _guard = EnvBuilder::new()
                .workers(3)
                .policy("eligible-only")
                .log("info")
                .format("json")
                .apply_scoped();

            let config = EnvConfig::load();
            assert_eq!(config.workers, Some(3));
            assert_eq!(config.policy(), Some(ConcurrencyPolicy::EligibleOnly));
            assert_eq!(config.log_level(), Some(LogLevel::Info));
            assert_eq!(config.format_or("table"), "json");
            assert!(config.has_any());
        }

        assert!(EnvConfig::load().workers.is_none());
    }

    #[test]
    fn test_unparseable_values_are_ignored() {
        let _lock = ENV_LOCK.lock();
        let _guard = EnvBuilder::new()
            .workers_raw("many")
            .policy("sometimes")
            .apply_scoped();

        let config = EnvConfig::load();
        assert_eq!(config.workers, None);
        assert_eq!(config.policy(), None);
    }

    impl EnvBuilder {
        fn workers_raw(self, raw: &str) -> Self {
            self.var("WORKERS", raw)
        }
    }
}
