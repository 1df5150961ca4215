//! Harness configuration

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, HarnessResult};

/// Top-level harness configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Base URL of the service under test
    pub base_url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Delete created entities at the end of the run
    pub cleanup: bool,

    /// Emit per-step informational log lines
    pub detailed_logging: bool,

    /// Retries for failed steps. Declared for compatibility, never consulted.
    pub retry_count: u32,

    /// What to do after a step fails
    pub mode: RunMode,

    /// Names used for the entities the run creates
    pub fixtures: FixtureConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8081".to_string(),
            timeout_secs: 5,
            cleanup: true,
            detailed_logging: true,
            retry_count: 1,
            mode: RunMode::default(),
            fixtures: FixtureConfig::default(),
        }
    }
}

/// Entity names seeded into the run context
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureConfig {
    pub student_name: String,
    pub subject_name: String,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            student_name: "Akash".to_string(),
            subject_name: "ENGLISH".to_string(),
        }
    }
}

/// Failure policy for the runner
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Record the failure and keep going
    #[default]
    Continue,
    /// Skip everything after the first failure, except always-run steps
    #[value(name = "fail_fast")]
    FailFast,
}

impl HarnessConfig {
    /// Load configuration from a TOML file, falling back to defaults when absent
    pub fn load(path: &Path) -> HarnessResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let mut config: Self = toml::from_str(&content)?;
            config.normalize();
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Strip surrounding whitespace from values that come from files, flags or env
    pub fn normalize(&mut self) {
        let trimmed = self.base_url.trim();
        if trimmed.len() != self.base_url.len() {
            self.base_url = trimmed.to_string();
        }
    }

    /// Reject values the client cannot work with
    pub fn validate(&self) -> HarnessResult<()> {
        let url = self.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(HarnessError::Config(format!(
                "base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(HarnessError::Config("timeout_secs must be positive".to_string()));
        }
        if self.fixtures.student_name.trim().is_empty() || self.fixtures.subject_name.trim().is_empty() {
            return Err(HarnessError::Config("fixture names must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Short identifier tagging a single run in logs and reports
pub fn new_run_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_local_service() {
        let config = HarnessConfig::default();
        assert_eq!(config.base_url, "http://localhost:8081");
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert!(config.cleanup);
        assert_eq!(config.retry_count, 1);
        assert_eq!(config.mode, RunMode::Continue);
        assert_eq!(config.fixtures.student_name, "Akash");
        assert_eq!(config.fixtures.subject_name, "ENGLISH");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: HarnessConfig = toml::from_str(
            r#"
base_url = "http://10.0.0.5:9000"
mode = "fail_fast"

[fixtures]
subject_name = "MATHS"
"#,
        )
        .unwrap();
        assert_eq!(config.base_url, "http://10.0.0.5:9000");
        assert_eq!(config.mode, RunMode::FailFast);
        assert_eq!(config.fixtures.subject_name, "MATHS");
        assert_eq!(config.fixtures.student_name, "Akash");
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = HarnessConfig::load(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.base_url, "http://localhost:8081");
    }

    #[test]
    fn test_load_rejects_bad_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harness.toml");
        std::fs::write(&path, "base_url = \"localhost:8081\"\n").unwrap();
        let err = HarnessConfig::load(&path).unwrap_err();
        assert!(matches!(err, HarnessError::Config(_)));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = HarnessConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_trims_base_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harness.toml");
        std::fs::write(&path, "base_url = \"  http://10.0.0.5:9000 \"\n").unwrap();
        let config = HarnessConfig::load(&path).unwrap();
        assert_eq!(config.base_url, "http://10.0.0.5:9000");
    }

    #[test]
    fn test_normalize_leaves_clean_url_alone() {
        let mut config = HarnessConfig::default();
        config.normalize();
        assert_eq!(config.base_url, "http://localhost:8081");
    }

    #[test]
    fn test_mode_is_spelled_the_same_in_toml_and_cli() {
        use clap::ValueEnum;

        assert_eq!(RunMode::from_str("fail_fast", false), Ok(RunMode::FailFast));
        assert_eq!(RunMode::from_str("continue", false), Ok(RunMode::Continue));
        assert!(RunMode::from_str("fail-fast", false).is_err());

        let names: Vec<String> = RunMode::value_variants()
            .iter()
            .filter_map(|m| m.to_possible_value())
            .map(|v| v.get_name().to_string())
            .collect();
        let toml_names: Vec<String> = [RunMode::Continue, RunMode::FailFast]
            .iter()
            .map(|m| serde_json::to_value(m).unwrap().as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, toml_names);
    }

    #[test]
    fn test_run_id_is_short_hex() {
        let id = new_run_id();
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
