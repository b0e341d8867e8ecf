use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::timeline::TagFilter;

const REDACTED: &str = "***";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("{variable} is not set. Export it or add it to .env before running `{command}`")]
    MissingCredential {
        variable: &'static str,
        command: &'static str,
    },
    #[error("Failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

/// Main configuration structure for the release reports
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportConfig {
    /// GitHub configuration
    pub github: GitHubConfig,
    /// Release timeline settings
    pub timeline: TimelineConfig,
    /// Buildkite settings for the nightly changelog
    pub buildkite: BuildkiteConfig,
    /// Observability settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GitHubConfig {
    /// GitHub API token (can be set via env var)
    #[serde(default)]
    pub token: Option<String>,
    /// REST API base URL; unset means api.github.com
    #[serde(default)]
    pub api_url: Option<String>,
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Trunk branch release branches are cut from
    pub trunk: String,
    /// Rate limiting settings
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Sustained requests per second
    pub requests_per_second: u32,
    /// Burst capacity
    pub burst_capacity: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimelineConfig {
    /// Existing full-history checkout used instead of a fresh clone
    #[serde(default)]
    pub local_mirror: Option<PathBuf>,
    /// Clone URL for the temporary mirror
    pub clone_url: String,
    /// Upper bound on branches resolved concurrently
    pub max_workers: usize,
    /// Timeout applied to every per-branch remote or history call
    pub call_timeout_seconds: u64,
    /// Substitute an estimated creation date when the divergence point is unknown
    pub creation_fallback: bool,
    /// Age of the last-resort creation estimate
    pub fallback_offset_days: i64,
    /// Substrings marking release-candidate tags
    pub rc_markers: Vec<String>,
    /// Substrings marking platform-variant tags
    pub variant_markers: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BuildkiteConfig {
    /// Buildkite API token (can be set via env var)
    #[serde(default)]
    pub token: Option<String>,
    pub organization: String,
    pub pipeline: String,
    /// Oldest nightly date (YYYYMMDD) worth paging back to
    pub earliest: String,
    /// Job that has to pass for a build to count as a published image
    pub image_job: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level
    pub log_level: String,
    /// Emit JSON log lines instead of human-readable ones
    pub json_logs: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            github: GitHubConfig {
                token: None, // Will be read from env var or .env
                api_url: None,
                owner: "risingwavelabs".to_string(),
                repo: "risingwave".to_string(),
                trunk: "main".to_string(),
                rate_limit: RateLimitConfig {
                    requests_per_second: 10,
                    burst_capacity: 20,
                },
            },
            timeline: TimelineConfig {
                local_mirror: Some(PathBuf::from("../risingwave")),
                clone_url: "https://github.com/risingwavelabs/risingwave.git".to_string(),
                max_workers: 8,
                call_timeout_seconds: 30,
                creation_fallback: true,
                fallback_offset_days: 30,
                rc_markers: vec!["rc".to_string()],
                variant_markers: vec!["single-node".to_string()],
            },
            buildkite: BuildkiteConfig {
                token: None,
                organization: "risingwavelabs".to_string(),
                pipeline: "docker".to_string(),
                earliest: "20240901".to_string(),
                image_job: "multi-arch-image-create-push".to_string(),
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                json_logs: false,
            },
        }
    }
}

impl ReportConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (release-report.toml)
    /// 3. Environment variables (prefixed with RELEASE_REPORT_, nested with `__`)
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(Config::try_from(&ReportConfig::default())?)
            .add_source(File::with_name("release-report").required(false))
            .add_source(
                Environment::with_prefix("RELEASE_REPORT")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("timeline.rc_markers")
                    .with_list_parse_key("timeline.variant_markers")
                    .try_parsing(true),
            );

        let mut report_config: ReportConfig = builder.build()?.try_deserialize()?;

        // Plain credential variables are what CI and the old scripts export
        if report_config.github.token.is_none() {
            report_config.github.token = non_empty_var("GITHUB_TOKEN");
        }
        if report_config.buildkite.token.is_none() {
            report_config.buildkite.token = non_empty_var("BUILDKITE_TOKEN");
        }

        Ok(report_config)
    }

    /// Load .env file if it exists, reporting whether one was read
    pub fn load_env_file() -> anyhow::Result<bool> {
        if !Path::new(".env").exists() {
            return Ok(false);
        }
        dotenvy::dotenv()?;
        Ok(true)
    }

    pub fn github_token(&self, command: &'static str) -> Result<&str, ConfigError> {
        self.github
            .token
            .as_deref()
            .filter(|token| !token.is_empty())
            .ok_or(ConfigError::MissingCredential {
                variable: "GITHUB_TOKEN",
                command,
            })
    }

    pub fn buildkite_token(&self, command: &'static str) -> Result<&str, ConfigError> {
        self.buildkite
            .token
            .as_deref()
            .filter(|token| !token.is_empty())
            .ok_or(ConfigError::MissingCredential {
                variable: "BUILDKITE_TOKEN",
                command,
            })
    }

    /// Effective configuration as TOML with credentials masked
    pub fn to_redacted_toml(&self) -> Result<String, ConfigError> {
        let mut shown = self.clone();
        if shown.github.token.is_some() {
            shown.github.token = Some(REDACTED.to_string());
        }
        if shown.buildkite.token.is_some() {
            shown.buildkite.token = Some(REDACTED.to_string());
        }
        Ok(toml::to_string_pretty(&shown)?)
    }
}

impl TimelineConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_seconds)
    }

    pub fn tag_filter(&self) -> TagFilter {
        TagFilter::new(self.rc_markers.clone(), self.variant_markers.clone())
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}
