use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;

/// One pipeline build; only the fields the changelog reads
#[derive(Debug, Clone, Deserialize)]
pub struct Build {
    pub source: String,
    pub commit: String,
    pub created_at: DateTime<Utc>,
    /// Build environment; values are usually strings but not guaranteed
    #[serde(default)]
    pub env: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub jobs: Vec<Job>,
}

impl Build {
    pub fn env_str(&self, key: &str) -> Option<&str> {
        self.env.get(key).and_then(|value| value.as_str())
    }

    /// Whether a job called `name` finished in the `passed` state
    pub fn job_passed(&self, name: &str) -> bool {
        self.jobs
            .iter()
            .any(|job| job.name.as_deref() == Some(name) && job.state.as_deref() == Some("passed"))
    }
}

/// Pipeline step; waiter and block steps carry no name
#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

/// One page of builds, newest first
#[derive(Debug, Clone, Default)]
pub struct BuildPage {
    pub builds: Vec<Build>,
    pub next_page: Option<u32>,
}
