//! Wire shapes for the handful of REST endpoints the reports read.
//!
//! Only the fields actually consumed are declared; serde ignores the rest.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static PR_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(#(\d+)\)$").expect("static pattern compiles"));

#[derive(Debug, Clone, Deserialize)]
pub struct BranchPayload {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReleasePayload {
    pub tag_name: String,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub draft: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitPayload {
    pub sha: String,
    pub commit: CommitDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitDetail {
    pub message: String,
    pub author: Option<GitActor>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitActor {
    pub date: Option<DateTime<Utc>>,
}

/// Query string for paged list endpoints
#[derive(Debug, Clone, Serialize)]
pub(crate) struct PageQuery<'a> {
    pub per_page: u8,
    pub page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<&'a str>,
}

/// A trunk commit as the changelog needs it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSummary {
    pub sha: String,
    pub message: String,
}

impl From<CommitPayload> for CommitSummary {
    fn from(payload: CommitPayload) -> Self {
        Self {
            sha: payload.sha,
            message: payload.commit.message,
        }
    }
}

impl CommitSummary {
    pub fn title(&self) -> &str {
        self.message.lines().next().unwrap_or_default()
    }

    /// Pull request number from a squash-merge title such as `fix: foo (#12924)`
    pub fn pr_number(&self) -> Option<u64> {
        PR_SUFFIX
            .captures(self.title().trim_end())
            .and_then(|caps| caps[1].parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(message: &str) -> CommitSummary {
        CommitSummary {
            sha: "abc123".to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_title_is_first_line() {
        assert_eq!(summary("feat: x (#1)\n\nbody").title(), "feat: x (#1)");
        assert_eq!(summary("").title(), "");
    }

    #[test]
    fn test_pr_number_from_title_suffix() {
        assert_eq!(summary("fix(meta): stuck barrier (#12924)\n\nCo-authored").pr_number(), Some(12924));
        assert_eq!(summary("Revert \"refs #10 (#11)\" manual edit").pr_number(), None);
        assert_eq!(summary("chore: bump version").pr_number(), None);
    }
}
