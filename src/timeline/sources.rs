//! Read-only data sources the aggregator queries per branch.
//!
//! Both are constructed once per run and shared by every worker, so
//! implementations must be safe to call concurrently.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::tags::ReleaseTag;
use crate::git::GitError;
use crate::github::GitHubError;

/// Release listing and branch-head lookups (GitHub in production)
#[async_trait]
pub trait ReleaseRegistry: Send + Sync {
    /// Every published release of the repository, in registry order
    async fn releases(&self) -> Result<Arc<Vec<ReleaseTag>>, GitHubError>;

    /// Authoring timestamp of the branch's head commit
    async fn branch_head_date(&self, branch: &str) -> Result<DateTime<Utc>, GitHubError>;
}

/// Commit-graph queries against a full-history mirror
#[async_trait]
pub trait HistoryProvider: Send + Sync {
    /// Commit time of the merge-base between the branch and trunk
    async fn divergence_date(&self, branch: &str) -> Result<DateTime<Utc>, GitError>;

    /// Commit time of the oldest commit on the branch that trunk does not contain
    async fn oldest_branch_commit_date(&self, branch: &str) -> Result<DateTime<Utc>, GitError>;
}
