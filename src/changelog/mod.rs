//! Nightly changelog: trunk history grouped by the nightly image that first
//! shipped each commit.

pub mod history;
pub mod nightly;

pub use history::{render_commit_history, render_nightly_list, CommitFeed};
pub use nightly::{collect_nightlies, NightlyBuild, NightlyFilter};

use thiserror::Error;
use tracing::{info, info_span, Instrument};

use crate::buildkite::{BuildSource, BuildkiteError};
use crate::config::BuildkiteConfig;
use crate::github::GitHubError;
use crate::telemetry::generate_correlation_id;

#[derive(Debug, Error)]
pub enum ChangelogError {
    #[error(transparent)]
    Buildkite(#[from] BuildkiteError),
    #[error("{}", .0.headline())]
    GitHub(#[from] GitHubError),
}

#[derive(Debug, Clone)]
pub struct ChangelogOptions {
    pub trunk: String,
    /// Oldest nightly date (YYYYMMDD) worth paging back to
    pub earliest: String,
    pub filter: NightlyFilter,
}

impl ChangelogOptions {
    pub fn from_config(config: &BuildkiteConfig, trunk: &str) -> Self {
        Self {
            trunk: trunk.to_string(),
            earliest: config.earliest.clone(),
            filter: NightlyFilter::new(config.image_job.clone()),
        }
    }
}

/// Full changelog document
pub async fn build_changelog(
    builds: &dyn BuildSource,
    feed: &dyn CommitFeed,
    options: &ChangelogOptions,
) -> Result<String, ChangelogError> {
    let span = info_span!("changelog", run.id = %generate_correlation_id());
    async {
        let nightlies = collect_nightlies(builds, &options.filter, &options.earliest).await?;
        let history = render_commit_history(feed, &options.trunk, &nightlies).await?;
        info!(nightlies = nightlies.len(), "Changelog assembled");

        let mut out = render_nightly_list(&nightlies);
        out.push_str(&history);
        Ok(out)
    }
    .instrument(span)
    .await
}
