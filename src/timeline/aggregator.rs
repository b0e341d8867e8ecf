//! Concurrent per-branch metadata aggregation.
//!
//! Every branch is resolved as its own task. A branch whose queries fail or
//! time out still yields a record, with the affected fields absent or
//! estimated; no failure is ever propagated to sibling branches.

use chrono::{DateTime, Duration as TimeDelta, Utc};
use futures::stream::{self, StreamExt};
use futures::TryFutureExt;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, info_span, warn, Instrument};

use super::record::{BranchRecord, DateField, EstimateBasis};
use super::sources::{HistoryProvider, ReleaseRegistry};
use super::tags::{ReleaseTag, TagFilter};
use super::version::BranchId;
use crate::config::TimelineConfig;
use crate::telemetry::generate_correlation_id;

#[derive(Debug, Clone)]
pub struct AggregatorOptions {
    pub max_workers: usize,
    pub call_timeout: Duration,
    pub creation_fallback: bool,
    pub fallback_offset_days: i64,
    /// Anchor for the fixed-offset creation estimate; captured once per run
    pub reference_time: DateTime<Utc>,
    pub tag_filter: TagFilter,
}

impl AggregatorOptions {
    pub fn from_config(config: &TimelineConfig, reference_time: DateTime<Utc>) -> Self {
        Self {
            max_workers: config.max_workers.max(1),
            call_timeout: config.call_timeout(),
            creation_fallback: config.creation_fallback,
            fallback_offset_days: config.fallback_offset_days,
            reference_time,
            tag_filter: config.tag_filter(),
        }
    }

    /// Override the pool size; zero is raised to one worker
    pub fn with_max_workers(mut self, workers: usize) -> Self {
        self.max_workers = workers.max(1);
        self
    }

    /// Pool size actually used by the aggregator
    pub fn worker_count(&self) -> usize {
        self.max_workers.max(1)
    }
}

impl Default for AggregatorOptions {
    fn default() -> Self {
        Self::from_config(&crate::config::ReportConfig::default().timeline, Utc::now())
    }
}

/// Why one query for one branch produced nothing
#[derive(Debug, Error)]
pub enum QueryFailure {
    #[error("{query} timed out after {}ms", .after.as_millis())]
    Timeout { query: &'static str, after: Duration },
    #[error("{query} failed: {message}")]
    Failed { query: &'static str, message: String },
}

pub struct BranchAggregator {
    resolver: BranchResolver,
}

impl BranchAggregator {
    pub fn new(
        registry: Arc<dyn ReleaseRegistry>,
        history: Arc<dyn HistoryProvider>,
        options: AggregatorOptions,
    ) -> Self {
        Self {
            resolver: BranchResolver {
                registry,
                history,
                options: Arc::new(options),
            },
        }
    }

    /// Resolve one record per branch, ordered by version regardless of the
    /// order branches were given in or finished in.
    pub async fn aggregate(&self, branches: Vec<BranchId>) -> Vec<BranchRecord> {
        let run_id = generate_correlation_id();
        let total = branches.len();
        let workers = self.resolver.options.worker_count();
        let span = info_span!("aggregate", run.id = %run_id, branches = total, workers);

        async move {
            let mut records: Vec<BranchRecord> = stream::iter(branches)
                .map(|branch| self.resolve_isolated(branch))
                .buffer_unordered(workers)
                .collect()
                .await;

            records.sort_by_key(|record| record.version());
            info!(records = records.len(), "Aggregation complete");
            records
        }
        .instrument(span)
        .await
    }

    /// Run one branch on its own task so a panic stays contained to that branch
    async fn resolve_isolated(&self, branch: BranchId) -> BranchRecord {
        let resolver = self.resolver.clone();
        let span = info_span!("branch", name = %branch.name);
        let task = tokio::spawn(resolver.resolve(branch.clone()).instrument(span));

        match task.await {
            Ok(record) => record,
            Err(join_error) => {
                warn!(branch = %branch.name, error = %join_error, "Branch worker aborted");
                let creation = self.resolver.offset_estimate();
                BranchRecord::new(branch, creation, Vec::new(), Vec::new(), None)
            }
        }
    }
}

#[derive(Clone)]
struct BranchResolver {
    registry: Arc<dyn ReleaseRegistry>,
    history: Arc<dyn HistoryProvider>,
    options: Arc<AggregatorOptions>,
}

impl BranchResolver {
    async fn resolve(self, branch: BranchId) -> BranchRecord {
        let (creation, (formal, candidates), last_commit) = tokio::join!(
            self.creation_date(&branch),
            self.releases_for(&branch),
            self.last_commit_date(&branch),
        );

        let record = BranchRecord::new(branch, creation, formal, candidates, last_commit);
        for anomaly in record.anomalies() {
            warn!(branch = %record.branch.name, %anomaly, "Upstream dates out of order");
        }
        debug!(
            creation = ?record.creation_date(),
            first_release = ?record.first_release,
            last_release = ?record.last_release,
            last_commit = ?record.last_commit,
            "Branch resolved"
        );
        record
    }

    async fn creation_date(&self, branch: &BranchId) -> Option<DateField> {
        match self
            .timed("divergence point", self.history.divergence_date(&branch.name))
            .await
        {
            Ok(at) => return Some(DateField::resolved(at)),
            Err(failure) => warn!(branch = %branch.name, %failure, "Branch creation unresolved"),
        }

        if !self.options.creation_fallback {
            return None;
        }

        match self
            .timed(
                "oldest branch commit",
                self.history.oldest_branch_commit_date(&branch.name),
            )
            .await
        {
            Ok(at) => Some(DateField::estimated(at, EstimateBasis::OldestBranchCommit)),
            Err(failure) => {
                debug!(branch = %branch.name, %failure, "Falling back to fixed offset");
                self.offset_estimate()
            }
        }
    }

    async fn releases_for(&self, branch: &BranchId) -> (Vec<ReleaseTag>, Vec<ReleaseTag>) {
        let listing = self.registry.releases().map_err(|err| err.headline());
        match self.timed("release listing", listing).await {
            Ok(releases) => self.options.tag_filter.partition(branch.version, &releases),
            Err(failure) => {
                warn!(branch = %branch.name, %failure, "Releases unavailable");
                (Vec::new(), Vec::new())
            }
        }
    }

    async fn last_commit_date(&self, branch: &BranchId) -> Option<DateTime<Utc>> {
        let head = self
            .registry
            .branch_head_date(&branch.name)
            .map_err(|err| err.headline());
        self.timed("branch head", head)
            .await
            .map_err(|failure| warn!(branch = %branch.name, %failure, "Branch head unresolved"))
            .ok()
    }

    fn offset_estimate(&self) -> Option<DateField> {
        if !self.options.creation_fallback {
            return None;
        }
        let days = self.options.fallback_offset_days;
        let reference = self.options.reference_time;
        let at = TimeDelta::try_days(days)
            .and_then(|offset| reference.checked_sub_signed(offset))
            .unwrap_or(reference);
        Some(DateField::estimated(at, EstimateBasis::FixedOffset { days }))
    }

    async fn timed<T, E, F>(&self, query: &'static str, call: F) -> Result<T, QueryFailure>
    where
        F: Future<Output = Result<T, E>>,
        E: Display,
    {
        let after = self.options.call_timeout;
        match tokio::time::timeout(after, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(QueryFailure::Failed {
                query,
                message: err.to_string(),
            }),
            Err(_) => Err(QueryFailure::Timeout { query, after }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportConfig;

    #[test]
    fn test_zero_workers_is_raised_to_one() {
        let mut timeline = ReportConfig::default().timeline;
        timeline.max_workers = 0;
        let options = AggregatorOptions::from_config(&timeline, Utc::now());
        assert_eq!(options.max_workers, 1);
        assert_eq!(options.worker_count(), 1);

        let options = options.with_max_workers(0);
        assert_eq!(options.worker_count(), 1);
        assert_eq!(options.with_max_workers(4).worker_count(), 4);
    }

    #[test]
    fn test_worker_count_guards_hand_built_options() {
        let options = AggregatorOptions {
            max_workers: 0,
            ..AggregatorOptions::default()
        };
        assert_eq!(options.worker_count(), 1);
    }
}
