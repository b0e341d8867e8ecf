use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use super::tags::ReleaseTag;
use super::version::{BranchId, ReleaseVersion};

/// How a degraded creation date was estimated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "basis", rename_all = "snake_case")]
pub enum EstimateBasis {
    /// Oldest commit reachable from the branch but not from trunk
    OldestBranchCommit,
    /// Reference time minus a fixed number of days
    FixedOffset { days: i64 },
}

impl fmt::Display for EstimateBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EstimateBasis::OldestBranchCommit => write!(f, "oldest branch commit"),
            EstimateBasis::FixedOffset { days } => write!(f, "{days} days before run"),
        }
    }
}

/// A timestamp that is either confidently resolved or a degraded estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DateField {
    Resolved { at: DateTime<Utc> },
    Estimated { at: DateTime<Utc>, basis: EstimateBasis },
}

impl DateField {
    pub fn resolved(at: DateTime<Utc>) -> Self {
        DateField::Resolved { at }
    }

    pub fn estimated(at: DateTime<Utc>, basis: EstimateBasis) -> Self {
        DateField::Estimated { at, basis }
    }

    pub fn at(&self) -> DateTime<Utc> {
        match self {
            DateField::Resolved { at } | DateField::Estimated { at, .. } => *at,
        }
    }

    pub fn is_estimated(&self) -> bool {
        matches!(self, DateField::Estimated { .. })
    }
}

/// Everything the renderers need to know about one release branch.
///
/// Built once per aggregation run and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchRecord {
    pub branch: BranchId,
    pub branch_creation: Option<DateField>,
    pub first_release: Option<DateTime<Utc>>,
    pub last_release: Option<DateTime<Utc>>,
    /// Absent only if the branch head itself could not be looked up
    pub last_commit: Option<DateTime<Utc>>,
    pub formal_releases: Vec<ReleaseTag>,
    pub rc_releases: Vec<ReleaseTag>,
}

/// Ordering violations between a record's dates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anomaly {
    ReleasedBeforeCreation,
    LastReleaseBeforeFirst,
    CommitBeforeLastRelease,
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Anomaly::ReleasedBeforeCreation => "first release predates branch creation",
            Anomaly::LastReleaseBeforeFirst => "last release predates first release",
            Anomaly::CommitBeforeLastRelease => "last commit predates last release",
        };
        f.write_str(text)
    }
}

impl BranchRecord {
    /// Assemble a record; `formal_releases` must already be sorted by creation time
    pub fn new(
        branch: BranchId,
        branch_creation: Option<DateField>,
        formal_releases: Vec<ReleaseTag>,
        rc_releases: Vec<ReleaseTag>,
        last_commit: Option<DateTime<Utc>>,
    ) -> Self {
        let first_release = formal_releases.first().map(|r| r.created_at);
        let last_release = formal_releases.last().map(|r| r.created_at);
        Self {
            branch,
            branch_creation,
            first_release,
            last_release,
            last_commit,
            formal_releases,
            rc_releases,
        }
    }

    pub fn version(&self) -> ReleaseVersion {
        self.branch.version
    }

    pub fn creation_date(&self) -> Option<DateTime<Utc>> {
        self.branch_creation.map(|d| d.at())
    }

    pub fn last_release_tag(&self) -> Option<&str> {
        self.formal_releases.last().map(|r| r.tag_name.as_str())
    }

    /// Branch creation → first release
    pub fn pre_days(&self) -> Option<i64> {
        days_between(self.creation_date(), self.first_release)
    }

    /// First release → last release
    pub fn live_days(&self) -> Option<i64> {
        days_between(self.first_release, self.last_release)
    }

    /// Last release → last commit
    pub fn maint_days(&self) -> Option<i64> {
        days_between(self.last_release, self.last_commit)
    }

    pub fn anomalies(&self) -> Vec<Anomaly> {
        let mut found = Vec::new();
        if let (Some(created), Some(first)) = (self.creation_date(), self.first_release) {
            if first < created {
                found.push(Anomaly::ReleasedBeforeCreation);
            }
        }
        if let (Some(first), Some(last)) = (self.first_release, self.last_release) {
            if last < first {
                found.push(Anomaly::LastReleaseBeforeFirst);
            }
        }
        if let (Some(last), Some(commit)) = (self.last_release, self.last_commit) {
            if commit < last {
                found.push(Anomaly::CommitBeforeLastRelease);
            }
        }
        found
    }
}

const SECONDS_PER_DAY: i64 = 86_400;

/// Whole days from `from` to `to`, when both are known. Rounds toward
/// negative infinity, so reversed spans count a partial day as a full one.
pub fn days_between(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Option<i64> {
    Some((to? - from?).num_seconds().div_euclid(SECONDS_PER_DAY))
}
