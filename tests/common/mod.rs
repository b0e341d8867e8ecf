//! Shared fakes and fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use git2::{Oid, Repository, Signature, Time};
use rw_release_report::git::GitError;
use rw_release_report::{GitHubError, HistoryProvider, ReleaseRegistry, ReleaseTag};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const DAY: i64 = 86_400;
pub const EPOCH_2024: i64 = 1_704_067_200; // 2024-01-01T00:00:00Z

pub fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

/// Scripted outcome of one fake query
#[derive(Debug, Clone, Copy)]
pub enum Outcome {
    At(DateTime<Utc>),
    Fail,
    Hang,
    Panic,
}

impl Outcome {
    async fn resolve<E>(self, error: impl FnOnce() -> E) -> Result<DateTime<Utc>, E> {
        match self {
            Outcome::At(at) => Ok(at),
            Outcome::Fail => Err(error()),
            Outcome::Hang => std::future::pending().await,
            Outcome::Panic => panic!("scripted panic"),
        }
    }
}

#[derive(Default)]
pub struct FakeRegistry {
    releases: Vec<ReleaseTag>,
    heads: HashMap<String, Outcome>,
    releases_fail: bool,
    pub release_calls: AtomicUsize,
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn release(mut self, tag: &str, at: DateTime<Utc>) -> Self {
        self.releases.push(ReleaseTag::new(tag, at));
        self
    }

    pub fn head(mut self, branch: &str, outcome: Outcome) -> Self {
        self.heads.insert(branch.to_string(), outcome);
        self
    }

    pub fn failing_releases(mut self) -> Self {
        self.releases_fail = true;
        self
    }
}

#[async_trait]
impl ReleaseRegistry for FakeRegistry {
    async fn releases(&self) -> Result<Arc<Vec<ReleaseTag>>, GitHubError> {
        self.release_calls.fetch_add(1, Ordering::SeqCst);
        if self.releases_fail {
            return Err(GitHubError::NotFound {
                resource: "releases".to_string(),
            });
        }
        Ok(Arc::new(self.releases.clone()))
    }

    async fn branch_head_date(&self, branch: &str) -> Result<DateTime<Utc>, GitHubError> {
        let outcome = self.heads.get(branch).copied().unwrap_or(Outcome::Fail);
        outcome
            .resolve(|| GitHubError::NotFound {
                resource: branch.to_string(),
            })
            .await
    }
}

#[derive(Default)]
pub struct FakeHistory {
    divergence: HashMap<String, Outcome>,
    oldest: HashMap<String, Outcome>,
    delays: HashMap<String, Duration>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn divergence(mut self, branch: &str, outcome: Outcome) -> Self {
        self.divergence.insert(branch.to_string(), outcome);
        self
    }

    pub fn oldest(mut self, branch: &str, outcome: Outcome) -> Self {
        self.oldest.insert(branch.to_string(), outcome);
        self
    }

    /// Delay every divergence query for `branch`
    pub fn delay(mut self, branch: &str, delay: Duration) -> Self {
        self.delays.insert(branch.to_string(), delay);
        self
    }
}

#[async_trait]
impl HistoryProvider for FakeHistory {
    async fn divergence_date(&self, branch: &str) -> Result<DateTime<Utc>, GitError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(branch) {
            tokio::time::sleep(*delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let outcome = self.divergence.get(branch).copied().unwrap_or(Outcome::Fail);
        outcome
            .resolve(|| GitError::BranchNotFound {
                branch: branch.to_string(),
            })
            .await
    }

    async fn oldest_branch_commit_date(&self, branch: &str) -> Result<DateTime<Utc>, GitError> {
        let outcome = self.oldest.get(branch).copied().unwrap_or(Outcome::Fail);
        outcome
            .resolve(|| GitError::BranchNotFound {
                branch: branch.to_string(),
            })
            .await
    }
}

pub fn commit(repo: &Repository, refname: &str, parent: Option<Oid>, at: i64, msg: &str) -> Oid {
    let sig = Signature::new("Test", "test@example.com", &Time::new(at, 0)).unwrap();
    let tree_id = repo.index().unwrap().write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let parents: Vec<git2::Commit> = parent
        .map(|p| vec![repo.find_commit(p).unwrap()])
        .unwrap_or_default();
    let parent_refs: Vec<&git2::Commit> = parents.iter().collect();
    repo.commit(Some(refname), &sig, &sig, msg, &tree, &parent_refs)
        .unwrap()
}

/// Upstream repository with local branches:
/// main c0 - c1 - c3, release-2.1 forked at c1 (+c2), release-2.2 forked at c3 (+c4)
pub fn upstream_fixture(dir: &Path) -> Repository {
    let repo = Repository::init(dir).unwrap();
    let c0 = commit(&repo, "refs/heads/main", None, EPOCH_2024, "c0");
    let c1 = commit(&repo, "refs/heads/main", Some(c0), EPOCH_2024 + 10 * DAY, "c1");
    repo.reference("refs/heads/release-2.1", c1, true, "fork").unwrap();
    commit(&repo, "refs/heads/release-2.1", Some(c1), EPOCH_2024 + 12 * DAY, "c2");
    let c3 = commit(&repo, "refs/heads/main", Some(c1), EPOCH_2024 + 40 * DAY, "c3");
    repo.reference("refs/heads/release-2.2", c3, true, "fork").unwrap();
    commit(&repo, "refs/heads/release-2.2", Some(c3), EPOCH_2024 + 45 * DAY, "c4");
    repo.set_head("refs/heads/main").unwrap();
    repo
}
