use async_trait::async_trait;
use chrono::{DateTime, Utc};
use git2::{Oid, Repository, Sort};
use std::path::{Path, PathBuf};

use super::GitError;
use crate::timeline::HistoryProvider;

/// Divergence queries against a mirror. Branches resolve through
/// `refs/remotes/origin/<name>` first, then `refs/heads/<name>`, so both
/// working checkouts and bare clones work.
///
/// `git2::Repository` is not `Sync`, so every query opens its own handle on a
/// blocking thread; the mirror itself is only ever read.
#[derive(Debug, Clone)]
pub struct GitHistory {
    path: PathBuf,
    remote: String,
    trunk: String,
}

impl GitHistory {
    pub fn new(path: impl Into<PathBuf>, trunk: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            remote: "origin".to_string(),
            trunk: trunk.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn query<T, F>(&self, branch: &str, run: F) -> Result<T, GitError>
    where
        T: Send + 'static,
        F: FnOnce(&MirrorView, &str) -> Result<T, GitError> + Send + 'static,
    {
        let view = MirrorView {
            path: self.path.clone(),
            remote: self.remote.clone(),
            trunk: self.trunk.clone(),
        };
        let branch = branch.to_string();
        tokio::task::spawn_blocking(move || run(&view, &branch)).await?
    }
}

#[async_trait]
impl HistoryProvider for GitHistory {
    async fn divergence_date(&self, branch: &str) -> Result<DateTime<Utc>, GitError> {
        self.query(branch, |view, branch| view.merge_base_time(branch))
            .await
    }

    async fn oldest_branch_commit_date(&self, branch: &str) -> Result<DateTime<Utc>, GitError> {
        self.query(branch, |view, branch| view.oldest_branch_only_time(branch))
            .await
    }
}

/// Owned copy of the lookup parameters for one blocking query
struct MirrorView {
    path: PathBuf,
    remote: String,
    trunk: String,
}

impl MirrorView {
    fn open(&self) -> Result<Repository, GitError> {
        Repository::open(&self.path).map_err(|_| GitError::RepositoryNotFound {
            path: self.path.display().to_string(),
        })
    }

    fn tip(&self, repo: &Repository, branch: &str) -> Result<Oid, GitError> {
        let tracking = format!("refs/remotes/{}/{}", self.remote, branch);
        let local = format!("refs/heads/{branch}");
        let reference = repo
            .find_reference(&tracking)
            .or_else(|_| repo.find_reference(&local))
            .map_err(|_| GitError::BranchNotFound {
                branch: branch.to_string(),
            })?;
        Ok(reference.peel_to_commit()?.id())
    }

    fn merge_base_time(&self, branch: &str) -> Result<DateTime<Utc>, GitError> {
        let repo = self.open()?;
        let branch_tip = self.tip(&repo, branch)?;
        let trunk_tip = self.tip(&repo, &self.trunk)?;
        let base = repo.merge_base(branch_tip, trunk_tip)?;
        commit_time(&repo, base)
    }

    /// Oldest commit on the branch that trunk lacks; with no usable trunk ref,
    /// the oldest commit reachable from the branch at all
    fn oldest_branch_only_time(&self, branch: &str) -> Result<DateTime<Utc>, GitError> {
        let repo = self.open()?;
        let branch_tip = self.tip(&repo, branch)?;

        let mut walk = repo.revwalk()?;
        walk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME | Sort::REVERSE)?;
        walk.push(branch_tip)?;
        if let Ok(trunk_tip) = self.tip(&repo, &self.trunk) {
            walk.hide(trunk_tip)?;
        }

        let oldest = walk
            .next()
            .transpose()?
            .ok_or_else(|| GitError::NoBranchOnlyCommits {
                branch: branch.to_string(),
                trunk: self.trunk.clone(),
            })?;
        commit_time(&repo, oldest)
    }
}

fn commit_time(repo: &Repository, oid: Oid) -> Result<DateTime<Utc>, GitError> {
    let seconds = repo.find_commit(oid)?.time().seconds();
    DateTime::from_timestamp(seconds, 0).ok_or(GitError::InvalidTimestamp { seconds })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use git2::{Signature, Time};
    use tempfile::TempDir;

    const DAY: i64 = 86_400;
    const EPOCH_2024: i64 = 1_704_067_200; // 2024-01-01T00:00:00Z

    fn commit(repo: &Repository, refname: &str, parent: Option<Oid>, at: i64, msg: &str) -> Oid {
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

    /// main: c0 - c1 - c3 ; release-2.1 forks at c1 and adds c2
    fn fixture() -> (TempDir, GitHistory) {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let c0 = commit(&repo, "refs/remotes/origin/main", None, EPOCH_2024, "c0");
        let c1 = commit(&repo, "refs/remotes/origin/main", Some(c0), EPOCH_2024 + 10 * DAY, "c1");
        repo.reference("refs/remotes/origin/release-2.1", c1, true, "fork")
            .unwrap();
        commit(&repo, "refs/remotes/origin/release-2.1", Some(c1), EPOCH_2024 + 12 * DAY, "c2");
        commit(&repo, "refs/remotes/origin/main", Some(c1), EPOCH_2024 + 20 * DAY, "c3");

        let history = GitHistory::new(dir.path(), "main");
        (dir, history)
    }

    #[tokio::test]
    async fn test_divergence_date_is_merge_base_commit_time() {
        let (_dir, history) = fixture();
        let date = history.divergence_date("release-2.1").await.unwrap();
        assert_eq!(date, Utc.with_ymd_and_hms(2024, 1, 11, 0, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn test_oldest_branch_commit_skips_trunk_history() {
        let (_dir, history) = fixture();
        let date = history.oldest_branch_commit_date("release-2.1").await.unwrap();
        assert_eq!(date, Utc.with_ymd_and_hms(2024, 1, 13, 0, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn test_unknown_branch_is_an_error() {
        let (_dir, history) = fixture();
        let err = history.divergence_date("release-9.9").await.unwrap_err();
        assert!(matches!(err, GitError::BranchNotFound { .. }));
    }

    #[tokio::test]
    async fn test_missing_trunk_fails_divergence_but_not_oldest_commit() {
        let (_dir, history) = fixture();
        let history = GitHistory::new(history.path(), "trunk-that-does-not-exist");
        assert!(history.divergence_date("release-2.1").await.is_err());
        let oldest = history.oldest_branch_commit_date("release-2.1").await.unwrap();
        assert_eq!(oldest, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn test_missing_repository() {
        let dir = TempDir::new().unwrap();
        let history = GitHistory::new(dir.path().join("nope"), "main");
        let err = history.divergence_date("release-2.1").await.unwrap_err();
        assert!(matches!(err, GitError::RepositoryNotFound { .. }));
    }
}
