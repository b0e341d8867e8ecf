//! Git operations module
//!
//! Commit-graph queries run in-process through libgit2 against a
//! full-history mirror of the upstream repository.

pub mod history;
pub mod mirror;

pub use history::GitHistory;
pub use mirror::{MirrorError, RepoMirror};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("Repository not found at {path}")]
    RepositoryNotFound { path: String },
    #[error("Branch not found: {branch}")]
    BranchNotFound { branch: String },
    #[error("No commit on {branch} that {trunk} does not already contain")]
    NoBranchOnlyCommits { branch: String, trunk: String },
    #[error("Commit time out of range: {seconds}")]
    InvalidTimestamp { seconds: i64 },
    #[error("git: {0}")]
    Git2(#[from] git2::Error),
    #[error("History worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}
