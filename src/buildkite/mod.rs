//! Buildkite pipeline builds, the source of nightly image records.

pub mod client;
pub mod types;

pub use client::BuildkiteClient;
pub use types::{Build, BuildPage, Job};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildkiteError {
    #[error("An empty Buildkite token was supplied")]
    EmptyToken,
    #[error("Buildkite request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Buildkite returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

/// Paged access to a pipeline's builds, newest first
#[async_trait]
pub trait BuildSource: Send + Sync {
    /// Pages are numbered from 1
    async fn builds_page(&self, page: u32) -> Result<BuildPage, BuildkiteError>;
}
