pub mod client;
pub mod errors;
pub mod types;

pub use client::GitHubClient;
pub use errors::GitHubError;
pub use types::CommitSummary;
