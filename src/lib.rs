// RisingWave release reports
// Exposes the report pipeline for the binary and for integration tests

pub mod buildkite;
pub mod changelog;
pub mod cli;
pub mod config;
pub mod git;
pub mod github;
pub mod report;
pub mod telemetry;
pub mod timeline;

// Re-export key types for easy access
pub use buildkite::{BuildSource, BuildkiteClient, BuildkiteError};
pub use changelog::{build_changelog, ChangelogError, ChangelogOptions, CommitFeed, NightlyBuild};
pub use config::{ConfigError, ReportConfig};
pub use git::{GitError, GitHistory, MirrorError, RepoMirror};
pub use github::{CommitSummary, GitHubClient, GitHubError};
pub use report::{render_markdown, render_svg, SvgLayout};
pub use telemetry::{generate_correlation_id, init_telemetry, shutdown_telemetry};
pub use timeline::{
    AggregatorOptions, BranchAggregator, BranchId, BranchRecord, DateField, EstimateBasis,
    HistoryProvider, ReleaseRegistry, ReleaseTag, ReleaseVersion, TagFilter,
};
