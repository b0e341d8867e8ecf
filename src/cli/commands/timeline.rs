use anyhow::{Context, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

use super::Command;
use crate::config::ReportConfig;
use crate::git::{GitHistory, RepoMirror};
use crate::github::GitHubClient;
use crate::report::{render_markdown, render_svg, SvgLayout};
use crate::timeline::{AggregatorOptions, BranchAggregator, BranchRecord, ReleaseRegistry};

pub struct TimelineCommand {
    pub out: PathBuf,
    pub mirror: Option<PathBuf>,
    pub workers: Option<usize>,
}

impl TimelineCommand {
    /// Markdown table path: the chart path with an `.md` extension
    pub fn markdown_path(&self) -> PathBuf {
        self.out.with_extension("md")
    }

    async fn write_reports(&self, records: &[BranchRecord]) -> Result<()> {
        let svg = render_svg(records, &SvgLayout::default()).context("Failed to render timeline chart")?;
        write_file(&self.out, svg).await?;

        let image = self
            .out
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.out.display().to_string());
        let markdown = render_markdown(records, &image, Utc::now().date_naive());
        write_file(&self.markdown_path(), markdown).await
    }
}

impl Command for TimelineCommand {
    async fn execute(&self, config: &ReportConfig) -> Result<()> {
        // Credentials are checked before any network or disk work
        let token = config.github_token("timeline")?;
        let client = Arc::new(GitHubClient::new(&config.github, token)?);

        eprintln!(
            "🔍 Discovering release branches in {}/{}...",
            client.owner(),
            client.repo()
        );
        let branches = client
            .list_release_branches()
            .await
            .context("Failed to list release branches")?;
        eprintln!("   📋 Found {} release branches", branches.len());

        let local = self.mirror.as_deref().or(config.timeline.local_mirror.as_deref());
        let mirror = RepoMirror::acquire(local, &config.timeline.clone_url)
            .await
            .context("Failed to prepare repository mirror")?;
        if mirror.is_temporary() {
            eprintln!("   📦 Cloned temporary mirror to {}", mirror.path().display());
        }

        let mut options = AggregatorOptions::from_config(&config.timeline, Utc::now());
        if let Some(workers) = self.workers {
            options = options.with_max_workers(workers);
        }
        let registry: Arc<dyn ReleaseRegistry> = client;
        let history = Arc::new(GitHistory::new(mirror.path(), config.github.trunk.as_str()));

        eprintln!("⏳ Resolving {} branches with {} workers...", branches.len(), options.worker_count());
        let records = BranchAggregator::new(registry, history, options)
            .aggregate(branches)
            .await;

        if let Err(err) = mirror.release() {
            warn!(error = %err, "Temporary mirror cleanup failed");
        }

        let estimated = records
            .iter()
            .filter(|r| r.branch_creation.is_some_and(|c| c.is_estimated()))
            .count();
        if estimated > 0 {
            eprintln!("   ⚠️  {estimated} branch creation dates are estimates");
        }

        self.write_reports(&records).await?;
        eprintln!(
            "✅ Saved {} and {}",
            self.out.display(),
            self.markdown_path().display()
        );
        Ok(())
    }
}

async fn write_file(path: &Path, contents: String) -> Result<()> {
    tokio::fs::write(path, contents)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}
