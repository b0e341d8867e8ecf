use anyhow::{Context, Result};
use std::path::PathBuf;

use super::Command;
use crate::buildkite::BuildkiteClient;
use crate::changelog::{build_changelog, ChangelogOptions};
use crate::config::ReportConfig;
use crate::github::GitHubClient;

pub struct ChangelogCommand {
    pub earliest: Option<String>,
    pub out: Option<PathBuf>,
}

impl Command for ChangelogCommand {
    async fn execute(&self, config: &ReportConfig) -> Result<()> {
        let github_token = config.github_token("changelog")?;
        let buildkite_token = config.buildkite_token("changelog")?;

        let github = GitHubClient::new(&config.github, github_token)?;
        let buildkite = BuildkiteClient::new(&config.buildkite, buildkite_token)?;

        let mut options = ChangelogOptions::from_config(&config.buildkite, &config.github.trunk);
        if let Some(earliest) = &self.earliest {
            options.earliest = earliest.clone();
        }

        eprintln!(
            "🌙 Collecting nightly builds of {}/{} back to {}...",
            config.buildkite.organization, config.buildkite.pipeline, options.earliest
        );
        let changelog = build_changelog(&buildkite, &github, &options).await?;

        match &self.out {
            Some(path) => {
                tokio::fs::write(path, changelog)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                eprintln!("✅ Saved {}", path.display());
            }
            None => print!("{changelog}"),
        }
        Ok(())
    }
}
