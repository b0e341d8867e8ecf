use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

#[derive(Parser)]
#[command(name = "rw-release-report")]
#[command(about = "Release timeline and nightly changelog reports for RisingWave")]
#[command(long_about = "Builds two reports from the upstream repository: a release timeline \
                       (when each release-X.Y branch was cut, released and last touched) rendered \
                       as an SVG chart plus a Markdown table, and a changelog of trunk commits \
                       grouped by nightly image.")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Chart every release branch from cut to last commit
    Timeline {
        /// Output chart; the Markdown table is written next to it with a .md extension
        #[arg(short, long, default_value = "release_timeline.svg")]
        out: PathBuf,
        /// Existing full-history checkout to read instead of cloning
        #[arg(long, help = "Path to a local checkout used instead of a temporary clone")]
        mirror: Option<PathBuf>,
        /// Branches resolved concurrently
        #[arg(long, help = "Override timeline.max_workers")]
        workers: Option<usize>,
    },
    /// List nightly images and the trunk commits each one introduced
    Changelog {
        /// Stop paging Buildkite once nightlies older than this date (YYYYMMDD) are reached
        #[arg(long, value_parser = parse_nightly_date)]
        earliest: Option<String>,
        /// Write the changelog to a file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Print the effective configuration with credentials masked
    ShowConfig,
}

fn parse_nightly_date(value: &str) -> Result<String, String> {
    if value.len() != 8 {
        return Err(format!("expected YYYYMMDD, got '{value}'"));
    }
    chrono::NaiveDate::parse_from_str(value, "%Y%m%d")
        .map(|_| value.to_string())
        .map_err(|e| format!("expected YYYYMMDD, got '{value}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_timeline_defaults() {
        let cli = Cli::try_parse_from(["rw-release-report", "timeline"]).unwrap();
        match cli.command {
            Commands::Timeline { out, mirror, workers } => {
                assert_eq!(out, PathBuf::from("release_timeline.svg"));
                assert!(mirror.is_none());
                assert!(workers.is_none());
            }
            _ => panic!("expected timeline"),
        }
    }

    #[test]
    fn test_changelog_earliest_is_validated() {
        assert!(Cli::try_parse_from(["rw-release-report", "changelog", "--earliest", "20240901"]).is_ok());
        assert!(Cli::try_parse_from(["rw-release-report", "changelog", "--earliest", "2024-09-01"]).is_err());
        assert!(Cli::try_parse_from(["rw-release-report", "changelog", "--earliest", "20241341"]).is_err());
    }
}
