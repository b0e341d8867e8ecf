use async_trait::async_trait;
use tracing::{debug, warn};

use super::nightly::NightlyBuild;
use crate::github::{CommitSummary, GitHubClient, GitHubError};

/// Paged trunk history, newest commit first
#[async_trait]
pub trait CommitFeed: Send + Sync {
    /// Pages are numbered from 1; an empty page means history is exhausted
    async fn commit_page(&self, branch: &str, page: u32) -> Result<Vec<CommitSummary>, GitHubError>;

    /// Browser URL of the repository, used for commit, PR and compare links
    fn html_url(&self) -> String;
}

#[async_trait]
impl CommitFeed for GitHubClient {
    async fn commit_page(&self, branch: &str, page: u32) -> Result<Vec<CommitSummary>, GitHubError> {
        self.list_commits(branch, page).await
    }

    fn html_url(&self) -> String {
        GitHubClient::html_url(self)
    }
}

/// Collapsible list of every nightly, newest first
pub fn render_nightly_list(nightlies: &[NightlyBuild]) -> String {
    let mut out = String::new();
    out.push_str("# Nightly builds\n");
    out.push_str("<details><summary>list of all night builds</summary>\n\n");
    for nightly in nightlies {
        out.push_str(&format!("- `{}` `{}`\n", nightly.date, nightly.commit));
    }
    out.push_str("</details>\n\n");
    out
}

/// Trunk history grouped under the nightly that first shipped each commit.
///
/// A `## nightly-<date>` heading goes before the nightly's own commit, so a
/// section lists exactly what that image contains beyond the previous one.
/// The walk ends right after the oldest nightly's commit, or when history
/// runs out; nightlies never met are reported in the log.
pub async fn render_commit_history(
    feed: &dyn CommitFeed,
    trunk: &str,
    nightlies: &[NightlyBuild],
) -> Result<String, GitHubError> {
    let repo_url = feed.html_url();
    let mut out = String::new();
    out.push_str("# Commit history\n\n");
    out.push_str("> [!TIP]\n");
    out.push_str("> A release's SHA is the first commit's SHA listed in its section.\n\n");
    out.push_str("## Unreleased\n");

    let mut placed = 0;
    let mut page = 1;
    'walk: while placed < nightlies.len() {
        let commits = feed.commit_page(trunk, page).await?;
        debug!(page, commits = commits.len(), "Fetched trunk history page");
        if commits.is_empty() {
            break;
        }

        for commit in &commits {
            if commit.sha == nightlies[placed].commit {
                out.push_str(&format!("\n## nightly-{}\n", nightlies[placed].date));
                if let Some(previous) = nightlies.get(placed + 1) {
                    out.push_str(&format!(
                        "[compare changes with previous nightly build]({repo_url}/compare/{}...{})\n",
                        previous.commit, commit.sha
                    ));
                }
                placed += 1;
            }
            out.push_str(&commit_line(&repo_url, commit));
            if placed == nightlies.len() {
                break 'walk;
            }
        }
        page += 1;
    }

    if placed < nightlies.len() {
        warn!(
            missing = nightlies.len() - placed,
            next = %nightlies[placed].commit,
            "Trunk history ended before every nightly commit was found"
        );
    }
    Ok(out)
}

fn commit_line(repo_url: &str, commit: &CommitSummary) -> String {
    let link = match commit.pr_number() {
        Some(number) => format!("{repo_url}/pull/{number}"),
        None => format!("{repo_url}/commit/{}", commit.sha),
    };
    format!("- `{}` [{}]({link})\n", commit.sha, commit.title())
}
