use async_trait::async_trait;
use chrono::{DateTime, Utc};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use moka::future::Cache;
use octocrab::Octocrab;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::debug;

use super::errors::GitHubError;
use super::types::{BranchPayload, CommitPayload, CommitSummary, PageQuery, ReleasePayload};
use crate::config::{GitHubConfig, RateLimitConfig};
use crate::timeline::{release_branches, BranchId, ReleaseRegistry, ReleaseTag};

const PER_PAGE: u8 = 100;
const RELEASES_KEY: &str = "releases";

/// Read-only GitHub REST client for one repository.
///
/// Requests go through a shared rate limiter so concurrent branch workers
/// stay inside the API quota; the full release list is fetched at most once
/// per client and shared by every caller.
#[derive(Debug)]
pub struct GitHubClient {
    octocrab: Octocrab,
    owner: String,
    repo: String,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
    releases: Cache<String, Arc<Vec<ReleaseTag>>>,
}

impl GitHubClient {
    pub fn new(config: &GitHubConfig, token: &str) -> Result<Self, GitHubError> {
        if token.is_empty() {
            return Err(GitHubError::TokenNotFound(
                "An empty GitHub token was supplied".to_string(),
            ));
        }

        let mut builder = Octocrab::builder().personal_token(token.to_string());
        if let Some(api_url) = config.api_url.as_deref() {
            builder = builder.base_uri(api_url)?;
        }
        let octocrab = builder.build()?;

        Ok(Self::with_octocrab(
            octocrab,
            &config.owner,
            &config.repo,
            &config.rate_limit,
        ))
    }

    /// Wrap an already-configured octocrab instance (custom base URI, tests)
    pub fn with_octocrab(
        octocrab: Octocrab,
        owner: &str,
        repo: &str,
        rate_limit: &RateLimitConfig,
    ) -> Self {
        let per_second = NonZeroU32::new(rate_limit.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(rate_limit.burst_capacity).unwrap_or(per_second);
        let quota = Quota::per_second(per_second).allow_burst(burst);

        Self {
            octocrab,
            owner: owner.to_string(),
            repo: repo.to_string(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
            releases: Cache::builder().max_capacity(1).build(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    pub fn html_url(&self) -> String {
        format!("https://github.com/{}/{}", self.owner, self.repo)
    }

    async fn get<R, P>(&self, route: &str, query: Option<&P>) -> Result<R, GitHubError>
    where
        R: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        self.rate_limiter.until_ready().await;
        debug!(route, "GitHub GET");
        self.octocrab
            .get(route, query)
            .await
            .map_err(|err| {
                if GitHubError::is_not_found(&err) {
                    GitHubError::NotFound {
                        resource: route.to_string(),
                    }
                } else {
                    GitHubError::ApiError(err)
                }
            })
    }

    /// Walk a paged list endpoint to the end
    async fn get_all_pages<T: DeserializeOwned>(&self, route: &str) -> Result<Vec<T>, GitHubError> {
        let mut items = Vec::new();
        let mut page = 1;
        loop {
            let query = PageQuery {
                per_page: PER_PAGE,
                page,
                sha: None,
            };
            let batch: Vec<T> = self.get(route, Some(&query)).await?;
            let last_page = batch.len() < usize::from(PER_PAGE);
            items.extend(batch);
            if last_page {
                return Ok(items);
            }
            page += 1;
        }
    }

    pub async fn list_branch_names(&self) -> Result<Vec<String>, GitHubError> {
        let route = format!("/repos/{}/{}/branches", self.owner, self.repo);
        let branches: Vec<BranchPayload> = self.get_all_pages(&route).await?;
        Ok(branches.into_iter().map(|b| b.name).collect())
    }

    /// `release-<major>.<minor>` branches, ordered by version
    pub async fn list_release_branches(&self) -> Result<Vec<BranchId>, GitHubError> {
        Ok(release_branches(self.list_branch_names().await?))
    }

    /// Published releases in registry order, drafts excluded
    pub async fn list_releases(&self) -> Result<Vec<ReleaseTag>, GitHubError> {
        let route = format!("/repos/{}/{}/releases", self.owner, self.repo);
        let releases: Vec<ReleasePayload> = self.get_all_pages(&route).await?;
        Ok(releases
            .into_iter()
            .filter(|release| !release.draft)
            .filter_map(|release| {
                let created_at = release.created_at?;
                Some(ReleaseTag::new(release.tag_name, created_at))
            })
            .collect())
    }

    pub async fn head_commit(&self, branch: &str) -> Result<CommitPayload, GitHubError> {
        let route = format!("/repos/{}/{}/commits/{}", self.owner, self.repo, branch);
        self.get(&route, None::<&()>).await
    }

    /// One page of history reachable from `sha`, newest first
    pub async fn list_commits(&self, sha: &str, page: u32) -> Result<Vec<CommitSummary>, GitHubError> {
        let route = format!("/repos/{}/{}/commits", self.owner, self.repo);
        let query = PageQuery {
            per_page: PER_PAGE,
            page,
            sha: Some(sha),
        };
        let commits: Vec<CommitPayload> = self.get(&route, Some(&query)).await?;
        Ok(commits.into_iter().map(CommitSummary::from).collect())
    }
}

#[async_trait]
impl ReleaseRegistry for GitHubClient {
    async fn releases(&self) -> Result<Arc<Vec<ReleaseTag>>, GitHubError> {
        self.releases
            .try_get_with(RELEASES_KEY.to_string(), async {
                self.list_releases().await.map(Arc::new)
            })
            .await
            .map_err(|shared| GitHubError::SharedFailure(shared.headline()))
    }

    async fn branch_head_date(&self, branch: &str) -> Result<DateTime<Utc>, GitHubError> {
        let head = self.head_commit(branch).await?;
        head.commit
            .author
            .and_then(|author| author.date)
            .ok_or_else(|| GitHubError::MissingField {
                resource: format!("head of {branch}"),
                field: "commit.author.date",
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GitHubClient {
        let config = crate::config::ReportConfig::default();
        GitHubClient::new(&config.github, "test-token").unwrap()
    }

    #[tokio::test]
    async fn test_empty_token_is_rejected() {
        let config = crate::config::ReportConfig::default();
        let result = GitHubClient::new(&config.github, "");
        assert!(matches!(result, Err(GitHubError::TokenNotFound(_))));
    }

    #[tokio::test]
    async fn test_html_url_uses_configured_repository() {
        let client = client();
        assert_eq!(client.owner(), "risingwavelabs");
        assert_eq!(client.repo(), "risingwave");
        assert_eq!(client.html_url(), "https://github.com/risingwavelabs/risingwave");
    }

    #[tokio::test]
    async fn test_zero_rate_limit_falls_back_to_minimum() {
        let octocrab = Octocrab::builder().build().unwrap();
        let limits = RateLimitConfig {
            requests_per_second: 0,
            burst_capacity: 0,
        };
        let client = GitHubClient::with_octocrab(octocrab, "o", "r", &limits);
        assert!(client.rate_limiter.check().is_ok());
    }
}
