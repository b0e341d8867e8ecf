use async_trait::async_trait;
use reqwest::header::{HeaderMap, LINK};
use reqwest::Url;
use tracing::debug;

use super::types::{Build, BuildPage};
use super::{BuildSource, BuildkiteError};
use crate::config::BuildkiteConfig;

const API_BASE: &str = "https://api.buildkite.com";

/// Read-only Buildkite REST client for one pipeline
#[derive(Debug, Clone)]
pub struct BuildkiteClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    organization: String,
    pipeline: String,
}

impl BuildkiteClient {
    pub fn new(config: &BuildkiteConfig, token: &str) -> Result<Self, BuildkiteError> {
        Self::with_base_url(API_BASE, config, token)
    }

    /// Point the client at another API host (tests, proxies)
    pub fn with_base_url(
        base_url: &str,
        config: &BuildkiteConfig,
        token: &str,
    ) -> Result<Self, BuildkiteError> {
        if token.is_empty() {
            return Err(BuildkiteError::EmptyToken);
        }
        let http = reqwest::Client::builder()
            .user_agent(concat!("rw-release-report/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            organization: config.organization.clone(),
            pipeline: config.pipeline.clone(),
        })
    }

    fn builds_url(&self) -> String {
        format!(
            "{}/v2/organizations/{}/pipelines/{}/builds",
            self.base_url, self.organization, self.pipeline
        )
    }
}

#[async_trait]
impl BuildSource for BuildkiteClient {
    async fn builds_page(&self, page: u32) -> Result<BuildPage, BuildkiteError> {
        debug!(page, pipeline = %self.pipeline, "Buildkite GET builds");
        let response = self
            .http
            .get(self.builds_url())
            .query(&[("page", page)])
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BuildkiteError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let next_page = next_page(response.headers());
        let builds: Vec<Build> = response.json().await?;
        Ok(BuildPage { builds, next_page })
    }
}

/// `page` of the `rel="next"` entry in a `Link` header
fn next_page(headers: &HeaderMap) -> Option<u32> {
    let link = headers.get(LINK)?.to_str().ok()?;
    link.split(',').find_map(|entry| {
        let mut parts = entry.split(';');
        let target = parts.next()?.trim().strip_prefix('<')?.strip_suffix('>')?;
        if !parts.any(|param| param.trim() == r#"rel="next""#) {
            return None;
        }
        let url = Url::parse(target).ok()?;
        url.query_pairs()
            .find(|(key, _)| key == "page")
            .and_then(|(_, value)| value.parse().ok())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers(link: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(LINK, HeaderValue::from_str(link).unwrap());
        headers
    }

    #[test]
    fn test_next_page_from_link_header() {
        let link = r#"<https://api.buildkite.com/v2/organizations/o/pipelines/p/builds?page=3&per_page=30>; rel="next", <https://api.buildkite.com/v2/organizations/o/pipelines/p/builds?page=9&per_page=30>; rel="last""#;
        assert_eq!(next_page(&headers(link)), Some(3));
    }

    #[test]
    fn test_last_page_has_no_next() {
        let link = r#"<https://api.buildkite.com/v2/organizations/o/pipelines/p/builds?page=1>; rel="first", <https://api.buildkite.com/v2/organizations/o/pipelines/p/builds?page=8>; rel="prev""#;
        assert_eq!(next_page(&headers(link)), None);
        assert_eq!(next_page(&HeaderMap::new()), None);
    }

    #[test]
    fn test_empty_token_is_rejected() {
        let config = crate::config::ReportConfig::default().buildkite;
        assert!(matches!(
            BuildkiteClient::new(&config, ""),
            Err(BuildkiteError::EmptyToken)
        ));
    }
}
