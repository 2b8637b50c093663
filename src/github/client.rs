//! GitHub REST client

use async_trait::async_trait;
use base64::Engine;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

use super::{GitHubApi, RepoMetadata, RepoRef};
use crate::{Error, Result};

/// Default GitHub REST endpoint
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Page size for paginated listings
const PER_PAGE: usize = 100;

/// Upper bound on pages fetched for one listing
const MAX_PAGES: usize = 50;

/// Connection settings for [`GitHubClient`]
#[derive(Debug, Clone)]
pub struct GitHubClientOptions {
    pub token: Option<String>,
    pub api_base: String,
    pub user_agent: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for GitHubClientOptions {
    fn default() -> Self {
        Self {
            token: None,
            api_base: DEFAULT_API_BASE.to_string(),
            user_agent: format!("portfolio/{}", env!("CARGO_PKG_VERSION")),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(20),
        }
    }
}

/// README content response
#[derive(Debug, Deserialize)]
struct ReadmeResponse {
    content: String,
    encoding: String,
}

/// Branch listing entry
#[derive(Debug, Deserialize)]
struct BranchResponse {
    name: String,
}

/// GitHub API client
#[derive(Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
    token: Option<String>,
    api_base: String,
}

impl GitHubClient {
    pub fn new(options: GitHubClientOptions) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(options.user_agent)
            .connect_timeout(options.connect_timeout)
            .timeout(options.request_timeout)
            .build()
            .map_err(|e| Error::Client(e.to_string()))?;

        Ok(Self {
            client,
            token: options.token.filter(|t| !t.is_empty()),
            api_base: options.api_base.trim_end_matches('/').to_string(),
        })
    }

    /// Build REST request with auth header if token available
    fn request(&self, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.api_base, path);
        let mut req = self.client.get(url);
        if let Some(token) = &self.token {
            req = req.header("Authorization", format!("Bearer {}", token));
        }
        req.header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }

    /// Send a GET request, mapping transport errors to `RepositoryUnreachable`
    async fn send(&self, path: &str) -> Result<reqwest::Response> {
        let start = std::time::Instant::now();
        let result = self.request(path).send().await;
        tracing::debug!("GET {} ... {}ms", path, start.elapsed().as_millis());

        result.map_err(|e| {
            let mut details = e.to_string();
            if e.is_timeout() {
                details.push_str(" [TIMEOUT]");
            } else if e.is_connect() {
                details.push_str(" [CONNECT]");
            }
            Error::RepositoryUnreachable(details)
        })
    }

    /// GET and require a success status
    async fn get_ok(&self, path: &str) -> Result<reqwest::Response> {
        let response = self.send(path).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::RepositoryUnreachable(describe_status(status, path)));
        }
        Ok(response)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.get_ok(path)
            .await?
            .json::<T>()
            .await
            .map_err(|e| Error::RepositoryUnreachable(format!("Failed to parse {}: {}", path, e)))
    }
}

#[async_trait]
impl GitHubApi for GitHubClient {
    async fn repository(&self, repo: &RepoRef) -> Result<RepoMetadata> {
        self.get_json(&format!("/repos/{}", repo.full_name())).await
    }

    async fn languages(&self, repo: &RepoRef) -> Result<Vec<(String, u64)>> {
        let raw: serde_json::Map<String, serde_json::Value> = self
            .get_json(&format!("/repos/{}/languages", repo.full_name()))
            .await?;

        let mut languages: Vec<(String, u64)> = raw
            .into_iter()
            .map(|(name, bytes)| (name, bytes.as_u64().unwrap_or(0)))
            .collect();
        languages.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(languages)
    }

    async fn branches(&self, repo: &RepoRef) -> Result<Vec<String>> {
        let mut names = Vec::new();

        for page in 1..=MAX_PAGES {
            let path = format!(
                "/repos/{}/branches?per_page={}&page={}",
                repo.full_name(),
                PER_PAGE,
                page
            );
            let batch: Vec<BranchResponse> = self.get_json(&path).await?;
            let count = batch.len();
            names.extend(batch.into_iter().map(|b| b.name));

            if count < PER_PAGE {
                break;
            }
        }

        Ok(names)
    }

    async fn commit_count(&self, repo: &RepoRef) -> Result<u64> {
        let path = format!("/repos/{}/commits?per_page=1", repo.full_name());
        let response = self.send(&path).await?;
        let status = response.status();

        // Empty repositories answer 409 Conflict
        if status == StatusCode::CONFLICT {
            return Ok(0);
        }
        if !status.is_success() {
            return Err(Error::RepositoryUnreachable(describe_status(status, &path)));
        }

        let last_page = response
            .headers()
            .get(reqwest::header::LINK)
            .and_then(|h| h.to_str().ok())
            .and_then(last_page_from_link);

        if let Some(count) = last_page {
            return Ok(count);
        }

        // No pagination: the single page holds every commit
        let commits: Vec<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| Error::RepositoryUnreachable(format!("Failed to parse {}: {}", path, e)))?;
        Ok(commits.len() as u64)
    }

    async fn readme(&self, repo: &RepoRef) -> Result<Option<String>> {
        let path = format!("/repos/{}/readme", repo.full_name());
        let response = self
            .send(&path)
            .await
            .map_err(|e| Error::ReadmeParseFailure(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Error::ReadmeParseFailure(describe_status(response.status(), &path)));
        }

        let readme: ReadmeResponse = response
            .json()
            .await
            .map_err(|e| Error::ReadmeParseFailure(format!("Failed to parse README response: {}", e)))?;

        decode_readme(&readme.content, &readme.encoding).map(Some)
    }
}

/// Decode README content as returned by the contents API
fn decode_readme(content: &str, encoding: &str) -> Result<String> {
    if encoding != "base64" {
        return Err(Error::ReadmeParseFailure(format!("Unsupported README encoding: {}", encoding)));
    }

    // GitHub sends base64 with embedded newlines
    let cleaned: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(cleaned)
        .map_err(|e| Error::ReadmeParseFailure(format!("Base64 decode error: {}", e)))?;

    String::from_utf8(decoded)
        .map_err(|e| Error::ReadmeParseFailure(format!("UTF-8 decode error: {}", e)))
}

fn describe_status(status: StatusCode, path: &str) -> String {
    match status {
        StatusCode::NOT_FOUND => format!("GitHub API error {}: {} not found", status, path),
        StatusCode::UNAUTHORIZED => format!("GitHub API error {}: bad credentials", status),
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
            format!("GitHub API error {}: access denied or rate limited", status)
        }
        _ => format!("GitHub API error {} for {}", status, path),
    }
}

/// Extract the `page` number of the `rel="last"` link from a Link header
fn last_page_from_link(link: &str) -> Option<u64> {
    link.split(',')
        .find(|part| part.contains("rel=\"last\""))
        .and_then(|part| {
            let start = part.find('<')? + 1;
            let end = part.find('>')?;
            part.get(start..end)
        })
        .and_then(|url| url.split_once('?').map(|(_, query)| query))
        .and_then(|query| {
            query
                .split('&')
                .filter_map(|pair| pair.split_once('='))
                .find(|(key, _)| *key == "page")
                .and_then(|(_, value)| value.parse().ok())
        })
}
