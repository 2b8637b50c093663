//! GitHub Extractor - repository metadata and README heuristics
//!
//! The extractor talks to GitHub through the [`GitHubApi`] trait so callers
//! can pass in the real REST client or a test double.
//!
//! - `url`: repository URL parsing
//! - `client`: REST client (reqwest)
//! - `readme`: best-effort README text mining
//! - `extractor`: language bucketing and the combined extraction

pub mod url;
pub mod client;
pub mod readme;
pub mod extractor;

pub use url::RepoRef;
pub use client::{GitHubClient, GitHubClientOptions};
pub use readme::{ReadmeScanner, ReadmeInsights, Challenge, CANNED_SOLUTION};
pub use extractor::{GitHubExtractor, Extraction, LanguageBuckets, ReadmeOutcome};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::Result;

/// Basic repository metadata, fetched first to confirm the repository is reachable
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepoMetadata {
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub default_branch: Option<String>,
}

/// Read-only view of the GitHub REST API used by the extractor.
///
/// Repository-level failures are reported as `Error::RepositoryUnreachable`;
/// README failures as `Error::ReadmeParseFailure`.
#[async_trait]
pub trait GitHubApi: Send + Sync {
    /// Look up the repository itself
    async fn repository(&self, repo: &RepoRef) -> Result<RepoMetadata>;

    /// Language name and byte count, largest first
    async fn languages(&self, repo: &RepoRef) -> Result<Vec<(String, u64)>>;

    /// All branch names
    async fn branches(&self, repo: &RepoRef) -> Result<Vec<String>>;

    /// Total number of commits on the default branch
    async fn commit_count(&self, repo: &RepoRef) -> Result<u64>;

    /// Decoded README text, `None` if the repository has no README
    async fn readme(&self, repo: &RepoRef) -> Result<Option<String>>;
}
