//! Combined repository extraction
//!
//! Repository-level lookups (metadata, languages, branches, commits) are
//! required: any failure there fails the extraction. README mining is best
//! effort and always ends in a [`ReadmeOutcome`].

use std::sync::Arc;
use serde::Serialize;
use serde_json::{json, Value};

use super::readme::{ReadmeInsights, ReadmeScanner};
use super::{GitHubApi, RepoRef};
use crate::codec::Fragment;
use crate::{Error, Result};

const FRONTEND: &[&str] = &["javascript", "typescript", "html", "css", "react", "vue", "angular"];
const BACKEND: &[&str] = &["python", "java", "go", "ruby", "php", "node"];
const DATABASE: &[&str] = &["sql", "mysql", "postgresql", "mongodb"];

/// Bucket a language falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageBucket {
    Frontend,
    Backend,
    Database,
    Other,
}

impl LanguageBucket {
    /// Classify a language name, case-insensitively, first match wins
    pub fn of(language: &str) -> Self {
        let lower = language.to_lowercase();
        let lower = lower.as_str();
        if FRONTEND.contains(&lower) {
            LanguageBucket::Frontend
        } else if BACKEND.contains(&lower) {
            LanguageBucket::Backend
        } else if DATABASE.contains(&lower) {
            LanguageBucket::Database
        } else {
            LanguageBucket::Other
        }
    }
}

/// Languages grouped by bucket, each in input order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LanguageBuckets {
    pub frontend: Vec<String>,
    pub backend: Vec<String>,
    pub database: Vec<String>,
    pub other: Vec<String>,
}

impl LanguageBuckets {
    pub fn classify<I, S>(languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut buckets = Self::default();
        for language in languages {
            let language = language.into();
            match LanguageBucket::of(&language) {
                LanguageBucket::Frontend => buckets.frontend.push(language),
                LanguageBucket::Backend => buckets.backend.push(language),
                LanguageBucket::Database => buckets.database.push(language),
                LanguageBucket::Other => buckets.other.push(language),
            }
        }
        buckets
    }

    /// The `technicalInfo` fragment produced from these buckets
    pub fn technical_info(&self) -> Fragment {
        let fragment = json!({
            "frontendTech": self.frontend,
            "backendTech": self.backend,
            "database": self.database,
            "deployment": Vec::<String>::new(),
            "otherTools": self.other,
        });
        match fragment {
            Value::Object(map) => map,
            _ => Fragment::new(),
        }
    }
}

/// Result of README mining
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ReadmeOutcome {
    /// README fetched and scanned
    Parsed(ReadmeInsights),
    /// Repository has no README
    Missing,
    /// Fetching or scanning failed; README-derived fields are empty
    Fallback { cause: String },
}

impl ReadmeOutcome {
    /// Insights, empty unless the README was parsed
    pub fn insights(&self) -> ReadmeInsights {
        match self {
            ReadmeOutcome::Parsed(insights) => insights.clone(),
            _ => ReadmeInsights::default(),
        }
    }
}

/// Everything extracted from one repository
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Extraction {
    pub repository: RepoRef,
    pub github_info: Fragment,
    pub technical_info: Fragment,
    pub languages: LanguageBuckets,
    pub readme: ReadmeOutcome,
}

/// Runs repository lookups and README mining through an injected client
#[derive(Clone)]
pub struct GitHubExtractor {
    client: Arc<dyn GitHubApi>,
}

impl GitHubExtractor {
    pub fn new(client: Arc<dyn GitHubApi>) -> Self {
        Self { client }
    }

    /// Extract repository information for `url`.
    ///
    /// Fails with `InvalidRepositoryUrl` or `RepositoryUnreachable`; README
    /// problems never fail the extraction.
    pub async fn extract(&self, url: &str) -> Result<Extraction> {
        let repo = RepoRef::parse(url)?;
        tracing::info!("Extracting repository info for {}", repo);

        let metadata = self.client.repository(&repo).await.map_err(unreachable)?;
        tracing::debug!("Found repository {}", metadata.full_name);

        let languages = self.client.languages(&repo).await.map_err(unreachable)?;
        let branches = self.client.branches(&repo).await.map_err(unreachable)?;
        let commits = self.client.commit_count(&repo).await.map_err(unreachable)?;

        let buckets = LanguageBuckets::classify(languages.into_iter().map(|(name, _)| name));

        let mut github_info = Fragment::new();
        github_info.insert("repositoryUrl".to_string(), Value::String(url.trim().to_string()));
        github_info.insert("branchStructure".to_string(), Value::String(branches.join(", ")));
        github_info.insert("contributionStats".to_string(), Value::String(format!("Total commits: {}", commits)));

        let readme = self.mine_readme(&repo).await;

        Ok(Extraction {
            repository: repo,
            github_info,
            technical_info: buckets.technical_info(),
            languages: buckets,
            readme,
        })
    }

    async fn mine_readme(&self, repo: &RepoRef) -> ReadmeOutcome {
        let text = match self.client.readme(repo).await {
            Ok(Some(text)) => text,
            Ok(None) => {
                tracing::debug!("{} has no README", repo);
                return ReadmeOutcome::Missing;
            }
            Err(e) => return fallback(repo, e),
        };

        match ReadmeScanner::new() {
            Ok(scanner) => {
                let insights = scanner.scan(&text);
                tracing::debug!(
                    "README of {}: {} tech mentions, {} features, {} challenges",
                    repo,
                    insights.tech_stack.len(),
                    insights.features.len(),
                    insights.challenges.len()
                );
                ReadmeOutcome::Parsed(insights)
            }
            Err(e) => fallback(repo, e),
        }
    }
}

fn fallback(repo: &RepoRef, error: Error) -> ReadmeOutcome {
    tracing::warn!("README extraction for {} failed, continuing without it: {}", repo, error);
    ReadmeOutcome::Fallback { cause: error.to_string() }
}

/// Normalize repository-level failures
fn unreachable(error: Error) -> Error {
    match error {
        Error::RepositoryUnreachable(_) => error,
        other => Error::RepositoryUnreachable(other.to_string()),
    }
}
