//! # Portfolio - project portfolio store
//!
//! Keeps structured "project portfolio" records in a local SQLite database
//! and can seed new records from a GitHub repository.
//!
//! Portfolio provides:
//! - A normalized schema: one project header plus one table per section
//! - A record codec between section documents and flat rows
//! - A GitHub extractor (languages, branches, commits, README heuristics)
//! - Request handlers exposed as tools over MCP stdio and HTTP

pub mod section;
pub mod codec;
pub mod storage;
pub mod github;
pub mod template;
pub mod service;
pub mod tools;
pub mod server;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use section::SectionKind;
pub use storage::SqliteStore;
pub use service::ProjectService;
pub use github::{GitHubApi, GitHubClient, GitHubExtractor};

/// Result type alias for Portfolio operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Portfolio operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid repository URL: {0}")]
    InvalidRepositoryUrl(String),

    #[error("Repository unreachable: {0}")]
    RepositoryUnreachable(String),

    #[error("README parse failure: {0}")]
    ReadmeParseFailure(String),

    #[error("Malformed record in {section}.{column}: {reason}")]
    MalformedRecord {
        section: &'static str,
        column: &'static str,
        reason: String,
    },

    #[error("Invalid data for {section}.{field}: {reason}")]
    InvalidSectionData {
        section: &'static str,
        field: &'static str,
        reason: String,
    },

    #[error("Unknown section: {0}")]
    UnknownSection(String),

    #[error("Project not found: {0}")]
    ProjectNotFound(i64),

    #[error("HTTP client error: {0}")]
    Client(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
