//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - projects(id, created_at, updated_at)
//! - one table per section (basic_info, technical_info, ...), keyed by project_id

pub mod schema;
pub mod sqlite;

pub use sqlite::{SqliteStore, ProjectHeader, ProjectSummary, DbStats};
