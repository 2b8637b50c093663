//! Database schema definitions

use crate::section::SectionKind;

/// SQL to create the projects table
pub const CREATE_PROJECTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
"#;

/// Connection pragmas, applied on every open
pub const PRAGMAS: &str = "PRAGMA foreign_keys = ON;";

/// All schema creation statements, parent table first
pub fn all_schema_statements() -> Vec<String> {
    let mut stmts = vec![CREATE_PROJECTS_TABLE.to_string()];
    stmts.extend(SectionKind::all().iter().map(|kind| kind.create_table_sql()));
    stmts
}

/// Statements dropping every table, children before the parent
pub fn drop_statements() -> Vec<String> {
    let mut stmts: Vec<String> = SectionKind::all()
        .iter()
        .map(|kind| format!("DROP TABLE IF EXISTS {}", kind.table()))
        .collect();
    stmts.push("DROP TABLE IF EXISTS projects".to_string());
    stmts
}
