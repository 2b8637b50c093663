//! SQLite storage implementation

use std::path::Path;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params, params_from_iter, OptionalExtension};
use rusqlite::types::Value as SqlValue;
use serde::Serialize;
use crate::Result;
use crate::codec::SectionRow;
use crate::section::SectionKind;
use super::schema;

/// SQLite-backed storage for project records
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open a database file (creates it and any missing tables)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Create missing tables without touching existing data
    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute_batch(schema::PRAGMAS)?;
        for stmt in schema::all_schema_statements() {
            self.conn.execute(&stmt, [])?;
        }
        Ok(())
    }

    /// Drop and recreate every table.
    ///
    /// Destroys all stored projects. Meant for first-run setup only.
    pub fn initialize(&self) -> Result<()> {
        tracing::warn!("Dropping and recreating all portfolio tables");
        for stmt in schema::drop_statements() {
            self.conn.execute(&stmt, [])?;
        }
        self.initialize_schema()
    }

    // ========== Project Operations ==========

    /// Insert a new project header and return its id
    pub fn create_project(&self, now: DateTime<Utc>) -> Result<i64> {
        let stamp = now.to_rfc3339();
        self.conn.execute(
            "INSERT INTO projects (created_at, updated_at) VALUES (?1, ?2)",
            params![stamp, stamp],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Check whether a project exists
    pub fn project_exists(&self, id: i64) -> Result<bool> {
        let found: Option<i64> = self.conn
            .query_row("SELECT id FROM projects WHERE id = ?1", [id], |row| row.get(0))
            .optional()?;
        Ok(found.is_some())
    }

    /// Get a project header by id
    pub fn get_project_header(&self, id: i64) -> Result<Option<ProjectHeader>> {
        self.conn
            .query_row(
                "SELECT id, created_at, updated_at FROM projects WHERE id = ?1",
                [id],
                |row| Self::row_to_header(row),
            )
            .optional()
            .map_err(Into::into)
    }

    /// Bump a project's updated_at. Returns false if the project does not exist.
    pub fn touch_project(&self, id: i64, now: DateTime<Utc>) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE projects SET updated_at = ?1 WHERE id = ?2",
            params![now.to_rfc3339(), id],
        )?;
        Ok(changed > 0)
    }

    /// List all projects with their names, oldest first
    pub fn list_projects(&self) -> Result<Vec<ProjectSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT p.id, p.created_at, p.updated_at, b.project_name
             FROM projects p LEFT JOIN basic_info b ON b.project_id = p.id
             ORDER BY p.id"
        )?;

        let projects = stmt
            .query_map([], |row| {
                Ok(ProjectSummary {
                    header: Self::row_to_header(row)?,
                    project_name: row.get::<_, Option<String>>(3)?.filter(|n| !n.is_empty()),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(projects)
    }

    /// Count all projects
    pub fn count_projects(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM projects", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Helper to convert a row to a ProjectHeader
    fn row_to_header(row: &rusqlite::Row) -> rusqlite::Result<ProjectHeader> {
        Ok(ProjectHeader {
            id: row.get(0)?,
            created_at: parse_timestamp(row, 1)?,
            updated_at: parse_timestamp(row, 2)?,
        })
    }

    // ========== Section Operations ==========

    /// Insert or replace a section row wholesale
    pub fn upsert_section(&self, project_id: i64, kind: SectionKind, row: &SectionRow) -> Result<()> {
        let fields = kind.fields();
        let columns: Vec<&str> = fields.iter().map(|f| f.column).collect();
        let placeholders: Vec<String> = (1..=fields.len() + 1).map(|i| format!("?{}", i)).collect();

        let sql = format!(
            "INSERT OR REPLACE INTO {} (project_id, {}) VALUES ({})",
            kind.table(),
            columns.join(", "),
            placeholders.join(", ")
        );

        let mut values = Vec::with_capacity(row.len() + 1);
        values.push(SqlValue::Integer(project_id));
        values.extend(row.iter().cloned());

        self.conn.execute(&sql, params_from_iter(values))?;
        Ok(())
    }

    /// Get the raw column values of a section row
    pub fn get_section(&self, project_id: i64, kind: SectionKind) -> Result<Option<SectionRow>> {
        let fields = kind.fields();
        let columns: Vec<&str> = fields.iter().map(|f| f.column).collect();
        let sql = format!(
            "SELECT {} FROM {} WHERE project_id = ?1",
            columns.join(", "),
            kind.table()
        );

        self.conn
            .query_row(&sql, [project_id], |row| {
                (0..fields.len())
                    .map(|i| row.get::<_, SqlValue>(i))
                    .collect::<rusqlite::Result<SectionRow>>()
            })
            .optional()
            .map_err(Into::into)
    }

    /// Count rows in a section table
    pub fn count_sections(&self, kind: SectionKind) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", kind.table());
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }

    // ========== Bulk Operations ==========

    /// Begin a transaction for bulk operations
    pub fn begin_transaction(&mut self) -> Result<()> {
        self.conn.execute("BEGIN TRANSACTION", [])?;
        Ok(())
    }

    /// Commit a transaction
    pub fn commit(&mut self) -> Result<()> {
        self.conn.execute("COMMIT", [])?;
        Ok(())
    }

    /// Rollback a transaction
    pub fn rollback(&mut self) -> Result<()> {
        self.conn.execute("ROLLBACK", [])?;
        Ok(())
    }

    /// Run `f` inside a transaction, rolling back if it fails
    pub fn in_transaction<T>(&mut self, f: impl FnOnce(&Self) -> Result<T>) -> Result<T> {
        self.begin_transaction()?;
        match f(self) {
            Ok(value) => {
                self.commit()?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = self.rollback() {
                    tracing::error!("Rollback failed: {}", rollback_err);
                }
                Err(e)
            }
        }
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        let sections = SectionKind::all()
            .iter()
            .map(|kind| Ok((*kind, self.count_sections(*kind)?)))
            .collect::<Result<Vec<_>>>()?;

        Ok(DbStats {
            projects: self.count_projects()?,
            sections,
        })
    }
}

fn parse_timestamp(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

/// Project header row
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectHeader {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Project header plus display name, for listings
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    #[serde(flatten)]
    pub header: ProjectHeader,
    pub project_name: Option<String>,
}

/// Database statistics
#[derive(Debug, Clone)]
pub struct DbStats {
    pub projects: usize,
    pub sections: Vec<(SectionKind, usize)>,
}

impl std::fmt::Display for DbStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        write!(f, "  Projects: {}", self.projects)?;
        for (kind, count) in &self.sections {
            write!(f, "\n  {}: {}", kind.table(), count)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;
    use serde_json::json;

    fn technical_row() -> SectionRow {
        let doc = json!({
            "frontendTech": ["Flutter", "Dart"],
            "backendTech": ["Python"],
        });
        codec::to_row(SectionKind::TechnicalInfo, doc.as_object().unwrap()).unwrap()
    }

    #[test]
    fn test_project_crud() {
        let store = SqliteStore::open_in_memory().unwrap();

        let now = Utc::now();
        let id = store.create_project(now).unwrap();
        assert!(store.project_exists(id).unwrap());
        assert!(!store.project_exists(id + 1).unwrap());

        let header = store.get_project_header(id).unwrap().unwrap();
        assert_eq!(header.id, id);
        assert_eq!(header.created_at, header.updated_at);
    }

    #[test]
    fn test_ids_are_assigned_incrementally() {
        let store = SqliteStore::open_in_memory().unwrap();
        let first = store.create_project(Utc::now()).unwrap();
        let second = store.create_project(Utc::now()).unwrap();
        assert!(second > first);
    }

    #[test]
    fn test_section_upsert_replaces() {
        let store = SqliteStore::open_in_memory().unwrap();
        let id = store.create_project(Utc::now()).unwrap();

        store.upsert_section(id, SectionKind::TechnicalInfo, &technical_row()).unwrap();
        let empty = codec::to_row(SectionKind::TechnicalInfo, &codec::Fragment::new()).unwrap();
        store.upsert_section(id, SectionKind::TechnicalInfo, &empty).unwrap();

        assert_eq!(store.count_sections(SectionKind::TechnicalInfo).unwrap(), 1);
        let row = store.get_section(id, SectionKind::TechnicalInfo).unwrap().unwrap();
        let doc = codec::from_row(SectionKind::TechnicalInfo, &row).unwrap();
        assert_eq!(doc["frontendTech"], json!([]));
    }

    #[test]
    fn test_missing_section_is_none() {
        let store = SqliteStore::open_in_memory().unwrap();
        let id = store.create_project(Utc::now()).unwrap();
        assert!(store.get_section(id, SectionKind::CodeQuality).unwrap().is_none());
    }

    #[test]
    fn test_section_requires_parent_project() {
        let store = SqliteStore::open_in_memory().unwrap();
        let result = store.upsert_section(42, SectionKind::TechnicalInfo, &technical_row());
        assert!(matches!(result, Err(crate::Error::Storage(_))));
    }

    #[test]
    fn test_touch_project() {
        let store = SqliteStore::open_in_memory().unwrap();
        let created = Utc::now() - chrono::Duration::hours(1);
        let id = store.create_project(created).unwrap();

        assert!(store.touch_project(id, Utc::now()).unwrap());
        assert!(!store.touch_project(id + 100, Utc::now()).unwrap());

        let header = store.get_project_header(id).unwrap().unwrap();
        assert!(header.updated_at > header.created_at);
    }

    #[test]
    fn test_initialize_drops_data() {
        let store = SqliteStore::open_in_memory().unwrap();
        let id = store.create_project(Utc::now()).unwrap();
        store.upsert_section(id, SectionKind::TechnicalInfo, &technical_row()).unwrap();

        store.initialize().unwrap();

        assert_eq!(store.count_projects().unwrap(), 0);
        assert_eq!(store.count_sections(SectionKind::TechnicalInfo).unwrap(), 0);
    }

    #[test]
    fn test_transaction_rolls_back() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let result: Result<()> = store.in_transaction(|s| {
            s.create_project(Utc::now())?;
            Err(crate::Error::Template("boom".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(store.count_projects().unwrap(), 0);
    }

    #[test]
    fn test_list_projects_and_stats() {
        let store = SqliteStore::open_in_memory().unwrap();
        let named = store.create_project(Utc::now()).unwrap();
        let unnamed = store.create_project(Utc::now()).unwrap();

        let basic = json!({ "projectName": "POTLESS" });
        let row = codec::to_row(SectionKind::BasicInfo, basic.as_object().unwrap()).unwrap();
        store.upsert_section(named, SectionKind::BasicInfo, &row).unwrap();

        let projects = store.list_projects().unwrap();
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0].project_name.as_deref(), Some("POTLESS"));
        assert_eq!(projects[1].header.id, unnamed);
        assert!(projects[1].project_name.is_none());

        let stats = store.stats().unwrap();
        assert_eq!(stats.projects, 2);
        assert!(stats.sections.contains(&(SectionKind::BasicInfo, 1)));
    }
}
