//! Request handlers - create, get and update projects
//!
//! Every call opens its own connection, does its work in at most one
//! transaction, and closes the connection again. Nothing is held between
//! calls.

use std::path::{Path, PathBuf};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use crate::codec::{self, Fragment};
use crate::github::{Extraction, GitHubExtractor, ReadmeOutcome};
use crate::section::SectionKind;
use crate::storage::{DbStats, ProjectHeader, ProjectSummary, SqliteStore};
use crate::template::ProjectTemplate;
use crate::{Error, Result};

/// What happened to the GitHub enrichment of a new project
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Enrichment {
    /// No URL was given
    NotRequested,
    /// Repository data was merged into the template
    Applied { readme: ReadmeOutcome },
    /// Extraction failed; template defaults were kept
    Skipped { reason: String },
}

/// Result of creating a project
#[derive(Debug, Clone, Serialize)]
pub struct CreatedProject {
    pub id: i64,
    pub enrichment: Enrichment,
}

/// Full stored document of a project
#[derive(Debug, Clone, Serialize)]
pub struct ProjectDocument {
    #[serde(flatten)]
    pub header: ProjectHeader,
    #[serde(flatten)]
    pub sections: Fragment,
}

/// Project request handlers over a database file
#[derive(Clone)]
pub struct ProjectService {
    database_path: PathBuf,
    template_path: Option<PathBuf>,
    extractor: GitHubExtractor,
}

impl ProjectService {
    pub fn new(database_path: PathBuf, template_path: Option<PathBuf>, extractor: GitHubExtractor) -> Self {
        Self {
            database_path,
            template_path,
            extractor,
        }
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    fn open_store(&self) -> Result<SqliteStore> {
        SqliteStore::open(&self.database_path)
    }

    /// Drop and recreate all tables
    pub fn initialize(&self) -> Result<()> {
        self.open_store()?.initialize()
    }

    /// Create a project from the template, enriched from `github_url` when given.
    ///
    /// Extraction failures never fail the call; they are reported in
    /// [`CreatedProject::enrichment`].
    pub async fn create_project(&self, github_url: Option<&str>) -> Result<CreatedProject> {
        let mut template = ProjectTemplate::load(self.template_path.as_deref())?;

        let enrichment = match github_url.map(str::trim).filter(|u| !u.is_empty()) {
            None => Enrichment::NotRequested,
            Some(url) => match self.extractor.extract(url).await {
                Ok(extraction) => {
                    template.apply_extraction(&extraction);
                    Enrichment::Applied { readme: extraction.readme }
                }
                Err(e) => {
                    tracing::warn!("Creating project without GitHub data: {}", e);
                    Enrichment::Skipped { reason: e.to_string() }
                }
            },
        };

        // Encode everything before touching the database
        let mut rows = Vec::with_capacity(SectionKind::all().len());
        for kind in SectionKind::all() {
            rows.push((*kind, codec::to_row(*kind, &template.section(*kind))?));
        }

        let mut store = self.open_store()?;
        let id = store.in_transaction(|store| {
            let id = store.create_project(Utc::now())?;
            for (kind, row) in &rows {
                store.upsert_section(id, *kind, row)?;
            }
            Ok(id)
        })?;

        tracing::info!("Created project {}", id);
        Ok(CreatedProject { id, enrichment })
    }

    /// Full document of project `id`
    pub fn get_project(&self, id: i64) -> Result<ProjectDocument> {
        let store = self.open_store()?;
        let header = store.get_project_header(id)?.ok_or(Error::ProjectNotFound(id))?;

        let mut sections = Fragment::new();
        for kind in SectionKind::all() {
            if let Some(row) = store.get_section(id, *kind)? {
                let fragment = codec::from_row(*kind, &row)?;
                sections.insert(kind.as_str().to_string(), Value::Object(fragment));
            }
        }

        Ok(ProjectDocument { header, sections })
    }

    /// Replace one section of project `id` with `data`, returning the stored section.
    ///
    /// A missing project is reported as `ProjectNotFound` whatever `data` holds.
    pub fn update_section(&self, id: i64, section: &str, data: &Value) -> Result<Fragment> {
        let kind: SectionKind = section.parse()?;

        let mut store = self.open_store()?;
        if !store.project_exists(id)? {
            return Err(Error::ProjectNotFound(id));
        }

        let Value::Object(fragment) = data else {
            return Err(Error::InvalidSectionData {
                section: kind.as_str(),
                field: "*",
                reason: "section data must be a JSON object".to_string(),
            });
        };
        let row = codec::to_row(kind, fragment)?;

        store.in_transaction(|store| {
            store.upsert_section(id, kind, &row)?;
            store.touch_project(id, Utc::now())?;
            Ok(())
        })?;

        tracing::info!("Updated {} of project {}", kind, id);

        let stored = store
            .get_section(id, kind)?
            .ok_or(Error::ProjectNotFound(id))?;
        codec::from_row(kind, &stored)
    }

    /// All projects, oldest first
    pub fn list_projects(&self) -> Result<Vec<ProjectSummary>> {
        self.open_store()?.list_projects()
    }

    /// Run the GitHub extractor without storing anything
    pub async fn analyze_repository(&self, github_url: &str) -> Result<Extraction> {
        self.extractor.extract(github_url).await
    }

    pub fn stats(&self) -> Result<DbStats> {
        self.open_store()?.stats()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use async_trait::async_trait;

    use super::*;
    use crate::github::{GitHubApi, RepoMetadata, RepoRef};

    /// In-process GitHub double serving one canned repository
    pub struct StaticGitHub {
        pub reachable: bool,
        pub readme: Option<String>,
    }

    #[async_trait]
    impl GitHubApi for StaticGitHub {
        async fn repository(&self, repo: &RepoRef) -> Result<RepoMetadata> {
            if self.reachable {
                Ok(RepoMetadata { full_name: repo.full_name(), ..Default::default() })
            } else {
                Err(Error::RepositoryUnreachable(format!("{} not found", repo)))
            }
        }

        async fn languages(&self, _repo: &RepoRef) -> Result<Vec<(String, u64)>> {
            Ok(vec![("Dart".to_string(), 900), ("Python".to_string(), 300)])
        }

        async fn branches(&self, _repo: &RepoRef) -> Result<Vec<String>> {
            Ok(vec!["main".to_string(), "develop".to_string(), "feature/ai".to_string()])
        }

        async fn commit_count(&self, _repo: &RepoRef) -> Result<u64> {
            Ok(128)
        }

        async fn readme(&self, _repo: &RepoRef) -> Result<Option<String>> {
            Ok(self.readme.clone())
        }
    }

    pub fn service_in(dir: &Path, reachable: bool) -> ProjectService {
        let client = Arc::new(StaticGitHub {
            reachable,
            readme: Some("# 📕주요기능\n### 1. Detection\n- On-device model\n".to_string()),
        });
        ProjectService::new(dir.join("portfolio.db"), None, GitHubExtractor::new(client))
    }
}
