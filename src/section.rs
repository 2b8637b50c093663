//! Section kinds - the named sub-documents of a project record
//!
//! Every project owns at most one row per section. Each section maps to its
//! own table and carries a fixed set of fields:
//! - `Text`: scalar text, stored as-is
//! - `List`: ordered list of strings, stored as a JSON array
//! - `Flag`: boolean, stored as an integer 0/1
//!
//! The field tables below are the single dispatch point for encoding,
//! decoding and validating section data.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How a section field is represented in the document and in its column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    List,
    Flag,
}

/// A single field of a section: document key, column name, kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub column: &'static str,
    pub kind: FieldKind,
}

const fn text(key: &'static str, column: &'static str) -> FieldSpec {
    FieldSpec { key, column, kind: FieldKind::Text }
}

const fn list(key: &'static str, column: &'static str) -> FieldSpec {
    FieldSpec { key, column, kind: FieldKind::List }
}

const fn flag(key: &'static str, column: &'static str) -> FieldSpec {
    FieldSpec { key, column, kind: FieldKind::Flag }
}

const BASIC_INFO: &[FieldSpec] = &[
    text("projectName", "project_name"),
    text("duration", "duration"),
    text("teamSize", "team_size"),
    text("yourRole", "your_role"),
    list("mainObjectives", "main_objectives"),
];

const TECHNICAL_INFO: &[FieldSpec] = &[
    list("frontendTech", "frontend_tech"),
    list("backendTech", "backend_tech"),
    list("database", "database"),
    list("deployment", "deployment"),
    list("otherTools", "other_tools"),
];

const ARCHITECTURE_INFO: &[FieldSpec] = &[
    text("currentStructure", "current_structure"),
    list("painPoints", "pain_points"),
    list("desiredImprovements", "desired_improvements"),
];

const CODE_QUALITY: &[FieldSpec] = &[
    list("debugCode", "debug_code"),
    list("duplications", "duplications"),
    list("performance", "performance"),
    list("readability", "readability"),
];

const PORTFOLIO_GOALS: &[FieldSpec] = &[
    text("targetAudience", "target_audience"),
    list("keyHighlights", "key_highlights"),
    list("personalContributions", "personal_contributions"),
    list("uniqueSellingPoints", "unique_selling_points"),
];

const GITHUB_INFO: &[FieldSpec] = &[
    text("repositoryUrl", "repository_url"),
    text("branchStructure", "branch_structure"),
    text("contributionStats", "contribution_stats"),
];

const REFACTORING_STATUS: &[FieldSpec] = &[
    list("completedTasks", "completed_tasks"),
    list("pendingTasks", "pending_tasks"),
    list("skippedTasks", "skipped_tasks"),
];

const DOCUMENTATION_STATUS: &[FieldSpec] = &[
    flag("readmeGenerated", "readme_generated"),
    text("createdAt", "created_at"),
    text("lastUpdated", "last_updated"),
];

/// The eight section kinds of a project document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionKind {
    BasicInfo,
    TechnicalInfo,
    ArchitectureInfo,
    CodeQuality,
    PortfolioGoals,
    GithubInfo,
    RefactoringStatus,
    DocumentationStatus,
}

impl SectionKind {
    /// Document key of the section (`basicInfo`, `technicalInfo`, ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::BasicInfo => "basicInfo",
            SectionKind::TechnicalInfo => "technicalInfo",
            SectionKind::ArchitectureInfo => "architectureInfo",
            SectionKind::CodeQuality => "codeQuality",
            SectionKind::PortfolioGoals => "portfolioGoals",
            SectionKind::GithubInfo => "githubInfo",
            SectionKind::RefactoringStatus => "refactoringStatus",
            SectionKind::DocumentationStatus => "documentationStatus",
        }
    }

    /// Backing table name
    pub fn table(&self) -> &'static str {
        match self {
            SectionKind::BasicInfo => "basic_info",
            SectionKind::TechnicalInfo => "technical_info",
            SectionKind::ArchitectureInfo => "architecture_info",
            SectionKind::CodeQuality => "code_quality",
            SectionKind::PortfolioGoals => "portfolio_goals",
            SectionKind::GithubInfo => "github_info",
            SectionKind::RefactoringStatus => "refactoring_status",
            SectionKind::DocumentationStatus => "documentation_status",
        }
    }

    /// Fields of this section, in column order
    pub fn fields(&self) -> &'static [FieldSpec] {
        match self {
            SectionKind::BasicInfo => BASIC_INFO,
            SectionKind::TechnicalInfo => TECHNICAL_INFO,
            SectionKind::ArchitectureInfo => ARCHITECTURE_INFO,
            SectionKind::CodeQuality => CODE_QUALITY,
            SectionKind::PortfolioGoals => PORTFOLIO_GOALS,
            SectionKind::GithubInfo => GITHUB_INFO,
            SectionKind::RefactoringStatus => REFACTORING_STATUS,
            SectionKind::DocumentationStatus => DOCUMENTATION_STATUS,
        }
    }

    /// Get all section kinds, in document order
    pub fn all() -> &'static [SectionKind] {
        &[
            SectionKind::BasicInfo,
            SectionKind::TechnicalInfo,
            SectionKind::ArchitectureInfo,
            SectionKind::CodeQuality,
            SectionKind::PortfolioGoals,
            SectionKind::GithubInfo,
            SectionKind::RefactoringStatus,
            SectionKind::DocumentationStatus,
        ]
    }

    /// `CREATE TABLE` statement for this section's table
    pub fn create_table_sql(&self) -> String {
        let columns: Vec<String> = self
            .fields()
            .iter()
            .map(|f| {
                let ty = match f.kind {
                    FieldKind::Text | FieldKind::List => "TEXT",
                    FieldKind::Flag => "INTEGER",
                };
                format!("    {} {}", f.column, ty)
            })
            .collect();

        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    project_id INTEGER PRIMARY KEY,\n{},\n    FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE\n)",
            self.table(),
            columns.join(",\n")
        )
    }
}

impl FromStr for SectionKind {
    type Err = Error;

    /// Accepts the document key, the table name, or a dashed/spaced variant,
    /// ignoring case.
    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "basicinfo" | "basic" => Ok(SectionKind::BasicInfo),
            "technicalinfo" | "technical" | "tech" => Ok(SectionKind::TechnicalInfo),
            "architectureinfo" | "architecture" => Ok(SectionKind::ArchitectureInfo),
            "codequality" => Ok(SectionKind::CodeQuality),
            "portfoliogoals" => Ok(SectionKind::PortfolioGoals),
            "githubinfo" | "github" => Ok(SectionKind::GithubInfo),
            "refactoringstatus" | "refactoring" => Ok(SectionKind::RefactoringStatus),
            "documentationstatus" | "documentation" => Ok(SectionKind::DocumentationStatus),
            _ => Err(Error::UnknownSection(s.to_string())),
        }
    }
}

impl std::fmt::Display for SectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
