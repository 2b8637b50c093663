//! Tool dispatcher shared by the MCP and HTTP transports
//!
//! Tools take a JSON argument object and always answer with text. Failures
//! are rendered as readable messages instead of being returned as errors, so
//! a bad call never takes a transport down.

use std::str::FromStr;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::github::ReadmeOutcome;
use crate::section::SectionKind;
use crate::service::{Enrichment, ProjectService};
use crate::Error;

/// Tools exposed to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    CreateProject,
    GetProject,
    UpdateProject,
    ListProjects,
    AnalyzeRepository,
}

impl ToolName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::CreateProject => "create_project_from_template",
            ToolName::GetProject => "get_project_info",
            ToolName::UpdateProject => "update_project_info",
            ToolName::ListProjects => "list_projects",
            ToolName::AnalyzeRepository => "analyze_repository",
        }
    }

    pub fn all() -> &'static [ToolName] {
        &[
            ToolName::CreateProject,
            ToolName::GetProject,
            ToolName::UpdateProject,
            ToolName::ListProjects,
            ToolName::AnalyzeRepository,
        ]
    }

    pub fn description(&self) -> &'static str {
        match self {
            ToolName::CreateProject => {
                "Create a new project from the template, optionally filled in from a GitHub repository"
            }
            ToolName::GetProject => "Get the full stored document of a project",
            ToolName::UpdateProject => "Replace one section of a project",
            ToolName::ListProjects => "List stored projects with their names and timestamps",
            ToolName::AnalyzeRepository => {
                "Analyze a GitHub repository without storing anything"
            }
        }
    }

    pub fn input_schema(&self) -> Value {
        match self {
            ToolName::CreateProject => json!({
                "type": "object",
                "properties": {
                    "github_url": {
                        "type": "string",
                        "description": "https://github.com/<owner>/<repo>"
                    }
                }
            }),
            ToolName::GetProject => json!({
                "type": "object",
                "properties": {
                    "project_id": { "type": "integer" }
                },
                "required": ["project_id"]
            }),
            ToolName::UpdateProject => {
                let sections: Vec<&str> = SectionKind::all().iter().map(|k| k.as_str()).collect();
                json!({
                    "type": "object",
                    "properties": {
                        "project_id": { "type": "integer" },
                        "section": { "type": "string", "enum": sections },
                        "data": { "type": "object" }
                    },
                    "required": ["project_id", "section", "data"]
                })
            }
            ToolName::ListProjects => json!({
                "type": "object",
                "properties": {}
            }),
            ToolName::AnalyzeRepository => json!({
                "type": "object",
                "properties": {
                    "github_url": { "type": "string" }
                },
                "required": ["github_url"]
            }),
        }
    }

    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.as_str(),
            description: self.description(),
            input_schema: self.input_schema(),
        }
    }
}

impl FromStr for ToolName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolName::all()
            .iter()
            .find(|tool| tool.as_str() == s)
            .copied()
            .ok_or_else(|| format!("Unknown tool: {}", s))
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Name, description and argument schema of a tool
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

/// Definitions of every tool
pub fn definitions() -> Vec<ToolDefinition> {
    ToolName::all().iter().map(ToolName::definition).collect()
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct CreateArgs {
    github_url: Option<String>,
}

#[derive(Deserialize)]
struct GetArgs {
    project_id: i64,
}

#[derive(Deserialize)]
struct UpdateArgs {
    project_id: i64,
    section: String,
    data: Value,
}

#[derive(Deserialize)]
struct AnalyzeArgs {
    github_url: String,
}

/// Run tool `name` with `arguments`, answering with text.
pub async fn dispatch(service: &ProjectService, name: &str, arguments: Value) -> String {
    match name.parse::<ToolName>() {
        Ok(tool) => call(service, tool, arguments).await,
        Err(message) => message,
    }
}

/// Run a known tool, answering with text.
pub async fn call(service: &ProjectService, tool: ToolName, arguments: Value) -> String {
    tracing::debug!("Calling tool {}", tool);

    // Clients may omit the argument object entirely
    let arguments = match arguments {
        Value::Null => json!({}),
        other => other,
    };

    match tool {
        ToolName::CreateProject => match parse_args::<CreateArgs>(tool, arguments) {
            Ok(args) => create_project(service, args.github_url.as_deref()).await,
            Err(message) => message,
        },
        ToolName::GetProject => match parse_args::<GetArgs>(tool, arguments) {
            Ok(args) => get_project(service, args.project_id),
            Err(message) => message,
        },
        ToolName::UpdateProject => match parse_args::<UpdateArgs>(tool, arguments) {
            Ok(args) => update_project(service, args),
            Err(message) => message,
        },
        ToolName::ListProjects => list_projects(service),
        ToolName::AnalyzeRepository => match parse_args::<AnalyzeArgs>(tool, arguments) {
            Ok(args) => analyze_repository(service, &args.github_url).await,
            Err(message) => message,
        },
    }
}

fn parse_args<T: serde::de::DeserializeOwned>(tool: ToolName, arguments: Value) -> Result<T, String> {
    serde_json::from_value(arguments).map_err(|e| format!("Invalid arguments for {}: {}", tool, e))
}

async fn create_project(service: &ProjectService, github_url: Option<&str>) -> String {
    let created = match service.create_project(github_url).await {
        Ok(created) => created,
        Err(e) => {
            tracing::warn!("Project creation failed: {}", e);
            return format!("Failed to create project: {}", e);
        }
    };

    let note = match &created.enrichment {
        Enrichment::NotRequested => "Fill in the remaining sections.".to_string(),
        Enrichment::Applied { readme } => match readme {
            ReadmeOutcome::Parsed(_) => "GitHub repository data and README applied.".to_string(),
            ReadmeOutcome::Missing => "GitHub repository data applied (no README found).".to_string(),
            ReadmeOutcome::Fallback { cause } => {
                format!("GitHub repository data applied; README skipped: {}", cause)
            }
        },
        Enrichment::Skipped { reason } => {
            format!("GitHub data was not applied ({}); template defaults kept.", reason)
        }
    };

    format!("Project template created (ID: {})\n{}", created.id, note)
}

fn get_project(service: &ProjectService, id: i64) -> String {
    match service.get_project(id) {
        Ok(doc) => pretty(&doc),
        Err(e) => describe_error(&e, &format!("Failed to read project {}", id)),
    }
}

fn update_project(service: &ProjectService, args: UpdateArgs) -> String {
    match service.update_section(args.project_id, &args.section, &args.data) {
        Ok(stored) => format!(
            "Project {} section {} updated\n{}",
            args.project_id,
            args.section,
            pretty(&stored)
        ),
        Err(e) => describe_error(&e, &format!("Failed to update project {}", args.project_id)),
    }
}

fn list_projects(service: &ProjectService) -> String {
    let projects = match service.list_projects() {
        Ok(projects) => projects,
        Err(e) => return describe_error(&e, "Failed to list projects"),
    };

    if projects.is_empty() {
        return "No projects stored.".to_string();
    }

    projects
        .iter()
        .map(|p| {
            let name = p.project_name.as_deref().filter(|n| !n.is_empty()).unwrap_or("(unnamed)");
            format!("- {}: {} (updated {})", p.header.id, name, p.header.updated_at.to_rfc3339())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

async fn analyze_repository(service: &ProjectService, github_url: &str) -> String {
    match service.analyze_repository(github_url).await {
        Ok(extraction) => pretty(&extraction),
        Err(e) => describe_error(&e, "Failed to analyze repository"),
    }
}

/// Client-facing text for a handler error
fn describe_error(error: &Error, context: &str) -> String {
    match error {
        Error::ProjectNotFound(_) | Error::InvalidRepositoryUrl(_) | Error::InvalidSectionData { .. } => {
            error.to_string()
        }
        Error::UnknownSection(_) => {
            let known: Vec<&str> = SectionKind::all().iter().map(|k| k.as_str()).collect();
            format!("{} (expected one of: {})", error, known.join(", "))
        }
        other => {
            tracing::warn!("{}: {}", context, other);
            format!("{}: {}", context, other)
        }
    }
}

fn pretty<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("Failed to render result: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::test_support::service_in;

    #[test]
    fn test_tool_names() {
        for tool in ToolName::all() {
            assert_eq!(tool.as_str().parse::<ToolName>().unwrap(), *tool);
            assert_eq!(tool.input_schema()["type"], json!("object"));
        }
        assert!("drop_tables".parse::<ToolName>().is_err());
    }

    #[test]
    fn test_definitions_serialize_camel_case() {
        let defs = serde_json::to_value(definitions()).unwrap();
        assert_eq!(defs.as_array().unwrap().len(), ToolName::all().len());
        assert!(defs[0].get("inputSchema").is_some());
    }

    #[tokio::test]
    async fn test_unknown_tool_is_a_message() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(dir.path(), true);
        assert_eq!(dispatch(&service, "nope", json!({})).await, "Unknown tool: nope");
    }

    #[tokio::test]
    async fn test_bad_arguments_are_a_message() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(dir.path(), true);
        let text = dispatch(&service, "get_project_info", json!({ "project_id": "seven" })).await;
        assert!(text.starts_with("Invalid arguments for get_project_info"), "{}", text);
    }

    #[tokio::test]
    async fn test_create_with_null_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(dir.path(), true);
        let text = dispatch(&service, "create_project_from_template", Value::Null).await;
        assert!(text.starts_with("Project template created (ID: 1)"), "{}", text);
    }

    #[tokio::test]
    async fn test_unknown_section_lists_choices() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(dir.path(), true);
        dispatch(&service, "create_project_from_template", json!({})).await;

        let text = dispatch(
            &service,
            "update_project_info",
            json!({ "project_id": 1, "section": "budget", "data": {} }),
        )
        .await;
        assert!(text.starts_with("Unknown section: budget"), "{}", text);
        assert!(text.contains("documentationStatus"));
    }
}
