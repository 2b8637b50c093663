use crate::{OutputMode, emit_success};
use portfolio::config::{self, PortfolioConfig};
use portfolio::github::ReadmeOutcome;
use portfolio::server::{self, McpService};
use portfolio::service::Enrichment;
use portfolio::ui::{self, Icons};
use portfolio::{GitHubClient, GitHubExtractor, ProjectService};
use std::path::PathBuf;
use std::sync::Arc;

/// Global CLI flags that override config and environment
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub database: Option<PathBuf>,
    pub template: Option<PathBuf>,
}

/// Config file, then environment, then CLI flags
fn resolve_config(overrides: &Overrides) -> anyhow::Result<PortfolioConfig> {
    let mut config = config::load_config(overrides.config.as_deref())?.unwrap_or_default();
    config.apply_env()?;

    if let Some(database) = &overrides.database {
        config.database = Some(database.display().to_string());
    }
    if let Some(template) = &overrides.template {
        config.template = Some(template.display().to_string());
    }
    Ok(config)
}

fn build_service(config: &PortfolioConfig) -> anyhow::Result<ProjectService> {
    let database = config.database_path();
    config::ensure_db_dir(&database)?;

    let client = GitHubClient::new(config.github_client_options())?;
    if config.github.token.is_none() {
        tracing::debug!("No GitHub token configured, using unauthenticated requests");
    }

    Ok(ProjectService::new(
        database,
        config.template_path(),
        GitHubExtractor::new(Arc::new(client)),
    ))
}

fn service_for(overrides: &Overrides) -> anyhow::Result<ProjectService> {
    build_service(&resolve_config(overrides)?)
}

pub fn run_init(overrides: &Overrides, yes: bool, output_mode: OutputMode) -> anyhow::Result<()> {
    if !yes {
        anyhow::bail!("init drops every table and all stored projects; re-run with --yes to confirm");
    }

    let service = service_for(overrides)?;
    service.initialize()?;

    if output_mode.is_human() {
        ui::success("Database initialized");
        ui::info("Database", &service.database_path().display().to_string());
    } else {
        emit_success(output_mode, "init", serde_json::json!({
            "database": service.database_path().display().to_string(),
        }))?;
    }
    Ok(())
}

pub async fn run_create(
    overrides: &Overrides,
    github_url: Option<&str>,
    output_mode: OutputMode,
) -> anyhow::Result<()> {
    let service = service_for(overrides)?;
    let created = service.create_project(github_url).await?;

    if !output_mode.is_human() {
        return emit_success(output_mode, "create", serde_json::to_value(&created)?);
    }

    ui::success(&format!("Project created (ID: {})", created.id));
    match &created.enrichment {
        Enrichment::NotRequested => {
            ui::info("Next", &format!("portfolio update {} --section basicInfo --data '{{...}}'", created.id));
        }
        Enrichment::Applied { readme } => {
            println!("{} GitHub data applied", Icons::LINK);
            match readme {
                ReadmeOutcome::Parsed(insights) => ui::summary_row(
                    "README:",
                    &format!(
                        "{} tech mentions, {} features, {} challenges",
                        insights.tech_stack.len(),
                        insights.features.len(),
                        insights.challenges.len()
                    ),
                ),
                ReadmeOutcome::Missing => ui::summary_row("README:", &ui::muted("none")),
                ReadmeOutcome::Fallback { cause } => ui::warn(&format!("README skipped: {}", cause)),
            }
        }
        Enrichment::Skipped { reason } => {
            ui::warn(&format!("GitHub data not applied, template defaults kept: {}", reason));
        }
    }
    Ok(())
}

pub fn run_get(overrides: &Overrides, id: i64, output_mode: OutputMode) -> anyhow::Result<()> {
    let service = service_for(overrides)?;
    let doc = service.get_project(id)?;
    let value = serde_json::to_value(&doc)?;

    if output_mode.is_human() {
        println!("{} Project #{}", Icons::FOLDER, id);
        ui::json_block(&value);
    } else {
        emit_success(output_mode, "get", value)?;
    }
    Ok(())
}

pub fn run_update(
    overrides: &Overrides,
    id: i64,
    section: &str,
    data: Option<String>,
    file: Option<PathBuf>,
    output_mode: OutputMode,
) -> anyhow::Result<()> {
    let raw = match (data, file) {
        (Some(data), _) => data,
        (None, Some(file)) => std::fs::read_to_string(&file)?,
        (None, None) => anyhow::bail!("provide the section data with --data or --file"),
    };
    let value: serde_json::Value = serde_json::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("section data is not valid JSON: {}", e))?;

    let service = service_for(overrides)?;
    let stored = service.update_section(id, section, &value)?;
    let stored = serde_json::Value::Object(stored);

    if output_mode.is_human() {
        println!("{} Updated {} of project #{}", Icons::MOD, section, id);
        ui::json_block(&stored);
    } else {
        emit_success(output_mode, "update", stored)?;
    }
    Ok(())
}

pub fn run_list(overrides: &Overrides, output_mode: OutputMode) -> anyhow::Result<()> {
    let service = service_for(overrides)?;
    let projects = service.list_projects()?;

    if !output_mode.is_human() {
        return emit_success(output_mode, "list", serde_json::to_value(&projects)?);
    }

    if projects.is_empty() {
        println!("∅ No projects stored.");
        return Ok(());
    }

    ui::section(&format!("Projects ({})", projects.len()));
    for project in &projects {
        ui::project_row(
            project.header.id,
            project.project_name.as_deref(),
            &project.header.updated_at.to_rfc3339(),
        );
    }
    Ok(())
}

pub async fn run_analyze(overrides: &Overrides, github_url: &str, output_mode: OutputMode) -> anyhow::Result<()> {
    let service = service_for(overrides)?;

    if output_mode.is_human() {
        println!("{} Analyzing {}...", Icons::MAG, github_url);
    }
    let extraction = service.analyze_repository(github_url).await?;
    let value = serde_json::to_value(&extraction)?;

    if output_mode.is_human() {
        ui::json_block(&value);
    } else {
        emit_success(output_mode, "analyze", value)?;
    }
    Ok(())
}

pub fn run_stats(overrides: &Overrides, output_mode: OutputMode) -> anyhow::Result<()> {
    let service = service_for(overrides)?;
    let stats = service.stats()?;

    if output_mode.is_human() {
        println!("{} Portfolio Statistics ({})", Icons::STATS, service.database_path().display());
        println!("------------------------------------");
        println!("{}", stats);
    } else {
        let sections: serde_json::Map<String, serde_json::Value> = stats
            .sections
            .iter()
            .map(|(kind, count)| (kind.as_str().to_string(), serde_json::json!(count)))
            .collect();
        emit_success(output_mode, "stats", serde_json::json!({
            "projects": stats.projects,
            "sections": sections,
        }))?;
    }
    Ok(())
}

pub async fn run_mcp(overrides: &Overrides) -> anyhow::Result<()> {
    let service = service_for(overrides)?;
    tracing::info!("Using database {}", service.database_path().display());
    McpService::new(Arc::new(service)).run_stdio().await
}

pub async fn run_serve(overrides: &Overrides, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let config = resolve_config(overrides)?;
    let service = build_service(&config)?;

    let host = host.unwrap_or_else(|| config.host().to_string());
    let port = port.unwrap_or_else(|| config.port());

    ui::header("Portfolio server");
    ui::info("Database", &service.database_path().display().to_string());
    server::start_server(&host, port, Arc::new(service)).await
}

pub fn run_config_init(overrides: &Overrides, force: bool, output_mode: OutputMode) -> anyhow::Result<()> {
    let path = overrides.config.clone().unwrap_or_else(config::default_config_path);
    config::write_config(&path, &PortfolioConfig::sample(), force)?;

    if output_mode.is_human() {
        ui::success(&format!("Wrote {}", path.display()));
        println!("  {}", ui::dim("Set GITHUB_TOKEN in the environment rather than in the file."));
    } else {
        emit_success(output_mode, "config init", serde_json::json!({ "path": path.display().to_string() }))?;
    }
    Ok(())
}

pub fn run_config_show(overrides: &Overrides, output_mode: OutputMode) -> anyhow::Result<()> {
    let mut config = resolve_config(overrides)?;
    if config.github.token.is_some() {
        config.github.token = Some("********".to_string());
    }

    if output_mode.is_human() {
        println!("{} Effective configuration", Icons::GEAR);
        println!("{}", toml::to_string_pretty(&config)?);
    } else {
        emit_success(output_mode, "config show", serde_json::to_value(&config)?)?;
    }
    Ok(())
}
