//! Portfolio CLI - store and enrich project portfolio records

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "portfolio")]
#[command(version)]
#[command(about = "Project portfolio store - structured project records in SQLite, seeded from GitHub")]
#[command(long_about = r#"
Portfolio keeps structured project records (basic info, tech stack,
architecture, code quality, goals, GitHub data, refactoring and
documentation status) in a local SQLite database.

Example usage:
  portfolio init --yes
  portfolio create --github-url https://github.com/owner/repo
  portfolio update 1 --section basicInfo --data '{"projectName": "POTLESS"}'
  portfolio get 1
  portfolio mcp
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print machine-readable JSON instead of formatted output
    #[arg(long, global = true)]
    json: bool,

    /// Path to the config file (default: portfolio.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the database file (overrides config and environment)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Path to a project template JSON file
    #[arg(short, long, global = true)]
    template: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drop and recreate every table (destroys all projects)
    Init {
        /// Confirm the destructive reset
        #[arg(long)]
        yes: bool,
    },

    /// Create a project from the template
    Create {
        /// Repository to fill GitHub and tech-stack data from
        #[arg(short, long)]
        github_url: Option<String>,
    },

    /// Show the full document of a project
    Get {
        /// Project id
        id: i64,
    },

    /// Replace one section of a project
    Update {
        /// Project id
        id: i64,

        /// Section name (e.g. basicInfo, technical_info)
        #[arg(short, long)]
        section: String,

        /// Section data as a JSON object
        #[arg(long, conflicts_with = "file")]
        data: Option<String>,

        /// Read section data from a JSON file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// List stored projects
    List,

    /// Analyze a GitHub repository without storing anything
    Analyze {
        /// Repository URL
        github_url: String,
    },

    /// Show database statistics
    Stats,

    /// Serve the tools over MCP stdio
    Mcp,

    /// Serve the tools over HTTP
    Serve {
        /// Host to bind (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    pub fn is_human(&self) -> bool {
        matches!(self, OutputMode::Human)
    }
}

/// Print a JSON success envelope
pub fn emit_success(output_mode: OutputMode, command: &str, data: serde_json::Value) -> anyhow::Result<()> {
    if output_mode == OutputMode::Json {
        let envelope = serde_json::json!({
            "status": "ok",
            "command": command,
            "data": data,
        });
        println!("{}", serde_json::to_string_pretty(&envelope)?);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for MCP and --json
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let output_mode = if cli.json { OutputMode::Json } else { OutputMode::Human };

    let overrides = commands::Overrides {
        config: cli.config,
        database: cli.database,
        template: cli.template,
    };

    let result = match cli.command {
        Commands::Init { yes } => commands::run_init(&overrides, yes, output_mode),
        Commands::Create { github_url } => {
            commands::run_create(&overrides, github_url.as_deref(), output_mode).await
        }
        Commands::Get { id } => commands::run_get(&overrides, id, output_mode),
        Commands::Update { id, section, data, file } => {
            commands::run_update(&overrides, id, &section, data, file, output_mode)
        }
        Commands::List => commands::run_list(&overrides, output_mode),
        Commands::Analyze { github_url } => {
            commands::run_analyze(&overrides, &github_url, output_mode).await
        }
        Commands::Stats => commands::run_stats(&overrides, output_mode),
        Commands::Mcp => commands::run_mcp(&overrides).await,
        Commands::Serve { host, port } => commands::run_serve(&overrides, host, port).await,
        Commands::Config { action } => match action {
            ConfigAction::Init { force } => commands::run_config_init(&overrides, force, output_mode),
            ConfigAction::Show => commands::run_config_show(&overrides, output_mode),
        },
    };

    if let Err(e) = &result {
        if output_mode.is_human() {
            portfolio::ui::error(&format!("{:#}", e));
            std::process::exit(1);
        }
    }
    result
}
