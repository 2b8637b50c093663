use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::github::GitHubClientOptions;
use crate::{Error, Result};

pub const DEFAULT_DATABASE: &str = "portfolio.db";
pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PortfolioConfig {
    pub database: Option<String>,
    pub template: Option<String>,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub github: GitHubConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct GitHubConfig {
    pub token: Option<String>,
    pub api_base: Option<String>,
    pub connect_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
}

impl PortfolioConfig {
    /// Config written by `config init`
    pub fn sample() -> Self {
        let defaults = GitHubClientOptions::default();
        Self {
            database: Some(DEFAULT_DATABASE.to_string()),
            template: None,
            server: ServerConfig {
                host: Some(DEFAULT_HOST.to_string()),
                port: Some(DEFAULT_PORT),
            },
            github: GitHubConfig {
                token: None,
                api_base: Some(defaults.api_base),
                connect_timeout_secs: Some(defaults.connect_timeout.as_secs()),
                request_timeout_secs: Some(defaults.request_timeout.as_secs()),
                user_agent: None,
            },
        }
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`. Empty values are ignored.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = get("GITHUB_TOKEN").or_else(|| get("GH_TOKEN")) {
            self.github.token = Some(token);
        }
        if let Some(database) = get("PORTFOLIO_DATABASE") {
            self.database = Some(database);
        }
        if let Some(template) = get("PORTFOLIO_TEMPLATE") {
            self.template = Some(template);
        }
        if let Some(host) = get("PORTFOLIO_HOST") {
            self.server.host = Some(host);
        }
        if let Some(port) = get("PORTFOLIO_PORT") {
            let port = port
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("PORTFOLIO_PORT is not a valid port: {}", port)))?;
            self.server.port = Some(port);
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(self.database.as_deref().unwrap_or(DEFAULT_DATABASE))
    }

    pub fn template_path(&self) -> Option<PathBuf> {
        self.template.as_deref().map(PathBuf::from)
    }

    pub fn host(&self) -> &str {
        self.server.host.as_deref().unwrap_or(DEFAULT_HOST)
    }

    pub fn port(&self) -> u16 {
        self.server.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn github_client_options(&self) -> GitHubClientOptions {
        let mut options = GitHubClientOptions {
            token: self.github.token.clone(),
            ..Default::default()
        };
        if let Some(api_base) = &self.github.api_base {
            options.api_base = api_base.clone();
        }
        if let Some(user_agent) = &self.github.user_agent {
            options.user_agent = user_agent.clone();
        }
        if let Some(secs) = self.github.connect_timeout_secs {
            options.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.github.request_timeout_secs {
            options.request_timeout = Duration::from_secs(secs);
        }
        options
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("portfolio.toml")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<PortfolioConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: PortfolioConfig = toml::from_str(&contents)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &PortfolioConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = PortfolioConfig::default();
        assert_eq!(config.database_path(), PathBuf::from("portfolio.db"));
        assert_eq!(config.host(), "localhost");
        assert_eq!(config.port(), 8000);
        assert!(config.template_path().is_none());
        assert!(config.github_client_options().token.is_none());
    }

    #[test]
    fn test_parse_partial_file() {
        let config: PortfolioConfig = toml::from_str(
            "database = \"data/p.db\"\n[github]\nrequest_timeout_secs = 3\n",
        )
        .unwrap();
        assert_eq!(config.database_path(), PathBuf::from("data/p.db"));
        assert_eq!(config.port(), DEFAULT_PORT);

        let options = config.github_client_options();
        assert_eq!(options.request_timeout, Duration::from_secs(3));
        assert_eq!(options.connect_timeout, GitHubClientOptions::default().connect_timeout);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("GH_TOKEN", "gh-token"),
            ("PORTFOLIO_PORT", "9100"),
            ("PORTFOLIO_HOST", "0.0.0.0"),
            ("PORTFOLIO_TEMPLATE", ""),
        ]
        .into_iter()
        .collect();

        let mut config = PortfolioConfig {
            template: Some("keep.json".to_string()),
            ..Default::default()
        };
        config.apply_env_from(|k| env.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(config.github.token.as_deref(), Some("gh-token"));
        assert_eq!(config.port(), 9100);
        assert_eq!(config.host(), "0.0.0.0");
        assert_eq!(config.template_path(), Some(PathBuf::from("keep.json")));
    }

    #[test]
    fn test_github_token_wins_over_gh_token() {
        let mut config = PortfolioConfig::default();
        config
            .apply_env_from(|k| match k {
                "GITHUB_TOKEN" => Some("primary".to_string()),
                "GH_TOKEN" => Some("secondary".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.github.token.as_deref(), Some("primary"));
    }

    #[test]
    fn test_bad_port() {
        let mut config = PortfolioConfig::default();
        let result = config.apply_env_from(|k| (k == "PORTFOLIO_PORT").then(|| "http".to_string()));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_write_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("portfolio.toml");

        write_config(&path, &PortfolioConfig::sample(), false).unwrap();
        assert!(write_config(&path, &PortfolioConfig::sample(), false).is_err());
        write_config(&path, &PortfolioConfig::sample(), true).unwrap();

        let loaded = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(loaded, PortfolioConfig::sample());
        assert!(load_config(Some(&dir.path().join("missing.toml"))).unwrap().is_none());
    }

    #[test]
    fn test_ensure_db_dir() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("nested").join("portfolio.db");
        ensure_db_dir(&db).unwrap();
        assert!(db.parent().unwrap().is_dir());
    }
}
