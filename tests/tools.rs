use std::sync::Arc;

use async_trait::async_trait;
use portfolio::github::{GitHubApi, RepoMetadata, RepoRef};
use portfolio::tools::{self, ToolName};
use portfolio::{Error, GitHubExtractor, ProjectService, Result};
use serde_json::{json, Value};

const README: &str = "# POTLESS

## Tech Stack
`Flutter` **FastAPI** and mysql

# 📕주요기능

### 1. Pothole detection
- On-device model
- GPS tagging

### 2. Dashboard

# 🔎기획배경
- Potholes are reported late
";

struct FakeGitHub;

#[async_trait]
impl GitHubApi for FakeGitHub {
    async fn repository(&self, repo: &RepoRef) -> Result<RepoMetadata> {
        if repo.name == "missing" {
            return Err(Error::RepositoryUnreachable("404 Not Found".to_string()));
        }
        Ok(RepoMetadata {
            full_name: repo.full_name(),
            description: Some("Pothole management".to_string()),
            default_branch: Some("main".to_string()),
        })
    }

    async fn languages(&self, _repo: &RepoRef) -> Result<Vec<(String, u64)>> {
        Ok(vec![
            ("Dart".to_string(), 80_000),
            ("Python".to_string(), 30_000),
            ("JavaScript".to_string(), 5_000),
        ])
    }

    async fn branches(&self, _repo: &RepoRef) -> Result<Vec<String>> {
        Ok(vec!["main".to_string(), "dev".to_string()])
    }

    async fn commit_count(&self, _repo: &RepoRef) -> Result<u64> {
        Ok(321)
    }

    async fn readme(&self, _repo: &RepoRef) -> Result<Option<String>> {
        Ok(Some(README.to_string()))
    }
}

fn service(dir: &tempfile::TempDir) -> ProjectService {
    ProjectService::new(
        dir.path().join("portfolio.db"),
        None,
        GitHubExtractor::new(Arc::new(FakeGitHub)),
    )
}

async fn get(service: &ProjectService, id: i64) -> Value {
    let text = tools::dispatch(service, "get_project_info", json!({ "project_id": id })).await;
    serde_json::from_str(&text).unwrap_or_else(|e| panic!("not JSON ({}): {}", e, text))
}

#[tokio::test]
async fn create_update_get_flow() {
    let dir = tempfile::tempdir().unwrap();
    let service = service(&dir);

    let text = tools::dispatch(
        &service,
        "create_project_from_template",
        json!({ "github_url": "https://github.com/ssafy/potless" }),
    )
    .await;
    assert!(text.starts_with("Project template created (ID: 1)"), "{}", text);
    assert!(text.contains("README applied"), "{}", text);

    let doc = get(&service, 1).await;
    assert_eq!(doc["id"], json!(1));
    assert_eq!(doc["githubInfo"]["branchStructure"], json!("main, dev"));
    assert_eq!(doc["githubInfo"]["contributionStats"], json!("Total commits: 321"));
    assert_eq!(doc["technicalInfo"]["frontendTech"], json!(["JavaScript"]));
    assert_eq!(doc["technicalInfo"]["otherTools"], json!(["Dart"]));
    assert_eq!(doc["documentationStatus"]["readmeGenerated"], json!(false));

    let text = tools::dispatch(
        &service,
        "update_project_info",
        json!({
            "project_id": 1,
            "section": "portfolio_goals",
            "data": {
                "targetAudience": "Backend hiring managers",
                "keyHighlights": ["On-device inference", ""],
            }
        }),
    )
    .await;
    assert!(text.starts_with("Project 1 section portfolio_goals updated"), "{}", text);

    let doc = get(&service, 1).await;
    assert_eq!(doc["portfolioGoals"]["targetAudience"], json!("Backend hiring managers"));
    assert_eq!(doc["portfolioGoals"]["keyHighlights"], json!(["On-device inference", ""]));
    assert_eq!(doc["portfolioGoals"]["personalContributions"], json!([]));

    let listing = tools::dispatch(&service, "list_projects", Value::Null).await;
    assert!(listing.starts_with("- 1: (unnamed)"), "{}", listing);
}

#[tokio::test]
async fn unreachable_repository_still_creates() {
    let dir = tempfile::tempdir().unwrap();
    let service = service(&dir);

    let text = tools::dispatch(
        &service,
        "create_project_from_template",
        json!({ "github_url": "https://github.com/ssafy/missing" }),
    )
    .await;
    assert!(text.starts_with("Project template created (ID: 1)"), "{}", text);
    assert!(text.contains("template defaults kept"), "{}", text);

    let doc = get(&service, 1).await;
    assert_eq!(doc["githubInfo"]["repositoryUrl"], json!(""));
    assert_eq!(doc["technicalInfo"]["frontendTech"], json!([]));
}

#[tokio::test]
async fn errors_are_messages() {
    let dir = tempfile::tempdir().unwrap();
    let service = service(&dir);

    let text = tools::dispatch(&service, "get_project_info", json!({ "project_id": 42 })).await;
    assert_eq!(text, "Project not found: 42");

    let text = tools::dispatch(
        &service,
        "update_project_info",
        json!({ "project_id": 42, "section": "basicInfo", "data": {} }),
    )
    .await;
    assert_eq!(text, "Project not found: 42");

    let text = tools::dispatch(
        &service,
        "update_project_info",
        json!({ "project_id": 42, "section": "technicalInfo", "data": { "frontendTech": "React" } }),
    )
    .await;
    assert_eq!(text, "Project not found: 42");

    let text = tools::dispatch(&service, "analyze_repository", json!({ "github_url": "gitlab.com/a/b" })).await;
    assert!(text.starts_with("Invalid repository URL"), "{}", text);

    let text = tools::dispatch(&service, "analyze_repository", json!({})).await;
    assert!(text.starts_with("Invalid arguments for analyze_repository"), "{}", text);
}

#[tokio::test]
async fn analyze_reports_readme_insights() {
    let dir = tempfile::tempdir().unwrap();
    let service = service(&dir);

    let text = tools::call(
        &service,
        ToolName::AnalyzeRepository,
        json!({ "github_url": "https://github.com/ssafy/potless.git" }),
    )
    .await;
    let report: Value = serde_json::from_str(&text).unwrap();

    assert_eq!(report["repository"]["name"], json!("potless"));
    assert_eq!(report["readme"]["status"], json!("parsed"));
    assert_eq!(
        report["readme"]["features"],
        json!(["Pothole detection: On-device model, GPS tagging", "Dashboard"])
    );
    assert_eq!(report["readme"]["challenges"][0]["challenge"], json!("Potholes are reported late"));

    let stack = report["readme"]["techStack"].as_array().unwrap();
    assert!(stack.contains(&json!("flutter")));
    assert!(stack.contains(&json!("fastapi")));
    assert!(stack.contains(&json!("mysql")));

    // Nothing was stored
    assert_eq!(tools::dispatch(&service, "list_projects", json!({})).await, "No projects stored.");
}
