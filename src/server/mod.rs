use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use crate::service::ProjectService;

pub mod mcp;
pub mod routes;

pub use mcp::McpService;

/// Server state
pub struct AppState {
    pub service: Arc<ProjectService>,
}

/// Router with every HTTP route
pub fn router(service: Arc<ProjectService>) -> Router {
    let state = Arc::new(AppState { service });

    Router::new()
        .route("/health", get(routes::health))
        .route("/tools", get(routes::list_tools))
        .route("/tools/{name}", post(routes::call_tool))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(host: &str, port: u16, service: Arc<ProjectService>) -> anyhow::Result<()> {
    let app = router(service);

    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    let addr = listener.local_addr()?;
    tracing::info!("Starting server on {}", addr);
    println!("🌍 Server running at http://{}:{}", host, addr.port());

    axum::serve(listener, app).await?;

    Ok(())
}
