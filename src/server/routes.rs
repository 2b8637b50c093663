use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
    http::StatusCode,
};
use serde::Serialize;
use serde_json::Value;
use crate::server::AppState;
use crate::tools::{self, ToolDefinition, ToolName};
use std::sync::Arc;

#[derive(Serialize)]
pub struct ToolResponse {
    pub result: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub async fn health() -> Json<Value> {
    Json(serde_json::json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

pub async fn list_tools() -> Json<Vec<ToolDefinition>> {
    Json(tools::definitions())
}

/// Tool arguments come as the JSON body; an empty body means no arguments
pub async fn call_tool(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<Json<ToolResponse>, (StatusCode, Json<ErrorResponse>)> {
    let tool: ToolName = name
        .parse()
        .map_err(|error| (StatusCode::NOT_FOUND, Json(ErrorResponse { error })))?;

    let arguments = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).map_err(|e| {
            (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: format!("Invalid JSON body: {}", e) }))
        })?
    };
    let result = tools::call(&state.service, tool, arguments).await;

    Ok(Json(ToolResponse { result }))
}
