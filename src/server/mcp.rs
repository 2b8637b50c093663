use std::sync::Arc;
use crate::service::ProjectService;
use crate::tools::{self, ToolName};
use mcp_sdk_rs::server::{Server, ServerHandler};
use mcp_sdk_rs::types::{
    Tool, ToolResult, ListToolsResult,
    Implementation, ClientCapabilities, ServerCapabilities
};
use mcp_sdk_rs::error::ErrorCode;
use mcp_sdk_rs::transport::stdio::StdioTransport;
use mcp_sdk_rs::error::Error;
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use serde::Deserialize;

#[derive(Deserialize)]
struct CallToolRequest {
    name: String,
    arguments: Option<Value>,
}

/// MCP server exposing the portfolio tools over stdio
#[derive(Clone)]
pub struct McpService {
    service: Arc<ProjectService>,
}

impl McpService {
    pub fn new(service: Arc<ProjectService>) -> Self {
        Self { service }
    }

    pub async fn run_stdio(&self) -> anyhow::Result<()> {
        let (read_tx, read_rx) = mpsc::channel::<String>(32);
        let (write_tx, mut write_rx) = mpsc::channel::<String>(32);

        // Stdin reader
        tokio::spawn(async move {
            let stdin = tokio::io::stdin();
            let mut reader = BufReader::new(stdin).lines();
            while let Ok(Some(line)) = reader.next_line().await {
                if read_tx.send(line).await.is_err() {
                    break;
                }
            }
        });

        // Stdout writer
        tokio::spawn(async move {
            let mut stdout = tokio::io::stdout();
            while let Some(msg) = write_rx.recv().await {
                let _ = stdout.write_all(msg.as_bytes()).await;
                let _ = stdout.write_all(b"\n").await;
                let _ = stdout.flush().await;
            }
        });

        tracing::info!("MCP server listening on stdio");
        let transport = StdioTransport::new(read_rx, write_tx);
        let server = Server::new(Arc::new(transport), Arc::new(self.clone()));
        server.start().await?;
        Ok(())
    }

    fn list_tools(&self) -> Result<ListToolsResult, Error> {
        let tools = ToolName::all()
            .iter()
            .map(|tool| {
                Ok(Tool {
                    name: tool.as_str().to_string(),
                    description: tool.description().to_string(),
                    input_schema: serde_json::from_value(tool.input_schema())
                        .map_err(|e| Error::protocol(ErrorCode::ParseError, e.to_string()))?,
                    annotations: None,
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;

        Ok(ListToolsResult { tools, next_cursor: None })
    }

    async fn call_tool(&self, params: Option<Value>) -> Result<ToolResult, Error> {
        let req: CallToolRequest = params.and_then(|v| serde_json::from_value(v).ok())
            .ok_or(Error::protocol(ErrorCode::InvalidParams, "Missing params"))?;

        let tool: ToolName = req.name.parse()
            .map_err(|e: String| Error::protocol(ErrorCode::MethodNotFound, e))?;

        let text = tools::call(&self.service, tool, req.arguments.unwrap_or(Value::Null)).await;

        let content = serde_json::to_value(vec![serde_json::json!({
            "type": "text",
            "text": text
        })])
        .map_err(|e| Error::protocol(ErrorCode::InternalError, e.to_string()))?;

        Ok(ToolResult {
            content: Vec::new(),
            structured_content: Some(content),
        })
    }
}

#[async_trait]
impl ServerHandler for McpService {
    async fn initialize(
        &self,
        _implementation: Implementation,
        _capabilities: ClientCapabilities
    ) -> Result<ServerCapabilities, Error> {
        Ok(ServerCapabilities::default())
    }

    async fn shutdown(&self) -> Result<(), Error> {
        tracing::info!("MCP client disconnected");
        Ok(())
    }

    async fn handle_method(&self, method: &str, params: Option<Value>) -> Result<Value, Error> {
        match method {
            "tools/list" => {
                let result = self.list_tools()?;
                serde_json::to_value(result).map_err(|e| Error::protocol(ErrorCode::InternalError, e.to_string()))
            }
            "tools/call" => {
                let result = self.call_tool(params).await?;
                serde_json::to_value(result).map_err(|e| Error::protocol(ErrorCode::InternalError, e.to_string()))
            }
            _ => Err(Error::protocol(ErrorCode::MethodNotFound, method.to_string()))
        }
    }
}
