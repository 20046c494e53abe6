// ABOUTME: Model Context Protocol server over stdio
// ABOUTME: Exposes song listing, practice start, and next-line matching as MCP tools

use crate::service::LyricsService;
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters, ServerHandler},
    model::{CallToolResult, Content, ErrorData as McpError},
    schemars::JsonSchema,
    tool, tool_handler, tool_router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Clone)]
pub struct SingalongMcpService {
    service: Arc<LyricsService>,
    tool_router: ToolRouter<Self>,
}

impl SingalongMcpService {
    pub fn new(service: Arc<LyricsService>) -> Self {
        Self {
            service,
            tool_router: Self::tool_router(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct ListSongsRequest {}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct IndexStatusRequest {}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct NextLineRequest {
    /// Transcribed text of what the user sang
    sung_lyrics: String,
    /// Song being practiced; drives the correctness verdict
    #[serde(default)]
    song_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct StartPracticeRequest {
    /// Song to practice
    song_id: String,
}

fn to_mcp_error(e: crate::Error) -> McpError {
    match e {
        crate::Error::UnknownSong(_) => McpError::invalid_params(e.to_string(), None),
        other => McpError::internal_error(other.to_string(), None),
    }
}

fn json_result<T: Serialize>(value: &T) -> std::result::Result<CallToolResult, McpError> {
    let json_text = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Failed to serialize: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(json_text)]))
}

#[tool_router]
impl SingalongMcpService {
    #[tool(description = "List songs available for sing-along practice")]
    async fn list_songs(
        &self,
        _params: Parameters<ListSongsRequest>,
    ) -> std::result::Result<CallToolResult, McpError> {
        let songs = self.service.list_songs().map_err(to_mcp_error)?;
        json_result(&songs)
    }

    #[tool(description = "Start practicing a song and get its first line")]
    async fn start_practice(
        &self,
        params: Parameters<StartPracticeRequest>,
    ) -> std::result::Result<CallToolResult, McpError> {
        let start = self
            .service
            .start_practice(&params.0.song_id)
            .map_err(to_mcp_error)?;
        json_result(&start)
    }

    #[tool(description = "Identify a sung lyric line and return the next lines of the song")]
    async fn get_next_line(
        &self,
        params: Parameters<NextLineRequest>,
    ) -> std::result::Result<CallToolResult, McpError> {
        let service = Arc::clone(&self.service);
        let request = params.0;

        // Embedding is CPU bound
        let result = tokio::task::spawn_blocking(move || {
            service.get_next_line(&request.sung_lyrics, request.song_id.as_deref())
        })
        .await
        .map_err(|e| McpError::internal_error(format!("Matcher task failed: {}", e), None))?
        .map_err(to_mcp_error)?;

        json_result(&result)
    }

    #[tool(description = "Report whether the lyric index is ready and what it holds")]
    async fn index_status(
        &self,
        _params: Parameters<IndexStatusRequest>,
    ) -> std::result::Result<CallToolResult, McpError> {
        let status = match self.service.index_status() {
            Some(stats) => serde_json::json!({ "ready": true, "index": stats }),
            None => serde_json::json!({ "ready": false }),
        };
        json_result(&status)
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for SingalongMcpService {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        use rmcp::model::{Implementation, ServerCapabilities, ToolsCapability};

        rmcp::model::ServerInfo {
            protocol_version: rmcp::model::ProtocolVersion::default(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability::default()),
                ..Default::default()
            },
            server_info: Implementation {
                name: "singalong".to_string(),
                title: Some("Singalong Lyric Matcher".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Singalong MCP server for sing-along language practice. \
                 Call start_practice with a song id, then send each sung line \
                 to get_next_line to learn whether it was correct and what comes next."
                    .to_string(),
            ),
        }
    }
}

pub async fn serve_mcp(service: Arc<LyricsService>) -> crate::Result<()> {
    use rmcp::{transport::stdio, ServiceExt};

    let server = SingalongMcpService::new(service)
        .serve(stdio())
        .await
        .map_err(|e| crate::Error::Server(format!("MCP server failed: {}", e)))?;

    server
        .waiting()
        .await
        .map_err(|e| crate::Error::Server(format!("MCP server error: {}", e)))?;

    Ok(())
}
