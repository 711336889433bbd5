//! MCP JSON-RPC protocol bridge.
//!
//! Adapts the [`ToolRegistry`] to the Model Context Protocol. The same
//! [`McpBridge`] backs both transports:
//!
//! * **stdio**: [`serve_stdio`] runs one session over stdin/stdout, for
//!   clients that launch `ctxl serve stdio` as a subprocess.
//! * **Streamable HTTP**: mounted at `/mcp` by [`crate::server`].
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "context-loader": {
//!       "command": "ctxl",
//!       "args": ["--config", "/path/to/ctxl.toml", "serve", "stdio"]
//!     }
//!   }
//! }
//! ```

use std::borrow::Cow;
use std::sync::Arc;

use anyhow::Context;
use rmcp::model::*;
use rmcp::{ErrorData as McpError, ServerHandler, ServiceExt};
use tracing::{debug, info};

use crate::loader::ContextLoader;
use crate::traits::{validate_params, ToolContext, ToolRegistry};

/// Bridges the tool registry to the MCP JSON-RPC protocol.
///
/// Each MCP session receives a clone (everything is behind `Arc`).
#[derive(Clone)]
pub struct McpBridge {
    ctx: ToolContext,
    tools: Arc<ToolRegistry>,
}

impl McpBridge {
    pub fn new(loader: Arc<ContextLoader>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            ctx: ToolContext::new(loader),
            tools,
        }
    }

    /// Convert a registry tool into an rmcp `Tool` descriptor.
    pub fn to_mcp_tool(tool: &dyn crate::traits::Tool) -> Tool {
        let input_schema = match tool.parameters_schema() {
            serde_json::Value::Object(map) => Arc::new(map),
            _ => Arc::new(serde_json::Map::new()),
        };

        Tool {
            name: Cow::Owned(tool.name().to_string()),
            title: None,
            description: Some(Cow::Owned(tool.description().to_string())),
            input_schema,
            output_schema: None,
            annotations: Some(ToolAnnotations::new().read_only(true)),
            execution: None,
            icons: None,
            meta: None,
        }
    }
}

impl ServerHandler for McpBridge {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "context-loader".to_string(),
                title: Some("Context Loader".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                description: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Context Loader serves project documentation selected by keyword. \
                 Call load_context with your task description to get the relevant \
                 guidelines, list_contexts to see every document and its keywords, \
                 and get_context_file to fetch one document by path."
                    .to_string(),
            ),
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        let tools: Vec<Tool> = self
            .tools
            .tools()
            .iter()
            .map(|t| Self::to_mcp_tool(t.as_ref()))
            .collect();
        std::future::ready(Ok(ListToolsResult::with_all_items(tools)))
    }

    fn get_tool(&self, name: &str) -> Option<Tool> {
        self.tools.find(name).map(Self::to_mcp_tool)
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let tool = self.tools.find(&request.name).ok_or_else(|| {
            McpError::new(
                ErrorCode::METHOD_NOT_FOUND,
                format!("no tool registered with name: {}", request.name),
                None,
            )
        })?;

        let params = request
            .arguments
            .map(serde_json::Value::Object)
            .unwrap_or(serde_json::Value::Object(serde_json::Map::new()));

        debug!(tool = %request.name, "mcp tool call");

        let params = match validate_params(&tool.parameters_schema(), &params) {
            Ok(p) => p,
            Err(e) => return Ok(CallToolResult::error(vec![Content::text(e.to_string())])),
        };

        match tool.execute(params, &self.ctx).await {
            Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(format!(
                "Error: {}",
                e
            ))])),
        }
    }
}

/// Serve one MCP session over stdin/stdout until the client disconnects.
pub async fn serve_stdio(bridge: McpBridge) -> anyhow::Result<()> {
    info!(tools = bridge.tools.len(), "serving MCP over stdio");

    let service = bridge
        .serve(rmcp::transport::stdio())
        .await
        .context("failed to start MCP stdio session")?;

    let reason = service.waiting().await?;
    info!(?reason, "MCP stdio session closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn bridge() -> McpBridge {
        let loader = Arc::new(ContextLoader::from_config(&Config::minimal()));
        McpBridge::new(loader, Arc::new(ToolRegistry::with_builtins()))
    }

    #[test]
    fn test_server_info_advertises_tools() {
        let info = bridge().get_info();
        assert!(info.capabilities.tools.is_some());
        assert_eq!(info.server_info.name, "context-loader");
    }

    #[test]
    fn test_tool_descriptor_carries_schema() {
        let b = bridge();
        let tool = b.get_tool("load_context").unwrap();
        assert_eq!(tool.name, "load_context");
        let required = tool.input_schema.get("required").unwrap();
        assert_eq!(required, &serde_json::json!(["prompt"]));
        assert!(b.get_tool("missing").is_none());
    }
}
