//! Exec MCP Server Implementation
//!
//! This module implements the MCP server using rmcp 0.9's #[tool_router]
//! pattern. It routes MCP tool calls to the session dispatcher.

use std::sync::Arc;

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    tool, tool_handler, tool_router, ErrorData as McpError,
};

use tracing::{error, info, instrument};

use exec_mcp_core::{sanitize, NoticeCatalog, ServerConfig};
use exec_mcp_session::{CommandDispatcher, CommandKind, SessionManager};

use crate::tools::*;

/// Exec MCP Server
///
/// Owns the session dispatcher and exposes it via MCP tools. All tool
/// responses are plain text, run through the presentation-time cleaner once
/// at this boundary.
#[derive(Clone)]
pub struct ExecMcpServer {
    /// Command dispatcher over the session registry
    dispatcher: Arc<CommandDispatcher>,
    /// Tool router for handling MCP tool calls
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl ExecMcpServer {
    /// Create a server from a validated configuration.
    pub fn new(config: ServerConfig, notices: NoticeCatalog) -> Self {
        let manager = Arc::new(SessionManager::new(config.shell.clone()));
        let dispatcher = Arc::new(CommandDispatcher::new(manager, &config, notices));
        Self {
            dispatcher,
            tool_router: Self::tool_router(),
        }
    }

    fn internal_error(e: exec_mcp_core::Error) -> McpError {
        McpError::new(ErrorCode(-32603), e.to_string(), None)
    }

    /// Execute a terminal command in the specified session
    #[tool(
        description = "Execute a terminal command in a persistent session. Automatically exits \
                       REPL mode first if the session is currently running a REPL, which clears \
                       all REPL state (variables, imports)."
    )]
    #[instrument(skip_all)]
    async fn run_terminal(
        &self,
        Parameters(params): Parameters<RunTerminalParams>,
    ) -> Result<CallToolResult, McpError> {
        info!("run_terminal: session={}", params.session);

        let output = self
            .dispatcher
            .execute(params.session, &params.command, CommandKind::Terminal)
            .await
            .map_err(|e| {
                error!("run_terminal failed on session {}: {}", params.session, e);
                Self::internal_error(e)
            })?;

        Ok(CallToolResult::success(vec![Content::text(
            sanitize::clean_final(&output),
        )]))
    }

    /// Execute code in the session's persistent REPL
    #[tool(
        description = "Execute code in a persistent REPL. The first call on a session starts \
                       the REPL; later calls reuse it, so variables, imports and definitions \
                       persist across calls. Running a terminal command on the same session \
                       exits the REPL and discards that state."
    )]
    #[instrument(skip_all)]
    async fn run_code(
        &self,
        Parameters(params): Parameters<RunCodeParams>,
    ) -> Result<CallToolResult, McpError> {
        info!("run_code: session={}", params.session);

        let output = self
            .dispatcher
            .execute(params.session, &params.code, CommandKind::ReplCode)
            .await
            .map_err(|e| {
                error!("run_code failed on session {}: {}", params.session, e);
                Self::internal_error(e)
            })?;

        Ok(CallToolResult::success(vec![Content::text(
            sanitize::clean_final(&output),
        )]))
    }

    /// Read accumulated session output without sending a command
    #[tool(
        description = "Read accumulated output from a session without sending a new command. \
                       Useful for checking on long-running or backgrounded work."
    )]
    #[instrument(skip_all)]
    async fn poll_output(
        &self,
        Parameters(params): Parameters<PollOutputParams>,
    ) -> Result<CallToolResult, McpError> {
        info!("poll_output: session={}", params.session);

        let output = self.dispatcher.poll(params.session).await.map_err(|e| {
            error!("poll_output failed on session {}: {}", params.session, e);
            Self::internal_error(e)
        })?;

        Ok(CallToolResult::success(vec![Content::text(
            sanitize::clean_final(&output),
        )]))
    }

    /// Reset a session, closing its process and starting fresh on next use
    #[tool(
        description = "Reset a session: closes its process and clears all state (REPL \
                       variables, shell environment, working directory). The session is \
                       recreated lazily on next use."
    )]
    #[instrument(skip_all)]
    async fn reset_session(
        &self,
        Parameters(params): Parameters<ResetSessionParams>,
    ) -> Result<CallToolResult, McpError> {
        info!("reset_session: session={}", params.session);

        let message = self
            .dispatcher
            .reset(params.session, params.reason.as_deref())
            .await;

        Ok(CallToolResult::success(vec![Content::text(
            sanitize::clean_final(&message),
        )]))
    }
}

// Implement the ServerHandler trait to define server capabilities
#[tool_handler]
impl rmcp::ServerHandler for ExecMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Exec MCP Server - run commands in long-lived, stateful terminal sessions. \
                 Use run_terminal for shell commands and run_code for a persistent REPL; both \
                 keep state per session number. Completion is inferred heuristically, so slow \
                 commands return with an explanatory notice instead of an error; use \
                 poll_output to collect further output and reset_session to recover a stuck \
                 session."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
