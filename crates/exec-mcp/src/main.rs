//! # Exec MCP Server
//!
//! Model Context Protocol server that runs commands inside long-lived,
//! stateful interactive sessions (a shell or a persistent code REPL).
//!
//! ## Overview
//!
//! This server provides MCP tools for:
//! - Terminal command execution (run_terminal)
//! - Persistent REPL code execution (run_code)
//! - Non-destructive output polling (poll_output)
//! - Session reset (reset_session)
//!
//! ## Architecture
//!
//! This is Layer 3 - the main MCP server binary that ties together:
//! - exec-mcp-core: Core types, config, notices, sanitizer
//! - exec-mcp-shell: Interactive process driver
//! - exec-mcp-session: Session lifecycle, acquisition engine, dispatcher

use rmcp::{transport::stdio, ServiceExt};

use exec_mcp::ExecMcpServer;
use exec_mcp_core::{NoticeCatalog, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging. Stdout carries the MCP transport, so logs go to
    // stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ServerConfig::load().map_err(|e| {
        tracing::error!("Invalid configuration: {}", e);
        anyhow::anyhow!(e)
    })?;

    let notices = match std::env::var("PROMPTS_DIR") {
        Ok(dir) => NoticeCatalog::from_dir(dir),
        Err(_) => NoticeCatalog::builtin(),
    };

    tracing::info!(
        "Exec MCP Server starting: executable='{}', {} init command(s)",
        config.shell.executable,
        config.shell.init_commands.len()
    );

    let server = ExecMcpServer::new(config, notices);

    tracing::info!("Server initialized, starting stdio transport...");

    let service = server.serve(stdio()).await.map_err(|e| {
        tracing::error!("Error starting server: {}", e);
        e
    })?;

    tracing::info!("Exec MCP Server running on stdio");

    service.waiting().await?;

    tracing::info!("Exec MCP Server shutting down");

    Ok(())
}
