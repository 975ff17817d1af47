//! MCP protocol layer.
//!
//! Contains the rmcp server implementation that routes tool calls to the
//! session dispatcher.

pub mod server;

pub use server::ExecMcpServer;
