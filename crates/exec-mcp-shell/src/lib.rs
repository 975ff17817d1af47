//! # exec-mcp-shell
//!
//! Interactive process driver for the exec MCP server.
//!
//! This crate provides:
//! - PTY spawning for long-lived interactive processes (shell, REPL)
//! - Line-oriented input with accumulated, delta-aware bounded reads
//! - Idempotent teardown
//!
//! ## Architecture
//!
//! This is Layer 1 in the architecture - it depends on exec-mcp-core and is
//! consumed by the session layer, which never touches the PTY directly. The
//! contract is four operations: `connect`, `send`, `read`, `close`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod pty;

// Re-export commonly used types
pub use pty::LocalShell;
