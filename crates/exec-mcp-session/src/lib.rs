//! # exec-mcp-session
//!
//! Session lifecycle and output acquisition for the exec MCP server.
//!
//! This crate provides:
//! - The session registry (key → live process map)
//! - Session creation, initialization and reset
//! - The output-acquisition engine (timeout escalation + prompt/dialog
//!   pattern matching)
//! - Command dispatch with shell/REPL mode switching and
//!   retry-on-disconnect
//!
//! ## Architecture
//!
//! This is Layer 2 in the architecture - it depends on exec-mcp-core and
//! exec-mcp-shell and is consumed by the MCP server binary.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod acquire;
pub mod dispatch;
pub mod manager;
pub mod registry;
pub mod session;

// Re-export commonly used types
pub use acquire::{decide, wait_for_output, AcquireOptions, PollDecision, StopReason};
pub use dispatch::{CommandDispatcher, CommandKind};
pub use manager::SessionManager;
pub use registry::SessionRegistry;
pub use session::{Session, SessionMode};
