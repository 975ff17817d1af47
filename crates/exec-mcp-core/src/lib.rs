//! # exec-mcp-core
//!
//! Core types for the exec MCP server.
//!
//! This crate contains all fundamental types with **no internal dependencies**
//! on other exec-mcp crates. It provides:
//!
//! - Error types
//! - Server configuration and timeout budgets
//! - Notice templates (why an output acquisition stopped)
//! - Prompt/dialog pattern sets for completion inference
//! - Output sanitization passes
//!
//! ## Architecture
//!
//! This is Layer 0 in the architecture - all other crates depend on this one,
//! but this crate has no dependencies on other exec-mcp crates.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod notice;
pub mod patterns;
pub mod sanitize;

// Re-export commonly used types
pub use config::{ServerConfig, ShellSettings, TimeoutBudget, TimeoutSettings};
pub use error::{Error, Result};
pub use notice::{NoticeCatalog, NoticeKind};
