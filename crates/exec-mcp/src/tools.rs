//! MCP tool parameter and response types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

fn default_session() -> u32 {
    0
}

// =============================================================================
// Execution Tools
// =============================================================================

/// Parameters for run_terminal
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RunTerminalParams {
    /// The terminal command to execute
    pub command: String,

    /// Session number (default: 0)
    #[serde(default = "default_session")]
    pub session: u32,
}

/// Parameters for run_code
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RunCodeParams {
    /// The code to execute in the persistent REPL
    pub code: String,

    /// Session number (default: 0)
    #[serde(default = "default_session")]
    pub session: u32,
}

// =============================================================================
// Session Tools
// =============================================================================

/// Parameters for poll_output
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PollOutputParams {
    /// Session number (default: 0)
    #[serde(default = "default_session")]
    pub session: u32,
}

/// Parameters for reset_session
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ResetSessionParams {
    /// Session number (default: 0)
    #[serde(default = "default_session")]
    pub session: u32,

    /// Optional reason, recorded in the server log
    #[serde(default)]
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_terminal_params_default_session() {
        let params: RunTerminalParams = serde_json::from_str(r#"{"command": "ls"}"#).unwrap();
        assert_eq!(params.command, "ls");
        assert_eq!(params.session, 0);
    }

    #[test]
    fn test_run_code_params_explicit_session() {
        let params: RunCodeParams =
            serde_json::from_str(r#"{"code": "x = 1", "session": 3}"#).unwrap();
        assert_eq!(params.code, "x = 1");
        assert_eq!(params.session, 3);
    }

    #[test]
    fn test_reset_session_params_reason_optional() {
        let params: ResetSessionParams = serde_json::from_str(r#"{"session": 1}"#).unwrap();
        assert_eq!(params.session, 1);
        assert!(params.reason.is_none());

        let params: ResetSessionParams =
            serde_json::from_str(r#"{"reason": "stuck process"}"#).unwrap();
        assert_eq!(params.session, 0);
        assert_eq!(params.reason.as_deref(), Some("stuck process"));
    }

    #[test]
    fn test_poll_output_params_empty_object() {
        let params: PollOutputParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params.session, 0);
    }
}
