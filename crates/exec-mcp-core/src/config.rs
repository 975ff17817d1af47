//! Configuration types for the exec MCP server.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Server configuration, loaded once at process start.
///
/// Sources, in order: built-in defaults, an optional YAML file, then
/// environment variable overrides. Immutable after loading except for
/// per-call timeout overrides handed to the acquisition engine.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Shell and REPL process settings
    pub shell: ShellSettings,
    /// Output acquisition timeouts
    pub timeouts: TimeoutSettings,
}

impl ServerConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> crate::Result<Self> {
        let config: ServerConfig = serde_yaml::from_str(yaml)
            .map_err(|e| crate::Error::Config(format!("invalid config file: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the process environment.
    ///
    /// Reads the optional YAML file named by `EXEC_MCP_CONFIG`, then applies
    /// the individual variable overrides (`EXECUTABLE`, `INIT_COMMANDS`,
    /// `REPL_COMMAND`, `REPL_EXIT_COMMAND` and the four `*_TIMEOUT`s).
    pub fn load() -> crate::Result<Self> {
        let mut config = match std::env::var("EXEC_MCP_CONFIG") {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides on top of the current values.
    pub fn apply_env(&mut self) {
        if let Ok(exe) = std::env::var("EXECUTABLE") {
            self.shell.executable = exe;
        }
        if let Ok(cmds) = std::env::var("INIT_COMMANDS") {
            self.shell.init_commands = ShellSettings::parse_init_commands(&cmds);
        }
        if let Ok(cmd) = std::env::var("REPL_COMMAND") {
            self.shell.repl_command = cmd;
        }
        if let Ok(cmd) = std::env::var("REPL_EXIT_COMMAND") {
            self.shell.repl_exit_command = cmd;
        }
        for (var, field) in [
            ("FIRST_OUTPUT_TIMEOUT", &mut self.timeouts.first_output_secs),
            (
                "BETWEEN_OUTPUT_TIMEOUT",
                &mut self.timeouts.between_output_secs,
            ),
            ("DIALOG_TIMEOUT", &mut self.timeouts.dialog_secs),
            ("MAX_EXEC_TIMEOUT", &mut self.timeouts.max_exec_secs),
        ] {
            if let Some(secs) = std::env::var(var).ok().and_then(|v| v.parse().ok()) {
                *field = secs;
            }
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> crate::Result<()> {
        if self.shell.executable.trim().is_empty() {
            return Err(crate::Error::Config(
                "shell.executable must not be empty".to_string(),
            ));
        }

        let t = &self.timeouts;
        for (name, secs) in [
            ("first_output_secs", t.first_output_secs),
            ("between_output_secs", t.between_output_secs),
            ("dialog_secs", t.dialog_secs),
            ("max_exec_secs", t.max_exec_secs),
        ] {
            if secs == 0 {
                return Err(crate::Error::Config(format!(
                    "timeouts.{name} must be > 0"
                )));
            }
        }

        // Dialog detection only runs while the stall timeout has not fired
        // yet; an inverted relationship would make it unreachable.
        if t.dialog_secs >= t.between_output_secs {
            return Err(crate::Error::Config(format!(
                "timeouts.dialog_secs ({}) must be < timeouts.between_output_secs ({})",
                t.dialog_secs, t.between_output_secs
            )));
        }

        Ok(())
    }
}

/// Shell and REPL process settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellSettings {
    /// Path to the interactive shell executable
    pub executable: String,
    /// Commands run once after each session connects
    pub init_commands: Vec<String>,
    /// Command that starts the persistent REPL inside a session
    pub repl_command: String,
    /// Command that exits the REPL back to the shell
    pub repl_exit_command: String,
}

impl Default for ShellSettings {
    fn default() -> Self {
        Self {
            executable: "/bin/bash".to_string(),
            init_commands: vec![],
            repl_command: "python3 -i".to_string(),
            repl_exit_command: "exit()".to_string(),
        }
    }
}

impl ShellSettings {
    /// Split a semicolon-delimited init command list, dropping empty entries.
    pub fn parse_init_commands(raw: &str) -> Vec<String> {
        raw.split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Output acquisition timeouts, in seconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutSettings {
    /// Give up waiting for the first output after this long
    pub first_output_secs: u64,
    /// Declare the command stalled after this long without new output
    pub between_output_secs: u64,
    /// Start checking for an interactive dialog after this long without new output
    pub dialog_secs: u64,
    /// Hard cap on a single acquisition, output or not
    pub max_exec_secs: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            first_output_secs: 30,
            between_output_secs: 15,
            dialog_secs: 5,
            max_exec_secs: 180,
        }
    }
}

impl TimeoutSettings {
    /// Convert to a [`TimeoutBudget`] of concrete durations.
    pub fn budget(&self) -> TimeoutBudget {
        TimeoutBudget {
            first_output: Duration::from_secs(self.first_output_secs),
            between_output: Duration::from_secs(self.between_output_secs),
            dialog: Duration::from_secs(self.dialog_secs),
            max_exec: Duration::from_secs(self.max_exec_secs),
        }
    }
}

/// The four timeout durations driving one output acquisition.
///
/// Process-wide defaults come from [`TimeoutSettings`]; callers may hand the
/// engine a modified copy per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutBudget {
    /// Give up waiting for the first output after this long
    pub first_output: Duration,
    /// Declare the command stalled after this long without new output
    pub between_output: Duration,
    /// Start checking for an interactive dialog after this long without new output
    pub dialog: Duration,
    /// Hard cap on a single acquisition, output or not
    pub max_exec: Duration,
}

impl Default for TimeoutBudget {
    fn default() -> Self {
        TimeoutSettings::default().budget()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.shell.executable, "/bin/bash");
        assert!(config.shell.init_commands.is_empty());
        assert_eq!(config.shell.repl_command, "python3 -i");
        assert_eq!(config.timeouts.first_output_secs, 30);
        assert_eq!(config.timeouts.between_output_secs, 15);
        assert_eq!(config.timeouts.dialog_secs, 5);
        assert_eq!(config.timeouts.max_exec_secs, 180);
    }

    #[test]
    fn test_config_validation() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_executable_rejected() {
        let mut config = ServerConfig::default();
        config.shell.executable = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = ServerConfig::default();
        config.timeouts.max_exec_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_dialog_must_be_shorter_than_stall() {
        let mut config = ServerConfig::default();
        config.timeouts.dialog_secs = 15;
        config.timeouts.between_output_secs = 15;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("dialog_secs"));
    }

    #[test]
    fn test_parse_init_commands() {
        let cmds = ShellSettings::parse_init_commands("cd /tmp; export FOO=1 ;; echo ready ");
        assert_eq!(cmds, vec!["cd /tmp", "export FOO=1", "echo ready"]);
        assert!(ShellSettings::parse_init_commands("  ; ;").is_empty());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
shell:
  executable: /bin/zsh
  init_commands:
    - cd /workspace
    - source .env
  repl_command: python3 -i

timeouts:
  first_output_secs: 10
  between_output_secs: 8
  dialog_secs: 3
  max_exec_secs: 60
"#;

        let config = ServerConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.shell.executable, "/bin/zsh");
        assert_eq!(config.shell.init_commands.len(), 2);
        assert_eq!(config.shell.repl_exit_command, "exit()");
        assert_eq!(config.timeouts.first_output_secs, 10);
        assert_eq!(config.timeouts.max_exec_secs, 60);
    }

    #[test]
    fn test_invalid_yaml_rejected() {
        let result = ServerConfig::from_yaml("timeouts:\n  dialog_secs: [not, a, number]");
        assert!(result.is_err());
    }

    #[test]
    fn test_budget_conversion() {
        let budget = TimeoutSettings::default().budget();
        assert_eq!(budget.first_output, Duration::from_secs(30));
        assert_eq!(budget.between_output, Duration::from_secs(15));
        assert_eq!(budget.dialog, Duration::from_secs(5));
        assert_eq!(budget.max_exec, Duration::from_secs(180));
        assert_eq!(budget, TimeoutBudget::default());
    }
}
