//! A single interactive session: one process handle plus its mode.

use std::time::SystemTime;

use exec_mcp_shell::LocalShell;

/// What kind of interpreter currently owns the session's input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// The plain shell is at the prompt
    Shell,
    /// A persistent code REPL is running inside the shell
    Repl,
}

/// A caller-addressed interactive session.
///
/// Holds the exclusively-owned process handle and the mode tag. The tag
/// lives inside the session, so destroying the session on reset clears it by
/// construction and a recreated session always starts in [`SessionMode::Shell`].
#[derive(Debug)]
pub struct Session {
    key: u32,
    shell: LocalShell,
    mode: SessionMode,
    created_at: SystemTime,
}

impl Session {
    /// Wrap a connected shell under the given key, starting in shell mode.
    pub fn new(key: u32, shell: LocalShell) -> Self {
        Self {
            key,
            shell,
            mode: SessionMode::Shell,
            created_at: SystemTime::now(),
        }
    }

    /// The caller-chosen session key.
    pub fn key(&self) -> u32 {
        self.key
    }

    /// The current mode tag.
    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Flip the mode tag.
    pub fn set_mode(&mut self, mode: SessionMode) {
        self.mode = mode;
    }

    /// Session creation time.
    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    /// Mutable access to the process handle.
    pub fn shell_mut(&mut self) -> &mut LocalShell {
        &mut self.shell
    }

    /// Shared access to the process handle.
    pub fn shell(&self) -> &LocalShell {
        &self.shell
    }
}
