//! Command dispatch: mode switching, send, and retry-on-disconnect.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use exec_mcp_core::{NoticeCatalog, NoticeKind, Result, ServerConfig, ShellSettings, TimeoutBudget};

use crate::acquire::{wait_for_output, AcquireOptions};
use crate::manager::SessionManager;
use crate::session::{Session, SessionMode};

/// Grace delay after sending the REPL exit command.
const REPL_EXIT_GRACE: Duration = Duration::from_millis(200);

/// Grace delay after starting the REPL, before its banner is discarded.
const REPL_START_GRACE: Duration = Duration::from_millis(300);

/// Bounded read used to discard mode-switch output.
const DISCARD_READ_TIMEOUT: Duration = Duration::from_secs(1);

/// What kind of interpreter a command is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// A plain shell command
    Terminal,
    /// Code for the persistent REPL
    ReplCode,
}

/// Sends commands into sessions and returns their acquired output.
///
/// One dispatch per session key at a time; issuing a second command into a
/// session before the first completes serializes on the session lock with
/// undefined output interleaving, and is the caller's responsibility to
/// avoid.
#[derive(Debug)]
pub struct CommandDispatcher {
    manager: Arc<SessionManager>,
    settings: ShellSettings,
    defaults: TimeoutBudget,
    notices: NoticeCatalog,
}

impl CommandDispatcher {
    /// Create a dispatcher over the given manager.
    pub fn new(manager: Arc<SessionManager>, config: &ServerConfig, notices: NoticeCatalog) -> Self {
        Self {
            manager,
            settings: config.shell.clone(),
            defaults: config.timeouts.budget(),
            notices,
        }
    }

    /// Execute a command in the session with the process-wide timeouts.
    pub async fn execute(&self, key: u32, text: &str, kind: CommandKind) -> Result<String> {
        self.execute_with(key, text, kind, None).await
    }

    /// Execute a command with an optional per-call timeout override.
    ///
    /// On a transport failure the session is fully reset, recreated, and the
    /// command resent exactly once; output captured by the failed attempt is
    /// discarded with the old process. A second transport failure is fatal.
    pub async fn execute_with(
        &self,
        key: u32,
        text: &str,
        kind: CommandKind,
        budget: Option<TimeoutBudget>,
    ) -> Result<String> {
        let budget = budget.unwrap_or(self.defaults);

        match self.try_execute(key, text, kind, budget).await {
            Err(e) if e.is_transport() => {
                warn!(
                    "Transport failure on session {}: {}; recreating and retrying once",
                    key, e
                );
                self.manager.reset(Some(key)).await;
                self.try_execute(key, text, kind, budget).await
            }
            other => other,
        }
    }

    async fn try_execute(
        &self,
        key: u32,
        text: &str,
        kind: CommandKind,
        budget: TimeoutBudget,
    ) -> Result<String> {
        let handle = self.manager.ensure_session(key).await?;
        let mut session = handle.lock().await;

        self.switch_mode(&mut session, kind).await;

        info!(
            "Executing in session {} ({:?}): {}",
            key,
            kind,
            preview(text)
        );
        session.shell_mut().send(text)?;

        let opts = AcquireOptions::command(budget);
        wait_for_output(session.shell_mut(), &opts, &self.notices).await
    }

    /// Enforce the mode-switch rule before sending a command.
    ///
    /// Both transitions are fire-and-forget: the exit/startup exchange is
    /// discarded entirely and its failures are not surfaced.
    async fn switch_mode(&self, session: &mut Session, kind: CommandKind) {
        match (session.mode(), kind) {
            (SessionMode::Repl, CommandKind::Terminal) => {
                info!(
                    "Session {} is in REPL mode; exiting REPL to run shell command",
                    session.key()
                );
                let _ = session.shell_mut().send(&self.settings.repl_exit_command);
                tokio::time::sleep(REPL_EXIT_GRACE).await;
                let _ = session
                    .shell_mut()
                    .read(DISCARD_READ_TIMEOUT, true)
                    .await;
                session.set_mode(SessionMode::Shell);
            }
            (SessionMode::Shell, CommandKind::ReplCode) => {
                info!(
                    "Starting REPL '{}' in session {}",
                    self.settings.repl_command,
                    session.key()
                );
                let _ = session.shell_mut().send(&self.settings.repl_command);
                tokio::time::sleep(REPL_START_GRACE).await;
                let _ = session
                    .shell_mut()
                    .read(DISCARD_READ_TIMEOUT, true)
                    .await;
                session.set_mode(SessionMode::Repl);
            }
            _ => {}
        }
    }

    /// Non-destructive read of a session's accumulated output.
    ///
    /// No command is sent; the session is created lazily like any other
    /// first use of a key.
    pub async fn poll(&self, key: u32) -> Result<String> {
        self.poll_with(key, None).await
    }

    /// [`CommandDispatcher::poll`] with an optional per-call timeout override.
    pub async fn poll_with(&self, key: u32, budget: Option<TimeoutBudget>) -> Result<String> {
        let budget = budget.unwrap_or(self.defaults);
        let handle = self.manager.ensure_session(key).await?;
        let mut session = handle.lock().await;

        let opts = AcquireOptions::poll(budget);
        wait_for_output(session.shell_mut(), &opts, &self.notices).await
    }

    /// Reset a session, returning the confirmation notice.
    pub async fn reset(&self, key: u32, reason: Option<&str>) -> String {
        match reason {
            Some(reason) => info!("Resetting session {}... Reason: {}", key, reason),
            None => info!("Resetting session {}...", key),
        }
        self.manager.reset(Some(key)).await;
        self.notices.render(NoticeKind::Reset, Duration::ZERO)
    }
}

/// Compress a command for log output: collapsed whitespace, bounded length.
fn preview(command: &str) -> String {
    let collapsed = command.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut preview: String = collapsed.chars().take(100).collect();
    if collapsed.chars().count() > 100 {
        preview.push_str("...");
    }
    preview
}
