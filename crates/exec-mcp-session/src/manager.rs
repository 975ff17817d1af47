//! Session lifecycle: creation, initialization and reset.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{info, warn};

use exec_mcp_core::{Result, ShellSettings};
use exec_mcp_shell::LocalShell;

use crate::registry::SessionRegistry;
use crate::session::Session;

/// Grace read issued after each init command before the session is handed
/// out. Init commands are fire-and-forget; their output is discarded and
/// failures are not detected.
const INIT_GRACE: Duration = Duration::from_secs(2);

/// Creates, resets and destroys sessions through the registry.
#[derive(Debug)]
pub struct SessionManager {
    registry: SessionRegistry,
    settings: ShellSettings,
}

impl SessionManager {
    /// Create a manager with an empty registry.
    pub fn new(settings: ShellSettings) -> Self {
        Self {
            registry: SessionRegistry::new(),
            settings,
        }
    }

    /// Return the live session for `key`, creating it lazily on first use.
    ///
    /// Creating a session for a key that already has a live process is a
    /// no-op returning the existing handle.
    pub async fn ensure_session(&self, key: u32) -> Result<Arc<Mutex<Session>>> {
        if let Some(existing) = self.registry.get(key).await {
            return Ok(existing);
        }

        info!(
            "Creating session {}: executable='{}'",
            key, self.settings.executable
        );
        let mut shell = LocalShell::new(self.settings.executable.clone());
        shell.connect()?;

        for command in &self.settings.init_commands {
            if let Err(e) = shell.send(command) {
                warn!("Init command failed to send on session {}: {}", key, e);
            }
            let _ = shell.read(INIT_GRACE, false).await;
        }

        Ok(self.registry.insert(key, Session::new(key, shell)).await)
    }

    /// Close and remove the session for `key`, or every session when `None`.
    ///
    /// Locks each affected session first, so a reset waits out any in-flight
    /// poll instead of closing a handle that is being read. The process is
    /// closed before the map entry is removed. Sessions under other keys are
    /// untouched.
    pub async fn reset(&self, key: Option<u32>) {
        let keys = match key {
            Some(k) => vec![k],
            None => self.registry.keys().await,
        };

        for k in keys {
            if let Some(handle) = self.registry.get(k).await {
                {
                    let mut session = handle.lock().await;
                    info!("Closing session {}", k);
                    session.shell_mut().close();
                }
                self.registry.remove(k).await;
            }
        }
    }

    /// Reset one key and create a fresh session for it.
    ///
    /// Used by the dispatcher's transport-failure recovery. Any output
    /// accumulated by the old process is discarded with it.
    pub async fn recreate(&self, key: u32) -> Result<Arc<Mutex<Session>>> {
        self.reset(Some(key)).await;
        self.ensure_session(key).await
    }

    /// Number of live sessions.
    pub async fn session_count(&self) -> usize {
        self.registry.count().await
    }
}
