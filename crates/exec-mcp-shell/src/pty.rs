//! Local interactive process handling with portable-pty.

use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtySize};
use std::io::{Read, Write};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use exec_mcp_core::{Error, Result};

/// Fixed terminal dimensions for spawned processes.
const ROWS: u16 = 24;
const COLS: u16 = 80;

/// Settle interval between drain attempts during a bounded read.
const READ_SETTLE: Duration = Duration::from_millis(10);

/// Exclusively-owned handle to one long-lived interactive process.
///
/// The handle accumulates everything the process writes over the lifetime of
/// one logical command; [`LocalShell::read`] returns both the accumulated
/// buffer and the increment since the previous read, and the accumulator is
/// cleared exactly once per command via `reset_accumulator`.
pub struct LocalShell {
    executable: String,
    master: Option<Box<dyn MasterPty + Send>>,
    child: Option<Box<dyn Child + Send + Sync>>,
    writer: Option<Box<dyn Write + Send>>,
    reader: Option<Box<dyn Read + Send>>,
    full_output: String,
}

impl std::fmt::Debug for LocalShell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalShell")
            .field("executable", &self.executable)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

impl LocalShell {
    /// Create a disconnected handle for the given executable.
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
            master: None,
            child: None,
            writer: None,
            reader: None,
            full_output: String::new(),
        }
    }

    /// Spawn the interactive process on a fresh PTY.
    ///
    /// Replaces any previously connected process. Fails with
    /// [`Error::Spawn`] if the executable cannot be started.
    pub fn connect(&mut self) -> Result<()> {
        self.close();

        info!("Spawning interactive process: '{}'", self.executable);

        let pty_system = native_pty_system();
        let pty_size = PtySize {
            rows: ROWS,
            cols: COLS,
            pixel_width: 0,
            pixel_height: 0,
        };

        let pair = pty_system.openpty(pty_size).map_err(|e| {
            error!("Failed to open PTY: {}", e);
            Error::Spawn(format!("failed to open PTY: {e}"))
        })?;

        let cmd = CommandBuilder::new(&self.executable);
        let child = pair.slave.spawn_command(cmd).map_err(|e| {
            error!("Failed to spawn '{}': {}", self.executable, e);
            Error::Spawn(format!("failed to spawn '{}': {e}", self.executable))
        })?;

        let writer = pair
            .master
            .take_writer()
            .map_err(|e| Error::Spawn(format!("failed to take writer: {e}")))?;
        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| Error::Spawn(format!("failed to clone reader: {e}")))?;

        // Reads must never block the acquisition loop, so the master fd is
        // switched to O_NONBLOCK.
        #[cfg(unix)]
        {
            if let Some(master_fd) = pair.master.as_raw_fd() {
                unsafe {
                    let flags = libc::fcntl(master_fd, libc::F_GETFL, 0);
                    if flags != -1 {
                        let result =
                            libc::fcntl(master_fd, libc::F_SETFL, flags | libc::O_NONBLOCK);
                        if result == -1 {
                            error!("Failed to set master PTY to non-blocking mode");
                        } else {
                            debug!("Set master PTY FD {} to non-blocking mode", master_fd);
                        }
                    }
                }
            }
        }

        self.master = Some(pair.master);
        self.child = Some(child);
        self.writer = Some(writer);
        self.reader = Some(reader);
        self.full_output.clear();

        info!("Process spawned successfully: '{}'", self.executable);
        Ok(())
    }

    /// Whether a process is currently attached to this handle.
    pub fn is_connected(&self) -> bool {
        self.child.is_some()
    }

    /// Send one line of input to the process.
    ///
    /// A trailing newline is appended so the shell or REPL executes the
    /// text. Fails with [`Error::ConnectionLost`] when the channel is gone.
    pub fn send(&mut self, text: &str) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| Error::ConnectionLost("session is not connected".to_string()))?;

        debug!("Sending {} bytes to process", text.len() + 1);
        writer
            .write_all(text.as_bytes())
            .and_then(|_| writer.write_all(b"\n"))
            .and_then(|_| writer.flush())
            .map_err(|e| Error::ConnectionLost(format!("write failed: {e}")))
    }

    /// Bounded read of process output.
    ///
    /// Returns `(full, delta)`: the buffer accumulated since the start of
    /// the current command and the increment produced by this call. Waits at
    /// most `timeout`, returning earlier once output stops arriving for one
    /// settle interval. `reset_accumulator` clears the buffer first; callers
    /// pass it exactly once per logical command.
    pub async fn read(
        &mut self,
        timeout: Duration,
        reset_accumulator: bool,
    ) -> Result<(String, String)> {
        if reset_accumulator {
            self.full_output.clear();
        }

        let deadline = Instant::now() + timeout;
        let mut delta = String::new();

        loop {
            let chunk = self.drain_available()?;
            if !chunk.is_empty() {
                delta.push_str(&chunk);
            }
            if Instant::now() >= deadline {
                break;
            }
            if chunk.is_empty() && !delta.is_empty() {
                // Output settled.
                break;
            }
            tokio::time::sleep(READ_SETTLE).await;
        }

        if !delta.is_empty() {
            debug!("Read {} new bytes from process", delta.len());
        }
        self.full_output.push_str(&delta);
        Ok((self.full_output.clone(), delta))
    }

    /// Drain everything currently available from the non-blocking reader.
    fn drain_available(&mut self) -> Result<String> {
        let reader = self
            .reader
            .as_mut()
            .ok_or_else(|| Error::ConnectionLost("session is not connected".to_string()))?;

        let mut collected = Vec::new();
        let mut buffer = [0u8; 4096];

        loop {
            match reader.read(&mut buffer) {
                Ok(0) => {
                    if collected.is_empty() {
                        return Err(Error::ConnectionLost(
                            "process closed the terminal".to_string(),
                        ));
                    }
                    break;
                }
                Ok(n) => collected.extend_from_slice(&buffer[..n]),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(e) => return Err(Error::ConnectionLost(format!("read failed: {e}"))),
            }
        }

        Ok(String::from_utf8_lossy(&collected).into_owned())
    }

    /// Kill the process and release all PTY resources. Idempotent.
    pub fn close(&mut self) {
        if let Some(child) = self.child.as_mut() {
            info!("Closing interactive process: '{}'", self.executable);
            let _ = child.kill();
            let _ = child.wait();
        }
        self.child = None;
        self.writer = None;
        self.reader = None;
        self.master = None;
        self.full_output.clear();
    }
}

impl Drop for LocalShell {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_disconnected() {
        let shell = LocalShell::new("/bin/sh");
        assert!(!shell.is_connected());
    }

    #[test]
    fn test_connect_spawns_process() {
        let mut shell = LocalShell::new("/bin/sh");
        assert!(shell.connect().is_ok());
        assert!(shell.is_connected());
    }

    #[test]
    fn test_connect_nonexistent_executable_fails() {
        let mut shell = LocalShell::new("/nonexistent/shell");
        let result = shell.connect();
        assert!(matches!(result, Err(Error::Spawn(_))));
        assert!(!shell.is_connected());
    }

    #[test]
    fn test_send_without_connect_is_connection_lost() {
        let mut shell = LocalShell::new("/bin/sh");
        let result = shell.send("echo hi");
        assert!(matches!(result, Err(Error::ConnectionLost(_))));
    }

    #[tokio::test]
    async fn test_send_and_read_roundtrip() {
        let mut shell = LocalShell::new("/bin/sh");
        shell.connect().unwrap();
        shell.send("echo roundtrip-marker").unwrap();

        let (full, delta) = shell.read(Duration::from_secs(5), true).await.unwrap();
        assert!(full.contains("roundtrip-marker"));
        assert_eq!(full, delta);
    }

    #[tokio::test]
    async fn test_read_accumulates_across_calls() {
        let mut shell = LocalShell::new("/bin/sh");
        shell.connect().unwrap();

        shell.send("echo first-chunk").unwrap();
        let (full, _) = shell.read(Duration::from_secs(5), true).await.unwrap();
        assert!(full.contains("first-chunk"));

        shell.send("echo second-chunk").unwrap();
        let (full, delta) = shell.read(Duration::from_secs(5), false).await.unwrap();
        assert!(full.contains("first-chunk"));
        assert!(full.contains("second-chunk"));
        assert!(!delta.contains("first-chunk"));
    }

    #[tokio::test]
    async fn test_reset_accumulator_clears_previous_output() {
        let mut shell = LocalShell::new("/bin/sh");
        shell.connect().unwrap();

        shell.send("echo stale-output").unwrap();
        shell.read(Duration::from_secs(5), true).await.unwrap();

        shell.send("echo fresh-output").unwrap();
        let (full, _) = shell.read(Duration::from_secs(5), true).await.unwrap();
        assert!(!full.contains("stale-output"));
        assert!(full.contains("fresh-output"));
    }

    #[tokio::test]
    async fn test_read_times_out_without_output() {
        let mut shell = LocalShell::new("/bin/sh");
        shell.connect().unwrap();
        // Let the shell settle, then drain whatever banner it printed.
        shell.read(Duration::from_millis(500), true).await.unwrap();

        let start = Instant::now();
        let (_, delta) = shell.read(Duration::from_millis(300), true).await.unwrap();
        assert!(delta.is_empty());
        assert!(start.elapsed() >= Duration::from_millis(300));
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut shell = LocalShell::new("/bin/sh");
        shell.connect().unwrap();
        shell.close();
        assert!(!shell.is_connected());
        shell.close();
        assert!(!shell.is_connected());
    }
}
