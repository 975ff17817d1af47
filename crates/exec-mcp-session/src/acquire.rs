//! Output acquisition: deciding when a command's output is complete.
//!
//! Shells and REPLs never say "done", so completion is inferred. The poll
//! loop in [`wait_for_output`] only does I/O; every stop-or-continue call is
//! made by the pure [`decide`] function, which keeps the timeout escalation
//! and pattern matching unit-testable without a real subprocess.
//!
//! Detection is best-effort by design: output that merely resembles a shell
//! prompt returns early, and a quiet command is indistinguishable from a
//! stuck one until a timeout fires. Timeouts are not errors; they produce a
//! notice appended to whatever output was captured.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use exec_mcp_core::{patterns, sanitize, NoticeCatalog, NoticeKind, Result, TimeoutBudget};
use exec_mcp_shell::LocalShell;

/// Fixed delay between poll iterations.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Bound on each per-iteration read against the process.
pub const READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Why an acquisition stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The output tail matched a shell prompt pattern (the success path)
    Prompt,
    /// The maximum execution time elapsed
    MaxDuration,
    /// Nothing arrived within the first-output timeout
    NoOutput,
    /// Output stopped arriving within the between-output timeout
    Stalled,
    /// The output tail looks like an interactive dialog
    DialogSuspected,
}

impl StopReason {
    /// The notice for this stop, with the timeout value that triggered it.
    /// `Prompt` is the success path and carries no notice.
    pub fn notice(&self, budget: &TimeoutBudget) -> Option<(NoticeKind, Duration)> {
        match self {
            StopReason::Prompt => None,
            StopReason::MaxDuration => Some((NoticeKind::MaxDuration, budget.max_exec)),
            StopReason::NoOutput => Some((NoticeKind::NoOutput, budget.first_output)),
            StopReason::Stalled => Some((NoticeKind::Stalled, budget.between_output)),
            StopReason::DialogSuspected => Some((NoticeKind::DialogSuspected, budget.dialog)),
        }
    }
}

/// Outcome of one poll iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollDecision {
    /// Keep polling
    Continue,
    /// Stop and return the accumulated output
    Stop(StopReason),
}

/// Per-call acquisition options.
#[derive(Debug, Clone, Copy)]
pub struct AcquireOptions {
    /// Timeout budget for this call (process defaults or a per-call override)
    pub budget: TimeoutBudget,
    /// Clear the driver's accumulated buffer on the first read.
    /// True for a fresh command, false for a non-destructive poll.
    pub reset_accumulator: bool,
}

impl AcquireOptions {
    /// Options for a fresh command with the given budget.
    pub fn command(budget: TimeoutBudget) -> Self {
        Self {
            budget,
            reset_accumulator: true,
        }
    }

    /// Options for a non-destructive poll of accumulated output.
    pub fn poll(budget: TimeoutBudget) -> Self {
        Self {
            budget,
            reset_accumulator: false,
        }
    }
}

/// The pure per-iteration decision.
///
/// Checks run in fixed priority order:
/// 1. new output whose tail matches a shell prompt - stop, success;
/// 2. max execution time elapsed - stop, whatever the output state;
/// 3. no output yet and the first-output timeout elapsed - stop;
/// 4. output seen but stalled past the between-output timeout - stop;
/// 5. quiet past the dialog timeout with a dialog-looking tail - stop early.
pub fn decide(
    budget: &TimeoutBudget,
    elapsed: Duration,
    since_last_output: Duration,
    got_output: bool,
    new_output: bool,
    output: &str,
) -> PollDecision {
    if new_output && patterns::ends_with_prompt(output) {
        return PollDecision::Stop(StopReason::Prompt);
    }

    if elapsed >= budget.max_exec {
        return PollDecision::Stop(StopReason::MaxDuration);
    }

    if !got_output {
        if elapsed >= budget.first_output {
            return PollDecision::Stop(StopReason::NoOutput);
        }
        return PollDecision::Continue;
    }

    if since_last_output >= budget.between_output {
        return PollDecision::Stop(StopReason::Stalled);
    }

    if since_last_output >= budget.dialog && patterns::ends_with_dialog(output) {
        return PollDecision::Stop(StopReason::DialogSuspected);
    }

    PollDecision::Continue
}

/// Poll the session's process until [`decide`] stops the acquisition, and
/// render the result.
///
/// Timeout and dialog stops return the captured output with a notice
/// appended - never an error. Transport failures from the driver propagate.
/// Every suspension point is an await, so dropping the future cancels the
/// acquisition between iterations.
pub async fn wait_for_output(
    shell: &mut LocalShell,
    opts: &AcquireOptions,
    notices: &NoticeCatalog,
) -> Result<String> {
    let start = Instant::now();
    let mut last_output = start;
    let mut got_output = false;
    let mut reset_accumulator = opts.reset_accumulator;
    let mut cleaned = String::new();

    loop {
        tokio::time::sleep(POLL_INTERVAL).await;

        let (full, delta) = shell.read(READ_TIMEOUT, reset_accumulator).await?;
        reset_accumulator = false; // only reset once per command

        let new_output = !delta.is_empty();
        if new_output {
            cleaned = sanitize::fix_output(&full);
            last_output = Instant::now();
            got_output = true;
        } else if cleaned.is_empty() && !full.is_empty() {
            // Non-destructive poll: surface the buffer accumulated before
            // this call, without treating it as fresh output.
            cleaned = sanitize::fix_output(&full);
        }

        let decision = decide(
            &opts.budget,
            start.elapsed(),
            last_output.elapsed(),
            got_output,
            new_output,
            &cleaned,
        );

        match decision {
            PollDecision::Continue => {}
            PollDecision::Stop(StopReason::Prompt) => {
                info!("Detected shell prompt, returning output early");
                return Ok(cleaned);
            }
            PollDecision::Stop(reason) => {
                debug!("Acquisition stopped: {:?}", reason);
                return Ok(finish_with_notice(cleaned, reason, &opts.budget, notices));
            }
        }
    }
}

/// Append the notice for a non-prompt stop to the captured output.
fn finish_with_notice(
    output: String,
    reason: StopReason,
    budget: &TimeoutBudget,
    notices: &NoticeCatalog,
) -> String {
    let Some((kind, timeout)) = reason.notice(budget) else {
        return output;
    };
    let notice = notices.render(kind, timeout);
    if output.is_empty() {
        notice
    } else {
        format!("{output}\n\n{notice}")
    }
}
