//! Fixed prompt and dialog pattern sets for completion inference.
//!
//! Shells and REPLs give no protocol-level "command finished" signal, so the
//! acquisition engine classifies the tail of the output instead. A match
//! against a prompt pattern means the shell is back at an idle prompt; a
//! match against a dialog pattern means the process is probably blocked on
//! an interactive question. Both are best-effort heuristics: output that
//! merely resembles a prompt causes an early return.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Shell prompt forms, checked against the trailing lines of output.
    static ref PROMPT_PATTERNS: Vec<Regex> = vec![
        // (venv) user@host:~/dir$
        Regex::new(r"\(venv\).+[$#] ?$").unwrap(),
        // root@container:~#
        Regex::new(r"root@[^:]+:[^#]+# ?$").unwrap(),
        // user@host:~$
        Regex::new(r"[a-zA-Z0-9_.-]+@[^:]+:[^$#]+[$#] ?$").unwrap(),
        // bash-5.2$
        Regex::new(r"bash-\d+\.\d+\$ ?$").unwrap(),
    ];

    /// Interactive dialog markers.
    static ref DIALOG_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)Y/N").unwrap(),
        Regex::new(r"(?i)yes/no").unwrap(),
        Regex::new(r":\s*$").unwrap(),
        Regex::new(r"\?\s*$").unwrap(),
    ];
}

/// Number of trailing non-empty lines inspected for a shell prompt.
const PROMPT_TAIL_LINES: usize = 3;

/// Number of trailing non-empty lines inspected for a dialog marker.
const DIALOG_TAIL_LINES: usize = 2;

fn tail_lines(text: &str, count: usize) -> impl Iterator<Item = &str> {
    text.lines()
        .rev()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(count)
}

/// Whether the output tail looks like an idle shell prompt.
///
/// Inspects the last up-to-3 non-empty lines, most recent first.
pub fn ends_with_prompt(text: &str) -> bool {
    tail_lines(text, PROMPT_TAIL_LINES)
        .any(|line| PROMPT_PATTERNS.iter().any(|pat| pat.is_match(line)))
}

/// Whether the output tail looks like an interactive dialog awaiting input.
///
/// Inspects the last up-to-2 non-empty lines.
pub fn ends_with_dialog(text: &str) -> bool {
    tail_lines(text, DIALOG_TAIL_LINES)
        .any(|line| DIALOG_PATTERNS.iter().any(|pat| pat.is_match(line)))
}
