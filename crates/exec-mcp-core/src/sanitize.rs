//! Output sanitization.
//!
//! Two distinct passes with different jobs:
//!
//! - [`fix_output`] runs on every poll, before pattern matching and before
//!   the text is handed back from the acquisition engine. It normalizes
//!   lines and caps the buffer size.
//! - [`clean_final`] runs once on the final text crossing the tool boundary.
//!   It strips terminal escape sequences and emulates carriage-return
//!   overwrite semantics. Applying it twice yields the same result as once.

use lazy_static::lazy_static;
use regex::Regex;

/// Cap on the acquisition buffer, in characters. Larger outputs keep the
/// tail, since the most recent output is the most relevant.
pub const MAX_OUTPUT_CHARS: usize = 1_000_000;

lazy_static! {
    // Literal \xNN escape text, optionally preceded by a backslash. The
    // regex crate has no lookbehind, so the already-escaped form is captured
    // and kept in the replacement.
    static ref HEX_ESCAPE: Regex = Regex::new(r"(\\)?\\x[0-9A-Fa-f]{2}").unwrap();

    // ANSI/terminal escape sequences.
    static ref ANSI_ESCAPE: Regex = Regex::new(r"\x1B(?:[@-Z\\-_]|\[[0-?]*[ -/]*[@-~])").unwrap();

    // Interactive REPL echo artifacts at the start of the text: leading
    // blank/CR runs and `>` continuation markers.
    static ref LEADING_REPL_CR: Regex = Regex::new(r"^[ \r]*(?:\r*\n>[ \r]*)*").unwrap();
    static ref LEADING_REPL_GT: Regex = Regex::new(r"^(>\s*)+").unwrap();
}

/// Acquisition-time fix-up, applied to the full accumulated buffer on every
/// poll.
pub fn fix_output(raw: &str) -> String {
    fix_output_with_cap(raw, MAX_OUTPUT_CHARS)
}

/// [`fix_output`] with an explicit cap, for tests.
pub fn fix_output_with_cap(raw: &str, cap: usize) -> String {
    // Drop literal \xNN sequences unless escaped with a preceding backslash.
    let without_escapes = HEX_ESCAPE.replace_all(raw, |caps: &regex::Captures| {
        if caps.get(1).is_some() {
            caps[0].to_string()
        } else {
            String::new()
        }
    });

    let stripped: String = without_escapes
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n");

    truncate_to_tail(&stripped, cap)
}

/// Keep at most `cap` characters, retaining the trailing portion.
fn truncate_to_tail(text: &str, cap: usize) -> String {
    if cap == 0 {
        return String::new();
    }
    match text.char_indices().rev().nth(cap - 1) {
        Some((start, _)) => text[start..].to_string(),
        None => text.to_string(),
    }
}

/// Presentation-time cleaner, applied once to the final text handed to the
/// external caller.
pub fn clean_final(text: &str) -> String {
    let cleaned = ANSI_ESCAPE.replace_all(text, "");
    let cleaned = cleaned.replace('\0', "");
    let cleaned = LEADING_REPL_CR.replace(&cleaned, "");
    let cleaned = LEADING_REPL_GT.replace(&cleaned, "");
    let cleaned = cleaned.replace("\r\n", "\n");
    let cleaned = cleaned.trim_start_matches(['\r', ' ']);

    cleaned
        .split('\n')
        .map(overwrite_carriage_returns)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Emulate terminal carriage-return overwrite within one line: the last
/// non-blank `\r` segment wins. A line with no non-blank segment is left
/// untouched.
fn overwrite_carriage_returns(line: &str) -> String {
    match line
        .split('\r')
        .filter(|part| !part.trim().is_empty())
        .next_back()
    {
        Some(part) => part.trim_end().to_string(),
        None => line.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fix_output_removes_hex_escapes() {
        assert_eq!(fix_output(r"before\x1bafter"), "beforeafter");
        assert_eq!(fix_output(r"\x00\xff"), "");
    }

    #[test]
    fn test_fix_output_keeps_escaped_hex() {
        // A literal backslash before the sequence means it was already
        // escaped by the producer.
        assert_eq!(fix_output(r"keep \\x41 this"), r"keep \\x41 this");
    }

    #[test]
    fn test_fix_output_strips_each_line() {
        assert_eq!(fix_output("  a  \n\t b \n"), "a\nb");
    }

    #[test]
    fn test_fix_output_truncates_to_exact_cap_keeping_tail() {
        let long = "x".repeat(50) + "TAIL";
        let fixed = fix_output_with_cap(&long, 10);
        assert_eq!(fixed.chars().count(), 10);
        assert!(fixed.ends_with("TAIL"));
        assert_eq!(fixed, "xxxxxxTAIL");
    }

    #[test]
    fn test_fix_output_under_cap_untouched() {
        assert_eq!(fix_output_with_cap("short", 10), "short");
    }

    #[test]
    fn test_clean_final_strips_ansi() {
        assert_eq!(clean_final("\x1b[31mred\x1b[0m text"), "red text");
        assert_eq!(clean_final("\x1b[2J\x1b[Hcleared"), "cleared");
    }

    #[test]
    fn test_clean_final_removes_null_bytes() {
        assert_eq!(clean_final("a\0b\0c"), "abc");
    }

    #[test]
    fn test_clean_final_strips_repl_echo() {
        assert_eq!(clean_final("> > result"), "result");
        assert_eq!(clean_final(" \r\r\n> \r\n> 42"), "42");
    }

    #[test]
    fn test_clean_final_normalizes_crlf() {
        assert_eq!(clean_final("one\r\ntwo\r\nthree"), "one\ntwo\nthree");
    }

    #[test]
    fn test_clean_final_carriage_return_overwrite() {
        // Progress bars rewrite the line; only the final state survives.
        assert_eq!(clean_final("progress 10%\rprogress 50%\rdone   "), "done");
        assert_eq!(clean_final("a\rb\nkeep"), "b\nkeep");
    }

    #[test]
    fn test_clean_final_idempotent_on_fixtures() {
        let fixtures = [
            "plain text",
            "\x1b[31mred\x1b[0m\r\nline\rfinal",
            "> > echo\n\0mixed\rlast ",
            "",
            "trailing\n\n",
            "user@host:~$ ls\nfile.txt\nuser@host:~$ ",
            ">>> x = 1\n>>> x + 1\n2",
        ];
        for fixture in fixtures {
            let once = clean_final(fixture);
            let twice = clean_final(&once);
            assert_eq!(once, twice, "not idempotent for {fixture:?}");
        }
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn truncation_never_exceeds_cap(text in ".*", cap in 0usize..64) {
                let out = truncate_to_tail(&text, cap);
                prop_assert!(out.chars().count() <= cap);
                prop_assert!(text.ends_with(&out));
            }

            #[test]
            fn fix_output_lines_are_trimmed(raw in ".*") {
                let fixed = fix_output(&raw);
                for line in fixed.lines() {
                    prop_assert_eq!(line, line.trim());
                }
            }

            #[test]
            fn clean_final_removes_all_null_bytes(text in ".*") {
                prop_assert!(!clean_final(&text).contains('\0'));
            }
        }
    }
}
