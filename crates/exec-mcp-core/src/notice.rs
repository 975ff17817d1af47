//! Templated notices describing why output acquisition stopped.
//!
//! A notice is not an error: acquisition that ends on a timeout or a
//! suspected dialog still returns successful text, with the notice appended
//! after whatever output was captured.

use std::collections::HashMap;
use std::path::Path;

/// The reason a notice is being rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeKind {
    /// No output at all within the first-output timeout
    NoOutput,
    /// Output stopped arriving within the between-output timeout
    Stalled,
    /// The maximum execution time was reached
    MaxDuration,
    /// The output tail looks like an interactive yes/no or free-text prompt
    DialogSuspected,
    /// A session was reset on request
    Reset,
}

impl NoticeKind {
    /// Template file name for this kind, used by [`NoticeCatalog::from_dir`].
    pub fn template_name(&self) -> &'static str {
        match self {
            NoticeKind::NoOutput => "no_output.md",
            NoticeKind::Stalled => "stalled.md",
            NoticeKind::MaxDuration => "max_time.md",
            NoticeKind::DialogSuspected => "dialog.md",
            NoticeKind::Reset => "reset.md",
        }
    }

    fn all() -> [NoticeKind; 5] {
        [
            NoticeKind::NoOutput,
            NoticeKind::Stalled,
            NoticeKind::MaxDuration,
            NoticeKind::DialogSuspected,
            NoticeKind::Reset,
        ]
    }

    fn builtin_template(&self) -> &'static str {
        match self {
            NoticeKind::NoOutput => {
                "[SYSTEM: No output returned within {{timeout}} seconds. The command may be \
                 running silently or waiting for input. Use poll_output to check again later.]"
            }
            NoticeKind::Stalled => {
                "[SYSTEM: No new output in {{timeout}} seconds. The command may still be \
                 running. Use poll_output to collect further output, or reset_session if it \
                 appears stuck.]"
            }
            NoticeKind::MaxDuration => {
                "[SYSTEM: Reached the maximum execution time of {{timeout}} seconds. The \
                 command keeps running in the session; use poll_output to collect further \
                 output.]"
            }
            NoticeKind::DialogSuspected => {
                "[SYSTEM: No new output in {{timeout}} seconds and the last line looks like \
                 an interactive prompt. Answer it by sending the reply as the next command, \
                 or reset_session to abort.]"
            }
            NoticeKind::Reset => "[SYSTEM: Terminal session has been reset.]",
        }
    }
}

/// Catalog of notice templates.
///
/// Each template may contain a `{{timeout}}` placeholder. A kind with no
/// template degrades to a bracketed placeholder string at render time rather
/// than failing the call.
#[derive(Debug, Clone)]
pub struct NoticeCatalog {
    templates: HashMap<NoticeKind, String>,
}

impl NoticeCatalog {
    /// Catalog with the built-in template texts.
    pub fn builtin() -> Self {
        let templates = NoticeKind::all()
            .into_iter()
            .map(|kind| (kind, kind.builtin_template().to_string()))
            .collect();
        Self { templates }
    }

    /// Load templates from a directory, one file per kind.
    ///
    /// A kind whose file is absent or unreadable keeps the built-in text.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Self {
        let mut catalog = Self::builtin();
        for kind in NoticeKind::all() {
            let path = dir.as_ref().join(kind.template_name());
            if let Ok(content) = std::fs::read_to_string(&path) {
                catalog.templates.insert(kind, content.trim().to_string());
            }
        }
        catalog
    }

    /// Catalog with no templates at all; every render degrades.
    #[cfg(test)]
    pub(crate) fn empty() -> Self {
        Self {
            templates: HashMap::new(),
        }
    }

    /// Render the notice for `kind`, filling the `{{timeout}}` placeholder
    /// with the triggering timeout in whole seconds.
    pub fn render(&self, kind: NoticeKind, timeout: std::time::Duration) -> String {
        match self.templates.get(&kind) {
            Some(template) => template.replace("{{timeout}}", &timeout.as_secs().to_string()),
            None => format!("[notice template {} not found]", kind.template_name()),
        }
    }
}

impl Default for NoticeCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
