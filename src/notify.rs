//! User-facing notification sink.

use console::style;

// ─────────────────────────────────────────────────────────────────────────────
// Severity
// ─────────────────────────────────────────────────────────────────────────────

/// How a notification is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
}

/// Fire-and-forget notification sink; no acknowledgement, no failure path.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);
}

// ─────────────────────────────────────────────────────────────────────────────
// ConsoleNotifier
// ─────────────────────────────────────────────────────────────────────────────

/// Renders notifications to the terminal: success to stdout, errors to stderr.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Success => println!("{}", style(message).green()),
            Severity::Error => eprintln!("{}", style(message).red().bold()),
        }
    }
}
