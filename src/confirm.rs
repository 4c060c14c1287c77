//! Confirmation gate shown before a reset touches anything.

use inquire::Confirm;
use tracing::info;

// ─────────────────────────────────────────────────────────────────────────────
// Confirmation
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome of the confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// The user explicitly confirmed the reset.
    Reset,
    /// The user declined, or dismissed the prompt some other way.
    Cancel,
}

/// Yes/no gate in front of the orchestrator. Blocking from the caller's
/// perspective; no side effects beyond the returned outcome.
pub trait ConfirmationGate {
    fn prompt(&self, message: &str) -> Confirmation;
}

// ─────────────────────────────────────────────────────────────────────────────
// Gates
// ─────────────────────────────────────────────────────────────────────────────

/// Interactive terminal prompt, defaulting to "no".
pub struct TerminalGate;

impl ConfirmationGate for TerminalGate {
    fn prompt(&self, message: &str) -> Confirmation {
        // Esc, Ctrl-C, and prompt failures all count as a dismissal.
        match Confirm::new(message).with_default(false).prompt() {
            Ok(true) => Confirmation::Reset,
            Ok(false) => Confirmation::Cancel,
            Err(err) => {
                info!("[RESET] confirmation prompt dismissed: {}", err);
                Confirmation::Cancel
            }
        }
    }
}

/// Non-interactive gate for `--yes`.
pub struct AssumeYes;

impl ConfirmationGate for AssumeYes {
    fn prompt(&self, _message: &str) -> Confirmation {
        Confirmation::Reset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assume_yes_always_confirms() {
        assert_eq!(
            AssumeYes.prompt("Are you sure?"),
            Confirmation::Reset
        );
    }
}
