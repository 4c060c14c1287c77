use thiserror::Error;

/// Patterns (lowercase) that indicate sensitive data not safe for UI display.
/// Used by `contains_sensitive()` for case-insensitive matching.
pub(crate) const SENSITIVE_PATTERNS: &[&str] = &[
    "bearer ",
    "refresh_token",
    "access_token",
    "client_secret",
    "authorization:",
];

/// Returns true if the message contains any sensitive pattern (case-insensitive).
fn contains_sensitive(msg: &str) -> bool {
    let lower = msg.to_ascii_lowercase();
    SENSITIVE_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Sanitizes a message for UI display.
/// If sensitive content is detected, returns the fallback instead.
fn sanitize_message(msg: &str, fallback: &str) -> String {
    if contains_sensitive(msg) {
        fallback.into()
    } else {
        msg.to_string()
    }
}

/// Application-wide error type.
#[derive(Debug, Error)]
pub enum AppError {
    // ── Auth ──────────────────────────────────────────────────────────────────
    #[error("Not authenticated")]
    NotAuthenticated,

    // ── API ───────────────────────────────────────────────────────────────────
    #[error("Salesforce error: {0}")]
    SalesforceError(String),

    #[error("Rate limited")]
    RateLimited { retry_after_secs: Option<u64> },

    // ── Network ───────────────────────────────────────────────────────────────
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    // ── Generic fallback ──────────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Converts the error into the message shown in a user-facing notification.
    /// Backend messages pass through verbatim unless they would leak secrets,
    /// tokens, or sensitive URL parameters.
    pub fn user_message(&self) -> String {
        match self {
            AppError::NotAuthenticated => {
                "You need a valid Salesforce access token to continue.".into()
            }

            AppError::SalesforceError(msg) => sanitize_message(msg, "A Salesforce error occurred."),

            AppError::RateLimited { retry_after_secs } => match retry_after_secs {
                Some(secs) => format!(
                    "Salesforce is limiting requests. Please wait {} seconds before trying again.",
                    secs
                ),
                None => {
                    "Salesforce is limiting requests. Please wait a moment before trying again."
                        .into()
                }
            },

            AppError::ConnectionFailed(_) => {
                "Could not connect to Salesforce. Please check your internet connection.".into()
            }

            AppError::Internal(_) => "Something went wrong. Please try again.".into(),
        }
    }
}
