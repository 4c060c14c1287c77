//! Org configuration for the reset client.

use secrecy::SecretString;
use url::Url;

use crate::error::AppError;

/// Environment variable consulted when `--access-token` is not given.
pub const ACCESS_TOKEN_ENV: &str = "SALESFORCE_ACCESS_TOKEN";

// ─────────────────────────────────────────────────────────────────────────────
// OrgConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Salesforce org configuration for API access.
///
/// The access token is wrapped in `SecretString` to prevent accidental
/// exposure through `Debug` traits or logging.
#[derive(Clone)]
pub struct OrgConfig {
    /// Instance URL (e.g., "https://na1.salesforce.com")
    pub instance_url: Url,
    /// OAuth access token (wrapped for security)
    pub access_token: SecretString,
}

impl std::fmt::Debug for OrgConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrgConfig")
            .field("instance_url", &self.instance_url.as_str())
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

impl OrgConfig {
    /// Builds the config from the CLI inputs, falling back to the environment
    /// for the token.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotAuthenticated` when no token is available from
    /// either source.
    pub fn resolve(instance_url: Url, access_token: Option<String>) -> Result<Self, AppError> {
        let token = access_token
            .or_else(|| std::env::var(ACCESS_TOKEN_ENV).ok())
            .filter(|t| !t.trim().is_empty())
            .ok_or(AppError::NotAuthenticated)?;

        Ok(Self {
            instance_url,
            access_token: SecretString::from(token),
        })
    }
}
