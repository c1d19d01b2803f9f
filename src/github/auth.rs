//! Hosting API credentials.
//!
//! The token is read from an environment variable only; it never appears in
//! the configuration file. Logs only ever show [`redact_token`] output.

/// Read the bearer token from `env_var`. Empty values count as unset.
pub fn resolve_token(env_var: &str) -> Option<String> {
    match std::env::var(env_var) {
        Ok(value) if !value.trim().is_empty() => {
            tracing::debug!("Using hosting API token {}", redact_token(value.trim()));
            Some(value.trim().to_string())
        }
        _ => {
            tracing::warn!(
                "{} is not set, hosting API requests will be unauthenticated",
                env_var
            );
            None
        }
    }
}

/// Redact a token for safe logging.
///
/// Shows only the first few characters to help identify which token is in use
/// without exposing the full secret.
pub fn redact_token(token: &str) -> String {
    match token.char_indices().nth(4) {
        Some((cut, _)) => format!("{}...", &token[..cut]),
        None => "****".to_string(),
    }
}
