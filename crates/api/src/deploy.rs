//! Deployment flags and environment variable names read by the server.

/// Directory holding `pgl.db` (default `data`).
pub const ENV_DATA_DIR: &str = "PGL_DATA_DIR";

/// `open` (default) or `closed`; closed rejects self-registration.
pub const ENV_REGISTRATION: &str = "PGL_REGISTRATION";

/// Shared secret for `POST /api/webhooks/replies` signatures.
pub const ENV_WEBHOOK_SECRET: &str = "PGL_WEBHOOK_SECRET";

/// HTTP mail relay endpoint. Pitches are only logged when unset.
pub const ENV_MAIL_RELAY_URL: &str = "PGL_MAIL_RELAY_URL";
pub const ENV_MAIL_RELAY_KEY: &str = "PGL_MAIL_RELAY_KEY";
pub const ENV_MAIL_FROM: &str = "PGL_MAIL_FROM";

/// OpenAI-compatible endpoint for bio/angle/pitch generation.
pub const ENV_LLM_BASE_URL: &str = "PGL_LLM_BASE_URL";
pub const ENV_LLM_API_KEY: &str = "PGL_LLM_API_KEY";
pub const ENV_LLM_MODEL: &str = "PGL_LLM_MODEL";

/// Env var selecting the match score plugin used during discovery.
pub const ENV_MATCH_PLUGIN: &str = "PGL_MATCH_PLUGIN";

/// Minimum score for a discovered match suggestion.
pub const ENV_MATCH_THRESHOLD: &str = "PGL_MATCH_THRESHOLD";

/// Static web assets served as a SPA fallback when the directory exists.
pub const ENV_WEB_DIR: &str = "PGL_WEB_DIR";

/// Mark the session cookie `Secure`.
pub const ENV_SECURE_COOKIES: &str = "PGL_SECURE_COOKIES";

/// Whether a `PGL_REGISTRATION` value allows self-registration.
pub fn registration_open(raw: Option<&str>) -> bool {
    !matches!(
        raw.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("closed" | "off" | "false" | "0")
    )
}

/// Parse a human-friendly boolean env flag value.
///
/// Accepted truthy values:
/// - `1`
/// - `true`
/// - `yes`
/// - `on`
pub fn parse_bool_flag(raw: Option<&str>, default: bool) -> bool {
    raw.map(|value| {
        matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
    .unwrap_or(default)
}
