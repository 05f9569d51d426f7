//! Shared business logic — framework-agnostic pure functions.
//!
//! Route handlers stay thin adapters: they call these validators, then the
//! `db` query builders.

use crate::{
    AuthTokenResponse, CreateBookingRequest, CreateCampaignRequest, CreatePodcastRequest,
    ServiceError, UpdateBookingRequest, UpdateCampaignRequest, UpdatePodcastRequest,
    UpsertMediaKitRequest, UserRole,
};

// ─── Validation ─────────────────────────────────────────────────────────────

pub const MAX_NAME_LEN: usize = 120;
pub const MAX_TEXT_LEN: usize = 10_000;
pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 128;

/// Collects validation messages so a form gets every problem at once.
#[derive(Debug, Default)]
pub struct Problems(Vec<String>);

impl Problems {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    /// Record the error message of a failed check, keeping the success value.
    pub fn check<T>(&mut self, result: Result<T, ServiceError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(ServiceError::Validation(details)) => {
                self.0.extend(details);
                None
            }
            Err(e) => {
                self.0.push(e.message().to_string());
                None
            }
        }
    }

    pub fn finish(self) -> Result<(), ServiceError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Validation(self.0))
        }
    }
}

/// Validate and normalize an email address. Returns the lowercased, trimmed email.
pub fn validate_email(email: &str) -> Result<String, ServiceError> {
    let email = email.trim().to_lowercase();
    let well_formed = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !well_formed || email.len() > 254 || email.contains(char::is_whitespace) {
        return Err(ServiceError::BadRequest("invalid email address".into()));
    }
    Ok(email)
}

/// Validate a password length (8-128 characters).
pub fn validate_password(password: &str) -> Result<(), ServiceError> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(ServiceError::BadRequest(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if len > MAX_PASSWORD_LEN {
        return Err(ServiceError::BadRequest(format!(
            "password must be at most {MAX_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate a required display name. Returns the trimmed value.
pub fn validate_name(field: &str, value: &str) -> Result<String, ServiceError> {
    let trimmed = value.trim().to_string();
    if trimmed.is_empty() {
        return Err(ServiceError::BadRequest(format!("{field} is required")));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(ServiceError::BadRequest(format!(
            "{field} must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(trimmed)
}

/// Validate an optional http(s) URL. Empty strings pass (they clear the field).
pub fn validate_url(field: &str, value: Option<&str>) -> Result<(), ServiceError> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(());
    };
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() && !host.contains(char::is_whitespace) => Ok(()),
        _ => Err(ServiceError::BadRequest(format!(
            "{field} must be an http(s) URL"
        ))),
    }
}

fn validate_text(field: &str, value: Option<&str>) -> Result<(), ServiceError> {
    match value {
        Some(v) if v.chars().count() > MAX_TEXT_LEN => Err(ServiceError::BadRequest(format!(
            "{field} must be at most {MAX_TEXT_LEN} characters"
        ))),
        _ => Ok(()),
    }
}

fn validate_audience(value: Option<i64>) -> Result<(), ServiceError> {
    match value {
        Some(n) if n < 0 => Err(ServiceError::BadRequest(
            "audience_size must not be negative".into(),
        )),
        _ => Ok(()),
    }
}

fn validate_optional_email(field: &str, value: Option<&str>) -> Result<(), ServiceError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => validate_email(v)
            .map(|_| ())
            .map_err(|_| ServiceError::BadRequest(format!("{field} must be a valid email"))),
        None => Ok(()),
    }
}

/// Validate an RFC 3339 or `YYYY-MM-DD HH:MM:SS` timestamp.
pub fn validate_datetime(field: &str, value: Option<&str>) -> Result<(), ServiceError> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(());
    };
    let ok = chrono::DateTime::parse_from_rfc3339(value).is_ok()
        || chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").is_ok();
    if ok {
        Ok(())
    } else {
        Err(ServiceError::BadRequest(format!(
            "{field} must be an RFC 3339 timestamp"
        )))
    }
}

pub fn validate_register(email: &str, password: &str, full_name: &str) -> Result<(), ServiceError> {
    let mut problems = Problems::new();
    problems.check(validate_email(email));
    problems.check(validate_password(password));
    problems.check(validate_name("full_name", full_name));
    problems.finish()
}

pub fn validate_create_podcast(req: &CreatePodcastRequest) -> Result<(), ServiceError> {
    let mut problems = Problems::new();
    problems.check(validate_name("title", &req.title));
    podcast_fields(
        &mut problems,
        req.host_email.as_deref(),
        req.website_url.as_deref(),
        req.rss_url.as_deref(),
        req.description.as_deref(),
        req.audience_size,
    );
    problems.finish()
}

pub fn validate_update_podcast(req: &UpdatePodcastRequest) -> Result<(), ServiceError> {
    let mut problems = Problems::new();
    if let Some(title) = &req.title {
        problems.check(validate_name("title", title));
    }
    podcast_fields(
        &mut problems,
        req.host_email.as_deref(),
        req.website_url.as_deref(),
        req.rss_url.as_deref(),
        req.description.as_deref(),
        req.audience_size,
    );
    problems.finish()
}

fn podcast_fields(
    problems: &mut Problems,
    host_email: Option<&str>,
    website_url: Option<&str>,
    rss_url: Option<&str>,
    description: Option<&str>,
    audience_size: Option<i64>,
) {
    problems.check(validate_optional_email("host_email", host_email));
    problems.check(validate_url("website_url", website_url));
    problems.check(validate_url("rss_url", rss_url));
    problems.check(validate_text("description", description));
    problems.check(validate_audience(audience_size));
}

pub fn validate_create_campaign(req: &CreateCampaignRequest) -> Result<(), ServiceError> {
    let mut problems = Problems::new();
    problems.check(validate_name("name", &req.name));
    campaign_fields(
        &mut problems,
        req.goals.as_deref(),
        req.target_audience.as_deref(),
        req.links.as_deref(),
    );
    problems.finish()
}

pub fn validate_update_campaign(req: &UpdateCampaignRequest) -> Result<(), ServiceError> {
    let mut problems = Problems::new();
    if let Some(name) = &req.name {
        problems.check(validate_name("name", name));
    }
    campaign_fields(
        &mut problems,
        req.goals.as_deref(),
        req.target_audience.as_deref(),
        req.links.as_deref(),
    );
    problems.check(validate_text("bio", req.bio.as_deref()));
    if let Some(angles) = &req.angles {
        if angles.iter().any(|a| a.title.trim().is_empty()) {
            problems.push("angles must each have a title");
        }
    }
    problems.finish()
}

fn campaign_fields(
    problems: &mut Problems,
    goals: Option<&str>,
    target_audience: Option<&str>,
    links: Option<&[String]>,
) {
    problems.check(validate_text("goals", goals));
    problems.check(validate_text("target_audience", target_audience));
    for link in links.unwrap_or_default() {
        problems.check(validate_url("links", Some(link)));
    }
}

pub fn validate_media_kit(req: &UpsertMediaKitRequest) -> Result<(), ServiceError> {
    let mut problems = Problems::new();
    if let Some(slug) = req.slug.as_deref().filter(|s| !s.is_empty()) {
        if !pgl_core::slug::is_valid_slug(slug) {
            problems.push("slug must be lowercase letters, digits and single dashes");
        }
    }
    problems.check(validate_text("headline", req.headline.as_deref()));
    problems.check(validate_text("bio", req.bio.as_deref()));
    problems.check(validate_url("headshot_url", req.headshot_url.as_deref()));
    problems.finish()
}

pub fn validate_create_booking(req: &CreateBookingRequest) -> Result<(), ServiceError> {
    let mut problems = Problems::new();
    if req.podcast_id.trim().is_empty() {
        problems.push("podcast_id is required");
    }
    if req.user_id.is_none() && req.campaign_id.is_none() {
        problems.push("user_id or campaign_id is required");
    }
    problems.check(validate_datetime("scheduled_at", req.scheduled_at.as_deref()));
    problems.check(validate_text("notes", req.notes.as_deref()));
    problems.finish()
}

pub fn validate_update_booking(req: &UpdateBookingRequest) -> Result<(), ServiceError> {
    let mut problems = Problems::new();
    problems.check(validate_datetime("scheduled_at", req.scheduled_at.as_deref()));
    problems.check(validate_url("episode_url", req.episode_url.as_deref()));
    problems.check(validate_text("notes", req.notes.as_deref()));
    problems.finish()
}

/// Validate explicit pitch text. Both parts are required once either is given.
pub fn validate_pitch_text(subject: &str, body: &str) -> Result<(), ServiceError> {
    let mut problems = Problems::new();
    if subject.trim().is_empty() {
        problems.push("subject is required");
    } else if subject.chars().count() > 200 {
        problems.push("subject must be at most 200 characters");
    }
    if body.trim().is_empty() {
        problems.push("body is required");
    }
    problems.check(validate_text("body", Some(body)));
    problems.finish()
}

/// Normalize an optional text field from a partial update: `None` leaves the
/// column alone, an empty string clears it.
pub fn optional_text(value: Option<&str>) -> Option<Option<String>> {
    value.map(|v| {
        let v = v.trim();
        (!v.is_empty()).then(|| v.to_string())
    })
}

/// Normalize an optional text field on create: blank becomes `None`.
pub fn clean_text(value: Option<&str>) -> Option<String> {
    optional_text(value).flatten()
}

// ─── Access ─────────────────────────────────────────────────────────────────

/// Admins and staff manage every campaign, podcast and booking.
pub fn can_manage(role: UserRole) -> bool {
    role.is_staff()
}

/// Clients only see rows they own.
pub fn can_view(role: UserRole, viewer_id: &str, owner_id: &str) -> bool {
    can_manage(role) || viewer_id == owner_id
}

pub fn require_staff(role: UserRole) -> Result<(), ServiceError> {
    if can_manage(role) {
        Ok(())
    } else {
        Err(ServiceError::Forbidden("staff access required".into()))
    }
}

/// Only admins hand out roles.
pub fn require_admin(role: UserRole) -> Result<(), ServiceError> {
    if role == UserRole::Admin {
        Ok(())
    } else {
        Err(ServiceError::Forbidden("admin access required".into()))
    }
}

// ─── API Key Generation ─────────────────────────────────────────────────────

pub const API_KEY_PREFIX: &str = "pgl_";

/// Generate a new API key with the `pgl_` prefix.
pub fn generate_api_key() -> String {
    format!("{API_KEY_PREFIX}{}", uuid::Uuid::new_v4().simple())
}

/// Hash an API key for persistent storage and lookup.
pub fn hash_api_key(api_key: &str) -> String {
    crate::crypto::hash_token(api_key)
}

// ─── Auth Token Resolution ──────────────────────────────────────────────────

/// Result of resolving an auth token string.
pub enum AuthToken {
    /// JWT was valid — contains the verified claims.
    Jwt(crate::crypto::JwtClaims),
    /// Token is an API key (`pgl_` prefix) — caller must look up in DB.
    ApiKey(String),
}

/// Resolve an auth token string into either verified JWT claims or an API key.
pub fn resolve_auth_token(
    token: &str,
    jwt_secret: &str,
    now: u64,
) -> Result<AuthToken, ServiceError> {
    if token.starts_with(API_KEY_PREFIX) {
        return Ok(AuthToken::ApiKey(token.to_string()));
    }

    if jwt_secret.is_empty() {
        return Err(ServiceError::Unauthorized(
            "JWT authentication not configured".into(),
        ));
    }

    let claims = crate::crypto::verify_jwt(token, jwt_secret, now)?;
    Ok(AuthToken::Jwt(claims))
}

// ─── Token Bundle ───────────────────────────────────────────────────────────

/// Pre-computed token bundle returned by [`prepare_token_bundle`].
///
/// The caller only needs to insert the refresh token row.
pub struct TokenBundle {
    /// SHA-256 hash of the refresh token (stored in DB).
    pub token_hash: String,
    /// UUID primary key for the refresh_tokens row.
    pub token_id: String,
    /// `datetime` string for the refresh token expiry (DB column value).
    pub expires_at: String,
    /// Ready-to-return API response.
    pub response: AuthTokenResponse,
}

/// Build a [`TokenBundle`] containing a JWT, refresh token, and the auth response.
pub fn prepare_token_bundle(
    jwt_secret: &str,
    user_id: &str,
    full_name: &str,
    role: UserRole,
    now_unix: u64,
) -> Result<TokenBundle, ServiceError> {
    use crate::crypto;

    let access_token = crypto::sign_jwt(user_id, role, jwt_secret, now_unix);
    let refresh_token = crypto::generate_token()?;
    let token_hash = crypto::hash_token(&refresh_token);
    let token_id = uuid::Uuid::new_v4().to_string();

    let base = chrono::DateTime::from_timestamp(now_unix as i64, 0)
        .ok_or_else(|| ServiceError::Internal("invalid timestamp".into()))?;
    let expires_at = base
        .checked_add_signed(chrono::Duration::seconds(
            crypto::REFRESH_EXPIRY_SECS as i64,
        ))
        .ok_or_else(|| ServiceError::Internal("timestamp overflow".into()))?
        .format("%Y-%m-%d %H:%M:%S")
        .to_string();

    Ok(TokenBundle {
        token_hash,
        token_id,
        expires_at,
        response: AuthTokenResponse {
            access_token,
            refresh_token,
            expires_in: crypto::JWT_EXPIRY_SECS,
            user_id: user_id.to_string(),
            full_name: full_name.to_string(),
            role,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_normalized() {
        assert_eq!(validate_email("  Dana@Example.COM ").unwrap(), "dana@example.com");
        assert!(validate_email("dana").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("dana@localhost").is_err());
        assert!(validate_email("da na@example.com").is_err());
    }

    #[test]
    fn password_bounds() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("long enough").is_ok());
        assert!(validate_password(&"x".repeat(129)).is_err());
    }

    #[test]
    fn register_reports_every_problem() {
        let err = validate_register("nope", "short", " ").unwrap_err();
        let ServiceError::Validation(details) = err else {
            panic!("expected validation error");
        };
        assert_eq!(
            details,
            vec![
                "invalid email address",
                "password must be at least 8 characters",
                "full_name is required",
            ]
        );
    }

    #[test]
    fn podcast_validation() {
        let mut req = CreatePodcastRequest {
            title: "Build Mode".into(),
            website_url: Some("https://buildmode.fm".into()),
            ..Default::default()
        };
        assert!(validate_create_podcast(&req).is_ok());

        req.rss_url = Some("ftp://feed".into());
        req.audience_size = Some(-1);
        let ServiceError::Validation(details) = validate_create_podcast(&req).unwrap_err() else {
            panic!("expected validation error");
        };
        assert_eq!(details.len(), 2);
    }

    #[test]
    fn empty_url_clears() {
        assert!(validate_url("website_url", Some("")).is_ok());
        assert!(validate_url("website_url", Some("http://")).is_err());
    }

    #[test]
    fn booking_needs_a_client() {
        let req = CreateBookingRequest {
            podcast_id: "p1".into(),
            scheduled_at: Some("2026-05-01T10:00:00Z".into()),
            ..Default::default()
        };
        let ServiceError::Validation(details) = validate_create_booking(&req).unwrap_err() else {
            panic!("expected validation error");
        };
        assert_eq!(details, vec!["user_id or campaign_id is required"]);
    }

    #[test]
    fn datetime_formats() {
        assert!(validate_datetime("at", Some("2026-05-01 10:00:00")).is_ok());
        assert!(validate_datetime("at", Some("2026-05-01T10:00:00+02:00")).is_ok());
        assert!(validate_datetime("at", Some("next tuesday")).is_err());
    }

    #[test]
    fn optional_text_semantics() {
        assert_eq!(optional_text(None), None);
        assert_eq!(optional_text(Some("  ")), Some(None));
        assert_eq!(optional_text(Some(" hi ")), Some(Some("hi".into())));
    }

    #[test]
    fn access_helpers() {
        assert!(can_view(UserRole::Staff, "a", "b"));
        assert!(can_view(UserRole::Client, "a", "a"));
        assert!(!can_view(UserRole::Client, "a", "b"));
        assert!(require_staff(UserRole::Client).is_err());
        assert!(require_admin(UserRole::Admin).is_ok());
        assert!(require_admin(UserRole::Staff).is_err());
    }

    #[test]
    fn api_keys_resolve_without_jwt_secret() {
        let key = generate_api_key();
        assert!(key.starts_with("pgl_"));
        assert!(matches!(
            resolve_auth_token(&key, "", 0),
            Ok(AuthToken::ApiKey(k)) if k == key
        ));
        assert!(resolve_auth_token("not-a-jwt", "", 0).is_err());
    }

    #[test]
    fn token_bundle_is_consistent() {
        let bundle = prepare_token_bundle("s", "u1", "Dana", UserRole::Client, 1_700_000_000)
            .unwrap();
        assert_eq!(
            bundle.token_hash,
            crate::crypto::hash_token(&bundle.response.refresh_token)
        );
        assert_eq!(bundle.expires_at, "2023-11-21 22:13:20");
        let claims =
            crate::crypto::verify_jwt(&bundle.response.access_token, "s", 1_700_000_000).unwrap();
        assert_eq!(claims.role, UserRole::Client);
    }
}
