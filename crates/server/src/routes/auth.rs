use axum::{
    body::Bytes,
    extract::{FromRef, FromRequestParts, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse},
    Json,
};
use uuid::Uuid;

use pgl_api::{
    crypto, db, service, ApiKeyResponse, AuthRegisterRequest, AuthTokenResponse,
    ChangePasswordRequest, LoginRequest, LogoutRequest, OkResponse, RefreshRequest, UserResponse,
    UserRole,
};

use crate::error::ApiErr;
use crate::storage::{
    is_constraint_violation, sq_execute, sq_query_opt, sq_query_row, user_from_row, Db,
};
use crate::AppConfig;

pub const SESSION_COOKIE: &str = "pgl_session";

/// Seconds since the Unix epoch.
pub fn now_unix() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Auth extractor
// ---------------------------------------------------------------------------

/// Authenticated user, resolved from `Authorization: Bearer <api key | jwt>`
/// or the `pgl_session` cookie. The row is always re-read so a deleted user
/// or a rotated API key stops working immediately.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    pub created_at: String,
}

impl AuthUser {
    pub fn is_staff(&self) -> bool {
        service::can_manage(self.role)
    }

    pub fn require_staff(&self) -> Result<(), ApiErr> {
        service::require_staff(self.role).map_err(ApiErr::from)
    }

    pub fn require_admin(&self) -> Result<(), ApiErr> {
        service::require_admin(self.role).map_err(ApiErr::from)
    }

    /// `None` for staff (everything visible), the user's own id for clients.
    pub fn owner_scope(&self) -> Option<&str> {
        (!self.is_staff()).then_some(self.user_id.as_str())
    }

    pub fn can_view(&self, owner_id: &str) -> bool {
        service::can_view(self.role, &self.user_id, owner_id)
    }
}

impl From<UserResponse> for AuthUser {
    fn from(user: UserResponse) -> Self {
        Self {
            user_id: user.id,
            email: user.email,
            full_name: user.full_name,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Value of a cookie from the `Cookie` header(s).
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Db: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiErr;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let db = Db::from_ref(state);
        let config = AppConfig::from_ref(state);

        let token = bearer_token(&parts.headers)
            .or_else(|| cookie_value(&parts.headers, SESSION_COOKIE))
            .ok_or_else(|| ApiErr::unauthorized("missing or invalid Authorization header"))?;

        let built = match service::resolve_auth_token(&token, &config.jwt_secret, now_unix())? {
            service::AuthToken::ApiKey(key) => {
                db::users::get_by_api_key_hash(&service::hash_api_key(&key))
            }
            service::AuthToken::Jwt(claims) => db::users::get_by_id(&claims.user_id),
        };

        let conn = db.conn();
        sq_query_opt(&conn, built, user_from_row)
            .map_err(ApiErr::from_db("auth lookup"))?
            .map(AuthUser::from)
            .ok_or_else(|| ApiErr::unauthorized("invalid credentials"))
    }
}

// ---------------------------------------------------------------------------
// Token issuing
// ---------------------------------------------------------------------------

fn issue_tokens(
    db: &Db,
    config: &AppConfig,
    user_id: &str,
    full_name: &str,
    role: UserRole,
) -> Result<AuthTokenResponse, ApiErr> {
    let bundle =
        service::prepare_token_bundle(&config.jwt_secret, user_id, full_name, role, now_unix())?;
    let conn = db.conn();
    sq_execute(
        &conn,
        db::users::insert_refresh_token(
            &bundle.token_id,
            user_id,
            &bundle.token_hash,
            &bundle.expires_at,
        ),
    )
    .map_err(ApiErr::from_db("insert refresh token"))?;
    Ok(bundle.response)
}

fn session_cookie(config: &AppConfig, token: &str) -> String {
    let secure = if config.secure_cookies { "; Secure" } else { "" };
    format!(
        "{SESSION_COOKIE}={token}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}{secure}",
        crypto::JWT_EXPIRY_SECS
    )
}

fn clear_session_cookie(config: &AppConfig) -> String {
    let secure = if config.secure_cookies { "; Secure" } else { "" };
    format!("{SESSION_COOKIE}=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0{secure}")
}

// ---------------------------------------------------------------------------
// Register
// ---------------------------------------------------------------------------

/// POST /api/auth/register — email/password registration. The very first
/// account becomes the agency admin.
pub async fn register(
    State(db): State<Db>,
    State(config): State<AppConfig>,
    Json(req): Json<AuthRegisterRequest>,
) -> Result<(StatusCode, Json<AuthTokenResponse>), ApiErr> {
    if !config.registration_open {
        return Err(ApiErr::forbidden("registration is currently closed"));
    }
    service::validate_register(&req.email, &req.password, &req.full_name)?;
    let email = service::validate_email(&req.email)?;
    let full_name = req.full_name.trim().to_string();

    {
        let conn = db.conn();
        let exists: bool = sq_query_row(&conn, db::users::email_exists(&email), |row| row.get(0))
            .map_err(ApiErr::from_db("email check"))?;
        if exists {
            return Err(ApiErr::conflict("email already registered"));
        }
    }

    let (password_hash, password_salt) = crypto::hash_password(&req.password)?;
    let user_id = Uuid::new_v4().to_string();

    let role = {
        let conn = db.conn();
        let users: i64 = sq_query_row(&conn, db::users::count(), |row| row.get(0))
            .map_err(ApiErr::from_db("count users"))?;
        let role = if users == 0 {
            UserRole::Admin
        } else {
            UserRole::Client
        };
        sq_execute(
            &conn,
            db::users::insert(&db::users::InsertParams {
                id: &user_id,
                email: &email,
                full_name: &full_name,
                role,
                password_hash: Some(&password_hash),
                password_salt: Some(&password_salt),
                api_key_hash: None,
            }),
        )
        .map_err(|e| {
            if is_constraint_violation(&e) {
                ApiErr::conflict("email already registered")
            } else {
                ApiErr::from_db("insert user")(e)
            }
        })?;
        role
    };

    if role == UserRole::Admin {
        tracing::info!("first user registered as admin: {email}");
    }

    let tokens = issue_tokens(&db, &config, &user_id, &full_name, role)?;
    Ok((StatusCode::CREATED, Json(tokens)))
}

// ---------------------------------------------------------------------------
// Login / refresh / logout
// ---------------------------------------------------------------------------

/// POST /api/auth/login — returns tokens and sets the `pgl_session` cookie.
pub async fn login(
    State(db): State<Db>,
    State(config): State<AppConfig>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiErr> {
    let invalid = || ApiErr::unauthorized("invalid email or password");
    let email = service::validate_email(&req.email).map_err(|_| invalid())?;

    let row = {
        let conn = db.conn();
        sq_query_opt(&conn, db::users::get_by_email_for_login(&email), |row| {
            let role: String = row.get(2)?;
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                UserRole::parse(&role).unwrap_or(UserRole::Client),
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })
        .map_err(ApiErr::from_db("login lookup"))?
    };

    let Some((user_id, full_name, role, Some(hash), Some(salt))) = row else {
        return Err(invalid());
    };
    if !crypto::verify_password(&req.password, &hash, &salt) {
        return Err(invalid());
    }

    let tokens = issue_tokens(&db, &config, &user_id, &full_name, role)?;
    let cookie = session_cookie(&config, &tokens.access_token);
    Ok((AppendHeaders([(header::SET_COOKIE, cookie)]), Json(tokens)))
}

/// POST /api/auth/refresh — rotate a refresh token.
pub async fn refresh(
    State(db): State<Db>,
    State(config): State<AppConfig>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<AuthTokenResponse>, ApiErr> {
    let token_hash = crypto::hash_token(&req.refresh_token);

    let (user_id, full_name, role) = {
        let conn = db.conn();
        let row = sq_query_opt(&conn, db::users::lookup_refresh_token(&token_hash), |row| {
            let role: String = row.get(4)?;
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                UserRole::parse(&role).unwrap_or(UserRole::Client),
            ))
        })
        .map_err(ApiErr::from_db("refresh lookup"))?;

        let Some((token_id, user_id, expires_at, full_name, role)) = row else {
            return Err(ApiErr::unauthorized("invalid refresh token"));
        };

        // Single use: the presented token is gone whether or not it expired.
        sq_execute(&conn, db::users::delete_refresh_token_by_id(&token_id))
            .map_err(ApiErr::from_db("delete refresh token"))?;

        if expires_at < db::now_sqlite() {
            return Err(ApiErr::unauthorized("refresh token expired"));
        }
        (user_id, full_name, role)
    };

    Ok(Json(issue_tokens(&db, &config, &user_id, &full_name, role)?))
}

/// POST /api/auth/logout — revoke the refresh token (if given) and clear the cookie.
pub async fn logout(
    State(db): State<Db>,
    State(config): State<AppConfig>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiErr> {
    let req: LogoutRequest = serde_json::from_slice(&body).unwrap_or_default();
    if let Some(token) = req.refresh_token.filter(|t| !t.is_empty()) {
        let conn = db.conn();
        sq_execute(
            &conn,
            db::users::delete_refresh_token(&crypto::hash_token(&token)),
        )
        .map_err(ApiErr::from_db("logout"))?;
    }
    Ok((
        AppendHeaders([(header::SET_COOKIE, clear_session_cookie(&config))]),
        Json(OkResponse { ok: true }),
    ))
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// GET /api/auth/me — the authenticated user's profile.
pub async fn me(user: AuthUser) -> Json<UserResponse> {
    Json(UserResponse {
        id: user.user_id,
        email: user.email,
        full_name: user.full_name,
        role: user.role,
        created_at: user.created_at,
    })
}

/// PUT /api/auth/password — change password and revoke every refresh token.
pub async fn change_password(
    State(db): State<Db>,
    user: AuthUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<OkResponse>, ApiErr> {
    service::validate_password(&req.new_password)?;

    let fields = {
        let conn = db.conn();
        sq_query_row(&conn, db::users::get_password_fields(&user.user_id), |row| {
            Ok((
                row.get::<_, Option<String>>(0)?,
                row.get::<_, Option<String>>(1)?,
            ))
        })
        .map_err(ApiErr::from_db("password lookup"))?
    };
    let (Some(hash), Some(salt)) = fields else {
        return Err(ApiErr::bad_request("account has no password set"));
    };
    if !crypto::verify_password(&req.current_password, &hash, &salt) {
        return Err(ApiErr::unauthorized("current password is incorrect"));
    }

    let (new_hash, new_salt) = crypto::hash_password(&req.new_password)?;
    let conn = db.conn();
    sq_execute(
        &conn,
        db::users::update_password(&user.user_id, &new_hash, &new_salt),
    )
    .map_err(ApiErr::from_db("update password"))?;
    sq_execute(&conn, db::users::delete_refresh_tokens_for_user(&user.user_id))
        .map_err(ApiErr::from_db("revoke sessions"))?;

    Ok(Json(OkResponse { ok: true }))
}

/// POST /api/auth/api-key — issue a new API key. The previous one stops working.
pub async fn regenerate_api_key(
    State(db): State<Db>,
    user: AuthUser,
) -> Result<Json<ApiKeyResponse>, ApiErr> {
    let api_key = service::generate_api_key();
    let conn = db.conn();
    sq_execute(
        &conn,
        db::users::update_api_key_hash(&user.user_id, &service::hash_api_key(&api_key)),
    )
    .map_err(ApiErr::from_db("regenerate api key"))?;
    tracing::info!(user_id = %user.user_id, "api key regenerated");
    Ok(Json(ApiKeyResponse { api_key }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn cookie_parsing_finds_session() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; pgl_session=abc.def.ghi; other=1"),
        );
        assert_eq!(
            cookie_value(&headers, SESSION_COOKIE).as_deref(),
            Some("abc.def.ghi")
        );
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn bearer_takes_precedence_shape() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer pgl_123"),
        );
        assert_eq!(bearer_token(&headers).as_deref(), Some("pgl_123"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic x"));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn session_cookie_flags() {
        let mut config = AppConfig::for_tests();
        assert!(!session_cookie(&config, "t").contains("Secure"));
        config.secure_cookies = true;
        let cookie = session_cookie(&config, "t");
        assert!(cookie.starts_with("pgl_session=t;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.ends_with("; Secure"));
        assert!(clear_session_cookie(&config).contains("Max-Age=0"));
    }
}
