//! Cryptographic helpers for authentication.
//!
//! - PBKDF2-SHA256 password hashing (600k iterations)
//! - HMAC-SHA256 JWT signing/verification with a role claim
//! - `sha256=<hex>` webhook signatures

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;

use crate::{ServiceError, UserRole};

const PBKDF2_ITERATIONS: u32 = 600_000;
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;

/// Prefix of the `X-PGL-Signature` header value.
pub const WEBHOOK_SIGNATURE_PREFIX: &str = "sha256=";

// ── Password hashing ────────────────────────────────────────────────────────

/// Hash a password with PBKDF2-SHA256. Returns `(hash_hex, salt_hex)`.
pub fn hash_password(password: &str) -> Result<(String, String), ServiceError> {
    let mut salt = [0u8; SALT_LEN];
    getrandom::getrandom(&mut salt)
        .map_err(|e| ServiceError::Internal(format!("RNG failure: {e}")))?;

    let mut hash = [0u8; HASH_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, PBKDF2_ITERATIONS, &mut hash);

    Ok((hex::encode(hash), hex::encode(salt)))
}

/// Verify a password against a stored hash and salt (both hex-encoded).
pub fn verify_password(password: &str, hash_hex: &str, salt_hex: &str) -> bool {
    let Ok(salt) = hex::decode(salt_hex) else {
        return false;
    };
    let Ok(expected) = hex::decode(hash_hex) else {
        return false;
    };

    let mut hash = [0u8; HASH_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, PBKDF2_ITERATIONS, &mut hash);

    constant_time_eq(&hash, &expected)
}

// ── JWT (HMAC-SHA256) ───────────────────────────────────────────────────────

/// JWT header (always HS256).
const JWT_HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

/// JWT expiry: 1 hour in seconds.
pub const JWT_EXPIRY_SECS: u64 = 3600;

/// Refresh token expiry: 7 days in seconds.
pub const REFRESH_EXPIRY_SECS: u64 = 7 * 24 * 3600;

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JwtClaims {
    pub user_id: String,
    pub role: UserRole,
}

/// Sign a JWT for the given user. Returns the encoded JWT string.
pub fn sign_jwt(user_id: &str, role: UserRole, secret: &str, now_unix: u64) -> String {
    let header_b64 = URL_SAFE_NO_PAD.encode(JWT_HEADER.as_bytes());

    let payload = serde_json::json!({
        "sub": user_id,
        "role": role.as_str(),
        "iat": now_unix,
        "exp": now_unix + JWT_EXPIRY_SECS,
    });
    let payload_b64 = URL_SAFE_NO_PAD.encode(payload.to_string().as_bytes());

    let signing_input = format!("{header_b64}.{payload_b64}");
    let signature = hmac_sha256(secret.as_bytes(), signing_input.as_bytes());
    let sig_b64 = URL_SAFE_NO_PAD.encode(signature);

    format!("{signing_input}.{sig_b64}")
}

/// Verify a JWT and return its claims if valid.
pub fn verify_jwt(token: &str, secret: &str, now_unix: u64) -> Result<JwtClaims, ServiceError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(ServiceError::Unauthorized("invalid JWT format".into()));
    }

    let signing_input = format!("{}.{}", parts[0], parts[1]);
    let expected_sig = hmac_sha256(secret.as_bytes(), signing_input.as_bytes());
    let actual_sig = URL_SAFE_NO_PAD
        .decode(parts[2])
        .map_err(|_| ServiceError::Unauthorized("invalid JWT signature encoding".into()))?;

    if !constant_time_eq(&expected_sig, &actual_sig) {
        return Err(ServiceError::Unauthorized("invalid JWT signature".into()));
    }

    let payload_bytes = URL_SAFE_NO_PAD
        .decode(parts[1])
        .map_err(|_| ServiceError::Unauthorized("invalid JWT payload encoding".into()))?;
    let payload: serde_json::Value = serde_json::from_slice(&payload_bytes)
        .map_err(|_| ServiceError::Unauthorized("invalid JWT payload".into()))?;

    let exp = payload["exp"]
        .as_u64()
        .ok_or_else(|| ServiceError::Unauthorized("missing exp claim".into()))?;
    if now_unix > exp {
        return Err(ServiceError::Unauthorized("JWT expired".into()));
    }

    let user_id = payload["sub"]
        .as_str()
        .ok_or_else(|| ServiceError::Unauthorized("missing sub claim".into()))?
        .to_string();
    let role = payload["role"]
        .as_str()
        .and_then(UserRole::parse)
        .ok_or_else(|| ServiceError::Unauthorized("missing role claim".into()))?;

    Ok(JwtClaims { user_id, role })
}

/// Generate a secure random token (for refresh tokens). Returns hex-encoded.
pub fn generate_token() -> Result<String, ServiceError> {
    let mut bytes = [0u8; 32];
    getrandom::getrandom(&mut bytes)
        .map_err(|e| ServiceError::Internal(format!("RNG failure: {e}")))?;
    Ok(hex::encode(bytes))
}

/// Hash a token with SHA-256 for storage. Returns hex-encoded.
pub fn hash_token(token: &str) -> String {
    use sha2::Digest;
    let hash = sha2::Sha256::digest(token.as_bytes());
    hex::encode(hash)
}

// ── Webhook signatures ──────────────────────────────────────────────────────

/// Sign a webhook body. Returns `sha256=<hex>`.
pub fn sign_webhook(secret: &str, body: &[u8]) -> String {
    format!(
        "{WEBHOOK_SIGNATURE_PREFIX}{}",
        hex::encode(hmac_sha256(secret.as_bytes(), body))
    )
}

/// Check a `sha256=<hex>` signature header against the raw request body.
pub fn verify_webhook_signature(secret: &str, body: &[u8], header: &str) -> bool {
    let Some(sig_hex) = header.trim().strip_prefix(WEBHOOK_SIGNATURE_PREFIX) else {
        return false;
    };
    let Ok(actual) = hex::decode(sig_hex) else {
        return false;
    };
    constant_time_eq(&hmac_sha256(secret.as_bytes(), body), &actual)
}

// ── Internal ────────────────────────────────────────────────────────────────

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";
    const NOW: u64 = 1_700_000_000;

    #[test]
    fn password_round_trip() {
        let (hash, salt) = hash_password("hunter2hunter2").unwrap();
        assert!(verify_password("hunter2hunter2", &hash, &salt));
        assert!(!verify_password("hunter3hunter3", &hash, &salt));
        assert!(!verify_password("hunter2hunter2", "zz", &salt));
    }

    #[test]
    fn jwt_round_trip_carries_role() {
        let token = sign_jwt("u1", UserRole::Staff, SECRET, NOW);
        let claims = verify_jwt(&token, SECRET, NOW + 10).unwrap();
        assert_eq!(
            claims,
            JwtClaims {
                user_id: "u1".into(),
                role: UserRole::Staff,
            }
        );
    }

    #[test]
    fn jwt_rejects_wrong_secret_and_expiry() {
        let token = sign_jwt("u1", UserRole::Client, SECRET, NOW);
        assert!(verify_jwt(&token, "other", NOW).is_err());
        let err = verify_jwt(&token, SECRET, NOW + JWT_EXPIRY_SECS + 1).unwrap_err();
        assert_eq!(err.message(), "JWT expired");
        assert!(verify_jwt("a.b", SECRET, NOW).is_err());
    }

    #[test]
    fn jwt_rejects_tampered_payload() {
        let token = sign_jwt("u1", UserRole::Client, SECRET, NOW);
        let parts: Vec<&str> = token.split('.').collect();
        let forged = URL_SAFE_NO_PAD.encode(
            serde_json::json!({"sub": "u1", "role": "admin", "iat": NOW, "exp": NOW + 60})
                .to_string(),
        );
        let tampered = format!("{}.{}.{}", parts[0], forged, parts[2]);
        assert!(verify_jwt(&tampered, SECRET, NOW).is_err());
    }

    #[test]
    fn webhook_signature_verifies_only_matching_body_and_secret() {
        let body = br#"{"pitch_id":"p1"}"#;
        let header = sign_webhook("whsec", body);
        assert!(header.starts_with("sha256="));
        assert!(verify_webhook_signature("whsec", body, &header));
        assert!(!verify_webhook_signature("other", body, &header));
        assert!(!verify_webhook_signature("whsec", b"{}", &header));
        assert!(!verify_webhook_signature("whsec", body, "md5=abc"));
        assert!(!verify_webhook_signature("whsec", body, "sha256=not-hex"));
    }

    #[test]
    fn token_hash_is_stable_hex() {
        let token = generate_token().unwrap();
        assert_eq!(token.len(), 64);
        assert_eq!(hash_token("abc"), hash_token("abc"));
        assert_ne!(hash_token("abc"), hash_token("abd"));
    }
}
