//! User / auth query builders.

use sea_query::{Alias, Asterisk, Expr, Func, Order, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::{Campaigns, RefreshTokens, Users};
use crate::{CampaignStatus, UserRole};

// ── Helpers ────────────────────────────────────────────────────────────────

/// Column order must match `user_from_row()`: id, email, full_name, role, created_at.
fn user_select() -> sea_query::SelectStatement {
    Query::select()
        .columns([
            Users::Id,
            Users::Email,
            Users::FullName,
            Users::Role,
            Users::CreatedAt,
        ])
        .from(Users::Table)
        .to_owned()
}

// ── User lookups ───────────────────────────────────────────────────────────

/// Find user by id.
pub fn get_by_id(user_id: &str) -> Built {
    user_select()
        .and_where(Expr::col(Users::Id).eq(user_id))
        .build(SqliteQueryBuilder)
}

/// Find user by hashed API key.
pub fn get_by_api_key_hash(key_hash: &str) -> Built {
    user_select()
        .and_where(Expr::col(Users::ApiKeyHash).eq(key_hash))
        .build(SqliteQueryBuilder)
}

/// Find user by email for login (returns id, full_name, role, password_hash, password_salt).
pub fn get_by_email_for_login(email: &str) -> Built {
    Query::select()
        .columns([
            Users::Id,
            Users::FullName,
            Users::Role,
            Users::PasswordHash,
            Users::PasswordSalt,
        ])
        .from(Users::Table)
        .and_where(Expr::col(Users::Email).eq(email))
        .build(SqliteQueryBuilder)
}

/// Check email existence.
pub fn email_exists(email: &str) -> Built {
    Query::select()
        .expr(Expr::expr(Func::count(Expr::col(Asterisk))).gt(0))
        .from(Users::Table)
        .and_where(Expr::col(Users::Email).eq(email))
        .build(SqliteQueryBuilder)
}

/// Total number of users (the first one becomes admin).
pub fn count() -> Built {
    Query::select()
        .expr(Func::count(Expr::col(Asterisk)))
        .from(Users::Table)
        .build(SqliteQueryBuilder)
}

/// Get password hash/salt for a user.
pub fn get_password_fields(user_id: &str) -> Built {
    Query::select()
        .columns([Users::PasswordHash, Users::PasswordSalt])
        .from(Users::Table)
        .and_where(Expr::col(Users::Id).eq(user_id))
        .build(SqliteQueryBuilder)
}

// ── User inserts ───────────────────────────────────────────────────────────

/// Parameters for inserting a user. Password fields are absent for
/// API-key-only clients created by staff.
pub struct InsertParams<'a> {
    pub id: &'a str,
    pub email: &'a str,
    pub full_name: &'a str,
    pub role: UserRole,
    pub password_hash: Option<&'a str>,
    pub password_salt: Option<&'a str>,
    pub api_key_hash: Option<&'a str>,
}

pub fn insert(p: &InsertParams<'_>) -> Built {
    Query::insert()
        .into_table(Users::Table)
        .columns([
            Users::Id,
            Users::Email,
            Users::FullName,
            Users::Role,
            Users::PasswordHash,
            Users::PasswordSalt,
            Users::ApiKeyHash,
        ])
        .values_panic([
            p.id.into(),
            p.email.into(),
            p.full_name.into(),
            p.role.as_str().into(),
            p.password_hash.map(|s| s.to_string()).into(),
            p.password_salt.map(|s| s.to_string()).into(),
            p.api_key_hash.map(|s| s.to_string()).into(),
        ])
        .build(SqliteQueryBuilder)
}

// ── User updates ───────────────────────────────────────────────────────────

/// Update password.
pub fn update_password(user_id: &str, password_hash: &str, password_salt: &str) -> Built {
    Query::update()
        .table(Users::Table)
        .value(Users::PasswordHash, password_hash)
        .value(Users::PasswordSalt, password_salt)
        .and_where(Expr::col(Users::Id).eq(user_id))
        .build(SqliteQueryBuilder)
}

/// Replace the API key hash (the previous key stops working immediately).
pub fn update_api_key_hash(user_id: &str, key_hash: &str) -> Built {
    Query::update()
        .table(Users::Table)
        .value(Users::ApiKeyHash, key_hash)
        .and_where(Expr::col(Users::Id).eq(user_id))
        .build(SqliteQueryBuilder)
}

/// Change a user's role.
pub fn update_role(user_id: &str, role: UserRole) -> Built {
    Query::update()
        .table(Users::Table)
        .value(Users::Role, role.as_str())
        .and_where(Expr::col(Users::Id).eq(user_id))
        .build(SqliteQueryBuilder)
}

// ── Admin ──────────────────────────────────────────────────────────────────

/// Clients with campaign counts.
///
/// Column order: id, email, full_name, created_at, campaign_count, active_campaign_count.
pub fn list_clients() -> Built {
    let active = Expr::cust_with_values(
        "COALESCE(SUM(CASE WHEN \"campaigns\".\"status\" = ? THEN 1 ELSE 0 END), 0)",
        [CampaignStatus::Active.as_str()],
    );
    Query::select()
        .column((Users::Table, Users::Id))
        .column((Users::Table, Users::Email))
        .column((Users::Table, Users::FullName))
        .column((Users::Table, Users::CreatedAt))
        .expr_as(
            Func::count(Expr::col((Campaigns::Table, Campaigns::Id))),
            Alias::new("campaign_count"),
        )
        .expr_as(active, Alias::new("active_campaign_count"))
        .from(Users::Table)
        .left_join(
            Campaigns::Table,
            Expr::col((Campaigns::Table, Campaigns::UserId)).equals((Users::Table, Users::Id)),
        )
        .and_where(Expr::col((Users::Table, Users::Role)).eq(UserRole::Client.as_str()))
        .group_by_col((Users::Table, Users::Id))
        .order_by((Users::Table, Users::CreatedAt), Order::Desc)
        .build(SqliteQueryBuilder)
}

// ── Refresh tokens ─────────────────────────────────────────────────────────

/// Insert refresh token.
pub fn insert_refresh_token(id: &str, user_id: &str, token_hash: &str, expires_at: &str) -> Built {
    Query::insert()
        .into_table(RefreshTokens::Table)
        .columns([
            RefreshTokens::Id,
            RefreshTokens::UserId,
            RefreshTokens::TokenHash,
            RefreshTokens::ExpiresAt,
        ])
        .values_panic([
            id.into(),
            user_id.into(),
            token_hash.into(),
            expires_at.into(),
        ])
        .build(SqliteQueryBuilder)
}

/// Lookup refresh token with user join.
///
/// Column order: token id, user_id, expires_at, full_name, role.
pub fn lookup_refresh_token(token_hash: &str) -> Built {
    Query::select()
        .column((RefreshTokens::Table, RefreshTokens::Id))
        .column((RefreshTokens::Table, RefreshTokens::UserId))
        .column((RefreshTokens::Table, RefreshTokens::ExpiresAt))
        .column((Users::Table, Users::FullName))
        .column((Users::Table, Users::Role))
        .from(RefreshTokens::Table)
        .inner_join(
            Users::Table,
            Expr::col((Users::Table, Users::Id))
                .equals((RefreshTokens::Table, RefreshTokens::UserId)),
        )
        .and_where(Expr::col((RefreshTokens::Table, RefreshTokens::TokenHash)).eq(token_hash))
        .build(SqliteQueryBuilder)
}

/// Delete refresh token by hash.
pub fn delete_refresh_token(token_hash: &str) -> Built {
    Query::delete()
        .from_table(RefreshTokens::Table)
        .and_where(Expr::col(RefreshTokens::TokenHash).eq(token_hash))
        .build(SqliteQueryBuilder)
}

/// Delete refresh token by id.
pub fn delete_refresh_token_by_id(id: &str) -> Built {
    Query::delete()
        .from_table(RefreshTokens::Table)
        .and_where(Expr::col(RefreshTokens::Id).eq(id))
        .build(SqliteQueryBuilder)
}

/// Revoke every session of a user (after a password change).
pub fn delete_refresh_tokens_for_user(user_id: &str) -> Built {
    Query::delete()
        .from_table(RefreshTokens::Table)
        .and_where(Expr::col(RefreshTokens::UserId).eq(user_id))
        .build(SqliteQueryBuilder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_binds_role_and_optional_password() {
        let (sql, values) = insert(&InsertParams {
            id: "u1",
            email: "a@b.co",
            full_name: "A",
            role: UserRole::Client,
            password_hash: None,
            password_salt: None,
            api_key_hash: Some("h"),
        });
        assert!(sql.starts_with("INSERT INTO \"users\""));
        assert_eq!(values.0.len(), 7);
        assert_eq!(values.0[3], sea_query::Value::from("client"));
    }

    #[test]
    fn client_listing_groups_by_user() {
        let (sql, values) = list_clients();
        assert!(sql.contains("LEFT JOIN \"campaigns\""));
        assert!(sql.contains("GROUP BY \"users\".\"id\""));
        assert!(values.0.contains(&sea_query::Value::from("client")));
        assert!(values.0.contains(&sea_query::Value::from("active")));
    }
}
