use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};

use pgl_api::db::{self, migrations::MIGRATIONS};
use pgl_api::{
    BookingResponse, BookingStatus, CampaignResponse, CampaignStatus, ClientSummary,
    MatchStatus, MatchSuggestionResponse, MediaKitResponse, PitchResponse, PitchStatus,
    PodcastResponse, QuestionnaireResponse, UserResponse, UserRole,
};

/// Shared database state
#[derive(Clone)]
pub struct Db {
    conn: Arc<Mutex<Connection>>,
}

impl Db {
    pub fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }
}

/// Initialize the database: open connection, enable WAL, run migrations
pub fn init_db(data_dir: &Path) -> Result<Db> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("creating data directory {}", data_dir.display()))?;
    let db_path = data_dir.join("pgl.db");
    let conn = Connection::open(&db_path).context("opening SQLite database")?;

    // Enable WAL mode for better concurrent read performance
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;

    run_migrations(&conn)?;

    Ok(Db {
        conn: Arc::new(Mutex::new(conn)),
    })
}

fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    for (name, sql) in MIGRATIONS {
        let already_applied: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM _migrations WHERE name = ?1",
                [name],
                |row| row.get(0),
            )
            .unwrap_or(false);

        if !already_applied {
            conn.execute_batch(sql)
                .with_context(|| format!("running migration {name}"))?;
            conn.execute("INSERT INTO _migrations (name) VALUES (?1)", [name])?;
            tracing::info!("Applied migration: {name}");
        }
    }

    Ok(())
}

// ── sea-query bridge ────────────────────────────────────────────────────────

fn to_sqlite_value(value: sea_query::Value) -> rusqlite::types::Value {
    use rusqlite::types::Value as Sql;
    use sea_query::Value as Sq;

    match value {
        Sq::Bool(v) => v.map_or(Sql::Null, |b| Sql::Integer(b as i64)),
        Sq::TinyInt(v) => v.map_or(Sql::Null, |n| Sql::Integer(n as i64)),
        Sq::SmallInt(v) => v.map_or(Sql::Null, |n| Sql::Integer(n as i64)),
        Sq::Int(v) => v.map_or(Sql::Null, |n| Sql::Integer(n as i64)),
        Sq::BigInt(v) => v.map_or(Sql::Null, Sql::Integer),
        Sq::TinyUnsigned(v) => v.map_or(Sql::Null, |n| Sql::Integer(n as i64)),
        Sq::SmallUnsigned(v) => v.map_or(Sql::Null, |n| Sql::Integer(n as i64)),
        Sq::Unsigned(v) => v.map_or(Sql::Null, |n| Sql::Integer(n as i64)),
        Sq::BigUnsigned(v) => v.map_or(Sql::Null, |n| {
            Sql::Integer(i64::try_from(n).unwrap_or(i64::MAX))
        }),
        Sq::Float(v) => v.map_or(Sql::Null, |n| Sql::Real(n as f64)),
        Sq::Double(v) => v.map_or(Sql::Null, Sql::Real),
        Sq::String(v) => v.map_or(Sql::Null, |s| Sql::Text(*s)),
        Sq::Char(v) => v.map_or(Sql::Null, |c| Sql::Text(c.to_string())),
        Sq::Bytes(v) => v.map_or(Sql::Null, |b| Sql::Blob(*b)),
        #[allow(unreachable_patterns)]
        _ => Sql::Null,
    }
}

fn bind(values: sea_query::Values) -> Vec<rusqlite::types::Value> {
    values.into_iter().map(to_sqlite_value).collect()
}

/// Execute a built statement, returning the number of affected rows.
pub fn sq_execute(conn: &Connection, (sql, values): db::Built) -> rusqlite::Result<usize> {
    conn.execute(&sql, rusqlite::params_from_iter(bind(values)))
}

/// Run a built query expected to return exactly one row.
pub fn sq_query_row<T, F>(conn: &Connection, (sql, values): db::Built, f: F) -> rusqlite::Result<T>
where
    F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
{
    conn.query_row(&sql, rusqlite::params_from_iter(bind(values)), f)
}

/// Run a built query that may return no row.
pub fn sq_query_opt<T, F>(
    conn: &Connection,
    built: db::Built,
    f: F,
) -> rusqlite::Result<Option<T>>
where
    F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
{
    sq_query_row(conn, built, f).optional()
}

/// Run a built query and map every row.
pub fn sq_query_map<T, F>(conn: &Connection, (sql, values): db::Built, f: F) -> rusqlite::Result<Vec<T>>
where
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(bind(values)), f)?;
    rows.collect()
}

/// `SELECT COUNT(*)` style helper.
pub fn sq_count(conn: &Connection, built: db::Built) -> rusqlite::Result<i64> {
    sq_query_row(conn, built, |row| row.get(0))
}

/// Whether an error is a UNIQUE / FOREIGN KEY / CHECK violation.
pub fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

// ── Row mappers ─────────────────────────────────────────────────────────────
// Positional; each must match the column order of its `pgl_api::db` select.

pub fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserResponse> {
    let role: String = row.get(3)?;
    Ok(UserResponse {
        id: row.get(0)?,
        email: row.get(1)?,
        full_name: row.get(2)?,
        role: UserRole::parse(&role).unwrap_or(UserRole::Client),
        created_at: row.get(4)?,
    })
}

pub fn client_summary_from_row(row: &Row<'_>) -> rusqlite::Result<ClientSummary> {
    Ok(ClientSummary {
        id: row.get(0)?,
        email: row.get(1)?,
        full_name: row.get(2)?,
        created_at: row.get(3)?,
        campaign_count: row.get(4)?,
        active_campaign_count: row.get(5)?,
    })
}

pub fn podcast_from_row(row: &Row<'_>) -> rusqlite::Result<PodcastResponse> {
    Ok(PodcastResponse {
        id: row.get(0)?,
        title: row.get(1)?,
        host_name: row.get(2)?,
        host_email: row.get(3)?,
        description: row.get(4)?,
        category: row.get(5)?,
        website_url: row.get(6)?,
        rss_url: row.get(7)?,
        audience_size: row.get(8)?,
        language: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

pub fn campaign_from_row(row: &Row<'_>) -> rusqlite::Result<CampaignResponse> {
    let status: String = row.get(4)?;
    let keywords: Option<String> = row.get(7)?;
    let angles: Option<String> = row.get(9)?;
    let links: Option<String> = row.get(10)?;
    Ok(CampaignResponse {
        id: row.get(0)?,
        user_id: row.get(1)?,
        client_name: row.get(2)?,
        name: row.get(3)?,
        status: CampaignStatus::parse(&status).unwrap_or_default(),
        goals: row.get(5)?,
        target_audience: row.get(6)?,
        keywords: db::decode_list(keywords.as_deref()),
        bio: row.get(8)?,
        angles: db::decode_list(angles.as_deref()),
        links: db::decode_list(links.as_deref()),
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

pub fn questionnaire_from_row(row: &Row<'_>) -> rusqlite::Result<QuestionnaireResponse> {
    let answers: Option<String> = row.get(3)?;
    Ok(QuestionnaireResponse {
        id: row.get(0)?,
        campaign_id: row.get(1)?,
        user_id: row.get(2)?,
        answers: db::decode_map(answers.as_deref()),
        submitted_at: row.get(4)?,
    })
}

pub fn media_kit_from_row(row: &Row<'_>) -> rusqlite::Result<MediaKitResponse> {
    let talking_points: Option<String> = row.get(5)?;
    let achievements: Option<String> = row.get(6)?;
    Ok(MediaKitResponse {
        id: row.get(0)?,
        campaign_id: row.get(1)?,
        slug: row.get(2)?,
        headline: row.get(3)?,
        bio: row.get(4)?,
        talking_points: db::decode_list(talking_points.as_deref()),
        achievements: db::decode_list(achievements.as_deref()),
        headshot_url: row.get(7)?,
        is_public: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

pub fn match_from_row(row: &Row<'_>) -> rusqlite::Result<MatchSuggestionResponse> {
    let matched: Option<String> = row.get(5)?;
    let status: String = row.get(6)?;
    Ok(MatchSuggestionResponse {
        id: row.get(0)?,
        campaign_id: row.get(1)?,
        podcast_id: row.get(2)?,
        podcast_title: row.get(3)?,
        score: row.get(4)?,
        matched_keywords: db::decode_list(matched.as_deref()),
        status: MatchStatus::parse(&status).unwrap_or_default(),
        reviewed_by: row.get(7)?,
        reviewed_at: row.get(8)?,
        created_at: row.get(9)?,
    })
}

/// A pitch together with the user id owning its campaign.
pub struct PitchRow {
    pub pitch: PitchResponse,
    pub owner_id: String,
}

pub fn pitch_from_row(row: &Row<'_>) -> rusqlite::Result<PitchRow> {
    let status: String = row.get(8)?;
    Ok(PitchRow {
        pitch: PitchResponse {
            id: row.get(0)?,
            campaign_id: row.get(1)?,
            podcast_id: row.get(2)?,
            podcast_title: row.get(3)?,
            match_id: row.get(4)?,
            template_id: row.get(5)?,
            subject: row.get(6)?,
            body: row.get(7)?,
            status: PitchStatus::parse(&status).unwrap_or(PitchStatus::Draft),
            message_id: row.get(9)?,
            sent_at: row.get(10)?,
            replied_at: row.get(11)?,
            reply_snippet: row.get(12)?,
            created_by: row.get(13)?,
            created_at: row.get(14)?,
            updated_at: row.get(15)?,
        },
        owner_id: row.get(16)?,
    })
}

pub fn booking_from_row(row: &Row<'_>) -> rusqlite::Result<BookingResponse> {
    let status: String = row.get(6)?;
    Ok(BookingResponse {
        id: row.get(0)?,
        user_id: row.get(1)?,
        podcast_id: row.get(2)?,
        podcast_title: row.get(3)?,
        campaign_id: row.get(4)?,
        pitch_id: row.get(5)?,
        status: BookingStatus::parse(&status).unwrap_or_default(),
        scheduled_at: row.get(7)?,
        episode_url: row.get(8)?,
        notes: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_apply_once() {
        let dir = tempfile::tempdir().unwrap();
        init_db(dir.path()).unwrap();
        let db = init_db(dir.path()).unwrap();
        let conn = db.conn();
        let applied: i64 = conn
            .query_row("SELECT COUNT(*) FROM _migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(applied, MIGRATIONS.len() as i64);
    }

    #[test]
    fn bridge_binds_nulls_and_bools() {
        let dir = tempfile::tempdir().unwrap();
        let db = init_db(dir.path()).unwrap();
        let conn = db.conn();
        let podcast = pgl_api::CreatePodcastRequest {
            title: "Build Mode".into(),
            host_name: Some("  ".into()),
            ..Default::default()
        };
        sq_execute(&conn, db::podcasts::insert("p1", &podcast)).unwrap();
        let row = sq_query_row(&conn, db::podcasts::get_by_id("p1"), podcast_from_row).unwrap();
        assert_eq!(row.title, "Build Mode");
        assert_eq!(row.host_name, None);

        let missing = sq_query_opt(&conn, db::podcasts::get_by_id("nope"), podcast_from_row);
        assert!(matches!(missing, Ok(None)));
    }

    #[test]
    fn unique_violation_is_detected() {
        let dir = tempfile::tempdir().unwrap();
        let db = init_db(dir.path()).unwrap();
        let conn = db.conn();
        let user = |id: &'static str| db::users::InsertParams {
            id,
            email: "dup@example.com",
            full_name: "Dup",
            role: UserRole::Client,
            password_hash: None,
            password_salt: None,
            api_key_hash: None,
        };
        sq_execute(&conn, db::users::insert(&user("u1"))).unwrap();
        let err = sq_execute(&conn, db::users::insert(&user("u2"))).unwrap_err();
        assert!(is_constraint_violation(&err));
    }
}
