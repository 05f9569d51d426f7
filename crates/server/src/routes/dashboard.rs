use axum::{extract::State, Json};
use rusqlite::Connection;

use pgl_api::{db, percent, BookingCounts, BookingStatus, CampaignStatus, DashboardStatsResponse};

use super::auth::AuthUser;
use crate::error::ApiErr;
use crate::storage::{sq_count, sq_query_map, Db};

fn booking_counts(conn: &Connection, owner: Option<&str>) -> Result<BookingCounts, ApiErr> {
    let rows: Vec<(String, i64)> = sq_query_map(conn, db::stats::bookings_by_status(owner), |row| {
        Ok((row.get(0)?, row.get(1)?))
    })
    .map_err(ApiErr::from_db("count bookings"))?;

    let mut counts = BookingCounts::default();
    for (status, n) in rows {
        match BookingStatus::parse(&status) {
            Some(BookingStatus::Pending) => counts.pending += n,
            Some(BookingStatus::Confirmed) => counts.confirmed += n,
            Some(BookingStatus::Completed) => counts.completed += n,
            Some(BookingStatus::Cancelled) => counts.cancelled += n,
            None => tracing::warn!("unknown booking status in stats: {status}"),
        }
    }
    Ok(counts)
}

/// GET /api/dashboard/stats — agency-wide for staff, own campaigns for clients.
pub async fn stats(
    State(db): State<Db>,
    user: AuthUser,
) -> Result<Json<DashboardStatsResponse>, ApiErr> {
    let owner = user.owner_scope();
    let conn = db.conn();
    let count = |built, context: &'static str| sq_count(&conn, built).map_err(ApiErr::from_db(context));

    let clients = if user.is_staff() {
        count(db::stats::count_clients(), "count clients")?
    } else {
        0
    };
    let pitches_sent = count(db::stats::count_pitches_sent(owner), "count sent pitches")?;
    let replies = count(db::stats::count_replies(owner), "count replies")?;

    Ok(Json(DashboardStatsResponse {
        clients,
        campaigns: count(db::stats::count_campaigns(owner, None), "count campaigns")?,
        active_campaigns: count(
            db::stats::count_campaigns(owner, Some(CampaignStatus::Active)),
            "count active campaigns",
        )?,
        podcasts: count(db::stats::count_podcasts(), "count podcasts")?,
        pending_matches: count(db::stats::count_pending_matches(owner), "count pending matches")?,
        pitches_sent,
        replies,
        reply_rate_percent: percent(replies, pitches_sent),
        bookings: booking_counts(&conn, owner)?,
    }))
}
