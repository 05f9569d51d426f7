//! Booking (placement) query builders.

use sea_query::{Asterisk, Expr, Func, Order, Query, SimpleExpr, SqliteQueryBuilder};

use super::Built;
use super::tables::{Bookings, Podcasts};
use crate::service::optional_text;
use crate::{BookingListQuery, BookingStatus, UpdateBookingRequest};

/// Result of building a paginated booking list query.
pub struct BuiltBookingListQuery {
    pub count_query: Built,
    pub select_query: Built,
    pub page: u32,
    pub per_page: u32,
}

/// Booking columns plus the podcast title.
/// Column order must match `booking_from_row()`.
fn booking_select() -> sea_query::SelectStatement {
    Query::select()
        .column((Bookings::Table, Bookings::Id))
        .column((Bookings::Table, Bookings::UserId))
        .column((Bookings::Table, Bookings::PodcastId))
        .column((Podcasts::Table, Podcasts::Title))
        .column((Bookings::Table, Bookings::CampaignId))
        .column((Bookings::Table, Bookings::PitchId))
        .column((Bookings::Table, Bookings::Status))
        .column((Bookings::Table, Bookings::ScheduledAt))
        .column((Bookings::Table, Bookings::EpisodeUrl))
        .column((Bookings::Table, Bookings::Notes))
        .column((Bookings::Table, Bookings::CreatedAt))
        .column((Bookings::Table, Bookings::UpdatedAt))
        .from(Bookings::Table)
        .inner_join(
            Podcasts::Table,
            Expr::col((Podcasts::Table, Podcasts::Id))
                .equals((Bookings::Table, Bookings::PodcastId)),
        )
        .to_owned()
}

/// Parameters for inserting a booking.
pub struct InsertParams<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub podcast_id: &'a str,
    pub campaign_id: Option<&'a str>,
    pub pitch_id: Option<&'a str>,
    pub status: BookingStatus,
    pub scheduled_at: Option<&'a str>,
    pub notes: Option<&'a str>,
}

pub fn insert(p: &InsertParams<'_>) -> Built {
    Query::insert()
        .into_table(Bookings::Table)
        .columns([
            Bookings::Id,
            Bookings::UserId,
            Bookings::PodcastId,
            Bookings::CampaignId,
            Bookings::PitchId,
            Bookings::Status,
            Bookings::ScheduledAt,
            Bookings::Notes,
        ])
        .values_panic([
            p.id.into(),
            p.user_id.into(),
            p.podcast_id.into(),
            p.campaign_id.map(|s| s.to_string()).into(),
            p.pitch_id.map(|s| s.to_string()).into(),
            p.status.as_str().into(),
            p.scheduled_at.map(|s| s.to_string()).into(),
            p.notes.map(|s| s.to_string()).into(),
        ])
        .build(SqliteQueryBuilder)
}

pub fn get_by_id(id: &str) -> Built {
    booking_select()
        .and_where(Expr::col((Bookings::Table, Bookings::Id)).eq(id))
        .build(SqliteQueryBuilder)
}

/// The booking created when a pitch was accepted, if any.
pub fn get_by_pitch(pitch_id: &str) -> Built {
    booking_select()
        .and_where(Expr::col((Bookings::Table, Bookings::PitchId)).eq(pitch_id))
        .build(SqliteQueryBuilder)
}

/// Build paginated booking list queries. `owner` scopes to one client.
pub fn list(q: &BookingListQuery, owner: Option<&str>) -> BuiltBookingListQuery {
    let (page, per_page) = crate::clamp_page(q.page, q.per_page);
    let (limit, offset) = super::page_window(page, per_page);

    let mut count_q = Query::select()
        .expr(Func::count(Expr::col(Asterisk)))
        .from(Bookings::Table)
        .to_owned();
    let mut select_q = booking_select();

    let mut conds: Vec<SimpleExpr> = Vec::new();
    if let Some(owner) = owner {
        conds.push(Expr::col((Bookings::Table, Bookings::UserId)).eq(owner));
    }
    if let Some(status) = q.status {
        conds.push(Expr::col((Bookings::Table, Bookings::Status)).eq(status.as_str()));
    }
    if let Some(campaign_id) = q.campaign_id.as_deref() {
        conds.push(Expr::col((Bookings::Table, Bookings::CampaignId)).eq(campaign_id));
    }
    for cond in conds {
        count_q.and_where(cond.clone());
        select_q.and_where(cond);
    }

    // Unscheduled bookings sort last.
    select_q
        .order_by_expr(
            Expr::col((Bookings::Table, Bookings::ScheduledAt)).is_null(),
            Order::Asc,
        )
        .order_by((Bookings::Table, Bookings::ScheduledAt), Order::Asc)
        .order_by((Bookings::Table, Bookings::CreatedAt), Order::Desc)
        .limit(limit)
        .offset(offset);

    BuiltBookingListQuery {
        count_query: count_q.build(SqliteQueryBuilder),
        select_query: select_q.build(SqliteQueryBuilder),
        page,
        per_page,
    }
}

/// Partial UPDATE. Returns `None` when the request changes nothing.
pub fn update(id: &str, req: &UpdateBookingRequest) -> Option<Built> {
    let mut values: Vec<(Bookings, SimpleExpr)> = Vec::new();
    if let Some(status) = req.status {
        values.push((Bookings::Status, status.as_str().into()));
    }
    for (column, value) in [
        (Bookings::ScheduledAt, req.scheduled_at.as_deref()),
        (Bookings::EpisodeUrl, req.episode_url.as_deref()),
        (Bookings::Notes, req.notes.as_deref()),
    ] {
        if let Some(value) = optional_text(value) {
            values.push((column, value.into()));
        }
    }
    if values.is_empty() {
        return None;
    }
    values.push((Bookings::UpdatedAt, Expr::cust("datetime('now')")));
    Some(
        Query::update()
            .table(Bookings::Table)
            .values(values)
            .and_where(Expr::col(Bookings::Id).eq(id))
            .build(SqliteQueryBuilder),
    )
}

pub fn delete(id: &str) -> Built {
    Query::delete()
        .from_table(Bookings::Table)
        .and_where(Expr::col(Bookings::Id).eq(id))
        .build(SqliteQueryBuilder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unscheduled_bookings_sort_last() {
        let q = BookingListQuery {
            page: 1,
            per_page: 20,
            status: None,
            campaign_id: None,
        };
        let (sql, _) = list(&q, None).select_query;
        assert!(sql.contains("ORDER BY \"bookings\".\"scheduled_at\" IS NULL ASC"));
    }

    #[test]
    fn update_sets_timestamp() {
        let req = UpdateBookingRequest {
            status: Some(BookingStatus::Confirmed),
            ..Default::default()
        };
        let (sql, values) = update("b1", &req).unwrap();
        assert!(sql.contains("\"updated_at\" = datetime('now')"));
        assert_eq!(values.0[0], sea_query::Value::from("confirmed"));
    }
}
