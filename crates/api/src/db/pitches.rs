//! Pitch query builders.

use sea_query::{Asterisk, Expr, Func, Order, Query, SimpleExpr, SqliteQueryBuilder};

use super::Built;
use super::tables::{Campaigns, Pitches, Podcasts};
use crate::{PitchListQuery, PitchStatus};

/// Result of building a paginated pitch list query.
pub struct BuiltPitchListQuery {
    pub count_query: Built,
    pub select_query: Built,
    pub page: u32,
    pub per_page: u32,
}

// ── Helpers ────────────────────────────────────────────────────────────────

/// Pitch columns, the podcast title, and finally the campaign owner id.
/// Column order must match `pitch_from_row()`.
fn pitch_select() -> sea_query::SelectStatement {
    Query::select()
        .column((Pitches::Table, Pitches::Id))
        .column((Pitches::Table, Pitches::CampaignId))
        .column((Pitches::Table, Pitches::PodcastId))
        .column((Podcasts::Table, Podcasts::Title))
        .column((Pitches::Table, Pitches::MatchId))
        .column((Pitches::Table, Pitches::TemplateId))
        .column((Pitches::Table, Pitches::Subject))
        .column((Pitches::Table, Pitches::Body))
        .column((Pitches::Table, Pitches::Status))
        .column((Pitches::Table, Pitches::MessageId))
        .column((Pitches::Table, Pitches::SentAt))
        .column((Pitches::Table, Pitches::RepliedAt))
        .column((Pitches::Table, Pitches::ReplySnippet))
        .column((Pitches::Table, Pitches::CreatedBy))
        .column((Pitches::Table, Pitches::CreatedAt))
        .column((Pitches::Table, Pitches::UpdatedAt))
        .column((Campaigns::Table, Campaigns::UserId))
        .from(Pitches::Table)
        .inner_join(
            Podcasts::Table,
            Expr::col((Podcasts::Table, Podcasts::Id)).equals((Pitches::Table, Pitches::PodcastId)),
        )
        .inner_join(
            Campaigns::Table,
            Expr::col((Campaigns::Table, Campaigns::Id))
                .equals((Pitches::Table, Pitches::CampaignId)),
        )
        .to_owned()
}

fn id_is(id: &str) -> SimpleExpr {
    Expr::col(Pitches::Id).eq(id)
}

fn status_is(status: PitchStatus) -> SimpleExpr {
    Expr::col(Pitches::Status).eq(status.as_str())
}

/// A send claim older than this is considered abandoned and may be taken over.
pub const SEND_CLAIM_EXPIRY: &str = "-5 minutes";

/// No live send claim on the pitch.
fn not_being_sent() -> SimpleExpr {
    Expr::col(Pitches::SendingSince).is_null().or(Expr::col(Pitches::SendingSince)
        .lt(Expr::cust_with_values("datetime('now', ?)", [SEND_CLAIM_EXPIRY])))
}

// ── Queries ────────────────────────────────────────────────────────────────

/// Parameters for inserting a draft pitch.
pub struct InsertParams<'a> {
    pub id: &'a str,
    pub campaign_id: &'a str,
    pub podcast_id: &'a str,
    pub match_id: Option<&'a str>,
    pub template_id: Option<&'a str>,
    pub subject: &'a str,
    pub body: &'a str,
    pub created_by: &'a str,
}

pub fn insert(p: &InsertParams<'_>) -> Built {
    Query::insert()
        .into_table(Pitches::Table)
        .columns([
            Pitches::Id,
            Pitches::CampaignId,
            Pitches::PodcastId,
            Pitches::MatchId,
            Pitches::TemplateId,
            Pitches::Subject,
            Pitches::Body,
            Pitches::Status,
            Pitches::CreatedBy,
        ])
        .values_panic([
            p.id.into(),
            p.campaign_id.into(),
            p.podcast_id.into(),
            p.match_id.map(|s| s.to_string()).into(),
            p.template_id.map(|s| s.to_string()).into(),
            p.subject.into(),
            p.body.into(),
            PitchStatus::Draft.as_str().into(),
            p.created_by.into(),
        ])
        .build(SqliteQueryBuilder)
}

pub fn get_by_id(id: &str) -> Built {
    pitch_select()
        .and_where(Expr::col((Pitches::Table, Pitches::Id)).eq(id))
        .build(SqliteQueryBuilder)
}

/// Locate a pitch by the `Message-ID` assigned when it was sent.
pub fn get_by_message_id(message_id: &str) -> Built {
    pitch_select()
        .and_where(Expr::col((Pitches::Table, Pitches::MessageId)).eq(message_id))
        .build(SqliteQueryBuilder)
}

/// Build paginated pitch list queries. `owner` scopes to one client's campaigns.
pub fn list(q: &PitchListQuery, owner: Option<&str>) -> BuiltPitchListQuery {
    let (page, per_page) = crate::clamp_page(q.page, q.per_page);
    let (limit, offset) = super::page_window(page, per_page);

    let mut count_q = Query::select()
        .expr(Func::count(Expr::col(Asterisk)))
        .from(Pitches::Table)
        .inner_join(
            Campaigns::Table,
            Expr::col((Campaigns::Table, Campaigns::Id))
                .equals((Pitches::Table, Pitches::CampaignId)),
        )
        .to_owned();
    let mut select_q = pitch_select();

    let mut conds: Vec<SimpleExpr> = Vec::new();
    if let Some(owner) = owner {
        conds.push(Expr::col((Campaigns::Table, Campaigns::UserId)).eq(owner));
    }
    if let Some(campaign_id) = q.campaign_id.as_deref() {
        conds.push(Expr::col((Pitches::Table, Pitches::CampaignId)).eq(campaign_id));
    }
    if let Some(status) = q.status {
        conds.push(Expr::col((Pitches::Table, Pitches::Status)).eq(status.as_str()));
    }
    for cond in conds {
        count_q.and_where(cond.clone());
        select_q.and_where(cond);
    }

    select_q
        .order_by((Pitches::Table, Pitches::UpdatedAt), Order::Desc)
        .limit(limit)
        .offset(offset);

    BuiltPitchListQuery {
        count_query: count_q.build(SqliteQueryBuilder),
        select_query: select_q.build(SqliteQueryBuilder),
        page,
        per_page,
    }
}

/// Edit subject/body. Returns `None` when nothing changes.
pub fn update_text(id: &str, subject: Option<&str>, body: Option<&str>) -> Option<Built> {
    let mut values: Vec<(Pitches, SimpleExpr)> = Vec::new();
    if let Some(subject) = subject {
        values.push((Pitches::Subject, subject.trim().into()));
    }
    if let Some(body) = body {
        values.push((Pitches::Body, body.into()));
    }
    if values.is_empty() {
        return None;
    }
    values.push((Pitches::UpdatedAt, Expr::cust("datetime('now')")));
    Some(
        Query::update()
            .table(Pitches::Table)
            .values(values)
            .and_where(id_is(id))
            .and_where(not_being_sent())
            .build(SqliteQueryBuilder),
    )
}

/// Compare-and-set a status change. Zero affected rows means the pitch moved
/// in the meantime, or is being sent.
pub fn set_status(id: &str, from: PitchStatus, to: PitchStatus) -> Built {
    Query::update()
        .table(Pitches::Table)
        .value(Pitches::Status, to.as_str())
        .value(Pitches::UpdatedAt, Expr::cust("datetime('now')"))
        .and_where(id_is(id))
        .and_where(status_is(from))
        .and_where(not_being_sent())
        .build(SqliteQueryBuilder)
}

/// Claim an unsent pitch for delivery. Zero affected rows means another
/// request is already sending it, or its status moved.
pub fn claim_send(id: &str, from: PitchStatus) -> Built {
    Query::update()
        .table(Pitches::Table)
        .value(Pitches::SendingSince, Expr::cust("datetime('now')"))
        .and_where(id_is(id))
        .and_where(status_is(from))
        .and_where(not_being_sent())
        .build(SqliteQueryBuilder)
}

/// Drop the send claim after a failed delivery.
pub fn release_send(id: &str) -> Built {
    Query::update()
        .table(Pitches::Table)
        .value(Pitches::SendingSince, Option::<String>::None)
        .and_where(id_is(id))
        .build(SqliteQueryBuilder)
}

/// Record delivery: status `sent`, the relay's message id and `sent_at`.
/// Releases the send claim.
pub fn mark_sent(id: &str, from: PitchStatus, message_id: &str) -> Built {
    Query::update()
        .table(Pitches::Table)
        .value(Pitches::Status, PitchStatus::Sent.as_str())
        .value(Pitches::MessageId, message_id)
        .value(Pitches::SentAt, Expr::cust("datetime('now')"))
        .value(Pitches::SendingSince, Option::<String>::None)
        .value(Pitches::UpdatedAt, Expr::cust("datetime('now')"))
        .and_where(id_is(id))
        .and_where(status_is(from))
        .build(SqliteQueryBuilder)
}

/// Record an inbound reply.
pub fn mark_replied(id: &str, from: PitchStatus, snippet: Option<&str>) -> Built {
    Query::update()
        .table(Pitches::Table)
        .value(Pitches::Status, PitchStatus::Replied.as_str())
        .value(Pitches::ReplySnippet, snippet.map(|s| s.to_string()))
        .value(Pitches::RepliedAt, Expr::cust("datetime('now')"))
        .value(Pitches::UpdatedAt, Expr::cust("datetime('now')"))
        .and_where(id_is(id))
        .and_where(status_is(from))
        .build(SqliteQueryBuilder)
}

pub fn delete(id: &str) -> Built {
    Query::delete()
        .from_table(Pitches::Table)
        .and_where(id_is(id))
        .build(SqliteQueryBuilder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_updates_are_compare_and_set() {
        let (sql, values) = set_status("p1", PitchStatus::Sent, PitchStatus::Accepted);
        assert!(sql.contains("WHERE \"id\" = ? AND \"status\" = ?"));
        assert!(sql.contains("\"sending_since\" IS NULL"));
        assert_eq!(values.0[0], sea_query::Value::from("accepted"));
        assert_eq!(values.0[2], sea_query::Value::from("sent"));
    }

    #[test]
    fn send_claim_skips_live_claims() {
        let (sql, values) = claim_send("p1", PitchStatus::Draft);
        assert!(sql.starts_with("UPDATE \"pitches\" SET \"sending_since\" = datetime('now')"));
        assert!(sql.contains("\"sending_since\" < datetime('now', ?)"));
        assert_eq!(
            values.0,
            vec![
                sea_query::Value::from("p1"),
                sea_query::Value::from("draft"),
                sea_query::Value::from(SEND_CLAIM_EXPIRY),
            ]
        );

        let (sql, _) = mark_sent("p1", PitchStatus::Draft, "<m@pgl.local>");
        assert!(sql.contains("\"sending_since\" = ?"));
        let (sql, values) = release_send("p1");
        assert!(sql.contains("\"sending_since\" = ?"));
        assert_eq!(values.0[0], sea_query::Value::String(None));
    }

    #[test]
    fn listing_joins_campaign_for_scope() {
        let q = PitchListQuery {
            page: 1,
            per_page: 20,
            campaign_id: None,
            status: Some(PitchStatus::Sent),
        };
        let built = list(&q, Some("u1"));
        assert!(built.count_query.0.contains("INNER JOIN \"campaigns\""));
        assert_eq!(built.select_query.1.0.len(), 4);
    }

    #[test]
    fn text_update_skips_empty_requests() {
        assert!(update_text("p1", None, None).is_none());
        assert!(update_text("p1", Some("Hi"), None).is_some());
    }
}
