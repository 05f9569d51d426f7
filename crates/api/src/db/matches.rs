//! Match suggestion query builders.

use sea_query::{Expr, OnConflict, Order, Query, SqliteQueryBuilder};

use super::tables::{MatchSuggestions, Podcasts};
use super::{Built, encode_list};
use crate::MatchStatus;

/// Suggestion columns plus the podcast title.
/// Column order must match `match_from_row()`.
fn match_select() -> sea_query::SelectStatement {
    Query::select()
        .column((MatchSuggestions::Table, MatchSuggestions::Id))
        .column((MatchSuggestions::Table, MatchSuggestions::CampaignId))
        .column((MatchSuggestions::Table, MatchSuggestions::PodcastId))
        .column((Podcasts::Table, Podcasts::Title))
        .column((MatchSuggestions::Table, MatchSuggestions::Score))
        .column((MatchSuggestions::Table, MatchSuggestions::MatchedKeywords))
        .column((MatchSuggestions::Table, MatchSuggestions::Status))
        .column((MatchSuggestions::Table, MatchSuggestions::ReviewedBy))
        .column((MatchSuggestions::Table, MatchSuggestions::ReviewedAt))
        .column((MatchSuggestions::Table, MatchSuggestions::CreatedAt))
        .from(MatchSuggestions::Table)
        .inner_join(
            Podcasts::Table,
            Expr::col((Podcasts::Table, Podcasts::Id))
                .equals((MatchSuggestions::Table, MatchSuggestions::PodcastId)),
        )
        .to_owned()
}

pub fn get_by_id(id: &str) -> Built {
    match_select()
        .and_where(Expr::col((MatchSuggestions::Table, MatchSuggestions::Id)).eq(id))
        .build(SqliteQueryBuilder)
}

/// Suggestions for a campaign, best score first.
pub fn list_for_campaign(campaign_id: &str, status: Option<MatchStatus>) -> Built {
    let mut q = match_select();
    q.and_where(
        Expr::col((MatchSuggestions::Table, MatchSuggestions::CampaignId)).eq(campaign_id),
    );
    if let Some(status) = status {
        q.and_where(
            Expr::col((MatchSuggestions::Table, MatchSuggestions::Status)).eq(status.as_str()),
        );
    }
    q.order_by((MatchSuggestions::Table, MatchSuggestions::Score), Order::Desc)
        .order_by((Podcasts::Table, Podcasts::Title), Order::Asc)
        .build(SqliteQueryBuilder)
}

/// Podcasts already suggested for a campaign (any status).
pub fn suggested_podcast_ids(campaign_id: &str) -> Built {
    Query::select()
        .column(MatchSuggestions::PodcastId)
        .from(MatchSuggestions::Table)
        .and_where(Expr::col(MatchSuggestions::CampaignId).eq(campaign_id))
        .build(SqliteQueryBuilder)
}

/// INSERT a pending suggestion unless the pair already exists.
pub fn insert_if_absent(
    id: &str,
    campaign_id: &str,
    podcast_id: &str,
    score: i64,
    matched_keywords: &[String],
) -> Built {
    Query::insert()
        .into_table(MatchSuggestions::Table)
        .columns([
            MatchSuggestions::Id,
            MatchSuggestions::CampaignId,
            MatchSuggestions::PodcastId,
            MatchSuggestions::Score,
            MatchSuggestions::MatchedKeywords,
            MatchSuggestions::Status,
        ])
        .values_panic([
            id.into(),
            campaign_id.into(),
            podcast_id.into(),
            score.into(),
            encode_list(matched_keywords).into(),
            MatchStatus::Pending.as_str().into(),
        ])
        .on_conflict(
            OnConflict::columns([MatchSuggestions::CampaignId, MatchSuggestions::PodcastId])
                .do_nothing()
                .to_owned(),
        )
        .build(SqliteQueryBuilder)
}

/// Approve or reject a suggestion. Only pending rows are touched, so zero
/// affected rows means it was already reviewed.
pub fn review(id: &str, status: MatchStatus, reviewer_id: &str) -> Built {
    Query::update()
        .table(MatchSuggestions::Table)
        .value(MatchSuggestions::Status, status.as_str())
        .value(MatchSuggestions::ReviewedBy, reviewer_id)
        .value(MatchSuggestions::ReviewedAt, Expr::cust("datetime('now')"))
        .and_where(Expr::col(MatchSuggestions::Id).eq(id))
        .and_where(Expr::col(MatchSuggestions::Status).eq(MatchStatus::Pending.as_str()))
        .build(SqliteQueryBuilder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_ignores_existing_pair() {
        let (sql, values) = insert_if_absent("m1", "c1", "p1", 80, &["ai".to_string()]);
        assert!(sql.contains("ON CONFLICT (\"campaign_id\", \"podcast_id\") DO NOTHING"));
        assert_eq!(values.0[5], sea_query::Value::from("pending"));
    }

    #[test]
    fn review_only_touches_pending_rows() {
        let (sql, values) = review("m1", MatchStatus::Approved, "u1");
        assert!(sql.contains("\"status\" = ?"));
        assert_eq!(values.0.last(), Some(&sea_query::Value::from("pending")));
    }

    #[test]
    fn listing_orders_by_score() {
        let (sql, values) = list_for_campaign("c1", Some(MatchStatus::Pending));
        assert!(sql.contains("ORDER BY \"match_suggestions\".\"score\" DESC"));
        assert_eq!(values.0.len(), 2);
    }
}
