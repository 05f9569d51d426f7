//! Media kit query builders (one settings row per campaign).

use sea_query::{Asterisk, Expr, Func, OnConflict, Query, SqliteQueryBuilder};

use super::tables::{Campaigns, MediaKits, Users};
use super::{Built, encode_list};

/// Column order must match `media_kit_from_row()`.
fn media_kit_select() -> sea_query::SelectStatement {
    Query::select()
        .columns([
            MediaKits::Id,
            MediaKits::CampaignId,
            MediaKits::Slug,
            MediaKits::Headline,
            MediaKits::Bio,
            MediaKits::TalkingPoints,
            MediaKits::Achievements,
            MediaKits::HeadshotUrl,
            MediaKits::IsPublic,
            MediaKits::UpdatedAt,
        ])
        .from(MediaKits::Table)
        .to_owned()
}

pub fn get_by_campaign(campaign_id: &str) -> Built {
    media_kit_select()
        .and_where(Expr::col(MediaKits::CampaignId).eq(campaign_id))
        .build(SqliteQueryBuilder)
}

/// Whether `slug` is taken by a campaign other than `campaign_id`.
pub fn slug_taken(slug: &str, campaign_id: &str) -> Built {
    Query::select()
        .expr(Expr::expr(Func::count(Expr::col(Asterisk))).gt(0))
        .from(MediaKits::Table)
        .and_where(Expr::col(MediaKits::Slug).eq(slug))
        .and_where(Expr::col(MediaKits::CampaignId).ne(campaign_id))
        .build(SqliteQueryBuilder)
}

/// Public view of a kit, joined with the campaign links and client name.
///
/// Column order: slug, full_name, headline, bio, talking_points,
/// achievements, headshot_url, links.
pub fn get_public_by_slug(slug: &str) -> Built {
    Query::select()
        .column((MediaKits::Table, MediaKits::Slug))
        .column((Users::Table, Users::FullName))
        .column((MediaKits::Table, MediaKits::Headline))
        .column((MediaKits::Table, MediaKits::Bio))
        .column((MediaKits::Table, MediaKits::TalkingPoints))
        .column((MediaKits::Table, MediaKits::Achievements))
        .column((MediaKits::Table, MediaKits::HeadshotUrl))
        .column((Campaigns::Table, Campaigns::Links))
        .from(MediaKits::Table)
        .inner_join(
            Campaigns::Table,
            Expr::col((Campaigns::Table, Campaigns::Id))
                .equals((MediaKits::Table, MediaKits::CampaignId)),
        )
        .inner_join(
            Users::Table,
            Expr::col((Users::Table, Users::Id)).equals((Campaigns::Table, Campaigns::UserId)),
        )
        .and_where(Expr::col((MediaKits::Table, MediaKits::Slug)).eq(slug))
        .and_where(Expr::col((MediaKits::Table, MediaKits::IsPublic)).eq(true))
        .build(SqliteQueryBuilder)
}

/// Fully resolved media kit values (after merging a partial request with
/// the stored row).
pub struct UpsertParams<'a> {
    pub id: &'a str,
    pub campaign_id: &'a str,
    pub slug: &'a str,
    pub headline: Option<&'a str>,
    pub bio: Option<&'a str>,
    pub talking_points: &'a [String],
    pub achievements: &'a [String],
    pub headshot_url: Option<&'a str>,
    pub is_public: bool,
}

pub fn upsert(p: &UpsertParams<'_>) -> Built {
    Query::insert()
        .into_table(MediaKits::Table)
        .columns([
            MediaKits::Id,
            MediaKits::CampaignId,
            MediaKits::Slug,
            MediaKits::Headline,
            MediaKits::Bio,
            MediaKits::TalkingPoints,
            MediaKits::Achievements,
            MediaKits::HeadshotUrl,
            MediaKits::IsPublic,
        ])
        .values_panic([
            p.id.into(),
            p.campaign_id.into(),
            p.slug.into(),
            p.headline.map(|s| s.to_string()).into(),
            p.bio.map(|s| s.to_string()).into(),
            encode_list(p.talking_points).into(),
            encode_list(p.achievements).into(),
            p.headshot_url.map(|s| s.to_string()).into(),
            p.is_public.into(),
        ])
        .on_conflict(
            OnConflict::column(MediaKits::CampaignId)
                .update_columns([
                    MediaKits::Slug,
                    MediaKits::Headline,
                    MediaKits::Bio,
                    MediaKits::TalkingPoints,
                    MediaKits::Achievements,
                    MediaKits::HeadshotUrl,
                    MediaKits::IsPublic,
                ])
                .value(MediaKits::UpdatedAt, Expr::cust("datetime('now')"))
                .to_owned(),
        )
        .build(SqliteQueryBuilder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_lookup_requires_public_flag() {
        let (sql, values) = get_public_by_slug("dana-reyes");
        assert!(sql.contains("\"is_public\" = ?"));
        assert_eq!(values.0[1], sea_query::Value::Bool(Some(true)));
    }

    #[test]
    fn slug_check_excludes_own_campaign() {
        let (sql, _) = slug_taken("dana", "c1");
        assert!(sql.contains("\"campaign_id\" <> ?"));
    }
}
