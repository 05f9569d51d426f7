//! Campaign query builders.

use sea_query::{Asterisk, Expr, Func, Order, Query, SimpleExpr, SqliteQueryBuilder};

use super::tables::{Campaigns, Users};
use super::{Built, encode_list};
use crate::service::optional_text;
use crate::{CampaignListQuery, CampaignStatus, UpdateCampaignRequest};

/// Result of building a paginated campaign list query.
pub struct BuiltCampaignListQuery {
    pub count_query: Built,
    pub select_query: Built,
    pub page: u32,
    pub per_page: u32,
}

// ── Helpers ────────────────────────────────────────────────────────────────

/// Campaign columns plus the owner's name from the users join.
/// Column order must match `campaign_from_row()`.
fn campaign_select() -> sea_query::SelectStatement {
    Query::select()
        .column((Campaigns::Table, Campaigns::Id))
        .column((Campaigns::Table, Campaigns::UserId))
        .column((Users::Table, Users::FullName))
        .column((Campaigns::Table, Campaigns::Name))
        .column((Campaigns::Table, Campaigns::Status))
        .column((Campaigns::Table, Campaigns::Goals))
        .column((Campaigns::Table, Campaigns::TargetAudience))
        .column((Campaigns::Table, Campaigns::Keywords))
        .column((Campaigns::Table, Campaigns::Bio))
        .column((Campaigns::Table, Campaigns::Angles))
        .column((Campaigns::Table, Campaigns::Links))
        .column((Campaigns::Table, Campaigns::CreatedAt))
        .column((Campaigns::Table, Campaigns::UpdatedAt))
        .from(Campaigns::Table)
        .inner_join(
            Users::Table,
            Expr::col((Users::Table, Users::Id)).equals((Campaigns::Table, Campaigns::UserId)),
        )
        .to_owned()
}

// ── Queries ────────────────────────────────────────────────────────────────

/// Parameters for inserting a campaign.
pub struct InsertParams<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub name: &'a str,
    pub status: CampaignStatus,
    pub goals: Option<&'a str>,
    pub target_audience: Option<&'a str>,
    pub keywords: &'a [String],
    pub links: &'a [String],
}

pub fn insert(p: &InsertParams<'_>) -> Built {
    Query::insert()
        .into_table(Campaigns::Table)
        .columns([
            Campaigns::Id,
            Campaigns::UserId,
            Campaigns::Name,
            Campaigns::Status,
            Campaigns::Goals,
            Campaigns::TargetAudience,
            Campaigns::Keywords,
            Campaigns::Links,
        ])
        .values_panic([
            p.id.into(),
            p.user_id.into(),
            p.name.into(),
            p.status.as_str().into(),
            p.goals.map(|s| s.to_string()).into(),
            p.target_audience.map(|s| s.to_string()).into(),
            encode_list(p.keywords).into(),
            encode_list(p.links).into(),
        ])
        .build(SqliteQueryBuilder)
}

/// SELECT a single campaign by id (with users JOIN).
pub fn get_by_id(id: &str) -> Built {
    campaign_select()
        .and_where(Expr::col((Campaigns::Table, Campaigns::Id)).eq(id))
        .build(SqliteQueryBuilder)
}

/// Build paginated campaign list queries.
///
/// `owner` restricts the listing to one user's campaigns (always set for clients).
pub fn list(q: &CampaignListQuery, owner: Option<&str>) -> BuiltCampaignListQuery {
    let (page, per_page) = crate::clamp_page(q.page, q.per_page);
    let (limit, offset) = super::page_window(page, per_page);

    let mut count_q = Query::select()
        .expr(Func::count(Expr::col(Asterisk)))
        .from(Campaigns::Table)
        .to_owned();
    let mut select_q = campaign_select();

    let mut conds: Vec<SimpleExpr> = Vec::new();
    if let Some(owner) = owner {
        conds.push(Expr::col((Campaigns::Table, Campaigns::UserId)).eq(owner));
    }
    if let Some(status) = q.status {
        conds.push(Expr::col((Campaigns::Table, Campaigns::Status)).eq(status.as_str()));
    }
    for cond in conds {
        count_q.and_where(cond.clone());
        select_q.and_where(cond);
    }

    select_q
        .order_by((Campaigns::Table, Campaigns::UpdatedAt), Order::Desc)
        .limit(limit)
        .offset(offset);

    BuiltCampaignListQuery {
        count_query: count_q.build(SqliteQueryBuilder),
        select_query: select_q.build(SqliteQueryBuilder),
        page,
        per_page,
    }
}

/// Partial UPDATE. Returns `None` when the request changes nothing.
pub fn update(id: &str, req: &UpdateCampaignRequest) -> Option<Built> {
    let mut values: Vec<(Campaigns, SimpleExpr)> = Vec::new();
    if let Some(name) = &req.name {
        values.push((Campaigns::Name, name.trim().into()));
    }
    if let Some(status) = req.status {
        values.push((Campaigns::Status, status.as_str().into()));
    }
    for (column, value) in [
        (Campaigns::Goals, req.goals.as_deref()),
        (Campaigns::TargetAudience, req.target_audience.as_deref()),
        (Campaigns::Bio, req.bio.as_deref()),
    ] {
        if let Some(value) = optional_text(value) {
            values.push((column, value.into()));
        }
    }
    if let Some(keywords) = &req.keywords {
        let keywords = keywords.clone().into_keywords();
        values.push((Campaigns::Keywords, encode_list(&keywords).into()));
    }
    if let Some(links) = &req.links {
        values.push((Campaigns::Links, encode_list(links).into()));
    }
    if let Some(angles) = &req.angles {
        values.push((Campaigns::Angles, encode_list(angles).into()));
    }
    if values.is_empty() {
        return None;
    }
    values.push((Campaigns::UpdatedAt, Expr::cust("datetime('now')")));

    Some(
        Query::update()
            .table(Campaigns::Table)
            .values(values)
            .and_where(Expr::col(Campaigns::Id).eq(id))
            .build(SqliteQueryBuilder),
    )
}

/// Store a generated bio.
pub fn update_bio(id: &str, bio: &str) -> Built {
    Query::update()
        .table(Campaigns::Table)
        .value(Campaigns::Bio, bio)
        .value(Campaigns::UpdatedAt, Expr::cust("datetime('now')"))
        .and_where(Expr::col(Campaigns::Id).eq(id))
        .build(SqliteQueryBuilder)
}

/// Store generated angles (JSON list).
pub fn update_angles(id: &str, angles: &[crate::PitchAngle]) -> Built {
    Query::update()
        .table(Campaigns::Table)
        .value(Campaigns::Angles, encode_list(angles))
        .value(Campaigns::UpdatedAt, Expr::cust("datetime('now')"))
        .and_where(Expr::col(Campaigns::Id).eq(id))
        .build(SqliteQueryBuilder)
}

/// DELETE a campaign. Questionnaire, media kit, matches and pitches cascade.
pub fn delete(id: &str) -> Built {
    Query::delete()
        .from_table(Campaigns::Table)
        .and_where(Expr::col(Campaigns::Id).eq(id))
        .build(SqliteQueryBuilder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KeywordsInput;

    #[test]
    fn client_listing_is_scoped_to_owner() {
        let q = CampaignListQuery {
            page: 1,
            per_page: 20,
            status: Some(CampaignStatus::Active),
            user_id: None,
        };
        let built = list(&q, Some("u1"));
        let (sql, values) = &built.select_query;
        assert!(sql.contains("INNER JOIN \"users\""));
        assert!(values.0.contains(&sea_query::Value::from("u1")));
        assert!(values.0.contains(&sea_query::Value::from("active")));
        assert_eq!(built.count_query.1.0.len(), 2);
    }

    #[test]
    fn update_normalizes_keywords() {
        let req = UpdateCampaignRequest {
            keywords: Some(KeywordsInput::Text("ai, AI, ethics".into())),
            ..Default::default()
        };
        let (_, values) = update("c1", &req).unwrap();
        assert_eq!(values.0[0], sea_query::Value::from(r#"["ai","ethics"]"#));
    }
}
