//! Podcast catalogue query builders.

use sea_query::{Asterisk, Expr, Func, LikeExpr, Order, Query, SimpleExpr, SqliteQueryBuilder};

use super::Built;
use super::tables::{Bookings, Podcasts};
use crate::{CreatePodcastRequest, PodcastListQuery, UpdatePodcastRequest};
use crate::service::{clean_text, optional_text};

/// Result of building a paginated podcast list query.
pub struct BuiltPodcastListQuery {
    pub count_query: Built,
    pub select_query: Built,
    pub page: u32,
    pub per_page: u32,
}

// ── Helpers ────────────────────────────────────────────────────────────────

/// Column order must match `podcast_from_row()`.
const COLUMNS: [Podcasts; 12] = [
    Podcasts::Id,
    Podcasts::Title,
    Podcasts::HostName,
    Podcasts::HostEmail,
    Podcasts::Description,
    Podcasts::Category,
    Podcasts::WebsiteUrl,
    Podcasts::RssUrl,
    Podcasts::AudienceSize,
    Podcasts::Language,
    Podcasts::CreatedAt,
    Podcasts::UpdatedAt,
];

fn podcast_select() -> sea_query::SelectStatement {
    Query::select()
        .columns(COLUMNS)
        .from(Podcasts::Table)
        .to_owned()
}

const LIKE_ESCAPE: char = '!';

/// Substring pattern for `LIKE`, with `%`, `_` and the escape char taken literally.
fn contains_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn list_conditions(q: &PodcastListQuery) -> Vec<SimpleExpr> {
    let mut conds = Vec::new();
    if let Some(search) = q.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = contains_pattern(search);
        let like = || LikeExpr::new(pattern.as_str()).escape(LIKE_ESCAPE);
        conds.push(
            Expr::col(Podcasts::Title)
                .like(like())
                .or(Expr::col(Podcasts::HostName).like(like()))
                .or(Expr::col(Podcasts::Description).like(like())),
        );
    }
    if let Some(category) = q.category.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        conds.push(
            Expr::expr(Func::lower(Expr::col(Podcasts::Category))).eq(category.to_lowercase()),
        );
    }
    conds
}

// ── Queries ────────────────────────────────────────────────────────────────

pub fn insert(id: &str, req: &CreatePodcastRequest) -> Built {
    Query::insert()
        .into_table(Podcasts::Table)
        .columns([
            Podcasts::Id,
            Podcasts::Title,
            Podcasts::HostName,
            Podcasts::HostEmail,
            Podcasts::Description,
            Podcasts::Category,
            Podcasts::WebsiteUrl,
            Podcasts::RssUrl,
            Podcasts::AudienceSize,
            Podcasts::Language,
        ])
        .values_panic([
            id.into(),
            req.title.trim().into(),
            clean_text(req.host_name.as_deref()).into(),
            clean_text(req.host_email.as_deref()).into(),
            clean_text(req.description.as_deref()).into(),
            clean_text(req.category.as_deref()).into(),
            clean_text(req.website_url.as_deref()).into(),
            clean_text(req.rss_url.as_deref()).into(),
            req.audience_size.into(),
            clean_text(req.language.as_deref()).into(),
        ])
        .build(SqliteQueryBuilder)
}

/// SELECT a single podcast by id.
pub fn get_by_id(id: &str) -> Built {
    podcast_select()
        .and_where(Expr::col(Podcasts::Id).eq(id))
        .build(SqliteQueryBuilder)
}

/// Every podcast, for discovery scoring.
pub fn list_all() -> Built {
    podcast_select()
        .order_by(Podcasts::CreatedAt, Order::Asc)
        .build(SqliteQueryBuilder)
}

/// Build paginated podcast list queries with search and category filters.
pub fn list(q: &PodcastListQuery) -> BuiltPodcastListQuery {
    let (page, per_page) = crate::clamp_page(q.page, q.per_page);
    let (limit, offset) = super::page_window(page, per_page);

    let mut count_q = Query::select()
        .expr(Func::count(Expr::col(Asterisk)))
        .from(Podcasts::Table)
        .to_owned();
    let mut select_q = podcast_select();

    for cond in list_conditions(q) {
        count_q.and_where(cond.clone());
        select_q.and_where(cond);
    }

    select_q
        .order_by(Podcasts::Title, Order::Asc)
        .limit(limit)
        .offset(offset);

    BuiltPodcastListQuery {
        count_query: count_q.build(SqliteQueryBuilder),
        select_query: select_q.build(SqliteQueryBuilder),
        page,
        per_page,
    }
}

/// Partial UPDATE. Returns `None` when the request changes nothing.
pub fn update(id: &str, req: &UpdatePodcastRequest) -> Option<Built> {
    let mut values: Vec<(Podcasts, SimpleExpr)> = Vec::new();
    if let Some(title) = &req.title {
        values.push((Podcasts::Title, title.trim().into()));
    }
    let optional = [
        (Podcasts::HostName, req.host_name.as_deref()),
        (Podcasts::HostEmail, req.host_email.as_deref()),
        (Podcasts::Description, req.description.as_deref()),
        (Podcasts::Category, req.category.as_deref()),
        (Podcasts::WebsiteUrl, req.website_url.as_deref()),
        (Podcasts::RssUrl, req.rss_url.as_deref()),
        (Podcasts::Language, req.language.as_deref()),
    ];
    for (column, value) in optional {
        if let Some(value) = optional_text(value) {
            values.push((column, value.into()));
        }
    }
    if let Some(size) = req.audience_size {
        values.push((Podcasts::AudienceSize, size.into()));
    }
    if values.is_empty() {
        return None;
    }
    values.push((Podcasts::UpdatedAt, Expr::cust("datetime('now')")));

    Some(
        Query::update()
            .table(Podcasts::Table)
            .values(values)
            .and_where(Expr::col(Podcasts::Id).eq(id))
            .build(SqliteQueryBuilder),
    )
}

/// Number of bookings that still reference a podcast.
pub fn count_bookings(id: &str) -> Built {
    Query::select()
        .expr(Func::count(Expr::col(Asterisk)))
        .from(Bookings::Table)
        .and_where(Expr::col(Bookings::PodcastId).eq(id))
        .build(SqliteQueryBuilder)
}

/// DELETE a podcast by id.
pub fn delete(id: &str) -> Built {
    Query::delete()
        .from_table(Podcasts::Table)
        .and_where(Expr::col(Podcasts::Id).eq(id))
        .build(SqliteQueryBuilder)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(search: Option<&str>, category: Option<&str>) -> PodcastListQuery {
        PodcastListQuery {
            page: 2,
            per_page: 10,
            search: search.map(String::from),
            category: category.map(String::from),
        }
    }

    #[test]
    fn list_applies_filters_to_both_queries() {
        let built = list(&query(Some("growth"), Some("Business")));
        let (count_sql, count_values) = &built.count_query;
        let (select_sql, _) = &built.select_query;
        assert!(count_sql.contains("LIKE"));
        assert!(select_sql.contains("LIKE"));
        assert!(select_sql.contains("LIMIT"));
        assert_eq!(count_values.0.len(), 4);
        assert_eq!((built.page, built.per_page), (2, 10));
    }

    #[test]
    fn search_wildcards_are_literal() {
        assert_eq!(contains_pattern("100%_legit"), "%100!%!_legit%");
        assert_eq!(contains_pattern("wow!"), "%wow!!%");

        let built = list(&query(Some("50%"), None));
        let (sql, values) = &built.select_query;
        assert!(sql.contains("ESCAPE"));
        assert_eq!(values.0[0], sea_query::Value::from("%50!%%"));
    }

    #[test]
    fn blank_search_is_ignored() {
        let built = list(&query(Some("  "), None));
        assert!(!built.count_query.0.contains("WHERE"));
    }

    #[test]
    fn empty_update_builds_nothing() {
        assert!(update("p1", &UpdatePodcastRequest::default()).is_none());
        let (sql, values) = update(
            "p1",
            &UpdatePodcastRequest {
                host_name: Some(String::new()),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(sql.contains("\"host_name\" = ?"));
        assert_eq!(values.0[0], sea_query::Value::String(None));
        assert!(sql.contains("datetime('now')"));
    }
}
