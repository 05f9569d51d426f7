//! Dashboard counters. Every builder takes an optional owner id that scopes
//! the count to one client's campaigns.

use sea_query::{Asterisk, Expr, Func, Query, SelectStatement, SimpleExpr, SqliteQueryBuilder};

use super::Built;
use super::tables::{Bookings, Campaigns, MatchSuggestions, Pitches, Podcasts, Users};
use crate::{CampaignStatus, MatchStatus, UserRole};

fn count_from<T: sea_query::IntoTableRef>(table: T) -> SelectStatement {
    Query::select()
        .expr(Func::count(Expr::col(Asterisk)))
        .from(table)
        .to_owned()
}

fn scope_campaigns(q: &mut SelectStatement, owner: Option<&str>) {
    if let Some(owner) = owner {
        q.and_where(Expr::col((Campaigns::Table, Campaigns::UserId)).eq(owner));
    }
}

/// SELECT COUNT(*) over `table` joined to its owning campaign.
fn count_via_campaign<T: sea_query::IntoTableRef>(
    table: T,
    join_on: SimpleExpr,
    owner: Option<&str>,
) -> SelectStatement {
    let mut q = count_from(table);
    q.inner_join(Campaigns::Table, join_on);
    scope_campaigns(&mut q, owner);
    q
}

fn pitch_campaign() -> SimpleExpr {
    Expr::col((Campaigns::Table, Campaigns::Id)).equals((Pitches::Table, Pitches::CampaignId))
}

pub fn count_clients() -> Built {
    count_from(Users::Table)
        .and_where(Expr::col(Users::Role).eq(UserRole::Client.as_str()))
        .build(SqliteQueryBuilder)
}

pub fn count_podcasts() -> Built {
    count_from(Podcasts::Table).build(SqliteQueryBuilder)
}

pub fn count_campaigns(owner: Option<&str>, status: Option<CampaignStatus>) -> Built {
    let mut q = count_from(Campaigns::Table);
    scope_campaigns(&mut q, owner);
    if let Some(status) = status {
        q.and_where(Expr::col((Campaigns::Table, Campaigns::Status)).eq(status.as_str()));
    }
    q.build(SqliteQueryBuilder)
}

pub fn count_pending_matches(owner: Option<&str>) -> Built {
    let join_on = Expr::col((Campaigns::Table, Campaigns::Id))
        .equals((MatchSuggestions::Table, MatchSuggestions::CampaignId));
    count_via_campaign(MatchSuggestions::Table, join_on, owner)
        .and_where(
            Expr::col((MatchSuggestions::Table, MatchSuggestions::Status))
                .eq(MatchStatus::Pending.as_str()),
        )
        .build(SqliteQueryBuilder)
}

/// Pitches that have ever been delivered (archived ones included).
pub fn count_pitches_sent(owner: Option<&str>) -> Built {
    count_via_campaign(Pitches::Table, pitch_campaign(), owner)
        .and_where(Expr::col((Pitches::Table, Pitches::SentAt)).is_not_null())
        .build(SqliteQueryBuilder)
}

pub fn count_replies(owner: Option<&str>) -> Built {
    count_via_campaign(Pitches::Table, pitch_campaign(), owner)
        .and_where(Expr::col((Pitches::Table, Pitches::RepliedAt)).is_not_null())
        .build(SqliteQueryBuilder)
}

/// `(status, count)` rows for bookings.
pub fn bookings_by_status(owner: Option<&str>) -> Built {
    let mut q = Query::select()
        .column(Bookings::Status)
        .expr(Func::count(Expr::col(Asterisk)))
        .from(Bookings::Table)
        .group_by_col(Bookings::Status)
        .to_owned();
    if let Some(owner) = owner {
        q.and_where(Expr::col(Bookings::UserId).eq(owner));
    }
    q.build(SqliteQueryBuilder)
}
