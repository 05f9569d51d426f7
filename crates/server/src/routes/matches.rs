use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::collections::HashSet;
use uuid::Uuid;

use pgl_api::{
    db, DiscoverQuery, DiscoverResponse, MatchListQuery, MatchListResponse, MatchStatus,
    MatchSuggestionResponse, ReviewMatchRequest,
};
use pgl_core::matching::{CampaignProfile, MatchScoreRegistry, PodcastProfile};

use super::auth::AuthUser;
use super::campaigns::load_campaign;
use crate::error::ApiErr;
use crate::storage::{match_from_row, podcast_from_row, sq_execute, sq_query_map, sq_query_opt, Db};
use crate::AppConfig;

/// POST /api/campaigns/{id}/discover — score every podcast against the
/// campaign keywords and create pending suggestions at or above the threshold.
///
/// Pairs that were suggested before (in any status) are skipped, so running
/// discovery twice never duplicates or resurrects a suggestion.
pub async fn discover(
    State(db): State<Db>,
    State(config): State<AppConfig>,
    user: AuthUser,
    Path(campaign_id): Path<String>,
    Query(q): Query<DiscoverQuery>,
) -> Result<Json<DiscoverResponse>, ApiErr> {
    user.require_staff()?;

    let registry = MatchScoreRegistry::default();
    let plugin = match q.plugin.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        Some(requested) if registry.contains(requested) => requested.to_string(),
        Some(requested) => {
            return Err(ApiErr::bad_request(format!(
                "unknown match plugin '{requested}'. available: {}",
                registry.available_plugins().join(", ")
            )));
        }
        None => config.match_plugin.clone(),
    };
    let threshold = q.threshold.unwrap_or(config.match_threshold).clamp(0, 100);

    let conn = db.conn();
    let campaign = load_campaign(&conn, &user, &campaign_id)?;
    let profile = CampaignProfile {
        keywords: campaign.keywords.clone(),
    };

    let already: HashSet<String> = sq_query_map(
        &conn,
        db::matches::suggested_podcast_ids(&campaign_id),
        |row| row.get(0),
    )
    .map_err(ApiErr::from_db("load suggested podcasts"))?
    .into_iter()
    .collect();
    let podcasts = sq_query_map(&conn, db::podcasts::list_all(), podcast_from_row)
        .map_err(ApiErr::from_db("load podcasts"))?;

    let mut created = Vec::new();
    for podcast in &podcasts {
        if already.contains(&podcast.id) {
            continue;
        }
        let scored = registry
            .score_with(
                &plugin,
                &profile,
                &PodcastProfile {
                    title: podcast.title.clone(),
                    description: podcast.description.clone(),
                    category: podcast.category.clone(),
                },
            )
            .map_err(|e| ApiErr::bad_request(e.to_string()))?;
        if scored.score < threshold {
            continue;
        }

        let id = Uuid::new_v4().to_string();
        let inserted = sq_execute(
            &conn,
            db::matches::insert_if_absent(
                &id,
                &campaign_id,
                &podcast.id,
                scored.score,
                &scored.matched_keywords,
            ),
        )
        .map_err(ApiErr::from_db("insert match"))?;
        if inserted == 0 {
            continue;
        }
        if let Some(suggestion) = sq_query_opt(&conn, db::matches::get_by_id(&id), match_from_row)
            .map_err(ApiErr::from_db("reload match"))?
        {
            created.push(suggestion);
        }
    }

    tracing::info!(
        campaign_id = %campaign_id,
        plugin = %plugin,
        scanned = podcasts.len(),
        created = created.len(),
        "match discovery finished"
    );

    Ok(Json(DiscoverResponse {
        campaign_id,
        plugin,
        threshold,
        scanned: podcasts.len() as i64,
        created,
    }))
}

/// GET /api/campaigns/{id}/matches — best score first.
pub async fn list_matches(
    State(db): State<Db>,
    user: AuthUser,
    Path(campaign_id): Path<String>,
    Query(q): Query<MatchListQuery>,
) -> Result<Json<MatchListResponse>, ApiErr> {
    let conn = db.conn();
    load_campaign(&conn, &user, &campaign_id)?;
    let matches = sq_query_map(
        &conn,
        db::matches::list_for_campaign(&campaign_id, q.status),
        match_from_row,
    )
    .map_err(ApiErr::from_db("list matches"))?;
    Ok(Json(MatchListResponse { matches }))
}

/// PATCH /api/matches/{id} — approve or reject a pending suggestion.
pub async fn review_match(
    State(db): State<Db>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<ReviewMatchRequest>,
) -> Result<Json<MatchSuggestionResponse>, ApiErr> {
    if req.status == MatchStatus::Pending {
        return Err(ApiErr::bad_request("status must be approved or rejected"));
    }

    let conn = db.conn();
    let suggestion = sq_query_opt(&conn, db::matches::get_by_id(&id), match_from_row)
        .map_err(ApiErr::from_db("load match"))?
        .ok_or_else(|| ApiErr::not_found("match not found"))?;
    // Visibility follows the campaign.
    load_campaign(&conn, &user, &suggestion.campaign_id)
        .map_err(|_| ApiErr::not_found("match not found"))?;

    let changed = sq_execute(&conn, db::matches::review(&id, req.status, &user.user_id))
        .map_err(ApiErr::from_db("review match"))?;
    if changed == 0 {
        return Err(ApiErr::conflict(format!("match already {}", suggestion.status)));
    }

    let updated = sq_query_opt(&conn, db::matches::get_by_id(&id), match_from_row)
        .map_err(ApiErr::from_db("reload match"))?
        .ok_or_else(|| ApiErr::not_found("match not found"))?;
    tracing::info!(match_id = %id, status = %updated.status, "match reviewed");
    Ok(Json(updated))
}
