use axum::{
    extract::{Path, State},
    Json,
};
use rusqlite::Connection;
use uuid::Uuid;

use pgl_api::{db, service, MediaKitResponse, PublicMediaKitResponse, UpsertMediaKitRequest};
use pgl_core::slug;

use super::auth::AuthUser;
use super::campaigns::load_campaign;
use crate::error::ApiErr;
use crate::storage::{media_kit_from_row, sq_execute, sq_query_opt, sq_query_row, Db};

const MAX_SLUG_ATTEMPTS: u32 = 100;

fn slug_taken(conn: &Connection, candidate: &str, campaign_id: &str) -> Result<bool, ApiErr> {
    sq_query_row(conn, db::media_kits::slug_taken(candidate, campaign_id), |row| {
        row.get(0)
    })
    .map_err(ApiErr::from_db("slug check"))
}

/// First free `base`, `base-2`, `base-3`, ...
fn free_slug(conn: &Connection, base: &str, campaign_id: &str) -> Result<String, ApiErr> {
    for attempt in 1..=MAX_SLUG_ATTEMPTS {
        let candidate = slug::candidate(base, attempt);
        if !slug_taken(conn, &candidate, campaign_id)? {
            return Ok(candidate);
        }
    }
    Err(ApiErr::conflict("could not find a free media kit slug"))
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// An incoming optional text field layered over the stored value.
fn merge_text(incoming: Option<&str>, current: Option<String>) -> Option<String> {
    match service::optional_text(incoming) {
        Some(value) => value,
        None => current,
    }
}

/// GET /api/campaigns/{id}/media-kit
pub async fn get_media_kit(
    State(db): State<Db>,
    user: AuthUser,
    Path(campaign_id): Path<String>,
) -> Result<Json<MediaKitResponse>, ApiErr> {
    let conn = db.conn();
    load_campaign(&conn, &user, &campaign_id)?;
    sq_query_opt(
        &conn,
        db::media_kits::get_by_campaign(&campaign_id),
        media_kit_from_row,
    )
    .map_err(ApiErr::from_db("load media kit"))?
    .map(Json)
    .ok_or_else(|| ApiErr::not_found("media kit not found"))
}

/// PUT /api/campaigns/{id}/media-kit — create or update the campaign's kit.
///
/// Without an explicit slug the existing one is kept, or one is derived from
/// the campaign name with `-2`, `-3`, ... appended on collision.
pub async fn upsert_media_kit(
    State(db): State<Db>,
    user: AuthUser,
    Path(campaign_id): Path<String>,
    Json(req): Json<UpsertMediaKitRequest>,
) -> Result<Json<MediaKitResponse>, ApiErr> {
    service::validate_media_kit(&req)?;

    let conn = db.conn();
    let campaign = load_campaign(&conn, &user, &campaign_id)?;
    let existing = sq_query_opt(
        &conn,
        db::media_kits::get_by_campaign(&campaign_id),
        media_kit_from_row,
    )
    .map_err(ApiErr::from_db("load media kit"))?;

    let requested = req.slug.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let kit_slug = match (requested, &existing) {
        (Some(requested), _) => {
            if slug_taken(&conn, requested, &campaign_id)? {
                return Err(ApiErr::conflict("slug already in use"));
            }
            requested.to_string()
        }
        (None, Some(kit)) => kit.slug.clone(),
        (None, None) => free_slug(&conn, &slug::slugify(&campaign.name), &campaign_id)?,
    };

    let (id, headline, bio, talking_points, achievements, headshot_url, is_public) = match existing
    {
        Some(kit) => (
            kit.id,
            kit.headline,
            kit.bio,
            kit.talking_points,
            kit.achievements,
            kit.headshot_url,
            kit.is_public,
        ),
        None => (
            Uuid::new_v4().to_string(),
            None,
            campaign.bio.clone(),
            Vec::new(),
            Vec::new(),
            None,
            false,
        ),
    };

    let headline = merge_text(req.headline.as_deref(), headline);
    let bio = merge_text(req.bio.as_deref(), bio);
    let headshot_url = merge_text(req.headshot_url.as_deref(), headshot_url);
    let talking_points = req.talking_points.map(clean_list).unwrap_or(talking_points);
    let achievements = req.achievements.map(clean_list).unwrap_or(achievements);
    let is_public = req.is_public.unwrap_or(is_public);

    sq_execute(
        &conn,
        db::media_kits::upsert(&db::media_kits::UpsertParams {
            id: &id,
            campaign_id: &campaign_id,
            slug: &kit_slug,
            headline: headline.as_deref(),
            bio: bio.as_deref(),
            talking_points: &talking_points,
            achievements: &achievements,
            headshot_url: headshot_url.as_deref(),
            is_public,
        }),
    )
    .map_err(ApiErr::from_db("upsert media kit"))?;

    let kit = sq_query_row(
        &conn,
        db::media_kits::get_by_campaign(&campaign_id),
        media_kit_from_row,
    )
    .map_err(ApiErr::from_db("reload media kit"))?;
    Ok(Json(kit))
}

/// GET /api/public/media-kits/{slug} — unauthenticated; only published kits.
pub async fn get_public_media_kit(
    State(db): State<Db>,
    Path(kit_slug): Path<String>,
) -> Result<Json<PublicMediaKitResponse>, ApiErr> {
    let conn = db.conn();
    sq_query_opt(&conn, db::media_kits::get_public_by_slug(&kit_slug), |row| {
        let talking_points: Option<String> = row.get(4)?;
        let achievements: Option<String> = row.get(5)?;
        let links: Option<String> = row.get(7)?;
        Ok(PublicMediaKitResponse {
            slug: row.get(0)?,
            client_name: row.get(1)?,
            headline: row.get(2)?,
            bio: row.get(3)?,
            talking_points: db::decode_list(talking_points.as_deref()),
            achievements: db::decode_list(achievements.as_deref()),
            headshot_url: row.get(6)?,
            links: db::decode_list(links.as_deref()),
        })
    })
    .map_err(ApiErr::from_db("load public media kit"))?
    .map(Json)
    .ok_or_else(|| ApiErr::not_found("media kit not found"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_keeps_clears_or_replaces() {
        let current = Some("old".to_string());
        assert_eq!(merge_text(None, current.clone()), current);
        assert_eq!(merge_text(Some(""), current.clone()), None);
        assert_eq!(merge_text(Some(" new "), current), Some("new".into()));
    }

    #[test]
    fn lists_drop_blank_entries() {
        assert_eq!(
            clean_list(vec![" a ".into(), "".into(), "b".into()]),
            vec!["a", "b"]
        );
    }
}
