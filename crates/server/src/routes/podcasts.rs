use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use pgl_api::{
    db, service, CreatePodcastRequest, OkResponse, PodcastListQuery, PodcastListResponse,
    PodcastResponse, UpdatePodcastRequest,
};

use super::auth::AuthUser;
use crate::error::ApiErr;
use crate::storage::{podcast_from_row, sq_count, sq_execute, sq_query_map, sq_query_opt, Db};

fn load_podcast(conn: &rusqlite::Connection, id: &str) -> Result<PodcastResponse, ApiErr> {
    sq_query_opt(conn, db::podcasts::get_by_id(id), podcast_from_row)
        .map_err(ApiErr::from_db("load podcast"))?
        .ok_or_else(|| ApiErr::not_found("podcast not found"))
}

/// GET /api/podcasts — search (title, host, description) and category filter.
pub async fn list_podcasts(
    State(db): State<Db>,
    _user: AuthUser,
    Query(q): Query<PodcastListQuery>,
) -> Result<Json<PodcastListResponse>, ApiErr> {
    let built = db::podcasts::list(&q);
    let conn = db.conn();
    let total = sq_count(&conn, built.count_query).map_err(ApiErr::from_db("count podcasts"))?;
    let podcasts = sq_query_map(&conn, built.select_query, podcast_from_row)
        .map_err(ApiErr::from_db("list podcasts"))?;

    Ok(Json(PodcastListResponse {
        podcasts,
        total,
        page: built.page,
        per_page: built.per_page,
    }))
}

/// POST /api/podcasts — add a show to the catalogue (staff).
pub async fn create_podcast(
    State(db): State<Db>,
    user: AuthUser,
    Json(req): Json<CreatePodcastRequest>,
) -> Result<(StatusCode, Json<PodcastResponse>), ApiErr> {
    user.require_staff()?;
    service::validate_create_podcast(&req)?;

    let id = Uuid::new_v4().to_string();
    let conn = db.conn();
    sq_execute(&conn, db::podcasts::insert(&id, &req))
        .map_err(ApiErr::from_db("insert podcast"))?;
    let podcast = load_podcast(&conn, &id)?;
    tracing::info!(podcast_id = %id, title = %podcast.title, "podcast created");
    Ok((StatusCode::CREATED, Json(podcast)))
}

/// GET /api/podcasts/{id}
pub async fn get_podcast(
    State(db): State<Db>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<PodcastResponse>, ApiErr> {
    let conn = db.conn();
    Ok(Json(load_podcast(&conn, &id)?))
}

/// PUT /api/podcasts/{id} — partial update (staff).
pub async fn update_podcast(
    State(db): State<Db>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdatePodcastRequest>,
) -> Result<Json<PodcastResponse>, ApiErr> {
    user.require_staff()?;
    service::validate_update_podcast(&req)?;

    let conn = db.conn();
    load_podcast(&conn, &id)?;
    if let Some(built) = db::podcasts::update(&id, &req) {
        sq_execute(&conn, built).map_err(ApiErr::from_db("update podcast"))?;
    }
    Ok(Json(load_podcast(&conn, &id)?))
}

/// DELETE /api/podcasts/{id} — refused while bookings reference the show (staff).
pub async fn delete_podcast(
    State(db): State<Db>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<OkResponse>, ApiErr> {
    user.require_staff()?;

    let conn = db.conn();
    load_podcast(&conn, &id)?;
    let bookings = sq_count(&conn, db::podcasts::count_bookings(&id))
        .map_err(ApiErr::from_db("count bookings"))?;
    if bookings > 0 {
        return Err(ApiErr::conflict(format!(
            "podcast has {bookings} booking(s); delete or reassign them first"
        )));
    }
    sq_execute(&conn, db::podcasts::delete(&id)).map_err(ApiErr::from_db("delete podcast"))?;
    tracing::info!(podcast_id = %id, "podcast deleted");
    Ok(Json(OkResponse { ok: true }))
}
