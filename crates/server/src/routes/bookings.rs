use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use rusqlite::Connection;
use uuid::Uuid;

use pgl_api::{
    db, service, BookingListQuery, BookingListResponse, BookingResponse, BookingStatus,
    CreateBookingRequest, OkResponse, UpdateBookingRequest,
};

use super::auth::AuthUser;
use crate::error::ApiErr;
use crate::storage::{booking_from_row, sq_count, sq_execute, sq_query_map, sq_query_opt, sq_query_row, Db};

fn load_booking(conn: &Connection, user: &AuthUser, id: &str) -> Result<BookingResponse, ApiErr> {
    sq_query_opt(conn, db::bookings::get_by_id(id), booking_from_row)
        .map_err(ApiErr::from_db("load booking"))?
        .filter(|b| user.can_view(&b.user_id))
        .ok_or_else(|| ApiErr::not_found("booking not found"))
}

fn row_exists(conn: &Connection, built: db::Built, context: &'static str) -> Result<bool, ApiErr> {
    sq_query_opt(conn, built, |_| Ok(()))
        .map(|found| found.is_some())
        .map_err(ApiErr::from_db(context))
}

/// GET /api/bookings — status and campaign filters; clients see their own.
pub async fn list_bookings(
    State(db): State<Db>,
    user: AuthUser,
    Query(q): Query<BookingListQuery>,
) -> Result<Json<BookingListResponse>, ApiErr> {
    let built = db::bookings::list(&q, user.owner_scope());
    let conn = db.conn();
    let total = sq_count(&conn, built.count_query).map_err(ApiErr::from_db("count bookings"))?;
    let bookings = sq_query_map(&conn, built.select_query, booking_from_row)
        .map_err(ApiErr::from_db("list bookings"))?;

    Ok(Json(BookingListResponse {
        bookings,
        total,
        page: built.page,
        per_page: built.per_page,
    }))
}

/// POST /api/bookings — record a placement directly (staff).
///
/// The booked client is `user_id`, or the owner of `campaign_id`.
pub async fn create_booking(
    State(db): State<Db>,
    user: AuthUser,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), ApiErr> {
    user.require_staff()?;
    service::validate_create_booking(&req)?;

    let conn = db.conn();
    let campaign_owner: Option<String> = match req.campaign_id.as_deref() {
        Some(campaign_id) => Some(
            sq_query_opt(&conn, db::campaigns::get_by_id(campaign_id), |row| row.get(1))
                .map_err(ApiErr::from_db("load campaign"))?
                .ok_or_else(|| ApiErr::bad_request("campaign_id does not exist"))?,
        ),
        None => None,
    };

    let owner = match (req.user_id.as_deref(), campaign_owner.as_deref()) {
        (Some(user_id), Some(owner)) if user_id != owner => {
            return Err(ApiErr::bad_request("user_id does not own campaign_id"));
        }
        (Some(user_id), _) => {
            if !row_exists(&conn, db::users::get_by_id(user_id), "load user")? {
                return Err(ApiErr::bad_request("user_id does not exist"));
            }
            user_id.to_string()
        }
        (None, Some(owner)) => owner.to_string(),
        (None, None) => return Err(ApiErr::bad_request("user_id or campaign_id is required")),
    };

    let podcast_id = req.podcast_id.trim();
    if !row_exists(&conn, db::podcasts::get_by_id(podcast_id), "load podcast")? {
        return Err(ApiErr::bad_request("podcast_id does not exist"));
    }

    let id = Uuid::new_v4().to_string();
    let notes = service::clean_text(req.notes.as_deref());
    let scheduled_at = service::clean_text(req.scheduled_at.as_deref());
    sq_execute(
        &conn,
        db::bookings::insert(&db::bookings::InsertParams {
            id: &id,
            user_id: &owner,
            podcast_id,
            campaign_id: req.campaign_id.as_deref(),
            pitch_id: None,
            status: req.status.unwrap_or(BookingStatus::Pending),
            scheduled_at: scheduled_at.as_deref(),
            notes: notes.as_deref(),
        }),
    )
    .map_err(ApiErr::from_db("insert booking"))?;

    let booking = sq_query_row(&conn, db::bookings::get_by_id(&id), booking_from_row)
        .map_err(ApiErr::from_db("reload booking"))?;
    tracing::info!(booking_id = %id, user_id = %owner, "booking created");
    Ok((StatusCode::CREATED, Json(booking)))
}

/// GET /api/bookings/{id}
pub async fn get_booking(
    State(db): State<Db>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<BookingResponse>, ApiErr> {
    let conn = db.conn();
    Ok(Json(load_booking(&conn, &user, &id)?))
}

/// PATCH /api/bookings/{id} — schedule, confirm, complete or cancel (staff).
pub async fn update_booking(
    State(db): State<Db>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateBookingRequest>,
) -> Result<Json<BookingResponse>, ApiErr> {
    user.require_staff()?;
    service::validate_update_booking(&req)?;

    let conn = db.conn();
    load_booking(&conn, &user, &id)?;
    if let Some(built) = db::bookings::update(&id, &req) {
        sq_execute(&conn, built).map_err(ApiErr::from_db("update booking"))?;
    }
    Ok(Json(load_booking(&conn, &user, &id)?))
}

/// DELETE /api/bookings/{id} (staff)
pub async fn delete_booking(
    State(db): State<Db>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<OkResponse>, ApiErr> {
    user.require_staff()?;

    let conn = db.conn();
    load_booking(&conn, &user, &id)?;
    sq_execute(&conn, db::bookings::delete(&id)).map_err(ApiErr::from_db("delete booking"))?;
    tracing::info!(booking_id = %id, "booking deleted");
    Ok(Json(OkResponse { ok: true }))
}
