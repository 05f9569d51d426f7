use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use rusqlite::Connection;
use uuid::Uuid;

use pgl_api::{
    db, service, BookingResponse, BookingStatus, CreatePitchRequest, ListPitchTemplatesResponse,
    MatchStatus, OkResponse, PitchListQuery, PitchListResponse, PitchResponse,
    PitchStatus, PitchStatusRequest, PitchStatusResponse, PitchTemplateResponse,
    SendPitchResponse, UpdatePitchRequest,
};
use pgl_core::generate::PitchInput;
use pgl_core::templates::{self, RenderedPitch, TemplateVars};

use super::auth::AuthUser;
use super::campaigns::load_campaign;
use crate::error::ApiErr;
use crate::generation::Generator;
use crate::mailer::{Mailer, OutboundEmail};
use crate::storage::{
    booking_from_row, is_constraint_violation, match_from_row, pitch_from_row, podcast_from_row,
    sq_count, sq_execute, sq_query_map, sq_query_opt, Db, PitchRow,
};

const REPLY_SNIPPET_LEN: usize = 500;

/// Load a pitch the caller may see (clients: pitches of their own campaigns).
pub(crate) fn load_pitch(conn: &Connection, user: &AuthUser, id: &str) -> Result<PitchRow, ApiErr> {
    sq_query_opt(conn, db::pitches::get_by_id(id), pitch_from_row)
        .map_err(ApiErr::from_db("load pitch"))?
        .filter(|row| user.can_view(&row.owner_id))
        .ok_or_else(|| ApiErr::not_found("pitch not found"))
}

fn reload_pitch(conn: &Connection, id: &str) -> Result<PitchResponse, ApiErr> {
    sq_query_opt(conn, db::pitches::get_by_id(id), pitch_from_row)
        .map_err(ApiErr::from_db("reload pitch"))?
        .map(|row| row.pitch)
        .ok_or_else(|| ApiErr::not_found("pitch not found"))
}

/// Trim an inbound reply down to something displayable.
pub(crate) fn reply_snippet(body: &str) -> Option<String> {
    let text = body.trim();
    if text.is_empty() {
        return None;
    }
    Some(text.chars().take(REPLY_SNIPPET_LEN).collect())
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

/// GET /api/pitch-templates — the canned pitch templates.
pub async fn list_templates(_user: AuthUser) -> Json<ListPitchTemplatesResponse> {
    Json(ListPitchTemplatesResponse {
        templates: templates::TEMPLATES
            .iter()
            .map(|t| PitchTemplateResponse {
                id: t.id.to_string(),
                name: t.name.to_string(),
                subject: t.subject.to_string(),
                body: t.body.to_string(),
                requires: t.requires.iter().map(|r| r.to_string()).collect(),
            })
            .collect(),
    })
}

// ---------------------------------------------------------------------------
// List / create
// ---------------------------------------------------------------------------

/// GET /api/pitches — campaign and status filters; clients see their own.
pub async fn list_pitches(
    State(db): State<Db>,
    user: AuthUser,
    Query(q): Query<PitchListQuery>,
) -> Result<Json<PitchListResponse>, ApiErr> {
    let built = db::pitches::list(&q, user.owner_scope());
    let conn = db.conn();
    let total = sq_count(&conn, built.count_query).map_err(ApiErr::from_db("count pitches"))?;
    let pitches = sq_query_map(&conn, built.select_query, pitch_from_row)
        .map_err(ApiErr::from_db("list pitches"))?
        .into_iter()
        .map(|row| row.pitch)
        .collect();

    Ok(Json(PitchListResponse {
        pitches,
        total,
        page: built.page,
        per_page: built.per_page,
    }))
}

/// How the body of a new pitch is produced.
enum PitchSource {
    Manual(RenderedPitch),
    Template(&'static str, RenderedPitch),
    Generate(PitchInput),
}

/// POST /api/pitches — draft a pitch (staff).
///
/// The target is an approved match or an explicit campaign + podcast pair.
/// Content comes from explicit subject/body, a named template, or the
/// generator, in that order.
pub async fn create_pitch(
    State(db): State<Db>,
    State(generator): State<Generator>,
    user: AuthUser,
    Json(req): Json<CreatePitchRequest>,
) -> Result<(StatusCode, Json<PitchResponse>), ApiErr> {
    user.require_staff()?;

    let manual = req.subject.is_some() || req.body.is_some();
    if manual {
        service::validate_pitch_text(
            req.subject.as_deref().unwrap_or_default(),
            req.body.as_deref().unwrap_or_default(),
        )?;
    }

    let (campaign_id, podcast_id, match_id, source) = {
        let conn = db.conn();

        let (campaign_id, podcast_id, match_id) = match req.match_id.as_deref() {
            Some(match_id) => {
                let suggestion = sq_query_opt(&conn, db::matches::get_by_id(match_id), match_from_row)
                    .map_err(ApiErr::from_db("load match"))?
                    .ok_or_else(|| ApiErr::not_found("match not found"))?;
                if suggestion.status != MatchStatus::Approved {
                    return Err(ApiErr::conflict("match must be approved before pitching"));
                }
                let mismatch = req
                    .campaign_id
                    .as_deref()
                    .is_some_and(|c| c != suggestion.campaign_id)
                    || req
                        .podcast_id
                        .as_deref()
                        .is_some_and(|p| p != suggestion.podcast_id);
                if mismatch {
                    return Err(ApiErr::bad_request(
                        "campaign_id and podcast_id must agree with the match",
                    ));
                }
                (
                    suggestion.campaign_id,
                    suggestion.podcast_id,
                    Some(suggestion.id),
                )
            }
            None => match (req.campaign_id.as_deref(), req.podcast_id.as_deref()) {
                (Some(c), Some(p)) => (c.to_string(), p.to_string(), None),
                _ => {
                    return Err(ApiErr::bad_request(
                        "match_id, or campaign_id and podcast_id, are required",
                    ));
                }
            },
        };

        let campaign = load_campaign(&conn, &user, &campaign_id)?;
        let podcast = sq_query_opt(&conn, db::podcasts::get_by_id(&podcast_id), podcast_from_row)
            .map_err(ApiErr::from_db("load podcast"))?
            .ok_or_else(|| ApiErr::not_found("podcast not found"))?;

        let angle = req
            .angle
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(String::from)
            .or_else(|| campaign.angles.first().map(|a| a.title.clone()));

        let source = if manual {
            PitchSource::Manual(RenderedPitch {
                subject: req.subject.as_deref().unwrap_or_default().trim().to_string(),
                body: req.body.as_deref().unwrap_or_default().trim().to_string(),
            })
        } else if let Some(template_id) = req.template_id.as_deref() {
            let template = templates::find_template(template_id)
                .ok_or_else(|| ApiErr::bad_request(format!("unknown template '{template_id}'")))?;
            let vars = TemplateVars {
                client_name: Some(campaign.client_name.clone()),
                podcast_title: Some(podcast.title.clone()),
                host_name: podcast.host_name.clone(),
                angle,
                bio: campaign.bio.clone(),
                sender_name: Some(user.full_name.clone()),
            };
            let missing = vars.missing(template);
            if !missing.is_empty() {
                return Err(ApiErr::bad_request(format!(
                    "template '{template_id}' needs: {}",
                    missing.join(", ")
                )));
            }
            PitchSource::Template(template.id, templates::render_template(template, &vars))
        } else {
            PitchSource::Generate(PitchInput {
                client_name: campaign.client_name.clone(),
                podcast_title: podcast.title.clone(),
                host_name: podcast.host_name.clone(),
                bio: campaign.bio.clone(),
                angle,
                sender_name: Some(user.full_name.clone()),
            })
        };
        (campaign_id, podcast_id, match_id, source)
    };

    let (template_id, content) = match source {
        PitchSource::Manual(content) => (None, content),
        PitchSource::Template(id, content) => (Some(id), content),
        PitchSource::Generate(input) => (None, generator.pitch(&input).await.value),
    };

    let id = Uuid::new_v4().to_string();
    let conn = db.conn();
    sq_execute(
        &conn,
        db::pitches::insert(&db::pitches::InsertParams {
            id: &id,
            campaign_id: &campaign_id,
            podcast_id: &podcast_id,
            match_id: match_id.as_deref(),
            template_id,
            subject: &content.subject,
            body: &content.body,
            created_by: &user.user_id,
        }),
    )
    .map_err(ApiErr::from_db("insert pitch"))?;

    tracing::info!(pitch_id = %id, campaign_id = %campaign_id, "pitch drafted");
    Ok((StatusCode::CREATED, Json(reload_pitch(&conn, &id)?)))
}

// ---------------------------------------------------------------------------
// Single pitch
// ---------------------------------------------------------------------------

/// GET /api/pitches/{id}
pub async fn get_pitch(
    State(db): State<Db>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<PitchResponse>, ApiErr> {
    let conn = db.conn();
    Ok(Json(load_pitch(&conn, &user, &id)?.pitch))
}

/// PATCH /api/pitches/{id} — edit subject/body while draft or ready (staff).
pub async fn update_pitch(
    State(db): State<Db>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdatePitchRequest>,
) -> Result<Json<PitchResponse>, ApiErr> {
    user.require_staff()?;

    let conn = db.conn();
    let current = load_pitch(&conn, &user, &id)?.pitch;
    if !current.status.is_editable() {
        return Err(ApiErr::conflict(format!(
            "pitch is {} and can no longer be edited",
            current.status
        )));
    }
    service::validate_pitch_text(
        req.subject.as_deref().unwrap_or(&current.subject),
        req.body.as_deref().unwrap_or(&current.body),
    )?;

    let subject = req.subject.as_deref().map(str::trim);
    let body = req.body.as_deref().map(str::trim);
    if let Some(built) = db::pitches::update_text(&id, subject, body) {
        let changed = sq_execute(&conn, built).map_err(ApiErr::from_db("update pitch"))?;
        if changed == 0 {
            return Err(ApiErr::conflict("pitch is being sent and can no longer be edited"));
        }
    }
    Ok(Json(reload_pitch(&conn, &id)?))
}

/// DELETE /api/pitches/{id} (staff). A booking made from the pitch is kept.
pub async fn delete_pitch(
    State(db): State<Db>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<OkResponse>, ApiErr> {
    user.require_staff()?;

    let conn = db.conn();
    load_pitch(&conn, &user, &id)?;
    sq_execute(&conn, db::pitches::delete(&id)).map_err(ApiErr::from_db("delete pitch"))?;
    tracing::info!(pitch_id = %id, "pitch deleted");
    Ok(Json(OkResponse { ok: true }))
}

// ---------------------------------------------------------------------------
// Send
// ---------------------------------------------------------------------------

/// POST /api/pitches/{id}/send — deliver through the mailer (staff).
///
/// The pitch is claimed before the mailer runs so a concurrent send of the
/// same pitch gets 409 instead of a second email. It only becomes `sent`
/// after the mailer accepted it; a failed delivery releases the claim and
/// leaves the pitch untouched.
pub async fn send_pitch(
    State(db): State<Db>,
    State(mailer): State<Mailer>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<SendPitchResponse>, ApiErr> {
    user.require_staff()?;

    let (from_status, email) = {
        let conn = db.conn();
        let pitch = load_pitch(&conn, &user, &id)?.pitch;
        pitch.status.transition(PitchStatus::Sent)?;

        let host_email = sq_query_opt(&conn, db::podcasts::get_by_id(&pitch.podcast_id), podcast_from_row)
            .map_err(ApiErr::from_db("load podcast"))?
            .and_then(|p| p.host_email)
            .ok_or_else(|| ApiErr::bad_request("podcast has no host email"))?;

        let claimed = sq_execute(&conn, db::pitches::claim_send(&id, pitch.status))
            .map_err(ApiErr::from_db("claim pitch"))?;
        if claimed == 0 {
            return Err(ApiErr::conflict("pitch is already being sent"));
        }

        let email = OutboundEmail {
            to: host_email,
            from: mailer.from_address().to_string(),
            subject: pitch.subject,
            text: pitch.body,
            message_id: mailer.new_message_id(),
        };
        (pitch.status, email)
    };

    let delivery = match mailer.send(email).await {
        Ok(delivery) => delivery,
        Err(e) => {
            tracing::error!(pitch_id = %id, "pitch delivery failed: {e:#}");
            let conn = db.conn();
            if let Err(e) = sq_execute(&conn, db::pitches::release_send(&id)) {
                tracing::error!(pitch_id = %id, "releasing send claim failed: {e}");
            }
            return Err(ApiErr::internal("failed to send pitch"));
        }
    };

    let conn = db.conn();
    let changed = sq_execute(
        &conn,
        db::pitches::mark_sent(&id, from_status, &delivery.message_id),
    )
    .map_err(ApiErr::from_db("mark pitch sent"))?;
    if changed == 0 {
        tracing::warn!(pitch_id = %id, "pitch changed while it was being sent");
        return Err(ApiErr::conflict("pitch changed while it was being sent"));
    }

    tracing::info!(pitch_id = %id, via = delivery.via, "pitch sent");
    Ok(Json(SendPitchResponse {
        pitch: reload_pitch(&conn, &id)?,
        delivered_via: delivery.via.to_string(),
    }))
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Booking for an accepted pitch. Returns the existing one if already made.
fn ensure_booking(conn: &Connection, row: &PitchRow) -> Result<BookingResponse, ApiErr> {
    let existing = sq_query_opt(conn, db::bookings::get_by_pitch(&row.pitch.id), booking_from_row)
        .map_err(ApiErr::from_db("load booking"))?;
    if let Some(booking) = existing {
        return Ok(booking);
    }

    let booking_id = Uuid::new_v4().to_string();
    let inserted = sq_execute(
        conn,
        db::bookings::insert(&db::bookings::InsertParams {
            id: &booking_id,
            user_id: &row.owner_id,
            podcast_id: &row.pitch.podcast_id,
            campaign_id: Some(&row.pitch.campaign_id),
            pitch_id: Some(&row.pitch.id),
            status: BookingStatus::Pending,
            scheduled_at: None,
            notes: None,
        }),
    );
    match inserted {
        Ok(_) => {}
        Err(e) if is_constraint_violation(&e) => {}
        Err(e) => return Err(ApiErr::from_db("insert booking")(e)),
    }

    sq_query_opt(conn, db::bookings::get_by_pitch(&row.pitch.id), booking_from_row)
        .map_err(ApiErr::from_db("reload booking"))?
        .ok_or_else(|| ApiErr::internal("booking missing after insert"))
}

/// POST /api/pitches/{id}/status — move a pitch through its lifecycle (staff).
///
/// `accepted` also creates the placement booking (once).
pub async fn update_pitch_status(
    State(db): State<Db>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<PitchStatusRequest>,
) -> Result<Json<PitchStatusResponse>, ApiErr> {
    user.require_staff()?;
    if req.status == PitchStatus::Sent {
        return Err(ApiErr::bad_request(
            "use POST /api/pitches/{id}/send to deliver a pitch",
        ));
    }

    let mut conn = db.conn();
    let row = load_pitch(&conn, &user, &id)?;
    let from = row.pitch.status;
    let to = from.transition(req.status)?;

    let tx = conn.transaction().map_err(ApiErr::from_db("begin transaction"))?;
    let built = if to == PitchStatus::Replied {
        db::pitches::mark_replied(&id, from, None)
    } else {
        db::pitches::set_status(&id, from, to)
    };
    let changed = sq_execute(&tx, built).map_err(ApiErr::from_db("update pitch status"))?;
    if changed == 0 {
        return Err(ApiErr::conflict("pitch status changed concurrently"));
    }
    let booking = if to == PitchStatus::Accepted {
        Some(ensure_booking(&tx, &row)?)
    } else {
        None
    };
    tx.commit().map_err(ApiErr::from_db("commit pitch status"))?;

    tracing::info!(pitch_id = %id, from = %from, to = %to, "pitch status changed");
    Ok(Json(PitchStatusResponse {
        pitch: reload_pitch(&conn, &id)?,
        booking,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippets_are_trimmed_and_capped() {
        assert_eq!(reply_snippet("   "), None);
        assert_eq!(reply_snippet(" yes! ").as_deref(), Some("yes!"));
        let long = "x".repeat(REPLY_SNIPPET_LEN + 50);
        assert_eq!(
            reply_snippet(&long).map(|s| s.chars().count()),
            Some(REPLY_SNIPPET_LEN)
        );
    }
}
