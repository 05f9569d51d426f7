use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Json,
};

use pgl_api::{crypto, db, PitchStatus, ReplyWebhookRequest, ReplyWebhookResponse};

use super::pitches::reply_snippet;
use crate::error::ApiErr;
use crate::storage::{pitch_from_row, sq_execute, sq_query_opt, Db, PitchRow};
use crate::AppConfig;

pub const SIGNATURE_HEADER: &str = "x-pgl-signature";

fn verify_signature(config: &AppConfig, headers: &HeaderMap, body: &[u8]) -> Result<(), ApiErr> {
    let Some(secret) = config.webhook_secret.as_deref() else {
        return Err(ApiErr::forbidden("reply webhook is not configured"));
    };
    let header = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiErr::unauthorized("missing webhook signature"))?;
    if !crypto::verify_webhook_signature(secret, body, header) {
        return Err(ApiErr::unauthorized("invalid webhook signature"));
    }
    Ok(())
}

/// POST /api/webhooks/replies — the mail provider reports a host reply.
///
/// Signed with `X-PGL-Signature: sha256=<hex hmac of the raw body>`. The
/// pitch is found by `pitch_id`, else by the `Message-ID` it was sent with.
/// A repeated delivery, or a reply to a pitch that has already been replied
/// to or settled, is acknowledged as-is.
pub async fn reply_received(
    State(db): State<Db>,
    State(config): State<AppConfig>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ReplyWebhookResponse>, ApiErr> {
    verify_signature(&config, &headers, &body)?;
    let req: ReplyWebhookRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiErr::bad_request(format!("invalid webhook payload: {e}")))?;

    let conn = db.conn();
    let lookup = match (req.pitch_id.as_deref(), req.in_reply_to.as_deref()) {
        (Some(id), _) => db::pitches::get_by_id(id.trim()),
        (None, Some(message_id)) => db::pitches::get_by_message_id(message_id.trim()),
        (None, None) => {
            return Err(ApiErr::bad_request("pitch_id or in_reply_to is required"));
        }
    };
    let PitchRow { pitch, .. } = sq_query_opt(&conn, lookup, pitch_from_row)
        .map_err(ApiErr::from_db("load pitch"))?
        .ok_or_else(|| ApiErr::not_found("pitch not found"))?;

    // Redeliveries, and replies to pitches that were already settled, are
    // acknowledged without change so the provider stops retrying.
    if pitch.replied_at.is_some() || pitch.status.is_terminal() {
        tracing::info!(pitch_id = %pitch.id, status = %pitch.status, "pitch reply already handled");
        return Ok(Json(ReplyWebhookResponse {
            pitch_id: pitch.id,
            status: pitch.status,
        }));
    }
    let next = pitch.status.transition(PitchStatus::Replied)?;

    let snippet = req.body.as_deref().and_then(reply_snippet);
    let changed = sq_execute(
        &conn,
        db::pitches::mark_replied(&pitch.id, pitch.status, snippet.as_deref()),
    )
    .map_err(ApiErr::from_db("mark pitch replied"))?;
    if changed == 0 {
        return Err(ApiErr::conflict("pitch status changed concurrently"));
    }

    tracing::info!(
        pitch_id = %pitch.id,
        from = req.from.as_deref().unwrap_or("unknown"),
        "pitch reply recorded"
    );
    Ok(Json(ReplyWebhookResponse {
        pitch_id: pitch.id,
        status: next,
    }))
}
