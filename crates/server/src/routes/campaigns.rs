use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use rusqlite::Connection;
use uuid::Uuid;

use pgl_api::{
    db, service, CampaignListQuery, CampaignListResponse, CampaignResponse, CreateCampaignRequest,
    GenerateAnglesResponse, GenerateBioResponse, OkResponse, UpdateCampaignRequest,
};
use pgl_core::generate::ClientBrief;

use super::auth::AuthUser;
use crate::error::ApiErr;
use crate::generation::Generator;
use crate::storage::{
    campaign_from_row, questionnaire_from_row, sq_count, sq_execute, sq_query_map, sq_query_opt,
    user_from_row, Db,
};

/// Load a campaign the caller may see. Other clients' campaigns are reported
/// as missing rather than forbidden.
pub(crate) fn load_campaign(
    conn: &Connection,
    user: &AuthUser,
    id: &str,
) -> Result<CampaignResponse, ApiErr> {
    sq_query_opt(conn, db::campaigns::get_by_id(id), campaign_from_row)
        .map_err(ApiErr::from_db("load campaign"))?
        .filter(|c| user.can_view(&c.user_id))
        .ok_or_else(|| ApiErr::not_found("campaign not found"))
}

// ---------------------------------------------------------------------------
// List / create
// ---------------------------------------------------------------------------

/// GET /api/campaigns — own campaigns for clients, all (optionally one
/// client's) for staff.
pub async fn list_campaigns(
    State(db): State<Db>,
    user: AuthUser,
    Query(q): Query<CampaignListQuery>,
) -> Result<Json<CampaignListResponse>, ApiErr> {
    let owner = match user.owner_scope() {
        Some(own) => Some(own.to_string()),
        None => q.user_id.clone(),
    };
    let built = db::campaigns::list(&q, owner.as_deref());

    let conn = db.conn();
    let total = sq_count(&conn, built.count_query).map_err(ApiErr::from_db("count campaigns"))?;
    let campaigns = sq_query_map(&conn, built.select_query, campaign_from_row)
        .map_err(ApiErr::from_db("list campaigns"))?;

    Ok(Json(CampaignListResponse {
        campaigns,
        total,
        page: built.page,
        per_page: built.per_page,
    }))
}

/// POST /api/campaigns — clients create for themselves; staff may name a client.
pub async fn create_campaign(
    State(db): State<Db>,
    user: AuthUser,
    Json(req): Json<CreateCampaignRequest>,
) -> Result<(StatusCode, Json<CampaignResponse>), ApiErr> {
    service::validate_create_campaign(&req)?;

    let conn = db.conn();
    let owner_id = match req.user_id.as_deref().filter(|_| user.is_staff()) {
        Some(client_id) => {
            sq_query_opt(&conn, db::users::get_by_id(client_id), user_from_row)
                .map_err(ApiErr::from_db("load campaign owner"))?
                .ok_or_else(|| ApiErr::bad_request("user_id does not exist"))?
                .id
        }
        None => user.user_id.clone(),
    };

    let id = Uuid::new_v4().to_string();
    let keywords = req
        .keywords
        .map(|k| k.into_keywords())
        .unwrap_or_default();
    let links: Vec<String> = req
        .links
        .unwrap_or_default()
        .into_iter()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect();
    let goals = service::clean_text(req.goals.as_deref());
    let target_audience = service::clean_text(req.target_audience.as_deref());

    sq_execute(
        &conn,
        db::campaigns::insert(&db::campaigns::InsertParams {
            id: &id,
            user_id: &owner_id,
            name: req.name.trim(),
            status: req.status.unwrap_or_default(),
            goals: goals.as_deref(),
            target_audience: target_audience.as_deref(),
            keywords: &keywords,
            links: &links,
        }),
    )
    .map_err(ApiErr::from_db("insert campaign"))?;

    let campaign = load_campaign(&conn, &user, &id)?;
    tracing::info!(campaign_id = %id, owner = %owner_id, "campaign created");
    Ok((StatusCode::CREATED, Json(campaign)))
}

// ---------------------------------------------------------------------------
// Single campaign
// ---------------------------------------------------------------------------

/// GET /api/campaigns/{id}
pub async fn get_campaign(
    State(db): State<Db>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<CampaignResponse>, ApiErr> {
    let conn = db.conn();
    Ok(Json(load_campaign(&conn, &user, &id)?))
}

/// PATCH /api/campaigns/{id} — partial update; empty strings clear text fields.
pub async fn update_campaign(
    State(db): State<Db>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateCampaignRequest>,
) -> Result<Json<CampaignResponse>, ApiErr> {
    service::validate_update_campaign(&req)?;

    let conn = db.conn();
    load_campaign(&conn, &user, &id)?;
    if let Some(built) = db::campaigns::update(&id, &req) {
        sq_execute(&conn, built).map_err(ApiErr::from_db("update campaign"))?;
    }
    Ok(Json(load_campaign(&conn, &user, &id)?))
}

/// DELETE /api/campaigns/{id} — removes questionnaire, media kit, matches and pitches too.
pub async fn delete_campaign(
    State(db): State<Db>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<OkResponse>, ApiErr> {
    let conn = db.conn();
    load_campaign(&conn, &user, &id)?;
    sq_execute(&conn, db::campaigns::delete(&id)).map_err(ApiErr::from_db("delete campaign"))?;
    tracing::info!(campaign_id = %id, "campaign deleted");
    Ok(Json(OkResponse { ok: true }))
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

fn client_brief(conn: &Connection, campaign: &CampaignResponse) -> Result<ClientBrief, ApiErr> {
    let answers = sq_query_opt(
        conn,
        db::questionnaires::get_by_campaign(&campaign.id),
        questionnaire_from_row,
    )
    .map_err(ApiErr::from_db("load questionnaire"))?
    .map(|q| q.answers)
    .unwrap_or_default();

    Ok(ClientBrief {
        client_name: campaign.client_name.clone(),
        goals: campaign.goals.clone(),
        target_audience: campaign.target_audience.clone(),
        keywords: campaign.keywords.clone(),
        answers,
    })
}

/// POST /api/campaigns/{id}/generate-bio — generate and store the guest bio.
pub async fn generate_bio(
    State(db): State<Db>,
    State(generator): State<Generator>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<GenerateBioResponse>, ApiErr> {
    let brief = {
        let conn = db.conn();
        let campaign = load_campaign(&conn, &user, &id)?;
        client_brief(&conn, &campaign)?
    };

    let generated = generator.bio(&brief).await;

    let conn = db.conn();
    sq_execute(&conn, db::campaigns::update_bio(&id, &generated.value))
        .map_err(ApiErr::from_db("store bio"))?;

    Ok(Json(GenerateBioResponse {
        campaign_id: id,
        bio: generated.value,
        generator: generated.generator,
    }))
}

/// POST /api/campaigns/{id}/generate-angles — generate and store pitch angles.
pub async fn generate_angles(
    State(db): State<Db>,
    State(generator): State<Generator>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<GenerateAnglesResponse>, ApiErr> {
    let brief = {
        let conn = db.conn();
        let campaign = load_campaign(&conn, &user, &id)?;
        client_brief(&conn, &campaign)?
    };

    let generated = generator.angles(&brief).await;

    let conn = db.conn();
    sq_execute(&conn, db::campaigns::update_angles(&id, &generated.value))
        .map_err(ApiErr::from_db("store angles"))?;

    Ok(Json(GenerateAnglesResponse {
        campaign_id: id,
        angles: generated.value,
        generator: generated.generator,
    }))
}
