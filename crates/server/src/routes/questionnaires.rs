use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use pgl_api::{db, service::Problems, QuestionnaireResponse, SubmitQuestionnaireRequest};

use super::auth::AuthUser;
use super::campaigns::load_campaign;
use crate::error::ApiErr;
use crate::storage::{questionnaire_from_row, sq_execute, sq_query_opt, sq_query_row, Db};

const MAX_ANSWERS: usize = 100;
const MAX_ANSWER_LEN: usize = 10_000;

fn validate_answers(req: &SubmitQuestionnaireRequest) -> Result<(), ApiErr> {
    let mut problems = Problems::new();
    if req.answers.len() > MAX_ANSWERS {
        problems.push(format!("at most {MAX_ANSWERS} answers are accepted"));
    }
    if req.answers.keys().any(|k| k.trim().is_empty()) {
        problems.push("question ids must not be empty");
    }
    for (question, answer) in &req.answers {
        if answer.chars().count() > MAX_ANSWER_LEN {
            problems.push(format!(
                "answer to {question} must be at most {MAX_ANSWER_LEN} characters"
            ));
        }
    }
    Ok(problems.finish()?)
}

/// GET /api/campaigns/{id}/questionnaire
pub async fn get_questionnaire(
    State(db): State<Db>,
    user: AuthUser,
    Path(campaign_id): Path<String>,
) -> Result<Json<QuestionnaireResponse>, ApiErr> {
    let conn = db.conn();
    load_campaign(&conn, &user, &campaign_id)?;
    sq_query_opt(
        &conn,
        db::questionnaires::get_by_campaign(&campaign_id),
        questionnaire_from_row,
    )
    .map_err(ApiErr::from_db("load questionnaire"))?
    .map(Json)
    .ok_or_else(|| ApiErr::not_found("questionnaire not submitted"))
}

/// PUT /api/campaigns/{id}/questionnaire — replace the answers (one response per campaign).
pub async fn submit_questionnaire(
    State(db): State<Db>,
    user: AuthUser,
    Path(campaign_id): Path<String>,
    Json(req): Json<SubmitQuestionnaireRequest>,
) -> Result<Json<QuestionnaireResponse>, ApiErr> {
    validate_answers(&req)?;
    let answers = req
        .answers
        .into_iter()
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    let conn = db.conn();
    load_campaign(&conn, &user, &campaign_id)?;
    sq_execute(
        &conn,
        db::questionnaires::upsert(
            &Uuid::new_v4().to_string(),
            &campaign_id,
            &user.user_id,
            &answers,
        ),
    )
    .map_err(ApiErr::from_db("upsert questionnaire"))?;

    let response = sq_query_row(
        &conn,
        db::questionnaires::get_by_campaign(&campaign_id),
        questionnaire_from_row,
    )
    .map_err(ApiErr::from_db("reload questionnaire"))?;
    Ok(Json(response))
}
