//! Questionnaire response query builders (one row per campaign).

use std::collections::BTreeMap;

use sea_query::{Expr, OnConflict, Query, SqliteQueryBuilder};

use super::Built;
use super::tables::QuestionnaireResponses;

/// Column order must match `questionnaire_from_row()`.
pub fn get_by_campaign(campaign_id: &str) -> Built {
    Query::select()
        .columns([
            QuestionnaireResponses::Id,
            QuestionnaireResponses::CampaignId,
            QuestionnaireResponses::UserId,
            QuestionnaireResponses::Answers,
            QuestionnaireResponses::SubmittedAt,
        ])
        .from(QuestionnaireResponses::Table)
        .and_where(Expr::col(QuestionnaireResponses::CampaignId).eq(campaign_id))
        .build(SqliteQueryBuilder)
}

/// INSERT or replace the answers for a campaign. The original row id is kept.
pub fn upsert(
    id: &str,
    campaign_id: &str,
    user_id: &str,
    answers: &BTreeMap<String, String>,
) -> Built {
    let answers = serde_json::to_string(answers).unwrap_or_else(|_| "{}".to_string());
    Query::insert()
        .into_table(QuestionnaireResponses::Table)
        .columns([
            QuestionnaireResponses::Id,
            QuestionnaireResponses::CampaignId,
            QuestionnaireResponses::UserId,
            QuestionnaireResponses::Answers,
        ])
        .values_panic([id.into(), campaign_id.into(), user_id.into(), answers.into()])
        .on_conflict(
            OnConflict::column(QuestionnaireResponses::CampaignId)
                .update_columns([
                    QuestionnaireResponses::UserId,
                    QuestionnaireResponses::Answers,
                ])
                .value(
                    QuestionnaireResponses::SubmittedAt,
                    Expr::cust("datetime('now')"),
                )
                .to_owned(),
        )
        .build(SqliteQueryBuilder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_targets_campaign_conflict() {
        let answers = BTreeMap::from([("title".to_string(), "Founder".to_string())]);
        let (sql, values) = upsert("q1", "c1", "u1", &answers);
        assert!(sql.contains("ON CONFLICT (\"campaign_id\") DO UPDATE"));
        assert_eq!(values.0[3], sea_query::Value::from(r#"{"title":"Founder"}"#));
    }
}
