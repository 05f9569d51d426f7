use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use pgl_api::{
    crypto, db, service, CreateClientRequest, CreateClientResponse, ListClientsResponse,
    UpdateUserRoleRequest, UserResponse, UserRole,
};

use super::auth::AuthUser;
use crate::error::ApiErr;
use crate::storage::{
    client_summary_from_row, is_constraint_violation, sq_execute, sq_query_map, sq_query_opt,
    sq_query_row, user_from_row, Db,
};

/// GET /api/admin/clients — client accounts with campaign counts (staff).
pub async fn list_clients(
    State(db): State<Db>,
    user: AuthUser,
) -> Result<Json<ListClientsResponse>, ApiErr> {
    user.require_staff()?;
    let conn = db.conn();
    let clients = sq_query_map(&conn, db::users::list_clients(), client_summary_from_row)
        .map_err(ApiErr::from_db("list clients"))?;
    Ok(Json(ListClientsResponse { clients }))
}

/// POST /api/admin/clients — onboard a client (staff).
///
/// The API key is only returned here. Without a password the client can
/// only authenticate with that key.
pub async fn create_client(
    State(db): State<Db>,
    user: AuthUser,
    Json(req): Json<CreateClientRequest>,
) -> Result<(StatusCode, Json<CreateClientResponse>), ApiErr> {
    user.require_staff()?;

    let email = service::validate_email(&req.email)?;
    let full_name = service::validate_name("full_name", &req.full_name)?;
    let credentials = match req.password.as_deref() {
        Some(password) => {
            service::validate_password(password)?;
            Some(crypto::hash_password(password)?)
        }
        None => None,
    };

    let api_key = service::generate_api_key();
    let id = Uuid::new_v4().to_string();
    let conn = db.conn();
    sq_execute(
        &conn,
        db::users::insert(&db::users::InsertParams {
            id: &id,
            email: &email,
            full_name: &full_name,
            role: UserRole::Client,
            password_hash: credentials.as_ref().map(|(hash, _)| hash.as_str()),
            password_salt: credentials.as_ref().map(|(_, salt)| salt.as_str()),
            api_key_hash: Some(&service::hash_api_key(&api_key)),
        }),
    )
    .map_err(|e| {
        if is_constraint_violation(&e) {
            ApiErr::conflict("email already registered")
        } else {
            ApiErr::from_db("insert client")(e)
        }
    })?;

    let client = sq_query_row(&conn, db::users::get_by_id(&id), user_from_row)
        .map_err(ApiErr::from_db("reload client"))?;
    tracing::info!(client_id = %id, created_by = %user.user_id, "client created");
    Ok((StatusCode::CREATED, Json(CreateClientResponse { client, api_key })))
}

/// PATCH /api/admin/users/{id}/role — promote or demote an account (admin).
///
/// Admins cannot change their own role, so the agency never loses its last
/// admin by accident.
pub async fn update_user_role(
    State(db): State<Db>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateUserRoleRequest>,
) -> Result<Json<UserResponse>, ApiErr> {
    user.require_admin()?;
    if id == user.user_id {
        return Err(ApiErr::bad_request("you cannot change your own role"));
    }

    let conn = db.conn();
    let target = sq_query_opt(&conn, db::users::get_by_id(&id), user_from_row)
        .map_err(ApiErr::from_db("load user"))?
        .ok_or_else(|| ApiErr::not_found("user not found"))?;
    if target.role != req.role {
        sq_execute(&conn, db::users::update_role(&id, req.role))
            .map_err(ApiErr::from_db("update role"))?;
        tracing::info!(
            user_id = %id,
            from = %target.role,
            to = %req.role,
            changed_by = %user.user_id,
            "user role changed"
        );
    }

    let updated = sq_query_row(&conn, db::users::get_by_id(&id), user_from_row)
        .map_err(ApiErr::from_db("reload user"))?;
    Ok(Json(updated))
}
