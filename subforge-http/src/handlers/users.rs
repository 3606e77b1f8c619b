use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::Response,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use super::AppState;
use crate::response::{message, success};
use subforge::validation::{
    require_object_id, validate_list_params, validate_new_user, validate_update,
};
use subforge::{Result, SubforgeError};

/// Raw list query. Values stay strings so that bad numbers surface as
/// field errors instead of extractor rejections.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserBody {
    pub name: Option<String>,
    pub email: Option<String>,
}

fn user_body(body: std::result::Result<Json<UserBody>, JsonRejection>) -> Result<UserBody> {
    match body {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => {
            tracing::debug!(reason = %rejection.body_text(), "rejected request body");
            let msg = if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                "Request body is too large"
            } else {
                "Request body must be a JSON object with string name and email"
            };
            Err(SubforgeError::field("body", msg))
        }
    }
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    query: std::result::Result<Query<ListQuery>, QueryRejection>,
) -> Result<Response> {
    let Query(query) = query.map_err(|e| SubforgeError::field("query", e.body_text()))?;
    let params = validate_list_params(
        query.page.as_deref(),
        query.limit.as_deref(),
        query.sort.as_deref(),
    )?;

    let page = state.backend.users.list(params).await?;
    Ok(success(StatusCode::OK, "Users retrieved successfully", page))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response> {
    let user = state.backend.users.get(&id).await?;
    Ok(success(
        StatusCode::OK,
        "User retrieved successfully",
        serde_json::json!({ "user": user }),
    ))
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<UserBody>, JsonRejection>,
) -> Result<Response> {
    let body = user_body(body)?;
    let new_user = validate_new_user(body.name.as_deref(), body.email.as_deref())?;

    let user = state.backend.users.create(new_user).await?;
    Ok(success(
        StatusCode::CREATED,
        "User created successfully",
        serde_json::json!({ "user": user }),
    ))
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: std::result::Result<Json<UserBody>, JsonRejection>,
) -> Result<Response> {
    require_object_id(&id)?;
    let body = user_body(body)?;
    let update = validate_update(body.name.as_deref(), body.email.as_deref())?;

    let user = state.backend.users.update(&id, update).await?;
    Ok(success(
        StatusCode::OK,
        "User updated successfully",
        serde_json::json!({ "user": user }),
    ))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response> {
    state.backend.users.delete(&id).await?;
    Ok(message(StatusCode::OK, "User deleted successfully"))
}
