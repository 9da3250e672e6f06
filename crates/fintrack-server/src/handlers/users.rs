//! User handlers

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::{json_rejection, AppError, AppState};
use fintrack_core::models::NewUser;

#[derive(Serialize)]
pub struct CreatedUser {
    pub id: i64,
    pub user_id: String,
}

/// POST /users - Create a budget owner
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> Result<Json<CreatedUser>, AppError> {
    let Json(new_user) = payload.map_err(json_rejection)?;
    let user = state.db.create_user(&new_user)?;

    info!(user_id = %user.user_id, "Created user");

    Ok(Json(CreatedUser {
        id: user.id,
        user_id: user.user_id,
    }))
}
