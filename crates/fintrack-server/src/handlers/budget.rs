//! Budget and planning handlers

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use super::transactions::UserQuery;
use crate::{json_rejection, query_rejection, AppError, AppState};
use fintrack_core::models::{DailyBudget, Forecast};
use fintrack_core::{budget, forecast as projection};

/// Body for a savings goal projection
#[derive(Debug, Deserialize)]
pub struct ForecastRequest {
    pub user_id: String,
    pub target_amount: i64,
    pub months: i64,
}

/// GET /budget/daily?user_id= - What can be spent today
pub async fn get_daily_budget(
    State(state): State<Arc<AppState>>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> Result<Json<DailyBudget>, AppError> {
    let Query(params) = query.map_err(query_rejection)?;
    let now = Utc::now().naive_utc();
    let result = budget::daily_budget(&state.db, &params.user_id, now)?;
    Ok(Json(result))
}

/// POST /plan/forecast - Whether a savings goal is reachable
pub async fn forecast(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ForecastRequest>, JsonRejection>,
) -> Result<Json<Forecast>, AppError> {
    let Json(req) = payload.map_err(json_rejection)?;
    let now = Utc::now().naive_utc();
    let result = projection::forecast(
        &state.db,
        &req.user_id,
        req.target_amount,
        req.months,
        now,
    )?;
    Ok(Json(result))
}
