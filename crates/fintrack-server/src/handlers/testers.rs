//! Beta tester handlers

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use tracing::info;

use crate::{json_rejection, AppError, AppState};
use fintrack_core::models::{NewTester, Tester, TesterEmailExport};

/// POST /testers - Register for the beta
pub async fn register_tester(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewTester>, JsonRejection>,
) -> Result<Json<Tester>, AppError> {
    let Json(new_tester) = payload.map_err(json_rejection)?;
    let tester = state.db.register_tester(&new_tester)?;

    info!(tester_id = tester.id, "Registered beta tester");

    Ok(Json(tester))
}

/// GET /testers - All testers, newest first
pub async fn list_testers(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Tester>>, AppError> {
    Ok(Json(state.db.list_testers()?))
}

/// GET /testers/emails - Emails ready to paste into the store console
pub async fn list_tester_emails(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TesterEmailExport>, AppError> {
    let emails = state.db.list_tester_emails()?;
    Ok(Json(TesterEmailExport::new(emails)))
}
