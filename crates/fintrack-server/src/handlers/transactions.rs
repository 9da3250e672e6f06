//! Transaction handlers

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
use tracing::info;

use crate::{json_rejection, query_rejection, AppError, AppState, ClassificationJob};
use fintrack_core::models::{NewTransaction, Transaction};

/// Query parameters identifying a user
#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user_id: String,
}

/// Body for recording a transaction from notification text
#[derive(Debug, Deserialize)]
pub struct NotificationRequest {
    pub user_id: String,
    pub raw_text: String,
}

/// Store a transaction and hand it to the background classifier
fn record(state: &AppState, tx: &NewTransaction) -> Result<Transaction, AppError> {
    tx.validate()?;
    let stored = state.db.insert_transaction(tx)?;

    info!(
        transaction_id = stored.id,
        user_id = %stored.user_id,
        amount = stored.amount,
        "Recorded transaction"
    );

    state.queue.enqueue(ClassificationJob {
        transaction_id: stored.id,
        vendor: stored.vendor.clone(),
    });

    Ok(stored)
}

/// POST /transactions - Record a transaction (category is filled in later)
pub async fn create_transaction(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewTransaction>, JsonRejection>,
) -> Result<Json<Transaction>, AppError> {
    let Json(tx) = payload.map_err(json_rejection)?;
    Ok(Json(record(&state, &tx)?))
}

/// POST /transactions/notification - Record a transaction from push-notification text
pub async fn create_transaction_from_notification(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NotificationRequest>, JsonRejection>,
) -> Result<Json<Transaction>, AppError> {
    let Json(req) = payload.map_err(json_rejection)?;

    let now = Utc::now().naive_utc();
    let parsed = state
        .parser
        .parse(&req.raw_text, now)
        .ok_or_else(|| AppError::unprocessable("Could not find an amount and vendor in raw_text"))?;

    let tx = parsed.into_transaction(&req.user_id, &req.raw_text);
    Ok(Json(record(&state, &tx)?))
}

/// GET /transactions?user_id= - List a user's transactions, newest first
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> Result<Json<Vec<Transaction>>, AppError> {
    let Query(params) = query.map_err(query_rejection)?;
    let transactions = state.db.list_transactions_for_user(&params.user_id)?;
    Ok(Json(transactions))
}
