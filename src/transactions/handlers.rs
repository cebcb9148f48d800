use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{
        page_count, CreateTransactionRequest, ListParams, TransactionPageResponse,
        UpdateTransactionRequest,
    },
    repo,
    repo::Transaction,
};
use crate::{auth::CurrentUser, error::ApiError, state::AppState};

/// Routes scoped to the authenticated owner.
pub fn owner_routes() -> Router<AppState> {
    Router::new().route(
        "/transactions",
        post(create_transaction).get(list_transactions),
    )
}

/// Lookup-by-id routes. The source system required no auth on these and
/// never filtered them by owner; kept as-is rather than silently tightened
/// (see DESIGN.md).
pub fn by_id_routes() -> Router<AppState> {
    Router::new().route(
        "/transactions/:id",
        get(get_transaction)
            .put(update_transaction)
            .delete(delete_transaction),
    )
}

#[instrument(skip(state, user, payload))]
pub async fn create_transaction(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateTransactionRequest>,
) -> Result<Json<Transaction>, ApiError> {
    let tx = repo::create(&state.db, user.id, &payload).await?;
    info!(id = %tx.id, owner_id = %user.id, "transaction created");
    Ok(Json(tx))
}

#[instrument(skip(state, user))]
pub async fn list_transactions(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<ListParams>,
) -> Result<Json<TransactionPageResponse>, ApiError> {
    let params = params.clamped();
    let page = repo::list_page(
        &state.db,
        user.id,
        params.search.as_deref(),
        params.page,
        params.size,
    )
    .await?;

    Ok(Json(TransactionPageResponse {
        transactions: page.items,
        total_amount: page.total_amount,
        total: page.total_count,
        page: params.page,
        size: params.size,
        pages: page_count(page.total_count, params.size),
    }))
}

#[instrument(skip(state))]
pub async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Transaction>, ApiError> {
    let tx = repo::get(&state.db, id).await?;
    Ok(Json(tx))
}

#[instrument(skip(state, payload))]
pub async fn update_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTransactionRequest>,
) -> Result<Json<Transaction>, ApiError> {
    let tx = repo::update(&state.db, id, &payload).await?;
    info!(%id, "transaction updated");
    Ok(Json(tx))
}

#[instrument(skip(state))]
pub async fn delete_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    repo::delete(&state.db, id).await?;
    info!(%id, "transaction deleted");
    Ok(StatusCode::NO_CONTENT)
}
