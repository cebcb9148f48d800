use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use tracing::error;
use uuid::Uuid;

use super::dto::{page_offset, CreateTransactionRequest, UpdateTransactionRequest};
use crate::error::ApiError;

/// Transaction record in the database.
///
/// `date` is stored as opaque text; the system never validates it as a real
/// calendar date. `amount` carries no currency or precision contract.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Transaction {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub amount: f64,
    pub category: String,
    pub description: String,
    pub is_income: bool,
    pub date: String,
    #[serde(skip_serializing)]
    pub created_at: OffsetDateTime,
}

/// One page of matching rows plus the page-independent aggregates.
#[derive(Debug)]
pub struct TransactionPage {
    pub items: Vec<Transaction>,
    pub total_amount: f64,
    pub total_count: i64,
}

#[derive(Debug, FromRow)]
struct PageTotals {
    total_amount: f64,
    total_count: i64,
}

/// ILIKE pattern for the OR filter across category, description, and date.
/// An absent search term becomes the blank pattern `%%`, which matches every
/// row; the columns are NOT NULL, so this is a true no-op filter.
pub(crate) fn search_pattern(search: Option<&str>) -> String {
    match search {
        Some(term) => format!("%{}%", term.to_lowercase()),
        None => "%%".to_string(),
    }
}

pub async fn create(
    db: &PgPool,
    owner_id: Uuid,
    fields: &CreateTransactionRequest,
) -> Result<Transaction, ApiError> {
    sqlx::query_as::<_, Transaction>(
        r#"
        INSERT INTO transactions (id, owner_id, amount, category, description, is_income, date)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, owner_id, amount, category, description, is_income, date, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(owner_id)
    .bind(fields.amount)
    .bind(&fields.category)
    .bind(&fields.description)
    .bind(fields.is_income)
    .bind(&fields.date)
    .fetch_one(db)
    .await
    .map_err(|e| {
        error!(error = %e, %owner_id, "create transaction failed");
        ApiError::WriteFailed(e)
    })
}

/// Lookup by id alone. The source system never scoped this by owner and
/// that behavior is kept; see DESIGN.md.
pub async fn get(db: &PgPool, id: Uuid) -> Result<Transaction, ApiError> {
    sqlx::query_as::<_, Transaction>(
        r#"
        SELECT id, owner_id, amount, category, description, is_income, date, created_at
        FROM transactions
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await
    .map_err(|e| {
        error!(error = %e, %id, "get transaction failed");
        ApiError::QueryFailed(e)
    })?
    .ok_or(ApiError::NotFound("transaction"))
}

/// Partial update: only the supplied fields change, the rest keep their
/// current values.
pub async fn update(
    db: &PgPool,
    id: Uuid,
    fields: &UpdateTransactionRequest,
) -> Result<Transaction, ApiError> {
    sqlx::query_as::<_, Transaction>(
        r#"
        UPDATE transactions
        SET amount      = COALESCE($2, amount),
            category    = COALESCE($3, category),
            description = COALESCE($4, description),
            is_income   = COALESCE($5, is_income),
            date        = COALESCE($6, date)
        WHERE id = $1
        RETURNING id, owner_id, amount, category, description, is_income, date, created_at
        "#,
    )
    .bind(id)
    .bind(fields.amount)
    .bind(&fields.category)
    .bind(&fields.description)
    .bind(fields.is_income)
    .bind(&fields.date)
    .fetch_optional(db)
    .await
    .map_err(|e| {
        error!(error = %e, %id, "update transaction failed");
        ApiError::WriteFailed(e)
    })?
    .ok_or(ApiError::NotFound("transaction"))
}

pub async fn delete(db: &PgPool, id: Uuid) -> Result<(), ApiError> {
    let result = sqlx::query(r#"DELETE FROM transactions WHERE id = $1"#)
        .bind(id)
        .execute(db)
        .await
        .map_err(|e| {
            error!(error = %e, %id, "delete transaction failed");
            ApiError::WriteFailed(e)
        })?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("transaction"));
    }
    Ok(())
}

/// Filtered, paginated view over one owner's transactions.
///
/// Both queries share the same predicate: owner plus the case-folded
/// substring match across category, description, and date. The aggregates
/// cover every matching row, not just the requested window. Rows are
/// ordered by `(created_at, id)` so paging is deterministic.
pub async fn list_page(
    db: &PgPool,
    owner_id: Uuid,
    search: Option<&str>,
    page: i64,
    size: i64,
) -> Result<TransactionPage, ApiError> {
    let pattern = search_pattern(search);
    let offset = page_offset(page, size);

    let items = sqlx::query_as::<_, Transaction>(
        r#"
        SELECT id, owner_id, amount, category, description, is_income, date, created_at
        FROM transactions
        WHERE owner_id = $1
          AND (category ILIKE $2 OR description ILIKE $2 OR date ILIKE $2)
        ORDER BY created_at ASC, id ASC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(owner_id)
    .bind(&pattern)
    .bind(size)
    .bind(offset)
    .fetch_all(db)
    .await
    .map_err(|e| {
        error!(error = %e, %owner_id, "list transactions failed");
        ApiError::QueryFailed(e)
    })?;

    let totals = sqlx::query_as::<_, PageTotals>(
        r#"
        SELECT COALESCE(SUM(amount), 0)::double precision AS total_amount,
               COUNT(*) AS total_count
        FROM transactions
        WHERE owner_id = $1
          AND (category ILIKE $2 OR description ILIKE $2 OR date ILIKE $2)
        "#,
    )
    .bind(owner_id)
    .bind(&pattern)
    .fetch_one(db)
    .await
    .map_err(|e| {
        error!(error = %e, %owner_id, "sum transactions failed");
        ApiError::QueryFailed(e)
    })?;

    Ok(TransactionPage {
        items,
        total_amount: totals.total_amount,
        total_count: totals.total_count,
    })
}
