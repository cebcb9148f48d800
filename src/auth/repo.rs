use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use tracing::error;
use uuid::Uuid;

use crate::error::ApiError;

/// User record in the database. Rows are never physically deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // argon2 PHC string, never exposed in JSON
    pub is_active: bool,
    #[serde(skip_serializing)]
    pub created_at: OffsetDateTime,
}

impl User {
    pub async fn find_by_username(db: &PgPool, username: &str) -> Result<Option<User>, ApiError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, is_active, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(db)
        .await
        .map_err(|e| {
            error!(error = %e, username, "find_by_username failed");
            ApiError::QueryFailed(e)
        })
    }

    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<User>, ApiError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, is_active, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await
        .map_err(|e| {
            error!(error = %e, email, "find_by_email failed");
            ApiError::QueryFailed(e)
        })
    }

    /// Insert a new user with a hashed password. A unique-constraint hit on
    /// username or email (a racing registration) maps to
    /// [`ApiError::DuplicateCredential`] rather than a storage fault.
    pub async fn create(
        db: &PgPool,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, ApiError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, email, password_hash, is_active, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(db)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                ApiError::DuplicateCredential
            }
            _ => {
                error!(error = %e, username, "create user failed");
                ApiError::WriteFailed(e)
            }
        })
    }
}
