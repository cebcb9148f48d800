use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::error;

/// The errors that may surface from the service layer.
///
/// Storage faults keep their source error for the server log but collapse to
/// a generic 500 for the caller. There is no expired-token variant: tokens
/// never expire.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No row with the requested id exists.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Username or email is already registered.
    #[error("username or email already registered")]
    DuplicateCredential,

    /// Bad credentials, or a bearer token that failed validation.
    #[error("could not validate credentials")]
    Unauthenticated,

    /// The request body failed validation.
    #[error("invalid request: {0}")]
    InvalidInput(&'static str),

    /// A storage-layer fault during an insert, update, or delete.
    #[error("storage write failed: {0}")]
    WriteFailed(#[source] sqlx::Error),

    /// A storage-layer fault during a read.
    #[error("storage query failed: {0}")]
    QueryFailed(#[source] sqlx::Error),

    /// Hashing or signing machinery failed.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(what) => {
                (StatusCode::NOT_FOUND, format!("{what} not found")).into_response()
            }
            ApiError::DuplicateCredential => (
                StatusCode::CONFLICT,
                "Username or email already registered".to_string(),
            )
                .into_response(),
            ApiError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, "Bearer")],
                "Could not validate credentials".to_string(),
            )
                .into_response(),
            ApiError::InvalidInput(msg) => {
                (StatusCode::BAD_REQUEST, msg.to_string()).into_response()
            }
            ApiError::WriteFailed(e) => {
                error!(error = %e, "storage write failed");
                internal_server_error()
            }
            ApiError::QueryFailed(e) => {
                error!(error = %e, "storage query failed");
                internal_server_error()
            }
            ApiError::Internal(e) => {
                error!(error = %e, "internal error");
                internal_server_error()
            }
        }
    }
}

fn internal_server_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
        .into_response()
}
