use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use super::{jwt::JwtKeys, repo::User};
use crate::{error::ApiError, state::AppState};

/// Extracts the bearer token from the `Authorization` header, validates it,
/// and resolves the subject to a stored user.
#[derive(Debug)]
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(ApiError::Unauthenticated)?;

        // Expect "Bearer <token>"
        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or(ApiError::Unauthenticated)?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|e| {
            warn!(error = %e, "token verification failed");
            ApiError::Unauthenticated
        })?;

        let user = User::find_by_username(&state.db, &claims.sub)
            .await?
            .ok_or_else(|| {
                warn!(subject = %claims.sub, "token subject unknown");
                ApiError::Unauthenticated
            })?;

        Ok(CurrentUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    // These paths reject before any query runs, so the fake state's lazy
    // pool is never touched.

    #[tokio::test]
    async fn missing_header_is_rejected() {
        let state = AppState::fake();
        let (mut parts, _) = Request::builder()
            .uri("/transactions")
            .body(())
            .unwrap()
            .into_parts();
        let err = CurrentUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated));
    }

    #[tokio::test]
    async fn non_bearer_scheme_is_rejected() {
        let state = AppState::fake();
        let (mut parts, _) = Request::builder()
            .uri("/transactions")
            .header(axum::http::header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
            .body(())
            .unwrap()
            .into_parts();
        let err = CurrentUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated));
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let state = AppState::fake();
        let (mut parts, _) = Request::builder()
            .uri("/transactions")
            .header(axum::http::header::AUTHORIZATION, "Bearer not.a.token")
            .body(())
            .unwrap()
            .into_parts();
        let err = CurrentUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated));
    }
}
