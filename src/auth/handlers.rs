use axum::{
    extract::{FromRef, State},
    routing::post,
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use super::{
    dto::{LoginRequest, PublicUser, RegisterRequest, TokenResponse},
    jwt::JwtKeys,
    password::{hash_password, verify_password},
    repo::User,
};
use crate::{error::ApiError, state::AppState};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::InvalidInput("invalid email"));
    }

    if payload.password.len() < 8 {
        warn!("password too short");
        return Err(ApiError::InvalidInput("password too short"));
    }

    // Checked up front for a clean 409; the unique constraints in the
    // database still catch racing registrations.
    if User::find_by_username(&state.db, &payload.username)
        .await?
        .is_some()
        || User::find_by_email(&state.db, &payload.email)
            .await?
            .is_some()
    {
        warn!(username = %payload.username, "username or email already registered");
        return Err(ApiError::DuplicateCredential);
    }

    let hash = hash_password(&payload.password)?;
    let user = User::create(&state.db, &payload.username, &payload.email, &hash).await?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    // Unknown username and wrong password produce the same error.
    let user = User::find_by_username(&state.db, &payload.username)
        .await?
        .ok_or_else(|| {
            warn!(username = %payload.username, "login unknown username");
            ApiError::Unauthenticated
        })?;

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::Unauthenticated);
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(&user.username)?;

    info!(user_id = %user.id, username = %user.username, "user logged in");
    Ok(Json(TokenResponse {
        token,
        token_type: "bearer",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("a.b+c@sub.domain.io"));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("spaces in@example.com"));
        assert!(!is_valid_email("missing@tld"));
    }

    // Validation runs before any query, so the fake state's lazy pool is
    // never touched.
    #[tokio::test]
    async fn register_rejects_short_password_before_any_query() {
        let state = AppState::fake();
        let payload = RegisterRequest {
            username: "alice".into(),
            email: "alice@example.com".into(),
            password: "short".into(),
        };
        let err = register(State(state), Json(payload)).await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::InvalidInput("password too short")
        ));
    }

    #[tokio::test]
    async fn register_rejects_bad_email_before_any_query() {
        let state = AppState::fake();
        let payload = RegisterRequest {
            username: "alice".into(),
            email: "not-an-email".into(),
            password: "long-enough-password".into(),
        };
        let err = register(State(state), Json(payload)).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput("invalid email")));
    }

    #[test]
    fn token_response_serialization() {
        let response = TokenResponse {
            token: "abc.def.ghi".into(),
            token_type: "bearer",
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["token"], "abc.def.ghi");
        assert_eq!(json["token_type"], "bearer");
    }

    #[test]
    fn public_user_serialization_has_no_password_hash() {
        let view = PublicUser {
            id: Uuid::new_v4(),
            username: "alice".into(),
            email: "alice@example.com".into(),
            is_active: true,
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["username"], "alice");
        assert!(json.get("password_hash").is_none());
        assert!(json.get("password").is_none());
    }
}
