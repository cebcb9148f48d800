use crate::state::AppState;
use axum::Router;

mod dto;
pub(crate) mod extractors;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod repo;

pub use extractors::CurrentUser;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
