use crate::state::AppState;
use axum::Router;

mod dto;
pub mod handlers;
pub mod jwt;
pub mod password;

pub use jwt::{AuthUser, Principal};

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
