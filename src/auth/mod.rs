use axum::Router;

use crate::state::AppState;

pub(crate) mod dto;
pub mod extractors;
pub mod handlers;
mod jwt;
mod password;
pub mod repo;
mod social;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(handlers::admin_routes())
}
