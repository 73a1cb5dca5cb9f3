pub(crate) mod dto;
pub mod handlers;
pub mod repo;

use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::recipe_routes())
        .merge(handlers::admin_routes())
}
