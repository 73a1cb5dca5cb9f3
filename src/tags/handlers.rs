use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::instrument;

use super::repo::{self, Tag};
use crate::{
    auth::{
        dto::UserResponse,
        extractors::{AdminUser, CurrentUser},
    },
    error::AppError,
    state::AppState,
};

pub fn tag_routes() -> Router<AppState> {
    Router::new()
        .route("/tags/list", get(list_tags))
        .route("/tags/subscribe/:tag_id", post(subscribe_tag))
        .route("/tags/unsubscribe/:tag_id", post(unsubscribe_tag))
        .route("/tags/subscriptions", get(list_subscriptions))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/tags/add", post(add_tag))
        .route("/tags/delete/:tag_id", delete(delete_tag))
}

#[derive(Debug, Deserialize)]
pub struct TagAdd {
    pub name: String,
}

#[instrument(skip(state))]
pub async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<Tag>>, AppError> {
    Ok(Json(Tag::list(&state.db).await?))
}

#[instrument(skip(state, _admin))]
pub async fn add_tag(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(payload): Json<TagAdd>,
) -> Result<(StatusCode, Json<Tag>), AppError> {
    let tag = Tag::create(&state.db, &payload.name).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

#[instrument(skip(state, _admin))]
pub async fn delete_tag(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(tag_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    Tag::delete(&state.db, tag_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, user))]
pub async fn subscribe_tag(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(tag_id): Path<i64>,
) -> Result<Json<UserResponse>, AppError> {
    let refreshed = repo::subscribe(&state.db, &user, tag_id).await?;
    Ok(Json(refreshed.into()))
}

#[instrument(skip(state, user))]
pub async fn unsubscribe_tag(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(tag_id): Path<i64>,
) -> Result<Json<UserResponse>, AppError> {
    let refreshed = repo::unsubscribe(&state.db, &user, tag_id).await?;
    Ok(Json(refreshed.into()))
}

#[instrument(skip(state, user))]
pub async fn list_subscriptions(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Tag>>, AppError> {
    Ok(Json(repo::subscriptions(&state.db, user.user_id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_add_deserializes() {
        let payload: TagAdd = serde_json::from_str(r#"{"name": "vegan"}"#).unwrap();
        assert_eq!(payload.name, "vegan");
    }
}
