use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::instrument;

use super::repo::{self, Rating, RatingAdd};
use crate::{
    auth::extractors::{AdminUser, CurrentUser},
    error::AppError,
    state::AppState,
};

pub fn rating_routes() -> Router<AppState> {
    Router::new()
        .route("/ratings/add", post(add_rating))
        .route("/ratings/delete/:rating_id", delete(delete_rating))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/ratings/list", get(list_ratings))
        .route("/ratings/delete_admin/:rating_id", delete(delete_rating_admin))
}

#[instrument(skip(state, user, payload))]
pub async fn add_rating(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<RatingAdd>,
) -> Result<(StatusCode, Json<Rating>), AppError> {
    let rating = repo::create(&state.db, &user, &payload).await?;
    Ok((StatusCode::CREATED, Json(rating)))
}

#[instrument(skip(state, user))]
pub async fn delete_rating(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(rating_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let rating = Rating::find_by_id(&state.db, rating_id).await?;
    if rating.author_id != user.user_id {
        return Err(AppError::Forbidden(
            "The authenticated user is not the author of the rating.",
        ));
    }
    Rating::delete(&state.db, rating_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, _admin))]
pub async fn list_ratings(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<Rating>>, AppError> {
    Ok(Json(Rating::list(&state.db).await?))
}

#[instrument(skip(state, _admin))]
pub async fn delete_rating_admin(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(rating_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    Rating::delete(&state.db, rating_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_add_deserializes() {
        let payload: RatingAdd =
            serde_json::from_str(r#"{"rating": 4.5, "recipe_id": 7}"#).unwrap();
        assert_eq!(payload.recipe_id, 7);
        assert!((payload.rating - 4.5).abs() < f64::EPSILON);
    }
}
