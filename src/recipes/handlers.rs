use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{RecipeAdd, RecipeResponse, UnitAdd},
    repo::{self, Recipe, Unit, RECIPE_NOT_FOUND},
};
use crate::{
    auth::extractors::{AdminUser, CurrentUser},
    error::AppError,
    state::AppState,
};

pub fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes/recipe/add", post(add_recipe))
        .route("/recipes/recipe/:recipe_id", get(get_recipe))
        .route("/recipes/recipe/delete/:recipe_id", delete(delete_recipe))
        .route("/recipes/units/list", get(list_units))
        .route("/recipes/saved/save/:recipe_id", post(save_recipe))
        .route("/recipes/saved/delete/:recipe_id", delete(unsave_recipe))
        .route("/recipes/saved/list", get(list_saved))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/recipes/units/add", post(add_unit))
}

#[instrument(skip(state, user, payload))]
pub async fn add_recipe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<RecipeAdd>,
) -> Result<(StatusCode, Json<RecipeResponse>), AppError> {
    let recipe = repo::create(&state.db, user.user_id, &payload).await?;
    Ok((StatusCode::CREATED, Json(recipe)))
}

#[instrument(skip(state))]
pub async fn get_recipe(
    State(state): State<AppState>,
    Path(recipe_id): Path<i64>,
) -> Result<Json<RecipeResponse>, AppError> {
    let recipe = repo::fetch(&state.db, recipe_id)
        .await?
        .ok_or(AppError::NotFound(RECIPE_NOT_FOUND))?;
    Ok(Json(recipe))
}

#[instrument(skip(state, user))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(recipe_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let recipe = Recipe::find_by_id(&state.db, recipe_id)
        .await?
        .ok_or(AppError::NotFound(RECIPE_NOT_FOUND))?;
    if recipe.author_id != user.user_id {
        return Err(AppError::Forbidden(
            "Current user is not the owner of the recipe.",
        ));
    }
    Recipe::delete(&state.db, recipe_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, _user))]
pub async fn list_units(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<Vec<Unit>>, AppError> {
    Ok(Json(Unit::list(&state.db).await?))
}

#[instrument(skip(state, _admin))]
pub async fn add_unit(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(payload): Json<UnitAdd>,
) -> Result<(StatusCode, Json<Unit>), AppError> {
    let unit = Unit::create(&state.db, &payload.unit, payload.liquid).await?;
    Ok((StatusCode::CREATED, Json(unit)))
}

#[instrument(skip(state, user))]
pub async fn save_recipe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(recipe_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    repo::save(&state.db, &user, recipe_id).await?;
    Ok(StatusCode::CREATED)
}

#[instrument(skip(state, user))]
pub async fn unsave_recipe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(recipe_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    repo::unsave(&state.db, &user, recipe_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, user))]
pub async fn list_saved(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Recipe>>, AppError> {
    Ok(Json(repo::saved_list(&state.db, user.user_id).await?))
}
