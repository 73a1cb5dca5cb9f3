use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use tracing::info;

use crate::auth::repo::User;
use crate::error::{is_unique_violation, AppError};
use crate::recipes::repo::{Recipe, RECIPE_NOT_FOUND};

const RATING_NOT_FOUND: &str = "Rating with the given ID was not found in the DB.";
const SELF_RATING: &str =
    "Authenticated user is the author of the recipe which prohibits them from rating.";
const ALREADY_RATED: &str = "Rating for the given recipe by the given user already exists.";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Rating {
    pub rating_id: i64,
    pub author_id: i64,
    pub recipe_id: i64,
    pub rating: f64,
}

#[derive(Debug, Deserialize)]
pub struct RatingAdd {
    pub rating: f64,
    pub recipe_id: i64,
}

impl Rating {
    pub async fn find_by_id(db: &PgPool, rating_id: i64) -> Result<Rating, AppError> {
        let rating = sqlx::query_as::<_, Rating>(
            "SELECT rating_id, author_id, recipe_id, rating FROM ratings WHERE rating_id = $1",
        )
        .bind(rating_id)
        .fetch_optional(db)
        .await?
        .ok_or(AppError::NotFound(RATING_NOT_FOUND))?;
        Ok(rating)
    }

    pub async fn delete(db: &PgPool, rating_id: i64) -> Result<(), AppError> {
        let res = sqlx::query("DELETE FROM ratings WHERE rating_id = $1")
            .bind(rating_id)
            .execute(db)
            .await?;
        if res.rows_affected() == 0 {
            return Err(AppError::NotFound(RATING_NOT_FOUND));
        }
        info!(rating_id, "rating deleted");
        Ok(())
    }

    pub async fn list(db: &PgPool) -> Result<Vec<Rating>, AppError> {
        let ratings = sqlx::query_as::<_, Rating>(
            "SELECT rating_id, author_id, recipe_id, rating FROM ratings",
        )
        .fetch_all(db)
        .await?;
        Ok(ratings)
    }
}

/// Rates a recipe on behalf of `author`. Authors can't rate their own
/// recipes, and a user gets one rating per recipe: the unique constraint
/// over `(author_id, recipe_id)` is the backstop, mapped to the same
/// Forbidden as a pre-existing rating would be.
pub async fn create(db: &PgPool, author: &User, data: &RatingAdd) -> Result<Rating, AppError> {
    let recipe = Recipe::find_by_id(db, data.recipe_id)
        .await?
        .ok_or(AppError::NotFound(RECIPE_NOT_FOUND))?;
    if recipe.author_id == author.user_id {
        return Err(AppError::Forbidden(SELF_RATING));
    }

    let rating = sqlx::query_as::<_, Rating>(
        r#"
        INSERT INTO ratings (author_id, recipe_id, rating)
        VALUES ($1, $2, $3)
        RETURNING rating_id, author_id, recipe_id, rating
        "#,
    )
    .bind(author.user_id)
    .bind(data.recipe_id)
    .bind(data.rating)
    .fetch_one(db)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Forbidden(ALREADY_RATED)
        } else {
            e.into()
        }
    })?;

    info!(
        rating_id = rating.rating_id,
        author_id = author.user_id,
        recipe_id = data.recipe_id,
        "rating created"
    );
    Ok(rating)
}
