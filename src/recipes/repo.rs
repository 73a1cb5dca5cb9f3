use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::Date;
use tracing::info;

use super::dto::{RecipeAdd, RecipeResponse};
use crate::auth::repo::User;
use crate::error::{is_unique_violation, AppError};
use crate::tags::repo::Tag;

pub const RECIPE_NOT_FOUND: &str = "Recipe with the given ID was not found in the DB.";
const TAG_NOT_FOUND: &str = "Tag with the given ID was not found in the DB.";
const USER_NOT_FOUND: &str = "User with the given ID was not found in the DB.";
const ALREADY_SAVED: &str = "The recipe is already saved.";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Recipe {
    pub recipe_id: i64,
    pub author_id: i64,
    #[serde(with = "crate::iso_date")]
    pub create_date: Date,
    pub servings: i32,
    pub prep_time: i32,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Ingredient {
    pub ingredient_id: i64,
    pub recipe_id: i64,
    pub ingredient: String,
    pub amount: f64,
    pub unit_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Instruction {
    pub instruction_id: i64,
    pub recipe_id: i64,
    pub text: String,
    pub step_order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NutritionInfo {
    pub nutrition_info_id: i64,
    pub recipe_id: i64,
    pub calories: i32,
    pub protein: i32,
    pub carbohydrates: i32,
    pub sugar: i32,
    pub fiber: i32,
    pub fat: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Unit {
    pub unit_id: i64,
    pub unit: String,
    pub liquid: bool,
}

impl Unit {
    pub async fn create(db: &PgPool, unit: &str, liquid: bool) -> Result<Unit, AppError> {
        let row = sqlx::query_as::<_, Unit>(
            "INSERT INTO units (unit, liquid) VALUES ($1, $2) RETURNING unit_id, unit, liquid",
        )
        .bind(unit)
        .bind(liquid)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn list(db: &PgPool) -> Result<Vec<Unit>, AppError> {
        let rows = sqlx::query_as::<_, Unit>("SELECT unit_id, unit, liquid FROM units")
            .fetch_all(db)
            .await?;
        Ok(rows)
    }
}

impl Recipe {
    pub async fn find_by_id(db: &PgPool, recipe_id: i64) -> anyhow::Result<Option<Recipe>> {
        let recipe = sqlx::query_as::<_, Recipe>(
            r#"
            SELECT recipe_id, author_id, create_date, servings, prep_time, description
            FROM recipes
            WHERE recipe_id = $1
            "#,
        )
        .bind(recipe_id)
        .fetch_optional(db)
        .await?;
        Ok(recipe)
    }

    pub async fn delete(db: &PgPool, recipe_id: i64) -> Result<(), AppError> {
        let res = sqlx::query("DELETE FROM recipes WHERE recipe_id = $1")
            .bind(recipe_id)
            .execute(db)
            .await?;
        if res.rows_affected() == 0 {
            return Err(AppError::NotFound(RECIPE_NOT_FOUND));
        }
        info!(recipe_id, "recipe deleted");
        Ok(())
    }
}

/// Inserts the recipe together with its ingredients, instructions,
/// nutrition info and tag links in one transaction: either the whole
/// recipe lands or none of it does.
pub async fn create(
    db: &PgPool,
    author_id: i64,
    data: &RecipeAdd,
) -> Result<RecipeResponse, AppError> {
    let mut tx = db.begin().await?;

    let recipe = sqlx::query_as::<_, Recipe>(
        r#"
        INSERT INTO recipes (author_id, servings, prep_time, description)
        VALUES ($1, $2, $3, $4)
        RETURNING recipe_id, author_id, create_date, servings, prep_time, description
        "#,
    )
    .bind(author_id)
    .bind(data.servings)
    .bind(data.prep_time)
    .bind(&data.description)
    .fetch_one(&mut *tx)
    .await?;

    for ingredient in &data.ingredients {
        sqlx::query(
            "INSERT INTO ingredients (recipe_id, ingredient, amount, unit_id) VALUES ($1, $2, $3, $4)",
        )
        .bind(recipe.recipe_id)
        .bind(&ingredient.ingredient)
        .bind(ingredient.amount)
        .bind(ingredient.unit_id)
        .execute(&mut *tx)
        .await?;
    }

    for instruction in &data.instructions {
        sqlx::query("INSERT INTO instructions (recipe_id, text, step_order) VALUES ($1, $2, $3)")
            .bind(recipe.recipe_id)
            .bind(&instruction.text)
            .bind(instruction.step_order)
            .execute(&mut *tx)
            .await?;
    }

    sqlx::query(
        r#"
        INSERT INTO nutrition_infos (recipe_id, calories, protein, carbohydrates, sugar, fiber, fat)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(recipe.recipe_id)
    .bind(data.nutrition_info.calories)
    .bind(data.nutrition_info.protein)
    .bind(data.nutrition_info.carbohydrates)
    .bind(data.nutrition_info.sugar)
    .bind(data.nutrition_info.fiber)
    .bind(data.nutrition_info.fat)
    .execute(&mut *tx)
    .await?;

    for tag_id in &data.tag_ids {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM tags WHERE tag_id = $1)")
            .bind(*tag_id)
            .fetch_one(&mut *tx)
            .await?;
        if !exists {
            // Dropping the transaction rolls everything back.
            return Err(AppError::NotFound(TAG_NOT_FOUND));
        }
        sqlx::query(
            "INSERT INTO recipe_tags (recipe_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(recipe.recipe_id)
        .bind(*tag_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    info!(recipe_id = recipe.recipe_id, author_id, "recipe created");

    fetch(db, recipe.recipe_id)
        .await?
        .ok_or(AppError::NotFound(RECIPE_NOT_FOUND))
}

/// Loads a recipe with all of its child rows.
pub async fn fetch(db: &PgPool, recipe_id: i64) -> Result<Option<RecipeResponse>, AppError> {
    let Some(recipe) = Recipe::find_by_id(db, recipe_id).await? else {
        return Ok(None);
    };

    let ingredients = sqlx::query_as::<_, Ingredient>(
        r#"
        SELECT ingredient_id, recipe_id, ingredient, amount, unit_id
        FROM ingredients
        WHERE recipe_id = $1
        ORDER BY ingredient_id
        "#,
    )
    .bind(recipe_id)
    .fetch_all(db)
    .await?;

    let instructions = sqlx::query_as::<_, Instruction>(
        r#"
        SELECT instruction_id, recipe_id, text, step_order
        FROM instructions
        WHERE recipe_id = $1
        ORDER BY step_order
        "#,
    )
    .bind(recipe_id)
    .fetch_all(db)
    .await?;

    let nutrition_info = sqlx::query_as::<_, NutritionInfo>(
        r#"
        SELECT nutrition_info_id, recipe_id, calories, protein, carbohydrates, sugar, fiber, fat
        FROM nutrition_infos
        WHERE recipe_id = $1
        "#,
    )
    .bind(recipe_id)
    .fetch_optional(db)
    .await?;

    let tags = sqlx::query_as::<_, Tag>(
        r#"
        SELECT t.tag_id, t.name
        FROM tags t
        JOIN recipe_tags rt ON rt.tag_id = t.tag_id
        WHERE rt.recipe_id = $1
        "#,
    )
    .bind(recipe_id)
    .fetch_all(db)
    .await?;

    Ok(Some(RecipeResponse {
        recipe_id: recipe.recipe_id,
        author_id: recipe.author_id,
        create_date: recipe.create_date,
        servings: recipe.servings,
        prep_time: recipe.prep_time,
        description: recipe.description,
        ingredients,
        instructions,
        nutrition_info,
        tags,
    }))
}

// --- saved-recipe list ---

pub async fn save(db: &PgPool, user: &User, recipe_id: i64) -> Result<(), AppError> {
    if Recipe::find_by_id(db, recipe_id).await?.is_none() {
        return Err(AppError::NotFound(RECIPE_NOT_FOUND));
    }

    let already: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM saved_recipes WHERE user_id = $1 AND recipe_id = $2)",
    )
    .bind(user.user_id)
    .bind(recipe_id)
    .fetch_one(db)
    .await?;
    if already {
        return Err(AppError::Forbidden(ALREADY_SAVED));
    }

    sqlx::query("INSERT INTO saved_recipes (user_id, recipe_id) VALUES ($1, $2)")
        .bind(user.user_id)
        .bind(recipe_id)
        .execute(db)
        .await
        .map_err(|e| {
            // Lost a race against a concurrent identical save.
            if is_unique_violation(&e) {
                AppError::Forbidden(ALREADY_SAVED)
            } else {
                e.into()
            }
        })?;

    info!(user_id = user.user_id, recipe_id, "recipe saved");
    Ok(())
}

/// Removes the recipe from the user's saved list and returns the
/// refreshed user. A never-saved recipe and a nonexistent one both come
/// back as 404; the messages differ, the status does not.
pub async fn unsave(db: &PgPool, user: &User, recipe_id: i64) -> Result<User, AppError> {
    if Recipe::find_by_id(db, recipe_id).await?.is_none() {
        return Err(AppError::NotFound(RECIPE_NOT_FOUND));
    }

    let res = sqlx::query("DELETE FROM saved_recipes WHERE user_id = $1 AND recipe_id = $2")
        .bind(user.user_id)
        .bind(recipe_id)
        .execute(db)
        .await?;
    if res.rows_affected() == 0 {
        return Err(AppError::NotFound(
            "The recipe is not in the user's saved list.",
        ));
    }

    info!(user_id = user.user_id, recipe_id, "recipe unsaved");
    User::find_by_id(db, user.user_id)
        .await?
        .ok_or(AppError::NotFound(USER_NOT_FOUND))
}

pub async fn saved_list(db: &PgPool, user_id: i64) -> Result<Vec<Recipe>, AppError> {
    let recipes = sqlx::query_as::<_, Recipe>(
        r#"
        SELECT r.recipe_id, r.author_id, r.create_date, r.servings, r.prep_time, r.description
        FROM recipes r
        JOIN saved_recipes sr ON sr.recipe_id = r.recipe_id
        WHERE sr.user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(recipes)
}
