use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use tracing::info;

use crate::auth::repo::User;
use crate::error::{is_unique_violation, AppError};

const TAG_NOT_FOUND: &str = "Tag with the given ID was not found in the DB.";
const USER_NOT_FOUND: &str = "User with the given ID was not found in the DB.";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tag {
    pub tag_id: i64,
    pub name: String,
}

impl Tag {
    pub async fn find_by_id(db: &PgPool, tag_id: i64) -> anyhow::Result<Option<Tag>> {
        let tag = sqlx::query_as::<_, Tag>("SELECT tag_id, name FROM tags WHERE tag_id = $1")
            .bind(tag_id)
            .fetch_optional(db)
            .await?;
        Ok(tag)
    }

    pub async fn create(db: &PgPool, name: &str) -> Result<Tag, AppError> {
        let tag = sqlx::query_as::<_, Tag>(
            "INSERT INTO tags (name) VALUES ($1) RETURNING tag_id, name",
        )
        .bind(name)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::BadRequest("Tag name taken.")
            } else {
                e.into()
            }
        })?;
        info!(tag_id = tag.tag_id, name = %tag.name, "tag created");
        Ok(tag)
    }

    pub async fn delete(db: &PgPool, tag_id: i64) -> Result<(), AppError> {
        let res = sqlx::query("DELETE FROM tags WHERE tag_id = $1")
            .bind(tag_id)
            .execute(db)
            .await?;
        if res.rows_affected() == 0 {
            return Err(AppError::NotFound(TAG_NOT_FOUND));
        }
        Ok(())
    }

    pub async fn list(db: &PgPool) -> Result<Vec<Tag>, AppError> {
        let tags = sqlx::query_as::<_, Tag>("SELECT tag_id, name FROM tags")
            .fetch_all(db)
            .await?;
        Ok(tags)
    }
}

async fn refreshed_user(db: &PgPool, user_id: i64) -> Result<User, AppError> {
    User::find_by_id(db, user_id)
        .await?
        .ok_or(AppError::NotFound(USER_NOT_FOUND))
}

/// Adds the tag to the user's subscription set and returns the refreshed
/// user. Idempotent: subscribing twice is a no-op, not an error (the
/// composite key plus `ON CONFLICT DO NOTHING` closes the duplicate-row
/// gap without changing the success surface).
pub async fn subscribe(db: &PgPool, user: &User, tag_id: i64) -> Result<User, AppError> {
    if Tag::find_by_id(db, tag_id).await?.is_none() {
        return Err(AppError::NotFound(TAG_NOT_FOUND));
    }
    sqlx::query("INSERT INTO user_tags (user_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
        .bind(user.user_id)
        .bind(tag_id)
        .execute(db)
        .await?;
    info!(user_id = user.user_id, tag_id, "tag subscribed");
    refreshed_user(db, user.user_id).await
}

pub async fn unsubscribe(db: &PgPool, user: &User, tag_id: i64) -> Result<User, AppError> {
    if Tag::find_by_id(db, tag_id).await?.is_none() {
        return Err(AppError::NotFound(TAG_NOT_FOUND));
    }
    let res = sqlx::query("DELETE FROM user_tags WHERE user_id = $1 AND tag_id = $2")
        .bind(user.user_id)
        .bind(tag_id)
        .execute(db)
        .await?;
    if res.rows_affected() == 0 {
        return Err(AppError::Forbidden("The tag is not in the user's list."));
    }
    info!(user_id = user.user_id, tag_id, "tag unsubscribed");
    refreshed_user(db, user.user_id).await
}

pub async fn subscriptions(db: &PgPool, user_id: i64) -> Result<Vec<Tag>, AppError> {
    let tags = sqlx::query_as::<_, Tag>(
        r#"
        SELECT t.tag_id, t.name
        FROM tags t
        JOIN user_tags ut ON ut.tag_id = t.tag_id
        WHERE ut.user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(tags)
}
