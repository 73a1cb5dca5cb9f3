//! Follow graph: one directed edge table, queried from both ends. The
//! composite primary key on `user_follows` is the authoritative guard
//! against duplicate edges; the pre-checks below only exist to turn a
//! violation into a useful error message.

use sqlx::PgPool;
use tracing::info;

use super::repo::User;
use crate::error::{is_unique_violation, AppError};

const USER_NOT_FOUND: &str = "User with the given ID was not found in the DB.";
const SELF_FOLLOW: &str = "Users can't follow themselves.";
const ALREADY_FOLLOWS: &str = "The first user already follows the second one.";
const NOT_FOLLOWED: &str = "The user was not followed.";

async fn edge_exists(db: &PgPool, follower_id: i64, followed_id: i64) -> anyhow::Result<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM user_follows WHERE follower_id = $1 AND followed_id = $2)",
    )
    .bind(follower_id)
    .bind(followed_id)
    .fetch_one(db)
    .await?;
    Ok(exists)
}

pub async fn follow(db: &PgPool, follower: &User, followed_id: i64) -> Result<(), AppError> {
    if follower.user_id == followed_id {
        return Err(AppError::Forbidden(SELF_FOLLOW));
    }
    if User::find_by_id(db, followed_id).await?.is_none() {
        return Err(AppError::NotFound(USER_NOT_FOUND));
    }
    if edge_exists(db, follower.user_id, followed_id).await? {
        return Err(AppError::Forbidden(ALREADY_FOLLOWS));
    }

    sqlx::query("INSERT INTO user_follows (follower_id, followed_id) VALUES ($1, $2)")
        .bind(follower.user_id)
        .bind(followed_id)
        .execute(db)
        .await
        .map_err(|e| {
            // Lost a race against a concurrent identical follow.
            if is_unique_violation(&e) {
                AppError::Forbidden(ALREADY_FOLLOWS)
            } else {
                e.into()
            }
        })?;

    info!(
        follower_id = follower.user_id,
        followed_id, "follow edge created"
    );
    Ok(())
}

pub async fn unfollow(db: &PgPool, follower: &User, followed_id: i64) -> Result<(), AppError> {
    if follower.user_id == followed_id {
        return Err(AppError::Forbidden(SELF_FOLLOW));
    }
    if User::find_by_id(db, followed_id).await?.is_none() {
        return Err(AppError::NotFound(USER_NOT_FOUND));
    }

    let res = sqlx::query("DELETE FROM user_follows WHERE follower_id = $1 AND followed_id = $2")
        .bind(follower.user_id)
        .bind(followed_id)
        .execute(db)
        .await?;
    if res.rows_affected() == 0 {
        return Err(AppError::Forbidden(NOT_FOLLOWED));
    }

    info!(
        follower_id = follower.user_id,
        followed_id, "follow edge removed"
    );
    Ok(())
}

/// Everyone with an edge pointing at `user_id`. Public read; no ordering
/// guarantee beyond whatever the store iterates.
pub async fn followers(db: &PgPool, user_id: i64) -> Result<Vec<User>, AppError> {
    if User::find_by_id(db, user_id).await?.is_none() {
        return Err(AppError::NotFound(USER_NOT_FOUND));
    }
    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT u.user_id, u.username, u.email, u.hashed_password, u.first_name, u.last_name,
               u.description, u.date_of_birth, u.create_date, u.role
        FROM users u
        JOIN user_follows f ON f.follower_id = u.user_id
        WHERE f.followed_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(users)
}

/// Everyone `user_id` has an edge pointing at.
pub async fn followed(db: &PgPool, user_id: i64) -> Result<Vec<User>, AppError> {
    if User::find_by_id(db, user_id).await?.is_none() {
        return Err(AppError::NotFound(USER_NOT_FOUND));
    }
    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT u.user_id, u.username, u.email, u.hashed_password, u.first_name, u.last_name,
               u.description, u.date_of_birth, u.create_date, u.role
        FROM users u
        JOIN user_follows f ON f.followed_id = u.user_id
        WHERE f.follower_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(users)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo::Role;
    use crate::state::AppState;

    fn user(id: i64) -> User {
        User {
            user_id: id,
            username: format!("user{id}"),
            email: format!("user{id}@example.com"),
            hashed_password: String::new(),
            first_name: "First".into(),
            last_name: "Last".into(),
            description: None,
            date_of_birth: time::macros::date!(1990 - 01 - 01),
            create_date: time::macros::date!(2024 - 07 - 09),
            role: Role::User,
        }
    }

    // The self-loop check fires before any query, so the lazy pool from
    // AppState::fake() never actually connects.

    #[tokio::test]
    async fn self_follow_is_forbidden_regardless_of_store_state() {
        let state = AppState::fake();
        let alice = user(2);
        let err = follow(&state.db, &alice, 2).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(SELF_FOLLOW)));
    }

    #[tokio::test]
    async fn self_unfollow_is_forbidden_regardless_of_store_state() {
        let state = AppState::fake();
        let alice = user(2);
        let err = unfollow(&state.db, &alice, 2).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(SELF_FOLLOW)));
    }
}
