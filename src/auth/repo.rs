use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::Date;

use super::password::verify_password;
use crate::error::{is_unique_violation, AppError};

/// Coarse permission tier stored as an integer column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[repr(i32)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User = 0,
    Admin = 1,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub first_name: String,
    pub last_name: String,
    pub description: Option<String>,
    #[serde(with = "crate::iso_date")]
    pub date_of_birth: Date,
    #[serde(with = "crate::iso_date")]
    pub create_date: Date,
    pub role: Role,
}

pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub hashed_password: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub date_of_birth: Date,
    pub description: Option<&'a str>,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct UserUpdate {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default, with = "crate::iso_date::option")]
    pub date_of_birth: Option<Date>,
    #[serde(default)]
    pub description: Option<String>,
}

impl User {
    pub async fn find_by_username(db: &PgPool, username: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, username, email, hashed_password, first_name, last_name,
                   description, date_of_birth, create_date, role
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, user_id: i64) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, username, email, hashed_password, first_name, last_name,
                   description, date_of_birth, create_date, role
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// The `users.username` UNIQUE constraint is the backstop for the
    /// taken-username pre-check at the register handler; a race between
    /// two identical registrations fails with the same 400 rather than
    /// a 500.
    pub async fn create(db: &PgPool, data: NewUser<'_>) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users
                (username, email, hashed_password, first_name, last_name,
                 description, date_of_birth, role)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING user_id, username, email, hashed_password, first_name, last_name,
                      description, date_of_birth, create_date, role
            "#,
        )
        .bind(data.username)
        .bind(data.email)
        .bind(data.hashed_password)
        .bind(data.first_name)
        .bind(data.last_name)
        .bind(data.description)
        .bind(data.date_of_birth)
        .bind(data.role)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::BadRequest("Username taken.")
            } else {
                e.into()
            }
        })?;
        Ok(user)
    }

    /// Partial update: absent fields keep their stored value.
    pub async fn update(
        db: &PgPool,
        user_id: i64,
        data: &UserUpdate,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                username      = COALESCE($2, username),
                email         = COALESCE($3, email),
                first_name    = COALESCE($4, first_name),
                last_name     = COALESCE($5, last_name),
                date_of_birth = COALESCE($6, date_of_birth),
                description   = COALESCE($7, description)
            WHERE user_id = $1
            RETURNING user_id, username, email, hashed_password, first_name, last_name,
                      description, date_of_birth, create_date, role
            "#,
        )
        .bind(user_id)
        .bind(data.username.as_deref())
        .bind(data.email.as_deref())
        .bind(data.first_name.as_deref())
        .bind(data.last_name.as_deref())
        .bind(data.date_of_birth)
        .bind(data.description.as_deref())
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Returns whether a row was actually removed. Owned recipes and all
    /// association rows go with it via `ON DELETE CASCADE`.
    pub async fn delete(db: &PgPool, user_id: i64) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id)
            .execute(db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    pub async fn all(db: &PgPool) -> anyhow::Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, username, email, hashed_password, first_name, last_name,
                   description, date_of_birth, create_date, role
            FROM users
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(users)
    }

    /// Username/password check. Fails closed: an unknown username, a
    /// mismatched password and an unreadable stored hash all come back as
    /// `None`, never as distinct errors.
    pub async fn authenticate(
        db: &PgPool,
        username: &str,
        password: &str,
    ) -> anyhow::Result<Option<User>> {
        let Some(user) = Self::find_by_username(db, username).await? else {
            return Ok(None);
        };
        match verify_password(password, &user.hashed_password) {
            Ok(true) => Ok(Some(user)),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
    }

    #[test]
    fn user_json_never_contains_the_password_hash() {
        let user = User {
            user_id: 1,
            username: "alice".into(),
            email: "alice@example.com".into(),
            hashed_password: "$argon2id$secret".into(),
            first_name: "Alice".into(),
            last_name: "Smith".into(),
            description: None,
            date_of_birth: time::macros::date!(1990 - 01 - 01),
            create_date: time::macros::date!(2024 - 07 - 09),
            role: Role::User,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(!json.contains("hashed_password"));
        assert!(json.contains("alice"));
    }
}
