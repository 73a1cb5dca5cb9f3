use serde::{Deserialize, Serialize};
use time::Date;

use super::repo::{Role, User};

/// Request body for registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(with = "crate::iso_date")]
    pub date_of_birth: Date,
    pub description: Option<String>,
    pub plain_text_password: String,
}

/// Form body for POST /auth/token.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

/// Public view of a user, returned everywhere outside the admin surface.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(with = "crate::iso_date")]
    pub date_of_birth: Date,
    pub description: Option<String>,
    pub role: Role,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            user_id: u.user_id,
            username: u.username,
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
            date_of_birth: u.date_of_birth,
            description: u.description,
            role: u.role,
        }
    }
}

/// Full record for admin reads, stored hash included.
#[derive(Debug, Serialize)]
pub struct AdminUserResponse {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub hashed_password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(with = "crate::iso_date")]
    pub date_of_birth: Date,
    #[serde(with = "crate::iso_date")]
    pub create_date: Date,
    pub description: Option<String>,
    pub role: Role,
}

impl From<User> for AdminUserResponse {
    fn from(u: User) -> Self {
        Self {
            user_id: u.user_id,
            username: u.username,
            email: u.email,
            hashed_password: u.hashed_password,
            first_name: u.first_name,
            last_name: u.last_name,
            date_of_birth: u.date_of_birth,
            create_date: u.create_date,
            description: u.description,
            role: u.role,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_response_has_the_registration_fields() {
        let res = UserResponse {
            user_id: 2,
            username: "alice".into(),
            email: "alice@example.com".into(),
            first_name: "Alice".into(),
            last_name: "Smith".into(),
            date_of_birth: time::macros::date!(1990 - 01 - 01),
            description: Some("Home cook".into()),
            role: Role::User,
        };
        let json: serde_json::Value = serde_json::to_value(&res).unwrap();
        assert_eq!(json["user_id"], 2);
        assert_eq!(json["username"], "alice");
        assert_eq!(json["role"], "user");
        assert_eq!(json["date_of_birth"], "1990-01-01");
        assert!(json.get("hashed_password").is_none());
    }

    #[test]
    fn register_request_accepts_a_null_description() {
        let payload: RegisterRequest = serde_json::from_value(serde_json::json!({
            "username": "bob",
            "email": "bob@example.com",
            "first_name": "Bob",
            "last_name": "Jones",
            "date_of_birth": "1985-06-15",
            "description": null,
            "plain_text_password": "password",
        }))
        .unwrap();
        assert_eq!(payload.username, "bob");
        assert!(payload.description.is_none());
    }
}
