use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Form, Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use super::{
    dto::{
        AdminUserResponse, LoginForm, RegisterRequest, SuccessResponse, TokenResponse,
        UserResponse,
    },
    extractors::{AdminUser, CurrentUser},
    jwt::JwtKeys,
    password::hash_password,
    repo::{NewUser, Role, User, UserUpdate},
    social,
};
use crate::{error::AppError, state::AppState};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/token", post(login))
        .route("/auth/me", get(me))
        .route("/auth/update", put(update_user))
        .route("/auth/follow/:user_id", post(follow_user))
        .route("/auth/unfollow/:user_id", post(unfollow_user))
        .route("/auth/followers/:user_id", get(list_followers))
        .route("/auth/followed/:user_id", get(list_followed))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/delete/:user_id", delete(delete_user))
        .route("/auth/get/user/:user_id", get(get_user))
        .route("/auth/get/users", get(get_users))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(AppError::BadRequest("Invalid email"));
    }
    if payload.plain_text_password.len() < 8 {
        warn!("password too short");
        return Err(AppError::BadRequest("Password too short"));
    }
    if User::find_by_username(&state.db, &payload.username)
        .await?
        .is_some()
    {
        warn!(username = %payload.username, "username taken");
        return Err(AppError::BadRequest("Username taken."));
    }

    let hashed_password = hash_password(&payload.plain_text_password)?;
    let user = User::create(
        &state.db,
        NewUser {
            username: &payload.username,
            email: &payload.email,
            hashed_password: &hashed_password,
            first_name: &payload.first_name,
            last_name: &payload.last_name,
            date_of_birth: payload.date_of_birth,
            description: payload.description.as_deref(),
            role: Role::User,
        },
    )
    .await?;

    info!(user_id = user.user_id, username = %user.username, "user registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, form))]
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Json<TokenResponse>, AppError> {
    let Some(user) = User::authenticate(&state.db, &form.username, &form.password).await? else {
        warn!(username = %form.username, "failed login");
        return Err(AppError::Unauthorized("Incorrect username or password"));
    };

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign(&user.username)?;

    info!(user_id = user.user_id, username = %user.username, "user logged in");
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".into(),
    }))
}

#[instrument(skip(user))]
pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(user.into())
}

#[instrument(skip(state, user, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<UserUpdate>,
) -> Result<Json<UserResponse>, AppError> {
    let updated = User::update(&state.db, user.user_id, &payload)
        .await?
        .ok_or(AppError::NotFound(
            "User with the given ID was not found in the DB.",
        ))?;
    info!(user_id = updated.user_id, "profile updated");
    Ok(Json(updated.into()))
}

#[instrument(skip(state, user))]
pub async fn follow_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(user_id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    social::follow(&state.db, &user, user_id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

#[instrument(skip(state, user))]
pub async fn unfollow_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(user_id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    social::unfollow(&state.db, &user, user_id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

#[instrument(skip(state))]
pub async fn list_followers(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = social::followers(&state.db, user_id).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[instrument(skip(state))]
pub async fn list_followed(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = social::followed(&state.db, user_id).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

// --- admin surface ---

#[instrument(skip(state, _admin))]
pub async fn delete_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(user_id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    let deleted = User::delete(&state.db, user_id).await?;
    if deleted {
        info!(user_id, "user deleted");
    }
    Ok(Json(SuccessResponse { success: deleted }))
}

#[instrument(skip(state, _admin))]
pub async fn get_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(user_id): Path<i64>,
) -> Result<Json<AdminUserResponse>, AppError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or(AppError::NotFound(
            "User with the given ID was not found in the DB.",
        ))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, _admin))]
pub async fn get_users(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<AdminUserResponse>>, AppError> {
    let users = User::all(&state.db).await?;
    Ok(Json(users.into_iter().map(AdminUserResponse::from).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        assert!(is_valid_email("alice@example.com"));
        assert!(is_valid_email("a.b+c@sub.domain.org"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(!is_valid_email("alice"));
        assert!(!is_valid_email("alice@"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("alice@example"));
        assert!(!is_valid_email("al ice@example.com"));
    }
}
