use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};
use tracing::warn;

use super::{
    jwt::JwtKeys,
    repo::{Role, User},
};
use crate::{error::AppError, state::AppState};

/// Uniform rejection for every identity failure: missing header, bad
/// scheme, bad signature, token naming a user that no longer exists.
const CREDENTIALS_DETAIL: &str = "Could not validate credentials";

pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Role gate. Insufficient privilege is reported as 401, the same as
/// missing authentication; call sites never distinguish the two.
pub fn require_role(user: &User, allowed_roles: &[Role]) -> Result<(), AppError> {
    if allowed_roles.contains(&user.role) {
        Ok(())
    } else {
        Err(AppError::Unauthorized("You don't have enough permissions"))
    }
}

/// Resolves the bearer token to a live user record.
#[derive(Debug)]
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token =
            bearer_token(&parts.headers).ok_or(AppError::Unauthorized(CREDENTIALS_DETAIL))?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|_| {
            warn!("invalid bearer token");
            AppError::Unauthorized(CREDENTIALS_DETAIL)
        })?;

        let user = User::find_by_username(&state.db, &claims.sub)
            .await?
            .ok_or(AppError::Unauthorized(CREDENTIALS_DETAIL))?;

        Ok(CurrentUser(user))
    }
}

/// `CurrentUser` plus an admin role check.
#[derive(Debug)]
pub struct AdminUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        require_role(&user, &[Role::Admin])?;
        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn user_with_role(role: Role) -> User {
        User {
            user_id: 1,
            username: "alice".into(),
            email: "alice@example.com".into(),
            hashed_password: String::new(),
            first_name: "Alice".into(),
            last_name: "Smith".into(),
            description: None,
            date_of_birth: time::macros::date!(1990 - 01 - 01),
            create_date: time::macros::date!(2024 - 07 - 09),
            role,
        }
    }

    #[test]
    fn bearer_token_extracts_the_token() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc.def.ghi"),
        );
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn bearer_token_rejects_other_schemes_and_absence() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Basic dXNlcjpwdw=="),
        );
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn require_role_accepts_a_listed_role() {
        let user = user_with_role(Role::User);
        assert!(require_role(&user, &[Role::User, Role::Admin]).is_ok());
    }

    #[test]
    fn require_role_rejects_with_unauthorized() {
        let user = user_with_role(Role::User);
        let err = require_role(&user, &[Role::Admin]).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
