// Caller identity from trusted gateway headers. Token validation happens at
// the edge; the service only reads the resolved identity.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::ApiError;
use crate::models::{AuthedUser, Role};

pub(super) const HEADER_USER_ID: &str = "x-auth-user-id";
pub(super) const HEADER_USERNAME: &str = "x-auth-username";
pub(super) const HEADER_ROLE: &str = "x-auth-role";

impl<S> FromRequestParts<S> for AuthedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
        };

        let user_id = header(HEADER_USER_ID).and_then(|raw| raw.parse::<i64>().ok());
        let username = header(HEADER_USERNAME);
        let role = header(HEADER_ROLE).and_then(Role::parse);

        match (user_id, username, role) {
            (Some(user_id), Some(username), Some(role)) => Ok(AuthedUser {
                user_id,
                username: username.to_string(),
                role,
            }),
            _ => Err(ApiError::Unauthorized("authentication required".to_string())),
        }
    }
}
