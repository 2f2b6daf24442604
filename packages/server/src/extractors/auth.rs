use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt;

/// Permission required for every moderation endpoint.
pub const MODERATE_PERMISSION: &str = "slide:moderate";

/// Moderator extracted from the `Authorization: Bearer <token>` header.
///
/// Add this as a handler parameter to require a token carrying
/// [`MODERATE_PERMISSION`].
#[derive(Debug)]
pub struct Moderator {
    pub subject: String,
}

impl FromRequestParts<AppState> for Moderator {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::TokenMissing)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AppError::TokenInvalid)?;

        let claims = jwt::verify(token, &state.config.auth.jwt_secret)
            .map_err(|_| AppError::TokenInvalid)?;

        if !claims.permissions.iter().any(|p| p == MODERATE_PERMISSION) {
            return Err(AppError::PermissionDenied);
        }

        Ok(Moderator {
            subject: claims.sub,
        })
    }
}
