//! Authentication extractors.
//!
//! [`AuthUser`] resolves the external JWT identity to the internal
//! user row (creating or refreshing it, so a user exists after their
//! first authenticated request). [`MaybeAuthUser`] does the same but
//! treats a missing or invalid token as an anonymous viewer.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use reelhouse_core::error::CoreError;
use reelhouse_core::types::DbId;
use reelhouse_db::models::user::Identity;
use reelhouse_db::repositories::UserRepo;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user extracted from a JWT Bearer token, resolved to
/// the internal database id.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user's internal database id.
    pub user_id: DbId,
    /// The auth provider's user id (from `claims.sub`).
    pub external_id: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        let claims = validate_token(token, &state.config.jwt).map_err(|_| {
            AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
        })?;

        // Upsert keeps name and avatar in sync with the provider.
        let user = UserRepo::ensure(
            &state.pool,
            &Identity {
                external_id: claims.sub.clone(),
                name: claims.name,
                image_url: claims.image_url,
            },
        )
        .await?;

        Ok(AuthUser {
            user_id: user.id,
            external_id: claims.sub,
        })
    }
}

/// Optional authentication for endpoints that also serve anonymous
/// viewers. Resolves to `None` rather than rejecting, and never
/// creates a user row.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<DbId>);

impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "));

        let Some(token) = token else {
            return Ok(MaybeAuthUser(None));
        };
        let Ok(claims) = validate_token(token, &state.config.jwt) else {
            return Ok(MaybeAuthUser(None));
        };

        let viewer = UserRepo::resolve_id(&state.pool, &claims.sub).await?;
        Ok(MaybeAuthUser(viewer))
    }
}
