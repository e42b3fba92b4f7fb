use std::convert::Infallible;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use warp::{Filter, Rejection};

use neurocare_core::{Permission, has_permission};
use neurocare_types::Role;

use crate::AppContext;
use crate::auth::{AuthError, AuthUser};
use crate::error::ApiError;

/// Largest JSON body any endpoint accepts.
pub const MAX_BODY_BYTES: u64 = 64 * 1024;

pub fn with_ctx(
    ctx: Arc<AppContext>,
) -> impl Filter<Extract = (Arc<AppContext>,), Error = Infallible> + Clone {
    warp::any().map(move || ctx.clone())
}

pub fn json_body<T>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone
where
    T: DeserializeOwned + Send,
{
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

/// Requires `Authorization: Bearer <token>` and yields the caller.
pub fn authenticated(
    ctx: Arc<AppContext>,
) -> impl Filter<Extract = (AuthUser,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization")
        .and(with_ctx(ctx))
        .and_then(|header: Option<String>, ctx: Arc<AppContext>| async move {
            let header = header.ok_or(ApiError::from(AuthError::MissingToken))?;
            let token = header
                .strip_prefix("Bearer ")
                .ok_or(ApiError::from(AuthError::MissingToken))?;
            ctx.auth
                .validate_token(token.trim())
                .map_err(|e| Rejection::from(ApiError::from(e)))
        })
}

/// Authenticated caller whose role is one of `roles`.
pub fn require_roles(
    ctx: Arc<AppContext>,
    roles: &'static [Role],
) -> impl Filter<Extract = (AuthUser,), Error = Rejection> + Clone {
    authenticated(ctx).and_then(move |user: AuthUser| async move {
        if roles.contains(&user.role) {
            Ok(user)
        } else {
            tracing::debug!("Role {} denied; requires one of {:?}", user.role, roles);
            Err(Rejection::from(ApiError::forbidden("Insufficient permissions")))
        }
    })
}

/// Authenticated caller whose role grants `permission`.
pub fn require_permission(
    ctx: Arc<AppContext>,
    permission: Permission,
) -> impl Filter<Extract = (AuthUser,), Error = Rejection> + Clone {
    authenticated(ctx).and_then(move |user: AuthUser| async move {
        if has_permission(user.role, permission) {
            Ok(user)
        } else {
            tracing::debug!("Role {} lacks permission {:?}", user.role, permission);
            Err(Rejection::from(ApiError::forbidden("Insufficient permissions")))
        }
    })
}
