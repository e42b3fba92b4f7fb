use std::sync::{Arc, LazyLock};

use regex::Regex;
use warp::Filter;
use warp::filters::BoxedFilter;
use warp::http::StatusCode;
use warp::reply::{Reply, Response};

use neurocare_persistence::{NewUser, is_unique_violation};
use neurocare_types::{AuthResponse, LoginRequest, Role, SignupRequest, User};

use crate::AppContext;
use crate::auth::AuthUser;
use crate::error::{ApiError, respond};
use crate::filters::{authenticated, json_body, with_ctx};

pub const MIN_PASSWORD_LENGTH: usize = 6;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
});

pub fn routes(ctx: Arc<AppContext>) -> BoxedFilter<(Response,)> {
    let signup = warp::path!("api" / "auth" / "signup")
        .and(warp::post())
        .and(with_ctx(ctx.clone()))
        .and(json_body::<SignupRequest>())
        .then(handle_signup)
        .map(respond);

    let login = warp::path!("api" / "auth" / "login")
        .and(warp::post())
        .and(with_ctx(ctx.clone()))
        .and(json_body::<LoginRequest>())
        .then(handle_login)
        .map(respond);

    let me = warp::path!("api" / "auth" / "me")
        .and(warp::get())
        .and(with_ctx(ctx.clone()))
        .and(authenticated(ctx))
        .then(handle_me)
        .map(respond);

    signup.or(login).unify().or(me).unify().boxed()
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

fn session(ctx: &AppContext, message: &str, user: User) -> Result<AuthResponse, ApiError> {
    let token = ctx.auth.issue_token(&user)?;
    Ok(AuthResponse {
        message: message.to_string(),
        token,
        user,
    })
}

async fn handle_signup(ctx: Arc<AppContext>, request: SignupRequest) -> Result<impl Reply, ApiError> {
    let email = normalize_email(&request.email);
    if !is_valid_email(&email) {
        return Err(ApiError::bad_request("Valid email is required"));
    }
    if request.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    // Caregiver and admin accounts are provisioned by an administrator.
    let role = request.role.unwrap_or(Role::Patient);
    if !matches!(role, Role::Patient | Role::Doctor) {
        return Err(ApiError::bad_request("Invalid role"));
    }

    if ctx.users.find_by_email(&email).await?.is_some() {
        return Err(ApiError::bad_request("Email already registered"));
    }

    let full_name = request
        .full_name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty());
    let password_hash = ctx.auth.hash_password(&request.password).await?;
    let user = ctx
        .users
        .create_user(NewUser {
            email,
            password_hash,
            full_name,
            role,
        })
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                ApiError::bad_request("Email already registered")
            } else {
                err.into()
            }
        })?;
    tracing::info!("Registered {} account {}", user.role, user.id);

    let response = session(&ctx, "User created successfully", user)?;
    Ok(warp::reply::with_status(
        warp::reply::json(&response),
        StatusCode::CREATED,
    ))
}

async fn handle_login(ctx: Arc<AppContext>, request: LoginRequest) -> Result<impl Reply, ApiError> {
    let email = normalize_email(&request.email);
    let invalid = || ApiError::Unauthorized("Invalid credentials".to_string());

    let Some(credentials) = ctx.users.find_credentials(&email).await? else {
        tracing::warn!("Login attempt for unknown account");
        return Err(invalid());
    };
    if !ctx
        .auth
        .verify_password(&request.password, &credentials.password_hash)
        .await?
    {
        tracing::warn!("Wrong password for user {}", credentials.user.id);
        return Err(invalid());
    }

    let response = session(&ctx, "Login successful", credentials.user)?;
    Ok(warp::reply::json(&response))
}

async fn handle_me(ctx: Arc<AppContext>, user: AuthUser) -> Result<impl Reply, ApiError> {
    let profile = ctx
        .users
        .find_by_id(user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(warp::reply::json(&profile))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("doctor@clinic.org"));
        assert!(is_valid_email("a.b+c@sub.example.co"));
        assert!(!is_valid_email("no-at-sign.org"));
        assert!(!is_valid_email("two words@example.com"));
        assert!(!is_valid_email("missing@tld"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Jane.Doe@Example.COM "), "jane.doe@example.com");
    }
}
