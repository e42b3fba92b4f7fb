use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use neurocare_types::{Role, User};

use crate::password;

/// Claims carried by every session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub iat: u64,
    pub exp: u64,
}

/// The caller behind a validated token.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            role: claims.role,
        }
    }
}

pub struct AuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_ttl: Duration,
    hash_iterations: u32,
}

impl AuthService {
    pub fn new(secret: &str, token_ttl_hours: i64, hash_iterations: u32) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            token_ttl: Duration::hours(token_ttl_hours),
            hash_iterations,
        }
    }

    pub fn issue_token(&self, user: &User) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp().max(0) as u64,
            exp: (now + self.token_ttl).timestamp().max(0) as u64,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to sign token for user {}: {:?}", user.id, e);
            AuthError::TokenCreation
        })
    }

    pub fn validate_token(&self, token: &str) -> Result<AuthUser, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            tracing::warn!("Token validation failed: {:?}", e.kind());
            AuthError::from(e)
        })?;
        Ok(data.claims.into())
    }

    /// PBKDF2 runs on the blocking pool, off the runtime workers.
    pub async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let password = password.to_owned();
        let iterations = self.hash_iterations;
        tokio::task::spawn_blocking(move || password::hash_password(&password, iterations))
            .await
            .map_err(|e| {
                tracing::error!("Password hashing task failed: {}", e);
                AuthError::PasswordHashing
            })
    }

    pub async fn verify_password(&self, password: &str, stored: &str) -> Result<bool, AuthError> {
        let (password, stored) = (password.to_owned(), stored.to_owned());
        tokio::task::spawn_blocking(move || password::verify_password(&password, &stored))
            .await
            .map_err(|e| {
                tracing::error!("Password verification task failed: {}", e);
                AuthError::PasswordHashing
            })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("No token provided")]
    MissingToken,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Failed to create token")]
    TokenCreation,
    #[error("Failed to process password")]
    PasswordHashing,
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            email: "someone@example.com".to_string(),
            full_name: Some("Someone".to_string()),
            role,
            created_at: Utc::now().to_rfc3339(),
        }
    }

    fn test_service() -> AuthService {
        AuthService::new("test-secret", 24, 1_000)
    }

    #[test]
    fn test_issued_token_round_trips() {
        let service = test_service();
        let user = test_user(Role::Doctor);

        let token = service.issue_token(&user).unwrap();
        let auth_user = service.validate_token(&token).unwrap();

        assert_eq!(auth_user.id, user.id);
        assert_eq!(auth_user.email, user.email);
        assert_eq!(auth_user.role, Role::Doctor);
    }

    #[test]
    fn test_invalid_token_validation() {
        let service = test_service();

        let result = service.validate_token("invalid-token");
        assert!(matches!(result.unwrap_err(), AuthError::InvalidToken));
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() {
        let other = AuthService::new("another-secret", 24, 1_000);
        let token = other.issue_token(&test_user(Role::Admin)).unwrap();

        let result = test_service().validate_token(&token);
        assert!(matches!(result.unwrap_err(), AuthError::InvalidToken));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let service = test_service();
        let issued = (Utc::now() - Duration::hours(3)).timestamp() as u64;
        let claims = Claims {
            sub: Uuid::new_v4(),
            email: "old@example.com".to_string(),
            role: Role::Patient,
            iat: issued,
            exp: issued + 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        let result = service.validate_token(&token);
        assert!(matches!(result.unwrap_err(), AuthError::TokenExpired));
    }

    #[tokio::test]
    async fn test_password_helpers_use_configured_iterations() {
        let service = test_service();
        let stored = service.hash_password("hunter22").await.unwrap();
        assert!(stored.starts_with("pbkdf2-sha256$1000$"));
        assert!(service.verify_password("hunter22", &stored).await.unwrap());
        assert!(!service.verify_password("hunter23", &stored).await.unwrap());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_hashing_leaves_runtime_responsive() {
        let service = AuthService::new("test-secret", 24, 200_000);
        let hashing = service.hash_password("hunter22");
        let ticker = async {
            let mut ticks = 0;
            while ticks < 3 {
                tokio::task::yield_now().await;
                ticks += 1;
            }
            ticks
        };

        // On a single-threaded runtime the ticker only finishes first when
        // the hash runs elsewhere.
        tokio::pin!(hashing);
        let ticks = tokio::select! {
            biased;
            stored = &mut hashing => panic!("hash finished before the ticker: {stored:?}"),
            ticks = ticker => ticks,
        };
        assert_eq!(ticks, 3);
        assert!(hashing.await.unwrap().starts_with("pbkdf2-sha256$200000$"));
    }
}
