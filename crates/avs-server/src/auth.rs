//! Password hashing and sign-in
//!
//! bcrypt is CPU-bound, so hashing and verification run on the blocking
//! pool rather than on the async executor.

use crate::error::{ApiError, ApiResult};
use avs_core::input::normalize_email;
use avs_core::{LoginInput, RegisterInput, Role, User};
use avs_store::{NewUser, Storage};
use tracing::{debug, info};

/// bcrypt work factor
pub const BCRYPT_COST: u32 = 10;

/// Hash a password
///
/// # Errors
/// Internal error if hashing fails or the blocking task panics
pub async fn hash_password(password: &str) -> ApiResult<String> {
    hash_password_with_cost(password, BCRYPT_COST).await
}

/// Hash a password with an explicit work factor
///
/// # Errors
/// Internal error if hashing fails or the blocking task panics
pub async fn hash_password_with_cost(password: &str, cost: u32) -> ApiResult<String> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(ApiError::internal)?
        .map_err(ApiError::internal)
}

/// Check a password against a stored hash; malformed hashes never match
///
/// # Errors
/// Internal error if the blocking task panics
pub async fn verify_password(password: &str, hash: &str) -> ApiResult<bool> {
    let password = password.to_owned();
    let hash = hash.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false))
        .await
        .map_err(ApiError::internal)
}

/// Resolve credentials to a user
///
/// # Errors
/// [`ApiError::InvalidCredentials`] for an unknown email or wrong password
pub async fn authenticate(storage: &dyn Storage, input: &LoginInput) -> ApiResult<User> {
    let email = normalize_email(&input.email);
    let Some(user) = storage.get_user_by_email(&email).await? else {
        debug!("Login for unknown email");
        return Err(ApiError::InvalidCredentials);
    };
    if !verify_password(&input.password, &user.password_hash).await? {
        debug!(user = %user.id, "Login with wrong password");
        return Err(ApiError::InvalidCredentials);
    }
    info!(user = %user.id, "User signed in");
    Ok(user)
}

/// Create an account; self-registration always yields a `USER`
///
/// # Errors
/// [`ApiError::UserExists`] when the email is taken
pub async fn register(storage: &dyn Storage, input: RegisterInput) -> ApiResult<User> {
    let email = normalize_email(&input.email);
    if storage.get_user_by_email(&email).await?.is_some() {
        return Err(ApiError::UserExists);
    }
    let password_hash = hash_password(&input.password).await?;
    let user = storage
        .create_user(NewUser {
            email,
            name: input.name.filter(|name| !name.trim().is_empty()),
            password_hash,
            role: Role::User,
        })
        .await?;
    info!(user = %user.id, "User registered");
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use avs_store::MemoryStorage;

    async fn storage_with(email: &str, password: &str) -> MemoryStorage {
        let storage = MemoryStorage::new();
        storage
            .create_user(NewUser {
                email: email.into(),
                name: None,
                password_hash: hash_password_with_cost(password, 4).await.unwrap(),
                role: Role::Admin,
            })
            .await
            .unwrap();
        storage
    }

    #[tokio::test]
    async fn hash_round_trip() {
        let hash = hash_password_with_cost("secret1", 4).await.unwrap();
        assert!(verify_password("secret1", &hash).await.unwrap());
        assert!(!verify_password("secret2", &hash).await.unwrap());
        assert!(!verify_password("secret1", "not-a-hash").await.unwrap());
    }

    #[tokio::test]
    async fn authenticate_checks_email_and_password() {
        let storage = storage_with("admin@example.com", "admin123").await;

        let ok = LoginInput {
            email: " Admin@Example.com ".into(),
            password: "admin123".into(),
        };
        let user = authenticate(&storage, &ok).await.unwrap();
        assert_eq!(user.role, Role::Admin);

        let wrong = LoginInput {
            email: "admin@example.com".into(),
            password: "nope123".into(),
        };
        assert!(matches!(
            authenticate(&storage, &wrong).await,
            Err(ApiError::InvalidCredentials)
        ));

        let unknown = LoginInput {
            email: "ghost@example.com".into(),
            password: "admin123".into(),
        };
        assert!(matches!(
            authenticate(&storage, &unknown).await,
            Err(ApiError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn register_rejects_taken_email() {
        let storage = storage_with("taken@example.com", "secret1").await;
        let input = RegisterInput {
            email: "TAKEN@example.com".into(),
            password: "secret1".into(),
            name: None,
        };
        assert!(matches!(
            register(&storage, input).await,
            Err(ApiError::UserExists)
        ));
    }

    #[tokio::test]
    async fn register_creates_plain_user() {
        let storage = MemoryStorage::new();
        let input = RegisterInput {
            email: "New@Example.com".into(),
            password: "secret1".into(),
            name: Some("New User".into()),
        };
        let user = register(&storage, input).await.unwrap();
        assert_eq!(user.role, Role::User);
        assert_eq!(user.email, "new@example.com");
        assert_ne!(user.password_hash, "secret1");
    }
}
