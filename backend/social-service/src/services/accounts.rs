//! Registration, token issuing and account maintenance

use crate::domain::models::{NewUser, User, UserChanges};
use crate::error::{AppError, Result};
use crate::repository::{Store, UserStore};
use crypto_core::jwt::{self, TokenPair};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

const MISSING_CREDENTIALS: &str = "Username and password are required.";
const BAD_CREDENTIALS: &str = "No active account found with the given credentials";

#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserStore>,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn validate_username(username: &str) -> Result<()> {
    if username.trim().is_empty() {
        return Err(AppError::Validation(
            "username: This field may not be blank.".to_string(),
        ));
    }
    Ok(())
}

impl AccountService {
    pub fn new(store: &Store) -> Self {
        Self {
            users: store.users.clone(),
        }
    }

    /// Create an account with a login credential
    ///
    /// The password is Argon2-hashed on the blocking pool before anything is stored.
    pub async fn register(
        &self,
        username: Option<&str>,
        password: Option<&str>,
        email: Option<&str>,
    ) -> Result<User> {
        let (Some(username), Some(password)) = (non_empty(username), non_empty(password)) else {
            return Err(AppError::MissingField(MISSING_CREDENTIALS.to_string()));
        };

        if self.users.username_exists(username).await? {
            return Err(AppError::UsernameTaken);
        }

        let password = password.to_owned();
        let password_hash = tokio::task::spawn_blocking(move || crypto_core::hash_password(&password))
            .await
            .map_err(|e| AppError::Internal(format!("password hashing task failed: {}", e)))??;

        // a concurrent registration can still win; the unique index reports it as UsernameTaken
        let user = self
            .users
            .create_user(NewUser {
                username: username.to_string(),
                email: email.unwrap_or_default().to_string(),
                password_hash,
            })
            .await?;

        info!(user_id = %user.id, username = %user.username, "user registered");
        Ok(user)
    }

    /// Exchange username and password for an access/refresh token pair
    pub async fn obtain_token(
        &self,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<TokenPair> {
        let (Some(username), Some(password)) = (non_empty(username), non_empty(password)) else {
            return Err(AppError::MissingField(MISSING_CREDENTIALS.to_string()));
        };

        let Some(user) = self.users.find_by_username(username).await? else {
            warn!(username = %username, "token requested for unknown user");
            return Err(AppError::Unauthorized(BAD_CREDENTIALS.to_string()));
        };

        let password = password.to_owned();
        let stored_hash = user.password_hash.clone();
        let valid = tokio::task::spawn_blocking(move || {
            crypto_core::verify_password(&password, &stored_hash)
        })
        .await
        .map_err(|e| AppError::Internal(format!("password verification task failed: {}", e)))??;

        if !valid {
            warn!(user_id = %user.id, "invalid credentials");
            return Err(AppError::Unauthorized(BAD_CREDENTIALS.to_string()));
        }

        jwt::generate_token_pair(user.id, &user.username)
            .map_err(|e| AppError::Internal(format!("failed to issue tokens: {}", e)))
    }

    /// Issue a new access token from a refresh token
    pub async fn refresh(&self, refresh_token: Option<&str>) -> Result<String> {
        let Some(refresh_token) = non_empty(refresh_token) else {
            return Err(AppError::MissingField("refresh: This field is required.".to_string()));
        };

        let claims = jwt::validate_refresh_token(refresh_token).map_err(|e| {
            warn!("refresh rejected: {}", e);
            AppError::Unauthorized("Token is invalid or expired".to_string())
        })?;
        let user_id = claims
            .user_id()
            .map_err(|_| AppError::Unauthorized("Token is invalid or expired".to_string()))?;

        let Some(user) = self.users.get_user(user_id).await? else {
            warn!(user_id = %user_id, "refresh for deleted account");
            return Err(AppError::Unauthorized("User not found".to_string()));
        };

        jwt::generate_access_token(user.id, &user.username)
            .map_err(|e| AppError::Internal(format!("failed to issue tokens: {}", e)))
    }

    /// Create a profile without a usable password (`POST /users/`)
    pub async fn create_profile(&self, username: &str, email: Option<&str>) -> Result<User> {
        validate_username(username)?;

        let user = self
            .users
            .create_user(NewUser {
                username: username.to_string(),
                email: email.unwrap_or_default().to_string(),
                password_hash: crypto_core::UNUSABLE_PASSWORD.to_string(),
            })
            .await?;

        info!(user_id = %user.id, "profile created");
        Ok(user)
    }

    pub async fn update_user(&self, user_id: Uuid, changes: UserChanges) -> Result<User> {
        if let Some(username) = changes.username.as_deref() {
            validate_username(username)?;
        }

        self.users
            .update_user(user_id, changes)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    pub async fn delete_user(&self, user_id: Uuid) -> Result<()> {
        if !self.users.delete_user(user_id).await? {
            return Err(AppError::not_found("User"));
        }
        info!(user_id = %user_id, "user deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crypto_core::test_utils::init_test_keys;

    fn service() -> AccountService {
        AccountService::new(&Store::in_memory())
    }

    #[tokio::test]
    async fn test_register_hashes_password() {
        let accounts = service();
        let user = accounts
            .register(Some("alice"), Some("pw123"), None)
            .await
            .unwrap();

        assert_ne!(user.password_hash, "pw123");
        assert!(crypto_core::verify_password("pw123", &user.password_hash).unwrap());
        assert_eq!(user.email, "");
    }

    #[tokio::test]
    async fn test_register_requires_username_and_password() {
        let accounts = service();

        for (username, password) in [(None, Some("pw")), (Some("alice"), None), (Some(""), Some("pw"))] {
            let err = accounts.register(username, password, None).await.unwrap_err();
            assert!(matches!(err, AppError::MissingField(ref msg) if msg == MISSING_CREDENTIALS));
        }
    }

    #[tokio::test]
    async fn test_register_duplicate_username() {
        let accounts = service();
        accounts.register(Some("alice"), Some("pw123"), None).await.unwrap();

        let err = accounts
            .register(Some("alice"), Some("other"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UsernameTaken));
    }

    #[tokio::test]
    async fn test_obtain_token_checks_password() {
        init_test_keys();
        let accounts = service();
        let user = accounts.register(Some("alice"), Some("pw123"), None).await.unwrap();

        let pair = accounts.obtain_token(Some("alice"), Some("pw123")).await.unwrap();
        let claims = jwt::validate_access_token(&pair.access).unwrap();
        assert_eq!(claims.user_id().unwrap(), user.id);

        assert!(matches!(
            accounts.obtain_token(Some("alice"), Some("wrong")).await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            accounts.obtain_token(Some("nobody"), Some("pw123")).await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_profile_without_password_cannot_log_in() {
        init_test_keys();
        let accounts = service();
        accounts.create_profile("bob", Some("bob@example.com")).await.unwrap();

        assert!(matches!(
            accounts.obtain_token(Some("bob"), Some("!")).await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        init_test_keys();
        let accounts = service();
        let user = accounts.register(Some("alice"), Some("pw123"), None).await.unwrap();
        let pair = jwt::generate_token_pair(user.id, "alice").unwrap();

        assert!(accounts.refresh(Some(&pair.refresh)).await.is_ok());
        assert!(matches!(
            accounts.refresh(Some(&pair.access)).await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(accounts.refresh(None).await, Err(AppError::MissingField(_))));
    }

    #[tokio::test]
    async fn test_refresh_rejects_deleted_account() {
        init_test_keys();
        let accounts = service();
        let user = accounts.register(Some("alice"), Some("pw123"), None).await.unwrap();
        let pair = jwt::generate_token_pair(user.id, "alice").unwrap();

        accounts.delete_user(user.id).await.unwrap();

        assert!(matches!(
            accounts.refresh(Some(&pair.refresh)).await,
            Err(AppError::Unauthorized(ref msg)) if msg == "User not found"
        ));
    }
}
