//! UseCase: Auth Gateway
//!
//! Verifies credentials against the user store before a connection is
//! admitted. Called once per connection.

use std::sync::Arc;

use tertulia_shared::time::Clock;

use crate::domain::{
    AuthAction, AuthRequest, Nickname, PasswordHasher, RepositoryError, Timestamp, UserRecord,
    UserRepository,
};

use super::error::AuthError;

pub struct AuthGateway {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    clock: Arc<dyn Clock>,
}

impl AuthGateway {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            hasher,
            clock,
        }
    }

    /// Run the action named in the auth frame
    pub async fn handle(&self, request: &AuthRequest) -> Result<Nickname, AuthError> {
        match request.action {
            AuthAction::Login => {
                self.authenticate_user(&request.username, &request.password)
                    .await
            }
            AuthAction::Register => {
                self.register_user(&request.username, &request.password)
                    .await
            }
        }
    }

    /// Create a user. A successful registration also logs the user in.
    pub async fn register_user(&self, username: &str, password: &str) -> Result<Nickname, AuthError> {
        let username = Nickname::new(username).map_err(|e| AuthError::InvalidInput(e.to_string()))?;
        if password.is_empty() {
            return Err(AuthError::InvalidInput(
                "Password must not be empty".to_string(),
            ));
        }

        let record = UserRecord {
            username: username.clone(),
            password_hash: self.hasher.hash(password),
            created_at: Timestamp::new(self.clock.now_millis()),
        };
        match self.users.insert_user(record).await {
            Ok(()) => {
                tracing::info!(username = %username, "User registered");
                Ok(username)
            }
            Err(RepositoryError::UserAlreadyExists(_)) => Err(AuthError::UserAlreadyExists),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn authenticate_user(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Nickname, AuthError> {
        // a name that could never have been registered is just a bad login
        let Ok(username) = Nickname::new(username) else {
            return Err(AuthError::InvalidCredentials);
        };

        match self.users.find_user(&username).await? {
            Some(user) if self.hasher.verify(password, &user.password_hash) => Ok(username),
            _ => {
                tracing::debug!(username = %username, "Authentication failed");
                Err(AuthError::InvalidCredentials)
            }
        }
    }
}
