//! Account registration, login and the password lifecycle.

use chrono::Utc;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::services::password_service::PasswordService;
use crate::application::services::reset_token::{RESET_TOKEN_TTL_MINUTES, ResetToken, hash_reset_token};
use crate::application::services::session_tokens::SessionTokens;
use crate::domain::document::Resource;
use crate::domain::entities::user::normalize_email;
use crate::domain::entities::{NewUser, Role, User};
use crate::domain::query::Filter;
use crate::domain::repositories::Collection;
use crate::error::AppError;
use crate::infrastructure::mail::Mailer;
use crate::infrastructure::mail::templates::PasswordResetEmail;

pub const INCORRECT_CREDENTIALS: &str = "Incorrect email or password";
pub const USER_GONE: &str = "The user belonging to this token no longer exists.";
pub const PASSWORD_CHANGED: &str = "User recently changed password. Please log in again.";
pub const EMAIL_FAILED: &str = "There was an error sending the email. Try again later!";

/// A user together with a freshly issued session token.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub token: String,
}

/// Service for authentication and credential changes.
///
/// Hashing passwords and stamping `passwordChangedAt` are explicit steps of
/// the flows below; nothing happens implicitly on save.
pub struct AuthService {
    users: Collection<User>,
    passwords: PasswordService,
    tokens: SessionTokens,
    mailer: Arc<dyn Mailer>,
    public_url: String,
}

impl AuthService {
    pub fn new(
        users: Collection<User>,
        passwords: PasswordService,
        tokens: SessionTokens,
        mailer: Arc<dyn Mailer>,
        public_url: &str,
    ) -> Self {
        Self {
            users,
            passwords,
            tokens,
            mailer,
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn tokens(&self) -> &SessionTokens {
        &self.tokens
    }

    /// Creates an account with `role`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the email is already registered.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<User, AppError> {
        let password_hash = self.passwords.hash(password).await?;
        let user = User::create(
            NewUser {
                name: name.to_string(),
                email: email.to_string(),
                password_hash,
                role,
                photo: None,
            },
            Uuid::new_v4(),
            Utc::now(),
        )?;

        let user = self.users.insert(&user).await?;
        tracing::info!(user = %user.id, role = %user.role, "Account registered");
        Ok(user)
    }

    /// Registers a regular user and signs them in.
    pub async fn signup(&self, name: &str, email: &str, password: &str) -> Result<Session, AppError> {
        let user = self.register(name, email, password, Role::User).await?;
        self.start_session(user)
    }

    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if the email is unknown or the
    /// password is wrong. Both cases share one message.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AppError> {
        let user = self.find_by_email(email).await?;

        let valid = match &user {
            Some(user) => self.passwords.verify(password, &user.password_hash).await?,
            None => false,
        };

        match user {
            Some(user) if valid => self.start_session(user),
            _ => {
                tracing::debug!("Login rejected");
                Err(AppError::unauthorized(INCORRECT_CREDENTIALS))
            }
        }
    }

    /// Resolves a bearer token to the active user it was issued for.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Forbidden`] when the token is invalid or expired,
    /// the user no longer exists, or the password changed after the token
    /// was issued.
    pub async fn authenticate(&self, token: &str) -> Result<User, AppError> {
        let claims = self.tokens.verify(token)?;

        let user = self
            .users
            .find_by_id(claims.id)
            .await?
            .ok_or_else(|| AppError::forbidden(USER_GONE))?;

        if user.was_password_changed_after(claims.iat) {
            return Err(AppError::forbidden(PASSWORD_CHANGED));
        }

        Ok(user)
    }

    /// Emails a password reset link to the account holder.
    ///
    /// # Errors
    ///
    /// - [`AppError::NotFound`] if no account uses this email
    /// - [`AppError::UpstreamDelivery`] if the mail could not be sent; the
    ///   stored reset token is cleared again
    pub async fn forgot_password(&self, email: &str) -> Result<(), AppError> {
        let user = self
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::not_found("There is no user with that email address."))?;

        let plaintext = self.create_reset_token(&user).await?;
        let reset_url = format!("{}/api/v1/users/reset-password/{}", self.public_url, plaintext);

        let delivery = match (PasswordResetEmail {
            name: &user.name,
            reset_url: &reset_url,
            valid_minutes: RESET_TOKEN_TTL_MINUTES,
        })
        .to_email(&user.email)
        {
            Ok(email) => self.mailer.send(email).await,
            Err(e) => Err(e),
        };

        if let Err(e) = delivery {
            tracing::error!(user = %user.id, "Password reset email failed: {}", e);
            self.clear_reset_token(user.id).await?;
            return Err(AppError::upstream_delivery(EMAIL_FAILED));
        }

        tracing::info!(user = %user.id, "Password reset token sent");
        Ok(())
    }

    /// Stores a new reset token for `user` and returns its plaintext.
    pub async fn create_reset_token(&self, user: &User) -> Result<String, AppError> {
        let token = ResetToken::generate(Utc::now())?;

        let mut changes = Map::new();
        changes.insert("passwordResetToken".to_string(), json!(token.hash));
        changes.insert("passwordResetExpires".to_string(), json!(token.expires_at));
        self.users
            .update_by_id(user.id, changes)
            .await?
            .ok_or_else(|| AppError::not_found("No user found with that ID"))?;

        Ok(token.plaintext)
    }

    /// Finds the user holding an unexpired reset token matching `plaintext`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::TokenInvalidOrExpired`] otherwise.
    pub async fn consume_reset_token(&self, plaintext: &str) -> Result<User, AppError> {
        let hash = hash_reset_token(plaintext);
        let user = self
            .users
            .find_one(Filter::new().eq("passwordResetToken", hash))
            .await?
            .ok_or(AppError::TokenInvalidOrExpired)?;

        match user.password_reset_expires {
            Some(expires) if expires > Utc::now() => Ok(user),
            _ => Err(AppError::TokenInvalidOrExpired),
        }
    }

    /// Sets a new password using a reset token. The token is cleared, so it
    /// works only once.
    pub async fn reset_password(&self, plaintext: &str, password: &str) -> Result<Session, AppError> {
        let user = self.consume_reset_token(plaintext).await?;
        let user = self.set_password(user.id, password).await?;

        tracing::info!(user = %user.id, "Password reset");
        self.start_session(user)
    }

    /// Changes the password of a signed-in user after checking the current one.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if `current` is wrong.
    pub async fn update_password(
        &self,
        user: &User,
        current: &str,
        password: &str,
    ) -> Result<Session, AppError> {
        if !self.passwords.verify(current, &user.password_hash).await? {
            return Err(AppError::unauthorized("Your current password is wrong."));
        }

        let user = self.set_password(user.id, password).await?;
        tracing::info!(user = %user.id, "Password updated");
        self.start_session(user)
    }

    async fn set_password(&self, id: Uuid, password: &str) -> Result<User, AppError> {
        let password_hash = self.passwords.hash(password).await?;

        let mut changes = Map::new();
        changes.insert("password".to_string(), json!(password_hash));
        changes.insert("passwordChangedAt".to_string(), json!(Utc::now()));
        changes.insert("passwordResetToken".to_string(), Value::Null);
        changes.insert("passwordResetExpires".to_string(), Value::Null);

        self.users
            .update_by_id(id, changes)
            .await?
            .ok_or_else(|| AppError::not_found("No user found with that ID"))
    }

    async fn clear_reset_token(&self, id: Uuid) -> Result<(), AppError> {
        let mut changes = Map::new();
        changes.insert("passwordResetToken".to_string(), Value::Null);
        changes.insert("passwordResetExpires".to_string(), Value::Null);
        self.users.update_by_id(id, changes).await?;
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.users
            .find_one(Filter::new().eq("email", normalize_email(email)))
            .await
    }

    fn start_session(&self, user: User) -> Result<Session, AppError> {
        let token = self.tokens.issue(user.id)?;
        Ok(Session { user, token })
    }
}
