//! Authentication endpoints.

use radapos_core::Email;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::{Ack, ApiClient, ApiError};
use crate::session::Identity;
use crate::validation::{self, MIN_NEW_PASSWORD_LEN, MIN_RESET_PASSWORD_LEN};

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Successful login.
#[derive(Deserialize)]
struct LoginResponse {
    access_token: String,
    user: Identity,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct ForgotPasswordRequest<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct ResetPasswordRequest<'a> {
    email: &'a str,
    token: &'a str,
    new_password: &'a str,
}

#[derive(Serialize)]
struct ChangePasswordRequest<'a> {
    current_password: &'a str,
    new_password: &'a str,
}

/// Password reset link parameters.
#[derive(Debug, Clone)]
pub struct ResetLink {
    /// Account email from the link.
    pub email: String,
    /// One-time reset token from the link.
    pub token: String,
}

impl ApiClient {
    /// Exchange credentials for a session.
    ///
    /// On success the session is persisted and listeners are sent to the
    /// role's landing page.
    ///
    /// # Errors
    ///
    /// Returns error if the email is malformed, the backend rejects the
    /// credentials, or the session cannot be persisted.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<Identity, ApiError> {
        let email = Email::parse(email).map_err(validation::ValidationError::from)?;

        let response: LoginResponse = self
            .post_json(
                "/auth/login",
                &LoginRequest {
                    email: email.as_str(),
                    password: password.expose_secret(),
                },
            )
            .await?;

        let identity = response.user;
        self.session()
            .login(SecretString::from(response.access_token), identity.clone())?;

        info!(user_id = %identity.id, role = %identity.role, "Login succeeded");
        Ok(identity)
    }

    /// End the session locally. The backend keeps no server-side session.
    ///
    /// # Errors
    ///
    /// Returns error if the persisted keys cannot be removed.
    pub fn logout(&self) -> Result<(), ApiError> {
        self.session().logout()?;
        Ok(())
    }

    /// Register a new vendor account.
    ///
    /// # Errors
    ///
    /// Returns error if the email is malformed or the backend rejects it.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &SecretString,
    ) -> Result<Ack, ApiError> {
        let email = Email::parse(email).map_err(validation::ValidationError::from)?;
        self.post_json(
            "/auth/register",
            &RegisterRequest {
                name: name.trim(),
                email: email.as_str(),
                password: password.expose_secret(),
            },
        )
        .await
    }

    /// Ask the backend to email a reset link.
    ///
    /// # Errors
    ///
    /// Returns error if the email is malformed or the request fails.
    #[instrument(skip(self))]
    pub async fn forgot_password(&self, email: &str) -> Result<Ack, ApiError> {
        let email = Email::parse(email).map_err(validation::ValidationError::from)?;
        self.post_json(
            "/auth/forgot-password",
            &ForgotPasswordRequest {
                email: email.as_str(),
            },
        )
        .await
    }

    /// Set a new password from a reset link.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the passwords differ or are too short,
    /// otherwise any backend error.
    #[instrument(skip_all, fields(email = %link.email))]
    pub async fn reset_password(
        &self,
        link: &ResetLink,
        new_password: &SecretString,
        confirmation: &SecretString,
    ) -> Result<Ack, ApiError> {
        validation::check_new_password(new_password, confirmation, MIN_RESET_PASSWORD_LEN, None)?;
        self.post_json(
            "/auth/reset-password",
            &ResetPasswordRequest {
                email: &link.email,
                token: &link.token,
                new_password: new_password.expose_secret(),
            },
        )
        .await
    }

    /// Replace a temporary password.
    ///
    /// The new password must differ from the current one.
    ///
    /// # Errors
    ///
    /// Returns a validation error before sending anything, otherwise any
    /// backend error.
    #[instrument(skip_all)]
    pub async fn change_password(
        &self,
        current: &SecretString,
        new_password: &SecretString,
        confirmation: &SecretString,
    ) -> Result<Ack, ApiError> {
        validation::check_new_password(
            new_password,
            confirmation,
            MIN_NEW_PASSWORD_LEN,
            Some(current),
        )?;
        self.post_json(
            "/auth/change-password",
            &ChangePasswordRequest {
                current_password: current.expose_secret().trim(),
                new_password: new_password.expose_secret().trim(),
            },
        )
        .await
    }
}
