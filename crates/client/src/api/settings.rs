//! Account settings: profile, password and alert preferences.

use radapos_core::{PhoneNumber, Role};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{Ack, ApiClient, ApiError};
use crate::validation::{self, MIN_NEW_PASSWORD_LEN, ValidationError};

/// Editable profile. Email is shown but not editable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Profile {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub business_name: String,
    #[serde(default, alias = "phone_number")]
    pub phone: String,
}

/// Profile changes. Unset fields are left alone.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl ProfileUpdate {
    /// Set a phone number, normalised to `254…`.
    ///
    /// # Errors
    ///
    /// Returns error if the number is malformed.
    pub fn with_phone(mut self, phone: &str) -> Result<Self, ValidationError> {
        self.phone = Some(PhoneNumber::parse(phone)?.as_str().to_owned());
        Ok(self)
    }

    /// Whether anything would change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.business_name.is_none() && self.phone.is_none()
    }
}

/// Which alerts the vendor receives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertPreferences {
    #[serde(default)]
    pub email_alerts: bool,
    #[serde(default)]
    pub stock_warnings: bool,
    #[serde(default)]
    pub daily_reports: bool,
}

#[derive(Serialize)]
struct PasswordChange<'a> {
    current_password: &'a str,
    new_password: &'a str,
}

impl ApiClient {
    /// The caller's profile.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn profile(&self) -> Result<Profile, ApiError> {
        self.get_json("/settings/profile").await
    }

    /// Save profile changes.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Ack, ApiError> {
        self.put_json("/settings/profile", update).await
    }

    /// Change password from the settings page.
    ///
    /// # Errors
    ///
    /// Returns a validation error before sending anything, otherwise any
    /// backend error. A wrong current password comes back as 401, which
    /// also ends the session.
    #[instrument(skip_all)]
    pub async fn update_password(
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
        self.put_json(
            "/settings/security/password",
            &PasswordChange {
                current_password: current.expose_secret(),
                new_password: new_password.expose_secret(),
            },
        )
        .await
    }

    /// Alert preferences.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn alert_preferences(&self) -> Result<AlertPreferences, ApiError> {
        self.get_json("/settings/notifications").await
    }

    /// Save alert preferences.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn update_alert_preferences(&self, prefs: AlertPreferences) -> Result<Ack, ApiError> {
        self.put_json("/settings/notifications", &prefs).await
    }
}
