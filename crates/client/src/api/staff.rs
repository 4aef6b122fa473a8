//! Vendor staff (cashier) management.

use chrono::{DateTime, Utc};
use radapos_core::{Email, PhoneNumber, Role, StaffId, StaffStatus};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{Ack, ApiClient, ApiError};
use crate::validation::{ValidationError, MIN_RESET_PASSWORD_LEN};

/// A cashier account belonging to the calling vendor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StaffMember {
    pub id: StaffId,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "super::timestamp::deserialize_opt")]
    pub created_at: Option<DateTime<Utc>>,
}

const fn default_active() -> bool {
    true
}

impl StaffMember {
    /// Account status as shown in the staff table.
    #[must_use]
    pub const fn status(&self) -> StaffStatus {
        if self.is_active {
            StaffStatus::Active
        } else {
            StaffStatus::Inactive
        }
    }
}

/// New cashier details. The backend emails a temporary password.
#[derive(Debug, Clone, Serialize)]
pub struct NewStaff {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_number: Option<String>,
}

impl NewStaff {
    /// Validate and normalise the form.
    ///
    /// # Errors
    ///
    /// Returns error if the email or phone number is malformed.
    pub fn new(
        name: &str,
        email: &str,
        phone_number: Option<&str>,
        id_number: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let email = Email::parse(email)?;
        let phone_number = phone_number
            .filter(|p| !p.trim().is_empty())
            .map(PhoneNumber::parse)
            .transpose()?;
        Ok(Self {
            name: name.trim().to_owned(),
            email: email.as_str().to_owned(),
            phone_number: phone_number.map(|p| p.as_str().to_owned()),
            id_number: id_number
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned),
        })
    }
}

#[derive(Deserialize)]
struct StaffCreated {
    staff: StaffMember,
}

#[derive(Serialize)]
struct StatusUpdate {
    status: StaffStatus,
}

#[derive(Serialize)]
struct PasswordReset<'a> {
    new_password: &'a str,
}

impl ApiClient {
    /// List the caller's cashiers.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_staff(&self) -> Result<Vec<StaffMember>, ApiError> {
        self.get_json("/staff/").await
    }

    /// Add a cashier.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails (e.g. email already registered).
    #[instrument(skip(self, staff), fields(email = %staff.email))]
    pub async fn add_staff(&self, staff: &NewStaff) -> Result<StaffMember, ApiError> {
        let created: StaffCreated = self.post_json("/staff/", staff).await?;
        Ok(created.staff)
    }

    /// Remove a cashier.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn delete_staff(&self, id: StaffId) -> Result<Ack, ApiError> {
        self.delete(&format!("/staff/{id}")).await
    }

    /// Activate or deactivate a cashier.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn set_staff_status(&self, id: StaffId, status: StaffStatus) -> Result<Ack, ApiError> {
        self.put_json(&format!("/staff/{id}/status"), &StatusUpdate { status })
            .await
    }

    /// Set a cashier's password directly.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the password is too short, otherwise
    /// any backend error.
    #[instrument(skip(self, new_password))]
    pub async fn reset_staff_password(
        &self,
        id: StaffId,
        new_password: &SecretString,
    ) -> Result<Ack, ApiError> {
        if new_password.expose_secret().chars().count() < MIN_RESET_PASSWORD_LEN {
            return Err(ValidationError::PasswordTooShort {
                min: MIN_RESET_PASSWORD_LEN,
            }
            .into());
        }
        self.post_json(
            &format!("/staff/{id}/reset-password"),
            &PasswordReset {
                new_password: new_password.expose_secret(),
            },
        )
        .await
    }
}
