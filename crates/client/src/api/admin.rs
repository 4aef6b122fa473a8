//! Platform administration: events, vendor approval and withdrawal review.

use chrono::{DateTime, Utc};
use radapos_core::{ApprovalStatus, EventId, Money, ReviewAction, VendorId, WithdrawalId, WithdrawalStatus};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::{Ack, ApiClient, ApiError};

/// An event vendors sell at.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    /// `active` or `inactive`.
    #[serde(default)]
    pub status: Option<String>,
}

/// New event form.
#[derive(Debug, Clone, Serialize)]
pub struct NewEvent {
    pub name: String,
    pub location: String,
}

#[derive(Serialize)]
struct EventStatusUpdate<'a> {
    status: &'a str,
}

/// A vendor business awaiting or past approval.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VendorApplication {
    pub id: VendorId,
    pub business_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub kra_pin: Option<String>,
    pub status: ApprovalStatus,
    #[serde(default)]
    pub approval_notes: Option<String>,
    #[serde(default, deserialize_with = "super::timestamp::deserialize_opt")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
struct ReviewNotes<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<&'a str>,
}

/// A vendor's request to withdraw wallet funds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WithdrawalRequest {
    pub id: WithdrawalId,
    #[serde(default, deserialize_with = "super::timestamp::deserialize_opt")]
    pub created_at: Option<DateTime<Utc>>,
    pub vendor_name: String,
    #[serde(default)]
    pub vendor_email: Option<String>,
    pub amount: Money,
    #[serde(default)]
    pub mpesa_number: Option<String>,
    pub status: WithdrawalStatus,
}

impl WithdrawalRequest {
    /// Case-insensitive search over vendor name and M-Pesa number.
    #[must_use]
    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.vendor_name.to_lowercase().contains(&term)
            || self
                .mpesa_number
                .as_deref()
                .is_some_and(|n| n.contains(&term))
    }
}

/// Platform wallet totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WalletStats {
    #[serde(default)]
    pub platform_earnings: Money,
    #[serde(default)]
    pub pending_withdrawals: Money,
    #[serde(default)]
    pub total_revenue: Money,
}

impl ApiClient {
    /// All events.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_events(&self) -> Result<Vec<Event>, ApiError> {
        self.get_json("/events/").await
    }

    /// Create an event. New events start active.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, event), fields(name = %event.name))]
    pub async fn create_event(&self, event: &NewEvent) -> Result<Ack, ApiError> {
        self.post_json("/events/", event).await
    }

    /// Activate or deactivate an event.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn set_event_active(&self, id: EventId, active: bool) -> Result<Ack, ApiError> {
        let status = if active { "active" } else { "inactive" };
        self.patch_json(&format!("/events/{id}"), &EventStatusUpdate { status })
            .await
    }

    /// Vendor applications.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_vendors(&self) -> Result<Vec<VendorApplication>, ApiError> {
        self.get_json("/vendors/").await
    }

    /// Approve or reject a submitted vendor.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails (e.g. the vendor is not in
    /// `SUBMITTED` state, or the reviewer also submitted it).
    #[instrument(skip(self))]
    pub async fn review_vendor(
        &self,
        id: VendorId,
        action: ReviewAction,
        notes: Option<&str>,
    ) -> Result<Ack, ApiError> {
        let ack: Ack = self
            .post_json(
                &format!("/admin/vendors/{id}/{}", action.as_path()),
                &ReviewNotes { notes },
            )
            .await?;
        info!(vendor_id = %id, ?action, "Vendor reviewed");
        Ok(ack)
    }

    /// All withdrawal requests.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_withdrawals(&self) -> Result<Vec<WithdrawalRequest>, ApiError> {
        self.get_json("/admin/wallet/withdrawals").await
    }

    /// Platform wallet totals.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn wallet_stats(&self) -> Result<WalletStats, ApiError> {
        self.get_json("/admin/wallet/stats").await
    }

    /// Approve (and pay out) or reject a pending withdrawal.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn review_withdrawal(&self, id: WithdrawalId, action: ReviewAction) -> Result<Ack, ApiError> {
        let ack: Ack = self
            .post_empty(&format!("/admin/wallet/withdrawals/{id}/{}", action.as_path()))
            .await?;
        info!(withdrawal_id = %id, ?action, "Withdrawal reviewed");
        Ok(ack)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_withdrawal_search() {
        let w: WithdrawalRequest = serde_json::from_str(
            r#"{"id":5,"created_at":"2025-06-01T09:00:00","vendor_name":"Mama Mboga",
                "vendor_email":"mama@x.co","amount":2500,"mpesa_number":"254711222333","status":"pending"}"#,
        )
        .unwrap();
        assert_eq!(w.status, WithdrawalStatus::Pending);
        assert!(w.matches("mboga"));
        assert!(w.matches("711222"));
        assert!(!w.matches("nyama"));
    }

    #[test]
    fn test_stats_default_missing_fields() {
        let stats: WalletStats = serde_json::from_str(r#"{"total_revenue":100}"#).unwrap();
        assert_eq!(stats.total_revenue, Money::from_shillings(100));
        assert_eq!(stats.pending_withdrawals, Money::ZERO);
    }

    #[test]
    fn test_review_notes_omitted_when_empty() {
        let body = serde_json::to_string(&ReviewNotes { notes: None }).unwrap();
        assert_eq!(body, "{}");
    }
}
