//! M-Pesa STK push payments, status polling and receipts.

use std::time::Duration;

use radapos_core::{Money, PhoneNumber, SaleId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use super::transactions::SaleRecord;
use super::{ApiClient, ApiError};

/// Interval between status checks.
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Status checks before giving up.
pub const MAX_POLL_ATTEMPTS: u32 = 60;

/// Errors while waiting for an M-Pesa payment.
#[derive(Debug, Error)]
pub enum MpesaError {
    /// Safaricom reported the payment as failed.
    #[error("M-Pesa payment failed: {0}")]
    Failed(String),

    /// No final status after every attempt.
    #[error("M-Pesa payment timed out after {attempts} checks - ask the customer to check their phone")]
    Timeout {
        /// Checks made.
        attempts: u32,
    },

    /// The session ended while waiting.
    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Serialize)]
struct PayRequest<'a> {
    amount: Money,
    phone_number: &'a str,
    sale_id: SaleId,
}

/// Accepted STK push.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StkPush {
    pub checkout_request_id: String,
    #[serde(default)]
    pub sale_id: Option<SaleId>,
}

/// Payment status as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Completed {
        #[serde(default)]
        sale_id: Option<SaleId>,
    },
    Failed {
        #[serde(default)]
        reason: Option<String>,
    },
}

/// How often and how long to poll for a payment result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self {
            interval: POLL_INTERVAL,
            max_attempts: MAX_POLL_ATTEMPTS,
        }
    }
}

impl ApiClient {
    /// Send an STK push to the customer's phone for `sale_id`.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, phone), fields(phone = %phone))]
    pub async fn request_mpesa_payment(
        &self,
        amount: Money,
        phone: &PhoneNumber,
        sale_id: SaleId,
    ) -> Result<StkPush, ApiError> {
        let push: StkPush = self
            .post_json(
                "/mpesa/pay",
                &PayRequest {
                    amount,
                    phone_number: phone.as_str(),
                    sale_id,
                },
            )
            .await?;
        info!(checkout_request_id = %push.checkout_request_id, "STK push sent");
        Ok(push)
    }

    /// Current status of an STK push.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn mpesa_status(&self, checkout_request_id: &str) -> Result<PaymentStatus, ApiError> {
        self.get_json(&format!("/mpesa/status/{checkout_request_id}"))
            .await
    }

    /// Poll until the payment completes, fails, or the schedule runs out.
    ///
    /// Transport errors while polling are logged and polling continues. A 401
    /// stops polling since the session is gone.
    ///
    /// Returns the sale ID reported on completion, falling back to `sale_id`.
    ///
    /// # Errors
    ///
    /// Returns [`MpesaError::Failed`], [`MpesaError::Timeout`], or
    /// [`MpesaError::Api`] for an expired session.
    #[instrument(skip(self))]
    pub async fn wait_for_payment(
        &self,
        checkout_request_id: &str,
        sale_id: SaleId,
        schedule: PollSchedule,
    ) -> Result<SaleId, MpesaError> {
        let mut ticker = tokio::time::interval(schedule.interval.max(Duration::from_millis(1)));
        // The first tick completes immediately; the first check happens one
        // interval after the push, as on the terminal.
        ticker.tick().await;

        for attempt in 1..=schedule.max_attempts {
            ticker.tick().await;
            match self.mpesa_status(checkout_request_id).await {
                Ok(PaymentStatus::Completed { sale_id: confirmed }) => {
                    let sale_id = confirmed.unwrap_or(sale_id);
                    info!(%sale_id, attempt, "M-Pesa payment completed");
                    return Ok(sale_id);
                }
                Ok(PaymentStatus::Failed { reason }) => {
                    let reason = reason.unwrap_or_else(|| "unknown reason".to_owned());
                    warn!(%reason, attempt, "M-Pesa payment failed");
                    return Err(MpesaError::Failed(reason));
                }
                Ok(PaymentStatus::Pending) => debug!(attempt, "M-Pesa payment pending"),
                Err(ApiError::Unauthorized) => return Err(ApiError::Unauthorized.into()),
                Err(e) => warn!(error = %e, attempt, "M-Pesa status check failed, still polling"),
            }
        }

        Err(MpesaError::Timeout {
            attempts: schedule.max_attempts,
        })
    }

    /// Download the PDF receipt for a sale.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn download_receipt(&self, sale_id: SaleId) -> Result<Vec<u8>, ApiError> {
        self.get_bytes(&format!("/mpesa/receipt/{sale_id}")).await
    }

    /// Vendor sales history with line items.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn sales_history(&self) -> Result<Vec<SaleRecord>, ApiError> {
        self.get_json("/mpesa/history").await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_status_shapes() {
        let pending: PaymentStatus = serde_json::from_str(r#"{"status":"PENDING"}"#).unwrap();
        let done: PaymentStatus =
            serde_json::from_str(r#"{"status":"COMPLETED","sale_id":42}"#).unwrap();
        let failed: PaymentStatus =
            serde_json::from_str(r#"{"status":"FAILED","reason":"Request cancelled by user"}"#)
                .unwrap();

        assert_eq!(pending, PaymentStatus::Pending);
        assert_eq!(
            done,
            PaymentStatus::Completed {
                sale_id: Some(SaleId::new(42))
            }
        );
        assert_eq!(
            failed,
            PaymentStatus::Failed {
                reason: Some("Request cancelled by user".to_owned())
            }
        );
    }

    #[test]
    fn test_default_schedule() {
        let schedule = PollSchedule::default();
        assert_eq!(schedule.interval, Duration::from_secs(2));
        assert_eq!(schedule.max_attempts, 60);
    }
}
