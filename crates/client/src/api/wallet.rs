//! Vendor wallet: balance, ledger, withdrawals and direct payouts.

use radapos_core::{Money, PhoneNumber};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::{Ack, ApiClient, ApiError};
use crate::validation::{self, ValidationError};

/// Wallet balance.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Wallet {
    #[serde(default = "default_currency")]
    pub currency: String,
    pub current_balance: Money,
}

fn default_currency() -> String {
    Money::CURRENCY.to_owned()
}

/// One ledger entry of the wallet history.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WalletEntry {
    pub id: i64,
    pub amount: Money,
    #[serde(default)]
    pub status: Option<String>,
    /// Display date as formatted by the backend.
    #[serde(default)]
    pub date: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl WalletEntry {
    /// Whether money left the wallet.
    #[must_use]
    pub fn is_debit(&self) -> bool {
        self.kind.contains("Payout") || self.kind.contains("Withdrawal")
    }

    /// Amount with a sign for display.
    #[must_use]
    pub fn signed_amount(&self) -> String {
        let sign = if self.is_debit() { '-' } else { '+' };
        format!("{sign}{}", self.amount)
    }
}

#[derive(Serialize)]
struct WithdrawalRequest {
    amount: Money,
}

/// Instant M-Pesa payout from the wallet to a third party.
#[derive(Debug, Clone, Serialize)]
pub struct DirectPayout {
    pub recipient_name: String,
    pub phone_number: String,
    pub amount: Money,
}

impl DirectPayout {
    /// Validate the payout form.
    ///
    /// # Errors
    ///
    /// Returns error if the phone number is malformed.
    pub fn new(recipient_name: &str, phone: &str, amount: Money) -> Result<Self, ValidationError> {
        let phone = PhoneNumber::parse(phone)?;
        Ok(Self {
            recipient_name: recipient_name.trim().to_owned(),
            phone_number: phone.as_str().to_owned(),
            amount,
        })
    }
}

impl ApiClient {
    /// Current wallet balance.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn wallet(&self) -> Result<Wallet, ApiError> {
        self.get_json("/vendor/wallet").await
    }

    /// Wallet ledger, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn wallet_history(&self) -> Result<Vec<WalletEntry>, ApiError> {
        let history: Option<Vec<WalletEntry>> = self.get_json("/vendor/wallet/history").await?;
        Ok(history.unwrap_or_default())
    }

    /// Ask an admin to pay out `amount`.
    ///
    /// Checked against `balance` first; nothing is sent if it exceeds it.
    ///
    /// # Errors
    ///
    /// Returns a validation error or any backend error (e.g. 400
    /// "Insufficient funds").
    #[instrument(skip(self))]
    pub async fn request_withdrawal(&self, amount: Money, balance: Money) -> Result<Ack, ApiError> {
        validation::check_balance(amount, balance)?;
        let ack: Ack = self
            .post_json("/vendor/wallet/request-withdrawal", &WithdrawalRequest { amount })
            .await?;
        info!(%amount, "Withdrawal requested");
        Ok(ack)
    }

    /// Pay a third party directly from the wallet. Not reversible.
    ///
    /// # Errors
    ///
    /// Returns a validation error or any backend error.
    #[instrument(skip(self, payout), fields(amount = %payout.amount))]
    pub async fn payout_direct(&self, payout: &DirectPayout, balance: Money) -> Result<Ack, ApiError> {
        validation::check_balance(payout.amount, balance)?;
        let ack: Ack = self.post_json("/vendor/wallet/payout-direct", payout).await?;
        info!("Direct payout sent");
        Ok(ack)
    }
}
