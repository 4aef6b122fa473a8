//! Sale submission and sales history.

use chrono::{DateTime, Utc};
use radapos_core::{EventId, Money, PaymentMethod, ProductId, SaleId, VendorId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use tracing::{info, instrument};

use super::{Ack, ApiClient, ApiError};
use crate::validation::ValidationError;

/// Largest gap tolerated between the split legs and the sale total.
pub const SPLIT_TOLERANCE: Money = Money::new(Decimal::ONE);

/// One line of a checkout payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLine {
    pub product_id: ProductId,
    pub qty: u32,
}

/// Cash checkout payload. Also the unit stored in the offline queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalePayload {
    pub vendor_id: VendorId,
    pub event_id: EventId,
    pub items: Vec<SaleLine>,
    pub amount_tendered: Money,
    #[serde(serialize_with = "lowercase_method")]
    pub payment_method: PaymentMethod,
    /// Whether the sale was captured without connectivity.
    pub offline: bool,
}

fn lowercase_method<S: Serializer>(method: &PaymentMethod, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&method.to_string().to_ascii_lowercase())
}

/// Line of a terminal sale. The terminal endpoint uses `id`/`quantity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TerminalLine {
    pub id: ProductId,
    pub quantity: u32,
}

/// Cash and M-Pesa legs of a split payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitTender {
    pub cash: Money,
    pub mpesa: Money,
}

impl SplitTender {
    /// Check the legs against the sale total.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::SplitMismatch`] if the legs are more than
    /// [`SPLIT_TOLERANCE`] away from `total`.
    pub fn new(cash: Money, mpesa: Money, total: Money) -> Result<Self, ValidationError> {
        if (cash + mpesa).abs_diff(total) > SPLIT_TOLERANCE {
            return Err(ValidationError::SplitMismatch { cash, mpesa, total });
        }
        Ok(Self { cash, mpesa })
    }

    /// Default split offered by the terminal: cash rounded down, M-Pesa
    /// rounded up.
    #[must_use]
    pub fn halves(total: Money) -> Self {
        let half = total.amount() / Decimal::TWO;
        Self {
            cash: Money::new(half.floor()),
            mpesa: Money::new(half.ceil()),
        }
    }

    /// Re-balance after the cashier edits the cash leg.
    ///
    /// Cash above the total takes the whole amount.
    #[must_use]
    pub fn with_cash(cash: Money, total: Money) -> Self {
        if cash > total {
            Self {
                cash: total,
                mpesa: Money::ZERO,
            }
        } else {
            Self {
                cash,
                mpesa: total - cash,
            }
        }
    }
}

/// Terminal sale request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TerminalSale {
    pub items: Vec<TerminalLine>,
    pub payment_method: PaymentMethod,
    pub coupon_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_cash: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_mpesa: Option<Money>,
}

impl TerminalSale {
    /// Sale paid with a single method.
    #[must_use]
    pub const fn single(
        items: Vec<TerminalLine>,
        payment_method: PaymentMethod,
        coupon_code: Option<String>,
    ) -> Self {
        Self {
            items,
            payment_method,
            coupon_code,
            amount_cash: None,
            amount_mpesa: None,
        }
    }

    /// Sale split between cash and M-Pesa.
    #[must_use]
    pub const fn split(items: Vec<TerminalLine>, tender: SplitTender, coupon_code: Option<String>) -> Self {
        Self {
            items,
            payment_method: PaymentMethod::Split,
            coupon_code,
            amount_cash: Some(tender.cash),
            amount_mpesa: Some(tender.mpesa),
        }
    }
}

#[derive(Deserialize)]
struct SaleCreated {
    sale_id: SaleId,
}

/// Discount code offered at the terminal.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Coupon {
    pub id: i64,
    pub code: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub percentage: Decimal,
}

/// Line of a recorded sale.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SaleRecordItem {
    pub product_name: String,
    pub quantity: u32,
    pub price: Money,
}

/// A completed (or failed) sale as listed in history views.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SaleRecord {
    pub id: SaleId,
    #[serde(default, deserialize_with = "super::timestamp::deserialize_opt")]
    pub created_at: Option<DateTime<Utc>>,
    pub total_amount: Money,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub cashier_name: Option<String>,
    #[serde(default)]
    pub items_count: Option<u32>,
    #[serde(default)]
    pub items: Vec<SaleRecordItem>,
}

impl SaleRecord {
    /// Number of items, from the count field or the item list.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items_count
            .unwrap_or_else(|| self.items.iter().map(|i| i.quantity).sum())
    }
}

impl ApiClient {
    /// Submit a cash checkout.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails. Nothing is retried.
    #[instrument(skip(self, sale), fields(lines = sale.items.len(), offline = sale.offline))]
    pub async fn submit_checkout(&self, sale: &SalePayload) -> Result<Ack, ApiError> {
        let ack: Ack = self.post_json("/transactions/checkout", sale).await?;
        info!(amount = %sale.amount_tendered, "Checkout accepted");
        Ok(ack)
    }

    /// Record a terminal sale and return its ID.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, sale), fields(method = %sale.payment_method))]
    pub async fn create_sale(&self, sale: &TerminalSale) -> Result<SaleId, ApiError> {
        let created: SaleCreated = self.post_json("/transactions/", sale).await?;
        info!(sale_id = %created.sale_id, "Sale recorded");
        Ok(created.sale_id)
    }

    /// The caller's recent sales.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_transactions(&self) -> Result<Vec<SaleRecord>, ApiError> {
        self.get_json("/transactions/").await
    }

    /// Coupons available at the terminal.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_coupons(&self) -> Result<Vec<Coupon>, ApiError> {
        self.get_json("/transactions/coupons").await
    }

    /// Download the transaction export file.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn export_transactions(&self) -> Result<Vec<u8>, ApiError> {
        self.get_bytes("/transactions/export").await
    }
}
