//! Dashboard figures and the cashier shift (Z) report.

use std::fmt::Write as _;

use radapos_core::{Money, PaymentMethod, SaleId};
use serde::Deserialize;
use tracing::instrument;

use super::{ApiClient, ApiError};

/// Vendor dashboard headline numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DashboardStats {
    pub monthly_revenue: Money,
    pub total_orders: u64,
    pub total_products: u64,
    pub low_stock: u64,
    pub new_customers: u64,
}

/// One of the cashier's latest sales.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RecentSale {
    pub id: SaleId,
    pub amount: Money,
    pub method: PaymentMethod,
    /// Local `HH:MM`.
    pub time: String,
}

/// Best seller of the shift.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TopProduct {
    pub name: String,
    pub count: u64,
}

/// Product close to running out.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LowStockAlert {
    pub name: String,
    pub stock: i64,
}

/// Cashier dashboard for the current shift.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CashierSummary {
    pub total_cash: Money,
    pub total_mpesa: Money,
    pub transactions_count: u64,
    #[serde(default)]
    pub recent_sales: Vec<RecentSale>,
    #[serde(default)]
    pub top_products: Vec<TopProduct>,
    #[serde(default)]
    pub low_stock_alerts: Vec<LowStockAlert>,
}

impl CashierSummary {
    /// Cash plus M-Pesa takings.
    #[must_use]
    pub fn total(&self) -> Money {
        self.total_cash + self.total_mpesa
    }
}

/// Shift totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ShiftTotals {
    pub cash: Money,
    pub mpesa: Money,
    pub grand_total: Money,
    pub transaction_count: u64,
}

/// Itemised line of the shift report.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ShiftItem {
    pub name: String,
    pub qty: u64,
    pub revenue: Money,
}

/// End-of-shift report for the calling cashier.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ShiftReport {
    pub cashier_name: String,
    pub business_name: String,
    pub date: String,
    pub time_generated: String,
    pub totals: ShiftTotals,
    #[serde(default)]
    pub items: Vec<ShiftItem>,
}

impl ShiftReport {
    /// Render as a fixed-width printable Z-report.
    #[must_use]
    pub fn render(&self) -> String {
        const WIDTH: usize = 40;
        let divider = "-".repeat(WIDTH);
        let row = |label: &str, value: &str| {
            let pad = WIDTH.saturating_sub(label.len() + value.len()).max(1);
            format!("{label}{}{value}\n", " ".repeat(pad))
        };

        let mut out = String::new();
        let _ = writeln!(out, "{:^WIDTH$}", self.business_name.to_uppercase());
        let _ = writeln!(out, "{:^WIDTH$}", "SHIFT Z-REPORT");
        out.push_str(&divider);
        out.push('\n');
        out.push_str(&row("Cashier:", &self.cashier_name));
        out.push_str(&row("Date:", &self.date));
        out.push_str(&row("Generated:", &self.time_generated));
        out.push_str(&divider);
        out.push('\n');
        out.push_str(&row("CASH TOTAL:", &self.totals.cash.to_string()));
        out.push_str(&row("M-PESA TOTAL:", &self.totals.mpesa.to_string()));
        out.push_str(&divider);
        out.push('\n');
        out.push_str(&row("GRAND TOTAL:", &self.totals.grand_total.to_string()));
        out.push_str(&row("TRANS COUNT:", &self.totals.transaction_count.to_string()));
        out.push_str(&divider);
        out.push('\n');
        out.push_str("ITEMIZED SALES\n");
        for item in &self.items {
            out.push_str(&row(&format!("{} x{}", item.name, item.qty), &item.revenue.to_string()));
        }
        out
    }
}

impl ApiClient {
    /// Vendor dashboard numbers.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn dashboard_stats(&self) -> Result<DashboardStats, ApiError> {
        self.get_json("/dashboard/stats").await
    }

    /// Cashier's figures for today.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn cashier_summary(&self) -> Result<CashierSummary, ApiError> {
        self.get_json("/analytics/cashier-summary").await
    }

    /// End-of-shift report.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn shift_report(&self) -> Result<ShiftReport, ApiError> {
        self.get_json("/analytics/shift-report").await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const REPORT: &str = r#"{
        "cashier_name": "Kamau",
        "business_name": "Mama Mboga",
        "date": "2025-06-01",
        "time_generated": "18:02:11",
        "totals": {"cash": 1200.0, "mpesa": 800.0, "grand_total": 2000.0, "transaction_count": 7},
        "items": [{"name": "Soda", "qty": 10, "revenue": 800.0}]
    }"#;

    #[test]
    fn test_shift_report_render() {
        let report: ShiftReport = serde_json::from_str(REPORT).unwrap();
        let text = report.render();
        assert!(text.contains("MAMA MBOGA"));
        assert!(text.contains("GRAND TOTAL:"));
        assert!(text.contains("KES 2000.00"));
        assert!(text.contains("Soda x10"));
        assert!(text.lines().all(|l| l.len() <= 40));
    }

    #[test]
    fn test_cashier_summary_total() {
        let summary: CashierSummary = serde_json::from_str(
            r#"{"total_cash":150.0,"total_mpesa":50.5,"transactions_count":3,
                "recent_sales":[{"id":1,"amount":50.5,"method":"MPESA","time":"10:15"}]}"#,
        )
        .unwrap();
        assert_eq!(summary.total().to_string(), "KES 200.50");
        assert!(summary.top_products.is_empty());
    }

    #[test]
    fn test_dashboard_stats_tolerates_missing_fields() {
        let stats: DashboardStats = serde_json::from_str(r#"{"total_orders":4}"#).unwrap();
        assert_eq!(stats.total_orders, 4);
        assert_eq!(stats.monthly_revenue, Money::ZERO);
    }
}
