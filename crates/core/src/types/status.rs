//! Status enums shared by the client and the terminal.

use serde::{Deserialize, Serialize};

/// How a sale was paid.
///
/// Offline checkout payloads use the lowercase `cash` spelling while the
/// terminal sale endpoint expects `CASH`/`MPESA`/`SPLIT`; serde accepts both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[default]
    #[serde(alias = "cash")]
    Cash,
    #[serde(alias = "mpesa")]
    Mpesa,
    #[serde(alias = "split")]
    Split,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cash => write!(f, "CASH"),
            Self::Mpesa => write!(f, "MPESA"),
            Self::Split => write!(f, "SPLIT"),
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cash" => Ok(Self::Cash),
            "mpesa" | "m-pesa" => Ok(Self::Mpesa),
            "split" => Ok(Self::Split),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}

/// Withdrawal request lifecycle as reported by the backend.
///
/// The wallet service writes lowercase statuses, the admin views uppercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WithdrawalStatus {
    #[serde(alias = "pending")]
    Pending,
    #[serde(alias = "approved")]
    Approved,
    #[serde(alias = "rejected")]
    Rejected,
    #[serde(alias = "completed")]
    Completed,
    #[serde(alias = "failed")]
    Failed,
}

impl std::fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// Admin decision on a pending withdrawal or vendor application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewAction {
    Approve,
    Reject,
}

impl ReviewAction {
    /// Path segment used by the review endpoints.
    #[must_use]
    pub const fn as_path(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
        }
    }
}

/// Vendor approval workflow state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    Draft,
    Submitted,
    Approved,
    Rejected,
    Returned,
}

/// Whether a staff account may log in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaffStatus {
    Active,
    Inactive,
}

impl StaffStatus {
    /// The opposite status, used by the activate/deactivate toggle.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Active => Self::Inactive,
            Self::Inactive => Self::Active,
        }
    }
}

impl std::fmt::Display for StaffStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => f.write_str("active"),
            Self::Inactive => f.write_str("inactive"),
        }
    }
}

/// Severity of an in-app notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    #[default]
    Info,
    Success,
    Warning,
    #[serde(alias = "danger")]
    Error,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_method_accepts_both_spellings() {
        let lower: PaymentMethod = serde_json::from_str("\"cash\"").unwrap();
        let upper: PaymentMethod = serde_json::from_str("\"CASH\"").unwrap();
        assert_eq!(lower, upper);
        assert_eq!(serde_json::to_string(&PaymentMethod::Mpesa).unwrap(), "\"MPESA\"");
    }

    #[test]
    fn test_withdrawal_status_either_case() {
        let a: WithdrawalStatus = serde_json::from_str("\"pending\"").unwrap();
        let b: WithdrawalStatus = serde_json::from_str("\"PENDING\"").unwrap();
        assert_eq!(a, b);
        assert_eq!(WithdrawalStatus::Completed.to_string(), "COMPLETED");
    }

    #[test]
    fn test_staff_status_toggle() {
        assert_eq!(StaffStatus::Active.toggled(), StaffStatus::Inactive);
        assert_eq!(StaffStatus::Inactive.to_string(), "inactive");
    }

    #[test]
    fn test_review_action_path() {
        assert_eq!(ReviewAction::Approve.as_path(), "approve");
        assert_eq!(ReviewAction::Reject.as_path(), "reject");
    }
}
