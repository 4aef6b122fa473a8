//! User roles.

use serde::{Deserialize, Serialize};

/// Error returned when a role string is not recognised.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid role: {0}")]
pub struct RoleParseError(pub String);

/// Top-level role of a RadaPOS user. Decides which dashboard they may open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Platform operator: events, vendors, users, withdrawals.
    #[serde(alias = "ADMIN")]
    Admin,
    /// Event vendor: inventory, staff, wallet.
    #[serde(alias = "VENDOR")]
    Vendor,
    /// Point-of-sale operator working for a vendor.
    #[serde(alias = "CASHIER")]
    Cashier,
}

impl Role {
    /// Wire name of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Vendor => "vendor",
            Self::Cashier => "cashier",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "vendor" => Ok(Self::Vendor),
            "cashier" => Ok(Self::Cashier),
            _ => Err(RoleParseError(s.to_owned())),
        }
    }
}

/// Finer-grained permission level for admin users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdminRole {
    /// Full platform access including admin user management.
    Administrator,
    /// Approves vendors and payouts.
    Manager,
    /// Read access to wallets and reports.
    Accountant,
}

impl std::fmt::Display for AdminRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Administrator => write!(f, "ADMINISTRATOR"),
            Self::Manager => write!(f, "MANAGER"),
            Self::Accountant => write!(f, "ACCOUNTANT"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_str_is_case_insensitive() {
        assert_eq!("Vendor".parse::<Role>().unwrap(), Role::Vendor);
        assert_eq!(" cashier ".parse::<Role>().unwrap(), Role::Cashier);
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serde() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        let upper: Role = serde_json::from_str("\"CASHIER\"").unwrap();
        assert_eq!(upper, Role::Cashier);
        let role: AdminRole = serde_json::from_str("\"MANAGER\"").unwrap();
        assert_eq!(role, AdminRole::Manager);
    }
}
