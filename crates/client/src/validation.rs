//! Local form validation.
//!
//! Everything here runs before a request is built. A failure is reported to
//! the user inline and nothing is sent to the backend.

use radapos_core::{EmailError, Money, PhoneError};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Minimum length for a password chosen when replacing a temporary one.
pub const MIN_NEW_PASSWORD_LEN: usize = 8;

/// Minimum length for a password set through the reset-link flow.
pub const MIN_RESET_PASSWORD_LEN: usize = 6;

/// Smallest amount a cashier may tender or a vendor may withdraw.
pub const MIN_AMOUNT: Decimal = Decimal::ONE;

/// Input rejected before contacting the backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// New password and confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// New password is too short.
    #[error("password must be at least {min} characters")]
    PasswordTooShort {
        /// Required length.
        min: usize,
    },

    /// New password equals the one being replaced.
    #[error("new password cannot be the same as the current password")]
    PasswordUnchanged,

    /// Amount is not a number, or below the minimum.
    #[error("please enter a valid amount (got {0:?})")]
    InvalidAmount(String),

    /// Requested more than the wallet holds.
    #[error("insufficient wallet balance: requested {requested}, available {available}")]
    InsufficientBalance {
        /// Amount asked for.
        requested: Money,
        /// Current balance.
        available: Money,
    },

    /// Split payment legs do not add up to the total.
    #[error("split amounts must match total: cash {cash} + M-Pesa {mpesa} != {total}")]
    SplitMismatch {
        /// Cash leg.
        cash: Money,
        /// M-Pesa leg.
        mpesa: Money,
        /// Sale total.
        total: Money,
    },

    /// Phone number is not a valid M-Pesa number.
    #[error(transparent)]
    Phone(#[from] PhoneError),

    /// Email is malformed.
    #[error(transparent)]
    Email(#[from] EmailError),
}

/// Parse a typed amount: a finite decimal of at least [`MIN_AMOUNT`].
///
/// # Errors
///
/// Returns [`ValidationError::InvalidAmount`] for empty, non-numeric, or
/// too-small input.
pub fn parse_amount(input: &str) -> Result<Money, ValidationError> {
    let trimmed = input.trim();
    let amount: Decimal = trimmed
        .parse()
        .map_err(|_| ValidationError::InvalidAmount(input.to_owned()))?;
    if amount < MIN_AMOUNT {
        return Err(ValidationError::InvalidAmount(input.to_owned()));
    }
    Ok(Money::new(amount))
}

/// Check a password change form.
///
/// # Errors
///
/// Returns the first rule the new password breaks.
pub fn check_new_password(
    new_password: &SecretString,
    confirmation: &SecretString,
    min_len: usize,
    current: Option<&SecretString>,
) -> Result<(), ValidationError> {
    let new = new_password.expose_secret();
    if new != confirmation.expose_secret() {
        return Err(ValidationError::PasswordMismatch);
    }
    if new.chars().count() < min_len {
        return Err(ValidationError::PasswordTooShort { min: min_len });
    }
    if current.is_some_and(|c| c.expose_secret() == new) {
        return Err(ValidationError::PasswordUnchanged);
    }
    Ok(())
}

/// Check a withdrawal or payout amount against the wallet balance.
///
/// # Errors
///
/// Returns [`ValidationError::InsufficientBalance`] when `requested` exceeds
/// `available`.
pub fn check_balance(requested: Money, available: Money) -> Result<(), ValidationError> {
    if requested > available {
        return Err(ValidationError::InsufficientBalance {
            requested,
            available,
        });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount(" 250 ").unwrap(), Money::from_shillings(250));
        assert_eq!(parse_amount("1").unwrap(), Money::from_shillings(1));
        for bad in ["", "abc", "0", "0.99", "-5", "NaN", "inf", "1e999"] {
            assert!(parse_amount(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_check_new_password() {
        let s = |v: &str| SecretString::from(v.to_owned());
        assert_eq!(
            check_new_password(&s("abcdefgh"), &s("abcdefgX"), 8, None),
            Err(ValidationError::PasswordMismatch)
        );
        assert_eq!(
            check_new_password(&s("short"), &s("short"), 8, None),
            Err(ValidationError::PasswordTooShort { min: 8 })
        );
        assert_eq!(
            check_new_password(&s("temp-pass-1"), &s("temp-pass-1"), 8, Some(&s("temp-pass-1"))),
            Err(ValidationError::PasswordUnchanged)
        );
        assert!(check_new_password(&s("fresh-pass"), &s("fresh-pass"), 8, Some(&s("old"))).is_ok());
    }

    #[test]
    fn test_check_balance() {
        let balance = Money::from_shillings(1_000);
        assert!(check_balance(Money::from_shillings(1_000), balance).is_ok());
        assert!(matches!(
            check_balance(Money::from_shillings(1_001), balance),
            Err(ValidationError::InsufficientBalance { .. })
        ));
    }
}
