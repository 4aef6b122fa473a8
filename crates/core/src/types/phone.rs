//! M-Pesa phone numbers.
//!
//! Safaricom STK pushes require the international `2547XXXXXXXX` form.
//! Cashiers usually type the local `07XXXXXXXX` form, so parsing rewrites a
//! leading `0` to the `254` country prefix before validating.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`PhoneNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid M-Pesa phone number: {0} (expected 254 followed by 9 digits)")]
pub struct PhoneError(pub String);

/// A normalised M-Pesa phone number (`254` + 9 digits).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    const COUNTRY_PREFIX: &'static str = "254";
    const SUBSCRIBER_DIGITS: usize = 9;

    /// Normalise and validate a phone number.
    ///
    /// # Errors
    ///
    /// Returns [`PhoneError`] unless the normalised value is `254` followed by
    /// exactly nine ASCII digits.
    pub fn parse(input: &str) -> Result<Self, PhoneError> {
        let trimmed = input.trim();
        let normalized = trimmed.strip_prefix('0').map_or_else(
            || trimmed.to_owned(),
            |rest| format!("{}{rest}", Self::COUNTRY_PREFIX),
        );

        let valid = normalized
            .strip_prefix(Self::COUNTRY_PREFIX)
            .is_some_and(|rest| {
                rest.len() == Self::SUBSCRIBER_DIGITS && rest.bytes().all(|b| b.is_ascii_digit())
            });

        if valid {
            Ok(Self(normalized))
        } else {
            Err(PhoneError(input.to_owned()))
        }
    }

    /// Returns the number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for PhoneNumber {
    type Err = PhoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
