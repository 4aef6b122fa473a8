//! RadaPOS REST API client.
//!
//! One shared [`ApiClient`] talks to the backend. Every request passes
//! through the same interceptor pair (see [`interceptor`]):
//!
//! - outgoing: attach the stored bearer credential and pick the content type
//! - incoming: a 401 from any endpoint ends the session and forces the front
//!   end back to the login entry point
//!
//! Calls are fire-once. Nothing is retried, backed off, or de-duplicated;
//! errors are surfaced to the caller unchanged.
//!
//! Endpoint groups live in their own modules, each adding methods to
//! [`ApiClient`] and defining the response schemas it validates.

pub mod admin;
pub mod analytics;
pub mod auth;
mod client;
pub mod interceptor;
pub mod mpesa;
pub mod notifications;
pub mod products;
pub mod settings;
pub mod staff;
pub mod timestamp;
pub mod transactions;
pub mod wallet;

pub use client::ApiClient;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::storage::StorageError;
use crate::validation::ValidationError;

/// Errors that can occur when calling the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure (connection refused, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend rejected the credential. The session has been ended.
    #[error("Session expired - please log in again")]
    Unauthorized,

    /// Any other non-success status.
    #[error("Backend returned {status}: {message}")]
    Status {
        /// HTTP status.
        status: StatusCode,
        /// Message from the response body, or the status reason.
        message: String,
    },

    /// The response body did not match the expected schema.
    #[error("Unexpected response from {endpoint}: {source}")]
    Decode {
        /// Endpoint path.
        endpoint: String,
        /// Parse error.
        #[source]
        source: serde_json::Error,
    },

    /// A request body could not be serialized.
    #[error("Could not encode request for {endpoint}: {source}")]
    Encode {
        /// Endpoint path.
        endpoint: String,
        /// Serialization error.
        #[source]
        source: serde_json::Error,
    },

    /// Endpoint path could not be joined onto the base URL.
    #[error("Invalid endpoint path {0}")]
    InvalidPath(String),

    /// The stored credential cannot be sent as a header.
    #[error("Stored credential is not a valid header value")]
    InvalidCredential,

    /// Input rejected locally; nothing was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Session storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ApiError {
    /// HTTP status of a backend rejection, if this is one.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Unauthorized => Some(StatusCode::UNAUTHORIZED),
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the request never reached the backend.
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        match self {
            Self::Http(e) => e.is_connect() || e.is_timeout(),
            _ => false,
        }
    }
}

/// Generic `{ "msg": ... }` acknowledgement returned by mutating endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Ack {
    /// Human-readable result.
    #[serde(default, alias = "message")]
    pub msg: Option<String>,
}

impl Ack {
    /// Message text or a fallback.
    #[must_use]
    pub fn message_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.msg.as_deref().unwrap_or(fallback)
    }
}
