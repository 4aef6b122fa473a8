//! Subcommand implementations.
//!
//! Results are printed to stdout for the operator; diagnostics go through
//! `tracing` to stderr.

#![allow(clippy::print_stdout)]

pub mod notifications;
pub mod sales;
pub mod session;
pub mod wallet;

use std::sync::Arc;

use radapos_client::api::mpesa::MpesaError;
use radapos_client::cart::CheckoutError;
use radapos_client::config::ConfigError;
use radapos_client::storage::{FileStore, KeyValueStore, StorageError};
use radapos_client::validation::ValidationError;
use radapos_client::{ApiClient, ApiError, ClientConfig, SessionContext};
use thiserror::Error;

/// Errors surfaced by a subcommand.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error(transparent)]
    Mpesa(#[from] MpesaError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Product is not in the catalogue.
    #[error("No product with ID {0}")]
    UnknownProduct(radapos_core::ProductId),

    #[error("Not signed in - run `rada login` first")]
    NotSignedIn,
}

/// Everything a subcommand needs: config, persisted state, session and client.
pub struct Terminal {
    pub config: ClientConfig,
    pub store: Arc<dyn KeyValueStore>,
    pub session: SessionContext,
    pub client: ApiClient,
}

impl Terminal {
    /// Open the state directory and restore any stored session.
    ///
    /// # Errors
    ///
    /// Returns error if the state directory or HTTP client cannot be set up.
    pub fn open(config: ClientConfig) -> Result<Self, CliError> {
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&config.state_dir)?);
        let session = SessionContext::init(store.clone())?;
        let client = ApiClient::new(&config, session.clone())?;
        Ok(Self {
            config,
            store,
            session,
            client,
        })
    }

    /// Fail early when no session is stored.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::NotSignedIn`] if nobody is logged in.
    pub fn require_session(&self) -> Result<(), CliError> {
        if self.session.is_active() {
            Ok(())
        } else {
            Err(CliError::NotSignedIn)
        }
    }
}
