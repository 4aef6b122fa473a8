//! Integration tests for RadaPOS.
//!
//! Every test runs the real [`ApiClient`] against a `wiremock` backend on a
//! random local port, with state kept in a [`MemoryStore`]. Nothing external
//! is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p radapos-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `session_expiry` - Bearer header and 401 handling
//! - `checkout` - Online checkout and offline queue sync
//! - `polling` - M-Pesa status polling and the notification poller

use std::sync::Arc;

use radapos_client::session::Identity;
use radapos_client::storage::{KeyValueStore, MemoryStore};
use radapos_client::{ApiClient, SessionContext};
use radapos_core::{Role, UserId};
use secrecy::SecretString;
use url::Url;
use wiremock::MockServer;

/// Credential stored by [`TestContext::signed_in`].
pub const TEST_TOKEN: &str = "test-token-123";

/// A mock backend and a client wired to it.
pub struct TestContext {
    pub server: MockServer,
    pub store: Arc<MemoryStore>,
    pub session: SessionContext,
    pub client: ApiClient,
}

impl TestContext {
    /// Start a mock backend with nobody signed in.
    ///
    /// # Panics
    ///
    /// Panics if the mock server URI is not a valid URL.
    pub async fn new() -> Self {
        let server = MockServer::start().await;
        let store = Arc::new(MemoryStore::new());
        let dyn_store: Arc<dyn KeyValueStore> = store.clone();
        let session = SessionContext::new(dyn_store);
        let base = Url::parse(&server.uri()).expect("Mock server URI should parse");
        let client = ApiClient::with_base_url(base, session.clone()).expect("Failed to build client");
        Self {
            server,
            store,
            session,
            client,
        }
    }

    /// Start a mock backend with a stored session for `role`.
    ///
    /// # Panics
    ///
    /// Panics if the session cannot be stored.
    pub async fn signed_in(role: Role) -> Self {
        let ctx = Self::new().await;
        ctx.session
            .login(SecretString::from(TEST_TOKEN), identity(role))
            .expect("Failed to store session");
        ctx
    }
}

/// Identity as the login endpoint would return it.
#[must_use]
pub fn identity(role: Role) -> Identity {
    Identity {
        id: UserId::new(7),
        name: "Wanjiku".to_owned(),
        email: "wanjiku@example.com".to_owned(),
        role,
        admin_role: None,
        is_active: true,
    }
}
