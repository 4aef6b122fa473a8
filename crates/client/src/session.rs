//! Session/auth store.
//!
//! [`SessionContext`] is the single owner of "who is logged in". It is an
//! explicit object handed to the REST client and the front end rather than
//! ambient global state, with a defined lifecycle:
//!
//! - [`SessionContext::init`] on start: restore any persisted session
//! - [`SessionContext::login`] / [`SessionContext::logout`] while running
//! - [`SessionContext::teardown`] on exit or explicit sign-out
//!
//! The credential is never revalidated locally. Its validity is only
//! discovered when the backend rejects a request with 401, at which point the
//! REST client calls [`SessionContext::expire`].
//!
//! Listeners (a UI shell, the CLI) learn where to navigate through a
//! broadcast channel of [`Navigation`] events.

use std::sync::{Arc, PoisonError, RwLock};

use radapos_core::{AdminRole, Role, UserId};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::storage::{KeyValueStore, StorageError, keys, load_json, save_json};

const NAVIGATION_CHANNEL_CAPACITY: usize = 16;

/// The authenticated user as returned by the backend's login endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Backend user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// Top-level role.
    pub role: Role,
    /// Admin permission level (admins only).
    #[serde(default)]
    pub admin_role: Option<AdminRole>,
    /// Whether the account is enabled.
    #[serde(default = "default_active")]
    pub is_active: bool,
}

const fn default_active() -> bool {
    true
}

/// An authenticated session: identity plus bearer credential.
#[derive(Clone)]
pub struct Session {
    /// Who is logged in.
    pub identity: Identity,
    /// Opaque bearer token.
    pub credential: SecretString,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("identity", &self.identity)
            .field("credential", &"[REDACTED]")
            .finish()
    }
}

/// Why the user was sent back to the login entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutReason {
    /// The user signed out.
    UserRequested,
    /// The backend rejected the stored credential.
    Unauthorized,
}

/// Where the front end should go after a session change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Landing page of the given role.
    Landing(Role),
    /// Login entry point. In-memory application state should be discarded.
    Login {
        /// What ended the session.
        reason: LogoutReason,
    },
}

/// Injectable session store.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct SessionContext {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    store: Arc<dyn KeyValueStore>,
    current: RwLock<Option<Session>>,
    events: broadcast::Sender<Navigation>,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("identity", &self.identity())
            .finish_non_exhaustive()
    }
}

impl SessionContext {
    /// Create a context with no active session. Nothing is read from storage.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let (events, _) = broadcast::channel(NAVIGATION_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(SessionInner {
                store,
                current: RwLock::new(None),
                events,
            }),
        }
    }

    /// Create a context and restore any persisted session.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    pub fn init(store: Arc<dyn KeyValueStore>) -> Result<Self, StorageError> {
        let ctx = Self::new(store);
        ctx.restore()?;
        Ok(ctx)
    }

    /// Reload the session from storage.
    ///
    /// Both the credential and the identity must be present for the session
    /// to become active. The credential is not checked with the backend.
    /// An identity that no longer parses is treated as a corrupt session and
    /// both keys are removed.
    ///
    /// Returns whether a session is active afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read or cleaned up.
    pub fn restore(&self) -> Result<bool, StorageError> {
        let store = self.inner.store.as_ref();
        let token = store.get(keys::ACCESS_TOKEN)?;
        let raw_user = store.get(keys::USER)?;

        let restored = match (token, raw_user) {
            (Some(token), Some(raw_user)) => match serde_json::from_str::<Identity>(&raw_user) {
                Ok(identity) => Some(Session {
                    identity,
                    credential: SecretString::from(token),
                }),
                Err(e) => {
                    warn!(error = %e, "Stored identity is corrupt, clearing session");
                    store.remove(keys::ACCESS_TOKEN)?;
                    store.remove(keys::USER)?;
                    None
                }
            },
            _ => None,
        };

        let active = restored.is_some();
        if let Some(session) = &restored {
            info!(
                user_id = %session.identity.id,
                role = %session.identity.role,
                "Restored session"
            );
        }
        *self.write() = restored;
        Ok(active)
    }

    /// Start a session and persist it.
    ///
    /// Replaces any existing session wholesale and emits
    /// [`Navigation::Landing`] for the identity's role.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be persisted.
    pub fn login(&self, credential: SecretString, identity: Identity) -> Result<(), StorageError> {
        let store = self.inner.store.as_ref();
        store.set(keys::ACCESS_TOKEN, credential.expose_secret())?;
        save_json(store, keys::USER, &identity)?;

        let role = identity.role;
        info!(user_id = %identity.id, role = %role, "Logged in");
        *self.write() = Some(Session {
            identity,
            credential,
        });

        self.emit(Navigation::Landing(role));
        Ok(())
    }

    /// End the session at the user's request.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted keys cannot be removed. In-memory
    /// state is cleared regardless.
    pub fn logout(&self) -> Result<(), StorageError> {
        self.end(LogoutReason::UserRequested)
    }

    /// End the session because the backend rejected the credential.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted keys cannot be removed. In-memory
    /// state is cleared regardless.
    pub fn expire(&self) -> Result<(), StorageError> {
        self.end(LogoutReason::Unauthorized)
    }

    /// Lifecycle hook for shutdown/sign-out. Same as [`Self::logout`].
    ///
    /// # Errors
    ///
    /// See [`Self::logout`].
    pub fn teardown(&self) -> Result<(), StorageError> {
        self.logout()
    }

    fn end(&self, reason: LogoutReason) -> Result<(), StorageError> {
        *self.write() = None;

        let store = self.inner.store.as_ref();
        let token_result = store.remove(keys::ACCESS_TOKEN);
        let user_result = store.remove(keys::USER);

        info!(?reason, "Session ended");
        self.emit(Navigation::Login { reason });

        token_result.and(user_result)
    }

    /// The active session, if any.
    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.read().clone()
    }

    /// The active identity, if any.
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.read().as_ref().map(|s| s.identity.clone())
    }

    /// Whether a session is active in memory.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.read().is_some()
    }

    /// Credential as currently persisted.
    ///
    /// This reads storage rather than memory so another writer's login or
    /// logout is picked up on the next request.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    pub fn stored_credential(&self) -> Result<Option<SecretString>, StorageError> {
        Ok(self
            .inner
            .store
            .get(keys::ACCESS_TOKEN)?
            .filter(|t| !t.is_empty())
            .map(SecretString::from))
    }

    /// Stored identity, read directly from storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    pub fn stored_identity(&self) -> Result<Option<Identity>, StorageError> {
        load_json(self.inner.store.as_ref(), keys::USER)
    }

    /// Subscribe to navigation events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Navigation> {
        self.inner.events.subscribe()
    }

    /// The backing store shared with the rest of the client.
    #[must_use]
    pub fn store(&self) -> Arc<dyn KeyValueStore> {
        Arc::clone(&self.inner.store)
    }

    fn emit(&self, nav: Navigation) {
        // No subscribers is fine.
        let _ = self.inner.events.send(nav);
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Option<Session>> {
        self.inner
            .current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Option<Session>> {
        self.inner
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
