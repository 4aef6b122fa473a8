//! RadaPOS Client - everything a point-of-sale front end needs short of
//! drawing pixels.
//!
//! # Architecture
//!
//! A [`SessionContext`](session::SessionContext) owns the logged-in identity
//! and its credential. The [`ApiClient`](api::ApiClient) reads the credential
//! on every request and ends the session on any 401. Cart, offline queue,
//! session and theme are persisted through a [`KeyValueStore`](storage::KeyValueStore)
//! so the terminal survives restarts.
//!
//! # Modules
//!
//! - [`api`] - REST client, interceptors and endpoint schemas
//! - [`cart`] - Cart, offline sale queue and checkout
//! - [`config`] - Environment configuration
//! - [`poller`] - Notification refresh task
//! - [`preferences`] - Theme
//! - [`routes`] - Role-scoped route guard
//! - [`session`] - Session/auth store
//! - [`storage`] - Key-value persistence
//! - [`validation`] - Form checks run before any request

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod config;
pub mod poller;
pub mod preferences;
pub mod routes;
pub mod session;
pub mod storage;
pub mod validation;

pub use api::{ApiClient, ApiError};
pub use config::ClientConfig;
pub use session::SessionContext;
