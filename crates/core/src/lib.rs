//! RadaPOS Core - Shared domain types.
//!
//! This crate provides the types shared by every RadaPOS component:
//! - `client` - Session, REST client, cart and offline queue
//! - `cli` - The `rada` point-of-sale terminal
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access,
//! no HTTP clients. This keeps it usable from any front end.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, money, emails, phone numbers,
//!   roles and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
