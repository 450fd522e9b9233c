//! Copperleaf Core - Shared types library.
//!
//! This crate provides common types used across the Copperleaf storefront:
//! ids, the email address type, and the wire enums spoken by the remote
//! authentication, catalog, and order services.
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. This keeps
//! it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
