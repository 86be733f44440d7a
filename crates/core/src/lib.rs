//! Greenshoes Core - Shared types library.
//!
//! This crate provides the types shared by the Greenshoes storefront
//! components:
//! - `client` - Session handling and REST client for the storefront API
//! - `cli` - Command-line shopper built on the client
//!
//! # Architecture
//!
//! The core crate contains only types and pure validation - no I/O, no
//! storage, no HTTP clients. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - IDs, prices, emails, session credentials, password policy,
//!   card helpers and order statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
