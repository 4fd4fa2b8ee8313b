//! ClicLeitura Core - Shared types library.
//!
//! This crate provides the domain types used by every ClicLeitura component:
//! - `client` - Backend API client, session store and checkout controller
//! - `cli` - Terminal front-end for browsing the cart and paying with PIX
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no storage.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, order
//!   statuses and the cached user identity

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
