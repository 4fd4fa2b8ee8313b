//! Core types for ClicLeitura.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod identity;
pub mod price;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use identity::UserIdentity;
pub use price::Price;
pub use status::OrderStatus;
