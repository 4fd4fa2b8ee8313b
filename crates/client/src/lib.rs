//! ClicLeitura storefront client.
//!
//! Talks to the ClicLeitura backend over JSON/HTTP and drives the cart,
//! checkout and PIX payment workflow for one page lifetime.
//!
//! - [`api`]: backend operations ([`StorefrontApi`]) and the reqwest client
//! - [`session`]: the cached identity read once per page lifetime
//! - [`checkout`]: `NoOrder → AwaitingPayment → Confirmed`
//! - [`view`]: display data and the [`View`] rendering boundary
//! - [`controller`]: [`CartCheckoutController`], one method per user action

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod checkout;
pub mod config;
pub mod controller;
pub mod error;
pub mod session;
pub mod view;

pub use api::{HttpApi, StorefrontApi};
pub use checkout::{CheckoutState, OrderKind, PendingOrder};
pub use config::{ClientConfig, ConfigError};
pub use controller::CartCheckoutController;
pub use error::{ClientError, Precondition, Result};
pub use session::{Session, SessionError, SessionStore};
pub use view::{Route, View};
