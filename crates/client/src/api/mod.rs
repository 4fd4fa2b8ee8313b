//! Storefront backend API.
//!
//! # Architecture
//!
//! - The backend is the source of truth for users, catalog, carts and
//!   orders - NO local copies beyond the current view
//! - [`StorefrontApi`] is the seam between workflow logic and transport;
//!   [`HttpApi`] is the reqwest implementation
//! - Every non-2xx response carries `{"error": "..."}`, surfaced verbatim as
//!   [`ClientError::Backend`](crate::ClientError::Backend)
//!
//! # Example
//!
//! ```rust,ignore
//! use clicleitura_client::{ClientConfig, HttpApi, StorefrontApi};
//!
//! let api = HttpApi::new(&ClientConfig::from_env()?)?;
//! let cart = api.fetch_cart(UserId::new(7)).await?;
//! println!("{} item(s), {}", cart.len(), cart.total);
//! ```

mod http;
pub mod types;

pub use http::HttpApi;
pub use types::*;

use async_trait::async_trait;
use clicleitura_core::{BookId, CartItemId, Email, OrderId, UserId, UserIdentity};
use secrecy::SecretString;

use crate::error::Result;

/// Operations offered by the storefront backend.
#[async_trait]
pub trait StorefrontApi: Send + Sync {
    /// `GET /api/carrinho/{user_id}`
    async fn fetch_cart(&self, user_id: UserId) -> Result<Cart>;

    /// `DELETE /api/carrinho/remover/{item_id}`
    async fn remove_cart_item(&self, item_id: CartItemId) -> Result<()>;

    /// `POST /api/carrinho/adicionar`
    async fn add_to_cart(&self, user_id: UserId, book_id: BookId) -> Result<()>;

    /// `POST /api/checkout` - create a pending order for one book.
    async fn checkout_item(
        &self,
        book_id: BookId,
        email: &Email,
        user_id: UserId,
    ) -> Result<PixCharge>;

    /// `POST /api/confirmar_pagamento` - report payment of a single-book order.
    async fn confirm_payment(&self, order_id: OrderId) -> Result<Confirmation>;

    /// `POST /api/carrinho/finalizar-pix` - turn the whole cart into one order.
    async fn finalize_cart_pix(&self, user_id: UserId, email: &Email) -> Result<CartPixCharge>;

    /// `POST /api/confirmar-pagamento-pix` - report payment of a cart order.
    async fn confirm_pix_payment(&self, order_id: OrderId) -> Result<Confirmation>;

    /// `POST /api/login`
    async fn login(&self, email: &Email, password: &SecretString) -> Result<UserIdentity>;

    /// `GET /api/perfil/{user_id}`
    async fn fetch_profile(&self, user_id: UserId) -> Result<Profile>;
}
