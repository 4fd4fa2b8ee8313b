//! Wire types for the storefront backend.
//!
//! Field names follow the backend's JSON (Portuguese) through serde renames;
//! the Rust side uses English names.

use clicleitura_core::{
    BookId, CartItemId, Email, OrderId, OrderStatus, Price, UserId, UserIdentity,
};
use serde::{Deserialize, Deserializer, Serialize};

/// Treat an explicit JSON `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// =============================================================================
// Cart
// =============================================================================

/// One row of a user's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Cart row ID (what removal takes), not the book ID.
    pub id: CartItemId,
    #[serde(rename = "livro_id", default, skip_serializing_if = "Option::is_none")]
    pub book_id: Option<BookId>,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "autor", default, deserialize_with = "null_as_default")]
    pub author: String,
    #[serde(rename = "preco")]
    pub price: Price,
    /// Image file name or absolute URL. Empty when the book has none.
    #[serde(rename = "imagem", default, deserialize_with = "null_as_default")]
    pub image: String,
}

/// Snapshot of a user's cart.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cart {
    #[serde(rename = "itens", default)]
    pub items: Vec<CartItem>,
    /// Backend-computed total; displayed as reported.
    #[serde(default)]
    pub total: Price,
}

impl Cart {
    /// Number of rows in the cart.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// =============================================================================
// Checkout & payment
// =============================================================================

/// PIX charge for a single-book checkout.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PixCharge {
    #[serde(rename = "pedido_id")]
    pub order_id: OrderId,
    /// Base64-encoded PNG of the QR code.
    pub qr_base64: String,
    /// PIX "copia e cola" payment string.
    #[serde(rename = "pix_text")]
    pub payment_code: String,
}

/// PIX charge for a whole-cart checkout.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CartPixCharge {
    #[serde(rename = "pedido_id")]
    pub order_id: OrderId,
    pub total: Price,
    #[serde(rename = "quantidade")]
    pub item_count: u32,
    pub qr_base64: String,
    #[serde(rename = "pix_text")]
    pub payment_code: String,
    /// Titles included in the consolidated order.
    #[serde(rename = "livros", default)]
    pub titles: Vec<String>,
}

/// Result of a payment confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct Confirmation {
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of every non-2xx response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

// =============================================================================
// Account
// =============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    pub usuario: UserIdentity,
}

/// Profile page data: the user, order statistics and order history.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Profile {
    #[serde(rename = "usuario")]
    pub user: ProfileUser,
    pub stats: ProfileStats,
    #[serde(rename = "pedidos", default)]
    pub orders: Vec<OrderSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProfileUser {
    pub id: UserId,
    #[serde(rename = "nome")]
    pub name: String,
    pub email: Email,
    /// Account creation timestamp as stored by the backend.
    #[serde(rename = "membro_desde", default)]
    pub member_since: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProfileStats {
    #[serde(rename = "total_pedidos")]
    pub total_orders: u32,
    #[serde(rename = "pedidos_pagos")]
    pub paid_orders: u32,
    #[serde(rename = "pedidos_pendentes")]
    pub pending_orders: u32,
    #[serde(rename = "total_gasto")]
    pub total_spent: Price,
}

/// One past order in the history.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrderSummary {
    pub id: OrderId,
    #[serde(rename = "titulo", default)]
    pub title: Option<String>,
    #[serde(rename = "autor", default)]
    pub author: Option<String>,
    #[serde(rename = "preco", default)]
    pub price: Price,
    pub status: OrderStatus,
    #[serde(rename = "data", default)]
    pub created_at: Option<String>,
}

// =============================================================================
// Request bodies
// =============================================================================

#[derive(Debug, Serialize)]
pub(crate) struct AddToCartRequest {
    pub usuario_id: UserId,
    pub livro_id: BookId,
}

#[derive(Debug, Serialize)]
pub(crate) struct CheckoutRequest<'a> {
    pub livro_id: BookId,
    pub email: &'a Email,
    pub usuario_id: UserId,
}

#[derive(Debug, Serialize)]
pub(crate) struct FinalizeCartRequest<'a> {
    pub usuario_id: UserId,
    pub email: &'a Email,
}

#[derive(Debug, Serialize)]
pub(crate) struct OrderRequest {
    pub pedido_id: OrderId,
}

#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a Email,
    pub senha: &'a str,
}
