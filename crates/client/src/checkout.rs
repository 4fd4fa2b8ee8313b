//! Checkout/payment state for one page lifetime.
//!
//! ```text
//! NoOrder ──checkout ok──▶ AwaitingPayment ──confirm ok──▶ Confirmed
//!                            │    ▲
//!                            │    └── confirm failed (retry allowed)
//!                            └── panel closed ──▶ NoOrder
//! ```
//!
//! A checkout while an order awaits payment is rejected; the user has to
//! confirm it or close the panel first. Abandoning only forgets the order
//! locally; the backend keeps it pending.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use clicleitura_core::{OrderId, Price};

use crate::api::{CartPixCharge, PixCharge};
use crate::error::{ClientError, Precondition, Result};

/// Which checkout created the order; decides the confirmation endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderKind {
    /// `/api/checkout`, confirmed through `/api/confirmar_pagamento`.
    SingleItem,
    /// `/api/carrinho/finalizar-pix`, confirmed through
    /// `/api/confirmar-pagamento-pix`.
    WholeCart,
}

/// An order created by checkout and not yet reported as paid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOrder {
    pub order_id: OrderId,
    pub kind: OrderKind,
    /// Only reported for whole-cart orders.
    pub total: Option<Price>,
    /// Only reported for whole-cart orders.
    pub item_count: Option<u32>,
    /// QR code exactly as sent by the backend (base64 PNG).
    pub qr_base64: String,
    /// Decoded QR code PNG bytes.
    pub qr_png: Vec<u8>,
    /// PIX "copia e cola" string.
    pub payment_code: String,
}

impl PendingOrder {
    /// Build from a single-book checkout response.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Decode` if the QR payload is not valid base64.
    pub fn from_single(charge: PixCharge) -> Result<Self> {
        let qr_png = decode_qr(&charge.qr_base64)?;
        Ok(Self {
            order_id: charge.order_id,
            kind: OrderKind::SingleItem,
            total: None,
            item_count: None,
            qr_base64: charge.qr_base64,
            qr_png,
            payment_code: charge.payment_code,
        })
    }

    /// Build from a whole-cart checkout response.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Decode` if the QR payload is not valid base64.
    pub fn from_cart(charge: CartPixCharge) -> Result<Self> {
        let qr_png = decode_qr(&charge.qr_base64)?;
        Ok(Self {
            order_id: charge.order_id,
            kind: OrderKind::WholeCart,
            total: Some(charge.total),
            item_count: Some(charge.item_count),
            qr_base64: charge.qr_base64,
            qr_png,
            payment_code: charge.payment_code,
        })
    }
}

fn decode_qr(qr_base64: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(qr_base64.trim())
        .map_err(|e| ClientError::Decode(format!("invalid QR code payload: {e}")))
}

/// Where the checkout flow stands.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CheckoutState {
    #[default]
    NoOrder,
    AwaitingPayment(PendingOrder),
    Confirmed(OrderId),
}

impl CheckoutState {
    /// The order awaiting payment, if any.
    #[must_use]
    pub const fn pending(&self) -> Option<&PendingOrder> {
        match self {
            Self::AwaitingPayment(order) => Some(order),
            Self::NoOrder | Self::Confirmed(_) => None,
        }
    }

    /// Fail unless a new checkout may start.
    ///
    /// # Errors
    ///
    /// Returns `Precondition::OrderAlreadyPending` while an order awaits payment.
    pub const fn ensure_can_begin(&self) -> std::result::Result<(), Precondition> {
        match self {
            Self::AwaitingPayment(order) => Err(Precondition::OrderAlreadyPending(order.order_id)),
            Self::NoOrder | Self::Confirmed(_) => Ok(()),
        }
    }

    /// Track a freshly created order.
    ///
    /// # Errors
    ///
    /// Returns `Precondition::OrderAlreadyPending` while another order awaits payment.
    pub fn begin(&mut self, order: PendingOrder) -> std::result::Result<(), Precondition> {
        self.ensure_can_begin()?;
        *self = Self::AwaitingPayment(order);
        Ok(())
    }

    /// Mark the pending order as confirmed.
    ///
    /// # Errors
    ///
    /// Returns `Precondition::NoActiveOrder` if nothing awaits payment.
    pub fn confirm(&mut self) -> std::result::Result<OrderId, Precondition> {
        let order_id = self
            .pending()
            .map(|order| order.order_id)
            .ok_or(Precondition::NoActiveOrder)?;
        *self = Self::Confirmed(order_id);
        Ok(order_id)
    }

    /// Forget the pending order. Returns it if there was one.
    pub fn abandon(&mut self) -> Option<PendingOrder> {
        match std::mem::take(self) {
            Self::AwaitingPayment(order) => Some(order),
            other => {
                *self = other;
                None
            }
        }
    }
}
