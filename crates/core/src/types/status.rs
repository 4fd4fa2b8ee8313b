//! Order status as reported by the backend.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a backend order.
///
/// Orders start as `PENDENTE`, move to `PENDENTE_APROVACAO` once the buyer
/// reports the PIX payment, and are then approved (`PAGO`) or rejected by an
/// administrator. Statuses this client does not know about deserialize to
/// [`OrderStatus::Unknown`] so one odd row cannot break the order history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pendente,
    PendenteAprovacao,
    Pago,
    Rejeitado,
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    /// Human-readable label shown in the order history.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pendente => "Aguardando pagamento",
            Self::PendenteAprovacao => "Aguardando aprovação",
            Self::Pago => "Pago",
            Self::Rejeitado => "Rejeitado",
            Self::Unknown => "Desconhecido",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
