//! Unified client error type.
//!
//! Failures a user sees fall into one of three kinds:
//! - transport: the backend could not be reached (or timed out)
//! - backend: the backend answered non-2xx, usually with `{"error": "..."}`
//! - precondition: a local check failed before any request was sent
//!
//! Malformed 2xx bodies and session file errors get their own variants.
//! None of them is fatal; callers show [`ClientError::user_message`] and let
//! the user retry.

use clicleitura_core::OrderId;
use thiserror::Error;

use crate::session::SessionError;

/// Generic text shown for transport failures.
pub const CONNECTION_ERROR_MESSAGE: &str = "Erro ao conectar com o servidor";

/// Local checks that short-circuit an operation before the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Precondition {
    /// No cached identity.
    #[error("Você precisa fazer login para continuar!")]
    NotLoggedIn,

    /// Confirmation requested with no checkout in progress.
    #[error("Nenhum pedido em andamento!")]
    NoActiveOrder,

    /// Cart-wide checkout on an empty cart.
    #[error("Seu carrinho está vazio!")]
    EmptyCart,

    /// A second checkout while a previous PIX charge awaits payment.
    #[error(
        "O pedido #{0} ainda aguarda pagamento. Confirme o pagamento ou feche-o antes de iniciar outra compra."
    )]
    OrderAlreadyPending(OrderId),
}

/// Application-level error type for the storefront client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a response (connect error, timeout).
    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered with a non-2xx status.
    #[error("Backend error ({status}): {message}")]
    Backend {
        /// HTTP status code.
        status: u16,
        /// The backend's `error` string, verbatim.
        message: String,
    },

    /// A 2xx body did not match the expected shape.
    #[error("Unexpected response: {0}")]
    Decode(String),

    /// A local check failed; nothing was sent.
    #[error(transparent)]
    Precondition(#[from] Precondition),

    /// The cached session record could not be written or removed.
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ClientError {
    /// The text the view should show for this error.
    ///
    /// Backend messages are passed through unchanged.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => CONNECTION_ERROR_MESSAGE.to_string(),
            Self::Backend { message, .. } => message.clone(),
            Self::Decode(_) => "Resposta inesperada do servidor".to_string(),
            Self::Precondition(p) => p.to_string(),
            Self::Session(_) => "Erro ao acessar a sessão local".to_string(),
        }
    }

    /// Whether the backend was never reached.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// The backend's error string, if this is a backend error.
    #[must_use]
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Self::Backend { message, .. } => Some(message),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Result type alias for `ClientError`.
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_message_is_verbatim() {
        let err = ClientError::Backend {
            status: 404,
            message: "Pedido não encontrado".to_string(),
        };
        assert_eq!(err.user_message(), "Pedido não encontrado");
        assert_eq!(err.backend_message(), Some("Pedido não encontrado"));
        assert!(!err.is_transport());
    }

    #[test]
    fn test_network_error_uses_generic_text() {
        let err = ClientError::Network("connection refused".to_string());
        assert_eq!(err.user_message(), CONNECTION_ERROR_MESSAGE);
        assert!(err.is_transport());
    }

    #[test]
    fn test_precondition_messages() {
        let err = ClientError::from(Precondition::NoActiveOrder);
        assert_eq!(err.user_message(), "Nenhum pedido em andamento!");

        let err = ClientError::from(Precondition::OrderAlreadyPending(OrderId::new(55)));
        assert!(err.user_message().starts_with("O pedido #55"));
    }
}
