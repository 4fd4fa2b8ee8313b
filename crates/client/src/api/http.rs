//! reqwest implementation of [`StorefrontApi`].

use async_trait::async_trait;
use clicleitura_core::{BookId, CartItemId, Email, OrderId, UserId, UserIdentity};
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, error, instrument};

use super::StorefrontApi;
use super::types::{
    AddToCartRequest, Cart, CartPixCharge, CheckoutRequest, Confirmation, ErrorBody,
    FinalizeCartRequest, LoginRequest, LoginResponse, OrderRequest, PixCharge, Profile,
};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

/// JSON-over-HTTP client for the storefront backend.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    config: ClientConfig,
}

impl HttpApi {
    /// Create a client with the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("clicleitura-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        self.config.endpoint(path)
    }

    /// Send `request` and decode a 2xx JSON body as `T`.
    ///
    /// `fallback` is used when a non-2xx body carries no `error` string.
    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        fallback: &str,
    ) -> Result<T> {
        let bytes = self.send(request, fallback).await?;
        debug!(bytes = bytes.len(), "Response received");
        serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// Send `request`, returning the raw 2xx body.
    async fn send(&self, request: RequestBuilder, fallback: &str) -> Result<Vec<u8>> {
        let response = request.send().await.map_err(|e| {
            error!(error = %e, "Backend unreachable");
            ClientError::from(e)
        })?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.error)
                .unwrap_or_else(|| fallback.to_string());
            debug!(status = status.as_u16(), %message, "Backend rejected request");
            return Err(ClientError::Backend {
                status: status.as_u16(),
                message,
            });
        }

        Ok(body.to_vec())
    }
}

#[async_trait]
impl StorefrontApi for HttpApi {
    #[instrument(skip(self))]
    async fn fetch_cart(&self, user_id: UserId) -> Result<Cart> {
        let request = self.client.get(self.url(&format!("/api/carrinho/{user_id}")));
        self.send_json(request, "Erro ao carregar carrinho").await
    }

    #[instrument(skip(self))]
    async fn remove_cart_item(&self, item_id: CartItemId) -> Result<()> {
        let request = self
            .client
            .delete(self.url(&format!("/api/carrinho/remover/{item_id}")));
        self.send(request, "Erro ao remover item").await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn add_to_cart(&self, user_id: UserId, book_id: BookId) -> Result<()> {
        let request = self
            .client
            .post(self.url("/api/carrinho/adicionar"))
            .json(&AddToCartRequest {
                usuario_id: user_id,
                livro_id: book_id,
            });
        self.send(request, "Erro ao adicionar ao carrinho").await?;
        Ok(())
    }

    #[instrument(skip(self, email))]
    async fn checkout_item(
        &self,
        book_id: BookId,
        email: &Email,
        user_id: UserId,
    ) -> Result<PixCharge> {
        let request = self
            .client
            .post(self.url("/api/checkout"))
            .json(&CheckoutRequest {
                livro_id: book_id,
                email,
                usuario_id: user_id,
            });
        self.send_json(request, "Erro ao realizar checkout").await
    }

    #[instrument(skip(self))]
    async fn confirm_payment(&self, order_id: OrderId) -> Result<Confirmation> {
        let request = self
            .client
            .post(self.url("/api/confirmar_pagamento"))
            .json(&OrderRequest {
                pedido_id: order_id,
            });
        self.send_json(request, "Erro ao confirmar pagamento").await
    }

    #[instrument(skip(self, email))]
    async fn finalize_cart_pix(&self, user_id: UserId, email: &Email) -> Result<CartPixCharge> {
        let request = self
            .client
            .post(self.url("/api/carrinho/finalizar-pix"))
            .json(&FinalizeCartRequest {
                usuario_id: user_id,
                email,
            });
        self.send_json(request, "Erro ao gerar pagamento PIX").await
    }

    #[instrument(skip(self))]
    async fn confirm_pix_payment(&self, order_id: OrderId) -> Result<Confirmation> {
        let request = self
            .client
            .post(self.url("/api/confirmar-pagamento-pix"))
            .json(&OrderRequest {
                pedido_id: order_id,
            });
        self.send_json(request, "Erro ao confirmar pagamento").await
    }

    #[instrument(skip(self, email, password))]
    async fn login(&self, email: &Email, password: &SecretString) -> Result<UserIdentity> {
        let request = self.client.post(self.url("/api/login")).json(&LoginRequest {
            email,
            senha: password.expose_secret(),
        });
        let response: LoginResponse = self.send_json(request, "Dados inválidos").await?;
        Ok(response.usuario)
    }

    #[instrument(skip(self))]
    async fn fetch_profile(&self, user_id: UserId) -> Result<Profile> {
        let request = self.client.get(self.url(&format!("/api/perfil/{user_id}")));
        self.send_json(request, "Erro ao carregar perfil").await
    }
}
