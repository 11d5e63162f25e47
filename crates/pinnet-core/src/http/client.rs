//! Request client over a pinned transport
//!
//! Every call is a sequential chain: token acquisition (if any) completes before the
//! target request is built, and the target request is only sent once a token is
//! attached. No call is retried.

use std::sync::Arc;

use reqwest::Request;
use tracing::instrument;

use super::auth::{authorized, AuthorizationProvider};
use super::config::HttpClientConfig;
use super::server_error::ServerError;
use super::status::is_successful;
use super::token::{decode_service_token, ServiceTokenResponse, TokenExchange, TokenSource};
use super::transport::{ReqwestTransport, Transport};
use crate::pinning::CertificateStore;
use crate::{Error, Result};

/// HTTP client with response classification and bearer token authorization
#[derive(Debug, Clone)]
pub struct RequestClient {
    transport: Arc<dyn Transport>,
    token_source: Option<TokenSource>,
}

impl RequestClient {
    /// Client pinned to the certificates compiled into this crate
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let store = CertificateStore::embedded()?;
        Self::with_store(config, store)
    }

    /// Client pinned to an already verified certificate store
    pub fn with_store(config: HttpClientConfig, store: CertificateStore) -> Result<Self> {
        let transport = ReqwestTransport::pinned(&config, Arc::new(store))?;
        tracing::debug!(
            connect_timeout = config.timeouts.connect_timeout_secs,
            request_timeout = config.timeouts.request_timeout_secs,
            min_tls_version = %config.tls.min_tls_version,
            "Pinned HTTP client created"
        );
        Ok(Self::with_transport(Arc::new(transport)))
    }

    /// Client over an arbitrary transport
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            token_source: None,
        }
    }

    pub fn with_token_source(mut self, source: TokenSource) -> Self {
        self.token_source = Some(source);
        self
    }

    pub fn with_authorization_provider(self, provider: Arc<dyn AuthorizationProvider>) -> Self {
        self.with_token_source(TokenSource::Provider(provider))
    }

    pub fn with_token_exchange(self, exchange: TokenExchange) -> Self {
        self.with_token_source(TokenSource::Exchange(exchange))
    }

    pub fn token_source(&self) -> Option<&TokenSource> {
        self.token_source.as_ref()
    }

    /// Send `request` as-is and return the body of a 2xx response
    ///
    /// Any other status becomes a [`ServerError`] for the request's last path segment.
    /// Transport failures are returned unchanged.
    #[instrument(skip_all, fields(method = %request.method(), path = %request.url().path()))]
    pub async fn make_request(&self, request: Request) -> Result<Vec<u8>> {
        let url = request.url().clone();
        let response = self.transport.send(request).await?;

        tracing::debug!(status = response.status, path = url.path(), "Response received");

        if is_successful(response.status) {
            Ok(response.body)
        } else {
            let error = ServerError::for_url(&url, response.status);
            tracing::debug!(
                status = error.error_code,
                endpoint = error.endpoint.as_deref().unwrap_or("unknown"),
                "Request failed"
            );
            Err(error.into())
        }
    }

    /// Attach a bearer token for `scope` to `request`, then send it
    ///
    /// Fails with [`Error::AuthorizationProviderNotPresent`] when no token source is
    /// configured. Nothing is sent if the token cannot be obtained.
    #[instrument(skip(self, request), fields(path = %request.url().path()))]
    pub async fn make_authorized_request(&self, scope: &str, request: Request) -> Result<Vec<u8>> {
        let source = self
            .token_source
            .as_ref()
            .ok_or(Error::AuthorizationProviderNotPresent)?;

        let token = self.bearer_token(source, scope).await?;
        let request = authorized(request, &token)?;

        self.make_request(request).await
    }

    /// Trade the exchange's subject token for a service token scoped to `scope`
    #[instrument(skip(self, exchange), fields(endpoint = %exchange.endpoint()))]
    pub async fn exchange_token(&self, exchange: &TokenExchange, scope: &str) -> Result<ServiceTokenResponse> {
        let request = exchange.request(scope).await?;
        let body = self.make_request(request).await?;
        let token = decode_service_token(&body)?;

        tracing::debug!(
            token_type = %token.token_type,
            expires_in = token.expires_in,
            "Service token obtained"
        );
        Ok(token)
    }

    async fn bearer_token(&self, source: &TokenSource, scope: &str) -> Result<String> {
        match source {
            TokenSource::Provider(provider) => provider.fetch_token(scope).await.map_err(|e| {
                tracing::warn!(scope = scope, error = %e, "Authorization provider failed");
                Error::from(e)
            }),
            TokenSource::Exchange(exchange) => self
                .exchange_token(exchange, scope)
                .await
                .map(|response| response.access_token),
        }
    }
}
