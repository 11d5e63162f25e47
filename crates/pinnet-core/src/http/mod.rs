//! HTTP layer over a pinned transport
//!
//! This module provides:
//! - Response classification and structured, hashable server errors
//! - Bearer token sources: an opaque provider or an OAuth2 token exchange
//! - The transport seam and its reqwest implementation
//! - [`RequestClient`], which ties them together

pub mod auth;
pub mod client;
pub mod config;
pub mod server_error;
pub mod status;
pub mod token;
pub mod transport;
pub mod user_agent;

pub use auth::{authorized, AuthorizationProvider, StaticTokenProvider, SubjectTokenProvider};
pub use client::RequestClient;
pub use config::{HttpClientConfig, TimeoutConfig, TlsConfig, TlsVersion};
pub use server_error::{compute_error_hash, endpoint_from_url, ErrorWithCode, ServerError};
pub use status::is_successful;
pub use token::{decode_service_token, ServiceTokenResponse, TokenExchange, TokenSource};
pub use transport::{HttpResponse, ReqwestTransport, Transport, TransportError, TransportErrorKind};
pub use user_agent::UserAgent;

// Re-export commonly used types
pub use reqwest::{Method, Request, Url};
