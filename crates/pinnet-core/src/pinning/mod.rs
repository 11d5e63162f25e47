//! Certificate pinning for TLS connections
//!
//! This module provides:
//! - The closed set of pinned certificates and the bundles they are loaded from
//! - A checksum-verified, immutable certificate store
//! - Trust evaluation over the presented certificate chain
//! - The per-handshake pinning decision and its rustls integration

pub mod certificates;
pub mod evaluator;
pub mod store;
pub mod validator;
pub mod verifier;

pub use certificates::{
    sha256_hex, CertificateBundle, DirectoryBundle, EmbeddedBundle, PinnedCertificate, PinnedRoot,
};
pub use evaluator::{ServerTrust, SslPolicy, TrustEvaluator, WebPkiTrustEvaluator};
pub use store::{CertificateStore, CertificateStoreError};
pub use validator::{
    pinned_certificate_index, AuthenticationChallenge, ChallengeDisposition, Credential,
    HandshakeStage, PinningError, PinningValidator, TrustDecision,
};
pub use verifier::{pinned_client_config, PinningVerifier};
