//! Trust evaluation over a presented certificate chain
//!
//! [`TrustEvaluator`] exposes two independently substitutable operations: validating
//! the chain and pulling a certificate out of it. [`WebPkiTrustEvaluator`] is backed by
//! webpki chain building; tests substitute `testing::MockTrustEvaluator`.
//!
//! Evaluation records the chain it validated on the [`ServerTrust`]: the presented
//! certificates followed by the pinned anchor the path was built to, when there is one.
//! The last position of that chain is the anchor.

use std::fmt;
use std::sync::Arc;

use rustls::client::danger::ServerCertVerifier;
use rustls::client::WebPkiServerVerifier;
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::RootCertStore;

use super::store::CertificateStore;
use crate::{Error, Result};

/// Hostname policy installed on a [`ServerTrust`] before it is evaluated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SslPolicy {
    server_name: ServerName<'static>,
}

impl SslPolicy {
    /// SSL server policy bound to `host`; `None` if `host` is not a valid DNS name or IP
    pub fn for_host(host: &str) -> Option<Self> {
        ServerName::try_from(host.to_string())
            .ok()
            .map(|server_name| Self { server_name })
    }

    pub fn server_name(&self) -> &ServerName<'static> {
        &self.server_name
    }
}

/// The trust object carried by a handshake challenge
///
/// Certificates are ordered as presented by the server: the leaf first, followed by
/// any intermediates.
#[derive(Clone)]
pub struct ServerTrust {
    certificates: Vec<CertificateDer<'static>>,
    evaluated_chain: Option<Vec<CertificateDer<'static>>>,
    ocsp_response: Vec<u8>,
    verification_time: UnixTime,
    policy: Option<SslPolicy>,
}

impl ServerTrust {
    pub fn new(certificates: Vec<CertificateDer<'static>>) -> Self {
        Self {
            certificates,
            evaluated_chain: None,
            ocsp_response: Vec::new(),
            verification_time: UnixTime::now(),
            policy: None,
        }
    }

    /// Copy the chain handed over by rustls during a handshake
    pub fn from_presented(
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Self {
        let certificates = std::iter::once(end_entity)
            .chain(intermediates)
            .map(|cert| cert.clone().into_owned())
            .collect();

        Self {
            certificates,
            evaluated_chain: None,
            ocsp_response: ocsp_response.to_vec(),
            verification_time: now,
            policy: None,
        }
    }

    pub fn set_policy(&mut self, policy: SslPolicy) {
        self.policy = Some(policy);
    }

    pub fn policy(&self) -> Option<&SslPolicy> {
        self.policy.as_ref()
    }

    pub fn certificates(&self) -> &[CertificateDer<'static>] {
        &self.certificates
    }

    /// Record the chain a successful evaluation validated
    pub fn set_evaluated_chain(&mut self, chain: Vec<CertificateDer<'static>>) {
        self.evaluated_chain = Some(chain);
    }

    /// The evaluated chain, or the presented one before evaluation
    pub fn chain(&self) -> &[CertificateDer<'static>] {
        self.evaluated_chain.as_deref().unwrap_or(&self.certificates)
    }

    pub fn certificate_count(&self) -> usize {
        self.chain().len()
    }

    pub fn is_evaluated(&self) -> bool {
        self.evaluated_chain.is_some()
    }

    pub fn ocsp_response(&self) -> &[u8] {
        &self.ocsp_response
    }

    pub fn verification_time(&self) -> UnixTime {
        self.verification_time
    }
}

impl fmt::Debug for ServerTrust {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerTrust")
            .field("certificates", &self.certificates.len())
            .field("evaluated", &self.evaluated_chain.as_ref().map(Vec::len))
            .field("policy", &self.policy)
            .finish()
    }
}

/// Chain validation capability used by the pinning validator
///
/// Implementations must not hold mutable state: concurrent handshakes to different
/// hosts are evaluated concurrently.
pub trait TrustEvaluator: fmt::Debug + Send + Sync {
    /// Whether the chain is valid under the trust's installed policy
    ///
    /// A successful evaluation may record the validated chain on `trust`.
    fn evaluate_trust(&self, trust: &mut ServerTrust) -> bool;

    /// The certificate at `index` of the trust's chain; index 0 is the server's own
    /// certificate and `certificate_count() - 1` the anchor
    fn extract_certificate(&self, trust: &ServerTrust, index: usize) -> Option<CertificateDer<'static>>;
}

/// Chain validation through webpki, anchored in the Mozilla roots plus the pinned roots
pub struct WebPkiTrustEvaluator {
    verifier: Arc<WebPkiServerVerifier>,
    pinned_anchors: Vec<PinnedAnchor>,
}

/// A pinned certificate with a verifier that only accepts paths ending in it
struct PinnedAnchor {
    certificate: CertificateDer<'static>,
    verifier: Arc<WebPkiServerVerifier>,
}

impl WebPkiTrustEvaluator {
    pub fn new(store: &CertificateStore, provider: Arc<CryptoProvider>) -> Result<Self> {
        let mut roots = RootCertStore {
            roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
        };
        store.extend_root_store(&mut roots);
        let verifier = build_verifier(roots, provider.clone())?;

        let mut pinned_anchors = Vec::with_capacity(store.len());
        for pinned in store.iter() {
            let mut roots = RootCertStore::empty();
            if let Err(e) = roots.add(pinned.der().clone()) {
                tracing::warn!(certificate = %pinned.id(), error = %e, "Pinned certificate is not a usable trust anchor");
                continue;
            }
            pinned_anchors.push(PinnedAnchor {
                certificate: pinned.der().clone(),
                verifier: build_verifier(roots, provider.clone())?,
            });
        }

        Ok(Self {
            verifier,
            pinned_anchors,
        })
    }

    /// The chain validated for `trust`, or `None` when it does not validate
    fn evaluated_chain(&self, trust: &ServerTrust) -> Option<Vec<CertificateDer<'static>>> {
        let Some(policy) = trust.policy() else {
            tracing::debug!("Server trust has no policy installed");
            return None;
        };
        let Some((end_entity, intermediates)) = trust.certificates().split_first() else {
            tracing::debug!("Server trust carries no certificates");
            return None;
        };

        if let Err(e) = self.verifier.verify_server_cert(
            end_entity,
            intermediates,
            policy.server_name(),
            trust.ocsp_response(),
            trust.verification_time(),
        ) {
            tracing::debug!(server = ?policy.server_name(), error = %e, "Chain evaluation failed");
            return None;
        }

        let mut chain = trust.certificates().to_vec();
        if let Some(anchor) = self.pinned_anchor(end_entity, intermediates, trust, policy.server_name()) {
            if chain.last() != Some(anchor) {
                chain.push(anchor.clone());
            }
        }
        Some(chain)
    }

    /// The pinned certificate a valid path from `end_entity` leads to, if any
    fn pinned_anchor(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        trust: &ServerTrust,
        server_name: &ServerName<'_>,
    ) -> Option<&CertificateDer<'static>> {
        self.pinned_anchors
            .iter()
            .find(|anchor| {
                anchor
                    .verifier
                    .verify_server_cert(
                        end_entity,
                        intermediates,
                        server_name,
                        trust.ocsp_response(),
                        trust.verification_time(),
                    )
                    .is_ok()
            })
            .map(|anchor| &anchor.certificate)
    }
}

impl fmt::Debug for WebPkiTrustEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebPkiTrustEvaluator")
            .field("pinned_anchors", &self.pinned_anchors.len())
            .finish_non_exhaustive()
    }
}

fn build_verifier(roots: RootCertStore, provider: Arc<CryptoProvider>) -> Result<Arc<WebPkiServerVerifier>> {
    WebPkiServerVerifier::builder_with_provider(Arc::new(roots), provider)
        .build()
        .map_err(|e| Error::Configuration {
            message: format!("Failed to build certificate verifier: {}", e),
            source: Some(anyhow::anyhow!(e)),
        })
}

impl TrustEvaluator for WebPkiTrustEvaluator {
    fn evaluate_trust(&self, trust: &mut ServerTrust) -> bool {
        match self.evaluated_chain(trust) {
            Some(chain) => {
                trust.set_evaluated_chain(chain);
                true
            }
            None => false,
        }
    }

    fn extract_certificate(&self, trust: &ServerTrust, index: usize) -> Option<CertificateDer<'static>> {
        trust.chain().get(index).cloned()
    }
}
