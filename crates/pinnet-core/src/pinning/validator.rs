//! Per-handshake pinning decision
//!
//! A challenge moves through a fixed sequence of stages:
//!
//! ```text
//! ChallengeReceived -> TrustExtracted -> PolicyApplied -> ChainEvaluated
//!     -> CertificateExtracted -> CertificateChecked -> Accepted | Rejected(reason)
//! ```
//!
//! The order is part of the security contract. Every failure cancels the challenge
//! without issuing a credential; callers only see accept or reject, the reason is kept
//! for diagnostics.

use std::fmt;
use std::sync::Arc;

use rustls::pki_types::CertificateDer;

use super::evaluator::{ServerTrust, SslPolicy, TrustEvaluator};
use super::store::CertificateStore;

/// Chain position checked against the store: the last certificate of the evaluated
/// chain, which is the anchor the server's certificate chains up to
pub fn pinned_certificate_index(trust: &ServerTrust) -> Option<usize> {
    trust.certificate_count().checked_sub(1)
}

/// Reasons a handshake challenge is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PinningError {
    #[error("Server trust missing from challenge")]
    ServerTrustMissing,

    #[error("Server not trusted")]
    ServerNotTrusted,

    #[error("No certificate found on server")]
    NoCertificateFoundOnServer,

    #[error("Certificate not pinned in bundle")]
    CertificateNotPinnedInBundle,
}

impl PinningError {
    /// The last stage the challenge reached before it was rejected
    pub fn failed_stage(&self) -> HandshakeStage {
        match self {
            PinningError::ServerTrustMissing => HandshakeStage::ChallengeReceived,
            PinningError::ServerNotTrusted => HandshakeStage::PolicyApplied,
            PinningError::NoCertificateFoundOnServer => HandshakeStage::ChainEvaluated,
            PinningError::CertificateNotPinnedInBundle => HandshakeStage::CertificateExtracted,
        }
    }
}

/// Stages of a handshake challenge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeStage {
    ChallengeReceived,
    TrustExtracted,
    PolicyApplied,
    ChainEvaluated,
    CertificateExtracted,
    CertificateChecked,
}

impl fmt::Display for HandshakeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HandshakeStage::ChallengeReceived => "challenge_received",
            HandshakeStage::TrustExtracted => "trust_extracted",
            HandshakeStage::PolicyApplied => "policy_applied",
            HandshakeStage::ChainEvaluated => "chain_evaluated",
            HandshakeStage::CertificateExtracted => "certificate_extracted",
            HandshakeStage::CertificateChecked => "certificate_checked",
        };
        f.write_str(name)
    }
}

/// A server-trust challenge raised by the TLS layer
#[derive(Debug, Clone)]
pub struct AuthenticationChallenge {
    host: String,
    server_trust: Option<ServerTrust>,
}

impl AuthenticationChallenge {
    pub fn new(host: impl Into<String>, server_trust: Option<ServerTrust>) -> Self {
        Self {
            host: host.into(),
            server_trust,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn server_trust(&self) -> Option<&ServerTrust> {
        self.server_trust.as_ref()
    }
}

/// Outcome of chain evaluation and certificate extraction for one handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustDecision {
    pub chain_valid: bool,
    /// Certificate at [`pinned_certificate_index`] of the evaluated chain
    pub leaf_certificate: Option<CertificateDer<'static>>,
}

/// Credential issued for an accepted challenge
#[derive(Debug, Clone)]
pub struct Credential {
    host: String,
    trust: ServerTrust,
    leaf: CertificateDer<'static>,
}

impl Credential {
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn trust(&self) -> &ServerTrust {
        &self.trust
    }

    /// The certificate that matched the store
    pub fn leaf_certificate(&self) -> &CertificateDer<'static> {
        &self.leaf
    }
}

/// What the TLS layer should do with a challenge
#[derive(Debug, Clone)]
pub enum ChallengeDisposition {
    UseCredential(Credential),
    CancelChallenge(PinningError),
}

impl ChallengeDisposition {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ChallengeDisposition::UseCredential(_))
    }

    pub fn credential(&self) -> Option<&Credential> {
        match self {
            ChallengeDisposition::UseCredential(credential) => Some(credential),
            ChallengeDisposition::CancelChallenge(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<PinningError> {
        match self {
            ChallengeDisposition::UseCredential(_) => None,
            ChallengeDisposition::CancelChallenge(reason) => Some(*reason),
        }
    }
}

/// Decides whether a server-trust challenge is accepted
#[derive(Debug, Clone)]
pub struct PinningValidator {
    evaluator: Arc<dyn TrustEvaluator>,
    store: Arc<CertificateStore>,
}

impl PinningValidator {
    pub fn new(evaluator: Arc<dyn TrustEvaluator>, store: Arc<CertificateStore>) -> Self {
        Self { evaluator, store }
    }

    pub fn store(&self) -> &CertificateStore {
        &self.store
    }

    /// Run the challenge through every stage and decide accept or reject
    pub fn handle_challenge(&self, challenge: AuthenticationChallenge) -> ChallengeDisposition {
        let host = challenge.host.clone();
        match self.validate(challenge) {
            Ok(credential) => {
                tracing::debug!(host = %host, "Certificate pinning validation passed");
                ChallengeDisposition::UseCredential(credential)
            }
            Err(reason) => {
                tracing::warn!(
                    host = %host,
                    reason = %reason,
                    stage = %reason.failed_stage(),
                    "Cancelling authentication challenge"
                );
                ChallengeDisposition::CancelChallenge(reason)
            }
        }
    }

    fn validate(&self, challenge: AuthenticationChallenge) -> Result<Credential, PinningError> {
        let AuthenticationChallenge { host, server_trust } = challenge;

        let mut trust = server_trust.ok_or(PinningError::ServerTrustMissing)?;
        tracing::trace!(host = %host, stage = %HandshakeStage::TrustExtracted);

        // Hostname verification always applies, pinning only narrows it further
        let policy = SslPolicy::for_host(&host).ok_or(PinningError::ServerNotTrusted)?;
        trust.set_policy(policy);
        tracing::trace!(host = %host, stage = %HandshakeStage::PolicyApplied);

        let decision = self.decide(&mut trust);
        if !decision.chain_valid {
            return Err(PinningError::ServerNotTrusted);
        }

        let leaf = decision
            .leaf_certificate
            .ok_or(PinningError::NoCertificateFoundOnServer)?;
        tracing::trace!(host = %host, stage = %HandshakeStage::CertificateExtracted);

        if !self.store.contains(leaf.as_ref()) {
            return Err(PinningError::CertificateNotPinnedInBundle);
        }
        tracing::trace!(host = %host, stage = %HandshakeStage::CertificateChecked);

        Ok(Credential { host, trust, leaf })
    }

    /// Extraction only happens once the chain is known to be valid
    fn decide(&self, trust: &mut ServerTrust) -> TrustDecision {
        let chain_valid = self.evaluator.evaluate_trust(trust);
        let leaf_certificate = if chain_valid {
            pinned_certificate_index(trust)
                .and_then(|index| self.evaluator.extract_certificate(trust, index))
        } else {
            None
        };

        TrustDecision {
            chain_valid,
            leaf_certificate,
        }
    }
}
