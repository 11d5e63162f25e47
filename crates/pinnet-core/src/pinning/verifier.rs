//! rustls integration for certificate pinning

use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};

use super::evaluator::ServerTrust;
use super::validator::{AuthenticationChallenge, ChallengeDisposition, PinningValidator};
use crate::http::config::TlsVersion;
use crate::{Error, Result};

/// Server certificate verifier that routes every handshake through a [`PinningValidator`]
#[derive(Debug)]
pub struct PinningVerifier {
    validator: PinningValidator,
    provider: Arc<CryptoProvider>,
}

impl PinningVerifier {
    pub fn new(validator: PinningValidator, provider: Arc<CryptoProvider>) -> Self {
        Self { validator, provider }
    }

    pub fn validator(&self) -> &PinningValidator {
        &self.validator
    }
}

impl ServerCertVerifier for PinningVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        let trust = ServerTrust::from_presented(end_entity, intermediates, ocsp_response, now);
        let challenge = AuthenticationChallenge::new(server_name.to_str().into_owned(), Some(trust));

        match self.validator.handle_challenge(challenge) {
            ChallengeDisposition::UseCredential(_) => Ok(ServerCertVerified::assertion()),
            ChallengeDisposition::CancelChallenge(reason) => {
                Err(rustls::Error::General(format!("certificate pinning: {}", reason)))
            }
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider.signature_verification_algorithms.supported_schemes()
    }
}

/// Build a rustls client configuration whose server verification is pinned
pub fn pinned_client_config(
    validator: PinningValidator,
    provider: Arc<CryptoProvider>,
    min_tls_version: TlsVersion,
) -> Result<ClientConfig> {
    let versions = min_tls_version.protocol_versions();
    let verifier = Arc::new(PinningVerifier::new(validator, provider.clone()));

    let config = ClientConfig::builder_with_provider(provider)
        .with_protocol_versions(versions)
        .map_err(|e| Error::Configuration {
            message: format!("Unsupported TLS protocol versions: {}", e),
            source: Some(anyhow::anyhow!(e)),
        })?
        .dangerous()
        .with_custom_certificate_verifier(verifier)
        .with_no_client_auth();

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pinning::certificates::{CertificateBundle, EmbeddedBundle};
    use crate::pinning::evaluator::WebPkiTrustEvaluator;
    use crate::pinning::store::CertificateStore;
    use crate::testing::MockTrustEvaluator;

    fn provider() -> Arc<CryptoProvider> {
        Arc::new(rustls::crypto::ring::default_provider())
    }

    fn pinned_der() -> CertificateDer<'static> {
        CertificateDer::from(EmbeddedBundle.resource("amazon_root_ca_3").unwrap())
    }

    fn webpki_validator() -> PinningValidator {
        let store = CertificateStore::embedded().unwrap();
        let evaluator = WebPkiTrustEvaluator::new(&store, provider()).unwrap();
        PinningValidator::new(Arc::new(evaluator), Arc::new(store))
    }

    #[test]
    fn test_root_presented_as_server_certificate_is_rejected() {
        let verifier = PinningVerifier::new(webpki_validator(), provider());
        let server_name = ServerName::try_from("myhost.com").unwrap();

        let result = verifier.verify_server_cert(&pinned_der(), &[], &server_name, &[], UnixTime::now());

        match result {
            Err(rustls::Error::General(message)) => {
                assert!(message.contains("Server not trusted"));
            }
            other => panic!("expected rejection, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_accepted_challenge_yields_assertion() {
        let store = Arc::new(CertificateStore::embedded().unwrap());
        let validator = PinningValidator::new(Arc::new(MockTrustEvaluator::new(pinned_der())), store);
        let verifier = PinningVerifier::new(validator, provider());
        let server_name = ServerName::try_from("myhost.com").unwrap();

        let result = verifier.verify_server_cert(&pinned_der(), &[], &server_name, &[], UnixTime::now());
        assert!(result.is_ok());
    }

    #[test]
    fn test_supported_schemes_come_from_provider() {
        let verifier = PinningVerifier::new(webpki_validator(), provider());
        assert!(!verifier.supported_verify_schemes().is_empty());
    }

    #[test]
    fn test_pinned_client_config_builds() {
        assert!(pinned_client_config(webpki_validator(), provider(), TlsVersion::TLS1_2).is_ok());
        assert!(pinned_client_config(webpki_validator(), provider(), TlsVersion::TLS1_3).is_ok());
    }
}
