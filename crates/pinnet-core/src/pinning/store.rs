//! Checksum-verified store of pinned certificates
//!
//! The store is built once from a [`CertificateBundle`] and never changes afterwards.
//! Loading refuses any bundle with a missing resource or a checksum mismatch, so a
//! tampered bundle can never degrade pinning to "any valid CA".

#[cfg(any(test, feature = "test-util"))]
use rustls::pki_types::CertificateDer;
use rustls::RootCertStore;

use super::certificates::{sha256_hex, CertificateBundle, EmbeddedBundle, PinnedCertificate, PinnedRoot};

/// Certificate store loading errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CertificateStoreError {
    #[error("Certificate '{name}' was not present in bundle")]
    Missing { name: String },

    #[error("Certificate '{name}' checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch {
        name: String,
        expected: String,
        actual: String,
    },
}

/// Immutable set of pinned certificates
#[derive(Debug, Clone)]
pub struct CertificateStore {
    certificates: Vec<PinnedCertificate>,
}

impl CertificateStore {
    /// Load every [`PinnedRoot`] from `bundle`, verifying each checksum
    pub fn load(bundle: &dyn CertificateBundle) -> Result<Self, CertificateStoreError> {
        let certificates = PinnedRoot::ALL
            .iter()
            .map(|root| Self::load_one(bundle, *root))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(count = certificates.len(), "Pinned certificates loaded");
        Ok(Self { certificates })
    }

    /// Load the certificates compiled into this crate
    pub fn embedded() -> Result<Self, CertificateStoreError> {
        Self::load(&EmbeddedBundle)
    }

    /// Build a store from arbitrary certificates, skipping checksum verification
    #[cfg(any(test, feature = "test-util"))]
    pub fn from_certificates(
        certificates: impl IntoIterator<Item = (PinnedRoot, CertificateDer<'static>)>,
    ) -> Self {
        let certificates = certificates
            .into_iter()
            .map(|(id, der)| PinnedCertificate::new(id, der.to_vec()))
            .collect();
        Self { certificates }
    }

    fn load_one(
        bundle: &dyn CertificateBundle,
        root: PinnedRoot,
    ) -> Result<PinnedCertificate, CertificateStoreError> {
        let der = bundle
            .resource(root.name())
            .ok_or_else(|| CertificateStoreError::Missing {
                name: root.name().to_string(),
            })?;

        let actual = sha256_hex(&der);
        if actual != root.checksum() {
            tracing::error!(
                certificate = root.name(),
                expected = root.checksum(),
                actual = %actual,
                "Pinned certificate checksum mismatch"
            );
            return Err(CertificateStoreError::ChecksumMismatch {
                name: root.name().to_string(),
                expected: root.checksum().to_string(),
                actual,
            });
        }

        Ok(PinnedCertificate::new(root, der))
    }

    /// Byte-exact comparison of `candidate` against every stored certificate
    pub fn contains(&self, candidate: &[u8]) -> bool {
        self.certificates
            .iter()
            .any(|certificate| certificate.der().as_ref() == candidate)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PinnedCertificate> {
        self.certificates.iter()
    }

    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }

    /// `(name, checksum)` for each certificate, as computed at load time
    pub fn checksums(&self) -> Vec<(&'static str, String)> {
        self.certificates
            .iter()
            .map(|c| (c.id().name(), sha256_hex(c.der().as_ref())))
            .collect()
    }

    /// Add the pinned certificates as trust anchors to `roots`
    pub(crate) fn extend_root_store(&self, roots: &mut RootCertStore) {
        let (added, ignored) =
            roots.add_parsable_certificates(self.certificates.iter().map(|c| c.der().clone()));
        tracing::debug!(added, ignored, "Pinned certificates added as trust anchors");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapBundle(HashMap<&'static str, Vec<u8>>);

    impl CertificateBundle for MapBundle {
        fn resource(&self, name: &str) -> Option<Vec<u8>> {
            self.0.get(name).cloned()
        }
    }

    fn embedded_map() -> HashMap<&'static str, Vec<u8>> {
        PinnedRoot::ALL
            .iter()
            .map(|root| (root.name(), EmbeddedBundle.resource(root.name()).unwrap()))
            .collect()
    }

    #[test]
    fn test_embedded_store_loads_every_root() {
        let store = CertificateStore::embedded().unwrap();
        assert_eq!(store.len(), PinnedRoot::ALL.len());
        for (name, checksum) in store.checksums() {
            let root = PinnedRoot::ALL.iter().find(|r| r.name() == name).unwrap();
            assert_eq!(checksum, root.checksum());
        }
    }

    #[test]
    fn test_missing_resource_fails() {
        let mut map = embedded_map();
        map.remove("amazon_root_ca_3");

        let err = CertificateStore::load(&MapBundle(map)).unwrap_err();
        assert_eq!(
            err,
            CertificateStoreError::Missing {
                name: "amazon_root_ca_3".to_string()
            }
        );
    }

    #[test]
    fn test_tampered_resource_fails() {
        let mut map = embedded_map();
        if let Some(bytes) = map.get_mut("starfield_root_ca") {
            let last = bytes.len() - 1;
            bytes[last] ^= 0x01;
        }

        let err = CertificateStore::load(&MapBundle(map)).unwrap_err();
        match err {
            CertificateStoreError::ChecksumMismatch { name, expected, actual } => {
                assert_eq!(name, "starfield_root_ca");
                assert_eq!(expected, PinnedRoot::StarfieldRootCa.checksum());
                assert_ne!(actual, expected);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_contains_is_byte_exact() {
        let store = CertificateStore::embedded().unwrap();
        let mut der = EmbeddedBundle.resource("amazon_root_ca_1").unwrap();
        assert!(store.contains(&der));

        der.push(0);
        assert!(!store.contains(&der));
        assert!(!store.contains(&der[..der.len() - 2]));
        assert!(!store.contains(&[]));
    }

    #[test]
    fn test_from_certificates_skips_checksums() {
        let der = CertificateDer::from(vec![0x30, 0x03, 0x02, 0x01, 0x01]);
        let store = CertificateStore::from_certificates([(PinnedRoot::AmazonRootCa1, der.clone())]);

        assert_eq!(store.len(), 1);
        assert!(store.contains(der.as_ref()));
        assert_ne!(store.checksums()[0].1, PinnedRoot::AmazonRootCa1.checksum());
    }

    #[test]
    fn test_root_store_accepts_pinned_roots() {
        let store = CertificateStore::embedded().unwrap();
        let mut roots = RootCertStore::empty();
        store.extend_root_store(&mut roots);
        assert_eq!(roots.len(), store.len());
    }
}
