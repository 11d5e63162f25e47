//! Pinned certificate identifiers and the bundles that provide their DER bytes

use std::fmt;
use std::path::{Path, PathBuf};

use rustls::pki_types::CertificateDer;
use sha2::{Digest, Sha256};

/// The closed set of certificates trusted by the pinning validator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PinnedRoot {
    AmazonRootCa1,
    AmazonRootCa2,
    AmazonRootCa3,
    AmazonRootCa4,
    StarfieldRootCa,
}

impl PinnedRoot {
    /// Every pinned identifier, in load order
    pub const ALL: [PinnedRoot; 5] = [
        PinnedRoot::AmazonRootCa1,
        PinnedRoot::AmazonRootCa2,
        PinnedRoot::AmazonRootCa3,
        PinnedRoot::AmazonRootCa4,
        PinnedRoot::StarfieldRootCa,
    ];

    /// Resource name used to look the certificate up in a bundle
    pub fn name(&self) -> &'static str {
        match self {
            PinnedRoot::AmazonRootCa1 => "amazon_root_ca_1",
            PinnedRoot::AmazonRootCa2 => "amazon_root_ca_2",
            PinnedRoot::AmazonRootCa3 => "amazon_root_ca_3",
            PinnedRoot::AmazonRootCa4 => "amazon_root_ca_4",
            PinnedRoot::StarfieldRootCa => "starfield_root_ca",
        }
    }

    /// Expected SHA-256 of the DER encoding, lowercase hex
    pub fn checksum(&self) -> &'static str {
        match self {
            PinnedRoot::AmazonRootCa1 => {
                "8ecde6884f3d87b1125ba31ac3fcb13d7016de7f57cc904fe1cb97c6ae98196e"
            }
            PinnedRoot::AmazonRootCa2 => {
                "1ba5b2aa8c65401a82960118f80bec4f62304d83cec4713a19c39c011ea46db4"
            }
            PinnedRoot::AmazonRootCa3 => {
                "18ce6cfe7bf14e60b2e347b8dfe868cb31d02ebb3ada271569f50343b46db3a4"
            }
            PinnedRoot::AmazonRootCa4 => {
                "e35d28419ed02025cfa69038cd623962458da5c695fbdea3c22b0bfb25897092"
            }
            PinnedRoot::StarfieldRootCa => {
                "568d6905a2c88708a4b3025190edcfedb1974a606a13c6e5290fcb2ae63edab5"
            }
        }
    }
}

impl fmt::Display for PinnedRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// SHA-256 of `data` as lowercase hex
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// A certificate that passed its checksum check when it was loaded
#[derive(Clone, PartialEq, Eq)]
pub struct PinnedCertificate {
    id: PinnedRoot,
    der: CertificateDer<'static>,
}

impl PinnedCertificate {
    pub(crate) fn new(id: PinnedRoot, der: Vec<u8>) -> Self {
        Self {
            id,
            der: CertificateDer::from(der),
        }
    }

    pub fn id(&self) -> PinnedRoot {
        self.id
    }

    pub fn der(&self) -> &CertificateDer<'static> {
        &self.der
    }

    pub fn expected_checksum(&self) -> &'static str {
        self.id.checksum()
    }
}

impl fmt::Debug for PinnedCertificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinnedCertificate")
            .field("id", &self.id)
            .field("checksum", &self.id.checksum())
            .field("len", &self.der.len())
            .finish()
    }
}

/// Source of named DER-encoded certificates
pub trait CertificateBundle {
    /// DER bytes for `name`, or `None` when the bundle has no such resource
    fn resource(&self, name: &str) -> Option<Vec<u8>>;
}

/// The certificates shipped with this crate
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedBundle;

impl CertificateBundle for EmbeddedBundle {
    fn resource(&self, name: &str) -> Option<Vec<u8>> {
        let bytes: &'static [u8] = match name {
            "amazon_root_ca_1" => include_bytes!("../../certs/amazon_root_ca_1.der"),
            "amazon_root_ca_2" => include_bytes!("../../certs/amazon_root_ca_2.der"),
            "amazon_root_ca_3" => include_bytes!("../../certs/amazon_root_ca_3.der"),
            "amazon_root_ca_4" => include_bytes!("../../certs/amazon_root_ca_4.der"),
            "starfield_root_ca" => include_bytes!("../../certs/starfield_root_ca.der"),
            _ => return None,
        };
        Some(bytes.to_vec())
    }
}

/// Certificates read from `<dir>/<name>.der`
#[derive(Debug, Clone)]
pub struct DirectoryBundle {
    root: PathBuf,
}

impl DirectoryBundle {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl CertificateBundle for DirectoryBundle {
    fn resource(&self, name: &str) -> Option<Vec<u8>> {
        let path = self.root.join(name).with_extension("der");
        match std::fs::read(&path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Certificate resource unreadable");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<_> = PinnedRoot::ALL.iter().map(|r| r.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), PinnedRoot::ALL.len());
    }

    #[test]
    fn test_checksum_format() {
        for root in PinnedRoot::ALL {
            let checksum = root.checksum();
            assert_eq!(checksum.len(), 64, "{root} checksum should be 64 hex chars");
            assert!(checksum.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        }
    }

    #[test]
    fn test_embedded_bundle_matches_checksums() {
        for root in PinnedRoot::ALL {
            let bytes = EmbeddedBundle.resource(root.name()).expect("embedded resource");
            assert_eq!(sha256_hex(&bytes), root.checksum(), "{root} drifted");
        }
    }

    #[test]
    fn test_embedded_bundle_unknown_name() {
        assert!(EmbeddedBundle.resource("stackexchange").is_none());
    }

    #[test]
    fn test_sha256_hex_known_vector() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
