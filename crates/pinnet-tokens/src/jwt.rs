//! Compact JWS token generation

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde_json::{Map, Value};

use crate::error::{JwtError, Result};

/// Header and claims of a token, as JSON objects
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JwtRepresentation {
    pub header: Map<String, Value>,
    pub payload: Map<String, Value>,
}

impl JwtRepresentation {
    pub fn new(header: Map<String, Value>, payload: Map<String, Value>) -> Self {
        Self { header, payload }
    }
}

/// Signs the JWS signing input (`b64url(header).b64url(payload)`)
pub trait JwtSigningService: Send + Sync {
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>>;
}

/// base64url without padding, as used for every JWS segment
pub fn encode_segment(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Builds signed tokens from a representation
pub struct JwtGenerator<S> {
    representation: JwtRepresentation,
    signer: S,
}

impl<S: JwtSigningService> JwtGenerator<S> {
    pub fn new(representation: JwtRepresentation, signer: S) -> Self {
        Self {
            representation,
            signer,
        }
    }

    pub fn representation(&self) -> &JwtRepresentation {
        &self.representation
    }

    /// The compact serialization `header.payload.signature`
    pub fn token(&self) -> Result<String> {
        let header = serde_json::to_vec(&self.representation.header)
            .map_err(|source| JwtError::Serialization { part: "header", source })?;
        let payload = serde_json::to_vec(&self.representation.payload)
            .map_err(|source| JwtError::Serialization { part: "payload", source })?;

        let signing_input = format!("{}.{}", encode_segment(&header), encode_segment(&payload));
        let signature = self.signer.sign(signing_input.as_bytes())?;

        Ok(format!("{}.{}", signing_input, encode_segment(&signature)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoSigner;

    impl JwtSigningService for EchoSigner {
        fn sign(&self, data: &[u8]) -> Result<Vec<u8>> {
            Ok(data.to_vec())
        }
    }

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_segments_have_no_padding() {
        assert_eq!(encode_segment(b"a"), "YQ");
        assert_eq!(encode_segment(&[0xfb, 0xff]), "-_8");
    }

    #[test]
    fn test_token_has_three_segments() {
        let representation = JwtRepresentation::new(
            object(json!({"alg": "ES256", "typ": "JWT"})),
            object(json!({"sub": "device-1"})),
        );
        let token = JwtGenerator::new(representation, EchoSigner).token().unwrap();

        let segments: Vec<_> = token.split('.').collect();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0], encode_segment(br#"{"alg":"ES256","typ":"JWT"}"#));
        assert_eq!(segments[1], encode_segment(br#"{"sub":"device-1"}"#));
    }
}
