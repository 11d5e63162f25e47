//! Integration tests for signed token generation

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use pinnet_tokens::{JwtError, JwtGenerator, JwtRepresentation, JwtSigningService};
use serde_json::{json, Map, Value};

/// Returns the signing input unchanged so tests can inspect it
struct EchoSigner;

impl JwtSigningService for EchoSigner {
    fn sign(&self, data: &[u8]) -> pinnet_tokens::Result<Vec<u8>> {
        Ok(data.to_vec())
    }
}

struct FailingSigner;

impl JwtSigningService for FailingSigner {
    fn sign(&self, _data: &[u8]) -> pinnet_tokens::Result<Vec<u8>> {
        Err(JwtError::signing("key unavailable"))
    }
}

fn object(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

fn decode(segment: &str) -> String {
    String::from_utf8(URL_SAFE_NO_PAD.decode(segment).unwrap()).unwrap()
}

#[test]
fn generate_with_strings() {
    let representation = JwtRepresentation::new(
        object(json!({"header_key_1": "header_value_1"})),
        object(json!({"payload_key_1": "payload_value_1"})),
    );

    let token = JwtGenerator::new(representation, EchoSigner).token().unwrap();
    let segments: Vec<_> = token.split('.').collect();
    assert_eq!(segments.len(), 3);

    assert_eq!(decode(segments[0]), r#"{"header_key_1":"header_value_1"}"#);
    assert_eq!(decode(segments[1]), r#"{"payload_key_1":"payload_value_1"}"#);
    assert_eq!(decode(segments[2]), format!("{}.{}", segments[0], segments[1]));
}

#[test]
fn generate_with_base_types() {
    let representation = JwtRepresentation::new(
        object(json!({
            "header_key_1": "header_value_1",
            "header_key_2": 123456789,
            "header_key_3": true
        })),
        object(json!({
            "payload_key_1": "payload_value_1",
            "payload_key_2": 987654321,
            "payload_key_3": false
        })),
    );

    let token = JwtGenerator::new(representation, EchoSigner).token().unwrap();
    let segments: Vec<_> = token.split('.').collect();

    assert_eq!(
        decode(segments[0]),
        r#"{"header_key_1":"header_value_1","header_key_2":123456789,"header_key_3":true}"#
    );
    assert_eq!(
        decode(segments[1]),
        r#"{"payload_key_1":"payload_value_1","payload_key_2":987654321,"payload_key_3":false}"#
    );
}

#[test]
fn signing_failure_is_reported() {
    let generator = JwtGenerator::new(JwtRepresentation::default(), FailingSigner);

    let error = generator.token().unwrap_err();
    assert!(matches!(error, JwtError::Signing { .. }));
    assert_eq!(error.to_string(), "Failed to sign JWT: key unavailable");
}

#[test]
fn empty_representation_still_signs() -> anyhow::Result<()> {
    let token = JwtGenerator::new(JwtRepresentation::default(), EchoSigner).token()?;
    let segments: Vec<_> = token.split('.').collect();

    assert_eq!(decode(segments[0]), "{}");
    assert_eq!(decode(segments[1]), "{}");
    Ok(())
}
