//! Pinnet Tokens - signed JWT assembly
//!
//! Produces compact JWS tokens (`header.payload.signature`, each part base64url
//! without padding) from JSON claims and a pluggable [`JwtSigningService`]. The
//! resulting token is typically handed to a token exchange as the subject token.

pub mod error;
pub mod jwt;

pub use error::{JwtError, Result};
pub use jwt::{encode_segment, JwtGenerator, JwtRepresentation, JwtSigningService};
