//! `X-PAYMENT` header codec.
//!
//! A payment travels as standard-alphabet, padded base64 of the compact JSON
//! serialization of a [`PaymentPayload`]. Decoding classifies every failure
//! into a [`DecodeReason`](crate::error::DecodeReason) so the server can tell
//! the client exactly what was wrong.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;

use crate::error::DecodeError;
use crate::proto::{PaymentPayload, V1};

/// Encodes a payload for the `X-PAYMENT` header.
///
/// # Errors
///
/// Returns an error if the payload cannot be serialized.
pub fn encode(payload: &PaymentPayload) -> Result<String, serde_json::Error> {
    let json = serde_json::to_vec(payload)?;
    Ok(STANDARD.encode(json))
}

/// Decodes an `X-PAYMENT` header value.
///
/// # Errors
///
/// Returns a [`DecodeError`] naming the first stage that failed.
pub fn decode(header: &str) -> Result<PaymentPayload, DecodeError> {
    decode_bytes(header.as_bytes())
}

/// Decodes an `X-PAYMENT` header value given as raw bytes.
///
/// Surrounding ASCII whitespace is ignored. The protocol version is checked
/// before the payload structure so a future-version payload reports
/// `VersionError` rather than a schema mismatch.
///
/// # Errors
///
/// Returns a [`DecodeError`] naming the first stage that failed.
pub fn decode_bytes(header: &[u8]) -> Result<PaymentPayload, DecodeError> {
    let raw = STANDARD.decode(header.trim_ascii())?;
    let value: Value = serde_json::from_slice(&raw).map_err(DecodeError::Json)?;

    let version = value
        .as_object()
        .ok_or_else(|| DecodeError::Schema("payload is not a JSON object".into()))?
        .get("x402Version")
        .ok_or_else(|| DecodeError::Schema("missing field `x402Version`".into()))?;
    match version.as_u64() {
        Some(v) if V1 == v => {}
        Some(_) => {
            return Err(DecodeError::Version {
                found: version.to_string(),
            });
        }
        None if version.is_number() => {
            return Err(DecodeError::Version {
                found: version.to_string(),
            });
        }
        None => return Err(DecodeError::Schema("`x402Version` is not a number".into())),
    }

    serde_json::from_value(value).map_err(|e| DecodeError::Schema(e.to_string()))
}
