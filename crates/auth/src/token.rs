//! Structural decoding of compact signed tokens (`header.payload.signature`).
//!
//! This module never touches key material: it splits, base64url-decodes and
//! parses. Every function is pure and can be called from any thread.

use base64::Engine;
use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{AuthError, AuthResult};

/// Decoded token header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenHeader {
    pub alg: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,

    /// Any other header members, preserved as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Decoded token payload.
///
/// Only the claims the session engine acts on are typed; everything else is
/// kept in `extra` for the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
    /// Expiry, whole seconds since the Unix epoch. A fractional NumericDate
    /// is floored.
    #[serde(default, deserialize_with = "numeric_date", skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Subject of the token in the identity service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_uuid: Option<String>,

    /// Version hash of the subject's profile/permission snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details_hash: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn numeric_date<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(number) = Option::<serde_json::Number>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Some(secs) = number.as_i64() {
        return Ok(Some(secs));
    }
    match number.as_f64() {
        // `as` saturates out-of-range values.
        Some(secs) if secs.is_finite() => Ok(Some(secs.floor() as i64)),
        _ => Err(de::Error::custom(format!("invalid NumericDate {number}"))),
    }
}

/// A token split into its three parts.
///
/// `signature` stays in its encoded form; only the verifier cares about it.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedToken {
    pub header: TokenHeader,
    pub claims: TokenClaims,
    pub signature: String,
}

/// Decode one base64url segment, tolerating missing `=` padding.
pub fn decode_segment(segment: &str) -> AuthResult<Vec<u8>> {
    let mut padded = String::with_capacity(segment.len() + 3);
    padded.push_str(segment);
    while padded.len() % 4 != 0 {
        padded.push('=');
    }

    URL_SAFE
        .decode(padded.as_bytes())
        .map_err(|e| AuthError::malformed(format!("invalid base64url segment: {e}")))
}

/// Encode bytes as an unpadded base64url segment.
pub fn encode_segment(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Split a token into exactly three segments.
fn split(token: &str) -> AuthResult<[&str; 3]> {
    let mut parts = token.split('.');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(header), Some(payload), Some(signature), None) => Ok([header, payload, signature]),
        _ => Err(AuthError::malformed("expected three dot-separated segments")),
    }
}

fn decode_json<T: DeserializeOwned>(segment: &str, what: &str) -> AuthResult<T> {
    let bytes = decode_segment(segment)?;
    serde_json::from_slice(&bytes).map_err(|e| AuthError::malformed(format!("invalid {what}: {e}")))
}

/// Decode the header segment of `token`.
pub fn header(token: &str) -> AuthResult<TokenHeader> {
    let [header, _, _] = split(token)?;
    decode_json(header, "header")
}

/// Decode the payload segment of `token`.
pub fn claims(token: &str) -> AuthResult<TokenClaims> {
    let [_, payload, _] = split(token)?;
    decode_json(payload, "payload")
}

/// Split and decode all of `token`.
pub fn parse(token: &str) -> AuthResult<DecodedToken> {
    let [header, payload, signature] = split(token)?;
    Ok(DecodedToken {
        header: decode_json(header, "header")?,
        claims: decode_json(payload, "payload")?,
        signature: signature.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn segment(value: &Value) -> String {
        encode_segment(&serde_json::to_vec(value).unwrap())
    }

    fn token(header: &Value, payload: &Value) -> String {
        format!("{}.{}.c2ln", segment(header), segment(payload))
    }

    #[test]
    fn parses_header_payload_and_keeps_signature() {
        let raw = token(
            &json!({"alg": "HS256", "kid": "k1", "typ": "JWT"}),
            &json!({"exp": 1_700_000_900, "userUuid": "u-1", "detailsHash": "h1", "tenant": "t"}),
        );

        let decoded = parse(&raw).unwrap();
        assert_eq!(decoded.header.alg, "HS256");
        assert_eq!(decoded.header.kid.as_deref(), Some("k1"));
        assert_eq!(decoded.claims.exp, Some(1_700_000_900));
        assert_eq!(decoded.claims.user_uuid.as_deref(), Some("u-1"));
        assert_eq!(decoded.claims.details_hash.as_deref(), Some("h1"));
        assert_eq!(decoded.claims.extra.get("tenant"), Some(&json!("t")));
        assert_eq!(decoded.signature, "c2ln");
    }

    #[test]
    fn padded_and_unpadded_segments_decode_the_same() {
        // {"alg":"HS256","kid":"k1"} needs one '=' of padding.
        let padded = "eyJhbGciOiJIUzI1NiIsImtpZCI6ImsxIn0=";
        let unpadded = padded.trim_end_matches('=');

        assert_eq!(decode_segment(padded).unwrap(), decode_segment(unpadded).unwrap());
        assert_eq!(
            decode_segment(unpadded).unwrap(),
            br#"{"alg":"HS256","kid":"k1"}"#.to_vec()
        );
    }

    #[test]
    fn wrong_segment_count_is_malformed() {
        for raw in ["", "a.b", "a.b.c.d", "no-dots-at-all"] {
            let err = parse(raw).unwrap_err();
            assert!(matches!(err, AuthError::MalformedToken(_)), "{raw:?}");
        }
    }

    #[test]
    fn undecodable_segment_is_malformed() {
        let err = header("!!!.e30.sig").unwrap_err();
        assert!(matches!(err, AuthError::MalformedToken(_)));
    }

    #[test]
    fn non_json_payload_is_malformed() {
        let raw = format!("{}.{}.sig", segment(&json!({"alg": "HS256"})), encode_segment(b"plain"));
        let err = claims(&raw).unwrap_err();
        assert!(matches!(err, AuthError::MalformedToken(_)));
    }

    #[test]
    fn header_without_alg_is_malformed() {
        let raw = token(&json!({"kid": "k1"}), &json!({"exp": 1}));
        assert!(matches!(header(&raw), Err(AuthError::MalformedToken(_))));
    }

    #[test]
    fn fractional_exp_is_floored_to_whole_seconds() {
        let raw = token(&json!({"alg": "HS256"}), &json!({"exp": 1_700_000_060.5}));
        assert_eq!(claims(&raw).unwrap().exp, Some(1_700_000_060));

        let raw = token(&json!({"alg": "HS256"}), &json!({"exp": null}));
        assert_eq!(claims(&raw).unwrap().exp, None);
    }

    #[test]
    fn non_numeric_exp_is_malformed() {
        let raw = token(&json!({"alg": "HS256"}), &json!({"exp": "tomorrow"}));
        assert!(matches!(claims(&raw), Err(AuthError::MalformedToken(_))));
    }

    #[test]
    fn empty_signature_segment_is_still_structurally_valid() {
        let raw = format!("{}.{}.", segment(&json!({"alg": "HS256"})), segment(&json!({})));
        let decoded = parse(&raw).unwrap();
        assert_eq!(decoded.signature, "");
        assert_eq!(decoded.claims.exp, None);
    }

    proptest! {
        /// Property: encoding structured claims into a segment and decoding
        /// it back yields the same structure.
        #[test]
        fn claims_survive_segment_round_trip(
            exp in proptest::option::of(0i64..4_000_000_000),
            user in proptest::option::of("[a-z0-9-]{1,36}"),
            hash in proptest::option::of("[a-f0-9]{0,64}"),
            extra_value in ".{0,24}",
        ) {
            let mut extra = Map::new();
            extra.insert("note".to_string(), Value::String(extra_value));
            let original = TokenClaims { exp, user_uuid: user, details_hash: hash, extra };

            let encoded = encode_segment(&serde_json::to_vec(&original).unwrap());
            let raw = format!("{}.{}.sig", segment(&json!({"alg": "none"})), encoded);

            prop_assert_eq!(claims(&raw).unwrap(), original);
        }
    }
}
