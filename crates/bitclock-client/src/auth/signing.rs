//! Signed token envelope.
//!
//! An 80-hex-digit token is a 40-digit fingerprint followed by a 40-digit
//! secret. The signed form never carries the secret, only a proof of it:
//! `PREAMBLE.base64(fingerprint|salt|timestamp|proof)`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{SecondsFormat, Utc};
use uuid::Uuid;

/// Base-36 char codes of "signed".
pub const PREAMBLE: &str = "372x2v322t2s";

/// Transforms a raw token before it is put on the wire.
pub trait TokenSigner: Send + Sync {
    fn sign(&self, token: &str) -> String;
}

/// Default signer: salted, timestamped proof of the token secret.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProofSigner;

impl TokenSigner for ProofSigner {
    fn sign(&self, token: &str) -> String {
        sign_token(token)
    }
}

/// The fields of a signed token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedToken {
    pub fingerprint: String,
    pub salt: String,
    pub timestamp: String,
    pub proof: String,
}

impl DecodedToken {
    /// Recompute the proof with `secret` and compare.
    pub fn verify(&self, secret: &str) -> bool {
        proof(secret, &self.salt, &self.timestamp) == self.proof
    }
}

/// Split a raw token into `(fingerprint, secret)`.
fn split_token(token: &str) -> Option<(&str, &str)> {
    if token.len() != 80 || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    Some(token.split_at(40))
}

pub fn proof(secret: &str, salt: &str, timestamp: &str) -> String {
    let content = [secret, salt, timestamp].join(":");
    blake3::hash(content.as_bytes()).to_hex().to_string()
}

/// Eight random bytes, hex encoded. Skips the UUID version and variant bytes.
fn random_salt() -> String {
    Uuid::new_v4()
        .into_bytes()
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != 6 && *i != 8)
        .take(8)
        .map(|(_, b)| format!("{b:02x}"))
        .collect()
}

/// Sign a raw token. A token of the wrong shape is returned unchanged.
pub fn sign_token(token: &str) -> String {
    let Some((fingerprint, secret)) = split_token(token) else {
        tracing::warn!("invalid token format, sending it unsigned");
        return token.to_string();
    };
    let salt = random_salt();
    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    let proof = proof(secret, &salt, &timestamp);
    let payload = [fingerprint, &salt, &timestamp, &proof].join("|");
    format!("{PREAMBLE}.{}", STANDARD.encode(payload))
}

/// Reverse [`sign_token`]. Returns `None` (with a warning) for anything that
/// is not a well-formed signed token.
pub fn decode_token(token: &str) -> Option<DecodedToken> {
    let decoded = token
        .strip_prefix(PREAMBLE)
        .and_then(|rest| rest.strip_prefix('.'))
        .and_then(|encoded| STANDARD.decode(encoded).ok())
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .and_then(|payload| {
            let mut parts = payload.splitn(4, '|').map(str::to_string);
            Some(DecodedToken {
                fingerprint: parts.next()?,
                salt: parts.next()?,
                timestamp: parts.next()?,
                proof: parts.next()?,
            })
        });
    if decoded.is_none() {
        tracing::warn!("invalid token format");
    }
    decoded
}
