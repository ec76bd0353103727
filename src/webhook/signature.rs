//! HMAC-SHA256 verification of webhook bodies.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::error::WebhookError;

const SIGNATURE_PREFIX: &str = "sha256=";

/// Checks `header` against `sha256=<hex(HMAC-SHA256(secret, body))>`.
///
/// The comparison runs in constant time. An absent, empty, or malformed
/// header is a mismatch.
///
/// # Errors
///
/// Returns [`WebhookError::SignatureMismatch`] unless the header matches.
pub fn verify(secret: &str, body: &[u8], header: Option<&str>) -> Result<(), WebhookError> {
    let digest = header
        .and_then(|value| value.trim().strip_prefix(SIGNATURE_PREFIX))
        .and_then(decode_hex)
        .ok_or(WebhookError::SignatureMismatch)?;
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|_| WebhookError::SignatureMismatch)?;
    mac.update(body);
    mac.verify_slice(&digest)
        .map_err(|_| WebhookError::SignatureMismatch)
}

/// Computes the header value GitHub would send for `body`.
#[must_use]
pub fn sign(secret: &str, body: &[u8]) -> String {
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(secret.as_bytes()) else {
        return String::new();
    };
    mac.update(body);
    let digest = mac.finalize().into_bytes();
    let hex: String = digest.iter().map(|byte| format!("{byte:02x}")).collect();
    format!("{SIGNATURE_PREFIX}{hex}")
}

/// Decodes a lowercase or uppercase hex string; `None` when empty, odd, or
/// not hex.
pub(crate) fn decode_hex(raw: &str) -> Option<Vec<u8>> {
    if raw.is_empty() || !raw.len().is_multiple_of(2) {
        return None;
    }
    raw.as_bytes()
        .chunks(2)
        .map(|pair| {
            let text = std::str::from_utf8(pair).ok()?;
            u8::from_str_radix(text, 16).ok()
        })
        .collect()
}
