//! HMAC-SHA256 webhook signatures.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying `sha256=<hex>` of the raw request body.
pub const SIGNATURE_HEADER: &str = "x-audiohook-signature";

/// Verify a webhook signature (`sha256=<hex>` or bare hex) over `body`.
pub fn verify_webhook_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return false,
    };

    mac.update(body);

    let expected_sig = signature
        .trim()
        .strip_prefix("sha256=")
        .unwrap_or(signature.trim());

    let expected_bytes = match hex::decode(expected_sig) {
        Ok(b) => b,
        Err(_) => return false,
    };

    mac.verify_slice(&expected_bytes).is_ok()
}

/// Compute the `sha256=<hex>` signature for `body`.
pub fn sign(secret: &str, body: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(body);
    Some(format!("sha256={}", hex::encode(mac.finalize().into_bytes())))
}
