//! Payload signature check for webhook POSTs.
//!
//! Messenger signs each body with the app secret and sends `X-Hub-Signature-256: sha256=<hex>`.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// True when `signature_header` is the HMAC-SHA256 of `body` under `app_secret`.
/// The digest comparison is constant-time (`Mac::verify_slice`).
pub fn verify_signature(body: &[u8], signature_header: &str, app_secret: &str) -> bool {
    let Some(digest) = signature_header
        .trim()
        .strip_prefix("sha256=")
        .and_then(|h| hex::decode(h).ok())
    else {
        log::warn!("webhook signature header is not sha256=<hex>");
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(app_secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&digest).is_ok()
}
