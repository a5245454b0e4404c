//! Payment signature verification.
//!
//! The gateway signs a captured payment with
//! `HMAC-SHA256(order_id|payment_id, key_secret)`, hex-encoded. The check
//! is deterministic and side-effect free; a mismatch is a boolean result,
//! not an error.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Recomputes the expected signature for an order/payment pair.
pub fn payment_signature(order_id: &str, payment_id: &str, key_secret: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(key_secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(format!("{order_id}|{payment_id}").as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Compares the supplied signature against the recomputed one.
///
/// The comparison is a plain equality over hex strings, matching the
/// upstream contract. It is not constant-time.
pub fn verify_payment_signature(
    order_id: &str,
    payment_id: &str,
    key_secret: &str,
    supplied: &str,
) -> bool {
    payment_signature(order_id, payment_id, key_secret) == supplied
}
