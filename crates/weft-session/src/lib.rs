//! weft-session — signed-cookie codec.
//!
//! Pure sign/verify over cookie values: `sign` appends a
//! base64url-no-padding HMAC-SHA256 tag, `unsign` recomputes it and
//! returns the value only on an exact match. A mismatch is a routine
//! verification outcome, so `unsign` returns `None` rather than an
//! error.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Sign a value, producing `"<value>.<signature>"`.
pub fn sign(value: &str, secret: &str) -> String {
    let tag = mac(value, secret).finalize().into_bytes();
    format!("{value}.{}", URL_SAFE_NO_PAD.encode(tag))
}

/// Verify a signed cookie and recover the value.
///
/// Splits on the LAST `.` (values may contain dots themselves) and
/// compares the recomputed tag in constant time. Returns `None` on a
/// missing separator, an undecodable signature, or a mismatch.
pub fn unsign(cookie: &str, secret: &str) -> Option<String> {
    let (value, signature) = cookie.rsplit_once('.')?;
    let tag = URL_SAFE_NO_PAD.decode(signature).ok()?;
    // verify_slice is constant-time over the full tag length.
    mac(value, secret).verify_slice(&tag).ok()?;
    Some(value.to_string())
}

fn mac(value: &str, secret: &str) -> HmacSha256 {
    // HMAC accepts keys of any length.
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC accepts any key length"));
    mac.update(value.as_bytes());
    mac
}
