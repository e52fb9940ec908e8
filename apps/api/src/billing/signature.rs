//! HMAC-SHA256 webhook signatures.
//!
//! The provider signs the exact raw request body with the shared secret and sends
//! the digest as lowercase hex. Verification is case-sensitive: anything but the
//! exact lowercase digest is rejected.

use hmac::{digest::InvalidLength, Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_HEX_LEN: usize = 64;

/// Lowercase hex HMAC-SHA256 of `body` under `secret`.
pub fn sign(secret: &[u8], body: &[u8]) -> Result<String, InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(secret)?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Checks `provided` against the digest of `body`. The digest comparison is
/// constant-time.
pub fn verify_signature(secret: &[u8], body: &[u8], provided: &str) -> bool {
    let is_lower_hex = provided.len() == SIGNATURE_HEX_LEN
        && provided
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
    if !is_lower_hex {
        return false;
    }

    let Ok(expected) = hex::decode(provided) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOX: &[u8] = b"The quick brown fox jumps over the lazy dog";
    const FOX_DIGEST: &str = "f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8";

    #[test]
    fn test_known_vector() {
        assert_eq!(sign(b"key", FOX).unwrap(), FOX_DIGEST);
    }

    #[test]
    fn test_verify_accepts_exact_digest() {
        assert!(verify_signature(b"key", FOX, FOX_DIGEST));
    }

    #[test]
    fn test_verify_is_case_sensitive() {
        assert!(!verify_signature(b"key", FOX, &FOX_DIGEST.to_uppercase()));
    }

    #[test]
    fn test_verify_rejects_truncated() {
        assert!(!verify_signature(b"key", FOX, &FOX_DIGEST[..62]));
        assert!(!verify_signature(b"key", FOX, &FOX_DIGEST[..63]));
        assert!(!verify_signature(b"key", FOX, ""));
    }

    #[test]
    fn test_verify_rejects_wrong_secret_and_body() {
        assert!(!verify_signature(b"other", FOX, FOX_DIGEST));
        assert!(!verify_signature(b"key", b"The quick brown fox", FOX_DIGEST));
    }

    #[test]
    fn test_verify_rejects_padded() {
        assert!(!verify_signature(b"key", FOX, &format!(" {FOX_DIGEST}")));
    }
}
