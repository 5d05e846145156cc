use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::MaskingError;
use crate::salt::validate_salt;

type HmacSha256 = Hmac<Sha256>;

/// Salted HMAC-SHA256 over normalized values.
///
/// Values are lowercased and trimmed before hashing, so `" Foo@X.com"` and
/// `"foo@x.com"` share a hash.
#[derive(Clone)]
pub struct DeterministicHasher {
    mac: HmacSha256,
}

impl DeterministicHasher {
    /// Build a hasher after checking the salt strength.
    pub fn new(salt: &str) -> Result<Self, MaskingError> {
        validate_salt(salt)?;
        Self::from_key(salt.as_bytes())
    }

    /// Build a hasher without the strength check. Intended for tests and
    /// local tooling.
    pub fn new_unchecked(salt: &str) -> Result<Self, MaskingError> {
        if salt.is_empty() {
            return Err(MaskingError::InvalidSalt("Salt is required"));
        }
        Self::from_key(salt.as_bytes())
    }

    fn from_key(key: &[u8]) -> Result<Self, MaskingError> {
        let mac = HmacSha256::new_from_slice(key)
            .map_err(|_| MaskingError::InvalidSalt("Salt is not a usable HMAC key"))?;
        Ok(Self { mac })
    }

    /// Lowercase hex HMAC of `lowercase(trim(value))`.
    pub fn hash(&self, value: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(value.trim().to_lowercase().as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// First 32 bits of the hash as an unsigned integer.
    pub fn seed(&self, value: &str) -> u32 {
        hash_to_seed(&self.hash(value))
    }
}

/// Parse the first eight hex characters of a hash.
pub fn hash_to_seed(hash: &str) -> u32 {
    hash.get(..8)
        .and_then(|prefix| u32::from_str_radix(prefix, 16).ok())
        .unwrap_or(0)
}

impl std::fmt::Debug for DeterministicHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeterministicHasher")
            .field("salt", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SALT: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    #[test]
    fn hash_is_stable_across_instances() {
        let a = DeterministicHasher::new(SALT).unwrap();
        let b = DeterministicHasher::new(SALT).unwrap();
        assert_eq!(a.hash("scammer@example.com"), b.hash("scammer@example.com"));
        assert_eq!(a.hash("scammer@example.com").len(), 64);
    }

    #[test]
    fn hash_normalizes_case_and_whitespace() {
        let hasher = DeterministicHasher::new(SALT).unwrap();
        assert_eq!(hasher.hash("  Scammer@Example.COM "), hasher.hash("scammer@example.com"));
    }

    #[test]
    fn different_salts_differ() {
        let a = DeterministicHasher::new(SALT).unwrap();
        let b = DeterministicHasher::new(
            "fedcba9876543210fedcba9876543210fedcba9876543210fedcba9876543210",
        )
        .unwrap();
        assert_ne!(a.hash("john"), b.hash("john"));
    }

    #[test]
    fn matches_known_hmac_vector() {
        // HMAC_SHA256("key", "")
        let hasher = DeterministicHasher::new_unchecked("key").unwrap();
        assert_eq!(
            hasher.hash(""),
            "5d5d139563c95b5967b9bd9a8c9b233a9dedb45072794cd232dc1b74832607d0"
        );
    }

    #[test]
    fn seed_reads_first_eight_hex_chars() {
        assert_eq!(hash_to_seed("ffffffff00"), u32::MAX);
        assert_eq!(hash_to_seed("0000000a"), 10);
        assert_eq!(hash_to_seed("zz"), 0);

        let hasher = DeterministicHasher::new(SALT).unwrap();
        let hash = hasher.hash("value");
        assert_eq!(hasher.seed("value"), hash_to_seed(&hash));
    }

    #[test]
    fn weak_salt_rejected() {
        assert!(DeterministicHasher::new("abc").is_err());
        assert!(DeterministicHasher::new_unchecked("").is_err());
    }

    #[test]
    fn debug_redacts_key() {
        let hasher = DeterministicHasher::new(SALT).unwrap();
        let debug = format!("{hasher:?}");
        assert!(debug.contains("redacted"));
        assert!(!debug.contains(SALT));
    }
}
