//! Salt generation, validation and rotation.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;

use crate::error::MaskingError;
use crate::hash::DeterministicHasher;

pub const MIN_SALT_LEN: usize = 32;
pub const MIN_DISTINCT_CHARS: usize = 10;
pub const SALT_BYTES: usize = 32;
pub const ROTATION_INTERVAL_DAYS: i64 = 90;

/// Check a salt against the strength rules.
///
/// Rules, in order: present, at least 32 characters, lowercase hex, at
/// least 10 distinct characters.
pub fn validate_salt(salt: &str) -> Result<(), MaskingError> {
    if salt.is_empty() {
        return Err(MaskingError::InvalidSalt("Salt is required"));
    }
    if salt.len() < MIN_SALT_LEN {
        return Err(MaskingError::InvalidSalt(
            "Salt must be at least 32 characters (256 bits)",
        ));
    }
    if !salt.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
        return Err(MaskingError::InvalidSalt("Salt must be hexadecimal string"));
    }
    let mut seen = [false; 16];
    for b in salt.bytes() {
        let idx = match b {
            b'0'..=b'9' => b - b'0',
            _ => b - b'a' + 10,
        };
        seen[idx as usize] = true;
    }
    if seen.iter().filter(|s| **s).count() < MIN_DISTINCT_CHARS {
        return Err(MaskingError::InvalidSalt("Salt has insufficient entropy"));
    }
    Ok(())
}

/// 32 random bytes, hex encoded.
pub fn generate_salt() -> String {
    let mut bytes = [0u8; SALT_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Which salt produced a stored hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaltGeneration {
    Current,
    Previous,
}

/// Holds the active salt and, after a rotation, the one it replaced.
///
/// The previous salt stays available so hashes recorded before the
/// rotation can still be matched until [`SaltManager::drop_previous`].
pub struct SaltManager {
    current: DeterministicHasher,
    previous: Option<DeterministicHasher>,
    rotated_at: DateTime<Utc>,
    rotation_interval: Duration,
}

impl SaltManager {
    pub fn new(salt: &str) -> Result<Self, MaskingError> {
        Ok(Self {
            current: DeterministicHasher::new(salt)?,
            previous: None,
            rotated_at: Utc::now(),
            rotation_interval: Duration::days(ROTATION_INTERVAL_DAYS),
        })
    }

    pub fn with_rotation_interval(mut self, interval: Duration) -> Self {
        self.rotation_interval = interval;
        self
    }

    pub fn current(&self) -> &DeterministicHasher {
        &self.current
    }

    pub fn previous(&self) -> Option<&DeterministicHasher> {
        self.previous.as_ref()
    }

    pub fn rotated_at(&self) -> DateTime<Utc> {
        self.rotated_at
    }

    /// Install `new_salt`, keeping the current one as previous.
    pub fn rotate(&mut self, new_salt: &str) -> Result<(), MaskingError> {
        let next = DeterministicHasher::new(new_salt)?;
        self.previous = Some(std::mem::replace(&mut self.current, next));
        self.rotated_at = Utc::now();
        tracing::info!(rotated_at = %self.rotated_at, "masking salt rotated");
        Ok(())
    }

    /// Install a freshly generated salt and return it.
    pub fn rotate_generated(&mut self) -> Result<String, MaskingError> {
        let salt = generate_salt();
        self.rotate(&salt)?;
        Ok(salt)
    }

    /// Find which salt generation produced `hash` for `value`.
    pub fn resolve(&self, value: &str, hash: &str) -> Option<SaltGeneration> {
        if self.current.hash(value) == hash {
            return Some(SaltGeneration::Current);
        }
        match &self.previous {
            Some(previous) if previous.hash(value) == hash => Some(SaltGeneration::Previous),
            _ => None,
        }
    }

    pub fn needs_rotation(&self) -> bool {
        self.needs_rotation_at(Utc::now())
    }

    pub fn needs_rotation_at(&self, now: DateTime<Utc>) -> bool {
        now - self.rotated_at >= self.rotation_interval
    }

    /// End the grace window.
    pub fn drop_previous(&mut self) {
        self.previous = None;
    }
}

impl std::fmt::Debug for SaltManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaltManager")
            .field("has_previous", &self.previous.is_some())
            .field("rotated_at", &self.rotated_at)
            .field("rotation_interval", &self.rotation_interval)
            .finish()
    }
}
