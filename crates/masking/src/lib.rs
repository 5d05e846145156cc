//! Role-based PII masking for fraud report disclosure.
//!
//! A [`MaskingPolicy`] assigns every personal-data field a [`DataType`] and
//! the lowest [`Role`] allowed to see it unmasked. Below that role the
//! [`DisclosureEngine`] picks a [`MaskingStrategy`] from a
//! [`StrategyTable`] keyed by `(data type, role)` and applies it.
//!
//! Masking is a pure function of the value, the role and (in deterministic
//! mode) the salt. Deterministic mode additionally records every masked
//! output in a [`MappingTable`], so two distinct originals that would mask
//! to the same string are told apart with a hash suffix.
//!
//! ```rust
//! use masking::{DisclosureEngine, FieldValue, Role};
//!
//! let engine = DisclosureEngine::standard();
//! let masked = engine.mask_field(
//!     "scammer_email",
//!     Some(&FieldValue::text("scammer@example.com")),
//!     Role::Basic,
//! );
//! assert_eq!(masked, Some(FieldValue::text("s*****@example.com")));
//! ```

pub mod audit;
pub mod engine;
pub mod error;
pub mod hash;
pub mod mapping;
pub mod mask;
pub mod policy;
pub mod salt;
pub mod strategy;
pub mod value;

pub use audit::{AuditAction, AuditRecord};
pub use engine::{Disclosure, DisclosureEngine};
pub use error::MaskingError;
pub use hash::{hash_to_seed, DeterministicHasher};
pub use mapping::{MappingStats, MappingTable};
pub use mask::{
    mask_address, mask_amount, mask_date, mask_email, mask_email_partial, mask_iban, mask_ip,
    mask_ipv4, mask_ipv6, mask_license_plate, mask_name, mask_name_partial, mask_phone,
    mask_phone_partial, mask_transaction_id, mask_vin, mask_wallet, summarize_text,
};
pub use policy::{fields, DataType, FieldPolicy, MaskingPolicy, Role};
pub use salt::{generate_salt, validate_salt, SaltGeneration, SaltManager};
pub use strategy::{MaskingStrategy, StrategyTable, SUMMARY_MAX_CHARS};
pub use value::{Address, FieldValue, Money};
