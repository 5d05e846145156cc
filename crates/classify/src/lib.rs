//! Query classification for fraud report search.
//!
//! A raw search string can look like several identifier types at once: a
//! run of digits may be a phone number and, after whitespace removal, an
//! IBAN as well. This crate runs every detector independently and keeps all
//! matches, so downstream exact matching can OR across every candidate.
//!
//! # Pipeline
//!
//! 1. [`detect`] returns the set of [`IdentifierKind`]s the query looks like
//!    (`name` when nothing else matches).
//! 2. [`normalize`] converts the query into the canonical form stored in the
//!    indexed column for each kind.
//! 3. [`classify`] combines both into a [`Classification`].
//!
//! # Examples
//!
//! ```rust
//! use classify::{classify, IdentifierKind};
//!
//! let found = classify("Scammer@Example.com ");
//! assert_eq!(found.get(IdentifierKind::Email), Some("scammer@example.com"));
//! assert!(!found.contains(IdentifierKind::Name));
//!
//! let found = classify("John Smith");
//! assert_eq!(found.get(IdentifierKind::Name), Some("john smith"));
//! ```
//!
//! Callers that already know which fields to search can bypass detection
//! with [`classify_as`] and [`parse_fields`].

mod detect;
mod error;
mod normalize;
mod types;

pub use detect::detect;
pub use error::ClassifyError;
pub use normalize::normalize;
pub use types::{Classification, IdentifierKind, NormalizedIdentifier};

/// Detect every identifier kind in `query` and normalize the query for each.
pub fn classify(query: &str) -> Classification {
    let query = query.trim();
    Classification::from_kinds(query, detect(query))
}

/// Normalize `query` for an explicit list of kinds, skipping detection.
///
/// An empty `kinds` slice falls back to [`classify`].
pub fn classify_as(query: &str, kinds: &[IdentifierKind]) -> Classification {
    if kinds.is_empty() {
        return classify(query);
    }
    Classification::from_kinds(query.trim(), kinds.iter().copied())
}

/// Parse a comma separated `fields` parameter such as `"email, phone"`.
///
/// Blank entries are ignored. Unknown names fail with
/// [`ClassifyError::UnknownField`].
pub fn parse_fields(fields: &str) -> Result<Vec<IdentifierKind>, ClassifyError> {
    let mut kinds = Vec::new();
    for raw in fields.split(',') {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        let kind: IdentifierKind = raw.parse()?;
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    Ok(kinds)
}
