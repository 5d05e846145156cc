use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ClassifyError;
use crate::normalize::normalize;

/// Identifier families a search query can be recognised as.
///
/// The ordering is stable and determines iteration order of a
/// [`Classification`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierKind {
    Email,
    Phone,
    Iban,
    Wallet,
    Domain,
    Name,
}

impl IdentifierKind {
    pub const ALL: [IdentifierKind; 6] = [
        IdentifierKind::Email,
        IdentifierKind::Phone,
        IdentifierKind::Iban,
        IdentifierKind::Wallet,
        IdentifierKind::Domain,
        IdentifierKind::Name,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IdentifierKind::Email => "email",
            IdentifierKind::Phone => "phone",
            IdentifierKind::Iban => "iban",
            IdentifierKind::Wallet => "wallet",
            IdentifierKind::Domain => "domain",
            IdentifierKind::Name => "name",
        }
    }
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdentifierKind {
    type Err = ClassifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        IdentifierKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == lowered)
            .ok_or_else(|| ClassifyError::UnknownField(s.trim().to_string()))
    }
}

/// A query rewritten into the canonical form of one identifier kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedIdentifier {
    #[serde(rename = "type")]
    pub kind: IdentifierKind,
    pub canonical: String,
}

/// Every identifier a query was classified as, one entry per kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Classification {
    identifiers: Vec<NormalizedIdentifier>,
}

impl Classification {
    pub(crate) fn from_kinds<I>(query: &str, kinds: I) -> Self
    where
        I: IntoIterator<Item = IdentifierKind>,
    {
        let mut identifiers: Vec<NormalizedIdentifier> = Vec::new();
        for kind in kinds {
            if identifiers.iter().any(|id| id.kind == kind) {
                continue;
            }
            identifiers.push(NormalizedIdentifier {
                kind,
                canonical: normalize(query, kind),
            });
        }
        identifiers.sort_by_key(|id| id.kind);
        Self { identifiers }
    }

    pub fn kinds(&self) -> Vec<IdentifierKind> {
        self.identifiers.iter().map(|id| id.kind).collect()
    }

    pub fn contains(&self, kind: IdentifierKind) -> bool {
        self.identifiers.iter().any(|id| id.kind == kind)
    }

    /// Canonical form for `kind`, if the query was classified as it.
    pub fn get(&self, kind: IdentifierKind) -> Option<&str> {
        self.identifiers
            .iter()
            .find(|id| id.kind == kind)
            .map(|id| id.canonical.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &NormalizedIdentifier> {
        self.identifiers.iter()
    }

    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }
}

impl<'a> IntoIterator for &'a Classification {
    type Item = &'a NormalizedIdentifier;
    type IntoIter = std::slice::Iter<'a, NormalizedIdentifier>;

    fn into_iter(self) -> Self::IntoIter {
        self.identifiers.iter()
    }
}
