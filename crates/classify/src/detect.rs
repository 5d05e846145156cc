use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::IdentifierKind;

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern"));
static PHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9\s\-+()]{7,20}$").expect("phone pattern"));
static IBAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[A-Z]{2}[0-9]{2}[A-Z0-9]{4,30}$").expect("iban pattern"));
static ETH_WALLET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^0x[a-fA-F0-9]{40}$").expect("eth pattern"));
static BTC_WALLET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[13][a-km-zA-HJ-NP-Z1-9]{25,34}$").expect("btc pattern")
});
static TRON_WALLET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^T[A-Za-z1-9]{33}$").expect("tron pattern"));
static DOMAIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?\.)+[a-zA-Z]{2,}$")
        .expect("domain pattern")
});
pub(crate) static URL_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:https?://)?(?:www\.)?").expect("url prefix pattern"));

/// Return every identifier kind `query` looks like.
///
/// Detectors are independent; a query can be both a phone number and an
/// IBAN. [`IdentifierKind::Name`] is returned only when nothing else
/// matched.
pub fn detect(query: &str) -> BTreeSet<IdentifierKind> {
    let query = query.trim();
    let mut kinds = BTreeSet::new();

    if EMAIL.is_match(query) {
        kinds.insert(IdentifierKind::Email);
    }
    if PHONE.is_match(query) {
        kinds.insert(IdentifierKind::Phone);
    }
    let compact: String = query.chars().filter(|c| !c.is_whitespace()).collect();
    if IBAN.is_match(&compact) {
        kinds.insert(IdentifierKind::Iban);
    }
    if ETH_WALLET.is_match(query) || BTC_WALLET.is_match(query) || TRON_WALLET.is_match(query) {
        kinds.insert(IdentifierKind::Wallet);
    }
    if DOMAIN.is_match(host_part(query)) {
        kinds.insert(IdentifierKind::Domain);
    }

    if kinds.is_empty() {
        kinds.insert(IdentifierKind::Name);
    }
    kinds
}

/// Host portion of a URL-ish string: scheme and `www.` removed, path dropped.
pub(crate) fn host_part(query: &str) -> &str {
    let prefix_len = URL_PREFIX.find(query).map(|m| m.end()).unwrap_or(0);
    let rest = &query[prefix_len..];
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    &rest[..end]
}
