use crate::detect::host_part;
use crate::types::IdentifierKind;

/// Rewrite `query` into the canonical form stored for `kind`.
///
/// | kind   | canonical form                               |
/// |--------|----------------------------------------------|
/// | phone  | ASCII digits only                            |
/// | email  | trimmed, lowercase                           |
/// | iban   | whitespace removed, uppercase                |
/// | wallet | trimmed, lowercase                           |
/// | domain | lowercase host without scheme, `www.`, path  |
/// | name   | trimmed, lowercase                           |
pub fn normalize(query: &str, kind: IdentifierKind) -> String {
    match kind {
        IdentifierKind::Phone => query.chars().filter(char::is_ascii_digit).collect(),
        IdentifierKind::Email | IdentifierKind::Name | IdentifierKind::Wallet => {
            query.trim().to_lowercase()
        }
        IdentifierKind::Iban => query
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_uppercase(),
        IdentifierKind::Domain => host_part(query.trim()).to_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_keeps_digits() {
        assert_eq!(normalize("+421 (912) 345-678", IdentifierKind::Phone), "421912345678");
    }

    #[test]
    fn email_lowercases_and_trims() {
        assert_eq!(normalize("  Scammer@Example.COM ", IdentifierKind::Email), "scammer@example.com");
    }

    #[test]
    fn iban_compacts_and_uppercases() {
        assert_eq!(
            normalize("sk89 1100 0000 0029 4912 9426", IdentifierKind::Iban),
            "SK8911000000002949129426"
        );
    }

    #[test]
    fn wallet_lowercases() {
        assert_eq!(
            normalize("0x742d35Cc6634C0532925a3b844Bc454e4438f44e", IdentifierKind::Wallet),
            "0x742d35cc6634c0532925a3b844bc454e4438f44e"
        );
    }

    #[test]
    fn domain_strips_scheme_and_www() {
        assert_eq!(normalize("https://WWW.Scam-Site.com/page", IdentifierKind::Domain), "scam-site.com");
        assert_eq!(normalize("http://example.org", IdentifierKind::Domain), "example.org");
    }

    #[test]
    fn name_lowercases_and_trims() {
        assert_eq!(normalize("  John SCAMMER ", IdentifierKind::Name), "john scammer");
    }
}
