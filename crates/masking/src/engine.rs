use std::collections::BTreeMap;
use std::sync::Arc;

use crate::audit::AuditRecord;
use crate::error::MaskingError;
use crate::hash::DeterministicHasher;
use crate::mapping::MappingTable;
use crate::policy::{FieldPolicy, MaskingPolicy, Role};
use crate::strategy::StrategyTable;
use crate::value::FieldValue;

#[derive(Debug, Clone)]
struct Deterministic {
    hasher: DeterministicHasher,
    table: Arc<MappingTable>,
}

/// Output of [`DisclosureEngine::disclose`].
#[derive(Debug, Clone)]
pub struct Disclosure {
    pub fields: BTreeMap<String, FieldValue>,
    pub audit: AuditRecord,
}

/// Applies a [`MaskingPolicy`] to record fields for a given role.
///
/// Fields without a policy entry are not personal data and pass through.
#[derive(Debug, Clone)]
pub struct DisclosureEngine {
    policy: MaskingPolicy,
    strategies: StrategyTable,
    deterministic: Option<Deterministic>,
}

impl DisclosureEngine {
    pub fn new(policy: MaskingPolicy, strategies: StrategyTable) -> Self {
        Self {
            policy,
            strategies,
            deterministic: None,
        }
    }

    /// Standard policy and strategy table, no collision tracking.
    pub fn standard() -> Self {
        Self::new(MaskingPolicy::standard(), StrategyTable::standard())
    }

    /// Route fields flagged `deterministic` through `table`.
    pub fn with_deterministic(mut self, hasher: DeterministicHasher, table: Arc<MappingTable>) -> Self {
        self.deterministic = Some(Deterministic { hasher, table });
        self
    }

    pub fn policy(&self) -> &MaskingPolicy {
        &self.policy
    }

    pub fn mapping_table(&self) -> Option<&Arc<MappingTable>> {
        self.deterministic.as_ref().map(|d| &d.table)
    }

    /// Disclose one field to `role`.
    ///
    /// Returns `None` when the value is missing or empty, or when masking
    /// fails. Failures are logged, never raised.
    pub fn mask_field(&self, field: &str, value: Option<&FieldValue>, role: Role) -> Option<FieldValue> {
        let value = value.filter(|v| !v.is_empty())?;
        let Some(policy) = self.policy.get(field) else {
            return Some(value.clone());
        };
        if policy.is_visible_to(role) {
            return Some(value.clone());
        }

        match self.apply(policy, value, role) {
            Ok(masked) if masked.is_empty() => None,
            Ok(masked) => Some(masked),
            Err(err) => {
                tracing::warn!(
                    field,
                    data_type = %policy.data_type,
                    role = %role,
                    error = %err,
                    "field masking failed, omitting field"
                );
                None
            }
        }
    }

    fn apply(&self, policy: &FieldPolicy, value: &FieldValue, role: Role) -> Result<FieldValue, MaskingError> {
        let strategy = policy
            .strategy
            .unwrap_or_else(|| self.strategies.lookup(policy.data_type, role));
        let masked = strategy.apply(value, role)?;

        match (&self.deterministic, policy.deterministic, value, masked) {
            (Some(det), true, FieldValue::Text(raw), FieldValue::Text(out)) => {
                let hash = det.hasher.hash(raw);
                Ok(FieldValue::Text(det.table.register(&hash, &out)))
            }
            (_, _, _, masked) => Ok(masked),
        }
    }

    /// Disclose every field of a record and build the matching audit record.
    pub fn disclose(
        &self,
        record_id: &str,
        fields: &BTreeMap<String, FieldValue>,
        role: Role,
    ) -> Disclosure {
        let mut audit = AuditRecord::view(record_id, role);
        let mut out = BTreeMap::new();

        for (name, value) in fields {
            audit.fields_accessed.push(name.clone());
            let masked = self
                .policy
                .get(name)
                .is_some_and(|policy| !policy.is_visible_to(role));
            if masked {
                audit.fields_masked.push(name.clone());
            }
            if let Some(disclosed) = self.mask_field(name, Some(value), role) {
                out.insert(name.clone(), disclosed);
            }
        }

        Disclosure { fields: out, audit }
    }
}

impl Default for DisclosureEngine {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{fields, DataType};
    use crate::strategy::MaskingStrategy;
    use crate::value::{Address, Money};
    use chrono::{TimeZone, Utc};

    const SALT: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    fn record() -> BTreeMap<String, FieldValue> {
        BTreeMap::from([
            (fields::SCAMMER_NAME.to_string(), FieldValue::text("Vladimir Gala")),
            (fields::SCAMMER_EMAIL.to_string(), FieldValue::text("scammer@example.com")),
            (fields::SCAMMER_PHONE.to_string(), FieldValue::text("+421 912 345 678")),
            (fields::REPORTER_NAME.to_string(), FieldValue::text("Jana Novakova")),
            (fields::REPORTER_EMAIL.to_string(), FieldValue::text("jana@example.sk")),
            (fields::IBAN.to_string(), FieldValue::text("SK89 1100 0000 0029 4912 9426")),
            (
                fields::AMOUNT_LOST.to_string(),
                FieldValue::Amount(Money {
                    amount: 5432.18,
                    currency: Some("EUR".into()),
                }),
            ),
            (
                fields::SCAMMER_ADDRESS.to_string(),
                FieldValue::Address(Address {
                    street: Some("Hlavna 1".into()),
                    city: Some("Bratislava".into()),
                    postal_code: Some("84101".into()),
                    country: Some("SK".into()),
                }),
            ),
            (
                fields::SUBMISSION_DATE.to_string(),
                FieldValue::Date(Utc.with_ymd_and_hms(2025, 12, 9, 10, 30, 0).unwrap()),
            ),
            ("fraud_type".to_string(), FieldValue::text("PHISHING")),
        ])
    }

    fn text<'a>(out: &'a BTreeMap<String, FieldValue>, field: &str) -> &'a str {
        out.get(field).and_then(FieldValue::as_text).unwrap()
    }

    #[test]
    fn basic_never_sees_protected_raw_values() {
        let engine = DisclosureEngine::standard();
        let input = record();
        let out = engine.disclose("r-1", &input, Role::Basic).fields;

        for (name, policy) in engine.policy().iter() {
            if policy.min_role > Role::Basic {
                if let (Some(raw), Some(masked)) = (input.get(name), out.get(name)) {
                    assert_ne!(raw, masked, "{name} leaked");
                }
            }
        }
        assert_eq!(text(&out, fields::SCAMMER_NAME), "Vlxxxxxr Gaxa");
        assert_eq!(text(&out, fields::SCAMMER_EMAIL), "s*****@example.com");
        assert_eq!(text(&out, fields::AMOUNT_LOST), "EUR 1,000 - 10,000");
        assert_eq!(text(&out, fields::SUBMISSION_DATE), "2025-12-XX");
        assert_eq!(
            out.get(fields::SCAMMER_ADDRESS),
            Some(&FieldValue::Address(Address {
                country: Some("SK".into()),
                ..Address::default()
            }))
        );
        assert_eq!(text(&out, "fraud_type"), "PHISHING");
    }

    #[test]
    fn gold_gets_scammer_raw_but_reporter_masked() {
        let engine = DisclosureEngine::standard();
        let out = engine.disclose("r-1", &record(), Role::Gold).fields;

        assert_eq!(text(&out, fields::SCAMMER_NAME), "Vladimir Gala");
        assert_eq!(text(&out, fields::IBAN), "SK89 1100 0000 0029 4912 9426");
        // pinned to the full-mask strategy, no partial name for reporters
        assert_eq!(text(&out, fields::REPORTER_NAME), "Jaxa Noxxxxxa");
        assert_eq!(text(&out, fields::REPORTER_EMAIL), "j*****@example.sk");
    }

    #[test]
    fn standard_role_gets_partial_scammer_name() {
        let engine = DisclosureEngine::standard();
        let out = engine.disclose("r-1", &record(), Role::Standard).fields;
        assert_eq!(text(&out, fields::SCAMMER_NAME), "Vladimir G.");
        assert_eq!(
            out.get(fields::SUBMISSION_DATE),
            record().get(fields::SUBMISSION_DATE)
        );
        assert_eq!(text(&out, fields::AMOUNT_LOST), "EUR 5,400");
    }

    #[test]
    fn admin_sees_everything() {
        let engine = DisclosureEngine::standard();
        let input = record();
        let disclosure = engine.disclose("r-1", &input, Role::Admin);
        assert_eq!(disclosure.fields, input);
        assert!(disclosure.audit.fields_masked.is_empty());
    }

    #[test]
    fn missing_and_empty_values_are_omitted() {
        let engine = DisclosureEngine::standard();
        assert_eq!(engine.mask_field(fields::SCAMMER_NAME, None, Role::Basic), None);
        assert_eq!(
            engine.mask_field(fields::SCAMMER_NAME, Some(&FieldValue::text("")), Role::Basic),
            None
        );
    }

    #[test]
    fn failing_strategy_omits_field() {
        let engine = DisclosureEngine::standard();
        let negative = FieldValue::Amount(Money {
            amount: -10.0,
            currency: None,
        });
        assert_eq!(engine.mask_field(fields::AMOUNT_LOST, Some(&negative), Role::Basic), None);

        let wrong_shape = FieldValue::Address(Address {
            city: Some("Praha".into()),
            ..Address::default()
        });
        assert_eq!(engine.mask_field(fields::SCAMMER_EMAIL, Some(&wrong_shape), Role::Basic), None);
    }

    #[test]
    fn audit_lists_masked_fields() {
        let engine = DisclosureEngine::standard();
        let audit = engine.disclose("r-9", &record(), Role::Gold).audit;
        assert_eq!(audit.record_id, "r-9");
        assert_eq!(audit.fields_accessed.len(), record().len());
        assert_eq!(
            audit.fields_masked,
            vec![fields::REPORTER_EMAIL.to_string(), fields::REPORTER_NAME.to_string()]
        );
    }

    #[test]
    fn deterministic_collisions_are_suffixed() {
        let hasher = DeterministicHasher::new(SALT).unwrap();
        let table = Arc::new(MappingTable::new());
        let engine = DisclosureEngine::standard().with_deterministic(hasher.clone(), Arc::clone(&table));

        let first = engine
            .mask_field(fields::SCAMMER_NAME, Some(&FieldValue::text("John")), Role::Basic)
            .unwrap();
        let second = engine
            .mask_field(fields::SCAMMER_NAME, Some(&FieldValue::text("Joan")), Role::Basic)
            .unwrap();
        let again = engine
            .mask_field(fields::SCAMMER_NAME, Some(&FieldValue::text(" JOHN ")), Role::Basic)
            .unwrap();

        assert_eq!(first, FieldValue::text("Joxn"));
        let expected = format!("Joxn#{}", &hasher.hash("Joan")[..4]);
        assert_eq!(second, FieldValue::text(expected));
        assert_eq!(again, first);
        assert_eq!(table.stats().collisions, 1);
    }

    #[test]
    fn deterministic_output_survives_restart() {
        let mask = || {
            let engine = DisclosureEngine::standard().with_deterministic(
                DeterministicHasher::new(SALT).unwrap(),
                Arc::new(MappingTable::new()),
            );
            engine.mask_field(
                fields::SCAMMER_EMAIL,
                Some(&FieldValue::text("scammer@example.com")),
                Role::Standard,
            )
        };
        assert_eq!(mask(), mask());
    }

    #[test]
    fn custom_policy_and_table() {
        let policy = MaskingPolicy::new().with_field(
            "nickname",
            FieldPolicy::new(DataType::Name, Role::Standard),
        );
        let table = StrategyTable::empty().with_override(
            DataType::Name,
            Role::Basic,
            MaskingStrategy::NamePartial,
        );
        let engine = DisclosureEngine::new(policy, table);
        assert_eq!(
            engine.mask_field("nickname", Some(&FieldValue::text("Crypto King")), Role::Basic),
            Some(FieldValue::text("Crypto K."))
        );
    }
}
