use std::collections::BTreeMap;

use masking::{fields, DisclosureEngine, FieldValue, Role};
use matcher::{ResultPerpetrator, SearchResult};

/// Identity of the caller a response is disclosed to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caller {
    pub role: Role,
    pub user_id: Option<String>,
}

impl Caller {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn new(role: Role, user_id: Option<String>) -> Self {
        Self { role, user_id }
    }
}

/// Masks the personal fields of search results for a caller's role.
#[derive(Debug, Clone, Default)]
pub struct ResultDiscloser {
    engine: DisclosureEngine,
}

impl ResultDiscloser {
    pub fn new(engine: DisclosureEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &DisclosureEngine {
        &self.engine
    }

    /// Mask one result in place and emit an audit record when anything was
    /// masked.
    pub fn disclose(&self, result: &mut SearchResult, caller: &Caller) {
        let raw = perpetrator_fields(&result.perpetrator);
        let disclosure = self.engine.disclose(&result.id, &raw, caller.role);

        let mut disclosed = disclosure.fields;
        result.perpetrator = ResultPerpetrator {
            name: take_text(&mut disclosed, fields::SCAMMER_NAME),
            phone: take_text(&mut disclosed, fields::SCAMMER_PHONE),
            email: take_text(&mut disclosed, fields::SCAMMER_EMAIL),
        };

        if let Some(highlights) = result.highlights.as_mut() {
            for values in highlights.values_mut() {
                *values = values
                    .iter()
                    .filter_map(|value| {
                        self.engine
                            .mask_field(
                                fields::SCAMMER_NAME,
                                Some(&FieldValue::text(value.as_str())),
                                caller.role,
                            )
                            .and_then(FieldValue::into_text)
                    })
                    .collect();
            }
        }

        if !disclosure.audit.fields_masked.is_empty() {
            disclosure.audit.with_user(caller.user_id.clone()).emit();
        }
    }

    pub fn disclose_all(&self, results: &mut [SearchResult], caller: &Caller) {
        for result in results {
            self.disclose(result, caller);
        }
    }
}

fn perpetrator_fields(p: &ResultPerpetrator) -> BTreeMap<String, FieldValue> {
    [
        (fields::SCAMMER_NAME, &p.name),
        (fields::SCAMMER_PHONE, &p.phone),
        (fields::SCAMMER_EMAIL, &p.email),
    ]
    .into_iter()
    .filter_map(|(name, value)| {
        value
            .as_deref()
            .map(|v| (name.to_string(), FieldValue::text(v)))
    })
    .collect()
}

fn take_text(fields: &mut BTreeMap<String, FieldValue>, name: &str) -> Option<String> {
    fields.remove(name).and_then(FieldValue::into_text)
}
