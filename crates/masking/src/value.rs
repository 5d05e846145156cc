use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Postal address as stored on a report. Every part is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl Address {
    pub fn is_empty(&self) -> bool {
        self.street.is_none() && self.city.is_none() && self.postal_code.is_none() && self.country.is_none()
    }
}

/// Monetary amount with an optional ISO currency code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Money {
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

/// A field value entering or leaving the disclosure engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Date(DateTime<Utc>),
    Amount(Money),
    Address(Address),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    /// Empty text and empty addresses count as missing.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Address(a) => a.is_empty(),
            FieldValue::Date(_) | FieldValue::Amount(_) => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn shape(&self) -> &'static str {
        match self {
            FieldValue::Text(_) => "text",
            FieldValue::Date(_) => "date",
            FieldValue::Amount(_) => "amount",
            FieldValue::Address(_) => "address",
        }
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<Address> for FieldValue {
    fn from(value: Address) -> Self {
        FieldValue::Address(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Date(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_detection() {
        assert!(FieldValue::text("  ").is_empty());
        assert!(FieldValue::Address(Address::default()).is_empty());
        assert!(!FieldValue::text("x").is_empty());
        assert!(!FieldValue::Amount(Money { amount: 0.0, currency: None }).is_empty());
    }

    #[test]
    fn address_serializes_camel_case_without_nulls() {
        let address = Address {
            city: Some("Bratislava".into()),
            postal_code: Some("841**".into()),
            ..Address::default()
        };
        let json = serde_json::to_value(FieldValue::Address(address)).unwrap();
        assert_eq!(json, serde_json::json!({"city": "Bratislava", "postalCode": "841**"}));
    }

    #[test]
    fn text_serializes_as_plain_string() {
        let json = serde_json::to_value(FieldValue::text("Joxn")).unwrap();
        assert_eq!(json, serde_json::json!("Joxn"));
    }
}
