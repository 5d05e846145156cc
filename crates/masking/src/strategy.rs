use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MaskingError;
use crate::mask;
use crate::policy::{DataType, Role};
use crate::value::{FieldValue, Money};

/// Characters kept by [`MaskingStrategy::TextSummary`].
pub const SUMMARY_MAX_CHARS: usize = 100;

/// A masking rule that can be applied to a [`FieldValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskingStrategy {
    NameStandard,
    NamePartial,
    EmailStandard,
    EmailPartial,
    PhoneStandard,
    PhonePartial,
    IbanStandard,
    Ip,
    Wallet,
    LicensePlate,
    Vin,
    TransactionId,
    TextSummary,
    AddressTiered,
    DateTiered,
    AmountTiered,
}

impl MaskingStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            MaskingStrategy::NameStandard => "name_standard",
            MaskingStrategy::NamePartial => "name_partial",
            MaskingStrategy::EmailStandard => "email_standard",
            MaskingStrategy::EmailPartial => "email_partial",
            MaskingStrategy::PhoneStandard => "phone_standard",
            MaskingStrategy::PhonePartial => "phone_partial",
            MaskingStrategy::IbanStandard => "iban_standard",
            MaskingStrategy::Ip => "ip",
            MaskingStrategy::Wallet => "wallet",
            MaskingStrategy::LicensePlate => "license_plate",
            MaskingStrategy::Vin => "vin",
            MaskingStrategy::TransactionId => "transaction_id",
            MaskingStrategy::TextSummary => "text_summary",
            MaskingStrategy::AddressTiered => "address_tiered",
            MaskingStrategy::DateTiered => "date_tiered",
            MaskingStrategy::AmountTiered => "amount_tiered",
        }
    }

    /// Strategy used for a data type when no override exists.
    pub fn default_for(data_type: DataType) -> Self {
        match data_type {
            DataType::Name => MaskingStrategy::NameStandard,
            DataType::Email => MaskingStrategy::EmailStandard,
            DataType::Phone => MaskingStrategy::PhoneStandard,
            DataType::Iban => MaskingStrategy::IbanStandard,
            DataType::Ip => MaskingStrategy::Ip,
            DataType::Wallet => MaskingStrategy::Wallet,
            DataType::LicensePlate => MaskingStrategy::LicensePlate,
            DataType::Vin => MaskingStrategy::Vin,
            DataType::Address => MaskingStrategy::AddressTiered,
            DataType::Date => MaskingStrategy::DateTiered,
            DataType::Amount => MaskingStrategy::AmountTiered,
            DataType::TransactionId => MaskingStrategy::TransactionId,
            DataType::Text => MaskingStrategy::TextSummary,
        }
    }

    /// Whether the output is a plain string derived from a string input.
    pub fn is_textual(self) -> bool {
        !matches!(
            self,
            MaskingStrategy::AddressTiered
                | MaskingStrategy::DateTiered
                | MaskingStrategy::AmountTiered
        )
    }

    /// Mask `value` for a caller holding `role`.
    ///
    /// Tiered strategies use the role to pick how much to reveal; the
    /// textual ones ignore it.
    pub fn apply(self, value: &FieldValue, role: Role) -> Result<FieldValue, MaskingError> {
        match self {
            MaskingStrategy::AddressTiered => match value {
                FieldValue::Address(address) => {
                    Ok(FieldValue::Address(mask::mask_address(address, role)))
                }
                other => Err(self.unsupported(other)),
            },
            MaskingStrategy::DateTiered => {
                let date = match value {
                    FieldValue::Date(date) => *date,
                    FieldValue::Text(raw) => parse_date(raw)?,
                    other => return Err(self.unsupported(other)),
                };
                Ok(FieldValue::Text(mask::mask_date(&date, role)))
            }
            MaskingStrategy::AmountTiered => {
                let money = match value {
                    FieldValue::Amount(money) => money.clone(),
                    FieldValue::Text(raw) => parse_amount(raw)?,
                    other => return Err(self.unsupported(other)),
                };
                mask::mask_amount(money.amount, money.currency.as_deref(), role)
                    .map(FieldValue::Text)
            }
            textual => match value {
                FieldValue::Text(raw) => Ok(FieldValue::Text(textual.mask_str(raw))),
                other => Err(textual.unsupported(other)),
            },
        }
    }

    /// Apply a textual strategy to a string. Tiered strategies return the
    /// input untouched; use [`MaskingStrategy::apply`] for those.
    pub fn mask_str(self, raw: &str) -> String {
        match self {
            MaskingStrategy::NameStandard => mask::mask_name(raw),
            MaskingStrategy::NamePartial => mask::mask_name_partial(raw),
            MaskingStrategy::EmailStandard => mask::mask_email(raw),
            MaskingStrategy::EmailPartial => mask::mask_email_partial(raw),
            MaskingStrategy::PhoneStandard => mask::mask_phone(raw),
            MaskingStrategy::PhonePartial => mask::mask_phone_partial(raw),
            MaskingStrategy::IbanStandard => mask::mask_iban(raw),
            MaskingStrategy::Ip => mask::mask_ip(raw),
            MaskingStrategy::Wallet => mask::mask_wallet(raw),
            MaskingStrategy::LicensePlate => mask::mask_license_plate(raw),
            MaskingStrategy::Vin => mask::mask_vin(raw),
            MaskingStrategy::TransactionId => mask::mask_transaction_id(raw),
            MaskingStrategy::TextSummary => mask::summarize_text(raw, SUMMARY_MAX_CHARS),
            MaskingStrategy::AddressTiered
            | MaskingStrategy::DateTiered
            | MaskingStrategy::AmountTiered => raw.to_string(),
        }
    }

    fn unsupported(self, value: &FieldValue) -> MaskingError {
        MaskingError::Unsupported {
            strategy: self,
            found: value.shape(),
        }
    }
}

impl fmt::Display for MaskingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn parse_date(raw: &str) -> Result<DateTime<Utc>, MaskingError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|date| date.with_timezone(&Utc))
        .map_err(|err| MaskingError::InvalidValue {
            data_type: DataType::Date,
            reason: err.to_string(),
        })
}

fn parse_amount(raw: &str) -> Result<Money, MaskingError> {
    raw.trim()
        .parse::<f64>()
        .map(|amount| Money {
            amount,
            currency: None,
        })
        .map_err(|err| MaskingError::InvalidValue {
            data_type: DataType::Amount,
            reason: err.to_string(),
        })
}

/// Strategy lookup keyed by `(data type, role)`.
///
/// Pairs without an override fall back to
/// [`MaskingStrategy::default_for`].
#[derive(Debug, Clone, Default)]
pub struct StrategyTable {
    overrides: HashMap<(DataType, Role), MaskingStrategy>,
}

impl StrategyTable {
    /// Table with no overrides: every pair uses the data type default.
    pub fn empty() -> Self {
        Self::default()
    }

    /// STANDARD and GOLD get partial names; GOLD also gets partial email
    /// and phone.
    pub fn standard() -> Self {
        Self::empty()
            .with_override(DataType::Name, Role::Standard, MaskingStrategy::NamePartial)
            .with_override(DataType::Name, Role::Gold, MaskingStrategy::NamePartial)
            .with_override(DataType::Email, Role::Gold, MaskingStrategy::EmailPartial)
            .with_override(DataType::Phone, Role::Gold, MaskingStrategy::PhonePartial)
    }

    pub fn with_override(
        mut self,
        data_type: DataType,
        role: Role,
        strategy: MaskingStrategy,
    ) -> Self {
        self.overrides.insert((data_type, role), strategy);
        self
    }

    pub fn lookup(&self, data_type: DataType, role: Role) -> MaskingStrategy {
        self.overrides
            .get(&(data_type, role))
            .copied()
            .unwrap_or_else(|| MaskingStrategy::default_for(data_type))
    }
}
