use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::strategy::MaskingStrategy;

/// Caller trust tier. Ordering follows the numeric level.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[default]
    Basic = 0,
    Standard = 1,
    Gold = 2,
    Admin = 3,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Basic, Role::Standard, Role::Gold, Role::Admin];

    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn from_level(level: u8) -> Option<Role> {
        Role::ALL.into_iter().find(|role| role.level() == level)
    }

    /// Map an upstream role label to a tier.
    ///
    /// `SUPER_ADMIN` is treated as `ADMIN`; anything unrecognised, including
    /// an anonymous caller, is `BASIC`.
    pub fn from_label(label: &str) -> Role {
        match label.trim().to_ascii_uppercase().as_str() {
            "STANDARD" => Role::Standard,
            "GOLD" => Role::Gold,
            "ADMIN" | "SUPER_ADMIN" => Role::Admin,
            _ => Role::Basic,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Basic => "BASIC",
            Role::Standard => "STANDARD",
            Role::Gold => "GOLD",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of personal data a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Name,
    Email,
    Phone,
    Iban,
    Ip,
    Wallet,
    LicensePlate,
    Vin,
    Address,
    Date,
    Amount,
    TransactionId,
    Text,
}

impl DataType {
    pub fn as_str(self) -> &'static str {
        match self {
            DataType::Name => "name",
            DataType::Email => "email",
            DataType::Phone => "phone",
            DataType::Iban => "iban",
            DataType::Ip => "ip",
            DataType::Wallet => "wallet",
            DataType::LicensePlate => "license_plate",
            DataType::Vin => "vin",
            DataType::Address => "address",
            DataType::Date => "date",
            DataType::Amount => "amount",
            DataType::TransactionId => "transaction_id",
            DataType::Text => "text",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Disclosure rule for one named field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldPolicy {
    pub data_type: DataType,
    /// Lowest role that receives the raw value.
    pub min_role: Role,
    /// Pinned strategy. `None` resolves through the strategy table by
    /// `(data_type, role)`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<MaskingStrategy>,
    /// Route masked output through the collision table.
    #[serde(default)]
    pub deterministic: bool,
}

impl FieldPolicy {
    pub fn new(data_type: DataType, min_role: Role) -> Self {
        Self {
            data_type,
            min_role,
            strategy: None,
            deterministic: false,
        }
    }

    pub fn with_strategy(mut self, strategy: MaskingStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn deterministic(mut self, enabled: bool) -> Self {
        self.deterministic = enabled;
        self
    }

    pub fn is_visible_to(&self, role: Role) -> bool {
        role >= self.min_role
    }
}

/// Field names used by the default policy.
pub mod fields {
    pub const REPORTER_NAME: &str = "reporter_name";
    pub const REPORTER_EMAIL: &str = "reporter_email";
    pub const REPORTER_PHONE: &str = "reporter_phone";
    pub const REPORTER_IP: &str = "reporter_ip";
    pub const REPORTER_ADDRESS: &str = "reporter_address";
    pub const SCAMMER_NAME: &str = "scammer_name";
    pub const SCAMMER_EMAIL: &str = "scammer_email";
    pub const SCAMMER_PHONE: &str = "scammer_phone";
    pub const SCAMMER_IP: &str = "scammer_ip";
    pub const SCAMMER_ADDRESS: &str = "scammer_address";
    pub const SCAMMER_WALLET: &str = "scammer_wallet";
    pub const SCAMMER_PLATE: &str = "scammer_plate";
    pub const SCAMMER_VIN: &str = "scammer_vin";
    pub const IBAN: &str = "iban";
    pub const AMOUNT_LOST: &str = "amount_lost";
    pub const TRANSACTION_ID: &str = "transaction_id";
    pub const DESCRIPTION: &str = "description";
    pub const SUBMISSION_DATE: &str = "submission_date";
}

/// Field name → disclosure rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaskingPolicy {
    fields: BTreeMap<String, FieldPolicy>,
}

impl MaskingPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default policy for fraud reports.
    ///
    /// Reporter identity is reserved for ADMIN and always fully masked below
    /// it. Scammer identifiers and financial details open up at GOLD, with
    /// partial views for lower tiers coming from the strategy table.
    pub fn standard() -> Self {
        use self::fields::*;

        Self::new()
            .with_field(
                REPORTER_NAME,
                FieldPolicy::new(DataType::Name, Role::Admin)
                    .with_strategy(MaskingStrategy::NameStandard)
                    .deterministic(true),
            )
            .with_field(
                REPORTER_EMAIL,
                FieldPolicy::new(DataType::Email, Role::Admin)
                    .with_strategy(MaskingStrategy::EmailStandard)
                    .deterministic(true),
            )
            .with_field(
                REPORTER_PHONE,
                FieldPolicy::new(DataType::Phone, Role::Admin)
                    .with_strategy(MaskingStrategy::PhoneStandard)
                    .deterministic(true),
            )
            .with_field(
                REPORTER_IP,
                FieldPolicy::new(DataType::Ip, Role::Admin).deterministic(true),
            )
            .with_field(REPORTER_ADDRESS, FieldPolicy::new(DataType::Address, Role::Gold))
            .with_field(
                SCAMMER_NAME,
                FieldPolicy::new(DataType::Name, Role::Gold).deterministic(true),
            )
            .with_field(
                SCAMMER_EMAIL,
                FieldPolicy::new(DataType::Email, Role::Gold).deterministic(true),
            )
            .with_field(
                SCAMMER_PHONE,
                FieldPolicy::new(DataType::Phone, Role::Gold).deterministic(true),
            )
            .with_field(
                SCAMMER_IP,
                FieldPolicy::new(DataType::Ip, Role::Gold).deterministic(true),
            )
            .with_field(SCAMMER_ADDRESS, FieldPolicy::new(DataType::Address, Role::Gold))
            .with_field(SCAMMER_WALLET, FieldPolicy::new(DataType::Wallet, Role::Gold))
            .with_field(
                SCAMMER_PLATE,
                FieldPolicy::new(DataType::LicensePlate, Role::Gold).deterministic(true),
            )
            .with_field(
                SCAMMER_VIN,
                FieldPolicy::new(DataType::Vin, Role::Gold).deterministic(true),
            )
            .with_field(
                IBAN,
                FieldPolicy::new(DataType::Iban, Role::Gold).deterministic(true),
            )
            .with_field(AMOUNT_LOST, FieldPolicy::new(DataType::Amount, Role::Gold))
            .with_field(
                TRANSACTION_ID,
                FieldPolicy::new(DataType::TransactionId, Role::Gold),
            )
            .with_field(DESCRIPTION, FieldPolicy::new(DataType::Text, Role::Standard))
            .with_field(SUBMISSION_DATE, FieldPolicy::new(DataType::Date, Role::Standard))
    }

    pub fn with_field(mut self, name: impl Into<String>, policy: FieldPolicy) -> Self {
        self.insert(name, policy);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, policy: FieldPolicy) {
        self.fields.insert(name.into(), policy);
    }

    pub fn get(&self, name: &str) -> Option<&FieldPolicy> {
        self.fields.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldPolicy)> {
        self.fields.iter().map(|(name, policy)| (name.as_str(), policy))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
