use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Moderation state. Only `Approved` reports are ever searchable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ReportStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportStatus::Pending => "PENDING",
            ReportStatus::Approved => "APPROVED",
            ReportStatus::Rejected => "REJECTED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PENDING" => Some(ReportStatus::Pending),
            "APPROVED" => Some(ReportStatus::Approved),
            "REJECTED" => Some(ReportStatus::Rejected),
            _ => None,
        }
    }
}

/// Primary perpetrator named in a report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Perpetrator {
    pub full_name: Option<String>,
    pub nickname: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// A fraud report as the search path sees it.
///
/// Identifier fields hold the values as submitted; backends keep the
/// normalized forms in their own indexed columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    /// Public identifier.
    pub id: String,
    pub status: ReportStatus,
    /// Upper-case fraud category such as `PHISHING`.
    pub fraud_type: String,
    /// ISO 3166-1 alpha-2 country code.
    pub country: Option<String>,
    pub incident_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub financial_loss: Option<f64>,
    pub currency: Option<String>,
    pub perpetrator: Perpetrator,
    pub iban: Option<String>,
    pub wallet: Option<String>,
    pub domain: Option<String>,
    /// Report embedding, when one was computed at ingestion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl ReportRecord {
    /// Approved report with no identifiers; fill in the rest with struct
    /// update syntax.
    pub fn approved(id: impl Into<String>, fraud_type: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            status: ReportStatus::Approved,
            fraud_type: fraud_type.into(),
            country: None,
            incident_date: None,
            created_at,
            financial_loss: None,
            currency: None,
            perpetrator: Perpetrator::default(),
            iban: None,
            wallet: None,
            domain: None,
            embedding: None,
        }
    }

    pub fn is_approved(&self) -> bool {
        self.status == ReportStatus::Approved
    }
}
