use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use classify::{IdentifierKind, NormalizedIdentifier};
use serde::{Deserialize, Serialize};

use crate::model::ReportRecord;

/// Indexed column holding a normalized identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExactColumn {
    Email,
    Phone,
    Iban,
    Wallet,
    Domain,
}

impl ExactColumn {
    /// Column for an identifier kind. Names have no exact column.
    pub fn for_kind(kind: IdentifierKind) -> Option<Self> {
        match kind {
            IdentifierKind::Email => Some(ExactColumn::Email),
            IdentifierKind::Phone => Some(ExactColumn::Phone),
            IdentifierKind::Iban => Some(ExactColumn::Iban),
            IdentifierKind::Wallet => Some(ExactColumn::Wallet),
            IdentifierKind::Domain => Some(ExactColumn::Domain),
            IdentifierKind::Name => None,
        }
    }

    pub fn kind(self) -> IdentifierKind {
        match self {
            ExactColumn::Email => IdentifierKind::Email,
            ExactColumn::Phone => IdentifierKind::Phone,
            ExactColumn::Iban => IdentifierKind::Iban,
            ExactColumn::Wallet => IdentifierKind::Wallet,
            ExactColumn::Domain => IdentifierKind::Domain,
        }
    }

    pub fn column_name(self) -> &'static str {
        match self {
            ExactColumn::Email => "email_normalized",
            ExactColumn::Phone => "phone_normalized",
            ExactColumn::Iban => "iban_normalized",
            ExactColumn::Wallet => "wallet_normalized",
            ExactColumn::Domain => "domain_name",
        }
    }
}

/// `column = value` against a normalized column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExactPredicate {
    pub column: ExactColumn,
    pub value: String,
}

impl ExactPredicate {
    /// Predicates for every identifier with an indexed column.
    pub fn from_identifiers<'a, I>(identifiers: I) -> Vec<ExactPredicate>
    where
        I: IntoIterator<Item = &'a NormalizedIdentifier>,
    {
        identifiers
            .into_iter()
            .filter(|id| !id.canonical.is_empty())
            .filter_map(|id| {
                ExactColumn::for_kind(id.kind).map(|column| ExactPredicate {
                    column,
                    value: id.canonical.clone(),
                })
            })
            .collect()
    }
}

/// Non-text filters shared by every search mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportFilters {
    pub country: Option<String>,
    pub fraud_type: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub amount_min: Option<f64>,
    pub amount_max: Option<f64>,
}

impl ReportFilters {
    /// Whether `record` passes every set filter. Status is not checked here.
    pub fn matches(&self, record: &ReportRecord) -> bool {
        if let Some(country) = &self.country {
            if record.country.as_deref() != Some(country.as_str()) {
                return false;
            }
        }
        if let Some(fraud_type) = &self.fraud_type {
            if &record.fraud_type != fraud_type {
                return false;
            }
        }
        if self.date_from.is_some_and(|from| record.created_at < from) {
            return false;
        }
        if self.date_to.is_some_and(|to| record.created_at > to) {
            return false;
        }
        if self.amount_min.is_some() || self.amount_max.is_some() {
            let Some(loss) = record.financial_loss else {
                return false;
            };
            if self.amount_min.is_some_and(|min| loss < min) {
                return false;
            }
            if self.amount_max.is_some_and(|max| loss > max) {
                return false;
            }
        }
        true
    }

    pub fn is_empty(&self) -> bool {
        self == &ReportFilters::default()
    }
}

/// Text predicate of a store query.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportQuery {
    /// OR of equality predicates on normalized columns.
    Exact(Vec<ExactPredicate>),
    /// Case-insensitive substring of full name, nickname or username.
    Contains(String),
    /// Cosine similarity to `embedding` strictly above `min_similarity`.
    Nearest {
        embedding: Vec<f32>,
        min_similarity: f32,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    CreatedAt,
    FinancialLoss,
    /// Similarity for nearest-neighbour queries; creation time otherwise.
    Relevance,
}

impl SortField {
    pub fn as_str(self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::FinancialLoss => "financial_loss",
            SortField::Relevance => "relevance",
        }
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created_at" => Ok(SortField::CreatedAt),
            "financial_loss" => Ok(SortField::FinancialLoss),
            "relevance" => Ok(SortField::Relevance),
            other => Err(format!("unknown sort field '{other}'")),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sort {
    pub field: SortField,
    pub order: SortOrder,
}

impl Sort {
    pub fn new(field: SortField, order: SortOrder) -> Self {
        Self { field, order }
    }
}

pub const DEFAULT_LIMIT: u32 = 20;
pub const MAX_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}

impl Page {
    pub fn new(limit: u32, offset: u32) -> Self {
        Self { limit, offset }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(DEFAULT_LIMIT, 0)
    }
}

/// Dimension of a facet group-by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FacetDimension {
    Country,
    FraudType,
}

impl FacetDimension {
    pub fn as_str(self) -> &'static str {
        match self {
            FacetDimension::Country => "country",
            FacetDimension::FraudType => "fraud_type",
        }
    }
}

/// A fetched record and, for nearest-neighbour queries, its similarity.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    pub record: ReportRecord,
    pub similarity: Option<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record() -> ReportRecord {
        ReportRecord {
            country: Some("SK".into()),
            financial_loss: Some(500.0),
            ..ReportRecord::approved("r", "PHISHING", Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap())
        }
    }

    #[test]
    fn predicates_skip_names() {
        let ids = classify::classify_as(
            "John",
            &[IdentifierKind::Name, IdentifierKind::Email],
        );
        let predicates = ExactPredicate::from_identifiers(ids.iter());
        assert_eq!(predicates.len(), 1);
        assert_eq!(predicates[0].column, ExactColumn::Email);
        assert_eq!(predicates[0].value, "john");
    }

    #[test]
    fn empty_filters_match_everything() {
        assert!(ReportFilters::default().matches(&record()));
        assert!(ReportFilters::default().is_empty());
    }

    #[test]
    fn filters_combine() {
        let filters = ReportFilters {
            country: Some("SK".into()),
            fraud_type: Some("PHISHING".into()),
            date_from: Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()),
            date_to: Some(Utc.with_ymd_and_hms(2025, 12, 31, 0, 0, 0).unwrap()),
            amount_min: Some(100.0),
            amount_max: Some(1000.0),
        };
        assert!(filters.matches(&record()));

        let wrong_country = ReportFilters {
            country: Some("CZ".into()),
            ..ReportFilters::default()
        };
        assert!(!wrong_country.matches(&record()));
    }

    #[test]
    fn amount_filter_excludes_unknown_loss() {
        let filters = ReportFilters {
            amount_min: Some(0.0),
            ..ReportFilters::default()
        };
        let mut no_loss = record();
        no_loss.financial_loss = None;
        assert!(!filters.matches(&no_loss));
    }

    #[test]
    fn sort_parsing() {
        assert_eq!("financial_loss".parse::<SortField>(), Ok(SortField::FinancialLoss));
        assert!("score".parse::<SortField>().is_err());
        assert_eq!("asc".parse::<SortOrder>(), Ok(SortOrder::Asc));
        assert_eq!(Sort::default(), Sort::new(SortField::CreatedAt, SortOrder::Desc));
    }
}
