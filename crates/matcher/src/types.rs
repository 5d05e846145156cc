use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use classify::Classification;
use serde::{Deserialize, Serialize};
use store::{Page, ReportFilters, ReportRecord, Sort, StoreError};
use thiserror::Error;

/// Requested search strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Exact first, fuzzy only when exact finds nothing.
    #[default]
    Auto,
    Exact,
    Fuzzy,
    /// Embedding similarity, falling back to fuzzy.
    Semantic,
}

impl SearchMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchMode::Auto => "auto",
            SearchMode::Exact => "exact",
            SearchMode::Fuzzy => "fuzzy",
            SearchMode::Semantic => "semantic",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(SearchMode::Auto),
            "exact" => Ok(SearchMode::Exact),
            "fuzzy" => Ok(SearchMode::Fuzzy),
            "semantic" => Ok(SearchMode::Semantic),
            other => Err(format!("unknown search mode '{other}'")),
        }
    }
}

/// Matcher that produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchSource {
    Exact,
    Fuzzy,
    Semantic,
}

impl MatchSource {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchSource::Exact => "exact",
            MatchSource::Fuzzy => "fuzzy",
            MatchSource::Semantic => "semantic",
        }
    }
}

impl fmt::Display for MatchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Perpetrator fields carried by a result, before disclosure masking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultPerpetrator {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

pub type Highlights = BTreeMap<String, Vec<String>>;

/// One matched report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    /// Always within `[0, 1]`.
    pub score: f32,
    pub source: MatchSource,
    pub perpetrator: ResultPerpetrator,
    /// Lower-case fraud category.
    pub fraud_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// `YYYY-MM-DD`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incident_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlights: Option<Highlights>,
}

impl SearchResult {
    /// Project a stored report into a result. Fuzzy results carry only the
    /// perpetrator name.
    pub fn from_record(record: ReportRecord, score: f32, source: MatchSource) -> Self {
        let p = record.perpetrator;
        let perpetrator = match source {
            MatchSource::Fuzzy => ResultPerpetrator {
                name: p.full_name,
                ..ResultPerpetrator::default()
            },
            MatchSource::Exact | MatchSource::Semantic => ResultPerpetrator {
                name: p.full_name,
                phone: p.phone,
                email: p.email,
            },
        };
        Self {
            id: record.id,
            score: score.clamp(0.0, 1.0),
            source,
            perpetrator,
            fraud_type: record.fraud_type.to_lowercase(),
            country: record.country,
            incident_date: record
                .incident_date
                .map(|d| d.format("%Y-%m-%d").to_string()),
            highlights: None,
        }
    }
}

/// `(results, total)` pair every matcher returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub results: Vec<SearchResult>,
    /// Count of every matching report, not only this page.
    pub total: u64,
    /// Matcher that actually answered, after any fallback.
    pub source: MatchSource,
}

impl MatchOutcome {
    pub fn empty(source: MatchSource) -> Self {
        Self {
            results: Vec::new(),
            total: 0,
            source,
        }
    }
}

/// Inputs shared by every matcher.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRequest {
    /// Trimmed raw query text.
    pub query: String,
    pub identifiers: Classification,
    pub filters: ReportFilters,
    pub sort: Sort,
    pub page: Page,
}

impl MatchRequest {
    /// Request for `query` with identifiers detected automatically.
    pub fn new(query: impl Into<String>) -> Self {
        let query = query.into().trim().to_string();
        Self {
            identifiers: classify::classify(&query),
            query,
            filters: ReportFilters::default(),
            sort: Sort::default(),
            page: Page::default(),
        }
    }

    pub fn with_identifiers(mut self, identifiers: Classification) -> Self {
        self.identifiers = identifiers;
        self
    }

    pub fn with_filters(mut self, filters: ReportFilters) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_page(mut self, page: Page) -> Self {
        self.page = page;
        self
    }
}

/// Scoring knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchConfig {
    /// Added to a fuzzy score when the query is a literal substring of a
    /// name field.
    #[serde(default = "MatchConfig::default_substring_boost")]
    pub fuzzy_substring_boost: f32,
    /// Semantic hits must be strictly above this similarity.
    #[serde(default = "MatchConfig::default_min_similarity")]
    pub semantic_min_similarity: f32,
}

impl MatchConfig {
    pub(crate) fn default_substring_boost() -> f32 {
        0.2
    }

    pub(crate) fn default_min_similarity() -> f32 {
        0.3
    }

    pub fn validate(&self) -> Result<(), MatchError> {
        if !(0.0..=1.0).contains(&self.fuzzy_substring_boost) {
            return Err(MatchError::InvalidConfig(
                "fuzzy_substring_boost must be between 0.0 and 1.0".into(),
            ));
        }
        if !(-1.0..1.0).contains(&self.semantic_min_similarity) {
            return Err(MatchError::InvalidConfig(
                "semantic_min_similarity must be in [-1.0, 1.0)".into(),
            ));
        }
        Ok(())
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            fuzzy_substring_boost: Self::default_substring_boost(),
            semantic_min_similarity: Self::default_min_similarity(),
        }
    }
}

/// Errors produced by the matching layer.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("invalid match config: {0}")]
    InvalidConfig(String),
    /// Store read failed and no fallback was left.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
