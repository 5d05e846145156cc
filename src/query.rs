//! Validation of raw search parameters into a [`SearchQuery`].
//!
//! Every parameter arrives as an optional string so that a bad value is
//! reported next to the others instead of failing deserialization as a
//! whole.

use chrono::{DateTime, NaiveDate, Utc};
use classify::{classify_as, parse_fields, IdentifierKind};
use matcher::{MatchRequest, SearchMode};
use serde::Deserialize;
use store::{Page, ReportFilters, Sort, SortField, SortOrder};

use crate::config::SearchYamlConfig;
use crate::error::ValidationErrors;

pub const MIN_QUERY_CHARS: usize = 2;
pub const MAX_QUERY_CHARS: usize = 500;

/// Query string of `GET /search`, as received.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub mode: Option<String>,
    pub fields: Option<String>,
    pub country: Option<String>,
    pub fraud_type: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub amount_min: Option<String>,
    pub amount_max: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

impl SearchParams {
    pub fn query(q: impl Into<String>) -> Self {
        Self {
            q: Some(q.into()),
            ..Self::default()
        }
    }
}

/// A validated search request.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    /// Trimmed query text, 2 to 500 characters.
    pub text: String,
    pub mode: SearchMode,
    /// Identifier kinds to search; empty means detect from the text.
    pub fields: Vec<IdentifierKind>,
    pub filters: ReportFilters,
    pub sort: Sort,
    pub page: Page,
}

impl SearchQuery {
    /// Query for `text` with every other parameter at its default.
    pub fn new(text: impl Into<String>) -> Result<Self, ValidationErrors> {
        Self::from_params(&SearchParams::query(text), &SearchYamlConfig::default())
    }

    /// Validate `params`, collecting every failure before returning.
    pub fn from_params(
        params: &SearchParams,
        limits: &SearchYamlConfig,
    ) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let text = match params.q.as_deref().map(str::trim) {
            None | Some("") => {
                errors.add("q", "Required");
                String::new()
            }
            Some(q) => {
                let chars = q.chars().count();
                if chars < MIN_QUERY_CHARS {
                    errors.add(
                        "q",
                        format!("String must contain at least {MIN_QUERY_CHARS} character(s)"),
                    );
                } else if chars > MAX_QUERY_CHARS {
                    errors.add(
                        "q",
                        format!("String must contain at most {MAX_QUERY_CHARS} character(s)"),
                    );
                }
                q.to_string()
            }
        };

        let mode = match non_blank(&params.mode) {
            None => SearchMode::default(),
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                errors.add(
                    "mode",
                    format!("Invalid enum value. Expected 'auto' | 'exact' | 'fuzzy' | 'semantic', received '{raw}'"),
                );
                SearchMode::default()
            }),
        };

        let fields = match non_blank(&params.fields) {
            None => Vec::new(),
            Some(raw) => parse_fields(raw).unwrap_or_else(|err| {
                errors.add("fields", err.to_string());
                Vec::new()
            }),
        };

        let country = non_blank(&params.country).and_then(|raw| {
            if raw.chars().count() > 2 {
                errors.add("country", "String must contain at most 2 character(s)");
                None
            } else {
                Some(raw.to_uppercase())
            }
        });
        let fraud_type = non_blank(&params.fraud_type).map(str::to_uppercase);

        let date_from = parse_date_param(&params.date_from, "date_from", &mut errors);
        let date_to = parse_date_param(&params.date_to, "date_to", &mut errors);
        if let (Some(from), Some(to)) = (date_from, date_to) {
            if from > to {
                errors.add("date_to", "must not be before date_from");
            }
        }

        let amount_min = parse_amount_param(&params.amount_min, "amount_min", &mut errors);
        let amount_max = parse_amount_param(&params.amount_max, "amount_max", &mut errors);
        if let (Some(min), Some(max)) = (amount_min, amount_max) {
            if min > max {
                errors.add("amount_max", "must not be less than amount_min");
            }
        }

        let limit = match non_blank(&params.limit) {
            None => limits.default_limit,
            Some(raw) => match raw.parse::<i64>() {
                Ok(n) if n < 1 => {
                    errors.add("limit", "Number must be greater than or equal to 1");
                    limits.default_limit
                }
                Ok(n) if n > i64::from(limits.max_limit) => {
                    errors.add(
                        "limit",
                        format!("Number must be less than or equal to {}", limits.max_limit),
                    );
                    limits.default_limit
                }
                Ok(n) => n as u32,
                Err(_) => {
                    errors.add("limit", "Expected integer");
                    limits.default_limit
                }
            },
        };

        let offset = match non_blank(&params.offset) {
            None => 0,
            Some(raw) => match raw.parse::<i64>() {
                Ok(n) if n < 0 => {
                    errors.add("offset", "Number must be greater than or equal to 0");
                    0
                }
                Ok(n) => u32::try_from(n).unwrap_or_else(|_| {
                    errors.add("offset", "Number is too large");
                    0
                }),
                Err(_) => {
                    errors.add("offset", "Expected integer");
                    0
                }
            },
        };

        let field = match non_blank(&params.sort) {
            None => SortField::default(),
            Some(raw) => raw.parse().unwrap_or_else(|msg: String| {
                errors.add("sort", msg);
                SortField::default()
            }),
        };
        let order = match non_blank(&params.order) {
            None => SortOrder::default(),
            Some(raw) => raw.parse().unwrap_or_else(|msg: String| {
                errors.add("order", msg);
                SortOrder::default()
            }),
        };

        errors.into_result()?;
        Ok(Self {
            text,
            mode,
            fields,
            filters: ReportFilters {
                country,
                fraud_type,
                date_from,
                date_to,
                amount_min,
                amount_max,
            },
            sort: Sort::new(field, order),
            page: Page::new(limit, offset),
        })
    }

    /// Classify the text and build the request the matchers consume.
    pub fn match_request(&self) -> MatchRequest {
        MatchRequest::new(self.text.as_str())
            .with_identifiers(classify_as(&self.text, &self.fields))
            .with_filters(self.filters.clone())
            .with_sort(self.sort)
            .with_page(self.page)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// RFC 3339 timestamp, or a bare `YYYY-MM-DD` read as midnight UTC.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn parse_date_param(
    value: &Option<String>,
    field: &str,
    errors: &mut ValidationErrors,
) -> Option<DateTime<Utc>> {
    let raw = non_blank(value)?;
    let parsed = parse_date(raw);
    if parsed.is_none() {
        errors.add(field, "Invalid date");
    }
    parsed
}

fn parse_amount_param(
    value: &Option<String>,
    field: &str,
    errors: &mut ValidationErrors,
) -> Option<f64> {
    let raw = non_blank(value)?;
    match raw.parse::<f64>() {
        Ok(n) if n.is_finite() && n >= 0.0 => Some(n),
        Ok(_) => {
            errors.add(field, "Number must be a finite value greater than or equal to 0");
            None
        }
        Err(_) => {
            errors.add(field, "Expected number");
            None
        }
    }
}
