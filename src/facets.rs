use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use store::{FacetDimension, ReportFilters, ReportStore, StoreError};

/// Count of approved reports per value of one dimension.
pub type FacetCounts = BTreeMap<String, u64>;

/// Distribution of the matching universe by country and fraud type.
///
/// Both maps are absent when the search found nothing, which serializes as
/// `{}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facets {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<FacetCounts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fraud_type: Option<FacetCounts>,
}

impl Facets {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.country.is_none() && self.fraud_type.is_none()
    }
}

/// Runs the country and fraud-type group-bys against the report store.
///
/// Counts are taken over approved reports matching the non-text filters
/// only; the query text does not narrow them.
#[derive(Clone)]
pub struct FacetAggregator {
    store: Arc<dyn ReportStore>,
}

impl FacetAggregator {
    pub fn new(store: Arc<dyn ReportStore>) -> Self {
        Self { store }
    }

    /// Both group-bys, issued concurrently.
    pub async fn aggregate(&self, filters: &ReportFilters) -> Result<Facets, StoreError> {
        let (countries, fraud_types) = tokio::try_join!(
            self.store.facet_counts(FacetDimension::Country, filters),
            self.store.facet_counts(FacetDimension::FraudType, filters),
        )?;

        let mut country = FacetCounts::new();
        for (value, count) in countries {
            // reports without a country are not bucketed
            if let Some(value) = value {
                *country.entry(value).or_default() += count;
            }
        }

        let mut fraud_type = FacetCounts::new();
        for (value, count) in fraud_types {
            if let Some(value) = value {
                *fraud_type.entry(value.to_lowercase()).or_default() += count;
            }
        }

        tracing::debug!(
            countries = country.len(),
            fraud_types = fraud_type.len(),
            "facets aggregated"
        );
        Ok(Facets {
            country: Some(country),
            fraud_type: Some(fraud_type),
        })
    }
}
