use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use store::{ReportQuery, ReportRecord, ReportStore};

use crate::types::{Highlights, MatchError, MatchOutcome, MatchRequest, MatchSource, SearchResult};
use crate::Matcher;

/// Character trigrams of `text`, lowercased and padded with one space on
/// each side.
pub fn trigrams(text: &str) -> HashSet<String> {
    let padded: Vec<char> = format!(" {} ", text.to_lowercase()).chars().collect();
    if padded.len() < 3 {
        return HashSet::new();
    }
    padded.windows(3).map(|w| w.iter().collect()).collect()
}

/// Jaccard similarity of two trigram sets. Two empty sets are identical.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f32 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f32 / union as f32
}

pub fn trigram_similarity(a: &str, b: &str) -> f32 {
    jaccard(&trigrams(a), &trigrams(b))
}

fn round2(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

/// Best trigram similarity of `query` against `fields`, plus `boost` when
/// the query occurs literally in one of them, capped at 1 and rounded to two
/// decimals.
///
/// `query` is expected lowercased and trimmed.
pub fn fuzzy_score<'a, I>(query: &str, fields: I, boost: f32) -> f32
where
    I: IntoIterator<Item = &'a str>,
{
    let query_grams = trigrams(query);
    let mut best = 0.0f32;
    let mut literal = false;
    for field in fields {
        let lowered = field.to_lowercase();
        best = best.max(jaccard(&query_grams, &trigrams(&lowered)));
        if !query.is_empty() && lowered.contains(query) {
            literal = true;
        }
    }
    let boosted = if literal { best + boost } else { best };
    round2(boosted.min(1.0))
}

fn name_fields(record: &ReportRecord) -> impl Iterator<Item = &str> {
    let p = &record.perpetrator;
    [&p.full_name, &p.nickname, &p.username]
        .into_iter()
        .filter_map(|f| f.as_deref())
}

/// Name search: store-side substring match, in-process trigram re-scoring
/// of the fetched page.
#[derive(Clone)]
pub struct FuzzyMatcher {
    store: Arc<dyn ReportStore>,
    substring_boost: f32,
}

impl FuzzyMatcher {
    pub fn new(store: Arc<dyn ReportStore>, substring_boost: f32) -> Self {
        Self {
            store,
            substring_boost,
        }
    }
}

#[async_trait]
impl Matcher for FuzzyMatcher {
    fn source(&self) -> MatchSource {
        MatchSource::Fuzzy
    }

    async fn search(&self, req: &MatchRequest) -> Result<MatchOutcome, MatchError> {
        let needle = req.query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(MatchOutcome::empty(MatchSource::Fuzzy));
        }
        let query = ReportQuery::Contains(needle.clone());
        let (total, rows) = tokio::try_join!(
            self.store.count(&query, &req.filters),
            self.store.find(&query, &req.filters, req.sort, req.page),
        )?;

        let mut results: Vec<SearchResult> = rows
            .into_iter()
            .map(|row| {
                let score = fuzzy_score(&needle, name_fields(&row.record), self.substring_boost);
                let mut highlights = Highlights::new();
                highlights.insert(
                    "name".to_string(),
                    row.record.perpetrator.full_name.iter().cloned().collect(),
                );
                let mut result = SearchResult::from_record(row.record, score, MatchSource::Fuzzy);
                result.highlights = Some(highlights);
                result
            })
            .collect();
        // stable, so equal scores keep the store order
        results.sort_by(|a, b| b.score.total_cmp(&a.score));

        tracing::debug!(total, page = results.len(), "fuzzy search complete");
        Ok(MatchOutcome {
            results,
            total,
            source: MatchSource::Fuzzy,
        })
    }
}
