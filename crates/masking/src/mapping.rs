use std::collections::HashMap;

use parking_lot::Mutex;
use serde::Serialize;

/// Length of the hash prefix appended to a colliding masked value.
const SUFFIX_LEN: usize = 4;

#[derive(Debug, Default)]
struct Tables {
    by_hash: HashMap<String, String>,
    by_masked: HashMap<String, String>,
    collisions: u64,
    overflowed: u64,
}

/// Collision table for deterministic masking.
///
/// Entries are keyed by the salted hash of the original value, so the table
/// never holds raw PII. When a second, distinct original masks to a string
/// that is already taken, it is handed `masked#<hash prefix>` instead.
///
/// One table lives as long as its pipeline and is shared by every request.
/// [`MappingTable::new`] never evicts; [`MappingTable::bounded`] stops
/// recording once full. Values seen after that still get a collision suffix
/// against recorded outputs, but are not remembered themselves.
#[derive(Debug, Default)]
pub struct MappingTable {
    inner: Mutex<Tables>,
    max_entries: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MappingStats {
    pub total_entries: usize,
    pub unique_masked: usize,
    pub collisions: u64,
    /// Registrations not recorded because the table was full.
    pub overflowed: u64,
}

impl MappingTable {
    /// Unbounded table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Table that records at most `max_entries` originals.
    pub fn bounded(max_entries: usize) -> Self {
        Self {
            inner: Mutex::default(),
            max_entries: Some(max_entries),
        }
    }

    pub fn max_entries(&self) -> Option<usize> {
        self.max_entries
    }

    /// Record `masked` for `original_hash` and return the value to emit.
    ///
    /// Re-registering a known hash returns its first recorded output.
    pub fn register(&self, original_hash: &str, masked: &str) -> String {
        let mut tables = self.inner.lock();
        if let Some(existing) = tables.by_hash.get(original_hash) {
            return existing.clone();
        }

        let output = match tables.by_masked.get(masked) {
            Some(owner) if owner != original_hash => {
                tables.collisions += 1;
                let prefix = original_hash.get(..SUFFIX_LEN).unwrap_or(original_hash);
                format!("{masked}#{prefix}")
            }
            _ => masked.to_string(),
        };

        if self.max_entries.is_some_and(|max| tables.by_hash.len() >= max) {
            tables.overflowed += 1;
            if tables.overflowed == 1 {
                tracing::warn!(
                    max_entries = tables.by_hash.len(),
                    "masking collision table full, new values are no longer recorded"
                );
            }
            return output;
        }

        tables
            .by_hash
            .insert(original_hash.to_string(), output.clone());
        tables
            .by_masked
            .insert(output.clone(), original_hash.to_string());
        output
    }

    pub fn get(&self, original_hash: &str) -> Option<String> {
        self.inner.lock().by_hash.get(original_hash).cloned()
    }

    pub fn has_masked(&self, masked: &str) -> bool {
        self.inner.lock().by_masked.contains_key(masked)
    }

    /// Hash that owns an emitted masked value.
    pub fn get_hash(&self, masked: &str) -> Option<String> {
        self.inner.lock().by_masked.get(masked).cloned()
    }

    pub fn clear(&self) {
        let mut tables = self.inner.lock();
        tables.by_hash.clear();
        tables.by_masked.clear();
        tables.collisions = 0;
        tables.overflowed = 0;
    }

    pub fn stats(&self) -> MappingStats {
        let tables = self.inner.lock();
        MappingStats {
            total_entries: tables.by_hash.len(),
            unique_masked: tables.by_masked.len(),
            collisions: tables.collisions,
            overflowed: tables.overflowed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn first_registration_is_unchanged() {
        let table = MappingTable::new();
        assert_eq!(table.register("aaaa1111", "Joxn"), "Joxn");
        assert_eq!(table.get("aaaa1111").as_deref(), Some("Joxn"));
        assert!(table.has_masked("Joxn"));
        assert_eq!(table.get_hash("Joxn").as_deref(), Some("aaaa1111"));
    }

    #[test]
    fn same_hash_is_idempotent() {
        let table = MappingTable::new();
        table.register("aaaa1111", "Joxn");
        assert_eq!(table.register("aaaa1111", "Joxn"), "Joxn");
        assert_eq!(table.stats().collisions, 0);
        assert_eq!(table.stats().total_entries, 1);
    }

    #[test]
    fn collision_gets_hash_suffix() {
        let table = MappingTable::new();
        assert_eq!(table.register("aaaa1111", "Joxn"), "Joxn");
        assert_eq!(table.register("bbbb2222", "Joxn"), "Joxn#bbbb");
        // stable on repeat
        assert_eq!(table.register("bbbb2222", "Joxn"), "Joxn#bbbb");

        let stats = table.stats();
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.unique_masked, 2);
        assert_eq!(stats.collisions, 1);
    }

    #[test]
    fn clear_resets_everything() {
        let table = MappingTable::new();
        table.register("aaaa1111", "Joxn");
        table.register("bbbb2222", "Joxn");
        table.clear();
        assert_eq!(
            table.stats(),
            MappingStats {
                total_entries: 0,
                unique_masked: 0,
                collisions: 0,
                overflowed: 0,
            }
        );
        assert!(table.get("aaaa1111").is_none());
    }

    #[test]
    fn bounded_table_stops_growing() {
        let table = MappingTable::bounded(2);
        assert_eq!(table.register("aaaa1111", "Joxn"), "Joxn");
        assert_eq!(table.register("bbbb2222", "Maxa"), "Maxa");
        // full: not recorded, but still kept apart from recorded outputs
        assert_eq!(table.register("cccc3333", "Joxn"), "Joxn#cccc");
        assert_eq!(table.register("dddd4444", "Evxa"), "Evxa");
        assert!(table.get("dddd4444").is_none());

        let stats = table.stats();
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.overflowed, 2);
        // recorded values stay stable
        assert_eq!(table.register("aaaa1111", "Joxn"), "Joxn");
        assert_eq!(table.max_entries(), Some(2));
        assert_eq!(MappingTable::new().max_entries(), None);
    }

    #[test]
    fn concurrent_registration_is_consistent() {
        let table = Arc::new(MappingTable::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let table = Arc::clone(&table);
                std::thread::spawn(move || {
                    let hash = format!("{i:04}ffff");
                    table.register(&hash, "Joxn")
                })
            })
            .collect();
        let outputs: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let plain = outputs.iter().filter(|o| o.as_str() == "Joxn").count();
        assert_eq!(plain, 1);
        assert_eq!(table.stats().collisions, 7);
    }
}
