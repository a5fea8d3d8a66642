use std::collections::HashMap;

use log::{debug, info, warn};

use crate::config::{DuplicatePolicy, JoinError, VoteRecord};
use crate::key::{normalize, CanonicalKey};

/// The results, grouped by category then by canonical key.
///
/// Built once per run and read-only afterwards, so it can be shared between
/// several reconciliations.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct ResultIndex {
    by_category: HashMap<String, HashMap<CanonicalKey, VoteRecord>>,
    num_records: usize,
}

impl ResultIndex {
    /// Indexes the records.
    ///
    /// Any record whose identifiers cannot be normalized aborts the build. Two
    /// records of the same category under the same key are handled according
    /// to the duplicate policy: the build is rejected, or the first record
    /// encountered wins.
    pub fn build(records: &[VoteRecord], policy: DuplicatePolicy) -> Result<ResultIndex, JoinError> {
        let mut by_category: HashMap<String, HashMap<CanonicalKey, VoteRecord>> = HashMap::new();
        let mut num_records = 0;
        let mut num_dropped = 0;
        for r in records.iter() {
            let key = normalize(r.county_id, &r.precinct_id)?;
            let category_index = by_category.entry(r.category.clone()).or_default();
            if category_index.contains_key(&key) {
                match policy {
                    DuplicatePolicy::Reject => {
                        return Err(JoinError::DuplicateKey {
                            key: key.to_string(),
                            category: r.category.clone(),
                        });
                    }
                    DuplicatePolicy::KeepFirst => {
                        warn!(
                            "ResultIndex::build: dropping duplicate record for key {} in category {}",
                            key, r.category
                        );
                        num_dropped += 1;
                        continue;
                    }
                }
            }
            debug!("ResultIndex::build: {} {} -> {:?}", key, r.category, r);
            category_index.insert(key, r.clone());
            num_records += 1;
        }
        info!(
            "Indexed {} records in {} categories ({} duplicates dropped)",
            num_records,
            by_category.len(),
            num_dropped
        );
        Ok(ResultIndex {
            by_category,
            num_records,
        })
    }

    /// The record of a category under a key. Absence is not an error: the
    /// caller decides what it means.
    pub fn lookup(&self, key: &CanonicalKey, category: &str) -> Option<&VoteRecord> {
        self.by_category.get(category).and_then(|m| m.get(key))
    }

    /// The categories seen in the records, sorted.
    pub fn categories(&self) -> Vec<&str> {
        let mut res: Vec<&str> = self.by_category.keys().map(|s| s.as_str()).collect();
        res.sort_unstable();
        res
    }

    pub fn len(&self) -> usize {
        self.num_records
    }

    pub fn is_empty(&self) -> bool {
        self.num_records == 0
    }
}
