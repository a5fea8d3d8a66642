mod classify;
mod collection;
mod config;
mod index;
mod key;
mod reconcile;

use log::{info, warn};
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;

pub use crate::classify::*;
pub use crate::collection::*;
pub use crate::config::*;
pub use crate::index::ResultIndex;
pub use crate::key::{feature_key, normalize, parse_county_id, CanonicalKey};
pub use crate::reconcile::{reconcile, ExcludedFeature, Reconciliation};

pub mod builder;
pub mod manual;

/// The result of a complete join.
#[derive(PartialEq, Debug, Clone)]
pub struct JoinOutcome {
    /// The annotated features, ready for rendering.
    pub collection: GeometryCollection,
    pub excluded: Vec<ExcludedFeature>,
    pub warnings: Vec<DataIntegrityWarning>,
}

impl JoinOutcome {
    /// Number of excluded features for which a category was missing, and for
    /// which the total was zero.
    pub fn exclusion_counts(&self) -> (usize, usize) {
        let missing = self
            .excluded
            .iter()
            .filter(|e| matches!(e.reason, ExclusionReason::MissingCategory(_)))
            .count();
        (missing, self.excluded.len() - missing)
    }
}

/// Joins the results with the geometries.
///
/// Arguments:
/// * `records` the rows of the results file
/// * `features` the precinct geometries
/// * `metadata` the top-level members of the geometry document, carried over
/// * `categories` the compared categories, the leading one first
/// * `rules` the policies for duplicates and missing matches
/// * `fields` the feature properties to read and write
///
/// Any error aborts the join: the outcome is either complete or absent.
pub fn run_join(
    records: &[VoteRecord],
    features: Vec<GeometryFeature>,
    metadata: JSMap<String, JSValue>,
    categories: &[Category],
    rules: &JoinRules,
    fields: &FeatureFields,
) -> Result<JoinOutcome, JoinError> {
    info!(
        "Processing {:?} records and {:?} features",
        records.len(),
        features.len()
    );
    validate_categories(categories)?;
    let index = ResultIndex::build(records, rules.duplicate_policy)?;
    for c in categories.iter() {
        if !index.categories().contains(&c.code.as_str()) {
            warn!("run_join: category {} has no record at all", c.code);
        }
    }
    let res = reconcile(features, &index, categories, rules, fields)?;
    let collection = assemble(res.annotated, metadata);
    Ok(JoinOutcome {
        collection,
        excluded: res.excluded,
        warnings: res.warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn feature(county: &str, precinct: &str) -> GeometryFeature {
        let props = json!({"CountyID": county, "PrecinctID": precinct});
        GeometryFeature::new(json!(null), props.as_object().unwrap().clone())
    }

    fn record(precinct_id: &str, category: &str, votes: u64, total: u64) -> VoteRecord {
        VoteRecord {
            county_id: 3,
            precinct_id: precinct_id.to_string(),
            category: category.to_string(),
            votes,
            percentage: 100.0 * votes as f64 / total.max(1) as f64,
            total,
        }
    }

    #[test]
    fn run_join_counts_exclusions() {
        let _ = env_logger::builder().is_test(true).try_init();
        let records = vec![
            record("0001", "DFL", 10, 20),
            record("0001", "R", 10, 20),
            record("0002", "DFL", 0, 0),
            record("0002", "R", 0, 0),
            record("0003", "DFL", 3, 4),
        ];
        let features = vec![
            feature("3", "270030001"),
            feature("3", "270030002"),
            feature("3", "270030003"),
        ];
        let categories = vec![Category::new("DFL", "Harris"), Category::new("R", "Trump")];
        let outcome = run_join(
            &records,
            features,
            JSMap::new(),
            &categories,
            &JoinRules::DEFAULT_RULES,
            &FeatureFields::default(),
        )
        .unwrap();
        assert_eq!(outcome.collection.features.len(), 1);
        assert_eq!(outcome.exclusion_counts(), (1, 1));
    }

    #[test]
    fn run_join_rejects_duplicates_before_reconciling() {
        let records = vec![record("0001", "DFL", 10, 20), record("0001", "DFL", 11, 20)];
        let res = run_join(
            &records,
            vec![feature("3", "0001")],
            JSMap::new(),
            &[Category::new("DFL", "Harris")],
            &JoinRules::DEFAULT_RULES,
            &FeatureFields::default(),
        );
        assert_eq!(
            res,
            Err(JoinError::DuplicateKey {
                key: "030001".to_string(),
                category: "DFL".to_string()
            })
        );
    }

    #[test]
    fn run_join_requires_distinct_categories() {
        let records = vec![record("0001", "DFL", 10, 20)];
        let run = |categories: &[Category]| {
            run_join(
                &records,
                vec![feature("3", "0001")],
                JSMap::new(),
                categories,
                &JoinRules::DEFAULT_RULES,
                &FeatureFields::default(),
            )
        };
        assert!(matches!(run(&[]), Err(JoinError::InvalidCategories { .. })));
        let twice = [Category::new("DFL", "Harris"), Category::new("DFL", "Walz")];
        assert!(matches!(run(&twice), Err(JoinError::InvalidCategories { .. })));
    }
}
