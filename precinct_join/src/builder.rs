pub use crate::config::*;

use crate::key::normalize;
use crate::{run_join, JoinOutcome};

use serde_json::Map as JSMap;

/// A builder for adding records and joining them with geometries.
///
/// ```
/// pub use precinct_join::builder::Builder;
/// pub use precinct_join::{GeometryFeature, JoinRules};
/// # use precinct_join::JoinError;
/// use serde_json::json;
///
/// let mut builder = Builder::new(&JoinRules::DEFAULT_RULES)?
///     .categories(&[("DFL", "Harris"), ("R", "Trump")])?;
///
/// builder.add_record(3, "0007", "DFL", 450, 45.0, 1000)?;
/// builder.add_record(3, "0007", "R", 500, 50.0, 1000)?;
///
/// let props = json!({"CountyID": 3, "PrecinctID": "270030007"});
/// let feature = GeometryFeature::new(json!(null), props.as_object().unwrap().clone());
/// let outcome = builder.join(vec![feature])?;
/// assert_eq!(outcome.collection.features[0].total(), Some(1000));
///
/// # Ok::<(), JoinError>(())
/// ```
pub struct Builder {
    pub(crate) _rules: JoinRules,
    pub(crate) _categories: Vec<Category>,
    pub(crate) _fields: FeatureFields,
    pub(crate) _records: Vec<VoteRecord>,
}

impl Builder {
    pub fn new(rules: &JoinRules) -> Result<Builder, JoinError> {
        Ok(Builder {
            _rules: rules.clone(),
            _categories: Vec::new(),
            _fields: FeatureFields::default(),
            _records: Vec::new(),
        })
    }

    /// Sets the compared categories, as (code, label) pairs. The first one is
    /// the leading category.
    ///
    /// Fails if the list is empty, or if a code or a label is repeated.
    pub fn categories(self, cats: &[(&str, &str)]) -> Result<Builder, JoinError> {
        let categories: Vec<Category> = cats
            .iter()
            .map(|(code, label)| Category::new(code, label))
            .collect();
        validate_categories(&categories)?;
        Ok(Builder {
            _categories: categories,
            ..self
        })
    }

    pub fn fields(self, fields: FeatureFields) -> Builder {
        Builder {
            _fields: fields,
            ..self
        }
    }

    /// Adds a record.
    ///
    /// The identifiers are checked immediately, so that a malformed record is
    /// reported where it is added.
    pub fn add_record(
        &mut self,
        county_id: i64,
        precinct_id: &str,
        category: &str,
        votes: u64,
        percentage: f64,
        total: u64,
    ) -> Result<(), JoinError> {
        self.add_record_2(&VoteRecord {
            county_id,
            precinct_id: precinct_id.to_string(),
            category: category.to_string(),
            votes,
            percentage,
            total,
        })
    }

    pub fn add_record_2(&mut self, record: &VoteRecord) -> Result<(), JoinError> {
        normalize(record.county_id, &record.precinct_id)?;
        self._records.push(record.clone());
        Ok(())
    }

    /// Runs the join over the records added so far.
    pub fn join(&self, features: Vec<GeometryFeature>) -> Result<JoinOutcome, JoinError> {
        run_join(
            &self._records,
            features,
            JSMap::new(),
            &self._categories,
            &self._rules,
            &self._fields,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_rejects_malformed_records_early() {
        let mut builder = Builder::new(&JoinRules::DEFAULT_RULES).unwrap();
        assert!(builder.add_record(3, "07", "DFL", 1, 50.0, 2).is_err());
        assert!(builder._records.is_empty());
    }

    #[test]
    fn builder_rejects_bad_categories() {
        let builder = || Builder::new(&JoinRules::DEFAULT_RULES).unwrap();
        assert!(builder().categories(&[]).is_err());
        // The second label would overwrite the HarrisVotes field.
        match builder().categories(&[("DFL", "Harris"), ("DFL2", "Harris")]) {
            Err(JoinError::InvalidCategories { reason }) => assert!(reason.contains("Harris")),
            _ => panic!("expected an error"),
        }
        assert!(builder()
            .categories(&[("DFL", "Harris"), ("DFL", "Walz")])
            .is_err());
    }

    #[test]
    fn builder_with_custom_fields() {
        let fields = FeatureFields {
            county_field: "COUNTYFIPS".to_string(),
            precinct_field: "VTD".to_string(),
            key_field: "Key".to_string(),
            strip_fields: vec!["VTD".to_string()],
        };
        let mut builder = Builder::new(&JoinRules::DEFAULT_RULES)
            .unwrap()
            .categories(&[("leading", "Lead"), ("trailing", "Trail")])
            .unwrap()
            .fields(fields);
        builder.add_record(1, "0002", "leading", 3, 60.0, 5).unwrap();
        builder.add_record(1, "0002", "trailing", 2, 40.0, 5).unwrap();
        let props = json!({"COUNTYFIPS": "01", "VTD": "2701-0002"});
        let f = GeometryFeature::new(json!(null), props.as_object().unwrap().clone());
        let outcome = builder.join(vec![f]).unwrap();
        let p = &outcome.collection.features[0].properties;
        assert_eq!(p["Key"], json!("010002"));
        assert_eq!(p["COUNTYFIPS"], json!("01"));
        assert!(!p.contains_key("VTD"));
        assert_eq!(p["LeadVotes"], json!(3));
        assert_eq!(p["TrailPerc"], json!(40.0));
    }
}
