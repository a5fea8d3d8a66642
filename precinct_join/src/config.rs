// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

use serde_json::Map as JSMap;
use serde_json::Value as JSValue;

/// One row of the results file: the votes of one category (party or candidate)
/// in one precinct.
///
/// Records are immutable once parsed. Their identity is the pair
/// (canonical key, category).
#[derive(PartialEq, Debug, Clone)]
pub struct VoteRecord {
    pub county_id: i64,
    pub precinct_id: String,
    pub category: String,
    pub votes: u64,
    /// Share of the precinct total, in [0, 100].
    pub percentage: f64,
    pub total: u64,
}

/// A category compared on the map.
///
/// The code is the value found in the results file (`DFL`, `R`, ...). The label
/// is used to name the fields attached to the geometry (`HarrisVotes`,
/// `HarrisPerc`, ...).
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Category {
    pub code: String,
    pub label: String,
}

impl Category {
    pub fn new(code: &str, label: &str) -> Category {
        Category {
            code: code.to_string(),
            label: label.to_string(),
        }
    }

    pub fn votes_field(&self) -> String {
        format!("{}Votes", self.label)
    }

    pub fn percentage_field(&self) -> String {
        format!("{}Perc", self.label)
    }
}

/// Checks that there is at least one category, and that no two categories
/// share a code or a label.
pub fn validate_categories(categories: &[Category]) -> Result<(), JoinError> {
    if categories.is_empty() {
        return Err(JoinError::InvalidCategories {
            reason: "no category to compare".to_string(),
        });
    }
    for (i, c) in categories.iter().enumerate() {
        for other in categories[..i].iter() {
            if other.code == c.code {
                return Err(JoinError::InvalidCategories {
                    reason: format!("code {:?} is given twice", c.code),
                });
            }
            if other.label == c.label {
                return Err(JoinError::InvalidCategories {
                    reason: format!("label {:?} is given twice", c.label),
                });
            }
        }
    }
    Ok(())
}

/// Name of the property holding the precinct total after the join.
pub const TOTAL_FIELD: &str = "Total";

/// A precinct boundary.
///
/// The geometry is never inspected: it is carried from the source document to
/// the output untouched.
#[derive(PartialEq, Debug, Clone)]
pub struct GeometryFeature {
    pub geometry: JSValue,
    pub properties: JSMap<String, JSValue>,
}

impl GeometryFeature {
    pub fn new(geometry: JSValue, properties: JSMap<String, JSValue>) -> GeometryFeature {
        GeometryFeature {
            geometry,
            properties,
        }
    }

    /// The total attached by the reconciliation, if any.
    pub fn total(&self) -> Option<u64> {
        self.properties.get(TOTAL_FIELD).and_then(|v| v.as_u64())
    }
}

// ******** Output data structures *********

/// Why a feature was left out of the annotated collection.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ExclusionReason {
    /// No record for this category under the feature's key.
    MissingCategory(String),
    /// The precinct recorded no votes at all.
    ZeroTotal,
}

/// The totals reported for one key disagree between categories.
///
/// Not fatal: the total of the first category is used.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DataIntegrityWarning {
    pub key: String,
    pub category: String,
    pub expected_total: u64,
    pub found_total: u64,
}

impl Display for DataIntegrityWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "key {}: category {} reports a total of {} but {} was expected",
            self.key, self.category, self.found_total, self.expected_total
        )
    }
}

/// Errors that prevent the join from completing.
///
/// All of them abort the run: no partial collection is ever returned.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum JoinError {
    /// A county or precinct identifier cannot be turned into a canonical key.
    KeyFormat {
        county: String,
        precinct: String,
        reason: String,
    },
    /// Two records share the same key within a category (reject policy).
    DuplicateKey { key: String, category: String },
    /// A feature has no record for a category (fail-fast policy).
    Reconciliation { key: String, category: String },
    /// The color scale cannot be built from the given parameters.
    InvalidScale { reason: String },
    /// The compared categories are empty or would write the same fields.
    InvalidCategories { reason: String },
}

impl Error for JoinError {}

impl Display for JoinError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinError::KeyFormat {
                county,
                precinct,
                reason,
            } => write!(
                f,
                "invalid identifier (county {:?}, precinct {:?}): {}",
                county, precinct, reason
            ),
            JoinError::DuplicateKey { key, category } => {
                write!(f, "duplicate key {} in category {}", key, category)
            }
            JoinError::Reconciliation { key, category } => {
                write!(f, "no result for key {} in category {}", key, category)
            }
            JoinError::InvalidScale { reason } => write!(f, "invalid color scale: {}", reason),
            JoinError::InvalidCategories { reason } => write!(f, "invalid categories: {}", reason),
        }
    }
}

// ********* Configuration **********

/// What to do with a feature when one of the categories has no record for it.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ExclusionPolicy {
    /// Move the feature to the excluded set.
    ExcludeOnMissing,
    /// Abort the whole run.
    FailFast,
}

/// What to do when two records of the same category share a key.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum DuplicatePolicy {
    Reject,
    KeepFirst,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct JoinRules {
    pub exclusion_policy: ExclusionPolicy,
    pub duplicate_policy: DuplicatePolicy,
}

impl JoinRules {
    pub const DEFAULT_RULES: JoinRules = JoinRules {
        exclusion_policy: ExclusionPolicy::ExcludeOnMissing,
        duplicate_policy: DuplicatePolicy::Reject,
    };
}

/// The names of the feature properties read and written by the join.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct FeatureFields {
    pub county_field: String,
    pub precinct_field: String,
    /// Property receiving the canonical key.
    pub key_field: String,
    /// Source-only properties removed once the feature is joined.
    pub strip_fields: Vec<String>,
}

impl Default for FeatureFields {
    fn default() -> Self {
        FeatureFields {
            county_field: "CountyID".to_string(),
            precinct_field: "PrecinctID".to_string(),
            key_field: "PrecinctCountyCode".to_string(),
            strip_fields: [
                "PrecinctID",
                "County",
                "CountyID",
                "CongDist",
                "MNSenDist",
                "MNLegDist",
                "CtyComDist",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}
