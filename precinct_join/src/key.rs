use std::fmt::Display;

use log::debug;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;

use crate::config::{FeatureFields, JoinError};

/// Number of characters kept from a precinct identifier.
const PRECINCT_CODE_LEN: usize = 4;

/// The identifier shared by the results file and the geometry file.
///
/// It is always 6 characters long: the county code on 2 zero-padded digits,
/// followed by the last 4 characters of the precinct identifier.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd)]
pub struct CanonicalKey(String);

impl CanonicalKey {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for CanonicalKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn key_error(county: impl ToString, precinct: &str, reason: &str) -> JoinError {
    JoinError::KeyFormat {
        county: county.to_string(),
        precinct: precinct.to_string(),
        reason: reason.to_string(),
    }
}

/// Builds the canonical key from a county number and a precinct identifier.
///
/// The precinct identifier may be either the local 4-character code or a longer
/// form that carries a prefix (state, county, ...). Only the last 4 characters
/// are kept, so both forms converge on the same key.
///
/// ```
/// use precinct_join::normalize;
///
/// assert_eq!(normalize(3, "0007")?.as_str(), "030007");
/// assert_eq!(normalize(3, "270030007")?.as_str(), "030007");
/// # Ok::<(), precinct_join::JoinError>(())
/// ```
pub fn normalize(county_id: i64, precinct_identifier: &str) -> Result<CanonicalKey, JoinError> {
    if county_id < 0 {
        return Err(key_error(
            county_id,
            precinct_identifier,
            "county id is negative",
        ));
    }
    if county_id >= 100 {
        return Err(key_error(
            county_id,
            precinct_identifier,
            "county id has more than 2 digits",
        ));
    }
    let num_chars = precinct_identifier.chars().count();
    if num_chars < PRECINCT_CODE_LEN {
        return Err(key_error(
            county_id,
            precinct_identifier,
            "precinct id is shorter than 4 characters",
        ));
    }
    let precinct_code: String = precinct_identifier
        .chars()
        .skip(num_chars - PRECINCT_CODE_LEN)
        .collect();
    Ok(CanonicalKey(format!("{:02}{}", county_id, precinct_code)))
}

/// Reads a county id written as text (`"3"`, `"03"`, `" 27 "`).
pub fn parse_county_id(raw: &str) -> Result<i64, JoinError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| key_error(raw, "", "county id is not an integer"))
}

fn county_from_json(value: &JSValue, precinct: &str) -> Result<i64, JoinError> {
    match value {
        JSValue::Number(n) => {
            if let Some(x) = n.as_i64() {
                Ok(x)
            } else {
                // Some exports write the county as a float (3.0).
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => Ok(f as i64),
                    _ => Err(key_error(n, precinct, "county id is not an integer")),
                }
            }
        }
        JSValue::String(s) => parse_county_id(s).map_err(|_| {
            key_error(s, precinct, "county id is not an integer")
        }),
        x => Err(key_error(x, precinct, "county id is not a number")),
    }
}

/// Derives the canonical key of a geometry feature from its properties.
pub fn feature_key(
    properties: &JSMap<String, JSValue>,
    fields: &FeatureFields,
) -> Result<CanonicalKey, JoinError> {
    let precinct: String = match properties.get(&fields.precinct_field) {
        Some(JSValue::String(s)) => s.clone(),
        Some(JSValue::Number(n)) => n.to_string(),
        _ => {
            let county = properties
                .get(&fields.county_field)
                .map(|v| v.to_string())
                .unwrap_or_default();
            return Err(key_error(
                county,
                "",
                &format!("missing property {}", fields.precinct_field),
            ));
        }
    };
    let county_value = properties
        .get(&fields.county_field)
        .ok_or_else(|| {
            key_error(
                "",
                &precinct,
                &format!("missing property {}", fields.county_field),
            )
        })?;
    let county_id = county_from_json(county_value, &precinct)?;
    let key = normalize(county_id, &precinct)?;
    debug!(
        "feature_key: county {:?} precinct {:?} -> {}",
        county_value, precinct, key
    );
    Ok(key)
}
