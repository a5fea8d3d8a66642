use log::{debug, info, warn};
use serde_json::json;

use crate::config::*;
use crate::index::ResultIndex;
use crate::key::{feature_key, CanonicalKey};

/// A feature left out of the annotated collection, with the key it was
/// matched under.
#[derive(PartialEq, Debug, Clone)]
pub struct ExcludedFeature {
    pub key: CanonicalKey,
    pub reason: ExclusionReason,
    pub feature: GeometryFeature,
}

/// The outcome of a reconciliation.
///
/// Every input feature ends up in exactly one of `annotated` or `excluded`,
/// both in input order.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct Reconciliation {
    pub annotated: Vec<GeometryFeature>,
    pub excluded: Vec<ExcludedFeature>,
    pub warnings: Vec<DataIntegrityWarning>,
}

// The result of matching a single feature.
enum FeatureOutcome {
    Annotated(GeometryFeature),
    Excluded(ExcludedFeature),
}

/// Matches each geometry feature with its records, one per category.
///
/// The features are consumed: annotated features come back with the total,
/// the votes and the percentage of each category attached, and with the
/// source-only fields removed. Excluded features come back untouched.
///
/// Arguments:
/// * `features` the precinct geometries, in the order of the source document
/// * `index` the results
/// * `categories` the compared categories. The first one provides the total.
/// * `rules` the policy for missing matches
/// * `fields` the property names to read and to write
pub fn reconcile(
    features: Vec<GeometryFeature>,
    index: &ResultIndex,
    categories: &[Category],
    rules: &JoinRules,
    fields: &FeatureFields,
) -> Result<Reconciliation, JoinError> {
    info!(
        "Reconciling {} features against {} records, categories: {:?}, rules: {:?}",
        features.len(),
        index.len(),
        categories,
        rules
    );
    let mut res = Reconciliation::default();
    for feature in features {
        match reconcile_feature(feature, index, categories, rules, fields, &mut res.warnings)? {
            FeatureOutcome::Annotated(f) => res.annotated.push(f),
            FeatureOutcome::Excluded(e) => res.excluded.push(e),
        }
    }
    info!(
        "Reconciled: {} annotated, {} excluded, {} warnings",
        res.annotated.len(),
        res.excluded.len(),
        res.warnings.len()
    );
    Ok(res)
}

fn reconcile_feature(
    mut feature: GeometryFeature,
    index: &ResultIndex,
    categories: &[Category],
    rules: &JoinRules,
    fields: &FeatureFields,
    warnings: &mut Vec<DataIntegrityWarning>,
) -> Result<FeatureOutcome, JoinError> {
    let key = feature_key(&feature.properties, fields)?;

    let mut matched: Vec<(&Category, &VoteRecord)> = Vec::with_capacity(categories.len());
    for c in categories.iter() {
        match index.lookup(&key, &c.code) {
            Some(r) => matched.push((c, r)),
            None => match rules.exclusion_policy {
                ExclusionPolicy::ExcludeOnMissing => {
                    debug!(
                        "reconcile_feature: key {}: no record in category {}, excluding",
                        key, c.code
                    );
                    return Ok(FeatureOutcome::Excluded(ExcludedFeature {
                        key,
                        reason: ExclusionReason::MissingCategory(c.code.clone()),
                        feature,
                    }));
                }
                ExclusionPolicy::FailFast => {
                    return Err(JoinError::Reconciliation {
                        key: key.to_string(),
                        category: c.code.clone(),
                    });
                }
            },
        }
    }

    let total = match matched.first() {
        Some((_, r)) => r.total,
        // No categories to compare: nothing can be classified.
        None => 0,
    };
    for (c, r) in matched.iter().skip(1) {
        if r.total != total {
            let w = DataIntegrityWarning {
                key: key.to_string(),
                category: c.code.clone(),
                expected_total: total,
                found_total: r.total,
            };
            warn!("reconcile_feature: {}", w);
            warnings.push(w);
        }
    }

    if total == 0 {
        debug!("reconcile_feature: key {}: zero total, excluding", key);
        return Ok(FeatureOutcome::Excluded(ExcludedFeature {
            key,
            reason: ExclusionReason::ZeroTotal,
            feature,
        }));
    }

    let props = &mut feature.properties;
    for f in fields.strip_fields.iter() {
        props.remove(f);
    }
    props.insert(fields.key_field.clone(), json!(key.as_str()));
    props.insert(TOTAL_FIELD.to_string(), json!(total));
    for (c, r) in matched.iter() {
        props.insert(c.votes_field(), json!(r.votes));
        props.insert(c.percentage_field(), json!(r.percentage));
    }
    debug!("reconcile_feature: key {}: annotated, total {}", key, total);
    Ok(FeatureOutcome::Annotated(feature))
}
