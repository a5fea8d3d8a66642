// Reader for the precinct boundaries.

use std::io::Read;

use serde_json::Map as JSMap;
use serde_json::Value as JSValue;

use crate::precinct::{io_common::simplify_file_name, *};

/// The features of the document, and its other top-level members.
pub type GeometryDocument = (Vec<GeometryFeature>, JSMap<String, JSValue>);

pub fn read_geometry_file(path: &str) -> BMapResult<GeometryDocument> {
    info!("Attempting to read geometry file {:?}", path);
    let file = fs::File::open(path).context(OpeningFileSnafu { path })?;
    read_geometry(std::io::BufReader::new(file), path)
}

pub fn read_geometry<R: Read>(rdr: R, path: &str) -> BMapResult<GeometryDocument> {
    let js: JSValue = serde_json::from_reader(rdr).context(ParsingJsonSnafu { path })?;
    let mut doc = match js {
        JSValue::Object(m) => m,
        _ => {
            return NotAFeatureCollectionSnafu {
                path,
                reason: "the document is not an object",
            }
            .fail()
            .map_err(Box::new);
        }
    };
    if doc.get("type").and_then(|t| t.as_str()) != Some("FeatureCollection") {
        return NotAFeatureCollectionSnafu {
            path,
            reason: "the type is not FeatureCollection",
        }
        .fail()
        .map_err(Box::new);
    }
    let raw_features = match doc.remove("features") {
        Some(JSValue::Array(fs)) => fs,
        _ => {
            return NotAFeatureCollectionSnafu {
                path,
                reason: "missing features",
            }
            .fail()
            .map_err(Box::new);
        }
    };
    doc.remove("type");

    let mut features: Vec<GeometryFeature> = Vec::with_capacity(raw_features.len());
    for (idx, raw) in raw_features.into_iter().enumerate() {
        let mut obj = match raw {
            JSValue::Object(m) => m,
            _ => {
                return NotAFeatureCollectionSnafu {
                    path,
                    reason: format!("feature {} is not an object", idx),
                }
                .fail()
                .map_err(Box::new);
            }
        };
        let properties = match obj.remove("properties") {
            Some(JSValue::Object(m)) => m,
            Some(JSValue::Null) | None => JSMap::new(),
            Some(_) => {
                return NotAFeatureCollectionSnafu {
                    path,
                    reason: format!("the properties of feature {} are not an object", idx),
                }
                .fail()
                .map_err(Box::new);
            }
        };
        let geometry = obj.remove("geometry").unwrap_or(JSValue::Null);
        features.push(GeometryFeature::new(geometry, properties));
    }
    info!(
        "Read {} features from {}",
        features.len(),
        simplify_file_name(path)
    );
    Ok((features, doc))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "type": "FeatureCollection",
        "name": "mn-precincts",
        "features": [
            {"type": "Feature",
             "properties": {"CountyID": "3", "PrecinctID": "270030007", "Precinct": "Anoka P-7"},
             "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]]}},
            {"type": "Feature", "properties": null, "geometry": null}
        ]
    }"#;

    #[test]
    fn reads_features_and_metadata() {
        let (features, meta) = read_geometry(DOC.as_bytes(), "mn-precincts.json").unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].properties["Precinct"], serde_json::json!("Anoka P-7"));
        assert_eq!(features[0].geometry["type"], serde_json::json!("Polygon"));
        assert!(features[1].properties.is_empty());
        assert_eq!(meta.get("name"), Some(&serde_json::json!("mn-precincts")));
        assert!(!meta.contains_key("features"));
    }

    #[test]
    fn rejects_other_documents() {
        for doc in [
            "[]",
            r#"{"type": "Feature"}"#,
            r#"{"type": "FeatureCollection"}"#,
            r#"{"type": "FeatureCollection", "features": [3]}"#,
        ] {
            let res = read_geometry(doc.as_bytes(), "x.json");
            match res {
                Err(e) => assert!(matches!(*e, MapError::NotAFeatureCollection { .. })),
                Ok(_) => panic!("expected an error for {}", doc),
            }
        }
        assert!(read_geometry("{".as_bytes(), "x.json").is_err());
    }
}
