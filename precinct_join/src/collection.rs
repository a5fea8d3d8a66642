use log::debug;
use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;

use crate::classify::{ColorScale, Fill};
use crate::config::{GeometryFeature, JoinError};

/// The annotated features, with the top-level members of the source document
/// (`name`, `crs`, ...).
#[derive(PartialEq, Debug, Clone, Default)]
pub struct GeometryCollection {
    pub metadata: JSMap<String, JSValue>,
    pub features: Vec<GeometryFeature>,
}

/// Wraps the features. No further computation happens here.
pub fn assemble(
    features: Vec<GeometryFeature>,
    metadata: JSMap<String, JSValue>,
) -> GeometryCollection {
    debug!("assemble: {} features", features.len());
    GeometryCollection { metadata, features }
}

impl GeometryFeature {
    pub fn to_geojson(&self) -> JSValue {
        json!({
            "type": "Feature",
            "properties": self.properties,
            "geometry": self.geometry,
        })
    }
}

impl GeometryCollection {
    pub fn to_geojson(&self) -> JSValue {
        let mut doc = self.metadata.clone();
        doc.insert("type".to_string(), json!("FeatureCollection"));
        doc.insert(
            "features".to_string(),
            JSValue::Array(self.features.iter().map(|f| f.to_geojson()).collect()),
        );
        JSValue::Object(doc)
    }
}

/// A field shown when hovering a feature, with its display label.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TooltipField {
    pub field: String,
    pub alias: String,
}

impl TooltipField {
    pub fn new(field: &str, alias: &str) -> TooltipField {
        TooltipField {
            field: field.to_string(),
            alias: alias.to_string(),
        }
    }
}

/// How a single feature is drawn.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct FeatureStyle {
    pub fill: Fill,
    pub stroke: &'static str,
    pub weight: f64,
    pub fill_opacity: f64,
}

impl FeatureStyle {
    pub fn new(fill: Fill) -> FeatureStyle {
        FeatureStyle {
            fill,
            stroke: "black",
            weight: 0.325,
            fill_opacity: 0.7,
        }
    }

    pub fn to_json(&self) -> JSValue {
        json!({
            "fillColor": self.fill.to_string(),
            "color": self.stroke,
            "weight": self.weight,
            "fillOpacity": self.fill_opacity,
        })
    }
}

/// Styles a feature from the percentage stored in `field`.
///
/// Features without a positive total, or without a numeric percentage, are
/// never classified and get the no-data fill.
pub fn style_feature(scale: &ColorScale, field: &str, feature: &GeometryFeature) -> FeatureStyle {
    let fill = match (feature.total(), feature.properties.get(field).and_then(|v| v.as_f64())) {
        (Some(total), Some(perc)) if total > 0 => scale.classify(perc),
        _ => Fill::NoData,
    };
    FeatureStyle::new(fill)
}

/// Produces the visual artifact from the annotated collection.
///
/// The style callback is usually built with `style_feature` around the color
/// scale of the run.
pub trait MapRenderer {
    fn render(
        &self,
        collection: &GeometryCollection,
        style: &dyn Fn(&GeometryFeature) -> FeatureStyle,
        tooltip: &[TooltipField],
    ) -> Result<JSValue, JoinError>;
}

/// Renders the collection as GeoJSON, with the style of each feature stored
/// under `properties.style`, and the legend and the tooltip configuration as
/// top-level members.
#[derive(PartialEq, Debug, Clone)]
pub struct StyledGeoJson {
    pub caption: String,
    pub scale: ColorScale,
}

impl MapRenderer for StyledGeoJson {
    fn render(
        &self,
        collection: &GeometryCollection,
        style: &dyn Fn(&GeometryFeature) -> FeatureStyle,
        tooltip: &[TooltipField],
    ) -> Result<JSValue, JoinError> {
        let features: Vec<JSValue> = collection
            .features
            .iter()
            .map(|f| {
                let mut js = f.to_geojson();
                js["properties"]["style"] = style(f).to_json();
                js
            })
            .collect();
        let bins: Vec<JSValue> = self
            .scale
            .bins()
            .iter()
            .map(|b| json!({"lower": b.lower, "upper": b.upper, "color": b.color.to_string()}))
            .collect();
        let (vmin, vmax) = self.scale.domain();

        let mut doc = collection.metadata.clone();
        doc.insert("type".to_string(), json!("FeatureCollection"));
        doc.insert(
            "legend".to_string(),
            json!({"caption": self.caption, "vmin": vmin, "vmax": vmax, "bins": bins}),
        );
        doc.insert(
            "tooltip".to_string(),
            json!({
                "fields": tooltip.iter().map(|t| t.field.clone()).collect::<Vec<String>>(),
                "aliases": tooltip.iter().map(|t| t.alias.clone()).collect::<Vec<String>>(),
            }),
        );
        doc.insert("features".to_string(), JSValue::Array(features));
        Ok(JSValue::Object(doc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::build_scale;

    fn annotated(total: u64, perc: f64) -> GeometryFeature {
        let props = json!({"Precinct": "P-1", "Total": total, "HarrisPerc": perc});
        GeometryFeature::new(
            json!({"type": "Point", "coordinates": [1.0, 2.0]}),
            props.as_object().unwrap().clone(),
        )
    }

    #[test]
    fn assemble_keeps_metadata_and_order() {
        let mut meta = JSMap::new();
        meta.insert("name".to_string(), json!("mn-precincts"));
        let coll = assemble(vec![annotated(10, 40.0), annotated(20, 60.0)], meta);
        let js = coll.to_geojson();
        assert_eq!(js["type"], json!("FeatureCollection"));
        assert_eq!(js["name"], json!("mn-precincts"));
        assert_eq!(js["features"][0]["properties"]["Total"], json!(10));
        assert_eq!(js["features"][1]["properties"]["Total"], json!(20));
        assert_eq!(js["features"][1]["geometry"]["type"], json!("Point"));
    }

    #[test]
    fn zero_total_is_never_colored() {
        let scale = build_scale(10, (0.0, 100.0)).unwrap();
        assert_eq!(style_feature(&scale, "HarrisPerc", &annotated(0, 45.0)).fill, Fill::NoData);
        let no_total = GeometryFeature::new(JSValue::Null, JSMap::new());
        assert_eq!(style_feature(&scale, "HarrisPerc", &no_total).fill, Fill::NoData);
        assert_eq!(
            style_feature(&scale, "HarrisPerc", &annotated(100, 45.0)).fill,
            scale.classify(45.0)
        );
    }

    #[test]
    fn styled_geojson_output() {
        let scale = build_scale(10, (0.0, 100.0)).unwrap();
        let renderer = StyledGeoJson {
            caption: "Percentage of Vote Won by DFL (%)".to_string(),
            scale: scale.clone(),
        };
        let coll = assemble(vec![annotated(100, 45.0)], JSMap::new());
        let style = |f: &GeometryFeature| style_feature(&scale, "HarrisPerc", f);
        let js = renderer
            .render(&coll, &style, &[TooltipField::new("Total", "Total Votes:")])
            .unwrap();
        let expected_fill = scale.bins()[4].color.to_string();
        assert_eq!(
            js["features"][0]["properties"]["style"],
            json!({"fillColor": expected_fill, "color": "black", "weight": 0.325, "fillOpacity": 0.7})
        );
        assert_eq!(js["legend"]["caption"], json!("Percentage of Vote Won by DFL (%)"));
        assert_eq!(js["legend"]["bins"].as_array().unwrap().len(), 10);
        assert_eq!(js["tooltip"]["fields"], json!(["Total"]));
        assert_eq!(js["tooltip"]["aliases"], json!(["Total Votes:"]));
    }
}
