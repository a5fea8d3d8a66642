use crate::precinct::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "contestName")]
    pub contest_name: String,
    #[serde(rename = "outputFile")]
    pub output_file: Option<String>,
    #[serde(rename = "caption")]
    pub caption: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ResultsSource {
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "delimiter")]
    pub delimiter: Option<String>,
    #[serde(rename = "officeId")]
    pub office_id: Option<String>,
}

impl ResultsSource {
    pub fn delimiter_byte(&self) -> MapResult<u8> {
        match self.delimiter.as_deref() {
            None => Ok(b';'),
            Some(d) if d.len() == 1 => Ok(d.as_bytes()[0]),
            Some(d) => InvalidConfigSnafu {
                option: "delimiter",
                value: d.to_string(),
            }
            .fail(),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct GeometrySource {
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "countyField")]
    pub county_field: Option<String>,
    #[serde(rename = "precinctField")]
    pub precinct_field: Option<String>,
    #[serde(rename = "keyField")]
    pub key_field: Option<String>,
    #[serde(rename = "stripFields")]
    pub strip_fields: Option<Vec<String>>,
}

impl GeometrySource {
    pub fn feature_fields(&self) -> FeatureFields {
        let default = FeatureFields::default();
        FeatureFields {
            county_field: self.county_field.clone().unwrap_or(default.county_field),
            precinct_field: self.precinct_field.clone().unwrap_or(default.precinct_field),
            key_field: self.key_field.clone().unwrap_or(default.key_field),
            strip_fields: self.strip_fields.clone().unwrap_or(default.strip_fields),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct MapCategory {
    pub code: String,
    pub label: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct MapRules {
    #[serde(rename = "exclusionPolicy")]
    pub exclusion_policy: Option<String>,
    #[serde(rename = "duplicatePolicy")]
    pub duplicate_policy: Option<String>,
}

#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColorScaleSettings {
    pub bins: Option<usize>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub thresholds: Option<Vec<f64>>,
    pub colors: Option<Vec<String>>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct TooltipSettings {
    pub field: String,
    pub alias: String,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    #[serde(rename = "resultsSource")]
    pub results_source: ResultsSource,
    #[serde(rename = "geometrySource")]
    pub geometry_source: GeometrySource,
    pub categories: Option<Vec<MapCategory>>,
    pub rules: Option<MapRules>,
    #[serde(rename = "colorScale")]
    pub color_scale: Option<ColorScaleSettings>,
    pub tooltip: Option<Vec<TooltipSettings>>,
}

impl MapConfig {
    /// A configuration with all the defaults, for runs without a config file.
    pub fn from_paths(results_path: &str, geometry_path: &str) -> MapConfig {
        MapConfig {
            output_settings: OutputSettings {
                contest_name: "precinctmap".to_string(),
                output_file: None,
                caption: None,
            },
            results_source: ResultsSource {
                file_path: results_path.to_string(),
                delimiter: None,
                office_id: None,
            },
            geometry_source: GeometrySource {
                file_path: geometry_path.to_string(),
                county_field: None,
                precinct_field: None,
                key_field: None,
                strip_fields: None,
            },
            categories: None,
            rules: None,
            color_scale: None,
            tooltip: None,
        }
    }

    /// The compared categories. Defaults to the 2024 presidential race in
    /// Minnesota.
    pub fn categories(&self) -> MapResult<Vec<Category>> {
        match &self.categories {
            None => Ok(vec![
                Category::new("DFL", "Harris"),
                Category::new("R", "Trump"),
            ]),
            Some(cs) if cs.is_empty() => InvalidConfigSnafu {
                option: "categories",
                value: "[]".to_string(),
            }
            .fail(),
            Some(cs) => Ok(cs
                .iter()
                .map(|c| Category::new(&c.code, &c.label))
                .collect()),
        }
    }

    pub fn caption(&self, categories: &[Category]) -> String {
        match (&self.output_settings.caption, categories.first()) {
            (Some(c), _) => c.clone(),
            (None, Some(c)) => format!("Percentage of Vote Won by {} (%)", c.label),
            (None, None) => "Percentage of Vote (%)".to_string(),
        }
    }

    pub fn tooltip(&self, categories: &[Category]) -> Vec<TooltipField> {
        if let Some(ts) = &self.tooltip {
            return ts
                .iter()
                .map(|t| TooltipField::new(&t.field, &t.alias))
                .collect();
        }
        let mut res = vec![TooltipField::new("Precinct", "Precinct:")];
        for c in categories.iter() {
            res.push(TooltipField::new(
                &c.votes_field(),
                &format!("{} Votes:", c.label),
            ));
        }
        for c in categories.iter() {
            res.push(TooltipField::new(
                &c.percentage_field(),
                &format!("{} %:", c.label),
            ));
        }
        res.push(TooltipField::new(TOTAL_FIELD, "Total Votes:"));
        res
    }
}

pub fn parse_exclusion_policy(s: &str) -> MapResult<ExclusionPolicy> {
    match s {
        "excludeOnMissing" => Ok(ExclusionPolicy::ExcludeOnMissing),
        "failFast" => Ok(ExclusionPolicy::FailFast),
        x => InvalidConfigSnafu {
            option: "exclusionPolicy",
            value: x.to_string(),
        }
        .fail(),
    }
}

pub fn parse_duplicate_policy(s: &str) -> MapResult<DuplicatePolicy> {
    match s {
        "reject" => Ok(DuplicatePolicy::Reject),
        "keepFirst" => Ok(DuplicatePolicy::KeepFirst),
        x => InvalidConfigSnafu {
            option: "duplicatePolicy",
            value: x.to_string(),
        }
        .fail(),
    }
}

pub fn validate_rules(map_rules: &Option<MapRules>) -> MapResult<JoinRules> {
    let mut res = JoinRules::DEFAULT_RULES;
    if let Some(r) = map_rules {
        if let Some(p) = &r.exclusion_policy {
            res.exclusion_policy = parse_exclusion_policy(p)?;
        }
        if let Some(p) = &r.duplicate_policy {
            res.duplicate_policy = parse_duplicate_policy(p)?;
        }
    }
    Ok(res)
}

pub fn build_color_scale(settings: &Option<ColorScaleSettings>) -> MapResult<ColorScale> {
    let s = settings.clone().unwrap_or_default();
    let scale = match &s.thresholds {
        Some(edges) => {
            if s.bins.is_some() {
                warn!("build_color_scale: thresholds are given, ignoring the number of bins");
            }
            ColorScale::from_thresholds(edges)
        }
        None => build_scale(
            s.bins.unwrap_or(11),
            (s.min.unwrap_or(0.0), s.max.unwrap_or(100.0)),
        ),
    }
    .context(JoinSnafu {})?;
    match &s.colors {
        None => Ok(scale),
        Some(hex_colors) => {
            let mut palette: Vec<Rgb> = Vec::new();
            for h in hex_colors.iter() {
                let c = Rgb::from_hex(h).context(InvalidConfigSnafu {
                    option: "colors",
                    value: h.clone(),
                })?;
                palette.push(c);
            }
            scale.with_palette(&palette).context(JoinSnafu {})
        }
    }
}

pub fn read_config(path: &str) -> BMapResult<MapConfig> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let config: MapConfig =
        serde_json::from_str(&contents).context(ParsingJsonSnafu { path })?;
    Ok(config)
}

pub fn read_reference(path: &str) -> MapResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let js: JSValue = serde_json::from_str(&contents).context(ParsingJsonSnafu { path })?;
    Ok(js)
}
