use log::{debug, info, warn};

use precinct_join::*;
use snafu::prelude::*;

use std::fs;
use std::path::Path;

use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::precinct::config_reader::*;
use crate::precinct::io_common::{resolve_path, write_output};

mod config_reader;
mod io_common;
mod io_geojson;
mod io_results;

#[derive(Debug, Snafu)]
pub enum MapError {
    #[snafu(display("Error opening file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing file {path}"))]
    WritingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing the JSON file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error serializing the map"))]
    SerializingMap { source: serde_json::Error },
    #[snafu(display("{path} is not a GeoJSON feature collection: {reason}"))]
    NotAFeatureCollection { path: String, reason: String },
    #[snafu(display("Error reading line {lineno} of the results file"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Line {lineno} of the results file has {num_columns} columns, expected 16"))]
    CsvColumnCount { lineno: usize, num_columns: usize },
    #[snafu(display("Line {lineno}, column {column}: cannot read a number from {content:?}"))]
    CsvNumber {
        lineno: usize,
        column: usize,
        content: String,
    },
    #[snafu(display("Invalid value {value:?} for option {option}"))]
    InvalidConfig { option: String, value: String },
    #[snafu(display("Missing input: {name} (use --config or --{name})"))]
    MissingInput { name: String },
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},
    #[snafu(display("{source}"))]
    Join { source: JoinError },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

type MapResult<T> = Result<T, MapError>;
type BMapResult<T> = Result<T, Box<MapError>>;

/// Counts reported at the end of a run.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RunSummary {
    pub num_records: usize,
    pub num_features: usize,
    pub num_annotated: usize,
    pub num_missing: usize,
    pub num_zero_total: usize,
    pub num_warnings: usize,
}

impl RunSummary {
    fn log(&self) {
        info!(
            "{} result rows, {} precincts read",
            self.num_records, self.num_features
        );
        info!("       {} precincts on the map", self.num_annotated);
        info!(
            "       {} precincts excluded: {} without a result, {} without votes",
            self.num_missing + self.num_zero_total,
            self.num_missing,
            self.num_zero_total
        );
        if self.num_warnings > 0 {
            warn!(
                "       {} precincts with inconsistent totals",
                self.num_warnings
            );
        }
    }
}

/// The fully resolved inputs of a run.
#[derive(PartialEq, Debug, Clone)]
struct RunPlan {
    config: MapConfig,
    results_path: String,
    geometry_path: String,
    out: Option<String>,
    rules: JoinRules,
}

fn make_plan(args: &Args) -> BMapResult<RunPlan> {
    let (config, results_path, geometry_path) = match &args.config {
        Some(config_path) => {
            let config = read_config(config_path)?;
            debug!("config: {:?}", config);
            let root = Path::new(config_path)
                .parent()
                .context(MissingParentDirSnafu {})?;
            let results_path = resolve_path(root, &config.results_source.file_path);
            let geometry_path = resolve_path(root, &config.geometry_source.file_path);
            let out = config
                .output_settings
                .output_file
                .as_ref()
                .map(|o| if o == "stdout" { o.clone() } else { resolve_path(root, o) });
            let mut config = config;
            config.output_settings.output_file = out;
            (config, results_path, geometry_path)
        }
        None => {
            let results_path = args.results.clone().context(MissingInputSnafu {
                name: "results",
            })?;
            let geometry_path = args.geometry.clone().context(MissingInputSnafu {
                name: "geometry",
            })?;
            (
                MapConfig::from_paths(&results_path, &geometry_path),
                results_path,
                geometry_path,
            )
        }
    };

    let mut rules = validate_rules(&config.rules)?;
    if let Some(p) = &args.exclusion_policy {
        rules.exclusion_policy = parse_exclusion_policy(p)?;
    }
    if let Some(p) = &args.duplicate_policy {
        rules.duplicate_policy = parse_duplicate_policy(p)?;
    }

    let mut config = config;
    if let Some(bins) = args.bins {
        let mut settings = config.color_scale.clone().unwrap_or_default();
        settings.bins = Some(bins);
        settings.thresholds = None;
        config.color_scale = Some(settings);
    }

    Ok(RunPlan {
        results_path: args.results.clone().unwrap_or(results_path),
        geometry_path: args.geometry.clone().unwrap_or(geometry_path),
        out: args
            .out
            .clone()
            .or_else(|| config.output_settings.output_file.clone()),
        rules,
        config,
    })
}

/// Runs the join and renders the map. Returns the rendered document.
fn build_map(
    plan: &RunPlan,
    records: &[VoteRecord],
    features: Vec<GeometryFeature>,
    metadata: serde_json::Map<String, JSValue>,
) -> BMapResult<(JSValue, RunSummary)> {
    let categories = plan.config.categories()?;
    let fields = plan.config.geometry_source.feature_fields();
    let scale = build_color_scale(&plan.config.color_scale)?;
    let num_features = features.len();

    let outcome = run_join(
        records,
        features,
        metadata,
        &categories,
        &plan.rules,
        &fields,
    )
    .context(JoinSnafu {})?;

    let (num_missing, num_zero_total) = outcome.exclusion_counts();
    let summary = RunSummary {
        num_records: records.len(),
        num_features,
        num_annotated: outcome.collection.features.len(),
        num_missing,
        num_zero_total,
        num_warnings: outcome.warnings.len(),
    };

    // The leading category drives the colors.
    let perc_field = categories[0].percentage_field();
    let style = |f: &GeometryFeature| style_feature(&scale, &perc_field, f);
    let renderer = StyledGeoJson {
        caption: plan.config.caption(&categories),
        scale: scale.clone(),
    };
    let tooltip = plan.config.tooltip(&categories);
    let js = renderer
        .render(&outcome.collection, &style, &tooltip)
        .context(JoinSnafu {})?;
    Ok((js, summary))
}

fn check_reference(reference_path: &str, pretty_js: &str) -> MapResult<()> {
    let reference = read_reference(reference_path)?;
    let pretty_js_ref = serde_json::to_string_pretty(&reference).context(SerializingMapSnafu {})?;
    if pretty_js_ref != pretty_js {
        warn!("Found differences with the reference map");
        print_diff(pretty_js_ref.as_str(), pretty_js, "\n");
        whatever!("Difference detected between the produced map and the reference map")
    }
    Ok(())
}

pub fn run_map(args: &Args) -> BMapResult<()> {
    let plan = make_plan(args)?;
    info!(
        "Contest: {}, rules: {:?}",
        plan.config.output_settings.contest_name, plan.rules
    );

    let records =
        io_results::read_results_file(&plan.results_path, &plan.config.results_source)?;
    let (features, metadata) = io_geojson::read_geometry_file(&plan.geometry_path)?;

    let (js, summary) = build_map(&plan, &records, features, metadata)?;
    summary.log();

    let pretty_js = serde_json::to_string_pretty(&js).context(SerializingMapSnafu {})?;

    // The reference map, if provided for comparison
    if let Some(reference_path) = &args.reference {
        check_reference(reference_path, &pretty_js)?;
    }

    match &plan.out {
        Some(out) => write_output(out, &pretty_js)?,
        None => info!("No output requested (use --out)"),
    }
    Ok(())
}
