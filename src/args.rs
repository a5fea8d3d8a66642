use clap::Parser;

/// This program joins precinct election results with precinct boundaries and
/// produces a choropleth map.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON file describing the inputs, the categories and the rules.
    /// See the manual of the precinct_join crate for all the options.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) The results file (semicolon-delimited, one row per candidate per precinct).
    /// Setting this option overrides the path that may be specified with the --config option.
    #[clap(long, value_parser)]
    pub results: Option<String>,

    /// (file path) The GeoJSON file with the precinct boundaries.
    /// Setting this option overrides the path that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub geometry: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the styled map will be written in GeoJSON format to the given
    /// location. Setting this option overrides the path that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference file containing the expected map in JSON format. If provided, precinctmap will
    /// check that the produced map matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (excludeOnMissing or failFast) What to do with a precinct that is missing a result.
    #[clap(long, value_parser)]
    pub exclusion_policy: Option<String>,

    /// (reject or keepFirst) What to do when two results share the same precinct and party.
    #[clap(long, value_parser)]
    pub duplicate_policy: Option<String>,

    /// (default 11) The number of color bins of equal width between 0 and 100.
    #[clap(long, value_parser)]
    pub bins: Option<usize>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
