use clap::Parser;

/// This is an instant-runoff tabulation program for fully ranked ballots.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The file containing the election description in JSON: ballot sources,
    /// candidates and rules. See the manual of the instant_runoff crate for the format.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,
    /// (file path) A summary in JSON format produced by an earlier run. If provided, the run fails when the
    /// computed summary differs from it, and the differences are printed.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) Where to write the JSON summary of the count. Takes precedence over the
    /// outputDirectory of the configuration file.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) The file containing the ballots. Setting this option overrides the ballot sources
    /// that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default json) The type of the input: json, csv_likert or xlsx_likert.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (list of names or not specified) The candidates, in the order used to display the results and to
    /// break ties. If not specified, the order of the first ballot is used.
    #[clap(long, value_parser)]
    pub candidates: Option<Vec<String>>,

    /// When using an Excel file, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// Turns on debug logging. RUST_LOG takes precedence when set.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
