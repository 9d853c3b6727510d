use clap::Parser;

/// Leadership-fit analysis over mentorship-program survey responses.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The JSON run configuration: group catalog, leadership
    /// phrases, topic-affinity table, column mapping, lexicons and output
    /// paths. See the documentation for the file format.
    #[clap(short, long, value_parser)]
    pub config: String,

    /// (file path or empty) If specified, overrides the survey CSV path
    /// given in the configuration file.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the per-participant
    /// insights are written in CSV format to the given location,
    /// overriding the path in the configuration file.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) If specified, the restricted id-to-name PII
    /// mapping is written to the given location. Handle with care; never
    /// publish this file.
    #[clap(long, value_parser)]
    pub pii_out: Option<String>,

    /// (file path) A reference run summary in JSON format. If provided,
    /// leadfit checks that the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the
    /// standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
