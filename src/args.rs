use clap::Parser;

/// This is a coalition power calculator for weighted elections: the exact Banzhaf
/// power index and Monte Carlo simulations of delegate races.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The file containing the roster and the rules, in JSON format.
    /// For more information about the file format, read the manual of the power_index crate.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (primary or electoral) A built-in roster. It comes with its own quota.
    /// Setting this option overrides the roster of the --config option.
    #[clap(short, long, value_parser)]
    pub preset: Option<String>,

    /// (banzhaf, simulate or scenario) The report to compute.
    #[clap(short, long, value_parser)]
    pub mode: Option<String>,

    /// The weight needed to win. Required unless a preset is used.
    #[clap(short, long, value_parser)]
    pub quota: Option<u32>,

    /// (default 10000) The number of trials of the simulations.
    #[clap(short, long, value_parser)]
    pub trials: Option<u64>,

    /// If specified, the simulations are reproducible.
    #[clap(long, value_parser)]
    pub seed: Option<u64>,

    /// (ID=A or ID=B, repeatable) Forces the outcome of an entity in the scenario mode.
    #[clap(short, long, value_parser)]
    pub force: Vec<String>,

    /// (file path, 'stdout' or empty) If specified, the summary will be written in JSON format to the given
    /// location. Setting this option overrides the output directory that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference file containing a summary in JSON format. If provided, coalsim will
    /// check that the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
