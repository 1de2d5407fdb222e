use clap::Parser;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    name = "vscreen",
    version,
    about = "vscreen - A command-line virtual screening pipeline: filter, rank by similarity, dock and rescore small molecules.",
    help_template = HELP_TEMPLATE,
)]
pub struct Cli {
    // --- Inputs ---
    /// One or more ligand files (format taken from the extension, `.gz` allowed).
    #[arg(required = true, value_name = "FILE")]
    pub inputs: Vec<PathBuf>,

    /// Chemical toolkit backend: 'ob' or 'rdk'. Overridden by VSCREEN_TOOLKIT.
    #[arg(long, value_name = "NAME", default_value = "ob")]
    pub toolkit: String,

    /// Number of worker threads; -1 uses every logical core.
    #[arg(short = 'n', long = "n_cpu", value_name = "INT", allow_negative_numbers = true)]
    pub n_cpu: Option<i64>,

    /// Number of molecules processed per parallel batch.
    #[arg(short = 'c', long, value_name = "INT")]
    pub chunksize: Option<usize>,

    /// Input format, overriding the file extension.
    #[arg(short = 'i', value_name = "FORMAT")]
    pub input_format: Option<String>,

    // --- Output ---
    /// Output format, overriding the output file extension.
    #[arg(short = 'o', value_name = "FORMAT")]
    pub output_format: Option<String>,

    /// Output file; results go to standard output when absent.
    #[arg(short = 'O', long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Data field to include as a CSV column (repeatable).
    #[arg(long = "field", value_name = "NAME")]
    pub fields: Vec<String>,

    // --- Filtering ---
    /// Drug-likeness filter 'ro5' or 'ro3', optionally 'name:N' to allow N violations (repeatable).
    #[arg(long = "filter", value_name = "NAME")]
    pub filters: Vec<String>,

    // --- Similarity ---
    /// Similarity method: ifp, sifp, usr, usr_cat or electroshape (repeatable).
    #[arg(long = "similarity", value_name = "METHOD")]
    pub similarity: Vec<String>,

    /// Minimum similarity a ligand needs to be kept.
    #[arg(long, value_name = "FLOAT", default_value_t = 0.9)]
    pub cutoff: f64,

    /// Query molecule file for similarity searches (repeatable).
    #[arg(long = "query", value_name = "PATH")]
    pub queries: Vec<PathBuf>,

    // --- Docking ---
    /// Docking engine: 'autodock_vina'.
    #[arg(long, value_name = "ENGINE")]
    pub dock: Option<String>,

    /// Receptor structure used for docking, scoring and interaction fingerprints.
    #[arg(long, value_name = "PATH")]
    pub receptor: Option<PathBuf>,

    /// Reference ligand that defines the docking box.
    #[arg(long = "auto_ligand", value_name = "PATH")]
    pub auto_ligand: Option<PathBuf>,

    /// Docking box center as "(x,y,z)".
    #[arg(long, value_name = "TRIPLE", allow_hyphen_values = true)]
    pub center: Option<String>,

    /// Docking box size as "(x,y,z)".
    #[arg(long, value_name = "TRIPLE", allow_hyphen_values = true)]
    pub size: Option<String>,

    /// Docking exhaustiveness.
    #[arg(long, value_name = "INT", default_value_t = 8)]
    pub exhaustiveness: u32,

    /// Random seed passed to the docking engine.
    #[arg(long, value_name = "INT", allow_negative_numbers = true)]
    pub seed: Option<i64>,

    /// Path of the AutoDock Vina executable (searched on PATH otherwise).
    #[arg(long, value_name = "PATH")]
    pub vina: Option<PathBuf>,

    // --- Scoring ---
    /// Built-in scoring function, e.g. 'rfscore_v2_pdbbind2015' or 'autodock_vina' (repeatable).
    #[arg(long = "score", value_name = "NAME")]
    pub scores: Vec<String>,

    /// Previously saved scoring function file (repeatable).
    #[arg(long = "score_file", value_name = "PATH")]
    pub score_files: Vec<PathBuf>,

    /// Directory holding installed scoring functions. Overrides VSCREEN_DATA_DIR.
    #[arg(long, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,

    // --- General ---
    /// Path to an optional configuration file in TOML format.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all log output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Do not draw a progress indicator.
    #[arg(long)]
    pub no_progress: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_repeatable_and_underscored_flags() {
        let cli = Cli::parse_from([
            "vscreen",
            "a.sdf",
            "b.mol2.gz",
            "-n",
            "-1",
            "--filter",
            "ro5",
            "--filter",
            "ro3:1",
            "--score_file",
            "model.json",
            "--auto_ligand",
            "ref.sdf",
            "--center",
            "(-1.5,2,3)",
            "-O",
            "out.csv",
            "-o",
            "csv",
        ]);
        assert_eq!(cli.inputs, [PathBuf::from("a.sdf"), PathBuf::from("b.mol2.gz")]);
        assert_eq!(cli.n_cpu, Some(-1));
        assert_eq!(cli.filters, ["ro5", "ro3:1"]);
        assert_eq!(cli.score_files, [PathBuf::from("model.json")]);
        assert_eq!(cli.auto_ligand, Some(PathBuf::from("ref.sdf")));
        assert_eq!(cli.center.as_deref(), Some("(-1.5,2,3)"));
        assert_eq!(cli.output_format.as_deref(), Some("csv"));
        assert_eq!(cli.cutoff, 0.9);
        assert_eq!(cli.exhaustiveness, 8);
        assert_eq!(cli.toolkit, "ob");
    }

    #[test]
    fn requires_at_least_one_input() {
        assert!(Cli::try_parse_from(["vscreen", "--filter", "ro5"]).is_err());
    }
}
