use clap::{Args, Parser, Subcommand};
use kappa_rta::core::collision::Sigma;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "The kappa-rta developers",
    version,
    about = "kappa - Lattice thermal conductivity in the relaxation-time approximation from three-phonon linewidths.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute kappa from tabulated phonons and stored linewidths.
    Rta(RtaArgs),
}

/// Arguments for the `rta` subcommand.
#[derive(Args, Debug)]
pub struct RtaArgs {
    // --- Inputs ---
    /// Path to the run configuration file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Path to the crystal and phonon data in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub phonons: PathBuf,

    /// Directory holding linewidth and conductivity records.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub store: PathBuf,

    // --- Persistence Overrides ---
    /// Read linewidths from the store. Always on, since no collision engine is bundled.
    #[arg(long)]
    pub read_gamma: bool,

    /// Write per-grid-point records while iterating.
    #[arg(long)]
    pub write_gamma: bool,

    /// Label of the records to read.
    #[arg(long, value_name = "LABEL")]
    pub input_filename: Option<String>,

    /// Label of the records to write.
    #[arg(long, value_name = "LABEL")]
    pub output_filename: Option<String>,

    // --- Physics Overrides ---
    /// Boundary mean free path in micrometres.
    #[arg(long, value_name = "UM")]
    pub cutoff_mfp: Option<f64>,

    /// Disable k-star averaging; every mesh point is treated separately.
    #[arg(long)]
    pub no_kappa_stars: bool,

    /// Temperatures in K, overriding the config file.
    #[arg(short = 't', long = "temperatures", value_name = "K", num_args(1..))]
    pub temperatures: Vec<f64>,

    /// Gaussian smearing widths in THz, or `tetrahedron`, overriding the config file.
    /// Without any, the tetrahedron method is used.
    #[arg(short = 's', long = "sigma", value_name = "THZ", num_args(1..), value_parser = parse_sigma)]
    pub sigmas: Vec<Sigma>,
}

/// Parses one broadening: a positive width in THz, or `tetrahedron` (`thm`).
pub fn parse_sigma(value: &str) -> Result<Sigma, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "tetrahedron" | "thm" => Ok(Sigma::Tetrahedron),
        other => other
            .parse::<f64>()
            .map(Sigma::Gaussian)
            .map_err(|_| format!("'{}' is neither a width in THz nor 'tetrahedron'", value)),
    }
}
