use crate::cli::{RtaArgs, parse_sigma};
use crate::error::{CliError, Result};
use kappa_rta::core::collision::Sigma;
use kappa_rta::engine::config::{GridPointSelection, RtaConfig, RtaConfigBuilder};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialMeshConfig {
    numbers: Option<[usize; 3]>,
    divisors: Option<[usize; 3]>,
    coarse_shifts: Option<[bool; 3]>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialIsotopeConfig {
    mass_variances: Option<Vec<f64>>,
}

/// A `sigmas` entry: a Gaussian width in THz or the name of a method.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
enum SigmaEntry {
    Width(f64),
    Method(String),
}

impl SigmaEntry {
    fn into_sigma(self) -> Result<Sigma> {
        match self {
            SigmaEntry::Width(width) => Ok(Sigma::Gaussian(width)),
            SigmaEntry::Method(name) => parse_sigma(&name).map_err(CliError::Config),
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialPersistenceConfig {
    write_gamma: Option<bool>,
    input_filename: Option<String>,
    output_filename: Option<String>,
}

/// The run file as written by the user; every key is optional so CLI
/// arguments can fill or override it.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct PartialRtaConfig {
    mesh: Option<PartialMeshConfig>,
    grid_points: Option<Vec<usize>>,
    temperatures: Option<Vec<f64>>,
    sigmas: Option<Vec<SigmaEntry>>,
    isotope: Option<PartialIsotopeConfig>,
    cutoff_mfp: Option<f64>,
    cutoff_frequency: Option<f64>,
    no_kappa_stars: Option<bool>,
    gv_delta_q: Option<f64>,
    log_level: Option<u8>,
    persistence: Option<PartialPersistenceConfig>,
}

impl PartialRtaConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Merges CLI arguments on top of the file values and validates the result.
    ///
    /// Linewidths are always read from the store, since the command line tool
    /// carries no collision engine.
    pub fn merge_with_cli(
        self,
        args: &RtaArgs,
        conversion_factor: f64,
        verbosity: u8,
    ) -> Result<RtaConfig> {
        let mesh = self.mesh.unwrap_or_default();
        let numbers = mesh
            .numbers
            .ok_or_else(|| CliError::Config("`mesh.numbers` is required.".to_string()))?;

        let mut builder = RtaConfigBuilder::new()
            .mesh(numbers)
            .conversion_factor(conversion_factor)
            .log_level(self.log_level.unwrap_or(verbosity));
        if let Some(divisors) = mesh.divisors {
            builder = builder.mesh_divisors(divisors);
        }
        if let Some(shifts) = mesh.coarse_shifts {
            builder = builder.coarse_mesh_shifts(shifts);
        }
        if let Some(points) = self.grid_points {
            builder = builder.grid_points(GridPointSelection::Explicit(points));
        }

        let temperatures = if args.temperatures.is_empty() {
            self.temperatures
        } else {
            Some(args.temperatures.clone())
        };
        if let Some(temperatures) = temperatures {
            builder = builder.temperatures(temperatures);
        }

        let sigmas = if args.sigmas.is_empty() {
            self.sigmas
                .unwrap_or_default()
                .into_iter()
                .map(SigmaEntry::into_sigma)
                .collect::<Result<Vec<_>>>()?
        } else {
            args.sigmas.clone()
        };
        builder = builder.sigmas(sigmas);

        if let Some(isotope) = self.isotope {
            builder = builder.isotope(isotope.mass_variances);
        }
        if let Some(mfp) = args.cutoff_mfp.or(self.cutoff_mfp) {
            builder = builder.cutoff_mfp(mfp);
        }
        if let Some(cutoff) = self.cutoff_frequency {
            builder = builder.cutoff_frequency(cutoff);
        }
        if let Some(delta_q) = self.gv_delta_q {
            builder = builder.gv_delta_q(Some(delta_q));
        }
        builder = builder.no_kappa_stars(args.no_kappa_stars || self.no_kappa_stars.unwrap_or(false));

        let persistence = self.persistence.unwrap_or_default();
        let input_filename = args.input_filename.clone().or(persistence.input_filename);
        builder = builder.read_gamma(input_filename);
        if args.write_gamma || persistence.write_gamma.unwrap_or(false) {
            builder = builder.write_gamma(args.output_filename.clone().or(persistence.output_filename));
        }

        Ok(builder.build()?)
    }
}
