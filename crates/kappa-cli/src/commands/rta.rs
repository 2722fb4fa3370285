use crate::cli::RtaArgs;
use crate::config::PartialRtaConfig;
use crate::error::Result;
use crate::input::PhononsFile;
use crate::utils::progress::CliProgressHandler;
use kappa_rta::{
    core::{
        collision::{CollisionEngine, CollisionError, Sigma},
        io::toml_store::TomlStore,
        isotope::IsotopeScattering,
    },
    engine::{context::Collaborators, progress::ProgressReporter, report::KappaTable},
    workflows,
};
use tracing::info;

/// Stands in for the collision and isotope calculators, which are not part of
/// this binary. Every grid point must be restored from the store.
struct StoredLinewidthsOnly;

const UNAVAILABLE: &str = "linewidths must be read from the store";

impl CollisionEngine for StoredLinewidthsOnly {
    fn set_grid_point(&mut self, grid_point: usize) -> std::result::Result<usize, CollisionError> {
        Err(CollisionError::Unavailable(format!(
            "grid point {}: {}",
            grid_point, UNAVAILABLE
        )))
    }

    fn run_interaction(&mut self) -> std::result::Result<(), CollisionError> {
        Err(CollisionError::Unavailable(UNAVAILABLE.to_string()))
    }

    fn set_sigma(&mut self, _sigma: Sigma) -> std::result::Result<(), CollisionError> {
        Err(CollisionError::Unavailable(UNAVAILABLE.to_string()))
    }

    fn imag_self_energy(&mut self, _temperature: f64) -> std::result::Result<Vec<f64>, CollisionError> {
        Err(CollisionError::Unavailable(UNAVAILABLE.to_string()))
    }

    fn mean_square_strength(&self) -> Vec<f64> {
        Vec::new()
    }
}

impl IsotopeScattering for StoredLinewidthsOnly {
    fn gamma(&mut self, grid_point: usize, _sigma: Sigma) -> std::result::Result<Vec<f64>, CollisionError> {
        Err(CollisionError::Unavailable(format!(
            "isotope linewidths at grid point {}: {}",
            grid_point, UNAVAILABLE
        )))
    }
}

pub fn run(args: RtaArgs, verbosity: u8) -> Result<()> {
    info!("Loading phonon data from {:?}", &args.phonons);
    let phonons_file = PhononsFile::from_file(&args.phonons)?;
    let conversion_factor = phonons_file.conversion_factor()?;

    let partial_config = PartialRtaConfig::from_file(&args.config)?;
    info!("Merging configuration from file and CLI arguments...");
    let config = partial_config.merge_with_cli(&args, conversion_factor, verbosity)?;

    let crystal = phonons_file.into_crystal(config.mesh)?;
    let mut store = TomlStore::new(&args.store);
    let mut collision = StoredLinewidthsOnly;
    let mut isotope = StoredLinewidthsOnly;

    let mut collaborators = Collaborators::new(&mut collision, &crystal.phonons, &crystal.symmetry);
    if config.is_isotope {
        collaborators = collaborators.with_isotope(&mut isotope);
    }

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Computing lattice thermal conductivity...");
    let result = workflows::rta::run(&config, collaborators, Some(&mut store), &reporter)?;

    match &result.conductivity {
        Some(conductivity) => {
            println!("{}", KappaTable::new(conductivity));
            println!(
                "Conductivity written to: {}",
                store.directory().display()
            );
        }
        None => {
            println!(
                "Processed {} grid point(s); the conductivity needs every irreducible grid point.",
                result.data.num_grid_points()
            );
        }
    }
    Ok(())
}
