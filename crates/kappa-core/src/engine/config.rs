use crate::core::collision::Sigma;
use crate::core::mesh::{Mesh, MeshError};
use thiserror::Error;

pub const DEFAULT_CUTOFF_FREQUENCY: f64 = 1e-4;
pub const DEFAULT_GV_DELTA_Q: f64 = 1e-4;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for '{name}': {reason}")]
    InvalidValue { name: &'static str, reason: String },

    #[error("Invalid mesh: {0}")]
    Mesh(#[from] MeshError),
}

/// Which grid points a run processes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GridPointSelection {
    /// Every irreducible grid point, or every mesh point when k-star
    /// averaging is disabled.
    #[default]
    All,
    Explicit(Vec<usize>),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PersistenceConfig {
    pub write_gamma: bool,
    pub read_gamma: bool,
    pub input_filename: Option<String>,
    pub output_filename: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RtaConfig {
    pub mesh: Mesh,
    pub grid_points: GridPointSelection,
    pub temperatures: Vec<f64>,
    pub sigmas: Vec<Sigma>,
    pub is_isotope: bool,
    /// Per-species mass variances, carried for whoever builds the
    /// [`IsotopeScattering`](crate::core::isotope::IsotopeScattering)
    /// collaborator. The engine itself only consumes its linewidths; `None`
    /// leaves the collaborator to its natural-abundance defaults.
    pub mass_variances: Option<Vec<f64>>,
    /// Boundary mean free path in micrometres.
    pub cutoff_mfp: Option<f64>,
    pub cutoff_frequency: f64,
    pub no_kappa_stars: bool,
    pub gv_delta_q: Option<f64>,
    pub conversion_factor: f64,
    pub persistence: PersistenceConfig,
    pub log_level: u8,
}

impl RtaConfig {
    pub fn num_temperatures(&self) -> usize {
        self.temperatures.len()
    }

    pub fn num_sigmas(&self) -> usize {
        self.sigmas.len()
    }
}

pub fn default_temperatures() -> Vec<f64> {
    (0..=100).map(|i| i as f64 * 10.0).collect()
}

#[derive(Default)]
pub struct RtaConfigBuilder {
    mesh_numbers: Option<[usize; 3]>,
    mesh_divisors: Option<[usize; 3]>,
    coarse_mesh_shifts: Option<[bool; 3]>,
    grid_points: Option<GridPointSelection>,
    temperatures: Option<Vec<f64>>,
    sigmas: Vec<Sigma>,
    is_isotope: bool,
    mass_variances: Option<Vec<f64>>,
    cutoff_mfp: Option<f64>,
    cutoff_frequency: Option<f64>,
    no_kappa_stars: bool,
    gv_delta_q: Option<Option<f64>>,
    conversion_factor: Option<f64>,
    persistence: PersistenceConfig,
    log_level: u8,
}

impl RtaConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mesh(mut self, numbers: [usize; 3]) -> Self {
        self.mesh_numbers = Some(numbers);
        self
    }
    pub fn mesh_divisors(mut self, divisors: [usize; 3]) -> Self {
        self.mesh_divisors = Some(divisors);
        self
    }
    pub fn coarse_mesh_shifts(mut self, shifts: [bool; 3]) -> Self {
        self.coarse_mesh_shifts = Some(shifts);
        self
    }
    pub fn grid_points(mut self, selection: GridPointSelection) -> Self {
        self.grid_points = Some(selection);
        self
    }
    pub fn temperatures(mut self, temperatures: Vec<f64>) -> Self {
        self.temperatures = Some(temperatures);
        self
    }
    pub fn sigmas(mut self, sigmas: Vec<Sigma>) -> Self {
        self.sigmas = sigmas;
        self
    }
    pub fn isotope(mut self, mass_variances: Option<Vec<f64>>) -> Self {
        self.is_isotope = true;
        self.mass_variances = mass_variances;
        self
    }
    pub fn cutoff_mfp(mut self, micrometres: f64) -> Self {
        self.cutoff_mfp = Some(micrometres);
        self
    }
    pub fn cutoff_frequency(mut self, thz: f64) -> Self {
        self.cutoff_frequency = Some(thz);
        self
    }
    pub fn no_kappa_stars(mut self, disabled: bool) -> Self {
        self.no_kappa_stars = disabled;
        self
    }
    pub fn gv_delta_q(mut self, delta_q: Option<f64>) -> Self {
        self.gv_delta_q = Some(delta_q);
        self
    }
    pub fn conversion_factor(mut self, factor: f64) -> Self {
        self.conversion_factor = Some(factor);
        self
    }
    pub fn write_gamma(mut self, output_filename: Option<String>) -> Self {
        self.persistence.write_gamma = true;
        self.persistence.output_filename = output_filename;
        self
    }
    pub fn read_gamma(mut self, input_filename: Option<String>) -> Self {
        self.persistence.read_gamma = true;
        self.persistence.input_filename = input_filename;
        self
    }
    pub fn log_level(mut self, level: u8) -> Self {
        self.log_level = level;
        self
    }

    pub fn build(self) -> Result<RtaConfig, ConfigError> {
        let numbers = self
            .mesh_numbers
            .ok_or(ConfigError::MissingParameter("mesh"))?;
        let mesh = match self.mesh_divisors {
            Some(divisors) => Mesh::with_divisors(numbers, divisors, self.coarse_mesh_shifts)?,
            None => Mesh::new(numbers)?,
        };

        let conversion_factor = self
            .conversion_factor
            .ok_or(ConfigError::MissingParameter("conversion_factor"))?;
        if !conversion_factor.is_finite() {
            return Err(invalid("conversion_factor", "must be finite"));
        }

        let temperatures = self.temperatures.unwrap_or_else(default_temperatures);
        validate_temperatures(&temperatures)?;

        let sigmas = if self.sigmas.is_empty() {
            vec![Sigma::Tetrahedron]
        } else {
            self.sigmas
        };
        for sigma in &sigmas {
            if let Sigma::Gaussian(width) = sigma {
                if !(*width > 0.0) {
                    return Err(invalid("sigmas", format!("width {} is not positive", width)));
                }
            }
        }

        if let Some(mfp) = self.cutoff_mfp {
            if !(mfp > 0.0) {
                return Err(invalid("cutoff_mfp", format!("{} is not positive", mfp)));
            }
        }

        if let Some(variances) = &self.mass_variances {
            if variances.iter().any(|v| !(*v >= 0.0)) {
                return Err(invalid("mass_variances", "must be non-negative"));
            }
        }

        let grid_points = self.grid_points.unwrap_or_default();
        if let GridPointSelection::Explicit(points) = &grid_points {
            let n = mesh.num_grid_points();
            if let Some(&bad) = points.iter().find(|&&gp| gp >= n) {
                return Err(invalid(
                    "grid_points",
                    format!("grid point {} is outside a mesh of {} points", bad, n),
                ));
            }
        }

        Ok(RtaConfig {
            mesh,
            grid_points,
            temperatures,
            sigmas,
            is_isotope: self.is_isotope,
            mass_variances: self.mass_variances,
            cutoff_mfp: self.cutoff_mfp,
            cutoff_frequency: self.cutoff_frequency.unwrap_or(DEFAULT_CUTOFF_FREQUENCY),
            no_kappa_stars: self.no_kappa_stars,
            gv_delta_q: self.gv_delta_q.unwrap_or(Some(DEFAULT_GV_DELTA_Q)),
            conversion_factor,
            persistence: self.persistence,
            log_level: self.log_level,
        })
    }
}

fn invalid(name: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        name,
        reason: reason.into(),
    }
}

fn validate_temperatures(temperatures: &[f64]) -> Result<(), ConfigError> {
    if temperatures.is_empty() {
        return Err(invalid("temperatures", "at least one temperature is required"));
    }
    if temperatures.iter().any(|t| !t.is_finite() || *t < 0.0) {
        return Err(invalid("temperatures", "must be finite and non-negative"));
    }
    if temperatures.windows(2).any(|w| w[1] < w[0]) {
        return Err(invalid("temperatures", "must be in ascending order"));
    }
    Ok(())
}
