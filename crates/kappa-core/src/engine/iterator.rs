use super::config::{GridPointSelection, RtaConfig};
use super::context::Collaborators;
use super::error::EngineError;
use super::report::GridPointListing;
use super::restart::RestoredLinewidths;
use super::state::{GridData, GridPointState, LinewidthSource};
use crate::core::collision::CollisionEngine;
use crate::core::heat_capacity::mode_heat_capacities;
use crate::core::isotope::IsotopeScattering;
use crate::core::phonons::PhononSource;
use crate::core::symmetry::SymmetryMapper;
use ndarray::{ArrayView1, s};
use std::collections::HashMap;
use tracing::{debug, info};

/// Walks the requested grid points one at a time, filling linewidths, heat
/// capacities and group velocities into the owned [`GridData`].
///
/// Each call to [`Iterator::next`] completes exactly one grid point and yields
/// its index in the run. The sequence is finite and cannot be rewound;
/// stopping early leaves the remaining points pending.
pub struct GridIterator<'a> {
    config: &'a RtaConfig,
    collision: &'a mut dyn CollisionEngine,
    phonons: &'a dyn PhononSource,
    symmetry: &'a dyn SymmetryMapper,
    isotope: Option<&'a mut dyn IsotopeScattering>,
    data: GridData,
    cursor: usize,
    isotope_restored: bool,
}

impl<'a> GridIterator<'a> {
    pub fn new(config: &'a RtaConfig, collaborators: Collaborators<'a>) -> Result<Self, EngineError> {
        let Collaborators {
            collision,
            phonons,
            symmetry,
            isotope,
        } = collaborators;

        if config.is_isotope && isotope.is_none() {
            return Err(EngineError::Initialization(
                "isotope scattering requested but no isotope collaborator was given".to_string(),
            ));
        }
        if symmetry.mesh().numbers() != config.mesh.numbers() {
            return Err(EngineError::Initialization(format!(
                "symmetry mesh {:?} differs from configured mesh {:?}",
                symmetry.mesh().numbers(),
                config.mesh.numbers()
            )));
        }

        let (grid_points, weights) = resolve_grid_points(config, symmetry);
        if grid_points.is_empty() {
            return Err(EngineError::Initialization(
                "no grid points to process".to_string(),
            ));
        }
        let qpoints = grid_points
            .iter()
            .map(|&gp| config.mesh.qpoint(gp))
            .collect();

        let num_band = phonons.num_band();
        let mut data = GridData::allocate(
            grid_points,
            weights,
            qpoints,
            config.temperatures.clone(),
            config.sigmas.clone(),
            num_band,
            config.is_isotope,
        );
        for (i, &gp) in data.grid_points().to_vec().iter().enumerate() {
            let frequencies = phonons
                .frequencies(gp)
                .ok_or(EngineError::MissingPhonons { grid_point: gp })?;
            check_bands("frequencies", gp, num_band, frequencies.len())?;
            data.frequencies
                .row_mut(i)
                .assign(&ArrayView1::from(&frequencies));
        }

        info!(
            grid_points = data.num_grid_points(),
            bands = num_band,
            temperatures = config.num_temperatures(),
            sigmas = config.num_sigmas(),
            "Grid iteration prepared."
        );

        Ok(Self {
            config,
            collision,
            phonons,
            symmetry,
            isotope: if config.is_isotope { isotope } else { None },
            data,
            cursor: 0,
            isotope_restored: false,
        })
    }

    /// Installs persisted linewidths. Must be called before the first step.
    pub fn restore(&mut self, restored: RestoredLinewidths) -> Result<(), EngineError> {
        if self.cursor > 0 {
            return Err(EngineError::Internal(
                "linewidths can only be restored before iteration starts".to_string(),
            ));
        }
        if restored.gamma.dim() != self.data.gamma.dim() {
            return Err(EngineError::Internal(format!(
                "restored gamma has shape {:?}, expected {:?}",
                restored.gamma.dim(),
                self.data.gamma.dim()
            )));
        }
        self.data.gamma = restored.gamma;
        // Isotope linewidths are only taken when this run scatters off isotopes.
        if let (Some(slot), Some(gamma_isotope)) =
            (self.data.gamma_isotope.as_mut(), restored.gamma_isotope)
        {
            *slot = gamma_isotope;
            self.isotope_restored = true;
        }
        for state in &mut self.data.states {
            *state = GridPointState::Loaded;
        }
        debug!(
            isotope = self.isotope_restored,
            "Restored linewidths for all grid points."
        );
        Ok(())
    }

    pub fn data(&self) -> &GridData {
        &self.data
    }

    pub fn into_data(self) -> GridData {
        self.data
    }

    pub fn grid_points(&self) -> &[usize] {
        self.data.grid_points()
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.data.num_grid_points()
    }

    /// Completes the next grid point and returns its index in the run.
    pub fn advance(&mut self) -> Option<Result<usize, EngineError>> {
        if self.is_finished() {
            return None;
        }
        let i = self.cursor;
        match self.run_at_grid_point(i) {
            Ok(()) => {
                self.cursor += 1;
                Some(Ok(i))
            }
            Err(e) => {
                self.cursor = self.data.num_grid_points();
                Some(Err(e))
            }
        }
    }

    fn run_at_grid_point(&mut self, i: usize) -> Result<(), EngineError> {
        let grid_point = self.data.grid_points()[i];
        let num_band = self.data.num_band();

        let linewidths = match self.data.states[i] {
            GridPointState::Pending => {
                self.compute_gamma(i, grid_point)?;
                LinewidthSource::Computed
            }
            GridPointState::Loaded => LinewidthSource::Persisted,
            GridPointState::Computed { .. } => {
                return Err(EngineError::Internal(format!(
                    "grid point {} was already computed",
                    grid_point
                )));
            }
        };

        if !self.isotope_restored {
            if let Some(isotope) = self.isotope.as_deref_mut() {
                for (j, &sigma) in self.config.sigmas.iter().enumerate() {
                    let gamma = isotope.gamma(grid_point, sigma)?;
                    check_bands("gamma_isotope", grid_point, num_band, gamma.len())?;
                    if let Some(gamma_isotope) = self.data.gamma_isotope.as_mut() {
                        gamma_isotope
                            .slice_mut(s![j, i, ..])
                            .assign(&ArrayView1::from(&gamma));
                    }
                }
            }
        }

        let frequencies = self.data.frequencies_at(i).to_vec();
        let cv = mode_heat_capacities(
            &frequencies,
            &self.config.temperatures,
            self.config.cutoff_frequency,
        );
        self.data.heat_capacity.slice_mut(s![i, .., ..]).assign(&cv);

        let velocities = self
            .phonons
            .group_velocities(grid_point, self.config.gv_delta_q)
            .ok_or(EngineError::MissingPhonons { grid_point })?;
        check_bands("group_velocities", grid_point, num_band, velocities.len())?;
        for (l, v) in velocities.iter().enumerate() {
            for c in 0..3 {
                self.data.group_velocities[[i, l, c]] = v[c];
            }
        }

        self.data.states[i] = GridPointState::Computed { linewidths };

        if self.config.log_level > 0 {
            let listing = GridPointListing::new(
                &self.data,
                i,
                self.config.gv_delta_q,
                (self.config.log_level > 1 && !self.config.no_kappa_stars)
                    .then_some(self.symmetry),
            );
            info!(
                "Grid point {} ({}/{}), q = ({:.4} {:.4} {:.4})\n{}",
                grid_point,
                i + 1,
                self.data.num_grid_points(),
                self.data.qpoints()[i][0],
                self.data.qpoints()[i][1],
                self.data.qpoints()[i][2],
                listing
            );
        }
        Ok(())
    }

    fn compute_gamma(&mut self, i: usize, grid_point: usize) -> Result<(), EngineError> {
        let num_band = self.data.num_band();
        let num_triplets = self.collision.set_grid_point(grid_point)?;
        debug!(grid_point, num_triplets, "Calculating interaction...");
        self.collision.run_interaction()?;

        for (j, &sigma) in self.config.sigmas.iter().enumerate() {
            debug!(grid_point, "Calculating Gamma of ph-ph with {}", sigma);
            self.collision.set_sigma(sigma)?;
            for (k, &t) in self.config.temperatures.iter().enumerate() {
                let gamma = self.collision.imag_self_energy(t)?;
                check_bands("gamma", grid_point, num_band, gamma.len())?;
                self.data
                    .gamma
                    .slice_mut(s![j, k, i, ..])
                    .assign(&ArrayView1::from(&gamma));
            }
        }

        let mspp = self.collision.mean_square_strength();
        check_bands("mean_square_strength", grid_point, num_band, mspp.len())?;
        self.data
            .mean_square_strength
            .row_mut(i)
            .assign(&ArrayView1::from(&mspp));
        Ok(())
    }
}

impl Iterator for GridIterator<'_> {
    type Item = Result<usize, EngineError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.data.num_grid_points() - self.cursor;
        (remaining, Some(remaining))
    }
}

fn resolve_grid_points(
    config: &RtaConfig,
    symmetry: &dyn SymmetryMapper,
) -> (Vec<usize>, Vec<usize>) {
    match (&config.grid_points, config.no_kappa_stars) {
        (GridPointSelection::All, true) => {
            let n = config.mesh.num_grid_points();
            ((0..n).collect(), vec![1; n])
        }
        (GridPointSelection::All, false) => symmetry.irreducible_grid_points().into_iter().unzip(),
        (GridPointSelection::Explicit(points), no_kappa_stars) => {
            let weights: HashMap<usize, usize> = if no_kappa_stars {
                HashMap::new()
            } else {
                symmetry.irreducible_grid_points().into_iter().collect()
            };
            let point_weights = points
                .iter()
                .map(|gp| weights.get(gp).copied().unwrap_or(1))
                .collect();
            (points.clone(), point_weights)
        }
    }
}

fn check_bands(
    quantity: &'static str,
    grid_point: usize,
    expected: usize,
    found: usize,
) -> Result<(), EngineError> {
    if expected != found {
        return Err(EngineError::BandMismatch {
            quantity,
            grid_point,
            expected,
            found,
        });
    }
    Ok(())
}
