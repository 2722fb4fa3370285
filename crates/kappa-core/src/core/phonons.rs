use nalgebra::Vector3;
use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

/// Harmonic phonon data: frequencies from the eigensolver and group velocities
/// from its finite-difference derivative.
pub trait PhononSource {
    /// Number of bands, three per atom in the primitive cell.
    fn num_band(&self) -> usize;

    /// Frequencies (THz) at a grid point, or `None` if the point is unknown.
    fn frequencies(&self, grid_point: usize) -> Option<Vec<f64>>;

    /// Group velocities (THz·Å) at a grid point. `delta_q` is the finite
    /// difference step handed to the derivative, when one is used.
    fn group_velocities(&self, grid_point: usize, delta_q: Option<f64>)
    -> Option<Vec<Vector3<f64>>>;
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum PhononTableError {
    #[error("Phonon table is empty")]
    Empty,

    #[error("Grid point {grid_point} has {found} bands, expected {expected}")]
    BandMismatch {
        grid_point: usize,
        expected: usize,
        found: usize,
    },

    #[error("Grid point {0} appears more than once in the phonon table")]
    Duplicate(usize),
}

/// One grid point of a phonon table as it appears in input files.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct PhononTableEntry {
    pub grid_point: usize,
    pub frequencies: Vec<f64>,
    pub group_velocities: Vec<[f64; 3]>,
}

/// Precomputed phonons keyed by grid point.
#[derive(Debug, Clone, Default)]
pub struct TabulatedPhonons {
    num_band: usize,
    frequencies: HashMap<usize, Vec<f64>>,
    group_velocities: HashMap<usize, Vec<Vector3<f64>>>,
}

impl TabulatedPhonons {
    pub fn from_entries(entries: Vec<PhononTableEntry>) -> Result<Self, PhononTableError> {
        let num_band = entries
            .first()
            .map(|e| e.frequencies.len())
            .ok_or(PhononTableError::Empty)?;

        let mut table = Self {
            num_band,
            ..Self::default()
        };
        for entry in entries {
            table.insert(
                entry.grid_point,
                entry.frequencies,
                entry
                    .group_velocities
                    .into_iter()
                    .map(Vector3::from)
                    .collect(),
            )?;
        }
        Ok(table)
    }

    pub fn insert(
        &mut self,
        grid_point: usize,
        frequencies: Vec<f64>,
        group_velocities: Vec<Vector3<f64>>,
    ) -> Result<(), PhononTableError> {
        if self.frequencies.is_empty() && self.num_band == 0 {
            self.num_band = frequencies.len();
        }
        for found in [frequencies.len(), group_velocities.len()] {
            if found != self.num_band {
                return Err(PhononTableError::BandMismatch {
                    grid_point,
                    expected: self.num_band,
                    found,
                });
            }
        }
        if self.frequencies.contains_key(&grid_point) {
            return Err(PhononTableError::Duplicate(grid_point));
        }
        self.frequencies.insert(grid_point, frequencies);
        self.group_velocities.insert(grid_point, group_velocities);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }
}

impl PhononSource for TabulatedPhonons {
    fn num_band(&self) -> usize {
        self.num_band
    }

    fn frequencies(&self, grid_point: usize) -> Option<Vec<f64>> {
        self.frequencies.get(&grid_point).cloned()
    }

    fn group_velocities(
        &self,
        grid_point: usize,
        _delta_q: Option<f64>,
    ) -> Option<Vec<Vector3<f64>>> {
        self.group_velocities.get(&grid_point).cloned()
    }
}
