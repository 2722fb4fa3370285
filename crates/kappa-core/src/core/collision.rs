//! Interface to the three-phonon collision collaborator.
//!
//! Computing interaction strengths, enumerating triplets and building
//! integration weights are done elsewhere; the conductivity engine only drives
//! the collaborator through this trait, one grid point at a time.

use std::fmt;
use thiserror::Error;

/// Broadening used when integrating over the Brillouin zone.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Sigma {
    /// Linear tetrahedron method; parameter free.
    #[default]
    Tetrahedron,
    /// Gaussian smearing of the given width (THz).
    Gaussian(f64),
}

impl Sigma {
    pub fn width(&self) -> Option<f64> {
        match self {
            Sigma::Tetrahedron => None,
            Sigma::Gaussian(width) => Some(*width),
        }
    }

    pub fn from_width(width: Option<f64>) -> Self {
        match width {
            Some(w) => Sigma::Gaussian(w),
            None => Sigma::Tetrahedron,
        }
    }
}

impl fmt::Display for Sigma {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sigma::Tetrahedron => write!(f, "tetrahedron method"),
            Sigma::Gaussian(width) => write!(f, "sigma={}", width),
        }
    }
}

#[derive(Debug, Error)]
pub enum CollisionError {
    #[error("Collision engine is not available: {0}")]
    Unavailable(String),

    #[error("Collision calculation failed at grid point {grid_point}: {message}")]
    Failed { grid_point: usize, message: String },
}

pub trait CollisionEngine {
    /// Selects the grid point and prepares its triplets. Returns the number of triplets.
    fn set_grid_point(&mut self, grid_point: usize) -> Result<usize, CollisionError>;

    /// Computes the three-phonon interaction strengths for the selected grid point.
    fn run_interaction(&mut self) -> Result<(), CollisionError>;

    /// Selects the broadening. For [`Sigma::Tetrahedron`] this is where
    /// integration weights are built.
    fn set_sigma(&mut self, sigma: Sigma) -> Result<(), CollisionError>;

    /// Per-band imaginary self-energy (linewidth, THz) at `temperature` (K).
    fn imag_self_energy(&mut self, temperature: f64) -> Result<Vec<f64>, CollisionError>;

    /// Per-band mean-square interaction strength of the last interaction run.
    fn mean_square_strength(&self) -> Vec<f64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigma_width_round_trips() {
        assert_eq!(Sigma::from_width(None), Sigma::Tetrahedron);
        assert_eq!(Sigma::from_width(Some(0.1)).width(), Some(0.1));
    }

    #[test]
    fn sigma_display_names_the_method() {
        assert_eq!(Sigma::Tetrahedron.to_string(), "tetrahedron method");
        assert_eq!(Sigma::Gaussian(0.2).to_string(), "sigma=0.2");
    }
}
