use super::collision::{CollisionError, Sigma};

/// Phonon-isotope scattering collaborator.
///
/// Implementors are built from the per-species mass variances; the resulting
/// linewidths are temperature independent.
pub trait IsotopeScattering {
    /// Per-band isotope linewidth (THz) at `grid_point` for the given broadening.
    fn gamma(&mut self, grid_point: usize, sigma: Sigma) -> Result<Vec<f64>, CollisionError>;
}
