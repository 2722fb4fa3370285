use crate::core::collision::Sigma;
use nalgebra::Vector3;
use ndarray::{Array2, Array3, Array4, ArrayView1, ArrayView2, s};

/// Where the phonon-phonon linewidths of a grid point came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinewidthSource {
    Persisted,
    Computed,
}

/// Progress of one grid point through a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GridPointState {
    /// Nothing has been computed or restored yet.
    #[default]
    Pending,
    /// Linewidths were restored from persistence; heat capacities and group
    /// velocities are still missing.
    Loaded,
    /// Every per-point array is populated.
    Computed { linewidths: LinewidthSource },
}

impl GridPointState {
    pub fn is_complete(&self) -> bool {
        matches!(self, GridPointState::Computed { .. })
    }
}

/// Per-grid-point arrays of a run, allocated once and filled slot by slot.
///
/// Index conventions: `gamma[sigma, temperature, point, band]`,
/// `gamma_isotope[sigma, point, band]`, `heat_capacity[point, temperature, band]`,
/// `group_velocities[point, band, xyz]`, `mean_square_strength[point, band]`.
#[derive(Debug, Clone)]
pub struct GridData {
    grid_points: Vec<usize>,
    weights: Vec<usize>,
    qpoints: Vec<Vector3<f64>>,
    temperatures: Vec<f64>,
    sigmas: Vec<Sigma>,
    pub(crate) frequencies: Array2<f64>,
    pub(crate) gamma: Array4<f64>,
    pub(crate) gamma_isotope: Option<Array3<f64>>,
    pub(crate) heat_capacity: Array3<f64>,
    pub(crate) group_velocities: Array3<f64>,
    pub(crate) mean_square_strength: Array2<f64>,
    pub(crate) states: Vec<GridPointState>,
}

impl GridData {
    pub(crate) fn allocate(
        grid_points: Vec<usize>,
        weights: Vec<usize>,
        qpoints: Vec<Vector3<f64>>,
        temperatures: Vec<f64>,
        sigmas: Vec<Sigma>,
        num_band: usize,
        with_isotope: bool,
    ) -> Self {
        let n_gp = grid_points.len();
        let n_t = temperatures.len();
        let n_s = sigmas.len();
        Self {
            frequencies: Array2::zeros((n_gp, num_band)),
            gamma: Array4::zeros((n_s, n_t, n_gp, num_band)),
            gamma_isotope: with_isotope.then(|| Array3::zeros((n_s, n_gp, num_band))),
            heat_capacity: Array3::zeros((n_gp, n_t, num_band)),
            group_velocities: Array3::zeros((n_gp, num_band, 3)),
            mean_square_strength: Array2::zeros((n_gp, num_band)),
            states: vec![GridPointState::Pending; n_gp],
            grid_points,
            weights,
            qpoints,
            temperatures,
            sigmas,
        }
    }

    pub fn grid_points(&self) -> &[usize] {
        &self.grid_points
    }

    pub fn weights(&self) -> &[usize] {
        &self.weights
    }

    pub fn qpoints(&self) -> &[Vector3<f64>] {
        &self.qpoints
    }

    pub fn temperatures(&self) -> &[f64] {
        &self.temperatures
    }

    pub fn sigmas(&self) -> &[Sigma] {
        &self.sigmas
    }

    pub fn num_grid_points(&self) -> usize {
        self.grid_points.len()
    }

    pub fn num_band(&self) -> usize {
        self.frequencies.ncols()
    }

    pub fn frequencies(&self) -> &Array2<f64> {
        &self.frequencies
    }

    pub fn gamma(&self) -> &Array4<f64> {
        &self.gamma
    }

    pub fn gamma_isotope(&self) -> Option<&Array3<f64>> {
        self.gamma_isotope.as_ref()
    }

    pub fn heat_capacity(&self) -> &Array3<f64> {
        &self.heat_capacity
    }

    pub fn group_velocities(&self) -> &Array3<f64> {
        &self.group_velocities
    }

    pub fn mean_square_strength(&self) -> &Array2<f64> {
        &self.mean_square_strength
    }

    pub fn states(&self) -> &[GridPointState] {
        &self.states
    }

    pub fn is_complete(&self) -> bool {
        self.states.iter().all(GridPointState::is_complete)
    }

    /// Index of the first grid point whose arrays are not fully populated.
    pub fn first_incomplete(&self) -> Option<usize> {
        self.states.iter().position(|s| !s.is_complete())
    }

    pub fn frequencies_at(&self, index: usize) -> ArrayView1<'_, f64> {
        self.frequencies.row(index)
    }

    pub fn group_velocities_at(&self, index: usize) -> Vec<Vector3<f64>> {
        self.group_velocities
            .slice(s![index, .., ..])
            .outer_iter()
            .map(|v| Vector3::new(v[0], v[1], v[2]))
            .collect()
    }

    /// Heat capacities `[temperature, band]` of one grid point.
    pub fn heat_capacity_at(&self, index: usize) -> ArrayView2<'_, f64> {
        self.heat_capacity.slice(s![index, .., ..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> GridData {
        GridData::allocate(
            vec![0, 3],
            vec![1, 2],
            vec![Vector3::zeros(), Vector3::new(0.5, 0.0, 0.0)],
            vec![0.0, 300.0, 600.0],
            vec![Sigma::Tetrahedron, Sigma::Gaussian(0.1)],
            6,
            true,
        )
    }

    #[test]
    fn allocate_sizes_every_array_from_the_run_dimensions() {
        let data = data();
        assert_eq!(data.gamma().dim(), (2, 3, 2, 6));
        assert_eq!(data.gamma_isotope().unwrap().dim(), (2, 2, 6));
        assert_eq!(data.heat_capacity().dim(), (2, 3, 6));
        assert_eq!(data.group_velocities().dim(), (2, 6, 3));
        assert_eq!(data.mean_square_strength().dim(), (2, 6));
        assert_eq!(data.num_band(), 6);
    }

    #[test]
    fn fresh_data_is_pending_and_incomplete() {
        let data = data();
        assert!(data.states().iter().all(|s| *s == GridPointState::Pending));
        assert!(!data.is_complete());
        assert_eq!(data.first_incomplete(), Some(0));
    }

    #[test]
    fn only_computed_points_count_as_complete() {
        let mut data = data();
        data.states[0] = GridPointState::Computed {
            linewidths: LinewidthSource::Persisted,
        };
        data.states[1] = GridPointState::Loaded;
        assert_eq!(data.first_incomplete(), Some(1));
        data.states[1] = GridPointState::Computed {
            linewidths: LinewidthSource::Computed,
        };
        assert!(data.is_complete());
    }

    #[test]
    fn group_velocities_at_returns_cartesian_vectors() {
        let mut data = data();
        data.group_velocities[[1, 2, 0]] = 1.0;
        data.group_velocities[[1, 2, 2]] = -2.0;
        let v = data.group_velocities_at(1);
        assert_eq!(v.len(), 6);
        assert_eq!(v[2], Vector3::new(1.0, 0.0, -2.0));
    }
}
