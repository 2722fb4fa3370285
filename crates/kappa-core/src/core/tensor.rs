use itertools::Itertools;
use nalgebra::{Matrix3, Vector3};

/// Index pairs of the independent components of a symmetric 3x3 tensor in
/// Voigt order: xx, yy, zz, yz, xz, xy.
pub const VOIGT_PAIRS: [(usize, usize); 6] = [(0, 0), (1, 1), (2, 2), (1, 2), (0, 2), (0, 1)];

pub const VOIGT_LABELS: [&str; 6] = ["xx", "yy", "zz", "yz", "xz", "xy"];

#[inline]
pub fn voigt(tensor: &Matrix3<f64>) -> [f64; 6] {
    VOIGT_PAIRS.map(|(a, b)| tensor[(a, b)])
}

/// The star of a grid point: where each point-group operation sends it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KStar {
    pub rotation_map: Vec<usize>,
    pub order: usize,
}

impl KStar {
    pub fn from_rotation_map(rotation_map: Vec<usize>) -> Self {
        let order = rotation_map.iter().unique().count();
        Self {
            rotation_map,
            order,
        }
    }

    /// How many operations land on each distinct member of the star.
    pub fn multiplicity(&self) -> f64 {
        if self.order == 0 {
            return 1.0;
        }
        self.rotation_map.len() as f64 / self.order as f64
    }

    /// Distinct members in order of first appearance.
    pub fn members(&self) -> Vec<usize> {
        self.rotation_map.iter().copied().unique().collect()
    }
}

/// Per-band `Σ_R (R v)(R v)ᵀ`, divided by the star multiplicity so every
/// distinct star member is counted exactly once.
pub fn symmetrized_gv_by_gv(
    velocities: &[Vector3<f64>],
    rotations: &[Matrix3<f64>],
    star: &KStar,
) -> Vec<Matrix3<f64>> {
    let multiplicity = star.multiplicity();
    velocities
        .iter()
        .map(|v| {
            let sum: Matrix3<f64> = rotations
                .iter()
                .map(|r| {
                    let rv = r * v;
                    rv * rv.transpose()
                })
                .sum();
            sum / multiplicity
        })
        .collect()
}
