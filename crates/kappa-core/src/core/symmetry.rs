use super::mesh::Mesh;
use super::tensor::KStar;
use nalgebra::{Matrix3, Scalar, Vector3};
use thiserror::Error;

/// Point-group bookkeeping on the q-point mesh.
///
/// Constructing the symmetry tables themselves is done upstream; implementors
/// only answer where each operation sends a grid point.
pub trait SymmetryMapper: Sync {
    fn mesh(&self) -> &Mesh;

    /// Rotations acting on integer grid addresses (reciprocal space).
    fn point_operations(&self) -> &[Matrix3<i64>];

    /// The same operations as Cartesian rotation matrices, in the same order.
    fn rotations_cartesian(&self) -> &[Matrix3<f64>];

    /// For each point operation, the grid point it maps `grid_point` onto.
    fn rotation_map(&self, grid_point: usize) -> Vec<usize>;

    /// Irreducible grid points with their weights (size of their star).
    fn irreducible_grid_points(&self) -> Vec<(usize, usize)>;

    fn kstar(&self, grid_point: usize) -> KStar {
        KStar::from_rotation_map(self.rotation_map(grid_point))
    }
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum SymmetryError {
    #[error("At least one point operation is required")]
    NoOperations,

    #[error("Got {integer} integer operations but {cartesian} Cartesian rotations")]
    LengthMismatch { integer: usize, cartesian: usize },
}

#[derive(Debug, Clone)]
pub struct MeshSymmetry {
    mesh: Mesh,
    point_operations: Vec<Matrix3<i64>>,
    rotations_cartesian: Vec<Matrix3<f64>>,
}

impl MeshSymmetry {
    pub fn new(
        mesh: Mesh,
        point_operations: Vec<Matrix3<i64>>,
        rotations_cartesian: Vec<Matrix3<f64>>,
    ) -> Result<Self, SymmetryError> {
        if point_operations.is_empty() {
            return Err(SymmetryError::NoOperations);
        }
        if point_operations.len() != rotations_cartesian.len() {
            return Err(SymmetryError::LengthMismatch {
                integer: point_operations.len(),
                cartesian: rotations_cartesian.len(),
            });
        }
        Ok(Self {
            mesh,
            point_operations,
            rotations_cartesian,
        })
    }

    /// Trivial point group containing only the identity.
    pub fn identity(mesh: Mesh) -> Self {
        Self {
            mesh,
            point_operations: vec![Matrix3::identity()],
            rotations_cartesian: vec![Matrix3::identity()],
        }
    }

    /// Builds the tables from row-major 3x3 arrays as they appear in input files.
    pub fn from_rows(
        mesh: Mesh,
        point_operations: &[[[i64; 3]; 3]],
        rotations_cartesian: &[[[f64; 3]; 3]],
    ) -> Result<Self, SymmetryError> {
        Self::new(
            mesh,
            point_operations.iter().map(matrix_from_rows).collect(),
            rotations_cartesian.iter().map(matrix_from_rows).collect(),
        )
    }

    fn rotated_grid_points(&self, address: &Vector3<i64>) -> Vec<usize> {
        self.point_operations
            .iter()
            .map(|r| self.mesh.grid_point_from_address(&(r * address)))
            .collect()
    }
}

impl SymmetryMapper for MeshSymmetry {
    fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    fn point_operations(&self) -> &[Matrix3<i64>] {
        &self.point_operations
    }

    fn rotations_cartesian(&self) -> &[Matrix3<f64>] {
        &self.rotations_cartesian
    }

    fn rotation_map(&self, grid_point: usize) -> Vec<usize> {
        self.rotated_grid_points(&self.mesh.address_of(grid_point))
    }

    fn irreducible_grid_points(&self) -> Vec<(usize, usize)> {
        let coarse = self.mesh.coarse_numbers();
        let num_coarse: usize = coarse.iter().product();
        let mut visited = vec![false; self.mesh.num_grid_points()];
        let mut irreducible = Vec::new();

        for coarse_index in 0..num_coarse {
            let coarse_address = super::mesh::unflatten_index(coarse_index, coarse);
            let address = self.mesh.fine_address_from_coarse(&coarse_address);
            let grid_point = self.mesh.grid_point_from_address(&address);
            if visited[grid_point] {
                continue;
            }
            let mut weight = 0;
            for member in self.rotated_grid_points(&address) {
                if !visited[member] {
                    visited[member] = true;
                    weight += 1;
                }
            }
            irreducible.push((grid_point, weight));
        }
        irreducible
    }
}

fn matrix_from_rows<T: Scalar + Copy>(rows: &[[T; 3]; 3]) -> Matrix3<T> {
    Matrix3::from_fn(|i, j| rows[i][j])
}
