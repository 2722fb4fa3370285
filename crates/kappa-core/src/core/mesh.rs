use nalgebra::Vector3;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum MeshError {
    #[error("Mesh numbers must be positive, got {numbers:?}")]
    EmptyMesh { numbers: [usize; 3] },

    #[error("Mesh {numbers:?} is not divisible by divisors {divisors:?}")]
    IndivisibleMesh {
        numbers: [usize; 3],
        divisors: [usize; 3],
    },
}

/// Regular q-point sampling mesh, optionally paired with a coarser sampling grid.
///
/// The coarse grid has `numbers[i] / divisors[i]` points along axis `i` and is
/// offset by half a divisor on every axis flagged in `coarse_shifts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mesh {
    numbers: [usize; 3],
    divisors: Option<[usize; 3]>,
    coarse_shifts: Option<[bool; 3]>,
}

impl Mesh {
    pub fn new(numbers: [usize; 3]) -> Result<Self, MeshError> {
        if numbers.iter().any(|&n| n == 0) {
            return Err(MeshError::EmptyMesh { numbers });
        }
        Ok(Self {
            numbers,
            divisors: None,
            coarse_shifts: None,
        })
    }

    pub fn with_divisors(
        numbers: [usize; 3],
        divisors: [usize; 3],
        coarse_shifts: Option<[bool; 3]>,
    ) -> Result<Self, MeshError> {
        let mesh = Self::new(numbers)?;
        let divisible = numbers
            .iter()
            .zip(divisors.iter())
            .all(|(&n, &d)| d > 0 && n % d == 0);
        if !divisible {
            return Err(MeshError::IndivisibleMesh { numbers, divisors });
        }
        Ok(Self {
            divisors: Some(divisors),
            coarse_shifts,
            ..mesh
        })
    }

    #[inline]
    pub fn numbers(&self) -> [usize; 3] {
        self.numbers
    }

    #[inline]
    pub fn divisors(&self) -> Option<[usize; 3]> {
        self.divisors
    }

    #[inline]
    pub fn coarse_shifts(&self) -> Option<[bool; 3]> {
        self.coarse_shifts
    }

    pub fn num_grid_points(&self) -> usize {
        self.numbers.iter().product()
    }

    pub fn coarse_numbers(&self) -> [usize; 3] {
        match self.divisors {
            Some(d) => [
                self.numbers[0] / d[0],
                self.numbers[1] / d[1],
                self.numbers[2] / d[2],
            ],
            None => self.numbers,
        }
    }

    pub fn is_coarse(&self) -> bool {
        self.coarse_numbers() != self.numbers
    }

    /// Flattened index of an integer address; components wrap around the mesh.
    pub fn grid_point_from_address(&self, address: &Vector3<i64>) -> usize {
        flatten_address(address, self.numbers)
    }

    /// Address in `[0, numbers)` of a flattened grid index.
    pub fn address_of(&self, grid_point: usize) -> Vector3<i64> {
        unflatten_index(grid_point, self.numbers)
    }

    /// Fractional q-point of a grid index, folded into (-0.5, 0.5].
    pub fn qpoint(&self, grid_point: usize) -> Vector3<f64> {
        let address = self.address_of(grid_point);
        Vector3::from_fn(|i, _| {
            let n = self.numbers[i] as i64;
            let mut a = address[i];
            if 2 * a > n {
                a -= n;
            }
            a as f64 / n as f64
        })
    }

    /// Maps a coarse-grid address onto the fine mesh.
    pub fn fine_address_from_coarse(&self, coarse_address: &Vector3<i64>) -> Vector3<i64> {
        let Some(divisors) = self.divisors else {
            return *coarse_address;
        };
        let shifts = self.coarse_shifts.unwrap_or([false; 3]);
        Vector3::from_fn(|i, _| {
            let d = divisors[i] as i64;
            let shift = if shifts[i] { d / 2 } else { 0 };
            coarse_address[i] * d + shift
        })
    }
}

pub(crate) fn flatten_address(address: &Vector3<i64>, numbers: [usize; 3]) -> usize {
    let m = numbers.map(|n| n as i64);
    let a0 = address[0].rem_euclid(m[0]);
    let a1 = address[1].rem_euclid(m[1]);
    let a2 = address[2].rem_euclid(m[2]);
    (a0 + a1 * m[0] + a2 * m[0] * m[1]) as usize
}

pub(crate) fn unflatten_index(index: usize, numbers: [usize; 3]) -> Vector3<i64> {
    let a0 = index % numbers[0];
    let a1 = (index / numbers[0]) % numbers[1];
    let a2 = index / (numbers[0] * numbers[1]);
    Vector3::new(a0 as i64, a1 as i64, a2 as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_zero_mesh_numbers() {
        assert_eq!(
            Mesh::new([4, 0, 4]),
            Err(MeshError::EmptyMesh { numbers: [4, 0, 4] })
        );
    }

    #[test]
    fn with_divisors_rejects_indivisible_mesh() {
        let result = Mesh::with_divisors([6, 6, 6], [4, 1, 1], None);
        assert!(matches!(result, Err(MeshError::IndivisibleMesh { .. })));
    }

    #[test]
    fn coarse_numbers_divides_mesh_by_divisors() {
        let mesh = Mesh::with_divisors([8, 8, 4], [2, 2, 1], None).unwrap();
        assert_eq!(mesh.coarse_numbers(), [4, 4, 4]);
        assert!(mesh.is_coarse());
        assert!(!Mesh::new([4, 4, 4]).unwrap().is_coarse());
    }

    #[test]
    fn address_and_index_are_inverse() {
        let mesh = Mesh::new([3, 4, 5]).unwrap();
        for gp in 0..mesh.num_grid_points() {
            let address = mesh.address_of(gp);
            assert_eq!(mesh.grid_point_from_address(&address), gp);
        }
    }

    #[test]
    fn negative_address_components_wrap_around() {
        let mesh = Mesh::new([4, 4, 4]).unwrap();
        let wrapped = mesh.grid_point_from_address(&Vector3::new(-1, 0, 0));
        assert_eq!(wrapped, 3);
        let wrapped = mesh.grid_point_from_address(&Vector3::new(0, -1, -1));
        assert_eq!(wrapped, 3 * 4 + 3 * 16);
    }

    #[test]
    fn qpoint_is_folded_into_first_zone() {
        let mesh = Mesh::new([4, 4, 4]).unwrap();
        assert_eq!(mesh.qpoint(0), Vector3::zeros());
        assert_eq!(mesh.qpoint(1), Vector3::new(0.25, 0.0, 0.0));
        assert_eq!(mesh.qpoint(2), Vector3::new(0.5, 0.0, 0.0));
        assert_eq!(mesh.qpoint(3), Vector3::new(-0.25, 0.0, 0.0));
    }

    #[test]
    fn fine_address_from_coarse_applies_divisors_and_shifts() {
        let mesh = Mesh::with_divisors([8, 8, 8], [2, 2, 2], Some([true, false, false])).unwrap();
        let fine = mesh.fine_address_from_coarse(&Vector3::new(1, 2, 3));
        assert_eq!(fine, Vector3::new(3, 4, 6));
    }
}
