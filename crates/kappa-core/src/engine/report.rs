use super::reducer::Conductivity;
use super::state::GridData;
use crate::core::collision::Sigma;
use crate::core::symmetry::SymmetryMapper;
use crate::core::tensor::VOIGT_LABELS;
use nalgebra::{Matrix3, Vector3};
use std::fmt;

/// Conductivity per temperature, one block per broadening.
pub struct KappaTable<'a> {
    conductivity: &'a Conductivity,
}

impl<'a> KappaTable<'a> {
    pub fn new(conductivity: &'a Conductivity) -> Self {
        Self { conductivity }
    }
}

impl fmt::Display for KappaTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (j, sigma) in self.conductivity.sigmas().iter().enumerate() {
            match sigma {
                Sigma::Tetrahedron => writeln!(
                    f,
                    "----------- Thermal conductivity (W/m-k) with tetrahedron method -----------"
                )?,
                Sigma::Gaussian(width) => writeln!(
                    f,
                    "----------- Thermal conductivity (W/m-k) for sigma={} -----------",
                    width
                )?,
            }
            write!(f, "#{:>6}     ", "T(K)")?;
            for label in VOIGT_LABELS {
                write!(f, " {:<9}", label)?;
            }
            writeln!(f)?;
            for (k, t) in self.conductivity.temperatures().iter().enumerate() {
                write!(f, "{:7.1}", t)?;
                for value in self.conductivity.at(j, k) {
                    write!(f, " {:9.3}", value)?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

/// Frequencies, group velocities and interaction strengths of one processed grid point.
///
/// With a symmetry mapper the listing is repeated for every operation of the
/// k-star, with rotated q-points and velocities.
pub struct GridPointListing<'a> {
    data: &'a GridData,
    index: usize,
    gv_delta_q: Option<f64>,
    symmetry: Option<&'a dyn SymmetryMapper>,
}

impl<'a> GridPointListing<'a> {
    pub fn new(
        data: &'a GridData,
        index: usize,
        gv_delta_q: Option<f64>,
        symmetry: Option<&'a dyn SymmetryMapper>,
    ) -> Self {
        Self {
            data,
            index,
            gv_delta_q,
            symmetry,
        }
    }

    fn write_modes(
        &self,
        f: &mut fmt::Formatter<'_>,
        rotation: &Matrix3<f64>,
    ) -> fmt::Result {
        let frequencies = self.data.frequencies_at(self.index);
        let mspp = self.data.mean_square_strength().row(self.index);
        for ((freq, v), pp) in frequencies
            .iter()
            .zip(self.data.group_velocities_at(self.index))
            .zip(mspp.iter())
        {
            let v = rotation * v;
            writeln!(
                f,
                "{:8.3}   ({:8.3} {:8.3} {:8.3}) {:8.3} {:11.3e}",
                freq,
                v[0],
                v[1],
                v[2],
                v.norm(),
                pp
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for GridPointListing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frequency     group velocity (x, y, z)     |gv|     |mspp|")?;
        match self.gv_delta_q {
            Some(dq) => writeln!(f, " (dq={:3.1e})", dq)?,
            None => writeln!(f)?,
        }

        let Some(symmetry) = self.symmetry else {
            return self.write_modes(f, &Matrix3::identity());
        };

        let grid_point = self.data.grid_points()[self.index];
        let q = self.data.qpoints()[self.index];
        let star = symmetry.kstar(grid_point);
        let operations = symmetry
            .point_operations()
            .iter()
            .zip(symmetry.rotations_cartesian());
        for (member_index, member) in star.members().into_iter().enumerate() {
            for (k, (rot, rot_c)) in operations.clone().enumerate() {
                if star.rotation_map[k] != member {
                    continue;
                }
                let rq: Vector3<f64> = rot.map(|x| x as f64) * q;
                writeln!(
                    f,
                    " k*{:<2} ({:5.2} {:5.2} {:5.2})",
                    member_index + 1,
                    rq[0],
                    rq[1],
                    rq[2]
                )?;
                self.write_modes(f, rot_c)?;
            }
        }
        Ok(())
    }
}
