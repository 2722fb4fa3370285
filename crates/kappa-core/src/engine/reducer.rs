use super::config::RtaConfig;
use super::error::EngineError;
use super::state::GridData;
use crate::core::collision::Sigma;
use crate::core::tensor::{KStar, symmetrized_gv_by_gv, voigt};
use crate::core::symmetry::SymmetryMapper;
use crate::core::units::ANGSTROM;
use nalgebra::{Matrix3, Vector3};
use ndarray::{Array3, s};
use std::f64::consts::PI;
use tracing::{debug, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Bands treated as acoustic, and dropped, at the first grid point of a run.
/// For unshifted meshes that point is Gamma.
const ACOUSTIC_BANDS: usize = 3;

/// Scattering rate (THz) of a mode with group velocity `velocity` (THz·Å)
/// against boundaries a mean free path `cutoff_mfp` (µm) apart.
pub fn boundary_scattering(velocity: &Vector3<f64>, cutoff_mfp: f64) -> f64 {
    velocity.norm() * ANGSTROM * 1e6 / (4.0 * PI * cutoff_mfp)
}

/// Lattice thermal conductivity `[sigma, temperature, voigt]` in W/m-K.
#[derive(Debug, Clone, PartialEq)]
pub struct Conductivity {
    kappa: Array3<f64>,
    num_sampling_points: usize,
    temperatures: Vec<f64>,
    sigmas: Vec<Sigma>,
}

impl Conductivity {
    pub fn kappa(&self) -> &Array3<f64> {
        &self.kappa
    }

    /// Voigt components (xx, yy, zz, yz, xz, xy) for one broadening and temperature.
    pub fn at(&self, sigma_index: usize, temperature_index: usize) -> [f64; 6] {
        let row = self.kappa.slice(s![sigma_index, temperature_index, ..]);
        std::array::from_fn(|c| row[c])
    }

    /// Sum of k-star orders over the processed grid points; the normalization of `kappa`.
    pub fn num_sampling_points(&self) -> usize {
        self.num_sampling_points
    }

    pub fn temperatures(&self) -> &[f64] {
        &self.temperatures
    }

    pub fn sigmas(&self) -> &[Sigma] {
        &self.sigmas
    }
}

struct PointContribution {
    kappa: Array3<f64>,
    grid_point: usize,
    order_kstar: usize,
}

/// Folds fully populated grid data into the conductivity tensor.
#[derive(Debug, Clone, Copy)]
pub struct RtaReducer {
    conversion_factor: f64,
    cutoff_mfp: Option<f64>,
    no_kappa_stars: bool,
}

impl RtaReducer {
    pub fn new(config: &RtaConfig) -> Self {
        Self {
            conversion_factor: config.conversion_factor,
            cutoff_mfp: config.cutoff_mfp,
            no_kappa_stars: config.no_kappa_stars,
        }
    }

    /// Reduces every grid point of `data` into kappa.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::IncompleteGrid`] if any grid point has not been
    /// computed; zero-filled slots are never summed.
    #[instrument(skip_all, name = "rta_reduction")]
    pub fn reduce(
        &self,
        data: &GridData,
        symmetry: &dyn SymmetryMapper,
    ) -> Result<Conductivity, EngineError> {
        if let Some(i) = data.first_incomplete() {
            return Err(EngineError::IncompleteGrid {
                grid_point: data.grid_points()[i],
            });
        }

        let indices: Vec<usize> = (0..data.num_grid_points()).collect();

        #[cfg(not(feature = "parallel"))]
        let iterator = indices.iter();

        #[cfg(feature = "parallel")]
        let iterator = indices.par_iter();

        let contributions: Vec<PointContribution> = iterator
            .map(|&i| self.contribution_at(data, symmetry, i))
            .collect();

        let n_s = data.sigmas().len();
        let n_t = data.temperatures().len();
        let mut kappa: Array3<f64> = Array3::zeros((n_s, n_t, 6));
        let mut num_sampling_points = 0;
        for (contribution, &weight) in contributions.iter().zip(data.weights()) {
            if contribution.order_kstar != weight {
                warn!(
                    grid_point = contribution.grid_point,
                    order_kstar = contribution.order_kstar,
                    weight,
                    "Number of elements in k* is unequal to number of equivalent grid points."
                );
            }
            kappa += &contribution.kappa;
            num_sampling_points += contribution.order_kstar;
        }
        if num_sampling_points > 0 {
            kappa /= num_sampling_points as f64;
        }

        debug!(num_sampling_points, "Conductivity reduced.");
        Ok(Conductivity {
            kappa,
            num_sampling_points,
            temperatures: data.temperatures().to_vec(),
            sigmas: data.sigmas().to_vec(),
        })
    }

    fn contribution_at(
        &self,
        data: &GridData,
        symmetry: &dyn SymmetryMapper,
        i: usize,
    ) -> PointContribution {
        let grid_point = data.grid_points()[i];
        let identity = [Matrix3::identity()];
        let (star, rotations) = if self.no_kappa_stars {
            (KStar::from_rotation_map(vec![grid_point]), &identity[..])
        } else {
            (symmetry.kstar(grid_point), symmetry.rotations_cartesian())
        };

        let velocities = data.group_velocities_at(i);
        let gv_sum2: Vec<[f64; 6]> = symmetrized_gv_by_gv(&velocities, rotations, &star)
            .iter()
            .map(voigt)
            .collect();
        let g_boundary: Option<Vec<f64>> = self.cutoff_mfp.map(|mfp| {
            velocities
                .iter()
                .map(|v| boundary_scattering(v, mfp))
                .collect()
        });
        let cv = data.heat_capacity_at(i);
        let gamma = data.gamma();
        let gamma_isotope = data.gamma_isotope();

        let n_s = data.sigmas().len();
        let n_t = data.temperatures().len();
        let mut kappa: Array3<f64> = Array3::zeros((n_s, n_t, 6));
        for j in 0..n_s {
            for k in 0..n_t {
                for (l, vv) in gv_sum2.iter().enumerate() {
                    if i == 0 && l < ACOUSTIC_BANDS {
                        continue;
                    }
                    let mut g_sum = gamma[[j, k, i, l]];
                    if let Some(iso) = gamma_isotope {
                        g_sum += iso[[j, i, l]];
                    }
                    if let Some(gb) = &g_boundary {
                        g_sum += gb[l];
                    }
                    if g_sum <= 0.0 {
                        continue;
                    }
                    let scale = cv[[k, l]] / (2.0 * g_sum) * self.conversion_factor;
                    for (c, component) in vv.iter().enumerate() {
                        kappa[[j, k, c]] += component * scale;
                    }
                }
            }
        }

        PointContribution {
            kappa,
            grid_point,
            order_kstar: star.order,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mesh::Mesh;
    use crate::core::symmetry::MeshSymmetry;
    use crate::engine::config::RtaConfigBuilder;
    use crate::engine::state::{GridPointState, LinewidthSource};

    const TOLERANCE: f64 = 1e-12;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() <= TOLERANCE * a.abs().max(b.abs()).max(1.0)
    }

    fn completed(mut data: GridData) -> GridData {
        for state in &mut data.states {
            *state = GridPointState::Computed {
                linewidths: LinewidthSource::Computed,
            };
        }
        data
    }

    /// Band carrying the only non-zero mode in the synthetic data; the bands
    /// below it are dropped at the first grid point of a run.
    const OPTICAL: usize = ACOUSTIC_BANDS;

    /// One grid point with a single optical mode: `v = (1, 0, 0)`, `cv = 1`, `gamma = 0.5`.
    fn single_mode(grid_point: usize, weight: usize) -> GridData {
        let mut data = GridData::allocate(
            vec![grid_point],
            vec![weight],
            vec![Vector3::zeros()],
            vec![300.0],
            vec![Sigma::Tetrahedron],
            OPTICAL + 1,
            false,
        );
        data.group_velocities[[0, OPTICAL, 0]] = 1.0;
        data.heat_capacity[[0, 0, OPTICAL]] = 1.0;
        data.gamma[[0, 0, 0, OPTICAL]] = 0.5;
        completed(data)
    }

    fn reducer(builder: RtaConfigBuilder) -> RtaReducer {
        RtaReducer::new(&builder.build().unwrap())
    }

    fn base() -> RtaConfigBuilder {
        RtaConfigBuilder::new().mesh([4, 4, 4]).conversion_factor(1.0)
    }

    #[test]
    fn single_mode_follows_the_rta_formula() {
        let sym = MeshSymmetry::identity(Mesh::new([4, 4, 4]).unwrap());
        let kappa = reducer(base()).reduce(&single_mode(1, 1), &sym).unwrap();
        // v_x² · cv / (2Γ) = 1 · 1 / 1
        assert!(f64_approx_equal(kappa.at(0, 0)[0], 1.0));
        assert_eq!(kappa.at(0, 0)[1..], [0.0; 5]);
        assert_eq!(kappa.num_sampling_points(), 1);
    }

    #[test]
    fn conversion_factor_scales_linearly() {
        let sym = MeshSymmetry::identity(Mesh::new([4, 4, 4]).unwrap());
        let kappa = reducer(base().conversion_factor(2.5))
            .reduce(&single_mode(1, 1), &sym)
            .unwrap();
        assert!(f64_approx_equal(kappa.at(0, 0)[0], 2.5));
    }

    #[test]
    fn boundary_scattering_adds_to_the_linewidth() {
        let sym = MeshSymmetry::identity(Mesh::new([4, 4, 4]).unwrap());
        let mfp = 1e-4 / (4.0 * PI * 0.5);
        let gb = boundary_scattering(&Vector3::new(1.0, 0.0, 0.0), mfp);
        assert!(f64_approx_equal(gb, 0.5));
        let kappa = reducer(base().cutoff_mfp(mfp))
            .reduce(&single_mode(1, 1), &sym)
            .unwrap();
        assert!(f64_approx_equal(kappa.at(0, 0)[0], 0.5));
    }

    #[test]
    fn isotope_linewidth_is_summed_with_phonon_phonon() {
        let sym = MeshSymmetry::identity(Mesh::new([4, 4, 4]).unwrap());
        let mut data = GridData::allocate(
            vec![1],
            vec![1],
            vec![Vector3::zeros()],
            vec![300.0],
            vec![Sigma::Tetrahedron],
            OPTICAL + 1,
            true,
        );
        data.group_velocities[[0, OPTICAL, 0]] = 1.0;
        data.heat_capacity[[0, 0, OPTICAL]] = 1.0;
        data.gamma[[0, 0, 0, OPTICAL]] = 0.25;
        if let Some(iso) = data.gamma_isotope.as_mut() {
            iso[[0, 0, OPTICAL]] = 0.25;
        }
        let kappa = reducer(base()).reduce(&completed(data), &sym).unwrap();
        assert!(f64_approx_equal(kappa.at(0, 0)[0], 1.0));
    }

    #[test]
    fn acoustic_bands_at_gamma_are_excluded_even_when_divergent() {
        let sym = MeshSymmetry::identity(Mesh::new([4, 4, 4]).unwrap());
        let mut data = GridData::allocate(
            vec![0],
            vec![1],
            vec![Vector3::zeros()],
            vec![300.0],
            vec![Sigma::Tetrahedron],
            6,
            false,
        );
        for l in 0..6 {
            data.group_velocities[[0, l, 0]] = 1.0;
            data.heat_capacity[[0, 0, l]] = 1.0;
            data.gamma[[0, 0, 0, l]] = 0.5;
        }
        for l in 0..3 {
            data.group_velocities[[0, l, 0]] = 1e30;
            data.gamma[[0, 0, 0, l]] = 1e-30;
        }
        let kappa = reducer(base()).reduce(&completed(data), &sym).unwrap();
        assert!(f64_approx_equal(kappa.at(0, 0)[0], 3.0));
    }

    #[test]
    fn acoustic_bands_are_dropped_at_the_first_point_of_the_run() {
        let sym = MeshSymmetry::identity(Mesh::new([4, 4, 4]).unwrap());
        let mut data = GridData::allocate(
            vec![5, 0],
            vec![1, 1],
            vec![Vector3::zeros(); 2],
            vec![300.0],
            vec![Sigma::Tetrahedron],
            OPTICAL + 1,
            false,
        );
        for l in 0..=OPTICAL {
            data.group_velocities[[0, l, 0]] = 1.0;
            data.heat_capacity[[0, 0, l]] = 1.0;
            data.gamma[[0, 0, 0, l]] = 0.5;
        }
        data.group_velocities[[1, OPTICAL, 0]] = 1.0;
        data.heat_capacity[[1, 0, OPTICAL]] = 1.0;
        data.gamma[[0, 0, 1, OPTICAL]] = 0.5;

        let kappa = reducer(base()).reduce(&completed(data), &sym).unwrap();
        // Only the optical band of each point counts: (1 + 1) / 2.
        assert!(f64_approx_equal(kappa.at(0, 0)[0], 1.0));
    }

    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn star_order_normalizes_when_it_disagrees_with_the_weight() {
        let mesh = Mesh::new([4, 1, 1]).unwrap();
        let sym = MeshSymmetry::new(
            mesh,
            vec![Matrix3::identity(), -Matrix3::<i64>::identity()],
            vec![Matrix3::identity(), -Matrix3::<f64>::identity()],
        )
        .unwrap();
        // Inversion sends grid point 1 to 3, so its star has two members.
        let data = single_mode(1, 1);

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        let kappa = tracing::subscriber::with_default(subscriber, || {
            reducer(base().mesh([4, 1, 1])).reduce(&data, &sym).unwrap()
        });

        assert_eq!(kappa.num_sampling_points(), 2);
        // Both star members give v_x² · cv / (2Γ) = 1; divided by the order, not the weight.
        assert!(f64_approx_equal(kappa.at(0, 0)[0], 1.0));

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("WARN"));
        assert!(output.contains("grid_point=1"));
        assert!(output.contains("order_kstar=2"));
        assert!(output.contains("weight=1"));
    }

    #[test]
    fn non_positive_linewidths_are_skipped() {
        let sym = MeshSymmetry::identity(Mesh::new([4, 4, 4]).unwrap());
        let mut data = single_mode(1, 1);
        data.gamma[[0, 0, 0, OPTICAL]] = 0.0;
        let kappa = reducer(base()).reduce(&data, &sym).unwrap();
        assert!(kappa.kappa().iter().all(|&k| k == 0.0 && k.is_finite()));
    }

    #[test]
    fn incomplete_grid_is_rejected() {
        let sym = MeshSymmetry::identity(Mesh::new([4, 4, 4]).unwrap());
        let mut data = single_mode(7, 1);
        data.states[0] = GridPointState::Loaded;
        let err = reducer(base()).reduce(&data, &sym).unwrap_err();
        assert!(matches!(err, EngineError::IncompleteGrid { grid_point: 7 }));
    }

    #[test]
    fn star_averaging_symmetrizes_the_tensor() {
        let mesh = Mesh::new([4, 4, 1]).unwrap();
        let c4 = Matrix3::new(0, -1, 0, 1, 0, 0, 0, 0, 1);
        let c4f = Matrix3::new(0.0, -1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0);
        let sym = MeshSymmetry::new(
            mesh,
            vec![Matrix3::identity(), c4, c4 * c4, c4 * c4 * c4],
            vec![Matrix3::identity(), c4f, c4f * c4f, c4f * c4f * c4f],
        )
        .unwrap();
        let gp = mesh.grid_point_from_address(&nalgebra::Vector3::new(1, 0, 0));
        let data = single_mode(gp, 4);

        let kappa = reducer(base().mesh([4, 4, 1]))
            .reduce(&data, &sym)
            .unwrap();
        let k = kappa.at(0, 0);
        assert_eq!(kappa.num_sampling_points(), 4);
        // Four rotated copies of v_x² spread evenly over xx and yy, normalized by 4.
        assert!(f64_approx_equal(k[0], 0.5));
        assert!(f64_approx_equal(k[1], 0.5));
        assert!(f64_approx_equal(k[5], 0.0));

        let unstarred = reducer(base().mesh([4, 4, 1]).no_kappa_stars(true))
            .reduce(&single_mode(gp, 1), &sym)
            .unwrap();
        assert_eq!(unstarred.num_sampling_points(), 1);
        assert!(f64_approx_equal(unstarred.at(0, 0)[0], 1.0));
        assert!(f64_approx_equal(unstarred.at(0, 0)[1], 0.0));
    }

    #[test]
    fn sampling_points_sum_kstar_orders() {
        let mesh = Mesh::new([4, 1, 1]).unwrap();
        let sym = MeshSymmetry::new(
            mesh,
            vec![Matrix3::identity(), -Matrix3::<i64>::identity()],
            vec![Matrix3::identity(), -Matrix3::<f64>::identity()],
        )
        .unwrap();
        let ir = sym.irreducible_grid_points();
        let (points, weights): (Vec<usize>, Vec<usize>) = ir.into_iter().unzip();
        let n = points.len();
        let data = completed(GridData::allocate(
            points,
            weights.clone(),
            vec![Vector3::zeros(); n],
            vec![300.0],
            vec![Sigma::Tetrahedron],
            1,
            false,
        ));
        let kappa = reducer(base().mesh([4, 1, 1])).reduce(&data, &sym).unwrap();
        assert_eq!(kappa.num_sampling_points(), weights.iter().sum::<usize>());
        assert_eq!(kappa.num_sampling_points(), 4);
    }
}
