use super::error::EngineError;
use super::state::GridData;
use crate::core::collision::Sigma;
use crate::core::io::traits::{KappaStore, PersistenceError, StoreKey, StoredGamma};
use crate::core::mesh::Mesh;
use ndarray::{Array2, Array3, Array4, ArrayD, Ix2, Ix3, s};
use tracing::{debug, info};

/// Linewidths recovered from a store for every grid point and broadening of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RestoredLinewidths {
    /// `[sigma, temperature, point, band]`
    pub gamma: Array4<f64>,
    /// `[sigma, point, band]`, present only if every record carried isotope data.
    pub gamma_isotope: Option<Array3<f64>>,
}

/// Loads persisted phonon-phonon linewidths for all grid points of `data`.
///
/// For each broadening the consolidated record is tried first; when it is
/// missing or sized for a different run, the points are read one by one.
///
/// # Errors
///
/// Returns [`EngineError::RestartIncomplete`] naming the first grid point
/// without stored linewidths. Nothing is returned in that case; a restart is
/// all or nothing.
pub fn load_gamma(
    store: &dyn KappaStore,
    data: &GridData,
    mesh: &Mesh,
    label: Option<&str>,
) -> Result<RestoredLinewidths, EngineError> {
    let n_s = data.sigmas().len();
    let n_t = data.temperatures().len();
    let n_gp = data.num_grid_points();
    let n_band = data.num_band();

    let mut gamma = Array4::zeros((n_s, n_t, n_gp, n_band));
    let mut gamma_isotope = Array3::zeros((n_s, n_gp, n_band));
    let mut isotope_complete = true;

    for (j, &sigma) in data.sigmas().iter().enumerate() {
        let key = consolidated_key(mesh, sigma, label);

        if let Some(stored) = store.read_gamma(&key)? {
            let consolidated = stored
                .gamma
                .clone()
                .into_dimensionality::<Ix3>()
                .ok()
                .filter(|a| a.dim() == (n_t, n_gp, n_band));
            if let Some(consolidated) = consolidated {
                info!("Read linewidths of all grid points ({}).", sigma);
                gamma.slice_mut(s![j, .., .., ..]).assign(&consolidated);
                match stored_isotope(&stored, (n_gp, n_band)) {
                    Some(iso) => gamma_isotope.slice_mut(s![j, .., ..]).assign(&iso),
                    None => isotope_complete = false,
                }
                continue;
            }
            debug!(
                shape = ?stored.gamma.shape(),
                "Consolidated linewidths do not match this run; reading grid points one by one."
            );
        }

        for (i, &gp) in data.grid_points().iter().enumerate() {
            let key = StoreKey {
                grid_point: Some(gp),
                ..key.clone()
            };
            let stored = store
                .read_gamma(&key)?
                .ok_or(EngineError::RestartIncomplete {
                    grid_point: gp,
                    sigma,
                })?;
            let point = expect_shape(stored.gamma.clone(), "gamma", &[n_t, n_band])?
                .into_dimensionality::<Ix2>()
                .map_err(|e| EngineError::Internal(e.to_string()))?;
            gamma.slice_mut(s![j, .., i, ..]).assign(&point);
            match stored.gamma_isotope {
                Some(iso) => {
                    let iso = expect_shape(iso, "gamma_isotope", &[n_band])?;
                    gamma_isotope.slice_mut(s![j, i, ..]).assign(&iso);
                }
                None => isotope_complete = false,
            }
        }
        info!("Read linewidths grid point by grid point ({}).", sigma);
    }

    Ok(RestoredLinewidths {
        gamma,
        gamma_isotope: isotope_complete.then_some(gamma_isotope),
    })
}

fn stored_isotope(stored: &StoredGamma, dim: (usize, usize)) -> Option<Array2<f64>> {
    stored
        .gamma_isotope
        .clone()?
        .into_dimensionality::<Ix2>()
        .ok()
        .filter(|a| a.dim() == dim)
}

fn expect_shape(
    array: ArrayD<f64>,
    name: &'static str,
    expected: &[usize],
) -> Result<ArrayD<f64>, PersistenceError> {
    if array.shape() != expected {
        return Err(PersistenceError::Shape {
            name,
            expected: expected.to_vec(),
            found: array.shape().to_vec(),
        });
    }
    Ok(array)
}

/// Key of the consolidated record for one broadening of a run.
pub(crate) fn consolidated_key(mesh: &Mesh, sigma: Sigma, label: Option<&str>) -> StoreKey {
    StoreKey {
        mesh: mesh.numbers(),
        mesh_divisors: mesh.divisors(),
        sigma,
        grid_point: None,
        label: label.map(str::to_string),
    }
}
