use super::record::KappaRecord;
use crate::core::collision::Sigma;
use ndarray::ArrayD;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("File I/O error for '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("TOML parsing error for '{path}': {source}", path = path.display())]
    TomlDe {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("TOML encoding error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("Array '{name}' has shape {found:?}, expected {expected:?}")]
    Shape {
        name: &'static str,
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error("Array '{name}' declares shape {shape:?} but holds {len} values")]
    Corrupt {
        name: String,
        shape: Vec<usize>,
        len: usize,
    },
}

/// Identifies one persisted record.
///
/// A key without a grid point addresses the consolidated record covering every
/// grid point of a run; a key with one addresses that point alone.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreKey {
    pub mesh: [usize; 3],
    pub mesh_divisors: Option<[usize; 3]>,
    pub sigma: Sigma,
    pub grid_point: Option<usize>,
    pub label: Option<String>,
}

impl StoreKey {
    /// Canonical name of the record, e.g. `kappa-m884-d221-g12-s0.1.run1`.
    pub fn file_stem(&self) -> String {
        let mut stem = format!(
            "kappa-m{}{}{}",
            self.mesh[0], self.mesh[1], self.mesh[2]
        );
        if let Some(d) = self.mesh_divisors {
            if d != [1, 1, 1] {
                stem.push_str(&format!("-d{}{}{}", d[0], d[1], d[2]));
            }
        }
        if let Some(gp) = self.grid_point {
            stem.push_str(&format!("-g{}", gp));
        }
        if let Some(width) = self.sigma.width() {
            stem.push_str(&format!("-s{}", width));
        }
        if let Some(label) = &self.label {
            stem.push('.');
            stem.push_str(label);
        }
        stem
    }
}

/// Linewidths recovered from a store.
///
/// `gamma_isotope` is `None` when the record was found but carries no isotope
/// data, which is distinct from the record not existing at all.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredGamma {
    pub gamma: ArrayD<f64>,
    pub gamma_isotope: Option<ArrayD<f64>>,
}

/// Defines the persistence contract for conductivity runs.
///
/// Implementors decide the encoding; the engine only relies on a write
/// followed by a read with a matching key recovering the same values.
pub trait KappaStore {
    /// Reads the record stored under `key`.
    ///
    /// # Arguments
    ///
    /// * `key` - The key of the record.
    ///
    /// # Return
    ///
    /// Returns `Ok(None)` if no record exists under the key.
    ///
    /// # Errors
    ///
    /// Returns an error if the record exists but cannot be read or decoded.
    fn read_record(&self, key: &StoreKey) -> Result<Option<KappaRecord>, PersistenceError>;

    /// Persists a record under the key derived from its contents and `label`.
    ///
    /// # Arguments
    ///
    /// * `record` - The arrays to persist.
    /// * `label` - Optional tag distinguishing runs that share mesh and broadening.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing fails.
    fn write(&mut self, record: &KappaRecord, label: Option<&str>)
    -> Result<(), PersistenceError>;

    /// Reads the linewidths stored under `key`.
    ///
    /// # Return
    ///
    /// Returns `Ok(None)` if there is no record under the key, or if the record
    /// holds no phonon-phonon linewidths.
    ///
    /// # Errors
    ///
    /// Returns an error if the record exists but cannot be read or decoded.
    fn read_gamma(&self, key: &StoreKey) -> Result<Option<StoredGamma>, PersistenceError> {
        Ok(self.read_record(key)?.and_then(|record| {
            record.gamma.map(|gamma| StoredGamma {
                gamma,
                gamma_isotope: record.gamma_isotope,
            })
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> StoreKey {
        StoreKey {
            mesh: [8, 8, 4],
            mesh_divisors: None,
            sigma: Sigma::Tetrahedron,
            grid_point: None,
            label: None,
        }
    }

    #[test]
    fn file_stem_of_consolidated_tetrahedron_record() {
        assert_eq!(key().file_stem(), "kappa-m884");
    }

    #[test]
    fn file_stem_includes_divisors_grid_point_sigma_and_label() {
        let key = StoreKey {
            mesh_divisors: Some([2, 2, 1]),
            sigma: Sigma::Gaussian(0.1),
            grid_point: Some(12),
            label: Some("run1".to_string()),
            ..key()
        };
        assert_eq!(key.file_stem(), "kappa-m884-d221-g12-s0.1.run1");
    }

    #[test]
    fn file_stem_omits_unit_divisors() {
        let key = StoreKey {
            mesh_divisors: Some([1, 1, 1]),
            ..key()
        };
        assert_eq!(key.file_stem(), "kappa-m884");
    }
}
