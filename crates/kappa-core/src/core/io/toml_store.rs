use super::record::{KappaRecord, RecordFile};
use super::traits::{KappaStore, PersistenceError, StoreKey};
use std::path::{Path, PathBuf};
use tracing::debug;

/// One TOML file per record inside a directory.
#[derive(Debug, Clone)]
pub struct TomlStore {
    directory: PathBuf,
}

impl TomlStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn path_for(&self, key: &StoreKey) -> PathBuf {
        self.directory.join(format!("{}.toml", key.file_stem()))
    }
}

impl KappaStore for TomlStore {
    fn read_record(&self, key: &StoreKey) -> Result<Option<KappaRecord>, PersistenceError> {
        let path = self.path_for(key);
        if !path.exists() {
            debug!("No record at {:?}", path);
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path).map_err(|e| PersistenceError::Io {
            path: path.clone(),
            source: e,
        })?;
        let file: RecordFile =
            toml::from_str(&content).map_err(|e| PersistenceError::TomlDe {
                path: path.clone(),
                source: e,
            })?;
        KappaRecord::try_from(file).map(Some)
    }

    fn write(
        &mut self,
        record: &KappaRecord,
        label: Option<&str>,
    ) -> Result<(), PersistenceError> {
        std::fs::create_dir_all(&self.directory).map_err(|e| PersistenceError::Io {
            path: self.directory.clone(),
            source: e,
        })?;
        let path = self.path_for(&record.key(label));
        let content = toml::to_string(&RecordFile::from(record))?;
        std::fs::write(&path, content).map_err(|e| PersistenceError::Io {
            path: path.clone(),
            source: e,
        })?;
        debug!("Wrote record to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::collision::Sigma;
    use ndarray::{ArrayD, IxDyn};
    use tempfile::tempdir;

    fn record() -> KappaRecord {
        let gamma: Vec<f64> = (0..12).map(|i| 0.1 * i as f64 + 1.0 / 3.0).collect();
        KappaRecord {
            temperatures: vec![0.0, 300.0],
            mesh: [4, 4, 4],
            mesh_divisors: Some([2, 2, 2]),
            grid_point: Some(5),
            sigma: Sigma::Gaussian(0.1),
            gamma: Some(ArrayD::from_shape_vec(IxDyn(&[2, 6]), gamma).unwrap()),
            gamma_isotope: Some(ArrayD::from_elem(IxDyn(&[6]), 1e-3)),
            frequency: Some(ArrayD::from_elem(IxDyn(&[6]), 2.5)),
            ..KappaRecord::default()
        }
    }

    #[test]
    fn write_then_read_recovers_identical_record() {
        let dir = tempdir().unwrap();
        let mut store = TomlStore::new(dir.path());
        let original = record();
        store.write(&original, Some("test")).unwrap();

        assert!(dir.path().join("kappa-m444-d222-g5-s0.1.test.toml").exists());
        let loaded = store
            .read_record(&original.key(Some("test")))
            .unwrap()
            .unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn read_gamma_of_missing_file_is_none() {
        let dir = tempdir().unwrap();
        let store = TomlStore::new(dir.path());
        assert!(store.read_gamma(&record().key(None)).unwrap().is_none());
    }

    #[test]
    fn malformed_file_reports_parse_error() {
        let dir = tempdir().unwrap();
        let store = TomlStore::new(dir.path());
        let key = record().key(None);
        std::fs::write(store.path_for(&key), "temperatures = [").unwrap();
        let err = store.read_record(&key).unwrap_err();
        assert!(matches!(err, PersistenceError::TomlDe { .. }));
    }

    #[test]
    fn write_creates_missing_directory() {
        let dir = tempdir().unwrap();
        let mut store = TomlStore::new(dir.path().join("nested").join("out"));
        store.write(&record(), None).unwrap();
        assert!(store.path_for(&record().key(None)).exists());
    }
}
