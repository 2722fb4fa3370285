use super::traits::{PersistenceError, StoreKey};
use crate::core::collision::Sigma;
use ndarray::{ArrayD, IxDyn};
use serde::{Deserialize, Serialize};

/// Any subset of the arrays produced by a conductivity run, keyed consistently
/// so a later read with a matching [`StoreKey`] recovers them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KappaRecord {
    pub temperatures: Vec<f64>,
    pub mesh: [usize; 3],
    pub mesh_divisors: Option<[usize; 3]>,
    pub grid_point: Option<usize>,
    pub sigma: Sigma,
    pub frequency: Option<ArrayD<f64>>,
    pub group_velocity: Option<ArrayD<f64>>,
    pub heat_capacity: Option<ArrayD<f64>>,
    pub kappa: Option<ArrayD<f64>>,
    pub gamma: Option<ArrayD<f64>>,
    pub gamma_isotope: Option<ArrayD<f64>>,
    pub mean_square_strength: Option<ArrayD<f64>>,
    pub qpoints: Option<ArrayD<f64>>,
    pub weights: Option<Vec<usize>>,
}

impl KappaRecord {
    pub fn key(&self, label: Option<&str>) -> StoreKey {
        StoreKey {
            mesh: self.mesh,
            mesh_divisors: self.mesh_divisors,
            sigma: self.sigma,
            grid_point: self.grid_point,
            label: label.map(str::to_string),
        }
    }
}

/// A dense array flattened in row-major order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoredArray {
    pub shape: Vec<usize>,
    pub data: Vec<f64>,
}

impl From<&ArrayD<f64>> for StoredArray {
    fn from(array: &ArrayD<f64>) -> Self {
        Self {
            shape: array.shape().to_vec(),
            data: array.iter().copied().collect(),
        }
    }
}

impl StoredArray {
    fn into_array(self, name: &str) -> Result<ArrayD<f64>, PersistenceError> {
        let len = self.data.len();
        let shape = self.shape.clone();
        ArrayD::from_shape_vec(IxDyn(&self.shape), self.data).map_err(|_| {
            PersistenceError::Corrupt {
                name: name.to_string(),
                shape,
                len,
            }
        })
    }
}

/// On-disk layout of a [`KappaRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub(crate) struct RecordFile {
    temperatures: Vec<f64>,
    mesh: [usize; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mesh_divisors: Option<[usize; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    grid_point: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sigma: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    weights: Option<Vec<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    frequency: Option<StoredArray>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    group_velocity: Option<StoredArray>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    heat_capacity: Option<StoredArray>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kappa: Option<StoredArray>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    gamma: Option<StoredArray>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    gamma_isotope: Option<StoredArray>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mean_square_strength: Option<StoredArray>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    qpoints: Option<StoredArray>,
}

impl From<&KappaRecord> for RecordFile {
    fn from(record: &KappaRecord) -> Self {
        let store = |a: &Option<ArrayD<f64>>| a.as_ref().map(StoredArray::from);
        Self {
            temperatures: record.temperatures.clone(),
            mesh: record.mesh,
            mesh_divisors: record.mesh_divisors,
            grid_point: record.grid_point,
            sigma: record.sigma.width(),
            weights: record.weights.clone(),
            frequency: store(&record.frequency),
            group_velocity: store(&record.group_velocity),
            heat_capacity: store(&record.heat_capacity),
            kappa: store(&record.kappa),
            gamma: store(&record.gamma),
            gamma_isotope: store(&record.gamma_isotope),
            mean_square_strength: store(&record.mean_square_strength),
            qpoints: store(&record.qpoints),
        }
    }
}

impl TryFrom<RecordFile> for KappaRecord {
    type Error = PersistenceError;

    fn try_from(file: RecordFile) -> Result<Self, Self::Error> {
        let load = |a: Option<StoredArray>, name: &str| a.map(|a| a.into_array(name)).transpose();
        Ok(Self {
            temperatures: file.temperatures,
            mesh: file.mesh,
            mesh_divisors: file.mesh_divisors,
            grid_point: file.grid_point,
            sigma: Sigma::from_width(file.sigma),
            weights: file.weights,
            frequency: load(file.frequency, "frequency")?,
            group_velocity: load(file.group_velocity, "group-velocity")?,
            heat_capacity: load(file.heat_capacity, "heat-capacity")?,
            kappa: load(file.kappa, "kappa")?,
            gamma: load(file.gamma, "gamma")?,
            gamma_isotope: load(file.gamma_isotope, "gamma-isotope")?,
            mean_square_strength: load(file.mean_square_strength, "mean-square-strength")?,
            qpoints: load(file.qpoints, "qpoints")?,
        })
    }
}
