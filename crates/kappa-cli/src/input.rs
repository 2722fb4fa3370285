use crate::error::{CliError, Result};
use kappa_rta::core::mesh::Mesh;
use kappa_rta::core::phonons::{PhononTableEntry, TabulatedPhonons};
use kappa_rta::core::symmetry::{MeshSymmetry, SymmetryMapper};
use kappa_rta::core::units::kappa_conversion_factor;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Crystal data produced upstream: mesh, point group and harmonic phonons.
#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct PhononsFile {
    pub mesh: [usize; 3],
    /// Primitive cell volume in Å³.
    pub volume: Option<f64>,
    pub conversion_factor: Option<f64>,
    #[serde(default)]
    pub point_operations: Vec<[[i64; 3]; 3]>,
    #[serde(default)]
    pub rotations_cartesian: Vec<[[f64; 3]; 3]>,
    pub phonons: Vec<PhononTableEntry>,
}

/// Collaborators built from a [`PhononsFile`].
pub struct Crystal {
    pub phonons: TabulatedPhonons,
    pub symmetry: MeshSymmetry,
}

impl PhononsFile {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading phonon data from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// An explicit factor wins over one derived from the cell volume.
    pub fn conversion_factor(&self) -> Result<f64> {
        match (self.conversion_factor, self.volume) {
            (Some(factor), _) => Ok(factor),
            (None, Some(volume)) if volume > 0.0 => Ok(kappa_conversion_factor(volume)),
            (None, Some(volume)) => Err(CliError::Config(format!(
                "`volume` must be positive, got {}",
                volume
            ))),
            (None, None) => Err(CliError::Config(
                "phonon data needs either `volume` or `conversion-factor`".to_string(),
            )),
        }
    }

    /// Builds the phonon table and point group on `mesh`, which must have the
    /// same sampling numbers as the file.
    pub fn into_crystal(self, mesh: Mesh) -> Result<Crystal> {
        if mesh.numbers() != self.mesh {
            return Err(CliError::Config(format!(
                "run mesh {:?} differs from phonon data mesh {:?}",
                mesh.numbers(),
                self.mesh
            )));
        }

        let symmetry = if self.point_operations.is_empty() && self.rotations_cartesian.is_empty() {
            info!("No point operations given; using the identity group.");
            MeshSymmetry::identity(mesh)
        } else {
            MeshSymmetry::from_rows(mesh, &self.point_operations, &self.rotations_cartesian)
                .map_err(|e| CliError::Config(e.to_string()))?
        };

        let phonons = TabulatedPhonons::from_entries(self.phonons)
            .map_err(|e| CliError::Config(e.to_string()))?;
        info!(
            grid_points = phonons.len(),
            operations = symmetry.point_operations().len(),
            "Phonon data loaded."
        );
        Ok(Crystal { phonons, symmetry })
    }
}
