use super::config::ConfigError;
use crate::core::collision::{CollisionError, Sigma};
use crate::core::io::traits::PersistenceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Initialization failed: {0}")]
    Initialization(String),

    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Collision calculation failed: {source}")]
    Collision {
        #[from]
        source: CollisionError,
    },

    #[error("Persistence failed: {source}")]
    Persistence {
        #[from]
        source: PersistenceError,
    },

    #[error("No phonons available at grid point {grid_point}")]
    MissingPhonons { grid_point: usize },

    #[error("'{quantity}' at grid point {grid_point} has {found} bands, expected {expected}")]
    BandMismatch {
        quantity: &'static str,
        grid_point: usize,
        expected: usize,
        found: usize,
    },

    #[error("Restart failed: linewidths at grid point {grid_point} ({sigma}) are not stored")]
    RestartIncomplete { grid_point: usize, sigma: Sigma },

    #[error("Grid point {grid_point} has not been computed; reduction needs every grid point")]
    IncompleteGrid { grid_point: usize },

    #[error("Internal logic error: {0}")]
    Internal(String),
}
