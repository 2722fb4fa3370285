//! # Core Module
//!
//! Stateless foundations of the conductivity engine.
//!
//! ## Overview
//!
//! Everything in this module is either a pure function of its inputs or a
//! collaborator interface the engine drives. Nothing here owns per-run state.
//!
//! ## Architecture
//!
//! - **Sampling Mesh** ([`mesh`]) - Grid addressing, q-points and coarse sampling grids
//! - **Physical Units** ([`units`]) - Constants, mode heat capacity and the kappa unit conversion
//! - **Heat Capacity** ([`heat_capacity`]) - Guarded per-grid-point mode heat capacities
//! - **Velocity Tensors** ([`tensor`]) - k-star bookkeeping, symmetrized `v⊗v` and Voigt components
//! - **Collaborators** ([`collision`], [`isotope`], [`phonons`], [`symmetry`]) - Interfaces to
//!   the three-phonon, isotope, harmonic-phonon and point-group machinery, with tabulated and
//!   mesh-based reference implementations
//! - **Persistence** ([`io`]) - The read/write contract for linewidths and conductivities

pub mod collision;
pub mod heat_capacity;
pub mod io;
pub mod isotope;
pub mod mesh;
pub mod phonons;
pub mod symmetry;
pub mod tensor;
pub mod units;
