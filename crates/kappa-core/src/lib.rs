//! # kappa-rta
//!
//! Lattice thermal conductivity of crystals in the relaxation-time
//! approximation, from three-phonon scattering linewidths.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture to keep concerns apart.
//!
//! - **[`core`]: The Foundation.** Stateless pieces: mesh addressing, physical
//!   units, mode heat capacities, velocity-tensor helpers, the traits through
//!   which external calculators (collision, phonons, symmetry, isotope) are
//!   driven, and persistence of run records.
//!
//! - **[`engine`]: The Logic Core.** The stateful run: configuration, the
//!   per-grid-point [`engine::iterator::GridIterator`], restart from persisted
//!   linewidths, and the [`engine::reducer::RtaReducer`] producing the
//!   conductivity tensor.
//!
//! - **[`workflows`]: The Public API.** [`workflows::rta::run`] executes a
//!   complete calculation from a validated [`engine::config::RtaConfig`] and a
//!   set of collaborators.

pub mod core;
pub mod engine;
pub mod workflows;
