//! # Engine Module
//!
//! The stateful part of a conductivity run: per-grid-point iteration, restart
//! from persisted linewidths and the final tensor reduction.
//!
//! ## Overview
//!
//! A run allocates one slot per requested grid point in [`state::GridData`].
//! [`iterator::GridIterator`] fills the slots one grid point at a time, either
//! by driving the collision collaborator or by taking linewidths restored
//! through [`restart::load_gamma`]. Once every slot is complete,
//! [`reducer::RtaReducer`] sums the symmetrized contributions into the
//! conductivity tensor.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Run parameters and their validating builder
//! - **Collaborators** ([`context`]) - Borrowed handles to the external calculators
//! - **State Tracking** ([`state`]) - Per-grid-point arrays and their completion state
//! - **Iteration** ([`iterator`]) - One-step-per-grid-point computation
//! - **Restart** ([`restart`]) - All-or-nothing loading of persisted linewidths
//! - **Reduction** ([`reducer`]) - k-star averaged RTA conductivity
//! - **Reporting** ([`report`], [`progress`]) - Text tables and progress events
//! - **Error Handling** ([`error`]) - Engine-specific error types

pub mod config;
pub mod context;
pub mod error;
pub mod iterator;
pub mod progress;
pub mod reducer;
pub mod report;
pub mod restart;
pub mod state;
