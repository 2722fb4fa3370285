//! # Workflows Module
//!
//! High-level entry points that tie the `engine` and `core` layers together
//! into complete calculations.
//!
//! ## Architecture
//!
//! - **RTA Workflow** ([`rta`]) - Lattice thermal conductivity in the
//!   relaxation-time approximation: optional restart from persisted
//!   linewidths, per-grid-point computation with optional checkpointing,
//!   and the k-star averaged reduction.

pub mod rta;
