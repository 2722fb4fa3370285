//! Persistence of linewidths and conductivity results.
//!
//! This module defines the read/write contract the engine relies on for
//! incremental output and for restarting from previously computed linewidths.
//! Records are keyed by mesh, mesh divisors, broadening and, for per-point
//! records, the grid point. Two stores are provided: an in-process
//! [`memory::MemoryStore`] and a directory of TOML files
//! ([`toml_store::TomlStore`]).

pub mod memory;
pub mod record;
pub mod toml_store;
pub mod traits;
