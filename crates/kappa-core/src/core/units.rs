//! Physical constants and unit conversions used by the conductivity engine.
//!
//! Frequencies are in THz, group velocities in THz·Å, heat capacities in eV/K,
//! linewidths in THz and volumes in Å³.

use std::f64::consts::PI;

pub const THZ: f64 = 1.0e12;
pub const ANGSTROM: f64 = 1.0e-10;
pub const EV: f64 = 1.60217733e-19;
/// Boltzmann constant in eV/K.
pub const KB_EV: f64 = 8.6173383e-05;
pub const THZ_TO_EV: f64 = 0.00413566733;

/// Heat capacity of a single harmonic mode of energy `energy_ev` at `temperature` (eV/K).
///
/// The caller is responsible for keeping `temperature` away from zero; see
/// [`crate::core::heat_capacity`] for the guarded evaluation.
#[inline]
pub fn mode_cv(temperature: f64, energy_ev: f64) -> f64 {
    let x = energy_ev / (KB_EV * temperature);
    // Written in e^{-x} so that large x underflows to zero instead of inf/inf.
    let exp_neg = (-x).exp();
    let denom = -(-x).exp_m1();
    KB_EV * x * x * exp_neg / (denom * denom)
}

/// Factor turning `v⊗v · Cv / (2Γ)` summed over the Brillouin zone into W/m-K.
///
/// `volume` is the primitive cell volume in Å³.
pub fn kappa_conversion_factor(volume: f64) -> f64 {
    let unit_to_wmk = (THZ * ANGSTROM).powi(2) / ANGSTROM.powi(3) * EV / THZ / (2.0 * PI);
    unit_to_wmk / volume
}
