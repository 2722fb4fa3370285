//! Guarded mode heat capacities for one grid point.
//!
//! Entries are evaluated with Bose-Einstein statistics only when the frequency
//! is above the cutoff and the temperature exceeds one hundredth of the
//! frequency (T in K, f in THz). Everything else is exactly zero, so the
//! T→0 and f→0 limits never produce NaN or infinities.

use super::units::{THZ_TO_EV, mode_cv};
use ndarray::Array2;

/// A mode is frozen out unless `T > f / STABILITY_DIVISOR`.
pub const STABILITY_DIVISOR: f64 = 100.0;

/// Whether the mode heat capacity at `frequency` (THz) and `temperature` (K)
/// is evaluated at all.
#[inline]
pub fn is_evaluated(frequency: f64, temperature: f64, cutoff_frequency: f64) -> bool {
    frequency > cutoff_frequency && temperature > frequency / STABILITY_DIVISOR
}

/// Mode heat capacities `[temperature, band]` in eV/K.
pub fn mode_heat_capacities(
    frequencies: &[f64],
    temperatures: &[f64],
    cutoff_frequency: f64,
) -> Array2<f64> {
    let mut cv = Array2::zeros((temperatures.len(), frequencies.len()));
    for (band, &f) in frequencies.iter().enumerate() {
        for (k, &t) in temperatures.iter().enumerate() {
            if is_evaluated(f, t, cutoff_frequency) {
                cv[[k, band]] = mode_cv(t, f * THZ_TO_EV);
            }
        }
    }
    cv
}
