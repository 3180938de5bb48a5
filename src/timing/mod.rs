//! Helpers to align real valued times with the simulation timestep.

use crate::error::{ConfigurationError, SpikeMonitorsError};


/// Checks that the simulation timestep (seconds) is usable, errors if it is
/// zero, negative or not finite
pub fn check_timestep(dt: f64) -> Result<(), SpikeMonitorsError> {
    if !(dt.is_finite() && dt > 0.) {
        return Err(ConfigurationError::NonPositiveTimestep.into());
    }

    Ok(())
}

/// Rounds a time (seconds) to the nearest multiple of the timestep so
/// comparisons at bin boundaries do not depend on floating point drift
pub fn quantize(time: f64, dt: f64) -> f64 {
    (time / dt).round() * dt
}

/// Converts a time (seconds) to the nearest whole number of timesteps
pub fn to_steps(time: f64, dt: f64) -> i64 {
    (time / dt).round() as i64
}

/// Converts a duration (seconds) to a number of timesteps, rounding to the nearest
/// step rather than truncating (`0.003 / 0.001` is `2.999...` in floating point)
pub fn duration_to_steps(duration: f64, dt: f64) -> usize {
    let steps = (duration / dt).round();

    if steps.is_finite() && steps > 0. {
        steps as usize
    } else {
        0
    }
}
