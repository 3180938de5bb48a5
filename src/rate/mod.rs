//! Population rate monitoring over fixed width time bins.

use std::str::FromStr;
use crate::{
    error::{ConfigurationError, SpikeMonitorsError},
    spike_monitor::{check_population, check_spikes, SpikeSink},
    timing::{check_timestep, duration_to_steps},
};


/// Filter used to smooth a rate series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmoothingKernel {
    /// Gaussian window spanning two widths on either side of the center
    Gaussian,
    /// Rectangular window of the given width
    Flat,
}

impl FromStr for SmoothingKernel {
    type Err = SpikeMonitorsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gaussian" => Ok(SmoothingKernel::Gaussian),
            "flat" => Ok(SmoothingKernel::Flat),
            _ => Err(ConfigurationError::InvalidParameter(format!("unknown smoothing kernel '{}'", s)).into()),
        }
    }
}

impl SmoothingKernel {
    /// Generates the normalized window for a width given in bins
    fn window(&self, width: usize) -> Vec<f64> {
        let window: Vec<f64> = match self {
            SmoothingKernel::Gaussian => {
                let extent = 2 * width as i64;
                let variance = 2. * (width as f64).powi(2);

                (-extent..=extent)
                    .map(|i| (-(i as f64).powi(2) / variance).exp())
                    .collect()
            },
            SmoothingKernel::Flat => vec![1.; width],
        };

        let total: f64 = window.iter().sum();

        window.into_iter().map(|i| i / total).collect()
    }
}

/// Convolves `values` with `window` keeping the output centered and the same length as `values`
fn convolve_same(values: &[f64], window: &[f64]) -> Vec<f64> {
    let offset = (window.len() - 1) / 2;

    (0..values.len())
        .map(|n| {
            // index into the full convolution of length values.len() + window.len() - 1
            let k = n + offset;
            window.iter()
                .enumerate()
                .filter_map(|(j, w)| {
                    k.checked_sub(j)
                        .and_then(|i| values.get(i))
                        .map(|value| value * w)
                })
                .sum()
        })
        .collect()
}

/// Monitors the population rate (Hz) of a group of units, every bin covers `bin` timesteps
/// and the rate of a bin is the spike count divided by the bin duration and population size
///
/// ```rust
/// # use spike_monitors::{error::SpikeMonitorsError, rate::PopulationRateMonitor, spike_monitor::SpikeSink};
/// # fn main() -> Result<(), SpikeMonitorsError> {
/// let dt = 0.001;
/// let mut monitor = PopulationRateMonitor::new(10, dt, Some(0.005))?;
///
/// for step in 0..20 {
///     monitor.record(&[0, 1], step as f64 * dt)?;
/// }
///
/// // 2 spikes per step over 10 units is 200 Hz
/// assert_eq!(monitor.get_num_closed_bins(), 4);
/// assert!(monitor.get_closed_rates().iter().all(|rate| (rate - 200.).abs() < 1e-9));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PopulationRateMonitor {
    bin: usize,
    dt: f64,
    num_units: usize,
    factor: f64,
    rates: Vec<f64>,
    times: Vec<f64>,
    steps_left: usize,
}

impl PopulationRateMonitor {
    /// Creates a rate monitor for `num_units` units with the given timestep (seconds),
    /// the bin duration (seconds) defaults to a single timestep
    pub fn new(num_units: usize, dt: f64, bin_duration: Option<f64>) -> Result<Self, SpikeMonitorsError> {
        check_population(num_units)?;
        check_timestep(dt)?;

        let bin = match bin_duration {
            Some(duration) => duration_to_steps(duration, dt),
            None => 1,
        };
        if bin == 0 {
            return Err(ConfigurationError::NonPositiveBinWidth.into());
        }

        Ok(PopulationRateMonitor {
            bin,
            dt,
            num_units,
            factor: 1. / (bin as f64 * dt * num_units as f64),
            rates: Vec::new(),
            times: Vec::new(),
            steps_left: 0,
        })
    }

    /// Bin width in timesteps
    pub fn get_bin(&self) -> usize {
        self.bin
    }

    /// Bin width in seconds
    pub fn get_bin_duration(&self) -> f64 {
        self.bin as f64 * self.dt
    }

    /// Rates (Hz) of every bin, the last bin may still be open
    pub fn get_rates(&self) -> &[f64] {
        &self.rates
    }

    /// Start times (seconds) of every bin
    pub fn get_times(&self) -> &[f64] {
        &self.times
    }

    /// Number of bins that have received all of their timesteps
    pub fn get_num_closed_bins(&self) -> usize {
        if self.steps_left == 0 {
            self.rates.len()
        } else {
            self.rates.len() - 1
        }
    }

    /// Rates (Hz) of the bins that have received all of their timesteps
    pub fn get_closed_rates(&self) -> &[f64] {
        &self.rates[..self.get_num_closed_bins()]
    }

    /// Smooths the closed rates by convolving them with the given kernel, `width` is in seconds
    /// and must cover at least one bin, the output has the same length as the closed rates
    pub fn smooth_rate(&self, width: f64, kernel: SmoothingKernel) -> Result<Vec<f64>, SpikeMonitorsError> {
        let width_bins = duration_to_steps(width, self.get_bin_duration());
        if width_bins == 0 {
            return Err(ConfigurationError::SmoothingWidthTooSmall.into());
        }

        Ok(convolve_same(self.get_closed_rates(), &kernel.window(width_bins)))
    }
}

impl SpikeSink for PopulationRateMonitor {
    fn record(&mut self, spikes: &[usize], t: f64) -> Result<(), SpikeMonitorsError> {
        check_spikes(spikes, self.num_units)?;

        if self.steps_left == 0 {
            self.rates.push(0.);
            self.times.push(t);
            self.steps_left = self.bin;
        }

        if let Some(rate) = self.rates.last_mut() {
            *rate += spikes.len() as f64 * self.factor;
        }
        self.steps_left -= 1;

        Ok(())
    }

    fn reset(&mut self) -> Result<(), SpikeMonitorsError> {
        self.rates.clear();
        self.times.clear();
        self.steps_left = 0;

        Ok(())
    }
}
