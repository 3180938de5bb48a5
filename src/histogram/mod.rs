//! Interspike interval histogram monitoring.

use crate::{
    error::{ConfigurationError, SpikeMonitorsError},
    spike_monitor::{check_population, check_spikes, SpikeSink},
};


// last spike time of a unit that has not spiked, makes its first interval infinite
const NO_SPIKE: f64 = f64::NEG_INFINITY;

/// Records the interspike interval histogram of a group of units, `bins` are the lower bounds
/// of each bin so that `[0., 0.01, 0.02]` gives the bins `[0, 10) ms`, `[10, 20) ms` and `20+ ms`,
/// the first spike of a unit has no preceding spike so its interval is infinite and lands in
/// the last bin, intervals shorter than the first lower bound are tallied separately as underflow
///
/// ```rust
/// # use spike_monitors::{error::SpikeMonitorsError, histogram::ISIHistogramMonitor, spike_monitor::SpikeSink};
/// # fn main() -> Result<(), SpikeMonitorsError> {
/// let mut monitor = ISIHistogramMonitor::new(1, &[0., 0.010, 0.020])?;
///
/// monitor.record(&[0], 0.000)?;
/// monitor.record(&[0], 0.005)?;
/// monitor.record(&[0], 0.020)?;
/// monitor.record(&[0], 0.100)?;
///
/// // first spike, 5 ms, 15 ms and 80 ms
/// assert_eq!(monitor.get_count(), &[1, 1, 2]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ISIHistogramMonitor {
    bins: Vec<f64>,
    count: Vec<usize>,
    underflow: usize,
    last_spike_times: Vec<f64>,
}

impl ISIHistogramMonitor {
    /// Creates a histogram monitor for `num_units` units with the given ascending bin lower bounds (seconds)
    pub fn new(num_units: usize, bins: &[f64]) -> Result<Self, SpikeMonitorsError> {
        check_population(num_units)?;
        if bins.is_empty() {
            return Err(ConfigurationError::EmptyBins.into());
        }
        if bins.iter().any(|i| !i.is_finite()) || bins.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(ConfigurationError::BinsNotAscending.into());
        }

        Ok(ISIHistogramMonitor {
            bins: bins.to_vec(),
            count: vec![0; bins.len()],
            underflow: 0,
            last_spike_times: vec![NO_SPIKE; num_units],
        })
    }

    /// Lower bounds of each bin
    pub fn get_bins(&self) -> &[f64] {
        &self.bins
    }

    /// Number of intervals in each bin
    pub fn get_count(&self) -> &[usize] {
        &self.count
    }

    /// Number of intervals shorter than the first lower bound
    pub fn get_underflow(&self) -> usize {
        self.underflow
    }

    /// Lower bounds and counts with the underflow prepended as a bin starting at `-inf`
    pub fn get_series(&self) -> (Vec<f64>, Vec<usize>) {
        let lower_bounds = std::iter::once(f64::NEG_INFINITY).chain(self.bins.iter().copied()).collect();
        let count = std::iter::once(self.underflow).chain(self.count.iter().copied()).collect();

        (lower_bounds, count)
    }

    /// Total number of intervals seen
    pub fn get_num_intervals(&self) -> usize {
        self.count.iter().sum::<usize>() + self.underflow
    }

    /// Index of the bin the interval falls in, the last bin is open ended
    fn bin_index(&self, interval: f64) -> Option<usize> {
        // number of lower bounds that are less than or equal to the interval
        let position = self.bins.partition_point(|lower| *lower <= interval);

        position.checked_sub(1)
    }
}

impl SpikeSink for ISIHistogramMonitor {
    fn record(&mut self, spikes: &[usize], t: f64) -> Result<(), SpikeMonitorsError> {
        check_spikes(spikes, self.last_spike_times.len())?;

        for &i in spikes {
            match self.bin_index(t - self.last_spike_times[i]) {
                Some(index) => self.count[index] += 1,
                None => self.underflow += 1,
            }

            self.last_spike_times[i] = t;
        }

        Ok(())
    }

    fn reset(&mut self) -> Result<(), SpikeMonitorsError> {
        self.count.iter_mut().for_each(|count| *count = 0);
        self.underflow = 0;
        self.last_spike_times.iter_mut().for_each(|time| *time = NO_SPIKE);

        Ok(())
    }
}
