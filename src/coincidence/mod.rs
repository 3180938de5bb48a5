//! Online coincidence counting between model spike trains and reference (target) spike
//! trains, along with the Gamma coincidence factor.
//!
//! Two independent matching strategies are provided, [`CoincidenceCounter`] precomputes the
//! closest reference spike for every interval of the timeline and then matches model spikes in
//! constant time, while [`dual_pointer::DualPointerCoincidenceCounter`] walks each reference train
//! with a pair of pointers and supports transmission delays as well as exclusive or inclusive
//! matching.

use rayon::prelude::*;
use crate::{
    error::{ConfigurationError, SpikeMonitorsError, StatisticalError},
    spike_monitor::{check_population, check_spikes, SpikeSink},
    timing::{check_timestep, quantize},
};

pub mod dual_pointer;


/// Margin added around every tolerance window so that spikes sitting exactly on the
/// window boundary are counted
pub const EPSILON: f64 = 1e-9;

/// Groups a list of `(train, time)` pairs into one ascending spike train per index,
/// there are as many trains as the largest index plus one
pub fn spikes_to_trains(data: &[(usize, f64)]) -> Result<Vec<Vec<f64>>, SpikeMonitorsError> {
    let num_trains = data.iter()
        .map(|(i, _)| *i + 1)
        .max()
        .ok_or(ConfigurationError::EmptyReferenceData)?;

    let mut trains = vec![Vec::new(); num_trains];
    for (i, t) in data {
        trains[*i].push(*t);
    }
    for train in trains.iter_mut() {
        train.sort_by(|a, b| a.total_cmp(b));
    }

    Ok(trains)
}

/// Mean firing rate (Hz) of an ascending spike train as the number of intervals over the
/// time spanned, `None` if the train has fewer than two spikes or spans no time
pub fn firing_rate(train: &[f64]) -> Option<f64> {
    match (train.first(), train.last()) {
        (Some(first), Some(last)) if train.len() > 1 && last > first => {
            Some((train.len() - 1) as f64 / (last - first))
        },
        _ => None,
    }
}

/// Calculates the Gamma coincidence factor of a model train against its reference train,
/// the number of coincidences is corrected by the count expected by chance given the
/// reference rate and normalized by the mean train length, errors if the normalizer is zero
///
/// - `unit` : model unit the factor is computed for (used to report errors)
///
/// - `coincidences` : number of coincident model spikes
///
/// - `delta` : half width of the coincidence window (seconds)
///
/// - `target_length` : number of spikes in the reference train
///
/// - `model_length` : number of spikes in the model train
///
/// - `target_rate` : mean firing rate of the reference train (Hz)
pub fn gamma_factor(
    unit: usize,
    coincidences: usize,
    delta: f64,
    target_length: usize,
    model_length: usize,
    target_rate: f64,
) -> Result<f64, SpikeMonitorsError> {
    let expected_coincidences = 2. * delta * target_length as f64 * target_rate;
    let norm = 0.5 * (1. - 2. * delta * target_rate);
    let normalizer = norm * (target_length + model_length) as f64;

    if !normalizer.is_finite() || normalizer.abs() < f64::EPSILON {
        return Err(StatisticalError::ZeroNormalizer(unit).into());
    }

    Ok((coincidences as f64 - expected_coincidences) / normalizer)
}

pub(crate) fn check_delta(delta: f64) -> Result<(), SpikeMonitorsError> {
    if !(delta.is_finite() && delta >= 0.) {
        return Err(ConfigurationError::NegativeTolerance.into());
    }

    Ok(())
}

/// Index of the first spike of an ascending train within `window` of `center`
fn closest_spike(train: &[f64], center: f64, window: f64) -> Option<usize> {
    let index = train.partition_point(|t| *t < center - window);

    match train.get(index) {
        Some(t) if *t <= center + window => Some(index),
        _ => None,
    }
}

/// Counts coincidences between the spikes of a model population and reference trains
/// online, each model unit is linked to one reference train and a reference spike is
/// credited at most once per model unit
///
/// Before the simulation the timeline is split at every reference spike time plus or
/// minus the tolerance window and, for every interval and reference train, the index of
/// the reference spike within the window of the interval center is stored, during the
/// simulation the current interval follows the clock and a model spike is coincident if
/// its reference train has a close spike in the current interval that has not already
/// been credited to that unit
///
/// ```rust
/// # use spike_monitors::{
/// #     coincidence::CoincidenceCounter,
/// #     error::SpikeMonitorsError,
/// #     spike_monitor::SpikeSink,
/// # };
/// # fn main() -> Result<(), SpikeMonitorsError> {
/// let dt = 0.001;
/// let reference = [(0, 0.010), (0, 0.030), (0, 0.050)];
/// let mut counter = CoincidenceCounter::new(1, dt, &reference, None, 0.004)?;
///
/// for step in 0..=100 {
///     let spikes: &[usize] = if [11, 31, 100].contains(&step) { &[0] } else { &[] };
///     counter.record(spikes, step as f64 * dt)?;
/// }
///
/// assert_eq!(counter.get_coincidences(), &[2]);
/// assert_eq!(counter.get_target_length(), &[3]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CoincidenceCounter {
    dt: f64,
    delta: f64,
    trains: Vec<Vec<f64>>,
    model_target: Vec<usize>,
    target_length: Vec<usize>,
    target_rates: Vec<Option<f64>>,
    all_bins: Vec<f64>,
    close_target_spikes_matrix: Vec<Vec<Option<usize>>>,
    current_bin: Option<usize>,
    last_target_spikes: Vec<Option<usize>>,
    coincidences: Vec<usize>,
    model_length: Vec<usize>,
}

impl CoincidenceCounter {
    /// Creates a counter for `num_units` model units from reference data given as `(train, time)`
    /// pairs (seconds)
    ///
    /// - `dt` : simulation timestep (seconds), reference times are rounded to it
    ///
    /// - `model_target` : index of the reference train linked to each model unit,
    /// every unit is linked to train `0` when `None`
    ///
    /// - `delta` : half width of the coincidence window (seconds)
    pub fn new(
        num_units: usize,
        dt: f64,
        data: &[(usize, f64)],
        model_target: Option<Vec<usize>>,
        delta: f64,
    ) -> Result<Self, SpikeMonitorsError> {
        CoincidenceCounter::from_trains(num_units, dt, spikes_to_trains(data)?, model_target, delta)
    }

    /// Creates a counter from reference data given as one spike train per index
    pub fn from_trains(
        num_units: usize,
        dt: f64,
        trains: Vec<Vec<f64>>,
        model_target: Option<Vec<usize>>,
        delta: f64,
    ) -> Result<Self, SpikeMonitorsError> {
        check_population(num_units)?;
        check_timestep(dt)?;
        check_delta(delta)?;
        if trains.iter().all(|train| train.is_empty()) {
            return Err(ConfigurationError::EmptyReferenceData.into());
        }

        let model_target = model_target.unwrap_or_else(|| vec![0; num_units]);
        if model_target.len() != num_units {
            return Err(ConfigurationError::LengthMismatch(num_units, model_target.len()).into());
        }
        if let Some((unit, train)) = model_target.iter().enumerate().find(|(_, j)| **j >= trains.len()) {
            return Err(ConfigurationError::TargetIndexOutOfRange(unit, *train).into());
        }

        let trains: Vec<Vec<f64>> = trains.into_iter()
            .map(|train| {
                let mut train: Vec<f64> = train.into_iter().map(|t| quantize(t, dt)).collect();
                train.sort_by(|a, b| a.total_cmp(b));

                train
            })
            .collect();

        let mut counter = CoincidenceCounter {
            dt,
            delta: quantize(delta, dt),
            target_length: trains.iter().map(|train| train.len()).collect(),
            target_rates: trains.iter().map(|train| firing_rate(train)).collect(),
            trains,
            model_target,
            all_bins: Vec::new(),
            close_target_spikes_matrix: Vec::new(),
            current_bin: None,
            last_target_spikes: vec![None; num_units],
            coincidences: vec![0; num_units],
            model_length: vec![0; num_units],
        };

        counter.compute_all_bins();
        counter.compute_close_target_spikes();

        Ok(counter)
    }

    /// Bin edges are every reference spike time plus and minus the tolerance window
    fn compute_all_bins(&mut self) {
        let window = self.delta + EPSILON;

        self.all_bins = self.trains.iter()
            .flatten()
            .flat_map(|t| [t - window, t + window])
            .collect();
        self.all_bins.sort_by(|a, b| a.total_cmp(b));
    }

    /// For every reference train and bin, finds the reference spike within the tolerance
    /// window of the bin center, the bin after the last edge never has a close spike
    fn compute_close_target_spikes(&mut self) {
        let window = self.delta + EPSILON;
        let centers: Vec<f64> = self.all_bins.windows(2)
            .map(|edges| (edges[0] + edges[1]) / 2.)
            .collect();

        self.close_target_spikes_matrix = self.trains.par_iter()
            .map(|train| {
                centers.iter()
                    .map(|center| closest_spike(train, *center, window))
                    .chain(std::iter::once(None))
                    .collect()
            })
            .collect();
    }

    /// Half width of the coincidence window after rounding to the timestep (seconds)
    pub fn get_delta(&self) -> f64 {
        self.delta
    }

    /// Simulation timestep (seconds)
    pub fn get_dt(&self) -> f64 {
        self.dt
    }

    /// Reference trains after rounding to the timestep
    pub fn get_trains(&self) -> &[Vec<f64>] {
        &self.trains
    }

    /// Reference train linked to each model unit
    pub fn get_model_target(&self) -> &[usize] {
        &self.model_target
    }

    /// Ascending bin edges of the precomputed lookup table
    pub fn get_all_bins(&self) -> &[f64] {
        &self.all_bins
    }

    /// Lookup table indexed by reference train and bin, holding the index of the reference
    /// spike within the tolerance window of the bin if any
    pub fn get_close_target_spikes_matrix(&self) -> &[Vec<Option<usize>>] {
        &self.close_target_spikes_matrix
    }

    /// Bin the clock is currently in, `None` before the first edge
    pub fn get_current_bin(&self) -> Option<usize> {
        self.current_bin
    }

    /// Closest reference spike of the given train in the current bin
    pub fn close_target_spike(&self, train: usize) -> Option<usize> {
        self.current_bin
            .and_then(|bin| self.close_target_spikes_matrix.get(train).and_then(|row| row[bin]))
    }

    /// Number of coincidences of each model unit
    pub fn get_coincidences(&self) -> &[usize] {
        &self.coincidences
    }

    /// Number of spikes of each model unit
    pub fn get_model_length(&self) -> &[usize] {
        &self.model_length
    }

    /// Number of spikes of each reference train
    pub fn get_target_length(&self) -> &[usize] {
        &self.target_length
    }

    /// Mean firing rate of each reference train if defined
    pub fn get_target_rates(&self) -> &[Option<f64>] {
        &self.target_rates
    }

    /// Gamma factor of the given model unit against its reference train
    pub fn gamma_for(&self, unit: usize) -> Result<f64, SpikeMonitorsError> {
        let train = *self.model_target
            .get(unit)
            .ok_or(ConfigurationError::UnitIndexOutOfRange(unit))?;
        let target_rate = self.target_rates[train].ok_or(StatisticalError::UndefinedFiringRate(train))?;

        gamma_factor(
            unit,
            self.coincidences[unit],
            self.delta,
            self.target_length[train],
            self.model_length[unit],
            target_rate,
        )
    }

    /// Gamma factor of every model unit
    pub fn gamma(&self) -> Result<Vec<f64>, SpikeMonitorsError> {
        (0..self.model_target.len())
            .map(|unit| self.gamma_for(unit))
            .collect()
    }
}

impl SpikeSink for CoincidenceCounter {
    fn record(&mut self, spikes: &[usize], t: f64) -> Result<(), SpikeMonitorsError> {
        check_spikes(spikes, self.model_target.len())?;

        let t = quantize(t, self.dt);
        loop {
            let next_bin = self.current_bin.map_or(0, |bin| bin + 1);
            match self.all_bins.get(next_bin) {
                Some(edge) if t > *edge => self.current_bin = Some(next_bin),
                _ => break,
            }
        }

        for &i in spikes {
            self.model_length[i] += 1;

            if let Some(close_target_spike) = self.close_target_spike(self.model_target[i]) {
                // each reference spike is credited at most once per unit
                if self.last_target_spikes[i].map_or(true, |last| close_target_spike > last) {
                    self.coincidences[i] += 1;
                    self.last_target_spikes[i] = Some(close_target_spike);
                }
            }
        }

        Ok(())
    }

    fn reset(&mut self) -> Result<(), SpikeMonitorsError> {
        self.current_bin = None;
        self.last_target_spikes.iter_mut().for_each(|last| *last = None);
        self.coincidences.iter_mut().for_each(|count| *count = 0);
        self.model_length.iter_mut().for_each(|count| *count = 0);

        Ok(())
    }
}
