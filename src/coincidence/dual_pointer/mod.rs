//! Coincidence counting by walking every reference train with a pair of pointers.

use std::str::FromStr;
use crate::{
    error::{ConfigurationError, SpikeMonitorsError, StatisticalError},
    spike_monitor::{check_population, check_spikes, SpikeSink},
    timing::{check_timestep, to_steps},
};
use super::{check_delta, gamma_factor};


/// Whether a reference spike may be matched by more than one model spike
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoincidenceAlgorithm {
    /// A reference spike is matched at most once, the matching is one to one
    Exclusive,
    /// Every model spike near a reference spike counts as a coincidence
    Inclusive,
}

impl FromStr for CoincidenceAlgorithm {
    type Err = SpikeMonitorsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "exclusive" => Ok(CoincidenceAlgorithm::Exclusive),
            "inclusive" => Ok(CoincidenceAlgorithm::Inclusive),
            _ => Err(ConfigurationError::InvalidParameter(format!("unknown coincidence algorithm '{}'", s)).into()),
        }
    }
}

/// Counts coincidences between model spikes and reference spikes by keeping, for every
/// model unit, the reference spikes immediately before and after the current time
///
/// Reference data is a single flat array of concatenated trains where `spiketimes_offset[i]`
/// is the index of the first entry of the train linked to unit `i`, every train must be
/// padded with a sentinel spike before time zero and a sentinel spike after the end of the
/// simulation, the pointers advance by one reference spike per step and running into the
/// next train is reported as an error
///
/// With the exclusive algorithm a reference spike credits at most one coincidence per unit,
/// with the inclusive algorithm every model spike within the window of a reference spike is a
/// coincidence, in both cases a single model spike credits at most one coincidence
///
/// ```rust
/// # use spike_monitors::{
/// #     coincidence::dual_pointer::{CoincidenceAlgorithm, DualPointerCoincidenceCounter},
/// #     error::SpikeMonitorsError,
/// #     spike_monitor::SpikeSink,
/// # };
/// # fn main() -> Result<(), SpikeMonitorsError> {
/// let dt = 0.001;
/// let mut counter = DualPointerCoincidenceCounter::from_trains(
///     1, dt, &[vec![0.010, 0.030, 0.050]], None, None, CoincidenceAlgorithm::Exclusive, 0.004, 0.1,
/// )?;
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
pub struct DualPointerCoincidenceCounter {
    num_units: usize,
    dt: f64,
    delta: i64,
    algorithm: CoincidenceAlgorithm,
    data: Vec<i64>,
    spiketimes_offset: Vec<usize>,
    spike_delays: Vec<f64>,
    target_rates: Option<Vec<f64>>,
    spiketime_index: Vec<usize>,
    last_spike_time: Vec<i64>,
    next_spike_time: Vec<i64>,
    last_spike_allowed: Vec<bool>,
    next_spike_allowed: Vec<bool>,
    first_target_spike: Vec<i64>,
    coincidences: Vec<usize>,
    model_length: Vec<usize>,
    target_length: Vec<usize>,
}

impl DualPointerCoincidenceCounter {
    /// Creates a counter for `num_units` model units
    ///
    /// - `dt` : simulation timestep (seconds), reference times and the window are rounded to it
    ///
    /// - `data` : concatenated sentinel padded reference trains (seconds)
    ///
    /// - `spiketimes_offset` : index in `data` of the leading sentinel of the train of each
    /// unit, every unit starts at `0` when `None`
    ///
    /// - `spike_delays` : delay (seconds) added to the spike times of each unit, no delay when `None`
    ///
    /// - `algorithm` : exclusive or inclusive matching
    ///
    /// - `delta` : half width of the coincidence window (seconds)
    pub fn new(
        num_units: usize,
        dt: f64,
        data: &[f64],
        spiketimes_offset: Option<Vec<usize>>,
        spike_delays: Option<Vec<f64>>,
        algorithm: CoincidenceAlgorithm,
        delta: f64,
    ) -> Result<Self, SpikeMonitorsError> {
        check_population(num_units)?;
        check_timestep(dt)?;
        check_delta(delta)?;
        if data.is_empty() {
            return Err(ConfigurationError::EmptyReferenceData.into());
        }

        let spiketimes_offset = spiketimes_offset.unwrap_or_else(|| vec![0; num_units]);
        if spiketimes_offset.len() != num_units {
            return Err(ConfigurationError::LengthMismatch(num_units, spiketimes_offset.len()).into());
        }
        let spike_delays = spike_delays.unwrap_or_else(|| vec![0.; num_units]);
        if spike_delays.len() != num_units {
            return Err(ConfigurationError::LengthMismatch(num_units, spike_delays.len()).into());
        }

        for (unit, offset) in spiketimes_offset.iter().enumerate() {
            // a leading sentinel and at least one following entry
            match (data.get(*offset), data.get(*offset + 1)) {
                (Some(sentinel), Some(_)) if *sentinel < 0. => {},
                _ => return Err(ConfigurationError::MissingSentinelPadding(unit).into()),
            }
        }

        let mut counter = DualPointerCoincidenceCounter {
            num_units,
            dt,
            delta: to_steps(delta, dt),
            algorithm,
            data: data.iter().map(|t| to_steps(*t, dt)).collect(),
            spiketimes_offset,
            spike_delays,
            target_rates: None,
            spiketime_index: vec![0; num_units],
            last_spike_time: vec![0; num_units],
            next_spike_time: vec![0; num_units],
            last_spike_allowed: vec![true; num_units],
            next_spike_allowed: vec![true; num_units],
            first_target_spike: vec![0; num_units],
            coincidences: vec![0; num_units],
            model_length: vec![0; num_units],
            target_length: vec![0; num_units],
        };
        counter.reset_pointers();

        Ok(counter)
    }

    /// Creates a counter from one spike train per index, padding every train with a sentinel at
    /// `-1` second and one at `duration + 1` seconds
    ///
    /// - `model_target` : index of the train linked to each model unit, train `0` for every unit when `None`
    ///
    /// - `duration` : simulated duration (seconds)
    #[allow(clippy::too_many_arguments)]
    pub fn from_trains(
        num_units: usize,
        dt: f64,
        trains: &[Vec<f64>],
        model_target: Option<Vec<usize>>,
        spike_delays: Option<Vec<f64>>,
        algorithm: CoincidenceAlgorithm,
        delta: f64,
        duration: f64,
    ) -> Result<Self, SpikeMonitorsError> {
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

        let mut data = Vec::with_capacity(trains.iter().map(|train| train.len() + 2).sum());
        let mut train_offsets = Vec::with_capacity(trains.len());
        for train in trains {
            let mut train = train.clone();
            train.sort_by(|a, b| a.total_cmp(b));

            train_offsets.push(data.len());
            data.push(-1.);
            data.extend(train);
            data.push(duration + 1.);
        }

        let spiketimes_offset = model_target.iter().map(|j| train_offsets[*j]).collect();

        DualPointerCoincidenceCounter::new(
            num_units, dt, &data, Some(spiketimes_offset), spike_delays, algorithm, delta,
        )
    }

    fn reset_pointers(&mut self) {
        for i in 0..self.num_units {
            let offset = self.spiketimes_offset[i];

            self.spiketime_index[i] = offset;
            self.last_spike_time[i] = self.data[offset];
            self.next_spike_time[i] = self.data[offset + 1];
        }

        self.last_spike_allowed.iter_mut().for_each(|allowed| *allowed = true);
        self.next_spike_allowed.iter_mut().for_each(|allowed| *allowed = true);
        self.first_target_spike.iter_mut().for_each(|time| *time = 0);
    }

    /// Overrides the reference firing rates (Hz) used in the Gamma factor, one per unit
    pub fn set_target_rates(&mut self, target_rates: Vec<f64>) -> Result<(), SpikeMonitorsError> {
        if target_rates.len() != self.num_units {
            return Err(ConfigurationError::LengthMismatch(self.num_units, target_rates.len()).into());
        }

        self.target_rates = Some(target_rates);

        Ok(())
    }

    /// Estimates reference firing rates from the reference spikes passed so far instead of
    /// using rates given with [`Self::set_target_rates`]
    pub fn clear_target_rates(&mut self) {
        self.target_rates = None;
    }

    /// Matching algorithm
    pub fn get_algorithm(&self) -> CoincidenceAlgorithm {
        self.algorithm
    }

    /// Half width of the coincidence window (seconds) after rounding to the timestep
    pub fn get_delta(&self) -> f64 {
        self.delta as f64 * self.dt
    }

    /// Transmission delay of each unit (seconds)
    pub fn get_spike_delays(&self) -> &[f64] {
        &self.spike_delays
    }

    /// Index in the reference data of the first entry of each unit's train
    pub fn get_spiketimes_offset(&self) -> &[usize] {
        &self.spiketimes_offset
    }

    /// Index in the reference data of the last passed reference spike of each unit
    pub fn get_spiketime_index(&self) -> &[usize] {
        &self.spiketime_index
    }

    /// Last passed reference spike (seconds) of each unit
    pub fn get_last_spike_time(&self, unit: usize) -> Result<f64, SpikeMonitorsError> {
        self.last_spike_time
            .get(unit)
            .map(|steps| *steps as f64 * self.dt)
            .ok_or(ConfigurationError::UnitIndexOutOfRange(unit).into())
    }

    /// Next upcoming reference spike (seconds) of each unit
    pub fn get_next_spike_time(&self, unit: usize) -> Result<f64, SpikeMonitorsError> {
        self.next_spike_time
            .get(unit)
            .map(|steps| *steps as f64 * self.dt)
            .ok_or(ConfigurationError::UnitIndexOutOfRange(unit).into())
    }

    /// Number of coincidences of each model unit
    pub fn get_coincidences(&self) -> &[usize] {
        &self.coincidences
    }

    /// Number of spikes of each model unit
    pub fn get_model_length(&self) -> &[usize] {
        &self.model_length
    }

    /// Number of reference spikes passed by each unit's pointer
    pub fn get_target_length(&self) -> &[usize] {
        &self.target_length
    }

    /// Reference firing rate (Hz) of the given unit, either set explicitly or estimated
    /// from the reference spikes passed so far
    pub fn target_rate(&self, unit: usize) -> Result<f64, SpikeMonitorsError> {
        if unit >= self.num_units {
            return Err(ConfigurationError::UnitIndexOutOfRange(unit).into());
        }
        if let Some(target_rates) = &self.target_rates {
            return Ok(target_rates[unit]);
        }

        let span = self.last_spike_time[unit] - self.first_target_spike[unit];
        if self.target_length[unit] < 2 || span <= 0 {
            return Err(StatisticalError::UndefinedFiringRate(unit).into());
        }

        Ok((self.target_length[unit] - 1) as f64 / (self.dt * span as f64))
    }

    /// Gamma factor of the given model unit against its reference train
    pub fn gamma_for(&self, unit: usize) -> Result<f64, SpikeMonitorsError> {
        let target_rate = self.target_rate(unit)?;

        gamma_factor(
            unit,
            self.coincidences[unit],
            self.get_delta(),
            self.target_length[unit],
            self.model_length[unit],
            target_rate,
        )
    }

    /// Gamma factor of every model unit
    pub fn gamma(&self) -> Result<Vec<f64>, SpikeMonitorsError> {
        (0..self.num_units)
            .map(|unit| self.gamma_for(unit))
            .collect()
    }

    /// Moves the pointers of the given unit forward by one reference spike
    fn advance(&mut self, unit: usize) -> Result<(), SpikeMonitorsError> {
        let index = self.spiketime_index[unit] + 1;
        let following = *self.data
            .get(index + 1)
            .ok_or(ConfigurationError::SentinelExhausted(unit))?;
        // trains are ascending so going backwards means the next train was reached
        if following < self.next_spike_time[unit] {
            return Err(ConfigurationError::SentinelExhausted(unit).into());
        }

        self.target_length[unit] += 1;
        self.spiketime_index[unit] = index;
        self.last_spike_time[unit] = self.next_spike_time[unit];
        self.next_spike_time[unit] = following;

        if self.target_length[unit] == 1 {
            self.first_target_spike[unit] = self.last_spike_time[unit];
        }

        if self.algorithm == CoincidenceAlgorithm::Exclusive {
            self.last_spike_allowed[unit] = self.next_spike_allowed[unit];
            self.next_spike_allowed[unit] = true;
        }

        Ok(())
    }
}

impl SpikeSink for DualPointerCoincidenceCounter {
    fn record(&mut self, spikes: &[usize], t: f64) -> Result<(), SpikeMonitorsError> {
        check_spikes(spikes, self.num_units)?;

        let mut has_spiked = vec![false; self.num_units];
        for &i in spikes {
            has_spiked[i] = true;
            self.model_length[i] += 1;
        }

        for i in 0..self.num_units {
            let time = to_steps(t + self.spike_delays[i], self.dt);

            if has_spiked[i] {
                let near_last_spike = self.last_spike_time[i] + self.delta >= time;
                let near_next_spike = self.next_spike_time[i] - self.delta <= time;
                let matches_last = near_last_spike && self.last_spike_allowed[i];
                let matches_next = near_next_spike && self.next_spike_allowed[i];

                if matches_last || matches_next {
                    self.coincidences[i] += 1;
                }

                if self.algorithm == CoincidenceAlgorithm::Exclusive {
                    // a spike near both keeps the next reference spike available
                    let matches_both = matches_last && matches_next;
                    self.last_spike_allowed[i] &= !near_last_spike;
                    self.next_spike_allowed[i] = (self.next_spike_allowed[i] && !near_next_spike) || matches_both;
                }
            }

            if time >= self.next_spike_time[i] {
                self.advance(i)?;
            }
        }

        Ok(())
    }

    fn reset(&mut self) -> Result<(), SpikeMonitorsError> {
        self.coincidences.iter_mut().for_each(|count| *count = 0);
        self.model_length.iter_mut().for_each(|count| *count = 0);
        self.target_length.iter_mut().for_each(|count| *count = 0);
        self.reset_pointers();

        Ok(())
    }
}
