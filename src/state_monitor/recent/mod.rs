//! Bounded recording of the most recent values of a state variable.

use ndarray::{Array1, Array2, Axis};
use crate::{
    error::{ConfigurationError, QueryError, SpikeMonitorsError},
    spike_monitor::check_population,
    timing::{check_timestep, duration_to_steps},
};
use super::{check_recording_interval, check_state, RecordSelection, RunningMoments, StateSink};


/// Records only the most recent fixed amount of time of a state variable in a circular buffer,
/// the buffer holds `capacity` recordings and the write index wraps back to `0` once it
/// reaches the end, after which every slot holds meaningful data and `has_looped` is `true`,
/// sorted accessors always return data in chronological order
///
/// ```rust
/// # use spike_monitors::{
/// #     error::SpikeMonitorsError,
/// #     state_monitor::{RecordSelection, StateSink, recent::RecentStateMonitor},
/// # };
/// # fn main() -> Result<(), SpikeMonitorsError> {
/// let dt = 0.001;
/// let mut monitor = RecentStateMonitor::with_capacity(1, dt, 3, RecordSelection::All, 1)?;
///
/// for step in 0..5 {
///     monitor.record(&[step as f64], step as f64 * dt)?;
/// }
///
/// assert!(monitor.has_looped());
/// assert_eq!(monitor.get_values(0)?.to_vec(), vec![2., 3., 4.]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RecentStateMonitor {
    num_units: usize,
    dt: f64,
    timestep: usize,
    record_indices: Vec<usize>,
    capacity: usize,
    values: Array2<f64>,
    times: Array1<f64>,
    current_time_index: usize,
    has_looped: bool,
    current_time: Option<f64>,
    num_steps: usize,
    moments: RunningMoments,
}

impl RecentStateMonitor {
    /// Creates a monitor keeping `duration` seconds of history, recording the selected units
    /// every `timestep` steps of length `dt` (seconds)
    pub fn new(
        num_units: usize,
        dt: f64,
        duration: f64,
        selection: RecordSelection,
        timestep: usize,
    ) -> Result<Self, SpikeMonitorsError> {
        check_timestep(dt)?;
        check_recording_interval(timestep)?;

        let capacity = duration_to_steps(duration, dt * timestep as f64);

        RecentStateMonitor::with_capacity(num_units, dt, capacity, selection, timestep)
    }

    /// Creates a monitor holding `capacity` recordings
    pub fn with_capacity(
        num_units: usize,
        dt: f64,
        capacity: usize,
        selection: RecordSelection,
        timestep: usize,
    ) -> Result<Self, SpikeMonitorsError> {
        check_population(num_units)?;
        check_timestep(dt)?;
        check_recording_interval(timestep)?;
        if capacity == 0 {
            return Err(ConfigurationError::NonPositiveCapacity.into());
        }

        let record_indices = selection.indices(num_units)?;

        Ok(RecentStateMonitor {
            num_units,
            dt,
            timestep,
            capacity,
            values: Array2::zeros((capacity, record_indices.len())),
            times: Array1::zeros(capacity),
            record_indices,
            current_time_index: 0,
            has_looped: false,
            current_time: None,
            num_steps: 0,
            moments: RunningMoments::new(num_units),
        })
    }

    /// Number of recordings the buffer holds
    pub fn get_capacity(&self) -> usize {
        self.capacity
    }

    /// Units whose values are recorded, in recording order
    pub fn get_record_indices(&self) -> &[usize] {
        &self.record_indices
    }

    /// Index the next recording will be written to
    pub fn get_current_time_index(&self) -> usize {
        self.current_time_index
    }

    /// Whether the write index has wrapped around at least once
    pub fn has_looped(&self) -> bool {
        self.has_looped
    }

    /// Time (seconds) of the latest recording
    pub fn get_current_time(&self) -> Option<f64> {
        self.current_time
    }

    /// Raw buffer of times, not necessarily in order and only meaningful up to the current
    /// time index before the buffer has looped
    pub fn get_unsorted_times(&self) -> &Array1<f64> {
        &self.times
    }

    /// Raw buffer of values where each row is a recording, see [`Self::get_unsorted_times`]
    pub fn get_unsorted_values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Indices of the meaningful slots in chronological order
    pub fn sorted_time_indices(&self) -> Vec<usize> {
        if !self.has_looped {
            return (0..self.current_time_index).collect();
        }

        let mut indices: Vec<usize> = (0..self.capacity).collect();
        indices.sort_by(|a, b| self.times[*a].total_cmp(&self.times[*b]));

        indices
    }

    /// Recording times (seconds) in chronological order
    pub fn get_sorted_times(&self) -> Array1<f64> {
        self.sorted_time_indices()
            .into_iter()
            .map(|i| self.times[i])
            .collect()
    }

    /// Recorded values in chronological order where each row is a recording
    pub fn get_sorted_values(&self) -> Array2<f64> {
        self.values.select(Axis(0), &self.sorted_time_indices())
    }

    /// Recorded values of the given unit in chronological order, errors if the unit
    /// is not in the selection
    pub fn get_values(&self, unit: usize) -> Result<Array1<f64>, SpikeMonitorsError> {
        let column = self.record_indices.iter()
            .position(|i| *i == unit)
            .ok_or(QueryError::UnitNotRecorded(unit))?;

        Ok(
            self.sorted_time_indices()
                .into_iter()
                .map(|i| self.values[[i, column]])
                .collect()
        )
    }

    /// Slot holding the recording nearest to the given past time, errors if the
    /// time is in the future or older than the recorded history
    fn past_slot(&self, time: f64) -> Result<usize, SpikeMonitorsError> {
        let current_time = self.current_time.ok_or(QueryError::NoHistory)?;
        let available = if self.has_looped { self.capacity } else { self.current_time_index };

        let offset = ((current_time - time) / (self.dt * self.timestep as f64)).round();
        if !(offset >= 0. && offset < available as f64) {
            return Err(QueryError::TimeNotInHistory(time).into());
        }

        Ok((self.current_time_index + self.capacity - 1 - offset as usize) % self.capacity)
    }

    /// Looks up the value of every recorded unit at the given past times (seconds), `times[n]`
    /// is the time for the `n`th recorded unit, values come from the nearest recording
    /// without interpolation
    pub fn get_past_values(&self, times: &[f64]) -> Result<Vec<f64>, SpikeMonitorsError> {
        if times.len() != self.record_indices.len() {
            return Err(ConfigurationError::LengthMismatch(self.record_indices.len(), times.len()).into());
        }

        times.iter()
            .enumerate()
            .map(|(column, time)| self.past_slot(*time).map(|slot| self.values[[slot, column]]))
            .collect()
    }

    /// Applies [`Self::get_past_values`] to every set of times
    pub fn get_past_values_sequence(&self, times_sequence: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, SpikeMonitorsError> {
        times_sequence.iter()
            .map(|times| self.get_past_values(times))
            .collect()
    }

    /// Mean of every unit over all observed steps
    pub fn mean(&self) -> Result<Array1<f64>, SpikeMonitorsError> {
        self.moments.mean()
    }

    /// Unbiased variance of every unit over all observed steps
    pub fn variance(&self) -> Result<Array1<f64>, SpikeMonitorsError> {
        self.moments.variance()
    }
}

impl StateSink for RecentStateMonitor {
    fn record(&mut self, state: &[f64], t: f64) -> Result<(), SpikeMonitorsError> {
        check_state(state, self.num_units)?;

        self.moments.observe(state)?;
        if !self.record_indices.is_empty() && self.num_steps % self.timestep == 0 {
            let mut row = self.values.row_mut(self.current_time_index);
            for (column, i) in self.record_indices.iter().enumerate() {
                row[column] = state[*i];
            }
            self.times[self.current_time_index] = t;
            self.current_time = Some(t);

            self.current_time_index = (self.current_time_index + 1) % self.capacity;
            if self.current_time_index == 0 {
                self.has_looped = true;
            }
        }
        self.num_steps += 1;

        Ok(())
    }

    fn reset(&mut self) {
        self.values.fill(0.);
        self.times.fill(0.);
        self.current_time_index = 0;
        self.has_looped = false;
        self.current_time = None;
        self.num_steps = 0;
        self.moments.reset();
    }
}
