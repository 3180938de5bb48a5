//! Monitors for state variables handed over by the simulation every timestep, ranging
//! from summary statistics to full recordings and bounded recent history.

use std::collections::{BTreeMap, HashMap};
use ndarray::{Array1, Array2, ArrayView1, Zip};
use crate::{
    error::{ConfigurationError, QueryError, SpikeMonitorsError, StatisticalError},
    spike_monitor::check_population,
};

pub mod recent;


/// Handles the state vector of a variable at every timestep, the simulation calls
/// `record` once per step with the value of the variable for every unit
pub trait StateSink {
    /// Processes the state vector at time `t` (seconds)
    fn record(&mut self, state: &[f64], t: f64) -> Result<(), SpikeMonitorsError>;
    /// Restores every accumulated value to its initial state, configuration is kept
    fn reset(&mut self);
}

/// Which units have their values recorded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordSelection {
    /// Only summary statistics are kept
    Summary,
    /// A single unit
    Unit(usize),
    /// A fixed set of units, recorded in the given order
    Subset(Vec<usize>),
    /// Every unit
    All,
}

impl RecordSelection {
    /// Units recorded by the selection in recording order, errors if a unit
    /// is outside of the population or listed twice
    pub fn indices(&self, num_units: usize) -> Result<Vec<usize>, SpikeMonitorsError> {
        let indices = match self {
            RecordSelection::Summary => vec![],
            RecordSelection::Unit(i) => vec![*i],
            RecordSelection::Subset(subset) => subset.clone(),
            RecordSelection::All => (0..num_units).collect(),
        };

        if let Some(i) = indices.iter().find(|i| **i >= num_units) {
            return Err(ConfigurationError::UnitIndexOutOfRange(*i).into());
        }
        for (n, i) in indices.iter().enumerate() {
            if indices[..n].contains(i) {
                return Err(
                    ConfigurationError::InvalidParameter(format!("unit {} is selected more than once", i)).into()
                );
            }
        }

        Ok(indices)
    }
}

pub(crate) fn check_state(state: &[f64], num_units: usize) -> Result<(), SpikeMonitorsError> {
    if state.len() != num_units {
        return Err(ConfigurationError::LengthMismatch(num_units, state.len()).into());
    }

    Ok(())
}

pub(crate) fn check_recording_interval(timestep: usize) -> Result<(), SpikeMonitorsError> {
    if timestep == 0 {
        return Err(ConfigurationError::NonPositiveRecordingInterval.into());
    }

    Ok(())
}

/// Online sum and sum of squares of a state vector, giving mean and unbiased
/// variance per unit without storing samples
///
/// ```rust
/// # use spike_monitors::{error::SpikeMonitorsError, state_monitor::RunningMoments};
/// # fn main() -> Result<(), SpikeMonitorsError> {
/// let mut moments = RunningMoments::new(2);
///
/// moments.observe(&[1., 10.])?;
/// moments.observe(&[3., 10.])?;
///
/// assert_eq!(moments.mean()?.to_vec(), vec![2., 10.]);
/// assert_eq!(moments.variance()?.to_vec(), vec![2., 0.]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RunningMoments {
    sum: Array1<f64>,
    sum_of_squares: Array1<f64>,
    num_samples: usize,
}

impl RunningMoments {
    /// Creates an empty accumulator for vectors of the given length
    pub fn new(len: usize) -> Self {
        RunningMoments {
            sum: Array1::zeros(len),
            sum_of_squares: Array1::zeros(len),
            num_samples: 0,
        }
    }

    /// Number of observed vectors
    pub fn get_num_samples(&self) -> usize {
        self.num_samples
    }

    /// Adds one vector to the running sums
    pub fn observe(&mut self, values: &[f64]) -> Result<(), SpikeMonitorsError> {
        check_state(values, self.sum.len())?;

        let values = ArrayView1::from(values);
        self.sum += &values;
        self.sum_of_squares += &values.mapv(|x| x * x);
        self.num_samples += 1;

        Ok(())
    }

    /// Mean of every component, undefined before the first sample
    pub fn mean(&self) -> Result<Array1<f64>, SpikeMonitorsError> {
        if self.num_samples == 0 {
            return Err(StatisticalError::InsufficientSamples(1, 0).into());
        }

        Ok(&self.sum / self.num_samples as f64)
    }

    /// Unbiased sample variance of every component, undefined with fewer than two samples
    pub fn variance(&self) -> Result<Array1<f64>, SpikeMonitorsError> {
        if self.num_samples < 2 {
            return Err(StatisticalError::InsufficientSamples(2, self.num_samples).into());
        }

        let n = self.num_samples as f64;
        let mean = self.mean()?;

        Ok(
            Zip::from(&self.sum_of_squares)
                .and(&mean)
                .map_collect(|sum_of_squares, mean| (sum_of_squares - n * mean * mean) / (n - 1.))
        )
    }

    /// Square root of the unbiased variance, rounding residue below zero is treated as zero
    pub fn std(&self) -> Result<Array1<f64>, SpikeMonitorsError> {
        Ok(self.variance()?.mapv(|variance| variance.max(0.).sqrt()))
    }

    /// Zeros both sums and the sample count
    pub fn reset(&mut self) {
        self.sum.fill(0.);
        self.sum_of_squares.fill(0.);
        self.num_samples = 0;
    }
}

/// Records the values of a state variable of a group of units, running mean and
/// variance are kept for every unit regardless of the selection, values of the
/// selected units are recorded every `timestep` steps
///
/// ```rust
/// # use spike_monitors::{
/// #     error::SpikeMonitorsError,
/// #     state_monitor::{RecordSelection, StateMonitor, StateSink},
/// # };
/// # fn main() -> Result<(), SpikeMonitorsError> {
/// let mut monitor = StateMonitor::new(3, RecordSelection::Subset(vec![2, 0]), 1)?;
///
/// monitor.record(&[0., 1., 2.], 0.)?;
/// monitor.record(&[1., 2., 3.], 0.001)?;
///
/// assert_eq!(monitor.get_values(2)?, vec![2., 3.]);
/// assert!(monitor.get_values(1).is_err());
/// assert_eq!(monitor.mean()?.to_vec(), vec![0.5, 1.5, 2.5]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct StateMonitor {
    num_units: usize,
    record_indices: Vec<usize>,
    timestep: usize,
    num_steps: usize,
    times: Vec<f64>,
    values: Vec<Vec<f64>>,
    moments: RunningMoments,
}

impl StateMonitor {
    /// Creates a monitor for `num_units` units recording the selected units every `timestep` steps
    pub fn new(num_units: usize, selection: RecordSelection, timestep: usize) -> Result<Self, SpikeMonitorsError> {
        check_population(num_units)?;
        check_recording_interval(timestep)?;

        Ok(StateMonitor {
            num_units,
            record_indices: selection.indices(num_units)?,
            timestep,
            num_steps: 0,
            times: Vec::new(),
            values: Vec::new(),
            moments: RunningMoments::new(num_units),
        })
    }

    /// Units whose values are recorded, in recording order
    pub fn get_record_indices(&self) -> &[usize] {
        &self.record_indices
    }

    /// Times (seconds) at which values were recorded
    pub fn get_times(&self) -> &[f64] {
        &self.times
    }

    /// Number of steps observed
    pub fn get_num_steps(&self) -> usize {
        self.num_steps
    }

    /// Recorded values of the given unit, errors if the unit is not in the selection
    pub fn get_values(&self, unit: usize) -> Result<Vec<f64>, SpikeMonitorsError> {
        let column = self.record_indices.iter()
            .position(|i| *i == unit)
            .ok_or(QueryError::UnitNotRecorded(unit))?;

        Ok(self.values.iter().map(|row| row[column]).collect())
    }

    /// Recorded values as a matrix where each row is a recorded unit and each column a recording time
    pub fn values(&self) -> Array2<f64> {
        Array2::from_shape_fn(
            (self.record_indices.len(), self.times.len()),
            |(unit, time)| self.values[time][unit],
        )
    }

    /// Mean of every unit over all observed steps
    pub fn mean(&self) -> Result<Array1<f64>, SpikeMonitorsError> {
        self.moments.mean()
    }

    /// Unbiased variance of every unit over all observed steps
    pub fn variance(&self) -> Result<Array1<f64>, SpikeMonitorsError> {
        self.moments.variance()
    }

    /// Standard deviation of every unit over all observed steps
    pub fn std(&self) -> Result<Array1<f64>, SpikeMonitorsError> {
        self.moments.std()
    }
}

impl StateSink for StateMonitor {
    fn record(&mut self, state: &[f64], t: f64) -> Result<(), SpikeMonitorsError> {
        check_state(state, self.num_units)?;

        self.moments.observe(state)?;
        if !self.record_indices.is_empty() && self.num_steps % self.timestep == 0 {
            self.values.push(self.record_indices.iter().map(|i| state[*i]).collect());
            self.times.push(t);
        }
        self.num_steps += 1;

        Ok(())
    }

    fn reset(&mut self) {
        self.num_steps = 0;
        self.times.clear();
        self.values.clear();
        self.moments.reset();
    }
}

/// Monitors multiple state variables of a group, one [`StateMonitor`] per variable
#[derive(Debug, Clone)]
pub struct MultiStateMonitor {
    monitors: BTreeMap<String, StateMonitor>,
}

impl MultiStateMonitor {
    /// Creates one monitor per named variable, each sharing the same selection and recording interval
    pub fn new(
        num_units: usize,
        variables: &[&str],
        selection: RecordSelection,
        timestep: usize,
    ) -> Result<Self, SpikeMonitorsError> {
        if variables.is_empty() {
            return Err(
                ConfigurationError::InvalidParameter(String::from("at least one variable must be monitored")).into()
            );
        }

        let mut monitors = BTreeMap::new();
        for variable in variables {
            monitors.insert(variable.to_string(), StateMonitor::new(num_units, selection.clone(), timestep)?);
        }

        Ok(MultiStateMonitor { monitors })
    }

    /// Names of the monitored variables
    pub fn variables(&self) -> Vec<&str> {
        self.monitors.keys().map(|i| i.as_str()).collect()
    }

    /// Monitor of the given variable
    pub fn get(&self, variable: &str) -> Result<&StateMonitor, SpikeMonitorsError> {
        self.monitors
            .get(variable)
            .ok_or_else(|| QueryError::VariableNotFound(variable.to_string()).into())
    }

    /// Recorded values of the given variable and unit
    pub fn get_values(&self, variable: &str, unit: usize) -> Result<Vec<f64>, SpikeMonitorsError> {
        self.get(variable)?.get_values(unit)
    }

    /// Times (seconds) at which values were recorded
    pub fn get_times(&self) -> &[f64] {
        self.monitors.values().next().map(|monitor| monitor.get_times()).unwrap_or(&[])
    }

    /// Records the state of every monitored variable, `states` maps variable names to state vectors
    /// and must contain every monitored variable
    pub fn record(&mut self, states: &HashMap<String, Vec<f64>>, t: f64) -> Result<(), SpikeMonitorsError> {
        for (variable, monitor) in self.monitors.iter_mut() {
            let state = states
                .get(variable)
                .ok_or_else(|| QueryError::VariableNotFound(variable.clone()))?;

            monitor.record(state, t)?;
        }

        Ok(())
    }

    /// Resets every monitor
    pub fn reset(&mut self) {
        self.monitors.values_mut().for_each(|monitor| monitor.reset());
    }
}
