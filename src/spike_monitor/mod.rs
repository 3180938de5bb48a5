//! Spike monitors that receive the batch of units that crossed threshold at each
//! timestep, from plain counters to full spike logs and file backed recordings.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use crate::error::{ConfigurationError, DataError, QueryError, SpikeMonitorsError};


/// A single spike, unit `unit` crossed threshold at `time` (seconds)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpikeEvent {
    pub unit: usize,
    pub time: f64,
}

/// Handles the spikes emitted by a population at every timestep, the simulation
/// calls `record` once per step with the units that spiked (possibly none)
pub trait SpikeSink {
    /// Processes the units that spiked at time `t` (seconds)
    fn record(&mut self, spikes: &[usize], t: f64) -> Result<(), SpikeMonitorsError>;
    /// Restores every accumulated value to its initial state, configuration is kept
    fn reset(&mut self) -> Result<(), SpikeMonitorsError>;
}

impl<T: SpikeSink + ?Sized> SpikeSink for Box<T> {
    fn record(&mut self, spikes: &[usize], t: f64) -> Result<(), SpikeMonitorsError> {
        (**self).record(spikes, t)
    }

    fn reset(&mut self) -> Result<(), SpikeMonitorsError> {
        (**self).reset()
    }
}

/// Forwards each batch of spikes to a set of borrowed sinks in the order they were added,
/// the caller keeps ownership of the monitors and can read them once the group is dropped
///
/// ```rust
/// # use spike_monitors::{
/// #     error::SpikeMonitorsError,
/// #     spike_monitor::{SpikeCounter, SpikeMonitor, SpikeSink, SpikeSinkGroup},
/// # };
/// # fn main() -> Result<(), SpikeMonitorsError> {
/// let mut monitor = SpikeMonitor::new(3, true)?;
/// let mut counter = SpikeCounter::new(3)?;
///
/// {
///     let mut group = SpikeSinkGroup::default();
///     group.add(&mut monitor);
///     group.add(&mut counter);
///
///     group.record(&[0, 2], 0.001)?;
///     group.record(&[], 0.002)?;
///     group.record(&[2], 0.003)?;
/// }
///
/// assert_eq!(monitor.spike_times_for(2)?, &[0.001, 0.003]);
/// assert_eq!(counter.get_counts(), &[1, 0, 2]);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct SpikeSinkGroup<'a> {
    sinks: Vec<&'a mut dyn SpikeSink>,
}

impl<'a> SpikeSinkGroup<'a> {
    /// Adds a sink to the end of the group
    pub fn add(&mut self, sink: &'a mut dyn SpikeSink) {
        self.sinks.push(sink);
    }

    /// Number of sinks in the group
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Whether the group has no sinks
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl<'a> SpikeSink for SpikeSinkGroup<'a> {
    fn record(&mut self, spikes: &[usize], t: f64) -> Result<(), SpikeMonitorsError> {
        for sink in self.sinks.iter_mut() {
            sink.record(spikes, t)?;
        }

        Ok(())
    }

    fn reset(&mut self) -> Result<(), SpikeMonitorsError> {
        for sink in self.sinks.iter_mut() {
            sink.reset()?;
        }

        Ok(())
    }
}

pub(crate) fn check_population(num_units: usize) -> Result<(), SpikeMonitorsError> {
    if num_units == 0 {
        return Err(ConfigurationError::EmptyPopulation.into());
    }

    Ok(())
}

pub(crate) fn check_spikes(spikes: &[usize], num_units: usize) -> Result<(), SpikeMonitorsError> {
    match spikes.iter().find(|i| **i >= num_units) {
        Some(i) => Err(ConfigurationError::UnitIndexOutOfRange(*i).into()),
        None => Ok(()),
    }
}

/// Per unit spike times projected from the spike log, rebuilt on the next read
/// whenever new spikes were appended
#[derive(Debug, Clone)]
struct SpikeTimesCache {
    is_stale: bool,
    spike_times: Vec<Vec<f64>>,
}

impl SpikeTimesCache {
    fn new(num_units: usize) -> Self {
        SpikeTimesCache {
            is_stale: false,
            spike_times: vec![Vec::new(); num_units],
        }
    }

    fn invalidate(&mut self) {
        self.is_stale = true;
    }

    fn get(&mut self, spikes: &[SpikeEvent]) -> &[Vec<f64>] {
        if self.is_stale {
            self.spike_times.iter_mut().for_each(|times| times.clear());
            for spike in spikes {
                self.spike_times[spike.unit].push(spike.time);
            }

            self.is_stale = false;
        }

        &self.spike_times
    }
}

/// Counts or records spikes from a population of `num_units` units, when `record`
/// is `false` only the total number of spikes is kept (population spike counter)
///
/// ```rust
/// # use spike_monitors::{error::SpikeMonitorsError, spike_monitor::{SpikeMonitor, SpikeSink}};
/// # fn main() -> Result<(), SpikeMonitorsError> {
/// let mut monitor = SpikeMonitor::new(2, true)?;
///
/// monitor.record(&[1], 0.010)?;
/// monitor.record(&[0, 1], 0.020)?;
///
/// assert_eq!(monitor.get_num_spikes(), 3);
/// assert_eq!(monitor.spike_times_for(1)?, &[0.010, 0.020]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SpikeMonitor {
    num_units: usize,
    record: bool,
    num_spikes: usize,
    spikes: Vec<SpikeEvent>,
    spike_times: SpikeTimesCache,
}

impl SpikeMonitor {
    /// Creates a monitor for `num_units` units, use `record` as `false` to only count spikes
    pub fn new(num_units: usize, record: bool) -> Result<Self, SpikeMonitorsError> {
        check_population(num_units)?;

        Ok(SpikeMonitor {
            num_units,
            record,
            num_spikes: 0,
            spikes: Vec::new(),
            spike_times: SpikeTimesCache::new(num_units),
        })
    }

    /// Creates a monitor that only counts the total number of spikes
    pub fn population_counter(num_units: usize) -> Result<Self, SpikeMonitorsError> {
        SpikeMonitor::new(num_units, false)
    }

    /// Number of units in the monitored population
    pub fn get_num_units(&self) -> usize {
        self.num_units
    }

    /// Whether spike times are kept
    pub fn is_recording(&self) -> bool {
        self.record
    }

    /// Total number of spikes seen since the last reset
    pub fn get_num_spikes(&self) -> usize {
        self.num_spikes
    }

    /// Chronological spike log
    pub fn get_spikes(&self) -> Result<&[SpikeEvent], SpikeMonitorsError> {
        if !self.record {
            return Err(QueryError::SpikesNotRecorded.into());
        }

        Ok(&self.spikes)
    }

    /// Spike times of every unit indexed by unit
    pub fn get_spike_times(&mut self) -> Result<&[Vec<f64>], SpikeMonitorsError> {
        if !self.record {
            return Err(QueryError::SpikesNotRecorded.into());
        }

        Ok(self.spike_times.get(&self.spikes))
    }

    /// Chronological spike times of the given unit
    pub fn spike_times_for(&mut self, unit: usize) -> Result<&[f64], SpikeMonitorsError> {
        if unit >= self.num_units {
            return Err(ConfigurationError::UnitIndexOutOfRange(unit).into());
        }

        let spike_times = self.get_spike_times()?;

        Ok(&spike_times[unit])
    }
}

impl SpikeSink for SpikeMonitor {
    fn record(&mut self, spikes: &[usize], t: f64) -> Result<(), SpikeMonitorsError> {
        check_spikes(spikes, self.num_units)?;

        self.num_spikes += spikes.len();
        if self.record && !spikes.is_empty() {
            self.spikes.extend(spikes.iter().map(|&unit| SpikeEvent { unit, time: t }));
            self.spike_times.invalidate();
        }

        Ok(())
    }

    fn reset(&mut self) -> Result<(), SpikeMonitorsError> {
        self.num_spikes = 0;
        self.spikes.clear();
        self.spike_times.invalidate();

        Ok(())
    }
}

/// Counts spikes of each unit as well as the total number of spikes
#[derive(Debug, Clone)]
pub struct SpikeCounter {
    num_spikes: usize,
    counts: Vec<usize>,
}

impl SpikeCounter {
    /// Creates a counter for `num_units` units
    pub fn new(num_units: usize) -> Result<Self, SpikeMonitorsError> {
        check_population(num_units)?;

        Ok(SpikeCounter {
            num_spikes: 0,
            counts: vec![0; num_units],
        })
    }

    /// Total number of spikes seen since the last reset
    pub fn get_num_spikes(&self) -> usize {
        self.num_spikes
    }

    /// Spike counts indexed by unit
    pub fn get_counts(&self) -> &[usize] {
        &self.counts
    }

    /// Spike count of the given unit
    pub fn get_count(&self, unit: usize) -> Result<usize, SpikeMonitorsError> {
        self.counts
            .get(unit)
            .copied()
            .ok_or(ConfigurationError::UnitIndexOutOfRange(unit).into())
    }
}

impl SpikeSink for SpikeCounter {
    fn record(&mut self, spikes: &[usize], _: f64) -> Result<(), SpikeMonitorsError> {
        check_spikes(spikes, self.counts.len())?;

        self.num_spikes += spikes.len();
        for &i in spikes {
            self.counts[i] += 1;
        }

        Ok(())
    }

    fn reset(&mut self) -> Result<(), SpikeMonitorsError> {
        self.num_spikes = 0;
        self.counts.iter_mut().for_each(|count| *count = 0);

        Ok(())
    }
}

/// Calls a user supplied function with every batch of spikes, for custom monitoring
pub struct CallbackSpikeMonitor<F: FnMut(&[usize], f64)> {
    function: F,
}

impl<F: FnMut(&[usize], f64)> CallbackSpikeMonitor<F> {
    pub fn new(function: F) -> Self {
        CallbackSpikeMonitor { function }
    }
}

impl<F: FnMut(&[usize], f64)> SpikeSink for CallbackSpikeMonitor<F> {
    fn record(&mut self, spikes: &[usize], t: f64) -> Result<(), SpikeMonitorsError> {
        (self.function)(spikes, t);

        Ok(())
    }

    fn reset(&mut self) -> Result<(), SpikeMonitorsError> {
        Ok(())
    }
}

fn create_spike_file(path: &Path) -> Result<BufWriter<File>, SpikeMonitorsError> {
    let file = File::create(path)
        .map_err(|e| DataError::FileNotAccessible(format!("{}: {}", path.display(), e)))?;

    Ok(BufWriter::new(file))
}

/// Wraps another sink and also writes every spike to a file as lines of `unit, time`
/// (time in seconds), resetting the monitor truncates the file
pub struct FileSpikeMonitor<S: SpikeSink> {
    inner: S,
    path: PathBuf,
    writer: BufWriter<File>,
}

impl<S: SpikeSink> FileSpikeMonitor<S> {
    /// Creates (or truncates) the file at `path` and wraps the given sink
    pub fn new<P: AsRef<Path>>(inner: S, path: P) -> Result<Self, SpikeMonitorsError> {
        let path = path.as_ref().to_path_buf();
        let writer = create_spike_file(&path)?;

        Ok(FileSpikeMonitor { inner, path, writer })
    }

    /// Wrapped sink
    pub fn get_inner(&self) -> &S {
        &self.inner
    }

    /// Mutable access to the wrapped sink
    pub fn get_inner_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Path of the spike file
    pub fn get_path(&self) -> &Path {
        &self.path
    }

    /// Flushes every buffered spike to the file
    pub fn close_file(&mut self) -> Result<(), SpikeMonitorsError> {
        self.writer
            .flush()
            .map_err(|e| DataError::WriteFailed(e.to_string()).into())
    }
}

impl<S: SpikeSink> SpikeSink for FileSpikeMonitor<S> {
    fn record(&mut self, spikes: &[usize], t: f64) -> Result<(), SpikeMonitorsError> {
        self.inner.record(spikes, t)?;

        for i in spikes {
            writeln!(self.writer, "{}, {}", i, t)
                .map_err(|e| DataError::WriteFailed(e.to_string()))?;
        }

        Ok(())
    }

    fn reset(&mut self) -> Result<(), SpikeMonitorsError> {
        self.inner.reset()?;
        self.close_file()?;
        self.writer = create_spike_file(&self.path)?;

        Ok(())
    }
}

/// A spike along with the values of the monitored state variables at the time of the spike
#[derive(Debug, Clone, PartialEq)]
pub struct StateSpike {
    pub unit: usize,
    pub time: f64,
    /// Values of each monitored variable, in the order the variables were given
    pub values: Vec<f64>,
}

/// Records spikes and the value of one or more state variables at each spike
///
/// ```rust
/// # use spike_monitors::{error::SpikeMonitorsError, spike_monitor::StateSpikeMonitor};
/// # fn main() -> Result<(), SpikeMonitorsError> {
/// let mut monitor = StateSpikeMonitor::new(2, &["v", "w"])?;
///
/// let v = [-50., 30.];
/// let w = [0.5, 1.5];
/// monitor.record(&[1], 0.004, &[&v[..], &w[..]])?;
///
/// assert_eq!(monitor.times(Some(1)), vec![0.004]);
/// assert_eq!(monitor.values("w", None)?, vec![1.5]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct StateSpikeMonitor {
    num_units: usize,
    variables: Vec<String>,
    spikes: Vec<StateSpike>,
}

impl StateSpikeMonitor {
    /// Creates a monitor for `num_units` units sampling the named variables
    pub fn new(num_units: usize, variables: &[&str]) -> Result<Self, SpikeMonitorsError> {
        check_population(num_units)?;
        if variables.is_empty() {
            return Err(
                ConfigurationError::InvalidParameter(String::from("at least one variable must be monitored")).into()
            );
        }

        Ok(StateSpikeMonitor {
            num_units,
            variables: variables.iter().map(|i| i.to_string()).collect(),
            spikes: Vec::new(),
        })
    }

    /// Records the spiking units along with the current state of every monitored variable,
    /// `states` must hold one state vector per variable in the order the variables were given
    pub fn record(&mut self, spikes: &[usize], t: f64, states: &[&[f64]]) -> Result<(), SpikeMonitorsError> {
        check_spikes(spikes, self.num_units)?;
        if states.len() != self.variables.len() {
            return Err(ConfigurationError::LengthMismatch(self.variables.len(), states.len()).into());
        }
        if let Some(state) = states.iter().find(|state| state.len() != self.num_units) {
            return Err(ConfigurationError::LengthMismatch(self.num_units, state.len()).into());
        }

        for &unit in spikes {
            self.spikes.push(StateSpike {
                unit,
                time: t,
                values: states.iter().map(|state| state[unit]).collect(),
            });
        }

        Ok(())
    }

    /// Clears every recorded spike
    pub fn reset(&mut self) {
        self.spikes.clear();
    }

    /// Number of recorded spikes
    pub fn get_num_spikes(&self) -> usize {
        self.spikes.len()
    }

    /// Every recorded spike in chronological order
    pub fn get_spikes(&self) -> &[StateSpike] {
        &self.spikes
    }

    /// Spike times of the whole population or of a single unit
    pub fn times(&self, unit: Option<usize>) -> Vec<f64> {
        self.spikes.iter()
            .filter(|spike| unit.map_or(true, |i| spike.unit == i))
            .map(|spike| spike.time)
            .collect()
    }

    /// Values of the given variable at spike times of the whole population or of a single unit
    pub fn values(&self, variable: &str, unit: Option<usize>) -> Result<Vec<f64>, SpikeMonitorsError> {
        let index = self.variables.iter()
            .position(|i| i == variable)
            .ok_or_else(|| QueryError::VariableNotFound(variable.to_string()))?;

        Ok(
            self.spikes.iter()
                .filter(|spike| unit.map_or(true, |i| spike.unit == i))
                .map(|spike| spike.values[index])
                .collect()
        )
    }
}
