//! Reading spike files, replaying them through sinks step by step, and writing results.

use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};
use csv::{ReaderBuilder, Trim};
use crate::{
    error::{DataError, SpikeMonitorsError},
    spike_monitor::SpikeSink,
    timing::{check_timestep, to_steps},
};


/// Reads spikes from a CSV file with a header row followed by `unit, time` rows (time in seconds)
pub fn read_spikes_csv<P: AsRef<Path>>(path: P) -> Result<Vec<(usize, f64)>, SpikeMonitorsError> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_path(path)
        .map_err(|e| DataError::FileNotAccessible(format!("{}: {}", path.display(), e)))?;

    let mut spikes = Vec::new();
    for (n, record) in reader.records().enumerate() {
        let record = record.map_err(|e| DataError::MalformedRecord(e.to_string()))?;
        if record.len() < 2 {
            return Err(DataError::MalformedRecord(format!("row {} has fewer than 2 fields", n + 1)).into());
        }

        let unit = record[0].parse::<usize>()
            .map_err(|e| DataError::MalformedRecord(format!("row {}, unit '{}': {}", n + 1, &record[0], e)))?;
        let time = record[1].parse::<f64>()
            .map_err(|e| DataError::MalformedRecord(format!("row {}, time '{}': {}", n + 1, &record[1], e)))?;
        if !time.is_finite() {
            return Err(DataError::MalformedRecord(format!("row {}, time is not finite", n + 1)).into());
        }

        spikes.push((unit, time));
    }

    Ok(spikes)
}

/// Spikes grouped by the timestep they fall in, the batch handed to sinks at each step
#[derive(Debug, Clone, PartialEq)]
pub struct SpikeSchedule {
    dt: f64,
    batches: BTreeMap<usize, Vec<usize>>,
}

impl SpikeSchedule {
    /// Groups `(unit, time)` spikes by the nearest step of length `dt`, errors on negative times,
    /// a unit spikes at most once per step so repeated spikes of a unit within one step are merged
    pub fn new(spikes: &[(usize, f64)], dt: f64) -> Result<Self, SpikeMonitorsError> {
        check_timestep(dt)?;

        let mut batches: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (unit, time) in spikes {
            let step = to_steps(*time, dt);
            if step < 0 {
                return Err(DataError::MalformedRecord(format!("spike of unit {} at negative time {}", unit, time)).into());
            }

            let batch = batches.entry(step as usize).or_default();
            if !batch.contains(unit) {
                batch.push(*unit);
            }
        }

        Ok(SpikeSchedule { dt, batches })
    }

    /// Number of units implied by the largest unit index
    pub fn num_units(&self) -> usize {
        self.batches.values().flatten().max().map_or(0, |i| i + 1)
    }

    /// Last step holding a spike
    pub fn last_step(&self) -> Option<usize> {
        self.batches.keys().next_back().copied()
    }

    /// Units spiking at the given step
    pub fn get_batch(&self, step: usize) -> &[usize] {
        self.batches.get(&step).map(|batch| batch.as_slice()).unwrap_or(&[])
    }

    /// Calls the sink once per step from step `0` to `num_steps` inclusive, including steps without spikes
    pub fn replay<S: SpikeSink + ?Sized>(&self, sink: &mut S, num_steps: usize) -> Result<(), SpikeMonitorsError> {
        for step in 0..=num_steps {
            sink.record(self.get_batch(step), step as f64 * self.dt)?;
        }

        Ok(())
    }
}

/// Coincidence results of a single model unit
#[derive(Debug, Clone, PartialEq)]
pub struct UnitSummary {
    pub unit: usize,
    pub model_length: usize,
    pub target_length: usize,
    pub coincidences: usize,
    /// Gamma factor, or why it is undefined
    pub gamma: Result<f64, String>,
}

fn create_file(path: &Path) -> Result<BufWriter<File>, SpikeMonitorsError> {
    let file = File::create(path)
        .map_err(|e| DataError::FileNotAccessible(format!("{}: {}", path.display(), e)))?;

    Ok(BufWriter::new(file))
}

/// Writes one CSV row per unit summary, undefined gamma factors are left empty with the
/// reason in the `gamma_error` column
pub fn write_unit_summaries<P: AsRef<Path>>(path: P, summaries: &[UnitSummary]) -> Result<(), SpikeMonitorsError> {
    let mut file = create_file(path.as_ref())?;
    let write_failed = |e: std::io::Error| DataError::WriteFailed(e.to_string());

    writeln!(file, "unit,model_length,target_length,coincidences,gamma,gamma_error").map_err(write_failed)?;
    for summary in summaries {
        let (gamma, gamma_error) = match &summary.gamma {
            Ok(gamma) => (gamma.to_string(), String::new()),
            Err(msg) => (String::new(), format!("\"{}\"", msg.replace('"', "\"\""))),
        };
        writeln!(
            file, "{},{},{},{},{},{}",
            summary.unit, summary.model_length, summary.target_length, summary.coincidences, gamma, gamma_error,
        ).map_err(write_failed)?;
    }

    file.flush().map_err(write_failed)?;

    Ok(())
}

/// Writes a two column CSV series such as bin times and rates
pub fn write_series<P: AsRef<Path>>(
    path: P,
    header: (&str, &str),
    first: &[f64],
    second: &[f64],
) -> Result<(), SpikeMonitorsError> {
    let mut file = create_file(path.as_ref())?;
    let write_failed = |e: std::io::Error| DataError::WriteFailed(e.to_string());

    writeln!(file, "{},{}", header.0, header.1).map_err(write_failed)?;
    for (x, y) in first.iter().zip(second) {
        writeln!(file, "{},{}", x, y).map_err(write_failed)?;
    }

    file.flush().map_err(write_failed)?;

    Ok(())
}
