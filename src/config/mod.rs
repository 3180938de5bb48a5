//! Parsing of the TOML configuration used by the command line replay tool.

use std::str::FromStr;
use toml::Value;
use crate::{
    coincidence::dual_pointer::CoincidenceAlgorithm,
    error::{ConfigurationError, SpikeMonitorsError},
    rate::SmoothingKernel,
};


type Result<T> = std::result::Result<T, SpikeMonitorsError>;

fn invalid(field_name: &str, kind: &str) -> SpikeMonitorsError {
    ConfigurationError::InvalidParameter(format!("Cannot parse {} as {}", field_name, kind)).into()
}

pub fn parse_bool(value: &Value, field_name: &str) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| invalid(field_name, "boolean"))
}

pub fn parse_usize(value: &Value, field_name: &str) -> Result<usize> {
    value
        .as_integer()
        .filter(|v| *v >= 0)
        .ok_or_else(|| invalid(field_name, "unsigned integer"))
        .map(|v| v as usize)
}

/// Parses a float, integers are accepted and converted
pub fn parse_f64(value: &Value, field_name: &str) -> Result<f64> {
    value
        .as_float()
        .or_else(|| value.as_integer().map(|v| v as f64))
        .ok_or_else(|| invalid(field_name, "float"))
}

pub fn parse_string(value: &Value, field_name: &str) -> Result<String> {
    value
        .as_str()
        .ok_or_else(|| invalid(field_name, "string"))
        .map(String::from)
}

pub fn parse_f64_array(value: &Value, field_name: &str) -> Result<Vec<f64>> {
    value
        .as_array()
        .ok_or_else(|| invalid(field_name, "array of floats"))?
        .iter()
        .map(|i| parse_f64(i, field_name))
        .collect()
}

pub fn parse_value_with_default<T>(
    table: &Value,
    key: &str,
    parser: impl Fn(&Value, &str) -> Result<T>,
    default: T,
) -> Result<T> {
    table
        .get(key)
        .map_or(Ok(default), |value| parser(value, key))
}

pub fn parse_optional_value<T>(
    table: &Value,
    key: &str,
    parser: impl Fn(&Value, &str) -> Result<T>,
) -> Result<Option<T>> {
    table
        .get(key)
        .map(|value| parser(value, key))
        .transpose()
}

pub fn parse_required_value<T>(
    table: &Value,
    key: &str,
    parser: impl Fn(&Value, &str) -> Result<T>,
) -> Result<T> {
    table
        .get(key)
        .ok_or_else(|| ConfigurationError::InvalidParameter(format!("Missing required field {}", key)))
        .map_err(SpikeMonitorsError::from)
        .and_then(|value| parser(value, key))
}

/// Which coincidence matcher the replay uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoincidenceAlgorithmChoice {
    /// Precomputed lookup table, see [`crate::coincidence::CoincidenceCounter`]
    Table,
    /// Dual pointer matching with the given algorithm
    DualPointer(CoincidenceAlgorithm),
}

impl FromStr for CoincidenceAlgorithmChoice {
    type Err = SpikeMonitorsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "table" => Ok(CoincidenceAlgorithmChoice::Table),
            _ => Ok(CoincidenceAlgorithmChoice::DualPointer(CoincidenceAlgorithm::from_str(s)?)),
        }
    }
}

/// Settings of the `[coincidence]` table
#[derive(Debug, Clone, PartialEq)]
pub struct CoincidenceSettings {
    /// CSV of reference spikes as `train, time` rows
    pub reference_file: String,
    /// CSV of model spikes as `unit, time` rows
    pub model_file: String,
    /// Where per unit results are written
    pub output_file: String,
    /// Half width of the coincidence window (seconds)
    pub delta: f64,
    /// Simulation timestep (seconds)
    pub dt: f64,
    pub algorithm: CoincidenceAlgorithmChoice,
    /// Number of model units, inferred from the model spikes when absent
    pub num_units: Option<usize>,
    /// Duration (seconds) to replay, inferred from the last spike when absent
    pub duration: Option<f64>,
}

/// Settings of the optional `[rate]` table
#[derive(Debug, Clone, PartialEq)]
pub struct RateSettings {
    /// Bin width (seconds)
    pub bin: f64,
    /// Width (seconds) of the smoothing window, no smoothing when absent
    pub smoothing_width: Option<f64>,
    pub kernel: SmoothingKernel,
    /// Where bin times and rates are written
    pub output_file: String,
}

/// Settings of the optional `[isi]` table
#[derive(Debug, Clone, PartialEq)]
pub struct IsiSettings {
    /// Histogram bin lower bounds (seconds)
    pub bins: Vec<f64>,
    /// Where bin lower bounds and counts are written
    pub output_file: String,
}

/// Settings of a whole replay run
#[derive(Debug, Clone, PartialEq)]
pub struct ReplaySettings {
    pub coincidence: CoincidenceSettings,
    pub rate: Option<RateSettings>,
    pub isi: Option<IsiSettings>,
}

fn get_coincidence_settings(table: &Value) -> Result<CoincidenceSettings> {
    let reference_file = parse_required_value(table, "reference_file", parse_string)?;
    let model_file = parse_required_value(table, "model_file", parse_string)?;
    let output_file = parse_value_with_default(
        table, "output_file", parse_string, String::from("coincidences.csv")
    )?;
    let delta = parse_value_with_default(table, "delta", parse_f64, 0.004)?;
    let dt = parse_value_with_default(table, "dt", parse_f64, 0.0001)?;
    let algorithm = parse_value_with_default(table, "algorithm", parse_string, String::from("table"))?;
    let algorithm = CoincidenceAlgorithmChoice::from_str(&algorithm)?;
    let num_units = parse_optional_value(table, "num_units", parse_usize)?;
    let duration = parse_optional_value(table, "duration", parse_f64)?;

    Ok(CoincidenceSettings {
        reference_file,
        model_file,
        output_file,
        delta,
        dt,
        algorithm,
        num_units,
        duration,
    })
}

fn get_rate_settings(table: &Value) -> Result<RateSettings> {
    let bin = parse_value_with_default(table, "bin", parse_f64, 0.001)?;
    let smoothing_width = parse_optional_value(table, "smoothing_width", parse_f64)?;
    let kernel = parse_value_with_default(table, "kernel", parse_string, String::from("gaussian"))?;
    let output_file = parse_value_with_default(table, "output_file", parse_string, String::from("rates.csv"))?;

    Ok(RateSettings {
        bin,
        smoothing_width,
        kernel: SmoothingKernel::from_str(&kernel)?,
        output_file,
    })
}

fn get_isi_settings(table: &Value) -> Result<IsiSettings> {
    Ok(IsiSettings {
        bins: parse_required_value(table, "bins", parse_f64_array)?,
        output_file: parse_value_with_default(table, "output_file", parse_string, String::from("isi.csv"))?,
    })
}

/// Reads the replay settings from a parsed configuration, the `[coincidence]` table is
/// required while `[rate]` and `[isi]` add their monitors when present
///
/// ```rust
/// # use spike_monitors::{config::get_replay_settings, error::SpikeMonitorsError};
/// # fn main() -> Result<(), SpikeMonitorsError> {
/// let config: toml::Value = toml::from_str(r#"
///     [coincidence]
///     reference_file = "reference.csv"
///     model_file = "model.csv"
///     delta = 0.004
///     dt = 0.001
/// "#).expect("valid toml");
///
/// let settings = get_replay_settings(&config)?;
/// assert_eq!(settings.coincidence.delta, 0.004);
/// assert!(settings.rate.is_none());
/// # Ok(())
/// # }
/// ```
pub fn get_replay_settings(config: &Value) -> Result<ReplaySettings> {
    let coincidence = config
        .get("coincidence")
        .ok_or_else(|| ConfigurationError::InvalidParameter(String::from("Missing [coincidence] table")))?;

    Ok(ReplaySettings {
        coincidence: get_coincidence_settings(coincidence)?,
        rate: config.get("rate").map(get_rate_settings).transpose()?,
        isi: config.get("isi").map(get_isi_settings).transpose()?,
    })
}

/// Parses the replay settings from TOML text
pub fn parse_replay_settings(toml_content: &str) -> Result<ReplaySettings> {
    let config: Value = toml::from_str(toml_content)
        .map_err(|e| ConfigurationError::InvalidParameter(format!("Cannot read config: {}", e)))?;

    get_replay_settings(&config)
}
