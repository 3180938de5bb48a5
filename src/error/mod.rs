use std::fmt::{Display, Debug, Formatter, Result};


/// Error set for malformed monitor configurations, raised when a monitor is constructed
/// or when the simulation hands a monitor input that can never be valid
pub enum ConfigurationError {
    /// Simulation timestep must be positive and finite
    NonPositiveTimestep,
    /// Population must contain at least one unit
    EmptyPopulation,
    /// Bin width must span at least one timestep
    NonPositiveBinWidth,
    /// Histogram bins must be given
    EmptyBins,
    /// Histogram bin lower bounds must be strictly ascending
    BinsNotAscending,
    /// Buffer capacity must be at least one sample
    NonPositiveCapacity,
    /// Recording interval must be at least one step
    NonPositiveRecordingInterval,
    /// Tolerance window must be non-negative
    NegativeTolerance,
    /// Smoothing window covers less than one bin
    SmoothingWidthTooSmall,
    /// Reference data contains no spikes
    EmptyReferenceData,
    /// Two sequences that must align have different lengths (expected, found)
    LengthMismatch(usize, usize),
    /// Model unit is assigned to a reference train that does not exist (unit, train)
    TargetIndexOutOfRange(usize, usize),
    /// Unit index in a spike batch or state vector is outside of the population
    UnitIndexOutOfRange(usize),
    /// Reference train of the given unit is not padded with a leading sentinel before time zero
    MissingSentinelPadding(usize),
    /// Dual pointer of the given unit advanced past the trailing sentinel of its reference train
    SentinelExhausted(usize),
    /// Parameter could not be parsed or is out of its domain
    InvalidParameter(String),
}

impl Display for ConfigurationError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            ConfigurationError::NonPositiveTimestep => write!(f, "Timestep must be positive"),
            ConfigurationError::EmptyPopulation => write!(f, "Population must contain at least one unit"),
            ConfigurationError::NonPositiveBinWidth => write!(f, "Bin width must be at least one timestep"),
            ConfigurationError::EmptyBins => write!(f, "At least one bin must be given"),
            ConfigurationError::BinsNotAscending => write!(f, "Bin lower bounds must be strictly ascending"),
            ConfigurationError::NonPositiveCapacity => write!(f, "Buffer capacity must be at least one sample"),
            ConfigurationError::NonPositiveRecordingInterval => write!(f, "Recording interval must be at least one step"),
            ConfigurationError::NegativeTolerance => write!(f, "Tolerance window must be non-negative"),
            ConfigurationError::SmoothingWidthTooSmall => write!(f, "Smoothing width must cover at least one bin"),
            ConfigurationError::EmptyReferenceData => write!(f, "Reference data must contain at least one spike"),
            ConfigurationError::LengthMismatch(expected, found) => write!(
                f, "Length mismatch, expected {} but found {}", expected, found
            ),
            ConfigurationError::TargetIndexOutOfRange(unit, train) => write!(
                f, "Unit {} is assigned to reference train {} which does not exist", unit, train
            ),
            ConfigurationError::UnitIndexOutOfRange(unit) => write!(
                f, "Unit {} is outside of the monitored population", unit
            ),
            ConfigurationError::MissingSentinelPadding(unit) => write!(
                f, "Reference train of unit {} must begin with a sentinel spike before time zero", unit
            ),
            ConfigurationError::SentinelExhausted(unit) => write!(
                f, "Reference train of unit {} ran past its trailing sentinel spike", unit
            ),
            ConfigurationError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
        }
    }
}

impl Debug for ConfigurationError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "file: {}, line: {}, error: {}", file!(), line!(), self)
    }
}

/// Error set for queries a monitor cannot answer
pub enum QueryError {
    /// Unit was never part of the recording selection
    UnitNotRecorded(usize),
    /// Monitor only counts spikes, spike times were not kept
    SpikesNotRecorded,
    /// Named state variable is not monitored
    VariableNotFound(String),
    /// Requested time is not covered by the recorded history
    TimeNotInHistory(f64),
    /// Nothing has been recorded yet
    NoHistory,
}

impl Display for QueryError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            QueryError::UnitNotRecorded(unit) => write!(f, "Unit {} was not recorded", unit),
            QueryError::SpikesNotRecorded => write!(f, "Spike times were not recorded, only counts"),
            QueryError::VariableNotFound(name) => write!(f, "Variable '{}' is not monitored", name),
            QueryError::TimeNotInHistory(time) => write!(f, "Time {} is not covered by recorded history", time),
            QueryError::NoHistory => write!(f, "No values have been recorded"),
        }
    }
}

impl Debug for QueryError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "file: {}, line: {}, error: {}", file!(), line!(), self)
    }
}

/// Error set for statistics that are undefined for the data seen so far
pub enum StatisticalError {
    /// Statistic needs more samples (required, available)
    InsufficientSamples(usize, usize),
    /// Gamma factor normalizer is zero for the given unit
    ZeroNormalizer(usize),
    /// Firing rate of a spike train is undefined (fewer than two spikes or zero duration)
    UndefinedFiringRate(usize),
}

impl Display for StatisticalError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            StatisticalError::InsufficientSamples(required, available) => write!(
                f, "Statistic requires at least {} samples but only {} were observed", required, available
            ),
            StatisticalError::ZeroNormalizer(unit) => write!(
                f, "Gamma factor normalizer is zero for unit {}", unit
            ),
            StatisticalError::UndefinedFiringRate(train) => write!(
                f, "Firing rate of train {} is undefined", train
            ),
        }
    }
}

impl Debug for StatisticalError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "file: {}, line: {}, error: {}", file!(), line!(), self)
    }
}

/// Error set for reading and writing spike data files
pub enum DataError {
    /// File cannot be opened or created
    FileNotAccessible(String),
    /// Record cannot be parsed
    MalformedRecord(String),
    /// Writing to file failed
    WriteFailed(String),
}

impl Display for DataError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            DataError::FileNotAccessible(msg) => write!(f, "File not accessible: {}", msg),
            DataError::MalformedRecord(msg) => write!(f, "Malformed record: {}", msg),
            DataError::WriteFailed(msg) => write!(f, "Write failed: {}", msg),
        }
    }
}

impl Debug for DataError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "file: {}, line: {}, error: {}", file!(), line!(), self)
    }
}

/// A set of errors that may occur when using the library
pub enum SpikeMonitorsError {
    /// Errors related to monitor configuration
    ConfigurationRelatedError(ConfigurationError),
    /// Errors related to queries on recorded data
    QueryRelatedError(QueryError),
    /// Errors related to undefined statistics
    StatisticalRelatedError(StatisticalError),
    /// Errors related to spike data files
    DataRelatedError(DataError),
}

impl Display for SpikeMonitorsError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            SpikeMonitorsError::ConfigurationRelatedError(err) => write!(f, "{}", err),
            SpikeMonitorsError::QueryRelatedError(err) => write!(f, "{}", err),
            SpikeMonitorsError::StatisticalRelatedError(err) => write!(f, "{}", err),
            SpikeMonitorsError::DataRelatedError(err) => write!(f, "{}", err),
        }
    }
}

impl Debug for SpikeMonitorsError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "file: {}, line: {}, error: {}", file!(), line!(), self)
    }
}

impl std::error::Error for SpikeMonitorsError {}

impl From<ConfigurationError> for SpikeMonitorsError {
    fn from(err: ConfigurationError) -> SpikeMonitorsError {
        SpikeMonitorsError::ConfigurationRelatedError(err)
    }
}

impl From<QueryError> for SpikeMonitorsError {
    fn from(err: QueryError) -> SpikeMonitorsError {
        SpikeMonitorsError::QueryRelatedError(err)
    }
}

impl From<StatisticalError> for SpikeMonitorsError {
    fn from(err: StatisticalError) -> SpikeMonitorsError {
        SpikeMonitorsError::StatisticalRelatedError(err)
    }
}

impl From<DataError> for SpikeMonitorsError {
    fn from(err: DataError) -> SpikeMonitorsError {
        SpikeMonitorsError::DataRelatedError(err)
    }
}
