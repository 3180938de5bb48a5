//! # Spike Monitors
//!
//! `spike_monitors` is a package of streaming observers for discrete time spiking neural
//! network simulations. At every timestep the simulation hands each monitor the units that
//! spiked (through [`spike_monitor::SpikeSink`]) or the state of a variable for every unit
//! (through [`state_monitor::StateSink`]) and the monitors accumulate statistics online.
//! Currently implements spike logs and counters, population rates with smoothing,
//! interspike interval histograms, full and bounded state recordings, and online
//! coincidence counting against reference spike trains with the Gamma coincidence factor.
//!
//! ## Example Code
//!
//! ### Monitoring a population and matching it against reference spikes
//!
//! ```rust
//! use spike_monitors::{
//!     coincidence::CoincidenceCounter,
//!     error::SpikeMonitorsError,
//!     rate::PopulationRateMonitor,
//!     spike_monitor::{SpikeCounter, SpikeSink, SpikeSinkGroup},
//! };
//!
//! # fn main() -> Result<(), SpikeMonitorsError> {
//! let dt = 0.001;
//! let reference = [(0, 0.010), (0, 0.030), (0, 0.050), (1, 0.020)];
//!
//! let mut counter = SpikeCounter::new(2)?;
//! let mut rates = PopulationRateMonitor::new(2, dt, Some(0.010))?;
//! let mut coincidences = CoincidenceCounter::new(2, dt, &reference, Some(vec![0, 1]), 0.002)?;
//!
//! {
//!     let mut monitors = SpikeSinkGroup::default();
//!     monitors.add(&mut counter);
//!     monitors.add(&mut rates);
//!     monitors.add(&mut coincidences);
//!
//!     for step in 0..60 {
//!         let spikes: Vec<usize> = match step {
//!             10 | 31 | 50 => vec![0],
//!             40 => vec![1],
//!             _ => vec![],
//!         };
//!
//!         monitors.record(&spikes, step as f64 * dt)?;
//!     }
//! }
//!
//! assert_eq!(counter.get_counts(), &[3, 1]);
//! assert_eq!(coincidences.get_coincidences(), &[3, 0]);
//! assert_eq!(rates.get_num_closed_bins(), 6);
//! # Ok(())
//! # }
//! ```
//!
//! ### Keeping only recent history of a state variable
//!
//! ```rust
//! use spike_monitors::{
//!     error::SpikeMonitorsError,
//!     state_monitor::{RecordSelection, StateSink, recent::RecentStateMonitor},
//! };
//!
//! # fn main() -> Result<(), SpikeMonitorsError> {
//! let dt = 0.001;
//! // 5 ms of history sampled every step
//! let mut monitor = RecentStateMonitor::new(2, dt, 0.005, RecordSelection::All, 1)?;
//!
//! for step in 0..20 {
//!     let v = step as f64;
//!     monitor.record(&[v, -v], step as f64 * dt)?;
//! }
//!
//! assert_eq!(monitor.get_values(0)?.to_vec(), vec![15., 16., 17., 18., 19.]);
//! // value of unit 0 at 17 ms and of unit 1 at 19 ms
//! assert_eq!(monitor.get_past_values(&[0.017, 0.019])?, vec![17., -19.]);
//! # Ok(())
//! # }
//! ```

pub mod coincidence;
pub mod config;
pub mod error;
pub mod histogram;
pub mod rate;
pub mod spike_data;
pub mod spike_monitor;
pub mod state_monitor;
pub mod timing;
