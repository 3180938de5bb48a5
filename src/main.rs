use std::{env, fs::read_to_string};
use spike_monitors::{
    coincidence::{
        dual_pointer::DualPointerCoincidenceCounter, spikes_to_trains, CoincidenceCounter,
    },
    config::{parse_replay_settings, CoincidenceAlgorithmChoice, CoincidenceSettings},
    error::{DataError, SpikeMonitorsError},
    histogram::ISIHistogramMonitor,
    rate::PopulationRateMonitor,
    spike_data::{read_spikes_csv, write_series, write_unit_summaries, SpikeSchedule, UnitSummary},
    spike_monitor::{SpikeCounter, SpikeSink, SpikeSinkGroup},
    timing::duration_to_steps,
};


enum Matcher {
    Table(CoincidenceCounter),
    DualPointer(DualPointerCoincidenceCounter),
}

impl Matcher {
    fn new(
        settings: &CoincidenceSettings,
        num_units: usize,
        reference: &[(usize, f64)],
        duration: f64,
    ) -> Result<Self, SpikeMonitorsError> {
        let trains = spikes_to_trains(reference)?;
        // one reference train per unit if counts match, otherwise every unit against train 0
        let model_target: Vec<usize> = if trains.len() == num_units {
            (0..num_units).collect()
        } else {
            vec![0; num_units]
        };

        match settings.algorithm {
            CoincidenceAlgorithmChoice::Table => Ok(Matcher::Table(
                CoincidenceCounter::from_trains(num_units, settings.dt, trains, Some(model_target), settings.delta)?
            )),
            CoincidenceAlgorithmChoice::DualPointer(algorithm) => Ok(Matcher::DualPointer(
                DualPointerCoincidenceCounter::from_trains(
                    num_units, settings.dt, &trains, Some(model_target), None, algorithm, settings.delta, duration,
                )?
            )),
        }
    }

    fn as_sink(&mut self) -> &mut dyn SpikeSink {
        match self {
            Matcher::Table(counter) => counter,
            Matcher::DualPointer(counter) => counter,
        }
    }

    fn summaries(&self) -> Vec<UnitSummary> {
        match self {
            Matcher::Table(counter) => (0..counter.get_coincidences().len())
                .map(|unit| UnitSummary {
                    unit,
                    model_length: counter.get_model_length()[unit],
                    target_length: counter.get_target_length()[counter.get_model_target()[unit]],
                    coincidences: counter.get_coincidences()[unit],
                    gamma: counter.gamma_for(unit).map_err(|e| e.to_string()),
                })
                .collect(),
            Matcher::DualPointer(counter) => (0..counter.get_coincidences().len())
                .map(|unit| UnitSummary {
                    unit,
                    model_length: counter.get_model_length()[unit],
                    target_length: counter.get_target_length()[unit],
                    coincidences: counter.get_coincidences()[unit],
                    gamma: counter.gamma_for(unit).map_err(|e| e.to_string()),
                })
                .collect(),
        }
    }
}

fn main() -> Result<(), SpikeMonitorsError> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        println!("Requires .toml argument file");
        return Ok(());
    }

    let toml_content = read_to_string(&args[1])
        .map_err(|e| DataError::FileNotAccessible(format!("{}: {}", args[1], e)))?;
    let settings = parse_replay_settings(&toml_content)?;
    let coincidence_settings = &settings.coincidence;

    println!("reference_file: {}", coincidence_settings.reference_file);
    println!("model_file: {}", coincidence_settings.model_file);
    println!("delta: {}", coincidence_settings.delta);
    println!("dt: {}", coincidence_settings.dt);
    println!("algorithm: {:?}", coincidence_settings.algorithm);

    let reference = read_spikes_csv(&coincidence_settings.reference_file)?;
    let model = read_spikes_csv(&coincidence_settings.model_file)?;
    let schedule = SpikeSchedule::new(&model, coincidence_settings.dt)?;

    let num_units = coincidence_settings.num_units.unwrap_or(schedule.num_units());
    println!("num_units: {}", num_units);

    let duration = coincidence_settings.duration.unwrap_or_else(|| {
        model.iter()
            .chain(reference.iter())
            .map(|(_, t)| *t)
            .fold(0., f64::max)
    });
    println!("duration: {}", duration);
    let num_steps = duration_to_steps(duration, coincidence_settings.dt);

    let mut matcher = Matcher::new(coincidence_settings, num_units, &reference, duration)?;
    let mut counter = SpikeCounter::new(num_units)?;
    let mut rate_monitor = settings.rate.as_ref()
        .map(|rate| PopulationRateMonitor::new(num_units, coincidence_settings.dt, Some(rate.bin)))
        .transpose()?;
    let mut isi_monitor = settings.isi.as_ref()
        .map(|isi| ISIHistogramMonitor::new(num_units, &isi.bins))
        .transpose()?;

    {
        let mut monitors = SpikeSinkGroup::default();
        monitors.add(matcher.as_sink());
        monitors.add(&mut counter);
        if let Some(rate_monitor) = rate_monitor.as_mut() {
            monitors.add(rate_monitor);
        }
        if let Some(isi_monitor) = isi_monitor.as_mut() {
            monitors.add(isi_monitor);
        }

        println!("\nreplaying {} steps through {} monitors...", num_steps + 1, monitors.len());
        schedule.replay(&mut monitors, num_steps)?;
    }

    println!("total model spikes: {}", counter.get_num_spikes());

    let summaries = matcher.summaries();
    for summary in summaries.iter() {
        match &summary.gamma {
            Ok(gamma) => println!(
                "unit {}: {} coincidences, gamma: {}", summary.unit, summary.coincidences, gamma
            ),
            Err(msg) => println!(
                "unit {}: {} coincidences, gamma undefined: {}", summary.unit, summary.coincidences, msg
            ),
        }
    }

    write_unit_summaries(&coincidence_settings.output_file, &summaries)?;
    println!("output_file: {}", coincidence_settings.output_file);

    if let (Some(rate_settings), Some(rate_monitor)) = (settings.rate.as_ref(), rate_monitor.as_ref()) {
        let closed_times = &rate_monitor.get_times()[..rate_monitor.get_num_closed_bins()];
        let rates = match rate_settings.smoothing_width {
            Some(width) => rate_monitor.smooth_rate(width, rate_settings.kernel)?,
            None => rate_monitor.get_closed_rates().to_vec(),
        };

        write_series(&rate_settings.output_file, ("time", "rate"), closed_times, &rates)?;
        println!("rate output_file: {}", rate_settings.output_file);
    }

    if let (Some(isi_settings), Some(isi_monitor)) = (settings.isi.as_ref(), isi_monitor.as_ref()) {
        // underflow is written as the first row with a lower bound of -inf
        let (lower_bounds, count) = isi_monitor.get_series();
        let count: Vec<f64> = count.iter().map(|i| *i as f64).collect();

        write_series(&isi_settings.output_file, ("lower_bound", "count"), &lower_bounds, &count)?;
        println!("isi output_file: {}", isi_settings.output_file);
    }

    Ok(())
}
