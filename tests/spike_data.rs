#[cfg(test)]
mod tests {
    use std::{env, fs::{read_to_string, write}};
    use spike_monitors::{
        error::{DataError, SpikeMonitorsError},
        spike_data::{read_spikes_csv, write_series, write_unit_summaries, SpikeSchedule, UnitSummary},
        spike_monitor::{SpikeMonitor, SpikeSink},
    };

    #[test]
    pub fn test_spikes_are_read_from_csv() -> Result<(), SpikeMonitorsError> {
        let path = env::temp_dir().join("spike_monitors_read_test.csv");
        write(&path, "unit,time\n0, 0.010\n2,0.0305\n 1 ,0.5\n").expect("Could not write test file");

        let spikes = read_spikes_csv(&path)?;
        assert_eq!(spikes, vec![(0, 0.010), (2, 0.0305), (1, 0.5)]);

        write(&path, "unit,time\n0,0.01\nx,0.02\n").expect("Could not write test file");
        assert!(matches!(
            read_spikes_csv(&path),
            Err(SpikeMonitorsError::DataRelatedError(DataError::MalformedRecord(_)))
        ));

        assert!(matches!(
            read_spikes_csv(env::temp_dir().join("spike_monitors_missing_file.csv")),
            Err(SpikeMonitorsError::DataRelatedError(DataError::FileNotAccessible(_)))
        ));

        Ok(())
    }

    #[test]
    pub fn test_schedule_groups_spikes_by_step() -> Result<(), SpikeMonitorsError> {
        let dt = 0.001;
        let schedule = SpikeSchedule::new(&[(3, 0.0021), (1, 0.0019), (0, 0.010)], dt)?;

        assert_eq!(schedule.num_units(), 4);
        assert_eq!(schedule.last_step(), Some(10));
        assert_eq!(schedule.get_batch(2), &[3, 1]);
        assert!(schedule.get_batch(5).is_empty());

        let mut monitor = SpikeMonitor::new(4, true)?;
        schedule.replay(&mut monitor, 20)?;
        assert_eq!(monitor.get_num_spikes(), 3);
        assert_eq!(monitor.spike_times_for(0)?, &[10. * dt]);

        assert!(SpikeSchedule::new(&[(0, -0.5)], dt).is_err());

        // repeated spikes of a unit within one step count once
        let schedule = SpikeSchedule::new(&[(3, 0.0021), (1, 0.0020), (3, 0.0019)], dt)?;
        assert_eq!(schedule.get_batch(2), &[3, 1]);
        let mut counter = SpikeMonitor::new(4, false)?;
        schedule.replay(&mut counter, 5)?;
        assert_eq!(counter.get_num_spikes(), 2);
        assert!(monitor.reset().is_ok());

        Ok(())
    }

    #[test]
    pub fn test_results_are_written() -> Result<(), SpikeMonitorsError> {
        let path = env::temp_dir().join("spike_monitors_summary_test.csv");
        let summaries = vec![
            UnitSummary { unit: 0, model_length: 4, target_length: 5, coincidences: 3, gamma: Ok(0.5) },
            UnitSummary {
                unit: 1,
                model_length: 0,
                target_length: 5,
                coincidences: 0,
                gamma: Err(String::from("Gamma factor normalizer is zero for unit 1")),
            },
        ];

        write_unit_summaries(&path, &summaries)?;
        let contents = read_to_string(&path).expect("Could not read summary file");
        assert_eq!(
            contents.lines().collect::<Vec<&str>>(),
            vec![
                "unit,model_length,target_length,coincidences,gamma,gamma_error",
                "0,4,5,3,0.5,",
                "1,0,5,0,,\"Gamma factor normalizer is zero for unit 1\"",
            ],
        );

        let path = env::temp_dir().join("spike_monitors_series_test.csv");
        write_series(&path, ("time", "rate"), &[0., 0.5], &[10., 20.])?;
        let contents = read_to_string(&path).expect("Could not read series file");
        assert_eq!(contents, "time,rate\n0,10\n0.5,20\n");

        let path = env::temp_dir().join("spike_monitors_isi_series_test.csv");
        write_series(&path, ("lower_bound", "count"), &[f64::NEG_INFINITY, 0.], &[2., 5.])?;
        let contents = read_to_string(&path).expect("Could not read series file");
        assert_eq!(contents, "lower_bound,count\n-inf,2\n0,5\n");

        Ok(())
    }
}
