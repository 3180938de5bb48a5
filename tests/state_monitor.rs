#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use spike_monitors::{
        error::{ConfigurationError, QueryError, SpikeMonitorsError, StatisticalError},
        state_monitor::{MultiStateMonitor, RecordSelection, RunningMoments, StateMonitor, StateSink},
    };

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    pub fn test_moments_match_direct_computation() -> Result<(), SpikeMonitorsError> {
        let samples = [
            [1., -70.],
            [4., -65.],
            [2., -55.],
            [7., -60.],
        ];

        let mut moments = RunningMoments::new(2);
        for sample in samples.iter() {
            moments.observe(sample)?;
        }

        assert_eq!(moments.get_num_samples(), 4);
        let mean = moments.mean()?;
        let variance = moments.variance()?;
        let std = moments.std()?;

        for unit in 0..2 {
            let values: Vec<f64> = samples.iter().map(|sample| sample[unit]).collect();
            let expected_mean = values.iter().sum::<f64>() / 4.;
            let expected_variance = values.iter()
                .map(|x| (x - expected_mean).powi(2))
                .sum::<f64>() / 3.;

            assert_close(mean[unit], expected_mean);
            assert_close(variance[unit], expected_variance);
            assert_close(std[unit], expected_variance.sqrt());
        }

        Ok(())
    }

    #[test]
    pub fn test_variance_needs_two_samples() -> Result<(), SpikeMonitorsError> {
        let mut moments = RunningMoments::new(1);

        assert!(matches!(
            moments.mean(),
            Err(SpikeMonitorsError::StatisticalRelatedError(StatisticalError::InsufficientSamples(1, 0)))
        ));

        moments.observe(&[3.])?;
        assert_eq!(moments.mean()?.to_vec(), vec![3.]);
        assert!(matches!(
            moments.variance(),
            Err(SpikeMonitorsError::StatisticalRelatedError(StatisticalError::InsufficientSamples(2, 1)))
        ));
        assert!(moments.std().is_err());

        assert!(moments.observe(&[1., 2.]).is_err());

        Ok(())
    }

    #[test]
    pub fn test_recording_interval_and_selection() -> Result<(), SpikeMonitorsError> {
        let dt = 0.001;
        let mut monitor = StateMonitor::new(4, RecordSelection::Subset(vec![3, 1]), 2)?;

        for step in 0..5 {
            let v = step as f64;
            monitor.record(&[v, 10. + v, 20. + v, 30. + v], step as f64 * dt)?;
        }

        assert_eq!(monitor.get_num_steps(), 5);
        assert_eq!(monitor.get_record_indices(), &[3, 1]);
        assert_eq!(monitor.get_times(), &[0., 2. * dt, 4. * dt]);
        assert_eq!(monitor.get_values(3)?, vec![30., 32., 34.]);
        assert_eq!(monitor.get_values(1)?, vec![10., 12., 14.]);
        assert!(matches!(
            monitor.get_values(0),
            Err(SpikeMonitorsError::QueryRelatedError(QueryError::UnitNotRecorded(0)))
        ));

        let values = monitor.values();
        assert_eq!(values.shape(), &[2, 3]);
        assert_eq!(values[[0, 2]], 34.);
        assert_eq!(values[[1, 0]], 10.);

        // moments cover every unit and every step
        assert_eq!(monitor.mean()?.to_vec(), vec![2., 12., 22., 32.]);
        assert_close(monitor.variance()?[0], 2.5);

        assert!(monitor.record(&[0., 1.], 0.005).is_err());

        Ok(())
    }

    #[test]
    pub fn test_summary_selection_keeps_only_moments() -> Result<(), SpikeMonitorsError> {
        let mut monitor = StateMonitor::new(2, RecordSelection::Summary, 1)?;

        monitor.record(&[1., 2.], 0.)?;
        monitor.record(&[3., 6.], 0.001)?;

        assert!(monitor.get_times().is_empty());
        assert!(monitor.get_values(0).is_err());
        assert_eq!(monitor.mean()?.to_vec(), vec![2., 4.]);
        assert_eq!(monitor.variance()?.to_vec(), vec![2., 8.]);

        monitor.reset();
        assert_eq!(monitor.get_num_steps(), 0);
        assert!(monitor.mean().is_err());

        Ok(())
    }

    #[test]
    pub fn test_invalid_selections_are_rejected() {
        assert!(matches!(
            StateMonitor::new(3, RecordSelection::Unit(3), 1),
            Err(SpikeMonitorsError::ConfigurationRelatedError(ConfigurationError::UnitIndexOutOfRange(3)))
        ));
        assert!(matches!(
            StateMonitor::new(3, RecordSelection::Subset(vec![0, 2, 0]), 1),
            Err(SpikeMonitorsError::ConfigurationRelatedError(ConfigurationError::InvalidParameter(_)))
        ));
        assert!(matches!(
            StateMonitor::new(3, RecordSelection::All, 0),
            Err(SpikeMonitorsError::ConfigurationRelatedError(ConfigurationError::NonPositiveRecordingInterval))
        ));
        assert!(StateMonitor::new(0, RecordSelection::All, 1).is_err());
    }

    #[test]
    pub fn test_multiple_variables() -> Result<(), SpikeMonitorsError> {
        let mut monitor = MultiStateMonitor::new(2, &["v", "w"], RecordSelection::All, 1)?;
        assert_eq!(monitor.variables(), vec!["v", "w"]);

        let mut states = HashMap::new();
        states.insert(String::from("v"), vec![-70., -65.]);
        states.insert(String::from("w"), vec![0.1, 0.2]);
        monitor.record(&states, 0.)?;

        states.insert(String::from("v"), vec![-60., -55.]);
        monitor.record(&states, 0.001)?;

        assert_eq!(monitor.get_values("v", 1)?, vec![-65., -55.]);
        assert_eq!(monitor.get_values("w", 0)?, vec![0.1, 0.1]);
        assert_eq!(monitor.get_times(), &[0., 0.001]);
        assert_eq!(monitor.get("v")?.mean()?.to_vec(), vec![-65., -60.]);
        assert!(matches!(
            monitor.get("u"),
            Err(SpikeMonitorsError::QueryRelatedError(QueryError::VariableNotFound(_)))
        ));

        states.remove("w");
        assert!(monitor.record(&states, 0.002).is_err());

        monitor.reset();
        assert!(monitor.get_times().is_empty());

        Ok(())
    }
}
