#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use spike_monitors::{
        coincidence::{
            dual_pointer::{CoincidenceAlgorithm, DualPointerCoincidenceCounter},
            gamma_factor, CoincidenceCounter,
        },
        error::{ConfigurationError, SpikeMonitorsError, StatisticalError},
        spike_data::SpikeSchedule,
        spike_monitor::SpikeSink,
    };

    fn counter_for(
        trains: &[Vec<f64>],
        algorithm: CoincidenceAlgorithm,
        delta: f64,
        duration: f64,
    ) -> Result<DualPointerCoincidenceCounter, SpikeMonitorsError> {
        DualPointerCoincidenceCounter::from_trains(1, 0.001, trains, None, None, algorithm, delta, duration)
    }

    #[test]
    pub fn test_reference_scenario() -> Result<(), SpikeMonitorsError> {
        let dt = 0.001;
        let model = SpikeSchedule::new(&[(0, 0.011), (0, 0.031), (0, 0.100)], dt)?;

        for algorithm in [CoincidenceAlgorithm::Exclusive, CoincidenceAlgorithm::Inclusive] {
            let mut counter = counter_for(&[vec![0.010, 0.030, 0.050]], algorithm, 0.004, 0.1)?;
            model.replay(&mut counter, 100)?;

            assert_eq!(counter.get_coincidences(), &[2]);
            assert_eq!(counter.get_target_length(), &[3]);
            assert_eq!(counter.get_model_length(), &[3]);
        }

        Ok(())
    }

    #[test]
    pub fn test_exclusive_and_inclusive_matching() -> Result<(), SpikeMonitorsError> {
        let dt = 0.001;
        // two model spikes around a single reference spike
        let model = SpikeSchedule::new(&[(0, 0.009), (0, 0.011)], dt)?;

        let mut exclusive = counter_for(&[vec![0.010]], CoincidenceAlgorithm::Exclusive, 0.004, 0.05)?;
        let mut inclusive = counter_for(&[vec![0.010]], CoincidenceAlgorithm::Inclusive, 0.004, 0.05)?;
        model.replay(&mut exclusive, 50)?;
        model.replay(&mut inclusive, 50)?;

        assert_eq!(exclusive.get_coincidences(), &[1]);
        assert_eq!(inclusive.get_coincidences(), &[2]);

        let mut table = CoincidenceCounter::new(1, dt, &[(0, 0.010)], None, 0.004)?;
        model.replay(&mut table, 50)?;
        assert_eq!(table.get_coincidences(), exclusive.get_coincidences());

        Ok(())
    }

    #[test]
    pub fn test_spike_near_both_neighbors() -> Result<(), SpikeMonitorsError> {
        let dt = 0.001;
        let model = SpikeSchedule::new(&[(0, 0.013), (0, 0.015)], dt)?;
        let mut counter = counter_for(&[vec![0.010, 0.016]], CoincidenceAlgorithm::Exclusive, 0.004, 0.05)?;

        model.replay(&mut counter, 13)?;
        // the first spike consumes the previous reference spike, the next one stays available
        assert_eq!(counter.get_coincidences(), &[1]);
        assert_eq!(counter.get_last_spike_time(0)?, 10. * dt);
        assert_eq!(counter.get_next_spike_time(0)?, 16. * dt);

        for step in 14..=50 {
            let spikes: &[usize] = if step == 15 { &[0] } else { &[] };
            counter.record(spikes, step as f64 * dt)?;
        }
        assert_eq!(counter.get_coincidences(), &[2]);

        Ok(())
    }

    #[test]
    pub fn test_delays_shift_model_spikes() -> Result<(), SpikeMonitorsError> {
        let dt = 0.001;
        let model = SpikeSchedule::new(&[(0, 0.020), (1, 0.020)], dt)?;
        let mut counter = DualPointerCoincidenceCounter::from_trains(
            2, dt, &[vec![0.030]], None, Some(vec![0., 0.010]), CoincidenceAlgorithm::Exclusive, 0.002, 0.05,
        )?;

        model.replay(&mut counter, 50)?;

        assert_eq!(counter.get_spike_delays(), &[0., 0.010]);
        assert_eq!(counter.get_coincidences(), &[0, 1]);

        Ok(())
    }

    #[test]
    pub fn test_exclusive_upper_bound_and_unit_gamma() -> Result<(), SpikeMonitorsError> {
        let mut rng = StdRng::seed_from_u64(5);
        let dt: f64 = 0.001;
        let duration = 5.;

        let mut train: Vec<f64> = Vec::new();
        let mut t: f64 = 0.;
        loop {
            t += rng.gen_range(0.020..0.200);
            if t >= duration {
                break;
            }
            train.push((t / dt).round() * dt);
        }

        let copies: Vec<(usize, f64)> = train.iter().map(|t| (0, *t)).collect();
        let mut noisy = copies.clone();
        for _ in 0..200 {
            noisy.push((0, rng.gen_range(0.0..duration)));
        }

        let num_steps = (duration / dt) as usize;

        let mut counter = counter_for(&[train.clone()], CoincidenceAlgorithm::Exclusive, 0.003, duration)?;
        SpikeSchedule::new(&copies, dt)?.replay(&mut counter, num_steps)?;
        assert_eq!(counter.get_coincidences(), &[train.len()]);
        assert_eq!(counter.get_target_length(), &[train.len()]);
        assert!((counter.gamma_for(0)? - 1.).abs() < 1e-9);

        counter.reset()?;
        SpikeSchedule::new(&noisy, dt)?.replay(&mut counter, num_steps)?;
        // every reference spike is consumed exactly once whatever the background spikes
        assert_eq!(counter.get_coincidences(), &[train.len()]);
        assert!(counter.get_model_length()[0] > train.len());

        Ok(())
    }

    #[test]
    pub fn test_target_rate_override() -> Result<(), SpikeMonitorsError> {
        let dt = 0.001;
        let mut counter = counter_for(&[vec![0.010]], CoincidenceAlgorithm::Exclusive, 0.002, 0.05)?;
        SpikeSchedule::new(&[(0, 0.010)], dt)?.replay(&mut counter, 50)?;

        // a single reference spike does not define a rate
        assert!(matches!(
            counter.gamma(),
            Err(SpikeMonitorsError::StatisticalRelatedError(StatisticalError::UndefinedFiringRate(0)))
        ));

        counter.set_target_rates(vec![20.])?;
        assert_eq!(counter.target_rate(0)?, 20.);
        assert_eq!(counter.gamma_for(0)?, gamma_factor(0, 1, counter.get_delta(), 1, 1, 20.)?);
        assert!(counter.set_target_rates(vec![20., 30.]).is_err());

        counter.clear_target_rates();
        assert!(counter.gamma_for(0).is_err());

        Ok(())
    }

    #[test]
    pub fn test_missing_sentinels_are_rejected() {
        assert!(matches!(
            DualPointerCoincidenceCounter::new(
                1, 0.001, &[0., 0.010, 1.], None, None, CoincidenceAlgorithm::Exclusive, 0.004,
            ),
            Err(SpikeMonitorsError::ConfigurationRelatedError(ConfigurationError::MissingSentinelPadding(0)))
        ));
        assert!(matches!(
            DualPointerCoincidenceCounter::new(
                2, 0.001, &[-1., 0.010, 1.], Some(vec![0, 2]), None, CoincidenceAlgorithm::Exclusive, 0.004,
            ),
            Err(SpikeMonitorsError::ConfigurationRelatedError(ConfigurationError::MissingSentinelPadding(1)))
        ));
        assert!(matches!(
            DualPointerCoincidenceCounter::new(
                1, 0.001, &[-1., 0.010, 1.], None, Some(vec![]), CoincidenceAlgorithm::Exclusive, 0.004,
            ),
            Err(SpikeMonitorsError::ConfigurationRelatedError(ConfigurationError::LengthMismatch(1, 0)))
        ));
        assert!(
            DualPointerCoincidenceCounter::from_trains(
                1, 0.001, &[vec![0.01]], Some(vec![1]), None, CoincidenceAlgorithm::Inclusive, 0.004, 0.1,
            ).is_err()
        );
    }

    #[test]
    pub fn test_running_past_the_trailing_sentinel() -> Result<(), SpikeMonitorsError> {
        let dt = 0.001;
        let silent = SpikeSchedule::new(&[], dt)?;

        // sentinel at 1.02 s is the last entry of the data
        let mut counter = counter_for(&[vec![0.010]], CoincidenceAlgorithm::Exclusive, 0.002, 0.02)?;
        assert!(silent.replay(&mut counter, 1019).is_ok());
        assert!(matches!(
            counter.record(&[], 1.020),
            Err(SpikeMonitorsError::ConfigurationRelatedError(ConfigurationError::SentinelExhausted(0)))
        ));

        // the leading sentinel of the following train is reached first
        let mut counter = DualPointerCoincidenceCounter::from_trains(
            2, dt, &[vec![0.010], vec![0.015]], Some(vec![0, 1]), None,
            CoincidenceAlgorithm::Inclusive, 0.002, 0.02,
        )?;
        assert!(matches!(
            silent.replay(&mut counter, 1020),
            Err(SpikeMonitorsError::ConfigurationRelatedError(ConfigurationError::SentinelExhausted(0)))
        ));

        Ok(())
    }

    #[test]
    pub fn test_algorithm_names_parse() -> Result<(), SpikeMonitorsError> {
        assert_eq!(CoincidenceAlgorithm::from_str("exclusive")?, CoincidenceAlgorithm::Exclusive);
        assert_eq!(CoincidenceAlgorithm::from_str("Inclusive")?, CoincidenceAlgorithm::Inclusive);
        assert!(CoincidenceAlgorithm::from_str("greedy").is_err());

        Ok(())
    }
}
