#[cfg(test)]
mod tests {
    use spike_monitors::{
        error::{ConfigurationError, QueryError, SpikeMonitorsError},
        state_monitor::{RecordSelection, StateSink, recent::RecentStateMonitor},
    };

    #[test]
    pub fn test_buffer_wraps_on_write_returning_to_zero() -> Result<(), SpikeMonitorsError> {
        let dt = 0.001;
        let capacity = 4;
        let mut monitor = RecentStateMonitor::with_capacity(1, dt, capacity, RecordSelection::All, 1)?;

        for step in 0..(capacity - 1) {
            monitor.record(&[step as f64], step as f64 * dt)?;
            assert!(!monitor.has_looped());
        }

        // M-th write brings the index back to 0
        monitor.record(&[3.], 3. * dt)?;
        assert!(monitor.has_looped());
        assert_eq!(monitor.get_current_time_index(), 0);

        // (M + 1)-th write
        monitor.record(&[4.], 4. * dt)?;
        assert!(monitor.has_looped());
        assert_eq!(monitor.get_current_time_index(), 1);

        let times = monitor.get_sorted_times();
        assert_eq!(times.len(), capacity);
        assert_eq!(times.to_vec(), vec![dt, 2. * dt, 3. * dt, 4. * dt]);
        assert_eq!(monitor.get_values(0)?.to_vec(), vec![1., 2., 3., 4.]);

        Ok(())
    }

    #[test]
    pub fn test_sorted_views_before_wrapping() -> Result<(), SpikeMonitorsError> {
        let dt = 0.001;
        let mut monitor = RecentStateMonitor::new(3, dt, 0.010, RecordSelection::Subset(vec![2, 0]), 1)?;
        assert_eq!(monitor.get_capacity(), 10);

        monitor.record(&[1., 2., 3.], 0.)?;
        monitor.record(&[4., 5., 6.], dt)?;

        assert!(!monitor.has_looped());
        assert_eq!(monitor.get_sorted_times().len(), 2);
        assert_eq!(monitor.get_values(2)?.to_vec(), vec![3., 6.]);
        assert_eq!(monitor.get_values(0)?.to_vec(), vec![1., 4.]);

        let values = monitor.get_sorted_values();
        assert_eq!(values.shape(), &[2, 2]);
        assert_eq!(values[[1, 0]], 6.);
        assert_eq!(values[[1, 1]], 4.);

        assert!(matches!(
            monitor.get_values(1),
            Err(SpikeMonitorsError::QueryRelatedError(QueryError::UnitNotRecorded(1)))
        ));

        Ok(())
    }

    #[test]
    pub fn test_past_values_use_nearest_recording() -> Result<(), SpikeMonitorsError> {
        let dt = 0.001;
        let mut monitor = RecentStateMonitor::with_capacity(2, dt, 5, RecordSelection::All, 1)?;

        for step in 0..12 {
            let v = step as f64;
            monitor.record(&[v, 100. + v], step as f64 * dt)?;
        }

        assert_eq!(monitor.get_current_time(), Some(11. * dt));
        assert_eq!(monitor.get_past_values(&[0.011, 0.009])?, vec![11., 109.]);
        // 8.4 ms is nearest to the recording at 8 ms
        assert_eq!(monitor.get_past_values(&[0.0084, 0.007])?, vec![8., 107.]);

        let sequence = monitor.get_past_values_sequence(&[vec![0.010, 0.010], vec![0.007, 0.011]])?;
        assert_eq!(sequence, vec![vec![10., 110.], vec![7., 111.]]);

        // only the last 5 recordings are held
        assert!(matches!(
            monitor.get_past_values(&[0.006, 0.011]),
            Err(SpikeMonitorsError::QueryRelatedError(QueryError::TimeNotInHistory(_)))
        ));
        assert!(monitor.get_past_values(&[0.012, 0.011]).is_err());
        assert!(matches!(
            monitor.get_past_values(&[0.011]),
            Err(SpikeMonitorsError::ConfigurationRelatedError(ConfigurationError::LengthMismatch(2, 1)))
        ));

        Ok(())
    }

    #[test]
    pub fn test_past_values_before_wrapping_are_bounded() -> Result<(), SpikeMonitorsError> {
        let dt = 0.001;
        let mut monitor = RecentStateMonitor::with_capacity(1, dt, 10, RecordSelection::All, 1)?;

        assert!(matches!(
            monitor.get_past_values(&[0.]),
            Err(SpikeMonitorsError::QueryRelatedError(QueryError::NoHistory))
        ));

        for step in 0..3 {
            monitor.record(&[step as f64], step as f64 * dt)?;
        }

        assert_eq!(monitor.get_past_values(&[0.])?, vec![0.]);
        // before the run started, slot 0 would be stale
        assert!(matches!(
            monitor.get_past_values(&[-0.001]),
            Err(SpikeMonitorsError::QueryRelatedError(QueryError::TimeNotInHistory(_)))
        ));

        Ok(())
    }

    #[test]
    pub fn test_recording_interval_thins_history() -> Result<(), SpikeMonitorsError> {
        let dt = 0.001;
        // 6 ms of history recorded every 2 steps holds 3 recordings
        let mut monitor = RecentStateMonitor::new(1, dt, 0.006, RecordSelection::All, 2)?;
        assert_eq!(monitor.get_capacity(), 3);

        for step in 0..10 {
            monitor.record(&[step as f64], step as f64 * dt)?;
        }

        assert_eq!(monitor.get_values(0)?.to_vec(), vec![4., 6., 8.]);
        assert_eq!(monitor.get_past_values(&[0.006])?, vec![6.]);
        assert_eq!(monitor.mean()?.to_vec(), vec![4.5]);

        Ok(())
    }

    #[test]
    pub fn test_invalid_buffers_are_rejected() {
        assert!(matches!(
            RecentStateMonitor::with_capacity(1, 0.001, 0, RecordSelection::All, 1),
            Err(SpikeMonitorsError::ConfigurationRelatedError(ConfigurationError::NonPositiveCapacity))
        ));
        assert!(matches!(
            RecentStateMonitor::new(1, 0.001, 0.0001, RecordSelection::All, 1),
            Err(SpikeMonitorsError::ConfigurationRelatedError(ConfigurationError::NonPositiveCapacity))
        ));
        assert!(RecentStateMonitor::new(1, 0.001, 0.010, RecordSelection::Unit(1), 1).is_err());
    }
}
