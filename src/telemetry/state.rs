//! Read-only access to a monitor's stored metric readings.
//!
//! The stateful directive evaluators (`fakeCounter`, `rate`,
//! `legacyPowerSupplyUtilization`) derive values from what a monitor
//! remembered on earlier cycles. They go through these accessors rather than
//! touching the metric store directly, so the time-series semantics stay
//! testable against a bare [`NumericMetric`] history.
//!
//! All accessors return `None` when the metric (or the requested history
//! slot) does not exist; a first collect therefore reads as "no data", never
//! as an error.

use super::{Monitor, Reading};

/// Value of a metric's current or previous reading.
pub fn metric_value(monitor: &Monitor, name: &str, previous: bool) -> Option<f64> {
    reading(monitor, name, previous).map(|r| r.value)
}

/// Collect time of a metric's current or previous reading, in Unix
/// milliseconds as `f64` so it can feed the guarded arithmetic directly.
pub fn metric_collect_time(monitor: &Monitor, name: &str, previous: bool) -> Option<f64> {
    reading(monitor, name, previous).map(|r| r.collect_time_ms as f64)
}

fn reading(monitor: &Monitor, name: &str, previous: bool) -> Option<Reading> {
    let metric = monitor.metric(name)?;
    if previous {
        metric.previous()
    } else {
        metric.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::MonitorType;

    fn monitor_with_history() -> Monitor {
        let mut m = Monitor::new("psu-0", MonitorType::PowerSupply);
        m.record_metric("hw.power_supply.power", 120.0, 1_000);
        m.record_metric("hw.power_supply.power", 150.0, 2_000);
        m
    }

    #[test]
    fn test_current_and_previous_value() {
        let m = monitor_with_history();
        assert_eq!(
            metric_value(&m, "hw.power_supply.power", false),
            Some(150.0)
        );
        assert_eq!(metric_value(&m, "hw.power_supply.power", true), Some(120.0));
    }

    #[test]
    fn test_collect_times() {
        let m = monitor_with_history();
        assert_eq!(
            metric_collect_time(&m, "hw.power_supply.power", false),
            Some(2_000.0)
        );
        assert_eq!(
            metric_collect_time(&m, "hw.power_supply.power", true),
            Some(1_000.0)
        );
    }

    #[test]
    fn test_missing_metric_is_none() {
        let m = monitor_with_history();
        assert_eq!(metric_value(&m, "hw.fan.speed", false), None);
        assert_eq!(metric_collect_time(&m, "hw.fan.speed", true), None);
    }

    #[test]
    fn test_first_collect_has_no_previous() {
        let mut m = Monitor::new("fan-0", MonitorType::Fan);
        m.record_metric("hw.fan.speed", 4000.0, 1_000);
        assert_eq!(metric_value(&m, "hw.fan.speed", false), Some(4000.0));
        assert_eq!(metric_value(&m, "hw.fan.speed", true), None);
    }
}
