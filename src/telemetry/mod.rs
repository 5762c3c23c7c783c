//! In-memory telemetry model consumed by the mapping interpreter.
//!
//! A [`Monitor`] is the live representation of one discovered hardware
//! component (a fan, a disk, a power supply…). It persists across collection
//! cycles, which is why each numeric metric keeps a two-slot reading history
//! (current and previous value with their collect times): the stateful
//! directive evaluators derive counters and rates from exactly that history,
//! and only ever from the one monitor they are handed.
//!
//! Monitors are grouped in a [`MonitorRegistry`] keyed by [`MonitorType`];
//! the registry also backs the `lookup` directive through the
//! [`SiblingLookup`] trait.
//!
//! # Examples
//!
//! ```
//! use hwmonlib::telemetry::{Monitor, MonitorType};
//!
//! let mut fan = Monitor::new("fan-1", MonitorType::Fan);
//! fan.set_attribute("serial_number", "F1");
//! fan.record_metric("hw.fan.speed", 4200.0, 1_000);
//! fan.record_metric("hw.fan.speed", 4300.0, 11_000);
//!
//! let metric = fan.metric("hw.fan.speed").unwrap();
//! assert_eq!(metric.current().unwrap().value, 4300.0);
//! assert_eq!(metric.previous().unwrap().value, 4200.0);
//! ```

pub mod state;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Kind of hardware component a monitor represents
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MonitorType {
    /// Battery pack
    Battery,
    /// Server blade
    Blade,
    /// Central processing unit
    Cpu,
    /// Disk / RAID controller
    DiskController,
    /// Chassis or enclosure
    Enclosure,
    /// Cooling fan
    Fan,
    /// Graphics processing unit
    Gpu,
    /// The monitored host itself
    Host,
    /// Status LED
    Led,
    /// Logical volume
    LogicalDisk,
    /// Memory module
    Memory,
    /// Network adapter
    NetworkCard,
    /// Physical drive
    PhysicalDisk,
    /// Power supply unit
    PowerSupply,
    /// Tape library robotics
    Robotics,
    /// Tape drive
    TapeDrive,
    /// Temperature sensor
    Temperature,
    /// Virtual machine
    Vm,
    /// Voltage sensor
    Voltage,
    /// Other / unknown
    Other(String),
}

impl FromStr for MonitorType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        Ok(match normalized.as_str() {
            "battery" => Self::Battery,
            "blade" => Self::Blade,
            "cpu" => Self::Cpu,
            "disk_controller" => Self::DiskController,
            "enclosure" => Self::Enclosure,
            "fan" => Self::Fan,
            "gpu" => Self::Gpu,
            "host" => Self::Host,
            "led" => Self::Led,
            "logical_disk" => Self::LogicalDisk,
            "memory" => Self::Memory,
            "network" | "network_card" => Self::NetworkCard,
            "physical_disk" => Self::PhysicalDisk,
            "power_supply" => Self::PowerSupply,
            "robotics" => Self::Robotics,
            "tape_drive" => Self::TapeDrive,
            "temperature" => Self::Temperature,
            "vm" => Self::Vm,
            "voltage" => Self::Voltage,
            _ => Self::Other(s.trim().to_string()),
        })
    }
}

impl fmt::Display for MonitorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Battery => "battery",
            Self::Blade => "blade",
            Self::Cpu => "cpu",
            Self::DiskController => "disk_controller",
            Self::Enclosure => "enclosure",
            Self::Fan => "fan",
            Self::Gpu => "gpu",
            Self::Host => "host",
            Self::Led => "led",
            Self::LogicalDisk => "logical_disk",
            Self::Memory => "memory",
            Self::NetworkCard => "network_card",
            Self::PhysicalDisk => "physical_disk",
            Self::PowerSupply => "power_supply",
            Self::Robotics => "robotics",
            Self::TapeDrive => "tape_drive",
            Self::Temperature => "temperature",
            Self::Vm => "vm",
            Self::Voltage => "voltage",
            Self::Other(s) => s.as_str(),
        };
        write!(f, "{}", name)
    }
}

/// One recorded metric observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Observed value
    pub value: f64,
    /// Collect time (Unix milliseconds)
    pub collect_time_ms: u64,
}

/// A numeric metric with a two-slot reading history.
///
/// Recording a new reading shifts the current slot into the previous one,
/// so counter/rate derivations always see at most one cycle of history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NumericMetric {
    current: Option<Reading>,
    previous: Option<Reading>,
    updated: bool,
}

impl NumericMetric {
    /// Record a new reading, shifting the current one into the previous slot.
    pub fn record(&mut self, value: f64, collect_time_ms: u64) {
        self.previous = self.current.take();
        self.current = Some(Reading {
            value,
            collect_time_ms,
        });
        self.updated = true;
    }

    /// Latest reading, if any
    pub fn current(&self) -> Option<Reading> {
        self.current
    }

    /// Reading from the cycle before the latest one, if any
    pub fn previous(&self) -> Option<Reading> {
        self.previous
    }

    /// Whether the metric received a reading during the current cycle
    pub fn is_updated(&self) -> bool {
        self.updated
    }

    fn clear_updated(&mut self) {
        self.updated = false;
    }
}

/// One discovered hardware component with its attributes and metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Monitor {
    /// Stable identifier within the monitor's type
    pub id: String,
    /// Kind of component
    pub monitor_type: MonitorType,
    attributes: HashMap<String, String>,
    metrics: HashMap<String, NumericMetric>,
}

impl Monitor {
    pub fn new(id: impl Into<String>, monitor_type: MonitorType) -> Self {
        Self {
            id: id.into(),
            monitor_type,
            attributes: HashMap::new(),
            metrics: HashMap::new(),
        }
    }

    /// Get an attribute value.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Set an attribute value.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Builder-style attribute setter for discovery code and tests.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// All attributes.
    pub fn attributes(&self) -> &HashMap<String, String> {
        &self.attributes
    }

    /// Get a metric by name.
    pub fn metric(&self, name: &str) -> Option<&NumericMetric> {
        self.metrics.get(name)
    }

    /// Record a metric reading, creating the metric on first use.
    pub fn record_metric(&mut self, name: &str, value: f64, collect_time_ms: u64) {
        self.metrics
            .entry(name.to_string())
            .or_default()
            .record(value, collect_time_ms);
    }

    /// Names of metrics present on this monitor.
    pub fn metric_names(&self) -> impl Iterator<Item = &str> {
        self.metrics.keys().map(String::as_str)
    }

    /// Mark the start of a new collection cycle: every metric's
    /// "updated this cycle" flag is cleared. Reading history is untouched.
    pub fn begin_cycle(&mut self) {
        for metric in self.metrics.values_mut() {
            metric.clear_updated();
        }
    }
}

/// Cross-monitor attribute lookup, as needed by the `lookup` directive.
///
/// The interpreter only ever scans siblings through this trait; it never
/// takes ownership of other monitors.
pub trait SiblingLookup {
    /// Find the first monitor of `monitor_type` whose `match_attribute`
    /// equals `match_value`, and return its `attribute_to_copy` attribute.
    fn find_attribute(
        &self,
        monitor_type: &str,
        attribute_to_copy: &str,
        match_attribute: &str,
        match_value: &str,
    ) -> Option<String>;
}

/// All currently known monitors, bucketed by type
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorRegistry {
    monitors: HashMap<MonitorType, Vec<Monitor>>,
}

impl MonitorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a monitor to the registry.
    pub fn insert(&mut self, monitor: Monitor) {
        self.monitors
            .entry(monitor.monitor_type.clone())
            .or_default()
            .push(monitor);
    }

    /// Monitors of one type (empty slice if none discovered).
    pub fn monitors_of(&self, monitor_type: &MonitorType) -> &[Monitor] {
        self.monitors
            .get(monitor_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Mutable access to one monitor, for the context-bound pass.
    pub fn get_mut(&mut self, monitor_type: &MonitorType, id: &str) -> Option<&mut Monitor> {
        self.monitors
            .get_mut(monitor_type)?
            .iter_mut()
            .find(|m| m.id == id)
    }

    /// Total number of monitors across all types.
    pub fn len(&self) -> usize {
        self.monitors.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SiblingLookup for MonitorRegistry {
    fn find_attribute(
        &self,
        monitor_type: &str,
        attribute_to_copy: &str,
        match_attribute: &str,
        match_value: &str,
    ) -> Option<String> {
        let parsed: MonitorType = monitor_type
            .parse()
            .unwrap_or(MonitorType::Other(monitor_type.to_string()));
        self.monitors_of(&parsed)
            .iter()
            .find(|m| m.attribute(match_attribute) == Some(match_value))
            .and_then(|m| m.attribute(attribute_to_copy))
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitor_type_from_str() {
        assert_eq!("fan".parse::<MonitorType>().unwrap(), MonitorType::Fan);
        assert_eq!(
            "Power Supply".parse::<MonitorType>().unwrap(),
            MonitorType::PowerSupply
        );
        assert_eq!(
            "physical-disk".parse::<MonitorType>().unwrap(),
            MonitorType::PhysicalDisk
        );
        assert_eq!(
            "quantum_widget".parse::<MonitorType>().unwrap(),
            MonitorType::Other("quantum_widget".to_string())
        );
    }

    #[test]
    fn test_monitor_type_display_round_trip() {
        for t in [
            MonitorType::Fan,
            MonitorType::PowerSupply,
            MonitorType::NetworkCard,
            MonitorType::Gpu,
        ] {
            let back: MonitorType = t.to_string().parse().unwrap();
            assert_eq!(back, t, "display/parse mismatch for {}", t);
        }
    }

    #[test]
    fn test_metric_history_shift() {
        let mut metric = NumericMetric::default();
        assert!(metric.current().is_none());
        assert!(metric.previous().is_none());

        metric.record(10.0, 1_000);
        assert_eq!(metric.current().unwrap().value, 10.0);
        assert!(metric.previous().is_none());

        metric.record(20.0, 2_000);
        assert_eq!(metric.current().unwrap().value, 20.0);
        assert_eq!(metric.previous().unwrap().value, 10.0);
        assert_eq!(metric.previous().unwrap().collect_time_ms, 1_000);
    }

    #[test]
    fn test_begin_cycle_clears_updated_only() {
        let mut monitor = Monitor::new("fan-0", MonitorType::Fan);
        monitor.record_metric("hw.fan.speed", 4000.0, 500);
        assert!(monitor.metric("hw.fan.speed").unwrap().is_updated());

        monitor.begin_cycle();
        let metric = monitor.metric("hw.fan.speed").unwrap();
        assert!(!metric.is_updated());
        assert_eq!(metric.current().unwrap().value, 4000.0);
    }

    #[test]
    fn test_registry_find_attribute() {
        let mut registry = MonitorRegistry::new();
        registry.insert(
            Monitor::new("f1", MonitorType::Fan)
                .with_attribute("id", "F1")
                .with_attribute("location", "front"),
        );
        registry.insert(
            Monitor::new("f2", MonitorType::Fan)
                .with_attribute("id", "F2")
                .with_attribute("location", "rear"),
        );

        assert_eq!(
            registry.find_attribute("fan", "location", "id", "F2"),
            Some("rear".to_string())
        );
        assert_eq!(registry.find_attribute("fan", "location", "id", "F9"), None);
        assert_eq!(registry.find_attribute("gpu", "location", "id", "F1"), None);
    }

    #[test]
    fn test_registry_get_mut() {
        let mut registry = MonitorRegistry::new();
        registry.insert(Monitor::new("d0", MonitorType::PhysicalDisk));
        registry
            .get_mut(&MonitorType::PhysicalDisk, "d0")
            .unwrap()
            .set_attribute("model", "ST4000");
        assert_eq!(
            registry.monitors_of(&MonitorType::PhysicalDisk)[0].attribute("model"),
            Some("ST4000")
        );
    }
}
