//! The evaluator library: one function per directive kind.
//!
//! Pure evaluators (unit conversions, legacy-enum translations, `boolean`,
//! `lookup`, `computePowerShareRatio`) run during the context-free pass and
//! write straight into the output map. Monitor-bound evaluators
//! (`legacyLedStatus`, `legacyPowerSupplyUtilization`, `fakeCounter`,
//! `rate`) cannot run until the target monitor exists; the driver collects
//! them into a [`DeferredSet`] that is applied — and consumed — once the
//! monitor is available.
//!
//! Failure is value-shaped throughout: an evaluator that cannot produce a
//! value returns `None` and the key is omitted this cycle. The only
//! escalating failure in the whole library is the `lookup` arity check.

use crate::error::{EngineError, Result};
use crate::mapping::{math, resolver, KeyValuePair, Row};
use crate::telemetry::{state, Monitor, SiblingLookup};
use std::collections::HashMap;

/// Multiplier for `percent2ratio`
pub const PERCENT_TO_RATIO: f64 = 0.01;
/// Multiplier for `megahertz2hertz`
pub const MEGAHERTZ_TO_HERTZ: f64 = 1e6;
/// Multiplier for `mebibyte2byte`
pub const MEBIBYTE_TO_BYTE: f64 = 1_048_576.0;
/// Multiplier for `millivolt2volt`
pub const MILLIVOLT_TO_VOLT: f64 = 0.001;
/// Multiplier for `megabit2bit`
pub const MEGABIT_TO_BIT: f64 = 1e6;
/// Multiplier for `megabit2byte`
pub const MEGABIT_TO_BYTE: f64 = 125_000.0;

/// Name of the metric `legacyPowerSupplyUtilization` divides by.
pub const POWER_LIMIT_METRIC: &str = "limit";

/// Suffix appended to the key by `computePowerShareRatio`.
pub const RAW_POWER_SHARE_SUFFIX: &str = ".raw_power_share";

const LINK_STATUS: &[(&str, &str)] = &[
    ("ok", "1"),
    ("up", "1"),
    ("degraded", "1"),
    ("failed", "0"),
    ("down", "0"),
];

const FULL_DUPLEX: &[(&str, &str)] = &[("full", "1"), ("half", "0")];

const PREDICTED_FAILURE: &[(&str, &str)] = &[
    ("true", "1"),
    ("yes", "1"),
    ("false", "0"),
    ("no", "0"),
];

const NEEDS_CLEANING: &[(&str, &str)] = &[("needed", "1"), ("not needed", "0"), ("ok", "0")];

const INTRUSION_STATUS: &[(&str, &str)] = &[
    ("detected", "1"),
    ("open", "1"),
    ("ok", "0"),
    ("closed", "0"),
];

/// Parse a directive argument as a number. Accepts anything `f64` parses.
pub(crate) fn parse_numeric(raw: &str) -> Option<f64> {
    raw.trim().parse().ok()
}

/// Render a numeric result the way connector output expects: integral
/// values without a fractional part, everything else via shortest
/// round-trip formatting.
pub(crate) fn format_value(value: f64) -> String {
    if value == value.trunc() && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Shared numeric core of the unit-conversion family. Unparsable input is
/// dropped without a value for this cycle.
pub(crate) fn convert_unit(resolved: &str, factor: f64) -> Option<String> {
    parse_numeric(resolved).map(|value| format_value(value * factor))
}

/// `boolean(x)`: `"1"` or case-insensitive `"true"` → `"1"`, else `"0"`.
/// Total — never fails.
pub(crate) fn boolean(resolved: &str) -> String {
    let v = resolved.trim();
    if v == "1" || v.eq_ignore_ascii_case("true") {
        "1".to_string()
    } else {
        "0".to_string()
    }
}

fn translate_legacy(
    resolved: &str,
    table: &[(&str, &str)],
    what: &str,
    key: &str,
    hostname: &str,
) -> Option<String> {
    let normalized = resolved.trim().to_lowercase();
    match table.iter().find(|(text, _)| *text == normalized) {
        Some((_, code)) => Some((*code).to_string()),
        None => {
            log::warn!(
                "host {}: unrecognized legacy {} value '{}' for {}; key omitted this cycle",
                hostname,
                what,
                resolved,
                key
            );
            None
        }
    }
}

pub(crate) fn legacy_link_status(resolved: &str, key: &str, hostname: &str) -> Option<String> {
    translate_legacy(resolved, LINK_STATUS, "link status", key, hostname)
}

pub(crate) fn legacy_full_duplex(resolved: &str, key: &str, hostname: &str) -> Option<String> {
    translate_legacy(resolved, FULL_DUPLEX, "duplex mode", key, hostname)
}

pub(crate) fn legacy_predicted_failure(
    resolved: &str,
    key: &str,
    hostname: &str,
) -> Option<String> {
    translate_legacy(resolved, PREDICTED_FAILURE, "predicted failure", key, hostname)
}

pub(crate) fn legacy_needs_cleaning(resolved: &str, key: &str, hostname: &str) -> Option<String> {
    translate_legacy(resolved, NEEDS_CLEANING, "needs-cleaning state", key, hostname)
}

pub(crate) fn legacy_intrusion_status(
    resolved: &str,
    key: &str,
    hostname: &str,
) -> Option<String> {
    translate_legacy(resolved, INTRUSION_STATUS, "intrusion status", key, hostname)
}

/// `lookup(monitorType, attributeToCopy, matchAttribute, matchValue)`:
/// copy an attribute from a sibling monitor.
///
/// Exactly four arguments are required; anything else is a
/// connector-authoring defect and the one error this library escalates.
pub(crate) fn lookup(
    raw_args: &[String],
    directive: &str,
    row: &Row,
    registry: Option<&dyn SiblingLookup>,
    key: &str,
    hostname: &str,
) -> Result<Option<String>> {
    if raw_args.len() != 4 {
        return Err(EngineError::LookupArity {
            found: raw_args.len(),
            directive: directive.to_string(),
        });
    }

    let mut resolved = Vec::with_capacity(4);
    for arg in raw_args {
        let value = resolver::resolve_argument(arg, row);
        if value.is_empty() {
            log::error!(
                "host {}: lookup argument '{}' resolved empty for {} ({}); key omitted",
                hostname,
                arg,
                key,
                directive
            );
            return Ok(None);
        }
        resolved.push(value);
    }

    let Some(registry) = registry else {
        log::warn!(
            "host {}: no monitor registry available for lookup on {}; key omitted",
            hostname,
            key
        );
        return Ok(None);
    };

    let found = registry.find_attribute(&resolved[0], &resolved[1], &resolved[2], &resolved[3]);
    if found.is_none() {
        log::warn!(
            "host {}: lookup found no {} monitor with {}={} for {}",
            hostname,
            resolved[0],
            resolved[2],
            resolved[3],
            key
        );
    }
    Ok(found)
}

/// Which monitor-bound evaluator a deferred entry routes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredKind {
    /// `legacyLedStatus`
    LedStatus,
    /// `legacyPowerSupplyUtilization`
    PowerSupplyUtilization,
    /// `fakeCounter`
    FakeCounter,
    /// `rate`
    Rate,
}

/// One deferred evaluation: the evaluator kind plus the key/resolved-value
/// pair it will receive together with the monitor.
#[derive(Debug, Clone)]
pub struct DeferredEntry {
    pub kind: DeferredKind,
    pub pair: KeyValuePair,
}

/// Monitor-bound evaluations deferred by the context-free pass.
///
/// The set captures the collect time and hostname of the pass that created
/// it, and is consumed by value when applied — it cannot survive into the
/// next monitor's interpretation, and a key routed here was never written
/// to the context-free output map.
#[derive(Debug, Default)]
pub struct DeferredSet {
    entries: Vec<DeferredEntry>,
    pub(crate) collect_time_ms: u64,
    pub(crate) hostname: String,
}

impl DeferredSet {
    pub(crate) fn new(collect_time_ms: u64, hostname: &str) -> Self {
        Self {
            entries: Vec::new(),
            collect_time_ms,
            hostname: hostname.to_string(),
        }
    }

    pub(crate) fn push(&mut self, kind: DeferredKind, pair: KeyValuePair) {
        self.entries.push(DeferredEntry { kind, pair });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys awaiting the context-bound pass.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.pair.key.as_str())
    }

    /// Run every deferred evaluator against `monitor` and return the keys
    /// that produced a value. Consumes the set.
    pub fn apply(self, monitor: &mut Monitor) -> HashMap<String, String> {
        let mut out = HashMap::new();
        let collect_time_ms = self.collect_time_ms;
        let hostname = self.hostname;
        for entry in self.entries {
            let key = entry.pair.key.clone();
            let value = match entry.kind {
                DeferredKind::LedStatus => led_status(&entry.pair, monitor),
                DeferredKind::PowerSupplyUtilization => {
                    power_supply_utilization(&entry.pair, monitor, &hostname)
                }
                DeferredKind::FakeCounter => {
                    fake_counter(&entry.pair, monitor, collect_time_ms, &hostname)
                }
                DeferredKind::Rate => rate(&entry.pair, monitor, collect_time_ms, &hostname),
            };
            if let Some(value) = value {
                out.insert(key, value);
            }
        }
        out
    }
}

/// `legacyLedStatus(phase)`: map the LED phase onto the matching
/// discovery-time status attribute of the same monitor.
fn led_status(pair: &KeyValuePair, monitor: &Monitor) -> Option<String> {
    let attribute = match pair.value.trim().to_lowercase().as_str() {
        "on" => "__on_status",
        "off" => "__off_status",
        "blinking" => "__blinking_status",
        _ => return None,
    };
    monitor.attribute(attribute).map(str::to_lowercase)
}

/// `legacyPowerSupplyUtilization(power)`: power draw over the monitor's own
/// `limit` metric. Not every power-supply variant exposes a limit, so a
/// missing metric just omits the key.
fn power_supply_utilization(
    pair: &KeyValuePair,
    monitor: &Monitor,
    hostname: &str,
) -> Option<String> {
    let power = parse_numeric(&pair.value)?;
    let limit = state::metric_value(monitor, POWER_LIMIT_METRIC, false);
    math::divide(&pair.key, Some(power), limit, hostname).map(format_value)
}

/// Shadow metric name remembering the raw reading behind `fakeCounter`.
pub(crate) fn fake_counter_shadow(key: &str) -> String {
    format!("__{}.fake_counter_from", key)
}

/// Shadow metric name remembering the raw counter behind `rate`.
pub(crate) fn rate_shadow(key: &str) -> String {
    format!("__{}.rate_from", key)
}

/// `fakeCounter(x)`: integrate an instantaneous reading into an
/// accumulating counter.
///
/// The raw reading and the collect time are remembered in a shadow metric;
/// elapsed seconds since the previous shadow reading times the raw value is
/// added to the metric's last stored value. The first collect (no shadow
/// history) yields nothing.
fn fake_counter(
    pair: &KeyValuePair,
    monitor: &mut Monitor,
    collect_time_ms: u64,
    hostname: &str,
) -> Option<String> {
    let key = pair.key.as_str();
    let Some(raw) = parse_numeric(&pair.value) else {
        log::warn!(
            "host {}: fakeCounter argument '{}' for {} is not numeric; key omitted",
            hostname,
            pair.value,
            key
        );
        return None;
    };

    let shadow = fake_counter_shadow(key);
    monitor.record_metric(&shadow, raw, collect_time_ms);

    let delta_ms = math::subtract(
        key,
        Some(collect_time_ms as f64),
        state::metric_collect_time(monitor, &shadow, true),
        hostname,
    )?;
    let delta_seconds = delta_ms / 1000.0;
    let usage_delta = math::multiply(key, Some(raw), Some(delta_seconds), hostname)?;
    let counter = usage_delta + state::metric_value(monitor, key, false).unwrap_or(0.0);
    Some(format_value(counter))
}

/// `rate(x)`: per-second rate derived from a monotonic counter.
///
/// Symmetric to [`fake_counter`]: the raw counter and collect time go into
/// a shadow metric, and the counter delta over the elapsed seconds is the
/// result. A counter reset (lower reading) nulls out in the guarded
/// subtract instead of producing a negative rate.
fn rate(
    pair: &KeyValuePair,
    monitor: &mut Monitor,
    collect_time_ms: u64,
    hostname: &str,
) -> Option<String> {
    let key = pair.key.as_str();
    let Some(raw) = parse_numeric(&pair.value) else {
        log::warn!(
            "host {}: rate argument '{}' for {} is not numeric; key omitted",
            hostname,
            pair.value,
            key
        );
        return None;
    };

    let shadow = rate_shadow(key);
    monitor.record_metric(&shadow, raw, collect_time_ms);

    let delta_ms = math::subtract(
        key,
        Some(collect_time_ms as f64),
        state::metric_collect_time(monitor, &shadow, true),
        hostname,
    )?;
    let delta_counter = math::subtract(
        key,
        Some(raw),
        state::metric_value(monitor, &shadow, true),
        hostname,
    )?;
    math::divide(key, Some(delta_counter), Some(delta_ms / 1000.0), hostname).map(format_value)
}
