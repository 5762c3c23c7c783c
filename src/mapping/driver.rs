//! Two-phase mapping interpretation.
//!
//! One interpretation call takes one collected [`Row`] against one mapping
//! section and runs in two phases. The context-free phase resolves every
//! directive that needs nothing beyond the row — column references, unit
//! conversions, legacy-enum translations, lookups, AWK scripts — and defers
//! the monitor-bound directives into a [`DeferredSet`]. Once the target
//! [`Monitor`] is materialized, [`MappingInterpreter::complete`] consumes
//! that set and produces the remaining values.
//!
//! The interpreter never creates monitors and never stores final metric
//! values; both belong to the surrounding collection engine. Its only
//! monitor writes are the shadow metrics behind `fakeCounter` and `rate`.
//!
//! # Examples
//!
//! ```
//! use hwmonlib::mapping::driver::{InterpretationContext, MappingInterpreter};
//! use hwmonlib::mapping::{Mapping, Row};
//! use hwmonlib::telemetry::{Monitor, MonitorType};
//!
//! let mapping: Mapping = serde_json::from_str(r#"{
//!     "attributes": { "id": "$1" },
//!     "metrics": { "hw.fan.speed": "$2", "hw.fan.speed_ratio": "percent2ratio($3)" }
//! }"#).unwrap();
//!
//! let row = Row::from(vec!["fan-1", "4200", "50"]);
//! let interpreter = MappingInterpreter::new(&mapping);
//! let ctx = InterpretationContext::new(&row, "server-42");
//!
//! let metrics = interpreter.interpret_metrics(&ctx).unwrap();
//! assert_eq!(metrics.values["hw.fan.speed"], "4200");
//! assert_eq!(metrics.values["hw.fan.speed_ratio"], "0.5");
//!
//! let mut fan = Monitor::new("fan-1", MonitorType::Fan);
//! let late = interpreter.complete(metrics.deferred, &mut fan);
//! assert!(late.is_empty());
//! ```

use crate::awk::{self, AwkExecutor};
use crate::error::Result;
use crate::mapping::directive::{classify, DirectiveKind};
use crate::mapping::evaluators::{self, DeferredKind, DeferredSet, RAW_POWER_SHARE_SUFFIX};
use crate::mapping::{resolver, KeyValuePair, Mapping, Row};
use crate::telemetry::{Monitor, SiblingLookup};
use std::collections::HashMap;

/// Everything one interpretation call needs besides the mapping itself.
#[derive(Debug, Clone, Copy)]
pub struct InterpretationContext<'a> {
    /// The collected row under interpretation
    pub row: &'a Row,
    /// Hostname of the polled device, for log context
    pub hostname: &'a str,
    /// Auto-increment counter substituted for `$index`
    pub index: usize,
    /// Collect time of the current cycle (Unix milliseconds)
    pub collect_time_ms: u64,
}

impl<'a> InterpretationContext<'a> {
    /// Context stamped with the current wall clock.
    pub fn new(row: &'a Row, hostname: &'a str) -> Self {
        Self {
            row,
            hostname,
            index: 0,
            collect_time_ms: chrono::Utc::now().timestamp_millis().max(0) as u64,
        }
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    pub fn with_collect_time(mut self, collect_time_ms: u64) -> Self {
        self.collect_time_ms = collect_time_ms;
        self
    }
}

/// Result of a context-free pass over one mapping section: the values that
/// could be produced without a monitor, and the evaluations waiting for one.
///
/// A key lands in exactly one of the two — classification routes each
/// directive either to an immediate evaluator or to the deferred set.
#[derive(Debug)]
pub struct PhaseOutput {
    /// Resolved key→value pairs
    pub values: HashMap<String, String>,
    /// Monitor-bound evaluations for the context-bound pass
    pub deferred: DeferredSet,
}

/// Resolved resource block: a type name plus its attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceValues {
    pub type_name: String,
    pub attributes: HashMap<String, String>,
}

/// Interprets one mapping against collected rows.
///
/// Borrowing collaborators keeps the driver reusable across every row and
/// monitor of a collection cycle: the registry feeds `lookup`, the AWK
/// executor runs script blocks. Both are optional — a mapping using
/// neither interprets fine without them.
pub struct MappingInterpreter<'a> {
    mapping: &'a Mapping,
    registry: Option<&'a dyn SiblingLookup>,
    awk: Option<&'a dyn AwkExecutor>,
}

impl<'a> MappingInterpreter<'a> {
    pub fn new(mapping: &'a Mapping) -> Self {
        Self {
            mapping,
            registry: None,
            awk: None,
        }
    }

    /// Attach the monitor registry the `lookup` directive scans.
    pub fn with_registry(mut self, registry: &'a dyn SiblingLookup) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Attach the AWK execution collaborator.
    pub fn with_awk(mut self, awk: &'a dyn AwkExecutor) -> Self {
        self.awk = Some(awk);
        self
    }

    /// The collected table this mapping interprets.
    pub fn source(&self) -> Option<&str> {
        self.mapping.source.as_deref()
    }

    /// Context-free pass over the `attributes` section.
    pub fn interpret_attributes(&self, ctx: &InterpretationContext<'_>) -> Result<PhaseOutput> {
        self.interpret_section(&self.mapping.attributes, ctx)
    }

    /// Context-free pass over the `metrics` section.
    pub fn interpret_metrics(&self, ctx: &InterpretationContext<'_>) -> Result<PhaseOutput> {
        self.interpret_section(&self.mapping.metrics, ctx)
    }

    /// Context-free pass over the `conditionalCollection` section.
    pub fn interpret_conditional_collection(
        &self,
        ctx: &InterpretationContext<'_>,
    ) -> Result<PhaseOutput> {
        self.interpret_section(&self.mapping.conditional_collection, ctx)
    }

    /// Context-free pass over the `legacyTextParameters` section.
    pub fn interpret_legacy_text_parameters(
        &self,
        ctx: &InterpretationContext<'_>,
    ) -> Result<PhaseOutput> {
        self.interpret_section(&self.mapping.legacy_text_parameters, ctx)
    }

    /// Context-bound pass: run the deferred evaluations against the now
    /// materialized monitor. Consumes the set, so nothing can leak into the
    /// next monitor's interpretation.
    pub fn complete(
        &self,
        deferred: DeferredSet,
        monitor: &mut Monitor,
    ) -> HashMap<String, String> {
        deferred.apply(monitor)
    }

    /// Resolve the resource block, if the mapping has one. Resource
    /// directives are context-free; a monitor-bound directive here is a
    /// connector defect and is dropped with a warning.
    pub fn interpret_resource(
        &self,
        ctx: &InterpretationContext<'_>,
    ) -> Result<Option<ResourceValues>> {
        let Some(resource) = &self.mapping.resource else {
            return Ok(None);
        };
        let output = self.interpret_section(&resource.attributes, ctx)?;
        if !output.deferred.is_empty() {
            log::warn!(
                "host {}: resource attributes {:?} require a monitor and were dropped",
                ctx.hostname,
                output.deferred.keys().collect::<Vec<_>>()
            );
        }
        Ok(Some(ResourceValues {
            type_name: resolver::resolve_argument(&resource.type_directive, ctx.row),
            attributes: output.values,
        }))
    }

    fn interpret_section(
        &self,
        section: &HashMap<String, String>,
        ctx: &InterpretationContext<'_>,
    ) -> Result<PhaseOutput> {
        let mut values = HashMap::new();
        let mut deferred = DeferredSet::new(ctx.collect_time_ms, ctx.hostname);

        for (key, raw) in section {
            match classify(raw) {
                DirectiveKind::ColumnReference(_) => {
                    values.insert(key.clone(), resolver::resolve_argument(raw, ctx.row));
                }
                DirectiveKind::AwkScript(body) => {
                    if let Some(value) = self.run_awk(&body, key, ctx) {
                        values.insert(key.clone(), value);
                    }
                }
                DirectiveKind::MegaBit2Bit(arg) => {
                    self.convert(&mut values, key, &arg, evaluators::MEGABIT_TO_BIT, ctx);
                }
                DirectiveKind::MegaBit2Byte(arg) => {
                    self.convert(&mut values, key, &arg, evaluators::MEGABIT_TO_BYTE, ctx);
                }
                DirectiveKind::Percent2Ratio(arg) => {
                    self.convert(&mut values, key, &arg, evaluators::PERCENT_TO_RATIO, ctx);
                }
                DirectiveKind::MegaHertz2Hertz(arg) => {
                    self.convert(&mut values, key, &arg, evaluators::MEGAHERTZ_TO_HERTZ, ctx);
                }
                DirectiveKind::MebiByte2Byte(arg) => {
                    self.convert(&mut values, key, &arg, evaluators::MEBIBYTE_TO_BYTE, ctx);
                }
                DirectiveKind::MilliVolt2Volt(arg) => {
                    self.convert(&mut values, key, &arg, evaluators::MILLIVOLT_TO_VOLT, ctx);
                }
                DirectiveKind::Boolean(arg) => {
                    let resolved = resolver::resolve_argument(&arg, ctx.row);
                    values.insert(key.clone(), evaluators::boolean(&resolved));
                }
                DirectiveKind::LegacyIntrusionStatus(arg) => {
                    let resolved = resolver::resolve_argument(&arg, ctx.row);
                    if let Some(v) =
                        evaluators::legacy_intrusion_status(&resolved, key, ctx.hostname)
                    {
                        values.insert(key.clone(), v);
                    }
                }
                DirectiveKind::LegacyPredictedFailure(arg) => {
                    let resolved = resolver::resolve_argument(&arg, ctx.row);
                    if let Some(v) =
                        evaluators::legacy_predicted_failure(&resolved, key, ctx.hostname)
                    {
                        values.insert(key.clone(), v);
                    }
                }
                DirectiveKind::LegacyNeedsCleaning(arg) => {
                    let resolved = resolver::resolve_argument(&arg, ctx.row);
                    if let Some(v) = evaluators::legacy_needs_cleaning(&resolved, key, ctx.hostname)
                    {
                        values.insert(key.clone(), v);
                    }
                }
                DirectiveKind::LegacyLinkStatus(arg) => {
                    let resolved = resolver::resolve_argument(&arg, ctx.row);
                    if let Some(v) = evaluators::legacy_link_status(&resolved, key, ctx.hostname) {
                        values.insert(key.clone(), v);
                    }
                }
                DirectiveKind::LegacyFullDuplex(arg) => {
                    let resolved = resolver::resolve_argument(&arg, ctx.row);
                    if let Some(v) = evaluators::legacy_full_duplex(&resolved, key, ctx.hostname) {
                        values.insert(key.clone(), v);
                    }
                }
                DirectiveKind::Lookup(args) => {
                    if let Some(v) = evaluators::lookup(
                        &args,
                        raw,
                        ctx.row,
                        self.registry,
                        key,
                        ctx.hostname,
                    )? {
                        values.insert(key.clone(), v);
                    }
                }
                DirectiveKind::ComputePowerShareRatio(arg) => {
                    // Raw value under a companion key; normalization happens
                    // downstream, once every power consumer is known.
                    values.insert(
                        format!("{}{}", key, RAW_POWER_SHARE_SUFFIX),
                        resolver::resolve_argument(&arg, ctx.row),
                    );
                }
                DirectiveKind::LegacyLedStatus(arg) => {
                    Self::defer(&mut deferred, DeferredKind::LedStatus, key, &arg, ctx);
                }
                DirectiveKind::LegacyPowerSupplyUtilization(arg) => {
                    Self::defer(
                        &mut deferred,
                        DeferredKind::PowerSupplyUtilization,
                        key,
                        &arg,
                        ctx,
                    );
                }
                DirectiveKind::FakeCounter(arg) => {
                    Self::defer(&mut deferred, DeferredKind::FakeCounter, key, &arg, ctx);
                }
                DirectiveKind::Rate(arg) => {
                    Self::defer(&mut deferred, DeferredKind::Rate, key, &arg, ctx);
                }
                DirectiveKind::EmbeddedColumns => {
                    values.insert(
                        key.clone(),
                        resolver::replace_column_references(raw, ctx.row),
                    );
                }
                DirectiveKind::IndexCounter => {
                    values.insert(key.clone(), resolver::replace_index(raw, ctx.index));
                }
                DirectiveKind::Literal => {
                    values.insert(key.clone(), raw.clone());
                }
            }
        }

        Ok(PhaseOutput { values, deferred })
    }

    fn convert(
        &self,
        values: &mut HashMap<String, String>,
        key: &str,
        arg: &str,
        factor: f64,
        ctx: &InterpretationContext<'_>,
    ) {
        let resolved = resolver::resolve_argument(arg, ctx.row);
        if let Some(v) = evaluators::convert_unit(&resolved, factor) {
            values.insert(key.to_string(), v);
        }
    }

    fn defer(
        deferred: &mut DeferredSet,
        kind: DeferredKind,
        key: &str,
        arg: &str,
        ctx: &InterpretationContext<'_>,
    ) {
        let resolved = resolver::resolve_argument(arg, ctx.row);
        deferred.push(kind, KeyValuePair::new(key, resolved));
    }

    fn run_awk(
        &self,
        body: &str,
        key: &str,
        ctx: &InterpretationContext<'_>,
    ) -> Option<String> {
        let Some(executor) = self.awk else {
            log::warn!(
                "host {}: AWK directive for {} but no executor configured; key omitted",
                ctx.hostname,
                key
            );
            return None;
        };
        let script = awk::build_script(body);
        match executor.execute(&script, &ctx.row.joined()) {
            Ok(value) => Some(value),
            Err(err) => {
                log::warn!(
                    "host {}: AWK execution for {} failed: {}; key omitted",
                    ctx.hostname,
                    key,
                    err
                );
                None
            }
        }
    }
}
