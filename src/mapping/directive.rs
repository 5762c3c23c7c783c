//! Directive classification.
//!
//! A directive is a raw string out of a mapping section; all of its
//! semantics come from matching it against a fixed, ordered list of shapes.
//! [`classify`] walks that list first-match-wins and produces a
//! [`DirectiveKind`] the driver switches on.
//!
//! The order is a correctness invariant, not a style choice: every
//! function-call directive whose argument is a column reference (say
//! `rate($1)`) also *contains* an embedded column reference, so the
//! embedded-text shape must be tried only after every function shape has
//! been ruled out. Reorder this list and `fakeCounter($1)` silently turns
//! into the literal text `fakeCounter(<cell>)`.

use crate::awk;
use crate::mapping::resolver;

/// Classified directive, carrying its raw argument(s) where applicable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveKind {
    /// `$column(N)` or `$N`, matching the whole directive
    ColumnReference(usize),
    /// `${awk::…}` block, unwrapped body
    AwkScript(String),
    /// `megabit2bit(x)`
    MegaBit2Bit(String),
    /// `megabit2byte(x)`
    MegaBit2Byte(String),
    /// `percent2ratio(x)`
    Percent2Ratio(String),
    /// `megahertz2hertz(x)`
    MegaHertz2Hertz(String),
    /// `mebibyte2byte(x)`
    MebiByte2Byte(String),
    /// `millivolt2volt(x)`
    MilliVolt2Volt(String),
    /// `boolean(x)`
    Boolean(String),
    /// `legacyLedStatus(x)` — monitor-bound
    LegacyLedStatus(String),
    /// `legacyIntrusionStatus(x)`
    LegacyIntrusionStatus(String),
    /// `legacyPredictedFailure(x)`
    LegacyPredictedFailure(String),
    /// `legacyNeedsCleaning(x)`
    LegacyNeedsCleaning(String),
    /// `legacyLinkStatus(x)`
    LegacyLinkStatus(String),
    /// `legacyFullDuplex(x)`
    LegacyFullDuplex(String),
    /// `lookup(type, attributeToCopy, matchAttribute, matchValue)`
    Lookup(Vec<String>),
    /// `computePowerShareRatio(x)` — stores under `<key>.raw_power_share`
    ComputePowerShareRatio(String),
    /// `legacyPowerSupplyUtilization(x)` — monitor-bound
    LegacyPowerSupplyUtilization(String),
    /// `fakeCounter(x)` — monitor-bound, stateful
    FakeCounter(String),
    /// `rate(x)` — monitor-bound, stateful
    Rate(String),
    /// Text containing embedded `$N` references
    EmbeddedColumns,
    /// Text containing the `$index` token
    IndexCounter,
    /// Anything else: literal pass-through
    Literal,
}

/// Classify a raw directive. First match in the fixed precedence order wins.
pub fn classify(raw: &str) -> DirectiveKind {
    if let Some(column) = resolver::column_index(raw) {
        return DirectiveKind::ColumnReference(column);
    }
    if let Some(body) = awk::script_body(raw) {
        return DirectiveKind::AwkScript(body.to_string());
    }
    if let Some(arg) = function_argument(raw, "megabit2bit") {
        return DirectiveKind::MegaBit2Bit(arg);
    }
    if let Some(arg) = function_argument(raw, "megabit2byte") {
        return DirectiveKind::MegaBit2Byte(arg);
    }
    if let Some(arg) = function_argument(raw, "percent2ratio") {
        return DirectiveKind::Percent2Ratio(arg);
    }
    if let Some(arg) = function_argument(raw, "megahertz2hertz") {
        return DirectiveKind::MegaHertz2Hertz(arg);
    }
    if let Some(arg) = function_argument(raw, "mebibyte2byte") {
        return DirectiveKind::MebiByte2Byte(arg);
    }
    if let Some(arg) = function_argument(raw, "millivolt2volt") {
        return DirectiveKind::MilliVolt2Volt(arg);
    }
    if let Some(arg) = function_argument(raw, "boolean") {
        return DirectiveKind::Boolean(arg);
    }
    if let Some(arg) = function_argument(raw, "legacyledstatus") {
        return DirectiveKind::LegacyLedStatus(arg);
    }
    if let Some(arg) = function_argument(raw, "legacyintrusionstatus") {
        return DirectiveKind::LegacyIntrusionStatus(arg);
    }
    if let Some(arg) = function_argument(raw, "legacypredictedfailure") {
        return DirectiveKind::LegacyPredictedFailure(arg);
    }
    if let Some(arg) = function_argument(raw, "legacyneedscleaning") {
        return DirectiveKind::LegacyNeedsCleaning(arg);
    }
    if let Some(arg) = function_argument(raw, "legacylinkstatus") {
        return DirectiveKind::LegacyLinkStatus(arg);
    }
    if let Some(arg) = function_argument(raw, "legacyfullduplex") {
        return DirectiveKind::LegacyFullDuplex(arg);
    }
    if let Some(arg) = function_argument(raw, "lookup") {
        let args = arg
            .split(',')
            .map(|part| part.trim().to_string())
            .collect();
        return DirectiveKind::Lookup(args);
    }
    if let Some(arg) = function_argument(raw, "computepowershareratio") {
        return DirectiveKind::ComputePowerShareRatio(arg);
    }
    if let Some(arg) = function_argument(raw, "legacypowersupplyutilization") {
        return DirectiveKind::LegacyPowerSupplyUtilization(arg);
    }
    if let Some(arg) = function_argument(raw, "fakecounter") {
        return DirectiveKind::FakeCounter(arg);
    }
    if let Some(arg) = function_argument(raw, "rate") {
        return DirectiveKind::Rate(arg);
    }
    if resolver::contains_column_reference(raw) {
        return DirectiveKind::EmbeddedColumns;
    }
    if raw.contains(resolver::INDEX_TOKEN) {
        return DirectiveKind::IndexCounter;
    }
    DirectiveKind::Literal
}

/// Argument text of a `name(…)` call, matched case-insensitively on the
/// whole directive. Returns `None` when the directive has a different shape.
fn function_argument(raw: &str, name: &str) -> Option<String> {
    let trimmed = raw.trim();
    let head = trimmed.get(..name.len())?;
    if !head.eq_ignore_ascii_case(name) {
        return None;
    }
    let tail = &trimmed[name.len()..];
    if !tail.starts_with('(') || !tail.ends_with(')') {
        return None;
    }
    Some(tail[1..tail.len() - 1].trim().to_string())
}
