//! # hwmon-engine
//!
//! Mapping and directive interpretation core of a hardware-monitoring
//! agent. Connectors describe, declaratively, how one row of collected
//! protocol output (SNMP, WMI, IPMI, …) becomes the attributes and metrics
//! of a discovered monitor — a fan, a disk, a power supply. This crate is
//! the interpreter for that description: a small embedded directive
//! language with a strict dispatch order, two-phase evaluation, and
//! stateful time-series derivation that turns instantaneous readings into
//! counters and counters into rates without ever faulting the collection
//! pipeline.
//!
//! Protocol clients, connector parsing, monitor storage and metric export
//! all live outside this crate; it consumes rows, mappings and monitors
//! through narrow interfaces and hands back plain key→value maps.
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
//!     "metrics": { "hw.fan.speed": "$2" }
//! }"#).unwrap();
//!
//! let row = Row::from(vec!["fan-1", "4200"]);
//! let interpreter = MappingInterpreter::new(&mapping);
//! let ctx = InterpretationContext::new(&row, "server-42");
//!
//! let attributes = interpreter.interpret_attributes(&ctx).unwrap();
//! assert_eq!(attributes.values["id"], "fan-1");
//! ```

pub mod awk;
pub mod collect;
pub mod error;
pub mod mapping;
pub mod telemetry;

pub use error::{EngineError, Result};
pub use mapping::driver::{
    InterpretationContext, MappingInterpreter, PhaseOutput, ResourceValues,
};
pub use mapping::{KeyValuePair, Mapping, ResourceMapping, Row};
pub use telemetry::{Monitor, MonitorRegistry, MonitorType, SiblingLookup};
