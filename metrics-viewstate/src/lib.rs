//! View compilation and measurement collection for a metrics SDK.
//!
//! This crate decides, for every instrument an application creates, how each
//! attached export destination ("reader") aggregates that instrument's
//! values, and produces the runtime objects that receive updates and
//! periodically harvest them without losing or double-counting data under
//! concurrent access.
//!
//! The flow: configure [`View`] rules and [`Reader`]s, build a [`Compiler`],
//! and call [`Compiler::compile`] once per instrument registration.  The
//! result, when any (reader, view) pairing survives resolution, is an
//! [`Instrument`] handle that mints one [`CollectorUpdater`] per distinct
//! attribute combination.  Instrumentation call-sites feed values through
//! [`Updater::update`]; each reader's collection cycle drives
//! [`Collector::collect`] and then harvests the reader's accumulated
//! outputs.
//!
//! Synchronous instruments take concurrent updates from arbitrary
//! application threads on a lock-free path; asynchronous instruments are
//! sampled at most once per cycle through an observation callback behind a
//! short-held mutex.  When an instrument fans out to several (reader, view)
//! targets, a single update call feeds all of them.

mod attributes;
pub use attributes::{Attribute, AttributeSet, KeyFilter, SharedString};

mod collector;
pub use collector::{Collector, CollectorUpdater, Instrument, Updater};

mod compile;
pub use compile::Compiler;

mod descriptor;
pub use descriptor::{Descriptor, Library};

mod diagnostics;
pub use diagnostics::{CapturingSink, DiagnosticsSink, LogSink, ViewError};

mod kind;
pub use kind::{AggregationKind, InstrumentKind};

mod reader;
pub use reader::{DefaultsFn, MetricReading, Reader, ViewMetric, ViewProducer};

mod view;
pub use view::{View, ViewBuilder};

pub use metrics_aggregator::{
    HistogramReading, MetricValue, Number, NumberKind, Reading,
};
