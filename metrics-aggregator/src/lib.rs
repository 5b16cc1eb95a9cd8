//! Aggregation primitives for the metrics view pipeline.
//!
//! This crate provides the pluggable aggregation capability consumed by
//! `metrics-viewstate`: a closed set of numeric kinds, a uniform operation
//! contract over aggregation storage, and the three supported aggregations.
//!
//! Every aggregation exposes the same four storage operations through the
//! [`Aggregator`] trait: `init`, `update`, `synchronized_move`, and `merge`,
//! plus a point-in-time [`Reading`] used by exporters and tests.  Storage is
//! interior-mutable and safe to update from concurrent callers; the exact
//! discipline (atomics versus a short-held lock) is per-aggregation.

mod aggregator;
pub use aggregator::Aggregator;

mod number;
pub use number::{AtomicNumber, Number, NumberKind};

mod reading;
pub use reading::{HistogramReading, MetricValue, Reading};

pub mod histogram;
pub mod last_value;
pub mod sum;
