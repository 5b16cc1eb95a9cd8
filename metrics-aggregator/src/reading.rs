use ordered_float::OrderedFloat;

use crate::number::NumberKind;

/// A kind-tagged measurement value read out of aggregation storage.
///
/// Floating values are wrapped in [`OrderedFloat`] so that readings can be
/// compared and hashed in tests and exporter bookkeeping.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MetricValue {
    /// A 64-bit signed integer value.
    Int64(i64),
    /// A 64-bit floating-point value.
    Float64(OrderedFloat<f64>),
}

impl MetricValue {
    /// The numeric kind of this value.
    pub fn kind(&self) -> NumberKind {
        match self {
            MetricValue::Int64(_) => NumberKind::Int64,
            MetricValue::Float64(_) => NumberKind::Float64,
        }
    }
}

impl From<i64> for MetricValue {
    fn from(value: i64) -> Self {
        MetricValue::Int64(value)
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        MetricValue::Float64(value.into())
    }
}

/// A point-in-time reading of an explicit-boundary histogram.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct HistogramReading {
    /// Number of recorded measurements.
    pub count: u64,
    /// Sum of recorded measurements.
    pub sum: MetricValue,
    /// Per-bucket counts; one more bucket than there are boundaries, the
    /// last catching values above the highest boundary.
    pub buckets: Vec<u64>,
    /// The bucket boundaries, sorted ascending.
    pub boundaries: Vec<OrderedFloat<f64>>,
}

/// A point-in-time reading of aggregation storage.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Reading {
    /// An accumulated sum.
    Sum(MetricValue),
    /// The last recorded value, absent when nothing has been recorded since
    /// the storage was last reset.
    LastValue(Option<MetricValue>),
    /// A bucketed distribution.
    Histogram(HistogramReading),
}
