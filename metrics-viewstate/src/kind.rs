/// Instrument kind.
///
/// Defines the kind, or type, of an instrument, covering both the
/// synchronous instruments updated directly from application threads and the
/// asynchronous instruments sampled once per collection cycle through an
/// observation callback.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum InstrumentKind {
    /// Monotonic counter, updated synchronously.
    Counter,
    /// Bidirectional counter, updated synchronously.
    UpDownCounter,
    /// Distribution recorder, updated synchronously.
    Histogram,
    /// Monotonic counter sampled through a callback.
    ObservableCounter,
    /// Bidirectional counter sampled through a callback.
    ObservableUpDownCounter,
    /// Current-value instrument sampled through a callback.
    ObservableGauge,
}

impl InstrumentKind {
    /// Whether instruments of this kind are updated by direct calls from
    /// application threads rather than sampled once per collection cycle.
    pub fn synchronous(&self) -> bool {
        matches!(
            self,
            InstrumentKind::Counter | InstrumentKind::UpDownCounter | InstrumentKind::Histogram
        )
    }
}

/// Aggregation kind.
///
/// How one (reader, view) pairing aggregates an instrument's measurements.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum AggregationKind {
    /// Suppress the pairing entirely; it produces no output.
    Drop,
    /// Accumulate measurements into a sum.
    Sum,
    /// Keep the most recent measurement.
    LastValue,
    /// Bucket measurements into an explicit-boundary histogram.
    Histogram,
}
