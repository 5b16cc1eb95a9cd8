//! Runtime collection machinery.
//!
//! Two concurrency disciplines coexist here.  Synchronous collectors take
//! updates from arbitrary application threads and therefore keep the update
//! path lock-free, leaning on the aggregation storage's own atomicity; the
//! snapshot hand-off in `collect` is the aggregation's `synchronized_move`,
//! indivisible with respect to any concurrent update.  Asynchronous
//! collectors receive at most one observation per collection cycle from a
//! callback, so a short-held mutex is the simplest correct discipline there.

use std::sync::Arc;

use metrics_aggregator::{Aggregator, Number};
use parking_lot::Mutex;

use crate::attributes::AttributeSet;

/// A compiled instrument: mints a collector for each distinct attribute
/// combination the application observes.
///
/// Produced once per instrument registration by compilation; either a single
/// compiled view or a fan-out over several.
pub trait Instrument<N: Number>: Send + Sync {
    /// Creates the collector for an attribute combination.
    ///
    /// Called the first time a combination is observed; the returned
    /// collector is cached and reused by the caller's layer.
    fn new_collector(&self, attributes: AttributeSet) -> Box<dyn CollectorUpdater<N>>;
}

/// Periodic harvest of accumulated state into reader-owned output storage.
pub trait Collector: Send + Sync {
    /// Moves the accumulated working state into a snapshot and merges the
    /// snapshot into the output storage.
    ///
    /// Called by the owning reader once per collection cycle, never
    /// concurrently with itself for one collector, but freely concurrently
    /// with updates.
    fn collect(&self);
}

/// Receives measurement values between collections.
pub trait Updater<N: Number> {
    /// Folds one measurement into the working state.
    fn update(&self, value: N);
}

/// The full collector surface handed back to instrumentation call-sites.
pub trait CollectorUpdater<N: Number>: Collector + Updater<N> {}

impl<N: Number, T: Collector + Updater<N>> CollectorUpdater<N> for T {}

/// Collector for synchronous instruments: concurrency-safe accumulation
/// under many writers, collected periodically by one reader thread.
pub(crate) struct SyncCollector<N: Number, A: Aggregator<N>> {
    current: A::Storage,
    snapshot: A::Storage,
    output: Arc<A::Storage>,
}

impl<N: Number, A: Aggregator<N>> SyncCollector<N, A> {
    pub(crate) fn new(config: &A::Config, output: Arc<A::Storage>) -> Self {
        SyncCollector { current: A::init(config), snapshot: A::init(config), output }
    }
}

impl<N: Number, A: Aggregator<N>> Updater<N> for SyncCollector<N, A> {
    fn update(&self, value: N) {
        A::update(&self.current, value);
    }
}

impl<N: Number, A: Aggregator<N>> Collector for SyncCollector<N, A> {
    fn collect(&self) {
        A::synchronized_move(&self.current, Some(&self.snapshot));
        A::merge(&self.snapshot, &self.output);
    }
}

/// Collector for asynchronous instruments: at most one observation per
/// collection cycle, supplied by a callback.
///
/// The observation is held as `Option` rather than folded into aggregation
/// storage: `None` is the identity, so a cycle in which the callback never
/// ran merges nothing, and repeated (incorrect) observations within one
/// cycle resolve last-write-wins.
pub(crate) struct AsyncCollector<N: Number, A: Aggregator<N>> {
    observed: Mutex<Option<N>>,
    snapshot: A::Storage,
    output: Arc<A::Storage>,
}

impl<N: Number, A: Aggregator<N>> AsyncCollector<N, A> {
    pub(crate) fn new(config: &A::Config, output: Arc<A::Storage>) -> Self {
        AsyncCollector { observed: Mutex::new(None), snapshot: A::init(config), output }
    }
}

impl<N: Number, A: Aggregator<N>> Updater<N> for AsyncCollector<N, A> {
    fn update(&self, value: N) {
        *self.observed.lock() = Some(value);
    }
}

impl<N: Number, A: Aggregator<N>> Collector for AsyncCollector<N, A> {
    fn collect(&self) {
        let mut observed = self.observed.lock();
        A::synchronized_move(&self.snapshot, None);
        if let Some(value) = observed.take() {
            A::update(&self.snapshot, value);
        }
        A::merge(&self.snapshot, &self.output);
    }
}

/// Fan-out over several compiled views behind one logical instrument, so the
/// instrumentation call-site is oblivious to how many (reader, view) targets
/// are active.
pub(crate) struct MultiInstrument<N: Number> {
    compiled: Vec<Arc<dyn Instrument<N>>>,
}

impl<N: Number> MultiInstrument<N> {
    pub(crate) fn new(compiled: Vec<Arc<dyn Instrument<N>>>) -> Self {
        MultiInstrument { compiled }
    }
}

impl<N: Number> Instrument<N> for MultiInstrument<N> {
    fn new_collector(&self, attributes: AttributeSet) -> Box<dyn CollectorUpdater<N>> {
        let collectors = self
            .compiled
            .iter()
            .map(|instrument| instrument.new_collector(attributes.clone()))
            .collect();
        Box::new(MultiCollector { collectors })
    }
}

/// Fan-out collector: one update call feeds every underlying target, and
/// collection visits every target in recorded order.
pub(crate) struct MultiCollector<N: Number> {
    collectors: Vec<Box<dyn CollectorUpdater<N>>>,
}

impl<N: Number> Updater<N> for MultiCollector<N> {
    fn update(&self, value: N) {
        for collector in &self.collectors {
            collector.update(value);
        }
    }
}

impl<N: Number> Collector for MultiCollector<N> {
    fn collect(&self) {
        for collector in &self.collectors {
            collector.collect();
        }
    }
}
