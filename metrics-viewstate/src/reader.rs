use std::fmt;
use std::sync::Arc;

use hashbrown::{HashMap, HashSet};
use metrics_aggregator::{Aggregator, Number, Reading};
use parking_lot::Mutex;

use crate::attributes::{AttributeSet, SharedString};
use crate::descriptor::Descriptor;
use crate::kind::{AggregationKind, InstrumentKind};

/// Chooses the default aggregation for an instrument kind when no matching
/// view specifies one.
pub type DefaultsFn = Box<dyn Fn(InstrumentKind) -> AggregationKind + Send + Sync>;

/// The resolved, reader-visible identity of one (reader, view) output.
///
/// Shared by reference between a compiled view and every collector it
/// spawns; immutable after creation.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ViewMetric {
    descriptor: Descriptor,
}

impl ViewMetric {
    pub(crate) fn new(descriptor: Descriptor) -> Self {
        ViewMetric { descriptor }
    }

    /// The resolved output descriptor.
    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }
}

/// One exported point: a resolved metric name, the attribute combination it
/// was recorded under, and its reading.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MetricReading {
    /// The resolved output metric name.
    pub name: SharedString,
    /// The (filtered) attribute combination.
    pub attributes: AttributeSet,
    /// The aggregated value.
    pub reading: Reading,
}

/// The output surface a compiled view registers with its owning reader.
///
/// `readings` peeks at the accumulated output storage; `harvest`
/// additionally resets each storage to its aggregation identity, which is
/// the end-of-cycle step the reader's export machinery performs after
/// collectors have merged their snapshots.
pub trait ViewProducer: Send + Sync {
    /// The resolved metric this producer exports.
    fn metric(&self) -> &ViewMetric;

    /// Reads every attribute combination's accumulated output.
    fn readings(&self) -> Vec<(AttributeSet, Reading)>;

    /// Reads and resets every attribute combination's accumulated output.
    fn harvest(&self) -> Vec<(AttributeSet, Reading)>;
}

/// One export destination.
///
/// A reader owns a namespace of output metric names, used for duplicate
/// detection across view compilations, and supplies the default aggregation
/// kind per instrument kind.  Compiled views register their output storage
/// here so the reader can snapshot or harvest all of its metrics.
pub struct Reader {
    name: SharedString,
    defaults: DefaultsFn,
    names: Mutex<HashSet<SharedString>>,
    producers: Mutex<Vec<Arc<dyn ViewProducer>>>,
}

impl Reader {
    /// Creates a reader with the standard per-kind aggregation defaults:
    /// sums for counters, last-value for observable gauges, histograms for
    /// histogram instruments.
    pub fn new<N: Into<SharedString>>(name: N) -> Self {
        Reader::with_defaults(name, standard_defaults)
    }

    /// Creates a reader with an injected default-aggregation function.
    pub fn with_defaults<N, F>(name: N, defaults: F) -> Self
    where
        N: Into<SharedString>,
        F: Fn(InstrumentKind) -> AggregationKind + Send + Sync + 'static,
    {
        Reader {
            name: name.into(),
            defaults: Box::new(defaults),
            names: Mutex::new(HashSet::new()),
            producers: Mutex::new(Vec::new()),
        }
    }

    /// The reader's name, used in diagnostics.
    pub fn name(&self) -> &SharedString {
        &self.name
    }

    /// The default aggregation kind for the given instrument kind.
    pub fn defaults(&self, kind: InstrumentKind) -> AggregationKind {
        (self.defaults)(kind)
    }

    /// Atomically reserves `name` in this reader's output namespace.
    ///
    /// Returns `true` if the name was available and is now reserved.  The
    /// check and the insert happen under one critical section, so
    /// concurrent compilations cannot both observe a name as available.
    pub fn acquire_name_check(&self, name: SharedString) -> bool {
        let mut names = self.names.lock();
        if names.contains(&name) {
            return false;
        }
        names.insert(name);
        true
    }

    pub(crate) fn register_producer(&self, producer: Arc<dyn ViewProducer>) {
        self.producers.lock().push(producer);
    }

    /// The resolved identities of every output registered with this reader,
    /// in registration order.
    pub fn view_metrics(&self) -> Vec<ViewMetric> {
        self.producers.lock().iter().map(|producer| producer.metric().clone()).collect()
    }

    /// Reads every registered output without resetting anything.
    pub fn readings(&self) -> Vec<MetricReading> {
        self.visit(ViewProducer::readings)
    }

    /// Ends a collection cycle: reads every registered output and resets it
    /// to its aggregation identity, so the next cycle reports only what the
    /// collectors merge from then on.
    pub fn harvest(&self) -> Vec<MetricReading> {
        self.visit(ViewProducer::harvest)
    }

    fn visit<F>(&self, read: F) -> Vec<MetricReading>
    where
        F: Fn(&dyn ViewProducer) -> Vec<(AttributeSet, Reading)>,
    {
        let producers = self.producers.lock();
        let mut out = Vec::new();
        for producer in producers.iter() {
            let name = producer.metric().descriptor().name().clone();
            for (attributes, reading) in read(producer.as_ref()) {
                out.push(MetricReading { name: name.clone(), attributes, reading });
            }
        }
        out
    }
}

impl fmt::Debug for Reader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reader").field("name", &self.name).finish_non_exhaustive()
    }
}

fn standard_defaults(kind: InstrumentKind) -> AggregationKind {
    match kind {
        InstrumentKind::Counter
        | InstrumentKind::UpDownCounter
        | InstrumentKind::ObservableCounter
        | InstrumentKind::ObservableUpDownCounter => AggregationKind::Sum,
        InstrumentKind::Histogram => AggregationKind::Histogram,
        InstrumentKind::ObservableGauge => AggregationKind::LastValue,
    }
}

/// Reader-owned output storage for one compiled view: one aggregation
/// storage per distinct (filtered) attribute combination, created on first
/// observation.
pub(crate) struct OutputStore<N: Number, A: Aggregator<N>> {
    metric: Arc<ViewMetric>,
    config: A::Config,
    outputs: Mutex<HashMap<AttributeSet, Arc<A::Storage>>>,
}

impl<N: Number, A: Aggregator<N>> OutputStore<N, A> {
    pub(crate) fn new(metric: Arc<ViewMetric>, config: A::Config) -> Self {
        OutputStore { metric, config, outputs: Mutex::new(HashMap::new()) }
    }

    pub(crate) fn config(&self) -> &A::Config {
        &self.config
    }

    /// Finds or creates the output storage for an attribute combination.
    pub(crate) fn find_or_create(&self, attributes: AttributeSet) -> Arc<A::Storage> {
        let mut outputs = self.outputs.lock();
        outputs.entry(attributes).or_insert_with(|| Arc::new(A::init(&self.config))).clone()
    }
}

impl<N: Number, A: Aggregator<N>> ViewProducer for OutputStore<N, A> {
    fn metric(&self) -> &ViewMetric {
        &self.metric
    }

    fn readings(&self) -> Vec<(AttributeSet, Reading)> {
        let outputs = self.outputs.lock();
        outputs.iter().map(|(attributes, storage)| (attributes.clone(), A::reading(storage))).collect()
    }

    fn harvest(&self) -> Vec<(AttributeSet, Reading)> {
        let outputs = self.outputs.lock();
        outputs
            .iter()
            .map(|(attributes, storage)| {
                let reading = A::reading(storage);
                A::synchronized_move(storage, None);
                (attributes.clone(), reading)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::Reader;
    use crate::kind::{AggregationKind, InstrumentKind};

    #[test]
    fn test_name_reservation() {
        let reader = Reader::new("r1");
        assert!(reader.acquire_name_check("requests_total".into()));
        assert!(!reader.acquire_name_check("requests_total".into()));
        assert!(reader.acquire_name_check("other".into()));
    }

    #[test]
    fn test_standard_defaults() {
        let reader = Reader::new("r1");
        assert_eq!(reader.defaults(InstrumentKind::Counter), AggregationKind::Sum);
        assert_eq!(reader.defaults(InstrumentKind::UpDownCounter), AggregationKind::Sum);
        assert_eq!(reader.defaults(InstrumentKind::Histogram), AggregationKind::Histogram);
        assert_eq!(reader.defaults(InstrumentKind::ObservableCounter), AggregationKind::Sum);
        assert_eq!(
            reader.defaults(InstrumentKind::ObservableUpDownCounter),
            AggregationKind::Sum
        );
        assert_eq!(reader.defaults(InstrumentKind::ObservableGauge), AggregationKind::LastValue);
    }

    #[test]
    fn test_injected_defaults() {
        let reader = Reader::with_defaults("quiet", |_| AggregationKind::Drop);
        assert_eq!(reader.defaults(InstrumentKind::Counter), AggregationKind::Drop);
    }
}
