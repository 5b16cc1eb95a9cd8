//! View compilation.
//!
//! Runs once per instrument registration: matches the instrument against
//! every reader's view rules, resolves aggregation settings with
//! deterministic precedence, reserves output names, and builds the
//! strongly-typed collection pipeline for each surviving (reader, view)
//! pairing.  The aggregation × synchronicity dispatch happens here, exactly
//! once; the numeric kind is fixed by the caller's type parameter, so the
//! update and collect paths never inspect kinds again.

use std::sync::Arc;

use metrics_aggregator::{histogram, last_value, sum, Aggregator, Number, NumberKind};

use crate::attributes::{AttributeSet, KeyFilter};
use crate::collector::{
    AsyncCollector, CollectorUpdater, Instrument, MultiInstrument, SyncCollector,
};
use crate::descriptor::{Descriptor, Library};
use crate::diagnostics::{DiagnosticsSink, LogSink, ViewError};
use crate::kind::AggregationKind;
use crate::reader::{OutputStore, Reader, ViewMetric};
use crate::view::View;

/// Resolved aggregation settings for one (reader, view) pairing.
#[derive(Clone, Debug)]
enum AggregatorSettings {
    Drop,
    Sum(sum::Config),
    LastValue(last_value::Config),
    Histogram(histogram::Config),
}

impl AggregatorSettings {
    fn resolve(kind: AggregationKind, number_kind: NumberKind) -> Self {
        match kind {
            AggregationKind::Drop => AggregatorSettings::Drop,
            AggregationKind::Sum => AggregatorSettings::Sum(sum::Config),
            AggregationKind::LastValue => AggregatorSettings::LastValue(last_value::Config),
            AggregationKind::Histogram => {
                AggregatorSettings::Histogram(histogram::Config::default_for(number_kind))
            }
        }
    }

    fn is_drop(&self) -> bool {
        matches!(self, AggregatorSettings::Drop)
    }
}

/// Ephemeral per-compilation record pairing an instrument with one reader,
/// one view, and the resolved aggregation settings.
struct ConfiguredBehavior<'a> {
    reader: &'a Arc<Reader>,
    view: View,
    settings: AggregatorSettings,
}

/// Compiles instrument descriptors into collection pipelines.
///
/// Holds the configured view rules and the attached readers; constructed
/// once at SDK initialization.  Recoverable configuration problems found
/// during compilation are reported through the injected [`DiagnosticsSink`]
/// and never abort the remaining pairings.
pub struct Compiler {
    library: Library,
    views: Vec<View>,
    readers: Vec<Arc<Reader>>,
    diagnostics: Arc<dyn DiagnosticsSink>,
}

impl Compiler {
    /// Creates a compiler that logs configuration problems.
    pub fn new(library: Library, views: Vec<View>, readers: Vec<Arc<Reader>>) -> Self {
        Compiler::with_diagnostics(library, views, readers, Arc::new(LogSink))
    }

    /// Creates a compiler with an injected diagnostics sink.
    pub fn with_diagnostics(
        library: Library,
        views: Vec<View>,
        readers: Vec<Arc<Reader>>,
        diagnostics: Arc<dyn DiagnosticsSink>,
    ) -> Self {
        Compiler { library, views, readers, diagnostics }
    }

    /// Compiles an instrument descriptor, returning the handle used to mint
    /// collectors throughout the instrument's lifetime.
    ///
    /// Called exactly once per instrument registration.  Returns `None`
    /// when every (reader, view) pairing resolved to drop: the instrument
    /// is fully suppressed and produces no collectors.
    ///
    /// The numeric type parameter must agree with the descriptor's numeric
    /// kind; the kind space is closed and validated upstream at instrument
    /// registration, so a mismatch here is a programming error.
    pub fn compile<N: Number>(&self, instrument: &Descriptor) -> Option<Arc<dyn Instrument<N>>> {
        assert_eq!(
            instrument.number_kind(),
            N::KIND,
            "instrument numeric kind does not match the compiled pipeline type",
        );

        // Reader order, then view order: repeated compilation of identical
        // configuration must reserve output names in the same order.
        let mut configs = Vec::new();
        for reader in &self.readers {
            let mut match_count = 0;
            for view in &self.views {
                if !view.matches(&self.library, instrument) {
                    continue;
                }
                match_count += 1;

                let settings = self.settings_for(view, instrument, reader);
                if settings.is_drop() {
                    continue;
                }

                configs.push(ConfiguredBehavior { reader, view: view.clone(), settings });
            }

            // No view matched: the reader still gets its default treatment,
            // unless that default is to drop.
            if match_count == 0 {
                let settings = AggregatorSettings::resolve(
                    reader.defaults(instrument.instrument_kind()),
                    instrument.number_kind(),
                );
                if settings.is_drop() {
                    continue;
                }

                configs.push(ConfiguredBehavior { reader, view: View::passthrough(), settings });
            }
        }

        if configs.is_empty() {
            return None;
        }

        let mut compiled: Vec<Arc<dyn Instrument<N>>> = Vec::new();
        for config in configs {
            let view_desc = view_descriptor(instrument, &config.view);

            if !config.reader.acquire_name_check(view_desc.name().clone()) {
                self.diagnostics.report(ViewError::DuplicateName {
                    name: view_desc.name().clone(),
                    reader: config.reader.name().clone(),
                });
                continue;
            }

            let metric = Arc::new(ViewMetric::new(view_desc));
            compiled.push(build_view::<N>(&config, metric));
        }

        match compiled.len() {
            0 => None,
            1 => compiled.pop(),
            _ => Some(Arc::new(MultiInstrument::new(compiled))),
        }
    }

    fn settings_for(
        &self,
        view: &View,
        instrument: &Descriptor,
        reader: &Arc<Reader>,
    ) -> AggregatorSettings {
        match view.aggregation() {
            Some(AggregationKind::Sum) => AggregatorSettings::Sum(sum::Config),
            Some(AggregationKind::LastValue) => {
                AggregatorSettings::LastValue(last_value::Config)
            }
            Some(AggregationKind::Histogram) => {
                let mut config = histogram::Config::default_for(instrument.number_kind());
                if let Some(boundaries) = view.histogram_boundaries() {
                    config = config.with_boundaries(boundaries);
                }
                AggregatorSettings::Histogram(config)
            }
            Some(AggregationKind::Drop) => AggregatorSettings::Drop,
            None => AggregatorSettings::resolve(
                reader.defaults(instrument.instrument_kind()),
                instrument.number_kind(),
            ),
        }
    }
}

/// Computes the final output descriptor for one (reader, view) pairing: a
/// name override replaces the instrument name, a non-empty description
/// override replaces the instrument description, and the unit passes
/// through unmodified.
fn view_descriptor(instrument: &Descriptor, view: &View) -> Descriptor {
    let name = view.name_override().unwrap_or_else(|| instrument.name()).clone();
    let description = match view.description_override() {
        Some(description) if !description.is_empty() => description.clone(),
        _ => instrument.description().to_owned().into(),
    };

    Descriptor::new(name, instrument.instrument_kind(), instrument.number_kind())
        .with_description(description)
        .with_unit(instrument.unit().clone())
}

fn build_view<N: Number>(
    config: &ConfiguredBehavior<'_>,
    metric: Arc<ViewMetric>,
) -> Arc<dyn Instrument<N>> {
    if metric.descriptor().instrument_kind().synchronous() {
        compile_sync::<N>(config, metric)
    } else {
        compile_async::<N>(config, metric)
    }
}

fn compile_sync<N: Number>(
    config: &ConfiguredBehavior<'_>,
    metric: Arc<ViewMetric>,
) -> Arc<dyn Instrument<N>> {
    match &config.settings {
        AggregatorSettings::Sum(agg_config) => {
            new_sync_view::<N, sum::Sum>(config, metric, agg_config.clone())
        }
        AggregatorSettings::LastValue(agg_config) => {
            new_sync_view::<N, last_value::LastValue>(config, metric, agg_config.clone())
        }
        AggregatorSettings::Histogram(agg_config) => {
            new_sync_view::<N, histogram::Histogram>(config, metric, agg_config.clone())
        }
        AggregatorSettings::Drop => unreachable!("drop pairings are filtered before dispatch"),
    }
}

fn compile_async<N: Number>(
    config: &ConfiguredBehavior<'_>,
    metric: Arc<ViewMetric>,
) -> Arc<dyn Instrument<N>> {
    match &config.settings {
        AggregatorSettings::Sum(agg_config) => {
            new_async_view::<N, sum::Sum>(config, metric, agg_config.clone())
        }
        AggregatorSettings::LastValue(agg_config) => {
            new_async_view::<N, last_value::LastValue>(config, metric, agg_config.clone())
        }
        AggregatorSettings::Histogram(agg_config) => {
            new_async_view::<N, histogram::Histogram>(config, metric, agg_config.clone())
        }
        AggregatorSettings::Drop => unreachable!("drop pairings are filtered before dispatch"),
    }
}

fn new_sync_view<N: Number, A: Aggregator<N>>(
    config: &ConfiguredBehavior<'_>,
    metric: Arc<ViewMetric>,
    agg_config: A::Config,
) -> Arc<dyn Instrument<N>> {
    let store = Arc::new(OutputStore::<N, A>::new(metric, agg_config));
    config.reader.register_producer(store.clone());
    Arc::new(CompiledSyncView::<N, A> { store, keys: config.view.keys().clone() })
}

fn new_async_view<N: Number, A: Aggregator<N>>(
    config: &ConfiguredBehavior<'_>,
    metric: Arc<ViewMetric>,
    agg_config: A::Config,
) -> Arc<dyn Instrument<N>> {
    let store = Arc::new(OutputStore::<N, A>::new(metric, agg_config));
    config.reader.register_producer(store.clone());
    Arc::new(CompiledAsyncView::<N, A> { store, keys: config.view.keys().clone() })
}

/// One (reader, view, instrument) pipeline for a synchronous instrument;
/// knows the concrete aggregation type and mints lock-free collectors.
struct CompiledSyncView<N: Number, A: Aggregator<N>> {
    store: Arc<OutputStore<N, A>>,
    keys: KeyFilter,
}

impl<N: Number, A: Aggregator<N>> Instrument<N> for CompiledSyncView<N, A> {
    fn new_collector(&self, attributes: AttributeSet) -> Box<dyn CollectorUpdater<N>> {
        let output = self.store.find_or_create(attributes.with_filter(&self.keys));
        Box::new(SyncCollector::<N, A>::new(self.store.config(), output))
    }
}

/// One (reader, view, instrument) pipeline for an asynchronous instrument.
struct CompiledAsyncView<N: Number, A: Aggregator<N>> {
    store: Arc<OutputStore<N, A>>,
    keys: KeyFilter,
}

impl<N: Number, A: Aggregator<N>> Instrument<N> for CompiledAsyncView<N, A> {
    fn new_collector(&self, attributes: AttributeSet) -> Box<dyn CollectorUpdater<N>> {
        let output = self.store.find_or_create(attributes.with_filter(&self.keys));
        Box::new(AsyncCollector::<N, A>::new(self.store.config(), output))
    }
}

#[cfg(test)]
mod tests {
    use metrics_aggregator::NumberKind;

    use super::{view_descriptor, AggregatorSettings};
    use crate::descriptor::Descriptor;
    use crate::kind::{AggregationKind, InstrumentKind};
    use crate::view::View;

    fn base() -> Descriptor {
        Descriptor::new("requests_total", InstrumentKind::Counter, NumberKind::Int64)
            .with_description("requests served")
            .with_unit("1")
    }

    #[test]
    fn test_name_override_replaces() {
        let view = View::builder().with_name("requests").build();
        let resolved = view_descriptor(&base(), &view);
        assert_eq!(resolved.name(), "requests");
        assert_eq!(resolved.instrument_kind(), InstrumentKind::Counter);
        assert_eq!(resolved.number_kind(), NumberKind::Int64);
    }

    #[test]
    fn test_description_override_replaces_when_non_empty() {
        let view = View::builder().with_description("all requests").build();
        let resolved = view_descriptor(&base(), &view);
        assert_eq!(resolved.description(), "all requests");

        let view = View::builder().with_description("").build();
        let resolved = view_descriptor(&base(), &view);
        assert_eq!(resolved.description(), "requests served");
    }

    #[test]
    fn test_unit_passes_through() {
        let view = View::builder().with_name("renamed").build();
        let resolved = view_descriptor(&base(), &view);
        assert_eq!(resolved.unit(), "1");
    }

    #[test]
    fn test_no_overrides_keeps_instrument_identity() {
        let resolved = view_descriptor(&base(), &View::builder().build());
        assert_eq!(resolved, base());
    }

    #[test]
    fn test_settings_resolution() {
        assert!(AggregatorSettings::resolve(AggregationKind::Drop, NumberKind::Int64).is_drop());
        assert!(matches!(
            AggregatorSettings::resolve(AggregationKind::Sum, NumberKind::Int64),
            AggregatorSettings::Sum(_)
        ));
        assert!(matches!(
            AggregatorSettings::resolve(AggregationKind::LastValue, NumberKind::Float64),
            AggregatorSettings::LastValue(_)
        ));

        match AggregatorSettings::resolve(AggregationKind::Histogram, NumberKind::Float64) {
            AggregatorSettings::Histogram(config) => {
                assert!(!config.boundaries().is_empty());
                assert!(config.boundaries().windows(2).all(|pair| pair[0] < pair[1]));
            }
            other => panic!("expected histogram settings, got {other:?}"),
        }
    }
}
