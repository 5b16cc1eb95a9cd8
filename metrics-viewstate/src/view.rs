use std::fmt;
use std::sync::Arc;

use crate::attributes::{KeyFilter, SharedString};
use crate::descriptor::{Descriptor, Library};
use crate::kind::AggregationKind;

type MatchPredicate = Arc<dyn Fn(&Library, &Descriptor) -> bool + Send + Sync>;

/// A view rule: remaps an instrument's output name, description, attribute
/// keys, and aggregation for every reader it matches on.
///
/// Views are supplied at SDK configuration time and are immutable.  The
/// matching predicate is injected: [`ViewBuilder::match_instrument_name`]
/// covers the common exact-name case, and [`ViewBuilder::match_with`] accepts
/// an arbitrary predicate over the instrumentation library and instrument
/// descriptor.
#[derive(Clone)]
pub struct View {
    matcher: MatchPredicate,
    name: Option<SharedString>,
    description: Option<SharedString>,
    keys: KeyFilter,
    aggregation: Option<AggregationKind>,
    histogram_boundaries: Option<Arc<[f64]>>,
}

impl View {
    /// Starts building a view rule.
    pub fn builder() -> ViewBuilder {
        ViewBuilder::default()
    }

    /// The default treatment applied when no view rule matches an
    /// instrument for a reader: no overrides, no filtering.
    pub(crate) fn passthrough() -> View {
        ViewBuilder::default().build()
    }

    /// Whether this rule applies to the given library and instrument.
    pub fn matches(&self, library: &Library, instrument: &Descriptor) -> bool {
        (self.matcher)(library, instrument)
    }

    /// The output-name override, if any.
    pub fn name_override(&self) -> Option<&SharedString> {
        self.name.as_ref()
    }

    /// The description override, if any.
    pub fn description_override(&self) -> Option<&SharedString> {
        self.description.as_ref()
    }

    /// The attribute-key filter.
    pub fn keys(&self) -> &KeyFilter {
        &self.keys
    }

    /// The aggregation override, if any.
    pub fn aggregation(&self) -> Option<AggregationKind> {
        self.aggregation
    }

    /// Explicit histogram bucket boundaries, if any.
    pub fn histogram_boundaries(&self) -> Option<&[f64]> {
        self.histogram_boundaries.as_deref()
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("keys", &self.keys)
            .field("aggregation", &self.aggregation)
            .field("histogram_boundaries", &self.histogram_boundaries)
            .finish_non_exhaustive()
    }
}

/// A builder for view rules.
///
/// A freshly built view matches every instrument; the `match_*` methods
/// replace that predicate.
pub struct ViewBuilder {
    matcher: MatchPredicate,
    name: Option<SharedString>,
    description: Option<SharedString>,
    keys: KeyFilter,
    aggregation: Option<AggregationKind>,
    histogram_boundaries: Option<Arc<[f64]>>,
}

impl Default for ViewBuilder {
    fn default() -> Self {
        ViewBuilder {
            matcher: Arc::new(|_, _| true),
            name: None,
            description: None,
            keys: KeyFilter::keep_all(),
            aggregation: None,
            histogram_boundaries: None,
        }
    }
}

impl ViewBuilder {
    /// Matches instruments with exactly the given name, in any library.
    pub fn match_instrument_name<N: Into<SharedString>>(mut self, name: N) -> ViewBuilder {
        let name = name.into();
        self.matcher = Arc::new(move |_, instrument| *instrument.name() == name);
        self
    }

    /// Matches instruments accepted by the given predicate.
    pub fn match_with<F>(mut self, predicate: F) -> ViewBuilder
    where
        F: Fn(&Library, &Descriptor) -> bool + Send + Sync + 'static,
    {
        self.matcher = Arc::new(predicate);
        self
    }

    /// Overrides the output metric name.
    pub fn with_name<N: Into<SharedString>>(mut self, name: N) -> ViewBuilder {
        self.name = Some(name.into());
        self
    }

    /// Overrides the output metric description.
    pub fn with_description<D: Into<SharedString>>(mut self, description: D) -> ViewBuilder {
        self.description = Some(description.into());
        self
    }

    /// Keeps only the given attribute keys on matched instruments.
    pub fn with_keys<I, K>(mut self, keys: I) -> ViewBuilder
    where
        I: IntoIterator<Item = K>,
        K: Into<SharedString>,
    {
        self.keys = KeyFilter::keys(keys);
        self
    }

    /// Overrides the aggregation kind.
    pub fn with_aggregation(mut self, aggregation: AggregationKind) -> ViewBuilder {
        self.aggregation = Some(aggregation);
        self
    }

    /// Sets explicit histogram bucket boundaries, used when the resolved
    /// aggregation is [`AggregationKind::Histogram`].
    pub fn with_histogram_boundaries(mut self, boundaries: &[f64]) -> ViewBuilder {
        self.histogram_boundaries = Some(boundaries.into());
        self
    }

    /// Builds the view.
    pub fn build(self) -> View {
        View {
            matcher: self.matcher,
            name: self.name,
            description: self.description,
            keys: self.keys,
            aggregation: self.aggregation,
            histogram_boundaries: self.histogram_boundaries,
        }
    }
}

#[cfg(test)]
mod tests {
    use metrics_aggregator::NumberKind;

    use super::View;
    use crate::descriptor::{Descriptor, Library};
    use crate::kind::InstrumentKind;

    #[test]
    fn test_match_by_name() {
        let view = View::builder().match_instrument_name("requests_total").build();
        let library = Library::new("app");

        let matching =
            Descriptor::new("requests_total", InstrumentKind::Counter, NumberKind::Int64);
        let other = Descriptor::new("queue_depth", InstrumentKind::ObservableGauge, NumberKind::Float64);

        assert!(view.matches(&library, &matching));
        assert!(!view.matches(&library, &other));
    }

    #[test]
    fn test_match_with_predicate() {
        let view = View::builder()
            .match_with(|library, _| library.name() == "storage")
            .build();

        let descriptor = Descriptor::new("ops", InstrumentKind::Counter, NumberKind::Int64);
        assert!(view.matches(&Library::new("storage"), &descriptor));
        assert!(!view.matches(&Library::new("network"), &descriptor));
    }

    #[test]
    fn test_unconstrained_view_matches_all() {
        let view = View::builder().build();
        let descriptor = Descriptor::new("anything", InstrumentKind::Histogram, NumberKind::Float64);
        assert!(view.matches(&Library::new("lib"), &descriptor));
    }
}
