use metrics_aggregator::NumberKind;

use crate::attributes::SharedString;
use crate::kind::InstrumentKind;

/// Identity of the instrumentation library that registered an instrument.
///
/// View rules can match on this identity to scope a rule to one library.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Library {
    name: SharedString,
    version: Option<SharedString>,
    schema_url: Option<SharedString>,
}

impl Library {
    /// Creates a library identity from its name.
    pub fn new<N: Into<SharedString>>(name: N) -> Self {
        Library { name: name.into(), version: None, schema_url: None }
    }

    /// Sets the library version.
    pub fn with_version<V: Into<SharedString>>(mut self, version: V) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Sets the schema URL.
    pub fn with_schema_url<S: Into<SharedString>>(mut self, schema_url: S) -> Self {
        self.schema_url = Some(schema_url.into());
        self
    }

    /// The library name.
    pub fn name(&self) -> &str {
        self.name.as_ref()
    }

    /// The library version, if set.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// The schema URL, if set.
    pub fn schema_url(&self) -> Option<&str> {
        self.schema_url.as_deref()
    }
}

/// The immutable identity of a metric source.
///
/// Created when the application registers an instrument and never mutated;
/// views derive their output identity from it by applying overrides.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Descriptor {
    name: SharedString,
    instrument_kind: InstrumentKind,
    number_kind: NumberKind,
    description: SharedString,
    unit: SharedString,
}

impl Descriptor {
    /// Creates a descriptor with an empty description and unit.
    pub fn new<N: Into<SharedString>>(
        name: N,
        instrument_kind: InstrumentKind,
        number_kind: NumberKind,
    ) -> Self {
        Descriptor {
            name: name.into(),
            instrument_kind,
            number_kind,
            description: SharedString::Borrowed(""),
            unit: SharedString::Borrowed(""),
        }
    }

    /// Sets the description.
    pub fn with_description<D: Into<SharedString>>(mut self, description: D) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the unit.
    pub fn with_unit<U: Into<SharedString>>(mut self, unit: U) -> Self {
        self.unit = unit.into();
        self
    }

    /// The instrument name.
    pub fn name(&self) -> &SharedString {
        &self.name
    }

    /// The instrument kind.
    pub fn instrument_kind(&self) -> InstrumentKind {
        self.instrument_kind
    }

    /// The numeric kind, fixed for the life of the instrument.
    pub fn number_kind(&self) -> NumberKind {
        self.number_kind
    }

    /// The description, possibly empty.
    pub fn description(&self) -> &str {
        self.description.as_ref()
    }

    /// The unit, possibly empty.  Views pass units through unmodified.
    pub fn unit(&self) -> &SharedString {
        &self.unit
    }
}
