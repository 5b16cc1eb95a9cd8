use std::borrow::Cow;
use std::sync::Arc;

use hashbrown::HashMap;

/// An allocation-optimized string.
///
/// Attribute keys and values, instrument names, and the other identity
/// strings in this crate are almost always static, but may need to be owned
/// when built from configuration.
pub type SharedString = Cow<'static, str>;

/// A single key/value pair describing the context of a measurement.
///
/// For example, in a web service, you might wish to tag request metrics with
/// the request path being processed, or with which of two internal codepaths
/// handled the request.
#[derive(PartialEq, Eq, Hash, Clone, Debug, PartialOrd, Ord)]
pub struct Attribute(pub(crate) SharedString, pub(crate) SharedString);

impl Attribute {
    /// Creates an [`Attribute`] from a key and value.
    pub fn new<K, V>(key: K, value: V) -> Self
    where
        K: Into<SharedString>,
        V: Into<SharedString>,
    {
        Attribute(key.into(), value.into())
    }

    /// Key of this attribute.
    pub fn key(&self) -> &str {
        self.0.as_ref()
    }

    /// Value of this attribute.
    pub fn value(&self) -> &str {
        self.1.as_ref()
    }

    /// Consumes this [`Attribute`], returning the key and value.
    pub fn into_parts(self) -> (SharedString, SharedString) {
        (self.0, self.1)
    }
}

impl<K, V> From<(K, V)> for Attribute
where
    K: Into<SharedString>,
    V: Into<SharedString>,
{
    fn from(pair: (K, V)) -> Attribute {
        Attribute::new(pair.0, pair.1)
    }
}

/// An immutable attribute combination: sorted by key, deduplicated with the
/// last value winning.
///
/// Equal combinations compare and hash equal regardless of the order the
/// attributes were supplied in, which is what lets a set act as the lookup
/// key for per-attribute-set output storage.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct AttributeSet {
    entries: Vec<Attribute>,
}

impl AttributeSet {
    /// The empty attribute set.
    pub fn empty() -> Self {
        AttributeSet::default()
    }

    /// Builds a set from attributes, deduplicating by key.  When a key
    /// appears more than once the attribute supplied last wins.
    pub fn from_attributes<I, A>(attributes: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Attribute>,
    {
        let mut deduped: HashMap<SharedString, SharedString> = HashMap::new();
        for attribute in attributes {
            let (key, value) = attribute.into().into_parts();
            deduped.insert(key, value);
        }

        let mut entries: Vec<_> =
            deduped.into_iter().map(|(key, value)| Attribute(key, value)).collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));

        AttributeSet { entries }
    }

    /// Returns the subset of this set whose keys pass `filter`.
    pub fn with_filter(&self, filter: &KeyFilter) -> AttributeSet {
        if filter.keeps_all() {
            return self.clone();
        }

        let entries =
            self.entries.iter().filter(|attribute| filter.allows(attribute.key())).cloned().collect();
        AttributeSet { entries }
    }

    /// Iterates the attributes in key order.
    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.entries.iter()
    }

    /// Number of attributes in the set.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// An attribute-key filter carried by a view rule.
///
/// The default filter keeps every key; a filter built from an explicit key
/// list keeps only those keys, collapsing attribute combinations that differ
/// solely in filtered-out keys onto one output.
#[derive(Clone, Debug, Default)]
pub struct KeyFilter {
    allowed: Option<Arc<[SharedString]>>,
}

impl KeyFilter {
    /// A filter that keeps every key.
    pub fn keep_all() -> Self {
        KeyFilter::default()
    }

    /// A filter that keeps only the given keys.
    pub fn keys<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<SharedString>,
    {
        let allowed: Vec<SharedString> = keys.into_iter().map(Into::into).collect();
        KeyFilter { allowed: Some(allowed.into()) }
    }

    /// Whether this filter keeps every key.
    pub fn keeps_all(&self) -> bool {
        self.allowed.is_none()
    }

    /// Whether `key` passes the filter.
    pub fn allows(&self, key: &str) -> bool {
        match &self.allowed {
            None => true,
            Some(allowed) => allowed.iter().any(|k| k.as_ref() == key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AttributeSet, KeyFilter};

    #[test]
    fn test_sorted_and_deduplicated() {
        let a = AttributeSet::from_attributes([("b", "2"), ("a", "1"), ("b", "3")]);
        let pairs: Vec<_> = a.iter().map(|attr| (attr.key().to_owned(), attr.value().to_owned())).collect();
        assert_eq!(pairs, vec![("a".to_owned(), "1".to_owned()), ("b".to_owned(), "3".to_owned())]);
    }

    #[test]
    fn test_order_insensitive_equality() {
        let a = AttributeSet::from_attributes([("a", "1"), ("b", "2")]);
        let b = AttributeSet::from_attributes([("b", "2"), ("a", "1")]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_filter() {
        let set = AttributeSet::from_attributes([("endpoint", "/api"), ("host", "h1")]);
        let filtered = set.with_filter(&KeyFilter::keys(["endpoint"]));
        assert_eq!(filtered, AttributeSet::from_attributes([("endpoint", "/api")]));

        let unfiltered = set.with_filter(&KeyFilter::keep_all());
        assert_eq!(unfiltered, set);
    }
}
