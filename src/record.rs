//! Log record sink abstraction and the property model written into it.

/// Value types for log record properties produced by enrichment.
///
/// Scalars cover the values carried by span tags and baggage; `Structure`
/// carries the ordered name/value groups used for `Attributes`, `Baggage`
/// and `TraceState`. Unlike a map, a structure permits duplicate names,
/// which trace-state parsing requires.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    /// An explicitly absent value. A tag recorded with a null value keeps
    /// its entry, it does not disappear from the structure.
    Null,
    /// A boolean value.
    Bool(bool),
    /// An integer value.
    Int(i64),
    /// A double value.
    Double(f64),
    /// A string value.
    String(String),
    /// An ordered list of values.
    Array(Vec<PropertyValue>),
    /// An ordered list of named values, duplicate names permitted.
    Structure(Vec<EnrichmentProperty>),
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Int(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Double(value)
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_owned())
    }
}

impl<T: Into<PropertyValue>> From<Option<T>> for PropertyValue {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => value.into(),
            None => PropertyValue::Null,
        }
    }
}

/// A named value to attach to a log record.
#[derive(Clone, Debug, PartialEq)]
pub struct EnrichmentProperty {
    name: String,
    value: PropertyValue,
}

impl EnrichmentProperty {
    /// Creates a property from a name and anything convertible to a
    /// [`PropertyValue`].
    ///
    /// Property names are expected to be non-empty; sinks discard
    /// empty-named properties rather than record them.
    pub fn new(name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        EnrichmentProperty {
            name: name.into(),
            value: value.into(),
        }
    }

    /// The property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The property value.
    pub fn value(&self) -> &PropertyValue {
        &self.value
    }
}

/// Write-once-per-name sink for enrichment properties.
///
/// Implemented by whatever record type the host logging pipeline carries.
/// The single required method gives first-writer-wins semantics: once a
/// name is present it is never overwritten, which makes every enrichment
/// operation idempotent.
pub trait LogRecord {
    /// Adds `property` unless the record already holds a property with the
    /// same name. Implementations should discard properties with an empty
    /// name.
    fn add_property_if_absent(&mut self, property: EnrichmentProperty);
}

/// An ordered in-memory [`LogRecord`], used in tests and by hosts that
/// buffer properties before handing them to their own record type.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InMemoryRecord {
    properties: Vec<EnrichmentProperty>,
}

impl InMemoryRecord {
    /// Creates an empty record.
    pub fn new() -> Self {
        InMemoryRecord::default()
    }

    /// All recorded properties, in insertion order.
    pub fn properties(&self) -> &[EnrichmentProperty] {
        &self.properties
    }

    /// Looks up a property value by name.
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|property| property.name() == name)
            .map(|property| property.value())
    }

    /// Whether a property with the given name has been recorded.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

impl LogRecord for InMemoryRecord {
    fn add_property_if_absent(&mut self, property: EnrichmentProperty) {
        if property.name().is_empty() || self.contains(property.name()) {
            return;
        }
        self.properties.push(property);
    }
}
