//! The enrichment coordinator.

use std::fmt;
use std::sync::Arc;

use crate::augment::PropertyAugmentor;
use crate::config::PropertyNames;
use crate::context::TraceContext;
use crate::ids::{canonical_id, IdSlot};
use crate::record::{EnrichmentProperty, LogRecord, PropertyValue};
use crate::trace_state::parse_trace_state;

const TAGS_PROPERTY_NAME: &str = "Attributes";
const BAGGAGE_PROPERTY_NAME: &str = "Baggage";
const TRACE_STATE_PROPERTY_NAME: &str = "TraceState";
const TRACE_FLAGS_PROPERTY_NAME: &str = "TraceFlags";

/// Enriches log records with properties derived from the active span.
///
/// One enricher instance serves a whole logging pipeline: it owns its
/// configuration, is `Send + Sync`, and every operation is a synchronous
/// pure computation plus write-once inserts into the supplied record.
///
/// The standard pass writes the canonical span, trace and parent ids in
/// that fixed order. When an augmentor is configured, its output for a
/// slot is written before the standard-named property, so on a name
/// collision the augmentor's value wins under the sink's first-writer-wins
/// rule.
///
/// # Examples
///
/// ```
/// use opentelemetry::trace::{SpanId, TraceId};
/// use opentelemetry_span_enricher::{InMemoryRecord, SpanEnricher, TraceContext};
///
/// let enricher = SpanEnricher::builder().include_trace_flags(true).build();
/// let context = TraceContext::builder()
///     .with_w3c_ids(TraceId::from(1), SpanId::from(2))
///     .sampled(true)
///     .build();
///
/// let mut record = InMemoryRecord::new();
/// let _guard = context.attach();
/// enricher.enrich(&mut record);
///
/// assert!(record.contains("SpanId"));
/// assert!(record.contains("TraceFlags"));
/// ```
pub struct SpanEnricher {
    names: PropertyNames,
    augmentor: Option<Box<dyn PropertyAugmentor>>,
    include_tags: bool,
    include_baggage: bool,
    include_operation_name: bool,
    include_trace_flags: bool,
    memoize: bool,
}

impl fmt::Debug for SpanEnricher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpanEnricher")
            .field("names", &self.names)
            .field("augmentor", &self.augmentor.as_ref().map(|_| "<dyn>"))
            .field("include_tags", &self.include_tags)
            .field("include_baggage", &self.include_baggage)
            .field("include_operation_name", &self.include_operation_name)
            .field("include_trace_flags", &self.include_trace_flags)
            .field("memoize", &self.memoize)
            .finish()
    }
}

impl Default for SpanEnricher {
    fn default() -> Self {
        SpanEnricher::builder().build()
    }
}

impl SpanEnricher {
    /// Starts building an enricher.
    pub fn builder() -> SpanEnricherBuilder {
        SpanEnricherBuilder::default()
    }

    /// Enriches `record` from the ambient context.
    ///
    /// Writes the standard id properties plus whichever optional
    /// enrichments are toggled on. No ambient context is a silent no-op.
    pub fn enrich(&self, record: &mut dyn LogRecord) {
        self.enrich_with_context(record, TraceContext::current().as_ref());
    }

    /// Enriches `record` from an explicitly supplied context.
    ///
    /// `None` is a valid no-op; nothing is written.
    pub fn enrich_with_context(&self, record: &mut dyn LogRecord, context: Option<&TraceContext>) {
        let Some(context) = context else {
            return;
        };

        for slot in [IdSlot::Span, IdSlot::Trace, IdSlot::Parent] {
            for property in self.slot_properties(context, slot).iter() {
                record.add_property_if_absent(property.clone());
            }
        }

        if self.include_operation_name {
            self.operation_name_into(record, context);
        }
        if self.include_trace_flags {
            self.trace_flags_into(record, context);
        }
        if self.include_tags {
            self.tags_into(record, context);
        }
        if self.include_baggage {
            self.baggage_into(record, context);
        }
    }

    /// Writes the ambient context's tags as one `Attributes` structure.
    pub fn enrich_tags(&self, record: &mut dyn LogRecord) {
        if let Some(context) = TraceContext::current() {
            self.tags_into(record, &context);
        }
    }

    /// Writes the ambient context's baggage as one `Baggage` structure.
    pub fn enrich_baggage(&self, record: &mut dyn LogRecord) {
        if let Some(context) = TraceContext::current() {
            self.baggage_into(record, &context);
        }
    }

    /// Parses the ambient context's trace-state header and writes the
    /// surviving entries as one `TraceState` structure.
    pub fn enrich_trace_state(&self, record: &mut dyn LogRecord) {
        if let Some(context) = TraceContext::current() {
            self.trace_state_into(record, &context);
        }
    }

    /// Writes the ambient context's operation name under the configured
    /// name.
    pub fn enrich_operation_name(&self, record: &mut dyn LogRecord) {
        if let Some(context) = TraceContext::current() {
            self.operation_name_into(record, &context);
        }
    }

    /// Writes a `TraceFlags` property reflecting the ambient context's
    /// sampled flag.
    pub fn enrich_trace_flags(&self, record: &mut dyn LogRecord) {
        if let Some(context) = TraceContext::current() {
            self.trace_flags_into(record, &context);
        }
    }

    fn slot_properties(&self, context: &TraceContext, slot: IdSlot) -> Arc<[EnrichmentProperty]> {
        let name = match slot {
            IdSlot::Span => self.names.span_id(),
            IdSlot::Trace => self.names.trace_id(),
            IdSlot::Parent => self.names.parent_id(),
        };
        let compute = || -> Arc<[EnrichmentProperty]> {
            let id = canonical_id(context, slot);
            let mut properties = Vec::with_capacity(2);
            if let Some(augmentor) = &self.augmentor {
                properties.extend(match slot {
                    IdSlot::Span => augmentor.augment_span_id(&id),
                    IdSlot::Trace => augmentor.augment_trace_id(&id),
                    IdSlot::Parent => augmentor.augment_parent_id(&id),
                });
            }
            properties.push(EnrichmentProperty::new(name, id));
            Arc::from(properties)
        };

        if self.memoize {
            context.memoized(slot, name, compute)
        } else {
            compute()
        }
    }

    fn tags_into(&self, record: &mut dyn LogRecord, context: &TraceContext) {
        if context.tags().is_empty() {
            return;
        }
        let entries = context
            .tags()
            .iter()
            .map(|(key, value)| EnrichmentProperty::new(key.clone(), value.clone()))
            .collect();
        record.add_property_if_absent(EnrichmentProperty::new(
            TAGS_PROPERTY_NAME,
            PropertyValue::Structure(entries),
        ));
    }

    fn baggage_into(&self, record: &mut dyn LogRecord, context: &TraceContext) {
        if context.baggage().is_empty() {
            return;
        }
        let entries = context
            .baggage()
            .iter()
            .map(|(key, value)| EnrichmentProperty::new(key.clone(), value.clone()))
            .collect();
        record.add_property_if_absent(EnrichmentProperty::new(
            BAGGAGE_PROPERTY_NAME,
            PropertyValue::Structure(entries),
        ));
    }

    fn trace_state_into(&self, record: &mut dyn LogRecord, context: &TraceContext) {
        let Some(header) = context.trace_state() else {
            return;
        };
        let entries = parse_trace_state(header);
        if entries.is_empty() {
            return;
        }
        let entries = entries
            .into_iter()
            .map(|entry| EnrichmentProperty::new(entry.key, entry.value))
            .collect();
        record.add_property_if_absent(EnrichmentProperty::new(
            TRACE_STATE_PROPERTY_NAME,
            PropertyValue::Structure(entries),
        ));
    }

    fn operation_name_into(&self, record: &mut dyn LogRecord, context: &TraceContext) {
        record.add_property_if_absent(EnrichmentProperty::new(
            self.names.operation_name(),
            context.operation_name(),
        ));
    }

    fn trace_flags_into(&self, record: &mut dyn LogRecord, context: &TraceContext) {
        let value = if context.is_sampled() {
            "Recorded"
        } else {
            "None"
        };
        record.add_property_if_absent(EnrichmentProperty::new(TRACE_FLAGS_PROPERTY_NAME, value));
    }
}

/// Builder for [`SpanEnricher`].
///
/// Defaults: standard property names, no augmentor, all optional
/// enrichments off, memoization on.
pub struct SpanEnricherBuilder {
    names: PropertyNames,
    augmentor: Option<Box<dyn PropertyAugmentor>>,
    include_tags: bool,
    include_baggage: bool,
    include_operation_name: bool,
    include_trace_flags: bool,
    memoize: bool,
}

impl fmt::Debug for SpanEnricherBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpanEnricherBuilder")
            .field("names", &self.names)
            .field("augmentor", &self.augmentor.as_ref().map(|_| "<dyn>"))
            .field("memoize", &self.memoize)
            .finish_non_exhaustive()
    }
}

impl Default for SpanEnricherBuilder {
    fn default() -> Self {
        SpanEnricherBuilder {
            names: PropertyNames::default(),
            augmentor: None,
            include_tags: false,
            include_baggage: false,
            include_operation_name: false,
            include_trace_flags: false,
            memoize: true,
        }
    }
}

impl SpanEnricherBuilder {
    /// Uses the given property names for the standard fields.
    pub fn with_property_names(mut self, names: PropertyNames) -> Self {
        self.names = names;
        self
    }

    /// Supplies the augmentor invoked for each canonical id.
    pub fn with_augmentor(mut self, augmentor: impl PropertyAugmentor + 'static) -> Self {
        self.augmentor = Some(Box::new(augmentor));
        self
    }

    /// Also writes span tags as an `Attributes` structure.
    pub fn include_tags(mut self, include: bool) -> Self {
        self.include_tags = include;
        self
    }

    /// Also writes baggage as a `Baggage` structure.
    pub fn include_baggage(mut self, include: bool) -> Self {
        self.include_baggage = include;
        self
    }

    /// Also writes the operation name.
    pub fn include_operation_name(mut self, include: bool) -> Self {
        self.include_operation_name = include;
        self
    }

    /// Also writes the `TraceFlags` property.
    pub fn include_trace_flags(mut self, include: bool) -> Self {
        self.include_trace_flags = include;
        self
    }

    /// Enables or disables per-context memoization of derived properties.
    pub fn memoize(mut self, memoize: bool) -> Self {
        self.memoize = memoize;
        self
    }

    /// Builds the enricher.
    pub fn build(self) -> SpanEnricher {
        SpanEnricher {
            names: self.names,
            augmentor: self.augmentor,
            include_tags: self.include_tags,
            include_baggage: self.include_baggage,
            include_operation_name: self.include_operation_name,
            include_trace_flags: self.include_trace_flags,
            memoize: self.memoize,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::InMemoryRecord;
    use opentelemetry::trace::{SpanId, TraceId};

    fn w3c_context() -> TraceContext {
        TraceContext::builder()
            .with_w3c_ids(
                TraceId::from(0xebe1_010d_b7d9_a5de_c2b4_a991_5c2c_79f0),
                SpanId::from(0x69e9_851f_1ca0_2b9a),
            )
            .with_parent_span_id(SpanId::from(0x00f0_67aa_0ba9_02b7))
            .build()
    }

    #[test]
    fn standard_pass_writes_three_names_in_order() {
        let enricher = SpanEnricher::default();
        let mut record = InMemoryRecord::new();
        enricher.enrich_with_context(&mut record, Some(&w3c_context()));

        let names: Vec<_> = record.properties().iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["SpanId", "TraceId", "ParentId"]);
        assert_eq!(
            record.get("SpanId"),
            Some(&PropertyValue::String("69e9851f1ca02b9a".to_owned()))
        );
        assert_eq!(
            record.get("TraceId"),
            Some(&PropertyValue::String(
                "ebe1010db7d9a5dec2b4a9915c2c79f0".to_owned()
            ))
        );
        assert_eq!(
            record.get("ParentId"),
            Some(&PropertyValue::String("00f067aa0ba902b7".to_owned()))
        );
    }

    #[test]
    fn custom_names_are_applied() {
        let names = PropertyNames::default()
            .with_span_id("s")
            .and_then(|n| n.with_trace_id("t"))
            .and_then(|n| n.with_parent_id("p"))
            .unwrap();
        let enricher = SpanEnricher::builder().with_property_names(names).build();

        let mut record = InMemoryRecord::new();
        enricher.enrich_with_context(&mut record, Some(&w3c_context()));

        let names: Vec<_> = record.properties().iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["s", "t", "p"]);
    }

    #[test]
    fn absent_context_is_a_no_op() {
        let enricher = SpanEnricher::builder()
            .include_tags(true)
            .include_baggage(true)
            .include_operation_name(true)
            .include_trace_flags(true)
            .build();

        let mut record = InMemoryRecord::new();
        enricher.enrich_with_context(&mut record, None);

        assert!(record.properties().is_empty());
    }

    #[test]
    fn unknown_format_still_writes_empty_standard_ids() {
        let enricher = SpanEnricher::default();
        let mut record = InMemoryRecord::new();
        enricher.enrich_with_context(&mut record, Some(&TraceContext::builder().build()));

        assert_eq!(record.properties().len(), 3);
        assert_eq!(
            record.get("SpanId"),
            Some(&PropertyValue::String(String::new()))
        );
    }

    #[test]
    fn enrichment_is_idempotent() {
        let context = w3c_context();
        let enricher = SpanEnricher::builder()
            .include_trace_flags(true)
            .include_operation_name(true)
            .build();

        let mut record = InMemoryRecord::new();
        enricher.enrich_with_context(&mut record, Some(&context));
        let first = record.clone();
        enricher.enrich_with_context(&mut record, Some(&context));

        assert_eq!(record, first);
    }

    #[test]
    fn trace_flags_reflect_sampling() {
        let enricher = SpanEnricher::builder().include_trace_flags(true).build();

        let mut record = InMemoryRecord::new();
        let sampled = TraceContext::builder().sampled(true).build();
        enricher.enrich_with_context(&mut record, Some(&sampled));
        assert_eq!(
            record.get("TraceFlags"),
            Some(&PropertyValue::String("Recorded".to_owned()))
        );

        let mut record = InMemoryRecord::new();
        let unsampled = TraceContext::builder().sampled(false).build();
        enricher.enrich_with_context(&mut record, Some(&unsampled));
        assert_eq!(
            record.get("TraceFlags"),
            Some(&PropertyValue::String("None".to_owned()))
        );
    }

    #[test]
    fn operation_name_uses_configured_name() {
        let names = PropertyNames::default().with_operation_name("o").unwrap();
        let enricher = SpanEnricher::builder()
            .with_property_names(names)
            .include_operation_name(true)
            .build();

        let mut record = InMemoryRecord::new();
        let context = TraceContext::builder()
            .with_operation_name("GET /users")
            .build();
        enricher.enrich_with_context(&mut record, Some(&context));

        assert_eq!(
            record.get("o"),
            Some(&PropertyValue::String("GET /users".to_owned()))
        );
    }

    #[test]
    fn empty_tags_and_baggage_write_nothing() {
        let enricher = SpanEnricher::builder()
            .include_tags(true)
            .include_baggage(true)
            .build();

        let mut record = InMemoryRecord::new();
        enricher.enrich_with_context(&mut record, Some(&TraceContext::builder().build()));

        assert!(!record.contains("Attributes"));
        assert!(!record.contains("Baggage"));
    }

    #[test]
    fn tags_preserve_null_scalars() {
        let enricher = SpanEnricher::builder().include_tags(true).build();
        let context = TraceContext::builder()
            .with_tag("Name", "Chris Shim")
            .with_tag("NullString", PropertyValue::Null)
            .build();

        let mut record = InMemoryRecord::new();
        enricher.enrich_with_context(&mut record, Some(&context));

        let Some(PropertyValue::Structure(entries)) = record.get("Attributes") else {
            panic!("expected an Attributes structure");
        };
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name(), "Name");
        assert_eq!(
            entries[0].value(),
            &PropertyValue::String("Chris Shim".to_owned())
        );
        assert_eq!(entries[1].name(), "NullString");
        assert_eq!(entries[1].value(), &PropertyValue::Null);
    }

    #[test]
    fn baggage_structure_holds_all_entries() {
        let enricher = SpanEnricher::builder().include_baggage(true).build();
        let context = TraceContext::builder()
            .with_baggage("tenant", "acme")
            .with_baggage("region", "eu-west-1")
            .build();

        let mut record = InMemoryRecord::new();
        enricher.enrich_with_context(&mut record, Some(&context));

        let Some(PropertyValue::Structure(entries)) = record.get("Baggage") else {
            panic!("expected a Baggage structure");
        };
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name(), "tenant");
        assert_eq!(entries[1].name(), "region");
    }

    #[test]
    fn trace_state_property_requires_surviving_entries() {
        let enricher = SpanEnricher::default();

        let mut record = InMemoryRecord::new();
        let context = TraceContext::builder().with_trace_state("test = val").build();
        enricher.trace_state_into(&mut record, &context);
        let Some(PropertyValue::Structure(entries)) = record.get("TraceState") else {
            panic!("expected a TraceState structure");
        };
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name(), "test");
        assert_eq!(entries[0].value(), &PropertyValue::String("val".to_owned()));

        let mut record = InMemoryRecord::new();
        let context = TraceContext::builder().with_trace_state(",").build();
        enricher.trace_state_into(&mut record, &context);
        assert!(!record.contains("TraceState"));

        let mut record = InMemoryRecord::new();
        let context = TraceContext::builder().build();
        enricher.trace_state_into(&mut record, &context);
        assert!(record.properties().is_empty());
    }
}
