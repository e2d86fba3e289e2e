//! Read-only snapshot of the span that is current at enrichment time.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use opentelemetry::trace::{SpanId, TraceFlags, TraceId};
use opentelemetry::{Context, ContextGuard};

use crate::ids::IdSlot;
use crate::record::{EnrichmentProperty, PropertyValue};

/// Span identifiers in their native encoding, together with the format they
/// were produced in.
#[derive(Clone, Debug)]
pub enum SpanIds {
    /// W3C trace-context identifiers: a 16-byte trace id and 8-byte span
    /// ids. Root spans have no parent.
    W3c {
        /// The trace id shared by every span of the trace.
        trace_id: TraceId,
        /// This span's id.
        span_id: SpanId,
        /// The parent span's id, absent for root spans.
        parent_span_id: Option<SpanId>,
    },
    /// Legacy hierarchical identifiers carried as opaque strings.
    Hierarchical {
        /// The span's own hierarchical id.
        id: Option<String>,
        /// The root id shared by the whole trace.
        root_id: Option<String>,
        /// The declared parent id.
        parent_id: Option<String>,
    },
    /// The id format is not known. Every identifier normalizes to the empty
    /// string.
    Unknown,
}

impl Default for SpanIds {
    fn default() -> Self {
        SpanIds::Unknown
    }
}

#[derive(Debug)]
struct Inner {
    ids: SpanIds,
    tags: Vec<(String, PropertyValue)>,
    baggage: Vec<(String, PropertyValue)>,
    trace_state: Option<String>,
    trace_flags: TraceFlags,
    operation_name: String,
    // Derived properties, keyed by slot and configured property name so two
    // enrichers with different configurations never collide. Owned by the
    // context so cached values cannot outlive it.
    memo: Mutex<HashMap<(IdSlot, String), Arc<[EnrichmentProperty]>>>,
}

/// A read-only snapshot of the ambient span.
///
/// Cloning is cheap and every clone refers to the same underlying instance,
/// including its memoized derived values. The tracing side of the host
/// builds one of these per span and installs it with [`TraceContext::attach`];
/// enrichment reads it back with [`TraceContext::current`].
///
/// # Examples
///
/// ```
/// use opentelemetry::trace::{SpanId, TraceId};
/// use opentelemetry_span_enricher::TraceContext;
///
/// let context = TraceContext::builder()
///     .with_w3c_ids(TraceId::from(1), SpanId::from(2))
///     .with_operation_name("GET /users")
///     .build();
///
/// let _guard = context.attach();
/// assert!(TraceContext::current().is_some());
/// ```
#[derive(Clone, Debug)]
pub struct TraceContext {
    inner: Arc<Inner>,
}

impl TraceContext {
    /// Starts building a snapshot.
    pub fn builder() -> TraceContextBuilder {
        TraceContextBuilder::default()
    }

    /// Returns the snapshot attached to the current thread's context, if
    /// any.
    pub fn current() -> Option<TraceContext> {
        Context::map_current(|cx| cx.get::<TraceContext>().cloned())
    }

    /// Attaches this snapshot to the current thread's context, returning a
    /// guard that restores the previous context when dropped.
    pub fn attach(self) -> ContextGuard {
        Context::current_with_value(self).attach()
    }

    /// The span identifiers in their native encoding.
    pub fn ids(&self) -> &SpanIds {
        &self.inner.ids
    }

    /// Tag key/value pairs, in recording order.
    pub fn tags(&self) -> &[(String, PropertyValue)] {
        &self.inner.tags
    }

    /// Baggage key/value pairs, in recording order.
    pub fn baggage(&self) -> &[(String, PropertyValue)] {
        &self.inner.baggage
    }

    /// The raw trace-state header, if one was propagated.
    pub fn trace_state(&self) -> Option<&str> {
        self.inner.trace_state.as_deref()
    }

    /// The span's trace flags.
    pub fn trace_flags(&self) -> TraceFlags {
        self.inner.trace_flags
    }

    /// Whether the sampled flag is set.
    pub fn is_sampled(&self) -> bool {
        self.inner.trace_flags.is_sampled()
    }

    /// The operation name recorded for the span.
    pub fn operation_name(&self) -> &str {
        &self.inner.operation_name
    }

    /// Returns the memoized properties for `(slot, name)`, computing and
    /// storing them on first access. Concurrent first accesses may both
    /// compute; the first insert wins and the result is identical either
    /// way. A poisoned table degrades to recomputation.
    pub(crate) fn memoized(
        &self,
        slot: IdSlot,
        name: &str,
        compute: impl FnOnce() -> Arc<[EnrichmentProperty]>,
    ) -> Arc<[EnrichmentProperty]> {
        let key = (slot, name.to_owned());
        if let Ok(memo) = self.inner.memo.lock() {
            if let Some(found) = memo.get(&key) {
                return found.clone();
            }
        }

        let computed = compute();
        match self.inner.memo.lock() {
            Ok(mut memo) => memo.entry(key).or_insert(computed).clone(),
            Err(_) => computed,
        }
    }
}

/// Builder for [`TraceContext`] snapshots.
#[derive(Debug, Default)]
pub struct TraceContextBuilder {
    ids: SpanIds,
    tags: Vec<(String, PropertyValue)>,
    baggage: Vec<(String, PropertyValue)>,
    trace_state: Option<String>,
    trace_flags: TraceFlags,
    operation_name: String,
}

impl TraceContextBuilder {
    /// Sets the span identifiers directly.
    pub fn with_ids(mut self, ids: SpanIds) -> Self {
        self.ids = ids;
        self
    }

    /// Sets W3C trace-context identifiers with no parent.
    pub fn with_w3c_ids(self, trace_id: TraceId, span_id: SpanId) -> Self {
        self.with_ids(SpanIds::W3c {
            trace_id,
            span_id,
            parent_span_id: None,
        })
    }

    /// Sets the parent span id. Only meaningful after W3C ids have been
    /// set; ignored for other formats.
    pub fn with_parent_span_id(mut self, parent: SpanId) -> Self {
        if let SpanIds::W3c { parent_span_id, .. } = &mut self.ids {
            *parent_span_id = Some(parent);
        }
        self
    }

    /// Sets legacy hierarchical identifiers.
    pub fn with_hierarchical_ids(
        self,
        id: Option<String>,
        root_id: Option<String>,
        parent_id: Option<String>,
    ) -> Self {
        self.with_ids(SpanIds::Hierarchical {
            id,
            root_id,
            parent_id,
        })
    }

    /// Appends a tag.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.tags.push((key.into(), value.into()));
        self
    }

    /// Appends a baggage entry.
    pub fn with_baggage(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.baggage.push((key.into(), value.into()));
        self
    }

    /// Sets the raw trace-state header.
    pub fn with_trace_state(mut self, header: impl Into<String>) -> Self {
        self.trace_state = Some(header.into());
        self
    }

    /// Sets the trace flags.
    pub fn with_trace_flags(mut self, flags: TraceFlags) -> Self {
        self.trace_flags = flags;
        self
    }

    /// Sets or clears the sampled flag.
    pub fn sampled(mut self, sampled: bool) -> Self {
        self.trace_flags = if sampled {
            TraceFlags::SAMPLED
        } else {
            TraceFlags::NOT_SAMPLED
        };
        self
    }

    /// Sets the operation name.
    pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = name.into();
        self
    }

    /// Builds the snapshot.
    pub fn build(self) -> TraceContext {
        TraceContext {
            inner: Arc::new(Inner {
                ids: self.ids,
                tags: self.tags,
                baggage: self.baggage,
                trace_state: self.trace_state,
                trace_flags: self.trace_flags,
                operation_name: self.operation_name,
                memo: Mutex::new(HashMap::new()),
            }),
        }
    }
}
