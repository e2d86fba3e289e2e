//! Normalization of span identifiers into canonical strings.
//!
//! Canonical ids are format independent: W3C ids render as fixed-width
//! lowercase hex, hierarchical ids pass through as-is, and anything absent
//! or unknown becomes the empty string. The empty string, never an
//! `Option`, is the canonical absent value.

use crate::context::{SpanIds, TraceContext};

/// The identifier being normalized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IdSlot {
    /// The span's own id.
    Span,
    /// The trace id shared by the whole trace.
    Trace,
    /// The parent span's id.
    Parent,
}

/// Returns the canonical string for one identifier slot of a context.
///
/// Total over every id format; never fails for a present context.
pub fn canonical_id(context: &TraceContext, slot: IdSlot) -> String {
    match (context.ids(), slot) {
        (SpanIds::W3c { span_id, .. }, IdSlot::Span) => span_id.to_string(),
        (SpanIds::W3c { trace_id, .. }, IdSlot::Trace) => trace_id.to_string(),
        (SpanIds::W3c { parent_span_id, .. }, IdSlot::Parent) => parent_span_id
            .as_ref()
            .map(|id| id.to_string())
            .unwrap_or_default(),
        (SpanIds::Hierarchical { id, .. }, IdSlot::Span) => id.clone().unwrap_or_default(),
        (SpanIds::Hierarchical { root_id, .. }, IdSlot::Trace) => {
            root_id.clone().unwrap_or_default()
        }
        (SpanIds::Hierarchical { parent_id, .. }, IdSlot::Parent) => {
            parent_id.clone().unwrap_or_default()
        }
        (SpanIds::Unknown, _) => String::new(),
    }
}

impl TraceContext {
    /// The canonical span id, empty if absent.
    pub fn span_id(&self) -> String {
        canonical_id(self, IdSlot::Span)
    }

    /// The canonical trace id, empty if absent.
    pub fn trace_id(&self) -> String {
        canonical_id(self, IdSlot::Trace)
    }

    /// The canonical parent id, empty if absent.
    pub fn parent_id(&self) -> String {
        canonical_id(self, IdSlot::Parent)
    }
}
