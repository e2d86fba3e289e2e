//! Enrich log records with trace context from the active span.
//!
//! This crate projects the ambient trace context — span, trace and parent
//! identifiers, tags, baggage, trace-state and flags — into named
//! properties on a log record, so that every log line emitted inside a
//! span can be correlated with its trace.
//!
//! The pipeline: the [`TraceContext`] snapshot of the active span is read
//! once, identifiers are normalized into canonical strings regardless of
//! their native format, an optional [`PropertyAugmentor`] derives extra
//! vendor-specific representations (the built-in
//! [`DatadogPropertyAugmentor`] reencodes hex ids as the decimal form
//! Datadog expects), and the resulting properties are written into the
//! record through a write-once-per-name sink. Derived values are memoized
//! per context, so the many records emitted within one span pay for
//! normalization and augmentation once.
//!
//! # Getting started
//!
//! ```
//! use opentelemetry::trace::{SpanId, TraceId};
//! use opentelemetry_span_enricher::{
//!     DatadogPropertyAugmentor, InMemoryRecord, SpanEnricher, TraceContext,
//! };
//!
//! let enricher = SpanEnricher::builder()
//!     .with_augmentor(DatadogPropertyAugmentor::default())
//!     .include_operation_name(true)
//!     .build();
//!
//! // The tracing side of the host installs a snapshot of the active span.
//! let context = TraceContext::builder()
//!     .with_w3c_ids(
//!         TraceId::from(0xebe1010db7d9a5dec2b4a9915c2c79f0),
//!         SpanId::from(0x69e9851f1ca02b9a),
//!     )
//!     .with_operation_name("GET /users")
//!     .build();
//! let _guard = context.attach();
//!
//! // The logging side enriches each record it emits.
//! let mut record = InMemoryRecord::new();
//! enricher.enrich(&mut record);
//!
//! assert!(record.contains("SpanId"));
//! assert!(record.contains("dd.trace_id"));
//! ```

#![warn(
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    rust_2018_idioms
)]

#[cfg(feature = "internal-logs")]
macro_rules! internal_debug {
    ($($arg:tt)*) => {
        tracing::debug!(target: env!("CARGO_PKG_NAME"), $($arg)*)
    };
}

#[cfg(not(feature = "internal-logs"))]
macro_rules! internal_debug {
    ($($arg:tt)*) => {{
        let _ = format_args!($($arg)*);
    }};
}

mod augment;
mod config;
mod context;
mod enrich;
mod ids;
mod record;
mod trace_state;

pub use augment::{
    DatadogPropertyAugmentor, PropertyAugmentor, DEFAULT_DATADOG_SPAN_ID_NAME,
    DEFAULT_DATADOG_TRACE_ID_NAME,
};
pub use config::{ConfigError, PropertyNames};
pub use context::{SpanIds, TraceContext, TraceContextBuilder};
pub use enrich::{SpanEnricher, SpanEnricherBuilder};
pub use ids::{canonical_id, IdSlot};
pub use record::{EnrichmentProperty, InMemoryRecord, LogRecord, PropertyValue};
pub use trace_state::{parse_trace_state, TraceStateEntry};
