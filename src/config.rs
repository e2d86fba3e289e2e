//! Property-name configuration and its validation.

use thiserror::Error;

/// Errors raised while building enrichment configuration.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A property-name override was empty or whitespace-only. Carries the
    /// name of the offending field.
    #[error("property name for `{0}` must not be empty")]
    EmptyPropertyName(&'static str),
}

/// The names under which standard fields are written to log records.
///
/// Every name is validated when set and the value is immutable once built,
/// so an enricher holding one never has to re-check it.
///
/// # Examples
///
/// ```
/// use opentelemetry_span_enricher::PropertyNames;
///
/// let names = PropertyNames::default()
///     .with_span_id("span_id")?
///     .with_trace_id("trace_id")?;
/// assert_eq!(names.span_id(), "span_id");
/// assert_eq!(names.parent_id(), "ParentId");
/// # Ok::<(), opentelemetry_span_enricher::ConfigError>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyNames {
    span_id: String,
    trace_id: String,
    parent_id: String,
    operation_name: String,
}

impl Default for PropertyNames {
    fn default() -> Self {
        PropertyNames {
            span_id: "SpanId".to_owned(),
            trace_id: "TraceId".to_owned(),
            parent_id: "ParentId".to_owned(),
            operation_name: "OperationName".to_owned(),
        }
    }
}

impl PropertyNames {
    fn checked(name: String, field: &'static str) -> Result<String, ConfigError> {
        if name.trim().is_empty() {
            Err(ConfigError::EmptyPropertyName(field))
        } else {
            Ok(name)
        }
    }

    /// Overrides the span id property name.
    pub fn with_span_id(mut self, name: impl Into<String>) -> Result<Self, ConfigError> {
        self.span_id = Self::checked(name.into(), "span_id")?;
        Ok(self)
    }

    /// Overrides the trace id property name.
    pub fn with_trace_id(mut self, name: impl Into<String>) -> Result<Self, ConfigError> {
        self.trace_id = Self::checked(name.into(), "trace_id")?;
        Ok(self)
    }

    /// Overrides the parent id property name.
    pub fn with_parent_id(mut self, name: impl Into<String>) -> Result<Self, ConfigError> {
        self.parent_id = Self::checked(name.into(), "parent_id")?;
        Ok(self)
    }

    /// Overrides the operation name property name.
    pub fn with_operation_name(mut self, name: impl Into<String>) -> Result<Self, ConfigError> {
        self.operation_name = Self::checked(name.into(), "operation_name")?;
        Ok(self)
    }

    /// The span id property name.
    pub fn span_id(&self) -> &str {
        &self.span_id
    }

    /// The trace id property name.
    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    /// The parent id property name.
    pub fn parent_id(&self) -> &str {
        &self.parent_id
    }

    /// The operation name property name.
    pub fn operation_name(&self) -> &str {
        &self.operation_name
    }
}
