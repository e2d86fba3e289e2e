//! Pluggable augmentation of canonical ids into vendor-specific properties.

use crate::config::ConfigError;
use crate::record::EnrichmentProperty;

/// Derives additional log record properties from canonical identifiers.
///
/// Augmentors serve backends whose conventions differ from the standard
/// hex representation, either by emitting the same value under another
/// name or by reencoding it. Implementations must never fail: malformed
/// input degrades to an empty result.
pub trait PropertyAugmentor: Send + Sync {
    /// Properties derived from the canonical trace id.
    fn augment_trace_id(&self, trace_id: &str) -> Vec<EnrichmentProperty>;

    /// Properties derived from the canonical span id.
    fn augment_span_id(&self, span_id: &str) -> Vec<EnrichmentProperty>;

    /// Properties derived from the canonical parent id.
    fn augment_parent_id(&self, parent_id: &str) -> Vec<EnrichmentProperty>;
}

/// Default property name for Datadog trace ids.
pub const DEFAULT_DATADOG_TRACE_ID_NAME: &str = "dd.trace_id";

/// Default property name for Datadog span ids.
pub const DEFAULT_DATADOG_SPAN_ID_NAME: &str = "dd.span_id";

/// Reencodes hex trace and span ids in the decimal form Datadog expects.
///
/// Datadog correlates logs with traces through 64-bit decimal ids. Per its
/// documented recommendation, a 16-byte trace id is truncated to its
/// right-most 8 bytes before conversion; span ids are converted whole.
/// There is no parent-id convention, so parent ids are never augmented.
#[derive(Clone, Debug)]
pub struct DatadogPropertyAugmentor {
    trace_id_name: String,
    span_id_name: String,
}

impl Default for DatadogPropertyAugmentor {
    fn default() -> Self {
        DatadogPropertyAugmentor {
            trace_id_name: DEFAULT_DATADOG_TRACE_ID_NAME.to_owned(),
            span_id_name: DEFAULT_DATADOG_SPAN_ID_NAME.to_owned(),
        }
    }
}

impl DatadogPropertyAugmentor {
    /// Creates an augmentor with custom property names.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyPropertyName`] if either name is empty
    /// or whitespace-only.
    pub fn with_property_names(
        trace_id_name: impl Into<String>,
        span_id_name: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let trace_id_name = trace_id_name.into();
        if trace_id_name.trim().is_empty() {
            return Err(ConfigError::EmptyPropertyName("trace_id_name"));
        }
        let span_id_name = span_id_name.into();
        if span_id_name.trim().is_empty() {
            return Err(ConfigError::EmptyPropertyName("span_id_name"));
        }

        Ok(DatadogPropertyAugmentor {
            trace_id_name,
            span_id_name,
        })
    }
}

impl PropertyAugmentor for DatadogPropertyAugmentor {
    fn augment_trace_id(&self, trace_id: &str) -> Vec<EnrichmentProperty> {
        if trace_id.len() != 32 {
            return Vec::new();
        }
        match trace_id.get(16..).and_then(parse_hex_u64) {
            Some(decimal) => vec![EnrichmentProperty::new(
                self.trace_id_name.clone(),
                decimal.to_string(),
            )],
            None => {
                internal_debug!("discarding non-conforming trace id for Datadog augmentation");
                Vec::new()
            }
        }
    }

    fn augment_span_id(&self, span_id: &str) -> Vec<EnrichmentProperty> {
        if span_id.len() != 16 {
            return Vec::new();
        }
        match parse_hex_u64(span_id) {
            Some(decimal) => vec![EnrichmentProperty::new(
                self.span_id_name.clone(),
                decimal.to_string(),
            )],
            None => {
                internal_debug!("discarding non-conforming span id for Datadog augmentation");
                Vec::new()
            }
        }
    }

    fn augment_parent_id(&self, _parent_id: &str) -> Vec<EnrichmentProperty> {
        Vec::new()
    }
}

// `from_str_radix` tolerates a leading sign, so every byte is checked to be
// a hex digit before parsing.
fn parse_hex_u64(hex: &str) -> Option<u64> {
    if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u64::from_str_radix(hex, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::PropertyValue;

    #[test]
    fn trace_id_converts_right_most_eight_bytes() {
        let augmentor = DatadogPropertyAugmentor::default();
        let properties = augmentor.augment_trace_id("ebe1010db7d9a5dec2b4a9915c2c79f0");

        assert_eq!(properties.len(), 1);
        assert_eq!(properties[0].name(), "dd.trace_id");
        assert_eq!(
            properties[0].value(),
            &PropertyValue::String("14030025180947708400".to_owned())
        );
    }

    #[test]
    fn span_id_converts_whole_value() {
        let augmentor = DatadogPropertyAugmentor::default();
        let properties = augmentor.augment_span_id("69e9851f1ca02b9a");

        assert_eq!(properties.len(), 1);
        assert_eq!(properties[0].name(), "dd.span_id");
        assert_eq!(
            properties[0].value(),
            &PropertyValue::String("7631777412226755482".to_owned())
        );
    }

    #[test]
    fn wrong_lengths_yield_nothing() {
        let augmentor = DatadogPropertyAugmentor::default();

        assert!(augmentor.augment_trace_id("").is_empty());
        assert!(augmentor.augment_trace_id("abc123").is_empty());
        assert!(augmentor
            .augment_trace_id("ebe1010db7d9a5dec2b4a9915c2c79f0ff")
            .is_empty());
        assert!(augmentor.augment_span_id("").is_empty());
        assert!(augmentor.augment_span_id("69e9851f1ca02b9aff").is_empty());
    }

    #[test]
    fn invalid_hex_yields_nothing() {
        let augmentor = DatadogPropertyAugmentor::default();

        assert!(augmentor
            .augment_trace_id("zzz1010db7d9a5dec2b4a9915c2c79zz")
            .is_empty());
        assert!(augmentor.augment_span_id("69e9851f1ca02b9z").is_empty());
        // A leading sign is not hex, even though integer parsing accepts it.
        assert!(augmentor.augment_span_id("+69e9851f1ca02b9").is_empty());
    }

    #[test]
    fn multibyte_input_yields_nothing() {
        let augmentor = DatadogPropertyAugmentor::default();
        // 32 bytes of UTF-8 whose midpoint is not a char boundary.
        let id = "aéééééééééééééééb";
        assert_eq!(id.len(), 32);
        assert!(augmentor.augment_trace_id(id).is_empty());
    }

    #[test]
    fn parent_id_is_never_augmented() {
        let augmentor = DatadogPropertyAugmentor::default();

        assert!(augmentor.augment_parent_id("69e9851f1ca02b9a").is_empty());
        assert!(augmentor.augment_parent_id("").is_empty());
        assert!(augmentor.augment_parent_id("anything").is_empty());
    }

    #[test]
    fn blank_property_names_are_rejected() {
        let err = DatadogPropertyAugmentor::with_property_names("  ", "dd.span_id").unwrap_err();
        assert_eq!(err, ConfigError::EmptyPropertyName("trace_id_name"));

        let err = DatadogPropertyAugmentor::with_property_names("dd.trace_id", "").unwrap_err();
        assert_eq!(err, ConfigError::EmptyPropertyName("span_id_name"));
    }

    #[test]
    fn custom_property_names_are_applied() {
        let augmentor = DatadogPropertyAugmentor::with_property_names("t", "s").unwrap();

        let properties = augmentor.augment_span_id("69e9851f1ca02b9a");
        assert_eq!(properties[0].name(), "s");

        let properties = augmentor.augment_trace_id("ebe1010db7d9a5dec2b4a9915c2c79f0");
        assert_eq!(properties[0].name(), "t");
    }
}
