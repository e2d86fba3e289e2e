//! Tolerant parsing of trace-state headers.
//!
//! Trace-state is a comma-separated list of `key=value` members carrying
//! vendor-specific annotations alongside the trace identifiers. Parsing
//! here is deliberately forgiving: enrichment should surface whatever is
//! usable rather than reject the whole header, so malformed members are
//! dropped and the rest kept.

/// A key/value pair parsed from one trace-state list member.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceStateEntry {
    /// The member key, whitespace-trimmed, never empty.
    pub key: String,
    /// The member value, whitespace-trimmed, possibly empty.
    pub value: String,
}

/// Parses a trace-state header into its surviving entries.
///
/// Members without a `=` or with an empty trimmed key are dropped
/// silently. Input order is preserved and duplicate keys are kept as
/// separate entries. Empty or all-whitespace input yields no entries.
pub fn parse_trace_state(header: &str) -> Vec<TraceStateEntry> {
    header
        .split(',')
        .filter_map(|member| {
            let Some((key, value)) = member.split_once('=') else {
                if !member.trim().is_empty() {
                    internal_debug!("dropping trace-state member without `=`");
                }
                return None;
            };
            let key = key.trim();
            if key.is_empty() {
                internal_debug!("dropping trace-state member with empty key");
                return None;
            }
            Some(TraceStateEntry {
                key: key.to_owned(),
                value: value.trim().to_owned(),
            })
        })
        .collect()
}
