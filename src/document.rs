//! Typed models for the line-JSON document stream.
//!
//! Shards carry one JSON object per line with at least `id`, `source`, and
//! `text`. Anything else on the line belongs to upstream tooling and is
//! preserved by echoing the raw line, so only the decision-relevant fields
//! are modeled here. `text` may be `null` or absent; that is a valid document
//! and never a parse failure.

use serde::{Deserialize, Serialize};

/// Source label used when a document has no `source` field.
pub const NO_SOURCE: &str = "no_source";

/// One record from a shard, parsed for the contamination decision.
///
/// A line that fails to deserialize into this (missing `id`, non-object,
/// invalid JSON) is a malformed record: skipped and logged, never fatal.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Document {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl Document {
    /// Source label for per-source counters.
    pub fn source_label(&self) -> &str {
        self.source.as_deref().unwrap_or(NO_SOURCE)
    }
}

/// Audit record emitted in attributes-only output mode: one per input
/// document, without duplicating corpus bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeRecord {
    pub id: String,
    pub source: String,
    pub contaminated: bool,
}
