//! Field filter for captured form data.
//!
//! Submitted forms are serialized into the event context. Before that, each
//! field goes through [`FieldFilter`]: fields with a sensitive name are
//! replaced by a marker, everything else is cut to a maximum length.

use std::collections::BTreeMap;

use regex::Regex;
use tracing::trace;

use crate::config::PrivacyConfig;

/// Outcome of filtering a single field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldOutcome {
    /// The value was short enough to keep as-is.
    Kept(String),

    /// The value was cut to the maximum length.
    Truncated(String),

    /// The field name is sensitive; the value was replaced.
    Redacted(String),
}

impl FieldOutcome {
    /// The value to record.
    #[must_use]
    pub fn into_value(self) -> String {
        match self {
            Self::Kept(value) | Self::Truncated(value) | Self::Redacted(value) => value,
        }
    }
}

/// Redaction and truncation rules for form fields.
#[derive(Debug)]
pub struct FieldFilter {
    sensitive: Vec<Regex>,
    marker: String,
    max_value_length: usize,
    max_text_length: usize,
}

impl FieldFilter {
    /// Create a filter with the default rules.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&PrivacyConfig::default())
    }

    /// Create a filter from the `[privacy]` configuration section.
    ///
    /// Patterns that do not compile are logged and skipped.
    #[must_use]
    pub fn with_config(config: &PrivacyConfig) -> Self {
        let sensitive = config
            .sensitive_field_patterns
            .iter()
            .filter_map(|p| match Regex::new(p) {
                Ok(r) => Some(r),
                Err(e) => {
                    tracing::warn!(pattern = %p, error = %e, "Invalid sensitive field pattern");
                    None
                }
            })
            .collect();

        Self {
            sensitive,
            marker: config.redaction_marker.clone(),
            max_value_length: config.max_value_length,
            max_text_length: config.max_text_length,
        }
    }

    /// Whether a field with this name must be redacted.
    #[must_use]
    pub fn is_sensitive(&self, field_name: &str) -> bool {
        self.sensitive.iter().any(|r| r.is_match(field_name))
    }

    /// Filter one field value.
    #[must_use]
    pub fn filter_field(&self, field_name: &str, value: &str) -> FieldOutcome {
        if self.is_sensitive(field_name) {
            trace!(field = %field_name, "Field value redacted");
            return FieldOutcome::Redacted(self.marker.clone());
        }

        match truncate_chars(value, self.max_value_length) {
            Some(cut) => FieldOutcome::Truncated(cut),
            None => FieldOutcome::Kept(value.to_string()),
        }
    }

    /// Filter every named field of a form. A repeated name keeps its last value.
    pub fn filter_form<'a>(
        &self,
        fields: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> BTreeMap<String, String> {
        fields
            .into_iter()
            .filter(|(name, _)| !name.is_empty())
            .map(|(name, value)| (name.to_string(), self.filter_field(name, value).into_value()))
            .collect()
    }

    /// Trim and shorten free text such as a clicked element's label.
    #[must_use]
    pub fn snippet(&self, text: &str) -> Option<String> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(truncate_chars(trimmed, self.max_text_length).unwrap_or_else(|| trimmed.to_string()))
    }

    /// The replacement used for sensitive fields.
    #[must_use]
    pub fn marker(&self) -> &str {
        &self.marker
    }
}

impl Default for FieldFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// Cut `value` to `max` characters, or `None` if it already fits.
fn truncate_chars(value: &str, max: usize) -> Option<String> {
    value
        .char_indices()
        .nth(max)
        .map(|(byte_index, _)| value[..byte_index].to_string())
}
