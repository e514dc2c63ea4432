//! MailEnvelope - キュー上を流れる 1 通分のメールイベント
//!
//! Producer が JSON にして送り、Consumer が decode して観測ログに出す。
//! すべてのフィールドは省略可能で、どれが欠けていても settle には影響しない。

use serde::{Deserialize, Serialize};
use std::fmt;

/// Preview として観測ログに出す最大文字数（byte ではなく char 単位）
pub const PREVIEW_MAX_CHARS: usize = 100;

/// A decoded mail event.
///
/// Immutable once built: the producer side uses the `with_*` helpers, the
/// consumer side only reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    subject: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    from: Option<String>,

    /// Kept verbatim. The format is producer-defined and never parsed here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    received_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    body_preview: Option<String>,
}

impl MailEnvelope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_sender(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    pub fn with_received_at(mut self, received_at: impl Into<String>) -> Self {
        self.received_at = Some(received_at.into());
        self
    }

    pub fn with_body_preview(mut self, body_preview: impl Into<String>) -> Self {
        self.body_preview = Some(body_preview.into());
        self
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// The `from` address.
    pub fn sender(&self) -> Option<&str> {
        self.from.as_deref()
    }

    pub fn received_at(&self) -> Option<&str> {
        self.received_at.as_deref()
    }

    /// The full, untruncated preview text.
    pub fn body_preview(&self) -> Option<&str> {
        self.body_preview.as_deref()
    }

    /// `body_preview` cut to at most [`PREVIEW_MAX_CHARS`] characters.
    pub fn preview(&self) -> Option<&str> {
        self.body_preview
            .as_deref()
            .map(|text| truncate_chars(text, PREVIEW_MAX_CHARS))
    }

    /// Present fields in log order. Absent fields are skipped, never defaulted.
    pub fn populated_fields(&self) -> Vec<(EnvelopeField, &str)> {
        [
            (EnvelopeField::Subject, self.subject()),
            (EnvelopeField::From, self.sender()),
            (EnvelopeField::Received, self.received_at()),
            (EnvelopeField::Preview, self.preview()),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.map(|v| (field, v)))
        .collect()
    }
}

/// Envelope fields as they are labelled in observability output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnvelopeField {
    Subject,
    From,
    Received,
    Preview,
}

impl EnvelopeField {
    pub fn label(self) -> &'static str {
        match self {
            EnvelopeField::Subject => "Subject",
            EnvelopeField::From => "From",
            EnvelopeField::Received => "Received",
            EnvelopeField::Preview => "Preview",
        }
    }
}

impl fmt::Display for EnvelopeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_is_truncated_without_touching_the_field() {
        let long = "x".repeat(250);
        let env = MailEnvelope::new().with_body_preview(long.clone());

        assert_eq!(env.preview().map(str::len), Some(PREVIEW_MAX_CHARS));
        assert_eq!(env.body_preview(), Some(long.as_str()));
    }

    #[test]
    fn preview_counts_chars_not_bytes() {
        // 3 bytes per char in UTF-8
        let text = "あ".repeat(120);
        let env = MailEnvelope::new().with_body_preview(text);

        let preview = env.preview().unwrap();
        assert_eq!(preview.chars().count(), PREVIEW_MAX_CHARS);
        assert_eq!(preview.len(), PREVIEW_MAX_CHARS * 3);
    }

    #[test]
    fn short_preview_is_returned_as_is() {
        let env = MailEnvelope::new().with_body_preview("Hello world");
        assert_eq!(env.preview(), Some("Hello world"));
    }

    #[test]
    fn populated_fields_skip_absent_ones() {
        let env = MailEnvelope::new()
            .with_subject("Test")
            .with_received_at("2026-02-02T10:00:00Z");

        let fields = env.populated_fields();
        assert_eq!(
            fields,
            vec![
                (EnvelopeField::Subject, "Test"),
                (EnvelopeField::Received, "2026-02-02T10:00:00Z"),
            ]
        );
    }

    #[test]
    fn empty_envelope_has_no_fields() {
        assert!(MailEnvelope::new().populated_fields().is_empty());
    }

    #[test]
    fn serializes_with_camel_case_names() {
        let env = MailEnvelope::new()
            .with_received_at("now")
            .with_body_preview("hi");
        let v = serde_json::to_value(&env).unwrap();

        assert_eq!(v, serde_json::json!({ "receivedAt": "now", "bodyPreview": "hi" }));
    }
}
