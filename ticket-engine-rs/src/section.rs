//! Rendering of the four budgeted sections.
//!
//! Each section is a collapsed panel around a JSON code block. A body longer
//! than the section's allocation is cut, marked, and recorded in full in the
//! overflow document.

use std::fmt::Debug;

use serde::Serialize;
use tracing::debug;

use crate::budget::Budget;
use crate::markup::{char_len, panel_open, take_chars, CODE_CLOSE, CODE_OPEN, PANEL_CLOSE, TRUNCATION_MARKER};
use crate::overflow::OverflowDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    NetworkCalls,
    RequestHeaders,
    Response,
    Payload,
}

impl SectionKind {
    /// Document order
    pub const ALL: [SectionKind; 4] = [
        SectionKind::NetworkCalls,
        SectionKind::RequestHeaders,
        SectionKind::Response,
        SectionKind::Payload,
    ];

    pub fn title(self) -> &'static str {
        match self {
            SectionKind::NetworkCalls => "Failed Network Calls",
            SectionKind::RequestHeaders => "Request Headers",
            SectionKind::Response => "Response",
            SectionKind::Payload => "Full Payload Data",
        }
    }

    pub fn placeholder(self) -> &'static str {
        match self {
            SectionKind::NetworkCalls => "No failed network calls available.",
            SectionKind::RequestHeaders => "No request headers available.",
            SectionKind::Response => "No response data available.",
            SectionKind::Payload => "No payload data available.",
        }
    }

    pub fn allocation(self, budget: &Budget) -> usize {
        match self {
            SectionKind::NetworkCalls => budget.network_calls,
            SectionKind::RequestHeaders => budget.headers,
            SectionKind::Response => budget.response,
            SectionKind::Payload => budget.payload,
        }
    }

    /// Characters taken by the panel and code wrappers around the body
    pub fn overhead(self) -> usize {
        char_len(&panel_open(self.title())) + char_len(CODE_OPEN) + char_len(CODE_CLOSE) + char_len(PANEL_CLOSE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSection {
    pub kind: SectionKind,

    /// Panel as it appears in the description
    pub text: String,

    /// Content inside the code block, or the placeholder
    pub body: String,

    pub truncated: bool,

    /// Untruncated content; set only when `truncated`
    pub full_content: Option<String>,
}

/// Pretty JSON, or the `Debug` form when serialization fails
pub fn render_content<T: Serialize + Debug + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|err| {
        debug!(error = %err, "falling back to debug rendering");
        format!("{:?}", value)
    })
}

/// Render `content` into a panel no longer than `allocation` where possible.
///
/// `None` renders the placeholder panel, which is never truncated.
pub fn render_section(
    kind: SectionKind,
    content: Option<String>,
    allocation: usize,
    overflow: &mut OverflowDocument,
) -> RenderedSection {
    let open = panel_open(kind.title());

    let content = match content {
        Some(content) => content,
        None => {
            let body = kind.placeholder().to_string();
            return RenderedSection {
                kind,
                text: format!("{}{}\n{}", open, body, PANEL_CLOSE),
                body,
                truncated: false,
                full_content: None,
            };
        }
    };

    let usable = allocation.saturating_sub(kind.overhead());
    let length = char_len(&content);

    let (body, full_content) = if length <= usable {
        (content, None)
    } else {
        let keep = usable.saturating_sub(char_len(TRUNCATION_MARKER));
        let body = format!("{}{}", take_chars(&content, keep), TRUNCATION_MARKER);

        debug!(
            section = kind.title(),
            length,
            allocation,
            kept = keep,
            "section truncated"
        );
        overflow.push_section(kind.title(), content.clone());
        (body, Some(content))
    };

    RenderedSection {
        kind,
        text: format!("{}{}{}{}{}", open, CODE_OPEN, body, CODE_CLOSE, PANEL_CLOSE),
        body,
        truncated: full_content.is_some(),
        full_content,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_content_is_untouched() {
        let mut overflow = OverflowDocument::new();

        let section = render_section(SectionKind::Response, Some("{}".to_string()), 1_000, &mut overflow);

        assert!(!section.truncated);
        assert_eq!(section.body, "{}");
        assert!(section.text.starts_with("{panel:title=Response|collapsed=true"));
        assert!(section.text.ends_with("{code:json}\n{}\n{code}\n{panel}\n\n"));
        assert!(overflow.is_empty());
    }

    #[test]
    fn long_content_is_cut_to_its_allocation() {
        let mut overflow = OverflowDocument::new();
        let content = "x".repeat(50_000);

        let section = render_section(SectionKind::NetworkCalls, Some(content.clone()), 1_000, &mut overflow);

        assert!(section.truncated);
        assert!(section.body.ends_with(TRUNCATION_MARKER));
        assert_eq!(char_len(&section.text), 1_000);
        assert_eq!(section.full_content.as_deref(), Some(content.as_str()));

        let block = overflow.block("Failed Network Calls").unwrap();
        assert_eq!(block.content(), content);
    }

    #[test]
    fn zero_allocation_still_marks_truncation() {
        let mut overflow = OverflowDocument::new();

        let section = render_section(SectionKind::Payload, Some("{\"a\": 1}".to_string()), 0, &mut overflow);

        assert!(section.truncated);
        assert_eq!(section.body, TRUNCATION_MARKER);
        assert_eq!(overflow.blocks().len(), 1);
    }

    #[test]
    fn placeholder_is_never_truncated() {
        let mut overflow = OverflowDocument::new();

        let section = render_section(SectionKind::RequestHeaders, None, 0, &mut overflow);

        assert!(!section.truncated);
        assert_eq!(section.body, "No request headers available.");
        assert!(section.text.contains("No request headers available.\n{panel}\n\n"));
        assert!(overflow.is_empty());
    }

    #[test]
    fn multibyte_content_is_counted_in_characters() {
        let mut overflow = OverflowDocument::new();
        let overhead = SectionKind::Response.overhead();
        let content = "é".repeat(10);

        let section = render_section(SectionKind::Response, Some(content), overhead + 10, &mut overflow);

        assert!(!section.truncated);
    }

    #[test]
    fn render_content_is_pretty_json() {
        let value = serde_json::json!({"a": [1, 2]});
        assert_eq!(render_content(&value), "{\n  \"a\": [\n    1,\n    2\n  ]\n}");
    }
}
