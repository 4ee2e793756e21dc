//! Assembly of the ticket description and the final size guard.

use chrono::{DateTime, Utc};

use crate::markup::{char_len, h2, h3, image, note_panel};
use crate::normalizer::NormalizedFields;
use crate::overflow::{cut_to_ceiling, OverflowDocument};
use crate::section::RenderedSection;

pub const TECHNICAL_DETAILS_HEADING: &str = "h3. Technical Details\n\n";
pub const DOCUMENT_TRUNCATION_NOTICE: &str =
    "\n\n[Content truncated due to Jira character limit. See comments for complete information.]";
pub const SCREENSHOT_EXPIRY_NOTE: &str = "This screenshot URL will expire in 7 days.";

/// Blocks that are never cut by the section budget.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EssentialContent {
    pub summary: String,
    pub description: String,
    pub metadata: String,
    pub screenshot: String,
    pub timestamp: String,
}

impl EssentialContent {
    pub fn new(fields: &NormalizedFields, created_at: DateTime<Utc>) -> Self {
        Self {
            summary: format!("{}{}\n\n", h2("Issue Summary"), fields.issue),
            description: render_description(&fields.description),
            metadata: render_metadata(fields),
            screenshot: fields.image_reference.as_deref().map(render_screenshot).unwrap_or_default(),
            timestamp: format!("Ticket created on: {}\n", created_at.format("%a, %d %b %Y %H:%M:%S UTC")),
        }
    }

    /// Characters the budget must leave room for, technical-details heading included
    pub fn length(&self) -> usize {
        char_len(&self.summary)
            + char_len(&self.description)
            + char_len(&self.metadata)
            + char_len(&self.screenshot)
            + char_len(TECHNICAL_DETAILS_HEADING)
            + char_len(&self.timestamp)
    }
}

fn render_description(description: &str) -> String {
    if description.is_empty() {
        String::new()
    } else {
        format!("{}{}\n\n", h3("Description"), description)
    }
}

fn render_metadata(fields: &NormalizedFields) -> String {
    let lines: String = [
        ("User Email", &fields.user_email),
        ("Lead ID", &fields.lead_id),
        ("Product", &fields.product),
        ("Page URL", &fields.page_url),
    ]
    .iter()
    .filter(|(_, value)| !value.is_empty())
    .map(|(label, value)| format!("* *{}:* {}\n", label, value))
    .collect();

    if lines.is_empty() {
        String::new()
    } else {
        format!("{}{}\n\n", h3("User Information"), lines)
    }
}

/// Links are embedded with an expiry note; anything else is shown as text
fn render_screenshot(reference: &str) -> String {
    if reference.starts_with("http") {
        format!(
            "{}{}\n\n{}",
            h3("Screenshot"),
            image(reference),
            note_panel(SCREENSHOT_EXPIRY_NOTE)
        )
    } else {
        format!("{}{}\n\n", h3("Screenshot"), reference)
    }
}

/// Join essential blocks and sections in document order.
///
/// `sections` must be in `SectionKind::ALL` order; the first one (network
/// calls) sits above the technical-details heading.
pub fn assemble(essential: &EssentialContent, sections: &[RenderedSection]) -> String {
    let mut document = String::new();
    document.push_str(&essential.summary);
    document.push_str(&essential.description);
    document.push_str(&essential.metadata);
    document.push_str(&essential.screenshot);

    let mut rest = sections.iter();
    if let Some(first) = rest.next() {
        document.push_str(&first.text);
    }

    document.push_str(TECHNICAL_DETAILS_HEADING);
    for section in rest {
        document.push_str(&section.text);
    }

    document.push_str(&essential.timestamp);
    document
}

/// Last-resort cut of the whole description.
///
/// The uncut document is recorded in `overflow` before anything is dropped.
pub fn enforce_ceiling(document: String, ceiling: usize, overflow: &mut OverflowDocument) -> String {
    if char_len(&document) <= ceiling {
        return document;
    }

    tracing::warn!(
        length = char_len(&document),
        ceiling,
        "description still over the ceiling after section budgeting"
    );
    overflow.push_full_document(document.clone());
    cut_to_ceiling(document, ceiling, DOCUMENT_TRUNCATION_NOTICE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::overflow::FULL_DOCUMENT_HEADING;

    fn fields() -> NormalizedFields {
        NormalizedFields {
            issue: "Checkout broken".to_string(),
            description: "Pay button spins".to_string(),
            user_email: "a@b.io".to_string(),
            page_url: "https://app.example.com/checkout".to_string(),
            ..NormalizedFields::default()
        }
    }

    fn created_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
    }

    #[test]
    fn essential_blocks_render_exact_markup() {
        let essential = EssentialContent::new(&fields(), created_at());

        assert_eq!(essential.summary, "h2. Issue Summary\nCheckout broken\n\n");
        assert_eq!(essential.description, "h3. Description\nPay button spins\n\n");
        assert_eq!(
            essential.metadata,
            "h3. User Information\n* *User Email:* a@b.io\n* *Page URL:* https://app.example.com/checkout\n\n\n"
        );
        assert_eq!(essential.screenshot, "");
        assert_eq!(essential.timestamp, "Ticket created on: Fri, 01 Mar 2024 10:00:00 UTC\n");
    }

    #[test]
    fn screenshot_links_are_embedded() {
        let mut f = fields();
        f.image_reference = Some("https://bucket.s3.amazonaws.com/x.png".to_string());
        let essential = EssentialContent::new(&f, created_at());

        assert!(essential
            .screenshot
            .starts_with("h3. Screenshot\n!https://bucket.s3.amazonaws.com/x.png|width=800!\n\n{panel:title=Note"));
        assert!(essential.screenshot.contains(SCREENSHOT_EXPIRY_NOTE));

        f.image_reference = Some("screenshot pending".to_string());
        let essential = EssentialContent::new(&f, created_at());
        assert_eq!(essential.screenshot, "h3. Screenshot\nscreenshot pending\n\n");
    }

    #[test]
    fn empty_optional_blocks_are_omitted() {
        let f = NormalizedFields {
            issue: "x".to_string(),
            ..NormalizedFields::default()
        };
        let essential = EssentialContent::new(&f, created_at());

        assert_eq!(essential.description, "");
        assert_eq!(essential.metadata, "");
    }

    #[test]
    fn guard_leaves_small_documents_alone() {
        let mut overflow = OverflowDocument::new();
        let document = enforce_ceiling("short".to_string(), 100, &mut overflow);

        assert_eq!(document, "short");
        assert!(overflow.is_empty());
    }

    #[test]
    fn guard_cuts_and_keeps_the_original() {
        let mut overflow = OverflowDocument::new();
        let original = "d".repeat(1_500);

        let document = enforce_ceiling(original.clone(), 1_000, &mut overflow);

        assert!(document.ends_with(DOCUMENT_TRUNCATION_NOTICE));
        assert!(char_len(&document) <= 1_000);
        assert!(document.starts_with(&"d".repeat(900)));
        assert_eq!(overflow.block(FULL_DOCUMENT_HEADING).unwrap().content(), original);
    }
}
