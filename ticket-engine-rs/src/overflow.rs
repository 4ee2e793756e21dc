//! Secondary document holding everything cut from the ticket description.
//!
//! It is posted as a comment on the ticket. The comment is bound by the same
//! ceiling and is cut with a notice when it does not fit; nothing overflows
//! further than that.

use crate::markup::{char_len, h3, take_chars, CODE_CLOSE, CODE_OPEN};

pub const OVERFLOW_PREAMBLE: &str = "Additional details that couldn't fit in the description:\n\n";
pub const FULL_DOCUMENT_HEADING: &str = "Full Original Description";
pub const COMMENT_TRUNCATION_NOTICE: &str = "\n\n[Comment truncated due to Jira character limit]";

/// Characters dropped below the ceiling before a notice is appended
pub const TRUNCATION_MARGIN: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverflowBlock {
    /// Full rendered content of a truncated section
    Section { heading: String, content: String },

    /// The whole description as it was before the final cut
    FullDocument(String),
}

impl OverflowBlock {
    pub fn heading(&self) -> &str {
        match self {
            OverflowBlock::Section { heading, .. } => heading,
            OverflowBlock::FullDocument(_) => FULL_DOCUMENT_HEADING,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            OverflowBlock::Section { content, .. } => content,
            OverflowBlock::FullDocument(document) => document,
        }
    }

    fn render(&self) -> String {
        match self {
            OverflowBlock::Section { heading, content } => {
                format!("{}{}{}{}\n", h3(&format!("Complete {}", heading)), CODE_OPEN, content, CODE_CLOSE)
            }
            OverflowBlock::FullDocument(document) => format!("{}{}\n\n", h3(FULL_DOCUMENT_HEADING), document),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverflowDocument {
    blocks: Vec<OverflowBlock>,
}

impl OverflowDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_section(&mut self, heading: impl Into<String>, content: impl Into<String>) {
        self.blocks.push(OverflowBlock::Section {
            heading: heading.into(),
            content: content.into(),
        });
    }

    pub fn push_full_document(&mut self, document: impl Into<String>) {
        self.blocks.push(OverflowBlock::FullDocument(document.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn blocks(&self) -> &[OverflowBlock] {
        &self.blocks
    }

    /// First block titled `heading`
    pub fn block(&self, heading: &str) -> Option<&OverflowBlock> {
        self.blocks.iter().find(|b| b.heading() == heading)
    }

    /// The comment body, or `None` when nothing overflowed
    pub fn compose(&self, ceiling: usize) -> Option<String> {
        if self.is_empty() {
            return None;
        }

        let mut comment = String::from(OVERFLOW_PREAMBLE);
        for block in &self.blocks {
            comment.push_str(&block.render());
        }

        Some(cut_to_ceiling(comment, ceiling, COMMENT_TRUNCATION_NOTICE))
    }
}

/// Cut `text` to fit `ceiling` with `notice` appended when it is longer than
/// `ceiling`.
///
/// At least `TRUNCATION_MARGIN` characters are left for the notice. The result
/// never exceeds `ceiling`, even when the notice alone would not fit.
pub fn cut_to_ceiling(text: String, ceiling: usize, notice: &str) -> String {
    if char_len(&text) <= ceiling {
        return text;
    }

    let keep = ceiling.saturating_sub(TRUNCATION_MARGIN.max(char_len(notice)));
    let cut = format!("{}{}", take_chars(&text, keep), notice);
    take_chars(&cut, ceiling).to_string()
}
