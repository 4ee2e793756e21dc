//! Jira wiki-markup tokens used by the ticket document.
//!
//! The renderer on the other end is strict about these, keep them byte-exact.

pub const CODE_OPEN: &str = "{code:json}\n";
pub const CODE_CLOSE: &str = "\n{code}\n";
pub const PANEL_CLOSE: &str = "{panel}\n\n";

/// Appended to a section body cut to fit its allocation
pub const TRUNCATION_MARKER: &str = "\n...[truncated]...";

/// Opening token of a collapsed panel titled `title`
pub fn panel_open(title: &str) -> String {
    format!(
        "{{panel:title={}|collapsed=true|borderStyle=solid|borderColor=#ddd|titleBGColor=#f7f7f7|bgColor=#fff}}\n",
        title
    )
}

/// Dashed note panel wrapping `text`
pub fn note_panel(text: &str) -> String {
    format!(
        "{{panel:title=Note|borderStyle=dashed|borderColor=#ccc|titleBGColor=#f0f0f0|bgColor=#fafafa}}\n{}\n{}",
        text, PANEL_CLOSE
    )
}

pub fn h2(text: &str) -> String {
    format!("h2. {}\n", text)
}

pub fn h3(text: &str) -> String {
    format!("h3. {}\n", text)
}

/// Inline image embed
pub fn image(url: &str) -> String {
    format!("!{}|width=800!", url)
}

/// Length in characters; every budget in this crate is counted this way
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// The first `n` characters of `s`
pub fn take_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panel_tokens_are_exact() {
        assert_eq!(
            panel_open("Response"),
            "{panel:title=Response|collapsed=true|borderStyle=solid|borderColor=#ddd|titleBGColor=#f7f7f7|bgColor=#fff}\n"
        );
        assert_eq!(
            note_panel("hi"),
            "{panel:title=Note|borderStyle=dashed|borderColor=#ccc|titleBGColor=#f0f0f0|bgColor=#fafafa}\nhi\n{panel}\n\n"
        );
        assert_eq!(image("https://x/y.png"), "!https://x/y.png|width=800!");
    }

    #[test]
    fn take_chars_respects_char_boundaries() {
        assert_eq!(take_chars("héllo", 2), "hé");
        assert_eq!(take_chars("abc", 10), "abc");
        assert_eq!(take_chars("abc", 0), "");
        assert_eq!(char_len("héllo"), 5);
    }
}
