//! Minimal markdown rendering for task summaries and expositions.
//!
//! Inline text is escaped, soft line breaks become `<br>`, and bare URLs are
//! linkified. Block text additionally wraps paragraphs (separated by blank
//! lines) in `<p>` tags.

use once_cell::sync::Lazy;
use regex::Regex;

static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://[^\s<]+").unwrap());

pub fn inline(text: &str) -> String {
    let escaped = escape(text);
    let linked = URL_RE.replace_all(&escaped, r#"<a href="$0">$0</a>"#);
    linked.replace('\n', "<br>\n")
}

pub fn block(text: &str) -> String {
    text.split("\n\n")
        .filter(|paragraph| !paragraph.trim().is_empty())
        .map(|paragraph| format!("<p>{}</p>\n", inline(paragraph.trim_end())))
        .collect()
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}
