//! Plain-text rendering of the backend's read detail HTML.
//!
//! The detail endpoint answers with a small HTML snippet: BLAST-style alignment lines
//! separated by `<br/>`, wrapped in a monospace `div`, with `&nbsp;` spacers.

use regex::Regex;

/// Converts a detail snippet to text suitable for a monospace label.
pub fn html_to_text(html: &str) -> String {
    let Some(text) = strip_markup(html) else {
        return html.to_string();
    };

    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
        .trim_end()
        .to_string()
}

fn strip_markup(html: &str) -> Option<String> {
    let line_break = Regex::new(r"(?i)<br\s*/?>").ok()?;
    let tag = Regex::new(r"<[^>]*>").ok()?;

    let with_newlines = line_break.replace_all(html, "\n");
    Some(tag.replace_all(&with_newlines, "").into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_alignment_snippet() {
        let html = "<div style='font-family:Courier;'>ACGT..A<br/>||||..|<br/>ACGTTTA<br/>\
                    <br/>Total length=7 &nbsp; Log odds=1.2</div>";

        assert_eq!(
            html_to_text(html),
            "ACGT..A\n||||..|\nACGTTTA\n\nTotal length=7   Log odds=1.2"
        );
    }

    #[test]
    fn decodes_entities_once() {
        assert_eq!(html_to_text("a &amp;lt; b<BR>c"), "a &lt; b\nc");
    }
}
