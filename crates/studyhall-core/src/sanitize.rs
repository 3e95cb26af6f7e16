//! Rich-text sanitizer for user-submitted post and comment bodies.
//!
//! Keeps a small allow-list of formatting tags, strips every attribute
//! (anchors keep an http/https `href` and get safe link attributes), and
//! turns bare URLs in text into links with the same attributes.

use once_cell::sync::Lazy;
use regex::Regex;

const ALLOWED_TAGS: &[&str] = &[
    "a",
    "b",
    "blockquote",
    "br",
    "code",
    "em",
    "i",
    "li",
    "ol",
    "p",
    "pre",
    "strong",
    "ul",
];

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static TAG_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^<\s*(/?)\s*([a-zA-Z][a-zA-Z0-9]*)").unwrap());
static HREF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)href\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap());
static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://[^\s<>'\x22]+").unwrap());

/// Escape text for safe inclusion in HTML.
fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn push_anchor(out: &mut String, href: &str) {
    out.push_str("<a href=\"");
    out.push_str(&html_escape(href));
    out.push_str("\" rel=\"nofollow noopener\" target=\"_blank\">");
}

/// Escape a text run, linkifying bare URLs unless already inside an anchor.
fn push_text(out: &mut String, text: &str, linkify: bool) {
    if !linkify {
        out.push_str(&html_escape(text));
        return;
    }

    let mut last = 0;
    for m in URL_RE.find_iter(text) {
        out.push_str(&html_escape(&text[last..m.start()]));
        push_anchor(out, m.as_str());
        out.push_str(&html_escape(m.as_str()));
        out.push_str("</a>");
        last = m.end();
    }
    out.push_str(&html_escape(&text[last..]));
}

fn safe_href(tag: &str) -> Option<&str> {
    let caps = HREF_RE.captures(tag)?;
    let href = caps.get(1).or_else(|| caps.get(2))?.as_str();
    let lower = href.to_ascii_lowercase();
    (lower.starts_with("http://") || lower.starts_with("https://")).then_some(href)
}

/// Clean a rich-text fragment down to the allow-list.
///
/// Disallowed tags are dropped while their inner text survives, so a
/// stripped `<script>` cannot smuggle markup back in.
pub fn clean(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last = 0;
    // open anchors we emitted vs. open anchors we swallowed
    let mut open_anchors = 0usize;
    let mut dropped_anchors = 0usize;

    for m in TAG_RE.find_iter(input) {
        push_text(&mut out, &input[last..m.start()], open_anchors == 0);
        last = m.end();

        let tag = m.as_str();
        let Some(caps) = TAG_NAME_RE.captures(tag) else {
            continue;
        };
        let closing = !caps[1].is_empty();
        let name = caps[2].to_ascii_lowercase();

        if !ALLOWED_TAGS.contains(&name.as_str()) {
            continue;
        }

        match name.as_str() {
            "br" => {
                if !closing {
                    out.push_str("<br>");
                }
            }
            "a" => {
                if closing {
                    if dropped_anchors > 0 {
                        dropped_anchors -= 1;
                    } else if open_anchors > 0 {
                        open_anchors -= 1;
                        out.push_str("</a>");
                    }
                } else if let Some(href) = safe_href(tag) {
                    open_anchors += 1;
                    push_anchor(&mut out, href);
                } else {
                    dropped_anchors += 1;
                }
            }
            _ => {
                if closing {
                    out.push_str("</");
                    out.push_str(&name);
                    out.push('>');
                } else {
                    out.push('<');
                    out.push_str(&name);
                    out.push('>');
                }
            }
        }
    }

    push_text(&mut out, &input[last..], open_anchors == 0);

    // close anything the input left dangling
    for _ in 0..open_anchors {
        out.push_str("</a>");
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_allowed_tags_and_strips_attributes() {
        assert_eq!(
            clean(r#"<b class="huge">bold</b> and <em>emphasis</em>"#),
            "<b>bold</b> and <em>emphasis</em>"
        );
    }

    #[test]
    fn drops_disallowed_tags_but_keeps_their_text() {
        assert_eq!(clean("<script>alert('x')</script>ok"), "alert('x')ok");
        assert_eq!(clean("<img src=x onerror=alert(1)>ok"), "ok");
    }

    #[test]
    fn escapes_plain_markup_characters() {
        assert_eq!(clean("1 < 2 & 2 > 1"), "1 &lt; 2 &amp; 2 &gt; 1");
    }

    #[test]
    fn anchors_keep_only_safe_hrefs() {
        assert_eq!(
            clean(r#"<a href="https://example.com" onclick="evil()">link</a>"#),
            r#"<a href="https://example.com" rel="nofollow noopener" target="_blank">link</a>"#
        );
        // javascript: anchor is dropped entirely, text survives
        assert_eq!(clean(r#"<a href="javascript:evil()">link</a>"#), "link");
    }

    #[test]
    fn linkifies_bare_urls() {
        assert_eq!(
            clean("see https://example.com/page for details"),
            "see <a href=\"https://example.com/page\" rel=\"nofollow noopener\" \
             target=\"_blank\">https://example.com/page</a> for details"
        );
    }

    #[test]
    fn does_not_relinkify_inside_an_anchor() {
        let out = clean(r#"<a href="https://a.example">https://a.example</a>"#);
        assert_eq!(out.matches("<a ").count(), 1);
    }

    #[test]
    fn closes_dangling_anchors() {
        let out = clean(r#"<a href="https://a.example">open"#);
        assert!(out.ends_with("</a>"));
    }
}
