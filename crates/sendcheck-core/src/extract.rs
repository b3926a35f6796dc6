//! Visible-text extraction from HTML templates
//!
//! Reduces markup to the text a reader would see: tags, comments, doctype,
//! the document title and the bodies of `<script>`/`<style>` are dropped,
//! block-level tags become
//! line breaks, common character references are decoded and whitespace is
//! collapsed.
//!
//! Extraction is strict about structure it cannot interpret. An unterminated
//! tag, comment or script block is an [`Error::Extraction`], never an empty
//! or truncated string, so a compliance check can not pass on text that was
//! silently lost.

use regex::{Captures, Regex};
use std::sync::OnceLock;

use crate::error::{Error, Result};

/// Tags whose boundaries separate lines of visible text
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "br", "dd", "div", "dl", "dt",
    "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "html", "li", "main",
    "nav", "ol", "p", "pre", "section", "table", "tbody", "td", "tfoot", "th", "thead",
    "title", "tr", "ul",
];

/// Tags whose content is never visible and never parsed as markup
const RAW_TEXT_TAGS: &[&str] = &["script", "style"];

/// Tags after which an unclosed `<title>` can no longer be open
const TITLE_ENDING_TAGS: &[&str] = &["head", "body"];

/// Extract visible plain text from an HTML (or plain text) document
pub fn extract_visible_text(html: &str) -> Result<String> {
    let mut out = String::with_capacity(html.len());
    let mut pos = 0;
    // title text is shown in the window chrome, not the message
    let mut in_title = false;

    while let Some(offset) = html[pos..].find('<') {
        let start = pos + offset;
        if !in_title {
            out.push_str(&html[pos..start]);
        }
        let rest = &html[start..];

        if rest.starts_with("<!--") {
            let end = rest[4..]
                .find("-->")
                .ok_or_else(|| unterminated("comment", start))?;
            pos = start + 4 + end + 3;
            continue;
        }

        let next = rest[1..].chars().next();
        match next {
            Some(c) if c == '!' || c == '?' => {
                let end = rest.find('>').ok_or_else(|| unterminated("declaration", start))?;
                pos = start + end + 1;
            }
            Some(c) if c == '/' || c.is_ascii_alphabetic() => {
                let end = find_tag_end(rest).ok_or_else(|| unterminated("tag", start))?;
                let tag = &rest[1..end];
                let closing = tag.starts_with('/');
                let name = tag_name(tag);
                pos = start + end + 1;

                if BLOCK_TAGS.contains(&name.as_str()) {
                    out.push('\n');
                }

                if name == "title" {
                    in_title = !closing;
                } else if TITLE_ENDING_TAGS.contains(&name.as_str()) {
                    in_title = false;
                }

                if !closing && !tag.ends_with('/') && RAW_TEXT_TAGS.contains(&name.as_str()) {
                    pos = skip_raw_text(html, pos, &name)?;
                }
            }
            // A bare '<' (e.g. "a < b") is literal text
            _ => {
                if !in_title {
                    out.push('<');
                }
                pos = start + 1;
            }
        }
    }
    if !in_title {
        out.push_str(&html[pos..]);
    }

    let text = normalize_whitespace(&decode_entities(&out));
    if text.is_empty() && !html.trim().is_empty() {
        tracing::warn!("Template markup contains no visible text");
    }
    Ok(text)
}

fn unterminated(what: &str, byte: usize) -> Error {
    Error::extraction(format!("unterminated {} starting at byte {}", what, byte))
}

/// Index of the `>` closing the tag at the start of `rest`, honouring quoted
/// attribute values
///
/// A quote only opens a value when it is the first non-space character after
/// `=`. Quotes elsewhere, such as the apostrophe in `alt=Don't`, are
/// ordinary characters and an unquoted value ends at whitespace or `>`.
fn find_tag_end(rest: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut value_start = false;
    for (i, c) in rest.char_indices().skip(1) {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '>' => return Some(i),
            '<' => return None,
            '=' => value_start = true,
            '"' | '\'' if value_start => {
                quote = Some(c);
                value_start = false;
            }
            c if c.is_whitespace() => {}
            _ => value_start = false,
        }
    }
    None
}

fn tag_name(tag: &str) -> String {
    tag.trim_start_matches('/')
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Skip to just past `</name>`, returning the new position
fn skip_raw_text(html: &str, pos: usize, name: &str) -> Result<usize> {
    let closing = format!("</{}", name);
    let haystack = html[pos..].to_ascii_lowercase();
    let offset = haystack.find(&closing).ok_or_else(|| {
        Error::extraction(format!("unclosed <{}> element starting near byte {}", name, pos))
    })?;
    let close_start = pos + offset;
    let end = html[close_start..]
        .find('>')
        .ok_or_else(|| unterminated("tag", close_start))?;
    Ok(close_start + end + 1)
}

fn entity_regex() -> &'static Regex {
    static ENTITY: OnceLock<Regex> = OnceLock::new();
    ENTITY.get_or_init(|| {
        Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]{2,8});")
            .expect("entity pattern is valid")
    })
}

fn decode_entities(text: &str) -> String {
    entity_regex()
        .replace_all(text, |caps: &Captures| {
            let body = &caps[1];
            let decoded = if let Some(num) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
                u32::from_str_radix(num, 16).ok().and_then(char::from_u32)
            } else if let Some(num) = body.strip_prefix('#') {
                num.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match body {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some(' '),
                    "rsquo" | "lsquo" => Some('\''),
                    "rdquo" | "ldquo" => Some('"'),
                    "ndash" | "mdash" => Some('-'),
                    "percnt" => Some('%'),
                    "rupee" => Some('\u{20b9}'),
                    _ => None,
                }
            };
            decoded
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn normalize_whitespace(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_passes_through() {
        assert_eq!(
            extract_visible_text("Hello  {first_name},\n  welcome").unwrap(),
            "Hello {first_name},\nwelcome"
        );
    }

    #[test]
    fn test_strips_tags_and_splits_blocks() {
        let html = r#"<html><body><p>Dear <b>Ann</b>,</p><p class="x">Returns &amp; growth</p></body></html>"#;
        assert_eq!(
            extract_visible_text(html).unwrap(),
            "Dear Ann,\nReturns & growth"
        );
    }

    #[test]
    fn test_inline_tags_do_not_split_words() {
        let html = "guaran<span>teed</span> returns";
        assert_eq!(extract_visible_text(html).unwrap(), "guaranteed returns");
    }

    #[test]
    fn test_drops_script_style_and_comments() {
        let html = "<head><title>t</title></head><style>p{color:red}</style><!-- guaranteed --><p>Hi</p><script>var x = '<p>';</script>";
        assert_eq!(extract_visible_text(html).unwrap(), "Hi");
    }

    #[test]
    fn test_quoted_gt_inside_attribute() {
        let html = r#"<a title="a > b" href='x'>Link</a>"#;
        assert_eq!(extract_visible_text(html).unwrap(), "Link");
    }

    #[test]
    fn test_apostrophe_in_unquoted_attribute_keeps_following_text() {
        let html = "<img alt=Don't miss>We guarantee returns, that's it -> call us";
        assert_eq!(
            extract_visible_text(html).unwrap(),
            "We guarantee returns, that's it -> call us"
        );
    }

    #[test]
    fn test_quote_mid_value_is_literal() {
        let html = r#"<a title=it"s href="x">Link</a> text"#;
        assert_eq!(extract_visible_text(html).unwrap(), "Link text");
    }

    #[test]
    fn test_head_without_end_tag() {
        let html = "<html><head><title>Fund</title><body><p>guaranteed returns</p></body></html>";
        assert_eq!(extract_visible_text(html).unwrap(), "guaranteed returns");
    }

    #[test]
    fn test_unclosed_title_ends_at_body() {
        let html = "<head><title>Fund<body><p>Hello</p>";
        assert_eq!(extract_visible_text(html).unwrap(), "Hello");
    }

    #[test]
    fn test_bare_lt_is_text() {
        assert_eq!(extract_visible_text("1 < 2").unwrap(), "1 < 2");
    }

    #[test]
    fn test_numeric_entities() {
        assert_eq!(extract_visible_text("12&#37; &#x41;").unwrap(), "12% A");
        assert_eq!(extract_visible_text("&bogus;").unwrap(), "&bogus;");
    }

    #[test]
    fn test_unterminated_tag_is_error() {
        let err = extract_visible_text("<p>ok</p><div class=\"x").unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
        assert!(err.to_string().contains("unterminated tag"));
    }

    #[test]
    fn test_unterminated_comment_is_error() {
        let err = extract_visible_text("<p>a</p><!-- never closed").unwrap_err();
        assert!(err.to_string().contains("unterminated comment"));
    }

    #[test]
    fn test_unclosed_script_is_error() {
        let err = extract_visible_text("<script>alert(1)").unwrap_err();
        assert!(err.to_string().contains("unclosed <script>"));
    }

    #[test]
    fn test_markup_only_yields_empty_text() {
        assert_eq!(extract_visible_text("<img src=\"a.png\"/>").unwrap(), "");
    }
}
