// src/github/readme.rs
// =============================================================================
// README handling: decode what the API sends, then turn it into text that
// can be read aloud.
//
// Decoding:
// - `/repos/{owner}/{repo}/readme` returns the file as base64 with a line
//   break every 60 characters, so whitespace is stripped before decoding.
// - Bytes are interpreted as UTF-8 (lossily: a stray Latin-1 byte becomes
//   U+FFFD instead of failing the whole page).
//
// Narration text:
// - We use the `pulldown-cmark` crate to walk the Markdown as events and keep
//   only the readable text, roughly what a browser would show as innerText.
// - README files often embed raw HTML (centered logos, badges). Those
//   fragments go through `scraper`, which parses them and gives us the text
//   nodes without the tags.
//
// Rust concepts:
// - Iterators: Markdown events arrive one by one
// - Pattern matching: to pick the events we care about
// - Cow strings: pulldown-cmark borrows from the input when it can
// =============================================================================

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use pulldown_cmark::{Event, Parser, Tag};
use scraper::Html;

use super::models::Readme;

/// Error returned when README content is not valid base64.
#[derive(Debug, thiserror::Error)]
#[error("README content is not valid base64: {0}")]
pub struct DecodeError(#[from] base64::DecodeError);

/// Decodes the `content` field of a README response into Markdown text.
pub fn decode_content(readme: &Readme) -> Result<String, DecodeError> {
    match readme.encoding.as_deref() {
        // Some endpoints hand back the text as is
        Some(encoding) if !encoding.eq_ignore_ascii_case("base64") => Ok(readme.content.clone()),
        _ => decode_base64(&readme.content),
    }
}

fn decode_base64(content: &str) -> Result<String, DecodeError> {
    let compact: String = content.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD.decode(compact.as_bytes())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Converts Markdown into plain text suitable for speech synthesis.
///
/// Block elements (paragraphs, headings, list items, code blocks) end with a
/// line break; image alt text and link URLs are dropped, link text is kept.
///
/// Example:
///   "# Title\n\nSee [docs](https://x.io)." -> "Title\nSee docs."
pub fn markdown_to_speech_text(markdown: &str) -> String {
    let mut out = String::new();

    // Alt text of images is emitted as Text events nested inside the image
    // tag; a browser does not show it, so neither do we.
    let mut image_depth = 0usize;

    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::Image(..)) => image_depth += 1,
            Event::End(Tag::Image(..)) => image_depth = image_depth.saturating_sub(1),

            Event::Text(text) | Event::Code(text) if image_depth == 0 => out.push_str(&text),

            Event::Html(html) if image_depth == 0 => out.push_str(&strip_html(&html)),

            Event::SoftBreak => out.push(' '),
            Event::HardBreak => out.push('\n'),

            Event::End(
                Tag::Paragraph
                | Tag::Heading(..)
                | Tag::Item
                | Tag::CodeBlock(_)
                | Tag::BlockQuote
                | Tag::TableRow
                | Tag::TableHead,
            ) => out.push('\n'),

            Event::End(Tag::TableCell) => out.push(' '),

            _ => {}
        }
    }

    tidy_lines(&out)
}

/// Returns the text content of an HTML fragment without any tags.
pub fn strip_html(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    fragment.root_element().text().collect::<Vec<_>>().join("")
}

// Trims every line and drops the empty ones
fn tidy_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn readme(content: &str, encoding: Option<&str>) -> Readme {
        Readme {
            content: content.to_string(),
            encoding: encoding.map(str::to_string),
        }
    }

    #[test]
    fn test_decode_with_line_breaks() {
        // "# Hello\n\nWorld" split the way GitHub wraps it
        let content = "IyBIZWxsbwoK\nV29ybGQ=\n";
        let text = decode_content(&readme(content, Some("base64"))).unwrap();
        assert_eq!(text, "# Hello\n\nWorld");
    }

    #[test]
    fn test_decode_utf8() {
        // "héllo"
        let text = decode_content(&readme("aMOpbGxv", None)).unwrap();
        assert_eq!(text, "héllo");
    }

    #[test]
    fn test_decode_invalid() {
        assert!(decode_content(&readme("not base64!!", Some("base64"))).is_err());
    }

    #[test]
    fn test_plain_encoding_passthrough() {
        let text = decode_content(&readme("# Raw", Some("utf-8"))).unwrap();
        assert_eq!(text, "# Raw");
    }

    #[test]
    fn test_speech_text_keeps_link_text() {
        let text = markdown_to_speech_text("# Title\n\nSee [docs](https://x.io).");
        assert_eq!(text, "Title\nSee docs.");
    }

    #[test]
    fn test_speech_text_drops_images_and_html_tags() {
        let markdown = r#"<p align="center"><b>Fast</b> tool</p>

![logo](logo.png)

- one
- two
"#;
        let text = markdown_to_speech_text(markdown);
        assert_eq!(text, "Fast tool\none\ntwo");
    }

    #[test]
    fn test_strip_html() {
        assert_eq!(strip_html("<a href=\"x\">hi <em>there</em></a>"), "hi there");
        assert_eq!(strip_html("<img src=\"x.png\">"), "");
    }
}
