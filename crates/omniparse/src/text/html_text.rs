//! Streaming HTML-to-plain-text extraction.
//!
//! Used by the EPUB pipeline to flatten XHTML spine items into text while
//! preserving document structure: block elements become newlines, list items
//! become bullets, table cells are space-separated. Script and style content
//! is dropped entirely. Malformed markup is tolerated; on a reader error the
//! text accumulated so far is returned.

use once_cell::sync::Lazy;
use quick_xml::Reader;
use quick_xml::events::Event;
use regex::Regex;

static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r" +").unwrap());
static MULTI_NEWLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());
static NUMERIC_ENTITY: Lazy<Regex> = Lazy::new(|| Regex::new(r"&#(x?[0-9a-fA-F]+);").unwrap());

/// Extract clean plain text from an HTML string.
pub fn extract_text(html: &str) -> String {
    let mut reader = Reader::from_str(html);
    reader.config_mut().check_end_names = false;

    let mut parts: Vec<String> = Vec::new();
    let mut ignore_content = false;
    let mut in_list_item = false;
    let mut li_has_content = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.name().as_ref().to_ascii_lowercase();
                match name.as_slice() {
                    b"script" | b"style" => ignore_content = true,
                    b"br" => parts.push("\n".to_string()),
                    b"hr" => parts.push("\n---\n\n".to_string()),
                    b"li" => {
                        in_list_item = true;
                        li_has_content = false;
                        parts.push("\u{2022} ".to_string());
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => {
                let name = e.name().as_ref().to_ascii_lowercase();
                match name.as_slice() {
                    b"br" => parts.push("\n".to_string()),
                    b"hr" => parts.push("\n---\n\n".to_string()),
                    _ => {}
                }
            }
            Ok(Event::End(e)) => {
                let name = e.name().as_ref().to_ascii_lowercase();
                match name.as_slice() {
                    b"script" | b"style" => ignore_content = false,
                    b"p" | b"h1" | b"h2" | b"h3" | b"h4" | b"h5" | b"h6" => {
                        parts.push("\n\n".to_string());
                    }
                    b"li" => {
                        in_list_item = false;
                        // Drop the bullet if the item turned out empty.
                        if !li_has_content && parts.last().map(String::as_str) == Some("\u{2022} ")
                        {
                            parts.pop();
                        } else {
                            parts.push("\n".to_string());
                        }
                    }
                    b"div" => parts.push("\n".to_string()),
                    b"tr" => parts.push("\n".to_string()),
                    b"td" | b"th" => parts.push(" ".to_string()),
                    _ => {}
                }
            }
            Ok(Event::Text(e)) => {
                if !ignore_content {
                    let raw = String::from_utf8_lossy(e.as_ref()).into_owned();
                    let text = decode_entities(&raw);
                    if in_list_item && !text.trim().is_empty() {
                        li_has_content = true;
                    }
                    parts.push(text);
                }
            }
            Ok(Event::CData(e)) => {
                if !ignore_content {
                    parts.push(String::from_utf8_lossy(&e).into_owned());
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if !ignore_content {
                    let name = String::from_utf8_lossy(&e).into_owned();
                    let resolved = decode_entities(&format!("&{};", name));
                    if in_list_item && !resolved.trim().is_empty() {
                        li_has_content = true;
                    }
                    parts.push(resolved);
                }
            }
            Ok(Event::Eof) => break,
            // Malformed HTML: keep what we have.
            Err(_) => break,
            _ => {}
        }
    }

    normalize_whitespace(&parts.concat())
}

/// Decode the HTML entities that actually show up in book content.
pub fn decode_entities(text: &str) -> String {
    let mut out = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&mdash;", "\u{2014}")
        .replace("&ndash;", "\u{2013}")
        .replace("&hellip;", "\u{2026}")
        .replace("&copy;", "\u{00a9}");

    if NUMERIC_ENTITY.is_match(&out) {
        out = NUMERIC_ENTITY
            .replace_all(&out, |caps: &regex::Captures| {
                let body = &caps[1];
                let code = if let Some(hex) = body.strip_prefix('x').or_else(|| body.strip_prefix('X')) {
                    u32::from_str_radix(hex, 16).ok()
                } else {
                    body.parse::<u32>().ok()
                };
                code.and_then(char::from_u32)
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned();
    }

    // `&amp;` last so freshly produced ampersands are not re-expanded.
    out.replace("&amp;", "&")
}

/// Per-line trim, space collapse, and paragraph-break preservation.
fn normalize_whitespace(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').map(str::trim).collect();
    let joined = lines.join("\n");
    let collapsed = MULTI_SPACE.replace_all(&joined, " ");
    let collapsed = MULTI_NEWLINE.replace_all(&collapsed, "\n\n");
    collapsed.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_tags_flattened() {
        assert_eq!(extract_text("<p>Hello <b>world</b>!</p>"), "Hello world!");
    }

    #[test]
    fn test_block_structure_preserved() {
        let html = "<h1>Title</h1><p>Paragraph 1</p><p>Paragraph 2</p>";
        assert_eq!(extract_text(html), "Title\n\nParagraph 1\n\nParagraph 2");
    }

    #[test]
    fn test_script_and_style_dropped() {
        let html = "<p>Keep</p><script>var x = 1;</script><style>p{}</style><p>Also</p>";
        assert_eq!(extract_text(html), "Keep\n\nAlso");
    }

    #[test]
    fn test_list_items_become_bullets() {
        let html = "<ul><li>One</li><li>Two</li></ul>";
        let text = extract_text(html);
        assert!(text.contains("\u{2022} One"));
        assert!(text.contains("\u{2022} Two"));
    }

    #[test]
    fn test_empty_list_item_bullet_suppressed() {
        let html = "<ul><li>One</li><li></li></ul>";
        let text = extract_text(html);
        assert_eq!(text.matches('\u{2022}').count(), 1);
    }

    #[test]
    fn test_table_cells_spaced_rows_newlined() {
        let html = "<table><tr><td>a</td><td>b</td></tr><tr><td>c</td><td>d</td></tr></table>";
        let text = extract_text(html);
        assert!(text.contains("a b"));
        assert!(text.contains("c d"));
    }

    #[test]
    fn test_entities_decoded() {
        assert_eq!(extract_text("<p>Fish &amp; chips &#233;</p>"), "Fish & chips \u{e9}");
    }

    #[test]
    fn test_br_and_hr() {
        let text = extract_text("<p>a<br/>b</p><hr/><p>c</p>");
        assert!(text.contains("a\nb"));
        assert!(text.contains("---"));
    }

    #[test]
    fn test_whitespace_collapsed() {
        assert_eq!(
            extract_text("<p>Hello   <em>beautiful</em>   world!</p>"),
            "Hello beautiful world!"
        );
    }
}
