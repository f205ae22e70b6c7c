//! Tree-walking HTML-to-Markdown conversion.
//!
//! Walks the parsed DOM and emits Markdown that preserves structure:
//! headings, emphasis, links, images, lists, code, blockquotes, and tables.
//! `script`, `style`, `nav`, `footer`, `aside`, and `header` subtrees are
//! dropped entirely.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

static MULTI_NEWLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());
static TR_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("valid selector"));

/// Conversion knobs; both default to on.
#[derive(Debug, Clone, Copy)]
pub struct ConvertOptions {
    /// Emit `[text](href)` for anchors instead of bare text.
    pub preserve_links: bool,
    /// Emit `![alt](src)` for images instead of dropping them.
    pub preserve_images: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            preserve_links: true,
            preserve_images: true,
        }
    }
}

/// Elements whose entire subtree is boilerplate, never content.
const STRIPPED_ELEMENTS: &[&str] = &["script", "style", "nav", "footer", "aside", "header"];

/// Convert an HTML string to Markdown.
pub fn html_to_markdown(html: &str, options: &ConvertOptions) -> String {
    let document = Html::parse_document(html);
    let mut out = String::new();
    walk_element(document.root_element(), &mut out, options, 0);
    let collapsed = MULTI_NEWLINE.replace_all(&out, "\n\n");
    collapsed.trim().to_string()
}

fn walk_element(element: ElementRef, out: &mut String, options: &ConvertOptions, list_depth: usize) {
    let name = element.value().name();
    if STRIPPED_ELEMENTS.contains(&name) {
        return;
    }

    match name {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = name[1..].parse::<usize>().unwrap_or(1);
            let text = collect_children(element, options, list_depth);
            out.push_str("\n\n");
            out.push_str(&"#".repeat(level));
            out.push(' ');
            out.push_str(text.trim());
            out.push_str("\n\n");
        }
        "p" => {
            let text = collect_children(element, options, list_depth);
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                out.push_str("\n\n");
                out.push_str(trimmed);
                out.push_str("\n\n");
            }
        }
        "strong" | "b" => {
            let text = collect_children(element, options, list_depth);
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                out.push_str(&format!("**{}**", trimmed));
            }
        }
        "em" | "i" => {
            let text = collect_children(element, options, list_depth);
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                out.push_str(&format!("*{}*", trimmed));
            }
        }
        "a" => {
            let text = collect_children(element, options, list_depth);
            let trimmed = text.trim().to_string();
            match element.value().attr("href") {
                Some(href) if options.preserve_links && !trimmed.is_empty() => {
                    out.push_str(&format!("[{}]({})", trimmed, href));
                }
                _ => out.push_str(&trimmed),
            }
        }
        "img" => {
            if options.preserve_images
                && let Some(src) = element.value().attr("src")
            {
                let alt = element.value().attr("alt").unwrap_or("");
                out.push_str(&format!("![{}]({})", alt, src));
            }
        }
        "ul" | "ol" => {
            out.push('\n');
            let ordered = name == "ol";
            let mut index = 1usize;
            for child in element.children() {
                if let Some(li) = ElementRef::wrap(child)
                    && li.value().name() == "li"
                {
                    let item = collect_children(li, options, list_depth + 1);
                    let item = item.trim();
                    if item.is_empty() {
                        continue;
                    }
                    let indent = "  ".repeat(list_depth);
                    if ordered {
                        out.push_str(&format!("{}{}. {}\n", indent, index, item));
                        index += 1;
                    } else {
                        out.push_str(&format!("{}- {}\n", indent, item));
                    }
                }
            }
            out.push('\n');
        }
        "pre" => {
            let text: String = element.text().collect();
            out.push_str("\n\n```\n");
            out.push_str(text.trim_end());
            out.push_str("\n```\n\n");
        }
        "code" => {
            let text: String = element.text().collect();
            out.push_str(&format!("`{}`", text.trim()));
        }
        "blockquote" => {
            let inner = collect_children(element, options, list_depth);
            out.push_str("\n\n");
            for line in inner.trim().lines() {
                out.push_str("> ");
                out.push_str(line.trim());
                out.push('\n');
            }
            out.push('\n');
        }
        "table" => {
            out.push_str(&convert_table(element, options));
        }
        "br" => out.push('\n'),
        "hr" => out.push_str("\n---\n"),
        _ => walk_children(element, out, options, list_depth),
    }
}

fn walk_children(element: ElementRef, out: &mut String, options: &ConvertOptions, list_depth: usize) {
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            walk_element(child_element, out, options, list_depth);
        } else if let Some(text) = child.value().as_text() {
            out.push_str(&collapse_inline_whitespace(text));
        }
    }
}

/// Render all children of an element into a temporary buffer.
fn collect_children(element: ElementRef, options: &ConvertOptions, list_depth: usize) -> String {
    let mut buffer = String::new();
    walk_children(element, &mut buffer, options, list_depth);
    buffer
}

fn convert_table(table: ElementRef, options: &ConvertOptions) -> String {
    let mut rows: Vec<Vec<String>> = Vec::new();
    for tr in table.select(&TR_SELECTOR) {
        let mut cells = Vec::new();
        for cell in tr.children() {
            if let Some(cell_element) = ElementRef::wrap(cell) {
                let cell_name = cell_element.value().name();
                if cell_name == "td" || cell_name == "th" {
                    let text = collect_children(cell_element, options, 0);
                    cells.push(text.trim().replace('\n', " ").replace('|', "\\|"));
                }
            }
        }
        if !cells.is_empty() {
            rows.push(cells);
        }
    }

    if rows.is_empty() {
        return String::new();
    }

    let mut out = String::from("\n\n");
    for (idx, row) in rows.iter().enumerate() {
        out.push_str("| ");
        out.push_str(&row.join(" | "));
        out.push_str(" |\n");
        if idx == 0 {
            out.push_str("| ");
            out.push_str(&vec!["---"; row.len()].join(" | "));
            out.push_str(" |\n");
        }
    }
    out.push('\n');
    out
}

/// Collapse runs of whitespace inside inline text to single spaces, keeping
/// leading/trailing presence so word boundaries survive.
fn collapse_inline_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(c);
            last_was_space = false;
        }
    }
    out
}
