//! Document-order traversal of the DOCX body, emitting Markdown.
//!
//! Paragraph styles `Heading 1`..`Heading 6` become ATX headings; runs carry
//! bold/italic emphasis; tables become pipe tables with a separator after the
//! first row; numbered and bulleted paragraphs become list items; hyperlinks
//! resolve through the document relationship table.

use once_cell::sync::Lazy;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use regex::Regex;
use std::collections::HashMap;
use tracing::debug;

static HEADING_STYLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)heading\s*(\d+)").unwrap());
static MULTI_NEWLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Feature switches for the body walk.
#[derive(Debug, Clone, Copy)]
pub struct ContentOptions {
    pub extract_tables: bool,
    pub extract_lists: bool,
    pub extract_hyperlinks: bool,
}

/// One text run with its formatting.
#[derive(Debug, Default)]
struct Run {
    bold: bool,
    italic: bool,
    text: String,
}

impl Run {
    fn render(&self) -> String {
        let text = self.text.as_str();
        if text.is_empty() {
            return String::new();
        }
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return text.to_string();
        }
        match (self.bold, self.italic) {
            (true, true) => format!("***{}***", text),
            (true, false) => format!("**{}**", text),
            (false, true) => format!("*{}*", text),
            (false, false) => text.to_string(),
        }
    }
}

/// Paragraph state while walking.
#[derive(Debug, Default)]
struct Paragraph {
    style: Option<String>,
    in_list: bool,
    num_id: Option<String>,
    text: String,
}

/// Walk `word/document.xml` and emit Markdown.
///
/// `relationships` maps relationship ids to targets (for hyperlinks);
/// `ordered_lists` maps numbering ids to "is decimal" (from
/// `word/numbering.xml`).
pub fn extract_content(
    document_xml: &str,
    relationships: &HashMap<String, String>,
    ordered_lists: &HashMap<String, bool>,
    options: &ContentOptions,
) -> String {
    let mut reader = Reader::from_str(document_xml);
    reader.config_mut().check_end_names = false;

    let mut blocks: Vec<String> = Vec::new();

    // Current paragraph/run state.
    let mut paragraph: Option<Paragraph> = None;
    let mut run: Option<Run> = None;
    let mut in_text = false;
    let mut in_run_properties = false;

    // Hyperlink state: target plus where in the paragraph text it started.
    let mut hyperlink: Option<(String, usize)> = None;

    // Table state.
    let mut table_depth = 0usize;
    let mut table_rows: Vec<Vec<String>> = Vec::new();
    let mut current_row: Vec<String> = Vec::new();
    let mut current_cell = String::new();

    // Per-numId counters for ordered lists.
    let mut list_counters: HashMap<String, usize> = HashMap::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                let name = local_name(&e);
                match name.as_str() {
                    "p" => paragraph = Some(Paragraph::default()),
                    "pStyle" => {
                        if let Some(paragraph) = paragraph.as_mut() {
                            paragraph.style = attr_value(&e, "val");
                        }
                    }
                    "numPr" => {
                        if let Some(paragraph) = paragraph.as_mut() {
                            paragraph.in_list = true;
                        }
                    }
                    "numId" => {
                        if let Some(paragraph) = paragraph.as_mut() {
                            paragraph.num_id = attr_value(&e, "val");
                        }
                    }
                    "rPr" => in_run_properties = true,
                    "r" => {
                        run = Some(Run::default());
                        in_run_properties = false;
                    }
                    "b" if in_run_properties => {
                        if let Some(run) = run.as_mut() {
                            run.bold = toggle_on(&e);
                        }
                    }
                    "i" if in_run_properties => {
                        if let Some(run) = run.as_mut() {
                            run.italic = toggle_on(&e);
                        }
                    }
                    "t" => in_text = true,
                    "br" => {
                        if let Some(run) = run.as_mut() {
                            run.text.push('\n');
                        }
                    }
                    "hyperlink" => {
                        if options.extract_hyperlinks
                            && let Some(id) = attr_value(&e, "id")
                            && let Some(target) = relationships.get(&id)
                            && let Some(paragraph) = paragraph.as_ref()
                        {
                            hyperlink = Some((target.clone(), paragraph.text.len()));
                        }
                    }
                    "tbl" => {
                        table_depth += 1;
                        if table_depth == 1 {
                            table_rows.clear();
                        }
                    }
                    "tr" if table_depth == 1 => current_row = Vec::new(),
                    "tc" if table_depth == 1 => current_cell = String::new(),
                    _ => {}
                }
            }
            Ok(Event::Text(e)) => {
                if in_text
                    && let Some(run) = run.as_mut()
                {
                    run.text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::End(e)) => {
                let name = local_name_end(e.name().as_ref());
                match name.as_str() {
                    "t" => in_text = false,
                    "rPr" => in_run_properties = false,
                    "r" => {
                        if let Some(run) = run.take()
                            && let Some(paragraph) = paragraph.as_mut()
                        {
                            paragraph.text.push_str(&run.render());
                        }
                    }
                    "hyperlink" => {
                        if let Some((target, start)) = hyperlink.take()
                            && let Some(paragraph) = paragraph.as_mut()
                        {
                            let link_text = paragraph.text[start..].trim().to_string();
                            if !link_text.is_empty() {
                                paragraph.text.truncate(start);
                                paragraph
                                    .text
                                    .push_str(&format!("[{}]({})", link_text, target));
                            }
                        }
                    }
                    "p" => {
                        if let Some(done) = paragraph.take() {
                            let rendered =
                                render_paragraph(done, ordered_lists, &mut list_counters, options);
                            if table_depth > 0 {
                                if !rendered.is_empty() {
                                    if !current_cell.is_empty() {
                                        current_cell.push(' ');
                                    }
                                    current_cell.push_str(&rendered);
                                }
                            } else if !rendered.is_empty() {
                                blocks.push(rendered);
                            }
                        }
                    }
                    "tc" if table_depth == 1 => {
                        current_row.push(
                            current_cell.replace('\n', " ").replace('|', "\\|").trim().to_string(),
                        );
                        current_cell = String::new();
                    }
                    "tr" if table_depth == 1 => {
                        if !current_row.is_empty() {
                            table_rows.push(std::mem::take(&mut current_row));
                        }
                    }
                    "tbl" => {
                        table_depth = table_depth.saturating_sub(1);
                        if table_depth == 0 && options.extract_tables && !table_rows.is_empty() {
                            blocks.push(render_table(&table_rows));
                            table_rows.clear();
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                debug!("DOCX body parse stopped early: {}", e);
                break;
            }
            _ => {}
        }
    }

    let joined = blocks.join("\n\n");
    MULTI_NEWLINE.replace_all(&joined, "\n\n").trim().to_string()
}

fn render_paragraph(
    paragraph: Paragraph,
    ordered_lists: &HashMap<String, bool>,
    list_counters: &mut HashMap<String, usize>,
    options: &ContentOptions,
) -> String {
    let text = paragraph.text.trim().to_string();
    if text.is_empty() {
        return String::new();
    }

    if let Some(style) = &paragraph.style
        && let Some(caps) = HEADING_STYLE.captures(style)
    {
        let level: usize = caps[1].parse().unwrap_or(1);
        let level = level.clamp(1, 6);
        // Heading text stripped of run emphasis; the marks carry the level.
        let clean = text.replace("***", "").replace("**", "").replace('*', "");
        return format!("{} {}", "#".repeat(level), clean.trim());
    }

    if paragraph.in_list && options.extract_lists {
        let ordered = paragraph
            .num_id
            .as_ref()
            .and_then(|id| ordered_lists.get(id))
            .copied()
            .unwrap_or(false);
        if ordered {
            let key = paragraph.num_id.clone().unwrap_or_default();
            let counter = list_counters.entry(key).or_insert(0);
            *counter += 1;
            return format!("{}. {}", counter, text);
        }
        return format!("- {}", text);
    }

    text
}

fn render_table(rows: &[Vec<String>]) -> String {
    let mut out = String::new();
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
    out.trim_end().to_string()
}

/// Local name without the namespace prefix.
fn local_name(e: &BytesStart) -> String {
    local_name_end(e.name().as_ref())
}

fn local_name_end(raw: &[u8]) -> String {
    let raw = String::from_utf8_lossy(raw);
    raw.rsplit(':').next().unwrap_or(&raw).to_string()
}

/// Attribute value by local name (`w:val` or `val`).
fn attr_value(e: &BytesStart, name: &str) -> Option<String> {
    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let local = key.rsplit(':').next().unwrap_or(&key);
        if local == name {
            return Some(String::from_utf8_lossy(&attr.value).into_owned());
        }
    }
    None
}

/// `<w:b/>` means on; `<w:b w:val="false"/>` or `w:val="0"` means off.
fn toggle_on(e: &BytesStart) -> bool {
    match attr_value(e, "val") {
        Some(value) => !matches!(value.as_str(), "false" | "0" | "none"),
        None => true,
    }
}

/// Parse `word/_rels/document.xml.rels` into id → target.
pub fn parse_relationships(rels_xml: &str) -> HashMap<String, String> {
    let mut reader = Reader::from_str(rels_xml);
    reader.config_mut().check_end_names = false;
    let mut map = HashMap::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                if local_name(&e) == "Relationship"
                    && let Some(id) = attr_value(&e, "Id")
                    && let Some(target) = attr_value(&e, "Target")
                {
                    map.insert(id, target);
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }
    map
}

/// Relationship id → target, filtered to image targets only.
pub fn parse_image_relationships(rels_xml: &str) -> Vec<(String, String)> {
    let mut reader = Reader::from_str(rels_xml);
    reader.config_mut().check_end_names = false;
    let mut images = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                if local_name(&e) == "Relationship"
                    && let Some(id) = attr_value(&e, "Id")
                    && let Some(target) = attr_value(&e, "Target")
                    && let Some(rel_type) = attr_value(&e, "Type")
                    && (rel_type.contains("image") || target.contains("image"))
                {
                    images.push((id, target));
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }
    images.sort_by(|a, b| a.1.cmp(&b.1));
    images
}

/// Parse `word/numbering.xml` into numId → "is ordered".
pub fn parse_numbering(numbering_xml: &str) -> HashMap<String, bool> {
    let mut reader = Reader::from_str(numbering_xml);
    reader.config_mut().check_end_names = false;

    // First pass state: abstractNumId → ordered, collected as we stream.
    let mut abstract_ordered: HashMap<String, bool> = HashMap::new();
    let mut num_to_abstract: HashMap<String, String> = HashMap::new();

    let mut current_abstract: Option<String> = None;
    let mut current_num: Option<String> = None;
    let mut in_first_level = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match local_name(&e).as_str() {
                "abstractNum" => current_abstract = attr_value(&e, "abstractNumId"),
                "lvl" => {
                    in_first_level = attr_value(&e, "ilvl").as_deref() == Some("0");
                }
                "numFmt" => {
                    if in_first_level
                        && let Some(id) = current_abstract.clone()
                    {
                        let ordered = !matches!(
                            attr_value(&e, "val").as_deref(),
                            Some("bullet") | Some("none")
                        );
                        abstract_ordered.entry(id).or_insert(ordered);
                    }
                }
                "num" => current_num = attr_value(&e, "numId"),
                "abstractNumId" => {
                    if let Some(num) = current_num.clone()
                        && let Some(abstract_id) = attr_value(&e, "val")
                    {
                        num_to_abstract.insert(num, abstract_id);
                    }
                }
                _ => {}
            },
            Ok(Event::End(e)) => match local_name_end(e.name().as_ref()).as_str() {
                "abstractNum" => current_abstract = None,
                "num" => current_num = None,
                "lvl" => in_first_level = false,
                _ => {}
            },
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }

    num_to_abstract
        .into_iter()
        .filter_map(|(num, abstract_id)| {
            abstract_ordered
                .get(&abstract_id)
                .map(|ordered| (num, *ordered))
        })
        .collect()
}
