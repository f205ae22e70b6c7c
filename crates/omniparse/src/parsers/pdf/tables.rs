//! Table extraction from PDF character geometry.
//!
//! Characters are grouped into words, words into lines by baseline, and
//! lines into column cells by horizontal gaps. Runs of consecutive lines
//! sharing a column count of at least two become a table. Tables with fewer
//! than two rows are dropped. Output is Markdown pipe tables, collected by
//! the pipeline under a closing `## Extracted Tables` section.

use pdfium_render::prelude::*;
use tracing::debug;

/// Vertical tolerance (points) for grouping characters into one line.
const LINE_TOLERANCE: f32 = 3.0;
/// Horizontal gap (multiples of average char width) that splits columns.
const COLUMN_GAP_FACTOR: f32 = 3.0;

/// A table found on a page, as rows of cell strings.
#[derive(Debug, Clone, PartialEq)]
pub struct PageTable {
    pub page: usize,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone)]
struct PlacedChar {
    ch: char,
    x: f32,
    y: f32,
    width: f32,
}

/// Extract candidate tables from one page.
pub fn extract_page_tables(page: &PdfPage, page_number: usize) -> Vec<PageTable> {
    let Ok(text) = page.text() else {
        return Vec::new();
    };

    let mut chars: Vec<PlacedChar> = Vec::new();
    for pdf_char in text.chars().iter() {
        let Ok(bounds) = pdf_char.loose_bounds() else {
            continue;
        };
        let Some(ch) = pdf_char.unicode_char() else {
            continue;
        };
        chars.push(PlacedChar {
            ch,
            x: bounds.left().value,
            y: bounds.bottom().value,
            width: (bounds.right().value - bounds.left().value).abs(),
        });
    }
    if chars.is_empty() {
        return Vec::new();
    }

    let average_width = {
        let widths: Vec<f32> = chars.iter().map(|c| c.width).filter(|w| *w > 0.0).collect();
        if widths.is_empty() {
            4.0
        } else {
            widths.iter().sum::<f32>() / widths.len() as f32
        }
    };

    // Group characters into lines by baseline (top of page first).
    chars.sort_by(|a, b| {
        b.y.partial_cmp(&a.y)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
    });
    let mut lines: Vec<Vec<PlacedChar>> = Vec::new();
    for c in chars {
        match lines.last_mut() {
            Some(line) if (line[0].y - c.y).abs() <= LINE_TOLERANCE => line.push(c),
            _ => lines.push(vec![c]),
        }
    }

    // Split each line into cells at large horizontal gaps.
    let gap = average_width * COLUMN_GAP_FACTOR;
    let cells_per_line: Vec<Vec<String>> = lines
        .iter()
        .map(|line| split_line_into_cells(line, gap))
        .collect();

    // Consecutive multi-cell lines form a table candidate.
    let mut tables = Vec::new();
    let mut current: Vec<Vec<String>> = Vec::new();
    for cells in cells_per_line {
        if cells.len() >= 2 {
            current.push(cells);
        } else {
            flush_table(&mut current, page_number, &mut tables);
        }
    }
    flush_table(&mut current, page_number, &mut tables);

    debug!(page = page_number, tables = tables.len(), "Table scan");
    tables
}

fn flush_table(current: &mut Vec<Vec<String>>, page: usize, tables: &mut Vec<PageTable>) {
    // Tables with fewer than 2 rows are noise.
    if current.len() >= 2 {
        tables.push(PageTable {
            page,
            rows: std::mem::take(current),
        });
    } else {
        current.clear();
    }
}

fn split_line_into_cells(line: &[PlacedChar], gap: f32) -> Vec<String> {
    let mut sorted: Vec<&PlacedChar> = line.iter().collect();
    sorted.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));

    let mut cells: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut last_right: Option<f32> = None;

    for c in sorted {
        if let Some(right) = last_right
            && c.x - right > gap
            && !current.trim().is_empty()
        {
            cells.push(current.trim().to_string());
            current = String::new();
        }
        current.push(c.ch);
        last_right = Some(c.x + c.width);
    }
    if !current.trim().is_empty() {
        cells.push(current.trim().to_string());
    }
    cells
}

/// Render tables as a Markdown section appended to the document content.
pub fn render_tables_section(tables: &[PageTable]) -> Option<String> {
    if tables.is_empty() {
        return None;
    }

    let mut out = String::from("## Extracted Tables\n");
    for table in tables {
        out.push_str(&format!("\n**Table from page {}**\n\n", table.page));
        let column_count = table.rows.iter().map(Vec::len).max().unwrap_or(0);
        for (idx, row) in table.rows.iter().enumerate() {
            let mut cells: Vec<String> = row
                .iter()
                .map(|cell| cell.replace('\n', " ").replace('|', "\\|"))
                .collect();
            cells.resize(column_count, String::new());
            out.push_str(&format!("| {} |\n", cells.join(" | ")));
            if idx == 0 {
                out.push_str(&format!("| {} |\n", vec!["---"; column_count].join(" | ")));
            }
        }
    }
    Some(out.trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_tables_section() {
        let tables = vec![PageTable {
            page: 3,
            rows: vec![
                vec!["Name".to_string(), "Qty".to_string()],
                vec!["Bolt".to_string(), "12".to_string()],
            ],
        }];
        let section = render_tables_section(&tables).unwrap();
        assert!(section.starts_with("## Extracted Tables"));
        assert!(section.contains("**Table from page 3**"));
        assert!(section.contains("| Name | Qty |"));
        assert!(section.contains("| --- | --- |"));
        assert!(section.contains("| Bolt | 12 |"));
    }

    #[test]
    fn test_pipes_escaped_and_rows_padded() {
        let tables = vec![PageTable {
            page: 1,
            rows: vec![
                vec!["a|b".to_string(), "c".to_string()],
                vec!["only".to_string()],
            ],
        }];
        let section = render_tables_section(&tables).unwrap();
        assert!(section.contains("a\\|b"));
        assert!(section.contains("| only |  |"));
    }

    #[test]
    fn test_no_tables_no_section() {
        assert!(render_tables_section(&[]).is_none());
    }
}
