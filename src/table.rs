// Table/Figure Handler — table rendering, splitting with header repeat,
// and caption attachment for figures. See spec.md §4.5.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::model::Cell;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableFormat {
    Plaintext,
    Markdown,
    Csv,
    Html,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    pub max_rows_per_chunk: usize,
    pub repeat_header: bool,
    pub format: TableFormat,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            max_rows_per_chunk: 50,
            repeat_header: true,
            format: TableFormat::Markdown,
        }
    }
}

static TABLE_CAPTION_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(table|tbl|tab)\.?\b\s*\d*[:.]?\s*").unwrap());
static TABLE_KEYWORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\btable\b").unwrap());
static FIGURE_CAPTION_PREFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(figure|fig|image|img|diagram|illustration|chart|graph|plot)\.?\b\s*\d*[:.]?\s*").unwrap()
});
static FIGURE_KEYWORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bfig(?:ure)?\b").unwrap());

/// Whether `text` reads as a table caption (`"Table 1: ..."`, `"Tab. 2"`, or
/// any mention of the word "table" alongside a digit, per spec §4.4).
pub fn is_table_caption(text: &str) -> bool {
    let trimmed = text.trim();
    TABLE_CAPTION_PREFIX_RE.is_match(trimmed)
        || (TABLE_KEYWORD_RE.is_match(trimmed) && trimmed.chars().any(|c| c.is_ascii_digit()))
}

/// Whether `text` reads as a figure caption (`"Figure 2: ..."`, `"Diagram
/// 1"`, `"Chart of results"`, or any mention of "figure"/"fig" alongside a
/// digit, per spec §4.4).
pub fn is_figure_caption(text: &str) -> bool {
    let trimmed = text.trim();
    FIGURE_CAPTION_PREFIX_RE.is_match(trimmed)
        || (FIGURE_KEYWORD_RE.is_match(trimmed) && trimmed.chars().any(|c| c.is_ascii_digit()))
}

/// Render a table to the given format. `header_row` is the index of the
/// header row inside `rows`, if any.
pub fn render_table(rows: &[Vec<Cell>], header_row: Option<usize>, format: TableFormat) -> String {
    match format {
        TableFormat::Plaintext => render_plaintext(rows),
        TableFormat::Markdown => render_markdown(rows, header_row),
        TableFormat::Csv => render_csv(rows),
        TableFormat::Html => render_html(rows, header_row),
    }
}

fn render_plaintext(rows: &[Vec<Cell>]) -> String {
    rows.iter()
        .map(|row| {
            row.iter()
                .map(|c| c.text.as_str())
                .collect::<Vec<_>>()
                .join("\t")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_markdown(rows: &[Vec<Cell>], header_row: Option<usize>) -> String {
    if rows.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    let col_count = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    let header_idx = header_row.unwrap_or(0);

    for (i, row) in rows.iter().enumerate() {
        out.push('|');
        for cell in row {
            out.push(' ');
            out.push_str(&cell.text.replace('|', "\\|"));
            out.push_str(" |");
        }
        for _ in row.len()..col_count {
            out.push_str("  |");
        }
        out.push('\n');
        if i == header_idx {
            out.push('|');
            for _ in 0..col_count {
                out.push_str(" --- |");
            }
            out.push('\n');
        }
    }
    out.trim_end().to_string()
}

fn render_csv(rows: &[Vec<Cell>]) -> String {
    rows.iter()
        .map(|row| {
            row.iter()
                .map(|c| csv_escape(&c.text))
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn csv_escape(text: &str) -> String {
    if text.contains(',') || text.contains('"') || text.contains('\n') {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}

fn render_html(rows: &[Vec<Cell>], header_row: Option<usize>) -> String {
    let mut out = String::from("<table>\n");
    for (i, row) in rows.iter().enumerate() {
        out.push_str("  <tr>");
        let is_header = header_row == Some(i) || row.iter().all(|c| c.is_header);
        let tag = if is_header { "th" } else { "td" };
        for cell in row {
            out.push_str(&format!(
                "<{tag} rowspan=\"{}\" colspan=\"{}\">{}</{tag}>",
                cell.row_span,
                cell.col_span,
                html_escape(&cell.text)
            ));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</table>");
    out
}

/// Escape `& < > "` for table cells embedded in HTML output (spec §4.4).
fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Short one-line summary: dimensions, plus up to 5 header column names
/// (`"Columns: A, B"`); more than 5 columns summarize as `"Columns include:
/// A, B, C, D, E, …"` (spec §4.4).
pub fn summarize_table(rows: &[Vec<Cell>], header_row: Option<usize>) -> String {
    let row_count = rows.len();
    let col_count = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    let base = format!("Table with {row_count} rows and {col_count} columns");
    match header_row.and_then(|idx| rows.get(idx)) {
        Some(header) if !header.is_empty() => {
            if header.len() <= 5 {
                let names = header.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join(", ");
                format!("{base}. Columns: {names}")
            } else {
                let names = header.iter().take(5).map(|c| c.text.as_str()).collect::<Vec<_>>().join(", ");
                format!("{base}. Columns include: {names}, …")
            }
        }
        _ => base,
    }
}

/// Format tag for an image format, per spec §4.4 (`[PNG image]`, `[JPEG
/// image]`, … or `[Image]` when the format is unknown/empty).
fn format_tag(format: &str) -> String {
    let trimmed = format.trim();
    if trimmed.is_empty() {
        "[Image]".to_string()
    } else {
        format!("[{} image]", trimmed.to_uppercase())
    }
}

/// Build a figure description by concatenating caption, alt text (if
/// distinct from the caption), and a format tag with `" - "` separators.
/// Returns `None` when there is neither a caption nor alt text to describe.
pub fn describe_figure(caption: Option<&str>, alt_text: Option<&str>, format: Option<&str>) -> Option<String> {
    let caption = caption.map(str::trim).filter(|s| !s.is_empty());
    let alt_text = alt_text.map(str::trim).filter(|s| !s.is_empty());

    if caption.is_none() && alt_text.is_none() {
        return None;
    }

    let mut parts: Vec<String> = Vec::new();
    if let Some(cap) = caption {
        parts.push(cap.to_string());
    }
    if let Some(alt) = alt_text {
        if caption != Some(alt) {
            parts.push(alt.to_string());
        }
    }
    if let Some(fmt) = format {
        parts.push(format_tag(fmt));
    }
    Some(parts.join(" - "))
}

/// Split a table into row groups no larger than `max_rows_per_chunk`,
/// repeating the header row at the top of every group after the first when
/// `repeat_header` is set.
pub fn split_table(rows: &[Vec<Cell>], header_row: Option<usize>, config: &TableConfig) -> Vec<Vec<Vec<Cell>>> {
    if rows.len() <= config.max_rows_per_chunk {
        return vec![rows.to_vec()];
    }

    let header = header_row.and_then(|idx| rows.get(idx)).cloned();
    let body_start = if header_row == Some(0) { 1 } else { 0 };
    let body = &rows[body_start..];

    let mut groups = Vec::new();
    for (i, chunk) in body.chunks(config.max_rows_per_chunk.max(1)).enumerate() {
        let mut group = Vec::new();
        if i > 0 {
            if let (true, Some(h)) = (config.repeat_header, &header) {
                group.push(h.clone());
            }
        } else if let Some(h) = &header {
            if header_row == Some(0) {
                group.push(h.clone());
            }
        }
        group.extend_from_slice(chunk);
        groups.push(group);
    }
    groups
}
