//! Minimal paginated PDF rendering
//!
//! Lines are word-wrapped and laid out top to bottom on A4 pages in a
//! built-in Helvetica face; a new page starts when the current one is full.

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};
use sendcheck_core::{Error, Result};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
const LINE_HEIGHT: f32 = 5.5;
const FONT_SIZE: f32 = 10.0;
const TITLE_SIZE: f32 = 14.0;

/// Characters per line for the body font at the page's text width
pub const WRAP_WIDTH: usize = 90;

/// Lines that fit between the top and bottom margins
pub const LINES_PER_PAGE: usize = ((PAGE_HEIGHT - 2.0 * MARGIN) / LINE_HEIGHT) as usize;

/// Render `lines` into PDF bytes; the first line is set as a heading
pub fn render(title: &str, lines: &[String]) -> Result<Vec<u8>> {
    let (doc, page, layer) =
        PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(pdf_error)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(pdf_error)?;

    let wrapped = wrap_lines(lines);
    let pages = paginate(&wrapped);
    let mut current = doc.get_page(page).get_layer(layer);

    for (page_idx, page_lines) in pages.iter().enumerate() {
        if page_idx > 0 {
            let (page, layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            current = doc.get_page(page).get_layer(layer);
        }
        write_page(&current, page_lines, page_idx == 0, &font, &bold);
    }

    tracing::debug!(pages = pages.len(), lines = wrapped.len(), "Rendered PDF report");
    doc.save_to_bytes().map_err(pdf_error)
}

fn write_page(
    layer: &PdfLayerReference,
    lines: &[String],
    first_page: bool,
    font: &IndirectFontRef,
    bold: &IndirectFontRef,
) {
    let mut y = PAGE_HEIGHT - MARGIN;
    for (i, line) in lines.iter().enumerate() {
        if first_page && i == 0 {
            layer.use_text(pdf_safe(line), TITLE_SIZE, Mm(MARGIN), Mm(y), bold);
        } else {
            layer.use_text(pdf_safe(line), FONT_SIZE, Mm(MARGIN), Mm(y), font);
        }
        y -= LINE_HEIGHT;
    }
}

fn pdf_error(e: printpdf::Error) -> Error {
    Error::internal(format!("PDF rendering failed: {}", e))
}

/// Built-in fonts only cover Latin-1
fn pdf_safe(line: &str) -> String {
    line.chars()
        .map(|c| if (c as u32) <= 0xff { c } else { '?' })
        .collect()
}

/// Word-wrap every line to [`WRAP_WIDTH`] characters
pub fn wrap_lines(lines: &[String]) -> Vec<String> {
    lines.iter().flat_map(|line| wrap(line, WRAP_WIDTH)).collect()
}

fn wrap(line: &str, width: usize) -> Vec<String> {
    if line.chars().count() <= width {
        return vec![line.to_string()];
    }

    let mut out = Vec::new();
    let mut current = String::new();
    for word in line.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        // hard-split words longer than a line
        while word.len() > width {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            out.push(word.drain(..width).collect());
        }
        let word: String = word.into_iter().collect();
        if word.is_empty() {
            continue;
        }

        let separator = usize::from(!current.is_empty());
        let needed = separator + word.chars().count();
        if current.chars().count() + needed > width {
            out.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// Split wrapped lines into page-sized chunks (always at least one page)
pub fn paginate(lines: &[String]) -> Vec<Vec<String>> {
    if lines.is_empty() {
        return vec![Vec::new()];
    }
    lines.chunks(LINES_PER_PAGE).map(<[String]>::to_vec).collect()
}
