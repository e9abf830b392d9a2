// src/core/report/pdf.rs

use printpdf::{BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfLayerReference, Rgb};
use tracing::debug;

use crate::core::report::{Align, Line, LineStyle, ReportDocument, MARGIN_MM, PAGE_HEIGHT_MM, PAGE_WIDTH_MM};
use crate::error::{Result, ScanError};

const LAYER_NAME: &str = "Layer 1";
const PT_TO_MM: f32 = 0.352_778;
/// Average Helvetica advance as a fraction of the font size, used to center text.
const AVG_CHAR_WIDTH_EM: f32 = 0.5;

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
}

fn render_error(e: printpdf::Error) -> ScanError {
    ScanError::Render(e.to_string())
}

/// Serializes a laid-out report into PDF bytes.
pub fn to_pdf_bytes(document: &ReportDocument) -> Result<Vec<u8>> {
    let title = format!("Security Report for {}", document.target_url);
    let (doc, first_page, first_layer) = PdfDocument::new(title.as_str(), Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), LAYER_NAME);

    let fonts = Fonts {
        regular: doc.add_builtin_font(BuiltinFont::Helvetica).map_err(render_error)?,
        bold: doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(render_error)?,
        italic: doc.add_builtin_font(BuiltinFont::HelveticaOblique).map_err(render_error)?,
    };

    for (i, page) in document.pages.iter().enumerate() {
        let layer = if i == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_index, layer_index) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), LAYER_NAME);
            doc.get_page(page_index).get_layer(layer_index)
        };

        draw_line(&layer, &fonts, &page.header);
        for line in &page.lines {
            draw_line(&layer, &fonts, line);
        }
        draw_line(&layer, &fonts, &page.footer);
    }

    let bytes = doc.save_to_bytes().map_err(render_error)?;
    debug!(pages = document.pages.len(), bytes = bytes.len(), "PDF serialized.");
    Ok(bytes)
}

fn draw_line(layer: &PdfLayerReference, fonts: &Fonts, line: &Line) {
    if line.text.is_empty() {
        return;
    }
    let size = line.style.font_size();
    let font = match line.style {
        LineStyle::PageFooter => &fonts.italic,
        style if style.is_bold() => &fonts.bold,
        _ => &fonts.regular,
    };

    let x = match line.align {
        Align::Left => MARGIN_MM + line.indent_mm,
        Align::Center => ((PAGE_WIDTH_MM - text_width_mm(&line.text, size)) / 2.0).max(MARGIN_MM),
    };
    // PDF y grows upwards from the bottom edge; place the baseline inside the cell.
    let baseline = line.y_mm + (line.height_mm + size * PT_TO_MM * 0.7) / 2.0;
    let y = PAGE_HEIGHT_MM - baseline;

    layer.set_fill_color(color_for(line.style));
    layer.use_text(line.text.as_str(), size, Mm(x), Mm(y), font);
}

fn color_for(style: LineStyle) -> Color {
    let (r, g, b) = match style {
        LineStyle::PageHeader => (41, 128, 185),
        LineStyle::Title => (44, 62, 80),
        LineStyle::Heading => (52, 152, 219),
        _ => (0, 0, 0),
    };
    Color::Rgb(Rgb::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, None))
}

fn text_width_mm(text: &str, size_pt: f32) -> f32 {
    text.chars().count() as f32 * size_pt * AVG_CHAR_WIDTH_EM * PT_TO_MM
}
