//! PDF export of a saved report
//!
//! A4 portrait, builtin Helvetica. Color rows carry a filled swatch next to
//! the hex code. Content flows onto new pages as needed.

use colori_common::analysis::{HexColor, MakeupProduct};
use colori_common::db::StoredReport;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
    Rect, Rgb,
};
use std::io::BufWriter;
use thiserror::Error;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const TOP: f32 = 280.0;
const BOTTOM: f32 = 20.0;
const LEFT: f32 = 20.0;
const INDENT: f32 = 25.0;
const LINE: f32 = 5.0;
const WRAP_CHARS: usize = 90;

#[derive(Debug, Error)]
pub enum ReportPdfError {
    #[error("PDF font error: {0}")]
    Font(String),

    #[error("PDF save error: {0}")]
    Save(String),
}

/// Cursor over the current page; starts a new page when space runs out
struct PageWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    font: IndirectFontRef,
    bold: IndirectFontRef,
    y: f32,
    pages: usize,
}

impl PageWriter {
    /// Builtin fonts only cover the WinAnsi character set; text outside it
    /// goes through [`winansi_text`] before it reaches the page.
    fn new(title: &str) -> Result<Self, ReportPdfError> {
        let (doc, page1, layer1) = PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let layer = doc.get_page(page1).get_layer(layer1);
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| ReportPdfError::Font(e.to_string()))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| ReportPdfError::Font(e.to_string()))?;

        Ok(Self {
            doc,
            layer,
            font,
            bold,
            y: TOP,
            pages: 1,
        })
    }

    fn ensure_space(&mut self, height: f32) {
        if self.y - height >= BOTTOM {
            return;
        }
        let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = TOP;
        self.pages += 1;
    }

    fn gap(&mut self, height: f32) {
        self.y -= height;
    }

    fn text(&mut self, text: &str, size: f32, x: f32, bold: bool) {
        self.ensure_space(LINE);
        let font = if bold { &self.bold } else { &self.font };
        self.layer.use_text(winansi_text(text), size, Mm(x), Mm(self.y), font);
        self.y -= LINE;
    }

    fn wrapped(&mut self, text: &str, size: f32, x: f32) {
        for line in wrap_text(text, WRAP_CHARS) {
            self.text(&line, size, x, false);
        }
    }

    fn heading(&mut self, text: &str) {
        self.ensure_space(LINE * 3.0);
        self.gap(3.0);
        self.text(text, 12.0, LEFT, true);
    }

    /// `label  #HEX` with a filled square in that color
    fn swatch_row(&mut self, label: &str, hex: Option<&HexColor>) {
        self.ensure_space(LINE);
        if let Some(hex) = hex {
            let (r, g, b) = hex.to_rgb();
            self.layer.set_fill_color(Color::Rgb(Rgb::new(r, g, b, None)));
            self.layer.add_rect(Rect::new(
                Mm(INDENT),
                Mm(self.y - 1.0),
                Mm(INDENT + 8.0),
                Mm(self.y + 3.0),
            ));
            self.layer.set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
        }
        let line = match hex {
            Some(hex) => format!("{}  {}", label, hex),
            None => label.to_string(),
        };
        self.text(&line, 10.0, INDENT + 11.0, false);
    }

    fn product(&mut self, product: &MakeupProduct) {
        let mut label = format!("{} - {}", product.brand, product.product);
        if !product.shade.is_empty() {
            label.push_str(&format!(" ({})", product.shade));
        }
        self.swatch_row(&label, product.hex.as_ref());
        if let Some(url) = &product.url {
            for line in wrap_text(url, WRAP_CHARS) {
                self.text(&line, 8.0, INDENT + 11.0, false);
            }
        }
    }

    fn products(&mut self, title: &str, products: &[MakeupProduct]) {
        if products.is_empty() {
            return;
        }
        self.ensure_space(LINE * 2.0);
        self.text(title, 10.0, LEFT + 2.0, true);
        for product in products {
            self.product(product);
        }
    }

    fn finish(self) -> Result<(Vec<u8>, usize), ReportPdfError> {
        let pages = self.pages;
        let mut buf = BufWriter::new(Vec::new());
        self.doc
            .save(&mut buf)
            .map_err(|e| ReportPdfError::Save(e.to_string()))?;
        let bytes = buf.into_inner().map_err(|e| ReportPdfError::Save(e.to_string()))?;
        Ok((bytes, pages))
    }
}

/// Render a stored report as PDF bytes
pub fn render_report(report: &StoredReport) -> Result<Vec<u8>, ReportPdfError> {
    render(report).map(|(bytes, _)| bytes)
}

fn render(report: &StoredReport) -> Result<(Vec<u8>, usize), ReportPdfError> {
    let analysis = &report.result;
    let mut pdf = PageWriter::new("ColoriAI Seasonal Color Report")?;

    pdf.text("ColoriAI Seasonal Color Report", 18.0, LEFT, true);
    pdf.gap(2.0);
    pdf.text(
        &format!("Name: {}", report.user_name.as_deref().unwrap_or("Anonymous")),
        10.0,
        LEFT,
        false,
    );
    pdf.text(
        &format!("Date: {}", report.created_at.format("%Y-%m-%d")),
        10.0,
        LEFT,
        false,
    );
    pdf.gap(3.0);

    let season = if analysis.season_type.is_empty() {
        "Unknown"
    } else {
        analysis.season_type.as_str()
    };
    pdf.text(&format!("Seasonal Color Type: {}", season), 14.0, LEFT, true);

    if !analysis.color_extraction.is_empty() {
        pdf.heading("Color Extraction");
        for color in &analysis.color_extraction {
            pdf.swatch_row(&color.label, Some(&color.hex));
        }
    }

    if !analysis.color_palette.is_empty() {
        pdf.heading("Seasonal Palette");
        for color in &analysis.color_palette {
            pdf.swatch_row(&color.name, Some(&color.hex));
        }
    }

    if let Some(jewelry) = &analysis.jewelry_tone {
        pdf.heading("Jewelry Tone");
        pdf.swatch_row(&jewelry.name, jewelry.hex.as_ref());
    }

    if !analysis.hair_colors.is_empty() {
        pdf.heading("Flattering Hair Colors");
        for color in &analysis.hair_colors {
            pdf.swatch_row(&color.name, Some(&color.hex));
        }
    }

    let makeup = &analysis.makeup;
    if !makeup.is_empty() {
        pdf.heading("Makeup Suggestions");
        pdf.products("Foundations", &makeup.foundations);
        if let Some(cushion) = &makeup.cushion {
            pdf.products("Korean Cushion", std::slice::from_ref(cushion));
        }
        pdf.products("Lipsticks", &makeup.lipsticks);
        pdf.products("Blushes", &makeup.blushes);
        pdf.products("Eyeshadow Palettes", &makeup.eyeshadows);
    }

    if !analysis.celebrities.is_empty() {
        pdf.heading("Similar Celebrities");
        pdf.wrapped(&analysis.celebrities.join(", "), 10.0, INDENT);
    }

    if !analysis.outfit.image_prompt.is_empty() || report.outfit_image.is_some() {
        let title = if analysis.outfit.style.is_empty() {
            "Outfit".to_string()
        } else {
            format!("Outfit ({})", analysis.outfit.style)
        };
        pdf.heading(&title);
        if !analysis.outfit.image_prompt.is_empty() {
            pdf.wrapped(&analysis.outfit.image_prompt, 10.0, INDENT);
        }
        if let Some(url) = &report.outfit_image {
            pdf.gap(1.0);
            pdf.wrapped(&format!("Image: {}", url), 8.0, INDENT);
        }
    }

    pdf.finish()
}

/// Greedy word wrap; words longer than `max_chars` are split
/// Replace characters the builtin fonts cannot encode (Hangul, CJK, emoji)
/// with `?` so they show up as missing instead of vanishing
fn winansi_text(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            ' '..='~' | '\u{A0}'..='\u{FF}' => c,
            '\u{2018}' | '\u{2019}' | '\u{201C}' | '\u{201D}' | '\u{2013}' | '\u{2014}' | '\u{2022}'
            | '\u{2026}' | '\u{20AC}' | '\u{2122}' => c,
            _ => '?',
        })
        .collect()
}

fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word = word;
        while word.chars().count() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let split = word
                .char_indices()
                .nth(max_chars)
                .map(|(i, _)| i)
                .unwrap_or(word.len());
            lines.push(word[..split].to_string());
            word = &word[split..];
        }
        if word.is_empty() {
            continue;
        }
        if !current.is_empty() && current.chars().count() + word.chars().count() + 1 > max_chars {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
