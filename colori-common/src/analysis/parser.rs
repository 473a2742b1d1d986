//! Report-text parser
//!
//! The model is asked for a fixed set of bold Markdown headers followed by
//! CSV-ish rows, but nothing enforces that shape. Parsing is line-based and
//! forgiving: unknown lines are skipped and absent sections keep their
//! defaults. Callers decide whether the result is usable via
//! [`AnalysisReport::is_complete`].

use super::{
    AnalysisReport, ExtractedColor, HexColor, JewelryTone, MakeupProduct, NamedColor,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    SeasonType,
    ColorExtraction,
    Palette,
    Jewelry,
    HairColors,
    Makeup,
    Foundations,
    Cushion,
    Lipsticks,
    Blushes,
    Eyeshadows,
    Celebrities,
    ImagePrompt,
}

impl Section {
    fn from_label(label: &str) -> Option<Self> {
        let label = label.to_lowercase();
        let has = |needle: &str| label.contains(needle);

        let section = if has("season") && has("type") {
            Section::SeasonType
        } else if has("color extraction") || has("colour extraction") {
            Section::ColorExtraction
        } else if has("eyeshadow") || has("eye shadow") {
            Section::Eyeshadows
        } else if has("seasonal palette") || has("color palette") || label == "palette" {
            Section::Palette
        } else if has("jewelry") || has("jewellery") {
            Section::Jewelry
        } else if has("hair color") || has("hair colour") {
            Section::HairColors
        } else if has("foundation") {
            Section::Foundations
        } else if has("cushion") {
            Section::Cushion
        } else if has("lipstick") {
            Section::Lipsticks
        } else if has("blushes") || label == "blush" {
            Section::Blushes
        } else if has("makeup") || has("make-up") {
            Section::Makeup
        } else if has("celebrit") {
            Section::Celebrities
        } else if has("image prompt") || has("outfit prompt") {
            Section::ImagePrompt
        } else {
            return None;
        };

        Some(section)
    }

    /// Sections that collect one entry per row
    fn takes_rows(self) -> bool {
        matches!(
            self,
            Section::ColorExtraction
                | Section::Palette
                | Section::HairColors
                | Section::Foundations
                | Section::Cushion
                | Section::Lipsticks
                | Section::Blushes
                | Section::Eyeshadows
        )
    }

    /// Sections whose value sits on the header line (or the line after it)
    fn is_inline(self) -> bool {
        matches!(
            self,
            Section::SeasonType | Section::Jewelry | Section::ImagePrompt
        )
    }
}

/// Parse the analysis text into a report
///
/// `style` is the outfit style the analysis was requested for; it is copied
/// into [`OutfitPlan::style`](super::OutfitPlan) as the text itself does not
/// carry it reliably.
pub fn parse_report(text: &str, style: &str) -> AnalysisReport {
    let mut report = AnalysisReport::default();
    report.outfit.style = style.to_string();

    let mut section = Section::None;
    let mut awaiting_inline = false;

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some((label, rest)) = split_header(line) {
            let bold_row = section.takes_rows() && is_row_tail(rest);
            if let Some(next) = Section::from_label(label).filter(|_| !bold_row) {
                section = next;
                awaiting_inline = false;

                if section.is_inline() {
                    if rest.is_empty() {
                        awaiting_inline = true;
                    } else {
                        apply_inline(&mut report, section, rest);
                        section = Section::None;
                    }
                } else if section == Section::Celebrities && !rest.is_empty() {
                    push_celebrities(&mut report, rest);
                }
                continue;
            }
        }

        if awaiting_inline {
            apply_inline(&mut report, section, strip_list_marker(line));
            awaiting_inline = false;
            section = Section::None;
            continue;
        }

        apply_row(&mut report, section, line);
    }

    report
}

/// Pull just the outfit image prompt out of an analysis text
pub fn extract_image_prompt(text: &str) -> Option<String> {
    let prompt = parse_report(text, "").outfit.image_prompt;
    if prompt.is_empty() {
        None
    } else {
        Some(prompt)
    }
}

/// Split `**Label:** rest` (after any list markers) into label and rest
fn split_header(line: &str) -> Option<(&str, &str)> {
    let line = strip_list_marker(line);
    let inner = line.strip_prefix("**")?;
    let end = inner.find("**")?;

    let label = inner[..end].trim().trim_end_matches(':').trim();
    let rest = inner[end + 2..]
        .trim()
        .trim_start_matches(':')
        .trim();

    if label.is_empty() {
        return None;
    }
    Some((label, rest))
}

/// Whether the text after a bold label continues a data row
/// (`**Hair:** #3C3334`, `**MAC**, Matte, ...`) rather than opening a section
fn is_row_tail(rest: &str) -> bool {
    let first = rest.split(',').next().unwrap_or(rest);
    rest.starts_with(',') || HexColor::parse(first).is_some()
}

/// Remove Markdown heading hashes, bullets and `1.` / `1)` numbering
fn strip_list_marker(line: &str) -> &str {
    let mut rest = line.trim_start();

    loop {
        let before = rest;

        rest = rest.trim_start_matches('#').trim_start();

        if !rest.starts_with("**") {
            if let Some(stripped) = rest
                .strip_prefix("- ")
                .or_else(|| rest.strip_prefix("* "))
                .or_else(|| rest.strip_prefix("• "))
            {
                rest = stripped.trim_start();
            }
        }

        let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
        if digits > 0 {
            let after = &rest[digits..];
            if let Some(stripped) = after
                .strip_prefix(". ")
                .or_else(|| after.strip_prefix(") "))
            {
                rest = stripped.trim_start();
            }
        }

        if rest == before {
            return rest;
        }
    }
}

/// Drop emphasis markers and surrounding whitespace
fn clean(value: &str) -> String {
    value.replace("**", "").trim().trim_matches('*').trim().to_string()
}

fn apply_inline(report: &mut AnalysisReport, section: Section, value: &str) {
    match section {
        Section::SeasonType => {
            report.season_type = clean(value).trim_end_matches('.').trim().to_string();
        }
        Section::Jewelry => {
            let value = clean(value);
            let (name, hex) = match split_pair(&value) {
                Some((name, hex)) => (name.to_string(), HexColor::parse(hex)),
                None => (value.clone(), None),
            };
            if !name.is_empty() {
                report.jewelry_tone = Some(JewelryTone { name, hex });
            }
        }
        Section::ImagePrompt => {
            report.outfit.image_prompt = clean(value).trim_matches('"').trim().to_string();
        }
        _ => {}
    }
}

fn apply_row(report: &mut AnalysisReport, section: Section, line: &str) {
    let row = clean(strip_list_marker(line));
    if row.is_empty() {
        return;
    }

    match section {
        Section::ColorExtraction => {
            if let Some((label, hex)) = parse_color_row(&row) {
                report.color_extraction.push(ExtractedColor { label, hex });
            }
        }
        Section::Palette => {
            if let Some((name, hex)) = parse_color_row(&row) {
                report.color_palette.push(NamedColor { name, hex });
            }
        }
        Section::HairColors => {
            if let Some((name, hex)) = parse_color_row(&row) {
                report.hair_colors.push(NamedColor { name, hex });
            }
        }
        Section::Foundations => push_product(&mut report.makeup.foundations, &row),
        Section::Lipsticks => push_product(&mut report.makeup.lipsticks, &row),
        Section::Blushes => push_product(&mut report.makeup.blushes, &row),
        Section::Eyeshadows => push_product(&mut report.makeup.eyeshadows, &row),
        Section::Cushion => {
            if report.makeup.cushion.is_none() {
                report.makeup.cushion = parse_product(&row);
            }
        }
        Section::Celebrities => push_celebrities(report, &row),
        Section::None
        | Section::SeasonType
        | Section::Jewelry
        | Section::Makeup
        | Section::ImagePrompt => {}
    }
}

/// Split `name, value` or `name: value`
fn split_pair(row: &str) -> Option<(&str, &str)> {
    let (name, value) = row.split_once(',').or_else(|| row.split_once(':'))?;
    Some((name.trim(), value.trim()))
}

/// A `Label, HEX` row; header rows and rows without a valid color are rejected
fn parse_color_row(row: &str) -> Option<(String, HexColor)> {
    let (name, value) = split_pair(row)?;
    let hex_field = value.split(',').next().unwrap_or(value).trim();

    if name.is_empty()
        || name.eq_ignore_ascii_case("label")
        || name.eq_ignore_ascii_case("name")
    {
        return None;
    }

    let hex = HexColor::parse(hex_field)?;
    Some((name.to_string(), hex))
}

/// `Brand, Product, Shade, HEX, URL`; the URL may itself contain commas
fn parse_product(row: &str) -> Option<MakeupProduct> {
    let parts: Vec<&str> = row.split(',').map(str::trim).collect();
    if parts.len() < 4 || parts[0].eq_ignore_ascii_case("brand") {
        return None;
    }

    let url = parts[4..].join(",");
    let url = url.trim();

    Some(MakeupProduct {
        brand: parts[0].to_string(),
        product: parts[1].to_string(),
        shade: parts[2].to_string(),
        hex: HexColor::parse(parts[3]),
        url: if url.is_empty() {
            None
        } else {
            Some(url.to_string())
        },
    })
}

fn push_product(products: &mut Vec<MakeupProduct>, row: &str) {
    if let Some(product) = parse_product(row) {
        products.push(product);
    }
}

fn push_celebrities(report: &mut AnalysisReport, value: &str) {
    for name in value.split(',') {
        let name = clean(name);
        if !name.is_empty() {
            report.celebrities.push(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
Here is your analysis.

1. **Seasonal Color Type:** Soft Autumn

2. **Color Extraction:**
Label, HEX
Face, #EDC1A8
Eye, #6A5554
Hair, #3C3334

3. **9-Color Seasonal Palette:**
Name, HEX
Dusty Rose, #C0A6A1
Olive, #808000
Camel, #C19A6B

4. **Jewelry Tone:** Gold, #D4AF37

5. **Flattering Hair Colors:**
Chestnut Brown, #954535
Honey Blonde, #E3C16F

6. **Makeup Suggestions**
**Foundations:**
- Estee Lauder, Double Wear, 2W1 Dawn, #E5C3A5, https://example.com/dw
- Fenty Beauty, Pro Filt'r, 240, #D8AE8B, https://example.com/fenty?a=1,2
**Korean Cushion:**
- Laneige, Neo Cushion Matte, 21N, #EBCDB1, https://example.com/laneige
**Lipsticks:**
- MAC, Matte Lipstick, Velvet Teddy, #A86B5B, https://example.com/mac
**Blushes:**
- NARS, Blush, Torrid, #E58C7A, https://example.com/nars
**Eyeshadow Palettes:**
- Urban Decay, Naked3, Palette, #B88A7A, https://example.com/ud

7. **Similar Celebrities:**
- Jennifer Aniston
- Gigi Hadid

8. **Image Prompt:** A flatlay of a Daily summer outfit using #C0A6A1, #808000 and #C19A6B.
"#;

    #[test]
    fn test_parses_season_type() {
        let report = parse_report(SAMPLE, "Daily");
        assert_eq!(report.season_type, "Soft Autumn");
        assert!(report.is_complete());
    }

    #[test]
    fn test_parses_color_rows_and_skips_csv_header() {
        let report = parse_report(SAMPLE, "Daily");
        assert_eq!(report.color_extraction.len(), 3);
        assert_eq!(report.color_extraction[0].label, "Face");
        assert_eq!(report.color_extraction[0].hex.as_str(), "#EDC1A8");
        assert_eq!(report.color_palette.len(), 3);
        assert_eq!(report.color_palette[0].name, "Dusty Rose");
        assert_eq!(report.hair_colors.len(), 2);
    }

    #[test]
    fn test_parses_jewelry_tone() {
        let report = parse_report(SAMPLE, "Daily");
        let tone = report.jewelry_tone.unwrap();
        assert_eq!(tone.name, "Gold");
        assert_eq!(tone.hex.unwrap().as_str(), "#D4AF37");
    }

    #[test]
    fn test_parses_makeup_products() {
        let report = parse_report(SAMPLE, "Daily");
        let makeup = &report.makeup;
        assert_eq!(makeup.foundations.len(), 2);
        assert_eq!(makeup.foundations[0].brand, "Estee Lauder");
        assert_eq!(makeup.foundations[0].shade, "2W1 Dawn");
        assert_eq!(
            makeup.foundations[1].url.as_deref(),
            Some("https://example.com/fenty?a=1,2")
        );
        assert_eq!(makeup.cushion.as_ref().unwrap().brand, "Laneige");
        assert_eq!(makeup.lipsticks.len(), 1);
        assert_eq!(makeup.blushes.len(), 1);
        assert_eq!(makeup.eyeshadows.len(), 1);
        assert_eq!(makeup.eyeshadows[0].product, "Naked3");
    }

    #[test]
    fn test_eyeshadow_palette_not_confused_with_color_palette() {
        let report = parse_report(SAMPLE, "Daily");
        assert!(report
            .color_palette
            .iter()
            .all(|c| c.name != "Urban Decay"));
    }

    #[test]
    fn test_parses_celebrities_and_prompt() {
        let report = parse_report(SAMPLE, "Daily");
        assert_eq!(report.celebrities, vec!["Jennifer Aniston", "Gigi Hadid"]);
        assert!(report.outfit.image_prompt.starts_with("A flatlay"));
        assert_eq!(report.outfit.style, "Daily");
    }

    #[test]
    fn test_inline_value_on_following_line() {
        let text = "**Seasonal Color Type**\nDeep Winter\n**Image Prompt:**\n\"Flatlay of a formal outfit\"";
        let report = parse_report(text, "Formal");
        assert_eq!(report.season_type, "Deep Winter");
        assert_eq!(report.outfit.image_prompt, "Flatlay of a formal outfit");
    }

    #[test]
    fn test_celebrities_inline_list() {
        let report = parse_report("**Similar Celebrities:** Zendaya, Emma Stone", "");
        assert_eq!(report.celebrities, vec!["Zendaya", "Emma Stone"]);
    }

    #[test]
    fn test_invalid_hex_rows_are_dropped() {
        let text = "**Color Extraction:**\nFace, peach\nEye, #6A5554";
        let report = parse_report(text, "");
        assert_eq!(report.color_extraction.len(), 1);
        assert_eq!(report.color_extraction[0].label, "Eye");
    }

    #[test]
    fn test_colon_separated_color_rows() {
        let text = "**Color Extraction:**\n- Face: #EDC1A8\n- Hair: #3C3334";
        let report = parse_report(text, "");
        assert_eq!(report.color_extraction.len(), 2);
    }

    #[test]
    fn test_markdown_heading_headers() {
        let text = "### **Seasonal Color Type:** Bright Spring\n## **9-Color Seasonal Palette**\nCoral, #FF7F50";
        let report = parse_report(text, "");
        assert_eq!(report.season_type, "Bright Spring");
        assert_eq!(report.color_palette.len(), 1);
    }

    #[test]
    fn test_short_product_rows_are_ignored() {
        let text = "**Lipsticks:**\n- MAC, Ruby Woo\n- Dior, Rouge, 999, #C41E3A";
        let report = parse_report(text, "");
        assert_eq!(report.makeup.lipsticks.len(), 1);
        assert!(report.makeup.lipsticks[0].url.is_none());
    }

    #[test]
    fn test_unstructured_text_yields_incomplete_report() {
        let report = parse_report("I'm sorry, I can't help with that.", "Daily");
        assert!(!report.is_complete());
        assert!(report.color_palette.is_empty());
    }

    #[test]
    fn test_extract_image_prompt() {
        assert_eq!(
            extract_image_prompt("**Image Prompt:** Flatlay of sporty outfit").as_deref(),
            Some("Flatlay of sporty outfit")
        );
        assert!(extract_image_prompt("no prompt here").is_none());
    }

    #[test]
    fn test_bold_row_labels_do_not_switch_sections() {
        let text = "**Color Extraction:**\n- **Face:** #EDC1A8\n- **Hair:** #3C3334\n- **Eye:** #6A5554\n\
                    **9-Color Seasonal Palette:**\n- **Blush Pink**, #F4C2C2\n- Olive, #808000\n- Camel, #C19A6B";
        let report = parse_report(text, "");

        let labels: Vec<&str> = report.color_extraction.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Face", "Hair", "Eye"]);
        assert!(report.hair_colors.is_empty());

        let names: Vec<&str> = report.color_palette.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Blush Pink", "Olive", "Camel"]);
        assert!(report.makeup.blushes.is_empty());
    }

    #[test]
    fn test_bold_brand_in_product_row() {
        let text = "**Lipsticks:**\n- **MAC**, Matte Lipstick, Velvet Teddy, #A86B5B\n**Blushes:**\n- NARS, Blush, Torrid, #E58C7A";
        let report = parse_report(text, "");
        assert_eq!(report.makeup.lipsticks.len(), 1);
        assert_eq!(report.makeup.lipsticks[0].brand, "MAC");
        assert_eq!(report.makeup.blushes.len(), 1);
    }

    #[test]
    fn test_single_keyword_labels_are_not_headers() {
        let text = "**Flattering Hair Colors:**\nChestnut, #954535\n**Hair**\nHoney, #E3C16F";
        let report = parse_report(text, "");
        assert_eq!(report.hair_colors.len(), 2);
    }

    #[test]
    fn test_strip_list_marker() {
        assert_eq!(strip_list_marker("1. **A**"), "**A**");
        assert_eq!(strip_list_marker("- Name"), "Name");
        assert_eq!(strip_list_marker("## 2) **B**"), "**B**");
        assert_eq!(strip_list_marker("**Bold**"), "**Bold**");
    }
}
