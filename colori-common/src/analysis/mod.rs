//! Seasonal color analysis report types
//!
//! The analysis model returns a semi-structured Markdown/CSV document. The
//! [`parser`] turns that text into an [`AnalysisReport`], which is what gets
//! stored, listed and rendered to PDF.

mod parser;

pub use parser::{extract_image_prompt, parse_report};

use serde::{Deserialize, Serialize};
use std::fmt;

/// A validated `#RRGGBB` color
///
/// Accepts `#RGB`, `#RRGGBB`, either case, with or without the leading `#`.
/// Always stored in upper-case six-digit form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(String);

impl HexColor {
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim().trim_matches(|c| c == '`' || c == '*');
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);

        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }

        let expanded = match digits.len() {
            6 => digits.to_ascii_uppercase(),
            3 => digits
                .chars()
                .flat_map(|c| [c, c])
                .collect::<String>()
                .to_ascii_uppercase(),
            _ => return None,
        };

        Some(Self(format!("#{}", expanded)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Red, green and blue channels as 0.0..=1.0 floats
    pub fn to_rgb(&self) -> (f32, f32, f32) {
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&self.0[range], 16).unwrap_or(0) as f32 / 255.0
        };
        (channel(1..3), channel(3..5), channel(5..7))
    }
}

impl TryFrom<String> for HexColor {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        HexColor::parse(&value).ok_or_else(|| format!("invalid hex color: {}", value))
    }
}

/// `Option<HexColor>` field format where a blank string means "no color"
mod optional_hex {
    use super::HexColor;
    use serde::{de::Error, Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<HexColor>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(value) if !value.trim().is_empty() => HexColor::try_from(value).map(Some).map_err(D::Error::custom),
            _ => Ok(None),
        }
    }
}

impl From<HexColor> for String {
    fn from(value: HexColor) -> Self {
        value.0
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A color sampled from the selfie (face, eye, hair)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedColor {
    pub label: String,
    pub hex: HexColor,
}

/// A named swatch (palette entry, hair color)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedColor {
    pub name: String,
    pub hex: HexColor,
}

/// Recommended jewelry metal; the model does not always give a hex value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JewelryTone {
    pub name: String,
    #[serde(default, deserialize_with = "optional_hex::deserialize", skip_serializing_if = "Option::is_none")]
    pub hex: Option<HexColor>,
}

/// A purchasable makeup product suggestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MakeupProduct {
    pub brand: String,
    pub product: String,
    pub shade: String,
    #[serde(default, deserialize_with = "optional_hex::deserialize", skip_serializing_if = "Option::is_none")]
    pub hex: Option<HexColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MakeupSuggestions {
    #[serde(default)]
    pub foundations: Vec<MakeupProduct>,
    #[serde(default)]
    pub cushion: Option<MakeupProduct>,
    #[serde(default)]
    pub lipsticks: Vec<MakeupProduct>,
    #[serde(default)]
    pub blushes: Vec<MakeupProduct>,
    #[serde(default)]
    pub eyeshadows: Vec<MakeupProduct>,
}

impl MakeupSuggestions {
    pub fn is_empty(&self) -> bool {
        self.foundations.is_empty()
            && self.cushion.is_none()
            && self.lipsticks.is_empty()
            && self.blushes.is_empty()
            && self.eyeshadows.is_empty()
    }
}

/// Outfit illustration request derived from the analysis
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutfitPlan {
    #[serde(default)]
    pub style: String,
    #[serde(default)]
    pub image_prompt: String,
}

/// Structured seasonal color report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    #[serde(default)]
    pub season_type: String,
    #[serde(default)]
    pub color_extraction: Vec<ExtractedColor>,
    #[serde(default)]
    pub color_palette: Vec<NamedColor>,
    #[serde(default)]
    pub jewelry_tone: Option<JewelryTone>,
    #[serde(default)]
    pub hair_colors: Vec<NamedColor>,
    #[serde(default)]
    pub makeup: MakeupSuggestions,
    #[serde(default)]
    pub celebrities: Vec<String>,
    #[serde(default)]
    pub outfit: OutfitPlan,
}

impl AnalysisReport {
    /// A usable report names a season type
    pub fn is_complete(&self) -> bool {
        !self.season_type.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_color_normalizes() {
        assert_eq!(HexColor::parse("#edc1a8").unwrap().as_str(), "#EDC1A8");
        assert_eq!(HexColor::parse("6A5554").unwrap().as_str(), "#6A5554");
        assert_eq!(HexColor::parse(" #abc ").unwrap().as_str(), "#AABBCC");
        assert_eq!(HexColor::parse("`#D4AF37`").unwrap().as_str(), "#D4AF37");
    }

    #[test]
    fn test_hex_color_rejects_garbage() {
        assert!(HexColor::parse("HEX").is_none());
        assert!(HexColor::parse("#12345").is_none());
        assert!(HexColor::parse("#GGGGGG").is_none());
        assert!(HexColor::parse("").is_none());
    }

    #[test]
    fn test_hex_color_rgb() {
        let (r, g, b) = HexColor::parse("#FF0080").unwrap().to_rgb();
        assert!((r - 1.0).abs() < f32::EPSILON);
        assert!(g.abs() < f32::EPSILON);
        assert!((b - 128.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let report = AnalysisReport {
            season_type: "Soft Autumn".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["seasonType"], "Soft Autumn");
        assert!(json["colorExtraction"].is_array());
        assert!(json["makeup"]["foundations"].is_array());
    }

    #[test]
    fn test_report_rejects_invalid_hex_on_deserialize() {
        let json = r#"{"seasonType":"Soft Autumn","colorPalette":[{"name":"Rose","hex":"pink"}]}"#;
        assert!(serde_json::from_str::<AnalysisReport>(json).is_err());
    }

    #[test]
    fn test_blank_optional_hex_deserializes_as_none() {
        let json = r#"{"seasonType":"Soft Autumn","jewelryTone":{"name":"Gold","hex":""},
            "makeup":{"cushion":{"brand":"","product":"","shade":"","hex":"","url":""}}}"#;
        let report: AnalysisReport = serde_json::from_str(json).unwrap();
        assert!(report.jewelry_tone.unwrap().hex.is_none());
        assert!(report.makeup.cushion.unwrap().hex.is_none());

        let bad = r#"{"jewelryTone":{"name":"Gold","hex":"shiny"}}"#;
        assert!(serde_json::from_str::<AnalysisReport>(bad).is_err());
    }

    #[test]
    fn test_is_complete() {
        let mut report = AnalysisReport::default();
        assert!(!report.is_complete());
        report.season_type = "Deep Winter".to_string();
        assert!(report.is_complete());
    }
}
