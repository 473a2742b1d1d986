//! Onboarding flow rules (age → style → selfie)
//!
//! Selections are kept per user for one day. A stale or missing selection
//! sends the user back to the corresponding step. Admins bypass the gate.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// How long an age or style choice stays valid
pub const SELECTION_TTL_HOURS: i64 = 24;

/// Age used in the analysis prompt when the user gave none
pub const DEFAULT_PROMPT_AGE: &str = "35";

/// Style used in the analysis prompt when the user gave none
pub const DEFAULT_PROMPT_STYLE: &str = "Daily";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgeRange {
    #[serde(rename = "Under 20")]
    Under20,
    #[serde(rename = "20-29")]
    Twenties,
    #[serde(rename = "30-39")]
    Thirties,
    #[serde(rename = "40-49")]
    Forties,
    #[serde(rename = "50+")]
    FiftyPlus,
    #[serde(rename = "Prefer not to say")]
    PreferNotToSay,
}

impl AgeRange {
    pub const ALL: [AgeRange; 6] = [
        AgeRange::Under20,
        AgeRange::Twenties,
        AgeRange::Thirties,
        AgeRange::Forties,
        AgeRange::FiftyPlus,
        AgeRange::PreferNotToSay,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AgeRange::Under20 => "Under 20",
            AgeRange::Twenties => "20-29",
            AgeRange::Thirties => "30-39",
            AgeRange::Forties => "40-49",
            AgeRange::FiftyPlus => "50+",
            AgeRange::PreferNotToSay => "Prefer not to say",
        }
    }
}

impl fmt::Display for AgeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AgeRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        AgeRange::ALL
            .into_iter()
            .find(|a| a.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::InvalidInput(format!("Unknown age range: {}", wanted)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StyleOption {
    Daily,
    Girly,
    Sporty,
    Streetwear,
    #[serde(rename = "Cocktail Party")]
    CocktailParty,
    Formal,
}

impl StyleOption {
    pub const ALL: [StyleOption; 6] = [
        StyleOption::Daily,
        StyleOption::Girly,
        StyleOption::Sporty,
        StyleOption::Streetwear,
        StyleOption::CocktailParty,
        StyleOption::Formal,
    ];

    pub fn label(self) -> &'static str {
        match self {
            StyleOption::Daily => "Daily",
            StyleOption::Girly => "Girly",
            StyleOption::Sporty => "Sporty",
            StyleOption::Streetwear => "Streetwear",
            StyleOption::CocktailParty => "Cocktail Party",
            StyleOption::Formal => "Formal",
        }
    }
}

impl fmt::Display for StyleOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for StyleOption {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        StyleOption::ALL
            .into_iter()
            .find(|o| o.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::InvalidInput(format!("Unknown style: {}", wanted)))
    }
}

/// Age text for the analysis prompt
///
/// "Prefer not to say" and blank values fall back to [`DEFAULT_PROMPT_AGE`];
/// anything else is passed through as given.
pub fn prompt_age(age: Option<&str>) -> String {
    match age.map(str::trim) {
        None | Some("") => DEFAULT_PROMPT_AGE.to_string(),
        Some(a) if a.eq_ignore_ascii_case(AgeRange::PreferNotToSay.label()) => {
            DEFAULT_PROMPT_AGE.to_string()
        }
        Some(a) => a.to_string(),
    }
}

/// Style text for the analysis prompt
pub fn prompt_style(style: Option<&str>) -> String {
    match style.map(str::trim) {
        None | Some("") => DEFAULT_PROMPT_STYLE.to_string(),
        Some(s) => s.to_string(),
    }
}

/// Stored onboarding selections for one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingProfile {
    pub user_id: String,
    pub age: Option<AgeRange>,
    pub age_set_at: Option<DateTime<Utc>>,
    pub style: Option<StyleOption>,
    pub style_set_at: Option<DateTime<Utc>>,
}

impl OnboardingProfile {
    pub fn empty(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            age: None,
            age_set_at: None,
            style: None,
            style_set_at: None,
        }
    }

    /// Age choice if it has not expired
    pub fn current_age(&self, now: DateTime<Utc>) -> Option<AgeRange> {
        fresh(self.age, self.age_set_at, now)
    }

    /// Style choice if it has not expired
    pub fn current_style(&self, now: DateTime<Utc>) -> Option<StyleOption> {
        fresh(self.style, self.style_set_at, now)
    }
}

fn fresh<T: Copy>(value: Option<T>, set_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<T> {
    let set_at = set_at?;
    if now - set_at > Duration::hours(SELECTION_TTL_HOURS) {
        None
    } else {
        value
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnboardingStep {
    Age,
    Style,
    Selfie,
}

/// Which step the user should be on
pub fn next_step(profile: &OnboardingProfile, now: DateTime<Utc>, is_admin: bool) -> OnboardingStep {
    if is_admin {
        return OnboardingStep::Selfie;
    }
    if profile.current_age(now).is_none() {
        return OnboardingStep::Age;
    }
    if profile.current_style(now).is_none() {
        return OnboardingStep::Style;
    }
    OnboardingStep::Selfie
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile_at(now: DateTime<Utc>) -> OnboardingProfile {
        OnboardingProfile {
            user_id: "user_1".to_string(),
            age: Some(AgeRange::Thirties),
            age_set_at: Some(now),
            style: Some(StyleOption::Sporty),
            style_set_at: Some(now),
        }
    }

    #[test]
    fn test_age_range_parse() {
        assert_eq!("30-39".parse::<AgeRange>().unwrap(), AgeRange::Thirties);
        assert_eq!(
            "prefer not to say".parse::<AgeRange>().unwrap(),
            AgeRange::PreferNotToSay
        );
        assert!("ancient".parse::<AgeRange>().is_err());
    }

    #[test]
    fn test_style_parse() {
        assert_eq!(
            "Cocktail Party".parse::<StyleOption>().unwrap(),
            StyleOption::CocktailParty
        );
        assert!("Goth".parse::<StyleOption>().is_err());
    }

    #[test]
    fn test_serde_uses_display_labels() {
        let json = serde_json::to_string(&AgeRange::FiftyPlus).unwrap();
        assert_eq!(json, "\"50+\"");
        let style: StyleOption = serde_json::from_str("\"Cocktail Party\"").unwrap();
        assert_eq!(style, StyleOption::CocktailParty);
    }

    #[test]
    fn test_prompt_age_defaults() {
        assert_eq!(prompt_age(None), "35");
        assert_eq!(prompt_age(Some("")), "35");
        assert_eq!(prompt_age(Some("Prefer not to say")), "35");
        assert_eq!(prompt_age(Some("20-29")), "20-29");
    }

    #[test]
    fn test_prompt_style_defaults() {
        assert_eq!(prompt_style(None), "Daily");
        assert_eq!(prompt_style(Some("  ")), "Daily");
        assert_eq!(prompt_style(Some("Formal")), "Formal");
    }

    #[test]
    fn test_next_step_progression() {
        let now = Utc::now();
        let mut profile = OnboardingProfile::empty("user_1");
        assert_eq!(next_step(&profile, now, false), OnboardingStep::Age);

        profile.age = Some(AgeRange::Forties);
        profile.age_set_at = Some(now);
        assert_eq!(next_step(&profile, now, false), OnboardingStep::Style);

        profile.style = Some(StyleOption::Formal);
        profile.style_set_at = Some(now);
        assert_eq!(next_step(&profile, now, false), OnboardingStep::Selfie);
    }

    #[test]
    fn test_selections_expire_after_a_day() {
        let set = Utc::now();
        let profile = profile_at(set);
        let later = set + Duration::hours(SELECTION_TTL_HOURS + 1);
        assert!(profile.current_age(later).is_none());
        assert_eq!(next_step(&profile, later, false), OnboardingStep::Age);
        assert_eq!(next_step(&profile, set + Duration::hours(1), false), OnboardingStep::Selfie);
    }

    #[test]
    fn test_admin_skips_gate() {
        let profile = OnboardingProfile::empty("admin");
        assert_eq!(next_step(&profile, Utc::now(), true), OnboardingStep::Selfie);
    }
}
