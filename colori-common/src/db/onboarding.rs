//! Onboarding profile storage

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::onboarding::{AgeRange, OnboardingProfile, StyleOption};
use crate::{Error, Result};

type ProfileRow = (String, Option<String>, Option<i64>, Option<String>, Option<i64>);

fn to_time(ms: Option<i64>) -> Result<Option<DateTime<Utc>>> {
    ms.map(|ms| {
        DateTime::from_timestamp_millis(ms)
            .ok_or_else(|| Error::Internal(format!("Timestamp out of range: {}", ms)))
    })
    .transpose()
}

/// Load a user's profile; users without a row get an empty profile
pub async fn load_profile(pool: &SqlitePool, user_id: &str) -> Result<OnboardingProfile> {
    let row: Option<ProfileRow> = sqlx::query_as(
        "SELECT user_id, age, age_set_at, style, style_set_at FROM onboarding_profiles WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    let Some((user_id, age, age_set_at, style, style_set_at)) = row else {
        return Ok(OnboardingProfile::empty(user_id));
    };

    // Values were validated on write; an unknown label reads back as unset
    Ok(OnboardingProfile {
        user_id,
        age: age.and_then(|a| a.parse::<AgeRange>().ok()),
        age_set_at: to_time(age_set_at)?,
        style: style.and_then(|s| s.parse::<StyleOption>().ok()),
        style_set_at: to_time(style_set_at)?,
    })
}

/// Record the age choice and clear any earlier style choice
pub async fn set_profile_age(
    pool: &SqlitePool,
    user_id: &str,
    age: AgeRange,
    now: DateTime<Utc>,
) -> Result<OnboardingProfile> {
    sqlx::query(
        r#"
        INSERT INTO onboarding_profiles (user_id, age, age_set_at, style, style_set_at)
        VALUES (?, ?, ?, NULL, NULL)
        ON CONFLICT(user_id) DO UPDATE SET
            age = excluded.age,
            age_set_at = excluded.age_set_at,
            style = NULL,
            style_set_at = NULL
        "#,
    )
    .bind(user_id)
    .bind(age.label())
    .bind(now.timestamp_millis())
    .execute(pool)
    .await?;

    load_profile(pool, user_id).await
}

/// Record the style choice
pub async fn set_profile_style(
    pool: &SqlitePool,
    user_id: &str,
    style: StyleOption,
    now: DateTime<Utc>,
) -> Result<OnboardingProfile> {
    sqlx::query(
        r#"
        INSERT INTO onboarding_profiles (user_id, style, style_set_at)
        VALUES (?, ?, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            style = excluded.style,
            style_set_at = excluded.style_set_at
        "#,
    )
    .bind(user_id)
    .bind(style.label())
    .bind(now.timestamp_millis())
    .execute(pool)
    .await?;

    load_profile(pool, user_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_database;
    use crate::onboarding::{next_step, OnboardingStep};

    #[tokio::test]
    async fn test_missing_profile_is_empty() {
        let pool = init_memory_database().await.unwrap();
        let profile = load_profile(&pool, "nobody").await.unwrap();
        assert_eq!(profile, OnboardingProfile::empty("nobody"));
    }

    #[tokio::test]
    async fn test_age_then_style() {
        let pool = init_memory_database().await.unwrap();
        let now = Utc::now();

        let profile = set_profile_age(&pool, "user_a", AgeRange::Twenties, now).await.unwrap();
        assert_eq!(profile.age, Some(AgeRange::Twenties));
        assert_eq!(next_step(&profile, now, false), OnboardingStep::Style);

        let profile = set_profile_style(&pool, "user_a", StyleOption::Streetwear, now)
            .await
            .unwrap();
        assert_eq!(profile.style, Some(StyleOption::Streetwear));
        assert_eq!(profile.age, Some(AgeRange::Twenties));
        assert_eq!(next_step(&profile, now, false), OnboardingStep::Selfie);
    }

    #[tokio::test]
    async fn test_new_age_clears_style() {
        let pool = init_memory_database().await.unwrap();
        let now = Utc::now();

        set_profile_age(&pool, "user_a", AgeRange::Twenties, now).await.unwrap();
        set_profile_style(&pool, "user_a", StyleOption::Formal, now).await.unwrap();
        let profile = set_profile_age(&pool, "user_a", AgeRange::FiftyPlus, now).await.unwrap();

        assert_eq!(profile.age, Some(AgeRange::FiftyPlus));
        assert!(profile.style.is_none());
        assert!(profile.style_set_at.is_none());
    }
}
