//! Mood analytics over a trailing window of calendar days (UTC).

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

use crate::auth::identity::resolve_user;
use crate::auth::middleware::Identity;
use crate::error::{ActionResult, AppError, AppResult};
use crate::models::analytics::{AnalyticsQuery, AnalyticsStats, DayBucket, MoodAnalytics, Period};
use crate::models::entry::Entry;
use crate::models::mood::mood_trend;
use crate::AppState;

pub async fn get_analytics(
    state: &AppState,
    identity: &Identity,
    query: AnalyticsQuery,
) -> ActionResult<MoodAnalytics> {
    load_analytics(state, identity, query, Utc::now()).await.into()
}

async fn load_analytics(
    state: &AppState,
    identity: &Identity,
    query: AnalyticsQuery,
    now: DateTime<Utc>,
) -> AppResult<MoodAnalytics> {
    let user = resolve_user(state.store.as_ref(), identity).await?;
    let period = Period::parse(query.period.as_deref())
        .ok_or_else(|| AppError::Validation("Invalid period".into()))?;

    let today = now.date_naive();
    let entries = state
        .store
        .list_entries_since(user.id, window_start(period, today))
        .await?;

    tracing::debug!(user_id = %user.id, days = period.days(), entries = entries.len(), "Computing mood analytics");
    Ok(summarize(&entries, period, today))
}

fn first_day(period: Period, today: NaiveDate) -> NaiveDate {
    today - Duration::days(period.days() - 1)
}

/// Midnight UTC of the first day in the window.
pub fn window_start(period: Period, today: NaiveDate) -> DateTime<Utc> {
    first_day(period, today).and_time(NaiveTime::MIN).and_utc()
}

/// Buckets entries by UTC day. Every day in the window gets a bucket, empty
/// days included; entries outside the window are ignored.
pub fn summarize(entries: &[Entry], period: Period, today: NaiveDate) -> MoodAnalytics {
    let start = first_day(period, today);

    let mut days: BTreeMap<NaiveDate, (i64, i64)> = BTreeMap::new();
    for offset in 0..period.days() {
        days.insert(start + Duration::days(offset), (0, 0));
    }

    let mut mood_counts: BTreeMap<&str, i64> = BTreeMap::new();
    let mut total_score = 0i64;
    let mut total_entries = 0i64;

    for entry in entries {
        let Some((score, count)) = days.get_mut(&entry.created_at.date_naive()) else {
            continue;
        };
        *score += entry.mood_score as i64;
        *count += 1;

        *mood_counts.entry(entry.mood.as_str()).or_insert(0) += 1;
        total_score += entry.mood_score as i64;
        total_entries += 1;
    }

    let timeline = days
        .into_iter()
        .map(|(date, (score, count))| DayBucket {
            date,
            average_score: average(score, count),
            entry_count: count,
        })
        .collect();

    // BTreeMap iterates keys in order, so ties keep the smallest key.
    let mut most_frequent_mood: Option<(&str, i64)> = None;
    for (mood, count) in mood_counts {
        if most_frequent_mood.map_or(true, |(_, best)| count > best) {
            most_frequent_mood = Some((mood, count));
        }
    }

    let average_score = average(total_score, total_entries);
    let trend = mood_trend(average_score);

    MoodAnalytics {
        timeline,
        stats: AnalyticsStats {
            total_entries,
            daily_average: round1(total_entries as f64 / period.days() as f64),
            average_score,
            most_frequent_mood: most_frequent_mood.map(|(mood, _)| mood.to_string()),
            trend,
            trend_message: trend.message(),
        },
    }
}

fn average(total: i64, count: i64) -> f64 {
    if count == 0 {
        0.0
    } else {
        round1(total as f64 / count as f64)
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
