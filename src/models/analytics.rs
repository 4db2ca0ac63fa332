use chrono::NaiveDate;
use serde::Serialize;

use crate::models::mood::MoodTrend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    SevenDays,
    FifteenDays,
    ThirtyDays,
}

impl Period {
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match raw.map(str::trim) {
            None | Some("") | Some("7d") => Some(Period::SevenDays),
            Some("15d") => Some(Period::FifteenDays),
            Some("30d") => Some(Period::ThirtyDays),
            _ => None,
        }
    }

    pub fn days(&self) -> i64 {
        match self {
            Period::SevenDays => 7,
            Period::FifteenDays => 15,
            Period::ThirtyDays => 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub average_score: f64,
    pub entry_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsStats {
    pub total_entries: i64,
    pub daily_average: f64,
    pub average_score: f64,
    pub most_frequent_mood: Option<String>,
    pub trend: MoodTrend,
    pub trend_message: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoodAnalytics {
    pub timeline: Vec<DayBucket>,
    pub stats: AnalyticsStats,
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct AnalyticsQuery {
    pub period: Option<String>,
}
