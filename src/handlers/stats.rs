use std::collections::{BTreeSet, HashMap};

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{Datelike, Duration, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::gamification::word_count;
use crate::models::journal::JournalEntry;
use crate::AppState;

const DASHBOARD_WINDOW_DAYS: i64 = 30;

const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Derived statistics over the trailing 30-day window.
#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub total_entries: usize,
    pub total_words: usize,
    pub average_words_per_entry: usize,
    /// Longest run of consecutive calendar days with at least one entry.
    pub streak_days: i64,
    pub most_active_day: Option<String>,
    pub most_active_hour: Option<String>,
    pub mood_distribution: HashMap<String, i64>,
    pub activity_by_day: HashMap<String, i64>,
    pub activity_by_hour: HashMap<String, i64>,
}

#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub total_entries: usize,
    pub total_words: usize,
    pub unique_tags: usize,
    pub top_tags: Vec<TagCount>,
    pub mood_distribution: HashMap<String, i64>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct TagCount {
    pub tag: String,
    pub count: i64,
}

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub count: i64,
}

pub async fn get_dashboard_stats(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<DashboardStats>> {
    let window_start = Utc::now() - Duration::days(DASHBOARD_WINDOW_DAYS);

    let entries = sqlx::query_as::<_, JournalEntry>(
        r#"
        SELECT * FROM journals
        WHERE user_id = $1 AND created_at >= $2
        ORDER BY created_at ASC
        "#,
    )
    .bind(auth_user.id)
    .bind(window_start)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(derive_dashboard_stats(&entries)))
}

pub async fn get_summary(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<SummaryStats>> {
    let entries = sqlx::query_as::<_, JournalEntry>(
        "SELECT * FROM journals WHERE user_id = $1 ORDER BY created_at ASC",
    )
    .bind(auth_user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(derive_summary(&entries)))
}

/// Per-day entry counts for one calendar month (streak calendar data source).
pub async fn get_calendar(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<CalendarQuery>,
) -> AppResult<Json<Vec<CalendarDay>>> {
    let today = Utc::now().date_naive();
    let year = query.year.unwrap_or_else(|| today.year());
    let month = query.month.unwrap_or_else(|| today.month());

    let month_start = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AppError::Validation("Invalid year/month".into()))?;
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(|| AppError::Validation("Invalid year/month".into()))?;

    let rows = sqlx::query_as::<_, (NaiveDate, i64)>(
        r#"
        SELECT created_at::date AS day, COUNT(*) AS count
        FROM journals
        WHERE user_id = $1 AND created_at::date >= $2 AND created_at::date < $3
        GROUP BY day
        ORDER BY day ASC
        "#,
    )
    .bind(auth_user.id)
    .bind(month_start)
    .bind(next_month)
    .fetch_all(&state.db)
    .await?;

    let days = rows
        .into_iter()
        .map(|(date, count)| CalendarDay { date, count })
        .collect();

    Ok(Json(days))
}

/// Single pass over the window: word totals, mood/weekday/hour histograms,
/// and the longest consecutive-day run.
fn derive_dashboard_stats(entries: &[JournalEntry]) -> DashboardStats {
    let total_entries = entries.len();
    let total_words: usize = entries.iter().map(|e| word_count(&e.content)).sum();
    let average_words_per_entry = if total_entries > 0 {
        (total_words as f64 / total_entries as f64).round() as usize
    } else {
        0
    };

    let mut mood_distribution: HashMap<String, i64> = HashMap::new();
    let mut day_keys = Vec::new();
    let mut hour_keys = Vec::new();
    let mut dates: BTreeSet<NaiveDate> = BTreeSet::new();

    for entry in entries {
        let day = DAY_NAMES[entry.created_at.weekday().num_days_from_monday() as usize];
        let hour = format!("{:02}:00", entry.created_at.hour());
        day_keys.push(day.to_string());
        hour_keys.push(hour);
        dates.insert(entry.created_at.date_naive());

        if let Some(mood) = entry.mood {
            *mood_distribution.entry(mood.as_str().to_string()).or_insert(0) += 1;
        }
    }

    let (activity_by_day, most_active_day) = count_with_mode(&day_keys);
    let (activity_by_hour, most_active_hour) = count_with_mode(&hour_keys);

    DashboardStats {
        total_entries,
        total_words,
        average_words_per_entry,
        streak_days: longest_run(&dates),
        most_active_day,
        most_active_hour,
        mood_distribution,
        activity_by_day,
        activity_by_hour,
    }
}

fn derive_summary(entries: &[JournalEntry]) -> SummaryStats {
    let total_entries = entries.len();
    let total_words: usize = entries.iter().map(|e| word_count(&e.content)).sum();

    let mut mood_distribution: HashMap<String, i64> = HashMap::new();
    let mut tag_keys = Vec::new();
    for entry in entries {
        if let Some(mood) = entry.mood {
            *mood_distribution.entry(mood.as_str().to_string()).or_insert(0) += 1;
        }
        tag_keys.extend(entry.tags.iter().cloned());
    }

    let (tag_counts, first_seen) = count_ordered(&tag_keys);
    let unique_tags = first_seen.len();

    // Stable sort keeps first-encountered order among equal counts
    let mut top_tags: Vec<TagCount> = first_seen
        .iter()
        .map(|tag| TagCount {
            tag: tag.clone(),
            count: tag_counts[tag],
        })
        .collect();
    top_tags.sort_by(|a, b| b.count.cmp(&a.count));
    top_tags.truncate(10);

    SummaryStats {
        total_entries,
        total_words,
        unique_tags,
        top_tags,
        mood_distribution,
    }
}

/// Count occurrences, remembering the order keys were first seen.
fn count_ordered(keys: &[String]) -> (HashMap<String, i64>, Vec<String>) {
    let mut counts: HashMap<String, i64> = HashMap::new();
    let mut order: Vec<String> = Vec::new();
    for key in keys {
        if !counts.contains_key(key) {
            order.push(key.clone());
        }
        *counts.entry(key.clone()).or_insert(0) += 1;
    }
    (counts, order)
}

/// Histogram plus its mode. Ties go to the key encountered first.
fn count_with_mode(keys: &[String]) -> (HashMap<String, i64>, Option<String>) {
    let (counts, order) = count_ordered(keys);
    let mut mode: Option<(&String, i64)> = None;
    for key in &order {
        let count = counts[key];
        if mode.map_or(true, |(_, best)| count > best) {
            mode = Some((key, count));
        }
    }
    let mode = mode.map(|(key, _)| key.clone());
    (counts, mode)
}

/// Longest run of consecutive days in an ascending set of distinct dates.
fn longest_run(dates: &BTreeSet<NaiveDate>) -> i64 {
    let mut longest: i64 = 0;
    let mut run: i64 = 0;
    let mut prev: Option<NaiveDate> = None;

    for date in dates {
        match prev {
            Some(p) if *date == p + Duration::days(1) => run += 1,
            _ => {
                longest = longest.max(run);
                run = 1;
            }
        }
        prev = Some(*date);
    }
    longest.max(run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::journal::Mood;
    use chrono::{DateTime, TimeZone};
    use uuid::Uuid;

    fn entry(created_at: DateTime<Utc>, content: &str, mood: Option<Mood>) -> JournalEntry {
        JournalEntry {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "entry".into(),
            content: content.into(),
            mood,
            tags: vec![],
            is_private: true,
            xp_earned: 0,
            created_at,
            updated_at: created_at,
        }
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_empty_window_is_all_zeros() {
        let stats = derive_dashboard_stats(&[]);
        assert_eq!(stats.total_entries, 0);
        assert_eq!(stats.total_words, 0);
        assert_eq!(stats.average_words_per_entry, 0);
        assert_eq!(stats.streak_days, 0);
        assert!(stats.most_active_day.is_none());
        assert!(stats.most_active_hour.is_none());
        assert!(stats.mood_distribution.is_empty());
    }

    #[test]
    fn test_gap_breaks_longest_run() {
        // Entries on May 1, May 2, May 4: the two-day gap before May 4
        // limits the longest run to 2, not 3.
        let entries = vec![
            entry(at(2024, 5, 1, 9), "a", None),
            entry(at(2024, 5, 2, 9), "b", None),
            entry(at(2024, 5, 4, 9), "c", None),
        ];
        let stats = derive_dashboard_stats(&entries);
        assert_eq!(stats.streak_days, 2);
    }

    #[test]
    fn test_same_day_entries_count_once_for_streak() {
        let entries = vec![
            entry(at(2024, 5, 1, 9), "a", None),
            entry(at(2024, 5, 1, 21), "b", None),
            entry(at(2024, 5, 2, 9), "c", None),
        ];
        let stats = derive_dashboard_stats(&entries);
        assert_eq!(stats.streak_days, 2);
    }

    #[test]
    fn test_run_spans_month_boundary() {
        let entries = vec![
            entry(at(2024, 5, 30, 9), "a", None),
            entry(at(2024, 5, 31, 9), "b", None),
            entry(at(2024, 6, 1, 9), "c", None),
        ];
        let stats = derive_dashboard_stats(&entries);
        assert_eq!(stats.streak_days, 3);
    }

    #[test]
    fn test_word_totals_and_average() {
        let entries = vec![
            entry(at(2024, 5, 1, 9), "one two three", None),
            entry(at(2024, 5, 2, 9), "four five", None),
        ];
        let stats = derive_dashboard_stats(&entries);
        assert_eq!(stats.total_words, 5);
        // 5 / 2 = 2.5, rounded to 3
        assert_eq!(stats.average_words_per_entry, 3);
    }

    #[test]
    fn test_mood_counts_sum_to_entries_with_mood() {
        let entries = vec![
            entry(at(2024, 5, 1, 9), "a", Some(Mood::Happy)),
            entry(at(2024, 5, 2, 9), "b", Some(Mood::Happy)),
            entry(at(2024, 5, 3, 9), "c", Some(Mood::Anxious)),
            entry(at(2024, 5, 4, 9), "d", None),
        ];
        let stats = derive_dashboard_stats(&entries);
        let total: i64 = stats.mood_distribution.values().sum();
        assert_eq!(total, 3);
        assert_eq!(stats.mood_distribution["happy"], 2);
        assert_eq!(stats.mood_distribution["anxious"], 1);
    }

    #[test]
    fn test_most_active_tie_goes_to_first_encountered() {
        // 2024-05-01 is a Wednesday, 2024-05-02 a Thursday; one entry each.
        let entries = vec![
            entry(at(2024, 5, 1, 9), "a", None),
            entry(at(2024, 5, 2, 21), "b", None),
        ];
        let stats = derive_dashboard_stats(&entries);
        assert_eq!(stats.most_active_day.as_deref(), Some("Wednesday"));
        assert_eq!(stats.most_active_hour.as_deref(), Some("09:00"));
    }

    #[test]
    fn test_most_active_picks_strict_maximum() {
        let entries = vec![
            entry(at(2024, 5, 1, 9), "a", None),  // Wednesday
            entry(at(2024, 5, 2, 21), "b", None), // Thursday
            entry(at(2024, 5, 9, 21), "c", None), // Thursday again
        ];
        let stats = derive_dashboard_stats(&entries);
        assert_eq!(stats.most_active_day.as_deref(), Some("Thursday"));
        assert_eq!(stats.most_active_hour.as_deref(), Some("21:00"));
        assert_eq!(stats.activity_by_day["Thursday"], 2);
    }

    #[test]
    fn test_summary_tags() {
        let mut a = entry(at(2024, 5, 1, 9), "one two", Some(Mood::Calm));
        a.tags = vec!["work".into(), "gym".into()];
        let mut b = entry(at(2024, 5, 2, 9), "three", None);
        b.tags = vec!["work".into(), "travel".into()];

        let summary = derive_summary(&[a, b]);
        assert_eq!(summary.total_entries, 2);
        assert_eq!(summary.total_words, 3);
        assert_eq!(summary.unique_tags, 3);
        assert_eq!(
            summary.top_tags[0],
            TagCount {
                tag: "work".into(),
                count: 2
            }
        );
        // Equal counts keep first-encountered order
        assert_eq!(summary.top_tags[1].tag, "gym");
        assert_eq!(summary.top_tags[2].tag, "travel");
    }
}
