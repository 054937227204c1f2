use anyhow::Context;
use time::{Date, Duration};
use tracing::{error, info};

use super::dto::{RangeReport, RecordedEntry};
use crate::analysis::{CanonicalNutrients, FoodAnalysis};
use crate::store::{DailyStatsRow, FoodEntryRow, NutritionStore};

/// Inclusive `days`-day window ending at `anchor`, computed with calendar
/// date arithmetic so it carries across month and year boundaries.
pub fn lookback_window(anchor: Date, days: i64) -> (Date, Date) {
    let days = days.max(1);
    (anchor - Duration::days(days - 1), anchor)
}

/// Normalize an analysis, persist it as an immutable entry, then retrigger
/// the daily aggregation for that day. A failed recompute never unwinds the
/// insert: the entry is the durable fact, the daily row is a cheap,
/// idempotent derivation that the next recompute repairs.
pub async fn record_analysis(
    store: &dyn NutritionStore,
    user_id: i64,
    date: Date,
    analysis: &FoodAnalysis,
) -> anyhow::Result<RecordedEntry> {
    let nutrients = CanonicalNutrients::from_analysis(analysis);
    let raw = serde_json::to_value(analysis).context("serialize analysis payload")?;

    let entry_id = store.insert_entry(user_id, date, &nutrients, &raw).await?;
    info!(
        user_id,
        entry_id,
        shape = analysis.kind(),
        calories = nutrients.calories,
        "food entry saved"
    );

    let stats_refreshed = match store.recompute_daily(user_id, date).await {
        Ok(()) => true,
        Err(e) => {
            error!(
                error = %e,
                user_id,
                %date,
                "daily stats recompute failed; entry is saved, stats stale until retried"
            );
            false
        }
    };

    Ok(RecordedEntry {
        entry_id,
        date,
        shape: analysis.kind(),
        nutrients,
        stats_refreshed,
    })
}

/// Explicit idempotent recompute for one day; the retry path after a
/// partial [`record_analysis`].
pub async fn recompute_day(
    store: &dyn NutritionStore,
    user_id: i64,
    date: Date,
) -> anyhow::Result<()> {
    store.recompute_daily(user_id, date).await
}

/// Maintenance operation: recompute every day the user has entries for.
/// Returns how many days were recomputed.
pub async fn recompute_all(store: &dyn NutritionStore, user_id: i64) -> anyhow::Result<usize> {
    let dates = store.entry_dates(user_id).await?;
    for &date in &dates {
        store.recompute_daily(user_id, date).await?;
    }
    info!(user_id, days = dates.len(), "recomputed all daily stats");
    Ok(dates.len())
}

pub async fn daily_progress(
    store: &dyn NutritionStore,
    user_id: i64,
    date: Date,
) -> anyhow::Result<Option<DailyStatsRow>> {
    store.get_daily(user_id, date).await
}

/// Aggregate over the last seven days ending at `anchor`.
pub async fn weekly_progress(
    store: &dyn NutritionStore,
    user_id: i64,
    anchor: Date,
) -> anyhow::Result<RangeReport> {
    let (start, end) = lookback_window(anchor, 7);
    range_progress(store, user_id, start, end).await
}

pub async fn range_progress(
    store: &dyn NutritionStore,
    user_id: i64,
    start: Date,
    end: Date,
) -> anyhow::Result<RangeReport> {
    let totals = store.range_totals(user_id, start, end).await?;
    Ok(RangeReport {
        start,
        end,
        days_logged: totals.days_logged,
        totals: totals.totals,
    })
}

/// Entries from the last `days` days ending at `anchor`, most recent first.
pub async fn history(
    store: &dyn NutritionStore,
    user_id: i64,
    anchor: Date,
    days: i64,
) -> anyhow::Result<Vec<FoodEntryRow>> {
    let (since, _) = lookback_window(anchor, days);
    store.entry_history(user_id, since).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::date;

    use crate::store::Database;

    async fn test_store() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db.get_or_create_user(1, Some("alice"), Some("Alice"))
            .await
            .unwrap();
        db
    }

    fn legacy(calories: f64) -> FoodAnalysis {
        serde_json::from_value(json!({
            "confidence": 0.9,
            "total_calories": calories,
            "total_protein": 10.0,
            "total_fiber": 2.0,
            "berries_grams": 5.0
        }))
        .unwrap()
    }

    fn only_calories(calories: f64) -> CanonicalNutrients {
        CanonicalNutrients {
            calories,
            ..Default::default()
        }
    }

    #[test]
    fn lookback_window_spans_month_boundary() {
        let (start, end) = lookback_window(date!(2025 - 03 - 03), 7);
        assert_eq!(start, date!(2025 - 02 - 25));
        assert_eq!(end, date!(2025 - 03 - 03));
    }

    #[test]
    fn lookback_window_spans_year_boundary() {
        let (start, _) = lookback_window(date!(2026 - 01 - 02), 7);
        assert_eq!(start, date!(2025 - 12 - 27));
    }

    #[tokio::test]
    async fn three_entries_on_one_day_sum_in_daily_stats() {
        let store = test_store().await;
        let day = date!(2025 - 06 - 10);
        for calories in [300.0, 450.0, 220.0] {
            record_analysis(&store, 1, day, &legacy(calories))
                .await
                .unwrap();
        }
        let stats = daily_progress(&store, 1, day).await.unwrap().unwrap();
        assert_eq!(stats.totals.calories, 970.0);
        assert_eq!(stats.totals.protein, 30.0);
        assert_eq!(stats.totals.berries_g, 15.0);
    }

    #[tokio::test]
    async fn recompute_is_idempotent() {
        let store = test_store().await;
        let day = date!(2025 - 06 - 11);
        record_analysis(&store, 1, day, &legacy(640.0)).await.unwrap();

        let first = daily_progress(&store, 1, day).await.unwrap().unwrap();
        recompute_day(&store, 1, day).await.unwrap();
        recompute_day(&store, 1, day).await.unwrap();
        let second = daily_progress(&store, 1, day).await.unwrap().unwrap();

        assert_eq!(first.totals, second.totals);
        assert_eq!(first.date, second.date);
    }

    #[tokio::test]
    async fn daily_stats_match_entry_sums_after_any_recompute() {
        let store = test_store().await;
        let day = date!(2025 - 06 - 12);
        let mut expected = 0.0;
        for calories in [120.0, 85.5, 430.0, 212.5] {
            store
                .insert_entry(1, day, &only_calories(calories), &json!({}))
                .await
                .unwrap();
            expected += calories;
        }
        recompute_day(&store, 1, day).await.unwrap();
        let stats = daily_progress(&store, 1, day).await.unwrap().unwrap();
        assert_eq!(stats.totals.calories, expected);
    }

    #[tokio::test]
    async fn day_without_entries_has_no_stats_row() {
        let store = test_store().await;
        let stats = daily_progress(&store, 1, date!(2025 - 06 - 13)).await.unwrap();
        assert!(stats.is_none());
    }

    #[tokio::test]
    async fn weekly_range_counts_only_populated_days() {
        let store = test_store().await;
        record_analysis(&store, 1, date!(2025 - 06 - 02), &legacy(1800.0))
            .await
            .unwrap();
        record_analysis(&store, 1, date!(2025 - 06 - 05), &legacy(2100.0))
            .await
            .unwrap();

        let week = weekly_progress(&store, 1, date!(2025 - 06 - 07)).await.unwrap();
        assert_eq!(week.start, date!(2025 - 06 - 01));
        assert_eq!(week.totals.calories, 3900.0);
        assert_eq!(week.days_logged, 2);
    }

    #[tokio::test]
    async fn weekly_range_crosses_month_boundary() {
        let store = test_store().await;
        record_analysis(&store, 1, date!(2025 - 02 - 25), &legacy(1500.0))
            .await
            .unwrap();
        record_analysis(&store, 1, date!(2025 - 03 - 03), &legacy(500.0))
            .await
            .unwrap();
        // Outside the window, must not be counted.
        record_analysis(&store, 1, date!(2025 - 02 - 24), &legacy(999.0))
            .await
            .unwrap();

        let week = weekly_progress(&store, 1, date!(2025 - 03 - 03)).await.unwrap();
        assert_eq!(week.totals.calories, 2000.0);
    }

    #[tokio::test]
    async fn range_equals_sum_of_daily_lookups() {
        let store = test_store().await;
        for (day, calories) in [
            (date!(2025 - 07 - 01), 700.0),
            (date!(2025 - 07 - 03), 1250.0),
            (date!(2025 - 07 - 06), 400.0),
        ] {
            record_analysis(&store, 1, day, &legacy(calories)).await.unwrap();
        }

        let start = date!(2025 - 07 - 01);
        let end = date!(2025 - 07 - 07);
        let range = range_progress(&store, 1, start, end).await.unwrap();

        let mut summed = 0.0;
        let mut day = start;
        while day <= end {
            if let Some(stats) = daily_progress(&store, 1, day).await.unwrap() {
                summed += stats.totals.calories;
            }
            day = day.next_day().unwrap();
        }
        assert_eq!(range.totals.calories, summed);
        assert_eq!(range.totals.calories, 2350.0);
    }

    #[tokio::test]
    async fn empty_range_is_zero_not_an_error() {
        let store = test_store().await;
        let range = range_progress(&store, 1, date!(2025 - 01 - 01), date!(2025 - 01 - 07))
            .await
            .unwrap();
        assert_eq!(range.days_logged, 0);
        assert_eq!(range.totals, CanonicalNutrients::default());
    }

    #[tokio::test]
    async fn history_is_most_recent_first() {
        let store = test_store().await;
        let day = date!(2025 - 06 - 20);
        let mut ids = Vec::new();
        for calories in [100.0, 200.0, 300.0] {
            let recorded = record_analysis(&store, 1, day, &legacy(calories)).await.unwrap();
            ids.push(recorded.entry_id);
        }
        let entries = history(&store, 1, day, 7).await.unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].id, *ids.last().unwrap());
        assert_eq!(entries[2].id, ids[0]);
    }

    #[tokio::test]
    async fn recompute_all_covers_every_logged_day() {
        let store = test_store().await;
        record_analysis(&store, 1, date!(2025 - 05 - 01), &legacy(400.0))
            .await
            .unwrap();
        record_analysis(&store, 1, date!(2025 - 05 - 02), &legacy(500.0))
            .await
            .unwrap();
        record_analysis(&store, 1, date!(2025 - 05 - 02), &legacy(100.0))
            .await
            .unwrap();

        let days = recompute_all(&store, 1).await.unwrap();
        assert_eq!(days, 2);

        let second = daily_progress(&store, 1, date!(2025 - 05 - 02)).await.unwrap().unwrap();
        assert_eq!(second.totals.calories, 600.0);
    }

    #[tokio::test]
    async fn unrecognized_analysis_records_a_zeroed_entry() {
        let store = test_store().await;
        let day = date!(2025 - 06 - 21);
        let junk: FoodAnalysis = serde_json::from_value(json!({"blob": [1, 2, 3]})).unwrap();

        let recorded = record_analysis(&store, 1, day, &junk).await.unwrap();
        assert_eq!(recorded.shape, "unrecognized");
        assert_eq!(recorded.nutrients, CanonicalNutrients::default());

        let stats = daily_progress(&store, 1, day).await.unwrap().unwrap();
        assert_eq!(stats.totals.calories, 0.0);
    }

    #[tokio::test]
    async fn get_or_create_user_is_idempotent() {
        let store = test_store().await;
        let first = store.get_or_create_user(7, Some("bob"), None).await.unwrap();
        let second = store
            .get_or_create_user(7, Some("someone_else"), Some("Bob"))
            .await
            .unwrap();
        assert_eq!(first.user_id, second.user_id);
        assert_eq!(second.username.as_deref(), Some("bob"));
        assert_eq!(first.created_at, second.created_at);
    }

    #[tokio::test]
    async fn user_settings_round_trip() {
        let store = test_store().await;
        let settings = json!({"timezone": "Europe/Lisbon", "dietary_preferences": "standard"});
        store.update_user_settings(1, &settings).await.unwrap();
        let user = store.get_or_create_user(1, None, None).await.unwrap();
        assert_eq!(user.settings, settings);
    }
}
