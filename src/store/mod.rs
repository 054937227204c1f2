pub mod factory;
pub mod postgres;
pub mod sqlite;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use time::{Date, OffsetDateTime};

use crate::analysis::CanonicalNutrients;

pub use factory::Database;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRow {
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub created_at: OffsetDateTime,
    pub settings: Value,
}

/// One immutable analyzed-meal record. `analysis` is the full original
/// payload kept for audit; aggregation only ever reads the nutrient columns.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FoodEntryRow {
    pub id: i64,
    pub user_id: i64,
    pub date: Date,
    pub timestamp: OffsetDateTime,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub nutrients: CanonicalNutrients,
    pub analysis: Value,
}

/// Cached per-user-per-day nutrient sums. Recomputed in full from the
/// entries of that day; never incrementally adjusted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DailyStatsRow {
    pub user_id: i64,
    pub date: Date,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub totals: CanonicalNutrients,
    pub updated_at: OffsetDateTime,
}

/// Aggregate sums over a date range of daily stats. Days without a cached
/// row contribute zero; `days_logged` counts the rows that did exist.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RangeTotals {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub totals: CanonicalNutrients,
    pub days_logged: i64,
}

/// Abstract persistence capability the tracker is written against. Two
/// concrete backings exist (embedded SQLite for development, PostgreSQL for
/// production); business logic never sees which one is active.
#[async_trait]
pub trait NutritionStore: Send + Sync {
    /// Create the schema if it does not exist yet.
    async fn migrate(&self) -> anyhow::Result<()>;

    /// Idempotent get-or-create keyed by the externally supplied user id.
    async fn get_or_create_user(
        &self,
        user_id: i64,
        username: Option<&str>,
        first_name: Option<&str>,
    ) -> anyhow::Result<UserRow>;

    /// Replace the free-form settings blob for a user.
    async fn update_user_settings(&self, user_id: i64, settings: &Value) -> anyhow::Result<()>;

    /// Insert one immutable food entry. The single-statement insert is the
    /// atomic unit of recording a meal; returns the new entry id.
    async fn insert_entry(
        &self,
        user_id: i64,
        date: Date,
        nutrients: &CanonicalNutrients,
        analysis: &Value,
    ) -> anyhow::Result<i64>;

    /// Recompute the daily stats row for (user, date) as the full sum over
    /// that day's entries. Idempotent; writes nothing when the day has no
    /// entries.
    async fn recompute_daily(&self, user_id: i64, date: Date) -> anyhow::Result<()>;

    /// Cached lookup; `None` when no stats row exists for that day.
    async fn get_daily(&self, user_id: i64, date: Date) -> anyhow::Result<Option<DailyStatsRow>>;

    /// Sum daily stats over `start..=end`. Absent days contribute zero.
    async fn range_totals(&self, user_id: i64, start: Date, end: Date)
        -> anyhow::Result<RangeTotals>;

    /// Entries on or after `since`, most recent first.
    async fn entry_history(&self, user_id: i64, since: Date) -> anyhow::Result<Vec<FoodEntryRow>>;

    /// Distinct dates that have at least one entry, ascending. Drives the
    /// recompute-all maintenance operation.
    async fn entry_dates(&self, user_id: i64) -> anyhow::Result<Vec<Date>>;
}
