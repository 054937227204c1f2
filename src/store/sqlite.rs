use std::str::FromStr;

use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use time::{Date, OffsetDateTime};

use super::{DailyStatsRow, FoodEntryRow, NutritionStore, RangeTotals, UserRow};
use crate::analysis::CanonicalNutrients;

/// Embedded single-file store for development; `sqlite::memory:` in tests.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("parse sqlite url {database_url}"))?
            .create_if_missing(true);

        // An in-memory database exists per connection, so the pool must not
        // hand out a second one.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .context("connect to sqlite")?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl NutritionStore for SqliteStore {
    async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                user_id INTEGER PRIMARY KEY,
                username TEXT,
                first_name TEXT,
                created_at TEXT NOT NULL,
                settings TEXT NOT NULL DEFAULT '{}'
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("create users table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS food_entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users (user_id),
                date TEXT NOT NULL,
                timestamp TEXT NOT NULL,

                total_calories REAL NOT NULL DEFAULT 0,
                total_protein REAL NOT NULL DEFAULT 0,
                total_carbs REAL NOT NULL DEFAULT 0,
                total_fat REAL NOT NULL DEFAULT 0,
                total_fiber REAL NOT NULL DEFAULT 0,

                berries_grams REAL NOT NULL DEFAULT 0,
                red_meat_grams REAL NOT NULL DEFAULT 0,
                seafood_grams REAL NOT NULL DEFAULT 0,
                nuts_grams REAL NOT NULL DEFAULT 0,
                vegetables_grams REAL NOT NULL DEFAULT 0,

                analysis_json TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("create food_entries table")?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_food_entries_user_date \
             ON food_entries (user_id, date)",
        )
        .execute(&self.pool)
        .await
        .context("create food_entries index")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS daily_stats (
                user_id INTEGER NOT NULL REFERENCES users (user_id),
                date TEXT NOT NULL,

                total_calories REAL NOT NULL DEFAULT 0,
                total_protein REAL NOT NULL DEFAULT 0,
                total_carbs REAL NOT NULL DEFAULT 0,
                total_fat REAL NOT NULL DEFAULT 0,
                total_fiber REAL NOT NULL DEFAULT 0,

                berries_grams REAL NOT NULL DEFAULT 0,
                red_meat_grams REAL NOT NULL DEFAULT 0,
                seafood_grams REAL NOT NULL DEFAULT 0,
                nuts_grams REAL NOT NULL DEFAULT 0,
                vegetables_grams REAL NOT NULL DEFAULT 0,

                updated_at TEXT NOT NULL,
                PRIMARY KEY (user_id, date)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("create daily_stats table")?;

        Ok(())
    }

    async fn get_or_create_user(
        &self,
        user_id: i64,
        username: Option<&str>,
        first_name: Option<&str>,
    ) -> anyhow::Result<UserRow> {
        sqlx::query(
            r#"
            INSERT INTO users (user_id, username, first_name, created_at, settings)
            VALUES (?, ?, ?, ?, '{}')
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(username)
        .bind(first_name)
        .bind(OffsetDateTime::now_utc())
        .execute(&self.pool)
        .await
        .context("insert user")?;

        let user = sqlx::query_as::<_, UserRow>(
            "SELECT user_id, username, first_name, created_at, settings \
             FROM users WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .context("fetch user")?;
        Ok(user)
    }

    async fn update_user_settings(&self, user_id: i64, settings: &Value) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET settings = ? WHERE user_id = ?")
            .bind(sqlx::types::Json(settings))
            .bind(user_id)
            .execute(&self.pool)
            .await
            .context("update user settings")?;
        Ok(())
    }

    async fn insert_entry(
        &self,
        user_id: i64,
        date: Date,
        nutrients: &CanonicalNutrients,
        analysis: &Value,
    ) -> anyhow::Result<i64> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO food_entries (
                user_id, date, timestamp,
                total_calories, total_protein, total_carbs, total_fat, total_fiber,
                berries_grams, red_meat_grams, seafood_grams, nuts_grams, vegetables_grams,
                analysis_json
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(date)
        .bind(OffsetDateTime::now_utc())
        .bind(nutrients.calories)
        .bind(nutrients.protein)
        .bind(nutrients.carbs)
        .bind(nutrients.fat)
        .bind(nutrients.fiber)
        .bind(nutrients.berries_g)
        .bind(nutrients.red_meat_g)
        .bind(nutrients.seafood_g)
        .bind(nutrients.nuts_g)
        .bind(nutrients.vegetables_g)
        .bind(sqlx::types::Json(analysis))
        .fetch_one(&self.pool)
        .await
        .context("insert food entry")?;
        Ok(id)
    }

    async fn recompute_daily(&self, user_id: i64, date: Date) -> anyhow::Result<()> {
        // Full recomputation from the day's entries in one upsert; the SELECT
        // yields no row (and writes nothing) when the day is empty.
        sqlx::query(
            r#"
            INSERT INTO daily_stats (
                user_id, date,
                total_calories, total_protein, total_carbs, total_fat, total_fiber,
                berries_grams, red_meat_grams, seafood_grams, nuts_grams, vegetables_grams,
                updated_at
            )
            SELECT
                user_id, date,
                SUM(total_calories), SUM(total_protein), SUM(total_carbs),
                SUM(total_fat), SUM(total_fiber),
                SUM(berries_grams), SUM(red_meat_grams), SUM(seafood_grams),
                SUM(nuts_grams), SUM(vegetables_grams),
                ?
            FROM food_entries
            WHERE user_id = ? AND date = ?
            GROUP BY user_id, date
            ON CONFLICT (user_id, date) DO UPDATE SET
                total_calories = excluded.total_calories,
                total_protein = excluded.total_protein,
                total_carbs = excluded.total_carbs,
                total_fat = excluded.total_fat,
                total_fiber = excluded.total_fiber,
                berries_grams = excluded.berries_grams,
                red_meat_grams = excluded.red_meat_grams,
                seafood_grams = excluded.seafood_grams,
                nuts_grams = excluded.nuts_grams,
                vegetables_grams = excluded.vegetables_grams,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(OffsetDateTime::now_utc())
        .bind(user_id)
        .bind(date)
        .execute(&self.pool)
        .await
        .context("recompute daily stats")?;
        Ok(())
    }

    async fn get_daily(&self, user_id: i64, date: Date) -> anyhow::Result<Option<DailyStatsRow>> {
        let row = sqlx::query_as::<_, DailyStatsRow>(
            r#"
            SELECT user_id, date,
                   total_calories AS calories, total_protein AS protein,
                   total_carbs AS carbs, total_fat AS fat, total_fiber AS fiber,
                   berries_grams AS berries_g, red_meat_grams AS red_meat_g,
                   seafood_grams AS seafood_g, nuts_grams AS nuts_g,
                   vegetables_grams AS vegetables_g,
                   updated_at
            FROM daily_stats
            WHERE user_id = ? AND date = ?
            "#,
        )
        .bind(user_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await
        .context("fetch daily stats")?;
        Ok(row)
    }

    async fn range_totals(
        &self,
        user_id: i64,
        start: Date,
        end: Date,
    ) -> anyhow::Result<RangeTotals> {
        let totals = sqlx::query_as::<_, RangeTotals>(
            r#"
            SELECT
                COALESCE(SUM(total_calories), 0.0) AS calories,
                COALESCE(SUM(total_protein), 0.0) AS protein,
                COALESCE(SUM(total_carbs), 0.0) AS carbs,
                COALESCE(SUM(total_fat), 0.0) AS fat,
                COALESCE(SUM(total_fiber), 0.0) AS fiber,
                COALESCE(SUM(berries_grams), 0.0) AS berries_g,
                COALESCE(SUM(red_meat_grams), 0.0) AS red_meat_g,
                COALESCE(SUM(seafood_grams), 0.0) AS seafood_g,
                COALESCE(SUM(nuts_grams), 0.0) AS nuts_g,
                COALESCE(SUM(vegetables_grams), 0.0) AS vegetables_g,
                COUNT(*) AS days_logged
            FROM daily_stats
            WHERE user_id = ? AND date >= ? AND date <= ?
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await
        .context("sum daily stats over range")?;
        Ok(totals)
    }

    async fn entry_history(
        &self,
        user_id: i64,
        since: Date,
    ) -> anyhow::Result<Vec<FoodEntryRow>> {
        let rows = sqlx::query_as::<_, FoodEntryRow>(
            r#"
            SELECT id, user_id, date, timestamp,
                   total_calories AS calories, total_protein AS protein,
                   total_carbs AS carbs, total_fat AS fat, total_fiber AS fiber,
                   berries_grams AS berries_g, red_meat_grams AS red_meat_g,
                   seafood_grams AS seafood_g, nuts_grams AS nuts_g,
                   vegetables_grams AS vegetables_g,
                   analysis_json AS analysis
            FROM food_entries
            WHERE user_id = ? AND date >= ?
            ORDER BY timestamp DESC, id DESC
            "#,
        )
        .bind(user_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .context("fetch food history")?;
        Ok(rows)
    }

    async fn entry_dates(&self, user_id: i64) -> anyhow::Result<Vec<Date>> {
        let dates: Vec<Date> = sqlx::query_scalar(
            "SELECT DISTINCT date FROM food_entries WHERE user_id = ? ORDER BY date",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("list entry dates")?;
        Ok(dates)
    }
}
