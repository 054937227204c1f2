use anyhow::bail;
use async_trait::async_trait;
use serde_json::Value;
use time::Date;
use tracing::info;

use super::postgres::PostgresStore;
use super::sqlite::SqliteStore;
use super::{DailyStatsRow, FoodEntryRow, NutritionStore, RangeTotals, UserRow};
use crate::analysis::CanonicalNutrients;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Sqlite,
    Postgres,
}

/// Detect the backend from the connection string scheme.
pub fn detect_backend(database_url: &str) -> anyhow::Result<BackendKind> {
    if database_url.starts_with("sqlite:") {
        Ok(BackendKind::Sqlite)
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok(BackendKind::Postgres)
    } else {
        bail!("unsupported database url: {database_url}")
    }
}

/// Store instance wrapper delegating to the backend selected at startup.
/// Business logic only ever sees the [`NutritionStore`] trait.
#[derive(Clone)]
pub enum Database {
    Sqlite(SqliteStore),
    Postgres(PostgresStore),
}

impl Database {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        match detect_backend(database_url)? {
            BackendKind::Sqlite => {
                info!("using embedded sqlite store");
                Ok(Self::Sqlite(SqliteStore::connect(database_url).await?))
            }
            BackendKind::Postgres => {
                info!("using postgres store");
                Ok(Self::Postgres(PostgresStore::connect(database_url).await?))
            }
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "sqlite",
            Self::Postgres(_) => "postgres",
        }
    }
}

#[async_trait]
impl NutritionStore for Database {
    async fn migrate(&self) -> anyhow::Result<()> {
        match self {
            Self::Sqlite(s) => s.migrate().await,
            Self::Postgres(s) => s.migrate().await,
        }
    }

    async fn get_or_create_user(
        &self,
        user_id: i64,
        username: Option<&str>,
        first_name: Option<&str>,
    ) -> anyhow::Result<UserRow> {
        match self {
            Self::Sqlite(s) => s.get_or_create_user(user_id, username, first_name).await,
            Self::Postgres(s) => s.get_or_create_user(user_id, username, first_name).await,
        }
    }

    async fn update_user_settings(&self, user_id: i64, settings: &Value) -> anyhow::Result<()> {
        match self {
            Self::Sqlite(s) => s.update_user_settings(user_id, settings).await,
            Self::Postgres(s) => s.update_user_settings(user_id, settings).await,
        }
    }

    async fn insert_entry(
        &self,
        user_id: i64,
        date: Date,
        nutrients: &CanonicalNutrients,
        analysis: &Value,
    ) -> anyhow::Result<i64> {
        match self {
            Self::Sqlite(s) => s.insert_entry(user_id, date, nutrients, analysis).await,
            Self::Postgres(s) => s.insert_entry(user_id, date, nutrients, analysis).await,
        }
    }

    async fn recompute_daily(&self, user_id: i64, date: Date) -> anyhow::Result<()> {
        match self {
            Self::Sqlite(s) => s.recompute_daily(user_id, date).await,
            Self::Postgres(s) => s.recompute_daily(user_id, date).await,
        }
    }

    async fn get_daily(&self, user_id: i64, date: Date) -> anyhow::Result<Option<DailyStatsRow>> {
        match self {
            Self::Sqlite(s) => s.get_daily(user_id, date).await,
            Self::Postgres(s) => s.get_daily(user_id, date).await,
        }
    }

    async fn range_totals(
        &self,
        user_id: i64,
        start: Date,
        end: Date,
    ) -> anyhow::Result<RangeTotals> {
        match self {
            Self::Sqlite(s) => s.range_totals(user_id, start, end).await,
            Self::Postgres(s) => s.range_totals(user_id, start, end).await,
        }
    }

    async fn entry_history(&self, user_id: i64, since: Date) -> anyhow::Result<Vec<FoodEntryRow>> {
        match self {
            Self::Sqlite(s) => s.entry_history(user_id, since).await,
            Self::Postgres(s) => s.entry_history(user_id, since).await,
        }
    }

    async fn entry_dates(&self, user_id: i64) -> anyhow::Result<Vec<Date>> {
        match self {
            Self::Sqlite(s) => s.entry_dates(user_id).await,
            Self::Postgres(s) => s.entry_dates(user_id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_backend_from_url_scheme() {
        assert_eq!(
            detect_backend("sqlite:nutrilog.db").unwrap(),
            BackendKind::Sqlite
        );
        assert_eq!(
            detect_backend("sqlite::memory:").unwrap(),
            BackendKind::Sqlite
        );
        assert_eq!(
            detect_backend("postgres://app@db/nutrilog").unwrap(),
            BackendKind::Postgres
        );
        assert_eq!(
            detect_backend("postgresql://app@db/nutrilog").unwrap(),
            BackendKind::Postgres
        );
        assert!(detect_backend("mysql://nope").is_err());
    }

    #[tokio::test]
    async fn in_memory_store_migrates() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        assert_eq!(db.backend_name(), "sqlite");
        db.migrate().await.unwrap();
        // Running migrations twice must be harmless.
        db.migrate().await.unwrap();
    }
}
