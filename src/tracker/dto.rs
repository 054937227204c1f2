use serde::{Deserialize, Serialize};
use time::Date;

use crate::analysis::CanonicalNutrients;

/// Outcome of recording one analyzed photo. `stats_refreshed: false` means
/// the entry is durably saved but the daily cache is stale until the next
/// recompute; the caller may retry via the recompute endpoint.
#[derive(Debug, Serialize)]
pub struct RecordedEntry {
    pub entry_id: i64,
    pub date: Date,
    pub shape: &'static str,
    #[serde(flatten)]
    pub nutrients: CanonicalNutrients,
    pub stats_refreshed: bool,
}

#[derive(Debug, Serialize)]
pub struct RangeReport {
    pub start: Date,
    pub end: Date,
    pub days_logged: i64,
    #[serde(flatten)]
    pub totals: CanonicalNutrients,
}

#[derive(Debug, Deserialize)]
pub struct PhotoRequest {
    pub image_b64: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DayQuery {
    #[serde(default)]
    pub date: Option<Date>,
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    #[serde(default)]
    pub start: Option<Date>,
    #[serde(default)]
    pub end: Option<Date>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_history_days")]
    pub days: i64,
}

fn default_history_days() -> i64 {
    7
}

#[derive(Debug, Serialize)]
pub struct RecomputeResponse {
    pub days_recomputed: usize,
}
