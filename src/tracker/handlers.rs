use axum::{
    extract::{DefaultBodyLimit, Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use time::OffsetDateTime;
use tracing::{error, instrument};

use super::dto::{
    DayQuery, HistoryQuery, PhotoRequest, RangeQuery, RecomputeResponse, RecordedEntry,
};
use super::service;
use crate::analysis::targets::DailyTargets;
use crate::state::AppState;
use crate::store::{DailyStatsRow, FoodEntryRow};
use crate::vision::prompt as vision_prompt;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/:user_id/photos", post(analyze_photo))
        .route("/users/:user_id/stats/day", get(day_stats))
        .route("/users/:user_id/stats/range", get(range_stats))
        .route("/users/:user_id/history", get(food_history))
        .route("/users/:user_id/recompute", post(recompute_all))
        .route("/users/:user_id/settings", put(update_settings))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB photos
}

/// POST /users/:id/photos — analyze one meal photo and record the result.
#[instrument(skip(state, body))]
async fn analyze_photo(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(body): Json<PhotoRequest>,
) -> Result<(StatusCode, Json<RecordedEntry>), (StatusCode, String)> {
    let image = STANDARD
        .decode(&body.image_b64)
        .map(Bytes::from)
        .map_err(|_| (StatusCode::BAD_REQUEST, "image_b64 is not valid base64".to_string()))?;

    state
        .store
        .get_or_create_user(user_id, body.username.as_deref(), body.first_name.as_deref())
        .await
        .map_err(internal)?;

    let now = OffsetDateTime::now_utc();
    let prompt = vision_prompt::food_analysis_prompt(
        &vision_prompt::meal_id(now.date(), now.time()),
        &DailyTargets::default(),
    );

    let analysis = match state.model.analyze_image(&image, &prompt).await {
        Ok(analysis) => analysis,
        Err(e) => {
            error!(error = %e, user_id, "photo analysis failed");
            return Err((
                StatusCode::BAD_GATEWAY,
                "couldn't analyze that photo, try again with better lighting".into(),
            ));
        }
    };

    let recorded = service::record_analysis(state.store.as_ref(), user_id, now.date(), &analysis)
        .await
        .map_err(internal)?;

    Ok((StatusCode::CREATED, Json(recorded)))
}

/// GET /users/:id/stats/day?date= — cached lookup, 404 when nothing logged.
#[instrument(skip(state))]
async fn day_stats(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(q): Query<DayQuery>,
) -> Result<Json<DailyStatsRow>, (StatusCode, String)> {
    let date = q.date.unwrap_or_else(|| OffsetDateTime::now_utc().date());
    let stats = service::daily_progress(state.store.as_ref(), user_id, date)
        .await
        .map_err(internal)?;
    match stats {
        Some(row) => Ok(Json(row)),
        None => Err((
            StatusCode::NOT_FOUND,
            "no meals logged for this day yet".into(),
        )),
    }
}

/// GET /users/:id/stats/range?start=&end= — defaults to the last 7 days.
#[instrument(skip(state))]
async fn range_stats(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(q): Query<RangeQuery>,
) -> Result<Json<super::dto::RangeReport>, (StatusCode, String)> {
    let end = q.end.unwrap_or_else(|| OffsetDateTime::now_utc().date());
    let report = match q.start {
        Some(start) => service::range_progress(state.store.as_ref(), user_id, start, end).await,
        None => service::weekly_progress(state.store.as_ref(), user_id, end).await,
    }
    .map_err(internal)?;
    Ok(Json(report))
}

/// GET /users/:id/history?days= — entries newest first.
#[instrument(skip(state))]
async fn food_history(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(q): Query<HistoryQuery>,
) -> Result<Json<Vec<FoodEntryRow>>, (StatusCode, String)> {
    let anchor = OffsetDateTime::now_utc().date();
    let entries = service::history(state.store.as_ref(), user_id, anchor, q.days)
        .await
        .map_err(internal)?;
    Ok(Json(entries))
}

/// POST /users/:id/recompute — idempotent maintenance: rebuild every daily
/// stats row the user has entries for.
#[instrument(skip(state))]
async fn recompute_all(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<RecomputeResponse>, (StatusCode, String)> {
    let days_recomputed = service::recompute_all(state.store.as_ref(), user_id)
        .await
        .map_err(internal)?;
    Ok(Json(RecomputeResponse { days_recomputed }))
}

/// PUT /users/:id/settings — replace the free-form settings blob.
#[instrument(skip(state, settings))]
async fn update_settings(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(settings): Json<serde_json::Value>,
) -> Result<StatusCode, (StatusCode, String)> {
    state
        .store
        .get_or_create_user(user_id, None, None)
        .await
        .map_err(internal)?;
    state
        .store
        .update_user_settings(user_id, &settings)
        .await
        .map_err(internal)?;
    Ok(StatusCode::NO_CONTENT)
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "something went wrong, please try again".into(),
    )
}
