use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{error, instrument};

use super::service;
use crate::state::AppState;
use crate::vision::ModelError;

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub message: String,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/users/:user_id/report", get(daily_report))
}

/// GET /users/:id/report — the generated evening report for today.
#[instrument(skip(state))]
async fn daily_report(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<ReportResponse>, (StatusCode, String)> {
    let today = OffsetDateTime::now_utc().date();
    match service::generate_daily_report(
        state.store.as_ref(),
        state.model.as_ref(),
        user_id,
        today,
    )
    .await
    {
        Ok(message) => Ok(Json(ReportResponse { message })),
        Err(e) if e.downcast_ref::<ModelError>().is_some() => {
            error!(error = %e, user_id, "report generation failed at the model");
            Err((
                StatusCode::BAD_GATEWAY,
                "report unavailable right now, please try again".into(),
            ))
        }
        Err(e) => {
            error!(error = %e, user_id, "report generation failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "something went wrong, please try again".into(),
            ))
        }
    }
}
