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
pub struct PlanResponse {
    pub message: String,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/users/:user_id/plan", get(daily_plan))
}

/// GET /users/:id/plan — today's generated meal plan.
#[instrument(skip(state))]
async fn daily_plan(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<PlanResponse>, (StatusCode, String)> {
    let today = OffsetDateTime::now_utc().date();
    match service::create_daily_plan(state.store.as_ref(), state.model.as_ref(), user_id, today)
        .await
    {
        Ok(message) => Ok(Json(PlanResponse { message })),
        Err(e) if e.downcast_ref::<ModelError>().is_some() => {
            error!(error = %e, user_id, "plan generation failed at the model");
            Err((
                StatusCode::BAD_GATEWAY,
                "plan unavailable right now, please try again".into(),
            ))
        }
        Err(e) => {
            error!(error = %e, user_id, "plan generation failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "something went wrong, please try again".into(),
            ))
        }
    }
}
