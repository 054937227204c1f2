use time::Date;
use tracing::info;

use super::prompt::build_report_prompt;
use crate::analysis::targets::NutrientTargets;
use crate::store::NutritionStore;
use crate::tracker::service as tracker;
use crate::vision::ModelClient;

/// Fixed reply when nothing has been logged today; no model call is made.
pub const NO_DATA_MESSAGE: &str =
    "No meals logged today yet. Send a photo of your next meal and the evening \
     report will have something to work with!";

/// Collect today's stats and the weekly aggregate, then ask the text model
/// for the evening report. A day without data gets the fixed message.
pub async fn generate_daily_report(
    store: &dyn NutritionStore,
    model: &dyn ModelClient,
    user_id: i64,
    today: Date,
) -> anyhow::Result<String> {
    let Some(today_stats) = store.get_daily(user_id, today).await? else {
        return Ok(NO_DATA_MESSAGE.to_string());
    };
    let week = tracker::weekly_progress(store, user_id, today).await?;

    let prompt = build_report_prompt(&today_stats, &week, &NutrientTargets::default());
    let report = model.generate_text(&prompt).await?;
    info!(user_id, "daily report generated");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::date;

    use crate::analysis::FoodAnalysis;
    use crate::state::AppState;
    use crate::tracker::service::record_analysis;

    #[tokio::test]
    async fn empty_day_gets_the_fixed_message_without_a_model_call() {
        let state = AppState::fake().await;
        state.store.get_or_create_user(1, None, None).await.unwrap();
        let report = generate_daily_report(
            state.store.as_ref(),
            state.model.as_ref(),
            1,
            date!(2025 - 03 - 03),
        )
        .await
        .unwrap();
        assert_eq!(report, NO_DATA_MESSAGE);
    }

    #[tokio::test]
    async fn logged_day_goes_through_the_model() {
        let state = AppState::fake().await;
        state.store.get_or_create_user(1, None, None).await.unwrap();
        let analysis: FoodAnalysis = serde_json::from_value(json!({
            "confidence": 0.9,
            "total_calories": 2100.0
        }))
        .unwrap();
        record_analysis(state.store.as_ref(), 1, date!(2025 - 03 - 03), &analysis)
            .await
            .unwrap();

        let report = generate_daily_report(
            state.store.as_ref(),
            state.model.as_ref(),
            1,
            date!(2025 - 03 - 03),
        )
        .await
        .unwrap();
        assert_eq!(report, "generated message");
    }
}
