use anyhow::Context;
use time::Date;
use tracing::info;

use super::prompt::build_planning_prompt;
use crate::analysis::targets::NutrientTargets;
use crate::store::NutritionStore;
use crate::tracker::service as tracker;
use crate::vision::ModelClient;

/// Collect yesterday's stats and the weekly aggregate, then ask the text
/// model for today's plan. Any model failure propagates; the caller decides
/// how to phrase "try again".
pub async fn create_daily_plan(
    store: &dyn NutritionStore,
    model: &dyn ModelClient,
    user_id: i64,
    today: Date,
) -> anyhow::Result<String> {
    let yesterday = today.previous_day().context("no previous calendar day")?;
    let yesterday_stats = store.get_daily(user_id, yesterday).await?;
    let week = tracker::weekly_progress(store, user_id, today).await?;

    let prompt = build_planning_prompt(
        yesterday_stats.as_ref(),
        &week,
        &NutrientTargets::default(),
    );
    let plan = model.generate_text(&prompt).await?;
    info!(user_id, "daily plan generated");
    Ok(plan)
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
    async fn plan_is_generated_even_without_any_history() {
        let state = AppState::fake().await;
        state
            .store
            .get_or_create_user(1, None, None)
            .await
            .unwrap();
        let plan = create_daily_plan(
            state.store.as_ref(),
            state.model.as_ref(),
            1,
            date!(2025 - 03 - 03),
        )
        .await
        .unwrap();
        assert_eq!(plan, "generated message");
    }

    #[tokio::test]
    async fn plan_uses_stats_recorded_earlier_in_the_week() {
        let state = AppState::fake().await;
        state
            .store
            .get_or_create_user(1, None, None)
            .await
            .unwrap();
        let analysis: FoodAnalysis = serde_json::from_value(json!({
            "confidence": 0.9,
            "total_calories": 800.0,
            "berries_grams": 60.0
        }))
        .unwrap();
        record_analysis(state.store.as_ref(), 1, date!(2025 - 03 - 02), &analysis)
            .await
            .unwrap();

        // The scripted model ignores the prompt; this only checks the data
        // collection path end to end.
        let plan = create_daily_plan(
            state.store.as_ref(),
            state.model.as_ref(),
            1,
            date!(2025 - 03 - 03),
        )
        .await
        .unwrap();
        assert!(!plan.is_empty());
    }
}
