use crate::analysis::targets::NutrientTargets;
use crate::store::DailyStatsRow;
use crate::tracker::dto::RangeReport;

/// Compliance classification for calories against the daily target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalorieStatus {
    Over,
    Under,
    OnTarget,
}

impl CalorieStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Over => "over target",
            Self::Under => "under target",
            Self::OnTarget => "on target",
        }
    }
}

/// Over when actual exceeds the target by more than 10%, under when it falls
/// short by more than 20%, otherwise on target.
pub fn classify_calories(actual: f64, target: f64) -> CalorieStatus {
    if actual > target * 1.1 {
        CalorieStatus::Over
    } else if actual < target * 0.8 {
        CalorieStatus::Under
    } else {
        CalorieStatus::OnTarget
    }
}

/// Percent of target, zero when the target is non-positive.
pub fn percent_of(actual: f64, target: f64) -> f64 {
    if target > 0.0 {
        actual / target * 100.0
    } else {
        0.0
    }
}

/// Deterministic generation request for the evening report: today's numbers
/// classified against the daily targets, the weekly totals against the
/// weekly goals, and the task description for the text model.
pub fn build_report_prompt(
    today: &DailyStatsRow,
    week: &RangeReport,
    targets: &NutrientTargets,
) -> String {
    let calorie_status = classify_calories(today.totals.calories, targets.daily_calories);
    let protein_percent = percent_of(today.totals.protein, targets.daily_protein_g);
    let fiber_percent = percent_of(today.totals.fiber, targets.daily_fiber_g);
    let berries_week_percent = percent_of(week.totals.berries_g, targets.weekly_berries_g);
    let red_meat_week_percent = percent_of(week.totals.red_meat_g, targets.weekly_red_meat_max_g);

    format!(
        "You are a personal nutritionist. Write the evening report for the user's day.\n\
         \n\
         RECOMMENDED TARGETS:\n\
         - Calories: {cal_target:.0} kcal per day\n\
         - Protein: {protein_target:.0} g per day\n\
         - Fiber: {fiber_target:.0} g per day\n\
         - Berries: {berries_target:.0} g per week\n\
         - Red meat: at most {red_meat_max:.0} g per week\n\
         \n\
         TODAY ({date}):\n\
         - Calories: {calories:.0} kcal ({status})\n\
         - Protein: {protein:.1} g ({protein_percent:.0}% of target)\n\
         - Carbs: {carbs:.1} g\n\
         - Fat: {fat:.1} g\n\
         - Fiber: {fiber:.1} g ({fiber_percent:.0}% of target)\n\
         - Berries: {berries:.0} g\n\
         - Red meat: {red_meat:.0} g\n\
         - Seafood: {seafood:.0} g\n\
         - Vegetables: {vegetables:.0} g\n\
         - Nuts: {nuts:.0} g\n\
         \n\
         THIS WEEK:\n\
         - Berries: {week_berries:.0} g ({berries_week_percent:.0}% of the weekly target)\n\
         - Red meat: {week_red_meat:.0} g ({red_meat_week_percent:.0}% of the weekly limit)\n\
         - Seafood: {week_seafood:.0} g\n\
         - Nuts: {week_nuts:.0} g\n\
         - Vegetables: {week_vegetables:.0} g\n\
         \n\
         TASK:\n\
         Write a personal report:\n\
         1. Score the day out of 10 and explain the score.\n\
         2. Call out what went well.\n\
         3. Point out what to improve.\n\
         4. Give recommendations for tomorrow considering the weekly balance.\n\
         5. If calories ran over, suggest a correction for tomorrow.\n\
         Keep the tone friendly and constructive, around 200-300 words.",
        cal_target = targets.daily_calories,
        protein_target = targets.daily_protein_g,
        fiber_target = targets.daily_fiber_g,
        berries_target = targets.weekly_berries_g,
        red_meat_max = targets.weekly_red_meat_max_g,
        date = today.date,
        calories = today.totals.calories,
        status = calorie_status.label(),
        protein = today.totals.protein,
        protein_percent = protein_percent,
        carbs = today.totals.carbs,
        fat = today.totals.fat,
        fiber = today.totals.fiber,
        fiber_percent = fiber_percent,
        berries = today.totals.berries_g,
        red_meat = today.totals.red_meat_g,
        seafood = today.totals.seafood_g,
        vegetables = today.totals.vegetables_g,
        nuts = today.totals.nuts_g,
        week_berries = week.totals.berries_g,
        berries_week_percent = berries_week_percent,
        week_red_meat = week.totals.red_meat_g,
        red_meat_week_percent = red_meat_week_percent,
        week_seafood = week.totals.seafood_g,
        week_nuts = week.totals.nuts_g,
        week_vegetables = week.totals.vegetables_g,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    use crate::analysis::CanonicalNutrients;

    #[test]
    fn calorie_classification_thresholds() {
        let target = 2200.0;
        assert_eq!(classify_calories(2421.0, target), CalorieStatus::Over); // > 110%
        assert_eq!(classify_calories(2420.0, target), CalorieStatus::OnTarget); // exactly 110%
        assert_eq!(classify_calories(1760.0, target), CalorieStatus::OnTarget); // exactly 80%
        assert_eq!(classify_calories(1759.0, target), CalorieStatus::Under); // < 80%
        assert_eq!(classify_calories(2200.0, target), CalorieStatus::OnTarget);
    }

    #[test]
    fn percent_of_target_handles_zero_target() {
        assert_eq!(percent_of(75.0, 150.0), 50.0);
        assert_eq!(percent_of(75.0, 0.0), 0.0);
    }

    #[test]
    fn report_prompt_classifies_and_quantifies_the_day() {
        let today = DailyStatsRow {
            user_id: 1,
            date: date!(2025 - 03 - 03),
            totals: CanonicalNutrients {
                calories: 2500.0,
                protein: 75.0,
                fiber: 25.0,
                ..Default::default()
            },
            updated_at: time::OffsetDateTime::UNIX_EPOCH,
        };
        let week = RangeReport {
            start: date!(2025 - 02 - 25),
            end: date!(2025 - 03 - 03),
            days_logged: 4,
            totals: CanonicalNutrients {
                berries_g: 87.5,
                red_meat_g: 350.0,
                ..Default::default()
            },
        };
        let prompt = build_report_prompt(&today, &week, &NutrientTargets::default());
        assert!(prompt.contains("Calories: 2500 kcal (over target)"));
        assert!(prompt.contains("Protein: 75.0 g (50% of target)"));
        assert!(prompt.contains("Fiber: 25.0 g (50% of target)"));
        assert!(prompt.contains("Berries: 88 g (50% of the weekly target)"));
        assert!(prompt.contains("Red meat: 350 g (50% of the weekly limit)"));
    }
}
