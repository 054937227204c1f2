use std::fmt::Write as _;

use crate::analysis::targets::NutrientTargets;
use crate::store::DailyStatsRow;
use crate::tracker::dto::RangeReport;

/// Deterministic generation request for the morning plan: yesterday's
/// summary (when there is one), the running weekly totals against the
/// weekly category goals, and the task description for the text model.
pub fn build_planning_prompt(
    yesterday: Option<&DailyStatsRow>,
    week: &RangeReport,
    targets: &NutrientTargets,
) -> String {
    let yesterday_summary = match yesterday {
        Some(stats) => {
            let mut s = String::from("Yesterday's intake:\n");
            let _ = writeln!(s, "- Calories: {:.0} kcal", stats.totals.calories);
            let _ = writeln!(s, "- Protein: {:.1} g", stats.totals.protein);
            let _ = writeln!(s, "- Fiber: {:.1} g", stats.totals.fiber);
            let _ = writeln!(s, "- Berries: {:.0} g", stats.totals.berries_g);
            let _ = writeln!(s, "- Red meat: {:.0} g", stats.totals.red_meat_g);
            let _ = writeln!(s, "- Vegetables: {:.0} g", stats.totals.vegetables_g);
            s
        }
        None => "No data recorded for yesterday.\n".to_string(),
    };

    format!(
        "You are a personal nutritionist. Build today's meal plan for the user.\n\
         \n\
         RECOMMENDED DAILY TARGETS:\n\
         - Calories: {calories:.0} kcal\n\
         - Protein: {protein:.0} g\n\
         - Fiber: {fiber:.0} g\n\
         - Vegetables: 400-500 g\n\
         - Nuts: 30-50 g\n\
         \n\
         YESTERDAY:\n\
         {yesterday_summary}\
         \n\
         THIS WEEK ({start} to {end}, {days} days logged):\n\
         - Berries: {berries:.0} g of {berries_target:.0} g target\n\
         - Red meat: {red_meat:.0} g of {red_meat_max:.0} g weekly maximum\n\
         - Seafood: {seafood:.0} g of {seafood_target:.0} g target\n\
         - Nuts: {nuts:.0} g\n\
         - Vegetables: {vegetables:.0} g\n\
         \n\
         TASK:\n\
         Write a motivating message with today's plan:\n\
         1. Greet the user and briefly assess yesterday.\n\
         2. Give concrete goals for today (calories, protein, fiber).\n\
         3. Recommend specific foods that close the weekly gaps.\n\
         4. Emphasize whatever the week is still missing.\n\
         Keep it friendly and around 150-200 words.",
        calories = targets.daily_calories,
        protein = targets.daily_protein_g,
        fiber = targets.daily_fiber_g,
        yesterday_summary = yesterday_summary,
        start = week.start,
        end = week.end,
        days = week.days_logged,
        berries = week.totals.berries_g,
        berries_target = targets.weekly_berries_g,
        red_meat = week.totals.red_meat_g,
        red_meat_max = targets.weekly_red_meat_max_g,
        seafood = week.totals.seafood_g,
        seafood_target = targets.weekly_seafood_g,
        nuts = week.totals.nuts_g,
        vegetables = week.totals.vegetables_g,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    use crate::analysis::CanonicalNutrients;

    fn week() -> RangeReport {
        RangeReport {
            start: date!(2025 - 03 - 01),
            end: date!(2025 - 03 - 07),
            days_logged: 3,
            totals: CanonicalNutrients {
                berries_g: 120.0,
                red_meat_g: 350.0,
                seafood_g: 150.0,
                ..Default::default()
            },
        }
    }

    #[test]
    fn missing_yesterday_is_stated_not_invented() {
        let prompt = build_planning_prompt(None, &week(), &NutrientTargets::default());
        assert!(prompt.contains("No data recorded for yesterday."));
        assert!(!prompt.contains("Yesterday's intake:"));
    }

    #[test]
    fn weekly_totals_and_targets_appear() {
        let prompt = build_planning_prompt(None, &week(), &NutrientTargets::default());
        assert!(prompt.contains("Berries: 120 g of 175 g target"));
        assert!(prompt.contains("Red meat: 350 g of 700 g weekly maximum"));
        assert!(prompt.contains("2025-03-01 to 2025-03-07"));
    }

    #[test]
    fn yesterday_summary_carries_the_numbers() {
        let stats = DailyStatsRow {
            user_id: 1,
            date: date!(2025 - 03 - 06),
            totals: CanonicalNutrients {
                calories: 1850.0,
                protein: 92.5,
                fiber: 28.0,
                ..Default::default()
            },
            updated_at: time::OffsetDateTime::UNIX_EPOCH,
        };
        let prompt = build_planning_prompt(Some(&stats), &week(), &NutrientTargets::default());
        assert!(prompt.contains("Calories: 1850 kcal"));
        assert!(prompt.contains("Protein: 92.5 g"));
    }
}
