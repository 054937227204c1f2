use time::{Date, Time};

use crate::analysis::targets::DailyTargets;

/// Meal slot inferred from the wall-clock hour, used to build meal ids like
/// `2025-08-01-breakfast`.
pub fn meal_slot(time: Time) -> &'static str {
    match time.hour() {
        6..=10 => "breakfast",
        11..=15 => "lunch",
        16..=21 => "dinner",
        _ => "snack",
    }
}

pub fn meal_id(date: Date, time: Time) -> String {
    format!("{date}-{}", meal_slot(time))
}

/// Analysis prompt for the vision model. The structured-output contract
/// mirrors the professional analysis shape; the daily-target table is passed
/// as context so the model can fill `percent_of_daily`.
pub fn food_analysis_prompt(meal_id: &str, targets: &DailyTargets) -> String {
    let targets_json = serde_json::to_string(targets).unwrap_or_else(|_| "{}".to_string());
    format!(
        "Analyze this photo of a meal and estimate its nutrient content.\n\
         \n\
         Identify every visible food, estimate its weight in grams, and compute\n\
         calories and macronutrients per item. Account for cooking method (frying\n\
         adds calories), sauces, dressings, and hidden ingredients such as oil or\n\
         sugar. When uncertain, prefer the higher calorie estimate.\n\
         \n\
         Respond with a single JSON object:\n\
         - \"meal_id\": the meal id from the context below\n\
         - \"items\": array of foods sorted by descending calories, each with\n\
           food, weight_g, kcal, protein_g, fat_g, carb_g, fiber_g, sugar_g,\n\
           calcium_mg, iron_mg, vitaminA_mcg, omega3_g, cholesterol_mg\n\
         - \"totals\": the same nutrient fields summed across all items\n\
         - \"percent_of_daily\": each total as a percent of the daily targets,\n\
           rounded to one decimal, without a percent sign\n\
         \n\
         Context:\n\
         meal_id: {meal_id}\n\
         daily_targets: {targets_json}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, time};

    #[test]
    fn meal_slot_follows_hour_of_day() {
        assert_eq!(meal_slot(time!(7:30)), "breakfast");
        assert_eq!(meal_slot(time!(12:00)), "lunch");
        assert_eq!(meal_slot(time!(19:45)), "dinner");
        assert_eq!(meal_slot(time!(23:10)), "snack");
        assert_eq!(meal_slot(time!(2:00)), "snack");
    }

    #[test]
    fn meal_id_combines_date_and_slot() {
        assert_eq!(meal_id(date!(2025 - 08 - 01), time!(8:00)), "2025-08-01-breakfast");
    }

    #[test]
    fn analysis_prompt_carries_context() {
        let prompt = food_analysis_prompt("2025-08-01-lunch", &DailyTargets::default());
        assert!(prompt.contains("meal_id: 2025-08-01-lunch"));
        assert!(prompt.contains("\"kcal\":2200.0"));
    }
}
