use serde::{Deserialize, Serialize};

use super::models::{NutrientPercents, NutrientTotals};

/// Daily targets for the professional nutrient superset; used to express
/// analysis totals as percent-of-daily. Sugar and cholesterol are maximums.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyTargets {
    pub kcal: f64,
    pub protein_g: f64,
    pub fat_g: f64,
    pub carb_g: f64,
    pub fiber_g: f64,
    pub sugar_g: f64,
    pub calcium_mg: f64,
    pub iron_mg: f64,
    pub vitamin_a_mcg: f64,
    pub omega3_g: f64,
    pub cholesterol_mg: f64,
}

impl Default for DailyTargets {
    fn default() -> Self {
        Self {
            kcal: 2200.0,
            protein_g: 150.0,
            fat_g: 80.0,
            carb_g: 275.0,
            fiber_g: 50.0,
            sugar_g: 50.0,
            calcium_mg: 1000.0,
            iron_mg: 18.0,
            vitamin_a_mcg: 900.0,
            omega3_g: 2.0,
            cholesterol_mg: 300.0,
        }
    }
}

/// Planning and reporting targets for the tracked nutrients: daily macros
/// plus the weekly category goals (red meat is a weekly maximum).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NutrientTargets {
    pub daily_calories: f64,
    pub daily_protein_g: f64,
    pub daily_fiber_g: f64,
    pub weekly_berries_g: f64,
    pub weekly_red_meat_max_g: f64,
    pub weekly_seafood_g: f64,
}

impl Default for NutrientTargets {
    fn default() -> Self {
        Self {
            daily_calories: 2200.0,
            daily_protein_g: 150.0,
            daily_fiber_g: 50.0,
            weekly_berries_g: 175.0,
            weekly_red_meat_max_g: 700.0,
            weekly_seafood_g: 300.0,
        }
    }
}

/// Express totals as percent of the daily targets, rounded to one decimal.
/// A non-positive target yields 0 rather than a division error.
pub fn percent_of_daily(totals: &NutrientTotals, targets: &DailyTargets) -> NutrientPercents {
    NutrientPercents {
        kcal: pct(totals.kcal, targets.kcal),
        protein_g: pct(totals.protein_g, targets.protein_g),
        fat_g: pct(totals.fat_g, targets.fat_g),
        carb_g: pct(totals.carb_g, targets.carb_g),
        fiber_g: pct(totals.fiber_g.unwrap_or(0.0), targets.fiber_g),
        sugar_g: pct(totals.sugar_g.unwrap_or(0.0), targets.sugar_g),
        calcium_mg: pct(totals.calcium_mg.unwrap_or(0.0), targets.calcium_mg),
        iron_mg: pct(totals.iron_mg.unwrap_or(0.0), targets.iron_mg),
        vitamin_a_mcg: pct(totals.vitamin_a_mcg.unwrap_or(0.0), targets.vitamin_a_mcg),
        omega3_g: pct(totals.omega3_g.unwrap_or(0.0), targets.omega3_g),
        cholesterol_mg: pct(totals.cholesterol_mg.unwrap_or(0.0), targets.cholesterol_mg),
    }
}

fn pct(value: f64, target: f64) -> f64 {
    if target > 0.0 {
        (value / target * 1000.0).round() / 10.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percents_round_to_one_decimal() {
        let totals = NutrientTotals {
            kcal: 540.0,
            protein_g: 32.5,
            fat_g: 14.0,
            carb_g: 60.0,
            fiber_g: Some(7.5),
            ..Default::default()
        };
        let p = percent_of_daily(&totals, &DailyTargets::default());
        assert_eq!(p.kcal, 24.5); // 540 / 2200 = 24.54..%
        assert_eq!(p.protein_g, 21.7); // 32.5 / 150 = 21.66..%
        assert_eq!(p.fiber_g, 15.0);
        assert_eq!(p.omega3_g, 0.0);
    }

    #[test]
    fn zero_target_gives_zero_percent() {
        let totals = NutrientTotals {
            kcal: 500.0,
            ..Default::default()
        };
        let targets = DailyTargets {
            kcal: 0.0,
            ..Default::default()
        };
        assert_eq!(percent_of_daily(&totals, &targets).kcal, 0.0);
    }
}
