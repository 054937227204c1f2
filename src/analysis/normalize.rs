use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use super::models::FoodAnalysis;

/// The fixed nutrient tuple used for storage and aggregation regardless of
/// which analysis shape produced it. All values are non-negative; fields a
/// shape does not carry normalize to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CanonicalNutrients {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
    pub berries_g: f64,
    pub red_meat_g: f64,
    pub seafood_g: f64,
    pub nuts_g: f64,
    pub vegetables_g: f64,
}

#[derive(Debug, Error)]
#[error("unrecognized analysis shape")]
pub struct UnrecognizedShape;

impl CanonicalNutrients {
    /// Lenient normalization. An unrecognized payload degrades to an all-zero
    /// record with a warning instead of failing: under-recording a meal beats
    /// losing it to a format mismatch.
    pub fn from_analysis(analysis: &FoodAnalysis) -> Self {
        match Self::try_from_analysis(analysis) {
            Ok(n) => n,
            Err(UnrecognizedShape) => {
                warn!("analysis payload matched no known shape, recording zeroed nutrients");
                Self::default()
            }
        }
    }

    /// Strict normalization for migration and test contexts: an unrecognized
    /// shape is an error rather than a silent zero record.
    pub fn try_from_analysis(analysis: &FoodAnalysis) -> Result<Self, UnrecognizedShape> {
        match analysis {
            FoodAnalysis::Professional(p) => Ok(Self {
                calories: clamp(Some(p.totals.kcal)),
                protein: clamp(Some(p.totals.protein_g)),
                carbs: clamp(Some(p.totals.carb_g)),
                fat: clamp(Some(p.totals.fat_g)),
                fiber: clamp(p.totals.fiber_g),
                // Category weights are not derivable from itemized data yet;
                // they stay zero for this shape.
                berries_g: 0.0,
                red_meat_g: 0.0,
                seafood_g: 0.0,
                nuts_g: 0.0,
                vegetables_g: 0.0,
            }),
            FoodAnalysis::Legacy(l) => Ok(Self {
                calories: clamp(Some(l.total_calories)),
                protein: clamp(l.total_protein),
                carbs: clamp(l.total_carbs),
                fat: clamp(l.total_fat),
                fiber: clamp(l.total_fiber),
                berries_g: clamp(l.berries_grams),
                red_meat_g: clamp(l.red_meat_grams),
                seafood_g: clamp(l.seafood_grams),
                nuts_g: clamp(l.nuts_grams),
                vegetables_g: clamp(l.vegetables_grams),
            }),
            FoodAnalysis::Unrecognized(_) => Err(UnrecognizedShape),
        }
    }
}

fn clamp(value: Option<f64>) -> f64 {
    // f64::max returns the other operand for NaN, so this also maps NaN to 0.
    value.unwrap_or(0.0).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(payload: serde_json::Value) -> FoodAnalysis {
        serde_json::from_value(payload).unwrap()
    }

    #[test]
    fn professional_totals_map_to_canonical_macros() {
        let analysis = parse(json!({
            "meal_id": "2025-08-01-lunch",
            "items": [],
            "totals": {"kcal": 540, "protein_g": 32.5, "fat_g": 14.0, "carb_g": 60.0, "fiber_g": 7.5}
        }));
        let n = CanonicalNutrients::from_analysis(&analysis);
        assert_eq!(n.calories, 540.0);
        assert_eq!(n.protein, 32.5);
        assert_eq!(n.carbs, 60.0);
        assert_eq!(n.fat, 14.0);
        assert_eq!(n.fiber, 7.5);
        assert_eq!(n.berries_g, 0.0);
        assert_eq!(n.red_meat_g, 0.0);
        assert_eq!(n.vegetables_g, 0.0);
    }

    #[test]
    fn legacy_fields_map_directly_and_absent_fields_default() {
        let analysis = parse(json!({
            "confidence": 0.7,
            "total_calories": 480.0,
            "total_protein": 22.0,
            "red_meat_grams": 150.0
        }));
        let n = CanonicalNutrients::from_analysis(&analysis);
        assert_eq!(n.calories, 480.0);
        assert_eq!(n.protein, 22.0);
        assert_eq!(n.red_meat_g, 150.0);
        assert_eq!(n.carbs, 0.0);
        assert_eq!(n.fiber, 0.0);
        assert_eq!(n.seafood_g, 0.0);
    }

    #[test]
    fn negative_inputs_clamp_to_zero() {
        let analysis = parse(json!({
            "confidence": 0.4,
            "total_calories": -120.0,
            "total_fat": -3.0
        }));
        let n = CanonicalNutrients::from_analysis(&analysis);
        assert_eq!(n.calories, 0.0);
        assert_eq!(n.fat, 0.0);
    }

    #[test]
    fn unrecognized_shape_degrades_to_zeroes() {
        let analysis = parse(json!({"nonsense": true}));
        let n = CanonicalNutrients::from_analysis(&analysis);
        assert_eq!(n, CanonicalNutrients::default());
    }

    #[test]
    fn strict_mode_rejects_unrecognized_shape() {
        let analysis = parse(json!({"nonsense": true}));
        assert!(CanonicalNutrients::try_from_analysis(&analysis).is_err());
    }
}
