use serde::{Deserialize, Serialize};

/// Flat analysis record produced by the older vision prompt. A single
/// confidence score, direct nutrient totals and a free-text explanation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyAnalysis {
    pub confidence: f64,
    pub total_calories: f64,
    #[serde(default)]
    pub total_protein: Option<f64>,
    #[serde(default)]
    pub total_carbs: Option<f64>,
    #[serde(default)]
    pub total_fat: Option<f64>,
    #[serde(default)]
    pub total_fiber: Option<f64>,
    #[serde(default)]
    pub berries_grams: Option<f64>,
    #[serde(default)]
    pub red_meat_grams: Option<f64>,
    #[serde(default)]
    pub seafood_grams: Option<f64>,
    #[serde(default)]
    pub nuts_grams: Option<f64>,
    #[serde(default)]
    pub olive_oil_ml: Option<f64>,
    #[serde(default)]
    pub vegetables_grams: Option<f64>,
    #[serde(default)]
    pub whole_grains_grams: Option<f64>,
    #[serde(default)]
    pub explanation: String,
}

/// One recognized food in a professional analysis, with its own nutrient
/// breakdown. Items arrive sorted descending by calorie contribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodItem {
    pub food: String,
    pub weight_g: f64,
    pub kcal: f64,
    pub protein_g: f64,
    pub fat_g: f64,
    pub carb_g: f64,
    #[serde(default)]
    pub fiber_g: Option<f64>,
    #[serde(default)]
    pub sugar_g: Option<f64>,
    #[serde(default)]
    pub calcium_mg: Option<f64>,
    #[serde(default)]
    pub iron_mg: Option<f64>,
    #[serde(default, rename = "vitaminA_mcg")]
    pub vitamin_a_mcg: Option<f64>,
    #[serde(default)]
    pub omega3_g: Option<f64>,
    #[serde(default)]
    pub cholesterol_mg: Option<f64>,
}

/// Nutrient superset summed across all items of a professional analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NutrientTotals {
    pub kcal: f64,
    pub protein_g: f64,
    pub fat_g: f64,
    pub carb_g: f64,
    #[serde(default)]
    pub fiber_g: Option<f64>,
    #[serde(default)]
    pub sugar_g: Option<f64>,
    #[serde(default)]
    pub calcium_mg: Option<f64>,
    #[serde(default)]
    pub iron_mg: Option<f64>,
    #[serde(default, rename = "vitaminA_mcg")]
    pub vitamin_a_mcg: Option<f64>,
    #[serde(default)]
    pub omega3_g: Option<f64>,
    #[serde(default)]
    pub cholesterol_mg: Option<f64>,
}

/// Each total expressed as a percentage of the daily-target table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NutrientPercents {
    pub kcal: f64,
    pub protein_g: f64,
    pub fat_g: f64,
    pub carb_g: f64,
    pub fiber_g: f64,
    pub sugar_g: f64,
    pub calcium_mg: f64,
    pub iron_mg: f64,
    #[serde(rename = "vitaminA_mcg")]
    pub vitamin_a_mcg: f64,
    pub omega3_g: f64,
    pub cholesterol_mg: f64,
}

/// Itemized analysis record produced by the current vision prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfessionalAnalysis {
    #[serde(default)]
    pub meal_id: String,
    #[serde(default)]
    pub items: Vec<FoodItem>,
    pub totals: NutrientTotals,
    #[serde(default)]
    pub percent_of_daily: Option<NutrientPercents>,
}

/// The two analysis shapes the model service can return, plus a catch-all
/// for payloads that match neither. Wire dispatch is untagged (professional
/// is identified by its required `totals`/`items`, legacy by its required
/// `confidence`/`total_calories`); everything downstream matches on the
/// variant, never on field presence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FoodAnalysis {
    Professional(ProfessionalAnalysis),
    Legacy(LegacyAnalysis),
    Unrecognized(serde_json::Value),
}

impl FoodAnalysis {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Professional(_) => "professional",
            Self::Legacy(_) => "legacy",
            Self::Unrecognized(_) => "unrecognized",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_professional_shape() {
        let payload = json!({
            "meal_id": "2025-08-01-breakfast",
            "items": [
                {"food": "oatmeal", "weight_g": 250.0, "kcal": 340, "protein_g": 12.0,
                 "fat_g": 6.0, "carb_g": 58.0, "fiber_g": 8.0}
            ],
            "totals": {"kcal": 540, "protein_g": 32.5, "fat_g": 14.0, "carb_g": 60.0},
            "percent_of_daily": {
                "kcal": 24.5, "protein_g": 21.7, "fat_g": 17.5, "carb_g": 21.8,
                "fiber_g": 0.0, "sugar_g": 0.0, "calcium_mg": 0.0, "iron_mg": 0.0,
                "vitaminA_mcg": 0.0, "omega3_g": 0.0, "cholesterol_mg": 0.0
            }
        });
        let parsed: FoodAnalysis = serde_json::from_value(payload).unwrap();
        match parsed {
            FoodAnalysis::Professional(p) => {
                assert_eq!(p.meal_id, "2025-08-01-breakfast");
                assert_eq!(p.items.len(), 1);
                assert_eq!(p.totals.kcal, 540.0);
                assert_eq!(p.totals.protein_g, 32.5);
            }
            other => panic!("expected professional, got {}", other.kind()),
        }
    }

    #[test]
    fn parses_legacy_shape() {
        let payload = json!({
            "confidence": 0.8,
            "total_calories": 620.0,
            "total_protein": 28.0,
            "berries_grams": 50.0,
            "explanation": "grilled chicken with berries"
        });
        let parsed: FoodAnalysis = serde_json::from_value(payload).unwrap();
        match parsed {
            FoodAnalysis::Legacy(l) => {
                assert_eq!(l.total_calories, 620.0);
                assert_eq!(l.berries_grams, Some(50.0));
                assert_eq!(l.total_fat, None);
            }
            other => panic!("expected legacy, got {}", other.kind()),
        }
    }

    #[test]
    fn unknown_payload_falls_through_to_unrecognized() {
        let payload = json!({"verdict": "looks tasty", "stars": 5});
        let parsed: FoodAnalysis = serde_json::from_value(payload).unwrap();
        assert_eq!(parsed.kind(), "unrecognized");
    }

    #[test]
    fn null_nutrient_fields_deserialize_as_absent() {
        let payload = json!({
            "confidence": 0.5,
            "total_calories": 300.0,
            "total_protein": null,
            "vegetables_grams": null
        });
        let parsed: FoodAnalysis = serde_json::from_value(payload).unwrap();
        match parsed {
            FoodAnalysis::Legacy(l) => {
                assert_eq!(l.total_protein, None);
                assert_eq!(l.vegetables_grams, None);
            }
            other => panic!("expected legacy, got {}", other.kind()),
        }
    }
}
