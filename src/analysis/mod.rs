pub mod models;
pub mod normalize;
pub mod targets;

pub use models::{FoodAnalysis, LegacyAnalysis, NutrientTotals, ProfessionalAnalysis};
pub use normalize::CanonicalNutrients;
