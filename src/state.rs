use std::sync::Arc;

use crate::config::AppConfig;
use crate::store::{Database, NutritionStore};
use crate::vision::openai::OpenAiClient;
use crate::vision::ModelClient;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn NutritionStore>,
    pub model: Arc<dyn ModelClient>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = Database::connect(&config.database_url).await?;
        tracing::info!(backend = db.backend_name(), "store connected");
        db.migrate().await?;

        let model = Arc::new(OpenAiClient::new(&config.model)) as Arc<dyn ModelClient>;

        Ok(Self {
            store: Arc::new(db),
            model,
            config,
        })
    }

    pub fn from_parts(
        store: Arc<dyn NutritionStore>,
        model: Arc<dyn ModelClient>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            store,
            model,
            config,
        }
    }

    /// In-memory state for tests: embedded store plus a scripted model that
    /// answers every photo with a fixed professional analysis and every text
    /// prompt with a canned string.
    pub async fn fake() -> Self {
        use async_trait::async_trait;
        use serde_json::json;

        use crate::analysis::FoodAnalysis;
        use crate::vision::ModelError;

        struct FakeModel;

        #[async_trait]
        impl ModelClient for FakeModel {
            async fn analyze_image(
                &self,
                _image: &[u8],
                _prompt: &str,
            ) -> Result<FoodAnalysis, ModelError> {
                let payload = json!({
                    "meal_id": "fake-meal",
                    "items": [],
                    "totals": {"kcal": 500, "protein_g": 30.0, "fat_g": 20.0, "carb_g": 45.0,
                               "fiber_g": 6.0}
                });
                serde_json::from_value(payload).map_err(|e| ModelError::Malformed(e.to_string()))
            }

            async fn generate_text(&self, _prompt: &str) -> Result<String, ModelError> {
                Ok("generated message".to_string())
            }
        }

        let db = Database::connect("sqlite::memory:")
            .await
            .expect("in-memory store");
        db.migrate().await.expect("migrate in-memory store");

        let config = Arc::new(AppConfig {
            database_url: "sqlite::memory:".into(),
            model: crate::config::ModelConfig {
                api_key: "test".into(),
                model: "test-model".into(),
                base_url: "http://fake.local/v1".into(),
            },
        });

        Self {
            store: Arc::new(db),
            model: Arc::new(FakeModel),
            config,
        }
    }
}
