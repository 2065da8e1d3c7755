//! Document classification against an external model-serving endpoint.
//!
//! The server never loads a model itself. It resolves the production model
//! by name, forwards the text to the serving endpoint, and maps the two
//! failure modes (model unavailable, prediction failed) for the API layer.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("failed to load model '{model}': {cause}")]
    ModelLoad { model: String, cause: String },
    #[error("prediction failed: {cause}")]
    Prediction { cause: String },
}

#[async_trait]
pub trait DocumentClassifier: Send + Sync {
    async fn predict(&self, text: &str) -> Result<i64, ClassifierError>;
}

/// HTTP client for a model-serving endpoint.
///
/// Resolution and inference are two calls: the production version of the
/// named model is looked up first, then the text goes to that version's
/// invocation endpoint. No retries; the request timeout is the only policy.
#[derive(Clone)]
pub struct ServingClassifier {
    client: reqwest::Client,
    base_url: String,
    model_name: String,
}

#[derive(Debug, Deserialize)]
struct ProductionModel {
    serving_url: String,
}

#[derive(Debug, Deserialize)]
struct Predictions {
    predictions: Vec<i64>,
}

impl ServingClassifier {
    pub fn new(base_url: impl Into<String>, model_name: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: trim_trailing_slash(base_url.into()),
            model_name: model_name.into(),
        }
    }

    /// Reads `TB_MODEL_SERVING_URL` and `TB_MODEL_NAME`. Returns `None` when
    /// the serving URL is absent, in which case classification is disabled.
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("TB_MODEL_SERVING_URL").ok()?;
        if base_url.trim().is_empty() {
            return None;
        }
        let model_name =
            std::env::var("TB_MODEL_NAME").unwrap_or_else(|_| "document-classifier".to_string());
        Some(Self::new(base_url, model_name))
    }

    async fn resolve_production(&self) -> Result<String, ClassifierError> {
        let url = format!("{}/api/models/{}/production", self.base_url, self.model_name);
        let model_load = |cause: String| ClassifierError::ModelLoad {
            model: self.model_name.clone(),
            cause,
        };

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| model_load(e.to_string()))?;
        if !response.status().is_success() {
            return Err(model_load(format!("resolve returned {}", response.status())));
        }
        let resolved: ProductionModel = response
            .json()
            .await
            .map_err(|e| model_load(e.to_string()))?;
        Ok(trim_trailing_slash(resolved.serving_url))
    }
}

#[async_trait]
impl DocumentClassifier for ServingClassifier {
    async fn predict(&self, text: &str) -> Result<i64, ClassifierError> {
        let serving_url = self.resolve_production().await?;
        debug!(model = %self.model_name, %serving_url, "invoking model");

        let prediction = |cause: String| ClassifierError::Prediction { cause };
        let response = self
            .client
            .post(format!("{serving_url}/invocations"))
            .json(&json!({ "inputs": [text] }))
            .send()
            .await
            .map_err(|e| prediction(e.to_string()))?;
        if !response.status().is_success() {
            return Err(prediction(format!(
                "serving endpoint returned {}",
                response.status()
            )));
        }
        let body: Predictions = response.json().await.map_err(|e| prediction(e.to_string()))?;
        body.predictions
            .first()
            .copied()
            .ok_or_else(|| prediction("empty predictions array".to_string()))
    }
}

/// Fixed-answer classifier for tests and for deployments without a serving
/// endpoint configured.
#[derive(Debug, Clone, Default)]
pub struct StaticClassifier {
    prediction: Option<i64>,
}

impl StaticClassifier {
    pub fn always(prediction: i64) -> Self {
        Self {
            prediction: Some(prediction),
        }
    }

    pub fn unavailable() -> Self {
        Self { prediction: None }
    }
}

#[async_trait]
impl DocumentClassifier for StaticClassifier {
    async fn predict(&self, _text: &str) -> Result<i64, ClassifierError> {
        self.prediction.ok_or_else(|| ClassifierError::ModelLoad {
            model: "static".to_string(),
            cause: "no serving endpoint configured".to_string(),
        })
    }
}

fn trim_trailing_slash(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_classifier_returns_fixed_prediction() {
        let classifier = StaticClassifier::always(3);
        assert_eq!(classifier.predict("any text").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn unconfigured_classifier_reports_model_load_failure() {
        let classifier = StaticClassifier::unavailable();
        assert!(matches!(
            classifier.predict("any text").await,
            Err(ClassifierError::ModelLoad { .. })
        ));
    }

    #[test]
    fn base_url_is_normalized() {
        let classifier = ServingClassifier::new("http://serving.local/", "clf");
        assert_eq!(classifier.base_url, "http://serving.local");
    }
}
