//! HTTP client for the model-serving API.
//!
//! Wraps `reqwest` with typed request/response handling for the two
//! endpoints the engine consumes: `POST /v1/relevance` and
//! `POST /v1/forecast`. Responses are range-checked against the endpoint
//! contract before acceptance; transient failures are retried with
//! exponential back-off.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};

use trendlab_core::model::{PeakForecast, RawSignal};
use trendlab_core::ports::{
    ForecastContext, ForecastError, ForecastModel, RelevanceScorer, ScoreError,
};
use trendlab_core::BusinessContext;

use crate::error::ModelError;
use crate::retry::retry_with_backoff;
use crate::types::{ForecastResponse, RelevanceRequest, RelevanceResponse};

const DEFAULT_MAX_RETRIES: u32 = 2;
const DEFAULT_BACKOFF_BASE_MS: u64 = 500;

/// Client for the model-serving API.
///
/// Manages the HTTP client, optional API key, base URL, and retry policy.
/// Point `base_url` at a mock server in tests.
pub struct ModelClient {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl ModelClient {
    /// Creates a new client for the given endpoint with the default retry
    /// policy.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ModelError::ApiError`] if `base_url` is
    /// not a valid URL.
    pub fn new(
        base_url: &str,
        api_key: Option<&str>,
        timeout_secs: u64,
    ) -> Result<Self, ModelError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("trendlab/0.1 (trend-intelligence)")
            .build()?;

        // Normalise: ensure the base URL ends with exactly one slash so that
        // Url::join appends endpoint paths rather than replacing the last
        // path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| ModelError::ApiError(format!("invalid base URL '{base_url}': {e}")))?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.map(ToOwned::to_owned),
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
        })
    }

    /// Overrides the retry policy (attempts beyond the first, back-off base).
    #[must_use]
    pub fn with_retry_policy(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Scores a signal's relevance to the business, 0–100.
    ///
    /// # Errors
    ///
    /// - [`ModelError::ApiError`] if the service returns an error envelope.
    /// - [`ModelError::Http`] on network failure or non-2xx HTTP status
    ///   (after retries).
    /// - [`ModelError::Deserialize`] if the response does not match the
    ///   expected shape.
    /// - [`ModelError::OutOfRange`] if the score is outside 0–100.
    pub async fn score_relevance(&self, request: &RelevanceRequest) -> Result<u8, ModelError> {
        let url = self.endpoint("v1/relevance")?;
        let body = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.post_json(&url, request)
        })
        .await?;
        Self::check_api_error(&body)?;

        let parsed: RelevanceResponse =
            serde_json::from_value(body).map_err(|e| ModelError::Deserialize {
                context: format!("relevance(keyword={})", request.keyword),
                source: e,
            })?;

        let score = check_range("score", parsed.score, 0, 100)?;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Ok(score as u8)
    }

    /// Requests a peak forecast for the given trend context.
    ///
    /// The endpoint contract is `days_until_peak` in 1–30 and `confidence`
    /// in 0–100; anything outside is rejected as [`ModelError::OutOfRange`].
    ///
    /// # Errors
    ///
    /// Same failure modes as [`ModelClient::score_relevance`].
    pub async fn forecast_peak(
        &self,
        context: &ForecastContext,
    ) -> Result<PeakForecast, ModelError> {
        let url = self.endpoint("v1/forecast")?;
        let body = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.post_json(&url, context)
        })
        .await?;
        Self::check_api_error(&body)?;

        let parsed: ForecastResponse =
            serde_json::from_value(body).map_err(|e| ModelError::Deserialize {
                context: format!("forecast(keyword={})", context.keyword),
                source: e,
            })?;

        let days_until_peak = check_range("days_until_peak", parsed.days_until_peak, 1, 30)?;
        let confidence = check_range("confidence", parsed.confidence, 0, 100)?;

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Ok(PeakForecast {
            days_until_peak,
            confidence: confidence as u8,
            reasoning: parsed.reasoning,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ModelError> {
        self.base_url
            .join(path)
            .map_err(|e| ModelError::ApiError(format!("invalid endpoint path '{path}': {e}")))
    }

    /// Sends a POST with a JSON body, asserts a 2xx HTTP status, and parses
    /// the response body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Http`] on network failure or a non-2xx status.
    /// Returns [`ModelError::Deserialize`] if the body is not valid JSON.
    async fn post_json<B: serde::Serialize>(
        &self,
        url: &Url,
        body: &B,
    ) -> Result<serde_json::Value, ModelError> {
        let mut request = self.client.post(url.clone()).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().await?;
        let response = response.error_for_status()?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| ModelError::Deserialize {
            context: url.to_string(),
            source: e,
        })
    }

    /// Checks the top-level `"error"` field and returns an error if present.
    fn check_api_error(body: &serde_json::Value) -> Result<(), ModelError> {
        if let Some(msg) = body.get("error").and_then(serde_json::Value::as_str) {
            return Err(ModelError::ApiError(msg.to_string()));
        }
        Ok(())
    }
}

fn check_range(field: &'static str, value: i64, min: i64, max: i64) -> Result<i64, ModelError> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(ModelError::OutOfRange { field, value })
    }
}

#[async_trait]
impl ForecastModel for ModelClient {
    async fn predict_peak(&self, context: &ForecastContext) -> Result<PeakForecast, ForecastError> {
        self.forecast_peak(context).await.map_err(|e| match e {
            ModelError::Deserialize { .. } | ModelError::OutOfRange { .. } => {
                ForecastError::malformed(e)
            }
            other => ForecastError::unavailable(other),
        })
    }
}

/// [`RelevanceScorer`] adapter: pairs a shared [`ModelClient`] with the
/// business context every request is scored against.
pub struct ModelRelevanceScorer {
    client: Arc<ModelClient>,
    context: BusinessContext,
}

impl ModelRelevanceScorer {
    #[must_use]
    pub fn new(client: Arc<ModelClient>, context: BusinessContext) -> Self {
        Self { client, context }
    }
}

#[async_trait]
impl RelevanceScorer for ModelRelevanceScorer {
    async fn score(&self, signal: &RawSignal) -> Result<u8, ScoreError> {
        let request = RelevanceRequest::for_signal(&self.context, signal);
        self.client
            .score_relevance(&request)
            .await
            .map_err(|e| match e {
                ModelError::Deserialize { .. } | ModelError::OutOfRange { .. } => {
                    ScoreError::malformed(e)
                }
                other => ScoreError::unavailable(other),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base_url: &str) -> ModelClient {
        ModelClient::new(base_url, Some("test-key"), 30)
            .expect("client construction should not fail")
    }

    #[test]
    fn endpoint_joins_path_onto_base() {
        let client = test_client("http://model.internal:8800");
        let url = client.endpoint("v1/forecast").unwrap();
        assert_eq!(url.as_str(), "http://model.internal:8800/v1/forecast");
    }

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let client = test_client("http://model.internal:8800/");
        let url = client.endpoint("v1/relevance").unwrap();
        assert_eq!(url.as_str(), "http://model.internal:8800/v1/relevance");
    }

    #[test]
    fn check_range_accepts_bounds() {
        assert!(check_range("score", 0, 0, 100).is_ok());
        assert!(check_range("score", 100, 0, 100).is_ok());
    }

    #[test]
    fn check_range_rejects_outside_bounds() {
        let result = check_range("days_until_peak", 0, 1, 30);
        assert!(
            matches!(
                result,
                Err(ModelError::OutOfRange {
                    field: "days_until_peak",
                    value: 0
                })
            ),
            "expected OutOfRange, got: {result:?}"
        );
    }
}
