use crate::model::{
    ApiEnvelope, ClientConfig, FeatureRequestAck, FeatureRequestBody, OntologyCatalog,
    PredictRequest, PredictionResult, RequestValidationError, ScoreRequest, ScoreResult,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const API_KEY_HEADER: &str = "X-API-Key";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("API key required. Set one with `alphagenome-cli config set-key` or --api-key.")]
    MissingApiKey,
    #[error(transparent)]
    Invalid(#[from] RequestValidationError),
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{0}")]
    Service(String),
    #[error("malformed response from {endpoint}: {source}")]
    Envelope {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

/// Stateless request issuer for the AlphaGenome Explorer backend.
///
/// The API key travels per request in a header and is never logged.
#[derive(Clone)]
pub struct AlphaGenomeClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl AlphaGenomeClient {
    pub fn new(cfg: &ClientConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .timeout(cfg.request_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
        })
    }

    pub async fn predict_variant(
        &self,
        request: &PredictRequest,
    ) -> Result<PredictionResult, ApiError> {
        self.post_json("/api/predict/variant", request).await
    }

    pub async fn score_variant(&self, request: &ScoreRequest) -> Result<ScoreResult, ApiError> {
        self.post_json("/api/predict/score", request).await
    }

    pub async fn ontologies(&self) -> Result<OntologyCatalog, ApiError> {
        self.get_json("/api/metadata/ontologies").await
    }

    /// Register interest in a tool that is not backed by the service yet.
    /// This endpoint is unauthenticated and speaks flat JSON, no envelope.
    pub async fn request_feature(
        &self,
        body: &FeatureRequestBody,
    ) -> Result<FeatureRequestAck, ApiError> {
        let endpoint = "/api/feature-request";
        let req = self.http.post(self.url(endpoint)).json(body);
        let ack: FeatureRequestAck = self.dispatch_raw(endpoint, req).await?;
        if !ack.success {
            let message = if ack.message.is_empty() {
                "request failed".to_string()
            } else {
                ack.message
            };
            return Err(ApiError::Service(message));
        }
        Ok(ack)
    }

    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        self.get_json("/health").await
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    fn key(&self) -> Result<&str, ApiError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(ApiError::MissingApiKey)
    }

    async fn post_json<B, T>(&self, endpoint: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let req = self
            .http
            .post(self.url(endpoint))
            .json(body)
            .header(API_KEY_HEADER, self.key()?);
        self.dispatch(endpoint, req).await
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        let req = self.http.get(self.url(endpoint));
        self.dispatch(endpoint, req).await
    }

    async fn dispatch<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        req: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let envelope: ApiEnvelope<T> = self.dispatch_raw(endpoint, req).await?;
        envelope_data(envelope)
    }

    async fn dispatch_raw<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        req: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        debug!(endpoint, "issuing API request");
        let resp = req.send().await.map_err(|source| ApiError::Transport {
            endpoint: endpoint.to_string(),
            source,
        })?;

        let status = resp.status();
        if !status.is_success() {
            // HTTP-level failures carry a `detail` payload (or a flat
            // `error` string) instead of the usual envelope.
            let payload = resp.json::<serde_json::Value>().await.ok();
            let message = payload
                .as_ref()
                .and_then(extract_error)
                .unwrap_or_else(|| format!("request failed with status {status}"));
            return Err(ApiError::Service(message));
        }

        resp.json().await.map_err(|source| ApiError::Envelope {
            endpoint: endpoint.to_string(),
            source,
        })
    }
}

fn envelope_data<T>(envelope: ApiEnvelope<T>) -> Result<T, ApiError> {
    if !envelope.success {
        return Err(ApiError::Service(
            envelope
                .error
                .unwrap_or_else(|| "request failed".to_string()),
        ));
    }
    envelope
        .data
        .ok_or_else(|| ApiError::Service("response envelope had no data".to_string()))
}

/// Pull the human-readable message out of an error payload, which is
/// `{"detail": {"message": "..."}}`, `{"detail": "..."}`, or a flat
/// `{"error": "..."}`.
fn extract_error(value: &serde_json::Value) -> Option<String> {
    if let Some(detail) = value.get("detail") {
        if let Some(message) = detail.get("message").and_then(|m| m.as_str()) {
            return Some(message.to_string());
        }
        if let Some(message) = detail.as_str() {
            return Some(message.to_string());
        }
    }
    value
        .get("error")
        .and_then(|e| e.as_str())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_extraction_prefers_nested_message() {
        let nested = json!({"detail": {"message": "invalid variant"}});
        assert_eq!(extract_error(&nested).as_deref(), Some("invalid variant"));

        let flat = json!({"detail": "rate limited"});
        assert_eq!(extract_error(&flat).as_deref(), Some("rate limited"));

        let plain = json!({"error": "Too many requests. Please try again later."});
        assert_eq!(
            extract_error(&plain).as_deref(),
            Some("Too many requests. Please try again later.")
        );

        let missing = json!({"status": "nope"});
        assert_eq!(extract_error(&missing), None);
    }

    #[test]
    fn envelope_failure_maps_to_service_error() {
        let envelope: ApiEnvelope<PredictionResult> = ApiEnvelope {
            success: false,
            data: None,
            error: Some("upstream unavailable".to_string()),
            export: None,
        };
        match envelope_data(envelope) {
            Err(ApiError::Service(msg)) => assert_eq!(msg, "upstream unavailable"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn successful_envelope_without_data_is_an_error() {
        let envelope: ApiEnvelope<PredictionResult> = ApiEnvelope {
            success: true,
            data: None,
            error: None,
            export: None,
        };
        assert!(matches!(
            envelope_data(envelope),
            Err(ApiError::Service(_))
        ));
    }

    #[test]
    fn missing_key_is_reported_before_any_request() {
        let cfg = ClientConfig {
            base_url: "http://localhost:8000".to_string(),
            api_key: None,
            request_timeout: std::time::Duration::from_secs(30),
            user_agent: "test".to_string(),
        };
        let client = AlphaGenomeClient::new(&cfg).unwrap();
        assert!(matches!(client.key(), Err(ApiError::MissingApiKey)));

        let cfg = ClientConfig {
            api_key: Some(String::new()),
            ..cfg
        };
        let client = AlphaGenomeClient::new(&cfg).unwrap();
        assert!(matches!(client.key(), Err(ApiError::MissingApiKey)));
    }
}
