use super::{GenerationClient, GenerationError};
use crate::services::GenerationConfig;
use anyhow::Result;
use base64::prelude::{Engine, BASE64_STANDARD};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

const IMAGE_SIZE: &str = "1024x1024";

#[derive(Serialize)]
struct ImageRequest {
    model: String,
    prompt: String,
    n: u8,
    size: String,
    response_format: String,
}

#[derive(Deserialize)]
struct ImageResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Deserialize)]
struct ImageData {
    b64_json: String,
}

#[derive(Deserialize, Default)]
struct ApiErrorEnvelope {
    error: Option<ApiError>,
}

/// Structured error body the upstream returns alongside non-2xx statuses
#[derive(Deserialize, Default)]
struct ApiError {
    #[serde(default)]
    message: String,
    #[serde(rename = "type")]
    kind: Option<String>,
    code: Option<String>,
}

/// OpenAI image generation client
pub struct OpenAiImageClient {
    model: String,
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiImageClient {
    /// Create a new client. An absent or placeholder key is rejected here,
    /// before any network call is ever attempted.
    pub fn new(config: &GenerationConfig) -> Result<Self, GenerationError> {
        if config.api_key.is_empty() || config.api_key == "sk-..." {
            return Err(GenerationError::MissingCredentials);
        }

        Ok(Self {
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        })
    }
}

#[async_trait::async_trait]
impl GenerationClient for OpenAiImageClient {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, GenerationError> {
        let request = ImageRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            n: 1,
            size: IMAGE_SIZE.to_string(),
            response_format: "b64_json".to_string(),
        };

        let url = format!("{}/images/generations", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::upstream(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let envelope: ApiErrorEnvelope = response.json().await.unwrap_or_default();
            let classified = classify_failure(status, envelope.error.unwrap_or_default());
            tracing::warn!(%status, error = %classified, "Image generation failed");
            return Err(classified);
        }

        let payload: ImageResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::upstream(format!("unreadable response: {}", e)))?;

        let image = payload
            .data
            .into_iter()
            .next()
            .ok_or_else(|| GenerationError::upstream("no image data in response"))?;

        let bytes = BASE64_STANDARD
            .decode(image.b64_json)
            .map_err(|e| GenerationError::upstream(format!("invalid image payload: {}", e)))?;

        if bytes.is_empty() {
            return Err(GenerationError::upstream("empty image payload"));
        }

        tracing::info!(model = %self.model, bytes = bytes.len(), "Image generated");
        Ok(bytes)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

/// Map an upstream failure onto the error taxonomy. Structured signals
/// (error code, type, HTTP status) win over message text; a billing keyword
/// fallback remains because the upstream does not always classify billing
/// failures structurally.
fn classify_failure(status: StatusCode, error: ApiError) -> GenerationError {
    let code = error.code.as_deref().unwrap_or_default();
    let kind = error.kind.as_deref().unwrap_or_default();
    let message = error.message;

    if code == "insufficient_quota"
        || code == "billing_hard_limit_reached"
        || kind == "insufficient_quota"
    {
        return GenerationError::BillingExceeded(message);
    }

    if code == "rate_limit_exceeded" || status == StatusCode::TOO_MANY_REQUESTS {
        return GenerationError::RateLimited(message);
    }

    if code == "invalid_api_key" || status == StatusCode::UNAUTHORIZED {
        return GenerationError::AuthenticationFailed(message);
    }

    // Keyword fallback, after the structured checks so overlapping message
    // text cannot shadow a rate-limit or auth signal
    let lowered = message.to_lowercase();
    if lowered.contains("billing") || lowered.contains("quota") {
        return GenerationError::BillingExceeded(message);
    }

    if kind == "invalid_request_error" || status == StatusCode::BAD_REQUEST {
        return GenerationError::InvalidRequest(message);
    }

    GenerationError::Upstream {
        message,
        kind: error.kind,
        code: error.code,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(message: &str, kind: Option<&str>, code: Option<&str>) -> ApiError {
        ApiError {
            message: message.to_string(),
            kind: kind.map(str::to_string),
            code: code.map(str::to_string),
        }
    }

    #[test]
    fn missing_key_is_rejected_before_any_call() {
        let config = GenerationConfig::default();
        let result = OpenAiImageClient::new(&config);
        assert!(matches!(result, Err(GenerationError::MissingCredentials)));
    }

    #[test]
    fn placeholder_key_is_rejected() {
        let config = GenerationConfig {
            api_key: "sk-...".to_string(),
            ..Default::default()
        };
        let result = OpenAiImageClient::new(&config);
        assert!(matches!(result, Err(GenerationError::MissingCredentials)));
    }

    #[test]
    fn new_strips_trailing_slash_from_base_url() {
        let config = GenerationConfig {
            api_key: "sk-test".to_string(),
            base_url: "https://proxy.example.com/v1/".to_string(),
            ..Default::default()
        };
        let client = OpenAiImageClient::new(&config).unwrap();
        assert_eq!(client.base_url, "https://proxy.example.com/v1");
    }

    #[test]
    fn quota_code_classifies_as_billing() {
        let error = classify_failure(
            StatusCode::TOO_MANY_REQUESTS,
            api_error(
                "You exceeded your current quota",
                Some("insufficient_quota"),
                Some("insufficient_quota"),
            ),
        );
        assert!(matches!(error, GenerationError::BillingExceeded(_)));
    }

    #[test]
    fn billing_keyword_fallback_classifies_as_billing() {
        // No structured code at all; only the message signals billing
        let error = classify_failure(
            StatusCode::BAD_REQUEST,
            api_error("Billing hard limit has been reached", None, None),
        );
        assert!(matches!(error, GenerationError::BillingExceeded(_)));
    }

    #[test]
    fn rate_limit_code_stays_rate_limited_despite_overlapping_text() {
        // "limit" appears in the message, but the structured code wins
        let error = classify_failure(
            StatusCode::TOO_MANY_REQUESTS,
            api_error(
                "Rate limit reached for images per minute",
                Some("requests"),
                Some("rate_limit_exceeded"),
            ),
        );
        assert!(matches!(error, GenerationError::RateLimited(_)));
    }

    #[test]
    fn status_429_without_code_is_rate_limited() {
        let error = classify_failure(
            StatusCode::TOO_MANY_REQUESTS,
            api_error("Too many requests", None, None),
        );
        assert!(matches!(error, GenerationError::RateLimited(_)));
    }

    #[test]
    fn invalid_api_key_code_is_authentication_failure() {
        let error = classify_failure(
            StatusCode::UNAUTHORIZED,
            api_error("Incorrect API key provided", None, Some("invalid_api_key")),
        );
        assert!(matches!(error, GenerationError::AuthenticationFailed(_)));
    }

    #[test]
    fn billing_auth_and_rate_limit_are_pairwise_distinct() {
        let billing = classify_failure(
            StatusCode::TOO_MANY_REQUESTS,
            api_error("quota exceeded", None, Some("insufficient_quota")),
        );
        let rate = classify_failure(
            StatusCode::TOO_MANY_REQUESTS,
            api_error("quota of requests per minute", None, Some("rate_limit_exceeded")),
        );
        let auth = classify_failure(
            StatusCode::UNAUTHORIZED,
            api_error("quota check failed for key", None, Some("invalid_api_key")),
        );
        assert!(matches!(billing, GenerationError::BillingExceeded(_)));
        assert!(matches!(rate, GenerationError::RateLimited(_)));
        assert!(matches!(auth, GenerationError::AuthenticationFailed(_)));
    }

    #[test]
    fn invalid_request_type_classifies_as_invalid_request() {
        let error = classify_failure(
            StatusCode::BAD_REQUEST,
            api_error(
                "Your prompt was rejected",
                Some("invalid_request_error"),
                None,
            ),
        );
        assert!(matches!(error, GenerationError::InvalidRequest(_)));
    }

    #[test]
    fn unclassified_failure_keeps_structured_fields() {
        let error = classify_failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            api_error("The server had an error", Some("server_error"), None),
        );
        match error {
            GenerationError::Upstream { message, kind, code } => {
                assert_eq!(message, "The server had an error");
                assert_eq!(kind.as_deref(), Some("server_error"));
                assert!(code.is_none());
            },
            other => panic!("expected Upstream, got {:?}", other),
        }
    }
}
