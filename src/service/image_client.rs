use std::sync::Arc;

use reqwest::StatusCode;

use crate::{
    error::GenerationError,
    logger,
    models::{ApiErrorBody, GenerateRequest, GenerateResponse},
    service::transport::{RawResponse, Transport},
};

/// One request, one response, no retries.
#[derive(Clone)]
pub struct GenerationClient {
    transport: Arc<dyn Transport>,
    api_url: String,
}

impl GenerationClient {
    pub fn new(transport: Arc<dyn Transport>, api_url: impl Into<String>) -> Self {
        Self {
            transport,
            api_url: api_url.into(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// The prompt is sent as given. Callers trim and reject empty prompts.
    pub async fn generate(
        &self,
        credential: Option<&str>,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse, GenerationError> {
        let result = self.exchange(credential, request).await;
        if let Err(e) = &result {
            log::error!("Image generation failed: {}", e);
        }
        result
    }

    async fn exchange(
        &self,
        credential: Option<&str>,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse, GenerationError> {
        let credential = match credential.map(str::trim) {
            Some(key) if !key.is_empty() => key,
            _ => return Err(GenerationError::AuthMissing),
        };

        let body = serde_json::to_string(request)
            .map_err(|e| GenerationError::ServiceError(format!("Invalid request: {}", e)))?;

        log::info!(
            "Generating image (seed: {}) with key {}",
            request
                .seed
                .map(|s| s.to_string())
                .unwrap_or_else(|| "random".to_string()),
            logger::redact(credential)
        );

        let mut timer = logger::timer("Image generation");
        let outcome = self
            .transport
            .post_json(&self.api_url, credential, body)
            .await;
        // Only a received response counts as a completed exchange.
        let response = match outcome {
            Ok(response) => {
                timer.stop();
                response
            }
            Err(e) => {
                timer.abandon();
                return Err(GenerationError::TransportError(e));
            }
        };

        interpret(response)
    }
}

/// Maps a received response onto the result contract.
pub fn interpret(response: RawResponse) -> Result<GenerateResponse, GenerationError> {
    let status = StatusCode::from_u16(response.status).map_err(|_| {
        GenerationError::ServiceError(format!("API Error: invalid status {}", response.status))
    })?;

    if status.is_success() {
        log::debug!("Generation succeeded with status {}", status);
        let parsed: GenerateResponse = serde_json::from_str(&response.body).map_err(|e| {
            GenerationError::ServiceError(format!("Invalid response from service: {}", e))
        })?;
        if parsed.base64.trim().is_empty() {
            return Err(GenerationError::ServiceError(
                "Service returned no image data".to_string(),
            ));
        }
        return Ok(parsed);
    }

    let body = ApiErrorBody::parse(&response.body);
    match status {
        StatusCode::UNAUTHORIZED => Err(GenerationError::Unauthorized),
        StatusCode::UNPROCESSABLE_ENTITY => {
            if let Some(summary) = body.validation_summary() {
                log::debug!("Service rejected request: {}", summary);
            }
            Err(GenerationError::ValidationError)
        }
        _ => {
            if let Some(code) = body.code() {
                log::debug!("Service error code: {}", code);
            }
            let message = body
                .message()
                .unwrap_or_else(|| {
                    format!(
                        "API Error: {}",
                        status.canonical_reason().unwrap_or(status.as_str())
                    )
                });
            Err(GenerationError::ServiceError(message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Recorded {
        url: String,
        bearer: String,
        body: String,
    }

    /// Replays one canned outcome and records every call.
    struct FakeTransport {
        outcome: Result<RawResponse, String>,
        calls: Mutex<Vec<Recorded>>,
    }

    impl FakeTransport {
        fn responding(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self {
                outcome: Ok(RawResponse {
                    status,
                    body: body.to_string(),
                }),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn unreachable() -> Arc<Self> {
            Arc::new(Self {
                outcome: Err("connection refused".to_string()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn post_json(&self, url: &str, bearer: &str, body: String) -> Result<RawResponse, String> {
            self.calls.lock().unwrap().push(Recorded {
                url: url.to_string(),
                bearer: bearer.to_string(),
                body,
            });
            self.outcome.clone()
        }
    }

    fn client(transport: Arc<FakeTransport>) -> GenerationClient {
        GenerationClient::new(transport, "https://example.test/generate")
    }

    #[tokio::test]
    async fn test_missing_credential_makes_no_call() {
        let transport = FakeTransport::responding(200, "{}");
        let client = client(transport.clone());

        let err = client
            .generate(None, &GenerateRequest::new("a cat"))
            .await
            .unwrap_err();
        assert_eq!(err, GenerationError::AuthMissing);

        let err = client
            .generate(Some("  "), &GenerateRequest::new("a cat"))
            .await
            .unwrap_err();
        assert_eq!(err, GenerationError::AuthMissing);
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_sends_bearer_and_body_once() {
        let transport = FakeTransport::responding(
            200,
            r#"{"status":"ok","base64":"iVBORw0KG","prompt":"echoed"}"#,
        );
        let client = client(transport.clone());

        let response = client
            .generate(Some("sk-1"), &GenerateRequest::new("a cat").with_seed(Some(9)))
            .await
            .unwrap();
        assert_eq!(response.prompt, "echoed");
        assert_eq!(response.base64, "iVBORw0KG");

        let calls = transport.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].url, "https://example.test/generate");
        assert_eq!(calls[0].bearer, "sk-1");
        let sent: serde_json::Value = serde_json::from_str(&calls[0].body).unwrap();
        assert_eq!(sent, serde_json::json!({"prompt": "a cat", "seed": 9}));
    }

    #[tokio::test]
    async fn test_unauthorized() {
        let client = client(FakeTransport::responding(401, r#"{"message":"bad key"}"#));
        let err = client
            .generate(Some("sk-1"), &GenerateRequest::new("a cat"))
            .await
            .unwrap_err();
        assert_eq!(err, GenerationError::Unauthorized);
        assert_eq!(err.to_string(), "Unauthorized: Invalid API Key.");
    }

    #[tokio::test]
    async fn test_validation_error() {
        let client = client(FakeTransport::responding(422, ""));
        let err = client
            .generate(Some("sk-1"), &GenerateRequest::new("a cat"))
            .await
            .unwrap_err();
        assert_eq!(err, GenerationError::ValidationError);
    }

    #[tokio::test]
    async fn test_transport_failure_is_not_retried() {
        let transport = FakeTransport::unreachable();
        let client = client(transport.clone());
        let err = client
            .generate(Some("sk-1"), &GenerateRequest::new("a cat"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            GenerationError::TransportError("connection refused".into())
        );
        assert_eq!(transport.call_count(), 1);
    }

    #[test]
    fn test_service_error_uses_server_message() {
        let err = interpret(RawResponse {
            status: 500,
            body: r#"{"message":"boom"}"#.into(),
        })
        .unwrap_err();
        assert_eq!(err, GenerationError::ServiceError("boom".into()));
    }

    #[test]
    fn test_service_error_falls_back_to_status_text() {
        let err = interpret(RawResponse {
            status: 500,
            body: String::new(),
        })
        .unwrap_err();
        assert_eq!(
            err,
            GenerationError::ServiceError("API Error: Internal Server Error".into())
        );

        let err = interpret(RawResponse {
            status: 503,
            body: "<html>upstream down</html>".into(),
        })
        .unwrap_err();
        assert_eq!(
            err,
            GenerationError::ServiceError("API Error: Service Unavailable".into())
        );
    }

    #[test]
    fn test_malformed_success_body() {
        let err = interpret(RawResponse {
            status: 200,
            body: "not json".into(),
        })
        .unwrap_err();
        assert!(matches!(err, GenerationError::ServiceError(m) if m.starts_with("Invalid response")));
    }

    #[test]
    fn test_success_without_image_is_a_service_error() {
        let err = interpret(RawResponse {
            status: 200,
            body: r#"{"status":"ok","base64":"","prompt":"p"}"#.into(),
        })
        .unwrap_err();
        assert_eq!(
            err,
            GenerationError::ServiceError("Service returned no image data".into())
        );
    }

    #[test]
    fn test_validation_detail_does_not_change_the_message() {
        let err = interpret(RawResponse {
            status: 422,
            body: r#"{"detail":[{"loc":["body","seed"],"msg":"not an integer","type":"type_error"}]}"#.into(),
        })
        .unwrap_err();
        assert_eq!(err, GenerationError::ValidationError);
    }

    #[test]
    fn test_other_success_codes_are_accepted() {
        let response = interpret(RawResponse {
            status: 201,
            body: r#"{"status":"ok","base64":"AA","prompt":"p"}"#.into(),
        })
        .unwrap();
        assert_eq!(response.status, "ok");
    }
}
