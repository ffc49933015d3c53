//! HTTP completion gateway.
//!
//! Speaks the chat-completions wire shape: POST
//! `{endpoint}/chat/completions` with `{model, messages, temperature,
//! max_tokens}`, reading `choices[0].message.content` back. The warrior's
//! persona rides as the system message. Non-2xx statuses and network errors
//! are both dispatch failures for that warrior; 408/429/5xx and timeouts
//! are transient, other 4xx are permanent rejections.

use async_trait::async_trait;
use council_application::ports::completion_gateway::{
    CompletionGateway, CompletionRequest, GatewayError,
};
use council_domain::Warrior;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

/// Outer bound on one HTTP request; per-call dispatch timeouts are enforced
/// above this layer and are usually tighter.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// Gateway adapter over plain HTTP chat-completion endpoints.
pub struct HttpCompletionGateway {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpCompletionGateway {
    /// Build a gateway with `base_url` as the default endpoint for warriors
    /// without their own override.
    pub fn new(base_url: impl Into<String>) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GatewayError::Connection(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: None,
        })
    }

    /// Attach a bearer token sent with every request.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    fn endpoint_for(&self, warrior: &Warrior) -> String {
        let base = warrior.endpoint.as_deref().unwrap_or(&self.base_url);
        format!("{}/chat/completions", base.trim_end_matches('/'))
    }
}

/// Map a non-2xx response status to a gateway error.
///
/// 408/429 and server errors are worth retrying; everything else 4xx is a
/// permanent rejection and must never be retried.
fn classify_status(status: u16, message: String) -> GatewayError {
    if status == 408 || status == 429 || (500..600).contains(&status) {
        GatewayError::Server { status, message }
    } else {
        GatewayError::Rejected { status, message }
    }
}

#[async_trait]
impl CompletionGateway for HttpCompletionGateway {
    async fn complete(
        &self,
        warrior: &Warrior,
        request: &CompletionRequest,
    ) -> Result<String, GatewayError> {
        let url = self.endpoint_for(warrior);
        debug!("Querying {} ({}) at {}", warrior.name, warrior.model, url);

        let body = json!({
            "model": warrior.model.as_str(),
            "messages": [
                { "role": "system", "content": warrior.persona },
                { "role": "user", "content": request.prompt },
            ],
            "temperature": warrior.temperature,
            "max_tokens": warrior.max_output_tokens,
        });

        let mut http_request = self.client.post(&url).json(&body);
        if let Some(api_key) = &self.api_key {
            http_request = http_request.bearer_auth(api_key);
        }

        let response = http_request.send().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Timeout
            } else {
                GatewayError::Connection(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(classify_status(status.as_u16(), message));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| GatewayError::MalformedResponse("empty choices".to_string()))
    }
}
