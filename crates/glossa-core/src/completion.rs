use crate::CompletionError;
use crate::http;
use crate::settings::Settings;
use crate::types::{CompletionEvent, PromptBundle};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use ureq::Agent;

pub const TEMPERATURE: f64 = 0.7;
pub const MAX_TOKENS: u32 = 2048;

/// Source of model completions.
///
/// `on_event` may fire any number of times, including zero; only the
/// returned text is authoritative.
pub trait CompletionClient: Send {
    fn name(&self) -> &'static str;
    fn complete(
        &mut self,
        bundle: &PromptBundle,
        on_event: &mut dyn FnMut(CompletionEvent),
    ) -> Result<String, CompletionError>;
}

/// Client for OpenAI-compatible `chat/completions` endpoints.
pub struct ChatCompletionsClient {
    agent: Agent,
    model: String,
    base_url: String,
    api_key: String,
}

impl ChatCompletionsClient {
    pub fn new(settings: &Settings) -> Self {
        Self {
            agent: http::default_agent(),
            model: settings.model.clone(),
            base_url: settings.base_url.clone(),
            api_key: settings.api_key.trim().to_string(),
        }
    }

    fn build_request_body(&self, bundle: &PromptBundle) -> serde_json::Value {
        json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": bundle.system_prompt},
                {"role": "user", "content": bundle.prompt},
            ],
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
        })
    }

    fn parse_response(body: &str) -> Result<String, CompletionError> {
        let response: ChatResponse = serde_json::from_str(body).map_err(|e| {
            debug!(error = %e, "completion payload is not valid json");
            CompletionError::EmptyResponse
        })?;
        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .ok_or(CompletionError::EmptyResponse)
    }
}

impl CompletionClient for ChatCompletionsClient {
    fn name(&self) -> &'static str {
        "chat-completions"
    }

    fn complete(
        &mut self,
        bundle: &PromptBundle,
        on_event: &mut dyn FnMut(CompletionEvent),
    ) -> Result<String, CompletionError> {
        if self.api_key.is_empty() {
            return Err(CompletionError::Auth);
        }

        let url = http::endpoint(&self.base_url, "chat/completions");
        let body = self.build_request_body(bundle);
        debug!(url = %url, model = %self.model, "sending completion request");

        let response = self
            .agent
            .post(&url)
            .header("Authorization", &format!("Bearer {}", self.api_key))
            .send_json(body)
            .map_err(|e| CompletionError::Network(format!("{e}")))?;

        let status = response.status();
        let raw = response
            .into_body()
            .read_to_string()
            .map_err(|e| CompletionError::Network(format!("{e}")))?;

        if !status.is_success() {
            return Err(CompletionError::Request {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
                body: raw.trim().to_string(),
            });
        }

        let content = Self::parse_response(raw.trim())?;
        if !content.is_empty() {
            on_event(CompletionEvent::Progress {
                chunk: content.clone(),
                full_text: content.clone(),
            });
        }
        Ok(content)
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatMessage>,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}
