use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::bar_race::RaceDataset;
use crate::chat::{ChatHistory, ChatMessage};
use crate::config::GuideConfig;
use crate::error::GuideError;
use crate::prompt::{bar_race_prompt, brief_prompt, brief_system_prompt};
use crate::sse::ApiErrorBody;
use crate::stream::FragmentStream;

/// Cheap to clone; clones share the connection pool.
#[derive(Clone, Debug)]
pub struct LlmClient {
    http: reqwest::Client,
    config: Arc<GuideConfig>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ResponseChoice>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ResponseChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl LlmClient {
    pub fn new(config: GuideConfig) -> Result<Self, GuideError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.timeout)
            .build()?;
        Ok(Self {
            http,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &GuideConfig {
        &self.config
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    fn request_body<'a>(&'a self, messages: &'a [ChatMessage], stream: bool) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            stream,
        }
    }

    async fn send(&self, messages: &[ChatMessage], stream: bool) -> Result<reqwest::Response, GuideError> {
        let key = self.config.api_key.as_deref().ok_or(GuideError::MissingApiKey)?;
        let mut req = self
            .http
            .post(self.config.completions_url())
            .bearer_auth(key)
            .json(&self.request_body(messages, stream));
        // Streams stay open as long as the model keeps writing.
        if !stream {
            req = req.timeout(self.config.timeout);
        }

        debug!(
            "chat completion request: model={} messages={} stream={stream}",
            self.config.model,
            messages.len()
        );
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GuideError::Http {
                status: status.as_u16(),
                body: error_message(&body),
            });
        }
        Ok(resp)
    }

    /// Full (non-streamed) completion text.
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String, GuideError> {
        let resp = self.send(messages, false).await?;
        let body: ChatResponse = resp
            .json()
            .await
            .map_err(|e| GuideError::Decode(e.to_string()))?;
        if let Some(err) = body.error {
            return Err(GuideError::Api(err.message));
        }
        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| GuideError::Decode("response has no message content".to_string()))
    }

    pub async fn stream(&self, messages: &[ChatMessage]) -> Result<FragmentStream, GuideError> {
        let resp = self.send(messages, true).await?;
        Ok(FragmentStream::spawn(Box::pin(resp.bytes_stream())))
    }

    pub async fn stream_brief(&self, country: &str) -> Result<FragmentStream, GuideError> {
        info!("streaming travel brief for {country}");
        self.stream(&brief_messages(country)).await
    }

    pub async fn stream_chat(&self, history: &ChatHistory) -> Result<FragmentStream, GuideError> {
        info!(
            "streaming chat reply for {} ({} turns)",
            history.country(),
            history.len()
        );
        self.stream(&history.to_request()).await
    }

    pub async fn bar_race(&self, topic: &str, periods: u32, entries: u32) -> Result<RaceDataset, GuideError> {
        info!("requesting bar race dataset: {topic:?} ({periods} periods x {entries} entries)");
        let text = self
            .complete(&[ChatMessage::user(bar_race_prompt(topic, periods, entries))])
            .await?;
        RaceDataset::from_model_output(&text)
    }
}

pub fn brief_messages(country: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(brief_system_prompt()),
        ChatMessage::user(brief_prompt(country)),
    ]
}

/// Prefers the `error.message` of an OpenAI-style error body.
fn error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct Envelope {
        error: ApiErrorBody,
    }
    match serde_json::from_str::<Envelope>(body) {
        Ok(env) if !env.error.message.is_empty() => env.error.message,
        _ => body.trim().chars().take(500).collect(),
    }
}
