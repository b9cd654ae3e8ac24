//! OpenAI-backed relevance classifier.
//!
//! One chat-completions call per message. The model is instructed to
//! either return a neutral rewrite of at most 280 characters or the
//! literal token `SKIP`. Transient transport failures are retried per
//! the configured [`BackoffPolicy`]; a malformed or suspiciously short
//! rewrite is an error (the pipeline fails closed on it).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::classifier::{BackoffPolicy, RelevanceClassifier, Rewrite};
use crate::error::ClassifierError;

const OPENAI_API_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Rewrites shorter than this are treated as a model failure.
const MIN_REWRITE_CHARS: usize = 10;

/// Hard cap on the rewrite length, in characters.
const MAX_REWRITE_CHARS: usize = 280;

const SYSTEM_PROMPT: &str = "You are a news editor for a geopolitical monitoring feed. \
You receive raw messages from public channels. If the message reports geopolitical, \
military, diplomatic or security-relevant news, rewrite it as a single neutral, \
factual English sentence or two, at most 280 characters, with no hashtags, no emoji \
and no editorializing. If the message is not geopolitical news (sports, celebrity, \
advertising, chatter), respond with exactly the word SKIP and nothing else.";

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

/// Classifier backed by the OpenAI chat-completions API.
pub struct OpenAiClassifier {
    api_key: SecretString,
    model: String,
    http: reqwest::Client,
    backoff: BackoffPolicy,
}

impl OpenAiClassifier {
    pub fn new(api_key: SecretString) -> Result<Self, ClassifierError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ClassifierError::RequestFailed(format!("build http client: {e}")))?;

        Ok(Self {
            api_key,
            model: DEFAULT_MODEL.to_string(),
            http,
            backoff: BackoffPolicy::default(),
        })
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    fn headers(&self) -> Result<HeaderMap, ClassifierError> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", self.api_key.expose_secret()))
            .map_err(|e| ClassifierError::RequestFailed(format!("invalid api key: {e}")))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    async fn chat_once(&self, text: &str) -> Result<String, ClassifierError> {
        let url = format!("{OPENAI_API_URL}/chat/completions");
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: text.to_string(),
                },
            ],
            temperature: 0.3,
            max_tokens: 200,
        };

        debug!(model = %self.model, "Classifier chat request");

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClassifierError::Timeout(REQUEST_TIMEOUT)
                } else {
                    ClassifierError::RequestFailed(format!("send: {e}"))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ClassifierError::RequestFailed(format!(
                "OpenAI API error ({status}): {error_text}"
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| ClassifierError::InvalidResponse(format!("decode body: {e}")))?;

        if let Some(usage) = &chat.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Classifier token usage"
            );
        }

        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ClassifierError::InvalidResponse("empty choices".to_string()))
    }
}

/// Interpret the raw model output as a verdict.
fn parse_verdict(raw: &str) -> Result<Rewrite, ClassifierError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ClassifierError::InvalidResponse("empty content".to_string()));
    }
    if trimmed.eq_ignore_ascii_case("skip") {
        return Ok(Rewrite::Skip);
    }
    if trimmed.chars().count() < MIN_REWRITE_CHARS {
        return Err(ClassifierError::InvalidResponse(format!(
            "rewrite too short: {trimmed:?}"
        )));
    }

    let rewrite: String = trimmed.chars().take(MAX_REWRITE_CHARS).collect();
    Ok(Rewrite::Relevant(rewrite))
}

#[async_trait]
impl RelevanceClassifier for OpenAiClassifier {
    async fn classify(&self, text: &str) -> Result<Rewrite, ClassifierError> {
        let mut attempt = 0u32;
        loop {
            match self.chat_once(text).await {
                Ok(raw) => return parse_verdict(&raw),
                Err(e) if attempt < self.backoff.max_retries && e.is_transient() => {
                    let delay = self.backoff.delay_for(attempt);
                    warn!(
                        attempt = attempt + 1,
                        delay_secs = delay.as_secs(),
                        error = %e,
                        "Classifier request failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
