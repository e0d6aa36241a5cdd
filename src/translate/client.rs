use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::backoff::Backoff;
use super::interface::Translator;
use super::prompt::build_system_instruction;
use crate::config::UpstreamConfig;
use crate::error::TranslateError;

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpstreamErrorBody {
    error: UpstreamErrorDetail,
}

#[derive(Debug, Deserialize)]
struct UpstreamErrorDetail {
    message: String,
}

/// How a single attempt ended when it did not succeed.
#[derive(Debug)]
enum AttemptFailure {
    /// Transport-level or non-2xx failure; worth another try.
    Transient(TranslateError),
    /// Rejected credential or an empty 2xx payload; surfaces immediately.
    Permanent(TranslateError),
}

/// OpenAI-compatible chat-completion client (Groq by default) with
/// bounded exponential-backoff retry.
pub struct GroqTranslator {
    http: Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    timeout_secs: u64,
    backoff: Backoff,
}

impl GroqTranslator {
    pub fn new(config: &UpstreamConfig) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(config.timeout()).build()?;

        info!(
            "Initialized GroqTranslator: model={}, api_url={}, max_retries={}",
            config.model, config.api_url, config.max_retries
        );

        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone().filter(|_| config.has_api_key()),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens_per_request,
            timeout_secs: config.timeout_secs,
            backoff: Backoff::new(config.max_retries, config.base_delay()),
        })
    }

    async fn attempt(
        &self,
        api_key: &str,
        request: &ChatRequest<'_>,
        attempt: u32,
    ) -> Result<String, AttemptFailure> {
        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_failure(e, attempt))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_failure(e, attempt))?;

        let payload: ChatResponse = serde_json::from_slice(&body).map_err(|e| {
            AttemptFailure::Transient(TranslateError::upstream(
                "Invalid response from Groq API",
                format!("Failed to parse response: {}", e),
                502,
            ))
        })?;

        extract_translation(payload).map_err(AttemptFailure::Permanent)
    }

    fn transport_failure(&self, e: reqwest::Error, attempt: u32) -> AttemptFailure {
        if e.is_timeout() {
            AttemptFailure::Transient(TranslateError::upstream(
                "Groq API timeout",
                format!(
                    "Request timed out after {} seconds (attempt {}/{})",
                    self.timeout_secs,
                    attempt,
                    self.backoff.max_attempts()
                ),
                504,
            ))
        } else {
            AttemptFailure::Transient(TranslateError::upstream(
                "Network error connecting to Groq API",
                format!("Request failed: {}", e),
                503,
            ))
        }
    }
}

/// Map a non-2xx upstream reply onto the error taxonomy.
fn classify_status(status: StatusCode, body: &str) -> AttemptFailure {
    let detail = serde_json::from_str::<UpstreamErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| format!("Unknown API error ({})", status));

    match status {
        StatusCode::UNAUTHORIZED => AttemptFailure::Permanent(TranslateError::rejected_api_key()),
        StatusCode::TOO_MANY_REQUESTS => AttemptFailure::Transient(TranslateError::upstream(
            "Groq API rate limit exceeded",
            format!("Too many requests to Groq API: {}", detail),
            429,
        )),
        _ => AttemptFailure::Transient(TranslateError::upstream(
            format!("Groq API error (HTTP {})", status.as_u16()),
            detail,
            status.as_u16(),
        )),
    }
}

fn extract_translation(payload: ChatResponse) -> Result<String, TranslateError> {
    let Some(choice) = payload.choices.into_iter().next() else {
        return Err(TranslateError::upstream(
            "Invalid response format from Groq API",
            "No choices returned in response",
            502,
        ));
    };

    let content = choice.message.and_then(|m| m.content).unwrap_or_default();
    if content.is_empty() {
        return Err(TranslateError::upstream(
            "Empty translation response",
            "Groq API returned empty content",
            502,
        ));
    }

    let translated = content.trim();
    if translated.is_empty() {
        return Err(TranslateError::upstream(
            "Empty translation result",
            "Translation resulted in empty text",
            502,
        ));
    }
    Ok(translated.to_string())
}

#[async_trait]
impl Translator for GroqTranslator {
    fn model(&self) -> &str {
        &self.model
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn translate(
        &self,
        source_language: &str,
        target_language: &str,
        text: &str,
    ) -> Result<String, TranslateError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(TranslateError::missing_api_key());
        };

        let system_instruction = build_system_instruction(source_language, target_language);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: &system_instruction },
                ChatMessage { role: "user", content: text },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let mut attempt = 1;
        loop {
            debug!("Calling upstream (attempt {}/{})", attempt, self.backoff.max_attempts());
            let error = match self.attempt(api_key, &request, attempt).await {
                Ok(translated) => return Ok(translated),
                Err(AttemptFailure::Permanent(e)) => {
                    warn!("Upstream failed permanently on attempt {}: {}", attempt, e);
                    return Err(e);
                }
                Err(AttemptFailure::Transient(e)) => e,
            };

            match self.backoff.delay_after(attempt) {
                Some(delay) => {
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Upstream attempt failed, retrying: {}",
                        error
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                None => {
                    warn!("Upstream failed after {} attempts: {}", attempt, error);
                    return Err(error);
                }
            }
        }
    }
}
