use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

use crate::error::TranslateError;
use crate::translate::TranslationRequest;

static LANGUAGE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z\s\-]+$").expect("language pattern compiles"));

/// Raw JSON body of a translate call.
#[derive(Debug, Default, Deserialize)]
struct TranslatePayload {
    #[serde(default)]
    text: String,
    #[serde(default)]
    target_lang: String,
    #[serde(default)]
    source_lang: Option<String>,
}

/// Turns a raw request body into a `TranslationRequest` or a
/// `validation_error`. Runs before anything touches the network.
#[derive(Debug, Clone)]
pub struct RequestValidator {
    max_text_length: usize,
}

impl RequestValidator {
    pub fn new(max_text_length: usize) -> Self {
        Self { max_text_length }
    }

    pub fn validate(
        &self,
        body: &[u8],
        caller_identity: String,
        force_refresh: bool,
    ) -> Result<TranslationRequest, TranslateError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(TranslateError::validation(
                "Empty request body",
                "Request body must contain valid JSON data",
            ));
        }

        let payload: TranslatePayload = serde_json::from_slice(body).map_err(|e| {
            TranslateError::validation(
                "Invalid request format",
                format!("Failed to parse request: {}", e),
            )
        })?;

        let text = payload.text.trim();
        if text.is_empty() {
            return Err(TranslateError::validation(
                "Text field is required",
                "Provide text to translate in the 'text' field",
            ));
        }

        let length = text.chars().count();
        if length > self.max_text_length {
            return Err(TranslateError::validation(
                format!("Text exceeds maximum length of {} characters", self.max_text_length),
                format!("Current length: {} characters. Please shorten your text.", length),
            ));
        }

        let target_language = payload.target_lang.trim();
        if target_language.is_empty() {
            return Err(TranslateError::validation(
                "Target language is required",
                "Provide target language in the 'target_lang' field",
            ));
        }
        if !LANGUAGE_PATTERN.is_match(target_language) {
            return Err(TranslateError::validation(
                "Invalid target language format",
                "Target language can only contain letters, spaces, and hyphens",
            ));
        }

        let source_language_override = payload
            .source_lang
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        if let Some(source) = source_language_override {
            if !LANGUAGE_PATTERN.is_match(source) {
                return Err(TranslateError::validation(
                    "Invalid source language format",
                    "Source language can only contain letters, spaces, and hyphens",
                ));
            }
        }

        Ok(TranslationRequest {
            text: text.to_string(),
            target_language: target_language.to_string(),
            source_language_override: source_language_override.map(str::to_string),
            caller_identity,
            force_refresh,
        })
    }
}
