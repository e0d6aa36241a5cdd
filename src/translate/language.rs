use std::sync::Arc;
use tracing::debug;

pub const UNKNOWN_LANGUAGE: &str = "UNKNOWN";

/// Opaque source-language detection.
pub trait LanguageDetector: Send + Sync {
    /// ISO 639-1 code, or `None` when the text can't be reliably classified.
    fn detect(&self, text: &str) -> Option<String>;
}

/// Statistical detection via whatlang.
#[derive(Debug, Default, Clone)]
pub struct WhatlangDetector;

impl LanguageDetector for WhatlangDetector {
    fn detect(&self, text: &str) -> Option<String> {
        let info = whatlang::detect(text)?;
        if !info.is_reliable() {
            return None;
        }
        Some(iso_639_1(info.lang()).to_string())
    }
}

fn iso_639_1(lang: whatlang::Lang) -> &'static str {
    use whatlang::Lang::*;
    match lang {
        Eng => "en",
        Fra => "fr",
        Deu => "de",
        Spa => "es",
        Ita => "it",
        Por => "pt",
        Nld => "nl",
        Rus => "ru",
        Ukr => "uk",
        Pol => "pl",
        Ces => "cs",
        Swe => "sv",
        Dan => "da",
        Fin => "fi",
        Tur => "tr",
        Ara => "ar",
        Heb => "he",
        Hin => "hi",
        Ben => "bn",
        Cmn => "zh",
        Jpn => "ja",
        Kor => "ko",
        Vie => "vi",
        Tha => "th",
        Ind => "id",
        Ell => "el",
        Hun => "hu",
        Ron => "ro",
        // Languages without a two-letter code keep whatlang's three-letter one.
        other => other.code(),
    }
}

/// Picks the source language for a request. Never fails.
#[derive(Clone)]
pub struct LanguageResolver {
    detector: Arc<dyn LanguageDetector>,
}

impl LanguageResolver {
    pub fn new(detector: Arc<dyn LanguageDetector>) -> Self {
        Self { detector }
    }

    pub fn resolve(&self, text: &str, source_override: Option<&str>) -> String {
        if let Some(code) = source_override {
            return code.to_uppercase();
        }
        match self.detector.detect(text) {
            Some(code) => code.to_uppercase(),
            None => {
                debug!("Could not reliably detect language of {} chars", text.chars().count());
                UNKNOWN_LANGUAGE.to_string()
            }
        }
    }
}

impl Default for LanguageResolver {
    fn default() -> Self {
        Self::new(Arc::new(WhatlangDetector))
    }
}
