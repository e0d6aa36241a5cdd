pub mod interface;
pub mod backoff;
pub mod client;
pub mod language;
pub mod prompt;
pub mod service;

pub use interface::*;
pub use client::GroqTranslator;
pub use language::{LanguageDetector, LanguageResolver, WhatlangDetector, UNKNOWN_LANGUAGE};
pub use service::TranslationService;
