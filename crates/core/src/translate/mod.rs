mod dummy;
mod lingo;

use crate::lingo::LingoError;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

pub use dummy::DummyTranslator;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DetectedLanguage {
    pub language: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Translation {
    pub text: String,
    pub detected_source_lang: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum TranslateError {
    #[error(transparent)]
    Lingo(#[from] LingoError),
    #[error("translation provider returned no language")]
    NoLanguage,
}

/// Language detection and translation. Callers treat every failure as
/// best-effort and keep the prior value.
pub trait Translator: Send + Sync {
    /// Recorded as the entry's translation provider.
    fn name(&self) -> &'static str;

    fn detect_language(&self, text: String) -> BoxFuture<'_, Result<DetectedLanguage, TranslateError>>;

    /// `from` may be `"auto"` when the source language is unknown.
    fn translate(
        &self,
        text: String,
        from: String,
        to: String,
    ) -> BoxFuture<'_, Result<Translation, TranslateError>>;
}
