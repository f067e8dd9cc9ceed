use crate::config::PIVOT_LANG;
use crate::translate::{DetectedLanguage, TranslateError, Translation, Translator};
use futures::future::BoxFuture;
use futures::FutureExt;

/// Offline stand-in: every text is English and translation is the identity.
#[derive(Clone)]
pub struct DummyTranslator;

impl DummyTranslator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DummyTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl Translator for DummyTranslator {
    fn name(&self) -> &'static str {
        "dummy"
    }

    fn detect_language(&self, _text: String) -> BoxFuture<'_, Result<DetectedLanguage, TranslateError>> {
        async move {
            Ok(DetectedLanguage {
                language: PIVOT_LANG.to_owned(),
            })
        }
        .boxed()
    }

    fn translate(
        &self,
        text: String,
        from: String,
        _to: String,
    ) -> BoxFuture<'_, Result<Translation, TranslateError>> {
        async move {
            Ok(Translation {
                text,
                detected_source_lang: Some(from),
            })
        }
        .boxed()
    }
}
