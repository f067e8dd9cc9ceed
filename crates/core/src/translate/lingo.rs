use crate::lingo::{LingoClient, LOG_TARGET, PROVIDER_NAME};
use crate::translate::{DetectedLanguage, TranslateError, Translation, Translator};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct DetectRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetectResponse {
    language: Option<String>,
    detected_language: Option<String>,
}

#[derive(Serialize)]
struct TranslateRequest<'a> {
    text: &'a str,
    from: &'a str,
    to: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslateResponse {
    #[serde(default)]
    text: String,
    detected_language: Option<String>,
}

impl Translator for LingoClient {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn detect_language(&self, text: String) -> BoxFuture<'_, Result<DetectedLanguage, TranslateError>> {
        async move {
            let response: DetectResponse = self
                .post_json("/detect-language", &DetectRequest { text: &text })
                .await?;
            let language = response
                .language
                .or(response.detected_language)
                .filter(|l| !l.trim().is_empty())
                .ok_or(TranslateError::NoLanguage)?;
            tracing::debug!(target: LOG_TARGET, %language, "language detected");
            Ok(DetectedLanguage { language })
        }
        .boxed()
    }

    fn translate(
        &self,
        text: String,
        from: String,
        to: String,
    ) -> BoxFuture<'_, Result<Translation, TranslateError>> {
        async move {
            let request = TranslateRequest {
                text: &text,
                from: &from,
                to: &to,
            };
            let response: TranslateResponse = self.post_json("/translate", &request).await?;
            // an empty translation keeps the input
            let translated = if response.text.is_empty() {
                text
            } else {
                response.text
            };
            Ok(Translation {
                text: translated,
                detected_source_lang: response.detected_language,
            })
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_response_accepts_either_field() {
        let a: DetectResponse = serde_json::from_str(r#"{"language":"es"}"#).expect("json");
        let b: DetectResponse = serde_json::from_str(r#"{"detectedLanguage":"hi"}"#).expect("json");
        assert_eq!(a.language.or(a.detected_language).as_deref(), Some("es"));
        assert_eq!(b.language.or(b.detected_language).as_deref(), Some("hi"));
    }

    #[test]
    fn translate_request_uses_from_and_to_keys() {
        let body = serde_json::to_value(TranslateRequest {
            text: "hola",
            from: "es",
            to: "en",
        })
        .expect("json");
        assert_eq!(body, serde_json::json!({"text": "hola", "from": "es", "to": "en"}));
    }
}
