use crate::lingo::{LingoClient, LOG_TARGET};
use crate::speech::{SpeechAudio, SpeechError, SpeechRequest, SpeechService, Transcript};
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

const UPLOAD_FILE_NAME: &str = "input.wav";
const UPLOAD_MIME: &str = "audio/wav";

#[derive(Serialize)]
struct TtsBody<'a> {
    text: &'a str,
    language: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    voice: Option<&'a str>,
}

#[derive(Deserialize)]
struct TtsResponse {
    #[serde(default, rename = "audioUrl", alias = "audio_url")]
    audio_url: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SttResponse {
    #[serde(default)]
    text: String,
    detected_language: Option<String>,
}

impl SpeechService for LingoClient {
    fn text_to_speech(&self, request: SpeechRequest) -> BoxFuture<'_, Result<SpeechAudio, SpeechError>> {
        async move {
            let body = TtsBody {
                text: &request.text,
                language: &request.language,
                voice: request.voice.as_ref().map(|v| v.0.as_str()),
            };
            let response: TtsResponse = self.post_json("/text-to-speech", &body).await?;
            Ok(SpeechAudio {
                audio_url: response.audio_url.unwrap_or_default(),
            })
        }
        .boxed()
    }

    fn transcribe(
        &self,
        audio: Vec<u8>,
        language: String,
    ) -> BoxFuture<'_, Result<Transcript, SpeechError>> {
        async move {
            let bytes = audio.len();
            let part = Part::bytes(audio)
                .file_name(UPLOAD_FILE_NAME)
                .mime_str(UPLOAD_MIME)
                .map_err(|e| SpeechError::Upload(e.to_string()))?;
            let form = Form::new().part("audio", part).text("language", language);

            let response: SttResponse = self.post_multipart("/speech-to-text", form).await?;
            tracing::debug!(target: LOG_TARGET, bytes, chars = response.text.len(), "audio transcribed");
            Ok(Transcript {
                text: response.text,
                detected_language: response.detected_language,
            })
        }
        .boxed()
    }
}
