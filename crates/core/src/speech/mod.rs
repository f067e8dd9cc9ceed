mod dummy;
mod lingo;

use crate::lingo::LingoError;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

pub use dummy::DummySpeechService;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoiceId(pub String);

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpeechRequest {
    pub text: String,
    pub language: String,
    pub voice: Option<VoiceId>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SpeechAudio {
    /// May be empty when the provider produced no hosted audio.
    pub audio_url: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Transcript {
    pub text: String,
    pub detected_language: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum SpeechError {
    #[error(transparent)]
    Lingo(#[from] LingoError),
    #[error("failed to build audio upload: {0}")]
    Upload(String),
}

pub trait SpeechService: Send + Sync {
    fn text_to_speech(&self, request: SpeechRequest) -> BoxFuture<'_, Result<SpeechAudio, SpeechError>>;

    /// `language` may be `"auto"`.
    fn transcribe(
        &self,
        audio: Vec<u8>,
        language: String,
    ) -> BoxFuture<'_, Result<Transcript, SpeechError>>;
}
