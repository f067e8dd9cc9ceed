use crate::config::PIVOT_LANG;
use crate::speech::{SpeechAudio, SpeechError, SpeechRequest, SpeechService, Transcript};
use futures::future::BoxFuture;
use futures::FutureExt;

const MOCK_TRANSCRIPT: &str = "mock transcription";

#[derive(Clone)]
pub struct DummySpeechService;

impl DummySpeechService {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DummySpeechService {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechService for DummySpeechService {
    fn text_to_speech(&self, _request: SpeechRequest) -> BoxFuture<'_, Result<SpeechAudio, SpeechError>> {
        async move {
            Ok(SpeechAudio {
                audio_url: String::new(),
            })
        }
        .boxed()
    }

    fn transcribe(
        &self,
        _audio: Vec<u8>,
        _language: String,
    ) -> BoxFuture<'_, Result<Transcript, SpeechError>> {
        async move {
            Ok(Transcript {
                text: MOCK_TRANSCRIPT.to_owned(),
                detected_language: Some(PIVOT_LANG.to_owned()),
            })
        }
        .boxed()
    }
}
