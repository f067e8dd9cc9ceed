//! Request orchestration: language handling, scoring, fusion, crisis checks
//! and persistence for one user interaction at a time.
//!
//! Upstream language and reply failures degrade to local fallbacks and are
//! only logged. Store failures, speech failures and invalid input surface as
//! [`SessionError`].

use crate::config::{is_pivot, CrisisPolicy, LangTag, DEFAULT_HISTORY_LIMIT, PIVOT_LANG};
use crate::crisis::{CrisisEvaluation, CrisisEvaluator, CrisisInput, HelplineInfo};
use crate::empathy::EmpathyResponder;
use crate::face::{DummyFaceDetector, FaceClassifier, FaceDetector};
use crate::fusion::fuse;
use crate::mood::{Confidence, EvidenceSource, MoodFusionResult, MoodLabel};
use crate::sentiment::TextSentimentScorer;
use crate::speech::{SpeechError, SpeechRequest, SpeechService, Transcript, VoiceId};
use crate::store::{MoodEntry, MoodStore, NewMoodEntry, StoreError};
use crate::tables::SharedTables;
use crate::translate::Translator;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;


const LOG_TARGET: &str = "session";

const AUTO_LANG: &str = "auto";
const MIN_LANG_LEN: usize = 2;
const MAX_LANG_LEN: usize = 12;
/// Stressed entries among the recent history that suggest peer support.
const PEER_SUPPORT_THRESHOLD: usize = 3;

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Speech(#[from] SpeechError),
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MoodDetectionRequest {
    pub user_id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub use_webcam: bool,
    pub image_data: Option<String>,
    pub preferred_language: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MoodDetectionOutcome {
    pub mood: MoodLabel,
    pub confidence: Confidence,
    pub sources: BTreeSet<EvidenceSource>,
    pub detected_language: Option<String>,
    pub entry: MoodEntry,
    pub original_text: Option<String>,
    pub original_language: Option<String>,
    pub translated_text: Option<String>,
    pub translated_language: Option<String>,
    pub localized_message: String,
    pub localized_language: String,
    pub translation_applied: bool,
    pub crisis: CrisisEvaluation,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub user_id: String,
    pub message: String,
    pub language: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub message: String,
    pub language: String,
    pub detected_language: Option<String>,
    pub translation_applied: bool,
    pub peer_support_suggested: bool,
    pub crisis_keywords: Vec<String>,
    pub helpline: Option<HelplineInfo>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpeakRequest {
    pub text: String,
    pub language: String,
    pub voice: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SpeakResponse {
    pub audio_url: String,
    pub language: String,
}

/// Text after the detect-and-translate step.
#[derive(Debug, Default)]
struct PreparedText {
    raw: String,
    analysis: String,
    detected_language: Option<String>,
    translated_text: Option<String>,
    translated_language: Option<String>,
    translation_applied: bool,
}

pub struct MoodSession {
    translator: Arc<dyn Translator>,
    speech: Arc<dyn SpeechService>,
    store: Arc<dyn MoodStore>,
    scorer: TextSentimentScorer,
    faces: FaceClassifier,
    crisis: CrisisEvaluator,
    empathy: EmpathyResponder,
}

impl MoodSession {
    /// Faces use the mock reading and chat uses canned replies until
    /// [`with_face_detector`](Self::with_face_detector) and
    /// [`with_empathy`](Self::with_empathy) say otherwise.
    pub fn new(
        translator: Arc<dyn Translator>,
        speech: Arc<dyn SpeechService>,
        store: Arc<dyn MoodStore>,
        tables: SharedTables,
        policy: CrisisPolicy,
    ) -> Self {
        Self {
            translator,
            speech,
            store,
            scorer: TextSentimentScorer::new(tables.lexicon),
            faces: FaceClassifier::new(Arc::new(DummyFaceDetector::new())),
            crisis: CrisisEvaluator::new(tables.crisis_keywords, tables.helplines, policy),
            empathy: EmpathyResponder::canned(),
        }
    }

    pub fn with_face_detector(mut self, detector: Arc<dyn FaceDetector>) -> Self {
        self.faces = FaceClassifier::new(detector);
        self
    }

    pub fn with_empathy(mut self, empathy: EmpathyResponder) -> Self {
        self.empathy = empathy;
        self
    }

    pub async fn detect(
        &self,
        request: MoodDetectionRequest,
    ) -> Result<MoodDetectionOutcome, SessionError> {
        let user_id = require_user(&request.user_id)?;
        let preferred = non_blank(request.preferred_language.as_deref());

        let prepared = self.prepare_text(request.text.trim()).await;

        let text_result =
            (!prepared.analysis.trim().is_empty()).then(|| self.scorer.score(&prepared.analysis));

        let face_result = match request.image_data.filter(|d| !d.trim().is_empty()) {
            Some(image) if request.use_webcam => Some(self.faces.classify_blocking(image).await),
            _ => None,
        };

        let fused = fuse(text_result, face_result);

        let crisis = self
            .crisis
            .evaluate(
                self.store.as_ref(),
                CrisisInput {
                    user_id,
                    analysis_text: &prepared.analysis,
                    translated_text: prepared.translated_text.as_deref(),
                    original_text: Some(prepared.raw.as_str()).filter(|r| !r.is_empty()),
                    fused: &fused,
                    preferred_language: preferred,
                    detected_language: prepared.detected_language.as_deref(),
                    now: Utc::now(),
                },
            )
            .await?;

        let mut sources = fused.sources.clone();
        if prepared.translation_applied {
            sources.insert(EvidenceSource::Translation);
        }
        if crisis.triggered {
            sources.insert(EvidenceSource::Crisis);
        }

        let raw = Some(prepared.raw.clone()).filter(|r| !r.is_empty());
        let entry = self
            .store
            .record(NewMoodEntry {
                user_id: user_id.to_owned(),
                mood: fused.mood,
                confidence: fused.confidence,
                sources: sources.clone(),
                face_analysis: face_result,
                original_text: raw.clone(),
                original_language: prepared.detected_language.clone(),
                translated_text: prepared.translated_text.clone(),
                translated_language: prepared.translated_language.clone(),
                translation_provider: prepared
                    .translation_applied
                    .then(|| self.translator.name().to_owned()),
                crisis_flag: crisis.triggered,
                crisis_keywords: crisis.keywords.clone(),
                crisis_reasons: crisis.reasons.clone(),
                negative_mood_streak: crisis.streak,
                helpline: crisis.helpline.clone(),
            })
            .await?;

        let target = preferred
            .or(prepared.detected_language.as_deref())
            .unwrap_or(PIVOT_LANG);
        let (localized_message, localized_language) =
            self.localize(confirmation_message(&fused), target).await;

        tracing::info!(
            target: LOG_TARGET,
            user_id,
            entry_id = %entry.id,
            mood = %fused.mood,
            confidence = %fused.confidence,
            crisis = crisis.triggered,
            "mood detected"
        );

        Ok(MoodDetectionOutcome {
            mood: fused.mood,
            confidence: fused.confidence,
            sources,
            detected_language: prepared.detected_language.clone(),
            entry,
            original_text: raw,
            original_language: prepared.detected_language,
            translated_text: prepared.translated_text,
            translated_language: prepared.translated_language,
            localized_message,
            localized_language,
            translation_applied: prepared.translation_applied,
            crisis,
        })
    }

    pub async fn chat(&self, request: ChatRequest) -> Result<ChatReply, SessionError> {
        let user_id = require_user(&request.user_id)?;
        let incoming = request.message.trim();
        if incoming.is_empty() {
            return Err(SessionError::InvalidRequest("message cannot be empty".to_owned()));
        }
        let requested = non_blank(request.language.as_deref());

        let detected_language = self.detect_language(incoming).await;
        let mut english = incoming.to_owned();
        let mut translated_in = false;
        if let Some(source) = detected_language.as_deref().filter(|l| !is_pivot(l)) {
            if let Some(text) = self.translate_best_effort(incoming, source, PIVOT_LANG).await {
                english = text;
                translated_in = true;
            }
        }

        let reply = self.empathy.reply(english.clone()).await;
        let keywords = self.crisis.keywords().scan([english.as_str()]);

        let target = requested
            .or(detected_language.as_deref())
            .unwrap_or(PIVOT_LANG);
        let (message, language) = self.localize(reply, target).await;
        let translated_out = !is_pivot(&language);

        let peer_support_suggested = !keywords.is_empty() || self.recent_stress(user_id).await;
        let helpline = (!keywords.is_empty()).then(|| {
            self.crisis
                .helplines()
                .lookup(requested.or(detected_language.as_deref()))
                .clone()
        });

        tracing::info!(
            target: LOG_TARGET,
            user_id,
            language = %language,
            crisis_keywords = keywords.len(),
            peer_support_suggested,
            "empathy reply generated"
        );

        Ok(ChatReply {
            message,
            language,
            detected_language,
            translation_applied: translated_in || translated_out,
            peer_support_suggested,
            crisis_keywords: keywords,
            helpline,
        })
    }

    /// Speech synthesis; unlike the language steps, a provider failure is
    /// returned to the caller.
    pub async fn speak(&self, request: SpeakRequest) -> Result<SpeakResponse, SessionError> {
        let text = request.text.trim();
        if text.is_empty() {
            return Err(SessionError::InvalidRequest("text cannot be empty".to_owned()));
        }
        let language = LangTag::new(request.language)
            .map_err(|e| SessionError::InvalidRequest(e.to_string()))?;
        let len = language.as_str().chars().count();
        if !(MIN_LANG_LEN..=MAX_LANG_LEN).contains(&len) {
            return Err(SessionError::InvalidRequest(format!(
                "language must be {MIN_LANG_LEN}-{MAX_LANG_LEN} characters, got {len}"
            )));
        }

        let audio = self
            .speech
            .text_to_speech(SpeechRequest {
                text: text.to_owned(),
                language: language.as_str().to_owned(),
                voice: non_blank(request.voice.as_deref()).map(|v| VoiceId(v.to_owned())),
            })
            .await
            .inspect_err(|e| tracing::error!(target: LOG_TARGET, error = %e, "speech synthesis failed"))?;

        Ok(SpeakResponse {
            audio_url: audio.audio_url,
            language: language.as_str().to_owned(),
        })
    }

    pub async fn transcribe(
        &self,
        audio: Vec<u8>,
        language: Option<&str>,
    ) -> Result<Transcript, SessionError> {
        if audio.is_empty() {
            return Err(SessionError::InvalidRequest("audio cannot be empty".to_owned()));
        }
        let language = non_blank(language).unwrap_or(AUTO_LANG).to_owned();
        Ok(self.speech.transcribe(audio, language).await?)
    }

    pub async fn latest(&self, user_id: &str) -> Result<MoodEntry, SessionError> {
        let user_id = require_user(user_id)?;
        self.store
            .history(user_id, 1)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| SessionError::NotFound(format!("no mood entries for user {user_id}")))
    }

    /// Newest first; `limit` defaults to the configured history size.
    pub async fn history(
        &self,
        user_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<MoodEntry>, SessionError> {
        let user_id = require_user(user_id)?;
        let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
        Ok(self.store.history(user_id, limit).await?)
    }

    async fn prepare_text(&self, raw: &str) -> PreparedText {
        if raw.is_empty() {
            return PreparedText::default();
        }

        let detected_language = self.detect_language(raw).await;
        let source = detected_language.as_deref().unwrap_or(AUTO_LANG);

        let mut prepared = PreparedText {
            raw: raw.to_owned(),
            analysis: raw.to_owned(),
            detected_language: detected_language.clone(),
            ..PreparedText::default()
        };

        if is_pivot(source) {
            prepared.translated_text = Some(raw.to_owned());
            prepared.translated_language = Some(PIVOT_LANG.to_owned());
        } else if let Some(text) = self.translate_best_effort(raw, source, PIVOT_LANG).await {
            prepared.analysis = text.clone();
            prepared.translated_text = Some(text);
            prepared.translated_language = Some(PIVOT_LANG.to_owned());
            prepared.translation_applied = true;
        }
        prepared
    }

    async fn detect_language(&self, text: &str) -> Option<String> {
        match self.translator.detect_language(text.to_owned()).await {
            Ok(detected) => Some(detected.language),
            Err(e) => {
                tracing::warn!(target: LOG_TARGET, error = %e, "language detection failed");
                None
            }
        }
    }

    async fn translate_best_effort(&self, text: &str, from: &str, to: &str) -> Option<String> {
        match self
            .translator
            .translate(text.to_owned(), from.to_owned(), to.to_owned())
            .await
        {
            Ok(t) => Some(t.text),
            Err(e) => {
                tracing::warn!(target: LOG_TARGET, error = %e, from, to, "translation failed");
                None
            }
        }
    }

    /// Translates English `text` into `target`. Keeps English, labelled as the
    /// pivot language, when `target` is the pivot or translation fails.
    async fn localize(&self, text: String, target: &str) -> (String, String) {
        if is_pivot(target) {
            return (text, PIVOT_LANG.to_owned());
        }
        match self.translate_best_effort(&text, PIVOT_LANG, target).await {
            Some(localized) => (localized, target.to_owned()),
            None => (text, PIVOT_LANG.to_owned()),
        }
    }

    async fn recent_stress(&self, user_id: &str) -> bool {
        match self.store.history(user_id, DEFAULT_HISTORY_LIMIT).await {
            Ok(recent) => {
                recent
                    .iter()
                    .filter(|e| e.mood() == MoodLabel::Stressed)
                    .count()
                    >= PEER_SUPPORT_THRESHOLD
            }
            Err(e) => {
                tracing::warn!(target: LOG_TARGET, error = %e, "peer support check failed");
                false
            }
        }
    }
}

fn confirmation_message(fused: &MoodFusionResult) -> String {
    format!(
        "Your mood: {} ({}% confidence)",
        fused.mood.title(),
        fused.confidence
    )
}

fn require_user(user_id: &str) -> Result<&str, SessionError> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(SessionError::InvalidRequest("userId cannot be empty".to_owned()));
    }
    Ok(user_id)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
