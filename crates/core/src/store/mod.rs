mod memory;

use crate::crisis::{CrisisReason, HelplineInfo};
use crate::mood::{Confidence, EvidenceSource, FaceAnalysisResult, MoodLabel};
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

pub use memory::InMemoryMoodStore;

/// Everything one detection call produced, as handed to the store.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewMoodEntry {
    pub user_id: String,
    pub mood: MoodLabel,
    pub confidence: Confidence,
    pub sources: BTreeSet<EvidenceSource>,
    pub face_analysis: Option<FaceAnalysisResult>,
    pub original_text: Option<String>,
    pub original_language: Option<String>,
    pub translated_text: Option<String>,
    pub translated_language: Option<String>,
    pub translation_provider: Option<String>,
    pub crisis_flag: bool,
    pub crisis_keywords: Vec<String>,
    pub crisis_reasons: Vec<CrisisReason>,
    pub negative_mood_streak: u32,
    pub helpline: Option<HelplineInfo>,
}

/// Persisted, immutable detection record.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MoodEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub data: NewMoodEntry,
}

impl MoodEntry {
    pub fn user_id(&self) -> &str {
        &self.data.user_id
    }

    pub fn mood(&self) -> MoodLabel {
        self.data.mood
    }

    pub fn confidence(&self) -> Confidence {
        self.data.confidence
    }
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Per-user mood history.
///
/// Appends are atomic and each user's history stays ordered by timestamp;
/// reads observe a consistent snapshot.
pub trait MoodStore: Send + Sync {
    /// Stamps `entry` with an id and the current time and appends it.
    fn record(&self, entry: NewMoodEntry) -> BoxFuture<'_, Result<MoodEntry, StoreError>>;

    /// Appends an entry that already carries its id and timestamp.
    fn insert(&self, entry: MoodEntry) -> BoxFuture<'_, Result<(), StoreError>>;

    /// Newest first, at most `limit` entries.
    fn history(
        &self,
        user_id: &str,
        limit: usize,
    ) -> BoxFuture<'_, Result<Vec<MoodEntry>, StoreError>>;

    /// Newest first, every entry at or after `since`.
    fn entries_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Vec<MoodEntry>, StoreError>>;

    /// Stressed entries at or after `since` with confidence >= `min_confidence`.
    fn count_negative_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
        min_confidence: u8,
    ) -> BoxFuture<'_, Result<u32, StoreError>>;
}
