use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MoodLabel {
    Calm,
    Energized,
    Stressed,
    Focused,
    Neutral,
}

impl MoodLabel {
    /// Declaration order doubles as the tie-break order when scores are equal.
    pub const ALL: [MoodLabel; 5] = [
        MoodLabel::Calm,
        MoodLabel::Energized,
        MoodLabel::Stressed,
        MoodLabel::Focused,
        MoodLabel::Neutral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MoodLabel::Calm => "calm",
            MoodLabel::Energized => "energized",
            MoodLabel::Stressed => "stressed",
            MoodLabel::Focused => "focused",
            MoodLabel::Neutral => "neutral",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            MoodLabel::Calm => "Calm",
            MoodLabel::Energized => "Energized",
            MoodLabel::Stressed => "Stressed",
            MoodLabel::Focused => "Focused",
            MoodLabel::Neutral => "Neutral",
        }
    }
}

impl fmt::Display for MoodLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoodError {
    #[error("unknown mood label: {0:?}")]
    UnknownLabel(String),
}

impl FromStr for MoodLabel {
    type Err = MoodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        MoodLabel::ALL
            .into_iter()
            .find(|m| m.as_str() == needle)
            .ok_or_else(|| MoodError::UnknownLabel(s.to_owned()))
    }
}

/// Integer confidence, always within `0..=100`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(from = "i64", into = "u8")]
pub struct Confidence(u8);

impl Confidence {
    pub const MAX: Confidence = Confidence(100);

    pub fn clamped(value: i64) -> Self {
        Self(value.clamp(0, 100) as u8)
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

impl From<i64> for Confidence {
    fn from(value: i64) -> Self {
        Self::clamped(value)
    }
}

impl From<Confidence> for u8 {
    fn from(value: Confidence) -> Self {
        value.0
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single-modality judgment.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MoodReading {
    pub mood: MoodLabel,
    pub confidence: Confidence,
}

impl MoodReading {
    pub fn new(mood: MoodLabel, confidence: i64) -> Self {
        Self {
            mood,
            confidence: Confidence::clamped(confidence),
        }
    }
}

pub type TextSentimentResult = MoodReading;
pub type FaceAnalysisResult = MoodReading;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceSource {
    Text,
    Face,
    Fallback,
    Translation,
    Crisis,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MoodFusionResult {
    pub mood: MoodLabel,
    pub confidence: Confidence,
    pub sources: BTreeSet<EvidenceSource>,
}

impl MoodFusionResult {
    pub fn is_high_confidence(&self, mood: MoodLabel, min_confidence: u8) -> bool {
        self.mood == mood && self.confidence.get() >= min_confidence
    }
}
