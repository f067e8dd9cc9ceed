use crate::mood::{
    Confidence, EvidenceSource, FaceAnalysisResult, MoodFusionResult, MoodLabel,
    TextSentimentResult,
};
use std::collections::BTreeSet;

/// Combines the text and face readings into one judgment.
///
/// Agreement keeps the higher confidence. Disagreement takes the reading with
/// the strictly higher confidence; equal confidence goes to text.
pub fn fuse(
    text: Option<TextSentimentResult>,
    face: Option<FaceAnalysisResult>,
) -> MoodFusionResult {
    let (mood, confidence, sources): (MoodLabel, Confidence, BTreeSet<EvidenceSource>) =
        match (text, face) {
            (None, None) => (
                MoodLabel::Neutral,
                Confidence::clamped(50),
                [EvidenceSource::Fallback].into(),
            ),
            (Some(t), None) => (t.mood, t.confidence, [EvidenceSource::Text].into()),
            (None, Some(f)) => (f.mood, f.confidence, [EvidenceSource::Face].into()),
            (Some(t), Some(f)) => {
                let sources: BTreeSet<_> = [EvidenceSource::Text, EvidenceSource::Face].into();
                if t.mood == f.mood {
                    (t.mood, t.confidence.max(f.confidence), sources)
                } else if t.confidence >= f.confidence {
                    (t.mood, t.confidence, sources)
                } else {
                    (f.mood, f.confidence, sources)
                }
            }
        };

    tracing::debug!(%mood, %confidence, ?sources, "mood fused");
    MoodFusionResult {
        mood,
        confidence,
        sources,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mood::MoodReading;

    fn sources(tags: &[EvidenceSource]) -> BTreeSet<EvidenceSource> {
        tags.iter().copied().collect()
    }

    #[test]
    fn nothing_is_fallback_neutral() {
        let r = fuse(None, None);
        assert_eq!(r.mood, MoodLabel::Neutral);
        assert_eq!(r.confidence.get(), 50);
        assert_eq!(r.sources, sources(&[EvidenceSource::Fallback]));
    }

    #[test]
    fn single_modality_passes_through() {
        let text = MoodReading::new(MoodLabel::Calm, 64);
        let r = fuse(Some(text), None);
        assert_eq!((r.mood, r.confidence), (text.mood, text.confidence));
        assert_eq!(r.sources, sources(&[EvidenceSource::Text]));

        let face = MoodReading::new(MoodLabel::Focused, 78);
        let r = fuse(None, Some(face));
        assert_eq!((r.mood, r.confidence), (face.mood, face.confidence));
        assert_eq!(r.sources, sources(&[EvidenceSource::Face]));
    }

    #[test]
    fn agreement_takes_max_either_way() {
        let low = MoodReading::new(MoodLabel::Stressed, 70);
        let high = MoodReading::new(MoodLabel::Stressed, 90);
        for (t, f) in [(low, high), (high, low)] {
            let r = fuse(Some(t), Some(f));
            assert_eq!(r.mood, MoodLabel::Stressed);
            assert_eq!(r.confidence.get(), 90);
            assert_eq!(r.sources, sources(&[EvidenceSource::Text, EvidenceSource::Face]));
        }
    }

    #[test]
    fn disagreement_takes_more_confident() {
        let text = MoodReading::new(MoodLabel::Calm, 60);
        let face = MoodReading::new(MoodLabel::Energized, 90);
        let r = fuse(Some(text), Some(face));
        assert_eq!(r.mood, MoodLabel::Energized);
        assert_eq!(r.confidence.get(), 90);
        assert_eq!(r.sources, sources(&[EvidenceSource::Text, EvidenceSource::Face]));
    }

    #[test]
    fn disagreement_tie_goes_to_text() {
        let text = MoodReading::new(MoodLabel::Calm, 75);
        let face = MoodReading::new(MoodLabel::Stressed, 75);
        let r = fuse(Some(text), Some(face));
        assert_eq!(r.mood, MoodLabel::Calm);
        assert_eq!(r.confidence.get(), 75);
    }
}
