use crate::mood::MoodLabel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const CALM: &[&str] = &[
    "calm", "peaceful", "relaxed", "serene", "tranquil", "quiet", "still", "gentle", "content",
    "restful", "chill", "zen", "peace", "quiet", "soothing", "mellow",
];

const ENERGIZED: &[&str] = &[
    "energized", "excited", "motivated", "active", "enthusiastic", "pumped", "hyper", "driven",
    "dynamic", "vigorous", "great", "amazing", "awesome", "fantastic", "wonderful", "happy",
    "joyful", "thrilled", "ecstatic", "elated", "cheerful", "upbeat", "positive", "good",
    "excellent", "brilliant",
];

const STRESSED: &[&str] = &[
    "stressed", "anxious", "worried", "overwhelmed", "tense", "nervous", "frantic", "uneasy",
    "pressured", "strained", "tired", "exhausted", "frustrated", "angry", "upset", "sad",
    "depressed", "down", "blue", "miserable", "unhappy", "gloomy", "melancholy", "sorrowful",
    "heartbroken", "devastated", "disappointed", "hurt", "pain", "suffering", "struggling",
    "difficult", "hard", "bad", "terrible", "awful", "horrible", "annoyed", "irritated", "mad",
    "furious", "rage", "panic", "scared", "afraid", "fearful",
];

const FOCUSED: &[&str] = &[
    "focused", "concentrated", "determined", "attentive", "sharp", "clear", "engaged", "mindful",
    "intent", "absorbed", "productive", "efficient", "alert", "aware", "present", "centered",
    "disciplined", "committed",
];

const NEUTRAL: &[&str] = &[
    "neutral", "okay", "fine", "normal", "average", "regular", "standard", "typical", "ordinary",
    "balanced", "meh", "whatever", "alright", "decent", "so-so", "nothing special",
];

/// Keyword lists per mood category.
///
/// Serialized as a JSON object keyed by mood label. Keywords are matched
/// lowercase; duplicates within a category count once per occurrence.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct SentimentLexicon {
    categories: BTreeMap<MoodLabel, Vec<String>>,
}

impl SentimentLexicon {
    pub fn new(categories: BTreeMap<MoodLabel, Vec<String>>) -> Self {
        let categories = categories
            .into_iter()
            .map(|(mood, words)| {
                let words = words
                    .into_iter()
                    .map(|w| w.trim().to_lowercase())
                    .filter(|w| !w.is_empty())
                    .collect();
                (mood, words)
            })
            .collect();
        Self { categories }
    }

    pub fn keywords(&self, mood: MoodLabel) -> &[String] {
        self.categories
            .get(&mood)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Categories in [`MoodLabel::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (MoodLabel, &[String])> {
        MoodLabel::ALL
            .into_iter()
            .map(move |mood| (mood, self.keywords(mood)))
    }

    pub fn missing_categories(&self) -> Vec<MoodLabel> {
        MoodLabel::ALL
            .into_iter()
            .filter(|mood| self.keywords(*mood).is_empty())
            .collect()
    }

    pub(crate) fn normalized(self) -> Self {
        Self::new(self.categories)
    }
}

impl Default for SentimentLexicon {
    fn default() -> Self {
        let table = [
            (MoodLabel::Calm, CALM),
            (MoodLabel::Energized, ENERGIZED),
            (MoodLabel::Stressed, STRESSED),
            (MoodLabel::Focused, FOCUSED),
            (MoodLabel::Neutral, NEUTRAL),
        ];
        let categories = table
            .into_iter()
            .map(|(mood, words)| (mood, words.iter().map(|w| (*w).to_owned()).collect()))
            .collect();
        Self { categories }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_covers_every_category() {
        let lexicon = SentimentLexicon::default();
        assert!(lexicon.missing_categories().is_empty());
        assert!(lexicon.keywords(MoodLabel::Energized).iter().any(|w| w == "happy"));
    }

    #[test]
    fn new_lowercases_and_drops_blank_keywords() {
        let mut categories = BTreeMap::new();
        categories.insert(MoodLabel::Calm, vec![" Serene ".to_owned(), "  ".to_owned()]);
        let lexicon = SentimentLexicon::new(categories);
        assert_eq!(lexicon.keywords(MoodLabel::Calm), ["serene".to_owned()]);
        assert_eq!(lexicon.missing_categories().len(), 4);
    }

    #[test]
    fn deserializes_from_label_keyed_object() {
        let lexicon: SentimentLexicon =
            serde_json::from_str(r#"{"focused":["locked in"],"calm":["breezy"]}"#)
                .expect("valid lexicon");
        let order: Vec<MoodLabel> = lexicon
            .iter()
            .filter(|(_, words)| !words.is_empty())
            .map(|(mood, _)| mood)
            .collect();
        assert_eq!(order, vec![MoodLabel::Calm, MoodLabel::Focused]);
    }
}
