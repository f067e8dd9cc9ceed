mod lexicon;
pub mod similarity;

use crate::mood::{MoodLabel, TextSentimentResult};
use std::sync::Arc;

pub use lexicon::SentimentLexicon;

const EXACT_HIT: f64 = 1.0;
const STRONG_FUZZY_HIT: f64 = 0.9;
const WEAK_FUZZY_HIT: f64 = 0.6;
const STRONG_RATIO: f64 = 0.9;
const WEAK_RATIO: f64 = 0.8;
/// Signal mass is measured per this many words.
const DENSITY_WINDOW_WORDS: f64 = 8.0;
const MIN_SIGNAL_CONFIDENCE: i64 = 60;
const MAX_CONFIDENCE: i64 = 97;

const TRIM_CHARS: &[char] = &[
    '.', ',', '!', '?', ':', ';', '(', ')', '[', ']', '{', '}', '"', '\'',
];

/// Keyword and typo-tolerant lexical mood scorer.
#[derive(Clone, Debug)]
pub struct TextSentimentScorer {
    lexicon: Arc<SentimentLexicon>,
}

impl TextSentimentScorer {
    pub fn new(lexicon: Arc<SentimentLexicon>) -> Self {
        Self { lexicon }
    }

    pub fn score(&self, text: &str) -> TextSentimentResult {
        if text.trim().is_empty() {
            return TextSentimentResult::new(MoodLabel::Neutral, 50);
        }

        let lowered = text.to_lowercase();
        let words = tokenize(&lowered);

        let mut best: Option<(MoodLabel, f64)> = None;
        for (mood, keywords) in self.lexicon.iter() {
            let score = category_score(&lowered, &words, keywords);
            // strict comparison keeps the earlier category on ties
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((mood, score));
            }
        }

        let (mood, max_score) = match best {
            Some((mood, score)) if score > 0.0 => (mood, score),
            _ => return TextSentimentResult::new(MoodLabel::Neutral, 55),
        };

        let word_count = words.len().max(1) as f64;
        let density = max_score / (word_count / DENSITY_WINDOW_WORDS);
        let confidence =
            ((density * 100.0).round() as i64).clamp(MIN_SIGNAL_CONFIDENCE, MAX_CONFIDENCE);

        tracing::debug!(%mood, max_score, words = words.len(), confidence, "text scored");
        TextSentimentResult::new(mood, confidence)
    }
}

impl Default for TextSentimentScorer {
    fn default() -> Self {
        Self::new(Arc::new(SentimentLexicon::default()))
    }
}

/// Splits on whitespace and trims surrounding punctuation from each word.
pub fn tokenize(lowered: &str) -> Vec<&str> {
    lowered
        .split_whitespace()
        .map(|w| w.trim_matches(TRIM_CHARS))
        .filter(|w| !w.is_empty())
        .collect()
}

/// Each keyword scores once, exact substring first, else its first fuzzy token.
/// Overlapping keywords ("peace" inside "peaceful") each add their own score.
fn category_score(lowered: &str, words: &[&str], keywords: &[String]) -> f64 {
    keywords
        .iter()
        .map(|keyword| {
            if lowered.contains(keyword.as_str()) {
                return EXACT_HIT;
            }
            for word in words {
                let r = similarity::ratio(word, keyword);
                if r >= STRONG_RATIO {
                    return STRONG_FUZZY_HIT;
                }
                if r >= WEAK_RATIO {
                    return WEAK_FUZZY_HIT;
                }
            }
            0.0
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scorer() -> TextSentimentScorer {
        TextSentimentScorer::default()
    }

    #[test]
    fn empty_text_is_neutral_fifty() {
        for text in ["", "   ", "\n\t"] {
            let r = scorer().score(text);
            assert_eq!(r.mood, MoodLabel::Neutral);
            assert_eq!(r.confidence.get(), 50);
        }
    }

    #[test]
    fn no_signal_is_neutral_fifty_five() {
        let r = scorer().score("the weather report mentions wind");
        assert_eq!(r.mood, MoodLabel::Neutral);
        assert_eq!(r.confidence.get(), 55);
    }

    #[test]
    fn short_strong_hit_caps_at_ninety_seven() {
        let r = scorer().score("So stressed!");
        assert_eq!(r.mood, MoodLabel::Stressed);
        assert_eq!(r.confidence.get(), 97);
    }

    #[test]
    fn typo_still_contributes() {
        let lexicon = SentimentLexicon::default();
        let score = category_score(
            "happpy",
            &["happpy"],
            lexicon.keywords(MoodLabel::Energized),
        );
        assert!(score > 0.0);

        let r = scorer().score("happpy");
        assert_eq!(r.mood, MoodLabel::Energized);
    }

    #[test]
    fn overlapping_and_repeated_keywords_add_up() {
        let keywords: Vec<String> = ["peace", "peaceful", "quiet", "quiet"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(category_score("peaceful", &["peaceful"], &keywords[..2]), 2.0);
        assert_eq!(category_score("quiet", &["quiet"], &keywords[2..]), 2.0);
    }

    #[test]
    fn long_text_with_one_hit_floors_at_sixty() {
        let text = "I walked to the store and then I came back home and cooked some \
                    tea and read a book about the history of trains and it was good";
        let r = scorer().score(text);
        assert_eq!(r.mood, MoodLabel::Energized);
        assert_eq!(r.confidence.get(), 60);
    }

    #[test]
    fn density_drives_confidence() {
        // one exact hit ("calm") in 16 words: 1.0 / 2.0 -> 50 -> floored at 60
        // two exact hits in 16 words: 2.0 / 2.0 -> 100 -> capped at 97
        let sparse = scorer().score("calm a b c d e f g h i j k l m n o");
        let dense = scorer().score("calm serene a b c d e f g h i j k l m n");
        assert_eq!(sparse.confidence.get(), 60);
        assert_eq!(dense.confidence.get(), 97);
    }

    #[test]
    fn ties_favor_earlier_category() {
        let r = scorer().score("calm energized");
        assert_eq!(r.mood, MoodLabel::Calm);
    }

    #[test]
    fn confidence_stays_in_range() {
        let samples = [
            "",
            "ok",
            "I'm exhausted, anxious, worried, overwhelmed and sad",
            "nothing special happened, whatever",
            "!!!",
            "focused productive alert committed disciplined sharp",
        ];
        for text in samples {
            let c = scorer().score(text).confidence.get();
            assert!((50..=97).contains(&c), "{text:?} -> {c}");
        }
    }

    #[test]
    fn tokenize_strips_surrounding_punctuation() {
        assert_eq!(tokenize("(hello), \"world\"!  ...  x"), vec!["hello", "world", "x"]);
    }
}
