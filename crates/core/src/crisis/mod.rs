mod helpline;

use crate::config::CrisisPolicy;
use crate::mood::{MoodFusionResult, MoodLabel};
use crate::store::{MoodStore, StoreError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use helpline::{HelplineDirectory, HelplineInfo};

const LOG_TARGET: &str = "crisis";

const DEFAULT_KEYWORDS: &[&str] = &[
    "suicide",
    "kill myself",
    "hurt myself",
    "self harm",
    "self-harm",
    "end my life",
    "ending my life",
    "can't go on",
    "cant go on",
    "hopeless",
    "worthless",
    "overdose",
    "cutting",
    "bleeding",
    "die",
    "want to die",
    "give up",
];

/// Self-harm and crisis phrases, matched as case-insensitive substrings.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct CrisisKeywords(Vec<String>);

impl CrisisKeywords {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Hits across all `texts`, in first-seen order and without duplicates.
    /// Within one text, hits follow keyword-list order.
    pub fn scan<'a, I>(&self, texts: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut hits: Vec<String> = Vec::new();
        for text in texts {
            if text.is_empty() {
                continue;
            }
            let lowered = text.to_lowercase();
            for keyword in &self.0 {
                if lowered.contains(keyword.as_str()) && !hits.contains(keyword) {
                    hits.push(keyword.clone());
                }
            }
        }
        hits
    }

    pub(crate) fn normalized(self) -> Self {
        Self::new(self.0)
    }
}

impl Default for CrisisKeywords {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORDS)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CrisisReason {
    Keywords,
    Streak,
}

/// Outcome of a crisis check. `triggered` holds exactly when `reasons` is
/// non-empty, and a helpline is attached only when triggered.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CrisisEvaluation {
    pub triggered: bool,
    pub reasons: Vec<CrisisReason>,
    pub keywords: Vec<String>,
    pub streak: u32,
    pub helpline: Option<HelplineInfo>,
}

/// Text variants and context for one evaluation.
#[derive(Clone, Copy, Debug)]
pub struct CrisisInput<'a> {
    pub user_id: &'a str,
    /// The text the mood was scored on; may be empty.
    pub analysis_text: &'a str,
    pub translated_text: Option<&'a str>,
    pub original_text: Option<&'a str>,
    pub fused: &'a MoodFusionResult,
    pub preferred_language: Option<&'a str>,
    pub detected_language: Option<&'a str>,
    pub now: DateTime<Utc>,
}

impl CrisisInput<'_> {
    /// Analysis text first, then translated and original text when they
    /// differ from it.
    fn texts(&self) -> Vec<&str> {
        let mut texts = vec![self.analysis_text];
        for variant in [self.translated_text, self.original_text].into_iter().flatten() {
            if variant != self.analysis_text {
                texts.push(variant);
            }
        }
        texts
    }
}

#[derive(Clone, Debug)]
pub struct CrisisEvaluator {
    keywords: Arc<CrisisKeywords>,
    helplines: Arc<HelplineDirectory>,
    policy: CrisisPolicy,
}

impl CrisisEvaluator {
    pub fn new(
        keywords: Arc<CrisisKeywords>,
        helplines: Arc<HelplineDirectory>,
        policy: CrisisPolicy,
    ) -> Self {
        Self {
            keywords,
            helplines,
            policy,
        }
    }

    pub fn keywords(&self) -> &CrisisKeywords {
        &self.keywords
    }

    pub fn helplines(&self) -> &HelplineDirectory {
        &self.helplines
    }

    /// Scans the text variants and counts the user's recent confident
    /// stressed entries. Runs for every request, including face-only and
    /// empty-text ones.
    pub async fn evaluate<S>(
        &self,
        store: &S,
        input: CrisisInput<'_>,
    ) -> Result<CrisisEvaluation, StoreError>
    where
        S: MoodStore + ?Sized,
    {
        let hits = self.keywords.scan(input.texts());
        let since = input.now - self.policy.window();
        let prior = store
            .count_negative_since(input.user_id, since, self.policy.min_confidence)
            .await?;
        let language = input.preferred_language.or(input.detected_language);
        let evaluation = self.assess(hits, prior, input.fused, language);

        if evaluation.triggered {
            tracing::warn!(
                target: LOG_TARGET,
                user_id = input.user_id,
                reasons = ?evaluation.reasons,
                keywords = ?evaluation.keywords,
                streak = evaluation.streak,
                "crisis flag raised"
            );
        }
        Ok(evaluation)
    }

    /// Pure decision given keyword hits and the prior stressed-entry count.
    ///
    /// The reported streak includes the current reading only when the check
    /// triggers; otherwise it is the prior count alone.
    pub fn assess(
        &self,
        keyword_hits: Vec<String>,
        prior_negative: u32,
        fused: &MoodFusionResult,
        language: Option<&str>,
    ) -> CrisisEvaluation {
        let current = u32::from(fused.is_high_confidence(MoodLabel::Stressed, self.policy.min_confidence));
        let streak = prior_negative.saturating_add(current);

        let mut reasons = Vec::new();
        if !keyword_hits.is_empty() {
            reasons.push(CrisisReason::Keywords);
        }
        if streak >= self.policy.streak_threshold {
            reasons.push(CrisisReason::Streak);
        }
        let triggered = !reasons.is_empty();

        CrisisEvaluation {
            triggered,
            reasons,
            keywords: keyword_hits,
            streak: if triggered { streak } else { prior_negative },
            helpline: triggered.then(|| self.helplines.lookup(language).clone()),
        }
    }
}

impl Default for CrisisEvaluator {
    fn default() -> Self {
        Self::new(
            Arc::new(CrisisKeywords::default()),
            Arc::new(HelplineDirectory::default()),
            CrisisPolicy::default(),
        )
    }
}
