mod openai;

use futures::future::BoxFuture;
use rand::seq::IndexedRandom;
use std::sync::Arc;

pub use openai::OpenAiReplyGenerator;

const LOG_TARGET: &str = "empathy";

pub const FALLBACK_REPLIES: [&str; 3] = [
    "I hear you. That sounds heavy, and it makes sense you'd feel that way. Let’s take this one small step at a time together. 💜",
    "Thank you for trusting me with that. Your feelings matter, and I’m here to help you breathe through them.",
    "It’s okay to feel exactly how you do right now. You’re not alone, and we can find a gentle next step whenever you’re ready.",
];

#[derive(thiserror::Error, Debug)]
pub enum ReplyError {
    #[error("reply request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("reply api error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("reply response had no content")]
    Empty,
}

/// Short supportive reply to an English message.
pub trait ReplyGenerator: Send + Sync {
    fn generate(&self, english_text: String) -> BoxFuture<'_, Result<String, ReplyError>>;
}

/// Wraps an optional [`ReplyGenerator`] so a reply is always produced.
#[derive(Clone, Default)]
pub struct EmpathyResponder {
    generator: Option<Arc<dyn ReplyGenerator>>,
}

impl EmpathyResponder {
    pub fn new(generator: Arc<dyn ReplyGenerator>) -> Self {
        Self {
            generator: Some(generator),
        }
    }

    /// Replies come from [`FALLBACK_REPLIES`] only.
    pub fn canned() -> Self {
        Self { generator: None }
    }

    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    pub async fn reply(&self, english_text: String) -> String {
        let Some(generator) = &self.generator else {
            return fallback_reply().to_owned();
        };
        match generator.generate(english_text).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(target: LOG_TARGET, error = %e, "empathy generation failed, using fallback");
                fallback_reply().to_owned()
            }
        }
    }
}

pub fn fallback_reply() -> &'static str {
    FALLBACK_REPLIES
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(FALLBACK_REPLIES[0])
}
