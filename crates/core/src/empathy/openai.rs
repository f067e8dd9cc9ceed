use crate::config::{ApiKey, RequestTimeout};
use crate::empathy::{ReplyError, ReplyGenerator};
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

const SYSTEM_PROMPT: &str = "You are an empathetic, supportive mental health companion named MoodFlow. \
Respond with short, compassionate messages (max 3 sentences) that validate feelings, \
encourage gentle next steps, and never offer medical or legal advice.";
const TEMPERATURE: f64 = 0.7;
const MAX_TOKENS: u32 = 220;

/// Chat-completions client for empathetic replies.
#[derive(Clone)]
pub struct OpenAiReplyGenerator {
    client: Client,
    api_key: ApiKey,
    model: String,
    url: String,
}

impl OpenAiReplyGenerator {
    pub fn new(
        api_key: ApiKey,
        model: String,
        base_url: &Url,
        timeout: RequestTimeout,
    ) -> Result<Self, ReplyError> {
        let client = Client::builder().timeout(timeout.duration()).build()?;
        Ok(Self {
            client,
            api_key,
            model,
            url: format!("{}/chat/completions", base_url.as_str().trim_end_matches('/')),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f64,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: String,
}

impl ChatResponse {
    fn first_reply(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_owned())
            .filter(|c| !c.is_empty())
    }
}

impl ReplyGenerator for OpenAiReplyGenerator {
    fn generate(&self, english_text: String) -> BoxFuture<'_, Result<String, ReplyError>> {
        async move {
            let request = ChatRequest {
                model: &self.model,
                messages: [
                    ChatMessage {
                        role: "system",
                        content: SYSTEM_PROMPT,
                    },
                    ChatMessage {
                        role: "user",
                        content: &english_text,
                    },
                ],
                temperature: TEMPERATURE,
                max_tokens: MAX_TOKENS,
            };

            let response = self
                .client
                .post(&self.url)
                .bearer_auth(self.api_key.expose())
                .json(&request)
                .send()
                .await?;

            if !response.status().is_success() {
                let status = response.status().as_u16();
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_owned());
                return Err(ReplyError::Api { status, body });
            }

            let parsed: ChatResponse = response.json().await?;
            parsed.first_reply().ok_or(ReplyError::Empty)
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_completions_url() {
        let base = Url::parse("https://api.openai.com/v1").expect("url");
        let key = ApiKey::new("sk-test").expect("key");
        let g = OpenAiReplyGenerator::new(key, "gpt-4o-mini".to_owned(), &base, RequestTimeout::default())
            .expect("client");
        assert_eq!(g.url, "https://api.openai.com/v1/chat/completions");
        assert_eq!(g.model(), "gpt-4o-mini");
    }

    #[test]
    fn extracts_trimmed_first_choice() {
        let r: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"  Breathe slowly. \n"}}]}"#,
        )
        .expect("json");
        assert_eq!(r.first_reply().as_deref(), Some("Breathe slowly."));

        let empty: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).expect("json");
        assert!(empty.first_reply().is_none());
    }

    #[test]
    fn request_carries_prompt_and_limits() {
        let request = ChatRequest {
            model: "m",
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: "hi",
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };
        let v = serde_json::to_value(&request).expect("json");
        assert_eq!(v["max_tokens"], 220);
        assert_eq!(v["messages"][1]["content"], "hi");
        assert!(v["messages"][0]["content"]
            .as_str()
            .is_some_and(|s| s.contains("MoodFlow")));
    }
}
