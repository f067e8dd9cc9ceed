//! HTTP client for the Lingo.dev language and speech API.
//!
//! [`LingoClient`] implements both [`Translator`](crate::translate::Translator)
//! and [`SpeechService`](crate::speech::SpeechService); the trait impls live in
//! `translate::lingo` and `speech::lingo`.

use crate::config::{ApiKey, RequestTimeout};
use reqwest::multipart::Form;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

pub(crate) const LOG_TARGET: &str = "lingo";
pub const PROVIDER_NAME: &str = "lingo";

#[derive(thiserror::Error, Debug)]
pub enum LingoError {
    #[error("lingo request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("lingo api error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("invalid lingo response: {0}")]
    InvalidResponse(String),
}

#[derive(Clone)]
pub struct LingoClient {
    client: Client,
    api_key: ApiKey,
    base_url: String,
}

impl LingoClient {
    pub fn new(api_key: ApiKey, base_url: &Url, timeout: RequestTimeout) -> Result<Self, LingoError> {
        let client = Client::builder().timeout(timeout.duration()).build()?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url.as_str().trim_end_matches('/').to_owned(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, LingoError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.client.post(self.endpoint(path)).json(body);
        self.send(path, request).await
    }

    pub(crate) async fn post_multipart<T>(&self, path: &str, form: Form) -> Result<T, LingoError>
    where
        T: DeserializeOwned,
    {
        let request = self.client.post(self.endpoint(path)).multipart(form);
        self.send(path, request).await
    }

    async fn send<T>(&self, path: &str, request: RequestBuilder) -> Result<T, LingoError>
    where
        T: DeserializeOwned,
    {
        let response = request.bearer_auth(self.api_key.expose()).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_owned());
            tracing::debug!(target: LOG_TARGET, path, status, "lingo api error");
            return Err(LingoError::Api { status, body });
        }

        response
            .json()
            .await
            .map_err(|e| LingoError::InvalidResponse(format!("failed to parse JSON: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slash() {
        let key = ApiKey::new("k").expect("key");
        let base = Url::parse("https://api.lingo.dev/v1/").expect("url");
        let client = LingoClient::new(key, &base, RequestTimeout::default()).expect("client");
        assert_eq!(client.base_url(), "https://api.lingo.dev/v1");
        assert_eq!(client.endpoint("/translate"), "https://api.lingo.dev/v1/translate");
    }
}
