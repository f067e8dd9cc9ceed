use serde::{Deserialize, Serialize};
use std::{fmt, path::PathBuf, time::Duration};
use url::Url;

pub const PIVOT_LANG: &str = "en";
pub const DEFAULT_HISTORY_LIMIT: usize = 10;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LINGO_BASE_URL: &str = "https://api.lingo.dev/v1";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const ENV_LINGO_API_KEY: &str = "LINGO_API_KEY";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_OPENAI_MODEL: &str = "OPENAI_MODEL";
pub const ENV_TABLES_PATH: &str = "MOODFLOW_TABLES";
pub const ENV_CASCADE_DIR: &str = "MOODFLOW_CASCADE_DIR";
/// Where distro OpenCV packages install the stock Haar cascades.
pub const DEFAULT_CASCADE_DIR: &str = "/usr/share/opencv4/haarcascades";

/// Lowercased primary subtag of a language tag: `"en-US"` -> `"en"`.
pub fn primary_subtag(tag: &str) -> String {
    tag.trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

/// True when `tag` names the pivot language, ignoring region and case.
pub fn is_pivot(tag: &str) -> bool {
    primary_subtag(tag) == PIVOT_LANG
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LangTag(String);

impl LangTag {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, ConfigError> {
        let v = value.into().trim().to_owned();
        if v.is_empty() {
            return Err(ConfigError::EmptyLanguage);
        }
        Ok(Self(v))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn primary_subtag(&self) -> String {
        primary_subtag(&self.0)
    }
}

impl Default for LangTag {
    fn default() -> Self {
        Self(PIVOT_LANG.to_owned())
    }
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, ConfigError> {
        let v = value.into();
        if v.trim().is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }
        Ok(Self(v))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(**redacted**)")
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiKeys {
    pub lingo: Option<ApiKey>,
    pub openai: Option<ApiKey>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequestTimeout {
    pub secs: u64,
}

impl RequestTimeout {
    pub fn new(secs: u64) -> Result<Self, ConfigError> {
        if secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(Self { secs })
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.secs)
    }
}

impl Default for RequestTimeout {
    fn default() -> Self {
        Self {
            secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// When a run of stressed readings escalates to a crisis.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CrisisPolicy {
    pub window_days: u32,
    pub min_confidence: u8,
    pub streak_threshold: u32,
}

impl CrisisPolicy {
    pub fn new(
        window_days: u32,
        min_confidence: u8,
        streak_threshold: u32,
    ) -> Result<Self, ConfigError> {
        if window_days == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        if streak_threshold == 0 {
            return Err(ConfigError::ZeroStreakThreshold);
        }
        if min_confidence > 100 {
            return Err(ConfigError::ConfidenceOutOfRange(min_confidence));
        }
        Ok(Self {
            window_days,
            min_confidence,
            streak_threshold,
        })
    }

    pub fn window(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.window_days))
    }
}

impl Default for CrisisPolicy {
    fn default() -> Self {
        Self {
            window_days: 3,
            min_confidence: 80,
            streak_threshold: 3,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderConfig {
    pub lingo_base_url: String,
    pub openai_base_url: String,
    pub openai_model: String,
    pub timeout: RequestTimeout,
}

impl ProviderConfig {
    pub fn lingo_url(&self) -> Result<Url, ConfigError> {
        parse_url(&self.lingo_base_url)
    }

    pub fn openai_url(&self) -> Result<Url, ConfigError> {
        parse_url(&self.openai_base_url)
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            lingo_base_url: DEFAULT_LINGO_BASE_URL.to_owned(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_owned(),
            openai_model: DEFAULT_OPENAI_MODEL.to_owned(),
            timeout: RequestTimeout::default(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    pub api_keys: ApiKeys,
    pub providers: ProviderConfig,
    pub crisis: CrisisPolicy,
    pub tables_path: Option<PathBuf>,
    /// Directory holding the Haar cascade XML files for face detection.
    pub cascade_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_keys: ApiKeys::default(),
            providers: ProviderConfig::default(),
            crisis: CrisisPolicy::default(),
            tables_path: None,
            cascade_dir: PathBuf::from(DEFAULT_CASCADE_DIR),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("language tag must not be empty")]
    EmptyLanguage,
    #[error("api key must not be empty")]
    EmptyApiKey,
    #[error("request timeout must be > 0 s")]
    ZeroTimeout,
    #[error("crisis window must be > 0 days")]
    ZeroWindow,
    #[error("crisis streak threshold must be > 0")]
    ZeroStreakThreshold,
    #[error("confidence {0} is outside 0..=100")]
    ConfidenceOutOfRange(u8),
    #[error("invalid url {0:?}: {1}")]
    InvalidUrl(String, url::ParseError),
}

pub fn parse_url(value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::InvalidUrl(value.to_owned(), e))
}

pub trait Env {
    fn var(&self, key: &str) -> Option<String>;
}

#[derive(Clone, Debug, Default)]
pub struct StdEnv;

impl Env for StdEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Clone, Debug, Default)]
pub struct MapEnv {
    vars: std::collections::BTreeMap<String, String>,
}

impl MapEnv {
    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_owned(), value.to_owned());
        self
    }
}

impl Env for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

pub fn resolve_api_key(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
) -> Result<Option<ApiKey>, ConfigError> {
    match cli_value {
        Some(v) => Ok(Some(ApiKey::new(v)?)),
        None => match env.var(env_key) {
            Some(v) => Ok(Some(ApiKey::new(v)?)),
            None => Ok(None),
        },
    }
}

pub fn resolve_string_with_default(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
    default: &str,
) -> String {
    match cli_value {
        Some(v) => v,
        None => env.var(env_key).unwrap_or_else(|| default.to_owned()),
    }
}

pub fn resolve_optional_string(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
) -> Option<String> {
    match cli_value {
        Some(v) => Some(v),
        None => env.var(env_key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_cli_takes_precedence_over_env() {
        let env = MapEnv::default().with_var(ENV_LINGO_API_KEY, "env-key");
        let key = resolve_api_key(Some("cli-key".to_owned()), ENV_LINGO_API_KEY, &env)
            .expect("valid key")
            .expect("present");
        assert_eq!(key.expose(), "cli-key");
    }

    #[test]
    fn api_key_env_used_when_cli_missing() {
        let env = MapEnv::default().with_var(ENV_OPENAI_API_KEY, "env-key");
        let key = resolve_api_key(None, ENV_OPENAI_API_KEY, &env)
            .expect("valid key")
            .expect("present");
        assert_eq!(key.expose(), "env-key");
    }

    #[test]
    fn blank_api_key_is_rejected() {
        let env = MapEnv::default().with_var(ENV_LINGO_API_KEY, "  ");
        assert_eq!(
            resolve_api_key(None, ENV_LINGO_API_KEY, &env),
            Err(ConfigError::EmptyApiKey)
        );
    }

    #[test]
    fn api_key_debug_is_redacted() {
        let key = ApiKey::new("secret").expect("non-empty");
        assert_eq!(format!("{key:?}"), "ApiKey(**redacted**)");
    }

    #[test]
    fn resolve_string_with_default_cli_takes_precedence() {
        let env = MapEnv::default().with_var(ENV_OPENAI_MODEL, "env");
        let v = resolve_string_with_default(Some("cli".to_owned()), ENV_OPENAI_MODEL, &env, "def");
        assert_eq!(v, "cli");
    }

    #[test]
    fn resolve_string_with_default_env_used_when_cli_missing() {
        let env = MapEnv::default().with_var(ENV_OPENAI_MODEL, "env");
        let v = resolve_string_with_default(None, ENV_OPENAI_MODEL, &env, "def");
        assert_eq!(v, "env");
    }

    #[test]
    fn resolve_string_with_default_default_used_when_both_missing() {
        let env = MapEnv::default();
        let v = resolve_string_with_default(None, ENV_OPENAI_MODEL, &env, DEFAULT_OPENAI_MODEL);
        assert_eq!(v, DEFAULT_OPENAI_MODEL);
    }

    #[test]
    fn primary_subtag_normalizes() {
        assert_eq!(primary_subtag("en-US"), "en");
        assert_eq!(primary_subtag(" HI_in "), "hi");
        assert_eq!(primary_subtag("zh"), "zh");
        assert_eq!(primary_subtag(""), "");
        assert!(is_pivot("EN-gb"));
        assert!(!is_pivot("auto"));
    }

    #[test]
    fn lang_tag_rejects_blank() {
        assert_eq!(LangTag::new(" "), Err(ConfigError::EmptyLanguage));
        assert_eq!(LangTag::new("pt-BR").expect("valid").primary_subtag(), "pt");
    }

    #[test]
    fn crisis_policy_validates() {
        assert_eq!(CrisisPolicy::new(3, 80, 3), Ok(CrisisPolicy::default()));
        assert_eq!(CrisisPolicy::new(0, 80, 3), Err(ConfigError::ZeroWindow));
        assert_eq!(CrisisPolicy::new(3, 80, 0), Err(ConfigError::ZeroStreakThreshold));
        assert_eq!(
            CrisisPolicy::new(3, 101, 3),
            Err(ConfigError::ConfidenceOutOfRange(101))
        );
        assert_eq!(CrisisPolicy::default().window(), chrono::Duration::days(3));
    }

    #[test]
    fn provider_urls_parse() {
        let providers = ProviderConfig::default();
        assert_eq!(providers.lingo_url().expect("valid").host_str(), Some("api.lingo.dev"));
        let bad = ProviderConfig {
            openai_base_url: "not a url".to_owned(),
            ..ProviderConfig::default()
        };
        assert!(matches!(bad.openai_url(), Err(ConfigError::InvalidUrl(_, _))));
    }

    #[test]
    fn request_timeout_must_be_positive() {
        assert_eq!(RequestTimeout::new(0), Err(ConfigError::ZeroTimeout));
        assert_eq!(
            RequestTimeout::default().duration(),
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
        );
    }
}
