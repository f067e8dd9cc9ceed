#![deny(warnings)]

use anyhow::Context;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use clap::{Parser, Subcommand};
use moodflow_core::config::{
    parse_url, resolve_api_key, resolve_optional_string, resolve_string_with_default, ApiKeys,
    AppConfig, CrisisPolicy, Env, LangTag, ProviderConfig, RequestTimeout, StdEnv,
    DEFAULT_CASCADE_DIR, DEFAULT_OPENAI_MODEL, DEFAULT_REQUEST_TIMEOUT_SECS, ENV_CASCADE_DIR,
    ENV_LINGO_API_KEY, ENV_OPENAI_API_KEY, ENV_OPENAI_MODEL, ENV_TABLES_PATH,
};
use moodflow_core::empathy::{EmpathyResponder, OpenAiReplyGenerator};
use moodflow_core::face::FaceDetector;
use moodflow_core::lingo::LingoClient;
use moodflow_core::session::{
    ChatRequest, MoodDetectionRequest, MoodSession, SessionError, SpeakRequest,
};
use moodflow_core::speech::{DummySpeechService, SpeechService};
use moodflow_core::store::InMemoryMoodStore;
use moodflow_core::tables::SafetyTables;
use moodflow_core::translate::{DummyTranslator, Translator};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

const DEFAULT_USER: &str = "default";

#[derive(Parser, Debug)]
#[command(name = "moodflow")]
#[command(about = "Multilingual mood detection with crisis escalation")]
struct Args {
    #[command(subcommand)]
    command: Command,

    #[arg(long, global = true)]
    lingo_api_key: Option<String>,

    #[arg(long, global = true)]
    openai_api_key: Option<String>,

    #[arg(long, global = true)]
    openai_model: Option<String>,

    #[arg(long, global = true)]
    lingo_base_url: Option<String>,

    #[arg(long, global = true)]
    openai_base_url: Option<String>,

    #[arg(long, global = true, default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// JSON file overriding the built-in lexicon, crisis keywords and helplines.
    #[arg(long, global = true)]
    tables: Option<PathBuf>,

    /// Directory with the Haar cascade XML files (builds with `opencv`).
    #[arg(long, global = true)]
    cascade_dir: Option<PathBuf>,

    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Detect mood from text, a recorded voice note and/or a face photo.
    Detect {
        #[arg(long, default_value = DEFAULT_USER)]
        user: String,
        #[arg(long)]
        text: Option<String>,
        /// Audio file transcribed to text when `--text` is absent.
        #[arg(long)]
        audio: Option<PathBuf>,
        #[arg(long)]
        image: Option<PathBuf>,
        #[arg(long)]
        lang: Option<String>,
    },
    /// Read lines from stdin; each line is a detection for the same user.
    /// `/chat <msg>`, `/latest` and `/history [n]` are also accepted.
    Session {
        #[arg(long, default_value = DEFAULT_USER)]
        user: String,
        #[arg(long)]
        lang: Option<String>,
    },
    /// One empathy chat turn.
    Chat {
        #[arg(long, default_value = DEFAULT_USER)]
        user: String,
        #[arg(long)]
        message: String,
        #[arg(long)]
        lang: Option<String>,
    },
    /// Text-to-speech for a message.
    Speak {
        #[arg(long)]
        text: String,
        #[arg(long, default_value = "en")]
        lang: String,
        #[arg(long)]
        voice: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let env = StdEnv;
    let cfg = build_config(&args, &env)?;

    tracing::info!(
        lingo = cfg.api_keys.lingo.is_some(),
        openai = cfg.api_keys.openai.is_some(),
        model = %cfg.providers.openai_model,
        tables = ?cfg.tables_path,
        "config loaded"
    );

    let session = build_session(&cfg)?;

    match args.command {
        Command::Detect {
            user,
            text,
            audio,
            image,
            lang,
        } => {
            let text = match (text, audio) {
                (Some(t), _) => t,
                (None, Some(path)) => transcribe_file(&session, &path, lang.as_deref()).await?,
                (None, None) => String::new(),
            };
            let image_data = image.as_deref().map(read_image).transpose()?;
            let request = MoodDetectionRequest {
                user_id: user,
                text,
                use_webcam: image_data.is_some(),
                image_data,
                preferred_language: preferred_language(lang)?,
            };
            print_json(&session.detect(request).await?)?;
        }
        Command::Session { user, lang } => run_session(&session, user, lang).await?,
        Command::Chat {
            user,
            message,
            lang,
        } => {
            let reply = session
                .chat(ChatRequest {
                    user_id: user,
                    message,
                    language: preferred_language(lang)?,
                })
                .await?;
            print_json(&reply)?;
        }
        Command::Speak { text, lang, voice } => {
            let audio = session
                .speak(SpeakRequest {
                    text,
                    language: lang,
                    voice,
                })
                .await?;
            print_json(&audio)?;
        }
    }

    Ok(())
}

async fn run_session(session: &MoodSession, user: String, lang: Option<String>) -> anyhow::Result<()> {
    let preferred = preferred_language(lang)?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let result = if let Some(message) = line.strip_prefix("/chat ") {
            session
                .chat(ChatRequest {
                    user_id: user.clone(),
                    message: message.to_owned(),
                    language: preferred.clone(),
                })
                .await
                .and_then(|r| to_json(&r))
        } else if line == "/latest" {
            session.latest(&user).await.and_then(|e| to_json(&e))
        } else if let Some(limit) = history_command(line) {
            session.history(&user, limit).await.and_then(|h| to_json(&h))
        } else {
            session
                .detect(MoodDetectionRequest {
                    user_id: user.clone(),
                    text: line.to_owned(),
                    preferred_language: preferred.clone(),
                    ..MoodDetectionRequest::default()
                })
                .await
                .and_then(|o| to_json(&o))
        };

        match result {
            Ok(json) => println!("{json}"),
            // keep the session alive on per-line errors
            Err(e) => tracing::error!(error = %e, "request failed"),
        }
    }
    Ok(())
}

/// `/history` or `/history <n>`; `None` for anything else.
fn history_command(line: &str) -> Option<Option<usize>> {
    if line == "/history" {
        return Some(None);
    }
    let rest = line.strip_prefix("/history ")?;
    Some(rest.trim().parse().ok())
}

async fn transcribe_file(
    session: &MoodSession,
    path: &std::path::Path,
    lang: Option<&str>,
) -> anyhow::Result<String> {
    let audio = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read audio file {}", path.display()))?;
    let transcript = session.transcribe(audio, lang).await?;
    tracing::info!(
        chars = transcript.text.len(),
        detected = ?transcript.detected_language,
        "voice note transcribed"
    );
    Ok(transcript.text)
}

fn read_image(path: &std::path::Path) -> anyhow::Result<String> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read image file {}", path.display()))?;
    Ok(STANDARD.encode(bytes))
}

fn preferred_language(lang: Option<String>) -> anyhow::Result<Option<String>> {
    lang.map(|l| LangTag::new(l).map(|t| t.as_str().to_owned()))
        .transpose()
        .context("invalid --lang")
}

fn to_json<T: Serialize>(value: &T) -> Result<String, SessionError> {
    serde_json::to_string(value).map_err(|e| SessionError::InvalidRequest(e.to_string()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(
            level
                .parse()
                .with_context(|| format!("invalid --log-level: {level}"))?,
        )
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn build_config(args: &Args, env: &impl Env) -> anyhow::Result<AppConfig> {
    let lingo = resolve_api_key(args.lingo_api_key.clone(), ENV_LINGO_API_KEY, env)?;
    let openai = resolve_api_key(args.openai_api_key.clone(), ENV_OPENAI_API_KEY, env)?;

    let defaults = ProviderConfig::default();
    let providers = ProviderConfig {
        lingo_base_url: args
            .lingo_base_url
            .clone()
            .unwrap_or(defaults.lingo_base_url),
        openai_base_url: args
            .openai_base_url
            .clone()
            .unwrap_or(defaults.openai_base_url),
        openai_model: resolve_string_with_default(
            args.openai_model.clone(),
            ENV_OPENAI_MODEL,
            env,
            DEFAULT_OPENAI_MODEL,
        ),
        timeout: RequestTimeout::new(args.timeout_secs)?,
    };
    // fail on malformed urls before any request is made
    parse_url(&providers.lingo_base_url)?;
    parse_url(&providers.openai_base_url)?;

    let tables_path =
        resolve_optional_string(args.tables.as_ref().map(|p| p.display().to_string()), ENV_TABLES_PATH, env)
            .map(PathBuf::from);

    let cascade_dir = PathBuf::from(resolve_string_with_default(
        args.cascade_dir.as_ref().map(|p| p.display().to_string()),
        ENV_CASCADE_DIR,
        env,
        DEFAULT_CASCADE_DIR,
    ));

    Ok(AppConfig {
        api_keys: ApiKeys { lingo, openai },
        providers,
        crisis: CrisisPolicy::default(),
        tables_path,
        cascade_dir,
    })
}

fn build_session(cfg: &AppConfig) -> anyhow::Result<MoodSession> {
    let tables = SafetyTables::load_or_default(cfg.tables_path.as_deref())
        .context("failed to load safety tables")?
        .into_shared();

    let (translator, speech): (Arc<dyn Translator>, Arc<dyn SpeechService>) =
        match cfg.api_keys.lingo.clone() {
            Some(key) => {
                let client = Arc::new(LingoClient::new(
                    key,
                    &cfg.providers.lingo_url()?,
                    cfg.providers.timeout,
                )?);
                let translator: Arc<dyn Translator> = client.clone();
                let speech: Arc<dyn SpeechService> = client;
                (translator, speech)
            }
            None => {
                tracing::warn!("LINGO_API_KEY not set; using mock language and speech providers");
                let translator: Arc<dyn Translator> = Arc::new(DummyTranslator::new());
                let speech: Arc<dyn SpeechService> = Arc::new(DummySpeechService::new());
                (translator, speech)
            }
        };

    let empathy = match cfg.api_keys.openai.clone() {
        Some(key) => EmpathyResponder::new(Arc::new(OpenAiReplyGenerator::new(
            key,
            cfg.providers.openai_model.clone(),
            &cfg.providers.openai_url()?,
            cfg.providers.timeout,
        )?)),
        None => {
            tracing::info!("OPENAI_API_KEY not set; chat replies use canned responses");
            EmpathyResponder::canned()
        }
    };

    let session = MoodSession::new(
        translator,
        speech,
        Arc::new(InMemoryMoodStore::new()),
        tables,
        cfg.crisis,
    )
    .with_empathy(empathy);

    Ok(match face_detector(cfg) {
        Some(detector) => session.with_face_detector(detector),
        None => session,
    })
}

#[cfg(feature = "opencv")]
fn face_detector(cfg: &AppConfig) -> Option<Arc<dyn FaceDetector>> {
    use moodflow_core::face::HaarCascadeDetector;

    match HaarCascadeDetector::from_dir(&cfg.cascade_dir) {
        Ok(detector) => Some(Arc::new(detector)),
        Err(e) => {
            tracing::warn!(error = %e, "haar cascades unavailable; webcam frames use mock readings");
            None
        }
    }
}

#[cfg(not(feature = "opencv"))]
fn face_detector(cfg: &AppConfig) -> Option<Arc<dyn FaceDetector>> {
    tracing::info!(
        cascade_dir = %cfg.cascade_dir.display(),
        "built without opencv; webcam frames use mock readings"
    );
    None
}
