use crate::crisis::{CrisisKeywords, HelplineDirectory};
use crate::mood::MoodLabel;
use crate::sentiment::SentimentLexicon;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Static keyword and helpline data, loaded once and shared read-only.
///
/// Any table missing from a JSON file keeps its built-in default.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct SafetyTables {
    pub lexicon: SentimentLexicon,
    pub crisis_keywords: CrisisKeywords,
    pub helplines: HelplineDirectory,
}

#[derive(thiserror::Error, Debug)]
pub enum TablesError {
    #[error("failed to read tables file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid tables json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("lexicon has no keywords for: {0:?}")]
    MissingCategories(Vec<MoodLabel>),
    #[error("crisis keyword list is empty")]
    NoCrisisKeywords,
    #[error("default helpline must have a name")]
    MissingDefaultHelpline,
}

impl SafetyTables {
    pub fn from_json_str(json: &str) -> Result<Self, TablesError> {
        let raw: SafetyTables = serde_json::from_str(json)?;
        let tables = Self {
            lexicon: raw.lexicon.normalized(),
            crisis_keywords: raw.crisis_keywords.normalized(),
            helplines: raw.helplines.normalized(),
        };
        tables.validate()?;
        Ok(tables)
    }

    pub fn load(path: &Path) -> Result<Self, TablesError> {
        let json = std::fs::read_to_string(path).map_err(|source| TablesError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let tables = Self::from_json_str(&json)?;
        tracing::info!(
            path = %path.display(),
            crisis_keywords = tables.crisis_keywords.len(),
            helplines = tables.helplines.len(),
            "safety tables loaded"
        );
        Ok(tables)
    }

    /// Built-in defaults unless `path` is given.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, TablesError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), TablesError> {
        let missing = self.lexicon.missing_categories();
        if !missing.is_empty() {
            return Err(TablesError::MissingCategories(missing));
        }
        if self.crisis_keywords.is_empty() {
            return Err(TablesError::NoCrisisKeywords);
        }
        if self.helplines.default_entry().name.trim().is_empty() {
            return Err(TablesError::MissingDefaultHelpline);
        }
        Ok(())
    }

    pub fn into_shared(self) -> SharedTables {
        SharedTables {
            lexicon: Arc::new(self.lexicon),
            crisis_keywords: Arc::new(self.crisis_keywords),
            helplines: Arc::new(self.helplines),
        }
    }
}

/// [`SafetyTables`] split into independently shared parts.
#[derive(Clone, Debug)]
pub struct SharedTables {
    pub lexicon: Arc<SentimentLexicon>,
    pub crisis_keywords: Arc<CrisisKeywords>,
    pub helplines: Arc<HelplineDirectory>,
}
