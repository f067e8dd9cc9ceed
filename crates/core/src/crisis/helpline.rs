use crate::config::primary_subtag;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Regional crisis-support contact.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HelplineInfo {
    pub code: String,
    pub name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl HelplineInfo {
    fn new(code: &str, name: &str, phone: &str, url: &str, language: &str) -> Self {
        Self {
            code: code.to_owned(),
            name: name.to_owned(),
            phone: phone.to_owned(),
            url: Some(url.to_owned()),
            language: Some(language.to_owned()),
        }
    }
}

/// Helplines keyed by primary language subtag, with an international fallback.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HelplineDirectory {
    entries: BTreeMap<String, HelplineInfo>,
    default: HelplineInfo,
}

impl HelplineDirectory {
    pub fn new(entries: BTreeMap<String, HelplineInfo>, default: HelplineInfo) -> Self {
        let entries = entries
            .into_iter()
            .map(|(lang, info)| (primary_subtag(&lang), info))
            .collect();
        Self { entries, default }
    }

    /// `"hi-IN"` and `"HI"` both resolve to the `hi` entry; unknown or absent
    /// languages resolve to the default entry.
    pub fn lookup(&self, language: Option<&str>) -> &HelplineInfo {
        language
            .map(primary_subtag)
            .and_then(|lang| self.entries.get(&lang))
            .unwrap_or(&self.default)
    }

    pub fn default_entry(&self) -> &HelplineInfo {
        &self.default
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn normalized(self) -> Self {
        Self::new(self.entries, self.default)
    }
}

impl Default for HelplineDirectory {
    fn default() -> Self {
        let entries = [
            (
                "en",
                HelplineInfo::new(
                    "US",
                    "988 Suicide & Crisis Lifeline (USA)",
                    "988",
                    "https://988lifeline.org",
                    "en",
                ),
            ),
            (
                "hi",
                HelplineInfo::new(
                    "IN",
                    "Kiran Mental Health Helpline (India)",
                    "1800-599-0019",
                    "https://www.mohfw.gov.in/",
                    "hi",
                ),
            ),
            (
                "es",
                HelplineInfo::new(
                    "ES",
                    "Línea 024 Contigo (España)",
                    "024",
                    "https://www.sanidad.gob.es",
                    "es",
                ),
            ),
            (
                "zh",
                HelplineInfo::new(
                    "CN",
                    "Beijing Suicide Research & Prevention Center",
                    "800-810-1117",
                    "http://www.crisis.org.cn/",
                    "zh",
                ),
            ),
            (
                "ar",
                HelplineInfo::new(
                    "AE",
                    "UAE Mental Health Support Line",
                    "800-4673",
                    "https://www.mohap.gov.ae",
                    "ar",
                ),
            ),
        ]
        .into_iter()
        .map(|(lang, info)| (lang.to_owned(), info))
        .collect();

        let default = HelplineInfo::new(
            "INTL",
            "Find a helpline – International directory",
            "",
            "https://findahelpline.com/",
            "en",
        );
        Self { entries, default }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_subtag_resolves_to_language_entry() {
        let dir = HelplineDirectory::default();
        assert_eq!(dir.lookup(Some("hi-IN")).code, "IN");
        assert_eq!(dir.lookup(Some("EN-us")).code, "US");
        assert_eq!(dir.lookup(Some("es")).phone, "024");
    }

    #[test]
    fn unknown_or_missing_language_uses_default() {
        let dir = HelplineDirectory::default();
        assert_eq!(dir.lookup(Some("xx")).code, "INTL");
        assert_eq!(dir.lookup(None).code, "INTL");
        assert_eq!(dir.lookup(Some("")).code, "INTL");
    }

    #[test]
    fn new_normalizes_keys() {
        let mut entries = BTreeMap::new();
        entries.insert(
            "FR-fr".to_owned(),
            HelplineInfo::new("FR", "SOS Amitié", "09 72 39 40 50", "https://www.sos-amitie.com", "fr"),
        );
        let dir = HelplineDirectory::new(entries, HelplineDirectory::default().default_entry().clone());
        assert_eq!(dir.lookup(Some("fr-CA")).code, "FR");
        assert_eq!(dir.len(), 1);
    }
}
