//! Bilingual text
//!
//! All user-facing content is authored in English and Spanish. Spanish falls
//! back to English when the translation is blank.

use serde::{Deserialize, Serialize};

/// Supported content locale
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locale {
    #[default]
    En,
    Es,
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::En => write!(f, "en"),
            Self::Es => write!(f, "es"),
        }
    }
}

impl std::str::FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en" => Ok(Self::En),
            "es" => Ok(Self::Es),
            other => Err(format!("unknown locale: {}", other)),
        }
    }
}

/// Text authored in both supported languages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    #[serde(default)]
    pub en: String,
    #[serde(default)]
    pub es: String,
}

impl LocalizedText {
    pub fn new(en: impl Into<String>, es: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            es: es.into(),
        }
    }

    /// Text for `locale`, falling back to English when blank
    pub fn resolve(&self, locale: Locale) -> &str {
        match locale {
            Locale::Es if !self.es.trim().is_empty() => &self.es,
            _ => &self.en,
        }
    }

    /// True when neither language has content
    pub fn is_blank(&self) -> bool {
        self.en.trim().is_empty() && self.es.trim().is_empty()
    }
}
