//! Optional template translation

use sendcheck_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

use crate::collaborator::Translate;

/// Languages a template may be sent in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English (source language, never translated)
    #[default]
    En,
    /// Hindi
    Hi,
    /// Spanish
    Es,
    /// French
    Fr,
    /// German
    De,
    /// Italian
    It,
    /// Portuguese
    Pt,
}

impl Language {
    /// Every supported language
    pub const ALL: [Language; 7] = [
        Self::En,
        Self::Hi,
        Self::Es,
        Self::Fr,
        Self::De,
        Self::It,
        Self::Pt,
    ];

    /// ISO 639-1 code
    pub fn code(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Hi => "hi",
            Self::Es => "es",
            Self::Fr => "fr",
            Self::De => "de",
            Self::It => "it",
            Self::Pt => "pt",
        }
    }

    /// Whether sending in this language needs a translation step
    pub fn needs_translation(&self) -> bool {
        *self != Self::En
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let code = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|lang| lang.code() == code)
            .ok_or_else(|| {
                let supported: Vec<_> = Self::ALL.iter().map(|l| l.code()).collect();
                Error::config(format!(
                    "unsupported language '{}', expected one of: {}",
                    s,
                    supported.join(", ")
                ))
            })
    }
}

/// Template body after the optional translation step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedTemplate {
    /// Body handed to the campaign runner
    pub body: String,

    /// Requested language
    pub language: Language,

    /// Whether `body` actually holds a translation
    pub translated: bool,
}

/// Translate `text`, falling back to the original when translation fails
///
/// English requests and a missing translator return the text unchanged.
pub async fn translate_or_passthrough(
    translator: Option<&dyn Translate>,
    text: &str,
    language: Language,
) -> PreparedTemplate {
    let untranslated = || PreparedTemplate {
        body: text.to_string(),
        language,
        translated: false,
    };

    if !language.needs_translation() {
        return untranslated();
    }

    let Some(translator) = translator else {
        warn!(language = %language, "No translator configured, sending untranslated");
        return untranslated();
    };

    match translator.translate(text, language.code()).await {
        Ok(body) => {
            info!(language = %language, translator = %translator.name(), "Template translated");
            PreparedTemplate {
                body,
                language,
                translated: true,
            }
        }
        Err(e) => {
            warn!(language = %language, error = %e, "Translation failed, sending untranslated");
            untranslated()
        }
    }
}
