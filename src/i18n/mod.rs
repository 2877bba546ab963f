//! Localized strings from the catalogs embedded under `translations/`, and
//! Accept-Language negotiation.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::panicker::Panicker;

/// Catalogs compiled into the binary, keyed by file name.
const TRANSLATION_FILES: &[(&str, &str)] = &[
    ("en.toml", include_str!("translations/en.toml")),
    ("es.toml", include_str!("translations/es.toml")),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageChoice {
    pub abbreviation: &'static str,
    pub display_name: &'static str,
    pub tag: &'static str,
    catalog: &'static str,
}

pub const ENGLISH: LanguageChoice = LanguageChoice {
    abbreviation: "en-US",
    display_name: "English",
    tag: "en-US",
    catalog: "en.toml",
};

pub const SPANISH: LanguageChoice = LanguageChoice {
    abbreviation: "es-419",
    display_name: "Español",
    tag: "es-419",
    catalog: "es.toml",
};

pub const DEFAULT_LANGUAGE: LanguageChoice = ENGLISH;

pub const SUPPORTED_LANGUAGES: &[LanguageChoice] = &[ENGLISH, SPANISH];

/// Tags we answer to, and the language each one selects.
const RECOGNIZED_TAGS: &[(&str, LanguageChoice)] = &[
    ("en-us", ENGLISH),
    ("en-gb", ENGLISH),
    ("en", ENGLISH),
    ("es-419", SPANISH),
    ("es-es", SPANISH),
    ("es", SPANISH),
];

#[derive(Debug, Error)]
pub enum LocalizationError {
    #[error("parsing translation catalog {file}: {source}")]
    Catalog {
        file: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("translation catalog {0} has a non-string value for {1}")]
    NonStringValue(String, String),
}

/// Picks a language from an Accept-Language header value.
///
/// Exactly one recognized tag selects its language. A missing, malformed or
/// unrecognized header, or one listing several tags, selects the default.
pub fn resolve_language(header: Option<&str>) -> LanguageChoice {
    let Some(header) = header else {
        return DEFAULT_LANGUAGE;
    };

    let tags: Vec<&str> = header
        .split(',')
        .map(|part| part.split(';').next().unwrap_or("").trim())
        .collect();

    match tags.as_slice() {
        [single] if !single.is_empty() => RECOGNIZED_TAGS
            .iter()
            .find(|(tag, _)| tag.eq_ignore_ascii_case(single))
            .map(|(_, language)| *language)
            .unwrap_or(DEFAULT_LANGUAGE),
        _ => DEFAULT_LANGUAGE,
    }
}

#[derive(Debug)]
pub struct Localizer {
    catalogs: HashMap<String, HashMap<String, String>>,
    panicker: Arc<dyn Panicker>,
}

impl Localizer {
    /// Parses every embedded catalog. Failure here is a startup error.
    pub fn new(panicker: Arc<dyn Panicker>) -> Result<Self, LocalizationError> {
        let mut catalogs = HashMap::new();
        for (file, raw) in TRANSLATION_FILES {
            catalogs.insert(file.to_string(), parse_catalog(file, raw)?);
        }

        tracing::debug!(catalogs = catalogs.len(), "loaded translation catalogs");
        Ok(Self { catalogs, panicker })
    }

    pub fn has_catalog(&self, file: &str) -> bool {
        self.catalogs.contains_key(file)
    }

    /// Looks up `message_id` for `language`, falling back to the default
    /// language. A message missing from both is a programmer error.
    pub fn translate(&self, language: LanguageChoice, message_id: &str) -> String {
        let lookup = |catalog: &str| {
            self.catalogs
                .get(catalog)
                .and_then(|messages| messages.get(message_id))
                .cloned()
        };

        if let Some(message) = lookup(language.catalog).or_else(|| lookup(DEFAULT_LANGUAGE.catalog)) {
            return message;
        }

        self.panicker
            .panic(format!("missing translation for message id {:?}", message_id));
        message_id.to_string()
    }
}

fn parse_catalog(file: &str, raw: &str) -> Result<HashMap<String, String>, LocalizationError> {
    let table: toml::Table = raw.parse().map_err(|source| LocalizationError::Catalog {
        file: file.to_string(),
        source,
    })?;

    table
        .into_iter()
        .map(|(key, value)| match value {
            toml::Value::String(s) => Ok((key, s)),
            _ => Err(LocalizationError::NonStringValue(file.to_string(), key)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingPanicker;

    #[test]
    fn resolves_single_recognized_tags() {
        assert_eq!(resolve_language(Some("en-US")), ENGLISH);
        assert_eq!(resolve_language(Some("en-GB")), ENGLISH);
        assert_eq!(resolve_language(Some("en")), ENGLISH);
        assert_eq!(resolve_language(Some("es-419")), SPANISH);
        assert_eq!(resolve_language(Some("es-ES")), SPANISH);
        assert_eq!(resolve_language(Some("es;q=0.9")), SPANISH);
    }

    #[test]
    fn everything_else_selects_the_default() {
        assert_eq!(resolve_language(None), DEFAULT_LANGUAGE);
        assert_eq!(resolve_language(Some("")), DEFAULT_LANGUAGE);
        assert_eq!(resolve_language(Some(",,,")), DEFAULT_LANGUAGE);
        assert_eq!(resolve_language(Some("fr-FR")), DEFAULT_LANGUAGE);
        assert_eq!(resolve_language(Some("es-419, en-US;q=0.8")), DEFAULT_LANGUAGE);
    }

    #[test]
    fn catalogs_are_registered_by_file_name() {
        let localizer = Localizer::new(Arc::new(RecordingPanicker::default())).unwrap();
        assert!(localizer.has_catalog("en.toml"));
        assert!(localizer.has_catalog("es.toml"));
    }

    #[test]
    fn translates_per_language() {
        let localizer = Localizer::new(Arc::new(RecordingPanicker::default())).unwrap();
        assert_eq!(localizer.translate(ENGLISH, "nav-home"), "Home");
        assert_eq!(localizer.translate(SPANISH, "nav-home"), "Inicio");
    }

    #[test]
    fn every_english_message_exists_in_spanish() {
        let en = parse_catalog("en.toml", TRANSLATION_FILES[0].1).unwrap();
        let es = parse_catalog("es.toml", TRANSLATION_FILES[1].1).unwrap();
        for key in en.keys() {
            assert!(es.contains_key(key), "es.toml is missing {}", key);
        }
    }

    #[test]
    fn missing_message_is_a_loud_failure() {
        let panicker = Arc::new(RecordingPanicker::default());
        let localizer = Localizer::new(panicker.clone()).unwrap();

        localizer.translate(ENGLISH, "definitely-not-a-key");
        assert_eq!(panicker.calls().len(), 1);
        assert!(panicker.calls()[0].contains("definitely-not-a-key"));
    }
}
