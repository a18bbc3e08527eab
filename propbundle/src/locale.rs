//! Locale identifiers as they appear in bundle file names.
//!
//! A bundle family is stored as `basename[_language[_COUNTRY[_VARIANT]]].extension`.
//! The file without any suffix holds the root (default) bundle.

use std::{fmt::Display, str::FromStr};

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use unic_langid::LanguageIdentifier;

use crate::error::Error;

lazy_static! {
    static ref LOCALE_SUFFIX_REGEX: Regex = Regex::new(
        r"^(?P<lang>[a-z]{2,8})(?:_(?P<country>[A-Z]{2}|[0-9]{3})?(?:_(?P<variant>[A-Za-z0-9_]+))?)?$"
    )
    .unwrap();
}

/// A `language_COUNTRY_VARIANT` triple. All parts empty means the root locale.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Locale {
    pub language: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub country: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub variant: String,
}

impl Locale {
    /// The default bundle, stored in the file without a locale suffix.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn new(
        language: impl Into<String>,
        country: impl Into<String>,
        variant: impl Into<String>,
    ) -> Self {
        Self {
            language: language.into(),
            country: country.into(),
            variant: variant.into(),
        }
    }

    pub fn language(language: impl Into<String>) -> Self {
        Self::new(language, "", "")
    }

    pub fn is_root(&self) -> bool {
        self.language.is_empty() && self.country.is_empty() && self.variant.is_empty()
    }

    /// Human readable label; the root locale is shown as `default`.
    pub fn display_name(&self) -> String {
        if self.is_root() {
            "default".to_string()
        } else {
            self.to_string()
        }
    }

    /// BCP 47 view of this locale. Variants that are not valid BCP 47 subtags are dropped.
    pub fn to_language_identifier(&self) -> Option<LanguageIdentifier> {
        if self.is_root() {
            return None;
        }
        let mut tag = self.language.clone();
        if !self.country.is_empty() {
            tag.push('-');
            tag.push_str(&self.country);
        }
        let base: LanguageIdentifier = tag.parse().ok()?;
        if self.variant.is_empty() {
            return Some(base);
        }
        format!("{}-{}", tag, self.variant.replace('_', "-"))
            .parse()
            .ok()
            .or(Some(base))
    }

    /// Parses the part of a file name between the base name and the extension,
    /// without the leading underscore (e.g. `en_US`).
    fn from_suffix(suffix: &str) -> Option<Self> {
        let captures = LOCALE_SUFFIX_REGEX.captures(suffix)?;
        let part = |name: &str| {
            captures
                .name(name)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default()
        };
        Some(Self::new(part("lang"), part("country"), part("variant")))
    }
}

impl Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_root() {
            return Ok(());
        }
        write!(f, "{}", self.language)?;
        if !self.country.is_empty() || !self.variant.is_empty() {
            write!(f, "_{}", self.country)?;
        }
        if !self.variant.is_empty() {
            write!(f, "_{}", self.variant)?;
        }
        Ok(())
    }
}

impl FromStr for Locale {
    type Err = Error;

    /// Accepts `en`, `en_US`, `en-US`, `en_US_WIN`, `en__POSIX`, and an empty
    /// string or `default` for the root locale.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("default") {
            return Ok(Locale::root());
        }
        let normalized = trimmed.replace('-', "_");
        let mut parts = normalized.splitn(2, '_');
        let language = parts.next().unwrap_or_default().to_ascii_lowercase();
        let rest = parts.next().map(|rest| {
            let mut rest_parts = rest.splitn(2, '_');
            let country = rest_parts.next().unwrap_or_default().to_ascii_uppercase();
            let variant = rest_parts.next().unwrap_or_default();
            (country, variant.to_string())
        });
        let candidate = match rest {
            Some((country, variant)) if variant.is_empty() => format!("{language}_{country}"),
            Some((country, variant)) => format!("{language}_{country}_{variant}"),
            None => language,
        };
        Locale::from_suffix(&candidate).ok_or_else(|| Error::InvalidLocale(s.to_string()))
    }
}

/// File name of the bundle for `locale`, e.g. `messages_fr_CA.properties`.
pub fn bundle_file_name(base: &str, locale: &Locale, extension: &str) -> String {
    if locale.is_root() {
        format!("{base}.{extension}")
    } else {
        format!("{base}_{locale}.{extension}")
    }
}

/// Locale encoded in `file_name`, if it belongs to the `base`/`extension` family.
pub fn locale_from_file_name(file_name: &str, base: &str, extension: &str) -> Option<Locale> {
    let stem = file_name
        .strip_suffix(extension)?
        .strip_suffix('.')?
        .strip_prefix(base)?;
    if stem.is_empty() {
        return Some(Locale::root());
    }
    Locale::from_suffix(stem.strip_prefix('_')?)
}
