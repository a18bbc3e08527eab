//! Core value types shared by the codec, bundles, and analyses.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::locale::Locale;

/// One translation unit: the value of one key in one locale.
///
/// Structural operations never edit an entry in place; they build a new one
/// and hand it to the owning bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleEntry {
    /// Trimmed key. Entries with an empty key are never stored in a bundle.
    pub key: String,

    /// Unescaped value; may be empty.
    pub value: String,

    /// Comment lines preceding the entry, including their `#` or `!` marker,
    /// joined with `\n`.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub comment: Option<String>,

    /// The entry is written with a `##` prefix and is inactive.
    #[serde(default)]
    pub commented: bool,

    /// Blank or unsupported lines that followed the entry in its source text.
    #[serde(default)]
    pub trailing_blank_lines: usize,

    #[serde(skip)]
    locale: Option<Locale>,
}

impl BundleEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into().trim().to_string(),
            value: value.into(),
            comment: None,
            commented: false,
            trailing_blank_lines: 0,
            locale: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        let comment = comment.into();
        self.comment = if comment.is_empty() {
            None
        } else {
            Some(comment)
        };
        self
    }

    pub fn with_commented(mut self, commented: bool) -> Self {
        self.commented = commented;
        self
    }

    pub fn with_trailing_blank_lines(mut self, count: usize) -> Self {
        self.trailing_blank_lines = count;
        self
    }

    /// Locale of the bundle owning this entry, if it is owned by one.
    pub fn locale(&self) -> Option<&Locale> {
        self.locale.as_ref()
    }

    pub(crate) fn set_locale(&mut self, locale: Option<Locale>) {
        self.locale = locale;
    }

    /// Same value, comment, and flag under another key.
    pub fn rekeyed(&self, key: &str) -> Self {
        Self {
            key: key.trim().to_string(),
            value: self.value.clone(),
            comment: self.comment.clone(),
            commented: self.commented,
            trailing_blank_lines: 0,
            locale: None,
        }
    }

    /// Copy of this entry with the commented flag set to `commented`.
    pub fn recommented(&self, commented: bool) -> Self {
        Self {
            commented,
            locale: None,
            ..self.clone()
        }
    }

    pub fn has_value(&self) -> bool {
        !self.value.is_empty()
    }
}

impl PartialEq for BundleEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
            && self.value == other.value
            && self.comment == other.comment
            && self.commented == other.commented
    }
}

impl Eq for BundleEntry {}

impl Display for BundleEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BundleEntry {{ key: {}, value: {}, commented: {} }}",
            self.key, self.value, self.commented
        )
    }
}

/// Presentation order of a bundle's keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyOrder {
    /// Natural string order.
    #[default]
    Sorted,
    /// Order in which keys were first added (file order for parsed bundles).
    Insertion,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_key() {
        let entry = BundleEntry::new("  app.title \t", "Title");
        assert_eq!(entry.key, "app.title");
        assert_eq!(entry.value, "Title");
        assert!(entry.locale().is_none());
    }

    #[test]
    fn test_equality_ignores_layout_and_owner() {
        let mut a = BundleEntry::new("k", "v").with_comment("# note");
        let b = BundleEntry::new("k", "v")
            .with_comment("# note")
            .with_trailing_blank_lines(3);
        a.set_locale(Some(Locale::language("fr")));
        assert_eq!(a, b);

        assert_ne!(a, b.recommented(true));
        assert_ne!(a, BundleEntry::new("k", "v"));
    }

    #[test]
    fn test_empty_comment_is_none() {
        let entry = BundleEntry::new("k", "v").with_comment("");
        assert!(entry.comment.is_none());
    }

    #[test]
    fn test_rekeyed_keeps_content() {
        let entry = BundleEntry::new("old", "value")
            .with_comment("# c")
            .with_commented(true)
            .with_trailing_blank_lines(2);
        let renamed = entry.rekeyed("new");
        assert_eq!(renamed.key, "new");
        assert_eq!(renamed.value, "value");
        assert_eq!(renamed.comment.as_deref(), Some("# c"));
        assert!(renamed.commented);
        assert_eq!(renamed.trailing_blank_lines, 0);
    }

    #[test]
    fn test_display() {
        let entry = BundleEntry::new("hello", "Hello");
        let display = entry.to_string();
        assert!(display.contains("hello"));
        assert!(display.contains("Hello"));
    }
}
