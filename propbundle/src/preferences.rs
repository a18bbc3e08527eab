//! User preferences for reading, writing, and presenting bundles.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    error::Error,
    formats::FormatOptions,
    proximity::SimilarityAlgorithm,
    tree::{KeyComparator, KeyTreeUpdater},
    types::KeyOrder,
};

/// Every user-tunable knob, with defaults. Loadable from TOML; missing fields
/// keep their default.
///
/// ```toml
/// key_group_separator = "."
/// report_similar_values = true
/// similar_algorithm = "levenshtein"
/// similar_precision = 0.8
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Preferences {
    /// Separator splitting keys into tree groups.
    pub key_group_separator: String,
    /// Decode `\uXXXX` escapes when reading and produce them when writing.
    pub convert_encoded_to_unicode: bool,
    /// Show keys as a hierarchy rather than a flat list.
    pub tree_hierarchical: bool,
    /// Expand the whole tree when it is first shown.
    pub tree_expanded: bool,
    pub report_missing_values: bool,
    pub report_duplicate_values: bool,
    pub report_similar_values: bool,
    pub similar_algorithm: SimilarityAlgorithm,
    /// Minimum proximity for two values to count as similar.
    pub similar_precision: f64,
    pub align_equals: bool,
    pub spaces_around_equals: bool,
    pub group_keys: bool,
    pub group_level_depth: usize,
    pub group_line_breaks: usize,
    pub group_align_equals: bool,
    pub wrap_lines: bool,
    pub wrap_column: usize,
    pub wrap_indent: usize,
    pub new_line_nice: bool,
    pub show_generator: bool,
    pub uppercase_hex: bool,
    /// Write keys in file order instead of sorting them.
    pub keep_original_key_order: bool,
    pub alphanumeric_sort: bool,
    pub case_insensitive_sort: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            key_group_separator: ".".to_string(),
            convert_encoded_to_unicode: true,
            tree_hierarchical: true,
            tree_expanded: true,
            report_missing_values: true,
            report_duplicate_values: true,
            report_similar_values: false,
            similar_algorithm: SimilarityAlgorithm::WordCount,
            similar_precision: 0.75,
            align_equals: true,
            spaces_around_equals: true,
            group_keys: true,
            group_level_depth: 1,
            group_line_breaks: 1,
            group_align_equals: true,
            wrap_lines: false,
            wrap_column: 80,
            wrap_indent: 8,
            new_line_nice: false,
            show_generator: true,
            uppercase_hex: false,
            keep_original_key_order: false,
            alphanumeric_sort: false,
            case_insensitive_sort: false,
        }
    }
}

impl Preferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(text: &str) -> Result<Self, Error> {
        let preferences: Self = toml::from_str(text)?;
        preferences.validate()?;
        Ok(preferences)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, Error> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if !(0.0..=1.0).contains(&self.similar_precision) {
            return Err(Error::InvalidConfig(format!(
                "similar_precision must be between 0 and 1, got {}",
                self.similar_precision
            )));
        }
        if self.wrap_lines && self.wrap_column == 0 {
            return Err(Error::InvalidConfig("wrap_column must be positive".to_string()));
        }
        if self.group_keys && self.group_level_depth == 0 {
            return Err(Error::InvalidConfig(
                "group_level_depth must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn format_options(&self) -> FormatOptions {
        FormatOptions {
            convert_unicode: self.convert_encoded_to_unicode,
            uppercase_hex: self.uppercase_hex,
            show_generator: self.show_generator,
            spaces_around_equals: self.spaces_around_equals,
            align_equals: self.align_equals,
            group_keys: self.group_keys,
            group_level_depth: self.group_level_depth,
            group_line_breaks: self.group_line_breaks,
            group_align_equals: self.group_align_equals,
            key_group_separator: self.key_group_separator.clone(),
            wrap_lines: self.wrap_lines,
            wrap_column: self.wrap_column,
            wrap_indent: self.wrap_indent,
            new_line_nice: self.new_line_nice,
        }
    }

    /// Tree policy: grouped on the key separator or flat.
    pub fn tree_updater(&self) -> KeyTreeUpdater {
        if self.tree_hierarchical {
            KeyTreeUpdater::grouped(self.key_group_separator.clone())
        } else {
            KeyTreeUpdater::Flat
        }
    }

    pub fn key_comparator(&self) -> KeyComparator {
        KeyComparator {
            alphanumeric: self.alphanumeric_sort,
            case_insensitive: self.case_insensitive_sort,
        }
    }

    pub fn key_order(&self) -> KeyOrder {
        if self.keep_original_key_order {
            KeyOrder::Insertion
        } else {
            KeyOrder::Sorted
        }
    }
}
