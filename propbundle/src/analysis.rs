//! Consistency checks over bundles and key trees.
//!
//! The finders are fed through the traversal functions of [`crate::visit`]:
//!
//! ```rust
//! use propbundle::{Bundle, BundleEntry, analysis::DuplicateValuesFinder, visit::walk_bundle};
//!
//! let mut bundle = Bundle::new();
//! bundle.add_entry(BundleEntry::new("ok", "OK"));
//! bundle.add_entry(BundleEntry::new("confirm", "OK"));
//!
//! let reference = bundle.entry("ok").unwrap();
//! let mut finder = DuplicateValuesFinder::new(reference);
//! walk_bundle(&bundle, &mut |node| finder.visit(node));
//! assert_eq!(finder.keys(), vec!["confirm"]);
//! ```

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use crate::{
    group::BundleGroup,
    locale::Locale,
    preferences::Preferences,
    proximity::ProximityAnalyzer,
    tree::{KeyTree, KeyTreeItem},
    types::BundleEntry,
    visit::{BundleNode, TreeNode, walk_bundle, walk_item},
};

/// Collects entries whose non-empty value equals the reference entry's.
pub struct DuplicateValuesFinder<'a> {
    reference: &'a BundleEntry,
    duplicates: Vec<&'a BundleEntry>,
}

impl<'a> DuplicateValuesFinder<'a> {
    pub fn new(reference: &'a BundleEntry) -> Self {
        Self {
            reference,
            duplicates: Vec::new(),
        }
    }

    pub fn visit(&mut self, node: BundleNode<'a>) {
        if let BundleNode::Entry(entry) = node
            && entry.key != self.reference.key
            && self.reference.has_value()
            && entry.value == self.reference.value
        {
            self.duplicates.push(entry);
        }
    }

    pub fn duplicates(&self) -> &[&'a BundleEntry] {
        &self.duplicates
    }

    pub fn keys(&self) -> Vec<&'a str> {
        self.duplicates.iter().map(|entry| entry.key.as_str()).collect()
    }
}

/// Collects entries whose value is at least `threshold` close to the
/// reference entry's value, compared in lower case.
pub struct SimilarValuesFinder<'a> {
    reference: &'a BundleEntry,
    reference_value: String,
    analyzer: &'a dyn ProximityAnalyzer,
    threshold: f64,
    similars: Vec<&'a BundleEntry>,
}

impl<'a> SimilarValuesFinder<'a> {
    pub fn new(reference: &'a BundleEntry, analyzer: &'a dyn ProximityAnalyzer, threshold: f64) -> Self {
        Self {
            reference,
            reference_value: reference.value.to_lowercase(),
            analyzer,
            threshold,
            similars: Vec::new(),
        }
    }

    pub fn visit(&mut self, node: BundleNode<'a>) {
        let BundleNode::Entry(entry) = node else {
            return;
        };
        if entry.key == self.reference.key || !entry.has_value() || !self.reference.has_value() {
            return;
        }
        let proximity = self
            .analyzer
            .analyse(&self.reference_value, &entry.value.to_lowercase());
        if proximity >= self.threshold {
            self.similars.push(entry);
        }
    }

    pub fn similars(&self) -> &[&'a BundleEntry] {
        &self.similars
    }

    pub fn keys(&self) -> Vec<&'a str> {
        self.similars.iter().map(|entry| entry.key.as_str()).collect()
    }
}

/// The key is in the key set but some locale has no entry or an empty value.
pub fn is_missing_value(group: &BundleGroup, key: &str) -> bool {
    if !group.is_key(key) {
        return false;
    }
    let entries = group.bundle_entries(key);
    entries.len() < group.locale_count() || entries.iter().any(|entry| !entry.has_value())
}

/// Locales lacking an entry for `key` or holding an empty value.
pub fn missing_locales(group: &BundleGroup, key: &str) -> Vec<Locale> {
    group
        .locales()
        .filter(|locale| {
            group
                .bundle_entry(locale, key)
                .is_none_or(|entry| !entry.has_value())
        })
        .cloned()
        .collect()
}

/// Missing-value state of a tree item and its subtree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MissingValueStatus {
    /// The item's own key misses a value.
    pub missing: bool,
    /// Some descendant misses a value.
    pub descendant_missing: bool,
}

impl MissingValueStatus {
    /// Only descendants miss a value, not the item itself.
    pub fn is_missing_children_value_only(&self) -> bool {
        !self.missing && self.descendant_missing
    }
}

pub fn missing_value_status(tree: &KeyTree, group: &BundleGroup, item: &KeyTreeItem) -> MissingValueStatus {
    let mut status = MissingValueStatus::default();
    walk_item(tree, item, &mut |node| {
        if let TreeNode::Item(visited) = node
            && is_missing_value(group, visited.id())
        {
            if visited.id() == item.id() {
                status.missing = true;
            } else {
                status.descendant_missing = true;
            }
        }
    });
    status
}

/// At least one locale has `key` commented out.
pub fn has_one_commented(group: &BundleGroup, key: &str) -> bool {
    group.bundle_entries(key).iter().any(|entry| entry.commented)
}

/// Every locale that has `key` has it commented out.
pub fn all_commented(group: &BundleGroup, key: &str) -> bool {
    let entries = group.bundle_entries(key);
    !entries.is_empty() && entries.iter().all(|entry| entry.commented)
}

/// Keys of one locale matching a reference key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocaleMatches {
    pub locale: String,
    pub keys: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentedStatus {
    Active,
    PartlyCommented,
    Commented,
}

/// Findings for one key. Only keys with at least one finding are reported.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyReport {
    pub key: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub duplicates: Vec<LocaleMatches>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub similar: Vec<LocaleMatches>,
    pub commented: CommentedStatus,
}

impl KeyReport {
    fn has_findings(&self) -> bool {
        !self.missing.is_empty()
            || !self.duplicates.is_empty()
            || !self.similar.is_empty()
            || self.commented != CommentedStatus::Active
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisSummary {
    pub keys: usize,
    pub missing: usize,
    pub duplicates: usize,
    pub similar: usize,
    pub commented: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub locales: Vec<String>,
    pub summary: AnalysisSummary,
    pub keys: Vec<KeyReport>,
}

impl AnalysisReport {
    /// Whether an enabled check found a problem. Commented keys are reported
    /// but do not count as problems.
    pub fn has_problems(&self) -> bool {
        self.summary.missing + self.summary.duplicates + self.summary.similar > 0
    }
}

/// Runs the checks enabled in `preferences` over every key of `group`.
pub fn analyze(group: &BundleGroup, preferences: &Preferences) -> AnalysisReport {
    let analyzer = preferences.similar_algorithm.analyzer();
    let mut report = AnalysisReport {
        locales: group.locales().map(Locale::display_name).collect(),
        ..AnalysisReport::default()
    };

    for key in group.keys() {
        let mut key_report = KeyReport {
            key: key.to_string(),
            missing: Vec::new(),
            duplicates: Vec::new(),
            similar: Vec::new(),
            commented: if all_commented(group, key) {
                CommentedStatus::Commented
            } else if has_one_commented(group, key) {
                CommentedStatus::PartlyCommented
            } else {
                CommentedStatus::Active
            },
        };

        if preferences.report_missing_values {
            key_report.missing = missing_locales(group, key)
                .iter()
                .map(Locale::display_name)
                .collect();
        }

        for bundle in group.bundles() {
            let Some(reference) = bundle.entry(key) else {
                continue;
            };
            let locale = bundle.locale().map(Locale::display_name).unwrap_or_default();

            if preferences.report_duplicate_values {
                let mut finder = DuplicateValuesFinder::new(reference);
                walk_bundle(bundle, &mut |node| finder.visit(node));
                push_matches(&mut key_report.duplicates, &locale, finder.keys());
            }
            if preferences.report_similar_values {
                let mut finder =
                    SimilarValuesFinder::new(reference, analyzer.as_ref(), preferences.similar_precision);
                walk_bundle(bundle, &mut |node| finder.visit(node));
                let duplicates: BTreeSet<&str> = key_report
                    .duplicates
                    .iter()
                    .filter(|matches| matches.locale == locale)
                    .flat_map(|matches| matches.keys.iter().map(String::as_str))
                    .collect();
                let similar: Vec<&str> = finder
                    .keys()
                    .into_iter()
                    .filter(|key| !duplicates.contains(key))
                    .collect();
                push_matches(&mut key_report.similar, &locale, similar);
            }
        }

        report.summary.keys += 1;
        report.summary.missing += usize::from(!key_report.missing.is_empty());
        report.summary.duplicates += usize::from(!key_report.duplicates.is_empty());
        report.summary.similar += usize::from(!key_report.similar.is_empty());
        report.summary.commented += usize::from(key_report.commented != CommentedStatus::Active);
        if key_report.has_findings() {
            report.keys.push(key_report);
        }
    }

    debug!(
        keys = report.summary.keys,
        missing = report.summary.missing,
        duplicates = report.summary.duplicates,
        similar = report.summary.similar,
        "analysis finished"
    );
    report
}

fn push_matches(target: &mut Vec<LocaleMatches>, locale: &str, keys: Vec<&str>) {
    if keys.is_empty() {
        return;
    }
    target.push(LocaleMatches {
        locale: locale.to_string(),
        keys: keys.into_iter().map(str::to_string).collect(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        bundle::Bundle,
        proximity::{LevenshteinAnalyzer, SimilarityAlgorithm, WordCountAnalyzer},
        tree::KeyTreeUpdater,
    };

    fn en() -> Locale {
        Locale::language("en")
    }

    fn fr() -> Locale {
        Locale::language("fr")
    }

    fn bundle_with(entries: &[(&str, &str)]) -> Bundle {
        let mut bundle = Bundle::new();
        for (key, value) in entries {
            bundle.add_entry(BundleEntry::new(*key, *value));
        }
        bundle
    }

    #[test]
    fn test_duplicates_in_same_bundle() {
        let bundle = bundle_with(&[("ok", "OK"), ("confirm", "OK"), ("cancel", "Cancel"), ("e1", ""), ("e2", "")]);
        let reference = bundle.entry("ok").unwrap();
        let mut finder = DuplicateValuesFinder::new(reference);
        walk_bundle(&bundle, &mut |node| finder.visit(node));
        assert_eq!(finder.keys(), vec!["confirm"]);

        let empty = bundle.entry("e1").unwrap();
        let mut finder = DuplicateValuesFinder::new(empty);
        walk_bundle(&bundle, &mut |node| finder.visit(node));
        assert!(finder.duplicates().is_empty());
    }

    #[test]
    fn test_similar_values_threshold() {
        let bundle = bundle_with(&[("a", "The quick fox"), ("b", "the quick dog")]);
        let reference = bundle.entry("a").unwrap();

        let mut finder = SimilarValuesFinder::new(reference, &WordCountAnalyzer, 0.6);
        walk_bundle(&bundle, &mut |node| finder.visit(node));
        assert_eq!(finder.keys(), vec!["b"]);

        let mut finder = SimilarValuesFinder::new(reference, &WordCountAnalyzer, 0.7);
        walk_bundle(&bundle, &mut |node| finder.visit(node));
        assert!(finder.similars().is_empty());

        let mut finder = SimilarValuesFinder::new(reference, &LevenshteinAnalyzer, 0.7);
        walk_bundle(&bundle, &mut |node| finder.visit(node));
        assert_eq!(finder.keys(), vec!["b"]);
    }

    #[test]
    fn test_missing_value() {
        let mut group = BundleGroup::new();
        group.add_bundle(en(), bundle_with(&[("only.en", "x"), ("both", "y"), ("empty", "z")]));
        group.add_bundle(fr(), bundle_with(&[("both", "y"), ("empty", "")]));

        assert!(is_missing_value(&group, "only.en"));
        assert!(is_missing_value(&group, "empty"));
        assert!(!is_missing_value(&group, "both"));
        assert!(!is_missing_value(&group, "unknown"));
        assert_eq!(missing_locales(&group, "only.en"), vec![fr()]);
    }

    #[test]
    fn test_missing_children_only() {
        let mut group = BundleGroup::new();
        group.add_bundle(en(), bundle_with(&[("menu.open", "Open"), ("menu.save", "Save")]));
        group.add_bundle(fr(), bundle_with(&[("menu.open", "Ouvrir")]));
        let tree = KeyTree::new(&group, KeyTreeUpdater::grouped("."));

        let menu = tree.item("menu").unwrap();
        let status = missing_value_status(&tree, &group, menu);
        assert!(status.is_missing_children_value_only());

        let save = tree.item("menu.save").unwrap();
        let status = missing_value_status(&tree, &group, save);
        assert!(status.missing);
        assert!(!status.is_missing_children_value_only());
    }

    #[test]
    fn test_commented_status() {
        let mut group = BundleGroup::new();
        group.add_bundle(en(), bundle_with(&[("k", "v"), ("all", "a")]));
        group.add_bundle(fr(), bundle_with(&[("k", "v"), ("all", "a")]));
        group.comment_key("all");
        let mut entry = BundleEntry::new("k", "v");
        entry.commented = true;
        group.add_bundle_entry(&fr(), entry);

        assert!(has_one_commented(&group, "k"));
        assert!(!all_commented(&group, "k"));
        assert!(all_commented(&group, "all"));
        assert!(!all_commented(&group, "missing"));
    }

    #[test]
    fn test_analyze_report() {
        let mut group = BundleGroup::new();
        group.add_bundle(
            en(),
            bundle_with(&[("ok", "OK"), ("yes", "OK"), ("title", "The main title"), ("subtitle", "The main subtitle")]),
        );
        group.add_bundle(fr(), bundle_with(&[("ok", "D'accord"), ("title", "Titre")]));

        let preferences = Preferences {
            report_similar_values: true,
            similar_algorithm: SimilarityAlgorithm::WordCount,
            similar_precision: 0.6,
            ..Preferences::default()
        };
        let report = analyze(&group, &preferences);

        assert_eq!(report.locales, vec!["en", "fr"]);
        assert_eq!(report.summary.keys, 4);
        assert!(report.has_problems());

        let yes = report.keys.iter().find(|k| k.key == "yes").unwrap();
        assert_eq!(yes.missing, vec!["fr"]);
        assert_eq!(
            yes.duplicates,
            vec![LocaleMatches {
                locale: "en".to_string(),
                keys: vec!["ok".to_string()]
            }]
        );

        let title = report.keys.iter().find(|k| k.key == "title").unwrap();
        assert_eq!(title.similar[0].keys, vec!["subtitle"]);
        assert!(title.missing.is_empty());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["summary"]["keys"], 4);
    }

    #[test]
    fn test_analyze_respects_disabled_checks() {
        let mut group = BundleGroup::new();
        group.add_bundle(en(), bundle_with(&[("a", "same"), ("b", "same")]));
        group.add_bundle(fr(), bundle_with(&[("a", "x")]));
        let preferences = Preferences {
            report_missing_values: false,
            report_duplicate_values: false,
            report_similar_values: false,
            ..Preferences::default()
        };
        let report = analyze(&group, &preferences);
        assert!(report.keys.is_empty());
        assert!(!report.has_problems());
    }
}
