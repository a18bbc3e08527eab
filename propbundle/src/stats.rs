//! Per-locale counts over a bundle group.

use serde::Serialize;

use crate::{
    group::BundleGroup,
    locale::Locale,
    visit::{BundleNode, walk_group},
};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LocaleStats {
    pub locale: String,
    pub entries: usize,
    pub empty: usize,
    pub commented: usize,
    /// Keys of the group with no value in this locale, absent ones included.
    pub missing: usize,
    pub completion_percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BundleStats {
    pub locales: usize,
    pub keys: usize,
    pub per_locale: Vec<LocaleStats>,
}

impl BundleStats {
    pub fn compute(group: &BundleGroup) -> Self {
        let keys = group.key_count();
        let mut per_locale = Vec::new();
        let mut current = LocaleStats::default();

        walk_group(group, &mut |node| match node {
            BundleNode::Entry(entry) => {
                current.entries += 1;
                current.empty += usize::from(!entry.has_value());
                current.commented += usize::from(entry.commented);
            }
            BundleNode::Bundle(bundle) => {
                let mut stats = std::mem::take(&mut current);
                stats.locale = bundle.locale().map(Locale::display_name).unwrap_or_default();
                let valued = stats.entries - stats.empty;
                stats.missing = keys.saturating_sub(valued);
                stats.completion_percent = completion(valued, keys);
                per_locale.push(stats);
            }
            BundleNode::Group(_) => {}
        });

        Self {
            locales: group.locale_count(),
            keys,
            per_locale,
        }
    }
}

fn completion(valued: usize, keys: usize) -> f64 {
    if keys == 0 {
        return 100.0;
    }
    let percent = valued as f64 * 100.0 / keys as f64;
    (percent * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{bundle::Bundle, types::BundleEntry};

    fn bundle(entries: &[(&str, &str)]) -> Bundle {
        let mut bundle = Bundle::new();
        for (key, value) in entries {
            bundle.add_entry(BundleEntry::new(*key, *value));
        }
        bundle
    }

    #[test]
    fn test_counts_per_locale() {
        let mut group = BundleGroup::new();
        group.add_bundle(Locale::root(), bundle(&[("a", "A"), ("b", "B"), ("c", "C")]));
        let mut fr = bundle(&[("a", "Â"), ("b", "")]);
        fr.add_entry(BundleEntry::new("c", "Ç").with_commented(true));
        group.add_bundle(Locale::language("fr"), fr);

        let stats = BundleStats::compute(&group);
        assert_eq!(stats.locales, 2);
        assert_eq!(stats.keys, 3);

        let root = &stats.per_locale[0];
        assert_eq!(root.locale, "default");
        assert_eq!((root.entries, root.empty, root.missing), (3, 0, 0));
        assert_eq!(root.completion_percent, 100.0);

        let fr = &stats.per_locale[1];
        assert_eq!(fr.locale, "fr");
        assert_eq!((fr.entries, fr.empty, fr.commented, fr.missing), (3, 1, 1, 1));
        assert_eq!(fr.completion_percent, 66.67);
    }

    #[test]
    fn test_empty_group() {
        let stats = BundleStats::compute(&BundleGroup::new());
        assert_eq!(stats, BundleStats::default());
    }
}
