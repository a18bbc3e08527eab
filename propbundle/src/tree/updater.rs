use std::collections::{BTreeMap, BTreeSet};

use crate::group::BundleGroup;

use super::item::{ItemParent, KeyTreeItem};

/// Item cache and root set of a key tree.
#[derive(Debug, Default, Clone)]
pub(crate) struct KeyItems {
    pub(crate) cache: BTreeMap<String, KeyTreeItem>,
    pub(crate) roots: BTreeSet<String>,
}

impl KeyItems {
    pub(crate) fn clear(&mut self) {
        self.cache.clear();
        self.roots.clear();
    }

    fn attach(&mut self, item: KeyTreeItem) {
        match item.parent() {
            ItemParent::Root => {
                self.roots.insert(item.id().to_string());
            }
            ItemParent::Item(parent) => {
                if let Some(parent) = self.cache.get_mut(parent) {
                    parent.add_child(item.id());
                }
            }
        }
        self.cache.insert(item.id().to_string(), item);
    }
}

/// Policy placing keys into a key tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyTreeUpdater {
    /// One root item per key.
    Flat,
    /// Keys are split on `separator`; every prefix becomes a group item.
    Grouped { separator: String },
    /// Only keys lacking a value in some locale, placed by the inner policy.
    Incomplete(Box<KeyTreeUpdater>),
}

impl KeyTreeUpdater {
    pub fn grouped(separator: impl Into<String>) -> Self {
        KeyTreeUpdater::Grouped {
            separator: separator.into(),
        }
    }

    pub fn incomplete(delegate: KeyTreeUpdater) -> Self {
        KeyTreeUpdater::Incomplete(Box::new(delegate))
    }

    /// Whether keys are split into group items.
    pub fn is_grouped(&self) -> bool {
        match self {
            KeyTreeUpdater::Flat => false,
            KeyTreeUpdater::Grouped { .. } => true,
            KeyTreeUpdater::Incomplete(delegate) => delegate.is_grouped(),
        }
    }

    /// Policy without the incomplete-only restriction.
    pub fn base(&self) -> &KeyTreeUpdater {
        match self {
            KeyTreeUpdater::Incomplete(delegate) => delegate.base(),
            other => other,
        }
    }

    /// Whether `key` should have an item in the tree.
    pub fn accepts(&self, group: &BundleGroup, key: &str) -> bool {
        match self {
            KeyTreeUpdater::Flat | KeyTreeUpdater::Grouped { .. } => true,
            KeyTreeUpdater::Incomplete(delegate) => {
                is_incomplete(group, key) && delegate.accepts(group, key)
            }
        }
    }

    /// Places `key` into `items` and returns the id of its item, or `None`
    /// when the policy rejects the key.
    pub(crate) fn add_key(&self, items: &mut KeyItems, group: &BundleGroup, key: &str) -> Option<String> {
        match self {
            KeyTreeUpdater::Flat => {
                if !items.cache.contains_key(key) {
                    items.attach(KeyTreeItem::new(key, key, ItemParent::Root));
                }
                Some(key.to_string())
            }
            KeyTreeUpdater::Grouped { separator } if separator.is_empty() => {
                KeyTreeUpdater::Flat.add_key(items, group, key)
            }
            KeyTreeUpdater::Grouped { separator } => {
                let mut parent = ItemParent::Root;
                let mut id = String::new();
                for (depth, segment) in key.split(separator.as_str()).enumerate() {
                    if depth > 0 {
                        id.push_str(separator);
                    }
                    id.push_str(segment);
                    if !items.cache.contains_key(&id) {
                        items.attach(KeyTreeItem::new(id.clone(), segment, parent));
                    }
                    parent = ItemParent::Item(id.clone());
                }
                Some(id)
            }
            KeyTreeUpdater::Incomplete(delegate) => {
                if is_incomplete(group, key) {
                    delegate.add_key(items, group, key)
                } else {
                    None
                }
            }
        }
    }
}

/// Fewer locales have a non-empty value for `key` than the group has locales.
pub fn is_incomplete(group: &BundleGroup, key: &str) -> bool {
    let with_value = group
        .bundle_entries(key)
        .iter()
        .filter(|entry| entry.has_value())
        .count();
    with_value < group.locale_count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{bundle::Bundle, locale::Locale, types::BundleEntry};

    fn group() -> BundleGroup {
        let mut group = BundleGroup::new();
        let mut en = Bundle::new();
        en.add_entry(BundleEntry::new("done", "Done"));
        en.add_entry(BundleEntry::new("todo", "Todo"));
        let mut fr = Bundle::new();
        fr.add_entry(BundleEntry::new("done", "Fini"));
        fr.add_entry(BundleEntry::new("todo", ""));
        group.add_bundle(Locale::language("en"), en);
        group.add_bundle(Locale::language("fr"), fr);
        group
    }

    #[test]
    fn test_flat_places_roots() {
        let group = group();
        let mut items = KeyItems::default();
        assert_eq!(
            KeyTreeUpdater::Flat.add_key(&mut items, &group, "a.b"),
            Some("a.b".to_string())
        );
        assert_eq!(items.roots.len(), 1);
        assert_eq!(items.cache["a.b"].parent(), &ItemParent::Root);
    }

    #[test]
    fn test_grouped_creates_prefix_chain() {
        let group = group();
        let mut items = KeyItems::default();
        let updater = KeyTreeUpdater::grouped(".");
        updater.add_key(&mut items, &group, "a.b.c");
        updater.add_key(&mut items, &group, "a.b.d");

        assert_eq!(items.roots.iter().collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(items.cache["a.b"].name(), "b");
        assert_eq!(items.cache["a.b"].children().collect::<Vec<_>>(), vec!["a.b.c", "a.b.d"]);
        assert_eq!(items.cache["a.b.c"].parent_id(), Some("a.b"));
        assert_eq!(items.cache.len(), 4);
    }

    #[test]
    fn test_incomplete_filters_complete_keys() {
        let group = group();
        let mut items = KeyItems::default();
        let updater = KeyTreeUpdater::incomplete(KeyTreeUpdater::Flat);
        assert_eq!(updater.add_key(&mut items, &group, "done"), None);
        assert_eq!(
            updater.add_key(&mut items, &group, "todo"),
            Some("todo".to_string())
        );
        assert!(updater.accepts(&group, "todo"));
        assert!(!updater.accepts(&group, "done"));
        assert!(!updater.is_grouped());
        assert_eq!(updater.base(), &KeyTreeUpdater::Flat);
    }
}
