//! All entries of one locale.

use std::{collections::HashMap, rc::Rc};

use tracing::trace;

use crate::{
    delta::{DeltaKind, DeltaListener, ListenerId, Notifier},
    locale::Locale,
    types::{BundleEntry, KeyOrder},
};

/// The entries of one locale, in file order, with change notification.
///
/// Every mutation fires one event per entry change to the bundle's listeners:
/// `Add` with the new entry, `Modify` with the replaced entry, `Remove` with the
/// removed entry.
#[derive(Debug, Default)]
pub struct Bundle {
    locale: Option<Locale>,
    head_comment: String,
    entries: Vec<BundleEntry>,
    index: HashMap<String, usize>,
    key_order: KeyOrder,
    notifier: Notifier<BundleEntry>,
}

impl Bundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locale assigned by the owning group; `None` until registered.
    pub fn locale(&self) -> Option<&Locale> {
        self.locale.as_ref()
    }

    pub(crate) fn set_locale(&mut self, locale: Locale) {
        for entry in &mut self.entries {
            entry.set_locale(Some(locale.clone()));
        }
        self.locale = Some(locale);
    }

    /// Comment lines before the first entry, joined with `\n`.
    pub fn head_comment(&self) -> &str {
        &self.head_comment
    }

    pub fn set_head_comment(&mut self, comment: impl Into<String>) {
        self.head_comment = comment.into();
    }

    pub fn key_order(&self) -> KeyOrder {
        self.key_order
    }

    pub fn set_key_order(&mut self, key_order: KeyOrder) {
        self.key_order = key_order;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn entry(&self, key: &str) -> Option<&BundleEntry> {
        self.index.get(key).map(|&position| &self.entries[position])
    }

    /// Keys in the bundle's presentation order.
    pub fn keys(&self) -> Vec<&str> {
        self.entries().into_iter().map(|entry| entry.key.as_str()).collect()
    }

    /// Entries in the bundle's presentation order.
    pub fn entries(&self) -> Vec<&BundleEntry> {
        let mut entries: Vec<&BundleEntry> = self.entries.iter().collect();
        if self.key_order == KeyOrder::Sorted {
            entries.sort_by(|a, b| a.key.cmp(&b.key));
        }
        entries
    }

    /// Entries in insertion order, regardless of the presentation order.
    pub fn iter(&self) -> std::slice::Iter<'_, BundleEntry> {
        self.entries.iter()
    }

    pub fn add_listener(&self, listener: Rc<dyn DeltaListener<BundleEntry>>) -> ListenerId {
        self.notifier.add_listener(listener)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.notifier.remove_listener(id)
    }

    /// Adds or replaces the entry for `entry.key`.
    ///
    /// A replaced entry keeps its position; a new key is appended. Returns the
    /// kind of event fired, or `None` when the key is blank or an equal entry is
    /// already present.
    pub fn add_entry(&mut self, mut entry: BundleEntry) -> Option<DeltaKind> {
        if entry.key.trim().is_empty() {
            return None;
        }
        entry.set_locale(self.locale.clone());

        match self.index.get(&entry.key).copied() {
            Some(position) if self.entries[position] == entry => {
                self.entries[position].trailing_blank_lines = entry.trailing_blank_lines;
                None
            }
            Some(position) => {
                let mut old = std::mem::replace(&mut self.entries[position], entry);
                old.set_locale(self.locale.clone());
                self.notifier.fire(DeltaKind::Modify, old);
                Some(DeltaKind::Modify)
            }
            None => {
                self.index.insert(entry.key.clone(), self.entries.len());
                self.entries.push(entry.clone());
                self.notifier.fire(DeltaKind::Add, entry);
                Some(DeltaKind::Add)
            }
        }
    }

    /// Removes the entry for `key` and returns it.
    pub fn remove_entry(&mut self, key: &str) -> Option<BundleEntry> {
        let position = self.index.remove(key)?;
        let removed = self.entries.remove(position);
        for (offset, entry) in self.entries[position..].iter().enumerate() {
            self.index.insert(entry.key.clone(), position + offset);
        }
        self.notifier.fire(DeltaKind::Remove, removed.clone());
        Some(removed)
    }

    /// Moves the entry of `old_key` to `new_key`: one `Remove`, then one `Add`.
    pub fn rename_key(&mut self, old_key: &str, new_key: &str) -> bool {
        let Some(renamed) = self.entry(old_key).map(|entry| entry.rekeyed(new_key)) else {
            return false;
        };
        if renamed.key.is_empty() || renamed.key == old_key {
            return false;
        }
        self.remove_entry(old_key);
        self.add_entry(renamed);
        true
    }

    pub fn comment_key(&mut self, key: &str) -> bool {
        self.set_commented(key, true)
    }

    pub fn uncomment_key(&mut self, key: &str) -> bool {
        self.set_commented(key, false)
    }

    fn set_commented(&mut self, key: &str, commented: bool) -> bool {
        let replacement = match self.entry(key) {
            Some(entry) if entry.commented != commented => entry.recommented(commented),
            _ => return false,
        };
        self.add_entry(replacement).is_some()
    }

    /// Adds a copy of `original_key`'s entry under `new_key`.
    pub fn copy_key(&mut self, original_key: &str, new_key: &str) -> bool {
        match self.entry(original_key).map(|entry| entry.rekeyed(new_key)) {
            Some(copy) => self.add_entry(copy).is_some(),
            None => false,
        }
    }

    /// Synchronizes this bundle with a freshly parsed one of the same locale.
    ///
    /// Keys missing from `other` are removed, then every entry of `other` is
    /// added; unchanged entries fire nothing.
    pub fn copy_from(&mut self, other: &Bundle) {
        self.head_comment = other.head_comment.clone();

        let stale: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| !other.contains_key(&entry.key))
            .map(|entry| entry.key.clone())
            .collect();
        for key in &stale {
            self.remove_entry(key);
        }

        for entry in &other.entries {
            self.add_entry(entry.clone());
        }
        trace!(
            locale = ?self.locale,
            removed = stale.len(),
            entries = self.entries.len(),
            "bundle synchronized"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delta::{DeltaEvent, EventQueue};

    fn bundle_with(entries: &[(&str, &str)]) -> Bundle {
        let mut bundle = Bundle::new();
        for (key, value) in entries {
            bundle.add_entry(BundleEntry::new(*key, *value));
        }
        bundle
    }

    #[test]
    fn test_add_new_key_fires_add() {
        let mut bundle = Bundle::new();
        let queue = EventQueue::<BundleEntry>::new();
        bundle.add_listener(queue.clone());

        assert_eq!(
            bundle.add_entry(BundleEntry::new("hello", "Hello")),
            Some(DeltaKind::Add)
        );
        let events = queue.drain();
        assert_eq!(
            events,
            vec![DeltaEvent::new(DeltaKind::Add, BundleEntry::new("hello", "Hello"))]
        );
    }

    #[test]
    fn test_add_identical_entry_is_silent() {
        let mut bundle = bundle_with(&[("hello", "Hello")]);
        let queue = EventQueue::<BundleEntry>::new();
        bundle.add_listener(queue.clone());

        assert_eq!(bundle.add_entry(BundleEntry::new("hello", "Hello")), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_add_different_entry_fires_modify_with_old_entry() {
        let mut bundle = bundle_with(&[("hello", "Hello")]);
        let queue = EventQueue::<BundleEntry>::new();
        bundle.add_listener(queue.clone());

        assert_eq!(
            bundle.add_entry(BundleEntry::new("hello", "Hi")),
            Some(DeltaKind::Modify)
        );
        let events = queue.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, DeltaKind::Modify);
        assert_eq!(events[0].subject.value, "Hello");
        assert_eq!(bundle.entry("hello").unwrap().value, "Hi");
    }

    #[test]
    fn test_blank_key_is_ignored() {
        let mut bundle = Bundle::new();
        let queue = EventQueue::<BundleEntry>::new();
        bundle.add_listener(queue.clone());

        assert_eq!(bundle.add_entry(BundleEntry::new("   ", "x")), None);
        assert!(bundle.is_empty());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_replace_keeps_position_and_new_keys_append() {
        let mut bundle = bundle_with(&[("b", "1"), ("a", "2"), ("c", "3")]);
        bundle.set_key_order(KeyOrder::Insertion);
        bundle.add_entry(BundleEntry::new("a", "changed"));
        bundle.add_entry(BundleEntry::new("0", "new"));
        assert_eq!(bundle.keys(), vec!["b", "a", "c", "0"]);

        bundle.set_key_order(KeyOrder::Sorted);
        assert_eq!(bundle.keys(), vec!["0", "a", "b", "c"]);
    }

    #[test]
    fn test_remove_entry_returns_stored_entry() {
        let mut bundle = bundle_with(&[("a", "1"), ("b", "2"), ("c", "3")]);
        let queue = EventQueue::<BundleEntry>::new();
        bundle.add_listener(queue.clone());

        let removed = bundle.remove_entry("b").unwrap();
        assert_eq!(removed.value, "2");
        assert!(bundle.remove_entry("b").is_none());
        assert_eq!(bundle.entry("c").unwrap().value, "3");

        let events = queue.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, DeltaKind::Remove);
        assert_eq!(events[0].subject.key, "b");
    }

    #[test]
    fn test_rename_fires_remove_then_add() {
        let mut bundle = Bundle::new();
        bundle.add_entry(BundleEntry::new("old", "value").with_comment("# c"));
        let queue = EventQueue::<BundleEntry>::new();
        bundle.add_listener(queue.clone());

        assert!(bundle.rename_key("old", "new"));
        assert!(!bundle.rename_key("missing", "other"));

        let kinds: Vec<DeltaKind> = queue.drain().into_iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![DeltaKind::Remove, DeltaKind::Add]);
        let renamed = bundle.entry("new").unwrap();
        assert_eq!(renamed.value, "value");
        assert_eq!(renamed.comment.as_deref(), Some("# c"));
        assert!(!bundle.contains_key("old"));
    }

    #[test]
    fn test_comment_and_uncomment() {
        let mut bundle = bundle_with(&[("k", "v")]);
        let queue = EventQueue::<BundleEntry>::new();
        bundle.add_listener(queue.clone());

        assert!(bundle.comment_key("k"));
        assert!(bundle.entry("k").unwrap().commented);
        assert!(!bundle.comment_key("k"));
        assert!(bundle.uncomment_key("k"));
        assert!(!bundle.entry("k").unwrap().commented);

        let kinds: Vec<DeltaKind> = queue.drain().into_iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![DeltaKind::Modify, DeltaKind::Modify]);
    }

    #[test]
    fn test_copy_key_keeps_original() {
        let mut bundle = bundle_with(&[("k", "v")]);
        assert!(bundle.copy_key("k", "k2"));
        assert_eq!(bundle.entry("k").unwrap().value, "v");
        assert_eq!(bundle.entry("k2").unwrap().value, "v");
        assert!(!bundle.copy_key("nope", "k3"));
    }

    #[test]
    fn test_copy_from_fires_only_granular_changes() {
        let mut bundle = bundle_with(&[("same", "1"), ("changed", "2"), ("gone", "3")]);
        let mut reloaded = bundle_with(&[("same", "1"), ("changed", "two"), ("added", "4")]);
        reloaded.set_head_comment("# head");
        let queue = EventQueue::<BundleEntry>::new();
        bundle.add_listener(queue.clone());

        bundle.copy_from(&reloaded);

        let events: Vec<(DeltaKind, String)> = queue
            .drain()
            .into_iter()
            .map(|e| (e.kind, e.subject.key))
            .collect();
        assert_eq!(
            events,
            vec![
                (DeltaKind::Remove, "gone".to_string()),
                (DeltaKind::Modify, "changed".to_string()),
                (DeltaKind::Add, "added".to_string()),
            ]
        );
        assert_eq!(bundle.head_comment(), "# head");
        assert_eq!(bundle.len(), 3);
    }

    #[test]
    fn test_locale_back_reference_follows_owner() {
        let mut bundle = bundle_with(&[("a", "1")]);
        bundle.set_locale(Locale::language("fr"));
        bundle.add_entry(BundleEntry::new("b", "2"));

        assert_eq!(bundle.entry("a").unwrap().locale(), Some(&Locale::language("fr")));
        assert_eq!(bundle.entry("b").unwrap().locale(), Some(&Locale::language("fr")));
    }
}
