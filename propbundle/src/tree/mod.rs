//! Flat or hierarchical view over the key set of a [`BundleGroup`].
//!
//! The tree listens to its group through an event queue. After changing the
//! group, call [`KeyTree::sync`] to bring the tree up to date; it fires one tree
//! event per item added, removed, or modified.

mod comparator;
mod item;
mod updater;

use std::{collections::BTreeSet, rc::Rc};

use tracing::debug;

pub use comparator::KeyComparator;
pub use item::{ItemParent, KeyTreeItem};
pub use updater::{KeyTreeUpdater, is_incomplete};

use crate::{
    delta::{DeltaKind, DeltaListener, EventQueue, ListenerId, Notifier},
    group::{BundleGroup, GroupSubject},
};
use updater::KeyItems;

/// Tree of keys, kept in step with a [`BundleGroup`].
#[derive(Debug)]
pub struct KeyTree {
    items: KeyItems,
    updater: KeyTreeUpdater,
    comparator: KeyComparator,
    selected_key: Option<String>,
    filter: Option<String>,
    notifier: Notifier<KeyTreeItem>,
    inbox: Rc<EventQueue<GroupSubject>>,
    inbox_id: ListenerId,
}

impl KeyTree {
    /// Builds the tree from every key of `group` and starts listening to it.
    ///
    /// The group only holds a weak reference to the tree's inbox, so dropping
    /// the tree also ends the subscription.
    pub fn new(group: &BundleGroup, updater: KeyTreeUpdater) -> Self {
        let inbox = EventQueue::<GroupSubject>::new();
        let inbox_id = group.add_weak_listener(&inbox);
        let mut tree = Self {
            items: KeyItems::default(),
            updater,
            comparator: KeyComparator::default(),
            selected_key: None,
            filter: None,
            notifier: Notifier::new(),
            inbox,
            inbox_id,
        };
        tree.rebuild(group);
        tree
    }

    /// Stops listening to `group`.
    pub fn detach(self, group: &BundleGroup) {
        group.remove_listener(self.inbox_id);
    }

    pub fn add_listener(&self, listener: Rc<dyn DeltaListener<KeyTreeItem>>) -> ListenerId {
        self.notifier.add_listener(listener)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.notifier.remove_listener(id)
    }

    pub fn updater(&self) -> &KeyTreeUpdater {
        &self.updater
    }

    /// Replaces the placement policy and rebuilds every item.
    pub fn set_updater(&mut self, group: &BundleGroup, updater: KeyTreeUpdater) {
        self.updater = updater;
        self.inbox.drain();
        self.rebuild(group);
    }

    pub fn comparator(&self) -> KeyComparator {
        self.comparator
    }

    pub fn set_comparator(&mut self, comparator: KeyComparator) {
        self.comparator = comparator;
    }

    fn rebuild(&mut self, group: &BundleGroup) {
        self.items.clear();
        for key in group.keys() {
            self.updater.add_key(&mut self.items, group, key);
        }
        self.apply_filter();
        debug!(items = self.items.cache.len(), updater = ?self.updater, "key tree rebuilt");
    }

    /// Applies the group changes queued since the last call.
    ///
    /// A bundle registered or removed as a whole triggers a full rebuild;
    /// otherwise each touched key is added, removed, or reported as modified.
    pub fn sync(&mut self, group: &BundleGroup) {
        let mut rebuild = false;
        let mut touched = BTreeSet::new();
        for event in self.inbox.drain() {
            match event.subject {
                GroupSubject::Bundle(_) => {
                    rebuild |= matches!(event.kind, DeltaKind::Add | DeltaKind::Remove);
                }
                GroupSubject::Entry(entry) => {
                    touched.insert(entry.key);
                }
            }
        }

        if rebuild {
            self.rebuild(group);
            return;
        }
        for key in touched {
            let wanted = self.wants(group, &key);
            let present = self.items.cache.contains_key(&key);
            match (wanted, present) {
                (true, false) => {
                    self.add_key(group, &key);
                }
                (true, true) => self.modify_key(&key),
                (false, true) => {
                    self.remove_key(group, &key);
                }
                (false, false) => {}
            }
        }
    }

    fn wants(&self, group: &BundleGroup, id: &str) -> bool {
        group.is_key(id) && self.updater.accepts(group, id)
    }

    /// Places `key` and fires `Add` with its item. Returns the item id, or
    /// `None` when the updater rejects the key.
    pub fn add_key(&mut self, group: &BundleGroup, key: &str) -> Option<String> {
        let id = self.updater.add_key(&mut self.items, group, key)?;
        if self.filter.is_some() {
            self.apply_filter();
        }
        if let Some(item) = self.items.cache.get(&id) {
            self.notifier.fire(DeltaKind::Add, item.clone());
        }
        Some(id)
    }

    /// Removes the item of `key` and fires `Remove` with it.
    ///
    /// In a grouped tree, parents that are left without children and do not
    /// stand for a key are pruned as well, each with its own `Remove`. An item
    /// that still has children stays as a group node and fires `Modify`.
    pub fn remove_key(&mut self, group: &BundleGroup, key: &str) -> bool {
        let Some(item) = self.items.cache.get(key) else {
            return false;
        };
        if item.has_children() {
            let item = item.clone();
            self.notifier.fire(DeltaKind::Modify, item);
            return true;
        }

        let mut next = Some(key.to_string());
        while let Some(id) = next.take() {
            let Some(removed) = self.detach_item(&id) else {
                break;
            };
            if self.updater.is_grouped()
                && let Some(parent_id) = removed.parent_id()
                && self
                    .items
                    .cache
                    .get(parent_id)
                    .is_some_and(|parent| !parent.has_children())
                && !self.wants(group, parent_id)
            {
                next = Some(parent_id.to_string());
            }
            if self.selected_key.as_deref() == Some(removed.id()) {
                self.selected_key = None;
            }
            self.notifier.fire(DeltaKind::Remove, removed);
        }
        if self.filter.is_some() {
            self.refilter();
        }
        true
    }

    fn detach_item(&mut self, id: &str) -> Option<KeyTreeItem> {
        let item = self.items.cache.remove(id)?;
        match item.parent() {
            ItemParent::Root => {
                self.items.roots.remove(id);
            }
            ItemParent::Item(parent_id) => {
                if let Some(parent) = self.items.cache.get_mut(parent_id) {
                    parent.remove_child(id);
                }
            }
        }
        Some(item)
    }

    /// Fires `Modify` for the item of `key`.
    pub fn modify_key(&self, key: &str) {
        if let Some(item) = self.items.cache.get(key) {
            self.notifier.fire(DeltaKind::Modify, item.clone());
        }
    }

    pub fn selected_key(&self) -> Option<&str> {
        self.selected_key.as_deref()
    }

    /// Selects the item of `key` and fires `Select`. Selecting the current
    /// selection again, or a key without an item, does nothing.
    pub fn select_key(&mut self, key: &str) -> bool {
        if self.selected_key.as_deref() == Some(key) {
            return false;
        }
        let Some(item) = self.items.cache.get(key) else {
            return false;
        };
        let item = item.clone();
        self.selected_key = Some(key.to_string());
        self.notifier.fire(DeltaKind::Select, item);
        true
    }

    /// Selects the next item in id order that stands for a key. Without a
    /// selection the first key is selected.
    pub fn select_next_key(&mut self, group: &BundleGroup) -> Option<String> {
        let next = {
            let mut ids = self.items.cache.keys();
            match self.selected_key.as_deref() {
                Some(selected) => ids
                    .skip_while(|id| id.as_str() <= selected)
                    .find(|id| group.is_key(id))
                    .cloned(),
                None => ids.find(|id| group.is_key(id)).cloned(),
            }
        }?;
        self.select_key(&next);
        Some(next)
    }

    /// Selects the previous item in id order that stands for a key.
    pub fn select_previous_key(&mut self, group: &BundleGroup) -> Option<String> {
        let selected = self.selected_key.as_deref()?;
        let previous = self
            .items
            .cache
            .keys()
            .rev()
            .skip_while(|id| id.as_str() >= selected)
            .find(|id| group.is_key(id))
            .cloned()?;
        self.select_key(&previous);
        Some(previous)
    }

    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    /// Shows only items whose id contains `filter`, plus their ancestors.
    /// Items whose visibility changes fire `Modify`.
    pub fn filter_key_items(&mut self, filter: &str) {
        self.filter = if filter.is_empty() {
            None
        } else {
            Some(filter.to_string())
        };
        self.refilter();
    }

    pub fn reset_filter(&mut self) {
        self.filter = None;
        self.refilter();
    }

    fn refilter(&mut self) {
        let before: Vec<(String, bool)> = self
            .items
            .cache
            .values()
            .map(|item| (item.id().to_string(), item.is_visible()))
            .collect();
        self.apply_filter();
        for (id, was_visible) in before {
            if let Some(item) = self.items.cache.get(&id)
                && item.is_visible() != was_visible
            {
                self.notifier.fire(DeltaKind::Modify, item.clone());
            }
        }
    }

    /// Recomputes visibility. Descendant ids sort after their ancestors, so a
    /// reverse walk sees every child before its parent.
    fn apply_filter(&mut self) {
        let filter = self.filter.clone();
        for item in self.items.cache.values_mut() {
            let visible = filter
                .as_deref()
                .is_none_or(|filter| item.id().contains(filter));
            item.set_visible(visible);
        }
        if filter.is_none() {
            return;
        }
        let ids: Vec<String> = self.items.cache.keys().rev().cloned().collect();
        for id in ids {
            let parent = match self.items.cache.get(&id) {
                Some(item) if item.is_visible() => item.parent_id().map(str::to_string),
                _ => None,
            };
            if let Some(parent) = parent.and_then(|p| self.items.cache.get_mut(&p)) {
                parent.set_visible(true);
            }
        }
    }

    pub fn item(&self, id: &str) -> Option<&KeyTreeItem> {
        self.items.cache.get(id)
    }

    /// Root items in comparator order.
    pub fn root_items(&self) -> Vec<&KeyTreeItem> {
        self.sorted(self.items.roots.iter())
    }

    /// Children of `id` in comparator order.
    pub fn children(&self, id: &str) -> Vec<&KeyTreeItem> {
        match self.items.cache.get(id) {
            Some(item) => self.sorted(item.children()),
            None => Vec::new(),
        }
    }

    fn sorted<'a, S: AsRef<str>>(&'a self, ids: impl Iterator<Item = S>) -> Vec<&'a KeyTreeItem> {
        let mut items: Vec<&KeyTreeItem> = ids
            .filter_map(|id| self.items.cache.get(id.as_ref()))
            .collect();
        items.sort_by(|a, b| self.comparator.compare(a.id(), b.id()));
        items
    }

    /// All items in id order.
    pub fn items(&self) -> impl Iterator<Item = &KeyTreeItem> {
        self.items.cache.values()
    }

    pub fn len(&self) -> usize {
        self.items.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.cache.is_empty()
    }
}
