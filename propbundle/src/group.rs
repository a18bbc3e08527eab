//! One bundle per locale, kept structurally synchronized.

use std::{
    collections::{BTreeMap, BTreeSet},
    ops::Bound,
    rc::Rc,
};

use serde::Serialize;
use tracing::debug;

use crate::{
    bundle::Bundle,
    delta::{DeltaKind, DeltaListener, EventQueue, ListenerId, Notifier},
    error::Error,
    locale::Locale,
    types::{BundleEntry, KeyOrder},
};

/// What a [`BundleGroup`] event is about.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupSubject {
    /// A whole bundle was registered, replaced, updated, or removed.
    Bundle(Locale),
    /// An entry of one of the bundles changed. For `Modify` the payload is the
    /// entry before the change.
    Entry(BundleEntry),
}

impl GroupSubject {
    /// Key of the entry concerned, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            GroupSubject::Bundle(_) => None,
            GroupSubject::Entry(entry) => Some(&entry.key),
        }
    }
}

/// Outcome of a structural operation applied to every locale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KeyOperationReport {
    /// Locales whose bundle changed.
    pub applied: Vec<Locale>,
    /// Locales left untouched, usually because they lack the key.
    pub skipped: Vec<Locale>,
}

impl KeyOperationReport {
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

#[derive(Debug)]
struct Member {
    bundle: Bundle,
    relay_id: ListenerId,
}

/// All bundles of one family and the sorted union of their keys.
///
/// Entry events of every member bundle are re-published to the group's listeners
/// as [`GroupSubject::Entry`] once the operation that caused them has completed,
/// followed by the group's own bundle-level event.
#[derive(Debug)]
pub struct BundleGroup {
    members: BTreeMap<Locale, Member>,
    keys: BTreeSet<String>,
    key_order: KeyOrder,
    relay: Rc<EventQueue<BundleEntry>>,
    notifier: Notifier<GroupSubject>,
}

impl Default for BundleGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl BundleGroup {
    pub fn new() -> Self {
        Self {
            members: BTreeMap::new(),
            keys: BTreeSet::new(),
            key_order: KeyOrder::default(),
            relay: EventQueue::new(),
            notifier: Notifier::new(),
        }
    }

    pub fn add_listener(&self, listener: Rc<dyn DeltaListener<GroupSubject>>) -> ListenerId {
        self.notifier.add_listener(listener)
    }

    /// Registers `listener` for as long as something else keeps it alive.
    pub fn add_weak_listener<L: DeltaListener<GroupSubject> + 'static>(
        &self,
        listener: &Rc<L>,
    ) -> ListenerId {
        self.notifier.add_weak_listener(listener)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.notifier.remove_listener(id)
    }

    pub fn listener_count(&self) -> usize {
        self.notifier.listener_count()
    }

    /// Registers `bundle` for `locale`.
    ///
    /// The first registration stores the bundle and fires `Add`. Later ones
    /// merge it into the stored bundle with [`Bundle::copy_from`], so only the
    /// entries that actually differ produce events, and fire `Modify`.
    pub fn add_bundle(&mut self, locale: Locale, mut bundle: Bundle) {
        let kind = match self.members.get_mut(&locale) {
            Some(member) => {
                member.bundle.copy_from(&bundle);
                DeltaKind::Modify
            }
            None => {
                bundle.set_locale(locale.clone());
                bundle.set_key_order(self.key_order);
                let relay_id = bundle.add_listener(self.relay.clone());
                self.members
                    .insert(locale.clone(), Member { bundle, relay_id });
                DeltaKind::Add
            }
        };
        debug!(locale = %locale.display_name(), ?kind, "bundle registered");
        self.refresh();
        self.notifier.fire(kind, GroupSubject::Bundle(locale));
    }

    /// Unregisters and returns the bundle of `locale`.
    pub fn remove_bundle(&mut self, locale: &Locale) -> Option<Bundle> {
        let member = self.members.remove(locale)?;
        member.bundle.remove_listener(member.relay_id);
        self.refresh();
        self.notifier
            .fire(DeltaKind::Remove, GroupSubject::Bundle(locale.clone()));
        Some(member.bundle)
    }

    /// Writes `entry` into the bundle of `locale` and fires `Modify` for that
    /// bundle. Unknown locales and entries equal to the stored one are ignored.
    pub fn add_bundle_entry(&mut self, locale: &Locale, entry: BundleEntry) -> bool {
        let Some(member) = self.members.get_mut(locale) else {
            return false;
        };
        if member.bundle.add_entry(entry).is_none() {
            return false;
        }
        self.refresh();
        self.notifier
            .fire(DeltaKind::Modify, GroupSubject::Bundle(locale.clone()));
        true
    }

    /// Removes `key` from the bundle of `locale` only and fires `Modify` for
    /// that bundle. Returns whether an entry was removed.
    pub fn remove_bundle_entry(&mut self, locale: &Locale, key: &str) -> bool {
        let Some(member) = self.members.get_mut(locale) else {
            return false;
        };
        if member.bundle.remove_entry(key).is_none() {
            return false;
        }
        self.refresh();
        self.notifier
            .fire(DeltaKind::Modify, GroupSubject::Bundle(locale.clone()));
        true
    }

    /// Sets the value of `key` in `locale`, keeping the entry's comment and
    /// commented flag. Returns whether anything changed.
    pub fn set_value(&mut self, locale: &Locale, key: &str, value: &str) -> Result<bool, Error> {
        let key = key.trim();
        if key.is_empty() {
            return Err(Error::invalid_key(key));
        }
        let bundle = self
            .bundle(locale)
            .ok_or_else(|| Error::UnknownLocale(locale.display_name()))?;
        let entry = match bundle.entry(key) {
            Some(existing) => {
                let mut entry = existing.rekeyed(key);
                entry.value = value.to_string();
                entry.trailing_blank_lines = existing.trailing_blank_lines;
                entry
            }
            None => BundleEntry::new(key, value),
        };
        Ok(self.add_bundle_entry(locale, entry))
    }

    /// Adds an empty entry for `key` to every locale that lacks it.
    pub fn add_key(&mut self, key: &str) -> Result<KeyOperationReport, Error> {
        let key = key.trim();
        if key.is_empty() {
            return Err(Error::invalid_key(key));
        }
        let report = self.apply(|bundle| {
            !bundle.contains_key(key) && bundle.add_entry(BundleEntry::new(key, "")).is_some()
        });
        debug!(key, applied = report.applied.len(), "key added");
        Ok(report)
    }

    /// Moves `old_key` to `new_key` in every locale that has it.
    ///
    /// Fails without changing anything when `new_key` is blank or already a key.
    pub fn rename_key(&mut self, old_key: &str, new_key: &str) -> Result<KeyOperationReport, Error> {
        let new_key = self.validate_target(old_key, new_key)?;
        let report = self.apply(|bundle| bundle.rename_key(old_key, &new_key));
        debug!(old_key, new_key = %new_key, applied = report.applied.len(), "key renamed");
        Ok(report)
    }

    /// Copies `original_key` to `new_key` in every locale that has it.
    pub fn copy_key(&mut self, original_key: &str, new_key: &str) -> Result<KeyOperationReport, Error> {
        let new_key = self.validate_target(original_key, new_key)?;
        let report = self.apply(|bundle| bundle.copy_key(original_key, &new_key));
        debug!(original_key, new_key = %new_key, applied = report.applied.len(), "key copied");
        Ok(report)
    }

    pub fn remove_key(&mut self, key: &str) -> KeyOperationReport {
        let report = self.apply(|bundle| bundle.remove_entry(key).is_some());
        debug!(key, applied = report.applied.len(), "key removed");
        report
    }

    pub fn comment_key(&mut self, key: &str) -> KeyOperationReport {
        self.apply(|bundle| bundle.comment_key(key))
    }

    pub fn uncomment_key(&mut self, key: &str) -> KeyOperationReport {
        self.apply(|bundle| bundle.uncomment_key(key))
    }

    fn validate_target(&self, source_key: &str, target_key: &str) -> Result<String, Error> {
        let target = target_key.trim();
        if target.is_empty() {
            return Err(Error::invalid_key(target_key));
        }
        if target != source_key && self.is_key(target) {
            return Err(Error::key_conflict(target));
        }
        Ok(target.to_string())
    }

    /// Runs `operation` on every bundle, then refreshes the key set and fires a
    /// `Modify` per changed bundle.
    fn apply(&mut self, mut operation: impl FnMut(&mut Bundle) -> bool) -> KeyOperationReport {
        let mut report = KeyOperationReport::default();
        for (locale, member) in self.members.iter_mut() {
            if operation(&mut member.bundle) {
                report.applied.push(locale.clone());
            } else {
                report.skipped.push(locale.clone());
            }
        }
        self.refresh();
        for locale in &report.applied {
            self.notifier
                .fire(DeltaKind::Modify, GroupSubject::Bundle(locale.clone()));
        }
        report
    }

    /// Recomputes the key set and forwards queued entry events.
    fn refresh(&mut self) {
        self.keys = self
            .members
            .values()
            .flat_map(|member| member.bundle.iter().map(|entry| entry.key.clone()))
            .collect();
        for event in self.relay.drain() {
            self.notifier
                .fire(event.kind, GroupSubject::Entry(event.subject));
        }
    }

    /// Key following `key` in sorted order.
    pub fn next_key(&self, key: &str) -> Option<&str> {
        if !self.keys.contains(key) {
            return None;
        }
        self.keys
            .range::<str, _>((Bound::Excluded(key), Bound::Unbounded))
            .next()
            .map(String::as_str)
    }

    /// Key preceding `key` in sorted order.
    pub fn previous_key(&self, key: &str) -> Option<&str> {
        if !self.keys.contains(key) {
            return None;
        }
        self.keys
            .range::<str, _>((Bound::Unbounded, Bound::Excluded(key)))
            .next_back()
            .map(String::as_str)
    }

    /// Whether any bundle holds `key`, checked against the bundles themselves.
    pub fn contains_key(&self, key: &str) -> bool {
        self.members
            .values()
            .any(|member| member.bundle.contains_key(key))
    }

    /// Whether `key` is in the cached key set.
    pub fn is_key(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Sorted union of all keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    /// Entries of `key`, one per locale that has it.
    pub fn bundle_entries(&self, key: &str) -> Vec<&BundleEntry> {
        self.members
            .values()
            .filter_map(|member| member.bundle.entry(key))
            .collect()
    }

    pub fn bundle_entry(&self, locale: &Locale, key: &str) -> Option<&BundleEntry> {
        self.bundle(locale)?.entry(key)
    }

    pub fn bundle(&self, locale: &Locale) -> Option<&Bundle> {
        self.members.get(locale).map(|member| &member.bundle)
    }

    /// Bundles in locale order.
    pub fn bundles(&self) -> impl Iterator<Item = &Bundle> {
        self.members.values().map(|member| &member.bundle)
    }

    pub fn locales(&self) -> impl Iterator<Item = &Locale> {
        self.members.keys()
    }

    pub fn locale_count(&self) -> usize {
        self.members.len()
    }

    pub fn key_order(&self) -> KeyOrder {
        self.key_order
    }

    /// Presentation order for every current and future bundle.
    pub fn set_key_order(&mut self, key_order: KeyOrder) {
        self.key_order = key_order;
        for member in self.members.values_mut() {
            member.bundle.set_key_order(key_order);
        }
    }
}
