//! Editing sessions over a bundle family, and the registry of open sessions.

use std::{collections::BTreeMap, rc::Rc};

use tracing::{debug, info};

use crate::{
    error::Error,
    formats::PropertiesFormat,
    group::{BundleGroup, KeyOperationReport},
    locale::Locale,
    preferences::Preferences,
    source::BundleSource,
    traits::BundleFormat,
    tree::{KeyTree, KeyTreeUpdater},
    types::BundleEntry,
};

/// A bundle group, its key tree, and the preferences used to read and write it.
///
/// Every mutation goes through the session so that the tree is synchronized
/// as soon as the group has changed.
#[derive(Debug)]
pub struct BundleSession {
    group: BundleGroup,
    tree: KeyTree,
    preferences: Preferences,
    format: PropertiesFormat,
}

impl BundleSession {
    /// An empty session without any locale.
    pub fn new(preferences: Preferences) -> Self {
        let mut group = BundleGroup::new();
        group.set_key_order(preferences.key_order());
        let mut tree = KeyTree::new(&group, preferences.tree_updater());
        tree.set_comparator(preferences.key_comparator());
        Self {
            format: PropertiesFormat::new(preferences.format_options()),
            group,
            tree,
            preferences,
        }
    }

    /// Reads every locale of `source`.
    pub fn load(source: &dyn BundleSource, preferences: Preferences) -> Result<Self, Error> {
        let mut session = Self::new(preferences);
        for locale in source.locales()? {
            if let Some(text) = source.read(&locale)? {
                session.reload_locale(locale, &text);
            }
        }
        info!(
            locales = session.group.locale_count(),
            keys = session.group.key_count(),
            "bundle family loaded"
        );
        Ok(session)
    }

    pub fn group(&self) -> &BundleGroup {
        &self.group
    }

    pub fn tree(&self) -> &KeyTree {
        &self.tree
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn format(&self) -> &PropertiesFormat {
        &self.format
    }

    /// Parses `text` as the bundle of `locale` and merges it into the group.
    ///
    /// A locale seen for the first time is added; otherwise only entries that
    /// differ from the loaded ones change.
    pub fn reload_locale(&mut self, locale: Locale, text: &str) {
        let bundle = self.format.parse(text);
        self.group.add_bundle(locale, bundle);
        self.tree.sync(&self.group);
    }

    /// Adds an empty locale.
    pub fn add_locale(&mut self, locale: Locale) -> bool {
        if self.group.bundle(&locale).is_some() {
            return false;
        }
        self.reload_locale(locale, "");
        true
    }

    fn synced<T>(&mut self, result: T) -> T {
        self.tree.sync(&self.group);
        result
    }

    pub fn add_key(&mut self, key: &str) -> Result<KeyOperationReport, Error> {
        let report = self.group.add_key(key);
        self.synced(report)
    }

    pub fn rename_key(&mut self, old_key: &str, new_key: &str) -> Result<KeyOperationReport, Error> {
        let report = self.group.rename_key(old_key, new_key);
        self.synced(report)
    }

    pub fn copy_key(&mut self, original_key: &str, new_key: &str) -> Result<KeyOperationReport, Error> {
        let report = self.group.copy_key(original_key, new_key);
        self.synced(report)
    }

    pub fn remove_key(&mut self, key: &str) -> KeyOperationReport {
        let report = self.group.remove_key(key);
        self.synced(report)
    }

    pub fn comment_key(&mut self, key: &str) -> KeyOperationReport {
        let report = self.group.comment_key(key);
        self.synced(report)
    }

    pub fn uncomment_key(&mut self, key: &str) -> KeyOperationReport {
        let report = self.group.uncomment_key(key);
        self.synced(report)
    }

    pub fn set_value(&mut self, locale: &Locale, key: &str, value: &str) -> Result<bool, Error> {
        let changed = self.group.set_value(locale, key, value);
        self.synced(changed)
    }

    pub fn add_bundle_entry(&mut self, locale: &Locale, entry: BundleEntry) -> bool {
        let changed = self.group.add_bundle_entry(locale, entry);
        self.synced(changed)
    }

    pub fn remove_bundle_entry(&mut self, locale: &Locale, key: &str) -> bool {
        let changed = self.group.remove_bundle_entry(locale, key);
        self.synced(changed)
    }

    pub fn select_key(&mut self, key: &str) -> bool {
        self.tree.select_key(key)
    }

    pub fn select_next_key(&mut self) -> Option<String> {
        self.tree.select_next_key(&self.group)
    }

    pub fn select_previous_key(&mut self) -> Option<String> {
        self.tree.select_previous_key(&self.group)
    }

    pub fn filter_keys(&mut self, filter: &str) {
        self.tree.filter_key_items(filter);
    }

    /// Switches between a grouped and a flat tree, keeping the incomplete-only
    /// restriction if it is active.
    pub fn set_grouped(&mut self, grouped: bool) {
        let base = if grouped {
            KeyTreeUpdater::grouped(self.preferences.key_group_separator.clone())
        } else {
            KeyTreeUpdater::Flat
        };
        let updater = match self.tree.updater() {
            KeyTreeUpdater::Incomplete(_) => KeyTreeUpdater::incomplete(base),
            _ => base,
        };
        self.tree.set_updater(&self.group, updater);
    }

    /// Restricts the tree to keys lacking a value in some locale.
    pub fn show_incomplete_only(&mut self, incomplete_only: bool) {
        let base = self.tree.updater().base().clone();
        let updater = if incomplete_only {
            KeyTreeUpdater::incomplete(base)
        } else {
            base
        };
        self.tree.set_updater(&self.group, updater);
    }

    /// Fills empty or absent values from `reference`.
    ///
    /// `translate` receives the reference value and the target locale and
    /// returns the text to store, or `None` to leave the hole. Returns the
    /// number of values written.
    pub fn prefill_missing(
        &mut self,
        reference: &Locale,
        mut translate: impl FnMut(&str, &Locale) -> Option<String>,
    ) -> Result<usize, Error> {
        let reference_bundle = self
            .group
            .bundle(reference)
            .ok_or_else(|| Error::UnknownLocale(reference.display_name()))?;

        let mut fills = Vec::new();
        for entry in reference_bundle.iter().filter(|entry| entry.has_value()) {
            for locale in self.group.locales().filter(|locale| *locale != reference) {
                let has_value = self
                    .group
                    .bundle_entry(locale, &entry.key)
                    .is_some_and(BundleEntry::has_value);
                if !has_value && let Some(value) = translate(&entry.value, locale) {
                    fills.push((locale.clone(), entry.key.clone(), value));
                }
            }
        }

        let mut written = 0;
        for (locale, key, value) in fills {
            if self.group.set_value(&locale, &key, &value)? {
                written += 1;
            }
        }
        self.tree.sync(&self.group);
        debug!(reference = %reference.display_name(), written, "missing values prefilled");
        Ok(written)
    }

    /// Text of the bundle of `locale` as it would be saved.
    pub fn generate(&self, locale: &Locale) -> Option<String> {
        self.group
            .bundle(locale)
            .map(|bundle| self.format.generate(bundle))
    }

    /// Writes every bundle to `source`.
    pub fn save(&self, source: &mut dyn BundleSource) -> Result<(), Error> {
        for bundle in self.group.bundles() {
            if let Some(locale) = bundle.locale() {
                source.write(locale, &self.format.generate(bundle))?;
            }
        }
        info!(locales = self.group.locale_count(), "bundle family saved");
        Ok(())
    }
}

/// Identifier of an open session.
pub type SessionId = usize;

/// Lifecycle change of a session in a [`SessionRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Opened(SessionId),
    Activated(SessionId),
    Deactivated(SessionId),
    Closed(SessionId),
}

pub trait SessionListener {
    fn on_session_event(&self, event: SessionEvent);
}

/// Open sessions, at most one of them active.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: BTreeMap<SessionId, BundleSession>,
    next_id: SessionId,
    active: Option<SessionId>,
    listeners: Vec<Rc<dyn SessionListener>>,
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sessions", &self.sessions.keys().collect::<Vec<_>>())
            .field("active", &self.active)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listeners are invoked most recently registered first.
    pub fn add_listener(&mut self, listener: Rc<dyn SessionListener>) {
        self.listeners.insert(0, listener);
    }

    fn fire(&self, event: SessionEvent) {
        let snapshot = self.listeners.clone();
        for listener in snapshot {
            listener.on_session_event(event);
        }
    }

    pub fn open(&mut self, session: BundleSession) -> SessionId {
        let id = self.next_id;
        self.next_id += 1;
        self.sessions.insert(id, session);
        debug!(id, "session opened");
        self.fire(SessionEvent::Opened(id));
        id
    }

    /// Makes `id` the active session, deactivating the previous one.
    pub fn activate(&mut self, id: SessionId) -> Result<(), Error> {
        if !self.sessions.contains_key(&id) {
            return Err(Error::UnknownSession(id));
        }
        if self.active == Some(id) {
            return Ok(());
        }
        self.deactivate();
        self.active = Some(id);
        self.fire(SessionEvent::Activated(id));
        Ok(())
    }

    pub fn deactivate(&mut self) {
        if let Some(previous) = self.active.take() {
            self.fire(SessionEvent::Deactivated(previous));
        }
    }

    pub fn close(&mut self, id: SessionId) -> Result<BundleSession, Error> {
        if !self.sessions.contains_key(&id) {
            return Err(Error::UnknownSession(id));
        }
        if self.active == Some(id) {
            self.deactivate();
        }
        let session = self.sessions.remove(&id).ok_or(Error::UnknownSession(id))?;
        debug!(id, "session closed");
        self.fire(SessionEvent::Closed(id));
        Ok(session)
    }

    pub fn active_id(&self) -> Option<SessionId> {
        self.active
    }

    pub fn active(&self) -> Option<&BundleSession> {
        self.sessions.get(&self.active?)
    }

    pub fn get(&self, id: SessionId) -> Option<&BundleSession> {
        self.sessions.get(&id)
    }

    pub fn get_mut(&mut self, id: SessionId) -> Option<&mut BundleSession> {
        self.sessions.get_mut(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = SessionId> + '_ {
        self.sessions.keys().copied()
    }

    /// Moves `key` from one open session to another.
    ///
    /// Entries are copied into the target for every locale it has and removed
    /// from the source for those locales only. Locales the target lacks keep
    /// their entry in the source and are listed as skipped.
    pub fn move_key(&mut self, from: SessionId, to: SessionId, key: &str) -> Result<KeyOperationReport, Error> {
        let source = self.sessions.get(&from).ok_or(Error::UnknownSession(from))?;
        let target = self.sessions.get(&to).ok_or(Error::UnknownSession(to))?;
        if from == to || target.group().is_key(key) {
            return Err(Error::key_conflict(key));
        }
        if !source.group().is_key(key) {
            return Ok(KeyOperationReport::default());
        }

        let entries: Vec<(Locale, BundleEntry)> = source
            .group()
            .bundles()
            .filter_map(|bundle| Some((bundle.locale()?.clone(), bundle.entry(key)?.clone())))
            .collect();

        let mut report = KeyOperationReport::default();
        if let Some(target) = self.sessions.get_mut(&to) {
            for (locale, entry) in entries {
                if target.add_bundle_entry(&locale, entry) {
                    report.applied.push(locale);
                } else {
                    report.skipped.push(locale);
                }
            }
        }
        if let Some(source) = self.sessions.get_mut(&from) {
            for locale in &report.applied {
                source.remove_bundle_entry(locale, key);
            }
        }
        debug!(from, to, key, moved = report.applied.len(), "key moved");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{delta::DeltaKind, source::MemorySource};
    use std::cell::RefCell;

    fn en() -> Locale {
        Locale::language("en")
    }

    fn fr() -> Locale {
        Locale::language("fr")
    }

    fn session(files: &[(Locale, &str)]) -> BundleSession {
        let source = files
            .iter()
            .fold(MemorySource::new(), |source, (locale, text)| {
                source.with(locale.clone(), *text)
            });
        BundleSession::load(&source, Preferences::default()).unwrap()
    }

    #[test]
    fn test_load_builds_group_and_tree() {
        let session = session(&[(en(), "menu.open=Open\nmenu.save=Save\n"), (fr(), "menu.open=Ouvrir\n")]);
        assert_eq!(session.group().locale_count(), 2);
        assert_eq!(session.group().key_count(), 2);
        let roots: Vec<&str> = session.tree().root_items().into_iter().map(|item| item.id()).collect();
        assert_eq!(roots, vec!["menu"]);
    }

    #[test]
    fn test_operations_keep_tree_in_sync() {
        let mut session = session(&[(en(), "a.x=1\n"), (fr(), "a.x=un\n")]);
        session.rename_key("a.x", "b.y").unwrap();
        assert!(session.tree().item("a").is_none());
        assert!(session.tree().item("b.y").is_some());

        session.add_key("c").unwrap();
        assert!(session.tree().item("c").is_some());
        session.remove_key("c");
        assert!(session.tree().item("c").is_none());
    }

    #[test]
    fn test_reload_locale_merges() {
        let mut session = session(&[(en(), "a=1\nb=2\n")]);
        let events = crate::delta::EventQueue::<crate::group::GroupSubject>::new();
        session.group().add_listener(events.clone());

        session.reload_locale(en(), "a=1\nb=two\n");
        let kinds: Vec<DeltaKind> = events.drain().into_iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![DeltaKind::Modify, DeltaKind::Modify]);
        assert_eq!(session.group().bundle_entry(&en(), "b").unwrap().value, "two");
    }

    #[test]
    fn test_incomplete_only_and_grouping() {
        let mut session = session(&[(en(), "a.x=1\nb=2\n"), (fr(), "b=deux\n")]);
        session.show_incomplete_only(true);
        assert!(session.tree().item("b").is_none());
        assert!(session.tree().item("a.x").is_some());

        session.set_grouped(false);
        assert!(session.tree().item("a").is_none());
        assert!(matches!(session.tree().updater(), KeyTreeUpdater::Incomplete(_)));

        session.show_incomplete_only(false);
        assert_eq!(session.tree().updater(), &KeyTreeUpdater::Flat);
        assert_eq!(session.tree().len(), 2);
    }

    #[test]
    fn test_prefill_missing() {
        let mut session = session(&[(en(), "a=Hello\nb=World\n"), (fr(), "a=Bonjour\nb=\n")]);
        let written = session
            .prefill_missing(&en(), |value, locale| Some(format!("[{locale}] {value}")))
            .unwrap();
        assert_eq!(written, 1);
        assert_eq!(session.group().bundle_entry(&fr(), "b").unwrap().value, "[fr] World");
        assert_eq!(session.group().bundle_entry(&fr(), "a").unwrap().value, "Bonjour");
        assert!(session.prefill_missing(&Locale::language("de"), |_, _| None).is_err());
    }

    #[test]
    fn test_save_writes_every_locale() {
        let session = session(&[(en(), "k=v\n"), (fr(), "k=w\n")]);
        let mut target = MemorySource::new();
        session.save(&mut target).unwrap();
        assert!(target.text(&fr()).unwrap().contains("k = w"));
        assert_eq!(session.generate(&en()).as_deref(), target.text(&en()));
    }

    struct Recorder(RefCell<Vec<SessionEvent>>);

    impl SessionListener for Recorder {
        fn on_session_event(&self, event: SessionEvent) {
            self.0.borrow_mut().push(event);
        }
    }

    #[test]
    fn test_registry_lifecycle() {
        let mut registry = SessionRegistry::new();
        let recorder = Rc::new(Recorder(RefCell::new(Vec::new())));
        registry.add_listener(recorder.clone());

        let first = registry.open(BundleSession::new(Preferences::default()));
        let second = registry.open(BundleSession::new(Preferences::default()));
        registry.activate(first).unwrap();
        registry.activate(second).unwrap();
        registry.close(second).unwrap();
        assert!(matches!(registry.activate(second), Err(Error::UnknownSession(_))));
        assert_eq!(registry.active_id(), None);

        assert_eq!(
            *recorder.0.borrow(),
            vec![
                SessionEvent::Opened(first),
                SessionEvent::Opened(second),
                SessionEvent::Activated(first),
                SessionEvent::Deactivated(first),
                SessionEvent::Activated(second),
                SessionEvent::Deactivated(second),
                SessionEvent::Closed(second),
            ]
        );
    }

    #[test]
    fn test_move_key_between_sessions() {
        let mut registry = SessionRegistry::new();
        let from = registry.open(session(&[(en(), "k=Key\nother=1\n"), (fr(), "k=Clé\n")]));
        let to = registry.open(session(&[(en(), "x=1\n")]));

        let report = registry.move_key(from, to, "k").unwrap();
        assert_eq!(report.applied, vec![en()]);
        assert_eq!(report.skipped, vec![fr()]);
        let source = registry.get(from).unwrap().group();
        assert!(source.bundle_entry(&en(), "k").is_none());
        assert_eq!(source.bundle_entry(&fr(), "k").unwrap().value, "Clé");
        assert!(registry.get(from).unwrap().tree().item("k").is_some());
        assert_eq!(
            registry.get(to).unwrap().group().bundle_entry(&en(), "k").unwrap().value,
            "Key"
        );
        assert!(registry.get(to).unwrap().tree().item("k").is_some());

        assert!(matches!(registry.move_key(from, to, "x"), Err(Error::KeyConflict(_))));
        assert!(matches!(registry.move_key(from, 99, "other"), Err(Error::UnknownSession(99))));
    }
}
