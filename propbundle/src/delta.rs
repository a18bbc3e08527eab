//! Change notifications shared by bundles, bundle groups, and key trees.
//!
//! Listeners are invoked synchronously, most recently registered first. The
//! listener list is copied before dispatch, so a listener may register or remove
//! listeners (including itself) from inside a callback.

use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    fmt,
    rc::{Rc, Weak},
};

/// The kind of change carried by a [`DeltaEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeltaKind {
    Add,
    Remove,
    Modify,
    Select,
}

/// A change of `subject`.
#[derive(Debug, Clone, PartialEq)]
pub struct DeltaEvent<T> {
    pub kind: DeltaKind,
    pub subject: T,
}

impl<T> DeltaEvent<T> {
    pub fn new(kind: DeltaKind, subject: T) -> Self {
        Self { kind, subject }
    }
}

/// Receives change notifications. Override `on_delta` to see every event, or
/// the individual callbacks to react to one kind only.
pub trait DeltaListener<T> {
    fn on_delta(&self, event: &DeltaEvent<T>) {
        match event.kind {
            DeltaKind::Add => self.on_add(&event.subject),
            DeltaKind::Remove => self.on_remove(&event.subject),
            DeltaKind::Modify => self.on_modify(&event.subject),
            DeltaKind::Select => self.on_select(&event.subject),
        }
    }

    fn on_add(&self, _subject: &T) {}

    fn on_remove(&self, _subject: &T) {}

    fn on_modify(&self, _subject: &T) {}

    fn on_select(&self, _subject: &T) {}

    /// A notifier drops listeners that report `false` here.
    fn is_alive(&self) -> bool {
        true
    }
}

/// Forwards events to a listener without keeping it alive.
pub struct WeakListener<L: ?Sized> {
    inner: Weak<L>,
}

impl<L: ?Sized> WeakListener<L> {
    pub fn new(listener: &Rc<L>) -> Self {
        Self {
            inner: Rc::downgrade(listener),
        }
    }
}

impl<T, L: DeltaListener<T> + ?Sized> DeltaListener<T> for WeakListener<L> {
    fn on_delta(&self, event: &DeltaEvent<T>) {
        if let Some(listener) = self.inner.upgrade() {
            listener.on_delta(event);
        }
    }

    fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

/// Handle returned by [`Notifier::add_listener`], used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// A list of listeners for one observable object.
pub struct Notifier<T> {
    listeners: RefCell<Vec<(ListenerId, Rc<dyn DeltaListener<T>>)>>,
    next_id: Cell<u64>,
}

impl<T> Default for Notifier<T> {
    fn default() -> Self {
        Self {
            listeners: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }
}

impl<T> fmt::Debug for Notifier<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}

impl<T> Notifier<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&self, listener: Rc<dyn DeltaListener<T>>) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        let mut listeners = self.listeners.borrow_mut();
        listeners.retain(|(_, listener)| listener.is_alive());
        listeners.insert(0, (id, listener));
        id
    }

    /// Registers `listener` without taking ownership. Once the last strong
    /// reference is dropped, the registration is discarded on the next dispatch.
    pub fn add_weak_listener<L: DeltaListener<T> + 'static>(&self, listener: &Rc<L>) -> ListenerId {
        self.add_listener(Rc::new(WeakListener::new(listener)))
    }

    /// Returns `false` if the listener was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    /// Number of registered listeners that are still alive.
    pub fn listener_count(&self) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|(_, listener)| listener.is_alive())
            .count()
    }

    pub fn fire(&self, kind: DeltaKind, subject: T) {
        self.dispatch(&DeltaEvent::new(kind, subject));
    }

    pub fn dispatch(&self, event: &DeltaEvent<T>) {
        self.listeners
            .borrow_mut()
            .retain(|(_, listener)| listener.is_alive());
        let snapshot: Vec<Rc<dyn DeltaListener<T>>> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in snapshot {
            listener.on_delta(event);
        }
    }
}

/// A listener that queues events for later processing.
///
/// Used where the receiver needs access to the sender's state, which is still
/// mutably borrowed while the sender fires.
pub struct EventQueue<T> {
    events: RefCell<VecDeque<DeltaEvent<T>>>,
}

impl<T> Default for EventQueue<T> {
    fn default() -> Self {
        Self {
            events: RefCell::new(VecDeque::new()),
        }
    }
}

impl<T> fmt::Debug for EventQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventQueue")
            .field("pending", &self.events.borrow().len())
            .finish()
    }
}

impl<T> EventQueue<T> {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn drain(&self) -> Vec<DeltaEvent<T>> {
        self.events.borrow_mut().drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }
}

impl<T: Clone> DeltaListener<T> for EventQueue<T> {
    fn on_delta(&self, event: &DeltaEvent<T>) {
        self.events.borrow_mut().push_back(event.clone());
    }
}
