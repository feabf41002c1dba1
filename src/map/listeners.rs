use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::EventKind;

/// What the controller does when a listener fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Select,
    ExportSnapshot,
}

#[derive(Clone, Copy, Debug)]
struct Listener {
    kind: EventKind,
    action: Action,
    once: bool,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: BTreeMap<u64, Listener>,
}

/// Listeners attached to the live map. Attaching hands back a [`Subscription`];
/// the listener stays attached exactly as long as that value lives.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Mutex<Registry>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn attach(&self, kind: EventKind, action: Action, once: bool) -> Subscription {
        let mut registry = self.registry();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.listeners.insert(id, Listener { kind, action, once });

        tracing::debug!(id, ?kind, ?action, once, "listener attached");

        Subscription {
            bus: self.clone(),
            id,
        }
    }

    pub fn subscribe(&self, kind: EventKind, action: Action) -> Subscription {
        self.attach(kind, action, false)
    }

    /// Detaches itself after the first delivery.
    pub fn subscribe_once(&self, kind: EventKind, action: Action) -> Subscription {
        self.attach(kind, action, true)
    }

    /// Actions of every listener for `kind`, in attach order. One-shot
    /// listeners are detached on the way out.
    pub fn deliver(&self, kind: EventKind) -> Vec<Action> {
        let mut registry = self.registry();

        let matching: Vec<(u64, Listener)> = registry
            .listeners
            .iter()
            .filter(|(_, l)| l.kind == kind)
            .map(|(id, l)| (*id, *l))
            .collect();

        for (id, listener) in &matching {
            if listener.once {
                registry.listeners.remove(id);
            }
        }

        matching.into_iter().map(|(_, l)| l.action).collect()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.registry()
            .listeners
            .values()
            .filter(|l| l.kind == kind)
            .count()
    }

    pub fn len(&self) -> usize {
        self.registry().listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn detach(&self, id: u64) {
        if self.registry().listeners.remove(&id).is_some() {
            tracing::debug!(id, "listener detached");
        }
    }
}

pub struct Subscription {
    bus: EventBus,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.bus.detach(self.id);
    }
}

#[test]
fn dropping_a_subscription_detaches_it() {
    let bus = EventBus::new();

    let click = bus.subscribe(EventKind::Click, Action::Select);
    let geocoded = bus.subscribe(EventKind::Geocoded, Action::Select);
    assert_eq!(bus.len(), 2);

    drop(click);
    assert_eq!(bus.count(EventKind::Click), 0);
    assert_eq!(bus.count(EventKind::Geocoded), 1);

    drop(geocoded);
    assert!(bus.is_empty());
}

#[test]
fn one_shot_listeners_fire_once() {
    let bus = EventBus::new();
    let _settled = bus.subscribe_once(EventKind::ViewSettled, Action::ExportSnapshot);

    assert_eq!(bus.deliver(EventKind::ViewSettled), vec![Action::ExportSnapshot]);
    assert!(bus.deliver(EventKind::ViewSettled).is_empty());
    assert!(bus.is_empty());
}

#[test]
fn delivery_only_matches_the_event_kind() {
    let bus = EventBus::new();
    let _click = bus.subscribe(EventKind::Click, Action::Select);

    assert!(bus.deliver(EventKind::Geocoded).is_empty());
    assert_eq!(bus.deliver(EventKind::Click), vec![Action::Select]);
    assert_eq!(bus.deliver(EventKind::Click), vec![Action::Select]);
}
