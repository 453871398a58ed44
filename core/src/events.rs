use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use chrono::NaiveDate;

use crate::local_store::Namespace;

#[derive(Debug, Clone, PartialEq)]
pub enum MetricEvent {
    HeightChanged(f64),
    WeightChanged(f64),
    BodyFatChanged(f64),
    RecordSaved {
        namespace: Namespace,
        date: Option<NaiveDate>,
    },
}

type Listener = Arc<dyn Fn(&MetricEvent) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

/// Publish/subscribe channel for metric updates. Clones share listeners.
#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Arc<Mutex<Listeners>>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. It stays registered until the returned handle is
    /// dropped or [`Subscription::unsubscribe`] is called.
    pub fn subscribe(
        &self,
        listener: impl Fn(&MetricEvent) + Send + Sync + 'static,
    ) -> Subscription {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.push((id, Arc::new(listener)));
        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    /// Deliver `event` to every current listener; returns how many received it.
    pub fn publish(&self, event: &MetricEvent) -> usize {
        // Snapshot so listeners may subscribe or unsubscribe while handling.
        let snapshot: Vec<Listener> = {
            let listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
            listeners.entries.iter().map(|(_, l)| Arc::clone(l)).collect()
        };
        for listener in &snapshot {
            listener(event);
        }
        snapshot.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }
}

#[must_use = "dropping a Subscription unsubscribes its listener"]
pub struct Subscription {
    id: u64,
    listeners: Weak<Mutex<Listeners>>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .entries
                .retain(|(id, _)| *id != self.id);
        }
    }
}
