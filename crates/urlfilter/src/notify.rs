//! # Change Notification
//!
//! Two pieces live here:
//!
//! - [`Listeners`] / [`Subscription`]: a single-threaded observer list. Adding a
//!   listener returns a handle whose [`Subscription::unsubscribe`] is
//!   idempotent. Listeners may subscribe or unsubscribe from inside a callback.
//!
//! - [`ChangeTracker`]: the state machine that keeps the two sync directions
//!   apart. UI edits are observed lazily through a revision counter, so any
//!   number of edits between two response flushes collapse into a single
//!   emission carrying the final state. Emissions equal to the last known URL
//!   state are suppressed.

use crate::error::{FilterError, Result};
use crate::params::QueryParameters;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::debug;

type Callback<E> = Box<dyn FnMut(&E)>;

struct Slot<E> {
    id: u64,
    callback: Callback<E>,
}

struct ListenerSet<E> {
    next_id: u64,
    slots: Vec<Slot<E>>,
    emitting: bool,
    removed_while_emitting: Vec<u64>,
}

impl<E> ListenerSet<E> {
    fn remove(&mut self, id: u64) {
        if self.emitting {
            self.removed_while_emitting.push(id);
        }
        self.slots.retain(|s| s.id != id);
    }
}

/// Observer list for events of type `E`.
pub struct Listeners<E> {
    inner: Rc<RefCell<ListenerSet<E>>>,
}

impl<E> Default for Listeners<E> {
    fn default() -> Self {
        Self {
            inner: Rc::new(RefCell::new(ListenerSet {
                next_id: 0,
                slots: Vec::new(),
                emitting: false,
                removed_while_emitting: Vec::new(),
            })),
        }
    }
}

impl<E: 'static> Listeners<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, callback: impl FnMut(&E) + 'static) -> Subscription {
        let id = {
            let mut set = self.inner.borrow_mut();
            let id = set.next_id;
            set.next_id += 1;
            set.slots.push(Slot {
                id,
                callback: Box::new(callback),
            });
            id
        };

        let weak: Weak<RefCell<ListenerSet<E>>> = Rc::downgrade(&self.inner);
        Subscription {
            remove: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.borrow_mut().remove(id);
                }
            })),
        }
    }

    /// Call every listener, in subscription order.
    pub fn emit(&self, event: &E) {
        let mut slots = {
            let mut set = self.inner.borrow_mut();
            set.emitting = true;
            std::mem::take(&mut set.slots)
        };

        for slot in slots.iter_mut() {
            let removed = self
                .inner
                .borrow()
                .removed_while_emitting
                .contains(&slot.id);
            if !removed {
                (slot.callback)(event);
            }
        }

        let mut set = self.inner.borrow_mut();
        let added = std::mem::take(&mut set.slots);
        let removed = std::mem::take(&mut set.removed_while_emitting);
        slots.extend(added);
        slots.retain(|s| !removed.contains(&s.id));
        set.slots = slots;
        set.emitting = false;
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle returned by [`Listeners::subscribe`].
///
/// Dropping the handle keeps the listener registered.
pub struct Subscription {
    remove: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn unsubscribe(&mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }

    pub fn is_active(&self) -> bool {
        self.remove.is_some()
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Which direction of synchronization is currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDirection {
    Idle,
    /// Applying a location change to the filter.
    FromLocation,
    /// Serializing the filter for the location.
    ToLocation,
}

/// Coalesces UI-side changes and guards against overlapping sync directions.
#[derive(Debug)]
pub struct ChangeTracker {
    keys: [String; 2],
    direction: SyncDirection,
    seen_revision: u64,
    pending: bool,
    last_known: Option<QueryParameters>,
}

impl ChangeTracker {
    /// Track the two parameter keys a binder owns.
    pub fn new(configuration_key: impl Into<String>, condition_key: impl Into<String>) -> Self {
        Self {
            keys: [configuration_key.into(), condition_key.into()],
            direction: SyncDirection::Idle,
            seen_revision: 0,
            pending: false,
            last_known: None,
        }
    }

    pub fn set_keys(&mut self, configuration_key: impl Into<String>, condition_key: impl Into<String>) {
        self.keys = [configuration_key.into(), condition_key.into()];
        self.last_known = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Start a sync in `direction`. Fails if another one is running.
    pub fn begin(&mut self, direction: SyncDirection) -> Result<()> {
        if self.direction != SyncDirection::Idle {
            return Err(FilterError::IllegalState(format!(
                "cannot start {:?} while {:?} is in progress",
                direction, self.direction
            )));
        }
        self.direction = direction;
        Ok(())
    }

    pub fn end(&mut self) {
        self.direction = SyncDirection::Idle;
    }

    /// Record the filter's current revision; a new revision schedules an emission.
    pub fn observe(&mut self, revision: u64) {
        if revision != self.seen_revision {
            self.seen_revision = revision;
            self.pending = true;
        }
    }

    /// Treat `revision` as already emitted.
    pub fn baseline(&mut self, revision: u64) {
        self.seen_revision = revision;
    }

    /// Schedule an emission regardless of revision.
    pub fn mark_pending(&mut self) {
        self.pending = true;
    }

    /// Remember what the location currently says for our keys.
    pub fn acknowledge(&mut self, location: &QueryParameters) {
        self.last_known = Some(self.normalize(location));
    }

    /// Consume the pending flag. Returns `current` unless nothing is pending or
    /// it matches the last known location state.
    pub fn take_emission(&mut self, current: QueryParameters) -> Option<QueryParameters> {
        if !std::mem::take(&mut self.pending) {
            return None;
        }

        let normalized = self.normalize(&current);
        if self.last_known.as_ref() == Some(&normalized) {
            debug!("Query parameters unchanged, skipping emission");
            return None;
        }
        self.last_known = Some(normalized);
        Some(current)
    }

    fn normalize(&self, params: &QueryParameters) -> QueryParameters {
        self.keys
            .iter()
            .map(|k| (k.clone(), params.get(k).map(<[String]>::to_vec).unwrap_or_default()))
            .collect()
    }
}
