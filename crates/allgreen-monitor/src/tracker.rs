#![forbid(unsafe_code)]

//! Per-item state memoization.
//!
//! # Design
//!
//! A [`StateTracker`] owns one subscription to its item's state channel. The
//! subscription callback does two things, strictly in order: it records the
//! emitted value as `latest_value`, then forwards the event to the merger
//! supplied at attach time. Anything the forward triggers downstream (such
//! as an aggregate recomputation) therefore already sees the fresh value.
//!
//! The tracker is the sole writer of its memoized slot. `release()`
//! (crate-internal) drops the item subscription; a released tracker never
//! observes nor forwards another emission. Old snapshots may still hold the
//! handle afterwards — they read the last memoized value, frozen.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use allgreen_reactive::{StreamEvent, Subscription};

use crate::item::{Item, ItemId};

struct TrackerInner {
    item_id: ItemId,
    /// Most recently observed state; `None` until the item first emits.
    latest: Cell<Option<bool>>,
    /// The item subscription. Taken on release.
    subscription: RefCell<Option<Subscription>>,
}

/// Memoizing wrapper around one [`Item`]'s state channel.
///
/// Cloning creates a new handle to the **same** tracker.
pub struct StateTracker {
    inner: Rc<TrackerInner>,
}

impl Clone for StateTracker {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl std::fmt::Debug for StateTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateTracker")
            .field("item_id", &self.inner.item_id)
            .field("latest", &self.inner.latest.get())
            .field("released", &!self.is_attached())
            .finish()
    }
}

impl StateTracker {
    /// Subscribe to `item`'s state channel, memoizing every value before
    /// handing the event to `forward`.
    pub(crate) fn attach(
        item: &Item,
        forward: impl Fn(&StreamEvent<bool>) + 'static,
    ) -> Self {
        let inner = Rc::new(TrackerInner {
            item_id: item.id(),
            latest: Cell::new(None),
            subscription: RefCell::new(None),
        });

        let weak = Rc::downgrade(&inner);
        let subscription = item.state().subscribe_events(move |event| {
            // Memoize first: the forwarded pulse must find the slot fresh.
            if let StreamEvent::Next(value) = event {
                if let Some(strong) = weak.upgrade() {
                    strong.latest.set(Some(*value));
                }
            }
            forward(event);
        });
        inner.subscription.borrow_mut().replace(subscription);
        tracing::trace!(item = %item.id(), "tracker attached");

        Self { inner }
    }

    /// Identity of the wrapped item.
    #[must_use]
    pub fn item_id(&self) -> ItemId {
        self.inner.item_id
    }

    /// Most recently observed state, or `None` if the item has not emitted
    /// since this tracker attached.
    #[must_use]
    pub fn latest_value(&self) -> Option<bool> {
        self.inner.latest.get()
    }

    /// Whether the item subscription is still held.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.inner.subscription.borrow().is_some()
    }

    /// Drop the item subscription. Idempotent; the memoized value stays
    /// readable but will never change again.
    pub(crate) fn release(&self) {
        if self.inner.subscription.borrow_mut().take().is_some() {
            tracing::trace!(item = %self.inner.item_id, "tracker released");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
