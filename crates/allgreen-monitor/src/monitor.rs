#![forbid(unsafe_code)]

//! Pipeline wiring and lifecycle ownership.
//!
//! [`AllActiveMonitor`] is the public entry point: it connects the projector
//! and aggregator to a collection, primes the pipeline, and owns every
//! subscription created along the way — the collection-level one, each live
//! tracker's (transitively through the projector), and the aggregator's
//! inputs. [`dispose()`](AllActiveMonitor::dispose) releases all of them
//! exactly once; afterwards no item emission or membership change can reach
//! the published value.

use std::cell::{Cell, RefCell};

use allgreen_reactive::{
    ObservableList, ReadHandle, StreamError, Subscription, SubscriptionSet,
};

use crate::aggregator::Aggregator;
use crate::item::Item;
use crate::projector::{CollectionProjector, Snapshot};

/// Watches a collection of items and publishes "are all of them active?".
///
/// The published value is `false` until every current member has emitted an
/// active state at least once and most recently; an empty collection is
/// `false`. The monitor publishes an initial value at construction time, so
/// a consumer created over a never-mutating collection still reads a
/// definite aggregate.
pub struct AllActiveMonitor {
    projector: CollectionProjector,
    aggregator: Aggregator,
    subscriptions: RefCell<SubscriptionSet>,
    disposed: Cell<bool>,
}

impl AllActiveMonitor {
    /// Wire the pipeline over `list` and publish the starting aggregate.
    #[must_use]
    pub fn new(list: &ObservableList<Item>) -> Self {
        let mut subscriptions = SubscriptionSet::new();

        let (projector, list_subscription) = CollectionProjector::connect(list);
        subscriptions.insert(list_subscription);

        let (aggregator, input_subscriptions) = Aggregator::connect(&projector);
        for subscription in input_subscriptions {
            subscriptions.insert(subscription);
        }

        // Consumers above are attached; replaying the starting membership
        // now primes the combine-latest pair.
        projector.prime();
        tracing::debug!(
            members = projector.tracker_count(),
            all_active = aggregator.value(),
            "monitor attached"
        );

        Self {
            projector,
            aggregator,
            subscriptions: RefCell::new(subscriptions),
            disposed: Cell::new(false),
        }
    }

    /// The current aggregate value, read in place.
    #[must_use]
    pub fn all_active(&self) -> bool {
        self.aggregator.value()
    }

    /// Get-only handle to the published aggregate for consumers that
    /// persist across time or sample once.
    #[must_use]
    pub fn published(&self) -> ReadHandle<bool> {
        self.aggregator.published()
    }

    /// Subscribe for push updates. The callback observes each aggregate
    /// transition; it is not invoked with the current value at registration
    /// time — poll [`all_active()`](AllActiveMonitor::all_active) for that.
    pub fn watch(&self, f: impl Fn(&bool) + 'static) -> Subscription {
        self.aggregator.published().subscribe(f)
    }

    /// The tracked membership as of now.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.projector.current_snapshot()
    }

    /// The latched upstream failure, if an item's state channel terminated
    /// abnormally. The aggregate stops updating once this is set.
    #[must_use]
    pub fn failure(&self) -> Option<StreamError> {
        self.aggregator.failure()
    }

    /// Whether [`dispose()`](AllActiveMonitor::dispose) has run.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    /// Tear the pipeline down: release the collection subscription, every
    /// tracker subscription, and the aggregator inputs.
    ///
    /// Idempotent. After the first call the published value is frozen; item
    /// emissions and collection mutations are no longer observed.
    pub fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        self.subscriptions.borrow_mut().dispose();
        self.projector.release_all();
        tracing::debug!("monitor disposed");
    }
}

impl Drop for AllActiveMonitor {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for AllActiveMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AllActiveMonitor")
            .field("all_active", &self.all_active())
            .field("members", &self.projector.tracker_count())
            .field("failure", &self.failure())
            .field("disposed", &self.disposed.get())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemId;

    fn item(id: u64) -> Item {
        Item::new(ItemId::new(id))
    }

    #[test]
    fn publishes_initial_false_for_empty_collection() {
        let list: ObservableList<Item> = ObservableList::new();
        let monitor = AllActiveMonitor::new(&list);
        assert!(!monitor.all_active());
        assert!(monitor.failure().is_none());
    }

    #[test]
    fn tracks_starting_membership() {
        let list = ObservableList::new();
        let a = item(1);
        list.insert(a.clone()).unwrap();
        let monitor = AllActiveMonitor::new(&list);

        assert_eq!(monitor.snapshot().len(), 1);
        assert!(!monitor.all_active());
        a.set_active(true);
        assert!(monitor.all_active());
    }

    #[test]
    fn dispose_freezes_everything() {
        let list = ObservableList::new();
        let a = item(1);
        list.insert(a.clone()).unwrap();
        let monitor = AllActiveMonitor::new(&list);
        a.set_active(true);
        assert!(monitor.all_active());

        monitor.dispose();
        assert!(monitor.is_disposed());

        a.set_active(false);
        assert!(monitor.all_active());

        list.insert(item(2)).unwrap();
        assert!(monitor.all_active());
    }

    #[test]
    fn dispose_is_idempotent() {
        let list: ObservableList<Item> = ObservableList::new();
        let monitor = AllActiveMonitor::new(&list);
        monitor.dispose();
        monitor.dispose();
        assert!(monitor.is_disposed());
    }

    #[test]
    fn drop_disposes() {
        let list = ObservableList::new();
        let a = item(1);
        list.insert(a.clone()).unwrap();
        {
            let _monitor = AllActiveMonitor::new(&list);
        }
        // The item's channel has no remaining observers.
        assert_eq!(a.state().subscriber_count(), 0);
    }
}
