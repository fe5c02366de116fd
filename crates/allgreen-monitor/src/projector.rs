#![forbid(unsafe_code)]

//! Live projection of the item collection into state trackers.
//!
//! # Design
//!
//! [`CollectionProjector`] subscribes to an [`ObservableList`] of items and
//! keeps an explicit `ItemId → StateTracker` map in lockstep with it: on add
//! it attaches a tracker and stores the handle, on remove it looks the
//! handle up and releases its item subscription, on replace it does both as
//! a single update. No operator magic — the subscription-per-member
//! bookkeeping is all here.
//!
//! Two output channels:
//!
//! - **snapshots**: one immutable [`Snapshot`] of the full tracked set per
//!   membership change. A replace yields exactly one snapshot; downstream
//!   never observes a transient half-updated membership.
//! - **pulses**: a content-free `()` per emission of *any* tracked item,
//!   merged across the whole set. An item error terminates this channel,
//!   which is how upstream failure reaches the aggregator.
//!
//! Neither channel fires during construction. `prime()` emits the starting
//! snapshot followed by one synthetic pulse, so callers subscribe first and
//! prime second — the combine-latest consumer is then guaranteed a value
//! even for a collection that never changes again.
//!
//! # Invariants
//!
//! 1. Tracked set == current list membership, at every instant between
//!    callbacks.
//! 2. A removed member's tracker is released before the removal snapshot is
//!    emitted; an ex-member cannot pulse.
//! 3. Snapshot order follows list insertion order, with replaces in place.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use allgreen_reactive::{ListChange, ObservableList, StreamEvent, Subject, Subscription};

use crate::item::{Item, ItemId};
use crate::tracker::StateTracker;

/// Immutable view of all currently-tracked items at one instant.
///
/// Cloning is cheap (shared storage). A snapshot taken before a membership
/// change keeps its tracker handles, but released trackers inside it are
/// frozen at their last memoized value.
#[derive(Clone)]
pub struct Snapshot {
    trackers: Rc<[StateTracker]>,
}

impl Snapshot {
    fn capture(state: &ProjectorState) -> Self {
        let trackers: Vec<StateTracker> = state
            .order
            .iter()
            .map(|id| {
                state
                    .trackers
                    .get(id)
                    .expect("order entry always has a tracker")
                    .clone()
            })
            .collect();
        Self {
            trackers: trackers.into(),
        }
    }

    /// Number of tracked items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.trackers.len()
    }

    /// Whether no items are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }

    /// The tracked items, in membership order.
    #[must_use]
    pub fn trackers(&self) -> &[StateTracker] {
        &self.trackers
    }
}

impl std::fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for tracker in self.trackers.iter() {
            map.entry(&tracker.item_id(), &tracker.latest_value());
        }
        map.finish()
    }
}

struct ProjectorState {
    trackers: HashMap<ItemId, StateTracker>,
    /// Membership order for deterministic snapshots.
    order: Vec<ItemId>,
}

impl ProjectorState {
    fn insert(&mut self, tracker: StateTracker) {
        let id = tracker.item_id();
        self.order.push(id);
        self.trackers.insert(id, tracker);
    }

    fn remove(&mut self, id: ItemId) {
        if let Some(tracker) = self.trackers.remove(&id) {
            tracker.release();
        }
        self.order.retain(|candidate| *candidate != id);
    }

    fn replace(&mut self, old_id: ItemId, tracker: StateTracker) {
        if let Some(previous) = self.trackers.remove(&old_id) {
            previous.release();
        }
        let new_id = tracker.item_id();
        match self.order.iter().position(|candidate| *candidate == old_id) {
            Some(index) => self.order[index] = new_id,
            None => self.order.push(new_id),
        }
        self.trackers.insert(new_id, tracker);
    }
}

/// Maintains the live `ItemId → StateTracker` mapping and the two output
/// channels described in the module docs.
pub struct CollectionProjector {
    state: Rc<RefCell<ProjectorState>>,
    snapshots: Subject<Snapshot>,
    pulses: Subject<()>,
}

impl CollectionProjector {
    /// Mirror `list` into trackers and subscribe to its future mutations.
    ///
    /// Returns the projector and the collection-level subscription, which
    /// the caller (the lifecycle owner) keeps alive. Nothing is emitted
    /// until `prime()`.
    pub(crate) fn connect(list: &ObservableList<Item>) -> (Self, Subscription) {
        let pulses: Subject<()> = Subject::new();
        let snapshots: Subject<Snapshot> = Subject::new();

        let mut state = ProjectorState {
            trackers: HashMap::new(),
            order: Vec::new(),
        };
        for item in &list.snapshot() {
            state.insert(StateTracker::attach(item, merge_into(&pulses)));
        }
        let state = Rc::new(RefCell::new(state));

        let weak: Weak<RefCell<ProjectorState>> = Rc::downgrade(&state);
        let pulses_for_changes = pulses.clone();
        let snapshots_for_changes = snapshots.clone();
        let subscription = list.subscribe(move |change| {
            let Some(state) = weak.upgrade() else {
                return;
            };
            let snapshot = {
                let mut state = state.borrow_mut();
                match change {
                    ListChange::Added { item, .. } => {
                        state.insert(StateTracker::attach(item, merge_into(&pulses_for_changes)));
                    }
                    ListChange::Removed { item, .. } => {
                        state.remove(item.id());
                    }
                    ListChange::Replaced { old, new, .. } => {
                        state.replace(
                            old.id(),
                            StateTracker::attach(new, merge_into(&pulses_for_changes)),
                        );
                    }
                }
                Snapshot::capture(&state)
            };
            tracing::trace!(members = snapshot.len(), "membership snapshot");
            snapshots_for_changes.emit(snapshot);
        });

        (
            Self {
                state,
                snapshots,
                pulses,
            },
            subscription,
        )
    }

    /// Emit the starting snapshot (even if empty) followed by one synthetic
    /// change pulse.
    ///
    /// Called once, after downstream consumers have subscribed to both
    /// output channels.
    pub(crate) fn prime(&self) {
        let snapshot = Snapshot::capture(&self.state.borrow());
        tracing::trace!(members = snapshot.len(), "initial snapshot");
        self.snapshots.emit(snapshot);
        self.pulses.emit(());
    }

    /// The snapshot channel.
    #[must_use]
    pub fn snapshots(&self) -> &Subject<Snapshot> {
        &self.snapshots
    }

    /// The merged change-pulse channel.
    #[must_use]
    pub fn pulses(&self) -> &Subject<()> {
        &self.pulses
    }

    /// The tracked set as of now.
    #[must_use]
    pub fn current_snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.state.borrow())
    }

    /// Number of live trackers.
    #[must_use]
    pub fn tracker_count(&self) -> usize {
        self.state.borrow().trackers.len()
    }

    /// Release every live tracker's item subscription and forget them.
    /// Idempotent; part of monitor teardown.
    pub(crate) fn release_all(&self) {
        let mut state = self.state.borrow_mut();
        for tracker in state.trackers.values() {
            tracker.release();
        }
        state.trackers.clear();
        state.order.clear();
    }
}

/// Forward one tracked item's events into the shared pulse channel.
fn merge_into(pulses: &Subject<()>) -> impl Fn(&StreamEvent<bool>) + 'static {
    let pulses = pulses.clone();
    move |event| match event {
        StreamEvent::Next(_) => pulses.emit(()),
        StreamEvent::Error(error) => pulses.fail(error.clone()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
