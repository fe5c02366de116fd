#![forbid(unsafe_code)]

//! Combine-latest recomputation of the aggregate signal.
//!
//! # Design
//!
//! The aggregator is a small explicit state machine, not an operator: it
//! caches the latest [`Snapshot`] from one input channel and a "pulse seen"
//! flag from the other. A tick on *either* channel triggers recomputation
//! against the cached value of the other side — but never before both sides
//! have fired at least once. The projector's synthetic initial pulse
//! satisfies the pulse side even for a collection that never changes.
//!
//! The aggregate is always recomputed whole: non-empty AND every tracker's
//! memoized state is `Some(true)`. An item that has not emitted yet counts
//! as not-active. The result lands in a private [`Observable<bool>`] whose
//! equal-value writes are no-ops, so watchers observe each boolean
//! transition exactly once; external readers get a [`ReadHandle`].
//!
//! # Failure
//!
//! An error event on either input latches the aggregator into a terminal
//! failed state: the error is recorded, recomputation stops, and the
//! published value stays frozen at its last state. Fail-fast, no retry.

use std::cell::RefCell;
use std::rc::Rc;

use allgreen_reactive::{Observable, ReadHandle, StreamError, StreamEvent, Subscription};

use crate::projector::{CollectionProjector, Snapshot};

/// `true` iff `snapshot` is non-empty and every tracked item's latest
/// observed state is active.
#[must_use]
pub fn evaluate(snapshot: &Snapshot) -> bool {
    !snapshot.is_empty()
        && snapshot
            .trackers()
            .iter()
            .all(|tracker| tracker.latest_value() == Some(true))
}

struct AggregatorState {
    last_snapshot: Option<Snapshot>,
    pulse_seen: bool,
    failure: Option<StreamError>,
}

/// Combine-latest state machine publishing the aggregate signal.
pub struct Aggregator {
    state: Rc<RefCell<AggregatorState>>,
    published: Observable<bool>,
}

impl Aggregator {
    /// Subscribe to the projector's output channels.
    ///
    /// Returns the aggregator and its two input subscriptions, which the
    /// caller (the lifecycle owner) keeps alive. The published value starts
    /// `false` and first recomputes when the projector is primed.
    pub(crate) fn connect(projector: &CollectionProjector) -> (Self, Vec<Subscription>) {
        let published = Observable::new(false);
        let state = Rc::new(RefCell::new(AggregatorState {
            last_snapshot: None,
            pulse_seen: false,
            failure: None,
        }));

        let state_for_snapshots = Rc::clone(&state);
        let published_for_snapshots = published.clone();
        let snapshot_sub = projector.snapshots().subscribe_events(move |event| {
            match event {
                StreamEvent::Next(snapshot) => {
                    let ready = {
                        let mut state = state_for_snapshots.borrow_mut();
                        state.last_snapshot = Some(snapshot.clone());
                        state.failure.is_none() && state.pulse_seen
                    };
                    if ready {
                        recompute(&state_for_snapshots, &published_for_snapshots);
                    }
                }
                StreamEvent::Error(error) => latch_failure(&state_for_snapshots, error),
            }
        });

        let state_for_pulses = Rc::clone(&state);
        let published_for_pulses = published.clone();
        let pulse_sub = projector.pulses().subscribe_events(move |event| match event {
            StreamEvent::Next(()) => {
                let ready = {
                    let mut state = state_for_pulses.borrow_mut();
                    state.pulse_seen = true;
                    state.failure.is_none() && state.last_snapshot.is_some()
                };
                if ready {
                    recompute(&state_for_pulses, &published_for_pulses);
                }
            }
            StreamEvent::Error(error) => latch_failure(&state_for_pulses, error),
        });

        (Self { state, published }, vec![snapshot_sub, pulse_sub])
    }

    /// The current aggregate value.
    #[must_use]
    pub fn value(&self) -> bool {
        self.published.get()
    }

    /// Get-only handle to the published aggregate: poll it synchronously or
    /// subscribe for push updates.
    #[must_use]
    pub fn published(&self) -> ReadHandle<bool> {
        self.published.read_handle()
    }

    /// The latched upstream failure, if any.
    #[must_use]
    pub fn failure(&self) -> Option<StreamError> {
        self.state.borrow().failure.clone()
    }

    /// Whether an upstream failure has stopped recomputation.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.state.borrow().failure.is_some()
    }
}

impl std::fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Aggregator")
            .field("value", &self.published.get())
            .field("pulse_seen", &state.pulse_seen)
            .field("has_snapshot", &state.last_snapshot.is_some())
            .field("failure", &state.failure)
            .finish()
    }
}

/// Recompute from the cached snapshot and publish.
///
/// The state borrow is dropped before the write so that watchers may read
/// the aggregator back from their callbacks.
fn recompute(state: &Rc<RefCell<AggregatorState>>, published: &Observable<bool>) {
    let value = {
        let state = state.borrow();
        let Some(snapshot) = state.last_snapshot.as_ref() else {
            return;
        };
        evaluate(snapshot)
    };
    tracing::trace!(value, "aggregate recomputed");
    published.set(value);
}

fn latch_failure(state: &Rc<RefCell<AggregatorState>>, error: &StreamError) {
    let mut state = state.borrow_mut();
    if state.failure.is_none() {
        tracing::debug!(error = %error, "aggregate pipeline failed");
        state.failure = Some(error.clone());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
