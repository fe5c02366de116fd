#![forbid(unsafe_code)]

//! Reactive "are all items active?" aggregation.
//!
//! This crate watches a dynamic [`ObservableList`] of [`Item`]s — each
//! carrying its own push-driven boolean state channel — and maintains a
//! single derived boolean: `true` iff the collection is non-empty and every
//! member's most recently observed state is active.
//!
//! # Architecture
//!
//! ```text
//! ObservableList<Item> ──membership──▶ CollectionProjector ──snapshots──▶ Aggregator
//!        Item.state ──emissions──▶ StateTracker ──pulses──▶      │
//!                                                                ▼
//!                                                    published Observable<bool>
//! ```
//!
//! - [`StateTracker`] wraps one item and memoizes its latest emitted state,
//!   synchronously, before the change pulse travels downstream.
//! - [`CollectionProjector`] mirrors the list into live trackers, emits an
//!   immutable [`Snapshot`] per membership change, and merges every
//!   tracker's emissions into one change-pulse channel.
//! - [`Aggregator`] is a combine-latest state machine over the snapshot and
//!   pulse channels: on either tick (once both have fired at least once) it
//!   recomputes the aggregate from scratch and publishes it.
//! - [`AllActiveMonitor`] wires the pipeline, owns every subscription, and
//!   is the single teardown surface.
//!
//! # Invariants
//!
//! 1. The set of live trackers is exactly the current list membership.
//! 2. A change pulse is never observed downstream before the memoized write
//!    it announces has completed.
//! 3. The aggregate is recomputed whole from the current snapshot, never
//!    patched incrementally.
//! 4. Teardown is exactly-once and idempotent; after it, item emissions are
//!    no longer observed anywhere in the pipeline.
//!
//! Everything is single-threaded (`Rc`/`RefCell` interior); hosts delivering
//! emissions from multiple threads must serialize them first.

pub mod aggregator;
pub mod item;
pub mod monitor;
pub mod projector;
pub mod tracker;

pub use aggregator::Aggregator;
pub use item::{Item, ItemId};
pub use monitor::AllActiveMonitor;
pub use projector::{CollectionProjector, Snapshot};
pub use tracker::StateTracker;

pub use allgreen_reactive::{
    ListChange, ListError, ObservableList, ReadHandle, StreamError, StreamEvent, Subscription,
};
