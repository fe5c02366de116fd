#![forbid(unsafe_code)]

//! Single-threaded reactive primitives for allgreen.
//!
//! This crate provides the push-notification building blocks the monitor
//! crate composes:
//!
//! - [`Subject`]: A push-based multicast channel. Emissions fan out
//!   synchronously to registered callbacks; a terminal [`Subject::fail`]
//!   propagates an error to every subscriber and silences the channel.
//! - [`Subscription`]: RAII guard that automatically unsubscribes on drop.
//! - [`SubscriptionSet`]: A composite owner for many subscriptions with an
//!   idempotent, exactly-once [`SubscriptionSet::dispose`].
//! - [`Observable`]: A shared, version-tracked value wrapper with change
//!   notification via subscriber callbacks, and [`ReadHandle`], its get-only
//!   view.
//! - [`ObservableList`]: A mutable collection that notifies subscribers of
//!   every add/remove/replace and supports on-demand snapshots.
//!
//! # Architecture
//!
//! Everything here uses `Rc<RefCell<..>>` for single-threaded shared
//! ownership. Subscribers are stored as `Weak` function pointers and cleaned
//! up lazily during notification. Nothing in this crate is `Send` or `Sync`;
//! hosts that receive events on multiple threads must serialize delivery
//! before it reaches these types.
//!
//! # Invariants
//!
//! 1. Notification is synchronous: by the time `emit`/`set` returns, every
//!    live subscriber has observed the event.
//! 2. Subscribers are notified in registration order.
//! 3. Setting an [`Observable`] to a value equal to the current value is a
//!    no-op (no version bump, no notifications).
//! 4. Dropping a [`Subscription`] removes the callback before the next
//!    notification cycle.
//! 5. A failed [`Subject`] never delivers another value to anyone.

pub mod list;
pub mod observable;
pub mod subject;
pub mod subscription;

pub use list::{ListChange, ListError, ObservableList};
pub use observable::{Observable, ReadHandle};
pub use subject::{StreamError, StreamEvent, Subject};
pub use subscription::{Subscription, SubscriptionSet};
