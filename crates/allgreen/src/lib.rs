#![forbid(unsafe_code)]

//! allgreen public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for users.

pub mod prelude {
    pub use allgreen_monitor as monitor;
    pub use allgreen_reactive as reactive;

    pub use allgreen_monitor::{AllActiveMonitor, Item, ItemId};
    pub use allgreen_reactive::{ObservableList, StreamError, Subscription};
}

pub use allgreen_monitor::{AllActiveMonitor, Item, ItemId, Snapshot, StateTracker};
pub use allgreen_reactive::{
    ListChange, ListError, Observable, ObservableList, ReadHandle, StreamError, StreamEvent,
    Subject, Subscription, SubscriptionSet,
};
