#![forbid(unsafe_code)]

//! Push-based multicast channels.
//!
//! # Design
//!
//! [`Subject<T>`] holds a set of registered callbacks in shared,
//! reference-counted storage and invokes them synchronously on every
//! [`emit()`](Subject::emit). There is no buffering: a subscriber registered
//! after an emission never sees it. Cloning a `Subject` creates a new handle
//! to the **same** channel.
//!
//! A channel can terminate exactly once via [`fail()`](Subject::fail). The
//! terminal error is delivered to every live subscriber as
//! [`StreamEvent::Error`]; afterwards the channel is silent forever — further
//! emissions are ignored and new subscriptions are inert.
//!
//! # Invariants
//!
//! 1. Delivery is synchronous: `emit()` returns only after every live
//!    subscriber ran.
//! 2. Subscribers run in registration order.
//! 3. A dropped [`Subscription`] never receives another event.
//! 4. After `fail()`, no subscriber ever receives another `Next`.
//!
//! # Failure Modes
//!
//! - **Emission from inside a callback**: The callback list is snapshotted
//!   before invocation, so re-entrant `emit`/`subscribe` calls do not
//!   deadlock on an interior borrow. A subscriber added during a
//!   notification cycle joins from the next cycle.
//! - **Subscription dropped during a cycle**: The snapshot keeps the
//!   callback alive for the remainder of the current cycle; it is gone
//!   before the next one.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use thiserror::Error;

use crate::subscription::Subscription;

/// Terminal failure carried by a [`Subject`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("stream failed: {message}")]
pub struct StreamError {
    message: String,
}

impl StreamError {
    /// Build a terminal error with the given description.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The failure description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// One delivery on a [`Subject`]: either a value or the terminal error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent<T> {
    /// A pushed value.
    Next(T),
    /// The channel terminated abnormally. Always the last event delivered.
    Error(StreamError),
}

type Callback<T> = dyn Fn(&StreamEvent<T>);

struct SubjectInner<T> {
    /// Registered callbacks, weakly held; pruned lazily during notification.
    subscribers: Vec<Weak<Callback<T>>>,
    /// Set exactly once by `fail()`.
    terminated: Option<StreamError>,
}

/// A push-based multicast channel.
pub struct Subject<T> {
    inner: Rc<RefCell<SubjectInner<T>>>,
}

impl<T> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: 'static> Default for Subject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Subject<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Subject")
            .field("subscribers", &inner.subscribers.len())
            .field("terminated", &inner.terminated)
            .finish()
    }
}

impl<T: 'static> Subject<T> {
    /// An open channel with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(SubjectInner {
                subscribers: Vec::new(),
                terminated: None,
            })),
        }
    }

    /// Push a value to every live subscriber.
    ///
    /// Ignored if the channel has terminated.
    pub fn emit(&self, value: T) {
        if self.inner.borrow().terminated.is_some() {
            return;
        }
        self.dispatch(&StreamEvent::Next(value));
    }

    /// Terminate the channel with an error.
    ///
    /// Every live subscriber receives [`StreamEvent::Error`] once; the first
    /// error wins and later calls are no-ops.
    pub fn fail(&self, error: StreamError) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.terminated.is_some() {
                return;
            }
            inner.terminated = Some(error.clone());
        }
        self.dispatch(&StreamEvent::Error(error));
    }

    /// Whether [`fail()`](Subject::fail) has been called.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.inner.borrow().terminated.is_some()
    }

    /// The terminal error, if the channel has failed.
    #[must_use]
    pub fn error(&self) -> Option<StreamError> {
        self.inner.borrow().terminated.clone()
    }

    /// Register a callback for pushed values only.
    ///
    /// The terminal error, if any, is not observed. Subscribing to a
    /// terminated channel returns an inert guard.
    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> Subscription {
        self.subscribe_events(move |event| {
            if let StreamEvent::Next(value) = event {
                f(value);
            }
        })
    }

    /// Register a callback for every delivery, values and terminal error
    /// alike.
    pub fn subscribe_events(&self, f: impl Fn(&StreamEvent<T>) + 'static) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        if inner.terminated.is_some() {
            return Subscription::inert();
        }
        let callback: Rc<Callback<T>> = Rc::new(f);
        inner.subscribers.push(Rc::downgrade(&callback));
        Subscription::holding(Box::new(callback))
    }

    /// Number of live subscribers (prunes dead entries first).
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        let mut inner = self.inner.borrow_mut();
        inner.subscribers.retain(|weak| weak.strong_count() > 0);
        inner.subscribers.len()
    }

    /// Deliver one event to a snapshot of the live callbacks.
    ///
    /// The interior borrow is released before any callback runs, so
    /// callbacks may freely emit or subscribe.
    fn dispatch(&self, event: &StreamEvent<T>) {
        let live: Vec<Rc<Callback<T>>> = {
            let mut inner = self.inner.borrow_mut();
            inner.subscribers.retain(|weak| weak.strong_count() > 0);
            inner.subscribers.iter().filter_map(Weak::upgrade).collect()
        };
        for callback in live {
            callback(event);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
