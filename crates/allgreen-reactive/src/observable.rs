#![forbid(unsafe_code)]

//! Shared, version-tracked values with change notification.
//!
//! # Design
//!
//! [`Observable<T>`] wraps a value in shared, reference-counted storage.
//! [`set()`](Observable::set) compares against the current value first:
//! writing an equal value is a no-op — no version bump, no notifications.
//! Otherwise the value is replaced, the version increments by one, and every
//! live subscriber observes the new value synchronously, in registration
//! order.
//!
//! [`ReadHandle<T>`] is the get-only view: it can read, sample the version,
//! and subscribe, but cannot write. Publishing a `ReadHandle` while keeping
//! the `Observable` private makes internal recomputation the sole writer.
//!
//! # Invariants
//!
//! 1. Version increments exactly once per mutation that changes the value.
//! 2. Subscribers are notified in registration order, after the write
//!    completes.
//! 3. Setting a value equal to the current value is a no-op.
//! 4. Dropping a [`Subscription`] removes the callback before the next
//!    notification cycle.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::subscription::Subscription;

type Callback<T> = dyn Fn(&T);

struct ObservableInner<T> {
    value: T,
    version: u64,
    subscribers: Vec<Weak<Callback<T>>>,
}

/// A shared value that notifies subscribers when it changes.
///
/// Cloning creates a new handle to the **same** value.
pub struct Observable<T> {
    inner: Rc<RefCell<ObservableInner<T>>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observable")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    /// Wrap an initial value. Version starts at 0.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ObservableInner {
                value,
                version: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Clone out the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Access the current value by reference without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Current version. Increments by 1 per value-changing write.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Replace the value and notify subscribers.
    ///
    /// If `value` equals the current value this is a no-op. The write
    /// completes before any subscriber runs; the interior borrow is released
    /// before callbacks are invoked, so a callback may read back freely.
    pub fn set(&self, value: T) {
        let live: Vec<Rc<Callback<T>>> = {
            let mut inner = self.inner.borrow_mut();
            if inner.value == value {
                return;
            }
            inner.value = value;
            inner.version += 1;
            inner.subscribers.retain(|weak| weak.strong_count() > 0);
            inner.subscribers.iter().filter_map(Weak::upgrade).collect()
        };
        let current = self.inner.borrow().value.clone();
        for callback in live {
            callback(&current);
        }
    }

    /// Register a change callback. The callback observes each new value
    /// after it has been written; it is not invoked with the current value
    /// at registration time.
    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> Subscription {
        let callback: Rc<Callback<T>> = Rc::new(f);
        self.inner
            .borrow_mut()
            .subscribers
            .push(Rc::downgrade(&callback));
        Subscription::holding(Box::new(callback))
    }

    /// A get-only view of this value.
    #[must_use]
    pub fn read_handle(&self) -> ReadHandle<T> {
        ReadHandle {
            observable: self.clone(),
        }
    }
}

/// Get-only view of an [`Observable`].
///
/// Readers can poll the current value, sample the version, and subscribe for
/// push updates, but only the owner of the underlying `Observable` can
/// write.
pub struct ReadHandle<T> {
    observable: Observable<T>,
}

impl<T> Clone for ReadHandle<T> {
    fn clone(&self) -> Self {
        Self {
            observable: self.observable.clone(),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ReadHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ReadHandle").field(&self.observable).finish()
    }
}

impl<T: Clone + PartialEq + 'static> ReadHandle<T> {
    /// Clone out the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.observable.get()
    }

    /// Access the current value by reference without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.observable.with(f)
    }

    /// Current version of the underlying value.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.observable.version()
    }

    /// Register a change callback on the underlying value.
    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> Subscription {
        self.observable.subscribe(f)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
