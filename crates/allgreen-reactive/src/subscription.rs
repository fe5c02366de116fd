#![forbid(unsafe_code)]

//! Subscription guards and composite disposal.
//!
//! A [`Subscription`] keeps one registered callback alive. Publishers hold
//! only a `Weak` reference to the callback, so dropping the guard (or calling
//! [`Subscription::unsubscribe`]) is all it takes to stop receiving
//! notifications; the publisher prunes the dead entry lazily during its next
//! notification cycle.
//!
//! [`SubscriptionSet`] owns an arbitrary number of guards and releases them
//! together, exactly once.

use std::any::Any;

/// RAII guard for a registered callback.
///
/// While the guard is alive, the callback it anchors stays registered.
/// Dropping the guard releases the callback before the next notification
/// cycle.
pub struct Subscription {
    anchor: Option<Box<dyn Any>>,
}

impl Subscription {
    /// Build a guard anchoring the given callback storage.
    ///
    /// The anchor is typically the strong `Rc` of a callback whose publisher
    /// holds only the matching `Weak`.
    pub(crate) fn holding(anchor: Box<dyn Any>) -> Self {
        Self {
            anchor: Some(anchor),
        }
    }

    /// A guard that anchors nothing.
    ///
    /// Returned when subscribing to an already-terminated channel: there is
    /// nothing to deliver and nothing to release.
    #[must_use]
    pub fn inert() -> Self {
        Self { anchor: None }
    }

    /// Whether this guard still anchors a live callback.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.anchor.is_some()
    }

    /// Release the callback now instead of waiting for drop. Idempotent.
    pub fn unsubscribe(&mut self) {
        self.anchor = None;
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Owner of many subscriptions with synchronized, exactly-once teardown.
///
/// # Invariants
///
/// 1. [`dispose()`](SubscriptionSet::dispose) releases every held guard; a
///    second call is a no-op.
/// 2. A guard inserted after disposal is released immediately.
#[derive(Debug, Default)]
pub struct SubscriptionSet {
    guards: Vec<Subscription>,
    disposed: bool,
}

impl SubscriptionSet {
    /// An empty, not-yet-disposed set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a guard.
    ///
    /// If the set has already been disposed the guard is dropped (and thus
    /// released) on the spot.
    pub fn insert(&mut self, subscription: Subscription) {
        if self.disposed {
            drop(subscription);
        } else {
            self.guards.push(subscription);
        }
    }

    /// Number of guards currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.guards.len()
    }

    /// Whether the set holds no guards.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }

    /// Whether [`dispose()`](SubscriptionSet::dispose) has been called.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Release every held guard. Calling this twice is a no-op.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.guards.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn anchored() -> (Subscription, std::rc::Weak<()>) {
        let strong = Rc::new(());
        let weak = Rc::downgrade(&strong);
        (Subscription::holding(Box::new(strong)), weak)
    }

    #[test]
    fn drop_releases_anchor() {
        let (sub, weak) = anchored();
        assert!(weak.upgrade().is_some());
        drop(sub);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let (mut sub, weak) = anchored();
        assert!(sub.is_active());
        sub.unsubscribe();
        assert!(!sub.is_active());
        assert!(weak.upgrade().is_none());
        sub.unsubscribe();
        assert!(!sub.is_active());
    }

    #[test]
    fn inert_guard_is_inactive() {
        let sub = Subscription::inert();
        assert!(!sub.is_active());
    }

    #[test]
    fn set_dispose_releases_all() {
        let (a, weak_a) = anchored();
        let (b, weak_b) = anchored();
        let mut set = SubscriptionSet::new();
        set.insert(a);
        set.insert(b);
        assert_eq!(set.len(), 2);

        set.dispose();
        assert!(set.is_disposed());
        assert!(set.is_empty());
        assert!(weak_a.upgrade().is_none());
        assert!(weak_b.upgrade().is_none());
    }

    #[test]
    fn double_dispose_is_noop() {
        let mut set = SubscriptionSet::new();
        let (a, _weak) = anchored();
        set.insert(a);
        set.dispose();
        set.dispose();
        assert!(set.is_disposed());
    }

    #[test]
    fn insert_after_dispose_releases_immediately() {
        let mut set = SubscriptionSet::new();
        set.dispose();

        let (a, weak) = anchored();
        set.insert(a);
        assert!(set.is_empty());
        assert!(weak.upgrade().is_none());
    }
}
