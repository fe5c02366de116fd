#![forbid(unsafe_code)]

//! The external-facing entity being monitored.

use std::rc::Rc;

use allgreen_reactive::{StreamError, Subject};

/// Opaque comparable identity of an [`Item`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub u64);

impl ItemId {
    /// Create an ID from a raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct ItemInner {
    id: ItemId,
    state: Subject<bool>,
}

/// An entity with identity and a push-driven boolean state channel.
///
/// Cloning creates a new handle to the **same** item; equality is by
/// identity. The state channel is multicast and unbuffered: subscribers see
/// only emissions that happen after they attach.
pub struct Item {
    inner: Rc<ItemInner>,
}

impl Item {
    /// Create an item with the given identity. No state is emitted until
    /// [`set_active`](Item::set_active) is called.
    #[must_use]
    pub fn new(id: ItemId) -> Self {
        Self {
            inner: Rc::new(ItemInner {
                id,
                state: Subject::new(),
            }),
        }
    }

    /// This item's identity.
    #[must_use]
    pub fn id(&self) -> ItemId {
        self.inner.id
    }

    /// Push a new state value to every observer.
    pub fn set_active(&self, active: bool) {
        self.inner.state.emit(active);
    }

    /// Terminate this item's state channel with an error.
    pub fn fail(&self, error: StreamError) {
        self.inner.state.fail(error);
    }

    /// The item's state channel.
    #[must_use]
    pub fn state(&self) -> &Subject<bool> {
        &self.inner.state
    }
}

impl Clone for Item {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Item {}

impl std::fmt::Debug for Item {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Item").field("id", &self.inner.id).finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn identity_equality() {
        let a = Item::new(ItemId::new(1));
        let b = Item::new(ItemId::new(1));
        let c = Item::new(ItemId::new(2));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, a.clone());
        assert_eq!(a.id().raw(), 1);
    }

    #[test]
    fn set_active_reaches_observers() {
        let item = Item::new(ItemId::new(5));
        let seen = Rc::new(Cell::new(None));
        let seen_clone = Rc::clone(&seen);
        let _sub = item.state().subscribe(move |v| seen_clone.set(Some(*v)));

        item.set_active(true);
        assert_eq!(seen.get(), Some(true));
        item.set_active(false);
        assert_eq!(seen.get(), Some(false));
    }

    #[test]
    fn fail_terminates_channel() {
        let item = Item::new(ItemId::new(5));
        item.fail(StreamError::new("sensor offline"));
        assert!(item.state().is_terminated());
    }
}
