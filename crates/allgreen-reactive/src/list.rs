#![forbid(unsafe_code)]

//! A mutable collection that notifies subscribers of every mutation.
//!
//! # Design
//!
//! [`ObservableList<T>`] is the collaborator boundary between external code
//! that owns collection membership and reactive consumers that mirror it.
//! Each successful `insert`/`remove`/`replace` emits one [`ListChange`]
//! carrying the pre-mutation and post-mutation elements, after the mutation
//! has been applied. [`snapshot()`](ObservableList::snapshot) clones the
//! current contents on demand.
//!
//! Protocol violations are rejected here, not absorbed downstream: inserting
//! an element already present or removing/replacing an absent one returns a
//! [`ListError`]. Consumers may therefore assume every change event is valid.
//!
//! # Invariants
//!
//! 1. Elements are unique (by `PartialEq`) at all times.
//! 2. A change event is observed only after the mutation it describes has
//!    been applied; `snapshot()` from inside a callback sees the new state.
//! 3. Exactly one event per successful mutation; a replace is one event,
//!    never a remove followed by an add.

use std::cell::RefCell;
use std::rc::Rc;

use thiserror::Error;

use crate::subject::Subject;
use crate::subscription::Subscription;

/// Rejected mutation on an [`ObservableList`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListError {
    /// The inserted (or replacement) element is already present.
    #[error("item is already present in the list")]
    DuplicateItem,
    /// The element to remove or replace is not present.
    #[error("item is not present in the list")]
    ItemNotFound,
}

/// One applied mutation, carrying the affected elements.
#[derive(Debug, Clone, PartialEq)]
pub enum ListChange<T> {
    /// `item` was inserted at `index`.
    Added { index: usize, item: T },
    /// `item` was removed from `index`.
    Removed { index: usize, item: T },
    /// `old` at `index` was swapped for `new` as a single mutation.
    Replaced { index: usize, old: T, new: T },
}

/// A mutable, observable collection with unique elements.
///
/// Cloning creates a new handle to the **same** list.
pub struct ObservableList<T> {
    items: Rc<RefCell<Vec<T>>>,
    changes: Subject<ListChange<T>>,
}

impl<T> Clone for ObservableList<T> {
    fn clone(&self) -> Self {
        Self {
            items: Rc::clone(&self.items),
            changes: self.changes.clone(),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ObservableList<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservableList")
            .field("items", &*self.items.borrow())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Default for ObservableList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + PartialEq + 'static> ObservableList<T> {
    /// An empty list.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Rc::new(RefCell::new(Vec::new())),
            changes: Subject::new(),
        }
    }

    /// Append an element.
    ///
    /// # Errors
    ///
    /// [`ListError::DuplicateItem`] if an equal element is already present.
    pub fn insert(&self, item: T) -> Result<(), ListError> {
        let index = {
            let mut items = self.items.borrow_mut();
            if items.contains(&item) {
                return Err(ListError::DuplicateItem);
            }
            items.push(item.clone());
            items.len() - 1
        };
        self.changes.emit(ListChange::Added { index, item });
        Ok(())
    }

    /// Remove the element equal to `item`.
    ///
    /// # Errors
    ///
    /// [`ListError::ItemNotFound`] if no equal element is present.
    pub fn remove(&self, item: &T) -> Result<(), ListError> {
        let (index, removed) = {
            let mut items = self.items.borrow_mut();
            let index = items
                .iter()
                .position(|candidate| candidate == item)
                .ok_or(ListError::ItemNotFound)?;
            (index, items.remove(index))
        };
        self.changes.emit(ListChange::Removed {
            index,
            item: removed,
        });
        Ok(())
    }

    /// Swap the element equal to `old` for `new`, in place, as one mutation.
    ///
    /// # Errors
    ///
    /// [`ListError::ItemNotFound`] if `old` is absent;
    /// [`ListError::DuplicateItem`] if `new` is already present elsewhere.
    pub fn replace(&self, old: &T, new: T) -> Result<(), ListError> {
        let (index, previous) = {
            let mut items = self.items.borrow_mut();
            let index = items
                .iter()
                .position(|candidate| candidate == old)
                .ok_or(ListError::ItemNotFound)?;
            if new != items[index] && items.contains(&new) {
                return Err(ListError::DuplicateItem);
            }
            (index, std::mem::replace(&mut items[index], new.clone()))
        };
        self.changes.emit(ListChange::Replaced {
            index,
            old: previous,
            new,
        });
        Ok(())
    }

    /// Whether an equal element is present.
    #[must_use]
    pub fn contains(&self, item: &T) -> bool {
        self.items.borrow().contains(item)
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    /// Clone out the current contents.
    #[must_use]
    pub fn snapshot(&self) -> Vec<T> {
        self.items.borrow().clone()
    }

    /// Register a callback for applied mutations.
    pub fn subscribe(&self, f: impl Fn(&ListChange<T>) + 'static) -> Subscription {
        self.changes.subscribe(f)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
