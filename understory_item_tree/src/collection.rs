// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ordered, observable collections of domain items.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::item::ItemRef;

/// One structural edit of an [`ItemCollection`].
///
/// Indices refer to the collection state immediately before the edit, except
/// for `Insert`, whose index is the position of the new item afterwards.
#[derive(Clone)]
pub enum CollectionChange {
    /// `item` was inserted at `index`.
    Insert {
        /// Position of the new item.
        index: usize,
        /// The inserted item.
        item: ItemRef,
    },
    /// The item at `from` now lives at `to`.
    Move {
        /// Old position.
        from: usize,
        /// New position.
        to: usize,
    },
    /// The item at `index` was removed.
    Remove {
        /// Old position.
        index: usize,
    },
    /// The item at `index` was replaced by `item`.
    Replace {
        /// Position of the replaced item.
        index: usize,
        /// The new item.
        item: ItemRef,
    },
    /// The contents were replaced wholesale.
    Reset,
}

impl core::fmt::Debug for CollectionChange {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Insert { index, .. } => f.debug_struct("Insert").field("index", index).finish(),
            Self::Move { from, to } => f
                .debug_struct("Move")
                .field("from", from)
                .field("to", to)
                .finish(),
            Self::Remove { index } => f.debug_struct("Remove").field("index", index).finish(),
            Self::Replace { index, .. } => {
                f.debug_struct("Replace").field("index", index).finish()
            }
            Self::Reset => f.write_str("Reset"),
        }
    }
}

/// Receiver of structural-change notifications.
///
/// Sinks are called synchronously, after the collection has finished
/// mutating and released its internal borrow, so a sink may read the
/// collection it observes.
pub trait ChangeSink {
    /// Called once per mutation.
    fn notify(&self, change: &CollectionChange);
}

/// Handle returned by [`ItemCollection::subscribe`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct CollectionInner {
    items: Vec<ItemRef>,
    subscribers: HashMap<SubscriptionId, Rc<dyn ChangeSink>>,
    next_subscription: u64,
}

/// Shared, ordered sequence of items that reports every structural edit.
///
/// Cloning produces another handle to the same collection; use
/// [`ItemCollection::ptr_eq`] to compare identity.
#[derive(Clone)]
pub struct ItemCollection {
    inner: Rc<RefCell<CollectionInner>>,
}

impl core::fmt::Debug for ItemCollection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("ItemCollection")
            .field("len", &inner.items.len())
            .field("subscribers", &inner.subscribers.len())
            .finish_non_exhaustive()
    }
}

impl Default for ItemCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemCollection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::from_items(Vec::new())
    }

    /// Create a collection holding `items` in order.
    pub fn from_items(items: Vec<ItemRef>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(CollectionInner {
                items,
                subscribers: HashMap::new(),
                next_subscription: 0,
            })),
        }
    }

    /// Returns `true` if both handles refer to the same collection.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.inner.borrow().items.len()
    }

    /// Returns `true` if the collection holds no items.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The item at `index`, if any.
    pub fn get(&self, index: usize) -> Option<ItemRef> {
        self.inner.borrow().items.get(index).cloned()
    }

    /// Copy of the current item sequence.
    pub fn snapshot(&self) -> Vec<ItemRef> {
        self.inner.borrow().items.clone()
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    /// Register `sink` for change notifications.
    pub fn subscribe(&self, sink: Rc<dyn ChangeSink>) -> SubscriptionId {
        let mut inner = self.inner.borrow_mut();
        let id = SubscriptionId(inner.next_subscription);
        inner.next_subscription += 1;
        inner.subscribers.insert(id, sink);
        id
    }

    /// Remove a subscription. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.inner.borrow_mut().subscribers.remove(&id);
    }

    /// Insert `item` at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert(&self, index: usize, item: ItemRef) {
        self.inner.borrow_mut().items.insert(index, item.clone());
        self.emit(&CollectionChange::Insert { index, item });
    }

    /// Append `item`.
    pub fn push(&self, item: ItemRef) {
        let index = self.len();
        self.insert(index, item);
    }

    /// Remove and return the item at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn remove(&self, index: usize) -> ItemRef {
        let item = self.inner.borrow_mut().items.remove(index);
        self.emit(&CollectionChange::Remove { index });
        item
    }

    /// Move the item at `from` so that it ends up at `to`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    pub fn move_item(&self, from: usize, to: usize) {
        {
            let mut inner = self.inner.borrow_mut();
            let item = inner.items.remove(from);
            inner.items.insert(to, item);
        }
        self.emit(&CollectionChange::Move { from, to });
    }

    /// Replace the item at `index`, returning the old one.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn replace(&self, index: usize, item: ItemRef) -> ItemRef {
        let old = core::mem::replace(&mut self.inner.borrow_mut().items[index], item.clone());
        self.emit(&CollectionChange::Replace { index, item });
        old
    }

    /// Replace the whole contents.
    pub fn reset(&self, items: Vec<ItemRef>) {
        self.inner.borrow_mut().items = items;
        self.emit(&CollectionChange::Reset);
    }

    /// Remove every item.
    pub fn clear(&self) {
        self.reset(Vec::new());
    }

    fn emit(&self, change: &CollectionChange) {
        let sinks: SmallVec<[Rc<dyn ChangeSink>; 4]> =
            self.inner.borrow().subscribers.values().cloned().collect();
        for sink in sinks {
            sink.notify(change);
        }
    }
}
