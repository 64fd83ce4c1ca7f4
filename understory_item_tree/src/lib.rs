// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Item Tree: an incrementally synchronized layout tree for nested item editors.
//!
//! Understory Item Tree is the layout core of block- and flow-style visual program editors.
//!
//! - Realizes one node per domain item, lazily: lists build their children when expanded and release them when collapsed.
//! - Mirrors [`ItemCollection`] edits (insert, move, remove, replace, reset) without rebuilding untouched siblings.
//! - Computes sizes and rectangles with a two-pass [`ItemTree::measure`] / [`ItemTree::arrange`] over orientation-aware lists.
//! - Assigns a stacking order in which every node sits above its owner.
//! - Walks realized nodes for directional focus navigation.
//!
//! ## Not a renderer
//!
//! The tree never paints. Host-supplied [`Visual`]s are asked for a desired size,
//! handed a final rectangle and z index, and detached exactly once when their
//! node is released. Drawing, hit testing and gestures belong to the host.
//!
//! ## Node kinds
//!
//! - Leaf: one visual bound to one item.
//! - List: an ordered, oriented sequence of children bound to a collection, with an
//!   optional background and drop indicator.
//! - Enclosed: a list flanked by front and back bracket visuals.
//! - Overlay: a list preceded by a marker visual.
//! - Headered: a header and toggle above a main list and an optional secondary list,
//!   whose expansion mirrors the main one.
//!
//! Items pick their own node kind in [`Item::create_default_ui`]; the tree never
//! switches on item type.
//!
//! ## Change delivery
//!
//! Collections notify the tree synchronously, and the tree applies each edit
//! before the mutating call returns: an expanded list's children are always
//! index-aligned with its collection. Only layout is deferred. An edit raises
//! [`ItemTree::take_layout_request`], so a burst of edits costs a single
//! layout pass. Collapsed lists are unsubscribed and see no edits.
//!
//! ## Example
//!
//! ```rust
//! use kurbo::{Rect, Size};
//! use understory_item_tree::{
//!     Item, ItemCollection, ItemTree, LayoutStyle, ListParts, NodeId, Orientation, RealizeCx,
//!     Visual,
//! };
//! use std::rc::Rc;
//!
//! struct Label(Size);
//!
//! impl Visual for Label {
//!     fn measure(&mut self, _available: Size) {}
//!     fn desired_size(&self) -> Size {
//!         self.0
//!     }
//!     fn arrange(&mut self, _rect: Rect) {}
//! }
//!
//! struct Statement(f64);
//!
//! impl Item for Statement {
//!     fn create_default_ui(&self, cx: RealizeCx<'_>) -> NodeId {
//!         cx.leaf(Box::new(Label(Size::new(80.0, self.0))))
//!     }
//! }
//!
//! let program = ItemCollection::new();
//! program.push(Rc::new(Statement(10.0)));
//! program.push(Rc::new(Statement(20.0)));
//!
//! let mut tree = ItemTree::new(LayoutStyle::ZERO);
//! let root = tree.insert_list(None, ListParts::new(Orientation::Vertical));
//! tree.bind(root, Some(program.clone()));
//! tree.set_expanded(root, true);
//! assert_eq!(tree.layout(root, Size::new(400.0, f64::INFINITY)).height, 30.0);
//!
//! // Edits reach the tree as they happen.
//! program.insert(0, Rc::new(Statement(5.0)));
//! assert_eq!(tree.children_of(root).len(), 3);
//! assert!(tree.take_layout_request());
//! assert_eq!(tree.layout(root, Size::new(400.0, f64::INFINITY)).height, 35.0);
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod collection;
mod error;
mod focus;
mod item;
mod measure;
mod node;
mod tree;
mod types;
mod visual;

#[cfg(test)]
mod test_support;

pub use collection::{ChangeSink, CollectionChange, ItemCollection, SubscriptionId};
pub use error::LayoutError;
pub use focus::Navigation;
pub use item::{HeaderedParts, Item, ItemRef, ListParts, RealizeCx};
pub use tree::ItemTree;
pub use types::{LayoutStyle, NodeFlags, NodeId, NodeKind, Orientation};
pub use visual::{BoxedVisual, Visual};
