// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Domain items and the context they use to build their nodes.

use alloc::rc::Rc;
use core::ops::Range;

use crate::collection::ItemCollection;
use crate::node::{HeaderedNode, ListNode, ListShape, NodeBody};
use crate::tree::TreeCore;
use crate::types::{LayoutStyle, NodeFlags, NodeId, Orientation};
use crate::visual::BoxedVisual;

/// A domain item that knows how to present itself.
///
/// The tree never inspects an item's concrete kind: realization always goes
/// through [`Item::create_default_ui`].
pub trait Item {
    /// Build the node that represents this item.
    ///
    /// Implementations call exactly one constructor on `cx` and return its id.
    fn create_default_ui(&self, cx: RealizeCx<'_>) -> NodeId;

    /// Child items shown in the main list of a headered node.
    fn children(&self) -> Option<ItemCollection> {
        None
    }

    /// Child items shown in the secondary list of a headered node (for example an `else` branch).
    fn alternate_children(&self) -> Option<ItemCollection> {
        None
    }

    /// Range of source text this item was built from, if any.
    fn source_range(&self) -> Option<Range<usize>> {
        None
    }

    /// A copy of this item for drag-split, or `None` if the item cannot be copied.
    fn duplicate(&self) -> Option<ItemRef> {
        None
    }
}

/// Shared handle to a domain item. Identity is pointer identity.
pub type ItemRef = Rc<dyn Item>;

/// Parts of a list node.
pub struct ListParts {
    /// Axis along which children are concatenated.
    pub orientation: Orientation,
    /// Visual drawn behind the children while expanded.
    pub background: Option<BoxedVisual>,
    /// Visual occupying the leading drop margin while expanded.
    pub drop_indicator: Option<BoxedVisual>,
}

impl core::fmt::Debug for ListParts {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ListParts")
            .field("orientation", &self.orientation)
            .field("background", &self.background.is_some())
            .field("drop_indicator", &self.drop_indicator.is_some())
            .finish()
    }
}

impl ListParts {
    /// A bare list along `orientation`.
    pub fn new(orientation: Orientation) -> Self {
        Self {
            orientation,
            background: None,
            drop_indicator: None,
        }
    }

    /// Add a background visual.
    #[must_use]
    pub fn with_background(mut self, background: BoxedVisual) -> Self {
        self.background = Some(background);
        self
    }

    /// Add a drop-target indicator visual.
    #[must_use]
    pub fn with_drop_indicator(mut self, indicator: BoxedVisual) -> Self {
        self.drop_indicator = Some(indicator);
        self
    }
}

/// Parts of a headered node.
pub struct HeaderedParts {
    /// The statement-like visual shown on top.
    pub header: BoxedVisual,
    /// The expand/collapse affordance shown left of the header.
    pub toggle: BoxedVisual,
    /// The main list, bound to [`Item::children`] while expanded.
    pub list: ListParts,
    /// The secondary list, bound to [`Item::alternate_children`] while expanded.
    pub secondary: Option<ListParts>,
    /// Whether the node starts expanded.
    pub expanded: bool,
}

impl core::fmt::Debug for HeaderedParts {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HeaderedParts")
            .field("list", &self.list)
            .field("secondary", &self.secondary)
            .field("expanded", &self.expanded)
            .finish_non_exhaustive()
    }
}

/// Context handed to [`Item::create_default_ui`].
///
/// Each constructor consumes the context, so an item builds exactly one node.
/// The node is owned by `owner` and bound to the item being realized; the
/// caller links it into the owner's children.
pub struct RealizeCx<'a> {
    pub(crate) tree: &'a mut TreeCore,
    pub(crate) owner: Option<NodeId>,
    pub(crate) item: ItemRef,
}

impl core::fmt::Debug for RealizeCx<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RealizeCx")
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}

impl RealizeCx<'_> {
    /// Styling supplied by the host.
    pub fn style(&self) -> &LayoutStyle {
        self.tree.style()
    }

    /// The node that will own the new node.
    pub fn owner(&self) -> Option<NodeId> {
        self.owner
    }

    /// The item being realized.
    pub fn item(&self) -> &ItemRef {
        &self.item
    }

    /// Build a leaf wrapping `visual`.
    pub fn leaf(self, visual: BoxedVisual) -> NodeId {
        self.tree.insert_node(
            self.owner,
            Some(self.item),
            NodeBody::Leaf(visual),
            NodeFlags::FOCUSABLE,
        )
    }

    /// Build an expanded list mirroring `collection`.
    pub fn list(self, parts: ListParts, collection: Option<ItemCollection>) -> NodeId {
        self.expanded_list(parts, ListShape::Plain, collection, NodeFlags::empty())
    }

    /// Build an expanded list flanked by `front` and `back` bracket visuals.
    pub fn enclosed(
        self,
        front: BoxedVisual,
        back: BoxedVisual,
        parts: ListParts,
        collection: Option<ItemCollection>,
    ) -> NodeId {
        self.expanded_list(
            parts,
            ListShape::Enclosed { front, back },
            collection,
            NodeFlags::FOCUSABLE,
        )
    }

    /// Build an expanded list preceded by an `overlay` marker visual.
    pub fn overlay(
        self,
        overlay: BoxedVisual,
        parts: ListParts,
        collection: Option<ItemCollection>,
    ) -> NodeId {
        self.expanded_list(
            parts,
            ListShape::Overlay { overlay },
            collection,
            NodeFlags::FOCUSABLE,
        )
    }

    /// Build a headered node. If `parts.expanded`, its lists are realized immediately.
    pub fn headered(self, parts: HeaderedParts) -> NodeId {
        let tree = self.tree;
        let list = tree.insert_list(None, parts.list);
        let secondary = parts.secondary.map(|p| tree.insert_list(None, p));
        let id = tree.insert_node(
            self.owner,
            Some(self.item),
            NodeBody::Headered(HeaderedNode::new(parts.header, parts.toggle, list, secondary)),
            NodeFlags::FOCUSABLE,
        );
        tree.adopt(list, id);
        if let Some(secondary) = secondary {
            tree.adopt(secondary, id);
            tree.link_sub_list(list, secondary);
        }
        if parts.expanded {
            tree.toggle(id, true);
        }
        id
    }

    fn expanded_list(
        self,
        parts: ListParts,
        shape: ListShape,
        collection: Option<ItemCollection>,
        flags: NodeFlags,
    ) -> NodeId {
        let tree = self.tree;
        let id = tree.insert_node(
            self.owner,
            Some(self.item),
            NodeBody::List(ListNode::new(parts, shape)),
            flags,
        );
        tree.bind(id, collection);
        tree.set_expanded(id, true);
        id
    }
}
