// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node storage: the closed set of node variants kept in the arena.

use alloc::vec::Vec;
use kurbo::{Rect, Size};

use crate::collection::{ItemCollection, SubscriptionId};
use crate::item::{ItemRef, ListParts};
use crate::types::{NodeFlags, NodeId, NodeKind, Orientation};
use crate::visual::BoxedVisual;

pub(crate) struct Node {
    pub(crate) generation: u32,
    /// Non-owning back-reference. Owning edges are list children and headered list slots.
    pub(crate) owner: Option<NodeId>,
    pub(crate) item: Option<ItemRef>,
    pub(crate) z_index: i32,
    pub(crate) size: Size,
    pub(crate) rect: Rect,
    pub(crate) flags: NodeFlags,
    pub(crate) body: NodeBody,
}

impl Node {
    pub(crate) fn new(
        generation: u32,
        owner: Option<NodeId>,
        item: Option<ItemRef>,
        z_index: i32,
        body: NodeBody,
        flags: NodeFlags,
    ) -> Self {
        Self {
            generation,
            owner,
            item,
            z_index,
            size: Size::ZERO,
            rect: Rect::ZERO,
            flags,
            body,
        }
    }
}

pub(crate) enum NodeBody {
    Leaf(BoxedVisual),
    List(ListNode),
    Headered(HeaderedNode),
}

impl NodeBody {
    pub(crate) fn kind(&self) -> NodeKind {
        match self {
            Self::Leaf(_) => NodeKind::Leaf,
            Self::List(list) => match list.shape {
                ListShape::Plain => NodeKind::List,
                ListShape::Enclosed { .. } => NodeKind::Enclosed,
                ListShape::Overlay { .. } => NodeKind::Overlay,
            },
            Self::Headered(_) => NodeKind::Headered,
        }
    }
}

/// Live subscription of an expanded list. `token` tags inbox entries so that
/// edits delivered to an earlier expansion are never replayed.
#[derive(Copy, Clone, Debug)]
pub(crate) struct ListSubscription {
    pub(crate) id: SubscriptionId,
    pub(crate) token: u64,
}

pub(crate) enum ListShape {
    Plain,
    Enclosed {
        front: BoxedVisual,
        back: BoxedVisual,
    },
    Overlay {
        overlay: BoxedVisual,
    },
}

pub(crate) struct ListNode {
    pub(crate) orientation: Orientation,
    pub(crate) expanded: bool,
    pub(crate) collection: Option<ItemCollection>,
    pub(crate) subscription: Option<ListSubscription>,
    /// Index-aligned with `collection` while expanded; empty while collapsed.
    pub(crate) children: Vec<NodeId>,
    /// Linked list whose expansion mirrors this one.
    pub(crate) sub_list: Option<NodeId>,
    /// Back-link from a sub-list to the list it mirrors.
    pub(crate) main_list: Option<NodeId>,
    pub(crate) background: Option<BoxedVisual>,
    pub(crate) drop_indicator: Option<BoxedVisual>,
    pub(crate) shape: ListShape,
    /// Size of the children strip (margins and background included), without decorations.
    pub(crate) content_size: Size,
}

impl ListNode {
    pub(crate) fn new(parts: ListParts, shape: ListShape) -> Self {
        Self {
            orientation: parts.orientation,
            expanded: false,
            collection: None,
            subscription: None,
            children: Vec::new(),
            sub_list: None,
            main_list: None,
            background: parts.background,
            drop_indicator: parts.drop_indicator,
            shape,
            content_size: Size::ZERO,
        }
    }

    /// Every decorative visual, for teardown.
    pub(crate) fn visuals_mut(&mut self) -> impl Iterator<Item = &mut BoxedVisual> {
        let (a, b) = match &mut self.shape {
            ListShape::Plain => (None, None),
            ListShape::Enclosed { front, back } => (Some(front), Some(back)),
            ListShape::Overlay { overlay } => (Some(overlay), None),
        };
        self.background
            .as_mut()
            .into_iter()
            .chain(self.drop_indicator.as_mut())
            .chain(a)
            .chain(b)
    }
}

pub(crate) struct HeaderedNode {
    pub(crate) header: BoxedVisual,
    pub(crate) toggle: BoxedVisual,
    pub(crate) list: NodeId,
    pub(crate) secondary: Option<NodeId>,
    pub(crate) header_rect: Rect,
    pub(crate) toggle_rect: Rect,
    /// Bounds of header, toggle and both lists as of the last arrange.
    pub(crate) selection_rect: Rect,
}

impl HeaderedNode {
    pub(crate) fn new(
        header: BoxedVisual,
        toggle: BoxedVisual,
        list: NodeId,
        secondary: Option<NodeId>,
    ) -> Self {
        Self {
            header,
            toggle,
            list,
            secondary,
            header_rect: Rect::ZERO,
            toggle_rect: Rect::ZERO,
            selection_rect: Rect::ZERO,
        }
    }

    pub(crate) fn lists(&self) -> impl DoubleEndedIterator<Item = NodeId> + use<> {
        core::iter::once(self.list).chain(self.secondary)
    }
}
