// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the item tree: node identifiers, flags, orientation, and style.

use kurbo::{Point, Size};

/// Identifier for a node in the tree (generational).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

bitflags::bitflags! {
    /// Per-node state bits.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// The node has been measured since it was realized or last changed.
        const MEASURED  = 0b0000_0001;
        /// The node is part of the host's selection.
        const SELECTED  = 0b0000_0010;
        /// The node can hold the caret during focus navigation.
        const FOCUSABLE = 0b0000_0100;
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// Axis along which a list concatenates its children.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Children are placed left to right.
    Horizontal,
    /// Children are placed top to bottom.
    #[default]
    Vertical,
}

impl Orientation {
    /// Extent of `size` along this axis.
    pub fn along(self, size: Size) -> f64 {
        match self {
            Self::Horizontal => size.width,
            Self::Vertical => size.height,
        }
    }

    /// Extent of `size` across this axis.
    pub fn cross(self, size: Size) -> f64 {
        match self {
            Self::Horizontal => size.height,
            Self::Vertical => size.width,
        }
    }

    /// Build a size from an extent along this axis and an extent across it.
    pub fn size(self, along: f64, cross: f64) -> Size {
        match self {
            Self::Horizontal => Size::new(along, cross),
            Self::Vertical => Size::new(cross, along),
        }
    }

    /// Move `point` forward along this axis by `delta`.
    pub fn advance(self, point: &mut Point, delta: f64) {
        match self {
            Self::Horizontal => point.x += delta,
            Self::Vertical => point.y += delta,
        }
    }

    /// The other axis.
    pub fn flip(self) -> Self {
        match self {
            Self::Horizontal => Self::Vertical,
            Self::Vertical => Self::Horizontal,
        }
    }
}

/// Coarse classification of a node, for hosts and navigation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A single visual bound to one item.
    Leaf,
    /// A plain list of children.
    List,
    /// A list flanked by front and back bracket visuals.
    Enclosed,
    /// A list preceded by an overlay marker visual.
    Overlay,
    /// A header visual with a toggle and one or two lists below it.
    Headered,
}

/// Spacing configuration supplied by the host when the tree is created.
///
/// All values are in logical pixels, before zoom.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LayoutStyle {
    /// Gap placed between consecutive children of a list.
    pub item_spacing: f64,
    /// Space reserved on the leading edge of every expanded list for a drop target.
    pub drop_margin: f64,
    /// Gap between a headered node's toggle and its header.
    pub header_spacing: f64,
    /// Space added below an expanded headered node.
    pub expanded_margin: f64,
}

impl LayoutStyle {
    /// A style without any spacing or margins.
    pub const ZERO: Self = Self {
        item_spacing: 0.0,
        drop_margin: 0.0,
        header_spacing: 0.0,
        expanded_margin: 0.0,
    };
}

impl Default for LayoutStyle {
    fn default() -> Self {
        Self {
            item_spacing: 2.0,
            drop_margin: 4.0,
            header_spacing: 4.0,
            expanded_margin: 6.0,
        }
    }
}
