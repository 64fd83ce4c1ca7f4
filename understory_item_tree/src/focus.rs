// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Directional focus navigation over realized nodes.
//!
//! Navigation is a pure walk over owners and siblings; it never consults
//! geometry. Movement along a list's axis steps between siblings, movement
//! across it climbs to the nearest ancestor list that runs the right way.
//! Enclosures are entered at their bracket going forward and at their last
//! focus target going backward, so both directions visit the same stops.

use crate::tree::{ItemTree, TreeCore};
use crate::types::{NodeFlags, NodeId, NodeKind, Orientation};

/// A directional focus move.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Navigation {
    /// Move towards the top.
    Up,
    /// Move towards the bottom.
    Down,
    /// Move towards the left.
    Left,
    /// Move towards the right.
    Right,
}

impl Navigation {
    /// The axis this move runs along.
    pub fn axis(self) -> Orientation {
        match self {
            Self::Up | Self::Down => Orientation::Vertical,
            Self::Left | Self::Right => Orientation::Horizontal,
        }
    }

    /// Returns `true` for moves towards later children.
    pub fn is_forward(self) -> bool {
        matches!(self, Self::Down | Self::Right)
    }
}

impl ItemTree {
    /// Returns `true` if `id` is realized and can hold focus.
    pub fn is_focus_target(&self, id: NodeId) -> bool {
        self.flags(id)
            .is_some_and(|f| f.contains(NodeFlags::FOCUSABLE))
    }

    /// The focus target reached from `from` by moving in direction `nav`.
    ///
    /// Returns `None` for stale ids and when the walk runs off the root.
    pub fn move_focus(&self, from: NodeId, nav: Navigation) -> Option<NodeId> {
        self.read().move_focus(from, nav)
    }

    /// The focus target reached when moving into `id` from outside in direction `nav`.
    ///
    /// Returns `None` when `id` holds no realized focus target.
    pub fn entry_point(&self, id: NodeId, nav: Navigation) -> Option<NodeId> {
        self.read().entry_point(id, nav)
    }
}

impl TreeCore {
    fn move_focus(&self, from: NodeId, nav: Navigation) -> Option<NodeId> {
        if !self.is_alive(from) {
            return None;
        }
        if let Some(target) = self.descend(from, nav) {
            return Some(target);
        }

        let mut current = from;
        while let Some(owner) = self.owner_of(current) {
            match self.kind(owner)? {
                NodeKind::Headered => {
                    if let Some(target) = self.step_in_headered(owner, current, nav) {
                        return Some(target);
                    }
                }
                kind => {
                    if self.orientation(owner) == Some(nav.axis()) {
                        if let Some(target) = self.step_siblings(owner, current, nav) {
                            return Some(target);
                        }
                        // Leaving an enclosure backwards stops at its bracket.
                        if !nav.is_forward() && kind != NodeKind::List {
                            return Some(owner);
                        }
                    }
                }
            }
            current = owner;
        }
        None
    }

    /// Move from a node into its own content, if the direction allows it.
    fn descend(&self, from: NodeId, nav: Navigation) -> Option<NodeId> {
        match self.kind(from)? {
            NodeKind::Headered if nav == Navigation::Down => {
                let (list, secondary) = self.lists_of(from)?;
                self.entry_point(list, nav)
                    .or_else(|| secondary.and_then(|s| self.entry_point(s, nav)))
            }
            NodeKind::Enclosed | NodeKind::Overlay
                if nav.is_forward() && self.orientation(from) == Some(nav.axis()) =>
            {
                self.enter_children(from, nav)
            }
            _ => None,
        }
    }

    /// Header, main list and secondary list form a vertical sequence.
    fn step_in_headered(&self, owner: NodeId, current: NodeId, nav: Navigation) -> Option<NodeId> {
        let (list, secondary) = self.lists_of(owner)?;
        match nav {
            Navigation::Down if current == list => secondary.and_then(|s| self.entry_point(s, nav)),
            Navigation::Up if Some(current) == secondary => {
                Some(self.entry_point(list, nav).unwrap_or(owner))
            }
            Navigation::Up if current == list => Some(owner),
            _ => None,
        }
    }

    fn step_siblings(&self, list: NodeId, current: NodeId, nav: Navigation) -> Option<NodeId> {
        let siblings = self.children_of(list);
        let pos = siblings.iter().position(|c| *c == current)?;
        if nav.is_forward() {
            siblings[pos + 1..]
                .iter()
                .find_map(|s| self.entry_point(*s, nav))
        } else {
            siblings[..pos]
                .iter()
                .rev()
                .find_map(|s| self.entry_point(*s, nav))
        }
    }

    fn entry_point(&self, id: NodeId, nav: Navigation) -> Option<NodeId> {
        match self.kind(id)? {
            NodeKind::Leaf => Some(id),
            NodeKind::Headered => {
                if nav != Navigation::Up {
                    return Some(id);
                }
                let (list, secondary) = self.lists_of(id)?;
                secondary
                    .and_then(|s| self.entry_point(s, nav))
                    .or_else(|| self.entry_point(list, nav))
                    .or(Some(id))
            }
            NodeKind::List => self.enter_children(id, nav),
            NodeKind::Enclosed | NodeKind::Overlay => {
                if nav.is_forward() || self.orientation(id) != Some(nav.axis()) {
                    Some(id)
                } else {
                    self.enter_children(id, nav).or(Some(id))
                }
            }
        }
    }

    fn enter_children(&self, list: NodeId, nav: Navigation) -> Option<NodeId> {
        let children = self.children_of(list);
        if self.orientation(list) == Some(nav.axis()) && !nav.is_forward() {
            children.iter().rev().find_map(|c| self.entry_point(*c, nav))
        } else {
            children.iter().find_map(|c| self.entry_point(*c, nav))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::ItemCollection;
    use crate::test_support::{Block, Loop, Statement, VisualCounter, root_list};
    use crate::types::LayoutStyle;
    use alloc::vec;

    #[test]
    fn steps_between_siblings() {
        let counter = VisualCounter::default();
        let coll = ItemCollection::from_items(vec![
            Statement::new(&counter, 1.0, 1.0),
            Statement::new(&counter, 1.0, 1.0),
        ]);
        let mut tree = ItemTree::new(LayoutStyle::ZERO);
        let root = root_list(&mut tree, Orientation::Vertical, &coll);
        let [a, b] = [tree.children_of(root)[0], tree.children_of(root)[1]];

        assert_eq!(tree.move_focus(a, Navigation::Down), Some(b));
        assert_eq!(tree.move_focus(b, Navigation::Up), Some(a));
        assert_eq!(tree.move_focus(a, Navigation::Up), None);
        assert_eq!(tree.move_focus(b, Navigation::Down), None);
        assert_eq!(tree.move_focus(a, Navigation::Right), None);
        assert!(!tree.is_focus_target(root));
    }

    #[test]
    fn walks_into_and_out_of_headered_nodes() {
        let counter = VisualCounter::default();
        let coll = ItemCollection::from_items(vec![
            Block::new(
                &counter,
                vec![
                    Statement::new(&counter, 1.0, 1.0),
                    Statement::new(&counter, 1.0, 1.0),
                ],
            ),
            Statement::new(&counter, 1.0, 1.0),
        ]);
        let mut tree = ItemTree::new(LayoutStyle::ZERO);
        let root = root_list(&mut tree, Orientation::Vertical, &coll);
        let block = tree.children_of(root)[0];
        let after = tree.children_of(root)[1];
        let (list, _) = tree.lists_of(block).unwrap();
        let [first, last] = [tree.children_of(list)[0], tree.children_of(list)[1]];

        assert_eq!(tree.move_focus(block, Navigation::Down), Some(first));
        assert_eq!(tree.move_focus(first, Navigation::Up), Some(block));
        assert_eq!(tree.move_focus(last, Navigation::Down), Some(after));
        assert_eq!(tree.move_focus(after, Navigation::Up), Some(last));

        tree.toggle(block, false);
        assert!(!tree.is_alive(first));
        assert_eq!(tree.move_focus(block, Navigation::Down), Some(after));
        assert_eq!(tree.move_focus(after, Navigation::Up), Some(block));
        assert_eq!(tree.move_focus(first, Navigation::Down), None);
    }

    #[test]
    fn secondary_list_follows_main_list() {
        let counter = VisualCounter::default();
        let coll = ItemCollection::from_items(vec![Block::conditional(
            &counter,
            vec![Statement::new(&counter, 1.0, 1.0)],
            vec![Statement::new(&counter, 1.0, 1.0)],
        )]);
        let mut tree = ItemTree::new(LayoutStyle::ZERO);
        let root = root_list(&mut tree, Orientation::Vertical, &coll);
        let node = tree.children_of(root)[0];
        let (list, secondary) = tree.lists_of(node).unwrap();
        let then_branch = tree.children_of(list)[0];
        let else_branch = tree.children_of(secondary.unwrap())[0];

        assert_eq!(tree.move_focus(then_branch, Navigation::Down), Some(else_branch));
        assert_eq!(tree.move_focus(else_branch, Navigation::Up), Some(then_branch));
        assert_eq!(tree.move_focus(else_branch, Navigation::Down), None);
    }

    #[test]
    fn enclosures_in_a_horizontal_flow() {
        let counter = VisualCounter::default();
        let coll = ItemCollection::from_items(vec![
            Statement::new(&counter, 1.0, 1.0),
            Loop::new(
                &counter,
                vec![
                    Statement::new(&counter, 1.0, 1.0),
                    Statement::new(&counter, 1.0, 1.0),
                ],
            ),
            Statement::new(&counter, 1.0, 1.0),
        ]);
        let mut tree = ItemTree::new(LayoutStyle::ZERO);
        let root = root_list(&mut tree, Orientation::Horizontal, &coll);
        let [before, looped, after] = [
            tree.children_of(root)[0],
            tree.children_of(root)[1],
            tree.children_of(root)[2],
        ];
        let [first, last] = [tree.children_of(looped)[0], tree.children_of(looped)[1]];

        let forward = [before, looped, first, last, after];
        for pair in forward.windows(2) {
            assert_eq!(tree.move_focus(pair[0], Navigation::Right), Some(pair[1]));
            assert_eq!(tree.move_focus(pair[1], Navigation::Left), Some(pair[0]));
        }
        // Crossing the flow's axis has nowhere to go.
        assert_eq!(tree.move_focus(first, Navigation::Down), None);
    }

    #[test]
    fn cross_axis_moves_leave_enclosures() {
        let counter = VisualCounter::default();
        let coll = ItemCollection::from_items(vec![
            Loop::new(&counter, vec![Statement::new(&counter, 1.0, 1.0)]),
            Statement::new(&counter, 1.0, 1.0),
        ]);
        let mut tree = ItemTree::new(LayoutStyle::ZERO);
        let root = root_list(&mut tree, Orientation::Vertical, &coll);
        let looped = tree.children_of(root)[0];
        let after = tree.children_of(root)[1];
        let inner = tree.children_of(looped)[0];

        assert_eq!(tree.move_focus(inner, Navigation::Down), Some(after));
        assert_eq!(tree.move_focus(after, Navigation::Up), Some(looped));
        assert_eq!(tree.move_focus(looped, Navigation::Right), Some(inner));
    }

    #[test]
    fn stale_ids_do_not_navigate() {
        let counter = VisualCounter::default();
        let coll = ItemCollection::from_items(vec![Statement::new(&counter, 1.0, 1.0)]);
        let mut tree = ItemTree::new(LayoutStyle::ZERO);
        let root = root_list(&mut tree, Orientation::Vertical, &coll);
        let only = tree.children_of(root)[0];
        coll.remove(0);
        assert_eq!(tree.move_focus(only, Navigation::Down), None);
    }
}
