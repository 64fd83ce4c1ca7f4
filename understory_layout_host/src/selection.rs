// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The live selection set of a layout surface.

use alloc::vec::Vec;

use hashbrown::HashSet;
use understory_item_tree::NodeId;

/// Selected nodes in selection order. The most recent one is the primary selection.
///
/// Membership mirrors the tree's selection flags; the set adds the order.
#[derive(Clone, Debug, Default)]
pub(crate) struct SelectionSet {
    members: HashSet<NodeId>,
    order: Vec<NodeId>,
}

impl SelectionSet {
    /// Returns `true` if `id` was not selected before.
    pub(crate) fn insert(&mut self, id: NodeId) -> bool {
        if !self.members.insert(id) {
            return false;
        }
        self.order.push(id);
        true
    }

    /// Returns `true` if `id` was selected.
    pub(crate) fn remove(&mut self, id: NodeId) -> bool {
        if !self.members.remove(&id) {
            return false;
        }
        self.order.retain(|n| *n != id);
        true
    }

    pub(crate) fn primary(&self) -> Option<NodeId> {
        self.order.last().copied()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.order.iter().copied()
    }

    /// Drop members for which `keep` returns `false`. Returns how many were dropped.
    pub(crate) fn retain(&mut self, mut keep: impl FnMut(NodeId) -> bool) -> usize {
        let before = self.order.len();
        let members = &mut self.members;
        self.order.retain(|id| {
            let kept = keep(*id);
            if !kept {
                members.remove(id);
            }
            kept
        });
        before - self.order.len()
    }

    pub(crate) fn clear(&mut self) -> Vec<NodeId> {
        self.members.clear();
        core::mem::take(&mut self.order)
    }
}
