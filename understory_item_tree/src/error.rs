// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recoverable errors surfaced to callers.

use crate::NodeId;

/// Errors returned by [`ItemTree`](crate::ItemTree) operations that a caller can act on.
///
/// Broken layout invariants are not represented here; they are debug assertions.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    /// The node, or the item bound to it, cannot be duplicated.
    #[error("node {0:?} does not support duplication")]
    DuplicateUnsupported(NodeId),
    /// The node is not a realized child of a list with a backing collection.
    #[error("node {0:?} is not backed by a collection")]
    NotInCollection(NodeId),
    /// The node is owned by a list or headered node and is released through its owner.
    #[error("node {0:?} is owned by another node")]
    Owned(NodeId),
    /// The identifier does not refer to a live node.
    #[error("node {0:?} is stale")]
    Stale(NodeId),
}
