// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core tree implementation: structure, realization, and incremental synchronization.

use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::{Ref, RefCell};

use kurbo::{Rect, Size};
use smallvec::SmallVec;

use crate::collection::{ChangeSink, CollectionChange, ItemCollection};
use crate::error::LayoutError;
use crate::item::{ItemRef, ListParts, RealizeCx};
use crate::node::{HeaderedNode, ListNode, ListShape, ListSubscription, Node, NodeBody};
use crate::types::{LayoutStyle, NodeFlags, NodeId, NodeKind, Orientation};

/// Z distance between a node and its owner.
pub(crate) const Z_STEP: i32 = 1;

/// A change delivered by a collection, waiting to be applied.
struct PendingChange {
    list: NodeId,
    token: u64,
    change: CollectionChange,
}

/// Queue shared between the tree and the sinks it registers on collections.
///
/// A change waits here only while the tree is in the middle of an operation
/// (for example an item mutating a collection while it is being realized).
#[derive(Default)]
struct Inbox {
    entries: RefCell<Vec<PendingChange>>,
}

impl Inbox {
    fn push(&self, pending: PendingChange) {
        self.entries.borrow_mut().push(pending);
    }

    fn take(&self) -> Vec<PendingChange> {
        core::mem::take(&mut *self.entries.borrow_mut())
    }

    fn purge(&self, list: NodeId, token: u64) {
        self.entries
            .borrow_mut()
            .retain(|p| !(p.list == list && p.token == token));
    }

    fn len(&self) -> usize {
        self.entries.borrow().len()
    }
}

struct TreeSink {
    list: NodeId,
    token: u64,
    inbox: Rc<Inbox>,
    tree: Weak<RefCell<TreeCore>>,
}

impl ChangeSink for TreeSink {
    fn notify(&self, change: &CollectionChange) {
        self.inbox.push(PendingChange {
            list: self.list,
            token: self.token,
            change: change.clone(),
        });
        let Some(tree) = self.tree.upgrade() else {
            return;
        };
        // A busy tree drains the inbox itself before the operation returns.
        if let Ok(mut state) = tree.try_borrow_mut() {
            state.drain_inbox();
        }
    }
}

/// The realized view of a domain tree.
///
/// Nodes are created when items are realized (a list expands, or its backing
/// collection gains an item) and released when they are collapsed away or
/// removed. Collections report edits synchronously and the tree applies each
/// one before the mutating call returns, so an expanded list's children stay
/// index-aligned with its collection. Only the layout request is deferred:
/// a burst of edits costs one layout pass.
///
/// `ItemTree` is a handle to state shared with the sinks it registers; it is
/// not `Clone`, and dropping it unsubscribes every list.
///
/// ## Example
///
/// ```rust
/// use understory_item_tree::{ItemTree, LayoutStyle, ListParts, Orientation};
///
/// let mut tree = ItemTree::new(LayoutStyle::ZERO);
/// let root = tree.insert_list(None, ListParts::new(Orientation::Vertical));
/// tree.set_expanded(root, true);
/// assert!(tree.is_expanded(root));
/// assert!(tree.children_of(root).is_empty());
/// ```
pub struct ItemTree {
    core: Rc<RefCell<TreeCore>>,
}

impl core::fmt::Debug for ItemTree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.core.try_borrow() {
            Ok(state) => core::fmt::Debug::fmt(&*state, f),
            Err(_) => f.write_str("ItemTree { .. }"),
        }
    }
}

impl Default for ItemTree {
    fn default() -> Self {
        Self::new(LayoutStyle::default())
    }
}

impl ItemTree {
    /// Create an empty tree using `style` for all spacing.
    pub fn new(style: LayoutStyle) -> Self {
        Self {
            core: Rc::new_cyclic(|this| RefCell::new(TreeCore::new(this.clone(), style))),
        }
    }

    pub(crate) fn read(&self) -> Ref<'_, TreeCore> {
        self.core.borrow()
    }

    /// Run `f` on the tree state, then apply any edit delivered while it ran.
    pub(crate) fn update<R>(&mut self, f: impl FnOnce(&mut TreeCore) -> R) -> R {
        let mut state = self.core.borrow_mut();
        let out = f(&mut state);
        state.drain_inbox();
        out
    }

    /// Spacing configuration.
    pub fn style(&self) -> LayoutStyle {
        self.read().style
    }

    /// Replace the spacing configuration and request layout.
    pub fn set_style(&mut self, style: LayoutStyle) {
        self.update(|t| {
            if t.style != style {
                t.style = style;
                t.layout_requested = true;
            }
        });
    }

    /// Insert an unbound, collapsed list owned by `owner` (or a root if `None`).
    pub fn insert_list(&mut self, owner: Option<NodeId>, parts: ListParts) -> NodeId {
        self.update(|t| t.insert_list(owner, parts))
    }

    /// Returns `true` if structure or expansion changed since the last call.
    pub fn take_layout_request(&mut self) -> bool {
        self.update(|t| core::mem::take(&mut t.layout_requested))
    }

    /// Returns `true` if a layout request is outstanding, without clearing it.
    pub fn is_layout_requested(&self) -> bool {
        self.read().layout_requested
    }

    // --- accessors ---

    /// Returns true if `id` refers to a live node.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.read().is_alive(id)
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.read().nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Returns `true` if the tree holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Kind of a live node.
    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.read().kind(id)
    }

    /// Owner of a live node, or `None` for roots and stale ids.
    pub fn owner_of(&self, id: NodeId) -> Option<NodeId> {
        self.read().owner_of(id)
    }

    /// Item bound to a live node.
    pub fn item_of(&self, id: NodeId) -> Option<ItemRef> {
        self.read().node_opt(id).and_then(|n| n.item.clone())
    }

    /// Z index as of the last measure.
    pub fn z_index(&self, id: NodeId) -> Option<i32> {
        self.read().z_index(id)
    }

    /// Size as of the last measure.
    pub fn size(&self, id: NodeId) -> Option<Size> {
        self.read().size(id)
    }

    /// Rectangle (content coordinates) as of the last arrange.
    pub fn rect(&self, id: NodeId) -> Option<Rect> {
        self.read().rect(id)
    }

    /// State flags of a live node.
    pub fn flags(&self, id: NodeId) -> Option<NodeFlags> {
        self.read().flags(id)
    }

    /// Realized children of a list, or an empty vector for other nodes and stale ids.
    pub fn children_of(&self, id: NodeId) -> Vec<NodeId> {
        self.read().children_of(id).to_vec()
    }

    /// Whether a list is expanded. Headered nodes report their main list.
    pub fn is_expanded(&self, id: NodeId) -> bool {
        self.read().is_expanded(id)
    }

    /// Orientation of a list.
    pub fn orientation(&self, id: NodeId) -> Option<Orientation> {
        self.read().orientation(id)
    }

    /// Collection a list is bound to.
    pub fn collection_of(&self, id: NodeId) -> Option<ItemCollection> {
        self.read().list_opt(id).and_then(|l| l.collection.clone())
    }

    /// The list whose expansion mirrors `id`.
    pub fn sub_list_of(&self, id: NodeId) -> Option<NodeId> {
        self.read().list_opt(id).and_then(|l| l.sub_list)
    }

    /// Main and secondary list of a headered node.
    pub fn lists_of(&self, id: NodeId) -> Option<(NodeId, Option<NodeId>)> {
        self.read().lists_of(id)
    }

    /// Rectangle a selection or drag overlay should cover.
    ///
    /// Headered nodes report the bounds of their header, toggle, and lists;
    /// other nodes report their arranged rectangle.
    pub fn selection_rect(&self, id: NodeId) -> Option<Rect> {
        let state = self.read();
        let node = state.node_opt(id)?;
        Some(match &node.body {
            NodeBody::Headered(h) => h.selection_rect,
            _ => node.rect,
        })
    }

    /// Arranged rectangles of a headered node's header and toggle, which move
    /// and select as one group.
    pub fn header_group_rects(&self, id: NodeId) -> Option<[Rect; 2]> {
        match &self.read().node_opt(id)?.body {
            NodeBody::Headered(h) => Some([h.header_rect, h.toggle_rect]),
            _ => None,
        }
    }

    /// Whether a node is selected.
    pub fn is_selected(&self, id: NodeId) -> bool {
        self.read()
            .flags(id)
            .is_some_and(|f| f.contains(NodeFlags::SELECTED))
    }

    /// Set the selection state of a node. Returns `true` if it changed.
    ///
    /// Every change is also recorded for [`ItemTree::take_selection_changes`].
    pub fn set_selected(&mut self, id: NodeId, selected: bool) -> bool {
        self.update(|t| t.set_selected(id, selected))
    }

    /// Selection toggles since the last call, oldest first.
    pub fn take_selection_changes(&mut self) -> Vec<(NodeId, bool)> {
        self.update(|t| core::mem::take(&mut t.selection_changes))
    }

    /// Path from the root to `id` (inclusive).
    pub fn path_to(&self, id: NodeId) -> Vec<NodeId> {
        let state = self.read();
        let mut path = Vec::new();
        let mut current = state.is_alive(id).then_some(id);
        while let Some(node) = current {
            path.push(node);
            current = state.owner_of(node);
        }
        path.reverse();
        path
    }

    // --- structure ---

    /// Bind a list to `collection` (or unbind it).
    ///
    /// An expanded list is re-realized from the new collection.
    pub fn bind(&mut self, list: NodeId, collection: Option<ItemCollection>) {
        self.update(|t| t.bind(list, collection));
    }

    /// Expand or collapse a list together with the lists linked to it.
    ///
    /// Expanding realizes one node per item and subscribes to the collection.
    /// Collapsing unsubscribes first, then releases every child. A linked
    /// sub-list forwards the request to its main list, so both always agree.
    pub fn set_expanded(&mut self, list: NodeId, expanded: bool) {
        self.update(|t| t.set_expanded(list, expanded));
    }

    /// Release and rebuild every child of an expanded list from its collection.
    ///
    /// This is the explicit re-trigger after a [`CollectionChange::Reset`].
    pub fn realize(&mut self, list: NodeId) {
        self.update(|t| t.realize(list));
    }

    /// Check or uncheck a headered node's toggle.
    ///
    /// Checking rebinds the lists from the item's child collections and
    /// expands them; unchecking collapses them (releasing every child) and
    /// clears the bindings.
    pub fn toggle(&mut self, id: NodeId, checked: bool) {
        self.update(|t| t.toggle(id, checked));
    }

    /// Release a root node and its subtree.
    ///
    /// Owned nodes are released by their owner, when it collapses or when
    /// their item leaves its collection; releasing one directly returns
    /// [`LayoutError::Owned`]. Releasing a stale id is a no-op.
    pub fn release(&mut self, id: NodeId) -> Result<(), LayoutError> {
        self.update(|t| t.release(id))
    }

    /// Insert a copy of a node's item right after it in its owner's collection.
    ///
    /// Returns the node realized for the copy.
    pub fn duplicate(&mut self, id: NodeId) -> Result<NodeId, LayoutError> {
        let (list, index, collection, copy) = self.update(|t| t.prepare_duplicate(id))?;
        // The tree is not borrowed here, so the insert is applied before it returns.
        collection.insert(index + 1, copy);
        self.read()
            .children_of(list)
            .get(index + 1)
            .copied()
            .ok_or(LayoutError::NotInCollection(id))
    }
}

/// State behind an [`ItemTree`], shared with the sinks it registers.
pub(crate) struct TreeCore {
    this: Weak<RefCell<Self>>,
    /// slots
    nodes: Vec<Option<Node>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
    style: LayoutStyle,
    inbox: Rc<Inbox>,
    next_token: u64,
    layout_requested: bool,
    selection_changes: Vec<(NodeId, bool)>,
}

impl core::fmt::Debug for TreeCore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        f.debug_struct("ItemTree")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &self.free_list.len())
            .field("pending_changes", &self.inbox.len())
            .field("style", &self.style)
            .finish_non_exhaustive()
    }
}

impl Drop for TreeCore {
    fn drop(&mut self) {
        for node in self.nodes.iter_mut().flatten() {
            if let NodeBody::List(list) = &mut node.body
                && let (Some(collection), Some(sub)) = (&list.collection, list.subscription.take())
            {
                collection.unsubscribe(sub.id);
            }
        }
    }
}

impl TreeCore {
    fn new(this: Weak<RefCell<Self>>, style: LayoutStyle) -> Self {
        Self {
            this,
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            style,
            inbox: Rc::new(Inbox::default()),
            next_token: 0,
            layout_requested: false,
            selection_changes: Vec::new(),
        }
    }

    pub(crate) fn style(&self) -> &LayoutStyle {
        &self.style
    }

    pub(crate) fn insert_list(&mut self, owner: Option<NodeId>, parts: ListParts) -> NodeId {
        self.insert_node(
            owner,
            None,
            NodeBody::List(ListNode::new(parts, ListShape::Plain)),
            NodeFlags::empty(),
        )
    }

    // --- accessors ---

    pub(crate) fn is_alive(&self, id: NodeId) -> bool {
        self.node_opt(id).is_some()
    }

    pub(crate) fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.node_opt(id).map(|n| n.body.kind())
    }

    pub(crate) fn owner_of(&self, id: NodeId) -> Option<NodeId> {
        self.node_opt(id).and_then(|n| n.owner)
    }

    pub(crate) fn z_index(&self, id: NodeId) -> Option<i32> {
        self.node_opt(id).map(|n| n.z_index)
    }

    pub(crate) fn size(&self, id: NodeId) -> Option<Size> {
        self.node_opt(id).map(|n| n.size)
    }

    pub(crate) fn rect(&self, id: NodeId) -> Option<Rect> {
        self.node_opt(id).map(|n| n.rect)
    }

    pub(crate) fn flags(&self, id: NodeId) -> Option<NodeFlags> {
        self.node_opt(id).map(|n| n.flags)
    }

    pub(crate) fn children_of(&self, id: NodeId) -> &[NodeId] {
        match self.list_opt(id) {
            Some(list) => &list.children,
            None => &[],
        }
    }

    pub(crate) fn is_expanded(&self, id: NodeId) -> bool {
        match self.node_opt(id).map(|n| &n.body) {
            Some(NodeBody::List(list)) => list.expanded,
            Some(NodeBody::Headered(h)) => self.is_expanded(h.list),
            _ => false,
        }
    }

    pub(crate) fn orientation(&self, id: NodeId) -> Option<Orientation> {
        self.list_opt(id).map(|l| l.orientation)
    }

    pub(crate) fn lists_of(&self, id: NodeId) -> Option<(NodeId, Option<NodeId>)> {
        match &self.node_opt(id)?.body {
            NodeBody::Headered(h) => Some((h.list, h.secondary)),
            _ => None,
        }
    }

    fn set_selected(&mut self, id: NodeId, selected: bool) -> bool {
        let Some(node) = self.node_opt_mut(id) else {
            return false;
        };
        if node.flags.contains(NodeFlags::SELECTED) == selected {
            return false;
        }
        node.flags.set(NodeFlags::SELECTED, selected);
        self.selection_changes.push((id, selected));
        true
    }

    // --- structure ---

    pub(crate) fn bind(&mut self, list: NodeId, collection: Option<ItemCollection>) {
        let Some(node) = self.list_opt(list) else {
            debug_assert!(!self.is_alive(list), "bind called on a non-list node");
            return;
        };
        let same = match (&node.collection, &collection) {
            (Some(a), Some(b)) => a.ptr_eq(b),
            (None, None) => true,
            _ => false,
        };
        if same {
            return;
        }
        let expanded = node.expanded;
        if expanded {
            self.unrealize(list);
        }
        self.list_mut(list).collection = collection;
        if expanded {
            self.subscribe_and_realize(list);
        }
        self.layout_requested = true;
    }

    pub(crate) fn set_expanded(&mut self, list: NodeId, expanded: bool) {
        let Some(node) = self.list_opt(list) else {
            debug_assert!(!self.is_alive(list), "set_expanded called on a non-list node");
            return;
        };
        let main_list = node.main_list;
        match main_list {
            Some(main) => self.set_expanded(main, expanded),
            None => self.expand_linked(list, expanded),
        }
    }

    /// Expand or collapse `list`, then every sub-list linked below it.
    fn expand_linked(&mut self, list: NodeId, expanded: bool) {
        let node = self.list_mut(list);
        if node.expanded == expanded {
            return;
        }
        let sub_list = node.sub_list;
        tracing::debug!(?list, expanded, "list expansion changed");
        if expanded {
            self.list_mut(list).expanded = true;
            self.subscribe_and_realize(list);
        } else {
            self.unrealize(list);
            self.list_mut(list).expanded = false;
        }
        if let Some(sub) = sub_list {
            self.expand_linked(sub, expanded);
        }
        self.layout_requested = true;
    }

    fn realize(&mut self, list: NodeId) {
        let Some(node) = self.list_opt(list) else {
            return;
        };
        if !node.expanded {
            return;
        }
        self.unrealize(list);
        self.subscribe_and_realize(list);
        self.layout_requested = true;
    }

    pub(crate) fn toggle(&mut self, id: NodeId, checked: bool) {
        let Some((list, secondary)) = self.lists_of(id) else {
            debug_assert!(!self.is_alive(id), "toggle called on a non-headered node");
            return;
        };
        let item = self.node(id).item.clone();
        if checked {
            self.bind(list, item.as_ref().and_then(|i| i.children()));
            if let Some(secondary) = secondary {
                self.bind(secondary, item.as_ref().and_then(|i| i.alternate_children()));
            }
            self.set_expanded(list, true);
        } else {
            self.set_expanded(list, false);
            self.bind(list, None);
            if let Some(secondary) = secondary {
                self.bind(secondary, None);
            }
        }
    }

    fn release(&mut self, id: NodeId) -> Result<(), LayoutError> {
        let Some(node) = self.node_opt(id) else {
            return Ok(());
        };
        if node.owner.is_some() {
            return Err(LayoutError::Owned(id));
        }
        self.release_subtree(id);
        self.layout_requested = true;
        Ok(())
    }

    /// Resolve where a copy of `id`'s item goes: its list, its index there,
    /// the backing collection, and the copy itself.
    fn prepare_duplicate(
        &self,
        id: NodeId,
    ) -> Result<(NodeId, usize, ItemCollection, ItemRef), LayoutError> {
        let Some(node) = self.node_opt(id) else {
            return Err(LayoutError::Stale(id));
        };
        let Some(copy) = node.item.as_ref().and_then(|item| item.duplicate()) else {
            tracing::warn!(node = ?id, "node does not support duplication");
            return Err(LayoutError::DuplicateUnsupported(id));
        };
        let (list, index, collection) = node
            .owner
            .and_then(|owner| {
                let list = self.list_opt(owner)?;
                list.subscription?;
                let index = list.children.iter().position(|c| *c == id)?;
                Some((owner, index, list.collection.clone()?))
            })
            .ok_or(LayoutError::NotInCollection(id))?;
        debug_assert!(
            collection
                .get(index)
                .zip(self.node(id).item.as_ref())
                .is_some_and(|(at, bound)| Rc::ptr_eq(&at, bound)),
            "children out of step with their collection"
        );
        Ok((list, index, collection, copy))
    }

    // --- internals ---

    pub(crate) fn insert_node(
        &mut self,
        owner: Option<NodeId>,
        item: Option<ItemRef>,
        body: NodeBody,
        flags: NodeFlags,
    ) -> NodeId {
        let z_index = owner
            .and_then(|o| self.z_index(o))
            .map_or(0, |z| z + Z_STEP);
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Node::new(generation, owner, item, z_index, body, flags));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes
                .push(Some(Node::new(generation, owner, item, z_index, body, flags)));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            ((self.nodes.len() - 1) as u32, generation)
        };
        NodeId::new(idx, generation)
    }

    /// Make `owner` the owner of a detached node.
    pub(crate) fn adopt(&mut self, id: NodeId, owner: NodeId) {
        let z = self.node(owner).z_index + Z_STEP;
        let node = self.node_mut(id);
        node.owner = Some(owner);
        node.z_index = z;
    }

    pub(crate) fn link_sub_list(&mut self, list: NodeId, sub_list: NodeId) {
        self.list_mut(list).sub_list = Some(sub_list);
        self.list_mut(sub_list).main_list = Some(list);
    }

    fn realize_item(&mut self, list: NodeId, item: ItemRef) -> NodeId {
        let factory = item.clone();
        let id = factory.create_default_ui(RealizeCx {
            tree: self,
            owner: Some(list),
            item,
        });
        debug_assert!(
            self.owner_of(id) == Some(list),
            "create_default_ui must build its node through the supplied context"
        );
        id
    }

    fn subscribe_and_realize(&mut self, list: NodeId) {
        let Some(collection) = self.list_mut(list).collection.clone() else {
            return;
        };
        let token = self.next_token;
        self.next_token += 1;
        let id = collection.subscribe(Rc::new(TreeSink {
            list,
            token,
            inbox: self.inbox.clone(),
            tree: self.this.clone(),
        }));
        self.list_mut(list).subscription = Some(ListSubscription { id, token });
        for item in collection.snapshot() {
            let child = self.realize_item(list, item);
            self.list_mut(list).children.push(child);
        }
    }

    /// Drop the subscription and release every child, leaving `expanded` untouched.
    fn unrealize(&mut self, list: NodeId) {
        let (collection, subscription, children) = {
            let node = self.list_mut(list);
            (
                node.collection.clone(),
                node.subscription.take(),
                core::mem::take(&mut node.children),
            )
        };
        if let (Some(collection), Some(sub)) = (collection, subscription) {
            collection.unsubscribe(sub.id);
            self.inbox.purge(list, sub.token);
        }
        for child in children {
            self.release_subtree(child);
        }
    }

    /// Tear down a node without touching its owner.
    fn release_subtree(&mut self, id: NodeId) {
        if !self.is_alive(id) {
            return;
        }
        let Some(mut node) = self.nodes[id.idx()].take() else {
            return;
        };
        self.free_list.push(id.idx());
        match &mut node.body {
            NodeBody::Leaf(visual) => visual.detach(),
            NodeBody::List(list) => {
                if let (Some(collection), Some(sub)) = (&list.collection, list.subscription.take())
                {
                    collection.unsubscribe(sub.id);
                    self.inbox.purge(id, sub.token);
                }
                for child in core::mem::take(&mut list.children) {
                    self.release_subtree(child);
                }
                for visual in list.visuals_mut() {
                    visual.detach();
                }
            }
            NodeBody::Headered(h) => {
                let lists: SmallVec<[NodeId; 2]> = h.lists().collect();
                for list in lists {
                    self.release_subtree(list);
                }
                h.header.detach();
                h.toggle.detach();
            }
        }
    }

    /// Apply every delivered change in order, including changes delivered
    /// while applying.
    fn drain_inbox(&mut self) {
        loop {
            let batch = self.inbox.take();
            if batch.is_empty() {
                break;
            }
            for pending in batch {
                self.apply_change(pending);
            }
        }
    }

    fn apply_change(&mut self, pending: PendingChange) {
        let PendingChange {
            list,
            token,
            change,
        } = pending;
        let live = self
            .list_opt(list)
            .and_then(|l| l.subscription)
            .is_some_and(|s| s.token == token);
        if !live {
            tracing::debug!(?list, ?change, "dropping change for a stale subscription");
            return;
        }
        tracing::trace!(?list, ?change, "applying collection change");
        let len = self.list_mut(list).children.len();
        match change {
            CollectionChange::Insert { index, item } => {
                debug_assert!(index <= len, "insert index {index} out of range");
                if index > len {
                    return;
                }
                let child = self.realize_item(list, item);
                self.list_mut(list).children.insert(index, child);
            }
            CollectionChange::Move { from, to } => {
                debug_assert!(from < len && to < len, "move {from}->{to} out of range");
                if from >= len || to >= len {
                    return;
                }
                let children = &mut self.list_mut(list).children;
                let child = children.remove(from);
                children.insert(to, child);
            }
            CollectionChange::Remove { index } => {
                debug_assert!(index < len, "remove index {index} out of range");
                if index >= len {
                    return;
                }
                let child = self.list_mut(list).children.remove(index);
                self.release_subtree(child);
            }
            CollectionChange::Replace { index, item } => {
                debug_assert!(index < len, "replace index {index} out of range");
                if index >= len {
                    return;
                }
                let old = self.list_mut(list).children[index];
                self.release_subtree(old);
                let child = self.realize_item(list, item);
                self.list_mut(list).children[index] = child;
            }
            CollectionChange::Reset => {
                tracing::debug!(?list, released = len, "collection reset");
                let children = core::mem::take(&mut self.list_mut(list).children);
                for child in children {
                    self.release_subtree(child);
                }
            }
        }
        self.layout_requested = true;
    }

    pub(crate) fn node_opt(&self, id: NodeId) -> Option<&Node> {
        let n = self.nodes.get(id.idx())?.as_ref()?;
        (n.generation == id.1).then_some(n)
    }

    pub(crate) fn node_opt_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let n = self.nodes.get_mut(id.idx())?.as_mut()?;
        if n.generation != id.1 {
            return None;
        }
        Some(n)
    }

    /// Access a node; panics if `id` is stale.
    pub(crate) fn node(&self, id: NodeId) -> &Node {
        self.node_opt(id).expect("dangling NodeId")
    }

    /// Access a node mutably; panics if `id` is stale.
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.node_opt_mut(id).expect("dangling NodeId")
    }

    pub(crate) fn list_opt(&self, id: NodeId) -> Option<&ListNode> {
        match &self.node_opt(id)?.body {
            NodeBody::List(list) => Some(list),
            _ => None,
        }
    }

    fn list_opt_mut(&mut self, id: NodeId) -> Option<&mut ListNode> {
        match &mut self.node_opt_mut(id)?.body {
            NodeBody::List(list) => Some(list),
            _ => None,
        }
    }

    /// Access a list mutably; panics if `id` is stale or not a list.
    pub(crate) fn list_mut(&mut self, id: NodeId) -> &mut ListNode {
        self.list_opt_mut(id).expect("NodeId is not a live list")
    }

    /// Access a headered node mutably; panics if `id` is stale or not headered.
    pub(crate) fn headered_mut(&mut self, id: NodeId) -> &mut HeaderedNode {
        match &mut self.node_mut(id).body {
            NodeBody::Headered(h) => h,
            _ => panic!("NodeId is not a headered node"),
        }
    }
}
