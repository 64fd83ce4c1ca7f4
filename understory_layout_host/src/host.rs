// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The layout surface: root ownership, pass scheduling, scroll, selection, and focus.

use core::ops::Range;

use kurbo::{Point, Rect, Size, Vec2};
use smallvec::SmallVec;
use tracing::{debug, trace};
use understory_item_tree::{
    ItemCollection, ItemTree, LayoutError, LayoutStyle, ListParts, Navigation, NodeId,
    Orientation,
};

use crate::scroll::ScrollState;
use crate::selection::SelectionSet;

/// The two editor styles a host can drive.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum HostKind {
    /// Statements stacked top to bottom, as wide as the viewport.
    Block,
    /// Steps chained left to right, centered vertically in the viewport.
    Flow,
}

impl HostKind {
    /// Orientation of the root list.
    pub fn orientation(self) -> Orientation {
        match self {
            Self::Block => Orientation::Vertical,
            Self::Flow => Orientation::Horizontal,
        }
    }
}

/// Host configuration.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HostConfig {
    /// Initial zoom factor.
    pub zoom: f64,
    /// Extra scrollable space added to the zoomed content, in screen units.
    pub padding: Size,
    /// Spacing handed to the item tree.
    pub style: LayoutStyle,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            padding: Size::new(20.0, 20.0),
            style: LayoutStyle::default(),
        }
    }
}

/// Which pass runs next.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum LayoutPhase {
    /// Layout is stable.
    #[default]
    Idle,
    /// Content, expansion, zoom, or available size changed; a measure pass is due.
    MeasurePending,
    /// Sizes are current but positions are not.
    ArrangePending,
}

/// Number of passes run since the host was created.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LayoutPasses {
    /// Measure passes.
    pub measure: u64,
    /// Arrange passes.
    pub arrange: u64,
}

/// Root surface of an item tree.
///
/// The host owns the top-level list and schedules layout. Collection edits
/// reach the tree as they happen but only raise a layout request; requests
/// only move the phase forward, and [`LayoutHost::update_layout`] runs at most
/// one measure and one arrange pass, however many arrived in between.
///
/// ## Example
///
/// ```rust
/// use understory_item_tree::ItemCollection;
/// use understory_layout_host::{HostConfig, LayoutHost, LayoutPhase};
///
/// let mut host = LayoutHost::block(HostConfig::default());
/// host.attach_root(ItemCollection::new());
/// host.invalidate_layout();
/// assert_eq!(host.phase(), LayoutPhase::MeasurePending);
/// assert!(host.update_layout());
/// assert_eq!(host.passes().measure, 1);
/// assert!(!host.update_layout());
/// ```
#[derive(Debug)]
pub struct LayoutHost {
    kind: HostKind,
    tree: ItemTree,
    root: Option<NodeId>,
    padding: Size,
    scroll: ScrollState,
    phase: LayoutPhase,
    passes: LayoutPasses,
    content_size: Size,
    selection: SelectionSet,
    focused: Option<NodeId>,
}

impl LayoutHost {
    /// Create a host of the given kind without a root.
    pub fn new(kind: HostKind, config: HostConfig) -> Self {
        Self {
            kind,
            tree: ItemTree::new(config.style),
            root: None,
            padding: config.padding,
            scroll: ScrollState::new(config.zoom),
            phase: LayoutPhase::Idle,
            passes: LayoutPasses::default(),
            content_size: Size::ZERO,
            selection: SelectionSet::default(),
            focused: None,
        }
    }

    /// A block-style host: vertical root, bounded by the viewport width.
    pub fn block(config: HostConfig) -> Self {
        Self::new(HostKind::Block, config)
    }

    /// A flow-style host: horizontal root, unbounded, centered vertically.
    pub fn flow(config: HostConfig) -> Self {
        Self::new(HostKind::Flow, config)
    }

    /// The host variant.
    pub fn kind(&self) -> HostKind {
        self.kind
    }

    /// The item tree.
    pub fn tree(&self) -> &ItemTree {
        &self.tree
    }

    /// The item tree, for edits not covered by the host API.
    ///
    /// Structural changes and selection toggles made through it are picked
    /// up by the next [`LayoutHost::update_layout`].
    pub fn tree_mut(&mut self) -> &mut ItemTree {
        &mut self.tree
    }

    /// The root list, if attached.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Current phase.
    pub fn phase(&self) -> LayoutPhase {
        self.phase
    }

    /// Pass counters.
    pub fn passes(&self) -> LayoutPasses {
        self.passes
    }

    /// Size of the root as of the last measure pass, in content units.
    pub fn content_size(&self) -> Size {
        self.content_size
    }

    /// Viewport, zoom, and scroll offset.
    pub fn scroll(&self) -> &ScrollState {
        &self.scroll
    }

    /// Returns `true` if [`LayoutHost::update_layout`] has work to do.
    pub fn needs_layout(&self) -> bool {
        self.phase != LayoutPhase::Idle || self.tree.is_layout_requested()
    }

    // --- root ---

    /// Build a root list over `collection`, replacing any previous root.
    pub fn attach_root(&mut self, collection: ItemCollection) -> NodeId {
        self.detach_root();
        let items = collection.len();
        let root = self
            .tree
            .insert_list(None, ListParts::new(self.kind.orientation()));
        self.tree.bind(root, Some(collection));
        self.tree.set_expanded(root, true);
        self.root = Some(root);
        debug!(?root, kind = ?self.kind, items, "attached root");
        self.invalidate_layout();
        root
    }

    /// Release and rebuild the root's children from its collection.
    ///
    /// A [`Reset`](understory_item_tree::CollectionChange::Reset) of the root
    /// collection leaves the root empty until this is called.
    pub fn realize_root(&mut self) {
        let Some(root) = self.root else {
            return;
        };
        self.tree.realize(root);
        debug!(?root, children = self.tree.children_of(root).len(), "realized root");
        self.prune_released();
        self.invalidate_layout();
    }

    /// Release the root and everything under it.
    pub fn detach_root(&mut self) {
        let Some(root) = self.root.take() else {
            return;
        };
        let released = self.tree.release(root);
        debug_assert!(released.is_ok(), "roots have no owner");
        self.tree.take_selection_changes();
        self.selection.clear();
        self.focused = None;
        self.content_size = Size::ZERO;
        debug!(?root, "detached root");
        self.invalidate_layout();
    }

    // --- scheduling ---

    /// Request a measure pass (and the arrange pass that follows it).
    pub fn invalidate_layout(&mut self) {
        if self.phase != LayoutPhase::MeasurePending {
            trace!(from = ?self.phase, "measure requested");
            self.phase = LayoutPhase::MeasurePending;
        }
    }

    /// Request an arrange pass only.
    pub fn invalidate_arrange(&mut self) {
        if self.phase == LayoutPhase::Idle {
            self.phase = LayoutPhase::ArrangePending;
        }
    }

    /// Pick up tree changes and run the outstanding passes.
    ///
    /// Returns `true` if any pass ran.
    pub fn update_layout(&mut self) -> bool {
        if self.tree.take_layout_request() {
            trace!("tree requested layout");
            self.invalidate_layout();
        }
        self.prune_released();

        let mut ran = false;
        if self.phase == LayoutPhase::MeasurePending {
            self.measure_pass();
            self.phase = LayoutPhase::ArrangePending;
            ran = true;
        }
        if self.phase == LayoutPhase::ArrangePending {
            self.arrange_pass();
            self.phase = LayoutPhase::Idle;
            ran = true;
        }
        ran
    }

    fn available(&self) -> Size {
        match self.kind {
            HostKind::Block => {
                let width = self.scroll.viewport_in_content().width;
                let width = if width > 0.0 { width } else { f64::INFINITY };
                Size::new(width, f64::INFINITY)
            }
            HostKind::Flow => Size::new(f64::INFINITY, f64::INFINITY),
        }
    }

    fn measure_pass(&mut self) {
        self.passes.measure += 1;
        let available = self.available();
        self.content_size = match self.root {
            Some(root) => self.tree.measure(root, available),
            None => Size::ZERO,
        };
        trace!(
            pass = self.passes.measure,
            ?available,
            content = ?self.content_size,
            "measure pass"
        );
    }

    fn arrange_pass(&mut self) {
        self.passes.arrange += 1;
        let Some(root) = self.root else {
            return;
        };
        let viewport = self.scroll.viewport_in_content();
        let content = self.content_size;
        let (allocated, mut origin) = match self.kind {
            HostKind::Block => (
                Size::new(content.width.max(viewport.width), content.height),
                Point::ORIGIN,
            ),
            HostKind::Flow => {
                let y = ((viewport.height - content.height) / 2.0).max(0.0);
                (content, Point::new(0.0, y))
            }
        };
        self.tree
            .arrange(root, allocated, &mut origin, Orientation::Vertical);
        trace!(pass = self.passes.arrange, ?allocated, "arrange pass");
    }

    // --- scrolling ---

    /// Scrollable extents in screen units: `content * zoom + padding`, never
    /// smaller than the scroll offset plus the viewport.
    pub fn calculate_scroll_extents(&self) -> Size {
        self.scroll.extents(self.content_size, self.padding)
    }

    /// Set the visible size in screen units.
    pub fn set_viewport(&mut self, viewport: Size) {
        if self.scroll.set_viewport(viewport) {
            self.invalidate_layout();
        }
    }

    /// Set the zoom factor.
    pub fn set_zoom(&mut self, zoom: f64) {
        if self.scroll.set_zoom(zoom) {
            debug!(zoom = self.scroll.zoom(), "zoom changed");
            self.invalidate_layout();
        }
    }

    /// Set the scroll offset in screen units. Layout is unaffected.
    pub fn set_scroll_offset(&mut self, offset: Vec2) {
        self.scroll.set_offset(offset);
    }

    /// Map a rectangle from content coordinates to screen coordinates.
    pub fn to_screen(&self, rect: Rect) -> Rect {
        self.scroll.to_screen(rect)
    }

    // --- selection ---

    /// Select or deselect a node. Returns `true` if the selection changed.
    pub fn set_selected(&mut self, id: NodeId, selected: bool) -> bool {
        let changed = self.tree.set_selected(id, selected);
        self.sync_selection();
        changed
    }

    /// Returns `true` if `id` is selected.
    pub fn is_selected(&self, id: NodeId) -> bool {
        self.tree.is_selected(id)
    }

    /// Selected nodes in selection order.
    pub fn selected(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.selection.iter()
    }

    /// Deselect everything.
    pub fn clear_selection(&mut self) {
        self.sync_selection();
        for id in self.selection.clear() {
            self.tree.set_selected(id, false);
        }
        self.tree.take_selection_changes();
    }

    /// The most recently selected node and its selection rectangle on screen.
    pub fn get_selected_visual(&self) -> Option<(NodeId, Rect)> {
        let id = self.selection.primary()?;
        let rect = self.tree.selection_rect(id)?;
        Some((id, self.scroll.to_screen(rect)))
    }

    /// Union of every selected node's selection rectangle on screen.
    pub fn selection_bounds(&self) -> Option<Rect> {
        self.selection
            .iter()
            .filter_map(|id| self.tree.selection_rect(id))
            .map(|r| self.scroll.to_screen(r))
            .reduce(|a, b| a.union(b))
    }

    // --- focus ---

    /// The node holding focus, if any.
    pub fn focused(&self) -> Option<NodeId> {
        self.focused.filter(|f| self.tree.is_alive(*f))
    }

    /// Focus `id`. Returns `false` if it is not a realized focus target.
    pub fn set_focus(&mut self, id: NodeId) -> bool {
        if !self.tree.is_focus_target(id) {
            return false;
        }
        self.focused = Some(id);
        true
    }

    /// Move focus in direction `nav`. Without a focused node, focus enters the root.
    ///
    /// Returns the new focus, or `None` if focus could not move.
    pub fn move_focus(&mut self, nav: Navigation) -> Option<NodeId> {
        let target = match self.focused() {
            Some(from) => self.tree.move_focus(from, nav),
            None => self.root.and_then(|r| self.tree.entry_point(r, nav)),
        };
        if target.is_some() {
            self.focused = target;
        }
        target
    }

    /// Select and focus the deepest realized node whose item's source range
    /// contains `range`, replacing the current selection.
    pub fn focus_visual_at(&mut self, range: Range<usize>) -> Option<NodeId> {
        let target = self.deepest_covering(&range)?;
        debug!(?range, node = ?target, "focusing source range");
        self.clear_selection();
        self.set_selected(target, true);
        self.focused = Some(target);
        Some(target)
    }

    fn deepest_covering(&self, range: &Range<usize>) -> Option<NodeId> {
        let root = self.root?;
        let mut best: Option<(usize, NodeId)> = None;
        let mut stack: SmallVec<[(NodeId, usize); 16]> = SmallVec::new();
        stack.push((root, 0));
        while let Some((id, depth)) = stack.pop() {
            if let Some(source) = self.tree.item_of(id).and_then(|i| i.source_range())
                && source.start <= range.start
                && range.end <= source.end
                && best.is_none_or(|(d, _)| depth > d)
            {
                best = Some((depth, id));
            }
            if let Some((list, secondary)) = self.tree.lists_of(id) {
                stack.extend(secondary.map(|s| (s, depth + 1)));
                stack.push((list, depth + 1));
            }
            stack.extend(self.tree.children_of(id).iter().rev().map(|c| (*c, depth + 1)));
        }
        best.map(|(_, id)| id)
    }

    // --- editing ---

    /// Check or uncheck a headered node's toggle.
    pub fn toggle(&mut self, id: NodeId, checked: bool) {
        self.tree.toggle(id, checked);
        self.prune_released();
        self.invalidate_layout();
    }

    /// Duplicate a node's item after it in its owner's collection.
    pub fn duplicate(&mut self, id: NodeId) -> Result<NodeId, LayoutError> {
        let copy = self.tree.duplicate(id)?;
        self.invalidate_layout();
        Ok(copy)
    }

    /// Fold selection toggles recorded by the tree into the selection order.
    fn sync_selection(&mut self) {
        for (id, selected) in self.tree.take_selection_changes() {
            if selected {
                self.selection.insert(id);
            } else {
                self.selection.remove(id);
            }
        }
    }

    fn prune_released(&mut self) {
        self.sync_selection();
        let tree = &self.tree;
        let dropped = self.selection.retain(|id| tree.is_alive(id));
        if dropped > 0 {
            debug!(dropped, "pruned released nodes from the selection");
        }
        if self.focused.is_some_and(|f| !tree.is_alive(f)) {
            self.focused = None;
        }
    }
}
