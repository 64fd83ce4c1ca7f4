// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Two-pass layout: `measure` computes sizes bottom-up, `arrange` assigns rectangles top-down.
//!
//! Stacking order is assigned during `measure`: every node sits one step
//! above its owner. Within a node, backgrounds sit one step below the node,
//! bracket, overlay and drop-indicator visuals one step above, and a headered
//! node's header and toggle above its lists.

use core::iter;

use kurbo::{Point, Rect, Size};
use smallvec::SmallVec;

use crate::node::{ListShape, NodeBody};
use crate::tree::{ItemTree, TreeCore, Z_STEP};
use crate::types::{NodeFlags, NodeId, Orientation};
use crate::visual::measure_visual;

fn max_size(a: Size, b: Size) -> Size {
    Size::new(a.width.max(b.width), a.height.max(b.height))
}

impl ItemTree {
    /// Compute and store the size of `id` and its realized subtree.
    ///
    /// Either dimension of `available` may be `f64::INFINITY`. Measuring an
    /// unchanged subtree twice with the same input yields the same size.
    pub fn measure(&mut self, id: NodeId, available: Size) -> Size {
        self.update(|t| t.measure(id, available))
    }

    /// Place `id` at `offset` with the final `allocated` size, then advance
    /// `offset` along `axis` past it.
    ///
    /// `axis` is the orientation of the owning list; roots are placed on the
    /// vertical axis.
    pub fn arrange(&mut self, id: NodeId, allocated: Size, offset: &mut Point, axis: Orientation) {
        self.update(|t| t.arrange(id, allocated, offset, axis));
    }

    /// Measure `root` against `available` and arrange it at the origin.
    ///
    /// Returns the measured size.
    pub fn layout(&mut self, root: NodeId, available: Size) -> Size {
        self.update(|t| {
            let size = t.measure(root, available);
            t.arrange(root, size, &mut Point::ORIGIN, Orientation::Vertical);
            size
        })
    }
}

impl TreeCore {
    pub(crate) fn measure(&mut self, id: NodeId, available: Size) -> Size {
        let Some(node) = self.node_opt(id) else {
            return Size::ZERO;
        };
        let z = match node.owner {
            Some(owner) => self.node(owner).z_index + Z_STEP,
            None => node.z_index,
        };
        let node = self.node_mut(id);
        node.z_index = z;
        let size = match &mut node.body {
            NodeBody::Leaf(visual) => {
                visual.set_z_index(z);
                measure_visual(visual.as_mut(), available)
            }
            NodeBody::List(_) => self.measure_list(id, available, z),
            NodeBody::Headered(_) => self.measure_headered(id, available, z),
        };
        let node = self.node_mut(id);
        node.size = size;
        node.flags.insert(NodeFlags::MEASURED);
        size
    }

    pub(crate) fn arrange(
        &mut self,
        id: NodeId,
        allocated: Size,
        offset: &mut Point,
        axis: Orientation,
    ) {
        let Some(node) = self.node_opt_mut(id) else {
            return;
        };
        debug_assert!(
            node.flags.contains(NodeFlags::MEASURED),
            "arrange called before measure on {id:?}"
        );
        let rect = Rect::from_origin_size(*offset, allocated);
        node.rect = rect;
        axis.advance(offset, axis.along(allocated));
        if let NodeBody::Leaf(visual) = &mut node.body {
            visual.arrange(rect);
            return;
        }
        if matches!(node.body, NodeBody::List(_)) {
            self.arrange_list(id, rect);
        } else {
            self.arrange_headered(id, rect);
        }
    }

    fn measure_list(&mut self, id: NodeId, available: Size, z: i32) -> Size {
        let style = *self.style();
        let list = self.list_mut(id);
        let orientation = list.orientation;
        let expanded = list.expanded;
        let children: SmallVec<[NodeId; 8]> = list.children.iter().copied().collect();

        let child_available = match orientation {
            Orientation::Horizontal => Size::new(f64::INFINITY, available.height),
            Orientation::Vertical => Size::new(available.width, f64::INFINITY),
        };
        let mut along = 0.0;
        let mut cross = 0.0_f64;
        if expanded {
            along = style.drop_margin;
            for (i, child) in children.into_iter().enumerate() {
                if i > 0 {
                    along += style.item_spacing;
                }
                let size = self.measure(child, child_available);
                along += orientation.along(size);
                cross = cross.max(orientation.cross(size));
            }
        }
        let mut content = orientation.size(along, cross);

        let list = self.list_mut(id);
        if expanded {
            if let Some(background) = list.background.as_mut() {
                background.set_z_index(z - Z_STEP);
                content = max_size(content, measure_visual(background.as_mut(), content));
            }
            if let Some(indicator) = list.drop_indicator.as_mut() {
                indicator.set_z_index(z + Z_STEP);
                let strip = orientation.size(style.drop_margin, orientation.cross(content));
                measure_visual(indicator.as_mut(), strip);
            }
        }
        list.content_size = content;

        match &mut list.shape {
            ListShape::Plain => content,
            ListShape::Enclosed { front, back } => {
                front.set_z_index(z + Z_STEP);
                back.set_z_index(z + Z_STEP);
                let f = measure_visual(front.as_mut(), available);
                let b = measure_visual(back.as_mut(), available);
                Size::new(
                    f.width + content.width + b.width,
                    f.height.max(content.height).max(b.height),
                )
            }
            ListShape::Overlay { overlay } => {
                overlay.set_z_index(z + Z_STEP);
                let bound = orientation.size(f64::INFINITY, orientation.cross(content));
                let o = measure_visual(overlay.as_mut(), bound);
                orientation.size(
                    orientation.along(o) + orientation.along(content),
                    orientation.cross(content).max(orientation.cross(o)),
                )
            }
        }
    }

    fn measure_headered(&mut self, id: NodeId, available: Size, z: i32) -> Size {
        let style = *self.style();
        let h = self.headered_mut(id);
        h.header.set_z_index(z + 2 * Z_STEP);
        h.toggle.set_z_index(z + 3 * Z_STEP);
        let header = measure_visual(h.header.as_mut(), available);
        let toggle = measure_visual(h.toggle.as_mut(), available);
        let (list, secondary) = (h.list, h.secondary);

        let list_size = self.measure(list, available);
        let secondary_size = secondary.map_or(Size::ZERO, |s| self.measure(s, available));

        let width = (toggle.width + style.header_spacing + header.width)
            .max(list_size.width)
            .max(secondary_size.width);
        let mut height = header.height.max(toggle.height);
        if self.is_expanded(list) {
            height += list_size.height + secondary_size.height + style.expanded_margin;
        }
        Size::new(width, height)
    }

    fn arrange_list(&mut self, id: NodeId, rect: Rect) {
        let style = *self.style();
        let list = self.list_mut(id);
        let orientation = list.orientation;
        let content = list.content_size;

        let content_rect = match &mut list.shape {
            ListShape::Plain => rect,
            ListShape::Enclosed { front, back } => {
                let f = front.desired_size();
                let b = back.desired_size();
                front.arrange(Rect::from_origin_size(
                    rect.origin(),
                    Size::new(f.width, rect.height()),
                ));
                back.arrange(Rect::from_origin_size(
                    Point::new(rect.x1 - b.width, rect.y0),
                    Size::new(b.width, rect.height()),
                ));
                let width = (rect.width() - f.width - b.width).max(content.width);
                let y = rect.y0 + ((rect.height() - content.height) / 2.0).max(0.0);
                Rect::from_origin_size(
                    Point::new(rect.x0 + f.width, y),
                    Size::new(width, content.height),
                )
            }
            ListShape::Overlay { overlay } => {
                let lead = orientation.along(overlay.desired_size());
                let cross = orientation.cross(rect.size());
                overlay.arrange(Rect::from_origin_size(
                    rect.origin(),
                    orientation.size(lead, cross),
                ));
                let mut origin = rect.origin();
                orientation.advance(&mut origin, lead);
                let along = (orientation.along(rect.size()) - lead).max(0.0);
                Rect::from_origin_size(origin, orientation.size(along, cross))
            }
        };

        if !list.expanded {
            return;
        }
        let cross = orientation.cross(content_rect.size());
        if let Some(indicator) = list.drop_indicator.as_mut() {
            indicator.arrange(Rect::from_origin_size(
                content_rect.origin(),
                orientation.size(style.drop_margin, cross),
            ));
        }
        let mut cursor = content_rect.origin();
        orientation.advance(&mut cursor, style.drop_margin);
        if let Some(background) = list.background.as_mut() {
            let along = (orientation.along(content_rect.size()) - style.drop_margin).max(0.0);
            background.arrange(Rect::from_origin_size(
                cursor,
                orientation.size(along, cross),
            ));
        }

        let children: SmallVec<[NodeId; 8]> = list.children.iter().copied().collect();
        for (i, child) in children.into_iter().enumerate() {
            if i > 0 {
                orientation.advance(&mut cursor, style.item_spacing);
            }
            let along = self.size(child).map_or(0.0, |s| orientation.along(s));
            self.arrange(child, orientation.size(along, cross), &mut cursor, orientation);
        }
    }

    fn arrange_headered(&mut self, id: NodeId, rect: Rect) {
        let style = *self.style();
        let h = self.headered_mut(id);
        let header = h.header.desired_size();
        let toggle = h.toggle.desired_size();
        let row = header.height.max(toggle.height);

        // Toggle and header are centered as one block; the toggle sits on the
        // header's vertical center.
        let block = toggle.width + style.header_spacing + header.width;
        let x = rect.x0 + ((rect.width() - block) / 2.0).max(0.0);
        let header_y = rect.y0 + (row - header.height) / 2.0;
        let header_rect = Rect::from_origin_size(
            Point::new(x + toggle.width + style.header_spacing, header_y),
            header,
        );
        let toggle_y = header_y + (header.height - toggle.height) / 2.0;
        let toggle_rect = Rect::from_origin_size(Point::new(x, toggle_y), toggle);
        h.header.arrange(header_rect);
        h.toggle.arrange(toggle_rect);
        h.header_rect = header_rect;
        h.toggle_rect = toggle_rect;
        let (list, secondary) = (h.list, h.secondary);

        let mut cursor = Point::new(rect.x0, rect.y0 + row);
        let mut selection = header_rect.union(toggle_rect);
        for l in iter::once(list).chain(secondary) {
            let height = self.size(l).map_or(0.0, |s| s.height);
            self.arrange(l, Size::new(rect.width(), height), &mut cursor, Orientation::Vertical);
            if self.is_expanded(l)
                && let Some(r) = self.rect(l)
            {
                selection = selection.union(r);
            }
        }
        self.headered_mut(id).selection_rect = selection;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::ItemCollection;
    use crate::item::{Item, ItemRef, ListParts, RealizeCx};
    use crate::test_support::{
        Block, Group, HEADER, Loop, LOOP_BRACKET, OVERLAY, Probe, Statement, TOGGLE,
        VisualCounter, root_list,
    };
    use crate::types::LayoutStyle;
    use alloc::rc::Rc;
    use alloc::vec;
    use alloc::vec::Vec;

    fn three(counter: &VisualCounter) -> Vec<ItemRef> {
        vec![
            Statement::new(counter, 5.0, 10.0),
            Statement::new(counter, 6.0, 20.0),
            Statement::new(counter, 7.0, 30.0),
        ]
    }

    #[test]
    fn vertical_and_horizontal_accumulation() {
        let counter = VisualCounter::default();
        let mut tree = ItemTree::new(LayoutStyle::ZERO);

        let v = ItemCollection::from_items(three(&counter));
        let root = root_list(&mut tree, Orientation::Vertical, &v);
        let size = tree.measure(root, Size::new(100.0, f64::INFINITY));
        assert_eq!(size.height, 60.0);
        assert_eq!(size.width, 7.0);

        let h = ItemCollection::from_items(three(&counter));
        let root = root_list(&mut tree, Orientation::Horizontal, &h);
        let size = tree.measure(root, Size::new(f64::INFINITY, 100.0));
        assert_eq!(size, Size::new(18.0, 30.0));
    }

    #[test]
    fn margins_and_spacing() {
        let counter = VisualCounter::default();
        let style = LayoutStyle {
            item_spacing: 2.0,
            drop_margin: 4.0,
            ..LayoutStyle::ZERO
        };
        let mut tree = ItemTree::new(style);
        let coll = ItemCollection::from_items(three(&counter));
        let root = root_list(&mut tree, Orientation::Vertical, &coll);
        assert_eq!(tree.measure(root, Size::new(100.0, 100.0)).height, 4.0 + 60.0 + 4.0);

        let empty = ItemCollection::new();
        let list = root_list(&mut tree, Orientation::Vertical, &empty);
        assert_eq!(tree.measure(list, Size::new(100.0, 100.0)), Size::new(0.0, 4.0));

        tree.set_expanded(list, false);
        assert_eq!(tree.measure(list, Size::new(100.0, 100.0)), Size::ZERO);
    }

    #[test]
    fn measure_is_idempotent() {
        let counter = VisualCounter::default();
        let coll = ItemCollection::from_items(vec![
            Statement::new(&counter, 5.0, 10.0),
            Block::new(&counter, three(&counter)),
            Loop::new(&counter, three(&counter)),
            Group::new(&counter, three(&counter)),
        ]);
        let mut tree = ItemTree::new(LayoutStyle::default());
        let root = root_list(&mut tree, Orientation::Vertical, &coll);
        let available = Size::new(200.0, f64::INFINITY);
        let first = tree.measure(root, available);
        let second = tree.measure(root, available);
        assert_eq!(first, second);
    }

    #[test]
    fn z_index_increases_with_depth() {
        let counter = VisualCounter::default();
        let coll = ItemCollection::from_items(vec![
            Block::new(&counter, vec![Loop::new(&counter, three(&counter))]),
            Group::new(&counter, three(&counter)),
        ]);
        let mut tree = ItemTree::new(LayoutStyle::default());
        let root = root_list(&mut tree, Orientation::Vertical, &coll);
        tree.measure(root, Size::new(200.0, f64::INFINITY));

        let mut stack = vec![root];
        let mut seen = 0;
        while let Some(id) = stack.pop() {
            seen += 1;
            if let Some(owner) = tree.owner_of(id) {
                assert!(tree.z_index(id).unwrap() > tree.z_index(owner).unwrap());
            }
            stack.extend(tree.children_of(id));
            if let Some((list, secondary)) = tree.lists_of(id) {
                stack.push(list);
                stack.extend(secondary);
            }
        }
        assert!(seen > 10);
    }

    #[test]
    fn background_sits_behind_and_can_enlarge() {
        let counter = VisualCounter::default();
        let (background, bg_probe) = Probe::visual(&counter, 40.0, 5.0);
        let (indicator, ind_probe) = Probe::visual(&counter, 0.0, 0.0);
        let coll = ItemCollection::from_items(three(&counter));
        let style = LayoutStyle {
            drop_margin: 4.0,
            ..LayoutStyle::ZERO
        };
        let mut tree = ItemTree::new(style);
        let root = tree.insert_list(
            None,
            ListParts::new(Orientation::Vertical)
                .with_background(background)
                .with_drop_indicator(indicator),
        );
        tree.bind(root, Some(coll));
        tree.set_expanded(root, true);

        let size = tree.layout(root, Size::new(100.0, f64::INFINITY));
        assert_eq!(size, Size::new(40.0, 64.0));

        let root_z = tree.z_index(root).unwrap();
        let child_z = tree.z_index(tree.children_of(root)[0]).unwrap();
        assert_eq!(bg_probe.z(), root_z - 1);
        assert!(bg_probe.z() < child_z);
        assert_eq!(ind_probe.z(), child_z);

        assert_eq!(ind_probe.rect(), Rect::new(0.0, 0.0, 40.0, 4.0));
        assert_eq!(bg_probe.rect(), Rect::new(0.0, 4.0, 40.0, 64.0));
    }

    #[test]
    fn arrange_walks_children_along_axis() {
        let counter = VisualCounter::default();
        let style = LayoutStyle {
            item_spacing: 2.0,
            ..LayoutStyle::ZERO
        };
        let mut tree = ItemTree::new(style);

        let v = ItemCollection::from_items(three(&counter));
        let root = root_list(&mut tree, Orientation::Vertical, &v);
        tree.layout(root, Size::new(50.0, f64::INFINITY));
        let rects: Vec<Rect> = tree
            .children_of(root)
            .iter()
            .map(|c| tree.rect(*c).unwrap())
            .collect();
        assert_eq!(rects[0], Rect::new(0.0, 0.0, 7.0, 10.0));
        assert_eq!(rects[1], Rect::new(0.0, 12.0, 7.0, 32.0));
        assert_eq!(rects[2], Rect::new(0.0, 34.0, 7.0, 64.0));

        let h = ItemCollection::from_items(three(&counter));
        let root = root_list(&mut tree, Orientation::Horizontal, &h);
        tree.measure(root, Size::new(f64::INFINITY, 100.0));
        let mut offset = Point::new(10.0, 10.0);
        tree.arrange(root, Size::new(22.0, 30.0), &mut offset, Orientation::Vertical);
        assert_eq!(offset, Point::new(10.0, 40.0));
        let rects: Vec<Rect> = tree
            .children_of(root)
            .iter()
            .map(|c| tree.rect(*c).unwrap())
            .collect();
        assert_eq!(rects[0], Rect::new(10.0, 10.0, 15.0, 40.0));
        assert_eq!(rects[1], Rect::new(17.0, 10.0, 23.0, 40.0));
        assert_eq!(rects[2], Rect::new(25.0, 10.0, 32.0, 40.0));
    }

    #[test]
    fn headered_measure_and_arrange() {
        let counter = VisualCounter::default();
        let style = LayoutStyle {
            header_spacing: 4.0,
            expanded_margin: 6.0,
            ..LayoutStyle::ZERO
        };
        let block = Block::new(
            &counter,
            vec![Statement::new(&counter, 100.0, 10.0), Statement::new(&counter, 20.0, 10.0)],
        );
        let coll = ItemCollection::from_items(vec![block]);
        let mut tree = ItemTree::new(style);
        let root = root_list(&mut tree, Orientation::Vertical, &coll);
        let node = tree.children_of(root)[0];

        let size = tree.layout(root, Size::new(300.0, f64::INFINITY));
        let row = HEADER.height.max(TOGGLE.height);
        assert_eq!(size, Size::new(100.0, row + 20.0 + 6.0));

        let [header, toggle] = tree.header_group_rects(node).unwrap();
        let block_width = TOGGLE.width + 4.0 + HEADER.width;
        let x = (100.0 - block_width) / 2.0;
        assert_eq!(toggle.x0, x);
        assert_eq!(header.x0, x + TOGGLE.width + 4.0);
        assert_eq!(toggle.center().y, header.center().y);

        let (list, _) = tree.lists_of(node).unwrap();
        assert_eq!(tree.rect(list).unwrap(), Rect::new(0.0, row, 100.0, row + 20.0));
        let selection = tree.selection_rect(node).unwrap();
        assert!(selection.contains_rect(header));
        assert!(selection.contains_rect(tree.rect(list).unwrap()));

        tree.toggle(node, false);
        let size = tree.layout(root, Size::new(300.0, f64::INFINITY));
        assert_eq!(size, Size::new(block_width, row));
        let [header, toggle] = tree.header_group_rects(node).unwrap();
        assert_eq!(tree.selection_rect(node).unwrap(), header.union(toggle));
    }

    #[test]
    fn enclosed_list_flanks_and_centers() {
        let counter = VisualCounter::default();
        let coll = ItemCollection::from_items(vec![Loop::new(
            &counter,
            vec![Statement::new(&counter, 10.0, 4.0), Statement::new(&counter, 10.0, 8.0)],
        )]);
        let mut tree = ItemTree::new(LayoutStyle::ZERO);
        let root = root_list(&mut tree, Orientation::Vertical, &coll);
        let node = tree.children_of(root)[0];

        tree.layout(root, Size::new(300.0, f64::INFINITY));
        let size = tree.size(node).unwrap();
        assert_eq!(size.width, LOOP_BRACKET.width * 2.0 + 20.0);
        assert_eq!(size.height, LOOP_BRACKET.height.max(8.0));

        let inner = tree.children_of(node);
        let first = tree.rect(inner[0]).unwrap();
        assert_eq!(first.x0, LOOP_BRACKET.width);
        let content_top = (LOOP_BRACKET.height - 8.0) / 2.0;
        assert_eq!(first.y0, content_top);
        assert_eq!(tree.rect(inner[1]).unwrap().x0, LOOP_BRACKET.width + 10.0);
    }

    #[test]
    fn overlay_precedes_content() {
        let counter = VisualCounter::default();
        let coll = ItemCollection::from_items(vec![Group::new(
            &counter,
            vec![Statement::new(&counter, 10.0, 30.0)],
        )]);
        let mut tree = ItemTree::new(LayoutStyle::ZERO);
        let root = root_list(&mut tree, Orientation::Vertical, &coll);
        let node = tree.children_of(root)[0];

        tree.layout(root, Size::new(300.0, f64::INFINITY));
        assert_eq!(
            tree.size(node).unwrap(),
            Size::new(10.0, OVERLAY.height + 30.0)
        );
        let child = tree.children_of(node)[0];
        assert_eq!(tree.rect(child).unwrap().y0, OVERLAY.height);
    }

    #[test]
    fn enclosed_content_taller_than_brackets_sets_the_height() {
        let counter = VisualCounter::default();
        let coll = ItemCollection::from_items(vec![Loop::new(
            &counter,
            vec![Statement::new(&counter, 10.0, 30.0)],
        )]);
        let mut tree = ItemTree::new(LayoutStyle::ZERO);
        let root = root_list(&mut tree, Orientation::Vertical, &coll);
        let node = tree.children_of(root)[0];

        tree.layout(root, Size::new(300.0, f64::INFINITY));
        assert_eq!(
            tree.size(node).unwrap(),
            Size::new(LOOP_BRACKET.width * 2.0 + 10.0, 30.0)
        );
        let child = tree.rect(tree.children_of(node)[0]).unwrap();
        assert_eq!(
            child,
            Rect::new(LOOP_BRACKET.width, 0.0, LOOP_BRACKET.width + 10.0, 30.0)
        );
        assert!(tree.rect(node).unwrap().contains_rect(child));
    }

    struct Framed {
        counter: VisualCounter,
        body: ItemCollection,
        background: Size,
        overlay_probe: Probe,
        background_probe: Probe,
    }

    impl Item for Framed {
        fn create_default_ui(&self, cx: RealizeCx<'_>) -> NodeId {
            cx.overlay(
                self.overlay_probe.boxed(&self.counter, OVERLAY),
                ListParts::new(Orientation::Vertical)
                    .with_background(self.background_probe.boxed(&self.counter, self.background)),
                Some(self.body.clone()),
            )
        }
    }

    #[test]
    fn overlay_spans_a_background_wider_than_the_children() {
        let counter = VisualCounter::default();
        let framed = Rc::new(Framed {
            counter: counter.clone(),
            body: ItemCollection::from_items(vec![Statement::new(&counter, 10.0, 30.0)]),
            background: Size::new(40.0, 5.0),
            overlay_probe: Probe::default(),
            background_probe: Probe::default(),
        });
        let coll = ItemCollection::from_items(vec![framed.clone() as ItemRef]);
        let mut tree = ItemTree::new(LayoutStyle::ZERO);
        let root = root_list(&mut tree, Orientation::Vertical, &coll);
        let node = tree.children_of(root)[0];

        tree.layout(root, Size::new(300.0, f64::INFINITY));
        assert_eq!(tree.size(node).unwrap(), Size::new(40.0, OVERLAY.height + 30.0));
        assert_eq!(
            framed.overlay_probe.rect(),
            Rect::new(0.0, 0.0, 40.0, OVERLAY.height)
        );
        assert_eq!(
            framed.background_probe.rect(),
            Rect::new(0.0, OVERLAY.height, 40.0, OVERLAY.height + 30.0)
        );
        let child = tree.children_of(node)[0];
        assert_eq!(tree.rect(child).unwrap().width(), 40.0);
    }

    #[test]
    fn release_after_layout_detaches_everything() {
        let counter = VisualCounter::default();
        let coll = ItemCollection::from_items(vec![
            Block::new(&counter, vec![Loop::new(&counter, three(&counter))]),
            Group::new(&counter, three(&counter)),
        ]);
        let mut tree = ItemTree::new(LayoutStyle::default());
        let root = root_list(&mut tree, Orientation::Vertical, &coll);
        tree.layout(root, Size::new(200.0, f64::INFINITY));
        assert!(counter.live() > 0);
        assert_eq!(tree.release(root), Ok(()));
        assert_eq!(counter.live(), 0);
        assert!(tree.is_empty());
    }
}
