// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fixed-size visuals and a small item vocabulary shared by the unit tests.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use kurbo::{Rect, Size};

use crate::collection::ItemCollection;
use crate::item::{HeaderedParts, Item, ItemRef, ListParts, RealizeCx};
use crate::tree::ItemTree;
use crate::types::{NodeId, Orientation};
use crate::visual::{BoxedVisual, Visual};

pub(crate) const HEADER: Size = Size::new(50.0, 10.0);
pub(crate) const TOGGLE: Size = Size::new(10.0, 10.0);
pub(crate) const LOOP_BRACKET: Size = Size::new(5.0, 20.0);
pub(crate) const OVERLAY: Size = Size::new(8.0, 8.0);

/// Number of visuals currently attached.
#[derive(Clone, Default)]
pub(crate) struct VisualCounter(Rc<Cell<usize>>);

impl VisualCounter {
    pub(crate) fn live(&self) -> usize {
        self.0.get()
    }
}

#[derive(Default)]
struct ProbeState {
    rect: Rect,
    z: i32,
}

/// Read-back handle for a visual's last arrange and z index.
#[derive(Clone, Default)]
pub(crate) struct Probe(Rc<RefCell<ProbeState>>);

impl Probe {
    pub(crate) fn visual(counter: &VisualCounter, w: f64, h: f64) -> (BoxedVisual, Self) {
        let probe = Self::default();
        (probe.boxed(counter, Size::new(w, h)), probe)
    }

    /// A fresh visual reporting to this probe.
    pub(crate) fn boxed(&self, counter: &VisualCounter, size: Size) -> BoxedVisual {
        let mut visual = FixedVisual::new(counter, size);
        visual.probe = Some(self.clone());
        Box::new(visual)
    }

    pub(crate) fn rect(&self) -> Rect {
        self.0.borrow().rect
    }

    pub(crate) fn z(&self) -> i32 {
        self.0.borrow().z
    }
}

pub(crate) struct FixedVisual {
    size: Size,
    desired: Size,
    counter: VisualCounter,
    probe: Option<Probe>,
    detached: bool,
}

impl FixedVisual {
    pub(crate) fn new(counter: &VisualCounter, size: Size) -> Self {
        counter.0.set(counter.0.get() + 1);
        Self {
            size,
            desired: Size::ZERO,
            counter: counter.clone(),
            probe: None,
            detached: false,
        }
    }

    pub(crate) fn boxed(counter: &VisualCounter, size: Size) -> BoxedVisual {
        Box::new(Self::new(counter, size))
    }
}

impl Visual for FixedVisual {
    fn measure(&mut self, _available: Size) {
        self.desired = self.size;
    }

    fn desired_size(&self) -> Size {
        self.desired
    }

    fn arrange(&mut self, rect: Rect) {
        if let Some(probe) = &self.probe {
            probe.0.borrow_mut().rect = rect;
        }
    }

    fn set_z_index(&mut self, z: i32) {
        if let Some(probe) = &self.probe {
            probe.0.borrow_mut().z = z;
        }
    }

    fn detach(&mut self) {
        assert!(!self.detached, "visual detached twice");
        self.detached = true;
        self.counter.0.set(self.counter.0.get() - 1);
    }
}

/// A single-line statement.
pub(crate) struct Statement {
    counter: VisualCounter,
    size: Size,
    duplicable: bool,
}

impl Statement {
    pub(crate) fn new(counter: &VisualCounter, w: f64, h: f64) -> ItemRef {
        Rc::new(Self {
            counter: counter.clone(),
            size: Size::new(w, h),
            duplicable: false,
        })
    }

    pub(crate) fn duplicable(counter: &VisualCounter, w: f64, h: f64) -> ItemRef {
        Rc::new(Self {
            counter: counter.clone(),
            size: Size::new(w, h),
            duplicable: true,
        })
    }
}

impl Item for Statement {
    fn create_default_ui(&self, cx: RealizeCx<'_>) -> NodeId {
        cx.leaf(FixedVisual::boxed(&self.counter, self.size))
    }

    fn duplicate(&self) -> Option<ItemRef> {
        self.duplicable.then(|| {
            Rc::new(Self {
                counter: self.counter.clone(),
                size: self.size,
                duplicable: true,
            }) as ItemRef
        })
    }
}

/// A collapsible block with an optional alternate branch.
pub(crate) struct Block {
    counter: VisualCounter,
    children: ItemCollection,
    alternate: Option<ItemCollection>,
}

impl Block {
    pub(crate) fn new(counter: &VisualCounter, children: Vec<ItemRef>) -> ItemRef {
        Self::with_children(counter, ItemCollection::from_items(children))
    }

    pub(crate) fn with_children(counter: &VisualCounter, children: ItemCollection) -> ItemRef {
        Rc::new(Self {
            counter: counter.clone(),
            children,
            alternate: None,
        })
    }

    pub(crate) fn conditional(
        counter: &VisualCounter,
        then_branch: Vec<ItemRef>,
        else_branch: Vec<ItemRef>,
    ) -> ItemRef {
        Rc::new(Self {
            counter: counter.clone(),
            children: ItemCollection::from_items(then_branch),
            alternate: Some(ItemCollection::from_items(else_branch)),
        })
    }
}

impl Item for Block {
    fn create_default_ui(&self, cx: RealizeCx<'_>) -> NodeId {
        cx.headered(HeaderedParts {
            header: FixedVisual::boxed(&self.counter, HEADER),
            toggle: FixedVisual::boxed(&self.counter, TOGGLE),
            list: ListParts::new(Orientation::Vertical),
            secondary: self
                .alternate
                .as_ref()
                .map(|_| ListParts::new(Orientation::Vertical)),
            expanded: true,
        })
    }

    fn children(&self) -> Option<ItemCollection> {
        Some(self.children.clone())
    }

    fn alternate_children(&self) -> Option<ItemCollection> {
        self.alternate.clone()
    }
}

/// A bracketed horizontal body.
pub(crate) struct Loop {
    counter: VisualCounter,
    body: ItemCollection,
}

impl Loop {
    pub(crate) fn new(counter: &VisualCounter, body: Vec<ItemRef>) -> ItemRef {
        Rc::new(Self {
            counter: counter.clone(),
            body: ItemCollection::from_items(body),
        })
    }
}

impl Item for Loop {
    fn create_default_ui(&self, cx: RealizeCx<'_>) -> NodeId {
        cx.enclosed(
            FixedVisual::boxed(&self.counter, LOOP_BRACKET),
            FixedVisual::boxed(&self.counter, LOOP_BRACKET),
            ListParts::new(Orientation::Horizontal),
            Some(self.body.clone()),
        )
    }
}

/// A vertical group behind a marker.
pub(crate) struct Group {
    counter: VisualCounter,
    body: ItemCollection,
}

impl Group {
    pub(crate) fn new(counter: &VisualCounter, body: Vec<ItemRef>) -> ItemRef {
        Rc::new(Self {
            counter: counter.clone(),
            body: ItemCollection::from_items(body),
        })
    }
}

impl Item for Group {
    fn create_default_ui(&self, cx: RealizeCx<'_>) -> NodeId {
        cx.overlay(
            FixedVisual::boxed(&self.counter, OVERLAY),
            ListParts::new(Orientation::Vertical),
            Some(self.body.clone()),
        )
    }
}

/// An expanded root list mirroring `collection`.
pub(crate) fn root_list(
    tree: &mut ItemTree,
    orientation: Orientation,
    collection: &ItemCollection,
) -> NodeId {
    let root = tree.insert_list(None, ListParts::new(orientation));
    tree.bind(root, Some(collection.clone()));
    tree.set_expanded(root, true);
    root
}

/// Returns `true` if the children of `list` are index-aligned with `collection`.
pub(crate) fn bindings_match(tree: &ItemTree, list: NodeId, collection: &ItemCollection) -> bool {
    let children = tree.children_of(list);
    children.len() == collection.len()
        && children.iter().enumerate().all(|(i, child)| {
            match (tree.item_of(*child), collection.get(i)) {
                (Some(bound), Some(item)) => Rc::ptr_eq(&bound, &item),
                _ => false,
            }
        })
}
