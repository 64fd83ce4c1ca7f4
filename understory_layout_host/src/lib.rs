// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Layout Host: the scrollable surface that drives an Understory item tree.
//!
//! A [`LayoutHost`] owns the root list of an [`ItemTree`](understory_item_tree::ItemTree)
//! and everything around it that depends on the surface rather than on the items:
//!
//! - Two variants: [`LayoutHost::block`] stacks a vertical root bounded by the viewport
//!   width; [`LayoutHost::flow`] chains a horizontal root, unbounded, centered vertically.
//! - A small phase machine (`Idle -> MeasurePending -> ArrangePending -> Idle`) that
//!   coalesces any number of requests into at most one pass of each kind.
//! - Zoom, viewport, and scroll offset, and scroll extents derived from them.
//! - The live selection set and its on-screen rectangles.
//! - Focus tracking, directional moves, and focusing by source range.
//!
//! ## Driving a host
//!
//! Call [`LayoutHost::update_layout`] once per frame (or whenever
//! [`LayoutHost::needs_layout`] says so). Collection edits have already
//! reached the tree by then; it picks up their layout requests, prunes
//! released nodes from the selection and focus, and runs the outstanding
//! passes. After the root collection is reset, call
//! [`LayoutHost::realize_root`] to rebuild it.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod host;
mod scroll;
mod selection;

pub use host::{HostConfig, HostKind, LayoutHost, LayoutPasses, LayoutPhase};
pub use scroll::{MIN_ZOOM, ScrollState};
