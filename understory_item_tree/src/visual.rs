// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The sizing contract for host-supplied visuals.

use alloc::boxed::Box;
use kurbo::{Rect, Size};

/// An opaque host visual that the tree can size and position.
///
/// The tree never paints. It asks a visual for its desired size, hands it a
/// final rectangle, tells it where it sits in the stacking order, and detaches
/// it exactly once when the owning node is released.
pub trait Visual {
    /// Compute the desired size given an upper bound. Either dimension of
    /// `available` may be `f64::INFINITY`.
    fn measure(&mut self, available: Size);

    /// The size computed by the last [`Visual::measure`].
    fn desired_size(&self) -> Size;

    /// Place the visual in its final rectangle (content coordinates).
    fn arrange(&mut self, rect: Rect);

    /// Update the paint and hit-test order. Higher is drawn on top.
    fn set_z_index(&mut self, _z: i32) {}

    /// Remove the visual from the host surface.
    fn detach(&mut self) {}
}

/// Boxed visual as stored by nodes.
pub type BoxedVisual = Box<dyn Visual>;

/// Measure `visual` and return its desired size.
pub(crate) fn measure_visual(visual: &mut dyn Visual, available: Size) -> Size {
    visual.measure(available);
    visual.desired_size()
}
