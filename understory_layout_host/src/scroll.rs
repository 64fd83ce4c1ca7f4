// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Viewport, zoom, and scroll offset of a layout surface.

use kurbo::{Rect, Size, Vec2};

/// Smallest accepted zoom factor.
pub const MIN_ZOOM: f64 = 0.05;

/// Scroll state in screen units.
///
/// Content coordinates are scaled by `zoom` and then translated by the scroll
/// offset to land on screen.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ScrollState {
    viewport: Size,
    offset: Vec2,
    zoom: f64,
}

impl Default for ScrollState {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl ScrollState {
    /// A zero-sized viewport at the origin with the given zoom.
    pub fn new(zoom: f64) -> Self {
        Self {
            viewport: Size::ZERO,
            offset: Vec2::ZERO,
            zoom: zoom.max(MIN_ZOOM),
        }
    }

    /// The visible size.
    #[must_use]
    pub const fn viewport(&self) -> Size {
        self.viewport
    }

    /// Sets the visible size. Returns `true` if it changed.
    pub fn set_viewport(&mut self, viewport: Size) -> bool {
        let viewport = Size::new(viewport.width.max(0.0), viewport.height.max(0.0));
        if viewport == self.viewport {
            return false;
        }
        self.viewport = viewport;
        true
    }

    /// The scroll offset.
    #[must_use]
    pub const fn offset(&self) -> Vec2 {
        self.offset
    }

    /// Sets the scroll offset, clamped to be non-negative. Returns `true` if it changed.
    pub fn set_offset(&mut self, offset: Vec2) -> bool {
        let offset = Vec2::new(offset.x.max(0.0), offset.y.max(0.0));
        if offset == self.offset {
            return false;
        }
        self.offset = offset;
        true
    }

    /// The zoom factor.
    #[must_use]
    pub const fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Sets the zoom factor, clamped to [`MIN_ZOOM`]. Returns `true` if it changed.
    pub fn set_zoom(&mut self, zoom: f64) -> bool {
        let zoom = zoom.max(MIN_ZOOM);
        if zoom == self.zoom {
            return false;
        }
        self.zoom = zoom;
        true
    }

    /// The viewport expressed in content units.
    pub fn viewport_in_content(&self) -> Size {
        self.viewport / self.zoom
    }

    /// Scrollable extents for content of size `content`.
    ///
    /// The extents are `content * zoom + padding`, but never smaller than the
    /// current offset plus the viewport, so the user can always scroll back to
    /// where they were.
    pub fn extents(&self, content: Size, padding: Size) -> Size {
        let scaled = content * self.zoom + padding;
        Size::new(
            scaled.width.max(self.offset.x + self.viewport.width),
            scaled.height.max(self.offset.y + self.viewport.height),
        )
    }

    /// Map a rectangle from content coordinates to screen coordinates.
    pub fn to_screen(&self, rect: Rect) -> Rect {
        rect.scale_from_origin(self.zoom) - self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extents_scale_and_pad() {
        let scroll = ScrollState::new(2.0);
        let extents = scroll.extents(Size::new(100.0, 60.0), Size::new(10.0, 10.0));
        assert_eq!(extents, Size::new(210.0, 130.0));
    }

    #[test]
    fn extents_never_shrink_below_scroll_position() {
        let mut scroll = ScrollState::new(1.0);
        scroll.set_viewport(Size::new(50.0, 50.0));
        scroll.set_offset(Vec2::new(0.0, 500.0));
        let extents = scroll.extents(Size::new(100.0, 60.0), Size::ZERO);
        assert_eq!(extents, Size::new(100.0, 550.0));
    }

    #[test]
    fn setters_clamp_and_report_changes() {
        let mut scroll = ScrollState::default();
        assert!(scroll.set_offset(Vec2::new(-5.0, 3.0)));
        assert_eq!(scroll.offset(), Vec2::new(0.0, 3.0));
        assert!(!scroll.set_offset(Vec2::new(0.0, 3.0)));
        assert!(scroll.set_zoom(0.0));
        assert_eq!(scroll.zoom(), MIN_ZOOM);
        assert!(!scroll.set_viewport(Size::ZERO));
    }

    #[test]
    fn to_screen_scales_then_translates() {
        let mut scroll = ScrollState::new(2.0);
        scroll.set_offset(Vec2::new(10.0, 0.0));
        let rect = scroll.to_screen(Rect::new(5.0, 5.0, 10.0, 10.0));
        assert_eq!(rect, Rect::new(0.0, 10.0, 10.0, 20.0));
    }
}
