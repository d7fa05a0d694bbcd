//! Pointer-drag scrolling for the horizontal category strip.
//!
//! The strip scrolls by dragging anywhere on it. A press that moves at most
//! [`DRAG_THRESHOLD_PX`] is still a click; once it moves further, the
//! release must not select the category under the pointer.

use serde::{Deserialize, Serialize};

/// Horizontal travel (in CSS pixels) a press must exceed to become a drag.
pub const DRAG_THRESHOLD_PX: f64 = 5.0;

/// Scroll multiplier applied to pointer travel.
pub const DEFAULT_SPEED: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct Press {
    start_x: f64,
    start_scroll: f64,
    dragged: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DragScroll {
    speed: f64,
    press: Option<Press>,
}

impl Default for DragScroll {
    fn default() -> Self {
        Self::new(DEFAULT_SPEED)
    }
}

impl DragScroll {
    #[must_use]
    pub const fn new(speed: f64) -> Self {
        Self { speed, press: None }
    }

    /// Whether a pointer is currently held down on the strip.
    #[must_use]
    pub const fn is_pressed(&self) -> bool {
        self.press.is_some()
    }

    /// Pointer went down at `x` while the strip was scrolled to `scroll_left`.
    pub fn press(&mut self, x: f64, scroll_left: f64) {
        self.press = Some(Press {
            start_x: x,
            start_scroll: scroll_left,
            dragged: false,
        });
    }

    /// Pointer moved to `x`. Returns the new scroll offset, or `None` if no
    /// pointer is down or the movement is still within the click threshold.
    pub fn drag(&mut self, x: f64) -> Option<f64> {
        let speed = self.speed;
        let press = self.press.as_mut()?;
        let travel = x - press.start_x;

        if !press.dragged && travel.abs() <= DRAG_THRESHOLD_PX {
            return None;
        }
        press.dragged = true;

        Some((press.start_scroll - travel * speed).max(0.0))
    }

    /// Pointer released or left the strip. Returns `true` if the gesture was
    /// a drag, in which case the accompanying click must be ignored.
    pub fn release(&mut self) -> bool {
        self.press.take().is_some_and(|press| press.dragged)
    }
}
