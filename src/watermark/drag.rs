//! Interactive repositioning of the watermark on the preview.
//!
//! The controller tracks one gesture at a time. It only moves the displayed
//! layer; the settings change happens once, on release, when the final center
//! becomes a [`Position::Custom`] relative to the displayed image.

use super::position::{clamp_center, to_normalized, Point};
use super::preview::PreviewFrame;
use super::Position;

#[derive(Debug, Clone, Copy)]
struct DragState {
    last_pointer: Point,
    center: Point,
}

/// Drag gesture state machine: idle, or dragging the layer.
#[derive(Debug, Default)]
pub struct DragController {
    active: Option<DragState>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.active.is_some()
    }

    /// Current layer center in canvas coordinates while dragging.
    pub fn current_center(&self) -> Option<Point> {
        self.active.map(|state| state.center)
    }

    /// Start a drag if `pointer` (canvas coordinates) is on the layer.
    pub fn begin(&mut self, pointer: Point, frame: &PreviewFrame) -> bool {
        let Some(rect) = frame.layer.filter(|rect| rect.contains(pointer)) else {
            self.active = None;
            return false;
        };

        self.active = Some(DragState {
            last_pointer: pointer,
            center: rect.center(),
        });
        tracing::debug!(x = pointer.x, y = pointer.y, "drag started");
        true
    }

    /// Move the layer by the pointer delta since the last event and return the
    /// new canvas center, clamped so the layer stays on the displayed image.
    pub fn drag_to(&mut self, pointer: Point, frame: &PreviewFrame) -> Option<Point> {
        let state = self.active.as_mut()?;
        let layer = frame.layer?.size();
        let viewport = &frame.viewport;

        let moved = Point::new(
            state.center.x + pointer.x - state.last_pointer.x - viewport.offset_x as f64,
            state.center.y + pointer.y - state.last_pointer.y - viewport.offset_y as f64,
        );
        let clamped = clamp_center(moved, &viewport.display, &layer);

        state.center = Point::new(
            clamped.x + viewport.offset_x as f64,
            clamped.y + viewport.offset_y as f64,
        );
        state.last_pointer = pointer;
        Some(state.center)
    }

    /// Finish the drag and return the position to store in the settings.
    pub fn end(&mut self, frame: &PreviewFrame) -> Option<Position> {
        let state = self.active.take()?;
        let viewport = &frame.viewport;

        let local = Point::new(
            state.center.x - viewport.offset_x as f64,
            state.center.y - viewport.offset_y as f64,
        );
        let (u, v) = to_normalized(local, &viewport.display);
        tracing::debug!(u, v, "drag finished");
        Some(Position::custom(u, v))
    }

    /// Abandon the gesture without changing anything.
    pub fn cancel(&mut self) {
        self.active = None;
    }
}
