//! Input abstraction layer.
//!
//! Normalizes mouse, touch and stylus events into a unified `InputEvent`
//! consumed by the pen tool. Coordinates are in document user units.

use kurbo::Point;

/// A normalized input event from any pointing device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Pointer pressed (mouse down, touch start, pencil contact).
    PointerDown { x: f64, y: f64 },

    /// Pointer moved (mouse move, touch move, pencil move).
    PointerMove { x: f64, y: f64 },

    /// Pointer released.
    PointerUp { x: f64, y: f64 },

    /// The platform took the pointer away (`pointercancel`).
    Cancel,
}

impl InputEvent {
    /// Create a PointerDown from a web PointerEvent.
    /// (Used when bridging from JS via wasm-bindgen.)
    pub fn from_pointer_down(x: f64, y: f64) -> Self {
        Self::PointerDown { x, y }
    }

    pub fn from_pointer_move(x: f64, y: f64) -> Self {
        Self::PointerMove { x, y }
    }

    pub fn from_pointer_up(x: f64, y: f64) -> Self {
        Self::PointerUp { x, y }
    }

    /// Extract position if this is a pointer event.
    pub fn position(&self) -> Option<Point> {
        match *self {
            Self::PointerDown { x, y }
            | Self::PointerMove { x, y }
            | Self::PointerUp { x, y } => Some(Point::new(x, y)),
            Self::Cancel => None,
        }
    }
}
