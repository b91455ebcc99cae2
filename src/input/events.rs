use crate::core::geo::Point;
use serde::{Deserialize, Serialize};

/// Pointer input delivered to the interaction overlay, in screen pixels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    /// Single click/tap
    Click {
        position: Point,
        button: MouseButton,
        modifiers: KeyModifiers,
    },
    /// Scroll wheel; positive `delta_y` scrolls down (zooms out)
    Wheel { position: Point, delta_y: f64 },
    /// Pointer move, used for hover lookups
    Move { position: Point },
}

/// Keyboard modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct KeyModifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

/// Mouse button types
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(u16),
}

/// Whether an event was handled.
///
/// `Handled` means propagation and the default action are stopped; the map
/// must not process the event again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventHandled {
    Handled,
    NotHandled,
}

impl PointerEvent {
    /// Left click without modifiers
    pub fn click(position: Point) -> Self {
        PointerEvent::Click {
            position,
            button: MouseButton::Left,
            modifiers: KeyModifiers::default(),
        }
    }

    pub fn wheel(position: Point, delta_y: f64) -> Self {
        PointerEvent::Wheel { position, delta_y }
    }

    /// Gets the screen position associated with this event
    pub fn position(&self) -> Point {
        match self {
            PointerEvent::Click { position, .. } => *position,
            PointerEvent::Wheel { position, .. } => *position,
            PointerEvent::Move { position } => *position,
        }
    }
}
