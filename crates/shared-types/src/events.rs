//! Browser-agnostic event types delivered to the UI controllers

use serde::{Deserialize, Serialize};

/// The DOM event names controllers subscribe to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Click,
    KeyDown,
    MouseEnter,
    MouseLeave,
    TouchStart,
    TouchEnd,
    HashChange,
}

impl EventKind {
    /// Name used with `addEventListener`
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Click => "click",
            EventKind::KeyDown => "keydown",
            EventKind::MouseEnter => "mouseenter",
            EventKind::MouseLeave => "mouseleave",
            EventKind::TouchStart => "touchstart",
            EventKind::TouchEnd => "touchend",
            EventKind::HashChange => "hashchange",
        }
    }

    /// Touch listeners never cancel scrolling, so they are registered passive
    pub fn is_passive(&self) -> bool {
        matches!(self, EventKind::TouchStart | EventKind::TouchEnd)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyboard keys the controllers care about
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    Escape,
    ArrowLeft,
    ArrowRight,
    Enter,
    Space,
    Other(String),
}

impl Key {
    /// Map a `KeyboardEvent.key` value
    pub fn from_dom(key: &str) -> Self {
        match key {
            "Escape" | "Esc" => Key::Escape,
            "ArrowLeft" | "Left" => Key::ArrowLeft,
            "ArrowRight" | "Right" => Key::ArrowRight,
            "Enter" => Key::Enter,
            " " | "Spacebar" => Key::Space,
            other => Key::Other(other.to_string()),
        }
    }

    pub fn activates(&self) -> bool {
        matches!(self, Key::Enter | Key::Space)
    }
}

/// A single event as seen by a controller
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum UiEvent {
    /// `on_self` is true when the click landed on the listening element
    /// itself rather than on one of its descendants
    Click { on_self: bool },
    KeyDown { key: Key },
    PointerEnter,
    PointerLeave,
    TouchStart { client_x: f64 },
    TouchEnd { client_x: f64 },
    HashChange,
}

impl UiEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            UiEvent::Click { .. } => EventKind::Click,
            UiEvent::KeyDown { .. } => EventKind::KeyDown,
            UiEvent::PointerEnter => EventKind::MouseEnter,
            UiEvent::PointerLeave => EventKind::MouseLeave,
            UiEvent::TouchStart { .. } => EventKind::TouchStart,
            UiEvent::TouchEnd { .. } => EventKind::TouchEnd,
            UiEvent::HashChange => EventKind::HashChange,
        }
    }
}

/// What a handler wants done with the browser's default action
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EventDisposition {
    #[default]
    Default,
    PreventDefault,
}

/// Carousel travel direction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Next,
    Prev,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Next => Direction::Prev,
            Direction::Prev => Direction::Next,
        }
    }

    /// Index reached by moving one step from `current` in a ring of `len`
    pub fn step_from(self, current: usize, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        match self {
            Direction::Next => (current + 1) % len,
            Direction::Prev => (current + len - 1) % len,
        }
    }
}
