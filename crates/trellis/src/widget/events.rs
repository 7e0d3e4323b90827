//! Input events delivered by the platform event source.
//!
//! Pointer coordinates are relative to the top-level window surface, which
//! is the coordinate space every allocation in a window lives in.

use super::geometry::Allocation;

bitflags::bitflags! {
    /// Keyboard modifiers held during an input event.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct ModifierType: u8 {
        const SHIFT   = 1 << 0;
        /// Caps lock.
        const LOCK    = 1 << 1;
        const CONTROL = 1 << 2;
        const ALT     = 1 << 3;
        const META    = 1 << 4;
    }
}

/// Keys that do not produce a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedKey {
    Return,
    Escape,
    Tab,
    BackSpace,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
}

/// A key as reported by a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A key producing a character.
    Char(char),
    /// A non-character key.
    Named(NamedKey),
}

impl Key {
    /// The character for character keys.
    pub fn as_char(self) -> Option<char> {
        match self {
            Self::Char(c) => Some(c),
            Self::Named(_) => None,
        }
    }
}

/// A structured input event.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    ButtonPress { x: i32, y: i32, button: u32 },
    ButtonRelease { x: i32, y: i32, button: u32 },
    Motion { x: i32, y: i32 },
    KeyPress { key: Key, modifiers: ModifierType },
    KeyRelease { key: Key, modifiers: ModifierType },
    /// The pointer entered the widget receiving the event.
    Enter,
    /// The pointer left the widget receiving the event.
    Leave,
    /// Part of the window needs repainting.
    Expose { area: Allocation },
}

impl Event {
    /// Pointer position for pointer events.
    pub fn position(&self) -> Option<(i32, i32)> {
        match *self {
            Self::ButtonPress { x, y, .. } | Self::ButtonRelease { x, y, .. } | Self::Motion { x, y } => {
                Some((x, y))
            }
            _ => None,
        }
    }

    /// Whether an unhandled event travels on to the parent widget.
    pub fn propagates(&self) -> bool {
        !matches!(self, Self::Enter | Self::Leave | Self::Expose { .. })
    }
}
