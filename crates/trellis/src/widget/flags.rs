//! Per-widget flag bits, interaction state and style records.

use std::fmt;

bitflags::bitflags! {
    /// Lifecycle and capability bits stored on every widget node.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct WidgetFlags: u16 {
        /// Shown by the application; takes part in layout.
        const VISIBLE          = 1 << 0;
        /// Mapped onto the screen along with all of its ancestors.
        const MAPPED           = 1 << 1;
        /// Has a drawing surface (its own or its parent's).
        const REALIZED         = 1 << 2;
        /// Accepts input, as set on the widget itself.
        const SENSITIVE        = 1 << 3;
        /// Every ancestor is sensitive.
        const PARENT_SENSITIVE = 1 << 4;
        /// Creates its own surface instead of drawing on the parent's.
        const HAS_OWN_SURFACE  = 1 << 5;
        const HAS_FOCUS        = 1 << 6;
        const CAN_FOCUS        = 1 << 7;
        const HAS_DEFAULT      = 1 << 8;
        const CAN_DEFAULT      = 1 << 9;
        /// One of the widget's callbacks is executing.
        const IN_CALL          = 1 << 10;
        /// Destroy was requested while a callback was executing.
        const PENDING_DESTROY  = 1 << 11;
        /// Root of a window hierarchy.
        const TOPLEVEL         = 1 << 12;
    }
}

impl Default for WidgetFlags {
    fn default() -> Self {
        Self::SENSITIVE | Self::PARENT_SENSITIVE
    }
}

impl WidgetFlags {
    /// Sensitive on its own and through every ancestor.
    #[inline]
    pub fn is_sensitive(self) -> bool {
        self.contains(Self::SENSITIVE | Self::PARENT_SENSITIVE)
    }

    /// Visible and mapped, so drawing is meaningful.
    #[inline]
    pub fn is_drawable(self) -> bool {
        self.contains(Self::VISIBLE | Self::MAPPED)
    }
}

/// Interaction state used to pick colors when drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WidgetState {
    #[default]
    Normal,
    /// Pressed or otherwise engaged.
    Active,
    /// Pointer is hovering.
    Prelight,
    Selected,
    Insensitive,
}

/// An RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const GRAY: Self = Self::rgb(0xd6, 0xd6, 0xd6);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Appearance record supplied from outside.
///
/// Widgets read it for measuring and drawing and never modify it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Style {
    pub foreground: Color,
    pub background: Color,
    pub font: String,
    pub shadow_thickness: i32,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            foreground: Color::BLACK,
            background: Color::GRAY,
            font: String::from("fixed"),
            shadow_thickness: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_flags_are_sensitive_only() {
        let flags = WidgetFlags::default();
        assert!(flags.is_sensitive());
        assert!(!flags.contains(WidgetFlags::VISIBLE));
    }

    #[test]
    fn test_parent_insensitivity_wins() {
        let flags = WidgetFlags::default() - WidgetFlags::PARENT_SENSITIVE;
        assert!(!flags.is_sensitive());
    }

    #[test]
    fn test_drawable_requires_visible_and_mapped() {
        assert!(!WidgetFlags::VISIBLE.is_drawable());
        assert!((WidgetFlags::VISIBLE | WidgetFlags::MAPPED).is_drawable());
    }
}
