//! Requisitions and allocations for the geometry negotiation protocol.
//!
//! A widget reports its natural size as a [`Requisition`] during the
//! bottom-up request pass, and its parent hands it a final [`Allocation`]
//! during the top-down allocate pass. All sizes are integer pixels.
//!
//! Containers never give a child a width or height below one pixel:
//! [`Allocation::clamped`] applies that rule, and the layout context uses it
//! for every child allocation.

use std::fmt;

/// Smallest width or height a container may assign to a child.
pub const MIN_DIMENSION: i32 = 1;

/// Clamp a computed child dimension to [`MIN_DIMENSION`].
#[inline]
pub fn clamp_dimension(value: i32) -> i32 {
    value.max(MIN_DIMENSION)
}

/// A widget's natural size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Requisition {
    pub width: i32,
    pub height: i32,
}

impl Requisition {
    /// An empty requisition.
    pub const ZERO: Self = Self {
        width: 0,
        height: 0,
    };

    #[inline]
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Grow both axes by `amount` on every side.
    #[inline]
    pub const fn expanded(self, amount: i32) -> Self {
        Self {
            width: self.width + amount * 2,
            height: self.height + amount * 2,
        }
    }

    /// Component-wise maximum.
    #[inline]
    pub fn max(self, other: Self) -> Self {
        Self {
            width: self.width.max(other.width),
            height: self.height.max(other.height),
        }
    }
}

impl fmt::Display for Requisition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A rectangle assigned to a widget by its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Allocation {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Allocation {
    #[inline]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Allocation at the origin with the size of `requisition`.
    #[inline]
    pub const fn from_requisition(requisition: Requisition) -> Self {
        Self::new(0, 0, requisition.width, requisition.height)
    }

    /// Copy with width and height raised to at least one pixel.
    #[inline]
    pub fn clamped(self) -> Self {
        Self {
            width: clamp_dimension(self.width),
            height: clamp_dimension(self.height),
            ..self
        }
    }

    /// Copy shrunk by `amount` on every side, keeping at least one pixel.
    #[inline]
    pub fn inset(self, amount: i32) -> Self {
        Self {
            x: self.x + amount,
            y: self.y + amount,
            width: clamp_dimension(self.width - amount * 2),
            height: clamp_dimension(self.height - amount * 2),
        }
    }

    /// Whether the allocation has no area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Whether the point lies inside the allocation.
    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && y >= self.y && x < self.x + self.width && y < self.y + self.height
    }

    /// Overlap of two rectangles, if any.
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = (self.x + self.width).min(other.x + other.width);
        let bottom = (self.y + self.height).min(other.y + other.height);
        (right > x && bottom > y).then(|| Self::new(x, y, right - x, bottom - y))
    }

    /// The size part of the rectangle.
    #[inline]
    pub fn size(&self) -> Requisition {
        Requisition::new(self.width, self.height)
    }
}

impl fmt::Display for Allocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// Layout direction of a linear container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Orientation {
    /// Children are laid out left to right.
    #[default]
    Horizontal,
    /// Children are laid out top to bottom.
    Vertical,
}

impl Orientation {
    /// Get the perpendicular orientation.
    pub fn cross(self) -> Self {
        match self {
            Self::Horizontal => Self::Vertical,
            Self::Vertical => Self::Horizontal,
        }
    }

    /// Main-axis component of a requisition.
    #[inline]
    pub fn main(self, requisition: Requisition) -> i32 {
        match self {
            Self::Horizontal => requisition.width,
            Self::Vertical => requisition.height,
        }
    }

    /// Cross-axis component of a requisition.
    #[inline]
    pub fn cross_of(self, requisition: Requisition) -> i32 {
        self.cross().main(requisition)
    }

    /// Build a requisition from main and cross components.
    #[inline]
    pub fn requisition(self, main: i32, cross: i32) -> Requisition {
        match self {
            Self::Horizontal => Requisition::new(main, cross),
            Self::Vertical => Requisition::new(cross, main),
        }
    }

    /// Main-axis position and length of an allocation.
    #[inline]
    pub fn main_span(self, allocation: Allocation) -> (i32, i32) {
        match self {
            Self::Horizontal => (allocation.x, allocation.width),
            Self::Vertical => (allocation.y, allocation.height),
        }
    }

    /// Cross-axis position and length of an allocation.
    #[inline]
    pub fn cross_span(self, allocation: Allocation) -> (i32, i32) {
        self.cross().main_span(allocation)
    }

    /// Build an allocation from main and cross spans.
    #[inline]
    pub fn allocation(self, main: (i32, i32), cross: (i32, i32)) -> Allocation {
        match self {
            Self::Horizontal => Allocation::new(main.0, cross.0, main.1, cross.1),
            Self::Vertical => Allocation::new(cross.0, main.0, cross.1, main.1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamped_never_below_one() {
        let allocation = Allocation::new(4, 5, 0, -3).clamped();
        assert_eq!(allocation, Allocation::new(4, 5, 1, 1));
    }

    #[test]
    fn test_inset_keeps_positive_size() {
        let allocation = Allocation::new(0, 0, 10, 4).inset(3);
        assert_eq!(allocation, Allocation::new(3, 3, 4, 1));
    }

    #[test]
    fn test_intersect() {
        let a = Allocation::new(0, 0, 10, 10);
        let b = Allocation::new(5, 5, 10, 10);
        assert_eq!(a.intersect(&b), Some(Allocation::new(5, 5, 5, 5)));
        assert_eq!(a.intersect(&Allocation::new(10, 0, 5, 5)), None);
    }

    #[test]
    fn test_contains_is_half_open() {
        let a = Allocation::new(2, 2, 3, 3);
        assert!(a.contains(2, 4));
        assert!(!a.contains(5, 2));
    }

    #[test]
    fn test_orientation_round_trip() {
        let vertical = Orientation::Vertical;
        let allocation = vertical.allocation((10, 30), (2, 8));
        assert_eq!(allocation, Allocation::new(2, 10, 8, 30));
        assert_eq!(vertical.main_span(allocation), (10, 30));
        assert_eq!(vertical.cross_span(allocation), (2, 8));
        assert_eq!(vertical.requisition(5, 7), Requisition::new(7, 5));
    }
}
