//! A blank widget with an explicit natural size.

use crate::widget::geometry::{Allocation, Requisition};
use crate::widget::traits::{Widget, WidgetContext};

/// A widget that requests a fixed size and paints its background.
///
/// Useful as a canvas for custom drawing and as a predictable geometry
/// client when testing containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrawingArea {
    size: Requisition,
}

impl DrawingArea {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            size: Requisition::new(width, height),
        }
    }

    pub fn size(&self) -> Requisition {
        self.size
    }

    /// Change the natural size. Call through
    /// [`WidgetTree::update_widget`](crate::widget::WidgetTree::update_widget)
    /// so the parent lays it out again.
    pub fn set_size(&mut self, width: i32, height: i32) {
        self.size = Requisition::new(width, height);
    }
}

impl Widget for DrawingArea {
    fn size_request(&mut self, _cx: &mut WidgetContext<'_>) -> Requisition {
        self.size
    }

    fn draw(&mut self, cx: &mut WidgetContext<'_>, area: Allocation) {
        if let Some(surface) = cx.surface() {
            let background = cx.style().background;
            cx.backend().draw_rect(surface, area, background, true);
        }
    }
}
