//! Top-level window.
//!
//! A [`Window`] is the root of a widget hierarchy. It owns its surface,
//! holds at most one child inset by its border width, and carries the
//! accelerator tables the event router consults before ordinary key
//! dispatch.
//!
//! # Example
//!
//! ```
//! use trellis::platform::HeadlessBackend;
//! use trellis::widget::widgets::{Label, Window};
//! use trellis::widget::{Allocation, WidgetTree};
//!
//! let mut tree = WidgetTree::new(HeadlessBackend::new());
//! let window = tree.insert(Window::new("Demo").with_border_width(4));
//! let label = tree.insert(Label::new("hi"));
//! tree.add_to_window(window, label);
//! tree.show_all(window);
//!
//! // "hi" is 14x13 with the headless metrics.
//! assert_eq!(tree.allocation(window), Some(Allocation::new(0, 0, 22, 21)));
//! assert_eq!(tree.allocation(label), Some(Allocation::new(4, 4, 14, 13)));
//! ```

use trellis_core::logging::targets;
use trellis_core::WidgetId;

use crate::widget::accelerator::AcceleratorTable;
use crate::widget::flags::WidgetFlags;
use crate::widget::geometry::{Allocation, Requisition};
use crate::widget::traits::{Widget, WidgetContext};
use crate::widget::tree::WidgetTree;

/// A top-level window.
#[derive(Debug, Default)]
pub struct Window {
    title: String,
    border_width: i32,
    default_size: Option<Requisition>,
    child: Option<WidgetId>,
    accel_tables: Vec<AcceleratorTable>,
}

impl Window {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Set the border width using builder pattern.
    pub fn with_border_width(mut self, border_width: i32) -> Self {
        self.border_width = border_width;
        self
    }

    /// Set the size the window asks for even when its child is smaller.
    pub fn with_default_size(mut self, width: i32, height: i32) -> Self {
        self.default_size = Some(Requisition::new(width, height));
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn border_width(&self) -> i32 {
        self.border_width
    }

    pub fn set_border_width(&mut self, border_width: i32) {
        self.border_width = border_width;
    }

    pub fn default_size(&self) -> Option<Requisition> {
        self.default_size
    }

    pub fn child(&self) -> Option<WidgetId> {
        self.child
    }

    /// Tables checked for accelerators, in the order they were added.
    pub fn accel_tables(&self) -> &[AcceleratorTable] {
        &self.accel_tables
    }
}

impl Widget for Window {
    fn initial_flags(&self) -> WidgetFlags {
        WidgetFlags::TOPLEVEL | WidgetFlags::HAS_OWN_SURFACE
    }

    fn size_request(&mut self, cx: &mut WidgetContext<'_>) -> Requisition {
        let mut requisition = match self.child {
            Some(child) if cx.is_visible(child) => cx.size_request(child),
            _ => Requisition::ZERO,
        }
        .expanded(self.border_width);
        if let Some(default_size) = self.default_size {
            requisition = requisition.max(default_size);
        }
        requisition
    }

    fn size_allocate(&mut self, cx: &mut WidgetContext<'_>, allocation: Allocation) {
        let Some(child) = self.child.filter(|&child| cx.is_visible(child)) else {
            return;
        };
        // Children live in the window surface's coordinates.
        let inner = Allocation::new(0, 0, allocation.width, allocation.height).inset(self.border_width);
        cx.size_allocate(child, inner);
    }

    fn remove_child(&mut self, child: WidgetId) -> bool {
        if self.child == Some(child) {
            self.child = None;
            true
        } else {
            false
        }
    }

    fn destroy(&mut self, cx: &mut WidgetContext<'_>) {
        for table in self.accel_tables.drain(..) {
            table.unref(cx.tree_mut());
        }
    }

    fn draw(&mut self, cx: &mut WidgetContext<'_>, area: Allocation) {
        let Some(surface) = cx.surface() else {
            return;
        };
        let background = cx.style().background;
        cx.backend().draw_rect(surface, area, background, true);
    }
}

impl WidgetTree {
    /// Put `child` inside a window.
    ///
    /// # Panics
    ///
    /// Panics if the window already holds a child.
    pub fn add_to_window(&mut self, window: WidgetId, child: WidgetId) {
        self.adopt::<Window, _>(window, child, |w| {
            assert!(w.child.is_none(), "window {window:?} already has a child");
            w.child = Some(child);
        });
    }

    /// Let a window route key presses through `table`. The window takes a
    /// reference on the table.
    pub fn add_accelerator_table(&mut self, window: WidgetId, table: &AcceleratorTable) {
        if let Some(w) = self.widget_mut::<Window>(window) {
            if !w.accel_tables.iter().any(|t| t.ptr_eq(table)) {
                table.add_ref();
                w.accel_tables.push(table.clone());
                tracing::debug!(target: targets::ACCEL, ?window, "accelerator table added");
            }
        }
    }

    /// Stop routing through `table` and drop the window's reference.
    pub fn remove_accelerator_table(&mut self, window: WidgetId, table: &AcceleratorTable) -> bool {
        let removed = self.widget_mut::<Window>(window).and_then(|w| {
            let index = w.accel_tables.iter().position(|t| t.ptr_eq(table))?;
            Some(w.accel_tables.remove(index))
        });
        match removed {
            Some(table) => {
                table.unref(self);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{BackendCall, HeadlessBackend};
    use crate::widget::widgets::DrawingArea;
    use crate::ToolkitConfig;

    #[test]
    fn test_show_creates_surface_and_lays_out() {
        let (mut tree, log) = WidgetTree::headless(ToolkitConfig::default());
        let window = tree.insert(Window::new("main").with_border_width(2));
        let area = tree.insert(DrawingArea::new(30, 20));
        tree.add_to_window(window, area);
        tree.show_all(window);

        let flags = tree.flags(window).unwrap();
        assert!(flags.contains(WidgetFlags::MAPPED | WidgetFlags::REALIZED));
        assert_eq!(tree.allocation(window), Some(Allocation::new(0, 0, 34, 24)));
        assert_eq!(tree.allocation(area), Some(Allocation::new(2, 2, 30, 20)));
        assert_eq!(log.count(|call| matches!(call, BackendCall::CreateSurface { .. })), 1);
        assert_eq!(tree.node(area).and_then(|n| n.surface()), tree.node(window).and_then(|n| n.surface()));
    }

    #[test]
    fn test_default_size_wins_when_larger() {
        let mut tree = WidgetTree::new(HeadlessBackend::new());
        let window = tree.insert(Window::new("big").with_default_size(200, 100));
        let area = tree.insert(DrawingArea::new(30, 20));
        tree.add_to_window(window, area);
        tree.show_all(window);

        assert_eq!(tree.allocation(window), Some(Allocation::new(0, 0, 200, 100)));
        assert_eq!(tree.allocation(area), Some(Allocation::new(0, 0, 200, 100)));
    }

    #[test]
    fn test_configure_resizes_child() {
        let mut tree = WidgetTree::new(HeadlessBackend::new());
        let window = tree.insert(Window::new("w").with_border_width(5));
        let area = tree.insert(DrawingArea::new(10, 10));
        tree.add_to_window(window, area);
        tree.show_all(window);

        tree.configure(window, Allocation::new(40, 50, 100, 60));
        assert_eq!(tree.allocation(area), Some(Allocation::new(5, 5, 90, 50)));
    }

    #[test]
    #[should_panic(expected = "already has a child")]
    fn test_second_child_panics() {
        let mut tree = WidgetTree::new(HeadlessBackend::new());
        let window = tree.insert(Window::new("w"));
        let a = tree.insert(DrawingArea::new(1, 1));
        let b = tree.insert(DrawingArea::new(1, 1));
        tree.add_to_window(window, a);
        tree.add_to_window(window, b);
    }

    #[test]
    fn test_destroy_releases_accelerator_tables() {
        let mut tree = WidgetTree::new(HeadlessBackend::new());
        let window = tree.insert(Window::new("w"));
        let table = AcceleratorTable::new();
        tree.add_accelerator_table(window, &table);
        assert_eq!(table.ref_count(), 2);

        tree.destroy(window);
        assert_eq!(table.ref_count(), 1);
        assert!(!table.is_destroyed());
        assert!(!tree.contains(window));
    }

    #[test]
    fn test_remove_accelerator_table_drops_reference() {
        let mut tree = WidgetTree::new(HeadlessBackend::new());
        let window = tree.insert(Window::new("w"));
        let table = AcceleratorTable::new();
        tree.add_accelerator_table(window, &table);
        tree.add_accelerator_table(window, &table);
        assert_eq!(table.ref_count(), 2);

        assert!(tree.remove_accelerator_table(window, &table));
        assert_eq!(table.ref_count(), 1);
        assert!(!tree.remove_accelerator_table(window, &table));
    }
}
