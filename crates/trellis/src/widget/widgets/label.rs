//! Label widget for text display.
//!
//! The label's natural size is its text as measured by the backend in the
//! label's font, plus optional padding. Text is drawn centered in whatever
//! the parent allocates.

use crate::widget::geometry::{Allocation, Requisition};
use crate::widget::traits::{Widget, WidgetContext};

/// A widget that displays text.
#[derive(Debug, Clone, Default)]
pub struct Label {
    text: String,
    xpad: i32,
    ypad: i32,
}

impl Label {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Set the padding using builder pattern.
    pub fn with_padding(mut self, xpad: i32, ypad: i32) -> Self {
        self.xpad = xpad;
        self.ypad = ypad;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the text. Call through
    /// [`WidgetTree::update_widget`](crate::widget::WidgetTree::update_widget)
    /// so the label is measured again.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn padding(&self) -> (i32, i32) {
        (self.xpad, self.ypad)
    }
}

impl Widget for Label {
    fn size_request(&mut self, cx: &mut WidgetContext<'_>) -> Requisition {
        let (width, height) = cx.measure_text(&self.text);
        Requisition::new(width + self.xpad * 2, height + self.ypad * 2)
    }

    fn draw(&mut self, cx: &mut WidgetContext<'_>, _area: Allocation) {
        let Some(surface) = cx.surface() else {
            return;
        };
        let allocation = cx.allocation();
        let (width, height) = cx.measure_text(&self.text);
        let x = allocation.x + (allocation.width - width) / 2;
        let y = allocation.y + (allocation.height - height) / 2;
        let color = cx.style().foreground;
        cx.backend().draw_text(surface, x, y, &self.text, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::BackendCall;
    use crate::widget::widgets::Window;
    use crate::widget::WidgetTree;
    use crate::ToolkitConfig;

    #[test]
    fn test_label_requests_measured_text() {
        let (mut tree, _) = WidgetTree::headless(ToolkitConfig::default());
        let label = tree.insert(Label::new("abc").with_padding(2, 1));
        assert_eq!(tree.size_request(label), Requisition::new(25, 15));
    }

    #[test]
    fn test_set_text_relayouts_window() {
        let (mut tree, _) = WidgetTree::headless(ToolkitConfig::default());
        let window = tree.insert(Window::new("w"));
        let label = tree.insert(Label::new("ab"));
        tree.add_to_window(window, label);
        tree.show_all(window);
        assert_eq!(tree.allocation(window).map(|a| a.width), Some(14));

        tree.update_widget::<Label, _>(label, |l| l.set_text("abcd"));
        assert_eq!(tree.allocation(window).map(|a| a.width), Some(28));
        assert_eq!(tree.allocation(label).map(|a| a.width), Some(28));
    }

    #[test]
    fn test_draw_centers_text() {
        let (mut tree, log) = WidgetTree::headless(ToolkitConfig::default());
        let window = tree.insert(Window::new("w").with_default_size(34, 33));
        let label = tree.insert(Label::new("ab"));
        tree.add_to_window(window, label);
        tree.show_all(window);
        log.clear();

        tree.draw(window, Allocation::new(0, 0, 34, 33));
        let texts: Vec<(i32, i32)> = log
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                BackendCall::Text { x, y, .. } => Some((x, y)),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec![(10, 10)]);
    }
}
