//! Push button.
//!
//! A [`Button`] shows a text label inside a beveled frame and emits
//! [`clicked`](Button::clicked) when pressed and released with the pointer
//! inside it, when activated from the keyboard, or when one of its
//! accelerators fires.
//!
//! # Example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use trellis::platform::HeadlessBackend;
//! use trellis::widget::widgets::Button;
//! use trellis::widget::WidgetTree;
//!
//! let mut tree = WidgetTree::new(HeadlessBackend::new());
//! let ok = tree.insert(Button::new("OK"));
//!
//! let clicks = Rc::new(Cell::new(0));
//! let counter = clicks.clone();
//! if let Some(button) = tree.widget::<Button>(ok) {
//!     button.clicked().connect(move |_| counter.set(counter.get() + 1));
//! }
//!
//! tree.activate(ok);
//! assert_eq!(clicks.get(), 1);
//! ```

use trellis_core::logging::targets;
use trellis_core::{Signal, WidgetId};

use crate::platform::ShadowType;
use crate::widget::events::{Event, Key, ModifierType};
use crate::widget::flags::{WidgetFlags, WidgetState};
use crate::widget::geometry::{Allocation, Requisition};
use crate::widget::traits::{Widget, WidgetContext};

/// Space between the bevel and the label.
const INNER_PADDING: i32 = 2;

/// Pointer button that presses buttons.
const PRIMARY_BUTTON: u32 = 1;

/// A clickable button with a text label.
pub struct Button {
    label: String,
    pressed: bool,
    accelerators: usize,
    clicked: Signal<WidgetId>,
}

impl Button {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            pressed: false,
            accelerators: 0,
            clicked: Signal::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    /// Emitted with the button's id each time it is clicked.
    pub fn clicked(&self) -> &Signal<WidgetId> {
        &self.clicked
    }

    /// Whether the primary pointer button is held on the button.
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Accelerators currently bound to this button.
    pub fn accelerator_count(&self) -> usize {
        self.accelerators
    }

    fn click(&self, id: WidgetId) {
        tracing::trace!(target: targets::EVENT, ?id, label = %self.label, "button clicked");
        self.clicked.emit(id);
    }
}

impl Widget for Button {
    fn initial_flags(&self) -> WidgetFlags {
        WidgetFlags::CAN_FOCUS | WidgetFlags::CAN_DEFAULT
    }

    fn size_request(&mut self, cx: &mut WidgetContext<'_>) -> Requisition {
        let (width, height) = cx.measure_text(&self.label);
        let frame = cx.style().shadow_thickness + INNER_PADDING;
        Requisition::new(width, height).expanded(frame)
    }

    fn draw(&mut self, cx: &mut WidgetContext<'_>, _area: Allocation) {
        let Some(surface) = cx.surface() else {
            return;
        };
        let allocation = cx.allocation();
        let style = cx.style();
        let shadow = if cx.state() == WidgetState::Active {
            ShadowType::In
        } else {
            ShadowType::Out
        };
        let (width, height) = cx.measure_text(&self.label);
        let x = allocation.x + (allocation.width - width) / 2;
        let y = allocation.y + (allocation.height - height) / 2;

        let backend = cx.backend();
        backend.draw_rect(surface, allocation, style.background, true);
        backend.draw_shadow(surface, allocation, shadow, style.shadow_thickness);
        backend.draw_text(surface, x, y, &self.label, style.foreground);
    }

    fn draw_focus(&mut self, cx: &mut WidgetContext<'_>) {
        if let Some(surface) = cx.surface() {
            let allocation = cx.allocation();
            let color = cx.style().foreground;
            cx.backend().draw_rect(surface, allocation, color, false);
        }
    }

    fn handle_event(&mut self, cx: &mut WidgetContext<'_>, event: &Event) -> bool {
        match *event {
            Event::ButtonPress { button, .. } if button == PRIMARY_BUTTON => {
                self.pressed = true;
                cx.set_state(WidgetState::Active);
                let id = cx.id();
                cx.tree_mut().grab_focus(id);
                true
            }
            Event::ButtonRelease { x, y, button } if button == PRIMARY_BUTTON => {
                if !self.pressed {
                    return false;
                }
                self.pressed = false;
                let inside = cx.allocation().contains(x, y);
                cx.set_state(if inside { WidgetState::Prelight } else { WidgetState::Normal });
                if inside {
                    self.click(cx.id());
                }
                true
            }
            Event::Enter => {
                cx.set_state(if self.pressed { WidgetState::Active } else { WidgetState::Prelight });
                true
            }
            Event::Leave => {
                if !self.pressed {
                    cx.set_state(WidgetState::Normal);
                }
                true
            }
            Event::KeyPress {
                key: Key::Char(' '),
                modifiers,
            } if modifiers.is_empty() => {
                self.click(cx.id());
                true
            }
            _ => false,
        }
    }

    fn activate(&mut self, cx: &mut WidgetContext<'_>) -> bool {
        self.click(cx.id());
        true
    }

    fn install_accelerator(&mut self, _key: char, _modifiers: ModifierType) -> bool {
        self.accelerators += 1;
        true
    }

    fn remove_accelerator(&mut self, _cx: &mut WidgetContext<'_>) {
        self.accelerators = self.accelerators.saturating_sub(1);
    }

    fn destroy(&mut self, _cx: &mut WidgetContext<'_>) {
        self.clicked.disconnect_all();
    }
}
