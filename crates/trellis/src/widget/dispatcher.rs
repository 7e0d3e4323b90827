//! Routing platform input to widgets.
//!
//! An [`EventRouter`] serves one top-level window. For every event it picks
//! a target and delivers it through [`WidgetTree::handle_event`]:
//!
//! 1. **Key presses** are first checked against the window's accelerator
//!    tables. A hit activates the bound widget and ends dispatch.
//! 2. Otherwise key events go to the focus widget (or the window itself) and
//!    bubble to ancestors until one handles them. An unhandled `Return`
//!    activates the window's default widget.
//! 3. **Pointer events** are hit-tested with [`WidgetTree::locate`] and
//!    bubble the same way. A button press grabs the pointer for the pressed
//!    widget until release, and motion sends `Leave`/`Enter` whenever the
//!    widget under the pointer changes.
//! 4. **Expose** repaints the exposed area of the window.
//!
//! Insensitive widgets never see input: the tree drops events addressed to
//! them, so bubbling continues past them.
//!
//! # Example
//!
//! ```
//! use trellis::platform::HeadlessBackend;
//! use trellis::widget::widgets::{Button, Window};
//! use trellis::widget::{Event, EventRouter, Key, ModifierType, WidgetTree};
//!
//! let mut tree = WidgetTree::new(HeadlessBackend::new());
//! let window = tree.insert(Window::new("Demo"));
//! let button = tree.insert(Button::new("OK"));
//! tree.add_to_window(window, button);
//! tree.show_all(window);
//! tree.grab_focus(button);
//!
//! let mut router = EventRouter::new(window);
//! let space = Event::KeyPress { key: Key::Char(' '), modifiers: ModifierType::empty() };
//! assert!(router.dispatch(&mut tree, &space).was_handled());
//! ```

use trellis_core::logging::{span_names, targets, PerfSpan};
use trellis_core::WidgetId;

use super::events::{Event, Key, ModifierType, NamedKey};
use super::tree::WidgetTree;
use super::widgets::Window;

/// Outcome of routing one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchResult {
    /// A widget handled the event.
    Accepted,
    /// The event reached a target but nothing handled it.
    Ignored,
    /// An accelerator consumed the key press.
    Accelerator,
    /// No widget was under the pointer, or the window is gone.
    NoTarget,
}

impl DispatchResult {
    /// Check if the event was handled (accepted or consumed by an accelerator).
    pub fn was_handled(&self) -> bool {
        matches!(self, Self::Accepted | Self::Accelerator)
    }
}

/// Per-window input router.
#[derive(Debug)]
pub struct EventRouter {
    window: WidgetId,
    /// Widget that last received `Enter`.
    pointer: Option<WidgetId>,
    /// Widget holding the implicit grab between press and release.
    grab: Option<WidgetId>,
}

impl EventRouter {
    pub fn new(window: WidgetId) -> Self {
        Self {
            window,
            pointer: None,
            grab: None,
        }
    }

    pub fn window(&self) -> WidgetId {
        self.window
    }

    /// Widget currently under the pointer, as far as the router knows.
    pub fn pointer_widget(&self) -> Option<WidgetId> {
        self.pointer
    }

    /// Widget holding the pointer grab, if a button is held.
    pub fn grab_widget(&self) -> Option<WidgetId> {
        self.grab
    }

    /// Route one event into the window's hierarchy.
    #[tracing::instrument(skip_all, target = "trellis::event", level = "trace", fields(window = ?self.window))]
    pub fn dispatch(&mut self, tree: &mut WidgetTree, event: &Event) -> DispatchResult {
        if !tree.contains(self.window) {
            return DispatchResult::NoTarget;
        }
        let _perf = PerfSpan::new(span_names::DISPATCH);
        // Changes made since the last event may have queued redraws.
        tree.process_updates();
        self.forget_dead(tree);

        let result = match *event {
            Event::KeyPress { key, modifiers } => {
                if let Key::Char(c) = key {
                    if self.check_accelerators(tree, c, modifiers) {
                        return DispatchResult::Accelerator;
                    }
                }
                let target = self.key_target(tree);
                match self.deliver(tree, target, event) {
                    DispatchResult::Ignored if key == Key::Named(NamedKey::Return) => self.activate_default(tree),
                    other => other,
                }
            }
            Event::KeyRelease { .. } => {
                let target = self.key_target(tree);
                self.deliver(tree, target, event)
            }
            Event::ButtonPress { x, y, .. } => {
                let target = self.hit(tree, x, y);
                self.cross(tree, target);
                self.grab = target;
                self.deliver(tree, target, event)
            }
            Event::ButtonRelease { x, y, .. } => {
                let target = self.grab.take().or_else(|| self.hit(tree, x, y));
                let result = self.deliver(tree, target, event);
                let under = self.hit(tree, x, y);
                self.cross(tree, under);
                result
            }
            Event::Motion { x, y } => {
                let under = self.hit(tree, x, y);
                if self.grab.is_none() {
                    self.cross(tree, under);
                }
                let target = self.grab.or(under);
                self.deliver(tree, target, event)
            }
            Event::Enter => {
                let window = self.window;
                self.cross(tree, Some(window));
                DispatchResult::Accepted
            }
            Event::Leave => {
                if self.grab.is_none() {
                    self.cross(tree, None);
                }
                DispatchResult::Accepted
            }
            Event::Expose { area } => {
                tree.draw(self.window, area);
                DispatchResult::Accepted
            }
        };
        tracing::trace!(target: targets::EVENT, ?event, ?result, "dispatched");
        result
    }

    fn forget_dead(&mut self, tree: &WidgetTree) {
        self.pointer = self.pointer.filter(|&id| tree.contains(id));
        self.grab = self.grab.filter(|&id| tree.contains(id));
    }

    fn key_target(&self, tree: &WidgetTree) -> Option<WidgetId> {
        Some(tree.focus_widget(self.window).unwrap_or(self.window))
    }

    fn check_accelerators(&self, tree: &mut WidgetTree, key: char, modifiers: ModifierType) -> bool {
        // Clone the handles: activation may remove tables from the window.
        let tables = tree
            .widget::<Window>(self.window)
            .map(|window| window.accel_tables().to_vec())
            .unwrap_or_default();
        tables.iter().any(|table| table.check(tree, key, modifiers))
    }

    fn activate_default(&self, tree: &mut WidgetTree) -> DispatchResult {
        match tree.default_widget(self.window) {
            Some(default) if tree.activate(default) => {
                tracing::debug!(target: targets::EVENT, ?default, "return activated default widget");
                DispatchResult::Accepted
            }
            _ => DispatchResult::Ignored,
        }
    }

    fn hit(&self, tree: &WidgetTree, x: i32, y: i32) -> Option<WidgetId> {
        match tree.locate(self.window, x, y) {
            Ok(hit) => hit,
            Err(error) => {
                if tree.config().report_unsupported_hit_test {
                    tracing::warn!(target: targets::EVENT, x, y, %error, "hit test failed; treating as no hit");
                }
                None
            }
        }
    }

    /// Move the pointer to `under`, sending `Leave` and `Enter`.
    fn cross(&mut self, tree: &mut WidgetTree, under: Option<WidgetId>) {
        if self.pointer == under {
            return;
        }
        if let Some(old) = self.pointer.take() {
            tree.handle_event(old, &Event::Leave);
        }
        if let Some(new) = under {
            tree.handle_event(new, &Event::Enter);
        }
        self.pointer = under;
    }

    /// Deliver to `target` and bubble up to the window.
    fn deliver(&self, tree: &mut WidgetTree, target: Option<WidgetId>, event: &Event) -> DispatchResult {
        let Some(mut current) = target else {
            return DispatchResult::NoTarget;
        };
        loop {
            let parent = tree.parent(current);
            if tree.handle_event(current, event) {
                return DispatchResult::Accepted;
            }
            if !event.propagates() || current == self.window {
                return DispatchResult::Ignored;
            }
            match parent {
                Some(parent) => current = parent,
                None => return DispatchResult::Ignored,
            }
        }
    }
}
