//! Redraw and resize requests raised outside widget callbacks.
//!
//! Observers of shared data run wherever the data is changed, often with no
//! access to the [`WidgetTree`](super::WidgetTree). They record what needs
//! doing in a [`RepaintQueue`] handle instead, and the tree drains the queue
//! once no callback is running (see
//! [`WidgetTree::process_updates`](super::WidgetTree::process_updates)).

use std::cell::RefCell;
use std::rc::Rc;

use trellis_core::WidgetId;

#[derive(Debug, Default)]
struct Pending {
    resizes: Vec<WidgetId>,
    draws: Vec<WidgetId>,
}

/// Shared handle to a tree's pending redraws and resizes.
///
/// Clones refer to the same queue. Requests for the same widget coalesce.
#[derive(Debug, Clone, Default)]
pub struct RepaintQueue(Rc<RefCell<Pending>>);

impl RepaintQueue {
    /// Ask for `widget` to be drawn again.
    pub fn queue_draw(&self, widget: WidgetId) {
        let mut pending = self.0.borrow_mut();
        if !pending.draws.contains(&widget) {
            pending.draws.push(widget);
        }
    }

    /// Ask for `widget` to be laid out again, then drawn.
    pub fn queue_resize(&self, widget: WidgetId) {
        let mut pending = self.0.borrow_mut();
        if !pending.resizes.contains(&widget) {
            pending.resizes.push(widget);
        }
        if !pending.draws.contains(&widget) {
            pending.draws.push(widget);
        }
    }

    pub fn has_pending(&self) -> bool {
        let pending = self.0.borrow();
        !pending.resizes.is_empty() || !pending.draws.is_empty()
    }

    /// Number of widgets waiting for a redraw.
    pub fn pending_draws(&self) -> usize {
        self.0.borrow().draws.len()
    }

    /// Take everything queued so far, resizes first.
    pub(crate) fn take(&self) -> (Vec<WidgetId>, Vec<WidgetId>) {
        let mut pending = self.0.borrow_mut();
        (std::mem::take(&mut pending.resizes), std::mem::take(&mut pending.draws))
    }

    pub(crate) fn clear(&self) {
        let mut pending = self.0.borrow_mut();
        pending.resizes.clear();
        pending.draws.clear();
    }
}
