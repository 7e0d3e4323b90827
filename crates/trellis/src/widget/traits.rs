//! The widget trait and the contexts its callbacks receive.
//!
//! [`Widget`] is the dispatch table of a widget kind. Implementations are
//! ordinary structs; the vtable of `dyn Widget` is shared by every instance
//! of a kind and never changes per instance. Generic behavior (flags,
//! parent links, surfaces, focus) lives in the [`WidgetTree`]; the trait
//! only carries what differs between kinds.
//!
//! While one of its callbacks runs, a widget is checked out of the tree.
//! Calls that would re-enter the same widget are queued (resizes, destroys,
//! accelerator removal) or rejected with a panic (structural edits).

use std::any::Any;
use std::rc::Rc;

use trellis_core::WidgetId;

use super::events::{Event, ModifierType};
use super::flags::{Style, WidgetFlags, WidgetState};
use super::geometry::{Allocation, Requisition};
use super::tree::WidgetTree;
use crate::error::HitTestError;
use crate::platform::{Backend, SurfaceId};

/// Behavior of one widget kind.
pub trait Widget: Any {
    /// Flags set on insertion, such as `CAN_FOCUS` or `HAS_OWN_SURFACE`.
    fn initial_flags(&self) -> WidgetFlags {
        WidgetFlags::empty()
    }

    // =========================================================================
    // Geometry
    // =========================================================================

    /// Compute the natural size.
    ///
    /// Containers request every visible child through
    /// [`WidgetContext::size_request`] before combining the results. The tree
    /// stores the returned value as the widget's requisition.
    fn size_request(&mut self, cx: &mut WidgetContext<'_>) -> Requisition;

    /// Position children inside `allocation`.
    ///
    /// The tree has already stored `allocation` and moved the widget's own
    /// surface. Leaves usually have nothing to do.
    fn size_allocate(&mut self, _cx: &mut WidgetContext<'_>, _allocation: Allocation) {}

    /// Drop the layout record for `child`. Returns `false` if the widget does
    /// not hold such a child.
    fn remove_child(&mut self, _child: WidgetId) -> bool {
        false
    }

    // =========================================================================
    // Lifecycle hooks
    // =========================================================================

    fn realize(&mut self, _cx: &mut WidgetContext<'_>) {}

    fn unrealize(&mut self, _cx: &mut WidgetContext<'_>) {}

    fn map(&mut self, _cx: &mut WidgetContext<'_>) {}

    fn unmap(&mut self, _cx: &mut WidgetContext<'_>) {}

    /// Release resources tied to the tree. Children are already gone.
    fn destroy(&mut self, _cx: &mut WidgetContext<'_>) {}

    // =========================================================================
    // Drawing
    // =========================================================================

    /// Paint the part of the widget inside `area`. Children are drawn by the
    /// tree afterwards.
    fn draw(&mut self, _cx: &mut WidgetContext<'_>, _area: Allocation) {}

    /// Paint the focus indicator.
    fn draw_focus(&mut self, _cx: &mut WidgetContext<'_>) {}

    // =========================================================================
    // Input
    // =========================================================================

    /// Handle an event. Returning `false` passes it on to the parent.
    fn handle_event(&mut self, _cx: &mut WidgetContext<'_>, _event: &Event) -> bool {
        false
    }

    /// Perform the widget's primary action, as for a keyboard accelerator.
    fn activate(&mut self, _cx: &mut WidgetContext<'_>) -> bool {
        false
    }

    /// Called after the tree changed the widget's state.
    fn state_changed(&mut self, _cx: &mut WidgetContext<'_>, _previous: WidgetState) {}

    /// Approve binding an accelerator to this widget.
    fn install_accelerator(&mut self, _key: char, _modifiers: ModifierType) -> bool {
        true
    }

    /// An accelerator bound to this widget was removed or replaced.
    fn remove_accelerator(&mut self, _cx: &mut WidgetContext<'_>) {}

    /// Find the widget under a point already known to be inside this one.
    ///
    /// The default searches children topmost-first and falls back to the
    /// widget itself.
    fn hit_test(&self, cx: &HitTestContext<'_>, x: i32, y: i32) -> Result<Option<WidgetId>, HitTestError> {
        for &child in cx.children().iter().rev() {
            if let Some(hit) = cx.locate(child, x, y)? {
                return Ok(Some(hit));
            }
        }
        Ok(Some(cx.id()))
    }
}

/// Access to the tree from inside a widget callback.
pub struct WidgetContext<'a> {
    tree: &'a mut WidgetTree,
    id: WidgetId,
}

impl<'a> WidgetContext<'a> {
    pub(crate) fn new(tree: &'a mut WidgetTree, id: WidgetId) -> Self {
        Self { tree, id }
    }

    /// The widget whose callback is running.
    pub fn id(&self) -> WidgetId {
        self.id
    }

    pub fn tree(&self) -> &WidgetTree {
        self.tree
    }

    /// Mutable tree access. Resizes and destroys issued here are queued until
    /// the outermost callback returns.
    pub fn tree_mut(&mut self) -> &mut WidgetTree {
        self.tree
    }

    /// The widget's children in container order.
    pub fn children(&self) -> Vec<WidgetId> {
        self.tree.children(self.id)
    }

    /// Whether `child` takes part in layout.
    pub fn is_visible(&self, child: WidgetId) -> bool {
        self.tree.flags(child).is_some_and(|flags| flags.contains(WidgetFlags::VISIBLE))
    }

    /// Run `child`'s size request and return its new requisition.
    pub fn size_request(&mut self, child: WidgetId) -> Requisition {
        self.tree.size_request(child)
    }

    /// The requisition `child` computed most recently.
    pub fn requisition(&self, child: WidgetId) -> Requisition {
        self.tree.node(child).map(|node| node.requisition()).unwrap_or_default()
    }

    /// Assign `child` its rectangle, clamped to at least one pixel per axis.
    pub fn size_allocate(&mut self, child: WidgetId, allocation: Allocation) {
        self.tree.size_allocate(child, allocation.clamped());
    }

    pub fn allocation(&self) -> Allocation {
        self.tree.node(self.id).map(|node| node.allocation()).unwrap_or_default()
    }

    pub fn flags(&self) -> WidgetFlags {
        self.tree.flags(self.id).unwrap_or_else(WidgetFlags::empty)
    }

    pub fn state(&self) -> WidgetState {
        self.tree.node(self.id).map(|node| node.state()).unwrap_or_default()
    }

    /// Record a new state for this widget. Its own `state_changed` hook is
    /// not called, since the widget is the caller.
    pub fn set_state(&mut self, state: WidgetState) {
        self.tree.set_state(self.id, state);
    }

    pub fn style(&self) -> Rc<Style> {
        self.tree.style(self.id)
    }

    /// Measure text in this widget's font.
    pub fn measure_text(&self, text: &str) -> (i32, i32) {
        let style = self.style();
        self.tree.backend().measure_text(&style.font, text)
    }

    /// The surface this widget draws on.
    pub fn surface(&self) -> Option<SurfaceId> {
        self.tree.node(self.id).and_then(|node| node.surface())
    }

    pub fn backend(&mut self) -> &mut dyn Backend {
        self.tree.backend_mut()
    }

    /// Ask the nearest ancestor container to lay this widget out again.
    pub fn queue_resize(&mut self) {
        self.tree.queue_resize(self.id);
    }
}

/// Read-only view of the tree used during hit testing.
pub struct HitTestContext<'a> {
    tree: &'a WidgetTree,
    id: WidgetId,
}

impl<'a> HitTestContext<'a> {
    pub(crate) fn new(tree: &'a WidgetTree, id: WidgetId) -> Self {
        Self { tree, id }
    }

    pub fn id(&self) -> WidgetId {
        self.id
    }

    pub fn children(&self) -> Vec<WidgetId> {
        self.tree.children(self.id)
    }

    pub fn allocation(&self) -> Allocation {
        self.tree.node(self.id).map(|node| node.allocation()).unwrap_or_default()
    }

    /// Hit-test a descendant.
    pub fn locate(&self, child: WidgetId, x: i32, y: i32) -> Result<Option<WidgetId>, HitTestError> {
        self.tree.locate(child, x, y)
    }
}

/// Short kind name of a widget type, without its module path.
pub(crate) fn kind_name<W: ?Sized>() -> &'static str {
    let full = std::any::type_name::<W>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
