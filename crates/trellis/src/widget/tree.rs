//! The widget arena.
//!
//! Every widget lives in a [`WidgetTree`] keyed by [`WidgetId`]. The tree
//! owns the generic per-widget record (flags, state, style, parent and child
//! links, requisition, allocation, surface) and implements the operations
//! shared by all kinds: the show/hide/map/realize lifecycle, the two-pass
//! geometry protocol, sensitivity, focus and drawing.
//!
//! # Deferred work
//!
//! A widget is checked out of its node while one of its callbacks runs.
//! Resize requests and destroys issued during that window are queued and
//! processed when the outermost callback returns. The queue is processed in
//! rounds; if a round keeps producing new work past
//! [`ToolkitConfig::max_deferred_rounds`] the remainder is dropped with a
//! warning.
//!
//! Code without access to the tree, such as an observer of shared data,
//! queues redraws on the tree's [`RepaintQueue`] instead. Those run after
//! the deferred queue has settled.

use std::any::Any;
use std::collections::HashSet;
use std::fmt::Write as _;
use std::rc::Rc;

use slotmap::SlotMap;
use trellis_core::logging::{span_names, targets, PerfSpan, TreeFormatOptions};
use trellis_core::{TypeRegistry, TypeTag, WidgetId};

use super::events::{Event, ModifierType};
use super::flags::{Style, WidgetFlags, WidgetState};
use super::geometry::{Allocation, Requisition};
use super::repaint::RepaintQueue;
use super::traits::{kind_name, HitTestContext, Widget, WidgetContext};
use crate::config::ToolkitConfig;
use crate::error::HitTestError;
use crate::platform::{Backend, CallLog, HeadlessBackend, SurfaceId};

/// The generic record stored for every widget.
pub struct WidgetNode {
    widget: Option<Box<dyn Widget>>,
    type_tag: TypeTag,
    kind_name: &'static str,
    flags: WidgetFlags,
    state: WidgetState,
    style: Option<Rc<Style>>,
    parent: Option<WidgetId>,
    children: Vec<WidgetId>,
    focus_child: Option<WidgetId>,
    default_widget: Option<WidgetId>,
    requisition: Requisition,
    allocation: Allocation,
    surface: Option<SurfaceId>,
}

impl WidgetNode {
    pub fn type_tag(&self) -> TypeTag {
        self.type_tag
    }

    pub fn kind_name(&self) -> &'static str {
        self.kind_name
    }

    pub fn flags(&self) -> WidgetFlags {
        self.flags
    }

    pub fn state(&self) -> WidgetState {
        self.state
    }

    pub fn parent(&self) -> Option<WidgetId> {
        self.parent
    }

    pub fn children(&self) -> &[WidgetId] {
        &self.children
    }

    /// The child on the path to the focused widget.
    pub fn focus_child(&self) -> Option<WidgetId> {
        self.focus_child
    }

    pub fn requisition(&self) -> Requisition {
        self.requisition
    }

    pub fn allocation(&self) -> Allocation {
        self.allocation
    }

    pub fn surface(&self) -> Option<SurfaceId> {
        self.surface
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deferred {
    /// Re-run the scoped re-layout starting at this container.
    Resize(WidgetId),
    Destroy(WidgetId),
    /// Tell a widget one of its accelerators went away.
    AcceleratorRemoved(WidgetId),
}

/// Arena holding every widget of an application.
pub struct WidgetTree {
    nodes: SlotMap<WidgetId, WidgetNode>,
    types: TypeRegistry,
    backend: Box<dyn Backend>,
    config: ToolkitConfig,
    default_style: Rc<Style>,
    busy: usize,
    flushing: bool,
    deferred: Vec<Deferred>,
    repaints: RepaintQueue,
    updating: bool,
}

impl WidgetTree {
    /// Create an empty tree drawing through `backend`.
    pub fn new(backend: impl Backend + 'static) -> Self {
        Self::with_config(backend, ToolkitConfig::default())
    }

    pub fn with_config(backend: impl Backend + 'static, config: ToolkitConfig) -> Self {
        Self {
            nodes: SlotMap::with_key(),
            types: TypeRegistry::new(),
            backend: Box::new(backend),
            config,
            default_style: Rc::new(Style::default()),
            busy: 0,
            flushing: false,
            deferred: Vec::new(),
            repaints: RepaintQueue::default(),
            updating: false,
        }
    }

    /// Create a tree on a [`HeadlessBackend`] using the configured metrics.
    ///
    /// Returns the backend's call log for inspection.
    pub fn headless(config: ToolkitConfig) -> (Self, CallLog) {
        let backend = HeadlessBackend::with_metrics(config.headless);
        let log = backend.log();
        (Self::with_config(backend, config), log)
    }

    /// Handle for requesting redraws from code that cannot reach the tree,
    /// such as data observers.
    pub fn repaint_queue(&self) -> RepaintQueue {
        self.repaints.clone()
    }

    pub fn config(&self) -> &ToolkitConfig {
        &self.config
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    pub(crate) fn backend_mut(&mut self) -> &mut dyn Backend {
        self.backend.as_mut()
    }

    // =========================================================================
    // Nodes
    // =========================================================================

    /// Add a widget to the arena. It starts hidden, unrealized and without a
    /// parent.
    pub fn insert<W: Widget>(&mut self, widget: W) -> WidgetId {
        let flags = WidgetFlags::default() | widget.initial_flags();
        let type_tag = self.types.tag_of::<W>();
        let kind_name = kind_name::<W>();
        let id = self.nodes.insert(WidgetNode {
            widget: Some(Box::new(widget)),
            type_tag,
            kind_name,
            flags,
            state: WidgetState::Normal,
            style: None,
            parent: None,
            children: Vec::new(),
            focus_child: None,
            default_widget: None,
            requisition: Requisition::ZERO,
            allocation: Allocation::default(),
            surface: None,
        });
        tracing::trace!(target: targets::TREE, ?id, kind = kind_name, "inserted widget");
        id
    }

    pub fn contains(&self, id: WidgetId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: WidgetId) -> Option<&WidgetNode> {
        self.nodes.get(id)
    }

    pub fn flags(&self, id: WidgetId) -> Option<WidgetFlags> {
        self.nodes.get(id).map(|node| node.flags)
    }

    pub fn state(&self, id: WidgetId) -> Option<WidgetState> {
        self.nodes.get(id).map(|node| node.state)
    }

    pub fn parent(&self, id: WidgetId) -> Option<WidgetId> {
        self.nodes.get(id).and_then(|node| node.parent)
    }

    /// Children in container order. Empty for unknown ids.
    pub fn children(&self, id: WidgetId) -> Vec<WidgetId> {
        self.nodes.get(id).map(|node| node.children.clone()).unwrap_or_default()
    }

    pub fn requisition(&self, id: WidgetId) -> Option<Requisition> {
        self.nodes.get(id).map(|node| node.requisition)
    }

    pub fn allocation(&self, id: WidgetId) -> Option<Allocation> {
        self.nodes.get(id).map(|node| node.allocation)
    }

    /// The widget's style, or the tree default when none was set.
    pub fn style(&self, id: WidgetId) -> Rc<Style> {
        self.nodes
            .get(id)
            .and_then(|node| node.style.clone())
            .unwrap_or_else(|| self.default_style.clone())
    }

    /// Give a widget its own style record and lay it out again.
    pub fn set_style(&mut self, id: WidgetId, style: Rc<Style>) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.style = Some(style);
            self.queue_resize(id);
        }
    }

    /// Borrow the typed widget stored at `id`.
    pub fn widget<W: Widget>(&self, id: WidgetId) -> Option<&W> {
        let widget = self.nodes.get(id)?.widget.as_deref()?;
        (widget as &dyn Any).downcast_ref::<W>()
    }

    /// Mutably borrow the typed widget stored at `id`.
    ///
    /// Changes made here do not trigger a re-layout; use
    /// [`update_widget`](Self::update_widget) for changes that affect size.
    pub fn widget_mut<W: Widget>(&mut self, id: WidgetId) -> Option<&mut W> {
        let widget = self.nodes.get_mut(id)?.widget.as_deref_mut()?;
        (widget as &mut dyn Any).downcast_mut::<W>()
    }

    /// Change a widget's properties and queue a resize for it.
    pub fn update_widget<W: Widget, R>(&mut self, id: WidgetId, f: impl FnOnce(&mut W) -> R) -> Option<R> {
        let result = self.widget_mut::<W>(id).map(f)?;
        self.queue_resize(id);
        Some(result)
    }

    // =========================================================================
    // Callback plumbing
    // =========================================================================

    /// Run `f` with the widget checked out of its node.
    ///
    /// # Panics
    ///
    /// Panics if `id` is unknown or the widget is already inside one of its
    /// own callbacks.
    pub(crate) fn with_widget<R>(
        &mut self,
        id: WidgetId,
        f: impl FnOnce(&mut dyn Widget, &mut WidgetContext<'_>) -> R,
    ) -> R {
        let node = self
            .nodes
            .get_mut(id)
            .unwrap_or_else(|| panic!("unknown widget {id:?}"));
        let Some(mut widget) = node.widget.take() else {
            panic!("{} {id:?} re-entered while one of its callbacks is running", node.kind_name);
        };
        node.flags.insert(WidgetFlags::IN_CALL);
        self.busy += 1;

        let result = {
            let mut cx = WidgetContext::new(self, id);
            f(widget.as_mut(), &mut cx)
        };

        self.busy -= 1;
        if let Some(node) = self.nodes.get_mut(id) {
            node.widget = Some(widget);
            node.flags.remove(WidgetFlags::IN_CALL);
        }
        self.settle();
        result
    }

    /// Like [`with_widget`](Self::with_widget) for a known widget type.
    pub(crate) fn with_widget_as<W: Widget, R>(
        &mut self,
        id: WidgetId,
        f: impl FnOnce(&mut W, &mut WidgetContext<'_>) -> R,
    ) -> R {
        self.with_widget(id, |widget, cx| {
            match (widget as &mut dyn Any).downcast_mut::<W>() {
                Some(widget) => f(widget, cx),
                None => panic!("widget {id:?} is not a {}", kind_name::<W>()),
            }
        })
    }

    /// Run a hook if the widget exists and is not already in a callback.
    fn try_with_widget<R>(
        &mut self,
        id: WidgetId,
        f: impl FnOnce(&mut dyn Widget, &mut WidgetContext<'_>) -> R,
    ) -> Option<R> {
        if self.nodes.get(id)?.widget.is_none() {
            return None;
        }
        Some(self.with_widget(id, f))
    }

    /// Run `f` with deferred work held back until it returns.
    pub(crate) fn batch<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.busy += 1;
        let result = f(self);
        self.busy -= 1;
        self.settle();
        result
    }

    /// Whether a widget callback is running, so resizes and destroys are
    /// being queued.
    pub fn is_busy(&self) -> bool {
        self.busy > 0
    }

    fn settle(&mut self) {
        if self.busy > 0 || self.flushing {
            return;
        }
        if !self.deferred.is_empty() {
            self.flush_deferred();
        }
        if !self.updating && self.repaints.has_pending() {
            self.process_updates();
        }
    }

    /// Run the resizes and redraws waiting in the [`RepaintQueue`].
    ///
    /// Called automatically once widget callbacks return. An event loop
    /// calls it when idle to pick up changes made from outside any callback.
    pub fn process_updates(&mut self) {
        if self.busy > 0 || self.updating {
            return;
        }
        self.updating = true;
        let mut rounds = 0;
        while self.repaints.has_pending() {
            rounds += 1;
            if rounds > self.config.max_deferred_rounds {
                tracing::warn!(target: targets::TREE, rounds, "pending redraws did not settle, dropping them");
                self.repaints.clear();
                break;
            }
            let (resizes, draws) = self.repaints.take();
            for id in resizes {
                self.queue_resize(id);
            }
            for id in draws {
                let Some(area) = self.nodes.get(id).map(|node| self.local_bounds(node)) else {
                    continue;
                };
                self.draw(id, area);
            }
        }
        self.updating = false;
    }

    fn flush_deferred(&mut self) {
        self.flushing = true;
        let mut rounds = 0;
        while !self.deferred.is_empty() {
            rounds += 1;
            if rounds > self.config.max_deferred_rounds {
                tracing::warn!(
                    target: targets::TREE,
                    dropped = self.deferred.len(),
                    rounds,
                    "deferred work did not settle, dropping it"
                );
                self.deferred.clear();
                break;
            }

            let work = std::mem::take(&mut self.deferred);
            let mut resized = HashSet::new();
            for item in work {
                match item {
                    Deferred::Destroy(id) => self.destroy(id),
                    Deferred::Resize(id) => {
                        if self.nodes.contains_key(id) && resized.insert(id) {
                            self.need_resize(id);
                        }
                    }
                    Deferred::AcceleratorRemoved(id) => self.notify_accelerator_removed(id),
                }
            }
        }
        self.flushing = false;
    }

    // =========================================================================
    // Structure
    // =========================================================================

    /// Make `child` a child of `parent`, letting the parent record its layout
    /// parameters through `attach`.
    ///
    /// The child is realized and mapped to match the parent, and a resize is
    /// queued.
    ///
    /// # Panics
    ///
    /// Panics if `child` already has a parent, is a top-level, is `parent`
    /// or one of its ancestors, or if `parent` is not a `W`.
    pub fn adopt<W: Widget, R>(&mut self, parent: WidgetId, child: WidgetId, attach: impl FnOnce(&mut W) -> R) -> R {
        let child_node = self
            .nodes
            .get(child)
            .unwrap_or_else(|| panic!("unknown widget {child:?}"));
        assert!(
            child_node.parent.is_none(),
            "{} {child:?} already has a parent",
            child_node.kind_name
        );
        assert!(
            !child_node.flags.contains(WidgetFlags::TOPLEVEL),
            "a top-level widget cannot be added to a container"
        );
        assert!(
            parent != child && !self.is_descendant(parent, child),
            "adding {child:?} to {parent:?} would create a cycle"
        );

        let result = self.with_widget_as::<W, _>(parent, |widget, _| attach(widget));

        let parent_flags = self.nodes[parent].flags;
        self.nodes[parent].children.push(child);
        self.nodes[child].parent = Some(parent);
        self.nodes[child]
            .flags
            .set(WidgetFlags::PARENT_SENSITIVE, parent_flags.is_sensitive());
        tracing::debug!(target: targets::TREE, ?parent, ?child, "adopted widget");

        self.batch(|tree| {
            tree.refresh_sensitivity(child);
            if parent_flags.contains(WidgetFlags::REALIZED) {
                tree.realize(child);
            }
            if parent_flags.contains(WidgetFlags::MAPPED) {
                tree.map(child);
            }
            tree.queue_resize(child);
        });
        result
    }

    /// Detach `child` from `container` without destroying it.
    ///
    /// The child is unrealized and the container laid out again.
    ///
    /// # Panics
    ///
    /// Panics if `child` is not a child of `container`.
    pub fn remove(&mut self, container: WidgetId, child: WidgetId) {
        assert_eq!(
            self.parent(child),
            Some(container),
            "{child:?} is not a child of {container:?}"
        );
        self.batch(|tree| {
            if tree.nodes[child].flags.contains(WidgetFlags::REALIZED) {
                tree.unrealize(child);
            }
            tree.unlink(container, child);
            tree.need_resize(container);
        });
    }

    fn unlink(&mut self, parent: WidgetId, child: WidgetId) {
        let top = self.toplevel(parent);
        let focus = self.focus_widget(top);
        let removed = self.with_widget(parent, |widget, _| widget.remove_child(child));
        assert!(removed, "{child:?} is not a child of {parent:?}");

        let node = &mut self.nodes[parent];
        node.children.retain(|&c| c != child);
        if node.focus_child == Some(child) {
            node.focus_child = None;
        }
        self.nodes[child].parent = None;

        let in_subtree = |tree: &Self, id: WidgetId| id == child || tree.is_descendant(id, child);
        if let Some(default) = self.nodes[top].default_widget {
            if in_subtree(self, default) {
                self.nodes[top].default_widget = None;
            }
        }
        if let Some(focus) = focus {
            if in_subtree(self, focus) {
                self.nodes[focus].flags.remove(WidgetFlags::HAS_FOCUS);
            }
        }
        tracing::debug!(target: targets::TREE, ?parent, ?child, "removed widget");
    }

    /// Move `child` to `index` among its parent's children.
    pub(crate) fn move_child(&mut self, parent: WidgetId, child: WidgetId, index: usize) {
        let children = &mut self.nodes[parent].children;
        if let Some(current) = children.iter().position(|&c| c == child) {
            children.remove(current);
            children.insert(index.min(children.len()), child);
        }
    }

    /// Whether `widget` is strictly below `ancestor`.
    pub fn is_descendant(&self, widget: WidgetId, ancestor: WidgetId) -> bool {
        let mut current = self.parent(widget);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// The root of the hierarchy containing `id`.
    pub fn toplevel(&self, id: WidgetId) -> WidgetId {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Mark the widget visible.
    ///
    /// A top-level is laid out and mapped. A child of a mapped parent is
    /// mapped, and its container queued for re-layout.
    pub fn show(&mut self, id: WidgetId) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        if node.flags.contains(WidgetFlags::VISIBLE) {
            return;
        }
        node.flags.insert(WidgetFlags::VISIBLE);
        let parent = node.parent;
        let toplevel = node.flags.contains(WidgetFlags::TOPLEVEL);

        self.batch(|tree| match parent {
            Some(parent) => {
                if tree.nodes[parent].flags.contains(WidgetFlags::MAPPED) {
                    tree.map(id);
                }
                tree.queue_resize(id);
            }
            None if toplevel => {
                tree.relayout_from(id);
                tree.map(id);
            }
            None => {}
        });
    }

    /// Show the widget and its whole subtree.
    pub fn show_all(&mut self, id: WidgetId) {
        self.batch(|tree| {
            for child in tree.children(id) {
                tree.show_all(child);
            }
            tree.show(id);
        });
    }

    /// Mark the widget invisible, unmapping it and freeing its space.
    pub fn hide(&mut self, id: WidgetId) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        if !node.flags.contains(WidgetFlags::VISIBLE) {
            return;
        }
        node.flags.remove(WidgetFlags::VISIBLE);
        let mapped = node.flags.contains(WidgetFlags::MAPPED);
        let has_parent = node.parent.is_some();

        self.batch(|tree| {
            if mapped {
                tree.unmap(id);
            }
            if has_parent {
                tree.queue_resize(id);
            }
        });
    }

    /// Put a visible widget and its visible children on screen, realizing
    /// them first if needed.
    pub fn map(&mut self, id: WidgetId) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        if node.flags.contains(WidgetFlags::MAPPED) || !node.flags.contains(WidgetFlags::VISIBLE) {
            return;
        }
        if !node.flags.contains(WidgetFlags::REALIZED) {
            self.realize(id);
        }
        self.nodes[id].flags.insert(WidgetFlags::MAPPED);
        for child in self.children(id) {
            self.map(child);
        }
        self.try_with_widget(id, |widget, cx| widget.map(cx));
    }

    pub fn unmap(&mut self, id: WidgetId) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        if !node.flags.contains(WidgetFlags::MAPPED) {
            return;
        }
        node.flags.remove(WidgetFlags::MAPPED);
        for child in self.children(id) {
            self.unmap(child);
        }
        self.try_with_widget(id, |widget, cx| widget.unmap(cx));
    }

    /// Attach the widget to a drawing surface.
    ///
    /// Widgets with `HAS_OWN_SURFACE` get a new surface from the backend,
    /// nested in the parent's; others draw on the parent's surface. The
    /// parent is realized first.
    pub fn realize(&mut self, id: WidgetId) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        if node.flags.contains(WidgetFlags::REALIZED) {
            return;
        }
        let parent = node.parent;
        let own_surface = node.flags.contains(WidgetFlags::HAS_OWN_SURFACE);
        let allocation = node.allocation;

        if let Some(parent) = parent {
            self.realize(parent);
        }
        let parent_surface = parent.and_then(|parent| self.nodes[parent].surface);
        let surface = if own_surface {
            Some(self.backend.create_surface(parent_surface, allocation))
        } else {
            parent_surface
        };

        let node = &mut self.nodes[id];
        node.surface = surface;
        node.flags.insert(WidgetFlags::REALIZED);
        tracing::trace!(target: targets::TREE, ?id, ?surface, "realized");
        self.try_with_widget(id, |widget, cx| widget.realize(cx));
    }

    /// Release the widget's surface, unmapping and unrealizing children first.
    pub fn unrealize(&mut self, id: WidgetId) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        if !node.flags.contains(WidgetFlags::REALIZED) {
            return;
        }
        if node.flags.contains(WidgetFlags::MAPPED) {
            self.unmap(id);
        }
        for child in self.children(id) {
            self.unrealize(child);
        }
        self.try_with_widget(id, |widget, cx| widget.unrealize(cx));

        let node = &mut self.nodes[id];
        let surface = node.surface.take();
        node.flags.remove(WidgetFlags::REALIZED);
        if node.flags.contains(WidgetFlags::HAS_OWN_SURFACE) {
            if let Some(surface) = surface {
                self.backend.destroy_surface(surface);
            }
        }
    }

    /// Destroy the widget and its subtree.
    ///
    /// The widget is removed from its parent, which is laid out again. If
    /// called while widget callbacks are running, the widget is flagged
    /// `PENDING_DESTROY` and destroyed once they return.
    pub fn destroy(&mut self, id: WidgetId) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        if self.busy > 0 {
            if !node.flags.contains(WidgetFlags::PENDING_DESTROY) {
                node.flags.insert(WidgetFlags::PENDING_DESTROY);
                self.deferred.push(Deferred::Destroy(id));
                tracing::debug!(target: targets::TREE, ?id, "destroy deferred");
            }
            return;
        }

        let parent = node.parent;
        self.batch(|tree| {
            if tree.nodes[id].flags.contains(WidgetFlags::REALIZED) {
                tree.unrealize(id);
            }
            if let Some(parent) = parent {
                tree.unlink(parent, id);
                tree.need_resize(parent);
            }
            tree.destroy_subtree(id);
        });
    }

    fn destroy_subtree(&mut self, id: WidgetId) {
        for child in self.children(id) {
            self.destroy_subtree(child);
        }
        self.try_with_widget(id, |widget, cx| widget.destroy(cx));
        if let Some(node) = self.nodes.remove(id) {
            tracing::debug!(target: targets::TREE, ?id, kind = node.kind_name, "destroyed widget");
        }
    }

    // =========================================================================
    // Geometry
    // =========================================================================

    /// Run the request pass for `id` and store its requisition.
    #[tracing::instrument(skip(self), target = "trellis::layout", level = "trace")]
    pub fn size_request(&mut self, id: WidgetId) -> Requisition {
        let requisition = self.with_widget(id, |widget, cx| widget.size_request(cx));
        self.nodes[id].requisition = requisition;
        requisition
    }

    /// Store an allocation, move the widget's own surface and let the widget
    /// place its children.
    #[tracing::instrument(skip(self), target = "trellis::layout", level = "trace")]
    pub fn size_allocate(&mut self, id: WidgetId, allocation: Allocation) {
        let allocation = allocation.clamped();
        let node = &mut self.nodes[id];
        node.allocation = allocation;
        if node.flags.contains(WidgetFlags::HAS_OWN_SURFACE) {
            if let Some(surface) = node.surface {
                self.backend.move_resize_surface(surface, allocation);
            }
        }
        self.with_widget(id, |widget, cx| widget.size_allocate(cx, allocation));
    }

    /// Ask for `id` to be laid out again, starting at its parent.
    ///
    /// Queued while callbacks are running.
    pub fn queue_resize(&mut self, id: WidgetId) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        let start = node.parent.unwrap_or(id);
        if self.busy > 0 {
            self.deferred.push(Deferred::Resize(start));
        } else {
            self.need_resize(start);
        }
    }

    /// Scoped re-layout after a child of `container` changed.
    ///
    /// The container's requisition is recomputed and the walk moves up while
    /// requisitions keep changing. The highest widget reached is then
    /// allocated again with its current allocation, so nothing outside that
    /// subtree is touched. Nothing happens while the hierarchy's top-level
    /// is hidden.
    pub fn need_resize(&mut self, container: WidgetId) {
        if !self.nodes.contains_key(container) {
            return;
        }
        if self.busy > 0 {
            self.deferred.push(Deferred::Resize(container));
            return;
        }
        let top = self.toplevel(container);
        let top_flags = self.nodes[top].flags;
        if top_flags.contains(WidgetFlags::TOPLEVEL) && !top_flags.contains(WidgetFlags::VISIBLE) {
            // `show` lays the whole hierarchy out.
            tracing::trace!(target: targets::LAYOUT, ?container, ?top, "top-level hidden, re-layout skipped");
            return;
        }
        self.batch(|tree| tree.relayout_from(container));
    }

    fn relayout_from(&mut self, container: WidgetId) {
        let _perf = PerfSpan::new(span_names::RELAYOUT);
        let mut target = container;
        loop {
            let previous = self.nodes[target].requisition;
            let requisition = self.size_request(target);
            match self.nodes[target].parent {
                Some(parent) if requisition != previous => target = parent,
                _ => break,
            }
        }

        let node = &self.nodes[target];
        let requisition = node.requisition;
        let mut allocation = node.allocation;
        if node.parent.is_none() {
            if allocation.is_empty() {
                allocation.width = requisition.width;
                allocation.height = requisition.height;
            } else if self.config.toplevel_grows {
                allocation.width = allocation.width.max(requisition.width);
                allocation.height = allocation.height.max(requisition.height);
            }
        }
        tracing::debug!(target: targets::LAYOUT, ?container, ?target, %allocation, "re-layout");
        self.size_allocate(target, allocation);
    }

    /// Apply a size chosen by the window system to a top-level.
    pub fn configure(&mut self, toplevel: WidgetId, allocation: Allocation) {
        self.batch(|tree| tree.size_allocate(toplevel, allocation));
    }

    // =========================================================================
    // State
    // =========================================================================

    /// Set the widget's own sensitivity and propagate the effective value to
    /// its descendants.
    pub fn set_sensitive(&mut self, id: WidgetId, sensitive: bool) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        if node.flags.contains(WidgetFlags::SENSITIVE) == sensitive {
            return;
        }
        node.flags.set(WidgetFlags::SENSITIVE, sensitive);
        self.batch(|tree| tree.refresh_sensitivity(id));
    }

    fn refresh_sensitivity(&mut self, id: WidgetId) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        let sensitive = node.flags.is_sensitive();
        match (sensitive, node.state) {
            (false, state) if state != WidgetState::Insensitive => self.set_state(id, WidgetState::Insensitive),
            (true, WidgetState::Insensitive) => self.set_state(id, WidgetState::Normal),
            _ => {}
        }
        for child in self.children(id) {
            self.nodes[child].flags.set(WidgetFlags::PARENT_SENSITIVE, sensitive);
            self.refresh_sensitivity(child);
        }
    }

    /// Change the interaction state and notify the widget.
    pub fn set_state(&mut self, id: WidgetId, state: WidgetState) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        let previous = node.state;
        if previous == state {
            return;
        }
        node.state = state;
        self.try_with_widget(id, |widget, cx| widget.state_changed(cx, previous));
    }

    /// Give keyboard focus to `id`.
    ///
    /// Every ancestor records the child on the path to it. Returns `false` if
    /// the widget cannot take focus.
    pub fn grab_focus(&mut self, id: WidgetId) -> bool {
        let Some(node) = self.nodes.get(id) else {
            return false;
        };
        if !node.flags.contains(WidgetFlags::CAN_FOCUS) || !node.flags.is_sensitive() {
            return false;
        }
        let top = self.toplevel(id);
        if let Some(previous) = self.focus_widget(top) {
            self.nodes[previous].flags.remove(WidgetFlags::HAS_FOCUS);
        }
        self.nodes[id].flags.insert(WidgetFlags::HAS_FOCUS);
        self.nodes[id].focus_child = None;

        let mut child = id;
        while let Some(parent) = self.nodes[child].parent {
            self.nodes[parent].focus_child = Some(child);
            child = parent;
        }
        tracing::debug!(target: targets::TREE, ?id, "focus");
        true
    }

    /// The focused widget in the hierarchy rooted at `toplevel`.
    pub fn focus_widget(&self, toplevel: WidgetId) -> Option<WidgetId> {
        let mut current = toplevel;
        while let Some(next) = self.nodes.get(current)?.focus_child {
            current = next;
        }
        self.nodes
            .get(current)
            .filter(|node| node.flags.contains(WidgetFlags::HAS_FOCUS))
            .map(|_| current)
    }

    /// Make `id` the default widget of its top-level.
    pub fn grab_default(&mut self, id: WidgetId) -> bool {
        let Some(node) = self.nodes.get(id) else {
            return false;
        };
        if !node.flags.contains(WidgetFlags::CAN_DEFAULT) {
            return false;
        }
        let top = self.toplevel(id);
        if let Some(previous) = self.nodes[top].default_widget.take() {
            if let Some(node) = self.nodes.get_mut(previous) {
                node.flags.remove(WidgetFlags::HAS_DEFAULT);
            }
        }
        self.nodes[id].flags.insert(WidgetFlags::HAS_DEFAULT);
        self.nodes[top].default_widget = Some(id);
        true
    }

    pub fn default_widget(&self, toplevel: WidgetId) -> Option<WidgetId> {
        self.nodes.get(toplevel)?.default_widget
    }

    // =========================================================================
    // Drawing and input
    // =========================================================================

    /// The widget's rectangle in its surface's coordinates.
    ///
    /// A top-level's surface starts at its own origin.
    fn local_bounds(&self, node: &WidgetNode) -> Allocation {
        if node.flags.contains(WidgetFlags::TOPLEVEL) {
            Allocation::new(0, 0, node.allocation.width, node.allocation.height)
        } else {
            node.allocation
        }
    }

    /// Redraw the part of the widget inside `area`, then its children, then
    /// its focus indicator.
    pub fn draw(&mut self, id: WidgetId, area: Allocation) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        if !node.flags.is_drawable() {
            return;
        }
        let Some(visible) = area.intersect(&self.local_bounds(node)) else {
            return;
        };
        let has_focus = node.flags.contains(WidgetFlags::HAS_FOCUS);

        self.batch(|tree| {
            tree.try_with_widget(id, |widget, cx| widget.draw(cx, visible));
            for child in tree.children(id) {
                tree.draw(child, visible);
            }
            if has_focus {
                tree.try_with_widget(id, |widget, cx| widget.draw_focus(cx));
            }
        });
    }

    /// Find the deepest widget under a point in `root`'s surface.
    ///
    /// Hidden widgets and points outside `root` give `Ok(None)`.
    pub fn locate(&self, root: WidgetId, x: i32, y: i32) -> Result<Option<WidgetId>, HitTestError> {
        let Some(node) = self.nodes.get(root) else {
            return Ok(None);
        };
        if !node.flags.is_drawable() || !self.local_bounds(node).contains(x, y) {
            return Ok(None);
        }
        match node.widget.as_deref() {
            Some(widget) => widget.hit_test(&HitTestContext::new(self, root), x, y),
            None => Ok(Some(root)),
        }
    }

    /// Deliver an event to one widget. Insensitive widgets refuse it.
    pub fn handle_event(&mut self, id: WidgetId, event: &Event) -> bool {
        let Some(node) = self.nodes.get(id) else {
            return false;
        };
        if !node.flags.is_sensitive() {
            return false;
        }
        self.try_with_widget(id, |widget, cx| widget.handle_event(cx, event))
            .unwrap_or(false)
    }

    /// Run the widget's primary action.
    pub fn activate(&mut self, id: WidgetId) -> bool {
        let Some(node) = self.nodes.get(id) else {
            return false;
        };
        if !node.flags.is_sensitive() {
            return false;
        }
        self.try_with_widget(id, |widget, cx| widget.activate(cx))
            .unwrap_or(false)
    }

    /// Tell a widget one of its accelerators was removed. Queued while the
    /// widget is inside a callback.
    pub(crate) fn notify_accelerator_removed(&mut self, id: WidgetId) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        if node.widget.is_none() {
            self.deferred.push(Deferred::AcceleratorRemoved(id));
            return;
        }
        self.with_widget(id, |widget, cx| widget.remove_accelerator(cx));
    }

    /// Ask a widget whether it accepts an accelerator.
    pub(crate) fn approve_accelerator(
        &mut self,
        id: WidgetId,
        key: char,
        modifiers: ModifierType,
    ) -> bool {
        self.try_with_widget(id, |widget, _| widget.install_accelerator(key, modifiers))
            .unwrap_or(false)
    }

    // =========================================================================
    // Debugging
    // =========================================================================

    /// Render the subtree at `root` as text, one widget per line.
    pub fn format_tree(&self, root: WidgetId, options: &TreeFormatOptions) -> String {
        let mut out = String::new();
        self.format_node(root, options, 0, true, &mut out);
        out
    }

    fn format_node(&self, id: WidgetId, options: &TreeFormatOptions, depth: usize, is_last: bool, out: &mut String) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        if options.max_depth.is_some_and(|max| depth > max) {
            return;
        }
        out.push_str(&options.prefix(depth, is_last));
        out.push_str(node.kind_name);
        if options.show_ids {
            let _ = write!(out, " {id:?}");
        }
        let _ = write!(out, " {}", node.allocation);
        if options.show_flags {
            let _ = write!(out, " {:?}", node.flags);
        }
        out.push('\n');

        let count = node.children.len();
        for (index, &child) in node.children.iter().enumerate() {
            self.format_node(child, options, depth + 1, index + 1 == count, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::layout::{BoxContainer, BoxPacking};
    use crate::widget::widgets::{Button, DrawingArea, Label, Window};

    struct Fixture {
        tree: WidgetTree,
        window: WidgetId,
        vbox: WidgetId,
        button: WidgetId,
    }

    fn fixture() -> Fixture {
        let mut tree = WidgetTree::new(HeadlessBackend::new());
        let window = tree.insert(Window::new("w"));
        let vbox = tree.insert(BoxContainer::vertical(0));
        let button = tree.insert(Button::new("OK"));
        tree.add_to_window(window, vbox);
        tree.pack_start(vbox, button, BoxPacking::default());
        tree.show_all(window);
        Fixture {
            tree,
            window,
            vbox,
            button,
        }
    }

    #[test]
    #[should_panic(expected = "would create a cycle")]
    fn test_adopt_rejects_cycle() {
        let mut tree = WidgetTree::new(HeadlessBackend::new());
        let outer = tree.insert(BoxContainer::vertical(0));
        let inner = tree.insert(BoxContainer::vertical(0));
        tree.pack_start(outer, inner, BoxPacking::default());
        tree.pack_start(inner, outer, BoxPacking::default());
    }

    #[test]
    #[should_panic(expected = "already has a parent")]
    fn test_adopt_rejects_second_parent() {
        let mut tree = WidgetTree::new(HeadlessBackend::new());
        let first = tree.insert(BoxContainer::vertical(0));
        let second = tree.insert(BoxContainer::vertical(0));
        let label = tree.insert(Label::new("x"));
        tree.pack_start(first, label, BoxPacking::default());
        tree.pack_start(second, label, BoxPacking::default());
    }

    #[test]
    #[should_panic(expected = "cannot be added to a container")]
    fn test_adopt_rejects_toplevel() {
        let mut tree = WidgetTree::new(HeadlessBackend::new());
        let vbox = tree.insert(BoxContainer::vertical(0));
        let window = tree.insert(Window::new("w"));
        tree.pack_start(vbox, window, BoxPacking::default());
    }

    #[test]
    fn test_adopt_into_mapped_parent_maps_child() {
        let Fixture { mut tree, vbox, .. } = fixture();
        let label = tree.insert(Label::new("late"));
        tree.show(label);
        tree.pack_start(vbox, label, BoxPacking::default());

        let flags = tree.flags(label).unwrap();
        assert!(flags.contains(WidgetFlags::REALIZED | WidgetFlags::MAPPED));
        assert_eq!(tree.node(label).and_then(|n| n.surface()), tree.node(vbox).and_then(|n| n.surface()));
    }

    #[test]
    fn test_hidden_toplevel_is_laid_out_when_shown() {
        let config = ToolkitConfig {
            toplevel_grows: false,
            ..ToolkitConfig::default()
        };
        let mut tree = WidgetTree::with_config(HeadlessBackend::new(), config);
        let window = tree.insert(Window::new("w"));
        let hbox = tree.insert(BoxContainer::horizontal(0));
        let area = tree.insert(DrawingArea::new(10, 10));
        tree.add_to_window(window, hbox);
        tree.pack_start(hbox, area, BoxPacking::default());
        assert_eq!(tree.allocation(window), Some(Allocation::default()));

        tree.show_all(window);
        assert_eq!(tree.allocation(window), Some(Allocation::new(0, 0, 10, 10)));
        assert_eq!(tree.allocation(area), Some(Allocation::new(0, 0, 10, 10)));
    }

    #[test]
    fn test_hidden_toplevel_ignores_resizes_until_shown() {
        let Fixture {
            mut tree, window, button, ..
        } = fixture();
        tree.hide(window);
        tree.update_widget::<Button, _>(button, |b| b.set_label("Cancel"));
        assert_eq!(tree.allocation(window), Some(Allocation::new(0, 0, 22, 21)));

        tree.show(window);
        assert_eq!(tree.allocation(window), Some(Allocation::new(0, 0, 50, 21)));
    }

    #[test]
    fn test_insensitive_parent_propagates() {
        let Fixture {
            mut tree, vbox, button, ..
        } = fixture();

        tree.set_sensitive(vbox, false);
        assert_eq!(tree.state(button), Some(WidgetState::Insensitive));
        assert!(!tree.flags(button).unwrap().is_sensitive());
        assert!(tree.flags(button).unwrap().contains(WidgetFlags::SENSITIVE));
        assert!(!tree.grab_focus(button));
        assert!(!tree.activate(button));

        tree.set_sensitive(vbox, true);
        assert_eq!(tree.state(button), Some(WidgetState::Normal));
        assert!(tree.grab_focus(button));
    }

    #[test]
    fn test_hide_unmaps_subtree_but_keeps_visibility() {
        let Fixture {
            mut tree, vbox, button, ..
        } = fixture();

        tree.hide(vbox);
        let flags = tree.flags(button).unwrap();
        assert!(!flags.contains(WidgetFlags::MAPPED));
        assert!(flags.contains(WidgetFlags::VISIBLE | WidgetFlags::REALIZED));

        tree.show(vbox);
        assert!(tree.flags(button).unwrap().contains(WidgetFlags::MAPPED));
    }

    #[test]
    fn test_focus_chain_follows_grab() {
        let Fixture {
            mut tree,
            window,
            vbox,
            button,
        } = fixture();

        assert_eq!(tree.focus_widget(window), None);
        assert!(tree.grab_focus(button));
        assert_eq!(tree.focus_widget(window), Some(button));
        assert_eq!(tree.node(window).and_then(|n| n.focus_child()), Some(vbox));
        assert_eq!(tree.node(vbox).and_then(|n| n.focus_child()), Some(button));
        assert!(!tree.grab_focus(vbox));
    }

    #[test]
    fn test_remove_clears_focus_and_default() {
        let Fixture {
            mut tree,
            window,
            vbox,
            button,
        } = fixture();
        tree.grab_focus(button);
        tree.grab_default(button);
        assert_eq!(tree.default_widget(window), Some(button));

        tree.remove(vbox, button);

        assert!(tree.contains(button));
        assert_eq!(tree.parent(button), None);
        assert_eq!(tree.focus_widget(window), None);
        assert_eq!(tree.default_widget(window), None);
        let flags = tree.flags(button).unwrap();
        assert!(!flags.contains(WidgetFlags::HAS_FOCUS));
        assert!(!flags.contains(WidgetFlags::REALIZED));
        assert_eq!(tree.requisition(vbox), Some(Requisition::ZERO));
    }

    #[test]
    fn test_destroy_takes_subtree() {
        let Fixture {
            mut tree,
            window,
            vbox,
            button,
        } = fixture();

        tree.destroy(vbox);

        assert!(!tree.contains(vbox));
        assert!(!tree.contains(button));
        assert_eq!(tree.len(), 1);
        assert!(tree.children(window).is_empty());
        assert_eq!(tree.widget::<Window>(window).and_then(Window::child), None);
    }

    #[test]
    fn test_destroy_unknown_widget_is_noop() {
        let Fixture {
            mut tree, button, ..
        } = fixture();
        tree.destroy(button);
        tree.destroy(button);
        assert!(!tree.contains(button));
    }

    #[test]
    fn test_format_tree_minimal() {
        let mut tree = WidgetTree::new(HeadlessBackend::new());
        let window = tree.insert(Window::new("w"));
        let vbox = tree.insert(BoxContainer::vertical(0));
        let label = tree.insert(Label::new("hi"));
        tree.add_to_window(window, vbox);
        tree.pack_start(vbox, label, BoxPacking::default());
        tree.show_all(window);

        let text = tree.format_tree(window, &TreeFormatOptions::minimal());
        assert_eq!(
            text,
            "Window 14x13+0+0\n- BoxContainer 14x13+0+0\n  - Label 14x13+0+0\n"
        );
    }

    #[test]
    fn test_format_tree_respects_max_depth() {
        let Fixture { tree, window, .. } = fixture();
        let options = TreeFormatOptions {
            max_depth: Some(0),
            ..TreeFormatOptions::minimal()
        };
        assert_eq!(tree.format_tree(window, &options).lines().count(), 1);
    }
}
