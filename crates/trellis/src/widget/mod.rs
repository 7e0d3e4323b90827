//! Widget system for Trellis.
//!
//! Widgets live in a [`WidgetTree`] arena and are addressed by
//! [`WidgetId`](trellis_core::WidgetId). Each concrete kind implements the
//! [`Widget`] trait; the tree owns the per-node bookkeeping (flags, state,
//! parent and children, requisition and allocation, surface) and calls the
//! kind's hooks through a [`WidgetContext`].
//!
//! # Geometry Negotiation
//!
//! Layout runs in two passes:
//!
//! 1. **Size request** (bottom-up): [`WidgetTree::size_request`] asks a
//!    widget for its natural size, which a container computes from its
//!    children's requisitions.
//! 2. **Size allocation** (top-down): [`WidgetTree::size_allocate`] hands a
//!    widget its final rectangle, and a container splits it among children.
//!
//! A widget whose natural size changes calls
//! [`WidgetTree::queue_resize`]. The request climbs only as far as
//! requisitions keep changing, and the container where it stops is
//! re-allocated in place. Requests made from inside a widget callback are
//! queued until the outermost callback returns.
//!
//! # Example
//!
//! ```
//! use trellis::platform::HeadlessBackend;
//! use trellis::widget::layout::{BoxContainer, BoxPacking};
//! use trellis::widget::widgets::{Button, Label, Window};
//! use trellis::widget::{Allocation, WidgetTree};
//!
//! let mut tree = WidgetTree::new(HeadlessBackend::new());
//! let window = tree.insert(Window::new("Demo"));
//! let column = tree.insert(BoxContainer::vertical(2));
//! let title = tree.insert(Label::new("Title"));
//! let ok = tree.insert(Button::new("OK"));
//!
//! tree.add_to_window(window, column);
//! tree.pack_start(column, title, BoxPacking::new(false, false, 0));
//! tree.pack_start(column, ok, BoxPacking::default());
//! tree.show_all(window);
//!
//! // "Title" is 35x13 and the button 22x21 with the headless metrics.
//! assert_eq!(tree.allocation(window), Some(Allocation::new(0, 0, 35, 36)));
//! assert_eq!(tree.allocation(ok), Some(Allocation::new(0, 15, 35, 21)));
//! ```

pub mod accelerator;
mod dispatcher;
mod events;
mod flags;
mod geometry;
pub mod layout;
mod repaint;
mod traits;
mod tree;
pub mod widgets;

pub use accelerator::AcceleratorTable;
pub use dispatcher::{DispatchResult, EventRouter};
pub use events::{Event, Key, ModifierType, NamedKey};
pub use flags::{Color, Style, WidgetFlags, WidgetState};
pub use geometry::{clamp_dimension, Allocation, Orientation, Requisition, MIN_DIMENSION};
pub use repaint::RepaintQueue;
pub use traits::{HitTestContext, Widget, WidgetContext};
pub use tree::{WidgetNode, WidgetTree};
