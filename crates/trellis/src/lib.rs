//! Trellis - a retained-mode widget toolkit core.
//!
//! This is the main crate. It builds on [`trellis_core`] (identity, data
//! objects, signals, logging) and provides the widget tree, the geometry
//! negotiation protocol, box and table packing, accelerator tables and event
//! routing, drawing through a pluggable [`platform::Backend`].
//!
//! # Example
//!
//! ```
//! use trellis::platform::HeadlessBackend;
//! use trellis::widget::layout::{AttachOptions, Table};
//! use trellis::widget::widgets::{DrawingArea, Window};
//! use trellis::widget::{Allocation, WidgetTree};
//!
//! let mut tree = WidgetTree::new(HeadlessBackend::new());
//! let window = tree.insert(Window::new("Grid"));
//! let table = tree.insert(Table::new(1, 2, false));
//! let wide = tree.insert(DrawingArea::new(40, 10));
//! let narrow = tree.insert(DrawingArea::new(10, 10));
//!
//! tree.add_to_window(window, table);
//! tree.attach_defaults(table, wide, (0, 1), (0, 1));
//! tree.attach(table, narrow, (1, 2), (0, 1), AttachOptions::empty(), AttachOptions::FILL, 0, 0);
//! tree.show_all(window);
//!
//! assert_eq!(tree.allocation(narrow), Some(Allocation::new(40, 0, 10, 10)));
//! ```

pub mod config;
pub mod error;
pub mod platform;
pub mod prelude;
pub mod widget;

pub use trellis_core::*;

pub use config::{HeadlessMetrics, ToolkitConfig};
pub use error::{ConfigError, HitTestError, Result, TrellisError};
