//! Prelude module for Trellis.
//!
//! This module re-exports the most commonly used types for convenient importing:
//!
//! ```
//! use trellis::prelude::*;
//! ```
//!
//! This provides access to:
//! - The widget tree and the `Widget` trait
//! - Geometry types (`Requisition`, `Allocation`, `Orientation`)
//! - Common widgets and the two layout containers
//! - Shared data (`DataObject`, `AdjustmentData`) and signals

// ============================================================================
// Core Systems
// ============================================================================

pub use trellis_core::{
    Adjustment, AdjustmentData, DataObject, FnObserver, IntData, Observer, ObserverId, Signal, WidgetId,
};

// ============================================================================
// Widget Foundation
// ============================================================================

pub use crate::widget::{
    Allocation, Event, EventRouter, Key, ModifierType, NamedKey, Orientation, RepaintQueue, Requisition, Widget,
    WidgetContext, WidgetFlags, WidgetState, WidgetTree,
};

// ============================================================================
// Layout and Widgets
// ============================================================================

pub use crate::widget::layout::{AttachOptions, BoxContainer, BoxPacking, Table};
pub use crate::widget::widgets::{Button, DrawingArea, Label, Slider, Window};
pub use crate::widget::AcceleratorTable;

// ============================================================================
// Platform and Configuration
// ============================================================================

pub use crate::platform::{Backend, HeadlessBackend};
pub use crate::ToolkitConfig;
