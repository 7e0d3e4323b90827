//! Core systems for Trellis.
//!
//! This crate provides the state-sharing foundation of the Trellis widget
//! toolkit:
//!
//! - **Identity**: [`WidgetId`] arena keys and the [`TypeRegistry`] that gives
//!   every concrete widget kind a small [`TypeTag`]
//! - **Data objects**: typed shared cells ([`DataObject`]) with reentrancy-safe
//!   observer fan-out and deferred destruction
//! - **Adjustments**: bounded scrollable ranges shared by sliders and views
//! - **Signals**: single-threaded slot lists for "something happened" events
//! - **Logging**: tracing targets, span names and helper macros
//!
//! # Data Object Example
//!
//! ```
//! use std::rc::Rc;
//! use trellis_core::{FnObserver, IntData};
//!
//! let level = IntData::new(0);
//! let printer = Rc::new(FnObserver::new("meter", |name: &&str, data: &IntData| {
//!     println!("{name} now shows {}", data.get());
//!     false
//! }));
//! let id = level.attach(&printer);
//!
//! // Mutate, then notify once.
//! level.set(42);
//! level.notify();
//!
//! level.detach(id);
//! ```
//!
//! # Adjustment Example
//!
//! ```
//! use trellis_core::{Adjustment, AdjustmentData};
//!
//! let scroll = AdjustmentData::new(Adjustment::new(0.0, 0.0, 100.0, 1.0, 10.0, 20.0));
//! scroll.set_value(95.0);
//! assert_eq!(scroll.value(), 80.0);
//! ```

mod adjustment;
mod data;
pub mod logging;
mod object;
mod signal;

pub use adjustment::Adjustment;
pub use data::{
    AdjustmentData, DataKind, DataObject, DataState, DataValue, FloatData, FnObserver, IntData,
    ListData, Observer, ObserverId, WidgetRefData,
};
pub use object::{TypeRegistry, TypeTag, WidgetId};
pub use signal::{ConnectionId, Signal};
