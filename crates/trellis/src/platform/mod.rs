//! Platform services consumed by the widget core.
//!
//! The core never talks to a windowing system directly. Surface management,
//! text measurement and drawing primitives go through the [`Backend`] trait,
//! which a real platform binding implements. [`HeadlessBackend`] implements
//! it without a display, for tests and off-screen layout.
//!
//! # Example
//!
//! ```
//! use trellis::platform::{Backend, HeadlessBackend};
//!
//! let backend = HeadlessBackend::new();
//! let (width, height) = backend.measure_text("fixed", "hello");
//! assert_eq!((width, height), (35, 13));
//! ```

mod headless;

pub use headless::{BackendCall, CallLog, HeadlessBackend};

use crate::widget::{Allocation, Color};

/// Handle to a platform drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u64);

/// Bevel style for shadowed frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShadowType {
    /// Raised bevel.
    Out,
    /// Sunken bevel.
    In,
    EtchedIn,
    EtchedOut,
}

/// Drawing and surface services supplied by the platform binding.
pub trait Backend {
    /// Create a surface, optionally nested in `parent`, covering `rect`.
    fn create_surface(&mut self, parent: Option<SurfaceId>, rect: Allocation) -> SurfaceId;

    fn destroy_surface(&mut self, surface: SurfaceId);

    /// Reposition and resize a surface after its widget was allocated.
    fn move_resize_surface(&mut self, surface: SurfaceId, rect: Allocation);

    /// Width and height of `text` rendered in `font`.
    fn measure_text(&self, font: &str, text: &str) -> (i32, i32);

    fn draw_rect(&mut self, surface: SurfaceId, rect: Allocation, color: Color, filled: bool);

    fn draw_line(&mut self, surface: SurfaceId, from: (i32, i32), to: (i32, i32), color: Color);

    fn draw_shadow(&mut self, surface: SurfaceId, rect: Allocation, shadow: ShadowType, thickness: i32);

    fn draw_text(&mut self, surface: SurfaceId, x: i32, y: i32, text: &str, color: Color);
}
