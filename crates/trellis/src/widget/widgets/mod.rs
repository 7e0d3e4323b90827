//! Standard widgets for Trellis.
//!
//! - [`Window`]: top-level container that owns a surface and accelerator tables
//! - [`Label`]: static text
//! - [`Button`]: clickable push button
//! - [`DrawingArea`]: fixed-size leaf that paints its background
//! - [`Slider`]: thumb over a shared adjustment

mod button;
mod drawing_area;
mod label;
mod slider;
mod window;

pub use button::Button;
pub use drawing_area::DrawingArea;
pub use label::Label;
pub use slider::{Slider, MIN_SLIDER_LENGTH};
pub use window::Window;
