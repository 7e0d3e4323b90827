//! A display-less backend with fixed-width text metrics.

use std::cell::RefCell;
use std::rc::Rc;

use super::{Backend, ShadowType, SurfaceId};
use crate::config::HeadlessMetrics;
use crate::widget::{Allocation, Color};

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    CreateSurface { surface: SurfaceId, parent: Option<SurfaceId>, rect: Allocation },
    DestroySurface { surface: SurfaceId },
    MoveResize { surface: SurfaceId, rect: Allocation },
    Rect { surface: SurfaceId, rect: Allocation, filled: bool },
    Line { surface: SurfaceId, from: (i32, i32), to: (i32, i32) },
    Shadow { surface: SurfaceId, rect: Allocation, shadow: ShadowType },
    Text { surface: SurfaceId, x: i32, y: i32, text: String },
}

/// Shared view of the calls a [`HeadlessBackend`] has received.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Rc<RefCell<Vec<BackendCall>>>);

impl CallLog {
    /// Snapshot of all recorded calls.
    pub fn calls(&self) -> Vec<BackendCall> {
        self.0.borrow().clone()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    /// Count calls matching a predicate.
    pub fn count(&self, predicate: impl Fn(&BackendCall) -> bool) -> usize {
        self.0.borrow().iter().filter(|call| predicate(call)).count()
    }

    fn push(&self, call: BackendCall) {
        self.0.borrow_mut().push(call);
    }
}

/// Backend that records calls instead of drawing.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    metrics: HeadlessMetrics,
    next_surface: u64,
    log: CallLog,
}

impl HeadlessBackend {
    /// Backend with default metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend with the given text metrics.
    pub fn with_metrics(metrics: HeadlessMetrics) -> Self {
        Self {
            metrics,
            ..Self::default()
        }
    }

    /// Handle to the call log, valid after the backend moves into a tree.
    pub fn log(&self) -> CallLog {
        self.log.clone()
    }
}

impl Backend for HeadlessBackend {
    fn create_surface(&mut self, parent: Option<SurfaceId>, rect: Allocation) -> SurfaceId {
        self.next_surface += 1;
        let surface = SurfaceId(self.next_surface);
        self.log.push(BackendCall::CreateSurface { surface, parent, rect });
        surface
    }

    fn destroy_surface(&mut self, surface: SurfaceId) {
        self.log.push(BackendCall::DestroySurface { surface });
    }

    fn move_resize_surface(&mut self, surface: SurfaceId, rect: Allocation) {
        self.log.push(BackendCall::MoveResize { surface, rect });
    }

    fn measure_text(&self, _font: &str, text: &str) -> (i32, i32) {
        let columns = text.lines().map(|line| line.chars().count()).max().unwrap_or(0) as i32;
        let rows = text.lines().count().max(1) as i32;
        (columns * self.metrics.char_width, rows * self.metrics.line_height)
    }

    fn draw_rect(&mut self, surface: SurfaceId, rect: Allocation, _color: Color, filled: bool) {
        self.log.push(BackendCall::Rect { surface, rect, filled });
    }

    fn draw_line(&mut self, surface: SurfaceId, from: (i32, i32), to: (i32, i32), _color: Color) {
        self.log.push(BackendCall::Line { surface, from, to });
    }

    fn draw_shadow(&mut self, surface: SurfaceId, rect: Allocation, shadow: ShadowType, _thickness: i32) {
        self.log.push(BackendCall::Shadow { surface, rect, shadow });
    }

    fn draw_text(&mut self, surface: SurfaceId, x: i32, y: i32, text: &str, _color: Color) {
        self.log.push(BackendCall::Text {
            surface,
            x,
            y,
            text: text.to_owned(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_multiline_text() {
        let backend = HeadlessBackend::with_metrics(HeadlessMetrics {
            char_width: 6,
            line_height: 10,
        });
        assert_eq!(backend.measure_text("fixed", "ab\nlonger"), (36, 20));
        assert_eq!(backend.measure_text("fixed", ""), (0, 10));
    }

    #[test]
    fn test_log_survives_move() {
        let mut backend = HeadlessBackend::new();
        let log = backend.log();
        let boxed: &mut dyn Backend = &mut backend;
        let surface = boxed.create_surface(None, Allocation::new(0, 0, 10, 10));
        boxed.destroy_surface(surface);
        assert_eq!(log.calls().len(), 2);
        assert_eq!(log.count(|call| matches!(call, BackendCall::DestroySurface { .. })), 1);
    }
}
