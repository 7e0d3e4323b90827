//! Slider bound to a shared adjustment.
//!
//! A [`Slider`] draws a thumb whose length and offset are derived from an
//! [`AdjustmentData`]. Several widgets may share the same adjustment; the
//! slider observes it and, once realized, asks its tree to lay it out and
//! redraw it whenever the value changes.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use trellis_core::logging::targets;
use trellis_core::{Adjustment, AdjustmentData, FnObserver, ObserverId, WidgetId};

use crate::platform::ShadowType;
use crate::widget::events::{Event, Key, NamedKey};
use crate::widget::flags::WidgetFlags;
use crate::widget::geometry::{Allocation, Orientation, Requisition};
use crate::widget::repaint::RepaintQueue;
use crate::widget::traits::{Widget, WidgetContext};

/// Shortest thumb the slider will draw.
pub const MIN_SLIDER_LENGTH: i32 = 8;

/// Cross-axis thickness of the trough.
const TROUGH_THICKNESS: i32 = 14;

/// Observer payload: a change count and, while realized, where to send
/// redraw requests.
#[derive(Default)]
struct SliderLink {
    seen: Cell<u32>,
    target: RefCell<Option<(RepaintQueue, WidgetId)>>,
}

type AdjustmentWatch = FnObserver<Adjustment, SliderLink>;

/// A horizontal or vertical slider.
pub struct Slider {
    orientation: Orientation,
    adjustment: AdjustmentData,
    observer: Rc<AdjustmentWatch>,
    observer_id: Option<ObserverId>,
    track: i32,
    slider_len: i32,
}

impl Slider {
    pub fn new(orientation: Orientation, adjustment: AdjustmentData) -> Self {
        let observer = Rc::new(FnObserver::new(SliderLink::default(), |link: &SliderLink, data: &AdjustmentData| {
            link.seen.set(link.seen.get() + 1);
            if let Some((queue, id)) = link.target.borrow().as_ref() {
                // The thumb position is recomputed during allocation.
                queue.queue_resize(*id);
                tracing::trace!(target: targets::TREE, ?id, value = data.value(), "slider queued for update");
            }
            false
        }));
        let observer_id = adjustment.attach(&observer);
        Self {
            orientation,
            adjustment,
            observer,
            observer_id: Some(observer_id),
            track: 0,
            slider_len: 0,
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn adjustment(&self) -> &AdjustmentData {
        &self.adjustment
    }

    /// Number of adjustment notifications this slider has received.
    pub fn updates_seen(&self) -> u32 {
        self.observer.payload().seen.get()
    }

    /// Thumb length for the last allocation.
    pub fn slider_length(&self) -> i32 {
        self.slider_len
    }

    /// Thumb offset from the start of the trough, for the current value.
    ///
    /// # Panics
    ///
    /// Panics if the adjustment's value has left its legal range.
    pub fn slider_position(&self) -> i32 {
        self.adjustment.borrow().slider_position(self.track, self.slider_len)
    }

    fn thumb(&self, allocation: Allocation) -> Allocation {
        let (start, _) = self.orientation.main_span(allocation);
        let cross = self.orientation.cross_span(allocation);
        self.orientation
            .allocation((start + self.slider_position(), self.slider_len), cross)
    }

    fn step(&self, forward: bool) -> bool {
        let changed = self.adjustment.update(|adjustment| {
            if forward {
                adjustment.step_up()
            } else {
                adjustment.step_down()
            }
        });
        if changed {
            self.adjustment.notify();
        }
        changed
    }
}

impl Widget for Slider {
    fn initial_flags(&self) -> WidgetFlags {
        WidgetFlags::CAN_FOCUS
    }

    fn realize(&mut self, cx: &mut WidgetContext<'_>) {
        let queue = cx.tree().repaint_queue();
        *self.observer.payload().target.borrow_mut() = Some((queue, cx.id()));
    }

    fn unrealize(&mut self, _cx: &mut WidgetContext<'_>) {
        self.observer.payload().target.borrow_mut().take();
    }

    fn size_request(&mut self, _cx: &mut WidgetContext<'_>) -> Requisition {
        self.orientation.requisition(MIN_SLIDER_LENGTH * 4, TROUGH_THICKNESS)
    }

    fn size_allocate(&mut self, _cx: &mut WidgetContext<'_>, allocation: Allocation) {
        let (_, track) = self.orientation.main_span(allocation);
        self.track = track;
        self.slider_len = self.adjustment.borrow().slider_length(track, MIN_SLIDER_LENGTH);
        // Validates the adjustment against the new geometry.
        let position = self.slider_position();
        tracing::trace!(target: targets::LAYOUT, track, slider = self.slider_len, position, "slider allocated");
    }

    fn handle_event(&mut self, cx: &mut WidgetContext<'_>, event: &Event) -> bool {
        match *event {
            Event::ButtonPress { x, y, button: 1 } => {
                let allocation = cx.allocation();
                let (start, _) = self.orientation.main_span(allocation);
                let pointer = match self.orientation {
                    Orientation::Horizontal => x,
                    Orientation::Vertical => y,
                };
                let position = pointer - start - self.slider_len / 2;
                let value = self
                    .adjustment
                    .borrow()
                    .value_for_position(position, self.track, self.slider_len);
                self.adjustment.set_value(value);
                let id = cx.id();
                cx.tree_mut().grab_focus(id);
                true
            }
            Event::KeyPress {
                key: Key::Named(key), ..
            } => match (self.orientation, key) {
                (Orientation::Horizontal, NamedKey::Right) | (Orientation::Vertical, NamedKey::Down) => {
                    self.step(true);
                    true
                }
                (Orientation::Horizontal, NamedKey::Left) | (Orientation::Vertical, NamedKey::Up) => {
                    self.step(false);
                    true
                }
                _ => false,
            },
            _ => false,
        }
    }

    fn draw(&mut self, cx: &mut WidgetContext<'_>, _area: Allocation) {
        let Some(surface) = cx.surface() else {
            return;
        };
        let allocation = cx.allocation();
        let thumb = self.thumb(allocation);
        let style = cx.style();
        let backend = cx.backend();
        backend.draw_rect(surface, allocation, style.background, true);
        backend.draw_shadow(surface, allocation, ShadowType::In, style.shadow_thickness);
        backend.draw_rect(surface, thumb, style.background, true);
        backend.draw_shadow(surface, thumb, ShadowType::Out, style.shadow_thickness);
    }

    fn destroy(&mut self, _cx: &mut WidgetContext<'_>) {
        self.observer.payload().target.borrow_mut().take();
        if let Some(id) = self.observer_id.take() {
            self.adjustment.detach(id);
        }
    }
}
