//! Bounded scrollable ranges.
//!
//! An [`Adjustment`] describes a value that moves within `[lower, upper]`
//! while a window of `page_size` stays visible, so the value itself may never
//! exceed `upper - page_size`. Sliders, scrollbars and viewports share one
//! through an [`AdjustmentData`](crate::AdjustmentData) cell.
//!
//! Any pixel position derived from an adjustment asserts that invariant:
//! a value out of bounds at that point means upstream state is corrupt.

use crate::data::DataObject;

/// A bounded range with step and page increments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adjustment {
    value: f64,
    lower: f64,
    upper: f64,
    step_increment: f64,
    page_increment: f64,
    page_size: f64,
}

impl Adjustment {
    /// Create an adjustment. The value is stored as given; use
    /// [`set_value`](Self::set_value) for a clamped write.
    pub fn new(
        value: f64,
        lower: f64,
        upper: f64,
        step_increment: f64,
        page_increment: f64,
        page_size: f64,
    ) -> Self {
        Self {
            value,
            lower,
            upper,
            step_increment,
            page_increment,
            page_size,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn step_increment(&self) -> f64 {
        self.step_increment
    }

    pub fn page_increment(&self) -> f64 {
        self.page_increment
    }

    pub fn page_size(&self) -> f64 {
        self.page_size
    }

    /// Largest legal value, `upper - page_size`, never below `lower`.
    pub fn max_value(&self) -> f64 {
        (self.upper - self.page_size).max(self.lower)
    }

    /// Whether `lower <= value <= upper - page_size` holds.
    pub fn is_valid(&self) -> bool {
        self.lower <= self.value && self.value <= self.upper - self.page_size
    }

    /// Panic unless the value lies within its bounds.
    #[track_caller]
    pub fn assert_valid(&self) {
        assert!(
            self.is_valid(),
            "adjustment value {} outside [{}, {}]",
            self.value,
            self.lower,
            self.upper - self.page_size
        );
    }

    /// Store `value` clamped to the legal range. Returns whether it changed.
    pub fn set_value(&mut self, value: f64) -> bool {
        let clamped = value.clamp(self.lower, self.max_value());
        let changed = clamped != self.value;
        self.value = clamped;
        changed
    }

    /// Change the bounds and page size, then re-clamp the value.
    pub fn configure(&mut self, lower: f64, upper: f64, page_size: f64) -> bool {
        self.lower = lower;
        self.upper = upper;
        self.page_size = page_size;
        self.set_value(self.value)
    }

    /// Scroll the minimum distance needed to make `[lower, upper]` visible.
    pub fn clamp_page(&mut self, lower: f64, upper: f64) -> bool {
        let mut value = self.value;
        if upper > value + self.page_size {
            value = upper - self.page_size;
        }
        if lower < value {
            value = lower;
        }
        self.set_value(value)
    }

    pub fn step_up(&mut self) -> bool {
        self.set_value(self.value + self.step_increment)
    }

    pub fn step_down(&mut self) -> bool {
        self.set_value(self.value - self.step_increment)
    }

    pub fn page_up(&mut self) -> bool {
        self.set_value(self.value + self.page_increment)
    }

    pub fn page_down(&mut self) -> bool {
        self.set_value(self.value - self.page_increment)
    }

    /// Length of a slider thumb inside a track, proportional to the page.
    pub fn slider_length(&self, track: i32, min_length: i32) -> i32 {
        let range = self.upper - self.lower;
        if range <= 0.0 || track <= 0 {
            return track.max(1);
        }
        let length = (self.page_size / range * f64::from(track)).round() as i32;
        length.clamp(min_length.min(track), track).max(1)
    }

    /// Offset of the slider thumb inside a track.
    ///
    /// # Panics
    ///
    /// Panics if the value is outside `[lower, upper - page_size]`.
    #[track_caller]
    pub fn slider_position(&self, track: i32, slider: i32) -> i32 {
        self.assert_valid();
        let range = self.upper - self.page_size - self.lower;
        let travel = (track - slider).max(0);
        if range <= 0.0 {
            return 0;
        }
        ((self.value - self.lower) / range * f64::from(travel)).round() as i32
    }

    /// Inverse of [`slider_position`](Self::slider_position), clamped.
    pub fn value_for_position(&self, position: i32, track: i32, slider: i32) -> f64 {
        let travel = (track - slider).max(0);
        if travel == 0 {
            return self.lower;
        }
        let fraction = (f64::from(position) / f64::from(travel)).clamp(0.0, 1.0);
        self.lower + fraction * (self.max_value() - self.lower)
    }
}

impl DataObject<Adjustment> {
    /// Clamp-and-store `value`, notifying observers when it changed.
    ///
    /// This is the mutate-then-notify sequence, so it must not be called from
    /// inside one of this object's own observer callbacks.
    pub fn set_value(&self, value: f64) -> bool {
        let changed = self.update(|adjustment| adjustment.set_value(value));
        if changed {
            self.notify();
        }
        changed
    }

    /// Current value.
    pub fn value(&self) -> f64 {
        self.borrow().value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scroll_range(value: f64) -> Adjustment {
        Adjustment::new(value, 0.0, 100.0, 1.0, 10.0, 20.0)
    }

    #[test]
    fn test_value_at_page_bound_is_valid() {
        let adjustment = scroll_range(80.0);
        assert!(adjustment.is_valid());
        assert_eq!(adjustment.max_value(), 80.0);
        assert!(scroll_range(0.0).is_valid());
    }

    #[test]
    fn test_value_past_page_bound_is_invalid() {
        // The last page starts at upper - page_size = 80.
        assert!(!scroll_range(85.0).is_valid());
        assert!(!scroll_range(90.0).is_valid());
        assert!(!scroll_range(-1.0).is_valid());
    }

    #[test]
    #[should_panic(expected = "outside [0, 80]")]
    fn test_assert_valid_names_the_legal_range() {
        scroll_range(85.0).assert_valid();
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn test_slider_position_asserts_bounds() {
        scroll_range(90.0).slider_position(200, 40);
    }

    #[test]
    fn test_set_value_clamps() {
        let mut adjustment = scroll_range(0.0);
        assert!(adjustment.set_value(95.0));
        assert_eq!(adjustment.value(), 80.0);
        assert!(!adjustment.set_value(120.0));
        assert!(adjustment.set_value(-5.0));
        assert_eq!(adjustment.value(), 0.0);
    }

    #[test]
    fn test_steps_and_pages() {
        let mut adjustment = scroll_range(0.0);
        adjustment.step_up();
        adjustment.page_up();
        assert_eq!(adjustment.value(), 11.0);
        adjustment.page_down();
        adjustment.page_down();
        assert_eq!(adjustment.value(), 0.0);
        assert!(!adjustment.step_down());
    }

    #[test]
    fn test_clamp_page_scrolls_minimally() {
        let mut adjustment = scroll_range(0.0);
        assert!(adjustment.clamp_page(30.0, 45.0));
        assert_eq!(adjustment.value(), 25.0);
        assert!(!adjustment.clamp_page(30.0, 40.0));
        assert!(adjustment.clamp_page(10.0, 15.0));
        assert_eq!(adjustment.value(), 10.0);
    }

    #[test]
    fn test_slider_geometry() {
        let adjustment = scroll_range(40.0);
        assert_eq!(adjustment.slider_length(200, 8), 40);
        assert_eq!(adjustment.slider_position(200, 40), 80);
        assert_eq!(adjustment.value_for_position(80, 200, 40), 40.0);
        assert_eq!(adjustment.value_for_position(500, 200, 40), 80.0);
    }

    #[test]
    fn test_configure_reclamps() {
        let mut adjustment = scroll_range(80.0);
        assert!(adjustment.configure(0.0, 50.0, 10.0));
        assert_eq!(adjustment.value(), 40.0);
    }

    #[test]
    fn test_data_set_value_notifies_on_change() {
        use crate::data::FnObserver;
        use std::cell::Cell;
        use std::rc::Rc;

        let data = DataObject::new(scroll_range(0.0));
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let observer = Rc::new(FnObserver::new((), move |_, _: &DataObject<Adjustment>| {
            counter.set(counter.get() + 1);
            false
        }));
        data.attach(&observer);

        assert!(data.set_value(30.0));
        assert!(!data.set_value(30.0));
        assert_eq!(hits.get(), 1);
        assert_eq!(data.value(), 30.0);
    }
}
