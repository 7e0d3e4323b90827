//! Linear packing container.
//!
//! A [`BoxContainer`] lays its children out in a row or a column. Children
//! are packed either at the start (leading edge, moving forward) or at the
//! end (trailing edge, moving backward), and each carries its own
//! [`BoxPacking`] parameters.
//!
//! # Distribution
//!
//! Both packing directions draw on one slack pool computed before either
//! pass runs. Integer division leaves a remainder, which goes entirely to
//! the last child processed: the last end-packed child if there is one,
//! otherwise the last start-packed child. This matches the pixel placement
//! existing layouts were designed against.
//!
//! # Example
//!
//! ```
//! use trellis::platform::HeadlessBackend;
//! use trellis::widget::layout::{BoxContainer, BoxPacking};
//! use trellis::widget::widgets::DrawingArea;
//! use trellis::widget::{Allocation, Orientation, WidgetTree};
//!
//! let mut tree = WidgetTree::new(HeadlessBackend::new());
//! let row = tree.insert(BoxContainer::new(Orientation::Horizontal, false, 5));
//! let left = tree.insert(DrawingArea::new(10, 10));
//! let right = tree.insert(DrawingArea::new(30, 10));
//! tree.pack_start(row, left, BoxPacking::new(false, false, 0));
//! tree.pack_start(row, right, BoxPacking::new(true, true, 0));
//! tree.show_all(row);
//!
//! tree.size_request(row);
//! tree.size_allocate(row, Allocation::new(0, 0, 100, 10));
//! assert_eq!(tree.allocation(right), Some(Allocation::new(15, 0, 85, 10)));
//! ```

use trellis_core::logging::targets;
use trellis_core::WidgetId;

use crate::widget::geometry::{Allocation, Orientation, Requisition};
use crate::widget::traits::{Widget, WidgetContext};
use crate::widget::tree::WidgetTree;

/// Which edge a child is packed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PackType {
    /// Leading edge (left or top), laid out forward.
    #[default]
    Start,
    /// Trailing edge (right or bottom), laid out backward.
    End,
}

/// Per-child packing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoxPacking {
    /// Receive a share of space beyond the box's requisition.
    pub expand: bool,
    /// Stretch over the whole slot instead of staying centered at natural
    /// size.
    pub fill: bool,
    /// Pixels kept clear on each side along the main axis.
    pub padding: i32,
}

impl BoxPacking {
    pub const fn new(expand: bool, fill: bool, padding: i32) -> Self {
        Self {
            expand,
            fill,
            padding,
        }
    }
}

impl Default for BoxPacking {
    fn default() -> Self {
        Self::new(true, true, 0)
    }
}

/// Layout record for one child of a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxChild {
    pub widget: WidgetId,
    pub packing: BoxPacking,
    pub pack: PackType,
}

/// Box-wide layout parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoxParams {
    pub orientation: Orientation,
    /// Give every visible child the same main-axis slot.
    pub homogeneous: bool,
    /// Pixels between consecutive visible children.
    pub spacing: i32,
    pub border_width: i32,
}

/// One visible child as seen by the distribution algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxItem {
    pub requisition: Requisition,
    pub packing: BoxPacking,
    pub pack: PackType,
}

impl BoxItem {
    pub const fn new(requisition: Requisition, packing: BoxPacking, pack: PackType) -> Self {
        Self {
            requisition,
            packing,
            pack,
        }
    }
}

/// Natural size of a box holding `items`, all of them visible.
pub fn box_request(params: &BoxParams, items: &[BoxItem]) -> Requisition {
    let orientation = params.orientation;
    let mut main = 0;
    let mut cross = 0;

    for item in items {
        let slot = orientation.main(item.requisition) + item.packing.padding * 2;
        if params.homogeneous {
            main = main.max(slot);
        } else {
            main += slot;
        }
        cross = cross.max(orientation.cross_of(item.requisition));
    }

    let nvis = items.len() as i32;
    if nvis > 0 {
        if params.homogeneous {
            main *= nvis;
        }
        main += (nvis - 1) * params.spacing;
    }

    orientation.requisition(main + params.border_width * 2, cross + params.border_width * 2)
}

/// Allocate `allocation` among `items`, returning one rectangle per item in
/// the same order.
///
/// Start-packed items are placed from the leading edge in list order, then
/// end-packed items from the trailing edge in list order.
pub fn box_distribute(params: &BoxParams, items: &[BoxItem], allocation: Allocation) -> Vec<Allocation> {
    let orientation = params.orientation;
    let border = params.border_width;
    let (main_pos, main_len) = orientation.main_span(allocation);
    let (cross_pos, cross_len) = orientation.cross_span(allocation);
    let cross_avail = cross_len - border * 2;

    let mut nvis = items.len() as i32;
    let mut nexpand = items.iter().filter(|item| item.packing.expand).count() as i32;
    if nvis == 0 {
        return Vec::new();
    }

    // The slack pool shared by both passes.
    let (mut width, extra) = if params.homogeneous {
        let width = main_len - border * 2 - (nvis - 1) * params.spacing;
        (width, width / nvis)
    } else if nexpand > 0 {
        let width = main_len - orientation.main(box_request(params, items));
        (width, width / nexpand)
    } else {
        (0, 0)
    };

    let mut slot_width = |item: &BoxItem| {
        if params.homogeneous {
            let slot = if nvis == 1 { width } else { extra };
            nvis -= 1;
            width -= extra;
            slot
        } else {
            let mut slot = orientation.main(item.requisition) + item.packing.padding * 2;
            if item.packing.expand {
                slot += if nexpand == 1 { width } else { extra };
                nexpand -= 1;
                width -= extra;
            }
            slot
        }
    };

    let cross_span = |item: &BoxItem| {
        let padding = item.packing.padding;
        if item.packing.fill {
            (cross_pos + border + padding, cross_avail - padding * 2)
        } else {
            let natural = orientation.cross_of(item.requisition);
            (cross_pos + border + (cross_avail - natural) / 2, natural)
        }
    };

    let mut result = vec![Allocation::default(); items.len()];

    let mut x = main_pos + border;
    for (index, item) in items.iter().enumerate().filter(|(_, item)| item.pack == PackType::Start) {
        let slot = slot_width(item);
        let main = if item.packing.fill {
            (x + item.packing.padding, slot - item.packing.padding * 2)
        } else {
            let natural = orientation.main(item.requisition);
            (x + (slot - natural) / 2, natural)
        };
        result[index] = orientation.allocation(main, cross_span(item)).clamped();
        x += slot + params.spacing;
    }

    let mut x = main_pos + main_len - border;
    for (index, item) in items.iter().enumerate().filter(|(_, item)| item.pack == PackType::End) {
        let slot = slot_width(item);
        let main = if item.packing.fill {
            (x + item.packing.padding - slot, slot - item.packing.padding * 2)
        } else {
            let natural = orientation.main(item.requisition);
            (x + (slot - natural) / 2 - slot, natural)
        };
        result[index] = orientation.allocation(main, cross_span(item)).clamped();
        x -= slot + params.spacing;
    }

    result
}

/// Container packing children along one axis.
#[derive(Debug, Clone, Default)]
pub struct BoxContainer {
    params: BoxParams,
    children: Vec<BoxChild>,
}

impl BoxContainer {
    pub fn new(orientation: Orientation, homogeneous: bool, spacing: i32) -> Self {
        Self {
            params: BoxParams {
                orientation,
                homogeneous,
                spacing,
                border_width: 0,
            },
            children: Vec::new(),
        }
    }

    /// A horizontal, non-homogeneous box.
    pub fn horizontal(spacing: i32) -> Self {
        Self::new(Orientation::Horizontal, false, spacing)
    }

    /// A vertical, non-homogeneous box.
    pub fn vertical(spacing: i32) -> Self {
        Self::new(Orientation::Vertical, false, spacing)
    }

    pub fn params(&self) -> &BoxParams {
        &self.params
    }

    pub fn orientation(&self) -> Orientation {
        self.params.orientation
    }

    pub fn is_homogeneous(&self) -> bool {
        self.params.homogeneous
    }

    pub fn set_homogeneous(&mut self, homogeneous: bool) {
        self.params.homogeneous = homogeneous;
    }

    pub fn spacing(&self) -> i32 {
        self.params.spacing
    }

    pub fn set_spacing(&mut self, spacing: i32) {
        self.params.spacing = spacing;
    }

    pub fn border_width(&self) -> i32 {
        self.params.border_width
    }

    pub fn set_border_width(&mut self, border_width: i32) {
        self.params.border_width = border_width;
    }

    /// Layout records in packing order.
    pub fn children(&self) -> &[BoxChild] {
        &self.children
    }

    pub fn child(&self, widget: WidgetId) -> Option<&BoxChild> {
        self.children.iter().find(|child| child.widget == widget)
    }

    fn child_mut(&mut self, widget: WidgetId) -> Option<&mut BoxChild> {
        self.children.iter_mut().find(|child| child.widget == widget)
    }

    /// Visible children with their current requisitions.
    fn visible_items(&self, cx: &WidgetContext<'_>) -> (Vec<WidgetId>, Vec<BoxItem>) {
        self.children
            .iter()
            .filter(|child| cx.is_visible(child.widget))
            .map(|child| {
                let item = BoxItem::new(cx.requisition(child.widget), child.packing, child.pack);
                (child.widget, item)
            })
            .unzip()
    }
}

impl Widget for BoxContainer {
    fn size_request(&mut self, cx: &mut WidgetContext<'_>) -> Requisition {
        for child in &self.children {
            if cx.is_visible(child.widget) {
                cx.size_request(child.widget);
            }
        }
        let (_, items) = self.visible_items(cx);
        box_request(&self.params, &items)
    }

    fn size_allocate(&mut self, cx: &mut WidgetContext<'_>, allocation: Allocation) {
        let (widgets, items) = self.visible_items(cx);
        let allocations = box_distribute(&self.params, &items, allocation);
        tracing::trace!(target: targets::LAYOUT, container = ?cx.id(), children = widgets.len(), %allocation, "box allocate");
        for (widget, child_allocation) in widgets.into_iter().zip(allocations) {
            cx.size_allocate(widget, child_allocation);
        }
    }

    fn remove_child(&mut self, child: WidgetId) -> bool {
        let before = self.children.len();
        self.children.retain(|record| record.widget != child);
        self.children.len() != before
    }
}

impl WidgetTree {
    /// Pack `child` at the leading edge of a box, after earlier start
    /// children.
    pub fn pack_start(&mut self, container: WidgetId, child: WidgetId, packing: BoxPacking) {
        self.pack(container, child, packing, PackType::Start);
    }

    /// Pack `child` at the trailing edge of a box, before earlier end
    /// children.
    pub fn pack_end(&mut self, container: WidgetId, child: WidgetId, packing: BoxPacking) {
        self.pack(container, child, packing, PackType::End);
    }

    fn pack(&mut self, container: WidgetId, child: WidgetId, packing: BoxPacking, pack: PackType) {
        self.adopt::<BoxContainer, _>(container, child, |bx| {
            bx.children.push(BoxChild {
                widget: child,
                packing,
                pack,
            });
        });
    }

    /// Change how an existing child is packed.
    ///
    /// # Panics
    ///
    /// Panics if `child` is not packed in `container`.
    pub fn set_child_packing(&mut self, container: WidgetId, child: WidgetId, packing: BoxPacking, pack: PackType) {
        let found = self.update_widget::<BoxContainer, _>(container, |bx| {
            bx.child_mut(child).map(|record| {
                record.packing = packing;
                record.pack = pack;
            })
        });
        assert!(
            matches!(found, Some(Some(()))),
            "{child:?} is not packed in box {container:?}"
        );
    }

    /// Move `child` to `position` in the box's packing order.
    ///
    /// # Panics
    ///
    /// Panics if `child` is not packed in `container`.
    pub fn reorder_child(&mut self, container: WidgetId, child: WidgetId, position: usize) {
        let moved = self.update_widget::<BoxContainer, _>(container, |bx| {
            let index = bx.children.iter().position(|record| record.widget == child)?;
            let record = bx.children.remove(index);
            let position = position.min(bx.children.len());
            bx.children.insert(position, record);
            Some(position)
        });
        let Some(Some(position)) = moved else {
            panic!("{child:?} is not packed in box {container:?}");
        };
        self.move_child(container, child, position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::HeadlessBackend;
    use crate::widget::widgets::DrawingArea;

    fn item(main: i32, expand: bool, fill: bool, padding: i32) -> BoxItem {
        BoxItem::new(
            Requisition::new(main, 10),
            BoxPacking::new(expand, fill, padding),
            PackType::Start,
        )
    }

    fn hbox(homogeneous: bool, spacing: i32, border_width: i32) -> BoxParams {
        BoxParams {
            orientation: Orientation::Horizontal,
            homogeneous,
            spacing,
            border_width,
        }
    }

    fn main_total(params: &BoxParams, allocations: &[Allocation]) -> i32 {
        let widths: i32 = allocations.iter().map(|a| a.width).sum();
        widths + (allocations.len() as i32 - 1) * params.spacing + params.border_width * 2
    }

    #[test]
    fn test_single_expanding_child_takes_slack() {
        let params = hbox(false, 5, 0);
        let items = [item(10, false, false, 0), item(20, true, true, 0), item(30, false, false, 0)];

        assert_eq!(box_request(&params, &items), Requisition::new(70, 10));

        let out = box_distribute(&params, &items, Allocation::new(0, 0, 100, 10));
        assert_eq!(out[0], Allocation::new(0, 0, 10, 10));
        assert_eq!(out[1], Allocation::new(15, 0, 50, 10));
        assert_eq!(out[2], Allocation::new(70, 0, 30, 10));
    }

    #[test]
    fn test_request_homogeneous_uses_widest_slot() {
        let params = hbox(true, 2, 3);
        let items = [item(10, false, false, 1), item(4, false, false, 0)];
        // (10 + 2) * 2 + 2 spacing + 6 border
        assert_eq!(box_request(&params, &items), Requisition::new(32, 16));
    }

    #[test]
    fn test_request_empty_box_is_border_only() {
        assert_eq!(box_request(&hbox(false, 5, 4), &[]), Requisition::new(8, 8));
        assert!(box_distribute(&hbox(false, 5, 4), &[], Allocation::new(0, 0, 50, 50)).is_empty());
    }

    #[test]
    fn test_homogeneous_remainder_goes_to_last_child() {
        let params = hbox(true, 0, 0);
        let items = [item(5, false, true, 0), item(5, false, true, 0), item(5, false, true, 0)];
        let out = box_distribute(&params, &items, Allocation::new(0, 0, 100, 10));

        let widths: Vec<i32> = out.iter().map(|a| a.width).collect();
        assert_eq!(widths, vec![33, 33, 34]);
        assert_eq!(out[2].x, 66);
        assert_eq!(main_total(&params, &out), 100);
    }

    #[test]
    fn test_homogeneous_slots_are_uniform_apart_from_last() {
        let params = hbox(true, 3, 2);
        let items: Vec<BoxItem> = (0..5).map(|i| item(4 + i, i % 2 == 0, true, 0)).collect();
        let out = box_distribute(&params, &items, Allocation::new(0, 0, 118, 10));

        // 118 - 4 border - 12 spacing = 102 = 20 * 5 + 2
        let widths: Vec<i32> = out.iter().map(|a| a.width).collect();
        assert_eq!(widths, vec![20, 20, 20, 20, 22]);
        assert_eq!(main_total(&params, &out), 118);
    }

    #[test]
    fn test_expand_remainder_goes_to_last_expanding_child() {
        let params = hbox(false, 0, 0);
        let items = [item(10, true, true, 0), item(10, false, true, 0), item(10, true, true, 0)];
        let out = box_distribute(&params, &items, Allocation::new(0, 0, 41, 10));

        let widths: Vec<i32> = out.iter().map(|a| a.width).collect();
        assert_eq!(widths, vec![15, 10, 16]);
        assert_eq!(main_total(&params, &out), 41);
    }

    #[test]
    fn test_conservation_with_padding_and_border() {
        let params = hbox(false, 4, 6);
        let items = [item(10, true, true, 2), item(7, true, true, 0), item(3, false, true, 1)];
        let allocation = Allocation::new(0, 0, 200, 20);
        let out = box_distribute(&params, &items, allocation);

        // Filled children are shrunk by their padding; add it back.
        let slots: i32 = out
            .iter()
            .zip(&items)
            .map(|(a, i)| a.width + i.packing.padding * 2)
            .sum();
        assert_eq!(slots + 2 * params.spacing + 2 * params.border_width, 200);
    }

    #[test]
    fn test_non_fill_child_is_centered_in_slot() {
        let params = hbox(true, 0, 0);
        let items = [item(10, false, false, 0), item(10, false, false, 0)];
        let out = box_distribute(&params, &items, Allocation::new(0, 0, 60, 10));
        assert_eq!(out[0], Allocation::new(10, 0, 10, 10));
        assert_eq!(out[1], Allocation::new(40, 0, 10, 10));
    }

    #[test]
    fn test_cross_axis_fill_and_centering() {
        let params = hbox(false, 0, 2);
        let filled = BoxItem::new(Requisition::new(10, 6), BoxPacking::new(false, true, 3), PackType::Start);
        let centered = BoxItem::new(Requisition::new(10, 6), BoxPacking::new(false, false, 0), PackType::Start);
        let out = box_distribute(&params, &[filled, centered], Allocation::new(0, 0, 40, 24));

        assert_eq!((out[0].y, out[0].height), (5, 14));
        assert_eq!((out[1].y, out[1].height), (9, 6));
    }

    #[test]
    fn test_end_packed_children_fill_from_trailing_edge() {
        let params = hbox(false, 2, 1);
        let mut items = [item(10, false, true, 0), item(20, false, true, 0), item(5, false, true, 0)];
        items[1].pack = PackType::End;
        items[2].pack = PackType::End;
        let out = box_distribute(&params, &items, Allocation::new(0, 0, 100, 12));

        assert_eq!(out[0], Allocation::new(1, 1, 10, 10));
        assert_eq!(out[1], Allocation::new(79, 1, 20, 10));
        assert_eq!(out[2], Allocation::new(72, 1, 5, 10));
    }

    #[test]
    fn test_start_and_end_share_one_slack_pool() {
        let params = hbox(false, 0, 0);
        let mut items = [item(10, true, true, 0), item(10, true, true, 0)];
        items[1].pack = PackType::End;
        let out = box_distribute(&params, &items, Allocation::new(0, 0, 51, 10));

        // 31 slack: 15 to the start child, the remaining 16 to the end child.
        assert_eq!(out[0], Allocation::new(0, 0, 25, 10));
        assert_eq!(out[1], Allocation::new(25, 0, 26, 10));
    }

    #[test]
    fn test_vertical_box_uses_height() {
        let params = BoxParams {
            orientation: Orientation::Vertical,
            ..hbox(false, 1, 0)
        };
        let items = [
            BoxItem::new(Requisition::new(8, 4), BoxPacking::new(false, true, 0), PackType::Start),
            BoxItem::new(Requisition::new(12, 6), BoxPacking::new(true, true, 0), PackType::Start),
        ];
        assert_eq!(box_request(&params, &items), Requisition::new(12, 11));

        let out = box_distribute(&params, &items, Allocation::new(0, 0, 12, 30));
        assert_eq!(out[0], Allocation::new(0, 0, 12, 4));
        assert_eq!(out[1], Allocation::new(0, 5, 12, 25));
    }

    #[test]
    fn test_shrunk_allocation_keeps_one_pixel() {
        let params = hbox(false, 0, 0);
        let items = [item(10, true, true, 0), item(10, true, true, 0)];
        let out = box_distribute(&params, &items, Allocation::new(0, 0, 4, 10));
        assert!(out.iter().all(|a| a.width >= 1 && a.height >= 1));
    }

    #[test]
    fn test_request_is_monotonic_in_children() {
        let params = hbox(false, 3, 1);
        let mut items = vec![item(10, false, false, 0), item(4, true, true, 2)];
        let before = box_request(&params, &items);
        items.push(item(1, false, false, 0));
        let after = box_request(&params, &items);
        assert!(after.width >= before.width && after.height >= before.height);

        items[0].requisition.width = 2;
        let shrunk = box_request(&params, &items);
        assert!(shrunk.width <= after.width);
    }

    #[test]
    fn test_allocation_is_idempotent() {
        let params = hbox(false, 2, 1);
        let items = [item(10, true, false, 1), item(20, false, true, 0)];
        let allocation = Allocation::new(3, 4, 90, 20);
        assert_eq!(
            box_distribute(&params, &items, allocation),
            box_distribute(&params, &items, allocation)
        );
    }

    #[test]
    fn test_hidden_child_is_skipped_by_widget() {
        let mut tree = WidgetTree::new(HeadlessBackend::new());
        let row = tree.insert(BoxContainer::horizontal(5));
        let a = tree.insert(DrawingArea::new(10, 10));
        let b = tree.insert(DrawingArea::new(20, 10));
        tree.pack_start(row, a, BoxPacking::new(false, false, 0));
        tree.pack_start(row, b, BoxPacking::new(false, false, 0));
        tree.show(row);
        tree.show(b);

        assert_eq!(tree.size_request(row), Requisition::new(20, 10));
        tree.size_allocate(row, Allocation::new(0, 0, 20, 10));
        assert_eq!(tree.allocation(b), Some(Allocation::new(0, 0, 20, 10)));
    }

    #[test]
    fn test_reorder_child_changes_packing_order() {
        let mut tree = WidgetTree::new(HeadlessBackend::new());
        let row = tree.insert(BoxContainer::horizontal(0));
        let a = tree.insert(DrawingArea::new(10, 10));
        let b = tree.insert(DrawingArea::new(20, 10));
        tree.pack_start(row, a, BoxPacking::new(false, false, 0));
        tree.pack_start(row, b, BoxPacking::new(false, false, 0));
        tree.show_all(row);

        tree.reorder_child(row, b, 0);
        assert_eq!(tree.children(row), vec![b, a]);

        tree.size_request(row);
        tree.size_allocate(row, Allocation::new(0, 0, 30, 10));
        assert_eq!(tree.allocation(b).map(|a| a.x), Some(0));
        assert_eq!(tree.allocation(a).map(|a| a.x), Some(20));
    }

    #[test]
    #[should_panic(expected = "already has a parent")]
    fn test_packing_attached_child_panics() {
        let mut tree = WidgetTree::new(HeadlessBackend::new());
        let first = tree.insert(BoxContainer::horizontal(0));
        let second = tree.insert(BoxContainer::vertical(0));
        let child = tree.insert(DrawingArea::new(1, 1));
        tree.pack_start(first, child, BoxPacking::default());
        tree.pack_start(second, child, BoxPacking::default());
    }
}
