//! Grid packing container.
//!
//! A [`Table`] places children on a grid of rows and columns. A child covers
//! the half-open cell range `[left, right) x [top, bottom)` and carries
//! per-axis [`AttachOptions`] and padding.
//!
//! Both axes are solved independently by the same engine:
//!
//! - the request runs a single-span pass (`max`), a homogeneous
//!   normalization, a multi-span pass that spreads any deficit over the
//!   spanned lines, and the normalization again;
//! - the allocation marks expand-eligible lines, spreads slack over them and
//!   then places each child inside its cell box.
//!
//! Division remainders go to the last line of a span, or the last eligible
//! line when distributing slack.

use std::fmt;

use trellis_core::logging::targets;
use trellis_core::WidgetId;

use crate::widget::geometry::{clamp_dimension, Allocation, Orientation, Requisition};
use crate::widget::traits::{Widget, WidgetContext};
use crate::widget::tree::WidgetTree;

bitflags::bitflags! {
    /// How a child uses its cell box on one axis.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct AttachOptions: u8 {
        /// The child's lines receive a share of surplus space.
        const EXPAND = 1 << 0;
        /// The child stretches over its cell box minus padding.
        const FILL   = 1 << 1;
    }
}

impl Default for AttachOptions {
    fn default() -> Self {
        Self::EXPAND | Self::FILL
    }
}

/// Sizing state of one row or column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowCol {
    pub requisition: i32,
    pub allocation: i32,
    /// Gap after this line. Unused for the last line.
    pub spacing: i32,
    /// Set by a multi-span expanding child none of whose lines expand.
    pub need_expand: bool,
    pub expand: bool,
}

impl fmt::Display for RowCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.requisition, self.allocation)?;
        if self.expand {
            f.write_str(" expand")?;
        }
        Ok(())
    }
}

/// Layout record for one child of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableChild {
    pub widget: WidgetId,
    pub left: usize,
    pub right: usize,
    pub top: usize,
    pub bottom: usize,
    pub xoptions: AttachOptions,
    pub yoptions: AttachOptions,
    pub xpadding: i32,
    pub ypadding: i32,
}

impl TableChild {
    /// Cell range, options and padding along one axis.
    fn span(&self, orientation: Orientation, requisition: Requisition) -> Span {
        match orientation {
            Orientation::Horizontal => Span {
                start: self.left,
                end: self.right,
                options: self.xoptions,
                padding: self.xpadding,
                natural: requisition.width,
            },
            Orientation::Vertical => Span {
                start: self.top,
                end: self.bottom,
                options: self.yoptions,
                padding: self.ypadding,
                natural: requisition.height,
            },
        }
    }
}

/// A child's footprint on one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub options: AttachOptions,
    pub padding: i32,
    /// The child's requisition on this axis, without padding.
    pub natural: i32,
}

impl Span {
    fn is_single(&self) -> bool {
        self.end == self.start + 1
    }

    fn needed(&self) -> i32 {
        self.natural + self.padding * 2
    }
}

/// Sum of the spacing between lines `start..end`.
fn inner_spacing(lines: &[RowCol], start: usize, end: usize) -> i32 {
    lines[start..end.saturating_sub(1).max(start)].iter().map(|line| line.spacing).sum()
}

fn normalize(lines: &mut [RowCol]) {
    let max = lines.iter().map(|line| line.requisition).max().unwrap_or(0);
    for line in lines {
        line.requisition = max;
    }
}

/// Run the request passes for one axis.
pub fn request_axis(lines: &mut [RowCol], spans: &[Span], homogeneous: bool) {
    for line in lines.iter_mut() {
        line.requisition = 0;
    }

    for span in spans.iter().filter(|span| span.is_single()) {
        let line = &mut lines[span.start];
        line.requisition = line.requisition.max(span.needed());
    }

    if homogeneous {
        normalize(lines);
    }

    for span in spans.iter().filter(|span| !span.is_single()) {
        let have: i32 = lines[span.start..span.end]
            .iter()
            .map(|line| line.requisition)
            .sum::<i32>()
            + inner_spacing(lines, span.start, span.end);
        let deficit = span.needed() - have;
        if deficit > 0 {
            let count = (span.end - span.start) as i32;
            let share = deficit / count;
            for line in &mut lines[span.start..span.end] {
                line.requisition += share;
            }
            lines[span.end - 1].requisition += deficit - share * count;
        }
    }

    if homogeneous {
        normalize(lines);
    }
}

/// Total requested size along one axis, including border.
pub fn axis_requisition(lines: &[RowCol], border_width: i32) -> i32 {
    let sum: i32 = lines.iter().map(|line| line.requisition).sum();
    sum + inner_spacing(lines, 0, lines.len()) + border_width * 2
}

/// Run the allocation passes for one axis over `available` pixels (the
/// table's size minus its border).
pub fn allocate_axis(lines: &mut [RowCol], spans: &[Span], homogeneous: bool, available: i32) {
    for line in lines.iter_mut() {
        line.allocation = line.requisition;
        line.expand = false;
        line.need_expand = false;
    }

    for span in spans.iter().filter(|span| span.is_single()) {
        if span.options.contains(AttachOptions::EXPAND) {
            lines[span.start].expand = true;
        }
    }
    for span in spans.iter().filter(|span| !span.is_single()) {
        if span.options.contains(AttachOptions::EXPAND)
            && !lines[span.start..span.end].iter().any(|line| line.expand)
        {
            for line in &mut lines[span.start..span.end] {
                line.need_expand = true;
            }
        }
    }
    for line in lines.iter_mut() {
        if line.need_expand {
            line.expand = true;
        }
    }

    let count = lines.len() as i32;
    if count == 0 {
        return;
    }
    let spacing = inner_spacing(lines, 0, lines.len());

    if homogeneous {
        if lines.iter().any(|line| line.expand) {
            let total = available - spacing;
            let share = total / count;
            for line in lines.iter_mut() {
                line.allocation = clamp_dimension(share);
            }
            if let Some(last) = lines.last_mut() {
                last.allocation = clamp_dimension(total - share * (count - 1));
            }
        }
    } else {
        let requested: i32 = lines.iter().map(|line| line.requisition).sum();
        let slack = available - requested - spacing;
        let nexpand = lines.iter().filter(|line| line.expand).count() as i32;
        if slack > 0 && nexpand > 0 {
            let share = slack / nexpand;
            let mut last_eligible = None;
            for (index, line) in lines.iter_mut().enumerate() {
                if line.expand {
                    line.allocation += share;
                    last_eligible = Some(index);
                }
            }
            if let Some(index) = last_eligible {
                lines[index].allocation += slack - share * nexpand;
            }
        }
    }
}

/// Position and length of a child's slot on one axis, starting at `origin`
/// (the table's allocation edge plus border).
pub fn place_span(lines: &[RowCol], span: &Span, origin: i32) -> (i32, i32) {
    let start: i32 = origin
        + lines[..span.start]
            .iter()
            .map(|line| line.allocation + line.spacing)
            .sum::<i32>();
    let cell: i32 = lines[span.start..span.end]
        .iter()
        .map(|line| line.allocation)
        .sum::<i32>()
        + inner_spacing(lines, span.start, span.end);

    if span.options.contains(AttachOptions::FILL) {
        (start + span.padding, clamp_dimension(cell - span.padding * 2))
    } else {
        (start + (cell - span.natural) / 2, span.natural)
    }
}

/// Container placing children on a grid.
#[derive(Debug, Clone)]
pub struct Table {
    rows: Vec<RowCol>,
    cols: Vec<RowCol>,
    children: Vec<TableChild>,
    homogeneous: bool,
    border_width: i32,
}

impl Table {
    /// Create a table with the given grid size.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero.
    pub fn new(rows: usize, cols: usize, homogeneous: bool) -> Self {
        assert!(rows > 0 && cols > 0, "a table needs at least one row and one column");
        Self {
            rows: vec![RowCol::default(); rows],
            cols: vec![RowCol::default(); cols],
            children: Vec::new(),
            homogeneous,
            border_width: 0,
        }
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.cols.len()
    }

    /// Change the grid size.
    ///
    /// # Panics
    ///
    /// Panics if an attached child would fall outside the new grid.
    pub fn resize(&mut self, rows: usize, cols: usize) {
        assert!(rows > 0 && cols > 0, "a table needs at least one row and one column");
        assert!(
            self.children.iter().all(|child| child.bottom <= rows && child.right <= cols),
            "cannot shrink a table below its attached children"
        );
        self.rows.resize(rows, RowCol::default());
        self.cols.resize(cols, RowCol::default());
    }

    pub fn is_homogeneous(&self) -> bool {
        self.homogeneous
    }

    pub fn set_homogeneous(&mut self, homogeneous: bool) {
        self.homogeneous = homogeneous;
    }

    pub fn border_width(&self) -> i32 {
        self.border_width
    }

    pub fn set_border_width(&mut self, border_width: i32) {
        self.border_width = border_width;
    }

    pub fn set_row_spacing(&mut self, row: usize, spacing: i32) {
        self.rows[row].spacing = spacing;
    }

    pub fn set_col_spacing(&mut self, col: usize, spacing: i32) {
        self.cols[col].spacing = spacing;
    }

    /// Set the gap after every row.
    pub fn set_row_spacings(&mut self, spacing: i32) {
        for row in &mut self.rows {
            row.spacing = spacing;
        }
    }

    /// Set the gap after every column.
    pub fn set_col_spacings(&mut self, spacing: i32) {
        for col in &mut self.cols {
            col.spacing = spacing;
        }
    }

    pub fn rows(&self) -> &[RowCol] {
        &self.rows
    }

    pub fn cols(&self) -> &[RowCol] {
        &self.cols
    }

    pub fn row_requisitions(&self) -> Vec<i32> {
        self.rows.iter().map(|row| row.requisition).collect()
    }

    pub fn col_requisitions(&self) -> Vec<i32> {
        self.cols.iter().map(|col| col.requisition).collect()
    }

    pub fn row_allocations(&self) -> Vec<i32> {
        self.rows.iter().map(|row| row.allocation).collect()
    }

    pub fn col_allocations(&self) -> Vec<i32> {
        self.cols.iter().map(|col| col.allocation).collect()
    }

    /// Layout records in attachment order.
    pub fn children(&self) -> &[TableChild] {
        &self.children
    }

    fn visible_children(&self, cx: &WidgetContext<'_>) -> Vec<(TableChild, Requisition)> {
        self.children
            .iter()
            .filter(|child| cx.is_visible(child.widget))
            .map(|child| (*child, cx.requisition(child.widget)))
            .collect()
    }

    fn spans(items: &[(TableChild, Requisition)], orientation: Orientation) -> Vec<Span> {
        items
            .iter()
            .map(|(child, requisition)| child.span(orientation, *requisition))
            .collect()
    }
}

impl Widget for Table {
    fn size_request(&mut self, cx: &mut WidgetContext<'_>) -> Requisition {
        for child in &self.children {
            if cx.is_visible(child.widget) {
                cx.size_request(child.widget);
            }
        }
        let items = self.visible_children(cx);
        request_axis(&mut self.cols, &Self::spans(&items, Orientation::Horizontal), self.homogeneous);
        request_axis(&mut self.rows, &Self::spans(&items, Orientation::Vertical), self.homogeneous);

        Requisition::new(
            axis_requisition(&self.cols, self.border_width),
            axis_requisition(&self.rows, self.border_width),
        )
    }

    fn size_allocate(&mut self, cx: &mut WidgetContext<'_>, allocation: Allocation) {
        let items = self.visible_children(cx);
        let col_spans = Self::spans(&items, Orientation::Horizontal);
        let row_spans = Self::spans(&items, Orientation::Vertical);
        let border = self.border_width;

        allocate_axis(&mut self.cols, &col_spans, self.homogeneous, allocation.width - border * 2);
        allocate_axis(&mut self.rows, &row_spans, self.homogeneous, allocation.height - border * 2);
        tracing::trace!(
            target: targets::LAYOUT,
            table = ?cx.id(),
            cols = ?self.col_allocations(),
            rows = ?self.row_allocations(),
            "table allocate"
        );

        for (((child, _), col_span), row_span) in items.iter().zip(&col_spans).zip(&row_spans) {
            let (x, width) = place_span(&self.cols, col_span, allocation.x + border);
            let (y, height) = place_span(&self.rows, row_span, allocation.y + border);
            cx.size_allocate(child.widget, Allocation::new(x, y, width, height));
        }
    }

    fn remove_child(&mut self, child: WidgetId) -> bool {
        let before = self.children.len();
        self.children.retain(|record| record.widget != child);
        self.children.len() != before
    }
}

impl WidgetTree {
    /// Attach `child` to the cells `[left, right) x [top, bottom)` of a table.
    ///
    /// # Panics
    ///
    /// Panics if the range is empty or reaches outside the grid.
    #[allow(clippy::too_many_arguments)]
    pub fn attach(
        &mut self,
        table: WidgetId,
        child: WidgetId,
        (left, right): (usize, usize),
        (top, bottom): (usize, usize),
        xoptions: AttachOptions,
        yoptions: AttachOptions,
        xpadding: i32,
        ypadding: i32,
    ) {
        self.adopt::<Table, _>(table, child, |grid| {
            assert!(
                left < right && right <= grid.n_cols(),
                "columns {left}..{right} outside a table with {} columns",
                grid.n_cols()
            );
            assert!(
                top < bottom && bottom <= grid.n_rows(),
                "rows {top}..{bottom} outside a table with {} rows",
                grid.n_rows()
            );
            grid.children.push(TableChild {
                widget: child,
                left,
                right,
                top,
                bottom,
                xoptions,
                yoptions,
                xpadding,
                ypadding,
            });
        });
    }

    /// Attach with `EXPAND | FILL` on both axes and no padding.
    pub fn attach_defaults(&mut self, table: WidgetId, child: WidgetId, cols: (usize, usize), rows: (usize, usize)) {
        self.attach(
            table,
            child,
            cols,
            rows,
            AttachOptions::default(),
            AttachOptions::default(),
            0,
            0,
        );
    }
}
