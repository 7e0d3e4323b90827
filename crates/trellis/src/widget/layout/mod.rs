//! Container layout engines.
//!
//! Both engines follow the two-pass geometry protocol: a bottom-up
//! `size_request` that sums child requisitions, then a top-down
//! `size_allocate` that splits the container's allocation among children.
//!
//! - [`BoxContainer`]: packs children along one axis from either end, with
//!   per-child expand, fill and padding
//! - [`Table`]: places children on a row/column grid where a child may span
//!   several cells
//!
//! Each engine's arithmetic is also exposed as free functions over plain
//! records ([`box_request`], [`box_distribute`], [`request_axis`],
//! [`allocate_axis`]) so it can be exercised without a widget tree.

mod box_layout;
mod table_layout;

pub use box_layout::{box_distribute, box_request, BoxChild, BoxContainer, BoxItem, BoxPacking, BoxParams, PackType};
pub use table_layout::{
    allocate_axis, axis_requisition, place_span, request_axis, AttachOptions, RowCol, Span, Table, TableChild,
};
