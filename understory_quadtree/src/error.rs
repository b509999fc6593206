// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Insert failure reasons.

use kurbo::Point;
use thiserror::Error;

/// Why [`QuadTree::insert`][crate::QuadTree::insert] rejected an entry.
///
/// None of these are fatal: the tree is unchanged apart from any subdivision
/// already performed while descending, and the caller may retry with a
/// different configuration or accept the loss.
#[derive(Copy, Clone, Debug, PartialEq, Error)]
pub enum InsertError {
    /// The point lies outside the root bounding box.
    #[error("point {point:?} lies outside the tree bounds")]
    OutOfBounds {
        /// The rejected point.
        point: Point,
    },
    /// The target cell already holds `limit` entries at exactly this point.
    #[error("cell already holds {limit} entries at {point:?}")]
    CoincidentLimit {
        /// The rejected point.
        point: Point,
        /// The leaf capacity, which also caps coincident entries.
        limit: usize,
    },
    /// The target cell is full and already at the maximum depth.
    #[error("cell at depth {depth} is full and cannot subdivide further")]
    DepthLimit {
        /// Depth of the full cell.
        depth: u32,
    },
}
