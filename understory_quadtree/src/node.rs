// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Arena node storage and node handles.

use kurbo::Point;
use smallvec::SmallVec;

use crate::types::BoundingBox;

/// Generational handle for a node of a [`QuadTree`][crate::QuadTree].
///
/// Handles stay valid while the node exists. Once a collapse discards the
/// node, the handle goes stale and every accessor taking it returns `None`,
/// even after the slot is reused by a later subdivision.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(u32, u32);

impl NodeId {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Node ids are intentionally 32-bit; higher bits are truncated by design."
    )]
    pub(crate) const fn new(idx: usize, generation: u32) -> Self {
        Self(idx as u32, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    pub(crate) const fn generation(self) -> u32 {
        self.1
    }
}

/// A stored element together with its location.
#[derive(Clone, Debug)]
pub(crate) struct Entry<E> {
    pub(crate) element: E,
    pub(crate) point: Point,
}

/// A cell of the tree.
///
/// A node is either a leaf (`children` is `None`, `entries` may be non-empty)
/// or internal (`children` is `Some`, `entries` is empty).
#[derive(Clone, Debug)]
pub(crate) struct Node<E> {
    pub(crate) generation: u32,
    pub(crate) bounds: BoundingBox,
    pub(crate) depth: u32,
    /// Arena slot of the parent; `None` for the root.
    pub(crate) parent: Option<usize>,
    /// Arena slots of the children in NW, NE, SW, SE order.
    pub(crate) children: Option<[usize; 4]>,
    pub(crate) entries: SmallVec<[Entry<E>; 4]>,
}

impl<E> Node<E> {
    pub(crate) fn new(
        generation: u32,
        bounds: BoundingBox,
        depth: u32,
        parent: Option<usize>,
    ) -> Self {
        Self {
            generation,
            bounds,
            depth,
            parent,
            children: None,
            entries: SmallVec::new(),
        }
    }

    #[inline]
    pub(crate) fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Whether this node is a leaf with nothing stored in it.
    #[inline]
    pub(crate) fn is_empty_leaf(&self) -> bool {
        self.is_leaf() && self.entries.is_empty()
    }

    /// Number of stored entries located exactly at `point`.
    pub(crate) fn coincident_count(&self, point: Point) -> usize {
        self.entries.iter().filter(|e| e.point == point).count()
    }
}
