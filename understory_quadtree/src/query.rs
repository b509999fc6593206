// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Read-only queries: point, rectangle, nearest neighbor, and cell walks.

use alloc::vec::Vec;

use kurbo::Point;
use smallvec::{SmallVec, smallvec};

use crate::node::NodeId;
use crate::tree::{QuadTree, ROOT};
use crate::types::BoundingBox;

/// Result of a nearest-neighbor search.
#[derive(Debug)]
pub struct Neighbor<'a, E> {
    /// The closest element.
    pub element: &'a E,
    /// Where it is stored.
    pub point: Point,
    /// Euclidean distance from the query point.
    pub distance: f64,
}

// Copy for any `E`: only the reference is duplicated.
impl<E> Clone for Neighbor<'_, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for Neighbor<'_, E> {}

/// Snapshot of one node, as produced by [`QuadTree::visit_cells`].
///
/// This is what a debug overlay needs to draw the subdivision: one rectangle
/// per node, optionally styled by depth or occupancy.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Cell {
    /// Handle of the node.
    pub id: NodeId,
    /// Bounds of the node.
    pub bounds: BoundingBox,
    /// Depth of the node; the root is at depth 0.
    pub depth: u32,
    /// Whether the node is a leaf.
    pub is_leaf: bool,
    /// Entries stored directly in the node (always 0 for internal nodes).
    pub len: usize,
}

impl<E> QuadTree<E> {
    /// Handle of the leaf owning `point`, or `None` if the point is outside
    /// the tree.
    pub fn leaf_at(&self, point: Point) -> Option<NodeId> {
        self.leaf_slot(point).map(|idx| self.id_of(idx))
    }

    /// Elements stored in the leaf owning `point`.
    ///
    /// Every element sharing that leaf is returned, not only those located
    /// exactly at `point`. Points outside the tree yield nothing.
    pub fn elements_at(&self, point: Point) -> impl Iterator<Item = &E> + '_ {
        let mut out = Vec::new();
        self.visit_point(point, |e| out.push(e));
        out.into_iter()
    }

    /// Visit the elements of the leaf owning `point` (does not allocate result storage).
    pub fn visit_point<'a, F: FnMut(&'a E)>(&'a self, point: Point, mut f: F) {
        if let Some(idx) = self.leaf_slot(point) {
            for entry in &self.node(idx).entries {
                f(&entry.element);
            }
        }
    }

    /// Elements whose point lies inside `query`, edges included.
    pub fn elements_in(&self, query: BoundingBox) -> impl Iterator<Item = &E> + '_ {
        let mut out = Vec::new();
        self.visit_rect(query, |e| out.push(e));
        out.into_iter()
    }

    /// Visit elements whose point lies inside `query` (does not allocate result storage).
    ///
    /// Elements are visited leaf by leaf in depth-first NW, NE, SW, SE order.
    pub fn visit_rect<'a, F: FnMut(&'a E)>(&'a self, query: BoundingBox, mut f: F) {
        let mut stack: SmallVec<[usize; 32]> = smallvec![ROOT];
        while let Some(idx) = stack.pop() {
            let node = self.node(idx);
            if !node.bounds.intersects(&query) {
                continue;
            }
            match node.children {
                Some(children) => stack.extend(children.into_iter().rev()),
                None => {
                    for entry in &node.entries {
                        if query.contains(entry.point) {
                            f(&entry.element);
                        }
                    }
                }
            }
        }
    }

    /// The element closest to `point`, if any.
    pub fn nearest(&self, point: Point) -> Option<&E> {
        self.nearest_neighbor(point, |_| true).map(|n| n.element)
    }

    /// The element closest to `point` among those accepted by `filter`.
    pub fn nearest_matching<F: FnMut(&E) -> bool>(&self, point: Point, filter: F) -> Option<&E> {
        self.nearest_neighbor(point, filter).map(|n| n.element)
    }

    /// Nearest-neighbor search with the matched location and distance.
    ///
    /// Nodes are visited depth-first in NW, NE, SW, SE order, carrying the
    /// best candidate found so far. A node is skipped when it lies farther
    /// than the current best distance along either axis (see
    /// [`BoundingBox::excludes_within`]); until a first candidate is found
    /// nothing is skipped, so query points outside the tree bounds work too.
    /// A candidate replaces the best only when strictly closer, so among
    /// equidistant elements the first one visited wins.
    ///
    /// Returns `None` when the tree is empty, when no element passes
    /// `filter`, or when `point` has a NaN coordinate.
    pub fn nearest_neighbor<F: FnMut(&E) -> bool>(
        &self,
        point: Point,
        mut filter: F,
    ) -> Option<Neighbor<'_, E>> {
        if point.is_nan() {
            return None;
        }
        let mut best: Option<Neighbor<'_, E>> = None;
        let mut stack: SmallVec<[usize; 32]> = smallvec![ROOT];
        while let Some(idx) = stack.pop() {
            let node = self.node(idx);
            let radius = best.map_or(f64::INFINITY, |b| b.distance);
            if node.bounds.excludes_within(point, radius) {
                continue;
            }
            match node.children {
                Some(children) => stack.extend(children.into_iter().rev()),
                None => {
                    for entry in &node.entries {
                        if !filter(&entry.element) {
                            continue;
                        }
                        let distance = point.distance(entry.point);
                        if best.is_none_or(|b| distance < b.distance) {
                            best = Some(Neighbor {
                                element: &entry.element,
                                point: entry.point,
                                distance,
                            });
                        }
                    }
                }
            }
        }
        best
    }

    /// Visit every node depth-first, parents before children, children in
    /// NW, NE, SW, SE order.
    pub fn visit_cells<F: FnMut(Cell)>(&self, mut f: F) {
        let mut stack: SmallVec<[usize; 32]> = smallvec![ROOT];
        while let Some(idx) = stack.pop() {
            let node = self.node(idx);
            f(Cell {
                id: self.id_of(idx),
                bounds: node.bounds,
                depth: node.depth,
                is_leaf: node.is_leaf(),
                len: node.entries.len(),
            });
            if let Some(children) = node.children {
                stack.extend(children.into_iter().rev());
            }
        }
    }

    /// Every node in [`QuadTree::visit_cells`] order.
    pub fn cells(&self) -> Vec<Cell> {
        let mut out = Vec::new();
        self.visit_cells(|c| out.push(c));
        out
    }

    fn leaf_slot(&self, point: Point) -> Option<usize> {
        let mut idx = ROOT;
        let mut node = self.node(idx);
        if !node.bounds.contains(point) {
            return None;
        }
        while let Some(children) = node.children {
            idx = children[node.bounds.quadrant(point).index()];
            node = self.node(idx);
        }
        Some(idx)
    }
}
