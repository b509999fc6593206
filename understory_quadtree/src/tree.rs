// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core tree implementation: arena, insertion, subdivision, removal, collapse.

use alloc::vec::Vec;

use kurbo::Point;
use smallvec::{SmallVec, smallvec};
use tracing::{debug, trace};

use crate::config::QuadTreeConfig;
use crate::error::InsertError;
use crate::node::{Entry, Node, NodeId};
use crate::types::BoundingBox;

/// Arena slot of the root node. The root is never freed.
pub(crate) const ROOT: usize = 0;

/// Region-subdividing point quadtree.
///
/// Stores `(element, point)` entries inside a fixed bounding box. A leaf
/// holding [`QuadTreeConfig::capacity`] entries splits into four children on
/// the next insert that lands in it, down to [`QuadTreeConfig::max_depth`].
/// Removing the last entry of a leaf collapses its parent once all four
/// siblings are empty.
///
/// Elements are meant to be small handles (ids, keys, `Rc`s). [`QuadTree::remove`]
/// matches them with `PartialEq`; use [`QuadTree::remove_where`] for other
/// notions of identity such as `Rc::ptr_eq`.
///
/// Nodes live in an arena and refer to their parent and children by slot, so
/// there are no reference cycles, and every walk is an explicit loop whose
/// depth is bounded by the configured maximum depth rather than by the call
/// stack.
///
/// ## Example
///
/// ```rust
/// use kurbo::Point;
/// use understory_quadtree::{BoundingBox, QuadTree, QuadTreeConfig};
///
/// let bounds = BoundingBox::new(Point::new(0.0, 0.0), Point::new(100.0, 100.0));
/// let mut tree = QuadTree::with_config(bounds, QuadTreeConfig::new().with_capacity(1));
///
/// tree.insert(1_u32, Point::new(10.0, 10.0)).unwrap();
/// tree.insert(2_u32, Point::new(90.0, 90.0)).unwrap();
///
/// // The second insert split the root.
/// assert!(tree.children_of(tree.root()).is_some());
///
/// assert!(tree.remove(&1));
/// assert!(!tree.remove(&1));
/// assert_eq!(tree.len(), 1);
/// ```
pub struct QuadTree<E> {
    /// slots
    pub(crate) nodes: Vec<Option<Node<E>>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
    config: QuadTreeConfig,
    len: usize,
}

impl<E> core::fmt::Debug for QuadTree<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        f.debug_struct("QuadTree")
            .field("bounds", &self.bounds())
            .field("config", &self.config)
            .field("len", &self.len)
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .finish_non_exhaustive()
    }
}

impl<E> QuadTree<E> {
    /// Create an empty tree covering `bounds` with the default configuration
    /// (capacity 1, maximum depth 10).
    pub fn new(bounds: BoundingBox) -> Self {
        Self::with_config(bounds, QuadTreeConfig::default())
    }

    /// Create an empty tree covering `bounds`.
    pub fn with_config(bounds: BoundingBox, config: QuadTreeConfig) -> Self {
        let config = QuadTreeConfig {
            capacity: config.effective_capacity(),
            ..config
        };
        Self {
            nodes: alloc::vec![Some(Node::new(1, bounds, 0, None))],
            generations: alloc::vec![1],
            free_list: Vec::new(),
            config,
            len: 0,
        }
    }

    /// Bounds of the root cell.
    pub fn bounds(&self) -> BoundingBox {
        self.node(ROOT).bounds
    }

    /// The configuration in effect.
    pub fn config(&self) -> QuadTreeConfig {
        self.config
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Remove every entry and every node below the root.
    ///
    /// Handles to discarded nodes go stale; the root handle stays valid.
    pub fn clear(&mut self) {
        for idx in 1..self.nodes.len() {
            if self.nodes[idx].is_some() {
                self.free(idx);
            }
        }
        let root = self.node_mut(ROOT);
        root.children = None;
        root.entries.clear();
        self.len = 0;
    }

    /// Insert `element` at `point`.
    ///
    /// Descends to the leaf owning `point` (see [`BoundingBox::quadrant`]),
    /// subdividing full leaves on the way, and returns the handle of the leaf
    /// that stored the entry.
    ///
    /// Fails without storing anything when the point is outside the tree,
    /// when the target cell is full and already holds `capacity` entries at
    /// exactly this point, or when the target cell is full at the maximum
    /// depth. Subdivisions performed before such a failure are kept.
    pub fn insert(&mut self, element: E, point: Point) -> Result<NodeId, InsertError> {
        if !self.bounds().contains(point) {
            debug!(?point, "insert rejected: point outside tree bounds");
            return Err(InsertError::OutOfBounds { point });
        }
        let capacity = self.config.capacity;
        let mut idx = ROOT;
        loop {
            let node = self.node(idx);
            if let Some(children) = node.children {
                idx = children[node.bounds.quadrant(point).index()];
                continue;
            }
            if node.entries.len() < capacity {
                self.node_mut(idx).entries.push(Entry { element, point });
                self.len += 1;
                return Ok(self.id_of(idx));
            }
            if node.coincident_count(point) >= capacity {
                debug!(?point, limit = capacity, "insert rejected: coincident entry limit");
                return Err(InsertError::CoincidentLimit {
                    point,
                    limit: capacity,
                });
            }
            if node.depth >= self.config.max_depth {
                debug!(?point, depth = node.depth, "insert rejected: depth limit");
                return Err(InsertError::DepthLimit { depth: node.depth });
            }
            self.subdivide(idx);
        }
    }

    /// Remove `element`, compared with `PartialEq`.
    ///
    /// See [`QuadTree::remove_where`] for the exact contract.
    pub fn remove(&mut self, element: &E) -> bool
    where
        E: PartialEq,
    {
        self.remove_where(|e| e == element)
    }

    /// Remove entries whose element satisfies `matches`.
    ///
    /// Every leaf is scanned and the first matching entry of each leaf is
    /// removed. Returns whether anything was removed.
    ///
    /// A leaf left empty makes its parent try to collapse: the parent drops
    /// its four children only when all of them are empty leaves. A collapse
    /// turns the parent into an empty leaf, so the same rule is then applied
    /// to the grandparent, and so on. Siblings that still hold entries are
    /// never merged back into their parent, even when they would fit.
    pub fn remove_where<F: FnMut(&E) -> bool>(&mut self, mut matches: F) -> bool {
        let mut emptied: SmallVec<[usize; 4]> = SmallVec::new();
        let mut stack: SmallVec<[usize; 32]> = smallvec![ROOT];
        let mut found = false;
        while let Some(idx) = stack.pop() {
            let node = self.node_mut(idx);
            if let Some(children) = node.children {
                stack.extend(children.into_iter().rev());
                continue;
            }
            if let Some(pos) = node.entries.iter().position(|e| matches(&e.element)) {
                node.entries.remove(pos);
                let now_empty = node.entries.is_empty();
                self.len -= 1;
                found = true;
                if now_empty {
                    emptied.push(idx);
                }
            }
        }
        for leaf in emptied {
            self.collapse_above(leaf);
        }
        found
    }

    /// Handle of the root node.
    pub fn root(&self) -> NodeId {
        self.id_of(ROOT)
    }

    /// Whether `id` refers to a node that still exists.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Bounds of a node.
    pub fn node_bounds(&self, id: NodeId) -> Option<BoundingBox> {
        self.get(id).map(|n| n.bounds)
    }

    /// Depth of a node; the root is at depth 0.
    pub fn depth_of(&self, id: NodeId) -> Option<u32> {
        self.get(id).map(|n| n.depth)
    }

    /// Parent of a node, or `None` for the root and for stale handles.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.get(id)?.parent?;
        Some(self.id_of(parent))
    }

    /// Children of an internal node in NW, NE, SW, SE order.
    ///
    /// Returns `None` for leaves and stale handles.
    pub fn children_of(&self, id: NodeId) -> Option<[NodeId; 4]> {
        let children = self.get(id)?.children?;
        Some(children.map(|c| self.id_of(c)))
    }

    /// Whether `id` is a live leaf.
    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(Node::is_leaf)
    }

    /// Entries stored directly in a node. Empty for internal nodes and stale
    /// handles.
    pub fn entries_of(&self, id: NodeId) -> impl Iterator<Item = (&E, Point)> + '_ {
        self.get(id)
            .into_iter()
            .flat_map(|n| n.entries.iter().map(|e| (&e.element, e.point)))
    }

    /// All stored entries, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&E, Point)> + '_ {
        self.nodes
            .iter()
            .flatten()
            .flat_map(|n| n.entries.iter().map(|e| (&e.element, e.point)))
    }

    pub(crate) fn node(&self, idx: usize) -> &Node<E> {
        self.nodes[idx]
            .as_ref()
            .expect("quadtree invariant violated: reference to a vacant slot")
    }

    pub(crate) fn node_mut(&mut self, idx: usize) -> &mut Node<E> {
        self.nodes[idx]
            .as_mut()
            .expect("quadtree invariant violated: reference to a vacant slot")
    }

    pub(crate) fn id_of(&self, idx: usize) -> NodeId {
        NodeId::new(idx, self.generations[idx])
    }

    fn get(&self, id: NodeId) -> Option<&Node<E>> {
        let node = self.nodes.get(id.idx())?.as_ref()?;
        (node.generation == id.generation()).then_some(node)
    }

    fn alloc(&mut self, bounds: BoundingBox, depth: u32, parent: usize) -> usize {
        if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Node::new(generation, bounds, depth, Some(parent)));
            idx
        } else {
            let generation = 1_u32;
            self.nodes
                .push(Some(Node::new(generation, bounds, depth, Some(parent))));
            self.generations.push(generation);
            self.nodes.len() - 1
        }
    }

    fn free(&mut self, idx: usize) {
        self.nodes[idx] = None;
        self.free_list.push(idx);
    }

    /// Split a leaf into four children and move its entries down.
    ///
    /// The leaf holds at most `capacity` entries, so every child receives at
    /// most `capacity` entries and none of them needs to split again here.
    fn subdivide(&mut self, idx: usize) {
        let (bounds, depth) = {
            let node = self.node(idx);
            debug_assert!(node.is_leaf(), "only leaves can be subdivided");
            (node.bounds, node.depth)
        };
        let children = bounds.split().map(|b| self.alloc(b, depth + 1, idx));
        let node = self.node_mut(idx);
        let entries = core::mem::take(&mut node.entries);
        node.children = Some(children);
        let moved = entries.len();
        for entry in entries {
            let child = children[bounds.quadrant(entry.point).index()];
            self.node_mut(child).entries.push(entry);
        }
        trace!(depth, moved, "subdivided cell");
    }

    /// Drop the children of `idx` if all four are empty leaves.
    fn unify(&mut self, idx: usize) -> bool {
        let Some(children) = self.node(idx).children else {
            return false;
        };
        if !children.iter().all(|&c| self.node(c).is_empty_leaf()) {
            return false;
        }
        // Freed in reverse so the next subdivision reuses slots in NW..SE order.
        for child in children.into_iter().rev() {
            self.free(child);
        }
        let node = self.node_mut(idx);
        node.children = None;
        trace!(depth = node.depth, "collapsed empty cells");
        true
    }

    /// Collapse ancestors of a leaf that just became empty, bottom up.
    fn collapse_above(&mut self, leaf: usize) {
        // An earlier collapse may already have discarded this leaf.
        let Some(Some(node)) = self.nodes.get(leaf) else {
            return;
        };
        let mut parent = node.parent;
        while let Some(idx) = parent {
            if !self.unify(idx) {
                break;
            }
            parent = self.node(idx).parent;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use alloc::vec::Vec;

    fn bbox(x0: f64, y0: f64, x1: f64, y1: f64) -> BoundingBox {
        BoundingBox::new(Point::new(x0, y0), Point::new(x1, y1))
    }

    fn tree<E>(bounds: BoundingBox, capacity: usize, max_depth: u32) -> QuadTree<E> {
        QuadTree::with_config(
            bounds,
            QuadTreeConfig::new()
                .with_capacity(capacity)
                .with_max_depth(max_depth),
        )
    }

    fn node_count<E>(tree: &QuadTree<E>) -> usize {
        tree.nodes.iter().filter(|n| n.is_some()).count()
    }

    fn max_depth_reached<E>(tree: &QuadTree<E>) -> u32 {
        tree.nodes.iter().flatten().map(|n| n.depth).max().unwrap()
    }

    #[test]
    fn coincident_points_are_capped() {
        let mut t = tree(bbox(-10.0, -10.0, 10.0, 10.0), 2, 3);
        let origin = Point::new(0.0, 0.0);
        let a = t.insert("e1", origin).unwrap();
        let b = t.insert("e2", origin).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, t.root());

        assert_eq!(
            t.insert("e3", origin),
            Err(InsertError::CoincidentLimit {
                point: origin,
                limit: 2
            })
        );
        assert_eq!(t.len(), 2);
        assert!(t.is_leaf(t.root()));
        let stored: Vec<_> = t.entries_of(t.root()).map(|(e, _)| *e).collect();
        assert_eq!(stored, ["e1", "e2"]);
    }

    #[test]
    fn second_insert_subdivides_once() {
        let mut t = tree(bbox(0.0, 0.0, 100.0, 100.0), 1, 10);
        let first = t.insert(1_u32, Point::new(10.0, 10.0)).unwrap();
        assert_eq!(first, t.root());
        let second = t.insert(2_u32, Point::new(90.0, 90.0)).unwrap();

        let [nw, ne, sw, se] = t.children_of(t.root()).unwrap();
        assert_eq!(second, ne);
        assert_eq!(t.node_bounds(sw), Some(bbox(0.0, 0.0, 50.0, 50.0)));
        assert_eq!(t.entries_of(sw).map(|(e, _)| *e).collect::<Vec<_>>(), [1]);
        assert_eq!(t.entries_of(ne).map(|(e, _)| *e).collect::<Vec<_>>(), [2]);
        assert_eq!(t.entries_of(nw).count(), 0);
        assert_eq!(t.entries_of(se).count(), 0);
        assert_eq!(t.entries_of(t.root()).count(), 0);
        assert_eq!(node_count(&t), 5);
        assert_eq!(t.depth_of(ne), Some(1));
        assert_eq!(t.parent_of(ne), Some(t.root()));
        assert_eq!(t.parent_of(t.root()), None);
    }

    #[test]
    fn out_of_bounds_insert_fails() {
        let mut t: QuadTree<u32> = QuadTree::new(bbox(0.0, 0.0, 10.0, 10.0));
        let p = Point::new(10.5, 5.0);
        assert_eq!(t.insert(1, p), Err(InsertError::OutOfBounds { point: p }));
        assert!(t.insert(2, Point::new(f64::NAN, 1.0)).is_err());
        assert!(t.is_empty());
        // Edges are inside.
        assert!(t.insert(3, Point::new(10.0, 0.0)).is_ok());
    }

    #[test]
    fn depth_ceiling_is_never_exceeded() {
        let mut t = tree(bbox(0.0, 0.0, 16.0, 16.0), 1, 2);
        t.insert(1_u32, Point::new(1.0, 1.0)).unwrap();
        assert_eq!(
            t.insert(2, Point::new(2.0, 2.0)),
            Err(InsertError::DepthLimit { depth: 2 })
        );
        assert_eq!(max_depth_reached(&t), 2);
        assert_eq!(t.len(), 1);

        // Nearby points keep failing; distinct cells still accept entries.
        for i in 0..20 {
            let p = Point::new(1.0 + f64::from(i) * 0.1, 1.5);
            assert!(t.insert(100 + i, p).is_err());
        }
        assert!(t.insert(3, Point::new(15.0, 15.0)).is_ok());
        assert_eq!(max_depth_reached(&t), 2);
    }

    #[test]
    fn zero_max_depth_keeps_a_single_leaf() {
        let mut t = tree(bbox(0.0, 0.0, 10.0, 10.0), 2, 0);
        t.insert(1_u32, Point::new(1.0, 1.0)).unwrap();
        t.insert(2, Point::new(9.0, 9.0)).unwrap();
        assert_eq!(
            t.insert(3, Point::new(5.0, 5.0)),
            Err(InsertError::DepthLimit { depth: 0 })
        );
        assert_eq!(node_count(&t), 1);
    }

    #[test]
    fn full_leaf_moves_entries_without_loss() {
        let mut t = tree(bbox(0.0, 0.0, 100.0, 100.0), 3, 10);
        let p = Point::new(10.0, 10.0);
        for e in 0..3_u32 {
            t.insert(e, p).unwrap();
        }
        let leaf = t.insert(3, Point::new(90.0, 90.0)).unwrap();
        assert_ne!(leaf, t.root());

        let [_, _, sw, _] = t.children_of(t.root()).unwrap();
        assert_eq!(
            t.entries_of(sw).map(|(e, _)| *e).collect::<Vec<_>>(),
            [0, 1, 2]
        );
        assert_eq!(
            t.insert(4, p),
            Err(InsertError::CoincidentLimit { point: p, limit: 3 })
        );
        assert_eq!(t.len(), 4);
    }

    #[test]
    fn remove_reports_presence() {
        let mut t = tree(bbox(0.0, 0.0, 10.0, 10.0), 1, 10);
        t.insert(1_u32, Point::new(5.0, 5.0)).unwrap();
        assert!(!t.remove(&2));
        assert!(t.remove(&1));
        assert!(!t.remove(&1));
        assert!(t.is_empty());
        assert!(t.is_leaf(t.root()));
    }

    #[test]
    fn collapse_waits_for_all_siblings() {
        let mut t = tree(bbox(0.0, 0.0, 100.0, 100.0), 1, 10);
        t.insert('a', Point::new(10.0, 10.0)).unwrap();
        t.insert('b', Point::new(90.0, 90.0)).unwrap();
        t.insert('c', Point::new(10.0, 90.0)).unwrap();
        t.insert('d', Point::new(90.0, 10.0)).unwrap();
        let children = t.children_of(t.root()).unwrap();

        for e in ['a', 'b', 'c'] {
            assert!(t.remove(&e));
            assert_eq!(t.children_of(t.root()), Some(children));
        }
        assert!(children.iter().all(|&c| t.is_alive(c)));

        assert!(t.remove(&'d'));
        assert_eq!(t.children_of(t.root()), None);
        assert!(children.iter().all(|&c| !t.is_alive(c)));
        assert_eq!(node_count(&t), 1);
    }

    #[test]
    fn collapse_cascades_through_emptied_ancestors() {
        let mut t = tree(bbox(0.0, 0.0, 100.0, 100.0), 1, 10);
        t.insert(1_u32, Point::new(10.0, 10.0)).unwrap();
        let deep = t.insert(2, Point::new(20.0, 20.0)).unwrap();
        assert_eq!(t.depth_of(deep), Some(3));
        assert_eq!(node_count(&t), 13);

        assert!(t.remove(&1));
        assert_eq!(node_count(&t), 13);
        assert!(t.remove(&2));
        assert_eq!(node_count(&t), 1);
        assert!(t.is_leaf(t.root()));
        assert!(!t.is_alive(deep));
    }

    #[test]
    fn stale_handles_survive_slot_reuse() {
        let mut t = tree(bbox(0.0, 0.0, 100.0, 100.0), 1, 10);
        t.insert(1_u32, Point::new(10.0, 10.0)).unwrap();
        let old = t.insert(2, Point::new(90.0, 90.0)).unwrap();
        assert!(t.remove(&1));
        assert!(t.remove(&2));
        assert!(!t.is_alive(old));

        t.insert(3, Point::new(10.0, 10.0)).unwrap();
        let new = t.insert(4, Point::new(90.0, 90.0)).unwrap();
        assert_eq!(new.idx(), old.idx());
        assert_ne!(new, old);
        assert!(t.is_alive(new));
        assert!(!t.is_alive(old));
        assert_eq!(t.node_bounds(old), None);
        assert_eq!(t.entries_of(old).count(), 0);
    }

    #[test]
    fn remove_where_uses_caller_identity() {
        let mut t = tree(bbox(0.0, 0.0, 10.0, 10.0), 4, 10);
        let first = Rc::new(5_u32);
        let second = Rc::new(5_u32);
        t.insert(first.clone(), Point::new(1.0, 1.0)).unwrap();
        t.insert(second.clone(), Point::new(1.0, 1.0)).unwrap();

        assert!(t.remove_where(|e| Rc::ptr_eq(e, &second)));
        let left: Vec<_> = t.iter().map(|(e, _)| e.clone()).collect();
        assert_eq!(left.len(), 1);
        assert!(Rc::ptr_eq(&left[0], &first));
        assert!(!t.remove_where(|e| Rc::ptr_eq(e, &second)));
    }

    #[test]
    fn remove_scans_every_leaf() {
        let mut t = tree(bbox(0.0, 0.0, 100.0, 100.0), 1, 10);
        t.insert(7_u32, Point::new(10.0, 10.0)).unwrap();
        t.insert(7, Point::new(90.0, 90.0)).unwrap();
        t.insert(8, Point::new(90.0, 10.0)).unwrap();
        assert!(t.remove(&7));
        assert_eq!(t.len(), 1);
        assert_eq!(t.iter().map(|(e, _)| *e).collect::<Vec<_>>(), [8]);
    }

    #[test]
    fn clear_resets_to_single_leaf() {
        let mut t = tree(bbox(0.0, 0.0, 100.0, 100.0), 1, 10);
        for i in 0..10_u32 {
            t.insert(i, Point::new(f64::from(i) * 9.0, 50.0)).unwrap();
        }
        let child = t.children_of(t.root()).unwrap()[0];
        t.clear();
        assert!(t.is_empty());
        assert_eq!(node_count(&t), 1);
        assert!(t.is_alive(t.root()));
        assert!(!t.is_alive(child));
        assert!(t.insert(42, Point::new(1.0, 1.0)).is_ok());
    }

    #[test]
    fn zero_capacity_behaves_like_one() {
        let mut t = tree(bbox(0.0, 0.0, 10.0, 10.0), 0, 10);
        assert_eq!(t.config().capacity, 1);
        assert_eq!(t.insert(1_u32, Point::new(1.0, 1.0)), Ok(t.root()));
    }
}
