// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree configuration.

/// Subdivision parameters for a [`QuadTree`][crate::QuadTree].
///
/// `capacity` is a soft cap: a leaf holding `capacity` entries tries to
/// subdivide on the next insert, and it also bounds how many entries at one
/// exact point a single cell accepts. `max_depth` is a hard ceiling on
/// subdivision, which bounds the node count and the cost of every walk.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct QuadTreeConfig {
    /// Entries a leaf holds before it subdivides. Values below 1 are treated as 1.
    pub capacity: usize,
    /// Deepest level a node may be created at; the root is at depth 0.
    pub max_depth: u32,
}

impl QuadTreeConfig {
    /// Default leaf capacity.
    pub const DEFAULT_CAPACITY: usize = 1;
    /// Default depth ceiling.
    pub const DEFAULT_MAX_DEPTH: u32 = 10;

    /// Create the default configuration.
    pub const fn new() -> Self {
        Self {
            capacity: Self::DEFAULT_CAPACITY,
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }

    /// Set the leaf capacity.
    pub const fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the depth ceiling.
    pub const fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// The capacity actually enforced by the tree.
    pub(crate) const fn effective_capacity(&self) -> usize {
        if self.capacity == 0 { 1 } else { self.capacity }
    }
}

impl Default for QuadTreeConfig {
    fn default() -> Self {
        Self::new()
    }
}
