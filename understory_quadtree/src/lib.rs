// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_quadtree --heading-base-level=0

//! Understory Quadtree: a region-subdividing 2D point index.
//!
//! Understory Quadtree stores point-tagged elements inside a fixed bounding box
//! and answers point, rectangle, and nearest-neighbor queries without scanning
//! every element.
//!
//! - Insert `(element, point)` entries; full leaves split into four quadrants
//!   up to a configurable depth.
//! - Remove elements by handle equality or by any caller-supplied identity test;
//!   emptied quadrants collapse back into their parent.
//! - Query the leaf owning a point, every element inside a rectangle, or the
//!   nearest element (optionally filtered by a predicate).
//! - Walk the node structure read-only, e.g. to draw a debug overlay.
//!
//! Coordinates are [`kurbo::Point`]s; [`BoundingBox`] converts to and from
//! [`kurbo::Rect`].
//!
//! # Example
//!
//! ```rust
//! use kurbo::Point;
//! use understory_quadtree::{BoundingBox, QuadTree, QuadTreeConfig};
//!
//! let bounds = BoundingBox::new(Point::new(0.0, 0.0), Point::new(100.0, 100.0));
//! let mut tree = QuadTree::with_config(bounds, QuadTreeConfig::new().with_capacity(1));
//!
//! tree.insert("north-east", Point::new(90.0, 90.0)).unwrap();
//! tree.insert("south-west", Point::new(10.0, 10.0)).unwrap();
//!
//! // Rectangle query: only points inside the lower-left quarter.
//! let lower_left = BoundingBox::new(Point::new(0.0, 0.0), Point::new(50.0, 50.0));
//! let hits: Vec<_> = tree.elements_in(lower_left).collect();
//! assert_eq!(hits, [&"south-west"]);
//!
//! // Nearest neighbor, with the distance.
//! let n = tree.nearest_neighbor(Point::new(0.0, 0.0), |_| true).unwrap();
//! assert_eq!(*n.element, "south-west");
//! assert!((n.distance - 200_f64.sqrt()).abs() < 1e-12);
//! ```
//!
//! ## Insert failures
//!
//! [`QuadTree::insert`] reports an [`InsertError`] instead of storing the entry when:
//!
//! - the point is outside the root bounds,
//! - the target cell is full and already holds `capacity` entries at exactly
//!   that point (this keeps duplicate coordinates from splitting forever), or
//! - the target cell is full at [`QuadTreeConfig::max_depth`].
//!
//! ## Boundary points
//!
//! A split produces four closed boxes that share their edges. A point on a
//! shared edge belongs to the first quadrant containing it, in NW, NE, SW, SE
//! order (see [`BoundingBox::quadrant`]), so every point has exactly one leaf.
//!
//! ## Features
//!
//! - `std` *(default)*: enables `std` support for `kurbo`.
//! - `libm`: enables `no_std` + `alloc` builds that rely on `libm` for floating-point math.
//! - `serde`: `Serialize`/`Deserialize` for [`BoundingBox`] and [`QuadTreeConfig`].
//!
//! ## Diagnostics
//!
//! Subdivisions and collapses are reported at `trace` level and rejected
//! inserts at `debug` level through [`tracing`]. Install a subscriber in the
//! host application to see them.
//!
//! ### Float semantics
//!
//! Coordinates are expected to be finite. A point with a NaN coordinate is
//! outside every box, so it cannot be inserted and matches no query.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod config;
mod error;
mod node;
mod query;
mod tree;
mod types;

pub use config::QuadTreeConfig;
pub use error::InsertError;
pub use kurbo::Point;
pub use node::NodeId;
pub use query::{Cell, Neighbor};
pub use tree::QuadTree;
pub use types::{BoundingBox, Quadrant};
