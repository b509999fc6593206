// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Primitive geometry types: the bounding box and the quadrant naming.

use kurbo::{Point, Rect};

/// One of the four children of a subdivided cell.
///
/// The declaration order (NW, NE, SW, SE) is the fixed order used for
/// subdivision, traversal, and child probing everywhere in this crate.
/// "North" is the half with the larger y coordinates.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Quadrant {
    /// Low x, high y.
    NorthWest,
    /// High x, high y.
    NorthEast,
    /// Low x, low y.
    SouthWest,
    /// High x, low y.
    SouthEast,
}

impl Quadrant {
    /// All quadrants in traversal order.
    pub const ALL: [Self; 4] = [
        Self::NorthWest,
        Self::NorthEast,
        Self::SouthWest,
        Self::SouthEast,
    ];

    /// Position of this quadrant in [`Quadrant::ALL`] and in child arrays.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Self::NorthWest => 0,
            Self::NorthEast => 1,
            Self::SouthWest => 2,
            Self::SouthEast => 3,
        }
    }
}

/// Axis-aligned bounding box in 2D, defined by its two extreme corners.
///
/// Both bounds are closed: a point lying exactly on an edge is inside.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundingBox {
    /// Corner with the smallest coordinates.
    pub min: Point,
    /// Corner with the largest coordinates.
    pub max: Point,
}

impl BoundingBox {
    /// Create a box from its min/max corners.
    ///
    /// The caller is responsible for `min.x <= max.x` and `min.y <= max.y`;
    /// debug builds assert it. Use [`BoundingBox::from_corners`] when the
    /// corner order is not known.
    #[inline]
    pub fn new(min: Point, max: Point) -> Self {
        debug_assert!(
            min.x <= max.x && min.y <= max.y,
            "bounding box corners are inverted: min {min:?}, max {max:?}"
        );
        Self { min, max }
    }

    /// Create the box spanned by two arbitrary corners.
    #[inline]
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            min: Point::new(a.x.min(b.x), a.y.min(b.y)),
            max: Point::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// Create a box from a [`Rect`], whatever its orientation.
    #[inline]
    pub fn from_rect(rect: Rect) -> Self {
        Self::from_corners(rect.origin(), Point::new(rect.x1, rect.y1))
    }

    /// The same box as a [`Rect`], e.g. for rendering.
    #[inline]
    pub fn to_rect(self) -> Rect {
        Rect::from_points(self.min, self.max)
    }

    /// Horizontal extent.
    #[inline]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Vertical extent.
    #[inline]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Midpoint of the box; the split point used by subdivision.
    #[inline]
    pub fn center(&self) -> Point {
        self.min.midpoint(self.max)
    }

    /// Whether the point lies inside the box, edges included.
    #[inline]
    pub fn contains(&self, point: Point) -> bool {
        self.min.x <= point.x
            && point.x <= self.max.x
            && self.min.y <= point.y
            && point.y <= self.max.y
    }

    /// Whether the two boxes overlap. Boxes sharing only an edge or a corner
    /// are considered to intersect.
    ///
    /// # Examples
    ///
    /// ```
    /// use kurbo::Point;
    /// use understory_quadtree::BoundingBox;
    ///
    /// let a = BoundingBox::new(Point::new(0.0, 0.0), Point::new(10.0, 10.0));
    /// let b = BoundingBox::new(Point::new(10.0, 0.0), Point::new(20.0, 10.0));
    /// let c = BoundingBox::new(Point::new(11.0, 0.0), Point::new(20.0, 10.0));
    /// assert!(a.intersects(&b));
    /// assert!(!a.intersects(&c));
    /// ```
    #[inline]
    pub fn intersects(&self, other: &Self) -> bool {
        !(self.min.x > other.max.x
            || self.min.y > other.max.y
            || self.max.x < other.min.x
            || self.max.y < other.min.y)
    }

    /// Split the box at its center into four children, in
    /// [`Quadrant::ALL`] order.
    ///
    /// Neighbouring children share their common edge; [`BoundingBox::quadrant`]
    /// decides which one owns a point on it.
    pub fn split(&self) -> [Self; 4] {
        let mid = self.center();
        [
            Self::new(Point::new(self.min.x, mid.y), Point::new(mid.x, self.max.y)),
            Self::new(mid, self.max),
            Self::new(self.min, mid),
            Self::new(Point::new(mid.x, self.min.y), Point::new(self.max.x, mid.y)),
        ]
    }

    /// The child of [`BoundingBox::split`] that owns `point`.
    ///
    /// This is the first child, in [`Quadrant::ALL`] order, whose box contains
    /// the point: points on the vertical split line go west and points on the
    /// horizontal split line go north. Every point of the box maps to exactly
    /// one child. Points outside the box are still assigned to the nearest
    /// half on each axis.
    #[inline]
    pub fn quadrant(&self, point: Point) -> Quadrant {
        let mid = self.center();
        match (point.x <= mid.x, point.y >= mid.y) {
            (true, true) => Quadrant::NorthWest,
            (false, true) => Quadrant::NorthEast,
            (true, false) => Quadrant::SouthWest,
            (false, false) => Quadrant::SouthEast,
        }
    }

    /// Whether the box lies farther than `radius` from `point` along either
    /// axis.
    ///
    /// This is the cheap rejection used by nearest-neighbor search. It never
    /// rejects a box holding a point within `radius`, but it keeps some boxes
    /// that only come within `radius` on each axis separately.
    #[inline]
    pub fn excludes_within(&self, point: Point, radius: f64) -> bool {
        point.x - radius > self.max.x
            || point.y + radius < self.min.y
            || point.x + radius < self.min.x
            || point.y - radius > self.max.y
    }
}

impl From<Rect> for BoundingBox {
    fn from(rect: Rect) -> Self {
        Self::from_rect(rect)
    }
}

impl From<BoundingBox> for Rect {
    fn from(bounds: BoundingBox) -> Self {
        bounds.to_rect()
    }
}
