// Copyright 2025 the Cartouche Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tile-space collision geometry and grid entry tags.

use core::ops::Range;

use kurbo::Point;

/// Collision-group filter attached to a query.
///
/// `None` means every prior entry counts as an obstruction (cross-source
/// collisions enabled); `Some(g)` restricts obstructions to entries tagged
/// with group `g`.
pub type GroupFilter = Option<u16>;

/// Identity stored with every grid entry, echoed back by hit queries.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct EntryKey {
    /// Bucket the entry's symbol belongs to. Non-zero.
    pub bucket_instance_id: u32,
    /// Feature the entry's symbol was generated from.
    pub feature_index: u32,
    /// Collision group of the symbol's source.
    pub group: u16,
}

impl EntryKey {
    pub(crate) fn matches(&self, filter: GroupFilter) -> bool {
        filter.is_none_or(|group| self.group == group)
    }
}

/// Axis-aligned collision box in tile units, relative to its anchor.
///
/// The extents grow rightward/downward from the anchor: an unshifted box
/// spans `[0, width] × [0, height]`, and alignment shifts move it so the
/// anchor names the corner or edge the label hangs from.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CollisionBox {
    /// Anchor point in tile units.
    pub anchor: Point,
    /// Left edge offset from the anchor.
    pub x1: f64,
    /// Top edge offset from the anchor.
    pub y1: f64,
    /// Right edge offset from the anchor.
    pub x2: f64,
    /// Bottom edge offset from the anchor.
    pub y2: f64,
    /// Feature the box was generated from.
    pub feature_index: u32,
}

/// One circle of an along-line label's collision footprint, in tile units.
///
/// `used` is written by circle placement: circles that fall outside the
/// padded viewport are excluded from the query and flagged unused so the
/// collision-debug overlay can dim them.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CollisionCircle {
    /// Center in tile units.
    pub center: Point,
    /// Radius in tile units.
    pub radius: f64,
    /// Whether the circle participated in the last placement query.
    pub used: bool,
}

impl CollisionCircle {
    /// Creates a circle; fresh circles start out unused.
    #[must_use]
    pub fn new(center: Point, radius: f64) -> Self {
        Self {
            center,
            radius,
            used: false,
        }
    }
}

/// Per-tile pool of collision geometry.
///
/// Buckets address boxes by index and circles by range; the pool itself is
/// immutable once the tile's worker hands it over.
#[derive(Clone, Debug, Default)]
pub struct CollisionBoxArray {
    boxes: Vec<CollisionBox>,
    circles: Vec<CollisionCircle>,
}

impl CollisionBoxArray {
    /// Appends a box and returns its index.
    pub fn push_box(&mut self, collision_box: CollisionBox) -> usize {
        self.boxes.push(collision_box);
        self.boxes.len() - 1
    }

    /// Appends a run of circles and returns the occupied range.
    pub fn push_circles(
        &mut self,
        circles: impl IntoIterator<Item = CollisionCircle>,
    ) -> Range<usize> {
        let start = self.circles.len();
        self.circles.extend(circles);
        start..self.circles.len()
    }

    /// The box at `index`, if present.
    #[must_use]
    pub fn box_at(&self, index: usize) -> Option<&CollisionBox> {
        self.boxes.get(index)
    }

    /// The circles covering `range`; empty if the range is out of bounds.
    #[must_use]
    pub fn circles_in(&self, range: Range<usize>) -> &[CollisionCircle] {
        self.circles.get(range).unwrap_or(&[])
    }
}
