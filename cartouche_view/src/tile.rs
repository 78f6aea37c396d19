// Copyright 2025 the Cartouche Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tile pyramid coordinates.

/// Size of one tile in its own coordinate system. Collision boxes, circles,
/// and symbol anchors are all stored in these units.
pub const EXTENT: f64 = 8192.0;

/// Canonical tile address: zoom level plus x/y within the pyramid row.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct CanonicalTileId {
    /// Zoom level of the pyramid row.
    pub z: u8,
    /// Column, in `0..2^z`.
    pub x: u32,
    /// Row, in `0..2^z`.
    pub y: u32,
}

impl CanonicalTileId {
    /// Creates a canonical tile id.
    ///
    /// Debug-asserts that `x` and `y` are within the pyramid row.
    #[must_use]
    pub fn new(z: u8, x: u32, y: u32) -> Self {
        debug_assert!(u64::from(x) < 1u64 << z && u64::from(y) < 1u64 << z);
        Self { z, x, y }
    }
}

/// A canonical tile plus the world copy it is rendered in.
///
/// `wrap` counts whole-world offsets east (positive) or west (negative) of
/// the primary copy; it matters once the viewport spans the antimeridian.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct UnwrappedTileId {
    /// World copy index.
    pub wrap: i32,
    /// The underlying canonical address.
    pub canonical: CanonicalTileId,
}

/// A tile as held by the source cache: canonical address, world copy, and the
/// zoom it is overscaled to when rendered past its native zoom.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct OverscaledTileId {
    /// The zoom the tile's data is rendered at; `>= canonical.z`.
    pub overscaled_z: u8,
    /// World copy index.
    pub wrap: i32,
    /// The underlying canonical address.
    pub canonical: CanonicalTileId,
}

impl OverscaledTileId {
    /// Creates an overscaled tile id. Debug-asserts `overscaled_z >= z`.
    #[must_use]
    pub fn new(overscaled_z: u8, wrap: i32, canonical: CanonicalTileId) -> Self {
        debug_assert!(overscaled_z >= canonical.z);
        Self {
            overscaled_z,
            wrap,
            canonical,
        }
    }

    /// The unwrapped address used for positioning, dropping the overscale.
    #[must_use]
    pub fn to_unwrapped(self) -> UnwrappedTileId {
        UnwrappedTileId {
            wrap: self.wrap,
            canonical: self.canonical,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwrapping_drops_overscale_and_keeps_wrap() {
        let id = OverscaledTileId::new(7, -1, CanonicalTileId::new(5, 11, 9));
        let unwrapped = id.to_unwrapped();
        assert_eq!(unwrapped.wrap, -1);
        assert_eq!(unwrapped.canonical, CanonicalTileId::new(5, 11, 9));
    }
}
