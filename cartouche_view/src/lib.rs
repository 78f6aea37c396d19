// Copyright 2025 the Cartouche Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cartouche View: view transform and tile coordinates for the symbol pipeline.
//!
//! This crate carries the camera-side vocabulary that the placement engine
//! consumes each frame:
//!
//! - [`Transform`]: cloneable view state (viewport, zoom, bearing, pitch)
//!   producing clip-space tile position matrices.
//! - [`CanonicalTileId`] / [`UnwrappedTileId`] / [`OverscaledTileId`]: tile
//!   pyramid coordinates, including world copies and overscale.
//! - [`label_plane_matrix`] and [`pixels_to_tile_units`]: the matrix and unit
//!   conversions that pick the plane labels are laid out in, controlled by the
//!   pitch/rotation alignment options of a symbol layer.
//!
//! Coordinate conventions: world space is measured in pixels at the current
//! zoom (`world_size = 512 · 2^zoom`), screen space is y-down CSS pixels with
//! the origin at the top-left of the viewport, and tile space runs
//! `[0, EXTENT]` across one tile regardless of zoom.

mod tile;
mod transform;

pub use tile::{CanonicalTileId, EXTENT, OverscaledTileId, UnwrappedTileId};
pub use transform::{BASE_TILE_SIZE, Transform, label_plane_matrix, pixels_to_tile_units};
