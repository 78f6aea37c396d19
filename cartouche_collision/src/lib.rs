// Copyright 2025 the Cartouche Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cartouche Collision: the screen-space acceptor for symbol placement.
//!
//! Placement is a greedy mutual-exclusion process: candidates are projected
//! to screen space, tested against everything accepted so far, and inserted
//! if they survive. This crate provides the two layers of that process:
//!
//! - [`GridIndex`]: a uniform cell grid over the padded viewport storing
//!   accepted boxes and circles, with early-exit hit tests filtered by
//!   collision group.
//! - [`CollisionIndex`]: the per-frame acceptor. It owns two grids (blocking
//!   entries and ignore-placement entries), projects tile-space
//!   [`CollisionBox`]es and [`CollisionCircle`]s through the tile's position
//!   matrix, and reports whether an accepted candidate is offscreen (inside
//!   the padding band but outside the viewport), so the caller can skip the
//!   fade-in when a pan later reveals it.
//!
//! Tile-space inputs live in pools ([`CollisionBoxArray`]) owned by tiles;
//! buckets address them by index and materialize per-instance copies.
//!
//! Group filtering follows the cross-source-collision policy: a query
//! carries a [`GroupFilter`], where `None` treats every prior entry as an
//! obstruction and `Some(g)` only entries tagged with the same group.

mod grid;
mod index;
mod types;

pub use grid::GridIndex;
pub use index::{CollisionIndex, PlacedBox, PlacedCircles, VIEWPORT_PADDING};
pub use types::{CollisionBox, CollisionBoxArray, CollisionCircle, EntryKey, GroupFilter};
