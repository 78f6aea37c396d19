// Copyright 2025 the Cartouche Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cartouche Placement: the per-frame symbol placement engine.
//!
//! Once per frame commit the renderer builds a [`Placement`] against the
//! current view, runs every visible (symbol layer, tile) pair through
//! [`Placement::place_layer_tile`], merges the outcome with the previous
//! frame's fade state in [`Placement::commit`], and writes the resulting
//! opacities and shifts into each bucket's staging arrays with
//! [`Placement::update_layer_opacities`]. The previous placement is then
//! discarded.
//!
//! Placement is greedy and insertion-order dependent: within a tile, symbol
//! instances are considered in stored order; across tiles, in the order the
//! caller iterates them. An accepted candidate inserts its screen-space
//! footprint into the pass's [`CollisionIndex`](cartouche_collision::CollisionIndex)
//! and blocks everything that follows, subject to the cross-source collision
//! policy managed by [`CollisionGroups`].
//!
//! Placement decisions and fade state are keyed by `crossTileID`, the stable
//! identity a cross-tile index assigns to the same logical label across
//! tiles of different zooms. That is what lets a label fade smoothly while
//! the tile pyramid underneath it reloads: the new tile's instance inherits
//! the old opacity because it carries the same id.
//!
//! ## Fades
//!
//! Rendering opacity is decoupled from the placement decision:
//! [`OpacityState`] remembers both, and [`Placement::commit`] advances the
//! scalar toward the decision at a rate set by the configured fade duration.
//! A symbol that just lost its slot keeps an entry in the opacity map until
//! it finishes fading out; a symbol accepted inside the viewport padding
//! band skips its fade-in entirely so panning reveals it fully opaque.

mod groups;
mod opacity;
mod placement;

pub use groups::{CollisionGroup, CollisionGroups};
pub use opacity::{JointOpacityState, JointPlacement, OpacityState, pack_opacity};
pub use placement::{DynamicOffsets, Placement, RetainedQueryData};
