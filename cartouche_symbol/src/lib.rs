// Copyright 2025 the Cartouche Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cartouche Symbol: the data model the placement engine operates on.
//!
//! Symbol layers arrive from the style and tile workers already shaped: each
//! tile carries buckets of [`SymbolInstance`]s with their glyph quad counts,
//! collision geometry indices into the tile's pool, and placed-symbol rows
//! staged for the GPU. This crate owns those containers plus the small pieces
//! of geometry the dynamic-anchor search needs:
//!
//! - [`SymbolLayout`] and friends: the layer option keys, typed once at
//!   ingest so the placement core never branches on strings.
//! - Anchor helpers: [`anchor_justification`], [`anchor_alignment`],
//!   [`dynamic_offset`], [`shift_dynamic_collision_box`].
//! - [`SymbolBucket`] / [`SymbolInstance`] / [`SymbolBuffers`]: per-tile
//!   containers with opacity and collision-debug vertex staging.
//! - [`Tile`] and [`FeatureIndex`]: the host-side containers placement reads
//!   buckets from and pins query metadata of.

mod anchor;
mod bucket;
mod layout;
mod tile;

pub use anchor::{
    AUTO_ANCHORS, ONE_EM, anchor_alignment, anchor_justification, dynamic_offset,
    shift_dynamic_collision_box, text_box_scale,
};
pub use bucket::{
    CollisionArrays, CollisionDebug, CollisionDebugArray, CollisionDebugVertex, PlacedSymbol,
    SymbolBucket, SymbolBuffers, SymbolInstance,
};
pub use layout::{AlignmentMode, AnchorOption, SymbolLayer, SymbolLayout, TextAnchor, TextJustify};
pub use tile::{FeatureIndex, Tile};
