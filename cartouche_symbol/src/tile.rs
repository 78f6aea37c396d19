// Copyright 2025 the Cartouche Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host-side tile containers the placement engine reads.

use std::sync::Arc;

use hashbrown::HashMap;

use cartouche_collision::CollisionBoxArray;
use cartouche_view::OverscaledTileId;

use crate::bucket::SymbolBucket;

/// Pinned per-tile metadata used to answer hit queries after rendering.
///
/// The placement holds an `Arc` to this for every bucket it places, keeping
/// the tile's query metadata alive for as long as the placement itself, even
/// if the source cache evicts the tile mid-frame.
#[derive(Clone, Debug)]
pub struct FeatureIndex {
    /// Tile the metadata was built from.
    pub tile_id: OverscaledTileId,
    /// Names of the source layers present in the tile, addressed by
    /// `source_layer_index`.
    pub source_layer_names: Vec<String>,
}

/// A loaded tile as the placement engine sees it.
#[derive(Clone, Debug)]
pub struct Tile {
    /// The tile's address in the pyramid.
    pub tile_id: OverscaledTileId,
    /// Rendered size of the tile in CSS pixels.
    pub tile_size: f64,
    /// Pool of collision geometry shared by the tile's buckets.
    pub collision_box_array: CollisionBoxArray,
    /// Query metadata for the tile's current data.
    pub latest_feature_index: Arc<FeatureIndex>,
    /// Whether the tile is kept around only until its replacement finishes
    /// fading in. Held tiles get no new placements.
    pub holding_for_fade: bool,
    buckets: HashMap<String, SymbolBucket>,
}

impl Tile {
    /// Creates an empty tile.
    #[must_use]
    pub fn new(tile_id: OverscaledTileId, tile_size: f64) -> Self {
        Self {
            tile_id,
            tile_size,
            collision_box_array: CollisionBoxArray::default(),
            latest_feature_index: Arc::new(FeatureIndex {
                tile_id,
                source_layer_names: Vec::new(),
            }),
            holding_for_fade: false,
            buckets: HashMap::new(),
        }
    }

    /// Registers a bucket under its layer id, replacing any previous one.
    pub fn add_bucket(&mut self, bucket: SymbolBucket) {
        self.buckets.insert(bucket.layer_id.clone(), bucket);
    }

    /// The bucket registered for `layer_id`, if any.
    #[must_use]
    pub fn bucket(&self, layer_id: &str) -> Option<&SymbolBucket> {
        self.buckets.get(layer_id)
    }

    /// Mutable access to the bucket registered for `layer_id`.
    pub fn bucket_mut(&mut self, layer_id: &str) -> Option<&mut SymbolBucket> {
        self.buckets.get_mut(layer_id)
    }

    /// Splits the borrow so a bucket can be mutated while reading the tile's
    /// collision pool.
    pub fn bucket_and_pool_mut(
        &mut self,
        layer_id: &str,
    ) -> Option<(&mut SymbolBucket, &CollisionBoxArray)> {
        let Self {
            buckets,
            collision_box_array,
            ..
        } = self;
        buckets
            .get_mut(layer_id)
            .map(|bucket| (bucket, &*collision_box_array))
    }
}
