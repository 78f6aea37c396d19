// Copyright 2025 the Cartouche Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for a full place → commit → update frame over synthetic tiles.
//!
//! The synthetic bucket approximates a dense label layer: a grid of point
//! labels whose boxes overlap their neighbors, so roughly half the
//! candidates are rejected by the collision index.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use hashbrown::HashSet;
use kurbo::Point;

use cartouche_collision::{CollisionBox, CollisionBoxArray};
use cartouche_placement::Placement;
use cartouche_symbol::{SymbolBucket, SymbolInstance, SymbolLayer, SymbolLayout, Tile};
use cartouche_view::{CanonicalTileId, EXTENT, OverscaledTileId, Transform};

const TILE_SIZE: f64 = 512.0;

fn tile_units(px: f64) -> f64 {
    px * EXTENT / TILE_SIZE
}

fn synthetic_tile(label_count: usize) -> Tile {
    let tile_id = OverscaledTileId::new(0, 0, CanonicalTileId::new(0, 0, 0));
    let mut tile = Tile::new(tile_id, TILE_SIZE);
    let mut bucket = SymbolBucket::new(1, "labels", "composite", SymbolLayout::default());
    let mut pool = CollisionBoxArray::default();

    let columns = (label_count as f64).sqrt().ceil() as usize;
    for i in 0..label_count {
        let x = 16.0 + 24.0 * (i % columns) as f64;
        let y = 16.0 + 24.0 * (i / columns) as f64;
        let anchor = Point::new(tile_units(x), tile_units(y));
        let box_index = pool.push_box(CollisionBox {
            anchor,
            x1: -tile_units(16.0),
            y1: -tile_units(8.0),
            x2: tile_units(16.0),
            y2: tile_units(8.0),
            feature_index: i as u32,
        });
        bucket.symbol_instances.push(SymbolInstance {
            cross_tile_id: i as u64 + 1,
            anchor,
            feature_index: i as u32,
            num_horizontal_glyph_vertices: 32,
            num_vertical_glyph_vertices: 0,
            num_icon_vertices: 0,
            right_justified_text_index: None,
            center_justified_text_index: None,
            left_justified_text_index: None,
            vertical_text_index: None,
            icon_index: None,
            text_box: Some(box_index),
            icon_box: None,
            text_circles: 0..0,
            text_box_scale: tile_units(1.0),
        });
    }
    bucket.text.layout_vertex_len = label_count * 32;
    tile.collision_box_array = pool;
    tile.add_bucket(bucket);
    tile
}

fn bench_frame(c: &mut Criterion) {
    let transform = Transform::new(512.0, 512.0);
    let layer = SymbolLayer::new("labels", SymbolLayout::default());

    let mut group = c.benchmark_group("placement_frame");
    for label_count in [100, 1000, 5000] {
        let mut tile = synthetic_tile(label_count);
        let mut prev: Option<Placement> = None;
        group.bench_with_input(
            BenchmarkId::from_parameter(label_count),
            &label_count,
            |b, _| {
                b.iter(|| {
                    let mut placement = Placement::new(&transform, 300.0, true);
                    let mut seen = HashSet::new();
                    placement.place_layer_tile(&layer, &mut tile, false, &mut seen);
                    placement.commit(prev.as_ref(), 16.0);
                    placement.update_layer_opacities(&layer, [&mut tile]);
                    prev = Some(placement);
                    black_box(&mut tile);
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_frame);
criterion_main!(benches);
