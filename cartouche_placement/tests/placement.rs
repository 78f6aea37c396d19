// Copyright 2025 the Cartouche Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end placement scenarios: place → commit → update over real tiles.

use hashbrown::HashSet;
use kurbo::Point;

use cartouche_collision::{CollisionBox, CollisionBoxArray, CollisionCircle};
use cartouche_placement::{JointPlacement, OpacityState, Placement, pack_opacity};
use cartouche_symbol::{
    AnchorOption, CollisionDebug, PlacedSymbol, SymbolBucket, SymbolInstance, SymbolLayer,
    SymbolLayout, Tile, text_box_scale,
};
use cartouche_view::{CanonicalTileId, EXTENT, OverscaledTileId, Transform};

// All scenarios run over a 512 px viewport showing a single z0 tile, so one
// CSS pixel is EXTENT / 512 tile units and world pixels equal screen pixels.
const TILE_SIZE: f64 = 512.0;

fn tile_units(px: f64) -> f64 {
    px * EXTENT / TILE_SIZE
}

fn transform() -> Transform {
    Transform::new(512.0, 512.0)
}

fn instance(cross_tile_id: u64, anchor_px: Point) -> SymbolInstance {
    SymbolInstance {
        cross_tile_id,
        anchor: Point::new(tile_units(anchor_px.x), tile_units(anchor_px.y)),
        feature_index: 0,
        num_horizontal_glyph_vertices: 8,
        num_vertical_glyph_vertices: 0,
        num_icon_vertices: 0,
        right_justified_text_index: None,
        center_justified_text_index: None,
        left_justified_text_index: None,
        vertical_text_index: None,
        icon_index: None,
        text_box: None,
        icon_box: None,
        text_circles: 0..0,
        text_box_scale: text_box_scale(tile_units(1.0), 24.0),
    }
}

fn centered_box(pool: &mut CollisionBoxArray, center_px: Point, half_px: f64) -> usize {
    pool.push_box(CollisionBox {
        anchor: Point::new(tile_units(center_px.x), tile_units(center_px.y)),
        x1: -tile_units(half_px),
        y1: -tile_units(half_px),
        x2: tile_units(half_px),
        y2: tile_units(half_px),
        feature_index: 0,
    })
}

fn make_tile(
    layout: SymbolLayout,
    source_id: &str,
    bucket_instance_id: u32,
    build: impl FnOnce(&mut CollisionBoxArray, &mut SymbolBucket),
) -> Tile {
    let tile_id = OverscaledTileId::new(0, 0, CanonicalTileId::new(0, 0, 0));
    let mut tile = Tile::new(tile_id, TILE_SIZE);
    let mut bucket = SymbolBucket::new(bucket_instance_id, "labels", source_id, layout);
    let mut pool = CollisionBoxArray::default();
    build(&mut pool, &mut bucket);
    bucket.text.layout_vertex_len = bucket
        .symbol_instances
        .iter()
        .map(|i| i.num_horizontal_glyph_vertices + i.num_vertical_glyph_vertices)
        .sum();
    bucket.icon.layout_vertex_len = bucket
        .symbol_instances
        .iter()
        .map(|i| i.num_icon_vertices)
        .sum();
    tile.collision_box_array = pool;
    tile.add_bucket(bucket);
    tile
}

fn run_frame(
    prev: Option<&Placement>,
    now: f64,
    layer: &SymbolLayer,
    tiles: &mut [Tile],
    fade_duration: f64,
    cross_source_collisions: bool,
) -> Placement {
    let mut placement = Placement::new(&transform(), fade_duration, cross_source_collisions);
    let mut seen = HashSet::new();
    for tile in tiles.iter_mut() {
        placement.place_layer_tile(layer, tile, false, &mut seen);
    }
    placement.commit(prev, now);
    placement.update_layer_opacities(layer, tiles.iter_mut());
    placement
}

fn bucket<'a>(tile: &'a Tile, layer: &SymbolLayer) -> &'a SymbolBucket {
    tile.bucket(&layer.id).expect("bucket")
}

#[test]
fn fade_in_from_scratch() {
    let layer = SymbolLayer::new("labels", SymbolLayout::default());
    let mut tiles = vec![make_tile(layer.layout.clone(), "composite", 1, |pool, bucket| {
        let text_box = centered_box(pool, Point::new(256.0, 256.0), 10.0);
        let mut first = instance(7, Point::new(256.0, 256.0));
        first.text_box = Some(text_box);
        bucket.symbol_instances.push(first);
    })];

    let p0 = run_frame(None, 0.0, &layer, &mut tiles, 300.0, true);
    assert_eq!(p0.placement(7), Some(&JointPlacement::new(true, false, false)));
    assert_eq!(
        p0.opacity_state(7).unwrap().text,
        OpacityState {
            opacity: 0.0,
            placed: true
        }
    );

    let p1 = run_frame(Some(&p0), 150.0, &layer, &mut tiles, 300.0, true);
    assert_eq!(
        p1.opacity_state(7).unwrap().text,
        OpacityState {
            opacity: 0.5,
            placed: true
        }
    );

    let p2 = run_frame(Some(&p1), 300.0, &layer, &mut tiles, 300.0, true);
    assert_eq!(
        p2.opacity_state(7).unwrap().text,
        OpacityState {
            opacity: 1.0,
            placed: true
        }
    );

    // The staged opacity covers one packed word per quad.
    let placed_bucket = bucket(&tiles[0], &layer);
    assert_eq!(
        placed_bucket.text.opacity_vertices.len() * 4,
        placed_bucket.text.layout_vertex_len
    );
}

#[test]
fn fade_out_carries_until_hidden() {
    let layer = SymbolLayer::new("labels", SymbolLayout::default());
    let mut tiles = vec![make_tile(layer.layout.clone(), "composite", 1, |pool, bucket| {
        let text_box = centered_box(pool, Point::new(256.0, 256.0), 10.0);
        let mut first = instance(7, Point::new(256.0, 256.0));
        first.text_box = Some(text_box);
        bucket.symbol_instances.push(first);
    })];
    let mut empty = vec![make_tile(layer.layout.clone(), "composite", 2, |_, _| {})];

    let p0 = run_frame(None, 0.0, &layer, &mut tiles, 300.0, true);
    let p1 = run_frame(Some(&p0), 300.0, &layer, &mut tiles, 300.0, true);
    assert_eq!(p1.opacity_state(7).unwrap().text.opacity, 1.0);

    // The symbol disappears from the pass; its opacity is carried and fades.
    let p2 = run_frame(Some(&p1), 450.0, &layer, &mut empty, 300.0, true);
    assert_eq!(p2.placement(7), None);
    assert_eq!(
        p2.opacity_state(7).unwrap().text,
        OpacityState {
            opacity: 0.5,
            placed: false
        }
    );

    // Fully faded out, the entry is dropped.
    let p3 = run_frame(Some(&p2), 750.0, &layer, &mut empty, 300.0, true);
    assert_eq!(p3.opacity_state(7), None);
}

#[test]
fn dynamic_anchor_retries_past_an_obstruction() {
    let layout = SymbolLayout {
        dynamic_text_anchor: Some(vec![AnchorOption::Auto]),
        dynamic_text_offset: 6.0,
        ..SymbolLayout::default()
    };
    let layer = SymbolLayer::new("labels", layout.clone());

    let mut tiles = vec![make_tile(layout, "composite", 1, |pool, bucket| {
        // An earlier label claims the anchor's surroundings; its centered
        // 8 px box lands in the top-left quadrant once the center alignment
        // shift applies.
        let blocker_box = centered_box(pool, Point::new(256.0, 256.0), 4.0);
        let mut blocker = instance(1, Point::new(256.0, 256.0));
        blocker.text_box = Some(blocker_box);
        blocker.center_justified_text_index = Some(3);
        bucket.symbol_instances.push(blocker);

        // The dynamic label: a 10 px square box hanging right/down from its
        // anchor, with all three justification rows.
        let label_box = pool.push_box(CollisionBox {
            anchor: Point::new(tile_units(256.0), tile_units(256.0)),
            x1: 0.0,
            y1: 0.0,
            x2: tile_units(10.0),
            y2: tile_units(10.0),
            feature_index: 0,
        });
        let mut label = instance(2, Point::new(256.0, 256.0));
        label.text_box = Some(label_box);
        label.right_justified_text_index = Some(0);
        label.center_justified_text_index = Some(1);
        label.left_justified_text_index = Some(2);
        bucket.symbol_instances.push(label);
        bucket.text.placed_symbols = vec![PlacedSymbol::default(); 4];
    })];

    let placement = run_frame(None, 0.0, &layer, &mut tiles, 300.0, true);
    assert_eq!(placement.placement(2).map(|p| p.text), Some(true));

    let placed_bucket = bucket(&tiles[0], &layer);
    // `center` collides with the blocker, `top` does not: the center-justified
    // row carries the alignment shift plus the radial offset, in ems.
    let center_row = placed_bucket.text.placed_symbols[1];
    assert_eq!(center_row.shift.y, 6.0);
    assert_eq!(center_row.shift.x, -5.0);
    // The sibling justifications are culled off-screen.
    assert!(placed_bucket.text.placed_symbols[0].shift.x.is_infinite());
    assert!(placed_bucket.text.placed_symbols[2].shift.x.is_infinite());

    // The chosen offsets are remembered per justification.
    let offsets = placement.dynamic_offsets(2).expect("memoized offsets");
    assert_eq!(offsets.center.map(|s| s.y), Some(6.0));
    assert_eq!(offsets.first_defined().map(|s| s.y), Some(6.0));
}

#[test]
fn separate_sources_do_not_exclude_each_other() {
    let layer = SymbolLayer::new("labels", SymbolLayout::default());
    let build = |cid: u64| {
        move |pool: &mut CollisionBoxArray, bucket: &mut SymbolBucket| {
            let text_box = centered_box(pool, Point::new(256.0, 256.0), 10.0);
            let mut first = instance(cid, Point::new(256.0, 256.0));
            first.text_box = Some(text_box);
            bucket.symbol_instances.push(first);
        }
    };
    let mut tiles = vec![
        make_tile(layer.layout.clone(), "a", 1, build(1)),
        make_tile(layer.layout.clone(), "b", 2, build(2)),
    ];

    // With cross-source collisions off, the overlapping symbols coexist.
    let placement = run_frame(None, 0.0, &layer, &mut tiles, 300.0, false);
    assert_eq!(placement.placement(1).map(|p| p.text), Some(true));
    assert_eq!(placement.placement(2).map(|p| p.text), Some(true));

    // With them on, the first tile's symbol wins.
    let placement = run_frame(None, 0.0, &layer, &mut tiles, 300.0, true);
    assert_eq!(placement.placement(1).map(|p| p.text), Some(true));
    assert_eq!(placement.placement(2).map(|p| p.text), Some(false));
}

#[test]
fn always_show_overrides_an_out_of_grid_box() {
    let layout = SymbolLayout {
        text_allow_overlap: true,
        icon_optional: true,
        ..SymbolLayout::default()
    };
    let layer = SymbolLayer::new("labels", layout.clone());

    let mut tiles = vec![make_tile(layout, "composite", 1, |pool, bucket| {
        // Far outside even the padded grid.
        let text_box = centered_box(pool, Point::new(-500.0, 256.0), 10.0);
        let mut first = instance(7, Point::new(-500.0, 256.0));
        first.text_box = Some(text_box);
        bucket.symbol_instances.push(first);
    })];

    let placement = run_frame(None, 0.0, &layer, &mut tiles, 300.0, true);
    // Nothing was inserted into the collision index…
    assert_eq!(placement.collision_index().grid().box_count(), 0);
    // …but the decision is forced visible by the overlap policy.
    assert_eq!(placement.placement(7).map(|p| p.text), Some(true));
}

#[test]
fn padding_band_skips_the_fade_in() {
    let layer = SymbolLayer::new("labels", SymbolLayout::default());
    let mut tiles = vec![make_tile(layer.layout.clone(), "composite", 1, |pool, bucket| {
        // 50 px left of the viewport: inside the padding band.
        let text_box = centered_box(pool, Point::new(-50.0, 256.0), 10.0);
        let mut first = instance(7, Point::new(-50.0, 256.0));
        first.text_box = Some(text_box);
        bucket.symbol_instances.push(first);
    })];

    let placement = run_frame(None, 0.0, &layer, &mut tiles, 300.0, true);
    let decision = placement.placement(7).expect("considered");
    assert!(decision.text);
    assert!(decision.skip_fade);
    // The first commit starts fully opaque: no fade-in on pan.
    assert_eq!(
        placement.opacity_state(7).unwrap().text,
        OpacityState {
            opacity: 1.0,
            placed: true
        }
    );
}

#[test]
fn greedy_order_prefers_earlier_instances() {
    let layer = SymbolLayer::new("labels", SymbolLayout::default());
    let mut tiles = vec![make_tile(layer.layout.clone(), "composite", 1, |pool, bucket| {
        for (cid, offset) in [(1u64, 0.0), (2u64, 6.0)] {
            let text_box = centered_box(pool, Point::new(256.0 + offset, 256.0), 10.0);
            let mut inst = instance(cid, Point::new(256.0 + offset, 256.0));
            inst.text_box = Some(text_box);
            bucket.symbol_instances.push(inst);
        }
    })];

    let placement = run_frame(None, 0.0, &layer, &mut tiles, 300.0, true);
    assert_eq!(placement.placement(1).map(|p| p.text), Some(true));
    assert_eq!(placement.placement(2).map(|p| p.text), Some(false));
}

#[test]
fn duplicate_in_a_second_tile_is_culled() {
    let layer = SymbolLayer::new("labels", SymbolLayout::default());
    let build = |pool: &mut CollisionBoxArray, bucket: &mut SymbolBucket| {
        let text_box = centered_box(pool, Point::new(256.0, 256.0), 10.0);
        let mut first = instance(7, Point::new(256.0, 256.0));
        first.text_box = Some(text_box);
        first.center_justified_text_index = Some(0);
        bucket.symbol_instances.push(first);
        bucket.text.placed_symbols = vec![PlacedSymbol::default(); 1];
    };
    let mut tiles = vec![
        make_tile(layer.layout.clone(), "composite", 1, build),
        make_tile(layer.layout.clone(), "composite", 2, build),
    ];

    let placement = run_frame(None, 0.0, &layer, &mut tiles, 300.0, true);
    let visible = bucket(&tiles[0], &layer);
    let duplicate = bucket(&tiles[1], &layer);

    // One visible entry, one hidden duplicate; together they cover both
    // occurrences.
    let state = placement.opacity_state(7).unwrap();
    assert_eq!(visible.text.opacity_vertices, vec![pack_opacity(state.text); 2]);
    assert_eq!(duplicate.text.opacity_vertices, vec![0, 0]);
    // The duplicate's rows are shifted off-screen for the GPU cull.
    assert!(duplicate.text.placed_symbols[0].shift.x == f64::NEG_INFINITY);
    assert!(duplicate.text.placed_symbols[0].shift.y == f64::NEG_INFINITY);
    assert!(visible.text.placed_symbols[0].shift.x.is_finite());
}

#[test]
fn overlap_forces_text_with_empty_circles() {
    let layout = SymbolLayout {
        text_allow_overlap: true,
        ..SymbolLayout::default()
    };
    let layer = SymbolLayer::new("labels", layout.clone());
    let mut tiles = vec![make_tile(layout, "composite", 1, |pool, bucket| {
        // Every circle of the line label falls outside the padded grid.
        let circles = pool.push_circles([CollisionCircle::new(
            Point::new(tile_units(-400.0), tile_units(256.0)),
            tile_units(5.0),
        )]);
        let mut lined = instance(7, Point::new(-400.0, 256.0));
        lined.text_circles = circles;
        bucket.symbol_instances.push(lined);

        // A second, icon-carrying instance keeps the bucket's icon data
        // non-empty so the overlap override cannot mask the circle quirk.
        let mut with_icon = instance(8, Point::new(256.0, 256.0));
        with_icon.num_icon_vertices = 4;
        bucket.symbol_instances.push(with_icon);
    })];

    let placement = run_frame(None, 0.0, &layer, &mut tiles, 300.0, true);
    // Nothing was inserted, yet the overlapping label counts as placed.
    assert_eq!(placement.collision_index().grid().circle_count(), 0);
    assert_eq!(placement.placement(7).map(|p| p.text), Some(true));
}

#[test]
fn update_is_idempotent() {
    let layout = SymbolLayout {
        dynamic_text_anchor: Some(vec![AnchorOption::Auto]),
        ..SymbolLayout::default()
    };
    let layer = SymbolLayer::new("labels", layout.clone());
    let mut tiles = vec![make_tile(layout, "composite", 1, |pool, bucket| {
        let label_box = pool.push_box(CollisionBox {
            anchor: Point::new(tile_units(256.0), tile_units(256.0)),
            x1: 0.0,
            y1: 0.0,
            x2: tile_units(10.0),
            y2: tile_units(10.0),
            feature_index: 0,
        });
        let mut label = instance(2, Point::new(256.0, 256.0));
        label.text_box = Some(label_box);
        label.center_justified_text_index = Some(0);
        bucket.symbol_instances.push(label);
        bucket.text.placed_symbols = vec![PlacedSymbol::default(); 1];
        bucket.collision_debug = Some(CollisionDebug::default());
    })];

    let mut placement = run_frame(None, 0.0, &layer, &mut tiles, 300.0, true);

    let first_opacity = bucket(&tiles[0], &layer).text.opacity_vertices.clone();
    let first_rows = bucket(&tiles[0], &layer).text.placed_symbols.clone();
    let first_debug = bucket(&tiles[0], &layer)
        .collision_debug
        .as_ref()
        .unwrap()
        .boxes
        .vertices
        .clone();

    placement.update_layer_opacities(&layer, tiles.iter_mut());

    let after = bucket(&tiles[0], &layer);
    assert_eq!(after.text.opacity_vertices, first_opacity);
    assert_eq!(after.text.placed_symbols, first_rows);
    assert_eq!(
        after.collision_debug.as_ref().unwrap().boxes.vertices,
        first_debug
    );
}

#[test]
fn held_tiles_defer_to_later_tiles() {
    let layer = SymbolLayer::new("labels", SymbolLayout::default());
    let build = |pool: &mut CollisionBoxArray, bucket: &mut SymbolBucket| {
        let text_box = centered_box(pool, Point::new(256.0, 256.0), 10.0);
        let mut first = instance(7, Point::new(256.0, 256.0));
        first.text_box = Some(text_box);
        bucket.symbol_instances.push(first);
    };
    let mut held = make_tile(layer.layout.clone(), "composite", 1, build);
    held.holding_for_fade = true;
    let parent = make_tile(layer.layout.clone(), "composite", 2, build);
    let mut tiles = vec![held, parent];

    let placement = run_frame(None, 0.0, &layer, &mut tiles, 300.0, true);
    // The held tile recorded nothing final; the parent placed the label.
    assert_eq!(placement.placement(7), Some(&JointPlacement::new(true, false, false)));
}

#[test]
fn collision_debug_rows_track_placement_and_circle_use() {
    let layer = SymbolLayer::new("labels", SymbolLayout::default());
    let mut tiles = vec![make_tile(layer.layout.clone(), "composite", 1, |pool, bucket| {
        let text_box = centered_box(pool, Point::new(256.0, 256.0), 10.0);
        let circles = pool.push_circles([
            CollisionCircle::new(
                Point::new(tile_units(300.0), tile_units(256.0)),
                tile_units(5.0),
            ),
            CollisionCircle::new(
                Point::new(tile_units(-300.0), tile_units(256.0)),
                tile_units(5.0),
            ),
        ]);
        let mut boxed = instance(1, Point::new(256.0, 256.0));
        boxed.text_box = Some(text_box);
        bucket.symbol_instances.push(boxed);

        let mut lined = instance(2, Point::new(300.0, 256.0));
        lined.text_circles = circles;
        bucket.symbol_instances.push(lined);

        bucket.collision_debug = Some(CollisionDebug::default());
    })];

    let _placement = run_frame(None, 0.0, &layer, &mut tiles, 300.0, true);
    let debug = bucket(&tiles[0], &layer).collision_debug.as_ref().unwrap();

    // Four identical rows per box quad, flagged placed.
    assert_eq!(debug.boxes.vertices.len(), 4);
    assert!(debug.boxes.vertices.iter().all(|v| v.placed && !v.not_used));

    // Four rows per circle; the circle that fell outside the grid is dimmed.
    assert_eq!(debug.circles.vertices.len(), 8);
    assert!(!debug.circles.vertices[0].not_used);
    assert!(debug.circles.vertices[4].not_used);
}

#[test]
fn fade_clock_queries() {
    let layer = SymbolLayer::new("labels", SymbolLayout::default());
    let mut tiles = vec![make_tile(layer.layout.clone(), "composite", 1, |pool, bucket| {
        let text_box = centered_box(pool, Point::new(256.0, 256.0), 10.0);
        let mut first = instance(7, Point::new(256.0, 256.0));
        first.text_box = Some(text_box);
        bucket.symbol_instances.push(first);
    })];

    let mut placement = run_frame(None, 1000.0, &layer, &mut tiles, 300.0, true);
    assert_eq!(placement.symbol_fade_change(1150.0), 0.5);
    assert_eq!(placement.symbol_fade_change(2000.0), 1.0);
    assert!(placement.still_recent(1250.0));
    assert!(!placement.still_recent(1400.0));
    // A placement happened at commit time, so transitions run for one fade.
    assert!(placement.has_transitions(1150.0));
    assert!(!placement.has_transitions(1400.0));
    placement.set_stale();
    assert!(placement.has_transitions(1400.0));
}

#[test]
fn retained_query_data_pins_tile_metadata() {
    let layer = SymbolLayer::new("labels", SymbolLayout::default());
    let mut tiles = vec![make_tile(layer.layout.clone(), "composite", 9, |pool, bucket| {
        let text_box = centered_box(pool, Point::new(256.0, 256.0), 10.0);
        let mut first = instance(7, Point::new(256.0, 256.0));
        first.feature_index = 42;
        first.text_box = Some(text_box);
        bucket.symbol_instances.push(first);
    })];

    let placement = run_frame(None, 0.0, &layer, &mut tiles, 300.0, true);
    let retained = placement.retained_query_data(9).expect("recorded");
    assert_eq!(retained.bucket_instance_id, 9);
    assert_eq!(retained.tile_id, tiles[0].tile_id);
    // The opacity update recorded the feature draw order.
    assert_eq!(retained.feature_sort_order.as_deref(), Some(&[42u32][..]));
}
