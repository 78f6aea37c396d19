// Copyright 2025 the Cartouche Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-tile symbol containers and GPU staging arrays.

use core::ops::Range;

use kurbo::{Point, Vec2};

use cartouche_collision::{CollisionBox, CollisionBoxArray, CollisionCircle};

use crate::layout::{SymbolLayout, TextJustify};

/// One placed text variant or icon, staged for the GPU.
///
/// `shift` is in ems for text rows (written by the dynamic-anchor search)
/// and doubles as the off-screen sentinel: a `-∞` x component makes the
/// vertex shader cull the row.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct PlacedSymbol {
    /// Dynamic shift applied in the shader.
    pub shift: Vec2,
    /// Whether the symbol is hidden this frame.
    pub hidden: bool,
}

/// GPU staging for one kind of symbol data (text or icon).
///
/// `layout_vertex_len` counts the vertices the shaping stage emitted; the
/// opacity array is rebuilt from scratch on every update with one packed
/// entry per quad (four vertices).
#[derive(Clone, Debug, Default)]
pub struct SymbolBuffers {
    /// Vertex count of the layout array; four per glyph quad.
    pub layout_vertex_len: usize,
    /// One packed opacity word per quad.
    pub opacity_vertices: Vec<u32>,
    /// Placed-symbol rows addressed by the instances.
    pub placed_symbols: Vec<PlacedSymbol>,
    /// Set when the staged data changed and the GPU copy is stale.
    pub buffers_dirty: bool,
}

impl SymbolBuffers {
    /// Whether the shaping stage produced any vertices of this kind.
    #[must_use]
    pub fn has_data(&self) -> bool {
        self.layout_vertex_len > 0
    }
}

/// One collision-debug vertex row.
///
/// Uploaded as `(placed ? 1 : 0, not_used ? 1 : 0, shift_x, shift_y)`,
/// repeated four times to cover the quad.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CollisionDebugVertex {
    /// The symbol was placed this frame.
    pub placed: bool,
    /// The geometry did not participate in placement.
    pub not_used: bool,
    /// Screen-space shift of the debug outline.
    pub shift: Vec2,
}

/// Collision-debug vertex staging for boxes or circles.
#[derive(Clone, Debug, Default)]
pub struct CollisionDebugArray {
    /// Vertex rows, four per quad.
    pub vertices: Vec<CollisionDebugVertex>,
    /// Set when the staged data changed and the GPU copy is stale.
    pub buffers_dirty: bool,
}

impl CollisionDebugArray {
    /// Drops all staged rows.
    pub fn clear(&mut self) {
        self.vertices.clear();
    }

    /// Emits the four identical rows covering one quad.
    pub fn push_quad(&mut self, placed: bool, not_used: bool, shift: Vec2) {
        let vertex = CollisionDebugVertex {
            placed,
            not_used,
            shift,
        };
        self.vertices.extend([vertex; 4]);
    }
}

/// Collision-debug staging carried by buckets rendered with the debug
/// overlay enabled.
#[derive(Clone, Debug, Default)]
pub struct CollisionDebug {
    /// Box outlines (text and icon).
    pub boxes: CollisionDebugArray,
    /// Along-line circle outlines.
    pub circles: CollisionDebugArray,
}

/// One logical symbol: a label and/or icon anchored to a feature.
///
/// Instances are created by the shaping stage; the placement engine reads
/// them in stored order and never reorders them.
#[derive(Clone, Debug)]
pub struct SymbolInstance {
    /// Cross-tile identity; equal across tiles for the same logical label.
    /// Non-zero for every instance that reaches placement.
    pub cross_tile_id: u64,
    /// Anchor point in tile units.
    pub anchor: Point,
    /// Feature the instance was generated from.
    pub feature_index: u32,
    /// Glyph vertex count across all horizontal justifications.
    pub num_horizontal_glyph_vertices: usize,
    /// Glyph vertex count of the vertical writing mode.
    pub num_vertical_glyph_vertices: usize,
    /// Icon vertex count.
    pub num_icon_vertices: usize,
    /// Placed-symbol row of the right-justified variant.
    pub right_justified_text_index: Option<usize>,
    /// Placed-symbol row of the center-justified variant.
    pub center_justified_text_index: Option<usize>,
    /// Placed-symbol row of the left-justified variant.
    pub left_justified_text_index: Option<usize>,
    /// Placed-symbol row of the vertical variant.
    pub vertical_text_index: Option<usize>,
    /// Placed-symbol row of the icon.
    pub icon_index: Option<usize>,
    /// Text collision box in the tile pool.
    pub text_box: Option<usize>,
    /// Icon collision box in the tile pool.
    pub icon_box: Option<usize>,
    /// Along-line collision circles in the tile pool.
    pub text_circles: Range<usize>,
    /// Tile units per em at this label's layout size.
    pub text_box_scale: f64,
}

impl SymbolInstance {
    /// Whether any glyph vertices exist, in any justification or writing
    /// mode.
    #[must_use]
    pub fn has_text(&self) -> bool {
        self.num_horizontal_glyph_vertices > 0 || self.num_vertical_glyph_vertices > 0
    }

    /// The placed-symbol row holding the given justification.
    #[must_use]
    pub fn justified_index(&self, justify: TextJustify) -> Option<usize> {
        match justify {
            TextJustify::Left => self.left_justified_text_index,
            TextJustify::Center => self.center_justified_text_index,
            TextJustify::Right => self.right_justified_text_index,
        }
    }
}

/// Materialized collision geometry for one symbol instance.
#[derive(Clone, Debug, Default)]
pub struct CollisionArrays {
    /// Text collision box, if the label has one.
    pub text_box: Option<CollisionBox>,
    /// Icon collision box, if the icon has one.
    pub icon_box: Option<CollisionBox>,
    /// Along-line collision circles.
    pub text_circles: Vec<CollisionCircle>,
    /// Feature index reported with text insertions.
    pub text_feature_index: u32,
    /// Feature index reported with icon insertions.
    pub icon_feature_index: u32,
}

/// One layer's renderable symbols in one tile.
#[derive(Clone, Debug)]
pub struct SymbolBucket {
    /// Identity of this bucket instance across the frame. Non-zero.
    pub bucket_instance_id: u32,
    /// Id of the layer this bucket was built for.
    pub layer_id: String,
    /// Id of the source the layer reads from.
    pub source_id: String,
    /// Index of the layer's source layer within the tile.
    pub source_layer_index: u32,
    /// Index of the bucket within the tile's feature index.
    pub bucket_index: u32,
    /// Layout options of the primary layer.
    pub layout: SymbolLayout,
    /// Symbol instances in placement order.
    pub symbol_instances: Vec<SymbolInstance>,
    /// Text staging buffers.
    pub text: SymbolBuffers,
    /// Icon staging buffers.
    pub icon: SymbolBuffers,
    /// Collision-debug staging, when the overlay is enabled for the bucket.
    pub collision_debug: Option<CollisionDebug>,
    /// Per-instance collision geometry; materialized from the tile pool on
    /// first use.
    pub collision_arrays: Option<Vec<CollisionArrays>>,
    /// Set while the tile's fresh data has not been through a placement
    /// pass yet; suppresses the fade-in of symbols that were already
    /// visible before the reload.
    pub just_reloaded: bool,
    /// Feature indices in the draw order of the last opacity update.
    pub feature_sort_order: Option<Vec<u32>>,
}

impl SymbolBucket {
    /// Creates an empty bucket for a layer/source pair.
    #[must_use]
    pub fn new(
        bucket_instance_id: u32,
        layer_id: impl Into<String>,
        source_id: impl Into<String>,
        layout: SymbolLayout,
    ) -> Self {
        debug_assert!(bucket_instance_id != 0);
        Self {
            bucket_instance_id,
            layer_id: layer_id.into(),
            source_id: source_id.into(),
            source_layer_index: 0,
            bucket_index: 0,
            layout,
            symbol_instances: Vec::new(),
            text: SymbolBuffers::default(),
            icon: SymbolBuffers::default(),
            collision_debug: None,
            collision_arrays: None,
            just_reloaded: false,
            feature_sort_order: None,
        }
    }

    /// Whether the bucket has any text vertices.
    #[must_use]
    pub fn has_text_data(&self) -> bool {
        self.text.has_data()
    }

    /// Whether the bucket has any icon vertices.
    #[must_use]
    pub fn has_icon_data(&self) -> bool {
        self.icon.has_data()
    }

    /// Copies each instance's collision geometry out of the tile pool.
    /// Subsequent calls are no-ops.
    pub fn materialize_collision_arrays(&mut self, pool: &CollisionBoxArray) {
        if self.collision_arrays.is_some() {
            return;
        }
        let arrays = self
            .symbol_instances
            .iter()
            .map(|instance| {
                let text_box = instance.text_box.and_then(|i| pool.box_at(i)).copied();
                let icon_box = instance.icon_box.and_then(|i| pool.box_at(i)).copied();
                CollisionArrays {
                    text_feature_index: text_box
                        .map_or(instance.feature_index, |b| b.feature_index),
                    icon_feature_index: icon_box
                        .map_or(instance.feature_index, |b| b.feature_index),
                    text_box,
                    icon_box,
                    text_circles: pool.circles_in(instance.text_circles.clone()).to_vec(),
                }
            })
            .collect();
        self.collision_arrays = Some(arrays);
    }

    /// Records the draw order of features under the given view angle into
    /// [`SymbolBucket::feature_sort_order`]: anchors further down the
    /// rotated screen draw later and win overlap.
    pub fn sort_features_by_angle(&mut self, angle: f64) {
        let (sin, cos) = angle.sin_cos();
        let mut order: Vec<u32> = (0..self.symbol_instances.len() as u32).collect();
        order.sort_by(|&a, &b| {
            let rotated_y = |i: u32| {
                let anchor = self.symbol_instances[i as usize].anchor;
                anchor.x * sin + anchor.y * cos
            };
            rotated_y(a)
                .partial_cmp(&rotated_y(b))
                .unwrap_or(core::cmp::Ordering::Equal)
        });
        self.feature_sort_order = Some(
            order
                .into_iter()
                .map(|i| self.symbol_instances[i as usize].feature_index)
                .collect(),
        );
    }
}
