// Copyright 2025 the Cartouche Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-frame placement pass, commit, and bucket opacity update.

use std::sync::Arc;

use glam::DMat4;
use hashbrown::{HashMap, HashSet};
use kurbo::Vec2;

use cartouche_collision::{CollisionBoxArray, CollisionIndex};
use cartouche_symbol::{
    AUTO_ANCHORS, AlignmentMode, AnchorOption, FeatureIndex, SymbolBucket, SymbolInstance,
    SymbolLayer, TextAnchor, TextJustify, Tile, anchor_alignment, anchor_justification,
    dynamic_offset, shift_dynamic_collision_box,
};
use cartouche_view::{EXTENT, OverscaledTileId, Transform, label_plane_matrix, pixels_to_tile_units};

use crate::groups::CollisionGroups;
use crate::opacity::{JointOpacityState, JointPlacement, pack_opacity};

/// Remembered dynamic-anchor shifts of one symbol, per justification, in
/// ems. Sentinel values (`-∞`) from culled justifications are kept as
/// stored; [`DynamicOffsets::first_defined`] skips them.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct DynamicOffsets {
    /// Shift of the left-justified variant.
    pub left: Option<Vec2>,
    /// Shift of the center-justified variant.
    pub center: Option<Vec2>,
    /// Shift of the right-justified variant.
    pub right: Option<Vec2>,
}

impl DynamicOffsets {
    /// The remembered shift for `justify`, if that variant exists.
    #[must_use]
    pub fn get(&self, justify: TextJustify) -> Option<Vec2> {
        match justify {
            TextJustify::Left => self.left,
            TextJustify::Center => self.center,
            TextJustify::Right => self.right,
        }
    }

    /// The first finite shift among left, center, right.
    #[must_use]
    pub fn first_defined(&self) -> Option<Vec2> {
        [self.left, self.center, self.right]
            .into_iter()
            .flatten()
            .find(|shift| shift.x.is_finite() && shift.y.is_finite())
    }
}

/// Metadata pinned for every bucket placed, answering hit queries after the
/// frame has rendered.
#[derive(Clone, Debug)]
pub struct RetainedQueryData {
    /// The bucket this data was recorded for.
    pub bucket_instance_id: u32,
    /// The tile's feature index, kept alive by this handle.
    pub feature_index: Arc<FeatureIndex>,
    /// Source layer of the bucket within the tile.
    pub source_layer_index: u32,
    /// Bucket position within the tile's feature index.
    pub bucket_index: u32,
    /// Tile the bucket was placed from.
    pub tile_id: OverscaledTileId,
    /// Feature draw order recorded by the last opacity update.
    pub feature_sort_order: Option<Vec<u32>>,
}

/// One frame's symbol placement.
///
/// Constructed against a snapshot of the view transform, mutated by the
/// placement pass and [`Placement::commit`], read by the opacity update,
/// then discarded. See the crate docs for the full frame protocol.
#[derive(Debug)]
pub struct Placement {
    transform: Transform,
    collision_index: CollisionIndex,
    collision_groups: CollisionGroups,
    placements: HashMap<u64, JointPlacement>,
    opacities: HashMap<u64, JointOpacityState>,
    dynamic_offsets: HashMap<u64, DynamicOffsets>,
    retained_query_data: HashMap<u32, RetainedQueryData>,
    fade_duration: f64,
    commit_time: f64,
    last_placement_change_time: Option<f64>,
    stale: bool,
    warned: HashSet<&'static str>,
}

struct BucketParams {
    pos_matrix: DMat4,
    scale: f64,
    text_pixel_ratio: f64,
    show_collision_boxes: bool,
    holding_for_fade: bool,
}

impl Placement {
    /// Creates a placement for one frame against a snapshot of `transform`.
    ///
    /// `fade_duration` is in the same clock units as the `now` arguments
    /// (milliseconds by convention); zero disables fading entirely.
    #[must_use]
    pub fn new(transform: &Transform, fade_duration: f64, cross_source_collisions: bool) -> Self {
        Self {
            collision_index: CollisionIndex::new(transform),
            transform: transform.clone(),
            collision_groups: CollisionGroups::new(cross_source_collisions),
            placements: HashMap::new(),
            opacities: HashMap::new(),
            dynamic_offsets: HashMap::new(),
            retained_query_data: HashMap::new(),
            fade_duration,
            commit_time: 0.0,
            last_placement_change_time: None,
            stale: false,
            warned: HashSet::new(),
        }
    }

    /// The transform snapshot this placement was built against.
    #[must_use]
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// The pass's collision index.
    #[must_use]
    pub fn collision_index(&self) -> &CollisionIndex {
        &self.collision_index
    }

    /// This pass's decision for a symbol, if it was considered.
    #[must_use]
    pub fn placement(&self, cross_tile_id: u64) -> Option<&JointPlacement> {
        self.placements.get(&cross_tile_id)
    }

    /// The fade state of a symbol after the last commit.
    #[must_use]
    pub fn opacity_state(&self, cross_tile_id: u64) -> Option<&JointOpacityState> {
        self.opacities.get(&cross_tile_id)
    }

    /// The remembered dynamic-anchor offsets of a symbol.
    #[must_use]
    pub fn dynamic_offsets(&self, cross_tile_id: u64) -> Option<&DynamicOffsets> {
        self.dynamic_offsets.get(&cross_tile_id)
    }

    /// The query metadata retained for a bucket, if that bucket was placed.
    #[must_use]
    pub fn retained_query_data(&self, bucket_instance_id: u32) -> Option<&RetainedQueryData> {
        self.retained_query_data.get(&bucket_instance_id)
    }

    /// Places one (layer, tile) pair.
    ///
    /// Does nothing when the tile has no bucket for the layer or the layer
    /// is not the bucket's primary layer. `seen` carries the cross-tile ids
    /// already placed for this layer, shared across the layer's tiles so a
    /// label appearing in several tiles is placed once.
    pub fn place_layer_tile(
        &mut self,
        layer: &SymbolLayer,
        tile: &mut Tile,
        show_collision_boxes: bool,
        seen: &mut HashSet<u64>,
    ) {
        let tile_id = tile.tile_id;
        let tile_size = tile.tile_size;
        let holding_for_fade = tile.holding_for_fade;
        let feature_index = Arc::clone(&tile.latest_feature_index);

        let Some((bucket, pool)) = tile.bucket_and_pool_mut(&layer.id) else {
            return;
        };
        if bucket.layer_id != layer.id {
            return;
        }

        let scale = (self.transform.zoom() - f64::from(tile_id.overscaled_z)).exp2();
        let text_pixel_ratio = tile_size / EXTENT;
        let pos_matrix = self.transform.calculate_pos_matrix(&tile_id.to_unwrapped());
        let pixel_ratio =
            pixels_to_tile_units(tile_size, tile_id.overscaled_z, self.transform.zoom(), 1.0);

        let layout = &bucket.layout;
        let text_label_plane_matrix = label_plane_matrix(
            &pos_matrix,
            layout.text_pitch_alignment == AlignmentMode::Map,
            layout.text_rotation_alignment == AlignmentMode::Map,
            &self.transform,
            pixel_ratio,
        );
        let icon_label_plane_matrix = label_plane_matrix(
            &pos_matrix,
            layout.icon_pitch_alignment == AlignmentMode::Map,
            layout.icon_rotation_alignment == AlignmentMode::Map,
            &self.transform,
            pixel_ratio,
        );

        self.retained_query_data.insert(
            bucket.bucket_instance_id,
            RetainedQueryData {
                bucket_instance_id: bucket.bucket_instance_id,
                feature_index,
                source_layer_index: bucket.source_layer_index,
                bucket_index: bucket.bucket_index,
                tile_id,
                feature_sort_order: None,
            },
        );

        self.place_layer_bucket(
            bucket,
            pool,
            &BucketParams {
                pos_matrix,
                scale,
                text_pixel_ratio,
                show_collision_boxes,
                holding_for_fade,
            },
            &text_label_plane_matrix,
            &icon_label_plane_matrix,
            seen,
        );
    }

    // The icon label plane is derived alongside the text one, but nothing in
    // the placement pass projects into it; only the draw path does.
    fn place_layer_bucket(
        &mut self,
        bucket: &mut SymbolBucket,
        pool: &CollisionBoxArray,
        params: &BucketParams,
        text_label_plane_matrix: &DMat4,
        _icon_label_plane_matrix: &DMat4,
        seen: &mut HashSet<u64>,
    ) {
        let layout = bucket.layout.clone();
        let collision_group = self.collision_groups.get(&bucket.source_id);
        let always_show_text = layout.text_allow_overlap
            && (layout.icon_allow_overlap || !bucket.has_icon_data() || layout.icon_optional);
        let always_show_icon = layout.icon_allow_overlap
            && (layout.text_allow_overlap || !bucket.has_text_data() || layout.text_optional);

        bucket.materialize_collision_arrays(pool);

        for i in 0..bucket.symbol_instances.len() {
            let instance = bucket.symbol_instances[i].clone();
            if seen.contains(&instance.cross_tile_id) {
                continue;
            }
            if params.holding_for_fade {
                // A held tile gets no new placements, but its symbols stay
                // unseen: a parent tile later in the pass may still place
                // the same logical label.
                self.placements
                    .insert(instance.cross_tile_id, JointPlacement::new(false, false, false));
                continue;
            }

            let mut place_text = false;
            let mut place_icon = false;
            let mut offscreen = true;
            let mut placed_text_region = None;
            let mut placed_circles = Vec::new();
            let mut placed_icon_region = None;

            let (text_box, icon_box, text_feature_index, icon_feature_index) =
                match bucket.collision_arrays.as_ref().map(|arrays| &arrays[i]) {
                    Some(arrays) => (
                        arrays.text_box,
                        arrays.icon_box,
                        arrays.text_feature_index,
                        arrays.icon_feature_index,
                    ),
                    None => (None, None, instance.feature_index, instance.feature_index),
                };

            if let Some(text_box) = text_box {
                match &layout.dynamic_text_anchor {
                    None => {
                        let placed = self.collision_index.place_collision_box(
                            &text_box,
                            layout.text_allow_overlap,
                            params.text_pixel_ratio,
                            &params.pos_matrix,
                            collision_group.filter,
                        );
                        place_text = placed.region.is_some();
                        offscreen &= placed.offscreen;
                        placed_text_region = placed.region;
                    }
                    Some(anchors) => {
                        let width = text_box.x2 - text_box.x1;
                        let height = text_box.y2 - text_box.y1;

                        for anchor in self.resolve_anchors(anchors, &instance) {
                            let justification = anchor_justification(anchor);
                            let Some(placed_index) = instance.justified_index(justification)
                            else {
                                continue;
                            };

                            let (h_align, v_align) = anchor_alignment(anchor);
                            let shift_x = -h_align * width;
                            let shift_y = -v_align * height;
                            let offset_ems =
                                dynamic_offset(anchor, layout.dynamic_text_offset);
                            let shifted = shift_dynamic_collision_box(
                                &text_box,
                                instance.text_box_scale,
                                shift_x,
                                shift_y,
                                offset_ems,
                            );

                            let placed = self.collision_index.place_collision_box(
                                &shifted,
                                layout.text_allow_overlap,
                                params.text_pixel_ratio,
                                &params.pos_matrix,
                                collision_group.filter,
                            );
                            if placed.region.is_none() {
                                continue;
                            }

                            place_text = true;
                            offscreen &= placed.offscreen;
                            placed_text_region = placed.region;
                            let em_shift = Vec2::new(
                                shift_x / instance.text_box_scale + offset_ems.x,
                                shift_y / instance.text_box_scale + offset_ems.y,
                            );
                            if let Some(row) =
                                bucket.text.placed_symbols.get_mut(placed_index)
                            {
                                row.shift = em_shift;
                            }
                            hide_unplaced_justifications(bucket, &instance, justification);
                            break;
                        }
                    }
                }
            }

            if !instance.text_circles.is_empty()
                && let Some(arrays) = bucket.collision_arrays.as_mut()
            {
                let circles = &mut arrays[i].text_circles;
                let placed = self.collision_index.place_collision_circles(
                    circles,
                    layout.text_allow_overlap,
                    params.scale,
                    params.text_pixel_ratio,
                    &params.pos_matrix,
                    text_label_plane_matrix,
                    collision_group.filter,
                    params.show_collision_boxes,
                );
                // An overlapping label counts as placed even when none of
                // its circles landed in the grid.
                place_text = !placed.circles.is_empty() || layout.text_allow_overlap;
                offscreen &= placed.offscreen;
                placed_circles = placed.circles;
            }

            if let Some(icon_box) = icon_box {
                let placed = self.collision_index.place_collision_box(
                    &icon_box,
                    layout.icon_allow_overlap,
                    params.text_pixel_ratio,
                    &params.pos_matrix,
                    collision_group.filter,
                );
                place_icon = placed.region.is_some();
                offscreen &= placed.offscreen;
                placed_icon_region = placed.region;
            }

            let icon_without_text = layout.text_optional || !instance.has_text();
            let text_without_icon = layout.icon_optional || instance.num_icon_vertices == 0;
            if !icon_without_text && !text_without_icon {
                let both = place_text && place_icon;
                place_text = both;
                place_icon = both;
            } else if !text_without_icon {
                place_text = place_icon && place_text;
            } else if !icon_without_text {
                place_icon = place_icon && place_text;
            }

            debug_assert!(instance.cross_tile_id != 0);
            debug_assert!(bucket.bucket_instance_id != 0);

            if place_text && let Some(region) = placed_text_region {
                self.collision_index.insert_collision_box(
                    region,
                    layout.text_ignore_placement,
                    bucket.bucket_instance_id,
                    text_feature_index,
                    collision_group.id,
                );
            }
            if place_icon && let Some(region) = placed_icon_region {
                self.collision_index.insert_collision_box(
                    region,
                    layout.icon_ignore_placement,
                    bucket.bucket_instance_id,
                    icon_feature_index,
                    collision_group.id,
                );
            }
            if place_text && !placed_circles.is_empty() {
                self.collision_index.insert_collision_circles(
                    &placed_circles,
                    layout.text_ignore_placement,
                    bucket.bucket_instance_id,
                    text_feature_index,
                    collision_group.id,
                );
            }

            self.placements.insert(
                instance.cross_tile_id,
                JointPlacement::new(
                    place_text || always_show_text,
                    place_icon || always_show_icon,
                    offscreen || bucket.just_reloaded,
                ),
            );
            seen.insert(instance.cross_tile_id);
        }

        bucket.just_reloaded = false;
    }

    /// Expands a `dynamic-text-anchor` option list into the concrete anchor
    /// sequence for one instance.
    fn resolve_anchors(
        &mut self,
        anchors: &[AnchorOption],
        instance: &SymbolInstance,
    ) -> Vec<TextAnchor> {
        let mut resolved = Vec::with_capacity(anchors.len().max(AUTO_ANCHORS.len()));
        for (position, option) in anchors.iter().enumerate() {
            match option {
                AnchorOption::Auto if position == 0 => {
                    let has_icon = instance.num_icon_vertices > 0;
                    resolved.extend(
                        AUTO_ANCHORS
                            .iter()
                            .copied()
                            .filter(|&anchor| !(has_icon && anchor == TextAnchor::Center)),
                    );
                }
                AnchorOption::Auto => {
                    self.warn_once(
                        "dynamic-text-anchor-auto",
                        "`auto` is only valid as the first dynamic-text-anchor entry; ignoring",
                    );
                }
                AnchorOption::Fixed(anchor) => resolved.push(*anchor),
            }
        }
        resolved
    }

    fn warn_once(&mut self, key: &'static str, message: &str) {
        if self.warned.insert(key) {
            log::warn!("{message}");
        }
    }

    /// Merges this pass's decisions with the previous placement's fade
    /// state and advances the fade clock to `now`.
    ///
    /// Symbols the pass did not decide on but that were still fading keep
    /// advancing toward hidden and are carried until they get there; a
    /// symbol fully faded out does not occupy the opacity map.
    pub fn commit(&mut self, prev: Option<&Placement>, now: f64) {
        self.commit_time = now;

        let increment = match prev {
            Some(prev) if self.fade_duration != 0.0 => {
                (now - prev.commit_time) / self.fade_duration
            }
            _ => 1.0,
        };

        let empty = HashMap::new();
        let prev_opacities = prev.map_or(&empty, |prev| &prev.opacities);
        let mut placement_changed = false;

        for (&cross_tile_id, placement) in &self.placements {
            match prev_opacities.get(&cross_tile_id) {
                Some(prev_state) => {
                    self.opacities.insert(
                        cross_tile_id,
                        JointOpacityState::advance(
                            prev_state,
                            increment,
                            placement.text,
                            placement.icon,
                        ),
                    );
                    placement_changed = placement_changed
                        || placement.text != prev_state.text.placed
                        || placement.icon != prev_state.icon.placed;
                }
                None => {
                    self.opacities.insert(
                        cross_tile_id,
                        JointOpacityState::initial(
                            placement.text,
                            placement.icon,
                            placement.skip_fade,
                        ),
                    );
                    placement_changed = placement_changed || placement.text || placement.icon;
                }
            }
        }

        for (&cross_tile_id, prev_state) in prev_opacities {
            if self.opacities.contains_key(&cross_tile_id) {
                continue;
            }
            let faded = JointOpacityState::advance(prev_state, increment, false, false);
            if !faded.is_hidden() {
                self.opacities.insert(cross_tile_id, faded);
                placement_changed =
                    placement_changed || prev_state.text.placed || prev_state.icon.placed;
            }
        }

        if placement_changed {
            self.last_placement_change_time = Some(now);
        } else if self.last_placement_change_time.is_none() {
            self.last_placement_change_time =
                Some(prev.and_then(|prev| prev.last_placement_change_time).unwrap_or(now));
        }
    }

    /// Writes the committed opacities and shifts into the staging arrays of
    /// the layer's buckets, in the order the tiles are passed.
    pub fn update_layer_opacities<'a>(
        &mut self,
        layer: &SymbolLayer,
        tiles: impl IntoIterator<Item = &'a mut Tile>,
    ) {
        let mut seen = HashSet::new();
        for tile in tiles {
            let overscaled_z = tile.tile_id.overscaled_z;
            let Some((bucket, pool)) = tile.bucket_and_pool_mut(&layer.id) else {
                continue;
            };
            if bucket.layer_id != layer.id {
                continue;
            }
            self.update_bucket_opacities(bucket, pool, &mut seen, overscaled_z);
        }
    }

    fn update_bucket_opacities(
        &mut self,
        bucket: &mut SymbolBucket,
        pool: &CollisionBoxArray,
        seen: &mut HashSet<u64>,
        overscaled_z: u8,
    ) {
        bucket.text.opacity_vertices.clear();
        bucket.icon.opacity_vertices.clear();
        if let Some(debug) = &mut bucket.collision_debug {
            debug.boxes.clear();
            debug.circles.clear();
        }

        let layout = bucket.layout.clone();
        let dynamic = layout.dynamic_text_anchor.is_some();
        let duplicate_state = JointOpacityState::initial(false, false, true);
        let default_state = JointOpacityState::initial(
            layout.text_allow_overlap
                && (layout.icon_allow_overlap || !bucket.has_icon_data() || layout.icon_optional),
            layout.icon_allow_overlap
                && (layout.text_allow_overlap || !bucket.has_text_data() || layout.text_optional),
            true,
        );

        if bucket.collision_debug.is_some() {
            bucket.materialize_collision_arrays(pool);
        }

        for i in 0..bucket.symbol_instances.len() {
            let instance = bucket.symbol_instances[i].clone();
            let cross_tile_id = instance.cross_tile_id;
            let is_duplicate = seen.contains(&cross_tile_id);

            let state = if is_duplicate {
                // The visible copy of this label lives in a tile updated
                // earlier; this copy is culled outright.
                duplicate_state
            } else if let Some(state) = self.opacities.get(&cross_tile_id) {
                *state
            } else {
                self.opacities.insert(cross_tile_id, default_state);
                default_state
            };

            if !is_duplicate {
                if dynamic && !self.dynamic_offsets.contains_key(&cross_tile_id) {
                    let snapshot = |index: Option<usize>| {
                        index
                            .and_then(|i| bucket.text.placed_symbols.get(i))
                            .map(|row| row.shift)
                    };
                    self.dynamic_offsets.insert(
                        cross_tile_id,
                        DynamicOffsets {
                            left: snapshot(instance.left_justified_text_index),
                            center: snapshot(instance.center_justified_text_index),
                            right: snapshot(instance.right_justified_text_index),
                        },
                    );
                }
                seen.insert(cross_tile_id);
            }

            if instance.has_text() {
                let packed = pack_opacity(state.text);
                let quad_count = (instance.num_horizontal_glyph_vertices
                    + instance.num_vertical_glyph_vertices)
                    / 4;
                bucket
                    .text
                    .opacity_vertices
                    .extend(std::iter::repeat_n(packed, quad_count));

                let hidden = state.text.is_hidden();
                if hidden {
                    shift_placed_symbols(
                        bucket,
                        &instance,
                        Vec2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
                    );
                } else if dynamic && let Some(offsets) = self.dynamic_offsets.get(&cross_tile_id)
                {
                    for (justify, index) in [
                        (TextJustify::Left, instance.left_justified_text_index),
                        (TextJustify::Center, instance.center_justified_text_index),
                        (TextJustify::Right, instance.right_justified_text_index),
                    ] {
                        if let (Some(index), Some(shift)) = (index, offsets.get(justify))
                            && let Some(row) = bucket.text.placed_symbols.get_mut(index)
                        {
                            row.shift = shift;
                        }
                    }
                }
                for index in [
                    instance.right_justified_text_index,
                    instance.center_justified_text_index,
                    instance.left_justified_text_index,
                    instance.vertical_text_index,
                ]
                .into_iter()
                .flatten()
                {
                    if let Some(row) = bucket.text.placed_symbols.get_mut(index) {
                        row.hidden = hidden;
                    }
                }
            }

            if instance.num_icon_vertices > 0 {
                let packed = pack_opacity(state.icon);
                bucket
                    .icon
                    .opacity_vertices
                    .extend(std::iter::repeat_n(packed, instance.num_icon_vertices / 4));
                if let Some(index) = instance.icon_index
                    && let Some(row) = bucket.icon.placed_symbols.get_mut(index)
                {
                    row.hidden = state.icon.is_hidden();
                }
            }

            if let (Some(arrays), Some(debug)) = (
                bucket.collision_arrays.as_ref().map(|arrays| &arrays[i]),
                bucket.collision_debug.as_mut(),
            ) {
                if arrays.text_box.is_some() {
                    let mut shift = Vec2::ZERO;
                    if dynamic
                        && state.text.placed
                        && let Some(em_shift) = self
                            .dynamic_offsets
                            .get(&cross_tile_id)
                            .and_then(DynamicOffsets::first_defined)
                    {
                        let em_scale = instance.text_box_scale
                            / (self.transform.zoom() - f64::from(overscaled_z)).exp2();
                        shift = Vec2::new(em_shift.x * em_scale, em_shift.y * em_scale);
                    }
                    debug.boxes.push_quad(state.text.placed, false, shift);
                }
                if arrays.icon_box.is_some() {
                    debug.boxes.push_quad(state.icon.placed, false, Vec2::ZERO);
                }
                for circle in &arrays.text_circles {
                    let not_used = is_duplicate || !circle.used;
                    debug.circles.push_quad(state.text.placed, not_used, Vec2::ZERO);
                }
            }
        }

        bucket.sort_features_by_angle(self.transform.angle());
        if let Some(data) = self.retained_query_data.get_mut(&bucket.bucket_instance_id) {
            data.feature_sort_order = bucket.feature_sort_order.clone();
        }

        if bucket.has_text_data() {
            bucket.text.buffers_dirty = true;
        }
        if bucket.has_icon_data() {
            bucket.icon.buffers_dirty = true;
        }
        if let Some(debug) = &mut bucket.collision_debug {
            debug.boxes.buffers_dirty = true;
            debug.circles.buffers_dirty = true;
        }

        debug_assert!(bucket.text.opacity_vertices.len() * 4 == bucket.text.layout_vertex_len);
        debug_assert!(bucket.icon.opacity_vertices.len() * 4 == bucket.icon.layout_vertex_len);
    }

    /// Fraction of the fade completed at `now`, in `[0, 1]`.
    #[must_use]
    pub fn symbol_fade_change(&self, now: f64) -> f64 {
        if self.fade_duration == 0.0 {
            1.0
        } else {
            ((now - self.commit_time) / self.fade_duration).clamp(0.0, 1.0)
        }
    }

    /// Whether any symbol may still be mid-fade at `now`, or a new pass has
    /// been requested.
    #[must_use]
    pub fn has_transitions(&self, now: f64) -> bool {
        self.stale
            || self
                .last_placement_change_time
                .is_some_and(|changed| now - changed < self.fade_duration)
    }

    /// Whether this placement's commit is recent enough that re-running
    /// placement would be wasted work.
    #[must_use]
    pub fn still_recent(&self, now: f64) -> bool {
        self.commit_time + self.fade_duration > now
    }

    /// Marks the placement stale, asking the renderer for a fresh pass.
    pub fn set_stale(&mut self) {
        self.stale = true;
    }

    /// Whether [`Placement::set_stale`] has been called.
    #[must_use]
    pub fn stale(&self) -> bool {
        self.stale
    }
}

/// Culls the placed-symbol rows of every justification whose row differs
/// from the kept one.
fn hide_unplaced_justifications(
    bucket: &mut SymbolBucket,
    instance: &SymbolInstance,
    kept: TextJustify,
) {
    let kept_index = instance.justified_index(kept);
    for justify in [TextJustify::Left, TextJustify::Center, TextJustify::Right] {
        if let Some(index) = instance.justified_index(justify)
            && Some(index) != kept_index
            && let Some(row) = bucket.text.placed_symbols.get_mut(index)
        {
            row.shift.x = f64::NEG_INFINITY;
        }
    }
}

/// Writes `shift` into every justified text row of the instance, including
/// the vertical variant.
fn shift_placed_symbols(bucket: &mut SymbolBucket, instance: &SymbolInstance, shift: Vec2) {
    for index in [
        instance.right_justified_text_index,
        instance.center_justified_text_index,
        instance.left_justified_text_index,
        instance.vertical_text_index,
    ]
    .into_iter()
    .flatten()
    {
        if let Some(row) = bucket.text.placed_symbols.get_mut(index) {
            row.shift = shift;
        }
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Point;

    use cartouche_symbol::SymbolLayout;

    use super::*;

    fn instance_with_rows() -> SymbolInstance {
        SymbolInstance {
            cross_tile_id: 1,
            anchor: Point::ZERO,
            feature_index: 0,
            num_horizontal_glyph_vertices: 8,
            num_vertical_glyph_vertices: 0,
            num_icon_vertices: 0,
            right_justified_text_index: Some(0),
            center_justified_text_index: Some(1),
            left_justified_text_index: Some(2),
            vertical_text_index: None,
            icon_index: None,
            text_box: None,
            icon_box: None,
            text_circles: 0..0,
            text_box_scale: 1.0,
        }
    }

    #[test]
    fn hiding_spares_rows_shared_with_the_kept_justification() {
        let mut bucket = SymbolBucket::new(1, "labels", "composite", SymbolLayout::default());
        bucket.text.placed_symbols = vec![Default::default(); 3];

        let mut instance = instance_with_rows();
        hide_unplaced_justifications(&mut bucket, &instance, TextJustify::Center);
        assert!(bucket.text.placed_symbols[0].shift.x.is_infinite());
        assert_eq!(bucket.text.placed_symbols[1].shift.x, 0.0);
        assert!(bucket.text.placed_symbols[2].shift.x.is_infinite());

        // Two justifications aliasing the same row: keeping one keeps the row.
        bucket.text.placed_symbols = vec![Default::default(); 3];
        instance.left_justified_text_index = Some(1);
        hide_unplaced_justifications(&mut bucket, &instance, TextJustify::Left);
        assert!(bucket.text.placed_symbols[0].shift.x.is_infinite());
        assert_eq!(bucket.text.placed_symbols[1].shift.x, 0.0);
    }

    #[test]
    fn first_defined_offset_skips_sentinels() {
        let offsets = DynamicOffsets {
            left: Some(Vec2::new(f64::NEG_INFINITY, f64::NEG_INFINITY)),
            center: None,
            right: Some(Vec2::new(1.5, -0.5)),
        };
        assert_eq!(offsets.first_defined(), Some(Vec2::new(1.5, -0.5)));
        assert_eq!(DynamicOffsets::default().first_defined(), None);
    }
}
