// Copyright 2025 the Cartouche Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-frame collision acceptor.

use glam::{DMat4, DVec4};
use kurbo::{Circle, Point, Rect};

use cartouche_view::Transform;

use crate::grid::GridIndex;
use crate::types::{CollisionBox, CollisionCircle, EntryKey, GroupFilter};

/// Width of the band around the viewport that still participates in
/// placement, in pixels. Symbols accepted inside the band are flagged
/// offscreen so they can appear without a fade when panned into view.
pub const VIEWPORT_PADDING: f64 = 100.0;

/// Result of placing a single collision box.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedBox {
    /// Screen-space footprint in padded-grid coordinates; `None` when the
    /// candidate was rejected (outside the grid, or obstructed).
    pub region: Option<Rect>,
    /// Whether the accepted footprint lies entirely outside the unpadded
    /// viewport. Always `false` for rejected candidates.
    pub offscreen: bool,
}

/// Result of placing an along-line label's circle footprint.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedCircles {
    /// Screen-space circles in padded-grid coordinates; empty when the label
    /// was rejected or had no circle inside the grid.
    pub circles: Vec<Circle>,
    /// Whether every in-grid circle lies outside the unpadded viewport.
    pub offscreen: bool,
}

/// Screen-space acceptor owned by one placement pass.
///
/// Candidates are projected from tile units through the tile's position
/// matrix, scaled by the anchor's perspective ratio, and tested against
/// prior insertions. Two grids are kept: accepted geometry that blocks later
/// candidates, and ignore-placement geometry retained only for debugging and
/// hit queries.
#[derive(Debug)]
pub struct CollisionIndex {
    grid: GridIndex,
    ignored_grid: GridIndex,
    screen_width: f64,
    screen_height: f64,
    camera_to_center_distance: f64,
}

impl CollisionIndex {
    /// Creates an empty index covering the transform's viewport plus the
    /// padding band.
    #[must_use]
    pub fn new(transform: &Transform) -> Self {
        let width = transform.width() + 2.0 * VIEWPORT_PADDING;
        let height = transform.height() + 2.0 * VIEWPORT_PADDING;
        Self {
            grid: GridIndex::new(width, height),
            ignored_grid: GridIndex::new(width, height),
            screen_width: transform.width(),
            screen_height: transform.height(),
            camera_to_center_distance: transform.camera_to_center_distance(),
        }
    }

    /// The blocking grid, exposed for debug overlays and tests.
    #[must_use]
    pub fn grid(&self) -> &GridIndex {
        &self.grid
    }

    /// The ignore-placement grid, exposed for debug overlays and tests.
    #[must_use]
    pub fn ignored_grid(&self) -> &GridIndex {
        &self.ignored_grid
    }

    /// Projects a tile-space point and returns its padded-grid position plus
    /// the perspective ratio at that depth.
    #[must_use]
    pub fn project_anchor(&self, pos_matrix: &DMat4, point: Point) -> (Point, f64) {
        let clip = *pos_matrix * DVec4::new(point.x, point.y, 0.0, 1.0);
        let projected = Point::new(
            ((clip.x / clip.w + 1.0) / 2.0) * self.screen_width + VIEWPORT_PADDING,
            ((-clip.y / clip.w + 1.0) / 2.0) * self.screen_height + VIEWPORT_PADDING,
        );
        // At the center of the viewport the ratio is 1; anchors nearer the
        // camera grow, anchors nearer the horizon shrink.
        let ratio = 0.5 + 0.5 * (self.camera_to_center_distance / clip.w);
        (projected, ratio)
    }

    /// Attempts to place one collision box.
    ///
    /// The box is rejected when it falls outside the padded grid or, unless
    /// `allow_overlap`, when a matching prior entry overlaps it. Accepted
    /// boxes are *not* inserted; the caller decides after pairing text and
    /// icon outcomes.
    #[must_use]
    pub fn place_collision_box(
        &self,
        collision_box: &CollisionBox,
        allow_overlap: bool,
        text_pixel_ratio: f64,
        pos_matrix: &DMat4,
        filter: GroupFilter,
    ) -> PlacedBox {
        let (anchor, ratio) = self.project_anchor(pos_matrix, collision_box.anchor);
        let tile_to_viewport = text_pixel_ratio * ratio;
        let region = Rect::new(
            collision_box.x1 * tile_to_viewport + anchor.x,
            collision_box.y1 * tile_to_viewport + anchor.y,
            collision_box.x2 * tile_to_viewport + anchor.x,
            collision_box.y2 * tile_to_viewport + anchor.y,
        );

        if !self.is_inside_grid(&region)
            || (!allow_overlap && self.grid.hit_test_box(&region, filter))
        {
            return PlacedBox {
                region: None,
                offscreen: false,
            };
        }

        PlacedBox {
            offscreen: self.is_offscreen(&region),
            region: Some(region),
        }
    }

    /// Attempts to place an along-line label's circles.
    ///
    /// Circles outside the padded grid are flagged unused and excluded from
    /// the query. A single obstructed circle rejects the whole label; with
    /// `show_debug` the scan continues past the first obstruction so the
    /// debug overlay can still show every circle's footprint.
    #[must_use]
    pub fn place_collision_circles(
        &self,
        circles: &mut [CollisionCircle],
        allow_overlap: bool,
        scale: f64,
        text_pixel_ratio: f64,
        pos_matrix: &DMat4,
        label_plane_matrix: &DMat4,
        filter: GroupFilter,
        show_debug: bool,
    ) -> PlacedCircles {
        let mut placed = Vec::with_capacity(circles.len());
        let mut entirely_offscreen = true;
        let mut any_in_grid = false;
        let mut collision = false;

        for circle in circles.iter_mut() {
            let clip = *label_plane_matrix
                * DVec4::new(circle.center.x, circle.center.y, 0.0, 1.0);
            let center = Point::new(
                clip.x / clip.w + VIEWPORT_PADDING,
                clip.y / clip.w + VIEWPORT_PADDING,
            );
            let (_, ratio) = self.project_anchor(pos_matrix, circle.center);
            let screen = Circle::new(center, circle.radius * text_pixel_ratio * scale * ratio);
            let bounds = Rect::new(
                screen.center.x - screen.radius,
                screen.center.y - screen.radius,
                screen.center.x + screen.radius,
                screen.center.y + screen.radius,
            );

            if !self.is_inside_grid(&bounds) {
                circle.used = false;
                continue;
            }
            circle.used = true;
            any_in_grid = true;
            entirely_offscreen = entirely_offscreen && self.is_offscreen(&bounds);

            if !allow_overlap && self.grid.hit_test_circle(&screen, filter) {
                if !show_debug {
                    return PlacedCircles {
                        circles: Vec::new(),
                        offscreen: false,
                    };
                }
                collision = true;
            }
            placed.push(screen);
        }

        if collision || !any_in_grid {
            return PlacedCircles {
                circles: Vec::new(),
                offscreen: false,
            };
        }
        PlacedCircles {
            circles: placed,
            offscreen: entirely_offscreen,
        }
    }

    /// Records an accepted box, blocking later queries unless
    /// `ignore_placement`.
    pub fn insert_collision_box(
        &mut self,
        region: Rect,
        ignore_placement: bool,
        bucket_instance_id: u32,
        feature_index: u32,
        group: u16,
    ) {
        let key = EntryKey {
            bucket_instance_id,
            feature_index,
            group,
        };
        let grid = if ignore_placement {
            &mut self.ignored_grid
        } else {
            &mut self.grid
        };
        grid.insert_box(key, region);
    }

    /// Records an accepted set of circles.
    pub fn insert_collision_circles(
        &mut self,
        circles: &[Circle],
        ignore_placement: bool,
        bucket_instance_id: u32,
        feature_index: u32,
        group: u16,
    ) {
        let key = EntryKey {
            bucket_instance_id,
            feature_index,
            group,
        };
        let grid = if ignore_placement {
            &mut self.ignored_grid
        } else {
            &mut self.grid
        };
        for circle in circles {
            grid.insert_circle(key, *circle);
        }
    }

    fn is_inside_grid(&self, region: &Rect) -> bool {
        let grid_width = self.screen_width + 2.0 * VIEWPORT_PADDING;
        let grid_height = self.screen_height + 2.0 * VIEWPORT_PADDING;
        region.x1 > 0.0 && region.x0 < grid_width && region.y1 > 0.0 && region.y0 < grid_height
    }

    fn is_offscreen(&self, region: &Rect) -> bool {
        region.x1 < VIEWPORT_PADDING
            || region.x0 >= self.screen_width + VIEWPORT_PADDING
            || region.y1 < VIEWPORT_PADDING
            || region.y0 >= self.screen_height + VIEWPORT_PADDING
    }
}
