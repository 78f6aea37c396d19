// Copyright 2025 the Cartouche Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::f64::consts::FRAC_PI_2;

use glam::{DMat4, DVec3};
use kurbo::Point;

use crate::tile::{EXTENT, UnwrappedTileId};

/// Nominal tile size in CSS pixels at integer zoom.
pub const BASE_TILE_SIZE: f64 = 512.0;

/// Vertical field of view of the perspective camera, in radians.
const FIELD_OF_VIEW: f64 = 0.6435011087932844;

/// Camera state for one frame.
///
/// `Transform` tracks the viewport size, zoom, bearing (`angle`), pitch, and
/// the world-pixel point at the center of the screen, and derives the
/// clip-space projection used to position tiles. The placement engine clones
/// a `Transform` at the start of a pass so that placement decisions stay
/// coherent even if the live camera moves mid-frame.
///
/// The projection is rebuilt eagerly whenever a parameter changes, so
/// [`Transform::calculate_pos_matrix`] is cheap enough to call once per
/// visible tile.
#[derive(Clone, Debug)]
pub struct Transform {
    width: f64,
    height: f64,
    zoom: f64,
    angle: f64,
    pitch: f64,
    center: Point,
    projection: DMat4,
}

impl Transform {
    /// Creates a transform for a viewport of `width × height` CSS pixels,
    /// looking at the center of the world at zoom 0 with no rotation.
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        let mut tr = Self {
            width,
            height,
            zoom: 0.0,
            angle: 0.0,
            pitch: 0.0,
            center: Point::ZERO,
            projection: DMat4::IDENTITY,
        };
        tr.center = Point::new(tr.world_size() / 2.0, tr.world_size() / 2.0);
        tr.rebuild_projection();
        tr
    }

    /// Viewport width in CSS pixels.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Viewport height in CSS pixels.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Current zoom level.
    #[must_use]
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Bearing in radians, counterclockwise from north-up.
    #[must_use]
    pub fn angle(&self) -> f64 {
        self.angle
    }

    /// Pitch in radians; `0` looks straight down.
    #[must_use]
    pub fn pitch(&self) -> f64 {
        self.pitch
    }

    /// World-pixel point at the center of the viewport.
    #[must_use]
    pub fn center(&self) -> Point {
        self.center
    }

    /// Sets the zoom level, keeping the center fixed in world units of the
    /// new zoom (the caller rescales the center when animating zoom about a
    /// screen anchor).
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom;
        self.rebuild_projection();
    }

    /// Sets the bearing in radians.
    pub fn set_angle(&mut self, angle: f64) {
        self.angle = angle;
        self.rebuild_projection();
    }

    /// Sets the pitch in radians.
    pub fn set_pitch(&mut self, pitch: f64) {
        self.pitch = pitch;
        self.rebuild_projection();
    }

    /// Sets the world-pixel point at the center of the viewport.
    pub fn set_center(&mut self, center: Point) {
        self.center = center;
        self.rebuild_projection();
    }

    /// Size of the world in pixels at the current zoom.
    #[must_use]
    pub fn world_size(&self) -> f64 {
        BASE_TILE_SIZE * self.zoom.exp2()
    }

    /// Distance from the camera to the center of the viewport, in pixels.
    ///
    /// This is the quantity that keeps the map scale constant at the screen
    /// center regardless of pitch, and the reference the collision index uses
    /// to derive per-anchor perspective ratios.
    #[must_use]
    pub fn camera_to_center_distance(&self) -> f64 {
        0.5 * self.height / (FIELD_OF_VIEW / 2.0).tan()
    }

    /// Clip-space projection for world-pixel coordinates.
    #[must_use]
    pub fn projection_matrix(&self) -> DMat4 {
        self.projection
    }

    /// Matrix mapping the tile's `[0, EXTENT]²` coordinates to clip space
    /// for the current view.
    #[must_use]
    pub fn calculate_pos_matrix(&self, tile: &UnwrappedTileId) -> DMat4 {
        let zoom_row = (1u64 << tile.canonical.z) as f64;
        let scale = self.world_size() / zoom_row;
        let x = (f64::from(tile.canonical.x) + f64::from(tile.wrap) * zoom_row) * scale;
        let y = f64::from(tile.canonical.y) * scale;
        self.projection
            * DMat4::from_translation(DVec3::new(x, y, 0.0))
            * DMat4::from_scale(DVec3::new(scale / EXTENT, scale / EXTENT, 1.0))
    }

    /// Matrix mapping clip space to y-down screen pixels.
    #[must_use]
    pub fn viewport_matrix(&self) -> DMat4 {
        DMat4::from_scale(DVec3::new(self.width / 2.0, -self.height / 2.0, 1.0))
            * DMat4::from_translation(DVec3::new(1.0, -1.0, 0.0))
    }

    fn rebuild_projection(&mut self) {
        let distance = self.camera_to_center_distance();

        // Far plane: just past the line of sight to the horizon-most point of
        // the pitched ground plane.
        let half_fov = FIELD_OF_VIEW / 2.0;
        let ground_angle = FRAC_PI_2 + self.pitch;
        let top_half_surface =
            half_fov.sin() * distance / (core::f64::consts::PI - ground_angle - half_fov).sin();
        let furthest = (FRAC_PI_2 - self.pitch).cos() * top_half_surface + distance;
        let far_z = furthest * 1.01;

        self.projection = DMat4::perspective_rh_gl(FIELD_OF_VIEW, self.width / self.height, 1.0, far_z)
            * DMat4::from_scale(DVec3::new(1.0, -1.0, 1.0))
            * DMat4::from_translation(DVec3::new(0.0, 0.0, -distance))
            * DMat4::from_rotation_x(self.pitch)
            * DMat4::from_rotation_z(self.angle)
            * DMat4::from_translation(DVec3::new(-self.center.x, -self.center.y, 0.0));
    }
}

/// Matrix for the plane text is laid out in.
///
/// With `pitch_with_map` the plane is the tile itself, scaled so one unit is
/// one pixel (counter-rotated when the text does not rotate with the map);
/// otherwise the plane is the screen and the result maps tile units straight
/// to y-down viewport pixels.
#[must_use]
pub fn label_plane_matrix(
    pos_matrix: &DMat4,
    pitch_with_map: bool,
    rotate_with_map: bool,
    transform: &Transform,
    pixels_to_tile_units: f64,
) -> DMat4 {
    if pitch_with_map {
        let mut m = DMat4::from_scale(DVec3::new(
            1.0 / pixels_to_tile_units,
            1.0 / pixels_to_tile_units,
            1.0,
        ));
        if !rotate_with_map {
            m *= DMat4::from_rotation_z(transform.angle());
        }
        m
    } else {
        transform.viewport_matrix() * *pos_matrix
    }
}

/// Converts a value in CSS pixels to tile units for a tile of `tile_size`
/// rendered at `overscaled_z` under the given view zoom.
#[must_use]
pub fn pixels_to_tile_units(tile_size: f64, overscaled_z: u8, zoom: f64, pixels: f64) -> f64 {
    pixels * EXTENT / (tile_size * (zoom - f64::from(overscaled_z)).exp2())
}

#[cfg(test)]
mod tests {
    use glam::DVec4;

    use super::*;
    use crate::tile::{CanonicalTileId, OverscaledTileId};

    fn to_screen(tr: &Transform, clip: DVec4) -> Point {
        Point::new(
            ((clip.x / clip.w + 1.0) / 2.0) * tr.width(),
            ((-clip.y / clip.w + 1.0) / 2.0) * tr.height(),
        )
    }

    #[test]
    fn top_down_projection_is_a_translation() {
        let tr = Transform::new(512.0, 512.0);
        // World center lands at the viewport center.
        let clip = tr.projection_matrix() * DVec4::new(256.0, 256.0, 0.0, 1.0);
        let screen = to_screen(&tr, clip);
        assert!((screen.x - 256.0).abs() < 1e-9);
        assert!((screen.y - 256.0).abs() < 1e-9);

        // And a point offset in world pixels moves by the same screen pixels.
        let clip = tr.projection_matrix() * DVec4::new(300.0, 200.0, 0.0, 1.0);
        let screen = to_screen(&tr, clip);
        assert!((screen.x - 300.0).abs() < 1e-9);
        assert!((screen.y - 200.0).abs() < 1e-9);
    }

    #[test]
    fn pos_matrix_spans_the_tile() {
        let tr = Transform::new(512.0, 512.0);
        let tile = OverscaledTileId::new(0, 0, CanonicalTileId::new(0, 0, 0)).to_unwrapped();
        let m = tr.calculate_pos_matrix(&tile);

        let origin = to_screen(&tr, m * DVec4::new(0.0, 0.0, 0.0, 1.0));
        assert!((origin.x - 0.0).abs() < 1e-9 && (origin.y - 0.0).abs() < 1e-9);

        let far = to_screen(&tr, m * DVec4::new(EXTENT, EXTENT, 0.0, 1.0));
        assert!((far.x - 512.0).abs() < 1e-9 && (far.y - 512.0).abs() < 1e-9);
    }

    #[test]
    fn child_tile_covers_its_quadrant() {
        let mut tr = Transform::new(512.0, 512.0);
        tr.set_zoom(1.0);
        tr.set_center(Point::new(512.0, 512.0));
        let tile = OverscaledTileId::new(1, 0, CanonicalTileId::new(1, 1, 0)).to_unwrapped();
        let m = tr.calculate_pos_matrix(&tile);

        // Tile (1, 1, 0) spans world x in [512, 1024), y in [0, 512).
        let origin = to_screen(&tr, m * DVec4::new(0.0, 0.0, 0.0, 1.0));
        assert!((origin.x - 256.0).abs() < 1e-9);
        assert!((origin.y - -256.0).abs() < 1e-9);
    }

    #[test]
    fn viewport_label_plane_matches_screen_pixels() {
        let tr = Transform::new(512.0, 512.0);
        let tile = OverscaledTileId::new(0, 0, CanonicalTileId::new(0, 0, 0)).to_unwrapped();
        let pos = tr.calculate_pos_matrix(&tile);
        let lp = label_plane_matrix(&pos, false, false, &tr, 1.0);

        let clip = lp * DVec4::new(EXTENT / 2.0, EXTENT / 2.0, 0.0, 1.0);
        assert!((clip.x / clip.w - 256.0).abs() < 1e-9);
        assert!((clip.y / clip.w - 256.0).abs() < 1e-9);
    }

    #[test]
    fn pixel_tile_unit_conversion_tracks_overscale() {
        // At matching zoom, one pixel is EXTENT / tile_size units.
        let units = pixels_to_tile_units(512.0, 0, 0.0, 1.0);
        assert!((units - EXTENT / 512.0).abs() < 1e-12);

        // One zoom level past the tile's own, a pixel covers half the units.
        let units = pixels_to_tile_units(512.0, 0, 1.0, 1.0);
        assert!((units - EXTENT / 1024.0).abs() < 1e-12);
    }
}
