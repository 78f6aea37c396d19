// Copyright 2025 the Cartouche Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Anchor geometry for the dynamic placement search.

use core::f64::consts::FRAC_1_SQRT_2;

use kurbo::Vec2;

use cartouche_collision::CollisionBox;

use crate::layout::{TextAnchor, TextJustify};

/// Font size units in one em.
pub const ONE_EM: f64 = 24.0;

/// Anchor candidates tried, in order, when a `dynamic-text-anchor` list
/// starts with `auto`.
pub const AUTO_ANCHORS: [TextAnchor; 9] = [
    TextAnchor::Center,
    TextAnchor::Top,
    TextAnchor::Bottom,
    TextAnchor::Left,
    TextAnchor::Right,
    TextAnchor::TopLeft,
    TextAnchor::TopRight,
    TextAnchor::BottomLeft,
    TextAnchor::BottomRight,
];

/// The horizontal justification a label takes when placed at `anchor`.
#[must_use]
pub fn anchor_justification(anchor: TextAnchor) -> TextJustify {
    match anchor {
        TextAnchor::Right | TextAnchor::TopRight | TextAnchor::BottomRight => TextJustify::Right,
        TextAnchor::Left | TextAnchor::TopLeft | TextAnchor::BottomLeft => TextJustify::Left,
        TextAnchor::Center | TextAnchor::Top | TextAnchor::Bottom => TextJustify::Center,
    }
}

/// Horizontal and vertical alignment factors for `anchor`, each in
/// `{0, 0.5, 1}`: the fraction of the label's extent that sits before the
/// anchor on that axis.
#[must_use]
pub fn anchor_alignment(anchor: TextAnchor) -> (f64, f64) {
    let horizontal = match anchor {
        TextAnchor::Right | TextAnchor::TopRight | TextAnchor::BottomRight => 1.0,
        TextAnchor::Left | TextAnchor::TopLeft | TextAnchor::BottomLeft => 0.0,
        _ => 0.5,
    };
    let vertical = match anchor {
        TextAnchor::Bottom | TextAnchor::BottomLeft | TextAnchor::BottomRight => 1.0,
        TextAnchor::Top | TextAnchor::TopLeft | TextAnchor::TopRight => 0.0,
        _ => 0.5,
    };
    (horizontal, vertical)
}

/// Displacement of the label center for `anchor` at radial distance
/// `radial`, in ems.
///
/// The anchor names the side of the label that faces the feature, so the
/// displacement points the other way: `Top` pushes the label down,
/// `TopRight` pushes it down-left. Diagonals split the radius evenly
/// between both axes.
#[must_use]
pub fn dynamic_offset(anchor: TextAnchor, radial: f64) -> Vec2 {
    let leg = radial * FRAC_1_SQRT_2;
    match anchor {
        TextAnchor::Center => Vec2::ZERO,
        TextAnchor::Top => Vec2::new(0.0, radial),
        TextAnchor::Bottom => Vec2::new(0.0, -radial),
        TextAnchor::Left => Vec2::new(radial, 0.0),
        TextAnchor::Right => Vec2::new(-radial, 0.0),
        TextAnchor::TopLeft => Vec2::new(leg, leg),
        TextAnchor::TopRight => Vec2::new(-leg, leg),
        TextAnchor::BottomLeft => Vec2::new(leg, -leg),
        TextAnchor::BottomRight => Vec2::new(-leg, -leg),
    }
}

/// Translates a collision box by an alignment shift in tile units plus a
/// dynamic offset in ems. The anchor point itself is unchanged, so the
/// projected perspective ratio stays that of the feature.
#[must_use]
pub fn shift_dynamic_collision_box(
    collision_box: &CollisionBox,
    text_box_scale: f64,
    shift_x: f64,
    shift_y: f64,
    offset_ems: Vec2,
) -> CollisionBox {
    let dx = shift_x + offset_ems.x * text_box_scale;
    let dy = shift_y + offset_ems.y * text_box_scale;
    CollisionBox {
        anchor: collision_box.anchor,
        x1: collision_box.x1 + dx,
        y1: collision_box.y1 + dy,
        x2: collision_box.x2 + dx,
        y2: collision_box.y2 + dy,
        feature_index: collision_box.feature_index,
    }
}

/// Tile units per em for a label of `layout_text_size`, where
/// `tile_pixel_ratio` is the tile units covered by one CSS pixel.
#[must_use]
pub fn text_box_scale(tile_pixel_ratio: f64, layout_text_size: f64) -> f64 {
    tile_pixel_ratio * layout_text_size / ONE_EM
}
