// Copyright 2025 the Cartouche Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Typed symbol layer options.
//!
//! The style layer exposes these as string-valued keys; they are converted
//! to enums once when the layer is ingested, so the placement core only ever
//! reads plain data.

/// Whether a property follows the map plane or the viewport.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum AlignmentMode {
    /// Aligned to the map plane: pitched and rotated with the camera.
    Map,
    /// Aligned to the screen.
    #[default]
    Viewport,
}

/// Anchor position keyword for a text label.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TextAnchor {
    /// Label centered on the anchor.
    Center,
    /// Label below the anchor.
    Top,
    /// Label above the anchor.
    Bottom,
    /// Label right of the anchor.
    Left,
    /// Label left of the anchor.
    Right,
    /// Label below-right of the anchor.
    TopLeft,
    /// Label below-left of the anchor.
    TopRight,
    /// Label above-right of the anchor.
    BottomLeft,
    /// Label above-left of the anchor.
    BottomRight,
}

/// One entry of the `dynamic-text-anchor` option list.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AnchorOption {
    /// Expand to the built-in anchor sequence. Only valid as the first
    /// entry; later occurrences are skipped with a one-shot warning.
    Auto,
    /// A fixed anchor keyword.
    Fixed(TextAnchor),
}

/// Horizontal text justification, selected per anchor.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TextJustify {
    /// Ragged-right text.
    Left,
    /// Centered text.
    Center,
    /// Ragged-left text.
    Right,
}

/// The layer option keys the placement engine reads.
#[derive(Clone, Debug, Default)]
pub struct SymbolLayout {
    /// Whether the label may appear without its icon being placed.
    pub icon_optional: bool,
    /// Whether the icon may appear without its label being placed.
    pub text_optional: bool,
    /// Text is placed without querying the collision index.
    pub text_allow_overlap: bool,
    /// Icon is placed without querying the collision index.
    pub icon_allow_overlap: bool,
    /// Placed text does not block later candidates.
    pub text_ignore_placement: bool,
    /// Placed icons do not block later candidates.
    pub icon_ignore_placement: bool,
    /// Pitch alignment of text.
    pub text_pitch_alignment: AlignmentMode,
    /// Rotation alignment of text.
    pub text_rotation_alignment: AlignmentMode,
    /// Pitch alignment of icons.
    pub icon_pitch_alignment: AlignmentMode,
    /// Rotation alignment of icons.
    pub icon_rotation_alignment: AlignmentMode,
    /// Ordered anchor candidates for dynamic placement; `None` keeps the
    /// shaped anchor fixed.
    pub dynamic_text_anchor: Option<Vec<AnchorOption>>,
    /// Radial distance between the anchor and the label, in ems.
    pub dynamic_text_offset: f64,
}

/// A symbol style layer as the placement engine sees it.
#[derive(Clone, Debug)]
pub struct SymbolLayer {
    /// Style layer id.
    pub id: String,
    /// Typed layout options.
    pub layout: SymbolLayout,
}

impl SymbolLayer {
    /// Creates a layer with the given id and layout.
    #[must_use]
    pub fn new(id: impl Into<String>, layout: SymbolLayout) -> Self {
        Self {
            id: id.into(),
            layout,
        }
    }
}
