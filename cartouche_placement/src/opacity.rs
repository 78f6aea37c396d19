// Copyright 2025 the Cartouche Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fade state per symbol and its packed vertex encoding.

/// Fade state of one component (text or icon) of a symbol.
///
/// `opacity` is the rendered scalar in `[0, 1]`; `placed` is the decision it
/// is moving toward. A state is hidden exactly when it has fully faded out
/// and is not coming back.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct OpacityState {
    /// Rendered opacity in `[0, 1]`.
    pub opacity: f64,
    /// The placement decision of the latest pass.
    pub placed: bool,
}

impl OpacityState {
    /// State for a symbol with no previous fade history.
    ///
    /// Placed symbols start at zero opacity and fade in, unless `skip_fade`
    /// puts them at full opacity immediately.
    #[must_use]
    pub fn initial(placed: bool, skip_fade: bool) -> Self {
        Self {
            opacity: if skip_fade && placed { 1.0 } else { 0.0 },
            placed,
        }
    }

    /// Advances `prev` by `increment` (the fraction of the fade duration
    /// elapsed since the previous commit) toward the new `placed` decision.
    #[must_use]
    pub fn advance(prev: &Self, increment: f64, placed: bool) -> Self {
        let step = if placed { increment } else { -increment };
        Self {
            opacity: (prev.opacity + step).clamp(0.0, 1.0),
            placed,
        }
    }

    /// Fully faded out with no pending fade-in.
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.opacity == 0.0 && !self.placed
    }
}

/// Fade state of a symbol's text and icon, advanced coherently.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct JointOpacityState {
    /// Text component.
    pub text: OpacityState,
    /// Icon component.
    pub icon: OpacityState,
}

impl JointOpacityState {
    /// Joint state for a symbol with no previous fade history.
    #[must_use]
    pub fn initial(placed_text: bool, placed_icon: bool, skip_fade: bool) -> Self {
        Self {
            text: OpacityState::initial(placed_text, skip_fade),
            icon: OpacityState::initial(placed_icon, skip_fade),
        }
    }

    /// Advances both components by the same increment.
    #[must_use]
    pub fn advance(prev: &Self, increment: f64, placed_text: bool, placed_icon: bool) -> Self {
        Self {
            text: OpacityState::advance(&prev.text, increment, placed_text),
            icon: OpacityState::advance(&prev.icon, increment, placed_icon),
        }
    }

    /// Hidden iff both components are hidden.
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.text.is_hidden() && self.icon.is_hidden()
    }
}

/// One pass's placement decision for a symbol.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct JointPlacement {
    /// Whether the text was placed.
    pub text: bool,
    /// Whether the icon was placed.
    pub icon: bool,
    /// Whether the first commit should start at full opacity. Set for
    /// symbols accepted inside the viewport padding band, so a later pan
    /// reveals them without a fade-in.
    pub skip_fade: bool,
}

impl JointPlacement {
    /// Creates a placement decision.
    #[must_use]
    pub fn new(text: bool, icon: bool, skip_fade: bool) -> Self {
        Self {
            text,
            icon,
            skip_fade,
        }
    }
}

/// Packs a fade state into the per-glyph opacity word.
///
/// Each byte holds `(⌊opacity · 127⌋ << 1) | placed`, repeated four times so
/// the word can be uploaded once per vertex of a quad.
#[must_use]
pub fn pack_opacity(state: OpacityState) -> u32 {
    if state.opacity == 0.0 && !state.placed {
        return 0;
    }
    if state.opacity == 1.0 && state.placed {
        return u32::MAX;
    }
    let o = (state.opacity * 127.0).floor() as u32;
    let p = u32::from(state.placed);
    (o << 25) | (p << 24) | (o << 17) | (p << 16) | (o << 9) | (p << 8) | (o << 1) | p
}
