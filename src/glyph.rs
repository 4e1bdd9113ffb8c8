//! Glyph placement records
//!
//! A glyph is one character's packed image region plus its baseline offset.
//! Pipeline stages replace glyph records wholesale rather than mutating
//! shared ones: the same set feeds both the primary and the shadow atlas.

use crate::geom::Rect;

/// One character's placement within the atlas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyph {
    /// Which character this glyph renders.
    pub character: char,
    /// Index of the texture page holding the glyph.
    pub page: usize,
    /// Pixel rectangle on that page. Always `w >= 1` and `h >= 1`, even
    /// for glyphs with no opaque pixels (e.g. space).
    pub rect: Rect,
    /// Vertical offset aligning the glyph with the tallest glyph in the set.
    pub y_offset: i32,
    /// When set, the renderer must not tint this glyph (fixed-color glyphs
    /// such as embedded icons).
    pub suppress_colouring: bool,
}

impl Glyph {
    pub fn new(character: char, page: usize, rect: Rect, y_offset: i32) -> Self {
        Self {
            character,
            page,
            rect,
            y_offset,
            suppress_colouring: false,
        }
    }
}
