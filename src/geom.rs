//! Geometric primitives for atlas packing
//!
//! Integer rectangles in page-pixel coordinates, plus the power-of-two
//! rounding used when page dimensions must be GPU-friendly.

/// Axis-aligned rectangle in page-pixel coordinates.
///
/// Coordinates are signed so that retargeting scans can step past the
/// origin before clamping; a finished glyph rect is always non-negative
/// with `w >= 1` and `h >= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// One past the rightmost column.
    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    /// One past the bottom row.
    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    /// Open-interval intersection test: touching edges do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.w
            && self.x + self.w > other.x
            && self.y < other.y + other.h
            && self.y + self.h > other.y
    }

    /// Whether this rect lies fully inside a `width` x `height` page.
    pub fn contained_in(&self, width: u32, height: u32) -> bool {
        self.x >= 0 && self.y >= 0 && self.right() <= width as i32 && self.bottom() <= height as i32
    }

    /// Scale all four fields by `factor` with integer truncation.
    ///
    /// Truncation matches the page resampling convention; callers regrow
    /// the rect afterwards instead of trusting the scaled bounds.
    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            x: (self.x as f32 * factor) as i32,
            y: (self.y as f32 * factor) as i32,
            w: (self.w as f32 * factor) as i32,
            h: (self.h as f32 * factor) as i32,
        }
    }
}

/// Smallest power of two that is `>= x` (and `>= 1`).
pub fn next_power_of_two(x: u32) -> u32 {
    let mut val = 1u32;
    while val < x {
        val <<= 1;
    }
    val
}
