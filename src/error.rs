//! Atlas build and load errors
//!
//! Every error is fatal: the pipeline is a one-shot offline build with no
//! partial output, so callers re-invoke the whole build after fixing the
//! configuration or input.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AtlasError {
    /// Supersample level outside the supported range. Rejected before any
    /// pixel work.
    #[error("supersample level {0} is unsupported, use a value in [1,8]")]
    SuperSampleRange(u32),

    /// Power-of-two packing requires a power-of-two supersample level.
    #[error("supersample level {0} must be a power of two when power-of-two pages are forced")]
    SuperSampleNotPowerOfTwo(u32),

    /// Placement exceeded the bounded retry budget. The page is too small
    /// for the glyph set, or the margin is too large.
    #[error("failed to fit glyphs into texture pages (page too small or glyph margin too large)")]
    PackingOverflow,

    /// Two glyphs on the same page intersect. May indicate an upstream
    /// glyph-measurement error rather than a packer bug.
    #[error("glyphs '{0}' and '{1}' overlap on page {2}")]
    GlyphOverlap(char, char, usize),

    /// A glyph rect escapes its page bounds.
    #[error("glyph '{0}' extends outside its page")]
    GlyphOutOfBounds(char),

    /// A layout file line failed to parse. The load aborts; there is no
    /// best-effort recovery.
    #[error("malformed layout file at line {line}: {text:?}")]
    Layout { line: usize, text: String },
}
