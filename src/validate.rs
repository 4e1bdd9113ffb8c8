//! Post-build geometric sanity checks
//!
//! Runs after the initial build, after every rescale and after load. A
//! violation is fatal and reported, never auto-corrected: an overlap may
//! point at an upstream glyph-measurement error rather than a packer bug.

use crate::bitmap::PageBitmap;
use crate::error::AtlasError;
use crate::glyph::Glyph;

/// First pair of same-page glyphs whose rects intersect, scanning in the
/// given order so the report is deterministic.
pub fn first_intercept_ordered(glyphs: &[Glyph]) -> Option<(char, char, usize)> {
    for (i, a) in glyphs.iter().enumerate() {
        for b in &glyphs[i + 1..] {
            if a.page == b.page && a.rect.intersects(&b.rect) {
                return Some((a.character, b.character, a.page));
            }
        }
    }
    None
}

/// Check every invariant a packed glyph set must satisfy: rects contained
/// in their pages, width/height at least one pixel, no same-page overlap.
pub fn validate_glyphs(glyphs: &[Glyph], pages: &[PageBitmap]) -> Result<(), AtlasError> {
    for g in glyphs {
        let page = pages
            .get(g.page)
            .ok_or(AtlasError::GlyphOutOfBounds(g.character))?;
        if g.rect.w < 1 || g.rect.h < 1 || !g.rect.contained_in(page.width(), page.height()) {
            return Err(AtlasError::GlyphOutOfBounds(g.character));
        }
    }
    if let Some((a, b, page)) = first_intercept_ordered(glyphs) {
        return Err(AtlasError::GlyphOverlap(a, b, page));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Rect;

    #[test]
    fn test_first_intercept_reports_first_pair() {
        let glyphs = [
            Glyph::new('a', 0, Rect::new(0, 0, 10, 10), 0),
            Glyph::new('b', 0, Rect::new(20, 0, 10, 10), 0),
            Glyph::new('c', 0, Rect::new(5, 5, 10, 10), 0),
            Glyph::new('d', 0, Rect::new(22, 2, 10, 10), 0),
        ];
        assert_eq!(first_intercept_ordered(&glyphs), Some(('a', 'c', 0)));
    }

    #[test]
    fn test_different_pages_never_intersect() {
        let glyphs = [
            Glyph::new('a', 0, Rect::new(0, 0, 10, 10), 0),
            Glyph::new('b', 1, Rect::new(0, 0, 10, 10), 0),
        ];
        assert_eq!(first_intercept_ordered(&glyphs), None);
    }

    #[test]
    fn test_validate_rejects_escaping_rect() {
        let pages = vec![PageBitmap::new_rgba(16, 16)];
        let glyphs = [Glyph::new('a', 0, Rect::new(10, 10, 10, 10), 0)];
        assert!(matches!(
            validate_glyphs(&glyphs, &pages),
            Err(AtlasError::GlyphOutOfBounds('a'))
        ));
    }

    #[test]
    fn test_validate_rejects_missing_page() {
        let pages = vec![PageBitmap::new_rgba(16, 16)];
        let glyphs = [Glyph::new('a', 5, Rect::new(0, 0, 1, 1), 0)];
        assert!(matches!(
            validate_glyphs(&glyphs, &pages),
            Err(AtlasError::GlyphOutOfBounds('a'))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_size() {
        let pages = vec![PageBitmap::new_rgba(16, 16)];
        let glyphs = [Glyph::new('a', 0, Rect::new(0, 0, 0, 1), 0)];
        assert!(validate_glyphs(&glyphs, &pages).is_err());
    }
}
