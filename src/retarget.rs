//! Glyph rectangle retargeting
//!
//! Recomputes a glyph's pixel bounding box against the buffer it lives in.
//! The inward crop tightens the rasterizer's approximate rect to the real
//! glyph extent; the outward grow recaptures pixels that resampling or blur
//! spread beyond previously tight bounds.

use crate::bitmap::PageBitmap;
use crate::geom::Rect;
use crate::glyph::Glyph;

/// Whether any pixel in the given column rows is non-empty.
fn column_has_pixel(buf: &PageBitmap, x: i32, y0: i32, y1: i32, tolerance: u8) -> bool {
    (y0..=y1).any(|y| !buf.is_empty_pixel(x, y, tolerance))
}

/// Whether any pixel in the given row columns is non-empty.
fn row_has_pixel(buf: &PageBitmap, y: i32, x0: i32, x1: i32, tolerance: u8) -> bool {
    (x0..=x1).any(|x| !buf.is_empty_pixel(x, y, tolerance))
}

/// Shrink a candidate rect to the tight bounding box of its pixels.
///
/// Scans from the candidate's left edge rightward for the first column with
/// a non-empty pixel within the candidate's row span, symmetrically from
/// the right; then top/bottom within the resulting X range. A completely
/// blank candidate (e.g. the space glyph) collapses to a minimal rect at
/// the candidate origin rather than failing. The result always has
/// `w >= 1` and `h >= 1`.
pub fn crop_inward(buf: &PageBitmap, rect: Rect, tolerance: u8) -> Rect {
    let row_top = rect.y;
    let row_bot = rect.bottom() - 1;

    let mut start_x = rect.x;
    while start_x < buf.width() as i32 {
        if column_has_pixel(buf, start_x, row_top, row_bot, tolerance) {
            break;
        }
        start_x += 1;
    }

    let mut end_x = rect.right();
    while end_x >= 0 {
        if column_has_pixel(buf, end_x, row_top, row_bot, tolerance) {
            break;
        }
        end_x -= 1;
    }

    let mut start_y = rect.y;
    while start_y < buf.height() as i32 {
        if row_has_pixel(buf, start_y, start_x, end_x - 1, tolerance) {
            break;
        }
        start_y += 1;
    }

    let mut end_y = rect.bottom();
    while end_y >= 0 {
        if row_has_pixel(buf, end_y, start_x, end_x - 1, tolerance) {
            break;
        }
        end_y -= 1;
    }

    // Blank candidate: collapse to the candidate origin, never fail.
    if end_y < start_y {
        start_y = rect.y;
        end_y = rect.y;
    }
    if end_x < start_x {
        start_x = rect.x;
        end_x = rect.x;
    }

    Rect::new(start_x, start_y, end_x - start_x + 1, end_y - start_y + 1)
}

/// Grow a rect outward to recapture pixels spread past its edges.
///
/// Each edge steps outward one pixel at a time while the opposite-axis span
/// still contains a non-empty pixel, stopping at the first fully-empty
/// boundary or the buffer edge. An edge whose current boundary is already
/// empty retreats by one, so the result is tight as well as covering.
pub fn grow_outward(buf: &PageBitmap, rect: Rect, tolerance: u8) -> Rect {
    let mut start_x = rect.x;
    loop {
        if start_x < 0 {
            start_x = 0;
            break;
        }
        if !column_has_pixel(buf, start_x, rect.y, rect.bottom(), tolerance) {
            start_x += 1;
            break;
        }
        start_x -= 1;
    }

    let mut end_x = rect.right();
    loop {
        if end_x >= buf.width() as i32 {
            end_x = buf.width() as i32 - 1;
            break;
        }
        if !column_has_pixel(buf, end_x, rect.y, rect.bottom(), tolerance) {
            end_x -= 1;
            break;
        }
        end_x += 1;
    }

    let mut start_y = rect.y;
    loop {
        if start_y < 0 {
            start_y = 0;
            break;
        }
        if !row_has_pixel(buf, start_y, start_x, end_x, tolerance) {
            start_y += 1;
            break;
        }
        start_y -= 1;
    }

    let mut end_y = rect.bottom();
    loop {
        if end_y >= buf.height() as i32 {
            end_y = buf.height() as i32 - 1;
            break;
        }
        if !row_has_pixel(buf, end_y, start_x, end_x, tolerance) {
            end_y -= 1;
            break;
        }
        end_y += 1;
    }

    // A fully blank rect retreats past itself; pin it where it was.
    if end_x < start_x {
        start_x = rect.x;
        end_x = rect.x;
    }
    if end_y < start_y {
        start_y = rect.y;
        end_y = rect.y;
    }

    Rect::new(start_x, start_y, end_x - start_x + 1, end_y - start_y + 1)
}

/// Regrow every glyph against its page after a resampling step.
///
/// Glyph records are replaced, not mutated in place.
pub fn retarget_all(pages: &[PageBitmap], glyphs: &mut [Glyph], tolerance: u8) {
    for glyph in glyphs.iter_mut() {
        let rect = grow_outward(&pages[glyph.page], glyph.rect, tolerance);
        *glyph = Glyph {
            rect,
            ..*glyph
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 16x16 RGB strip with a white block at (5,6)..(9,10).
    fn strip_with_block() -> PageBitmap {
        let mut buf = PageBitmap::new_rgb(16, 16);
        for y in 6..10 {
            for x in 5..9 {
                buf.put_rgb(x, y, 255, 255, 255);
            }
        }
        buf
    }

    #[test]
    fn test_crop_inward_tightens() {
        let buf = strip_with_block();
        let tight = crop_inward(&buf, Rect::new(0, 0, 16, 16), 0);
        assert_eq!(tight, Rect::new(5, 6, 4, 4));
    }

    #[test]
    fn test_crop_inward_blank_collapses_at_origin() {
        let buf = PageBitmap::new_rgb(16, 16);
        let tight = crop_inward(&buf, Rect::new(3, 2, 6, 8), 0);
        assert_eq!((tight.x, tight.y), (3, 2));
        assert!(tight.w >= 1 && tight.h >= 1);
    }

    #[test]
    fn test_crop_inward_already_tight() {
        let buf = strip_with_block();
        let tight = crop_inward(&buf, Rect::new(5, 6, 4, 4), 0);
        assert_eq!(tight, Rect::new(5, 6, 4, 4));
    }

    #[test]
    fn test_grow_outward_recaptures_spread() {
        let mut buf = strip_with_block();
        // A stray pixel just left of the tight rect, as blur would leave.
        buf.put_rgb(4, 7, 10, 10, 10);
        let grown = grow_outward(&buf, Rect::new(5, 6, 4, 4), 0);
        assert_eq!(grown, Rect::new(4, 6, 5, 4));
    }

    #[test]
    fn test_grow_outward_stops_at_buffer_edge() {
        let mut buf = PageBitmap::new_rgb(8, 8);
        for y in 0..8 {
            for x in 0..8 {
                buf.put_rgb(x, y, 255, 255, 255);
            }
        }
        let grown = grow_outward(&buf, Rect::new(3, 3, 2, 2), 0);
        assert_eq!(grown, Rect::new(0, 0, 8, 8));
    }

    #[test]
    fn test_grow_outward_blank_keeps_minimal_rect() {
        let buf = PageBitmap::new_rgb(8, 8);
        let grown = grow_outward(&buf, Rect::new(4, 4, 1, 1), 0);
        assert_eq!((grown.x, grown.y), (4, 4));
        assert!(grown.w >= 1 && grown.h >= 1);
    }
}
