//! Atlas rescaling
//!
//! Whole-page scaling for supersample/downsample flows, and the isolated
//! per-glyph shrink used when the margin cannot protect neighbouring glyphs
//! from bleeding into each other during a whole-atlas shrink.

use log::{debug, info};

use crate::bitmap::PageBitmap;
use crate::error::AtlasError;
use crate::geom::Rect;
use crate::glyph::Glyph;
use crate::pack;
use crate::retarget;
use crate::validate;

/// Margin used when repacking isolated shrunk glyphs.
const SHRINK_REPACK_MARGIN: u32 = 4;

/// Slack added to the shrunk page size so the repack keeps roughly the
/// same page count as before.
const SHRINK_PAGE_SLACK: f32 = 0.1;

/// Resample pages and scale glyph geometry, without regrowing rects.
///
/// The shadow pipeline uses this directly: it blurs after scaling, so
/// regrowing here would be wasted work.
pub(crate) fn scale_raw(pages: &mut [PageBitmap], glyphs: &mut [Glyph], factor: f32) {
    if factor == 1.0 {
        return;
    }

    for page in pages.iter_mut() {
        let w = (page.width() as f32 * factor) as u32;
        let h = (page.height() as f32 * factor) as u32;
        page.resample(w, h);
    }

    for glyph in glyphs.iter_mut() {
        *glyph = Glyph {
            rect: glyph.rect.scaled(factor),
            y_offset: (glyph.y_offset as f32 * factor) as i32,
            ..*glyph
        };
    }
}

/// Resample every page by `factor` and rescale glyph geometry.
///
/// Naively scaled rects cannot be trusted: resampling blurs glyph edges
/// outward, so every rect is regrown afterwards. `factor == 1.0` leaves
/// pages and glyphs untouched.
pub fn scale_pages(pages: &mut [PageBitmap], glyphs: &mut [Glyph], factor: f32, tolerance: u8) {
    if factor == 1.0 {
        return;
    }
    debug!("scaling {} page(s) by {}", pages.len(), factor);
    scale_raw(pages, glyphs, factor);
    retarget::retarget_all(pages, glyphs, tolerance);
}

/// Shrink every glyph in isolation and repack into fresh pages.
///
/// Shrinking the whole atlas below its original size would eventually make
/// neighbouring glyphs bleed into each other, so each glyph (with its
/// margin) is extracted into its own bitmap, shrunk alone, and the shrunk
/// set is repacked into pages sized at roughly `old_size * factor`. The
/// result is regrown and validated before it is returned.
pub fn shrink_isolated(
    glyphs: &[Glyph],
    pages: &[PageBitmap],
    factor: f32,
    tolerance: u8,
) -> Result<(Vec<PageBitmap>, Vec<Glyph>), AtlasError> {
    debug_assert!(factor > 0.0 && factor < 1.0);
    if glyphs.is_empty() || pages.is_empty() {
        return Ok((Vec::new(), Vec::new()));
    }
    info!("isolated shrink of {} glyphs by {}", glyphs.len(), factor);

    // One single-glyph bitmap per glyph, glyph rect rebased to its origin.
    let mut isolated_pages: Vec<PageBitmap> = Vec::with_capacity(glyphs.len());
    let mut isolated: Vec<Glyph> = Vec::with_capacity(glyphs.len());
    for (i, g) in glyphs.iter().enumerate() {
        let mut single = PageBitmap::new_rgba(g.rect.w as u32, g.rect.h as u32);
        single.blit(&pages[g.page], g.rect, 0, 0);
        isolated_pages.push(single);
        isolated.push(Glyph {
            page: i,
            rect: Rect::new(0, 0, g.rect.w, g.rect.h),
            ..*g
        });
    }

    // Shrink each bitmap on its own; no neighbour can bleed in.
    for (g, page) in isolated.iter_mut().zip(isolated_pages.iter_mut()) {
        let w = ((page.width() as f32 * factor) as u32).max(1);
        let h = ((page.height() as f32 * factor) as u32).max(1);
        page.resample(w, h);
        *g = Glyph {
            rect: Rect::new(0, 0, w as i32, h as i32),
            y_offset: (g.y_offset as f32 * factor) as i32,
            ..*g
        };
    }

    // Repack at roughly the shrunk size, keeping the old page count. A
    // heavily cropped source page can shrink below what one glyph plus its
    // margins needs, so clamp to the largest shrunk glyph.
    let max_w = isolated.iter().map(|g| g.rect.w).max().unwrap_or(1) as u32;
    let max_h = isolated.iter().map(|g| g.rect.h).max().unwrap_or(1) as u32;
    let new_w = ((pages[0].width() as f32 * (SHRINK_PAGE_SLACK + factor)) as u32)
        .max(max_w + 2 * SHRINK_REPACK_MARGIN);
    let new_h = ((pages[0].height() as f32 * (SHRINK_PAGE_SLACK + factor)) as u32)
        .max(max_h + 2 * SHRINK_REPACK_MARGIN);
    let (mut new_pages, mut new_glyphs) = pack::repack(
        &isolated,
        &isolated_pages,
        new_w,
        new_h,
        SHRINK_REPACK_MARGIN,
        false,
    )?;

    retarget::retarget_all(&new_pages, &mut new_glyphs, tolerance);
    validate::validate_glyphs(&new_glyphs, &new_pages)?;

    // Shrunk pages are fully owned; nothing references the originals now.
    new_pages.shrink_to_fit();
    Ok((new_pages, new_glyphs))
}
